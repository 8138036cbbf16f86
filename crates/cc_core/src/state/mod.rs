//! Global application state manager.
//!
//! This module provides a thread-safe global state holder for the runtime
//! club data. The `AppState` struct holds players, matches and the
//! withdrawal ledger, and converts to/from `AppSave` for persistence.
//! Each match is still mutated only by its own engine instance; the state
//! just stores the records between user actions.

use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

use chrono::{Duration, NaiveDate};

use crate::error::CoreError;
use crate::finance::{self, WithdrawalRequest};
use crate::models::{Match, MatchStatus, Player, Withdrawal};
use crate::save::AppSave;
use crate::scheduling::{schedule_match, MatchPlan};

/// Global application state singleton
pub static APP_STATE: Lazy<Arc<RwLock<AppState>>> =
    Lazy::new(|| Arc::new(RwLock::new(AppState::default())));

/// Runtime application state
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Registered players
    pub players: Vec<Player>,

    /// Every match, scheduled through completed
    pub matches: Vec<Match>,

    /// Withdrawal ledger, newest first
    pub withdrawals: Vec<Withdrawal>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert runtime state to the save format
    pub fn to_save(&self) -> AppSave {
        AppSave {
            version: crate::save::SAVE_VERSION,
            timestamp: crate::save::current_timestamp(),
            players: self.players.clone(),
            matches: self.matches.clone(),
            withdrawals: self.withdrawals.clone(),
        }
    }

    /// Restore runtime state from save data
    pub fn from_save(save: &AppSave) -> Self {
        Self {
            players: save.players.clone(),
            matches: save.matches.clone(),
            withdrawals: save.withdrawals.clone(),
        }
    }

    // ========================
    // Player Management
    // ========================

    /// Add a player to the roster
    pub fn add_player(&mut self, player: Player) -> Result<(), CoreError> {
        if self.players.iter().any(|p| p.id == player.id) {
            return Err(CoreError::Validation(format!(
                "player id {} is already registered",
                player.id
            )));
        }
        self.players.push(player);
        Ok(())
    }

    /// Replace a player's record; identity must already exist
    pub fn update_player(&mut self, player: Player) -> Result<(), CoreError> {
        match self.players.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => {
                *existing = player;
                Ok(())
            }
            None => Err(CoreError::NotFound(format!("player {}", player.id))),
        }
    }

    pub fn get_player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    // ========================
    // Match Management
    // ========================

    /// Validate a plan and add the scheduled match. Newest matches first.
    pub fn schedule(&mut self, plan: MatchPlan) -> Result<String, CoreError> {
        let match_rec = schedule_match(plan)?;
        let id = match_rec.id.clone();
        self.matches.insert(0, match_rec);
        Ok(id)
    }

    pub fn get_match(&self, match_id: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    /// Clone a match out for its scoring engine.
    pub fn match_for_scoring(&self, match_id: &str) -> Result<Match, CoreError> {
        self.get_match(match_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("match {}", match_id)))
    }

    /// Write back an updated match record (engine progress, fee edits).
    pub fn apply_match_update(&mut self, updated: Match) -> Result<(), CoreError> {
        match self.matches.iter_mut().find(|m| m.id == updated.id) {
            Some(existing) => {
                *existing = updated;
                Ok(())
            }
            None => Err(CoreError::NotFound(format!("match {}", updated.id))),
        }
    }

    /// Matches shown on the dashboard: everything still open, plus matches
    /// completed within the last week.
    pub fn visible_matches(&self, today: NaiveDate) -> Vec<&Match> {
        let cutoff = today - Duration::days(7);
        self.matches
            .iter()
            .filter(|m| {
                if m.status != MatchStatus::Completed {
                    return true;
                }
                match m.completion_date.as_deref().map(parse_completion_date) {
                    Some(Some(date)) => date >= cutoff,
                    // No or unreadable completion date: keep it visible.
                    _ => true,
                }
            })
            .collect()
    }

    // ========================
    // Finance
    // ========================

    /// Record a withdrawal against the club balance.
    pub fn record_withdrawal(&mut self, request: WithdrawalRequest) -> Result<Withdrawal, CoreError> {
        finance::record_withdrawal(&self.matches, &mut self.withdrawals, request)
    }
}

fn parse_completion_date(raw: &str) -> Option<NaiveDate> {
    chrono::DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}

// ========================
// Global State Access Functions
// ========================

/// Get a read lock on the global application state
pub fn get_state() -> std::sync::RwLockReadGuard<'static, AppState> {
    APP_STATE.read().expect("APP_STATE lock poisoned")
}

/// Get a write lock on the global application state
pub fn get_state_mut() -> std::sync::RwLockWriteGuard<'static, AppState> {
    APP_STATE.write().expect("APP_STATE lock poisoned")
}

/// Reset the global state to default
pub fn reset_state() {
    *APP_STATE.write().expect("APP_STATE lock poisoned") = AppState::new();
}

/// Replace the entire global state
pub fn set_state(new_state: AppState) {
    *APP_STATE.write().expect("APP_STATE lock poisoned") = new_state;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlayerRole;
    use crate::scheduling::TeamPlan;

    fn plan() -> MatchPlan {
        MatchPlan {
            name: "Sunday Friendly".to_string(),
            date: "2024-06-02".to_string(),
            time: "07:00".to_string(),
            total_overs: 10,
            team_a: TeamPlan {
                name: "Rahul's XI".to_string(),
                captain_id: "a1".to_string(),
                player_ids: (1..=11).map(|i| format!("a{}", i)).collect(),
            },
            team_b: TeamPlan {
                name: "Amol's XI".to_string(),
                captain_id: "b1".to_string(),
                player_ids: (1..=11).map(|i| format!("b{}", i)).collect(),
            },
        }
    }

    #[test]
    fn test_state_save_roundtrip() {
        let mut state = AppState::new();
        state.players.push(Player::new("p1", "Rahul H", PlayerRole::Bowler));
        state.schedule(plan()).unwrap();

        let save = state.to_save();
        let restored = AppState::from_save(&save);

        assert_eq!(restored.players.len(), 1);
        assert_eq!(restored.matches.len(), 1);
        assert_eq!(restored.matches[0].name, "Sunday Friendly");
    }

    #[test]
    fn test_duplicate_player_registration_rejected() {
        let mut state = AppState::new();
        state.add_player(Player::new("p1", "Rahul H", PlayerRole::Bowler)).unwrap();
        assert!(state.add_player(Player::new("p1", "Clone", PlayerRole::Batter)).is_err());
    }

    #[test]
    fn test_update_unknown_player_reports_not_found() {
        let mut state = AppState::new();
        let err = state.update_player(Player::new("ghost", "Ghost", PlayerRole::Batter));
        assert!(matches!(err, Err(CoreError::NotFound(_))));
    }

    #[test]
    fn test_match_update_by_id() {
        let mut state = AppState::new();
        let id = state.schedule(plan()).unwrap();

        let mut updated = state.match_for_scoring(&id).unwrap();
        updated.status = MatchStatus::Live;
        state.apply_match_update(updated).unwrap();

        assert_eq!(state.get_match(&id).unwrap().status, MatchStatus::Live);
    }

    #[test]
    fn test_visible_matches_hide_old_completed() {
        let mut state = AppState::new();
        let id = state.schedule(plan()).unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        assert_eq!(state.visible_matches(today).len(), 1);

        let mut completed = state.match_for_scoring(&id).unwrap();
        completed.status = MatchStatus::Completed;
        completed.completion_date = Some("2024-06-01T09:00:00Z".to_string());
        state.apply_match_update(completed).unwrap();

        // Completed 19 days ago: hidden.
        assert!(state.visible_matches(today).is_empty());

        // Completed three days ago: visible.
        let mut recent = state.match_for_scoring(&id).unwrap();
        recent.completion_date = Some("2024-06-17T09:00:00Z".to_string());
        state.apply_match_update(recent).unwrap();
        assert_eq!(state.visible_matches(today).len(), 1);
    }

    #[test]
    fn test_withdrawal_goes_through_finance_rules() {
        let mut state = AppState::new();
        let err = state.record_withdrawal(WithdrawalRequest {
            amount: 100.0,
            reason: "Nets".to_string(),
            date: "2024-06-01".to_string(),
            person_name: None,
        });
        // Empty ledger means zero balance.
        assert!(matches!(err, Err(CoreError::InsufficientBalance { .. })));
    }
}
