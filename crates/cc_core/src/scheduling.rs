//! Scheduled-match construction.
//!
//! Scheduling is a collaborator of the scoring engine: it validates the
//! fixture details and produces a `Scheduled` match the engine can take
//! over. Violations are reported to the caller, never silently corrected.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    FeeStatus, Match, MatchStatus, TeamRoster, DEFAULT_MATCH_FEE, MIN_TEAM_SIZE,
};

/// One side of a planned fixture.
#[derive(Debug, Clone)]
pub struct TeamPlan {
    pub name: String,
    pub captain_id: String,
    pub player_ids: Vec<String>,
}

/// Everything the organizer fills in before a match exists.
#[derive(Debug, Clone)]
pub struct MatchPlan {
    pub name: String,
    /// ISO `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub total_overs: u16,
    pub team_a: TeamPlan,
    pub team_b: TeamPlan,
}

/// Validate a plan and produce a `Scheduled` match.
///
/// Every player starts with an `Unpaid` fee at the club's default rate.
pub fn schedule_match(plan: MatchPlan) -> Result<Match, CoreError> {
    if plan.name.trim().is_empty() || plan.date.trim().is_empty() || plan.time.trim().is_empty() {
        return Err(CoreError::Validation(
            "match name, date and time are all required".to_string(),
        ));
    }
    if plan.total_overs == 0 {
        return Err(CoreError::Validation("total overs must be at least 1".to_string()));
    }
    if plan.team_a.name.trim().is_empty() || plan.team_b.name.trim().is_empty() {
        return Err(CoreError::Validation("both teams need a name".to_string()));
    }
    if plan.team_a.name == plan.team_b.name {
        return Err(CoreError::Validation("team names must differ".to_string()));
    }

    for team in [&plan.team_a, &plan.team_b] {
        if team.player_ids.len() < MIN_TEAM_SIZE {
            return Err(CoreError::Validation(format!(
                "{} has {} players, both teams need at least {}",
                team.name,
                team.player_ids.len(),
                MIN_TEAM_SIZE
            )));
        }
        let unique: HashSet<&String> = team.player_ids.iter().collect();
        if unique.len() != team.player_ids.len() {
            return Err(CoreError::Validation(format!(
                "{} lists a player more than once",
                team.name
            )));
        }
        if !team.player_ids.iter().any(|id| id == &team.captain_id) {
            return Err(CoreError::Validation(format!(
                "captain of {} must be in its squad",
                team.name
            )));
        }
    }

    if let Some(shared) =
        plan.team_a.player_ids.iter().find(|id| plan.team_b.player_ids.contains(id))
    {
        return Err(CoreError::Validation(format!(
            "player {} cannot play for both teams",
            shared
        )));
    }

    let mut players = plan.team_a.player_ids.clone();
    players.extend(plan.team_b.player_ids.iter().cloned());

    let fees: HashMap<String, FeeStatus> =
        players.iter().map(|id| (id.clone(), FeeStatus::Unpaid)).collect();

    log::info!(
        "scheduled {} ({} vs {}) on {}",
        plan.name,
        plan.team_a.name,
        plan.team_b.name,
        plan.date
    );

    Ok(Match {
        id: Uuid::new_v4().to_string(),
        name: plan.name,
        date: plan.date,
        time: Some(plan.time),
        total_overs: Some(plan.total_overs),
        players,
        teams: vec![
            TeamRoster {
                name: plan.team_a.name,
                captain_id: plan.team_a.captain_id,
                player_ids: plan.team_a.player_ids,
            },
            TeamRoster {
                name: plan.team_b.name,
                captain_id: plan.team_b.captain_id,
                player_ids: plan.team_b.player_ids,
            },
        ],
        status: MatchStatus::Scheduled,
        toss_winner: None,
        decision: None,
        innings: None,
        live_progress: None,
        tie_breakers: Vec::new(),
        winner: None,
        result_description: None,
        completion_date: None,
        man_of_the_match_id: None,
        fastest_ball: None,
        fees,
        fee_per_player: Some(DEFAULT_MATCH_FEE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_plan() -> MatchPlan {
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
    fn test_schedule_produces_scheduled_match() {
        let m = schedule_match(valid_plan()).unwrap();
        assert_eq!(m.status, MatchStatus::Scheduled);
        assert_eq!(m.teams.len(), 2);
        assert_eq!(m.players.len(), 22);
        assert_eq!(m.fee_per_player, Some(DEFAULT_MATCH_FEE));
        assert!(m.fees.values().all(|s| *s == FeeStatus::Unpaid));
        assert_eq!(m.fees.len(), 22);
    }

    #[test]
    fn test_small_squad_rejected() {
        let mut plan = valid_plan();
        plan.team_b.player_ids.truncate(10);
        assert!(schedule_match(plan).is_err());
    }

    #[test]
    fn test_shared_player_rejected() {
        let mut plan = valid_plan();
        plan.team_b.player_ids[3] = "a2".to_string();
        assert!(schedule_match(plan).is_err());
    }

    #[test]
    fn test_captain_outside_squad_rejected() {
        let mut plan = valid_plan();
        plan.team_a.captain_id = "b1".to_string();
        assert!(schedule_match(plan).is_err());
    }

    #[test]
    fn test_missing_details_rejected() {
        let mut plan = valid_plan();
        plan.name = "  ".to_string();
        assert!(schedule_match(plan).is_err());

        let mut plan = valid_plan();
        plan.total_overs = 0;
        assert!(schedule_match(plan).is_err());
    }

    #[test]
    fn test_duplicate_within_squad_rejected() {
        let mut plan = valid_plan();
        plan.team_a.player_ids[5] = "a1".to_string();
        assert!(schedule_match(plan).is_err());
    }
}
