//! Match aggregate: one fixture from scheduling through completion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::engine::LiveMatchProgress;
use crate::models::innings::InningsPair;

/// Fee charged per player when a match does not set its own amount.
pub const DEFAULT_MATCH_FEE: f64 = 100.0;

/// Minimum squad size per side before a match may start.
pub const MIN_TEAM_SIZE: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Scheduled,
    Live,
    Completed,
}

impl MatchStatus {
    pub fn name(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "Scheduled",
            MatchStatus::Live => "Live",
            MatchStatus::Completed => "Completed",
        }
    }
}

/// What the toss winner elected to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TossDecision {
    Bat,
    Bowl,
}

impl TossDecision {
    pub fn name(&self) -> &'static str {
        match self {
            TossDecision::Bat => "Bat",
            TossDecision::Bowl => "Bowl",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeeStatus {
    Paid,
    #[default]
    Unpaid,
    Exempt,
}

impl FeeStatus {
    pub fn name(&self) -> &'static str {
        match self {
            FeeStatus::Paid => "Paid",
            FeeStatus::Unpaid => "Unpaid",
            FeeStatus::Exempt => "Exempt",
        }
    }
}

/// Fastest recorded delivery of the match (speed-gun reading).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastestBall {
    pub bowler_id: String,
    pub speed_kmh: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BowlOutOutcome {
    Hit,
    Miss,
}

/// A single bowl-out delivery at the unguarded stumps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowlOutAttempt {
    pub team_name: String,
    pub bowler_id: String,
    pub outcome: BowlOutOutcome,
}

/// Uniform outcome of any match segment: the main innings pair, a Super
/// Over, or a Bowl Out either produces a winner or ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SegmentOutcome {
    Decisive { winner: String },
    Tied,
}

/// One completed or in-progress tie-break procedure.
///
/// The list on [`Match`] can grow to a second entry when a tie-break itself
/// ties; a second consecutive tie ends the match as tied outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TieBreaker {
    SuperOver {
        innings: Option<InningsPair>,
        result_description: Option<String>,
    },
    BowlOut {
        attempts: Vec<BowlOutAttempt>,
        result_description: Option<String>,
    },
}

impl TieBreaker {
    pub fn result_description(&self) -> Option<&str> {
        match self {
            TieBreaker::SuperOver { result_description, .. }
            | TieBreaker::BowlOut { result_description, .. } => result_description.as_deref(),
        }
    }

    /// A tie-breaker is resolved once its result description is written.
    pub fn is_resolved(&self) -> bool {
        self.result_description().is_some()
    }
}

/// One team's entry in a match: name, captain, ordered squad.
///
/// Matches always carry exactly two of these, in scheduling order; the
/// first roster opens the bowl-out and is "team A" everywhere order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub name: String,
    pub captain_id: String,
    pub player_ids: Vec<String>,
}

impl TeamRoster {
    pub fn contains(&self, player_id: &str) -> bool {
        self.player_ids.iter().any(|id| id == player_id)
    }
}

/// Cash withdrawal from the club fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: String,
    pub amount: f64,
    pub reason: String,
    /// ISO `YYYY-MM-DD`
    pub date: String,
    pub person_name: Option<String>,
}

/// Aggregate root for one fixture.
///
/// Lifecycle is strictly `Scheduled → Live → Completed`. While live, the
/// entire in-progress engine state is persisted in `live_progress` after
/// every ball so a match survives a restart; it is cleared on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub name: String,
    /// ISO `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, if scheduled with a start time
    pub time: Option<String>,
    /// Overs per side; `None` means unlimited
    pub total_overs: Option<u16>,

    /// Every player in the fixture, both squads
    pub players: Vec<String>,
    /// Exactly two rosters, scheduling order preserved
    pub teams: Vec<TeamRoster>,

    pub status: MatchStatus,
    pub toss_winner: Option<String>,
    pub decision: Option<TossDecision>,

    pub innings: Option<InningsPair>,
    pub live_progress: Option<LiveMatchProgress>,
    pub tie_breakers: Vec<TieBreaker>,

    /// Winning team name; absent on an undecided tie
    pub winner: Option<String>,
    /// e.g. "Team A won by 20 runs"
    pub result_description: Option<String>,
    /// RFC 3339 completion timestamp
    pub completion_date: Option<String>,
    pub man_of_the_match_id: Option<String>,
    pub fastest_ball: Option<FastestBall>,

    pub fees: HashMap<String, FeeStatus>,
    pub fee_per_player: Option<f64>,
}

impl Match {
    /// Effective per-player fee, falling back to the club default.
    pub fn effective_fee(&self) -> f64 {
        self.fee_per_player.unwrap_or(DEFAULT_MATCH_FEE)
    }

    pub fn team(&self, name: &str) -> Option<&TeamRoster> {
        self.teams.iter().find(|t| t.name == name)
    }

    /// The team the given one plays against.
    pub fn opponent_of(&self, name: &str) -> Option<&TeamRoster> {
        self.teams.iter().find(|t| t.name != name)
    }

    pub fn team_names(&self) -> Vec<&str> {
        self.teams.iter().map(|t| t.name.as_str()).collect()
    }

    /// Roster of the team a player belongs to, if any.
    pub fn team_of(&self, player_id: &str) -> Option<&TeamRoster> {
        self.teams.iter().find(|t| t.contains(player_id))
    }

    /// The batting team of the first innings, derived from toss and decision.
    ///
    /// `Bat` means the toss winner bats first; `Bowl` hands first strike to
    /// the opposition. Innings two is always the mirror image.
    pub fn first_batting_team(&self) -> Option<&str> {
        let toss_winner = self.toss_winner.as_deref()?;
        let decision = self.decision?;
        match decision {
            TossDecision::Bat => Some(toss_winner),
            TossDecision::Bowl => self.opponent_of(toss_winner).map(|t| t.name.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_team_match() -> Match {
        let team_a: Vec<String> = (1..=11).map(|i| format!("a{}", i)).collect();
        let team_b: Vec<String> = (1..=11).map(|i| format!("b{}", i)).collect();
        let mut players = team_a.clone();
        players.extend(team_b.clone());
        Match {
            id: "m1".to_string(),
            name: "Sunday Friendly".to_string(),
            date: "2024-06-02".to_string(),
            time: Some("07:00".to_string()),
            total_overs: Some(10),
            players,
            teams: vec![
                TeamRoster { name: "Team A".into(), captain_id: "a1".into(), player_ids: team_a },
                TeamRoster { name: "Team B".into(), captain_id: "b1".into(), player_ids: team_b },
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
            fees: HashMap::new(),
            fee_per_player: None,
        }
    }

    #[test]
    fn test_effective_fee_defaults() {
        let mut m = two_team_match();
        assert_eq!(m.effective_fee(), DEFAULT_MATCH_FEE);
        m.fee_per_player = Some(150.0);
        assert_eq!(m.effective_fee(), 150.0);
    }

    #[test]
    fn test_team_lookup() {
        let m = two_team_match();
        assert!(m.team("Team A").is_some());
        assert_eq!(m.opponent_of("Team A").unwrap().name, "Team B");
        assert_eq!(m.team_of("b3").unwrap().name, "Team B");
        assert!(m.team_of("zz").is_none());
    }

    #[test]
    fn test_first_batting_team_derivation() {
        let mut m = two_team_match();
        assert!(m.first_batting_team().is_none());

        m.toss_winner = Some("Team B".to_string());
        m.decision = Some(TossDecision::Bat);
        assert_eq!(m.first_batting_team(), Some("Team B"));

        m.decision = Some(TossDecision::Bowl);
        assert_eq!(m.first_batting_team(), Some("Team A"));
    }
}
