//! Bowl-out tie-break: alternating deliveries at unguarded stumps.
//!
//! Each side nominates five bowlers in advance. Attempts alternate, one
//! delivery per bowler per round, scored Hit or Miss. The procedure stops
//! early once one side's hits can no longer be caught within the other
//! side's remaining attempts, or after five rounds each.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{BowlOutAttempt, BowlOutOutcome, SegmentOutcome};

/// Bowlers nominated per side.
pub const BOWL_OUT_ROUNDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BowlOutProgress {
    /// More attempts to come.
    Continue,
    /// Decided or tied; no further attempts accepted.
    Finished(FinishedTag),
}

/// Marker so `Finished` stays copyable without dragging the winner string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishedTag {
    Decided,
    Tied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowlOutState {
    team_a: String,
    team_b: String,
    team_a_bowlers: Vec<String>,
    team_b_bowlers: Vec<String>,
    attempts: Vec<BowlOutAttempt>,
}

impl BowlOutState {
    pub fn new(team_a: impl Into<String>, team_b: impl Into<String>) -> Self {
        Self {
            team_a: team_a.into(),
            team_b: team_b.into(),
            team_a_bowlers: Vec::new(),
            team_b_bowlers: Vec::new(),
            attempts: Vec::new(),
        }
    }

    /// Nominate the five bowlers for one side. Both sides must nominate
    /// before the first delivery.
    pub fn nominate(&mut self, team_name: &str, bowlers: Vec<String>) -> Result<(), EngineError> {
        if bowlers.len() != BOWL_OUT_ROUNDS {
            return Err(EngineError::InvalidSelection(format!(
                "{} bowlers nominated, need exactly {}",
                bowlers.len(),
                BOWL_OUT_ROUNDS
            )));
        }
        let mut unique = bowlers.clone();
        unique.sort();
        unique.dedup();
        if unique.len() != bowlers.len() {
            return Err(EngineError::InvalidSelection(
                "a bowler can be nominated only once".to_string(),
            ));
        }

        if team_name == self.team_a {
            self.team_a_bowlers = bowlers;
        } else if team_name == self.team_b {
            self.team_b_bowlers = bowlers;
        } else {
            return Err(EngineError::InvalidSelection(format!("unknown team {}", team_name)));
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        !self.team_a_bowlers.is_empty() && !self.team_b_bowlers.is_empty()
    }

    fn attempts_by(&self, team: &str) -> usize {
        self.attempts.iter().filter(|a| a.team_name == team).count()
    }

    fn hits_by(&self, team: &str) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.team_name == team && a.outcome == BowlOutOutcome::Hit)
            .count()
    }

    /// Team up next. The first roster opens; turns strictly alternate.
    pub fn current_team(&self) -> &str {
        if self.attempts.len() % 2 == 0 {
            &self.team_a
        } else {
            &self.team_b
        }
    }

    /// 1-based round for the team up next.
    pub fn current_round(&self) -> usize {
        self.attempts_by(self.current_team()) + 1
    }

    /// Bowler due to deliver next, once both sides have nominated.
    pub fn next_bowler(&self) -> Option<&str> {
        if !self.is_ready() || self.is_finished() {
            return None;
        }
        let list = if self.current_team() == self.team_a {
            &self.team_a_bowlers
        } else {
            &self.team_b_bowlers
        };
        list.get(self.current_round() - 1).map(String::as_str)
    }

    fn is_finished(&self) -> bool {
        let a_taken = self.attempts_by(&self.team_a);
        let b_taken = self.attempts_by(&self.team_b);
        if a_taken >= BOWL_OUT_ROUNDS && b_taken >= BOWL_OUT_ROUNDS {
            return true;
        }
        let a_hits = self.hits_by(&self.team_a);
        let b_hits = self.hits_by(&self.team_b);
        // One side already out of reach of the other's remaining attempts.
        a_hits > b_hits + (BOWL_OUT_ROUNDS - b_taken) || b_hits > a_hits + (BOWL_OUT_ROUNDS - a_taken)
    }

    /// Record the outcome of the next delivery.
    pub fn record_attempt(&mut self, outcome: BowlOutOutcome) -> Result<BowlOutProgress, EngineError> {
        if !self.is_ready() {
            return Err(EngineError::SelectionRequired("bowl-out bowlers"));
        }
        let bowler_id = self
            .next_bowler()
            .ok_or_else(|| EngineError::InvalidSelection("bowl out already finished".to_string()))?
            .to_string();
        let team_name = self.current_team().to_string();

        self.attempts.push(BowlOutAttempt { team_name, bowler_id, outcome });

        if self.is_finished() {
            let tag = match self.outcome() {
                SegmentOutcome::Decisive { .. } => FinishedTag::Decided,
                SegmentOutcome::Tied => FinishedTag::Tied,
            };
            Ok(BowlOutProgress::Finished(tag))
        } else {
            Ok(BowlOutProgress::Continue)
        }
    }

    /// Outcome by hit count over all attempts so far.
    pub fn outcome(&self) -> SegmentOutcome {
        let a_hits = self.hits_by(&self.team_a);
        let b_hits = self.hits_by(&self.team_b);
        if a_hits > b_hits {
            SegmentOutcome::Decisive { winner: self.team_a.clone() }
        } else if b_hits > a_hits {
            SegmentOutcome::Decisive { winner: self.team_b.clone() }
        } else {
            SegmentOutcome::Tied
        }
    }

    pub fn attempts(&self) -> &[BowlOutAttempt] {
        &self.attempts
    }
}
