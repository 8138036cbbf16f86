//! Ball event model: one delivery as reported by the scorer.
//!
//! A delivery is a base outcome (runs, a short run, a Wide, or a No-ball),
//! an optional dismissal, and an optional speed-gun reading. Strike
//! rotation is driven by run parity, but the parity source differs by
//! outcome: completed runs for ordinary deliveries, *attempted* runs for a
//! short run (the batsmen physically ran that many), and the extra-run
//! count for Wides and No-balls.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::DismissalKind;

/// Base outcome of a single delivery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BallOutcome {
    /// Standard scoring delivery: 0, 1, 2, 3, 4 or 6 off the bat
    /// (any completed-run count when a run out cut the attempt short).
    Runs(u32),
    /// `scored` runs credited out of `attempted` physically run.
    ShortRun { scored: u32, attempted: u32 },
    /// One penalty run plus `extra_runs` byes off the wide.
    Wide { extra_runs: u32 },
    /// One penalty run plus `extra_runs` hit off the no-ball.
    NoBall { extra_runs: u32 },
}

impl BallOutcome {
    /// Wides and No-balls do not count toward the over.
    pub fn is_legal(&self) -> bool {
        !matches!(self, BallOutcome::Wide { .. } | BallOutcome::NoBall { .. })
    }

    /// Runs credited to the striker and the total.
    pub fn credited_runs(&self) -> u32 {
        match self {
            BallOutcome::Runs(n) => *n,
            BallOutcome::ShortRun { scored, .. } => *scored,
            BallOutcome::Wide { .. } | BallOutcome::NoBall { .. } => 0,
        }
    }

    /// Run count whose parity decides whether the batsmen swap ends.
    pub fn rotation_runs(&self) -> u32 {
        match self {
            BallOutcome::Runs(n) => *n,
            BallOutcome::ShortRun { attempted, .. } => *attempted,
            BallOutcome::Wide { extra_runs } | BallOutcome::NoBall { extra_runs } => *extra_runs,
        }
    }
}

/// Dismissal details attached to a delivery.
///
/// For a run out the scorer must also resolve which batter was out, who
/// replaces them, and whether the pair crossed during the fatal attempt;
/// the engine derives the surviving batter's end from those facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dismissal {
    pub kind: DismissalKind,
    pub fielder_id: Option<String>,
    /// Which batter was out; defaults to the striker when absent.
    pub batsman_out_id: Option<String>,
    /// Incoming replacement, required to resolve a run out mid-innings.
    pub new_batsman_id: Option<String>,
    /// Had the batsmen crossed ends when the run out was completed?
    pub batsmen_crossed: bool,
}

/// One delivery as fed to [`LiveMatchEngine::process_ball`].
///
/// [`LiveMatchEngine::process_ball`]: crate::engine::LiveMatchEngine::process_ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallEvent {
    pub outcome: BallOutcome,
    pub dismissal: Option<Dismissal>,
    /// Speed-gun reading in km/h, if one was taken.
    pub speed_kmh: Option<f32>,
}

impl BallEvent {
    /// Plain scoring delivery.
    pub fn runs(n: u32) -> Self {
        Self { outcome: BallOutcome::Runs(n), dismissal: None, speed_kmh: None }
    }

    /// Short run: `scored` credited of `attempted` run.
    pub fn short_run(scored: u32, attempted: u32) -> Self {
        Self {
            outcome: BallOutcome::ShortRun { scored, attempted },
            dismissal: None,
            speed_kmh: None,
        }
    }

    pub fn wide(extra_runs: u32) -> Self {
        Self { outcome: BallOutcome::Wide { extra_runs }, dismissal: None, speed_kmh: None }
    }

    pub fn no_ball(extra_runs: u32) -> Self {
        Self { outcome: BallOutcome::NoBall { extra_runs }, dismissal: None, speed_kmh: None }
    }

    /// Bowled, Caught or LBW, always a zero-run delivery.
    pub fn wicket(kind: DismissalKind, fielder_id: Option<&str>) -> Self {
        Self {
            outcome: BallOutcome::Runs(0),
            dismissal: Some(Dismissal {
                kind,
                fielder_id: fielder_id.map(str::to_string),
                batsman_out_id: None,
                new_batsman_id: None,
                batsmen_crossed: false,
            }),
            speed_kmh: None,
        }
    }

    /// Run out after `completed_runs`, fully resolved by the scorer.
    pub fn run_out(
        completed_runs: u32,
        batsman_out_id: &str,
        new_batsman_id: &str,
        fielder_id: &str,
        batsmen_crossed: bool,
    ) -> Self {
        Self {
            outcome: BallOutcome::Runs(completed_runs),
            dismissal: Some(Dismissal {
                kind: DismissalKind::RunOut,
                fielder_id: Some(fielder_id.to_string()),
                batsman_out_id: Some(batsman_out_id.to_string()),
                new_batsman_id: Some(new_batsman_id.to_string()),
                batsmen_crossed,
            }),
            speed_kmh: None,
        }
    }

    pub fn with_speed(mut self, speed_kmh: f32) -> Self {
        self.speed_kmh = Some(speed_kmh);
        self
    }

    /// Reject shapes the scorer UI could never legitimately produce.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self.outcome {
            BallOutcome::Runs(n) => {
                let is_run_out = self
                    .dismissal
                    .as_ref()
                    .map(|d| d.kind == DismissalKind::RunOut)
                    .unwrap_or(false);
                if !is_run_out && !matches!(n, 0 | 1 | 2 | 3 | 4 | 6) {
                    return Err(EngineError::InvalidEvent(format!(
                        "{} is not a standard scoring delivery",
                        n
                    )));
                }
            }
            BallOutcome::ShortRun { scored, attempted } => {
                if attempted <= scored {
                    return Err(EngineError::InvalidEvent(
                        "runs attempted must be greater than runs scored".to_string(),
                    ));
                }
                if self.dismissal.is_some() {
                    return Err(EngineError::InvalidEvent(
                        "a short run cannot carry a dismissal".to_string(),
                    ));
                }
            }
            BallOutcome::Wide { .. } | BallOutcome::NoBall { .. } => {
                if self.dismissal.is_some() {
                    return Err(EngineError::InvalidEvent(
                        "dismissals attach to legal deliveries only".to_string(),
                    ));
                }
            }
        }

        if let Some(dismissal) = &self.dismissal {
            match dismissal.kind {
                DismissalKind::RunOut => {}
                _ => {
                    if self.outcome != BallOutcome::Runs(0) {
                        return Err(EngineError::InvalidEvent(format!(
                            "{} must be recorded on a zero-run delivery",
                            dismissal.kind.name()
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Compact notation for the current-over strip: `"4"`, `"Wd+2"`,
    /// `"Nb"`, `"1S2"`, `"W"`, `"1RO"`.
    pub fn notation(&self) -> String {
        match (&self.outcome, &self.dismissal) {
            (BallOutcome::Runs(_), Some(d)) if d.kind != DismissalKind::RunOut => "W".to_string(),
            (BallOutcome::Runs(n), Some(_)) => format!("{}RO", n),
            (BallOutcome::Runs(n), None) => n.to_string(),
            (BallOutcome::ShortRun { scored, attempted }, _) => format!("{}S{}", scored, attempted),
            (BallOutcome::Wide { extra_runs: 0 }, _) => "Wd".to_string(),
            (BallOutcome::Wide { extra_runs }, _) => format!("Wd+{}", extra_runs),
            (BallOutcome::NoBall { extra_runs: 0 }, _) => "Nb".to_string(),
            (BallOutcome::NoBall { extra_runs }, _) => format!("Nb+{}", extra_runs),
        }
    }
}
