//! # cc_core - Cricket Club Management Core
//!
//! This library runs a cricket club's operations: player registry, match
//! scheduling, fee tracking, and, at its heart, a ball-by-ball live
//! scoring engine.
//!
//! ## Features
//! - Replayable live scoring state machine (toss → innings → tie-breaks)
//! - Strike rotation, free-hit suppression and run-out resolution rules
//! - Super Over and Bowl Out tie-break ladder with escalation limits
//! - Per-over undo from full pre-ball snapshots
//! - Deterministic Man of the Match computation
//! - Whole-state persistence as one checksummed, compressed blob

pub mod engine;
pub mod error;
pub mod finance;
pub mod models;
pub mod roster;
pub mod save;
pub mod scheduling;
pub mod scorecard;
pub mod state;

// Re-export the scoring engine surface
pub use engine::{
    BallEvent, BallOutcome, Dismissal, InningsNumber, LiveMatchEngine, LiveMatchProgress,
    LiveState, Segment, Stage,
};
pub use error::{CoreError, EngineError, EngineResult, Result};

// Re-export the domain model
pub use models::{
    BatsmanStats, BowlerStats, DismissalKind, FallOfWicket, FeeStatus, Gender, Innings,
    InningsPair, Match, MatchStatus, Player, PlayerRole, TeamRoster, TieBreaker, TossDecision,
    Withdrawal,
};

// Re-export collaborators
pub use finance::{financial_summary, FinancialSummary, WithdrawalRequest};
pub use roster::{export_players, import_players, ImportReport, PlayerRecord};
pub use save::{AppSave, SaveError, SaveManager};
pub use scheduling::{schedule_match, MatchPlan, TeamPlan};
pub use state::{get_state, get_state_mut, reset_state, set_state, AppState, APP_STATE};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
