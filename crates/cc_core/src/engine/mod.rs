//! Live scoring engine: ball events, the match state machine, tie-break
//! procedures, and the Man of the Match computation.

pub mod ball_event;
pub mod bowl_out;
pub mod live_match;
pub mod man_of_match;

#[cfg(test)]
mod scenario_tests;

pub use ball_event::{BallEvent, BallOutcome, Dismissal};
pub use bowl_out::{BowlOutProgress, BowlOutState, BOWL_OUT_ROUNDS};
pub use live_match::{
    InningsNumber, LiveMatchEngine, LiveMatchProgress, LiveState, Segment, Stage, BALLS_PER_OVER,
    MAX_WICKETS, SUPER_OVER_WICKETS,
};
pub use man_of_match::compute_man_of_the_match;
