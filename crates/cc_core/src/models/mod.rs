pub mod innings;
pub mod match_record;
pub mod player;

pub use innings::{
    BatsmanStats, BowlerStats, DismissalKind, ExtraKind, FallOfWicket, Innings, InningsPair,
};
pub use match_record::{
    BowlOutAttempt, BowlOutOutcome, FastestBall, FeeStatus, Match, MatchStatus, SegmentOutcome,
    TeamRoster, TieBreaker, TossDecision, Withdrawal, DEFAULT_MATCH_FEE, MIN_TEAM_SIZE,
};
pub use player::{Gender, Player, PlayerRole};
