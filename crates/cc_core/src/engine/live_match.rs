//! Live match engine: the state machine driving a fixture from toss to
//! completion.
//!
//! The engine consumes one ball event at a time against the active innings
//! ledger, decides innings- and match-ending conditions after every ball,
//! and walks the tie-break ladder (Super Over, Bowl Out) when scores finish
//! level. All operator input (openers, replacement batsmen, new bowlers,
//! bowl-out nominations) arrives through explicit fallible selection
//! operations; while a required selection is missing the engine refuses
//! further deliveries instead of guessing.
//!
//! Every accepted event snapshots the full scoring state first, so the last
//! ball of the current over can always be undone.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::engine::ball_event::{BallEvent, BallOutcome};
use crate::engine::bowl_out::{BowlOutProgress, BowlOutState};
use crate::engine::man_of_match::compute_man_of_the_match;
use crate::error::{CoreError, EngineError, EngineResult};
use crate::models::{
    DismissalKind, ExtraKind, FastestBall, Innings, InningsPair, Match, MatchStatus,
    SegmentOutcome, TieBreaker, TossDecision, MIN_TEAM_SIZE,
};

/// Legal deliveries per over.
pub const BALLS_PER_OVER: u32 = 6;

/// Wickets that close a normal innings.
pub const MAX_WICKETS: u32 = 10;

/// Wickets that close a Super Over innings.
pub const SUPER_OVER_WICKETS: u32 = 2;

/// Which innings of the current segment is being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InningsNumber {
    First,
    Second,
}

/// Which segment the engine is scoring: the main match or a Super Over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    Main,
    SuperOver,
}

/// Ball-level cursor while a segment is in play.
///
/// A `None` in any of the three crease/bowler slots means the engine is
/// blocked waiting for an operator selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveState {
    pub on_strike: Option<String>,
    pub off_strike: Option<String>,
    pub bowler: Option<String>,
    /// Bowler of the previous over; may not bowl consecutive overs.
    pub previous_bowler: Option<String>,
    /// Notation of every delivery in the current over, oldest first.
    pub over_events: Vec<String>,
    /// Chase target; 0 during a first innings.
    pub target: u32,
    pub is_free_hit: bool,
}

impl LiveState {
    fn opening(striker: String, non_striker: String, bowler: String, target: u32) -> Self {
        Self {
            on_strike: Some(striker),
            off_strike: Some(non_striker),
            bowler: Some(bowler),
            previous_bowler: None,
            over_events: Vec::new(),
            target,
            is_free_hit: false,
        }
    }
}

/// Engine stage. Each variant carries exactly the state that stage needs,
/// so an impossible combination (bowl-out state during play, a live cursor
/// during the toss) cannot be represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stage {
    Toss,
    Decision { toss_winner: String },
    Openers,
    Play { live: LiveState },
    InningsBreak,
    TieBreakerSelection,
    BowlOut { state: BowlOutState },
    MatchOver,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Toss => "toss",
            Stage::Decision { .. } => "decision",
            Stage::Openers => "openers",
            Stage::Play { .. } => "play",
            Stage::InningsBreak => "innings break",
            Stage::TieBreakerSelection => "tie-breaker selection",
            Stage::BowlOut { .. } => "bowl out",
            Stage::MatchOver => "match over",
        }
    }
}

/// Resumable snapshot of the whole in-progress state machine, persisted on
/// the match record after every accepted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveMatchProgress {
    pub stage: Stage,
    pub current_innings: InningsNumber,
    pub segment: Segment,
    pub innings: InningsPair,
    /// Main-match innings frozen at the moment the scores finished level.
    pub tied_main_innings: Option<InningsPair>,
    pub tie_breakers: Vec<TieBreaker>,
}

/// Pre-event snapshot for undo.
#[derive(Debug, Clone)]
struct UndoSnapshot {
    innings: InningsPair,
    live: LiveState,
    fastest_ball: Option<FastestBall>,
}

pub struct LiveMatchEngine {
    match_rec: Match,
    stage: Stage,
    current_innings: InningsNumber,
    segment: Segment,
    innings: InningsPair,
    tied_main_innings: Option<InningsPair>,
    tie_breakers: Vec<TieBreaker>,
    history: Vec<UndoSnapshot>,
    rng: ChaCha8Rng,
}

impl LiveMatchEngine {
    /// Take over a scheduled match, or resume a live one from its persisted
    /// progress snapshot.
    ///
    /// The seed drives the toss only; two engines with the same seed and
    /// the same event feed produce identical matches.
    pub fn new(mut match_rec: Match, seed: u64) -> Result<Self, CoreError> {
        if match_rec.status == MatchStatus::Completed {
            return Err(CoreError::Validation("match is already completed".to_string()));
        }

        if let Some(progress) = match_rec.live_progress.take() {
            log::info!("resuming match {} at stage {}", match_rec.id, progress.stage.name());
            return Ok(Self {
                match_rec,
                stage: progress.stage,
                current_innings: progress.current_innings,
                segment: progress.segment,
                innings: progress.innings,
                tied_main_innings: progress.tied_main_innings,
                tie_breakers: progress.tie_breakers,
                history: Vec::new(),
                rng: ChaCha8Rng::seed_from_u64(seed),
            });
        }

        Self::validate_for_start(&match_rec)?;
        let innings = InningsPair::new(&match_rec.players);
        match_rec.status = MatchStatus::Live;
        log::info!("match {} is live", match_rec.id);

        Ok(Self {
            match_rec,
            stage: Stage::Toss,
            current_innings: InningsNumber::First,
            segment: Segment::Main,
            innings,
            tied_main_innings: None,
            tie_breakers: Vec::new(),
            history: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    fn validate_for_start(match_rec: &Match) -> Result<(), CoreError> {
        if match_rec.teams.len() != 2 {
            return Err(CoreError::Validation(format!(
                "a match needs exactly two teams, found {}",
                match_rec.teams.len()
            )));
        }
        for team in &match_rec.teams {
            if team.player_ids.len() < MIN_TEAM_SIZE {
                return Err(CoreError::Validation(format!(
                    "{} has {} players, needs at least {}",
                    team.name,
                    team.player_ids.len(),
                    MIN_TEAM_SIZE
                )));
            }
            if !team.contains(&team.captain_id) {
                return Err(CoreError::Validation(format!(
                    "captain of {} is not in its squad",
                    team.name
                )));
            }
        }
        let (a, b) = (&match_rec.teams[0], &match_rec.teams[1]);
        if let Some(shared) = a.player_ids.iter().find(|id| b.contains(id)) {
            return Err(CoreError::Validation(format!(
                "player {} appears in both squads",
                shared
            )));
        }
        Ok(())
    }

    // ========================
    // Accessors
    // ========================

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn match_record(&self) -> &Match {
        &self.match_rec
    }

    pub fn into_match(self) -> Match {
        self.match_rec
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    pub fn innings_number(&self) -> InningsNumber {
        self.current_innings
    }

    pub fn active_innings(&self) -> &Innings {
        match self.current_innings {
            InningsNumber::First => &self.innings.first,
            InningsNumber::Second => &self.innings.second,
        }
    }

    fn active_innings_mut(&mut self) -> &mut Innings {
        match self.current_innings {
            InningsNumber::First => &mut self.innings.first,
            InningsNumber::Second => &mut self.innings.second,
        }
    }

    pub fn live(&self) -> Option<&LiveState> {
        match &self.stage {
            Stage::Play { live } => Some(live),
            _ => None,
        }
    }

    pub fn tie_breakers(&self) -> &[TieBreaker] {
        &self.tie_breakers
    }

    /// Batting-team players who are not out and not currently at the crease.
    pub fn selectable_batsmen(&self) -> Vec<String> {
        let innings = self.active_innings();
        let at_crease: Vec<&str> = self
            .live()
            .map(|l| {
                l.on_strike
                    .iter()
                    .chain(l.off_strike.iter())
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default();
        self.match_rec
            .team(&innings.batting_team)
            .map(|team| {
                team.player_ids
                    .iter()
                    .filter(|id| {
                        !innings.batsman(id.as_str()).map(|s| s.is_out).unwrap_or(false)
                            && !at_crease.contains(&id.as_str())
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Bowling-team players eligible for the next over.
    pub fn selectable_bowlers(&self) -> Vec<String> {
        let innings = self.active_innings();
        let (current, previous) = self
            .live()
            .map(|l| (l.bowler.clone(), l.previous_bowler.clone()))
            .unwrap_or((None, None));
        self.match_rec
            .team(&innings.bowling_team)
            .map(|team| {
                team.player_ids
                    .iter()
                    .filter(|id| Some(*id) != current.as_ref() && Some(*id) != previous.as_ref())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn segment_limits(&self) -> (u32, Option<u32>) {
        match self.segment {
            Segment::SuperOver => (SUPER_OVER_WICKETS, Some(BALLS_PER_OVER)),
            Segment::Main => (
                MAX_WICKETS,
                self.match_rec.total_overs.map(|o| o as u32 * BALLS_PER_OVER),
            ),
        }
    }

    // ========================
    // Toss and decision
    // ========================

    /// Flip the coin. Returns the winning team's name.
    pub fn perform_toss(&mut self) -> EngineResult<String> {
        if !matches!(self.stage, Stage::Toss) {
            return Err(EngineError::InvalidStage { expected: "toss", found: self.stage.name() });
        }
        let index = usize::from(self.rng.gen_bool(0.5));
        let winner = self.match_rec.teams[index].name.clone();
        log::info!("toss won by {}", winner);
        self.stage = Stage::Decision { toss_winner: winner.clone() };
        self.sync_progress();
        Ok(winner)
    }

    /// Record the toss winner's choice. Fixes the batting order of both
    /// innings; immutable afterwards.
    pub fn record_decision(&mut self, decision: TossDecision) -> EngineResult<()> {
        let toss_winner = match &self.stage {
            Stage::Decision { toss_winner } => toss_winner.clone(),
            other => {
                return Err(EngineError::InvalidStage { expected: "decision", found: other.name() })
            }
        };

        self.match_rec.toss_winner = Some(toss_winner.clone());
        self.match_rec.decision = Some(decision);

        let first_bat = self
            .match_rec
            .first_batting_team()
            .expect("toss and decision are both set")
            .to_string();
        let first_bowl = self
            .match_rec
            .opponent_of(&first_bat)
            .expect("a match has two teams")
            .name
            .clone();

        self.innings.first.batting_team = first_bat.clone();
        self.innings.first.bowling_team = first_bowl.clone();
        self.innings.second.batting_team = first_bowl;
        self.innings.second.bowling_team = first_bat;

        log::info!("{} chose to {}", toss_winner, decision.name());
        self.stage = Stage::Openers;
        self.sync_progress();
        Ok(())
    }

    // ========================
    // Openers and mid-innings selections
    // ========================

    /// Start play with two opening batters and the opening bowler.
    pub fn start_play(
        &mut self,
        striker: &str,
        non_striker: &str,
        bowler: &str,
    ) -> EngineResult<()> {
        if !matches!(self.stage, Stage::Openers) {
            return Err(EngineError::InvalidStage { expected: "openers", found: self.stage.name() });
        }
        if striker == non_striker {
            return Err(EngineError::InvalidSelection(
                "openers must be two different players".to_string(),
            ));
        }
        self.check_batsman_eligible(striker)?;
        self.check_batsman_eligible(non_striker)?;
        self.check_bowler_member(bowler)?;

        let target = match self.current_innings {
            InningsNumber::First => 0,
            InningsNumber::Second => self.innings.first.score + 1,
        };

        self.stage = Stage::Play {
            live: LiveState::opening(
                striker.to_string(),
                non_striker.to_string(),
                bowler.to_string(),
                target,
            ),
        };
        self.history.clear();
        self.sync_progress();
        Ok(())
    }

    /// Fill the vacant striker slot after a wicket.
    pub fn select_striker(&mut self, batsman_id: &str) -> EngineResult<()> {
        self.check_batsman_eligible(batsman_id)?;
        let live = self.live_mut()?;
        if live.on_strike.is_some() {
            return Err(EngineError::InvalidSelection("striker slot is occupied".to_string()));
        }
        if live.off_strike.as_deref() == Some(batsman_id) {
            return Err(EngineError::InvalidSelection(format!(
                "{} is already at the crease",
                batsman_id
            )));
        }
        live.on_strike = Some(batsman_id.to_string());
        self.sync_progress();
        Ok(())
    }

    /// Fill the vacant non-striker slot after a wicket.
    pub fn select_non_striker(&mut self, batsman_id: &str) -> EngineResult<()> {
        self.check_batsman_eligible(batsman_id)?;
        let live = self.live_mut()?;
        if live.off_strike.is_some() {
            return Err(EngineError::InvalidSelection("non-striker slot is occupied".to_string()));
        }
        if live.on_strike.as_deref() == Some(batsman_id) {
            return Err(EngineError::InvalidSelection(format!(
                "{} is already at the crease",
                batsman_id
            )));
        }
        live.off_strike = Some(batsman_id.to_string());
        self.sync_progress();
        Ok(())
    }

    /// Choose the bowler for the new over. The previous over's bowler is
    /// not eligible.
    pub fn select_bowler(&mut self, bowler_id: &str) -> EngineResult<()> {
        self.check_bowler_member(bowler_id)?;
        let live = self.live_mut()?;
        if live.bowler.is_some() {
            return Err(EngineError::InvalidSelection(
                "an over is in progress, use replace_bowler before the first ball".to_string(),
            ));
        }
        if live.previous_bowler.as_deref() == Some(bowler_id) {
            return Err(EngineError::InvalidSelection(format!(
                "{} bowled the previous over and cannot bowl consecutive overs",
                bowler_id
            )));
        }
        live.bowler = Some(bowler_id.to_string());
        self.sync_progress();
        Ok(())
    }

    /// Swap the bowler before the over's first delivery.
    pub fn replace_bowler(&mut self, bowler_id: &str) -> EngineResult<()> {
        self.check_bowler_member(bowler_id)?;
        let live = self.live_mut()?;
        if !live.over_events.is_empty() {
            return Err(EngineError::InvalidSelection(
                "the over has started, the bowler cannot change".to_string(),
            ));
        }
        if live.previous_bowler.as_deref() == Some(bowler_id) {
            return Err(EngineError::InvalidSelection(format!(
                "{} bowled the previous over and cannot bowl consecutive overs",
                bowler_id
            )));
        }
        live.bowler = Some(bowler_id.to_string());
        self.sync_progress();
        Ok(())
    }

    fn live_mut(&mut self) -> EngineResult<&mut LiveState> {
        match &mut self.stage {
            Stage::Play { live } => Ok(live),
            other => Err(EngineError::InvalidStage { expected: "play", found: other.name() }),
        }
    }

    fn check_batsman_eligible(&self, batsman_id: &str) -> EngineResult<()> {
        let innings = self.active_innings();
        let team = self
            .match_rec
            .team(&innings.batting_team)
            .ok_or_else(|| EngineError::InvalidSelection("batting team not set".to_string()))?;
        if !team.contains(batsman_id) {
            return Err(EngineError::InvalidSelection(format!(
                "{} is not in the batting side",
                batsman_id
            )));
        }
        if innings.batsman(batsman_id).map(|s| s.is_out).unwrap_or(false) {
            return Err(EngineError::InvalidSelection(format!(
                "{} is already dismissed",
                batsman_id
            )));
        }
        Ok(())
    }

    fn check_bowler_member(&self, bowler_id: &str) -> EngineResult<()> {
        let innings = self.active_innings();
        let team = self
            .match_rec
            .team(&innings.bowling_team)
            .ok_or_else(|| EngineError::InvalidSelection("bowling team not set".to_string()))?;
        if !team.contains(bowler_id) {
            return Err(EngineError::InvalidSelection(format!(
                "{} is not in the bowling side",
                bowler_id
            )));
        }
        Ok(())
    }

    // ========================
    // Ball processing
    // ========================

    /// Score one delivery against the active innings.
    ///
    /// After the ledger update, end conditions are checked in priority
    /// order (target reached, then innings over); if the segment continues,
    /// the crease cursor is advanced per the rotation rules.
    pub fn process_ball(&mut self, event: BallEvent) -> EngineResult<()> {
        event.validate()?;

        let live = match &self.stage {
            Stage::Play { live } => live.clone(),
            other => {
                return Err(EngineError::InvalidStage { expected: "play", found: other.name() })
            }
        };
        let striker =
            live.on_strike.clone().ok_or(EngineError::SelectionRequired("striker"))?;
        let non_striker =
            live.off_strike.clone().ok_or(EngineError::SelectionRequired("non-striker"))?;
        let bowler = live.bowler.clone().ok_or(EngineError::SelectionRequired("bowler"))?;

        if let Some(dismissal) = &event.dismissal {
            if let Some(out_id) = &dismissal.batsman_out_id {
                if out_id != &striker && out_id != &non_striker {
                    return Err(EngineError::InvalidSelection(format!(
                        "{} is not at the crease",
                        out_id
                    )));
                }
            }
            if let Some(new_id) = &dismissal.new_batsman_id {
                if new_id == &striker || new_id == &non_striker {
                    return Err(EngineError::InvalidSelection(format!(
                        "{} is already at the crease",
                        new_id
                    )));
                }
                self.check_batsman_eligible(new_id)?;
            }
        }

        self.history.push(UndoSnapshot {
            innings: self.innings.clone(),
            live: live.clone(),
            fastest_ball: self.match_rec.fastest_ball.clone(),
        });

        // Ledger update.
        {
            let innings = self.active_innings_mut();
            match event.outcome {
                BallOutcome::Runs(n) => innings.apply_runs(&striker, &bowler, n, true),
                BallOutcome::ShortRun { scored, .. } => {
                    innings.apply_runs(&striker, &bowler, scored, false)
                }
                BallOutcome::Wide { extra_runs } => {
                    innings.apply_extra(ExtraKind::Wide, extra_runs, &bowler, &striker)
                }
                BallOutcome::NoBall { extra_runs } => {
                    innings.apply_extra(ExtraKind::NoBall, extra_runs, &bowler, &striker)
                }
            }
            if event.outcome.is_legal() {
                innings.record_ball(&bowler);
            }
        }

        if event.outcome.is_legal() {
            if let Some(speed) = event.speed_kmh {
                let is_record = self
                    .match_rec
                    .fastest_ball
                    .as_ref()
                    .map(|fb| speed > fb.speed_kmh)
                    .unwrap_or(true);
                if is_record {
                    log::info!("new fastest ball: {:.1} km/h by {}", speed, bowler);
                    self.match_rec.fastest_ball =
                        Some(FastestBall { bowler_id: bowler.clone(), speed_kmh: speed });
                }
            }
        }

        // Wicket, unless the free hit protects the batter.
        let mut dismissed: Option<String> = None;
        if let Some(dismissal) = &event.dismissal {
            let out_id = dismissal.batsman_out_id.clone().unwrap_or_else(|| striker.clone());
            if live.is_free_hit && dismissal.kind.suppressed_on_free_hit() {
                log::debug!("{} dismissal suppressed by free hit", dismissal.kind.name());
            } else {
                self.active_innings_mut().record_wicket(
                    &out_id,
                    dismissal.kind,
                    &bowler,
                    dismissal.fielder_id.as_deref(),
                );
                dismissed = Some(out_id);
            }
        }

        // End conditions, target first.
        let (max_wickets, max_balls) = self.segment_limits();
        let innings = self.active_innings();
        let batting_team = innings.batting_team.clone();
        let bowling_team = innings.bowling_team.clone();
        let score = innings.score;
        let wickets = innings.wickets;
        let available = self
            .match_rec
            .team(&batting_team)
            .map(|team| innings.available_batsmen(&team.player_ids).len())
            .unwrap_or(0);

        let innings_over = wickets >= max_wickets
            || max_balls.map(|m| innings.total_legal_balls >= m).unwrap_or(false)
            || (available <= 1 && event.dismissal.is_none());
        let target_reached = self.current_innings == InningsNumber::Second
            && live.target > 0
            && score >= live.target;

        if target_reached {
            match self.segment {
                Segment::SuperOver => {
                    let result = format!("{} won in Super Over", batting_team);
                    self.finalize_super_over(&result);
                    let final_innings = self
                        .tied_main_innings
                        .clone()
                        .unwrap_or_else(|| self.innings.clone());
                    self.end_match(Some(&batting_team), result, final_innings);
                }
                Segment::Main => {
                    let remaining = max_wickets - wickets;
                    let result = format!(
                        "{} won by {} wicket{}",
                        batting_team,
                        remaining,
                        plural(remaining)
                    );
                    self.end_match(Some(&batting_team), result, self.innings.clone());
                }
            }
            return Ok(());
        }

        if innings_over {
            match self.current_innings {
                InningsNumber::First => {
                    log::info!(
                        "innings over: {} {}/{} ({} balls)",
                        batting_team,
                        score,
                        wickets,
                        innings.total_legal_balls
                    );
                    self.stage = Stage::InningsBreak;
                    self.sync_progress();
                }
                InningsNumber::Second => match self.segment {
                    Segment::SuperOver => self.conclude_super_over(),
                    Segment::Main => {
                        if score == live.target - 1 {
                            log::info!("match tied at {}", score);
                            self.tied_main_innings = Some(self.innings.clone());
                            self.stage = Stage::TieBreakerSelection;
                            self.sync_progress();
                        } else {
                            let margin = live.target - 1 - score;
                            let result = format!(
                                "{} won by {} run{}",
                                bowling_team,
                                margin,
                                plural(margin)
                            );
                            self.end_match(Some(&bowling_team), result, self.innings.clone());
                        }
                    }
                },
            }
            return Ok(());
        }

        // Advance the crease cursor.
        let mut next_striker = Some(striker.clone());
        let mut next_non_striker = Some(non_striker.clone());

        match (&dismissed, &event.dismissal) {
            (Some(out_id), Some(dismissal))
                if dismissal.kind == DismissalKind::RunOut
                    && dismissal.new_batsman_id.is_some() =>
            {
                // Run-out resolution: completed-run parity moves the
                // not-out batter to a notional end, crossing flips it once
                // more, and the replacement takes the other end.
                let new_batsman = dismissal.new_batsman_id.clone().unwrap();
                let not_out = if *out_id == striker {
                    non_striker.clone()
                } else {
                    striker.clone()
                };
                let striker_after_runs = if event.outcome.credited_runs() % 2 == 1 {
                    non_striker.clone()
                } else {
                    striker.clone()
                };
                let not_out_at_strikers_end = not_out == striker_after_runs;
                let not_out_takes_strike = not_out_at_strikers_end != dismissal.batsmen_crossed;
                if not_out_takes_strike {
                    next_striker = Some(not_out);
                    next_non_striker = Some(new_batsman);
                } else {
                    next_striker = Some(new_batsman);
                    next_non_striker = Some(not_out);
                }
            }
            (Some(out_id), Some(_)) => {
                // Any other dismissal vacates the out batter's end.
                if *out_id == striker {
                    next_striker = None;
                } else {
                    next_non_striker = None;
                }
            }
            _ => {
                // No effective wicket: odd completed (or attempted, for a
                // short run; extra, for a Wide/No-ball) runs swap ends.
                if event.outcome.rotation_runs() % 2 == 1 {
                    std::mem::swap(&mut next_striker, &mut next_non_striker);
                }
            }
        }

        let mut over_events = live.over_events.clone();
        over_events.push(event.notation());
        let legal_in_over = over_events
            .iter()
            .filter(|e| !e.starts_with("Wd") && !e.starts_with("Nb"))
            .count() as u32;
        let over_end =
            event.outcome.is_legal() && legal_in_over > 0 && legal_in_over % BALLS_PER_OVER == 0;

        // End-of-over rotation composes with the run-parity rotation.
        if over_end {
            std::mem::swap(&mut next_striker, &mut next_non_striker);
        }

        let next_free_hit = matches!(event.outcome, BallOutcome::NoBall { .. })
            || (live.is_free_hit && matches!(event.outcome, BallOutcome::Wide { .. }));

        let new_live = LiveState {
            on_strike: next_striker,
            off_strike: next_non_striker,
            bowler: if over_end { None } else { Some(bowler.clone()) },
            previous_bowler: if over_end {
                Some(bowler)
            } else {
                live.previous_bowler.clone()
            },
            over_events: if over_end { Vec::new() } else { over_events },
            target: live.target,
            is_free_hit: next_free_hit,
        };

        if over_end {
            // Undo never crosses an over boundary.
            self.history.clear();
        }

        self.stage = Stage::Play { live: new_live };
        self.sync_progress();
        Ok(())
    }

    /// Restore the state before the most recent ball of this over.
    pub fn undo(&mut self) -> EngineResult<()> {
        if !matches!(self.stage, Stage::Play { .. }) {
            return Err(EngineError::InvalidStage { expected: "play", found: self.stage.name() });
        }
        let snapshot = self.history.pop().ok_or(EngineError::NothingToUndo)?;
        self.innings = snapshot.innings;
        self.match_rec.fastest_ball = snapshot.fastest_ball;
        self.stage = Stage::Play { live: snapshot.live };
        log::info!("last event undone");
        self.sync_progress();
        Ok(())
    }

    // ========================
    // Innings and segment transitions
    // ========================

    /// Leave the innings break and select openers for the chase.
    pub fn start_second_innings(&mut self) -> EngineResult<()> {
        if !matches!(self.stage, Stage::InningsBreak) {
            return Err(EngineError::InvalidStage {
                expected: "innings break",
                found: self.stage.name(),
            });
        }
        self.current_innings = InningsNumber::Second;
        self.history.clear();
        self.stage = Stage::Openers;
        self.sync_progress();
        Ok(())
    }

    /// Begin a Super Over. The side that batted second in the main match
    /// bats first; wickets cap at two and the innings lasts one over.
    pub fn start_super_over(&mut self) -> EngineResult<()> {
        if !matches!(self.stage, Stage::TieBreakerSelection) {
            return Err(EngineError::InvalidStage {
                expected: "tie-breaker selection",
                found: self.stage.name(),
            });
        }
        let tied = self
            .tied_main_innings
            .as_ref()
            .ok_or_else(|| EngineError::InvalidSelection("no tied innings on record".to_string()))?;
        let so_batting = tied.second.batting_team.clone();
        let so_bowling = tied.first.batting_team.clone();

        self.tie_breakers.push(TieBreaker::SuperOver { innings: None, result_description: None });
        self.segment = Segment::SuperOver;
        self.current_innings = InningsNumber::First;

        let mut pair = InningsPair::new(&self.match_rec.players);
        pair.first.batting_team = so_batting.clone();
        pair.first.bowling_team = so_bowling.clone();
        pair.second.batting_team = so_bowling;
        pair.second.bowling_team = so_batting;
        self.innings = pair;

        self.history.clear();
        log::info!("super over {} started", self.tie_breakers.len());
        self.stage = Stage::Openers;
        self.sync_progress();
        Ok(())
    }

    /// Begin a Bowl Out. Each side nominates five bowlers before the first
    /// delivery.
    pub fn start_bowl_out(&mut self) -> EngineResult<()> {
        if !matches!(self.stage, Stage::TieBreakerSelection) {
            return Err(EngineError::InvalidStage {
                expected: "tie-breaker selection",
                found: self.stage.name(),
            });
        }
        self.tie_breakers
            .push(TieBreaker::BowlOut { attempts: Vec::new(), result_description: None });
        let team_a = self.match_rec.teams[0].name.clone();
        let team_b = self.match_rec.teams[1].name.clone();
        log::info!("bowl out {} started", self.tie_breakers.len());
        self.stage = Stage::BowlOut { state: BowlOutState::new(team_a, team_b) };
        self.sync_progress();
        Ok(())
    }

    /// Nominate a side's five bowl-out bowlers.
    pub fn nominate_bowl_out_bowlers(
        &mut self,
        team_name: &str,
        bowlers: Vec<String>,
    ) -> EngineResult<()> {
        let roster = self
            .match_rec
            .team(team_name)
            .ok_or_else(|| EngineError::InvalidSelection(format!("unknown team {}", team_name)))?;
        if let Some(outsider) = bowlers.iter().find(|id| !roster.contains(id)) {
            return Err(EngineError::InvalidSelection(format!(
                "{} is not in {}",
                outsider, team_name
            )));
        }
        match &mut self.stage {
            Stage::BowlOut { state } => state.nominate(team_name, bowlers)?,
            other => {
                return Err(EngineError::InvalidStage { expected: "bowl out", found: other.name() })
            }
        }
        self.sync_progress();
        Ok(())
    }

    /// Bowler due for the next bowl-out delivery, if the procedure is live.
    pub fn bowl_out_next_bowler(&self) -> Option<String> {
        match &self.stage {
            Stage::BowlOut { state } => state.next_bowler().map(str::to_string),
            _ => None,
        }
    }

    /// Score the next bowl-out delivery as a Hit or Miss.
    pub fn record_bowl_out_attempt(
        &mut self,
        outcome: crate::models::BowlOutOutcome,
    ) -> EngineResult<()> {
        let progress = match &mut self.stage {
            Stage::BowlOut { state } => state.record_attempt(outcome)?,
            other => {
                return Err(EngineError::InvalidStage { expected: "bowl out", found: other.name() })
            }
        };

        if let BowlOutProgress::Finished(_) = progress {
            let state = match &self.stage {
                Stage::BowlOut { state } => state.clone(),
                _ => unreachable!("stage checked above"),
            };
            match state.outcome() {
                SegmentOutcome::Decisive { winner } => {
                    let result = format!("{} won in Bowl Out", winner);
                    self.finalize_bowl_out(&state, &result);
                    let final_innings = self
                        .tied_main_innings
                        .clone()
                        .unwrap_or_else(|| self.innings.clone());
                    self.end_match(Some(&winner), result, final_innings);
                }
                SegmentOutcome::Tied => {
                    self.finalize_bowl_out(&state, "Bowl Out Tied");
                    if self.tie_breakers.len() < 2 {
                        log::info!("bowl out tied, offering another tie-breaker");
                        self.stage = Stage::TieBreakerSelection;
                        self.sync_progress();
                    } else {
                        let final_innings = self
                            .tied_main_innings
                            .clone()
                            .unwrap_or_else(|| self.innings.clone());
                        self.end_match(None, "Match Tied after Bowl Out".to_string(), final_innings);
                    }
                }
            }
        } else {
            self.sync_progress();
        }
        Ok(())
    }

    /// Accept the level scores as final: no winner, match tied.
    pub fn declare_tie(&mut self) -> EngineResult<()> {
        if !matches!(self.stage, Stage::TieBreakerSelection) {
            return Err(EngineError::InvalidStage {
                expected: "tie-breaker selection",
                found: self.stage.name(),
            });
        }
        let final_innings = self
            .tied_main_innings
            .clone()
            .unwrap_or_else(|| self.innings.clone());
        self.end_match(None, "Match Tied".to_string(), final_innings);
        Ok(())
    }

    /// Compare Super Over innings once the second closes.
    fn conclude_super_over(&mut self) {
        let first_score = self.innings.first.score;
        let second_score = self.innings.second.score;
        let outcome = if first_score > second_score {
            SegmentOutcome::Decisive { winner: self.innings.first.batting_team.clone() }
        } else if second_score > first_score {
            SegmentOutcome::Decisive { winner: self.innings.second.batting_team.clone() }
        } else {
            SegmentOutcome::Tied
        };

        match outcome {
            SegmentOutcome::Decisive { winner } => {
                let result = format!("{} won in Super Over", winner);
                self.finalize_super_over(&result);
                let final_innings = self
                    .tied_main_innings
                    .clone()
                    .unwrap_or_else(|| self.innings.clone());
                self.end_match(Some(&winner), result, final_innings);
            }
            SegmentOutcome::Tied => {
                self.finalize_super_over("Super Over Tied");
                if self.tie_breakers.len() < 2 {
                    log::info!("super over tied, offering another tie-breaker");
                    self.innings = InningsPair::new(&self.match_rec.players);
                    self.history.clear();
                    self.stage = Stage::TieBreakerSelection;
                    self.sync_progress();
                } else {
                    let final_innings = self
                        .tied_main_innings
                        .clone()
                        .unwrap_or_else(|| self.innings.clone());
                    self.end_match(
                        None,
                        "Match Tied after multiple Super Overs".to_string(),
                        final_innings,
                    );
                }
            }
        }
    }

    /// Write the Super Over innings and result into its tie-breaker entry.
    fn finalize_super_over(&mut self, result: &str) {
        if let Some(TieBreaker::SuperOver { innings, result_description }) =
            self.tie_breakers.last_mut()
        {
            *innings = Some(self.innings.clone());
            *result_description = Some(result.to_string());
        }
    }

    fn finalize_bowl_out(&mut self, state: &BowlOutState, result: &str) {
        if let Some(TieBreaker::BowlOut { attempts, result_description }) =
            self.tie_breakers.last_mut()
        {
            *attempts = state.attempts().to_vec();
            *result_description = Some(result.to_string());
        }
    }

    // ========================
    // Completion
    // ========================

    fn end_match(&mut self, winner: Option<&str>, result: String, final_innings: InningsPair) {
        log::info!("match {} over: {}", self.match_rec.id, result);
        self.match_rec.status = MatchStatus::Completed;
        self.match_rec.winner = winner.map(str::to_string);
        self.match_rec.result_description = Some(result);
        self.match_rec.completion_date = Some(now_rfc3339());
        self.match_rec.innings = Some(final_innings);
        self.match_rec.tie_breakers = self.tie_breakers.clone();
        self.match_rec.live_progress = None;
        self.match_rec.man_of_the_match_id = compute_man_of_the_match(&self.match_rec);
        self.stage = Stage::MatchOver;
    }

    /// Persist the resumable snapshot onto the match record. Called after
    /// every accepted mutation; cleared by completion.
    fn sync_progress(&mut self) {
        if matches!(self.stage, Stage::MatchOver) {
            return;
        }
        self.match_rec.status = MatchStatus::Live;
        if self.segment == Segment::Main {
            self.match_rec.innings = Some(self.innings.clone());
        }
        self.match_rec.live_progress = Some(LiveMatchProgress {
            stage: self.stage.clone(),
            current_innings: self.current_innings,
            segment: self.segment,
            innings: self.innings.clone(),
            tied_main_innings: self.tied_main_innings.clone(),
            tie_breakers: self.tie_breakers.clone(),
        });
    }
}

fn plural(n: u32) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("unknown"))
}
