//! Innings ledger: pure bookkeeping for one batting effort.
//!
//! The ledger records score, wickets, legal balls, per-player batting and
//! bowling figures, and the fall of wickets. Every mutation corresponds to
//! exactly one ball event; the ledger itself never decides when an innings
//! ends, that is the live match engine's job.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a batter was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DismissalKind {
    Bowled,
    Caught,
    #[serde(rename = "LBW")]
    Lbw,
    #[serde(rename = "Run Out")]
    RunOut,
}

impl DismissalKind {
    pub fn name(&self) -> &'static str {
        match self {
            DismissalKind::Bowled => "Bowled",
            DismissalKind::Caught => "Caught",
            DismissalKind::Lbw => "LBW",
            DismissalKind::RunOut => "Run Out",
        }
    }

    /// The bowler is credited with the wicket for every kind except a run out.
    pub fn credits_bowler(&self) -> bool {
        !matches!(self, DismissalKind::RunOut)
    }

    /// Bowled, Caught and LBW are suppressed while a free hit is live.
    pub fn suppressed_on_free_hit(&self) -> bool {
        matches!(self, DismissalKind::Bowled | DismissalKind::Caught | DismissalKind::Lbw)
    }
}

/// Illegal-delivery kind handled by [`Innings::apply_extra`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtraKind {
    Wide,
    NoBall,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatsmanStats {
    pub runs: u32,
    pub balls: u32,
    pub is_out: bool,
    pub fours: u32,
    pub sixes: u32,
    pub how_out: Option<DismissalKind>,
    /// Fielder involved in the dismissal (catcher or the run-out fielder)
    pub fielder_id: Option<String>,
    /// Bowler credited with the wicket
    pub bowler_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BowlerStats {
    pub balls_bowled: u32,
    pub runs_conceded: u32,
    pub wickets: u32,
}

/// Score/wicket snapshot taken each time a wicket falls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallOfWicket {
    pub score: u32,
    pub wicket: u32,
    pub batsman_id: String,
}

/// One team's batting effort in one segment (a normal innings, or one
/// Super Over innings).
///
/// Both teams' players are pre-populated with zeroed stats so bowler and
/// batter lookups never fail mid-innings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Innings {
    pub batting_team: String,
    pub bowling_team: String,
    pub score: u32,
    pub wickets: u32,
    pub total_legal_balls: u32,
    pub batsmen_stats: HashMap<String, BatsmanStats>,
    pub bowler_stats: HashMap<String, BowlerStats>,
    pub fall_of_wickets: Vec<FallOfWicket>,
}

impl Innings {
    /// Create a zeroed ledger for every player in the match.
    pub fn new(
        player_ids: &[String],
        batting_team: impl Into<String>,
        bowling_team: impl Into<String>,
    ) -> Self {
        let mut batsmen_stats = HashMap::with_capacity(player_ids.len());
        let mut bowler_stats = HashMap::with_capacity(player_ids.len());
        for id in player_ids {
            batsmen_stats.insert(id.clone(), BatsmanStats::default());
            bowler_stats.insert(id.clone(), BowlerStats::default());
        }
        Self {
            batting_team: batting_team.into(),
            bowling_team: bowling_team.into(),
            score: 0,
            wickets: 0,
            total_legal_balls: 0,
            batsmen_stats,
            bowler_stats,
            fall_of_wickets: Vec::new(),
        }
    }

    /// Credit a standard scoring delivery (0, 1, 2, 3, 4, 6) or the scored
    /// portion of a short run.
    ///
    /// Adds to the score, the striker's runs and balls faced, and the
    /// bowler's runs conceded. Boundary counters are bumped only when
    /// `credit_boundary` is set; a short run is never a boundary even if
    /// four runs were scored off it.
    pub fn apply_runs(&mut self, striker_id: &str, bowler_id: &str, runs: u32, credit_boundary: bool) {
        self.score += runs;

        let batsman = self.batsmen_stats.entry(striker_id.to_string()).or_default();
        batsman.runs += runs;
        batsman.balls += 1;
        if credit_boundary {
            if runs == 4 {
                batsman.fours += 1;
            }
            if runs == 6 {
                batsman.sixes += 1;
            }
        }

        if runs > 0 {
            self.bowler_stats.entry(bowler_id.to_string()).or_default().runs_conceded += runs;
        }
    }

    /// Credit a Wide or No-ball: one penalty run plus any extra runs.
    ///
    /// The whole amount is conceded by the bowler. No-ball extra runs are
    /// additionally credited to the striker (they came off the bat), but an
    /// extra never counts as a ball faced. A Wide never touches the striker.
    pub fn apply_extra(&mut self, kind: ExtraKind, extra_runs: u32, bowler_id: &str, striker_id: &str) {
        let total = 1 + extra_runs;
        self.score += total;
        self.bowler_stats.entry(bowler_id.to_string()).or_default().runs_conceded += total;

        if kind == ExtraKind::NoBall && extra_runs > 0 {
            let batsman = self.batsmen_stats.entry(striker_id.to_string()).or_default();
            batsman.runs += extra_runs;
            if extra_runs == 4 {
                batsman.fours += 1;
            }
            if extra_runs == 6 {
                batsman.sixes += 1;
            }
        }
    }

    /// Count a legal delivery against the over limit and the bowler's figures.
    pub fn record_ball(&mut self, bowler_id: &str) {
        self.total_legal_balls += 1;
        self.bowler_stats.entry(bowler_id.to_string()).or_default().balls_bowled += 1;
    }

    /// Record a dismissal at the current score.
    ///
    /// Credits the bowler's wicket tally unless the dismissal was a run out,
    /// and appends a fall-of-wickets entry.
    pub fn record_wicket(
        &mut self,
        batsman_out_id: &str,
        how_out: DismissalKind,
        bowler_id: &str,
        fielder_id: Option<&str>,
    ) {
        self.wickets += 1;

        let batsman = self.batsmen_stats.entry(batsman_out_id.to_string()).or_default();
        batsman.is_out = true;
        batsman.how_out = Some(how_out);
        if let Some(fielder) = fielder_id {
            batsman.fielder_id = Some(fielder.to_string());
        }
        if how_out.credits_bowler() {
            batsman.bowler_id = Some(bowler_id.to_string());
            self.bowler_stats.entry(bowler_id.to_string()).or_default().wickets += 1;
        }

        self.fall_of_wickets.push(FallOfWicket {
            score: self.score,
            wicket: self.wickets,
            batsman_id: batsman_out_id.to_string(),
        });
    }

    /// Not-out players from the given roster (includes the current pair).
    pub fn available_batsmen<'a>(&self, roster: &'a [String]) -> Vec<&'a String> {
        roster
            .iter()
            .filter(|id| !self.batsmen_stats.get(*id).map(|s| s.is_out).unwrap_or(false))
            .collect()
    }

    pub fn batsman(&self, id: &str) -> Option<&BatsmanStats> {
        self.batsmen_stats.get(id)
    }

    pub fn bowler(&self, id: &str) -> Option<&BowlerStats> {
        self.bowler_stats.get(id)
    }
}

/// First and second innings of one segment (main match or Super Over).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InningsPair {
    pub first: Innings,
    pub second: Innings,
}

impl InningsPair {
    pub fn new(player_ids: &[String]) -> Self {
        Self {
            first: Innings::new(player_ids, "", ""),
            second: Innings::new(player_ids, "", ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("p{}", i)).collect()
    }

    #[test]
    fn test_new_prepopulates_both_teams() {
        let innings = Innings::new(&ids(22), "Team A", "Team B");
        assert_eq!(innings.batsmen_stats.len(), 22);
        assert_eq!(innings.bowler_stats.len(), 22);
        assert_eq!(innings.score, 0);
        assert_eq!(innings.wickets, 0);
        assert!(innings.fall_of_wickets.is_empty());
    }

    #[test]
    fn test_apply_runs_credits_striker_and_bowler() {
        let mut innings = Innings::new(&ids(4), "A", "B");
        innings.apply_runs("p1", "p3", 4, true);
        innings.apply_runs("p1", "p3", 6, true);
        innings.apply_runs("p1", "p3", 0, true);

        assert_eq!(innings.score, 10);
        let batsman = innings.batsman("p1").unwrap();
        assert_eq!(batsman.runs, 10);
        assert_eq!(batsman.balls, 3);
        assert_eq!(batsman.fours, 1);
        assert_eq!(batsman.sixes, 1);
        assert_eq!(innings.bowler("p3").unwrap().runs_conceded, 10);
    }

    #[test]
    fn test_short_run_does_not_count_boundary() {
        let mut innings = Innings::new(&ids(4), "A", "B");
        innings.apply_runs("p1", "p3", 4, false);
        let batsman = innings.batsman("p1").unwrap();
        assert_eq!(batsman.runs, 4);
        assert_eq!(batsman.fours, 0);
    }

    #[test]
    fn test_wide_never_touches_striker() {
        let mut innings = Innings::new(&ids(4), "A", "B");
        innings.apply_extra(ExtraKind::Wide, 2, "p3", "p1");

        assert_eq!(innings.score, 3);
        assert_eq!(innings.bowler("p3").unwrap().runs_conceded, 3);
        let batsman = innings.batsman("p1").unwrap();
        assert_eq!(batsman.runs, 0);
        assert_eq!(batsman.balls, 0);
    }

    #[test]
    fn test_no_ball_extras_credited_to_striker() {
        let mut innings = Innings::new(&ids(4), "A", "B");
        innings.apply_extra(ExtraKind::NoBall, 4, "p3", "p1");

        assert_eq!(innings.score, 5);
        assert_eq!(innings.bowler("p3").unwrap().runs_conceded, 5);
        let batsman = innings.batsman("p1").unwrap();
        assert_eq!(batsman.runs, 4);
        assert_eq!(batsman.fours, 1);
        // an extra is never a ball faced
        assert_eq!(batsman.balls, 0);
    }

    #[test]
    fn test_record_ball_counts_only_legal_deliveries() {
        let mut innings = Innings::new(&ids(4), "A", "B");
        innings.record_ball("p3");
        innings.record_ball("p3");
        assert_eq!(innings.total_legal_balls, 2);
        assert_eq!(innings.bowler("p3").unwrap().balls_bowled, 2);
    }

    #[test]
    fn test_wicket_credits_bowler_except_run_out() {
        let mut innings = Innings::new(&ids(4), "A", "B");
        innings.apply_runs("p1", "p3", 2, true);
        innings.record_wicket("p1", DismissalKind::Bowled, "p3", None);
        innings.record_wicket("p2", DismissalKind::RunOut, "p3", Some("p4"));

        assert_eq!(innings.wickets, 2);
        assert_eq!(innings.bowler("p3").unwrap().wickets, 1);

        let first = innings.batsman("p1").unwrap();
        assert!(first.is_out);
        assert_eq!(first.how_out, Some(DismissalKind::Bowled));
        assert_eq!(first.bowler_id.as_deref(), Some("p3"));

        let second = innings.batsman("p2").unwrap();
        assert_eq!(second.how_out, Some(DismissalKind::RunOut));
        assert_eq!(second.fielder_id.as_deref(), Some("p4"));
        assert!(second.bowler_id.is_none());

        assert_eq!(innings.fall_of_wickets.len(), 2);
        assert_eq!(innings.fall_of_wickets[0].score, 2);
        assert_eq!(innings.fall_of_wickets[0].wicket, 1);
        assert_eq!(innings.fall_of_wickets[0].batsman_id, "p1");
    }

    #[test]
    fn test_available_batsmen_excludes_dismissed() {
        let roster = ids(3);
        let mut innings = Innings::new(&roster, "A", "B");
        innings.record_wicket("p2", DismissalKind::Caught, "x", Some("y"));

        let available = innings.available_batsmen(&roster);
        assert_eq!(available.len(), 2);
        assert!(!available.iter().any(|id| *id == "p2"));
    }

    #[test]
    fn test_dismissal_kind_serde_names() {
        assert_eq!(serde_json::to_string(&DismissalKind::Lbw).unwrap(), "\"LBW\"");
        assert_eq!(serde_json::to_string(&DismissalKind::RunOut).unwrap(), "\"Run Out\"");
    }
}
