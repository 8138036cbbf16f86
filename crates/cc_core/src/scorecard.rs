//! Scorecard projections.
//!
//! Pure read-side helpers over a finished (or in-progress) innings: overs
//! formatting, rate calculations, dismissal strings, and per-player line
//! summaries. Rendering and file export consume these; nothing here
//! mutates match state.

use crate::models::{BatsmanStats, DismissalKind, Innings, Player};

/// Balls as cricket overs notation: 58 balls is `"9.4"`.
pub fn format_overs(balls: u32) -> String {
    format!("{}.{}", balls / 6, balls % 6)
}

/// Runs per hundred balls.
pub fn strike_rate(runs: u32, balls: u32) -> f64 {
    if balls == 0 {
        return 0.0;
    }
    runs as f64 / balls as f64 * 100.0
}

/// Runs conceded per six legal balls.
pub fn economy_rate(runs_conceded: u32, balls_bowled: u32) -> f64 {
    if balls_bowled == 0 {
        return 0.0;
    }
    runs_conceded as f64 / (balls_bowled as f64 / 6.0)
}

fn player_name(players: &[Player], id: &str) -> String {
    players
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.full_name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Dismissal in scorecard shorthand: `"b. Rahul H"`, `"c. Sandy b. Amol G"`,
/// `"lbw b. Rahul H"`, `"run out (Sandy)"`, or `"not out"`.
pub fn dismissal_line(stats: &BatsmanStats, players: &[Player]) -> String {
    if !stats.is_out {
        return "not out".to_string();
    }
    let bowler = player_name(players, stats.bowler_id.as_deref().unwrap_or(""));
    match stats.how_out {
        Some(DismissalKind::Bowled) => format!("b. {}", bowler),
        Some(DismissalKind::Caught) => {
            let fielder = player_name(players, stats.fielder_id.as_deref().unwrap_or(""));
            format!("c. {} b. {}", fielder, bowler)
        }
        Some(DismissalKind::Lbw) => format!("lbw b. {}", bowler),
        Some(DismissalKind::RunOut) => {
            let fielder = player_name(players, stats.fielder_id.as_deref().unwrap_or(""));
            format!("run out ({})", fielder)
        }
        None => "out".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattingLine {
    pub player_id: String,
    pub player_name: String,
    pub dismissal: String,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub strike_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BowlingLine {
    pub player_id: String,
    pub player_name: String,
    pub overs: String,
    pub runs_conceded: u32,
    pub wickets: u32,
    pub economy: f64,
}

/// Batting card in roster order; players who never faced a ball and were
/// never dismissed are omitted.
pub fn batting_lines(innings: &Innings, roster: &[String], players: &[Player]) -> Vec<BattingLine> {
    roster
        .iter()
        .filter_map(|id| {
            let stats = innings.batsman(id)?;
            if stats.balls == 0 && !stats.is_out {
                return None;
            }
            Some(BattingLine {
                player_id: id.clone(),
                player_name: player_name(players, id),
                dismissal: dismissal_line(stats, players),
                runs: stats.runs,
                balls: stats.balls,
                fours: stats.fours,
                sixes: stats.sixes,
                strike_rate: strike_rate(stats.runs, stats.balls),
            })
        })
        .collect()
}

/// Bowling card in roster order; players who never bowled are omitted.
pub fn bowling_lines(innings: &Innings, roster: &[String], players: &[Player]) -> Vec<BowlingLine> {
    roster
        .iter()
        .filter_map(|id| {
            let stats = innings.bowler(id)?;
            if stats.balls_bowled == 0 {
                return None;
            }
            Some(BowlingLine {
                player_id: id.clone(),
                player_name: player_name(players, id),
                overs: format_overs(stats.balls_bowled),
                runs_conceded: stats.runs_conceded,
                wickets: stats.wickets,
                economy: economy_rate(stats.runs_conceded, stats.balls_bowled),
            })
        })
        .collect()
}

/// Fall of wickets as the familiar strip: `"24-1 (Sandy), 51-2 (Prem)"`.
pub fn fall_of_wickets_line(innings: &Innings, players: &[Player]) -> String {
    innings
        .fall_of_wickets
        .iter()
        .map(|fow| format!("{}-{} ({})", fow.score, fow.wicket, player_name(players, &fow.batsman_id)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlayerRole;

    fn squad() -> Vec<Player> {
        vec![
            Player::new("p1", "Rahul H", PlayerRole::Bowler),
            Player::new("p2", "Amol G", PlayerRole::AllRounder),
            Player::new("p3", "Sandy", PlayerRole::AllRounder),
        ]
    }

    #[test]
    fn test_format_overs() {
        assert_eq!(format_overs(0), "0.0");
        assert_eq!(format_overs(6), "1.0");
        assert_eq!(format_overs(58), "9.4");
    }

    #[test]
    fn test_rates() {
        assert_eq!(strike_rate(50, 25), 200.0);
        assert_eq!(strike_rate(0, 0), 0.0);
        assert_eq!(economy_rate(12, 12), 6.0);
        assert_eq!(economy_rate(5, 0), 0.0);
    }

    #[test]
    fn test_dismissal_lines() {
        let players = squad();

        let not_out = BatsmanStats::default();
        assert_eq!(dismissal_line(&not_out, &players), "not out");

        let bowled = BatsmanStats {
            is_out: true,
            how_out: Some(DismissalKind::Bowled),
            bowler_id: Some("p1".to_string()),
            ..BatsmanStats::default()
        };
        assert_eq!(dismissal_line(&bowled, &players), "b. Rahul H");

        let caught = BatsmanStats {
            is_out: true,
            how_out: Some(DismissalKind::Caught),
            bowler_id: Some("p1".to_string()),
            fielder_id: Some("p3".to_string()),
            ..BatsmanStats::default()
        };
        assert_eq!(dismissal_line(&caught, &players), "c. Sandy b. Rahul H");

        let run_out = BatsmanStats {
            is_out: true,
            how_out: Some(DismissalKind::RunOut),
            fielder_id: Some("p3".to_string()),
            ..BatsmanStats::default()
        };
        assert_eq!(dismissal_line(&run_out, &players), "run out (Sandy)");
    }

    #[test]
    fn test_batting_lines_skip_players_who_never_batted() {
        let roster: Vec<String> = vec!["p1".into(), "p2".into(), "p3".into()];
        let mut innings = Innings::new(&roster, "A", "B");
        innings.apply_runs("p2", "px", 10, true);

        let players = squad();
        let lines = batting_lines(&innings, &roster, &players);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].player_id, "p2");
        assert_eq!(lines[0].runs, 10);
        assert_eq!(lines[0].dismissal, "not out");
    }

    #[test]
    fn test_bowling_lines_skip_players_who_never_bowled() {
        let roster: Vec<String> = vec!["p1".into(), "p2".into(), "p3".into()];
        let mut innings = Innings::new(&roster, "A", "B");
        for _ in 0..10 {
            innings.record_ball("p1");
        }
        innings.apply_runs("px", "p1", 7, true);

        let players = squad();
        let lines = bowling_lines(&innings, &roster, &players);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].player_id, "p1");
        assert_eq!(lines[0].overs, "1.4");
        assert_eq!(lines[0].runs_conceded, 7);
    }

    #[test]
    fn test_fall_of_wickets_line() {
        let roster: Vec<String> = vec!["p1".into(), "p2".into(), "p3".into()];
        let mut innings = Innings::new(&roster, "A", "B");
        innings.apply_runs("p1", "px", 24, true);
        innings.record_wicket("p3", DismissalKind::Bowled, "px", None);

        let players = squad();
        assert_eq!(fall_of_wickets_line(&innings, &players), "24-1 (Sandy)");
    }
}
