//! Man of the Match scoring heuristic.
//!
//! Accumulates a contribution score per player across the main innings and
//! the last resolved tie-breaker, then picks the strictly highest total.
//! Ties resolve to the first maximum in roster order, so the computation is
//! deterministic for a given finalized match.

use std::collections::HashMap;

use crate::models::{
    BowlOutOutcome, DismissalKind, Innings, Match, MatchStatus, TieBreaker,
};

// Batting
const RUN_WEIGHT: f64 = 1.5;
const STRIKE_RATE_THRESHOLD: f64 = 120.0;
const STRIKE_RATE_WEIGHT: f64 = 0.5;
const CENTURY_BONUS: f64 = 50.0;
const FIFTY_BONUS: f64 = 25.0;

// Bowling
const WICKET_WEIGHT: f64 = 25.0;
const FIVE_WICKET_BONUS: f64 = 50.0;
const THREE_WICKET_BONUS: f64 = 25.0;
const ECONOMY_THRESHOLD: f64 = 8.0;
const ECONOMY_WEIGHT: f64 = 10.0;
const ECONOMY_MIN_BALLS: u32 = 12;

// Fielding
const FIELDING_CREDIT: f64 = 10.0;

// Super Over (weighted heavier: one over decides the match)
const SO_RUN_WEIGHT: f64 = 5.0;
const SO_HIGH_SCORE_RUNS: u32 = 10;
const SO_HIGH_SCORE_BONUS: f64 = 20.0;
const SO_SIX_BONUS: f64 = 10.0;
const SO_WICKET_WEIGHT: f64 = 50.0;
const SO_TIGHT_ECONOMY_BONUS: f64 = 30.0;
const SO_FAIR_ECONOMY_BONUS: f64 = 15.0;

// Bowl out / result
const BOWL_OUT_HIT_BONUS: f64 = 50.0;
const WINNING_TEAM_BONUS: f64 = 20.0;

/// Compute the Man of the Match for a completed fixture.
///
/// Returns `None` when the match is not completed, has no scoring data, or
/// nobody accumulated a strictly positive score.
pub fn compute_man_of_the_match(match_rec: &Match) -> Option<String> {
    if match_rec.status != MatchStatus::Completed {
        return None;
    }
    if match_rec.innings.is_none() && match_rec.tie_breakers.is_empty() {
        return None;
    }

    let mut scores: HashMap<&str, f64> = HashMap::new();
    for id in &match_rec.players {
        scores.insert(id.as_str(), 0.0);
    }

    if let Some(pair) = &match_rec.innings {
        score_innings(&pair.first, &mut scores);
        score_innings(&pair.second, &mut scores);
    }

    // Only the tie-breaker that actually settled the match earns bonuses.
    if let Some(last) = match_rec.tie_breakers.last().filter(|tb| tb.is_resolved()) {
        match last {
            TieBreaker::SuperOver { innings: Some(pair), .. } => {
                score_super_over_innings(&pair.first, &mut scores);
                score_super_over_innings(&pair.second, &mut scores);
            }
            TieBreaker::SuperOver { innings: None, .. } => {}
            TieBreaker::BowlOut { attempts, .. } => {
                for attempt in attempts {
                    if attempt.outcome == BowlOutOutcome::Hit {
                        *scores.entry(attempt.bowler_id.as_str()).or_insert(0.0) +=
                            BOWL_OUT_HIT_BONUS;
                    }
                }
            }
        }
    }

    if let Some(winner) = &match_rec.winner {
        if let Some(roster) = match_rec.team(winner) {
            for id in &roster.player_ids {
                if let Some(score) = scores.get_mut(id.as_str()) {
                    *score += WINNING_TEAM_BONUS;
                }
            }
        }
    }

    // First maximum in roster order wins a tie.
    let mut best: Option<&str> = None;
    let mut best_score = -1.0;
    for id in &match_rec.players {
        let score = scores.get(id.as_str()).copied().unwrap_or(0.0);
        if score > best_score {
            best_score = score;
            best = Some(id.as_str());
        }
    }

    if best_score > 0.0 {
        best.map(str::to_string)
    } else {
        None
    }
}

fn score_innings<'a>(innings: &'a Innings, scores: &mut HashMap<&'a str, f64>) {
    for (id, stats) in &innings.batsmen_stats {
        let entry = scores.entry(id.as_str()).or_insert(0.0);
        *entry += stats.runs as f64 * RUN_WEIGHT;
        if stats.balls > 0 {
            let strike_rate = stats.runs as f64 / stats.balls as f64 * 100.0;
            if strike_rate > STRIKE_RATE_THRESHOLD {
                *entry += (strike_rate - STRIKE_RATE_THRESHOLD) * STRIKE_RATE_WEIGHT;
            }
        }
        if stats.runs >= 100 {
            *entry += CENTURY_BONUS;
        } else if stats.runs >= 50 {
            *entry += FIFTY_BONUS;
        }
    }

    for (id, stats) in &innings.bowler_stats {
        let entry = scores.entry(id.as_str()).or_insert(0.0);
        *entry += stats.wickets as f64 * WICKET_WEIGHT;
        if stats.wickets >= 5 {
            *entry += FIVE_WICKET_BONUS;
        } else if stats.wickets >= 3 {
            *entry += THREE_WICKET_BONUS;
        }
        if stats.balls_bowled >= ECONOMY_MIN_BALLS {
            let economy = stats.runs_conceded as f64 / (stats.balls_bowled as f64 / 6.0);
            if economy < ECONOMY_THRESHOLD {
                *entry += (ECONOMY_THRESHOLD - economy) * ECONOMY_WEIGHT;
            }
        }
    }

    for stats in innings.batsmen_stats.values() {
        let is_fielding_credit = matches!(
            stats.how_out,
            Some(DismissalKind::Caught) | Some(DismissalKind::RunOut)
        );
        if is_fielding_credit {
            if let Some(fielder) = &stats.fielder_id {
                *scores.entry(fielder.as_str()).or_insert(0.0) += FIELDING_CREDIT;
            }
        }
    }
}

fn score_super_over_innings<'a>(innings: &'a Innings, scores: &mut HashMap<&'a str, f64>) {
    for (id, stats) in &innings.batsmen_stats {
        let entry = scores.entry(id.as_str()).or_insert(0.0);
        *entry += stats.runs as f64 * SO_RUN_WEIGHT;
        if stats.runs >= SO_HIGH_SCORE_RUNS {
            *entry += SO_HIGH_SCORE_BONUS;
        }
        *entry += stats.sixes as f64 * SO_SIX_BONUS;
    }

    for (id, stats) in &innings.bowler_stats {
        let entry = scores.entry(id.as_str()).or_insert(0.0);
        *entry += stats.wickets as f64 * SO_WICKET_WEIGHT;
        if stats.balls_bowled > 0 {
            if stats.runs_conceded <= 6 {
                *entry += SO_TIGHT_ECONOMY_BONUS;
            } else if stats.runs_conceded <= 10 {
                *entry += SO_FAIR_ECONOMY_BONUS;
            }
        }
    }
}
