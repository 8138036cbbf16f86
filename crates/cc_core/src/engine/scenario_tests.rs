//! Full-match scenarios driven through the public engine API only.

use std::collections::HashMap;

use proptest::prelude::*;

use crate::engine::ball_event::{BallEvent, BallOutcome};
use crate::engine::live_match::{LiveMatchEngine, Stage};
use crate::models::{DismissalKind, Match, MatchStatus, TeamRoster, TossDecision};

fn scheduled_match(overs: u16) -> Match {
    let team_a: Vec<String> = (1..=11).map(|i| format!("a{}", i)).collect();
    let team_b: Vec<String> = (1..=11).map(|i| format!("b{}", i)).collect();
    let mut players = team_a.clone();
    players.extend(team_b.clone());
    Match {
        id: "m1".to_string(),
        name: "League Final".to_string(),
        date: "2024-06-02".to_string(),
        time: Some("07:00".to_string()),
        total_overs: Some(overs),
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

/// Engine at the openers stage with Team A set to bat first.
fn engine_team_a_bats_first(overs: u16) -> LiveMatchEngine {
    let mut engine = LiveMatchEngine::new(scheduled_match(overs), 7).unwrap();
    let winner = engine.perform_toss().unwrap();
    let decision = if winner == "Team A" { TossDecision::Bat } else { TossDecision::Bowl };
    engine.record_decision(decision).unwrap();
    engine
}

/// Fill whichever crease/bowler slot the engine is blocked on, taking the
/// first eligible candidate, the way a scorer clicking through the
/// selection prompts would.
fn fill_selections(engine: &mut LiveMatchEngine) {
    loop {
        let Some(live) = engine.live() else { return };
        if live.on_strike.is_none() {
            let next = engine.selectable_batsmen().into_iter().next().expect("a batter remains");
            engine.select_striker(&next).unwrap();
        } else if live.off_strike.is_none() {
            let next = engine.selectable_batsmen().into_iter().next().expect("a batter remains");
            engine.select_non_striker(&next).unwrap();
        } else if live.bowler.is_none() {
            let next = engine.selectable_bowlers().into_iter().next().expect("a bowler remains");
            engine.select_bowler(&next).unwrap();
        } else {
            return;
        }
    }
}

fn feed(engine: &mut LiveMatchEngine, event: BallEvent) {
    engine.process_ball(event).unwrap();
    fill_selections(engine);
}

/// Team A posts 120/6 in 10 overs; Team B is bowled out for 100 in 9.4.
#[test]
fn test_full_match_team_a_wins_by_20_runs() {
    let mut engine = engine_team_a_bats_first(10);
    engine.start_play("a1", "a2", "b1").unwrap();

    // Innings 1: 30 fours and 24 dots over nine overs, then six wickets
    // close out the tenth. 120 runs, 6 down, 60 legal balls.
    for ball in 0..54 {
        let event = if ball % 9 < 5 { BallEvent::runs(4) } else { BallEvent::runs(0) };
        feed(&mut engine, event);
    }
    assert_eq!(engine.active_innings().score, 120);
    for _ in 0..6 {
        feed(&mut engine, BallEvent::wicket(DismissalKind::Bowled, None));
    }

    assert!(matches!(engine.stage(), Stage::InningsBreak));
    {
        let first = &engine.match_record().innings.as_ref().unwrap().first;
        assert_eq!(first.score, 120);
        assert_eq!(first.wickets, 6);
        assert_eq!(first.total_legal_balls, 60);
    }

    engine.start_second_innings().unwrap();
    engine.start_play("b1", "b2", "a1").unwrap();
    assert_eq!(engine.live().unwrap().target, 121);

    // Innings 2: 25 fours and 23 dots over the first 48 balls, then ten
    // wickets in a row. All out for 100 off 58 legal balls (9.4 overs).
    for ball in 0..48 {
        let four = ball % 2 == 0 || ball == 47;
        let event = if four { BallEvent::runs(4) } else { BallEvent::runs(0) };
        feed(&mut engine, event);
    }
    assert_eq!(engine.active_innings().score, 100);
    for _ in 0..9 {
        feed(&mut engine, BallEvent::wicket(DismissalKind::Bowled, None));
    }
    engine.process_ball(BallEvent::wicket(DismissalKind::Bowled, None)).unwrap();

    assert!(matches!(engine.stage(), Stage::MatchOver));
    let record = engine.match_record();
    assert_eq!(record.status, MatchStatus::Completed);
    assert_eq!(record.winner.as_deref(), Some("Team A"));
    assert_eq!(record.result_description.as_deref(), Some("Team A won by 20 runs"));
    assert!(record.tie_breakers.is_empty());
    assert!(record.live_progress.is_none());
    assert!(record.completion_date.is_some());
    assert!(record.man_of_the_match_id.is_some());

    let innings = record.innings.as_ref().unwrap();
    assert_eq!(innings.second.score, 100);
    assert_eq!(innings.second.wickets, 10);
    assert_eq!(innings.second.total_legal_balls, 58);
    assert_eq!(innings.second.fall_of_wickets.len(), 10);
}

/// The scorecard regenerates the same Man of the Match every time.
#[test]
fn test_man_of_the_match_stable_across_replays() {
    let build = || {
        let mut engine = engine_team_a_bats_first(2);
        engine.start_play("a1", "a2", "b1").unwrap();
        for _ in 0..12 {
            feed(&mut engine, BallEvent::runs(2));
        }
        engine.start_second_innings().unwrap();
        engine.start_play("b1", "b2", "a1").unwrap();
        for _ in 0..12 {
            feed(&mut engine, BallEvent::runs(1));
        }
        engine.into_match()
    };

    let first = build();
    let second = build();
    assert_eq!(first.man_of_the_match_id, second.man_of_the_match_id);
    assert_eq!(first.result_description, second.result_description);
}

fn arb_event() -> impl Strategy<Value = BallEvent> {
    prop_oneof![
        prop::sample::select(vec![0u32, 1, 2, 3, 4, 6]).prop_map(BallEvent::runs),
        (0u32..=4).prop_map(BallEvent::wide),
        (0u32..=4).prop_map(BallEvent::no_ball),
        (0u32..=2, 1u32..=3).prop_map(|(scored, shortfall)| {
            BallEvent::short_run(scored, scored + shortfall)
        }),
    ]
}

fn expected_total(event: &BallEvent) -> u32 {
    match event.outcome {
        BallOutcome::Runs(n) => n,
        BallOutcome::ShortRun { scored, .. } => scored,
        BallOutcome::Wide { extra_runs } | BallOutcome::NoBall { extra_runs } => 1 + extra_runs,
    }
}

proptest! {
    /// Property: the innings score always equals the sum of every run
    /// contribution fed so far, and legal balls never exceed the cap.
    #[test]
    fn prop_score_conservation(events in prop::collection::vec(arb_event(), 1..40)) {
        let mut engine = engine_team_a_bats_first(50);
        engine.start_play("a1", "a2", "b1").unwrap();

        let mut expected = 0u32;
        for event in events {
            expected += expected_total(&event);
            feed(&mut engine, event);
            prop_assert_eq!(engine.active_innings().score, expected);
            prop_assert!(engine.active_innings().total_legal_balls <= 300);
        }
    }

    /// Property: after a resolved run out, the crease holds exactly the
    /// not-out batter and the replacement, and the not-out batter takes
    /// strike iff completed-run parity left them at the striker's end XOR
    /// the pair crossed.
    #[test]
    fn prop_run_out_resolution(
        completed in 0u32..=5,
        crossed in any::<bool>(),
        out_is_striker in any::<bool>(),
    ) {
        let mut engine = engine_team_a_bats_first(50);
        engine.start_play("a1", "a2", "b1").unwrap();

        let out_id = if out_is_striker { "a1" } else { "a2" };
        let not_out = if out_is_striker { "a2" } else { "a1" };
        engine
            .process_ball(BallEvent::run_out(completed, out_id, "a3", "b5", crossed))
            .unwrap();

        let live = engine.live().unwrap();
        let striker = live.on_strike.as_deref().unwrap();
        let non_striker = live.off_strike.as_deref().unwrap();

        // Survivors are exactly the not-out batter and the replacement.
        let mut crease = [striker, non_striker];
        crease.sort_unstable();
        let mut expected_pair = [not_out, "a3"];
        expected_pair.sort_unstable();
        prop_assert_eq!(crease, expected_pair);

        let striker_after_runs = if completed % 2 == 1 { "a2" } else { "a1" };
        let not_out_at_strikers_end = not_out == striker_after_runs;
        let not_out_takes_strike = not_out_at_strikers_end != crossed;
        if not_out_takes_strike {
            prop_assert_eq!(striker, not_out);
        } else {
            prop_assert_eq!(striker, "a3");
        }

        // The dismissed batter is out and the bowler got no credit.
        prop_assert!(engine.active_innings().batsman(out_id).unwrap().is_out);
        prop_assert_eq!(engine.active_innings().bowler("b1").unwrap().wickets, 0);
    }
}
