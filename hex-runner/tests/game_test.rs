//! Full bot-driven matches

use hex_core::{ArmyBook, GameConfig, HexGame, TraceEvent};
use hex_runner::{check_invariants, play_game, soak, RunnerConfig};

#[test]
fn test_seeded_match_runs_to_completion() {
    let config = RunnerConfig::default().with_seed(17);
    let outcome = play_game(HexGame::standard().unwrap(), &config).unwrap();

    assert_eq!(outcome.seed, 17);
    assert!(outcome.turns > 2);
    assert!(!outcome.moves.is_empty());
    assert!(outcome.exhausted() || outcome.turns > config.max_turns);
    assert_eq!(check_invariants(&outcome.final_state), Ok(()));
    assert_eq!(outcome.trace.first(), Some(&TraceEvent::PhaseBegin(hex_core::Phase::HqSetup)));

    let ended = outcome
        .trace
        .iter()
        .filter(|e| matches!(e, TraceEvent::BattleEnded { .. }))
        .count();
    assert!(outcome.battles >= ended);
    assert!(outcome.battles <= ended + 1);
}

#[test]
fn test_same_seed_same_match() {
    let config = RunnerConfig::default().with_seed(2024).with_instant_probability(0.5);
    let a = play_game(HexGame::standard().unwrap(), &config).unwrap();
    let b = play_game(HexGame::standard().unwrap(), &config).unwrap();

    assert_eq!(a.moves, b.moves);
    assert_eq!(a.turns, b.turns);
    assert_eq!(
        serde_json::to_string(&a.final_state).unwrap(),
        serde_json::to_string(&b.final_state).unwrap()
    );
    assert_eq!(a.trace, b.trace);
}

#[test]
fn test_turn_limit_stops_match() {
    let config = RunnerConfig::default().with_seed(5).with_max_turns(4);
    let outcome = play_game(HexGame::standard().unwrap(), &config).unwrap();
    assert_eq!(outcome.turns, 5);
}

#[test]
fn test_four_player_match() {
    let game_config = GameConfig::default().with_armies(["moloch", "borgo", "moloch", "borgo"]);
    let game = HexGame::new(game_config, ArmyBook::builtin().unwrap()).unwrap();
    let outcome = play_game(game, &RunnerConfig::default().with_seed(8)).unwrap();
    assert_eq!(outcome.final_state.players.len(), 4);
    assert_eq!(check_invariants(&outcome.final_state), Ok(()));
}

#[test]
fn test_soak_is_clean() {
    let config = RunnerConfig::default().with_seed(100);
    let report = soak(&HexGame::standard().unwrap(), &config, 24);
    assert!(report.is_clean(), "failures: {:?}", report.failures);
    assert_eq!(report.completed, 24);
    assert!(report.avg_moves > 0.0);
}
