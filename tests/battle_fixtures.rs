//! Battle fixture tests
//!
//! Tests are automatically generated for each `.json` file in the
//! `test_battles/` directory using the `dir-test` procedural macro: every
//! battle must load, play to an end with a perfect player, and replay
//! identically from the same seed, both in-process and through the binary.

use dir_test::{dir_test, Fixture};
use mixed_combat::game::{agent::ZeroController, Arena, BattleEndReason, CombatLogger};
use mixed_combat::loader::ConfigLoader;
use similar_asserts::assert_eq;
use std::process::Command;

/// Run the combat binary and capture stdout
fn run_binary(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_combat"))
        .args(args)
        .output()
        .expect("Failed to run combat binary");
    assert!(
        output.status.success(),
        "combat {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("Invalid UTF-8 in stdout")
}

#[dir_test(
    dir: "$CARGO_MANIFEST_DIR/test_battles",
    glob: "**/*.json",
)]
fn test_battle_fixture(fixture: Fixture<&str>) {
    let config = ConfigLoader::parse(fixture.content()).unwrap();

    let play = || {
        let mut arena = Arena::new(&config, 42, CombatLogger::capturing()).unwrap();
        let result = arena.run(&mut ZeroController::new());
        (result, arena.battle().events().to_vec())
    };
    let (result, events) = play();
    let (replay, replay_events) = play();

    assert_ne!(
        result.reason,
        BattleEndReason::Stopped,
        "{} never finished",
        fixture.path()
    );
    assert_eq!(events, replay_events);
    assert_eq!(result, replay);
}

#[dir_test(
    dir: "$CARGO_MANIFEST_DIR/test_battles",
    glob: "**/*.json",
)]
fn test_binary_determinism(fixture: Fixture<&str>) {
    let args = [
        "play",
        "--config",
        fixture.path(),
        "--agent=zero",
        "--seed=7",
        "--verbosity=verbose",
    ];
    let run1 = run_binary(&args);
    let run2 = run_binary(&args);

    assert!(!run1.is_empty(), "{} produced empty output", fixture.path());
    assert_eq!(
        run1,
        run2,
        "{} produced different output with the same seed",
        fixture.path()
    );
}

#[dir_test(
    dir: "$CARGO_MANIFEST_DIR/test_battles",
    glob: "**/*.json",
)]
fn test_check_command(fixture: Fixture<&str>) {
    let output = run_binary(&["check", fixture.path()]);
    assert!(output.contains(": ok ("), "unexpected output: {}", output);
}

#[test]
fn test_json_result() {
    let output = run_binary(&["play", "--agent=zero", "--seed=3", "--json", "-v", "silent"]);
    let result: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(result["reason"], "EnemyDefeated");
    assert_eq!(result["seed"], 3);
    assert!(result["score"]["total"].as_i64().unwrap() > 0);
}

#[test]
fn test_eval_command() {
    assert_eq!(run_binary(&["eval", "1 1/2 + 3/4"]), "1 1/2 + 3/4 = 2 1/4\n");
    assert_eq!(run_binary(&["eval", "6/4 - 1/4"]), "6/4 - 1/4 = 1 1/4\n");
}

#[test]
fn test_simulate_is_reproducible() {
    let args = ["simulate", "-n", "12", "--seed", "5", "--agent", "random", "--json"];
    assert_eq!(run_binary(&args), run_binary(&args));
}
