//! Game model tests at the file boundary: JSON round trips, validation
//! failures, support files, and the built-in catalog.

use seqnash_cli::catalog;
use seqnash_cli::error::SolverError;
use seqnash_cli::game::{Game, Support};
use seqnash_cli::numeric::Rat;

fn temp_path(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("seqnash-game-tests");
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

// ---------------------------------------------------------------------------
// JSON round trips
// ---------------------------------------------------------------------------

#[test]
fn save_and_load_preserves_the_game() {
    let game = catalog::one_card_bluff();
    let path = temp_path("bluff.json");
    game.save(&path).unwrap();
    let loaded = Game::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.title, game.title);
    assert_eq!(loaded.nodes.len(), game.nodes.len());
    assert_eq!(loaded.max_payoff(), Rat::from_int(2));
}

#[test]
fn exact_rationals_survive_serialization() {
    let game = catalog::kuhn_poker();
    let json = game.to_json().unwrap();
    assert!(json.contains("\"1/6\""));
    let loaded = Game::from_json(&json).unwrap();
    let support = Support::full(&loaded);
    let reachable = support.reachable_infosets(&loaded);
    assert_eq!(reachable[0].len(), 6);
    assert_eq!(reachable[1].len(), 6);
}

#[test]
fn from_json_accepts_plain_numbers_for_payoffs() {
    let json = r#"{
        "title": "tiny",
        "infosets": [[{"label": "only", "actions": ["l", "r"]}], []],
        "nodes": [
            {"branch": {"kind": "personal", "player": 1, "infoset": 0, "children": [1, 2]}},
            {"outcome": [1, -1]},
            {"outcome": ["1/2", -0.5]}
        ]
    }"#;
    let game = Game::from_json(json).unwrap();
    assert_eq!(
        game.nodes[2].outcome.as_ref().unwrap().payoffs[0],
        Rat::new(1, 2)
    );
    assert_eq!(
        game.nodes[2].outcome.as_ref().unwrap().payoffs[1],
        Rat::new(-1, 2)
    );
}

#[test]
fn malformed_json_is_a_typed_error() {
    assert!(matches!(
        Game::from_json("{ not json"),
        Err(SolverError::JsonError(_))
    ));
}

#[test]
fn structurally_invalid_game_is_rejected_on_load() {
    let json = r#"{
        "title": "broken",
        "infosets": [[{"label": "only", "actions": ["l", "r"]}], []],
        "nodes": [
            {"branch": {"kind": "personal", "player": 1, "infoset": 0, "children": [1, 1]}},
            {"outcome": [0, 0]}
        ]
    }"#;
    assert!(matches!(
        Game::from_json(json),
        Err(SolverError::MalformedGame(_))
    ));
}

#[test]
fn bad_player_number_is_rejected() {
    let json = r#"{
        "title": "bad player",
        "infosets": [[{"label": "only", "actions": ["l"]}], []],
        "nodes": [
            {"branch": {"kind": "personal", "player": 3, "infoset": 0, "children": [1]}},
            {"outcome": [0, 0]}
        ]
    }"#;
    assert!(matches!(
        Game::from_json(json),
        Err(SolverError::JsonError(_))
    ));
}

// ---------------------------------------------------------------------------
// Support files
// ---------------------------------------------------------------------------

#[test]
fn support_round_trips_through_json() {
    let game = catalog::one_card_bluff();
    let mut support = Support::full(&game);
    support.active[0][1] = vec![0];
    let json = serde_json::to_string(&support).unwrap();
    let loaded: Support = serde_json::from_str(&json).unwrap();
    loaded.validate(&game).unwrap();
    assert_eq!(loaded.active_actions(0, 1), &[0]);
    assert_eq!(loaded.num_active(1, 0), 2);
}

#[test]
fn loaded_support_must_match_the_game() {
    let game = catalog::matching_pennies();
    let other = catalog::kuhn_poker();
    let support = Support::full(&other);
    assert!(matches!(
        support.validate(&game),
        Err(SolverError::SupportMismatch(_))
    ));
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[test]
fn catalog_lists_all_demo_games() {
    let names = catalog::names();
    for name in ["matching-pennies", "dominant", "one-card-bluff", "kuhn"] {
        assert!(names.contains(&name), "missing {}", name);
        catalog::get(name).unwrap().validate().unwrap();
    }
}

#[test]
fn unknown_catalog_name_is_a_typed_error() {
    assert!(matches!(
        catalog::get("tic-tac-toe"),
        Err(SolverError::UnknownGame(_))
    ));
}

#[test]
fn random_games_round_trip_and_validate() {
    for seed in [11u64, 12] {
        let game = catalog::random_game(seed, 3, 2);
        let json = game.to_json().unwrap();
        let loaded = Game::from_json(&json).unwrap();
        assert_eq!(loaded.nodes.len(), game.nodes.len());
    }
}
