//! Profile output tests: labeled CSV streaming, decimal rendering of
//! exact values, and the table renderer.

use seqnash_cli::catalog;
use seqnash_cli::display::equilibrium_table;
use seqnash_cli::game::Support;
use seqnash_cli::lemke::{solve, SolveOptions};
use seqnash_cli::numeric::Rat;

#[test]
fn matching_pennies_streams_as_csv() {
    let game = catalog::matching_pennies();
    let support = Support::full(&game);
    let report = solve::<Rat>(&game, &support, SolveOptions::default()).unwrap();

    let mut out = Vec::new();
    for eq in &report.equilibria {
        eq.write_labeled(&mut out, "NE", 6).unwrap();
    }
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "NE,0.500000,0.500000,0.500000,0.500000\n"
    );
}

#[test]
fn bluff_streams_exact_values_at_chosen_precision() {
    let game = catalog::one_card_bluff();
    let support = Support::full(&game);
    let report = solve::<Rat>(&game, &support, SolveOptions::default()).unwrap();
    assert_eq!(report.equilibria.len(), 1);

    let mut out = Vec::new();
    report.equilibria[0]
        .write_labeled(&mut out, "NE", 3)
        .unwrap();
    // player 1: high [bet, fold], low [bet, fold]; player 2: [call, fold]
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "NE,1.000,0.000,0.333,0.667,0.667,0.333\n"
    );
}

#[test]
fn custom_labels_and_precision() {
    let game = catalog::dominant_action();
    let support = Support::full(&game);
    let opts = SolveOptions {
        stop_after: 1,
        max_depth: 0,
    };
    let report = solve::<Rat>(&game, &support, opts).unwrap();

    let mut out = Vec::new();
    report.equilibria[0]
        .write_labeled(&mut out, "EQ-1", 1)
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "EQ-1,0.0,1.0,0.0,1.0\n");
}

#[test]
fn float_and_exact_streams_agree() {
    let game = catalog::one_card_bluff();
    let support = Support::full(&game);
    let exact = solve::<Rat>(&game, &support, SolveOptions::default()).unwrap();
    let float = solve::<f64>(&game, &support, SolveOptions::default()).unwrap();

    let mut exact_out = Vec::new();
    let mut float_out = Vec::new();
    exact.equilibria[0]
        .write_labeled(&mut exact_out, "NE", 4)
        .unwrap();
    float.equilibria[0]
        .write_labeled(&mut float_out, "NE", 4)
        .unwrap();
    assert_eq!(exact_out, float_out);
}

#[test]
fn table_renderer_shows_labels_and_probabilities() {
    let game = catalog::one_card_bluff();
    let support = Support::full(&game);
    let report = solve::<Rat>(&game, &support, SolveOptions::default()).unwrap();

    let table = equilibrium_table(&game, &support, &report.equilibria[0], 4);
    for needle in ["high", "low", "facing bet", "bet", "call", "0.3333", "0.6667"] {
        assert!(table.contains(needle), "table missing {:?}:\n{}", needle, table);
    }
}
