//! Solver-level tests: known equilibria of the built-in games, limit and
//! cancellation behavior, and the structural properties every returned
//! profile must satisfy.

use approx::assert_relative_eq;
use seqnash_cli::catalog;
use seqnash_cli::error::SolverError;
use seqnash_cli::game::Support;
use seqnash_cli::lemke::{solve, solve_with, CancelToken, SolveOptions};
use seqnash_cli::numeric::{Field, Rat};
use seqnash_cli::profile::BehaviorProfile;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn assert_sums_to_one<T: Field>(profile: &BehaviorProfile<T>, tol: f64) {
    for player in 0..2 {
        for slot0 in 0..profile.num_infosets(player) {
            let sum: f64 = profile
                .probs(player, slot0)
                .iter()
                .map(|v| v.to_f64())
                .sum();
            assert!(
                (sum - 1.0).abs() <= tol,
                "player {} infoset slot {} sums to {}",
                player + 1,
                slot0,
                sum,
            );
        }
    }
}

fn assert_no_duplicates<T: Field>(equilibria: &[BehaviorProfile<T>], tol: f64) {
    for (i, a) in equilibria.iter().enumerate() {
        for b in equilibria.iter().skip(i + 1) {
            assert!(
                !a.agrees_with(b, tol),
                "equilibria {} duplicated within {}",
                i,
                tol,
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Matching pennies
// ---------------------------------------------------------------------------

#[test]
fn matching_pennies_float() {
    let game = catalog::matching_pennies();
    let support = Support::full(&game);
    let report = solve::<f64>(&game, &support, SolveOptions::default()).unwrap();

    assert_eq!(report.equilibria.len(), 1);
    assert!(!report.incomplete);
    let eq = &report.equilibria[0];
    for player in 0..2 {
        for &p in eq.probs(player, 0) {
            assert_relative_eq!(p, 0.5, epsilon = 1e-6);
        }
    }
}

#[test]
fn matching_pennies_exact() {
    let game = catalog::matching_pennies();
    let support = Support::full(&game);
    let report = solve::<Rat>(&game, &support, SolveOptions::default()).unwrap();

    assert_eq!(report.equilibria.len(), 1);
    let eq = &report.equilibria[0];
    let half = Rat::new(1, 2);
    for player in 0..2 {
        assert_eq!(eq.probs(player, 0), &[half.clone(), half.clone()]);
    }
}

// ---------------------------------------------------------------------------
// Dominant actions
// ---------------------------------------------------------------------------

#[test]
fn dominant_game_stop_after_one_is_pure() {
    let game = catalog::dominant_action();
    let support = Support::full(&game);
    let opts = SolveOptions {
        stop_after: 1,
        max_depth: 0,
    };
    let report = solve::<f64>(&game, &support, opts).unwrap();

    assert_eq!(report.equilibria.len(), 1);
    let eq = &report.equilibria[0];
    // "bottom" and "right" strictly dominate
    assert_relative_eq!(eq.probs(0, 0)[0], 0.0, epsilon = 1e-9);
    assert_relative_eq!(eq.probs(0, 0)[1], 1.0, epsilon = 1e-9);
    assert_relative_eq!(eq.probs(1, 0)[0], 0.0, epsilon = 1e-9);
    assert_relative_eq!(eq.probs(1, 0)[1], 1.0, epsilon = 1e-9);
}

#[test]
fn dominant_game_exact_matches_float() {
    let game = catalog::dominant_action();
    let support = Support::full(&game);
    let opts = SolveOptions {
        stop_after: 1,
        max_depth: 0,
    };
    let report = solve::<Rat>(&game, &support, opts).unwrap();
    let eq = &report.equilibria[0];
    assert_eq!(eq.probs(0, 0), &[Rat::zero(), Rat::one()]);
    assert_eq!(eq.probs(1, 0), &[Rat::zero(), Rat::one()]);
}

// ---------------------------------------------------------------------------
// One-card bluff: chance nodes and exact mixed probabilities
// ---------------------------------------------------------------------------

#[test]
fn one_card_bluff_exact_equilibrium() {
    let game = catalog::one_card_bluff();
    let support = Support::full(&game);
    let report = solve::<Rat>(&game, &support, SolveOptions::default()).unwrap();

    assert_eq!(report.equilibria.len(), 1);
    let eq = &report.equilibria[0];

    // player 1 slots in first-visit order: "high" then "low"
    assert_eq!(eq.infoset_ids(0), &[0, 1]);
    assert_eq!(eq.probs(0, 0), &[Rat::one(), Rat::zero()]);
    assert_eq!(eq.probs(0, 1), &[Rat::new(1, 3), Rat::new(2, 3)]);
    // player 2 calls 2/3
    assert_eq!(eq.probs(1, 0), &[Rat::new(2, 3), Rat::new(1, 3)]);
}

#[test]
fn one_card_bluff_float_equilibrium() {
    let game = catalog::one_card_bluff();
    let support = Support::full(&game);
    let report = solve::<f64>(&game, &support, SolveOptions::default()).unwrap();

    assert_eq!(report.equilibria.len(), 1);
    let eq = &report.equilibria[0];
    assert_relative_eq!(eq.probs(0, 0)[0], 1.0, epsilon = 1e-6);
    assert_relative_eq!(eq.probs(0, 1)[0], 1.0 / 3.0, epsilon = 1e-6);
    assert_relative_eq!(eq.probs(0, 1)[1], 2.0 / 3.0, epsilon = 1e-6);
    assert_relative_eq!(eq.probs(1, 0)[0], 2.0 / 3.0, epsilon = 1e-6);
}

// ---------------------------------------------------------------------------
// Restricted supports
// ---------------------------------------------------------------------------

#[test]
fn restricted_support_solves_restricted_game() {
    let game = catalog::matching_pennies();
    let mut support = Support::full(&game);
    support.active[0][0] = vec![0]; // player 1 must play heads

    let report = solve::<Rat>(&game, &support, SolveOptions::default()).unwrap();
    assert!(!report.equilibria.is_empty());
    let eq = &report.equilibria[0];
    assert_eq!(eq.probs(0, 0), &[Rat::one()]);
    // player 2 guesses tails and wins
    assert_eq!(eq.probs(1, 0), &[Rat::zero(), Rat::one()]);
}

#[test]
fn empty_support_is_rejected_with_no_output() {
    let game = catalog::one_card_bluff();
    let mut support = Support::full(&game);
    support.active[1][0].clear();

    let mut streamed = 0usize;
    let err = solve_with::<f64>(
        &game,
        &support,
        SolveOptions::default(),
        &CancelToken::new(),
        |_| streamed += 1,
    )
    .unwrap_err();
    assert!(matches!(err, SolverError::EmptySupport { player: 2, .. }));
    assert_eq!(streamed, 0);
}

// ---------------------------------------------------------------------------
// Enumeration behavior
// ---------------------------------------------------------------------------

#[test]
fn unbounded_enumeration_finds_exactly_the_known_set() {
    // both games have a unique equilibrium, so unbounded enumeration must
    // return exactly one profile no matter how many pivot paths reach it
    for game in [catalog::matching_pennies(), catalog::one_card_bluff()] {
        let support = Support::full(&game);
        let report = solve::<f64>(&game, &support, SolveOptions::default()).unwrap();
        assert_eq!(report.equilibria.len(), 1, "game {}", game.title);
    }
}

#[test]
fn stop_after_caps_the_output() {
    let game = catalog::kuhn_poker();
    let support = Support::full(&game);
    let opts = SolveOptions {
        stop_after: 2,
        max_depth: 1,
    };
    let report = solve::<f64>(&game, &support, opts).unwrap();
    assert!(report.equilibria.len() <= 2);
    assert!(!report.equilibria.is_empty());
}

#[test]
fn depth_limit_does_not_break_validity() {
    let game = catalog::kuhn_poker();
    let support = Support::full(&game);
    let opts = SolveOptions {
        stop_after: 0,
        max_depth: 1,
    };
    let report = solve::<f64>(&game, &support, opts).unwrap();
    assert!(!report.equilibria.is_empty());
    for eq in &report.equilibria {
        assert_sums_to_one(eq, 1e-6);
    }
    assert_no_duplicates(&report.equilibria, 1e-9);
}

#[test]
fn runs_are_deterministic() {
    let game = catalog::kuhn_poker();
    let support = Support::full(&game);
    let opts = SolveOptions {
        stop_after: 0,
        max_depth: 1,
    };
    let first = solve::<f64>(&game, &support, opts).unwrap();
    let second = solve::<f64>(&game, &support, opts).unwrap();
    assert_eq!(first.equilibria.len(), second.equilibria.len());
    for (a, b) in first.equilibria.iter().zip(&second.equilibria) {
        assert!(a.agrees_with(b, 1e-12));
    }
}

#[test]
fn kuhn_exact_primary_path() {
    let game = catalog::kuhn_poker();
    let support = Support::full(&game);
    let opts = SolveOptions {
        stop_after: 1,
        max_depth: 0,
    };
    let report = solve::<Rat>(&game, &support, opts).unwrap();
    assert_eq!(report.equilibria.len(), 1);
    let eq = &report.equilibria[0];
    // exact arithmetic: every reached infoset sums to exactly 1
    for player in 0..2 {
        for slot0 in 0..eq.num_infosets(player) {
            let mut sum = Rat::zero();
            for v in eq.probs(player, slot0) {
                sum = sum + v.clone();
            }
            assert_eq!(sum, Rat::one());
        }
    }
}

#[test]
fn catalog_profiles_satisfy_probability_sums() {
    for name in catalog::names() {
        let game = catalog::get(name).unwrap();
        let support = Support::full(&game);
        let opts = SolveOptions {
            stop_after: 0,
            max_depth: 1,
        };
        let report = solve::<f64>(&game, &support, opts).unwrap();
        assert!(!report.equilibria.is_empty(), "{} found nothing", name);
        for eq in &report.equilibria {
            assert_sums_to_one(eq, 1e-6);
        }
        assert_no_duplicates(&report.equilibria, 1e-9);
    }
}

#[test]
fn random_game_profiles_are_valid() {
    for seed in [1u64, 2, 3] {
        let game = catalog::random_game(seed, 2, 2);
        let support = Support::full(&game);
        let opts = SolveOptions {
            stop_after: 1,
            max_depth: 0,
        };
        let report = solve::<f64>(&game, &support, opts).unwrap();
        for eq in &report.equilibria {
            assert_sums_to_one(eq, 1e-6);
            for v in eq.values() {
                assert!(
                    (-1e-9..=1.0 + 1e-9).contains(v),
                    "seed {} probability {} out of range",
                    seed,
                    v,
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn cancellation_returns_collected_prefix() {
    let game = catalog::kuhn_poker();
    let support = Support::full(&game);
    let token = CancelToken::new();
    let canceller = token.clone();

    // cancel as soon as the first equilibrium streams out; whatever was
    // collected up to that point must still come back
    let report = solve_with::<f64>(
        &game,
        &support,
        SolveOptions::default(),
        &token,
        |_| canceller.cancel(),
    )
    .unwrap();
    assert_eq!(report.equilibria.len(), 1);
    assert_sums_to_one(&report.equilibria[0], 1e-6);
}
