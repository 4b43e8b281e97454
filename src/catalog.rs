//! Built-in demo games and a seeded random-game generator.

use std::collections::BTreeMap;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::error::{SolverError, SolverResult};
use crate::game::{Branch, Game, Infoset, Node, Outcome, Player};
use crate::numeric::Rat;

static CATALOG: Lazy<BTreeMap<&'static str, fn() -> Game>> = Lazy::new(|| {
    let mut m: BTreeMap<&'static str, fn() -> Game> = BTreeMap::new();
    m.insert("matching-pennies", matching_pennies as fn() -> Game);
    m.insert("dominant", dominant_action);
    m.insert("one-card-bluff", one_card_bluff);
    m.insert("kuhn", kuhn_poker);
    m
});

pub fn names() -> Vec<&'static str> {
    CATALOG.keys().copied().collect()
}

pub fn get(name: &str) -> SolverResult<Game> {
    CATALOG
        .get(name)
        .map(|build| build())
        .ok_or_else(|| SolverError::UnknownGame(name.to_string()))
}

// ---------------------------------------------------------------------------
// Node helpers
// ---------------------------------------------------------------------------

fn leaf(p1: i64, p2: i64) -> Node {
    Node {
        outcome: Some(Outcome {
            payoffs: [Rat::from_int(p1), Rat::from_int(p2)],
        }),
        branch: None,
    }
}

fn personal(player: Player, infoset: usize, children: Vec<usize>) -> Node {
    Node {
        outcome: None,
        branch: Some(Branch::Personal {
            player,
            infoset,
            children,
        }),
    }
}

fn chance(probs: Vec<Rat>, children: Vec<usize>) -> Node {
    Node {
        outcome: None,
        branch: Some(Branch::Chance { probs, children }),
    }
}

fn push(nodes: &mut Vec<Node>, node: Node) -> usize {
    nodes.push(node);
    nodes.len() - 1
}

// ---------------------------------------------------------------------------
// Demo games
// ---------------------------------------------------------------------------

/// Zero-sum 2x2 matching pennies. Unique equilibrium: both players mix
/// 1/2 - 1/2.
pub fn matching_pennies() -> Game {
    Game {
        title: "matching pennies".into(),
        infosets: [
            vec![Infoset {
                label: "call".into(),
                actions: vec!["heads".into(), "tails".into()],
            }],
            vec![Infoset {
                label: "guess".into(),
                actions: vec!["heads".into(), "tails".into()],
            }],
        ],
        nodes: vec![
            personal(Player::One, 0, vec![1, 2]),
            personal(Player::Two, 0, vec![3, 4]),
            personal(Player::Two, 0, vec![5, 6]),
            leaf(1, -1),
            leaf(-1, 1),
            leaf(-1, 1),
            leaf(1, -1),
        ],
    }
}

/// 2x2 game where "bottom" strictly dominates for player 1 and "right"
/// strictly dominates for player 2. Unique equilibrium: (bottom, right).
pub fn dominant_action() -> Game {
    Game {
        title: "dominant actions".into(),
        infosets: [
            vec![Infoset {
                label: "row".into(),
                actions: vec!["top".into(), "bottom".into()],
            }],
            vec![Infoset {
                label: "column".into(),
                actions: vec!["left".into(), "right".into()],
            }],
        ],
        nodes: vec![
            personal(Player::One, 0, vec![1, 2]),
            personal(Player::Two, 0, vec![3, 4]),
            personal(Player::Two, 0, vec![5, 6]),
            leaf(1, 1),
            leaf(0, 2),
            leaf(2, 0),
            leaf(1, 1),
        ],
    }
}

/// One-card bluffing game: chance deals player 1 a high or low card
/// (1/2 each); player 1 bets or folds; facing a bet, player 2 calls or
/// folds without seeing the card. Unique equilibrium: bet always with
/// high, bluff 1/3 with low, call 2/3.
pub fn one_card_bluff() -> Game {
    Game {
        title: "one-card bluff".into(),
        infosets: [
            vec![
                Infoset {
                    label: "high".into(),
                    actions: vec!["bet".into(), "fold".into()],
                },
                Infoset {
                    label: "low".into(),
                    actions: vec!["bet".into(), "fold".into()],
                },
            ],
            vec![Infoset {
                label: "facing bet".into(),
                actions: vec!["call".into(), "fold".into()],
            }],
        ],
        nodes: vec![
            chance(vec![Rat::new(1, 2), Rat::new(1, 2)], vec![1, 2]),
            personal(Player::One, 0, vec![3, 4]),
            personal(Player::One, 1, vec![5, 6]),
            personal(Player::Two, 0, vec![7, 8]),
            leaf(-1, 1),
            personal(Player::Two, 0, vec![9, 10]),
            leaf(-1, 1),
            leaf(2, -2),
            leaf(1, -1),
            leaf(-2, 2),
            leaf(1, -1),
        ],
    }
}

/// Three-card Kuhn poker, antes 1. Player 1's second-move infosets (facing
/// a bet after checking) and both of player 2's reply infosets are keyed
/// by the holder's own card only.
pub fn kuhn_poker() -> Game {
    const CARDS: [&str; 3] = ["J", "Q", "K"];

    let mut p1_isets: Vec<Infoset> = CARDS
        .iter()
        .map(|c| Infoset {
            label: (*c).into(),
            actions: vec!["check".into(), "bet".into()],
        })
        .collect();
    p1_isets.extend(CARDS.iter().map(|c| Infoset {
        label: format!("{} facing bet", c),
        actions: vec!["fold".into(), "call".into()],
    }));

    let mut p2_isets: Vec<Infoset> = CARDS
        .iter()
        .map(|c| Infoset {
            label: format!("{} vs bet", c),
            actions: vec!["fold".into(), "call".into()],
        })
        .collect();
    p2_isets.extend(CARDS.iter().map(|c| Infoset {
        label: format!("{} vs check", c),
        actions: vec!["check".into(), "bet".into()],
    }));

    let mut nodes = vec![Node::default()];
    let mut probs = Vec::new();
    let mut deals = Vec::new();
    for a in 0..3usize {
        for b in 0..3usize {
            if a == b {
                continue;
            }
            let win = |k: i64| if a > b { leaf(k, -k) } else { leaf(-k, k) };

            let showdown_big = push(&mut nodes, win(2));
            let fold_vs_bet = push(&mut nodes, leaf(1, -1));
            let bet_node = push(
                &mut nodes,
                personal(Player::Two, b, vec![fold_vs_bet, showdown_big]),
            );
            let both_check = push(&mut nodes, win(1));
            let p1_fold = push(&mut nodes, leaf(-1, 1));
            let late_call = push(&mut nodes, win(2));
            let p1_second = push(
                &mut nodes,
                personal(Player::One, 3 + a, vec![p1_fold, late_call]),
            );
            let p2_after_check = push(
                &mut nodes,
                personal(Player::Two, 3 + b, vec![both_check, p1_second]),
            );
            let p1_first = push(
                &mut nodes,
                personal(Player::One, a, vec![p2_after_check, bet_node]),
            );
            deals.push(p1_first);
            probs.push(Rat::new(1, 6));
        }
    }
    nodes[0] = chance(probs, deals);

    Game {
        title: "kuhn poker".into(),
        infosets: [p1_isets, p2_isets],
        nodes,
    }
}

// ---------------------------------------------------------------------------
// Random games
// ---------------------------------------------------------------------------

/// Generate a random game: a chance root with `actions` outcomes, then
/// `levels` alternating personal levels (player 1 first) with `actions`
/// actions each, and random integer payoffs in [-5, 5] at the leaves.
///
/// Information sets group nodes by the acting player's personal action
/// history (chance is unobserved), so perfect recall holds by
/// construction. The same seed always yields the same game.
pub fn random_game(seed: u64, levels: usize, actions: usize) -> Game {
    let levels = levels.clamp(1, 4);
    let actions = actions.clamp(2, 4);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut infosets: [Vec<Infoset>; 2] = [Vec::new(), Vec::new()];
    let mut keys: [HashMap<Vec<usize>, usize>; 2] = [HashMap::new(), HashMap::new()];
    let mut nodes = vec![Node::default()];

    let chance_kids: Vec<usize> = (0..actions)
        .map(|_| {
            gen_subtree(
                &mut rng,
                &mut nodes,
                &mut infosets,
                &mut keys,
                0,
                levels,
                actions,
                Vec::new(),
            )
        })
        .collect();
    let chance_probs = vec![Rat::new(1, actions as i64); actions];
    nodes[0] = chance(chance_probs, chance_kids);

    Game {
        title: format!("random-{}", seed),
        infosets,
        nodes,
    }
}

#[allow(clippy::too_many_arguments)]
fn gen_subtree(
    rng: &mut StdRng,
    nodes: &mut Vec<Node>,
    infosets: &mut [Vec<Infoset>; 2],
    keys: &mut [HashMap<Vec<usize>, usize>; 2],
    level: usize,
    levels: usize,
    actions: usize,
    history: Vec<usize>,
) -> usize {
    if level == levels {
        return push(
            nodes,
            leaf(rng.gen_range(-5..=5), rng.gen_range(-5..=5)),
        );
    }
    let p = level % 2;
    let iset = *keys[p].entry(history.clone()).or_insert_with(|| {
        let id = infosets[p].len();
        let suffix = if history.is_empty() {
            "root".to_string()
        } else {
            history
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(".")
        };
        infosets[p].push(Infoset {
            label: format!("p{}-{}", p + 1, suffix),
            actions: (0..actions).map(|a| format!("a{}", a + 1)).collect(),
        });
        id
    });
    let children: Vec<usize> = (0..actions)
        .map(|a| {
            let mut next = history.clone();
            next.push(a);
            gen_subtree(rng, nodes, infosets, keys, level + 1, levels, actions, next)
        })
        .collect();
    let player = if p == 0 { Player::One } else { Player::Two };
    push(nodes, personal(player, iset, children))
}
