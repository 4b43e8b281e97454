//! Two-player extensive-form games with imperfect information.
//!
//! Games are stored as a node arena (root at index 0). A node may carry an
//! outcome (exact-rational payoff pair) and may branch: either a chance
//! move with exact-rational probabilities, or a personal move belonging to
//! one of the two players' information sets. Perfect recall is assumed:
//! every node of an information set must follow the same own-action
//! history.
//!
//! Payoffs and chance probabilities are exposed only as exact rationals;
//! the solver lowers them into its working field at one well-defined
//! point.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};
use crate::numeric::Rat;

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// 0-based index, for table lookups.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    /// 1-based player number, for messages.
    #[inline]
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }
}

impl TryFrom<u8> for Player {
    type Error = String;

    fn try_from(v: u8) -> Result<Player, String> {
        match v {
            1 => Ok(Player::One),
            2 => Ok(Player::Two),
            other => Err(format!("player must be 1 or 2, got {}", other)),
        }
    }
}

impl From<Player> for u8 {
    fn from(p: Player) -> u8 {
        p.number()
    }
}

// ---------------------------------------------------------------------------
// Game structure
// ---------------------------------------------------------------------------

/// An information set: the acting player's knowledge state. All nodes
/// assigned to it present the same actions, in the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Infoset {
    pub label: String,
    pub actions: Vec<String>,
}

/// Terminal payoffs, player 1 first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outcome {
    pub payoffs: [Rat; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Branch {
    Chance {
        probs: Vec<Rat>,
        children: Vec<usize>,
    },
    Personal {
        player: Player,
        infoset: usize,
        children: Vec<usize>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<Branch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub title: String,
    /// Infoset tables, player 1 then player 2.
    pub infosets: [Vec<Infoset>; 2],
    /// Node arena; the root is index 0.
    pub nodes: Vec<Node>,
}

impl Game {
    #[inline]
    pub fn root(&self) -> usize {
        0
    }

    #[inline]
    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    #[inline]
    pub fn infoset(&self, player: usize, id: usize) -> &Infoset {
        &self.infosets[player][id]
    }

    pub fn num_infosets(&self, player: usize) -> usize {
        self.infosets[player].len()
    }

    /// Largest payoff appearing anywhere in the game, over both players.
    /// Zero for a game without outcomes.
    pub fn max_payoff(&self) -> Rat {
        let mut best = Rat::zero();
        let mut seen = false;
        for node in &self.nodes {
            if let Some(out) = &node.outcome {
                for p in &out.payoffs {
                    if !seen || *p > best {
                        best = p.clone();
                        seen = true;
                    }
                }
            }
        }
        best
    }

    pub fn from_json(json: &str) -> SolverResult<Game> {
        let game: Game = serde_json::from_str(json)?;
        game.validate()?;
        Ok(game)
    }

    pub fn to_json(&self) -> SolverResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> SolverResult<Game> {
        Game::from_json(&fs::read_to_string(path)?)
    }

    pub fn save(&self, path: &Path) -> SolverResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Structural validation: the arena must be a tree rooted at node 0,
    /// chance probabilities must sum to exactly 1, and branching arity
    /// must match the infoset's action list.
    pub fn validate(&self) -> SolverResult<()> {
        if self.nodes.is_empty() {
            return Err(SolverError::MalformedGame("game has no nodes".into()));
        }
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![self.root()];
        visited[self.root()] = true;
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            let children = match &node.branch {
                None => continue,
                Some(Branch::Chance { probs, children }) => {
                    if probs.len() != children.len() {
                        return Err(SolverError::MalformedGame(format!(
                            "chance node {} has {} probabilities for {} children",
                            id,
                            probs.len(),
                            children.len()
                        )));
                    }
                    if children.is_empty() {
                        return Err(SolverError::MalformedGame(format!(
                            "chance node {} has no children",
                            id
                        )));
                    }
                    let mut sum = Rat::zero();
                    for p in probs {
                        if *p < Rat::zero() {
                            return Err(SolverError::MalformedGame(format!(
                                "chance node {} has a negative probability",
                                id
                            )));
                        }
                        sum = sum + p.clone();
                    }
                    if sum != Rat::one() {
                        return Err(SolverError::BadChanceProbs {
                            node: id,
                            sum: sum.to_string(),
                        });
                    }
                    children
                }
                Some(Branch::Personal {
                    player,
                    infoset,
                    children,
                }) => {
                    let table = &self.infosets[player.index()];
                    let iset = table.get(*infoset).ok_or_else(|| {
                        SolverError::MalformedGame(format!(
                            "node {} references missing infoset {} of player {}",
                            id,
                            infoset,
                            player.number()
                        ))
                    })?;
                    if iset.actions.len() != children.len() {
                        return Err(SolverError::MalformedGame(format!(
                            "node {} has {} children but infoset \"{}\" has {} actions",
                            id,
                            children.len(),
                            iset.label,
                            iset.actions.len()
                        )));
                    }
                    if children.is_empty() {
                        return Err(SolverError::MalformedGame(format!(
                            "infoset \"{}\" has no actions",
                            iset.label
                        )));
                    }
                    children
                }
            };
            for &child in children {
                if child >= self.nodes.len() {
                    return Err(SolverError::MalformedGame(format!(
                        "node {} references missing child {}",
                        id, child
                    )));
                }
                if visited[child] {
                    return Err(SolverError::MalformedGame(format!(
                        "node {} is reached twice; the game must be a tree",
                        child
                    )));
                }
                visited[child] = true;
                stack.push(child);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Supports
// ---------------------------------------------------------------------------

/// The subset of actions considered active per information set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Support {
    /// `active[player][infoset]` lists active action indices, ascending.
    pub active: [Vec<Vec<usize>>; 2],
}

impl Support {
    /// The full support: every action of every infoset active.
    pub fn full(game: &Game) -> Support {
        let per_player = |player: usize| {
            game.infosets[player]
                .iter()
                .map(|iset| (0..iset.actions.len()).collect())
                .collect()
        };
        Support {
            active: [per_player(0), per_player(1)],
        }
    }

    #[inline]
    pub fn active_actions(&self, player: usize, infoset: usize) -> &[usize] {
        &self.active[player][infoset]
    }

    #[inline]
    pub fn num_active(&self, player: usize, infoset: usize) -> usize {
        self.active[player][infoset].len()
    }

    /// Rejects supports that do not fit the game or leave an infoset with
    /// no active action.
    pub fn validate(&self, game: &Game) -> SolverResult<()> {
        for player in 0..2 {
            let table = &game.infosets[player];
            let active = &self.active[player];
            if active.len() != table.len() {
                return Err(SolverError::SupportMismatch(format!(
                    "player {} has {} infosets but the support lists {}",
                    player + 1,
                    table.len(),
                    active.len()
                )));
            }
            for (id, (iset, acts)) in table.iter().zip(active).enumerate() {
                if acts.is_empty() {
                    return Err(SolverError::EmptySupport {
                        player: player as u8 + 1,
                        label: iset.label.clone(),
                    });
                }
                let mut prev: Option<usize> = None;
                for &a in acts {
                    if a >= iset.actions.len() {
                        return Err(SolverError::SupportMismatch(format!(
                            "infoset \"{}\" has no action {}",
                            iset.label, a
                        )));
                    }
                    if prev.is_some_and(|p| p >= a) {
                        return Err(SolverError::SupportMismatch(format!(
                            "active actions at infoset \"{}\" (id {}) must be ascending",
                            iset.label, id
                        )));
                    }
                    prev = Some(a);
                }
            }
        }
        Ok(())
    }

    /// Information sets reachable from the root when only active actions
    /// are played, per player, in first-visit depth-first order.
    pub fn reachable_infosets(&self, game: &Game) -> [Vec<usize>; 2] {
        let mut order: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
        let mut seen = [
            vec![false; game.num_infosets(0)],
            vec![false; game.num_infosets(1)],
        ];
        self.reach_walk(game, game.root(), &mut order, &mut seen);
        order
    }

    fn reach_walk(
        &self,
        game: &Game,
        id: usize,
        order: &mut [Vec<usize>; 2],
        seen: &mut [Vec<bool>; 2],
    ) {
        match &game.node(id).branch {
            None => {}
            Some(Branch::Chance { children, .. }) => {
                for &child in children {
                    self.reach_walk(game, child, order, seen);
                }
            }
            Some(Branch::Personal {
                player,
                infoset,
                children,
            }) => {
                let p = player.index();
                if !seen[p][*infoset] {
                    seen[p][*infoset] = true;
                    order[p].push(*infoset);
                }
                for &a in self.active_actions(p, *infoset) {
                    self.reach_walk(game, children[a], order, seen);
                }
            }
        }
    }
}
