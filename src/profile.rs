//! Behavior profiles and their extraction from a terminal tableau.
//!
//! A profile holds one probability per active action at every reached
//! information set, in the layout's slot order. Sequence form leaves
//! off-path infosets undefined; extraction fills those with the centroid
//! (uniform over active actions) so callers always see a complete
//! profile.

use std::io;

use crate::game::{Branch, Game, Support};
use crate::numeric::Field;
use crate::sequence_form::SequenceLayout;
use crate::tableau::{Label, Tableau};

/// A complete behavior profile: per player, per reached infoset (slot
/// order), one probability per active action. Immutable once extracted.
#[derive(Debug, Clone)]
pub struct BehaviorProfile<T> {
    probs: [Vec<Vec<T>>; 2],
    /// Infoset ids per player, parallel to `probs`.
    infosets: [Vec<usize>; 2],
}

impl<T: Field> BehaviorProfile<T> {
    /// Infoset ids of a player's reached infosets, in slot order.
    pub fn infoset_ids(&self, player: usize) -> &[usize] {
        &self.infosets[player]
    }

    /// Probabilities at one reached infoset, in active-action order.
    pub fn probs(&self, player: usize, slot0: usize) -> &[T] {
        &self.probs[player][slot0]
    }

    pub fn num_infosets(&self, player: usize) -> usize {
        self.probs[player].len()
    }

    /// All values flattened: player 1 then player 2, slot order, action
    /// order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.probs.iter().flatten().flatten()
    }

    pub fn len(&self) -> usize {
        self.values().count()
    }

    pub fn is_empty(&self) -> bool {
        self.values().next().is_none()
    }

    /// Largest absolute difference between two profiles of the same
    /// shape, as f64.
    pub fn max_abs_diff(&self, other: &BehaviorProfile<T>) -> f64 {
        self.values()
            .zip(other.values())
            .map(|(a, b)| (a.clone() - b.clone()).abs().to_f64())
            .fold(0.0, f64::max)
    }

    pub fn agrees_with(&self, other: &BehaviorProfile<T>, tol: f64) -> bool {
        self.len() == other.len() && self.max_abs_diff(other) <= tol
    }

    /// Stream as a labeled comma-separated line: `label,v1,v2,...`.
    /// Rational values render as decimals with `decimals` digits.
    pub fn write_labeled<W: io::Write>(
        &self,
        out: &mut W,
        label: &str,
        decimals: usize,
    ) -> io::Result<()> {
        write!(out, "{}", label)?;
        for v in self.values() {
            write!(out, ",{}", v.render(decimals))?;
        }
        writeln!(out)
    }
}

/// Read the behavior profile off a terminal tableau.
///
/// Re-walks the tree exactly as the builder did: the probability of an
/// active action is the basic value of its child sequence divided by the
/// basic value of the parent sequence, zero when either is nonbasic or
/// not above tolerance. Any reached infoset left all-zero is centroided.
pub fn extract_profile<T: Field>(
    game: &Game,
    support: &Support,
    layout: &SequenceLayout,
    tab: &Tableau<T>,
    sol: &[T],
) -> BehaviorProfile<T> {
    let mut probs: [Vec<Vec<T>>; 2] = [Vec::new(), Vec::new()];
    for p in 0..2 {
        for &iset in &layout.reachable[p] {
            probs[p].push(vec![T::zero(); support.num_active(p, iset)]);
        }
    }

    let mut walker = Extractor {
        game,
        support,
        layout,
        tab,
        sol,
        probs: &mut probs,
    };
    walker.walk(game.root(), 1, 1);

    // centroid fill for reached infosets the solution leaves undefined
    for p in 0..2 {
        for row in probs[p].iter_mut() {
            let mut total = T::zero();
            for v in row.iter() {
                total = total + v.clone();
            }
            if total.near_zero() {
                let uniform = T::one() / T::from_i64(row.len() as i64);
                for v in row.iter_mut() {
                    *v = uniform.clone();
                }
            }
        }
    }

    BehaviorProfile {
        probs,
        infosets: layout.reachable.clone(),
    }
}

struct Extractor<'a, T: Field> {
    game: &'a Game,
    support: &'a Support,
    layout: &'a SequenceLayout,
    tab: &'a Tableau<T>,
    sol: &'a [T],
    probs: &'a mut [Vec<Vec<T>>; 2],
}

impl<T: Field> Extractor<'_, T> {
    /// Basic value of an LCP variable when it is basic and above
    /// tolerance.
    fn positive_value(&self, var: usize) -> Option<T> {
        let row = self.tab.row_of(Label::Var(var))?;
        let v = self.sol[row].clone();
        (v > self.tab.epsilon()).then_some(v)
    }

    fn walk(&mut self, node: usize, s1: usize, s2: usize) {
        match &self.game.node(node).branch {
            None => {}
            Some(Branch::Chance { children, .. }) => {
                for &child in children {
                    self.walk(child, s1, s2);
                }
            }
            Some(Branch::Personal {
                player,
                infoset,
                children,
            }) => {
                let p = player.index();
                let slot = self
                    .layout
                    .slot_of(p, *infoset)
                    .expect("infoset reachable under support");
                let parent = self.layout.seq_var(p, if p == 0 { s1 } else { s2 });
                let parent_val = self.positive_value(parent);
                let snew = self.layout.seq_start(p, slot);
                let active = self.support.active_actions(p, *infoset);
                for (k, &action) in active.iter().enumerate() {
                    let child_seq = snew + k + 1;
                    let child_var = self.layout.seq_var(p, child_seq);
                    if let (Some(pv), Some(cv)) =
                        (parent_val.clone(), self.positive_value(child_var))
                    {
                        self.probs[p][slot - 1][k] = cv / pv;
                    }
                    let (c1, c2) = if p == 0 { (child_seq, s2) } else { (s1, child_seq) };
                    self.walk(children[action], c1, c2);
                }
            }
        }
    }
}
