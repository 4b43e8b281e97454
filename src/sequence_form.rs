//! Sequence-form assembly: walks the game tree under a support and emits
//! the linear complementarity system.
//!
//! Variables are 1-based and blocked per player: sequences 1..=ns1, then
//! ns1+1..=ns1+ns2, then ni1 infoset duals (a sentinel "no infoset yet"
//! slot first), then ni2. Variable v owns row v-1 of the matrix; column 0
//! is the covering column.
//!
//! Payoffs enter shifted by -(max payoff + 1), so every payoff entry is
//! strictly negative, which the primary ray of the path solver requires.
//! All accumulation (path probabilities times shifted payoffs) happens in
//! exact rational arithmetic; the matrix is lowered into the working
//! field in one pass at the end.

use crate::error::SolverResult;
use crate::game::{Branch, Game, Support};
use crate::numeric::{Field, Matrix, Rat};

// ---------------------------------------------------------------------------
// Index layout
// ---------------------------------------------------------------------------

/// Index layout shared by the builder and the profile extractor.
#[derive(Debug, Clone)]
pub struct SequenceLayout {
    /// Reachable infosets per player, in first-visit order.
    pub reachable: [Vec<usize>; 2],
    /// 1-based slot per infoset id; None when unreached.
    slot: [Vec<Option<usize>>; 2],
    /// Sequence-index base ("snew") per slot: the k-th active action of
    /// the slot owns player-local sequence `seq_start + k + 1`.
    seq_start: [Vec<usize>; 2],
    /// Sequences per player, empty sequence included.
    pub ns: [usize; 2],
    /// Infoset slots per player, sentinel included.
    pub ni: [usize; 2],
}

impl SequenceLayout {
    pub fn build(game: &Game, support: &Support) -> SolverResult<SequenceLayout> {
        support.validate(game)?;
        let reachable = support.reachable_infosets(game);
        let mut slot = [
            vec![None; game.num_infosets(0)],
            vec![None; game.num_infosets(1)],
        ];
        let mut seq_start = [Vec::new(), Vec::new()];
        let mut ns = [0usize; 2];
        for p in 0..2 {
            let mut snew = 1;
            for (k, &iset) in reachable[p].iter().enumerate() {
                slot[p][iset] = Some(k + 1);
                seq_start[p].push(snew);
                snew += support.num_active(p, iset);
            }
            ns[p] = snew;
        }
        let ni = [reachable[0].len() + 1, reachable[1].len() + 1];
        Ok(SequenceLayout {
            reachable,
            slot,
            seq_start,
            ns,
            ni,
        })
    }

    /// Total variable count: ns1 + ns2 + ni1 + ni2.
    #[inline]
    pub fn ntot(&self) -> usize {
        self.ns[0] + self.ns[1] + self.ni[0] + self.ni[1]
    }

    /// 1-based slot of a reached infoset.
    #[inline]
    pub fn slot_of(&self, player: usize, infoset: usize) -> Option<usize> {
        self.slot[player][infoset]
    }

    /// "snew" base for a slot's child sequences.
    #[inline]
    pub fn seq_start(&self, player: usize, slot: usize) -> usize {
        self.seq_start[player][slot - 1]
    }

    /// LCP variable of a player-local sequence index.
    #[inline]
    pub fn seq_var(&self, player: usize, seq: usize) -> usize {
        match player {
            0 => seq,
            _ => self.ns[0] + seq,
        }
    }

    fn dual_base(&self, player: usize) -> usize {
        self.ns[0] + self.ns[1] + if player == 0 { 0 } else { self.ni[0] }
    }

    /// LCP variable of a player's sentinel dual.
    #[inline]
    pub fn sentinel_var(&self, player: usize) -> usize {
        self.dual_base(player) + 1
    }

    /// LCP variable of a reached infoset's dual, by 1-based slot.
    #[inline]
    pub fn slot_var(&self, player: usize, slot: usize) -> usize {
        self.dual_base(player) + 1 + slot
    }

    /// Row forced basic by the primary ray: the row owned by player 1's
    /// sentinel dual.
    #[inline]
    pub fn primary_pivot_row(&self) -> usize {
        self.ns[0] + self.ns[1]
    }
}

// ---------------------------------------------------------------------------
// System assembly
// ---------------------------------------------------------------------------

/// The assembled LCP system in the working field.
#[derive(Debug, Clone)]
pub struct LcpSystem<T> {
    /// ntot x (ntot + 1); column 0 is the covering column.
    pub a: Matrix<T>,
    pub b: Vec<T>,
    pub layout: SequenceLayout,
}

pub fn build_system<T: Field>(game: &Game, support: &Support) -> SolverResult<LcpSystem<T>> {
    let layout = SequenceLayout::build(game, support)?;
    let n = layout.ntot();
    let maxpay = game.max_payoff() + Rat::one();

    let mut filler = Filler {
        game,
        support,
        layout: &layout,
        a: Matrix::zeros(n, n + 1),
        maxpay,
    };
    filler.fill(game.root(), Rat::one(), 1, 1);
    let mut a = filler.a;
    let mut b = vec![Rat::zero(); n];

    for r in 0..n {
        a.set(r, 0, -Rat::one());
    }
    for p in 0..2 {
        let empty = layout.seq_var(p, 1);
        let sentinel = layout.sentinel_var(p);
        a.set(empty - 1, sentinel, Rat::one());
        a.set(sentinel - 1, empty, -Rat::one());
        b[sentinel - 1] = -Rat::one();
    }

    Ok(LcpSystem {
        a: a.map(T::from_rat),
        b: b.iter().map(T::from_rat).collect(),
        layout,
    })
}

struct Filler<'a> {
    game: &'a Game,
    support: &'a Support,
    layout: &'a SequenceLayout,
    a: Matrix<Rat>,
    maxpay: Rat,
}

impl Filler<'_> {
    fn acc(&mut self, row_var: usize, col_var: usize, delta: Rat) {
        let cur = self.a.get(row_var - 1, col_var).clone();
        self.a.set(row_var - 1, col_var, cur + delta);
    }

    fn link(&mut self, row_var: usize, col_var: usize, value: i64) {
        self.a.set(row_var - 1, col_var, Rat::from_int(value));
    }

    /// Recursive descent carrying the current sequence of each player and
    /// the exact path probability through chance moves.
    fn fill(&mut self, node: usize, prob: Rat, s1: usize, s2: usize) {
        let nd = self.game.node(node);
        if let Some(out) = &nd.outcome {
            let v1 = self.layout.seq_var(0, s1);
            let v2 = self.layout.seq_var(1, s2);
            self.acc(
                v1,
                v2,
                prob.clone() * (out.payoffs[0].clone() - self.maxpay.clone()),
            );
            self.acc(
                v2,
                v1,
                prob.clone() * (out.payoffs[1].clone() - self.maxpay.clone()),
            );
        }
        match &nd.branch {
            None => {}
            Some(Branch::Chance { probs, children }) => {
                for (p, &child) in probs.iter().zip(children) {
                    self.fill(child, prob.clone() * p.clone(), s1, s2);
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
                let dual = self.layout.slot_var(p, slot);
                let parent = self.layout.seq_var(p, if p == 0 { s1 } else { s2 });
                self.link(parent, dual, -1);
                self.link(dual, parent, 1);
                let snew = self.layout.seq_start(p, slot);
                let active = self.support.active_actions(p, *infoset);
                for (k, &action) in active.iter().enumerate() {
                    let child_seq = snew + k + 1;
                    let child_var = self.layout.seq_var(p, child_seq);
                    self.link(child_var, dual, 1);
                    self.link(dual, child_var, -1);
                    let (c1, c2) = if p == 0 { (child_seq, s2) } else { (s1, child_seq) };
                    self.fill(children[action], prob.clone(), c1, c2);
                }
            }
        }
    }
}
