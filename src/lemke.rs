//! Lemke complementary-pivoting solver for two-player extensive games.
//!
//! The primary path pivots the covering variable into the basis at the
//! row of player 1's sentinel dual and follows the complementary path to
//! a terminal basis. Enumeration restarts the path from every terminal
//! basis with the covering bias perturbed on each other row in turn,
//! deduplicating terminal bases by fingerprint; each branch works on its
//! own tableau clone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};

use crate::error::SolverResult;
use crate::game::{Game, Support};
use crate::numeric::Field;
use crate::profile::{extract_profile, BehaviorProfile};
use crate::sequence_form::{build_system, SequenceLayout};
use crate::tableau::{Fingerprint, Label, PathOutcome, Tableau};

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct SolveOptions {
    /// Stop after this many equilibria; 0 = unbounded.
    pub stop_after: usize,
    /// Maximum enumeration depth; 0 = unbounded.
    pub max_depth: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            stop_after: 0,
            max_depth: 0,
        }
    }
}

/// What the solver found. `incomplete` reports that some branch hit a
/// singular tableau and was abandoned; the equilibria list is still
/// valid, just possibly not exhaustive.
#[derive(Debug, Clone)]
pub struct SolveReport<T> {
    pub equilibria: Vec<BehaviorProfile<T>>,
    pub incomplete: bool,
}

/// Cooperative cancellation flag, polled once per enumeration branch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Solve for Nash equilibria of `game` restricted to `support`.
pub fn solve<T: Field>(
    game: &Game,
    support: &Support,
    opts: SolveOptions,
) -> SolverResult<SolveReport<T>> {
    solve_with(game, support, opts, &CancelToken::new(), |_| {})
}

/// As `solve`, with a cancellation token and a callback invoked for each
/// equilibrium as it is discovered.
pub fn solve_with<T: Field>(
    game: &Game,
    support: &Support,
    opts: SolveOptions,
    cancel: &CancelToken,
    on_found: impl FnMut(&BehaviorProfile<T>),
) -> SolverResult<SolveReport<T>> {
    let system = build_system::<T>(game, support)?;
    let tab = Tableau::new(system.a, system.b);
    let j0 = system.layout.primary_pivot_row();

    let mut search = Search {
        game,
        support,
        layout: &system.layout,
        opts,
        cancel,
        seen: Vec::new(),
        found: Vec::new(),
        incomplete: false,
        on_found,
    };

    if opts.stop_after == 1 {
        search.primary_only(tab, j0);
    } else {
        search.branch(tab, j0, 0);
    }

    Ok(SolveReport {
        equilibria: search.found,
        incomplete: search.incomplete,
    })
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

struct Search<'a, T: Field, F: FnMut(&BehaviorProfile<T>)> {
    game: &'a Game,
    support: &'a Support,
    layout: &'a SequenceLayout,
    opts: SolveOptions,
    cancel: &'a CancelToken,
    seen: Vec<Fingerprint<T>>,
    found: Vec<BehaviorProfile<T>>,
    incomplete: bool,
    on_found: F,
}

impl<T: Field, F: FnMut(&BehaviorProfile<T>)> Search<'_, T, F> {
    fn limit_reached(&self) -> bool {
        self.opts.stop_after != 0 && self.found.len() >= self.opts.stop_after
    }

    /// Record the terminal tableau's solution if its basis is new.
    /// Returns whether it was (the signal to keep exploring from it).
    ///
    /// Degenerate games can reach the same profile through distinct
    /// terminal bases, so the output list is additionally deduplicated by
    /// profile comparison; such a basis still counts as new for the
    /// recursion.
    fn record(&mut self, tab: &Tableau<T>) -> bool {
        let tol = tab.epsilon();
        let sol = tab.basis_vector();
        // perturbed restarts can drag an infeasible basis to termination;
        // such a basis is not a solution and is pruned like a ray
        if sol.iter().any(|v| v.clone() < -tol.clone()) {
            debug!("terminal basis infeasible, pruning");
            return false;
        }
        let fp = tab.fingerprint();
        if self.seen.iter().any(|s| s.matches(&fp, &tol)) {
            debug!("terminal basis already seen");
            return false;
        }
        self.seen.push(fp);
        let profile = extract_profile(self.game, self.support, self.layout, tab, &sol);
        let profile_tol = T::epsilon().to_f64() * 100.0;
        if self
            .found
            .iter()
            .any(|p| p.agrees_with(&profile, profile_tol))
        {
            debug!("terminal basis repeats a known profile");
        } else {
            (self.on_found)(&profile);
            self.found.push(profile);
        }
        true
    }

    /// Single run of the primary ray: force the covering variable basic
    /// at the sentinel row, then follow the complementary path.
    fn primary_only(&mut self, mut tab: Tableau<T>, j0: usize) {
        if tab.pivot(j0, Label::Covering).is_err() {
            self.incomplete = true;
            return;
        }
        match tab.lcp_path(Label::Var(j0 + 1)) {
            Ok(PathOutcome::Terminal) => {
                self.record(&tab);
            }
            Ok(PathOutcome::Ray) => {
                debug!("primary path ended in a secondary ray");
            }
            Err(e) => {
                warn!("primary path aborted: {}", e);
                self.incomplete = true;
            }
        }
    }

    /// Try every row other than `j` as a perturbed restart of the path;
    /// recurse from each new terminal basis. `tab` is the tableau the
    /// current equilibrium was reached on (or the fresh tableau at depth
    /// 0); every restart works on its own clone.
    fn branch(&mut self, tab: Tableau<T>, j: usize, depth: usize) {
        if self.opts.max_depth != 0 && depth > self.opts.max_depth {
            return;
        }
        let small = -(T::one() / T::from_i64(1000));
        for i in 0..tab.size() {
            if i == j {
                continue;
            }
            if self.cancel.is_cancelled() {
                debug!("search cancelled at depth {}", depth);
                return;
            }
            if self.limit_reached() {
                return;
            }

            let mut clone = tab.clone();
            clone.set_covering(i, small.clone());
            if clone.refactor().is_err() {
                warn!("singular tableau while perturbing row {}", i);
                self.incomplete = true;
                continue;
            }

            // Re-enter the covering variable. At depth 0 the basis is
            // all-slack and the entry row is forced; deeper, the
            // minimum-ratio rule picks it.
            let leaving = if depth == 0 {
                match clone.pivot(j, Label::Covering) {
                    Ok(label) => label,
                    Err(_) => {
                        self.incomplete = true;
                        continue;
                    }
                }
            } else {
                match clone.pivot_in(Label::Covering) {
                    Ok(Some(label)) => label,
                    Ok(None) => continue,
                    Err(_) => {
                        self.incomplete = true;
                        continue;
                    }
                }
            };
            let Some(start) = leaving.complement() else {
                continue;
            };

            match clone.lcp_path(start) {
                Ok(PathOutcome::Terminal) => {
                    if self.record(&clone) {
                        // restore the standard covering bias before
                        // exploring onward from this equilibrium
                        clone.set_covering(i, -T::one());
                        if clone.refactor().is_err() {
                            warn!("singular tableau restoring row {}", i);
                            self.incomplete = true;
                            continue;
                        }
                        self.branch(clone, i, depth + 1);
                    }
                }
                Ok(PathOutcome::Ray) => {
                    debug!("secondary ray from row {} at depth {}", i, depth);
                }
                Err(e) => {
                    warn!("path from row {} aborted: {}", i, e);
                    self.incomplete = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::numeric::Rat;

    #[test]
    fn default_options_are_unbounded() {
        let opts = SolveOptions::default();
        assert_eq!(opts.stop_after, 0);
        assert_eq!(opts.max_depth, 0);
    }

    #[test]
    fn cancel_token_round_trip() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let shared = token.clone();
        shared.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn trivial_game_has_one_empty_equilibrium() {
        let game = crate::game::Game {
            title: "trivial".into(),
            infosets: [Vec::new(), Vec::new()],
            nodes: vec![crate::game::Node::default()],
        };
        let support = Support::full(&game);
        let report = solve::<Rat>(&game, &support, SolveOptions::default()).unwrap();
        assert_eq!(report.equilibria.len(), 1);
        assert!(report.equilibria[0].is_empty());
        assert!(!report.incomplete);
    }

    #[test]
    fn callback_sees_each_equilibrium() {
        let game = catalog::matching_pennies();
        let support = Support::full(&game);
        let mut streamed = 0usize;
        let report = solve_with::<f64>(
            &game,
            &support,
            SolveOptions::default(),
            &CancelToken::new(),
            |_| streamed += 1,
        )
        .unwrap();
        assert_eq!(streamed, report.equilibria.len());
    }

    #[test]
    fn pre_cancelled_search_returns_nothing() {
        let game = catalog::matching_pennies();
        let support = Support::full(&game);
        let token = CancelToken::new();
        token.cancel();
        let report = solve_with::<f64>(
            &game,
            &support,
            SolveOptions::default(),
            &token,
            |_| {},
        )
        .unwrap();
        assert!(report.equilibria.is_empty());
        assert!(!report.incomplete);
    }
}
