//! Dense LCP tableau with complementary pivoting.
//!
//! The tableau carries the augmented system [A | I | b]: structural
//! columns (column 0 is the covering column), a slack identity block, and
//! the right-hand side, all kept row-reduced under the current basis by
//! full Gauss-Jordan pivoting. Keeping every column current means the
//! inverse basis is always on hand (the slack block) and basic values are
//! O(1) reads off the rhs column.
//!
//! Layout for a system of size n:
//!
//!   column 0          covering variable
//!   columns 1..=n     structural variables x_1..x_n
//!   columns n+1..=2n  slacks w_1..w_n (inverse basis)
//!   column 2n+1       right-hand side
//!
//! Structural variable x_i and slack w_i are complementary partners;
//! slack w_i starts basic in row i-1. The covering variable has no
//! partner: its departure from the basis is what terminates a
//! complementary path.

use log::warn;
use thiserror::Error;

use crate::numeric::{Field, Matrix};

/// Variable labels. Declaration order gives the ordering used by basis
/// fingerprints: covering, then structural, then slacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Covering,
    /// Structural variable x_i, 1-based.
    Var(usize),
    /// Slack w_i paired with x_i, 1-based.
    Slack(usize),
}

impl Label {
    /// Complementary partner; the covering variable has none.
    pub fn complement(self) -> Option<Label> {
        match self {
            Label::Covering => None,
            Label::Var(i) => Some(Label::Slack(i)),
            Label::Slack(i) => Some(Label::Var(i)),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TableauError {
    #[error("pivot element is numerically zero at row {row}")]
    ZeroPivot { row: usize },

    #[error("basis matrix is singular")]
    Singular,
}

/// Outcome of following a complementary path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOutcome {
    /// The covering variable left the basis: terminal complementary basis.
    Terminal,
    /// No eligible pivot row: secondary ray, no solution along this path.
    Ray,
}

#[derive(Debug, Clone)]
pub struct Tableau<T> {
    n: usize,
    /// Original constraint columns: covering + structural, n x (n+1).
    a: Matrix<T>,
    /// Original right-hand side.
    b: Vec<T>,
    /// Row-reduced augmented matrix, n x (2n+2).
    work: Matrix<T>,
    /// Basic label per row.
    basis: Vec<Label>,
    /// Row of the covering variable (slot 0) and of each structural
    /// variable (slots 1..=n), if basic.
    var_row: Vec<Option<usize>>,
    /// Row of each slack (slots 1..=n), if basic.
    slack_row: Vec<Option<usize>>,
}

impl<T: Field> Tableau<T> {
    /// Build a tableau for A x = b with the all-slack starting basis.
    /// `a` must be n x (n+1) with the covering column at index 0.
    pub fn new(a: Matrix<T>, b: Vec<T>) -> Tableau<T> {
        let n = b.len();
        debug_assert_eq!(a.rows(), n);
        debug_assert_eq!(a.cols(), n + 1);
        let mut slack_row = vec![None; n + 1];
        for i in 0..n {
            slack_row[i + 1] = Some(i);
        }
        let mut tab = Tableau {
            n,
            a,
            b,
            work: Matrix::zeros(n, 2 * n + 2),
            basis: (1..=n).map(Label::Slack).collect(),
            var_row: vec![None; n + 1],
            slack_row,
        };
        tab.load_slack_basis();
        tab
    }

    /// work = [a | I | b], valid only for the all-slack basis.
    fn load_slack_basis(&mut self) {
        let n = self.n;
        for r in 0..n {
            for c in 0..=n {
                self.work.set(r, c, self.a.get(r, c).clone());
            }
            self.work.set(r, n + 1 + r, T::one());
            self.work.set(r, self.rhs_col(), self.b[r].clone());
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn epsilon(&self) -> T {
        T::epsilon()
    }

    #[inline]
    fn rhs_col(&self) -> usize {
        2 * self.n + 1
    }

    #[inline]
    fn col_of(&self, label: Label) -> usize {
        match label {
            Label::Covering => 0,
            Label::Var(i) => i,
            Label::Slack(i) => self.n + i,
        }
    }

    /// Row where `label` is basic, if it is.
    pub fn row_of(&self, label: Label) -> Option<usize> {
        match label {
            Label::Covering => self.var_row[0],
            Label::Var(i) => self.var_row[i],
            Label::Slack(i) => self.slack_row[i],
        }
    }

    pub fn is_basic(&self, label: Label) -> bool {
        self.row_of(label).is_some()
    }

    pub fn basic_label(&self, row: usize) -> Label {
        self.basis[row]
    }

    /// Values of the basic variables, in row order.
    pub fn basis_vector(&self) -> Vec<T> {
        let rhs = self.rhs_col();
        (0..self.n).map(|r| self.work.get(r, rhs).clone()).collect()
    }

    /// Overwrite the covering-column entry of the original system on one
    /// row. Takes effect at the next `refactor`.
    pub fn set_covering(&mut self, row: usize, value: T) {
        self.a.set(row, 0, value);
    }

    fn clear_loc(&mut self, label: Label) {
        match label {
            Label::Covering => self.var_row[0] = None,
            Label::Var(i) => self.var_row[i] = None,
            Label::Slack(i) => self.slack_row[i] = None,
        }
    }

    fn set_loc(&mut self, label: Label, row: usize) {
        match label {
            Label::Covering => self.var_row[0] = Some(row),
            Label::Var(i) => self.var_row[i] = Some(row),
            Label::Slack(i) => self.slack_row[i] = Some(row),
        }
    }

    /// Exchange `entering` (must be nonbasic) for the variable basic in
    /// `row`. Returns the leaving label.
    pub fn pivot(&mut self, row: usize, entering: Label) -> Result<Label, TableauError> {
        debug_assert!(!self.is_basic(entering));
        let col = self.col_of(entering);
        let width = self.work.cols();
        let pv = self.work.get(row, col).clone();
        if pv.near_zero() {
            return Err(TableauError::ZeroPivot { row });
        }
        for c in 0..width {
            let v = self.work.get(row, c).clone() / pv.clone();
            self.work.set(row, c, v);
        }
        self.work.set(row, col, T::one());
        for r in 0..self.n {
            if r == row {
                continue;
            }
            let factor = self.work.get(r, col).clone();
            if factor.near_zero() {
                self.work.set(r, col, T::zero());
                continue;
            }
            for c in 0..width {
                let v = self.work.get(r, c).clone()
                    - factor.clone() * self.work.get(row, c).clone();
                self.work.set(r, c, v);
            }
            self.work.set(r, col, T::zero());
        }
        let leaving = self.basis[row];
        self.clear_loc(leaving);
        self.set_loc(entering, row);
        self.basis[row] = entering;
        Ok(leaving)
    }

    /// Recompute the row-reduced form from the original system and the
    /// current basis. Bounds floating-point drift after many incremental
    /// pivots; under exact arithmetic the basic values are unchanged.
    pub fn refactor(&mut self) -> Result<(), TableauError> {
        let n = self.n;
        let binv = self.invert_basis()?;
        let mut work = Matrix::zeros(n, 2 * n + 2);
        for r in 0..n {
            // structural block: row r of binv * a
            for c in 0..=n {
                let mut sum = T::zero();
                for k in 0..n {
                    let f = binv.get(r, k);
                    if f.near_zero() {
                        continue;
                    }
                    sum = sum + f.clone() * self.a.get(k, c).clone();
                }
                work.set(r, c, sum);
            }
            // slack block is binv itself
            for k in 0..n {
                work.set(r, n + 1 + k, binv.get(r, k).clone());
            }
            // rhs
            let mut sum = T::zero();
            for k in 0..n {
                sum = sum + binv.get(r, k).clone() * self.b[k].clone();
            }
            work.set(r, self.rhs_col(), sum);
        }
        self.work = work;
        Ok(())
    }

    /// Inverse of the basis matrix whose column j is the original column
    /// of the variable basic in row j.
    fn invert_basis(&self) -> Result<Matrix<T>, TableauError> {
        let n = self.n;
        let mut aug = Matrix::zeros(n, 2 * n);
        for (j, &label) in self.basis.iter().enumerate() {
            match label {
                Label::Covering => {
                    for r in 0..n {
                        aug.set(r, j, self.a.get(r, 0).clone());
                    }
                }
                Label::Var(i) => {
                    for r in 0..n {
                        aug.set(r, j, self.a.get(r, i).clone());
                    }
                }
                Label::Slack(i) => aug.set(i - 1, j, T::one()),
            }
        }
        for r in 0..n {
            aug.set(r, n + r, T::one());
        }
        // Gauss-Jordan with partial pivoting.
        for col in 0..n {
            let mut best: Option<(usize, T)> = None;
            for r in col..n {
                let v = aug.get(r, col).abs();
                if v.near_zero() {
                    continue;
                }
                if best.as_ref().is_none_or(|(_, bv)| v > *bv) {
                    best = Some((r, v));
                }
            }
            let Some((p, _)) = best else {
                return Err(TableauError::Singular);
            };
            if p != col {
                for c in 0..2 * n {
                    let tmp = aug.get(col, c).clone();
                    aug.set(col, c, aug.get(p, c).clone());
                    aug.set(p, c, tmp);
                }
            }
            let pv = aug.get(col, col).clone();
            for c in 0..2 * n {
                let v = aug.get(col, c).clone() / pv.clone();
                aug.set(col, c, v);
            }
            aug.set(col, col, T::one());
            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = aug.get(r, col).clone();
                if factor.near_zero() {
                    aug.set(r, col, T::zero());
                    continue;
                }
                for c in 0..2 * n {
                    let v =
                        aug.get(r, c).clone() - factor.clone() * aug.get(col, c).clone();
                    aug.set(r, c, v);
                }
                aug.set(r, col, T::zero());
            }
        }
        let mut binv = Matrix::zeros(n, n);
        for r in 0..n {
            for c in 0..n {
                binv.set(r, c, aug.get(r, n + c).clone());
            }
        }
        Ok(binv)
    }

    // -----------------------------------------------------------------------
    // Minimum-ratio rule
    // -----------------------------------------------------------------------

    /// Row chosen by the minimum-ratio rule for an entering column, or
    /// None if no row has a positive entry (a ray). Ties are broken by
    /// the lexicographic rule: compare the candidates' inverse-basis rows
    /// scaled by the entering coefficient.
    fn min_ratio_row(&self, col: usize) -> Option<usize> {
        let eps = T::epsilon();
        let mut best: Option<usize> = None;
        for r in 0..self.n {
            if !(self.work.get(r, col).clone() > eps.clone()) {
                continue;
            }
            match best {
                None => best = Some(r),
                Some(b) => {
                    if self.lex_ratio_less(r, b, col) {
                        best = Some(r);
                    }
                }
            }
        }
        best
    }

    /// True when row `ra`'s ratio vector is lexicographically smaller
    /// than row `rb`'s. Cross-multiplied so exact arithmetic never
    /// divides: for positive d_a, d_b,
    ///   work[ra][c]/d_a < work[rb][c]/d_b  <=>
    ///   work[ra][c]*d_b < work[rb][c]*d_a.
    fn lex_ratio_less(&self, ra: usize, rb: usize, col: usize) -> bool {
        let eps = T::epsilon();
        let da = self.work.get(ra, col).clone();
        let db = self.work.get(rb, col).clone();
        let compare_cols =
            std::iter::once(self.rhs_col()).chain((self.n + 1)..=(2 * self.n));
        for c in compare_cols {
            let diff = self.work.get(ra, c).clone() * db.clone()
                - self.work.get(rb, c).clone() * da.clone();
            if diff < -eps.clone() {
                return true;
            }
            if diff > eps.clone() {
                return false;
            }
        }
        false
    }

    /// Pivot a nonbasic column into the basis on the minimum-ratio row.
    /// Returns the leaving label, or None when the column admits no pivot.
    pub fn pivot_in(&mut self, entering: Label) -> Result<Option<Label>, TableauError> {
        let col = self.col_of(entering);
        match self.min_ratio_row(col) {
            None => Ok(None),
            Some(row) => self.pivot(row, entering).map(Some),
        }
    }

    // -----------------------------------------------------------------------
    // Complementary path
    // -----------------------------------------------------------------------

    /// Follow Lemke's complementary path starting with `start` entering:
    /// pivot on the minimum-ratio row, then continue with the complement
    /// of whatever left, until the covering variable leaves (Terminal) or
    /// no pivot row exists (Ray).
    pub fn lcp_path(&mut self, start: Label) -> Result<PathOutcome, TableauError> {
        let cap = 100 + 50 * self.n * self.n;
        let mut entering = start;
        for _ in 0..cap {
            if self.is_basic(entering) {
                warn!(
                    "complementary path tried to re-enter basic variable {:?}",
                    entering
                );
                return Ok(PathOutcome::Ray);
            }
            let leaving = match self.pivot_in(entering)? {
                Some(label) => label,
                None => return Ok(PathOutcome::Ray),
            };
            match leaving.complement() {
                None => return Ok(PathOutcome::Terminal),
                Some(next) => entering = next,
            }
        }
        warn!("complementary path exceeded {} pivots, treating as ray", cap);
        Ok(PathOutcome::Ray)
    }

    // -----------------------------------------------------------------------
    // Basis fingerprints
    // -----------------------------------------------------------------------

    /// Sparse fingerprint of the basic covering/structural variables and
    /// their values. A deduplication key, not a feasibility object.
    pub fn fingerprint(&self) -> Fingerprint<T> {
        let values = self.basis_vector();
        let mut entries = Vec::new();
        for (row, &label) in self.basis.iter().enumerate() {
            match label {
                Label::Covering | Label::Var(_) => {
                    entries.push((label, values[row].clone()));
                }
                Label::Slack(_) => {}
            }
        }
        entries.sort_by_key(|(label, _)| *label);
        Fingerprint { entries }
    }
}

/// Basis fingerprint: the basic covering/structural variables with their
/// values, ordered by label.
#[derive(Debug, Clone)]
pub struct Fingerprint<T> {
    entries: Vec<(Label, T)>,
}

impl<T: Field> Fingerprint<T> {
    /// Same basic set with values equal within `tol`.
    pub fn matches(&self, other: &Fingerprint<T>, tol: &T) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|((la, va), (lb, vb))| {
                    la == lb && (va.clone() - vb.clone()).abs() <= *tol
                })
    }
}
