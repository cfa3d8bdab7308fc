//! Linear constraints between degrees of freedom.
//!
//! A constraint `sum_i w_i u_i = rhs` is stored in rearranged form, with the largest degree of
//! freedom isolated on the left hand side. Every term on the right hand side refers to a
//! strictly smaller degree of freedom, so constrained values can be recovered in a single
//! ascending sweep and folded back in a single descending sweep.
use core::fmt;
use itertools::{iproduct, Itertools};
use log::debug;
use nalgebra::{DMatrix, DVector};
use rustc_hash::FxHashMap;
use std::error::Error;

/// Terms with a weight at most this large in magnitude are dropped after substitution.
pub const ZERO_WEIGHT_TOLERANCE: f64 = 1e-14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTerm {
    pub dof: usize,
    pub weight: f64,
}

impl LinearTerm {
    pub fn new(dof: usize, weight: f64) -> Self {
        Self { dof, weight }
    }
}

/// The equation `sum_i terms[i].weight * u[terms[i].dof] = rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintEquation {
    pub terms: Vec<LinearTerm>,
    pub rhs: f64,
}

impl ConstraintEquation {
    pub fn new(terms: Vec<LinearTerm>, rhs: f64) -> Self {
        Self { terms, rhs }
    }
}

/// The equation `u[constrained_dof] = sum_i terms[i].weight * u[terms[i].dof] + rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct RearrangedConstraint {
    pub constrained_dof: usize,
    pub terms: Vec<LinearTerm>,
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintError {
    /// The constraint has no terms, either to begin with or after substituting the existing
    /// constraints. This happens for constraints that duplicate or contradict earlier ones.
    EmptyOrCyclic,
}

impl fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EmptyOrCyclic => write!(f, "Empty constraint or cyclic set of constraints"),
        }
    }
}

impl Error for ConstraintError {}

/// A set of rearranged constraints, indexed by their constrained degree of freedom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintMatrix {
    map: FxHashMap<usize, RearrangedConstraint>,
}

fn combine_like_terms(terms: Vec<LinearTerm>) -> Vec<LinearTerm> {
    let mut combined: Vec<LinearTerm> = Vec::with_capacity(terms.len());
    for term in terms {
        match combined.iter_mut().find(|t| t.dof == term.dof) {
            Some(existing) => existing.weight += term.weight,
            None => combined.push(term),
        }
    }
    combined.retain(|t| t.weight.abs() > ZERO_WEIGHT_TOLERANCE);
    combined
}

fn substitute(c: &ConstraintEquation, term_idx: usize, subs: &RearrangedConstraint) -> ConstraintEquation {
    let multiplier = c.terms[term_idx].weight;
    let terms = c
        .terms
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != term_idx)
        .map(|(_, term)| *term)
        .chain(
            subs.terms
                .iter()
                .map(|t| LinearTerm::new(t.dof, t.weight * multiplier)),
        )
        .collect();
    ConstraintEquation {
        terms: combine_like_terms(terms),
        rhs: c.rhs - multiplier * subs.rhs,
    }
}

fn isolate_term_on_lhs(c: &ConstraintEquation, term_idx: usize) -> RearrangedConstraint {
    let lhs = c.terms[term_idx];
    let terms = c
        .terms
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != term_idx)
        .map(|(_, t)| LinearTerm::new(t.dof, -t.weight / lhs.weight))
        .collect();
    RearrangedConstraint {
        constrained_dof: lhs.dof,
        terms,
        rhs: c.rhs / lhs.weight,
    }
}

/// Rearranges the constraint so that its largest degree of freedom is isolated.
///
/// If the largest degree of freedom is already constrained by `matrix`, its constraint is
/// substituted and the process repeats with the next largest degree of freedom.
pub fn make_lower_triangular(
    c: &ConstraintEquation,
    matrix: &ConstraintMatrix,
) -> Result<RearrangedConstraint, ConstraintError> {
    let mut c = ConstraintEquation::new(combine_like_terms(c.terms.clone()), c.rhs);
    loop {
        let (last_idx, last_dof) = c
            .terms
            .iter()
            .enumerate()
            .map(|(i, t)| (i, t.dof))
            .max_by_key(|&(_, dof)| dof)
            .ok_or(ConstraintError::EmptyOrCyclic)?;

        match matrix.get(last_dof) {
            Some(existing) => c = substitute(&c, last_idx, existing),
            None => return Ok(isolate_term_on_lhs(&c, last_idx)),
        }
    }
}

impl ConstraintMatrix {
    /// Builds the matrix by rearranging each constraint in turn.
    ///
    /// Constraints that are empty or redundant after substitution of the previous
    /// constraints are skipped.
    pub fn from_constraints<'a>(constraints: impl IntoIterator<Item = &'a ConstraintEquation>) -> Self {
        let mut matrix = Self::default();
        let mut n_skipped = 0;
        for c in constraints {
            match make_lower_triangular(c, &matrix) {
                Ok(rearranged) => {
                    matrix.map.insert(rearranged.constrained_dof, rearranged);
                }
                Err(err) => {
                    n_skipped += 1;
                    debug!("Skipping constraint {:?}: {}", c, err);
                }
            }
        }
        if n_skipped > 0 {
            debug!(
                "Skipped {} constraints while building a constraint matrix with {} constraints",
                n_skipped,
                matrix.len()
            );
        }
        matrix
    }

    pub fn get(&self, dof: usize) -> Option<&RearrangedConstraint> {
        self.map.get(&dof)
    }

    pub fn is_constrained(&self, dof: usize) -> bool {
        self.map.contains_key(&dof)
    }

    /// The number of constrained degrees of freedom.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over the constraints in ascending order of their constrained degree of freedom.
    pub fn iter(&self) -> impl Iterator<Item = &RearrangedConstraint> {
        self.map.values().sorted_by_key(|c| c.constrained_dof)
    }

    /// Expands a vector of unconstrained values into a vector over all degrees of freedom.
    ///
    /// The entries of `reduced` are assigned to the unconstrained degrees of freedom in
    /// ascending order, after which the constrained degrees of freedom are computed in
    /// ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `reduced` does not have one entry per unconstrained degree of freedom.
    pub fn distribute_vector(&self, reduced: &DVector<f64>, total_dofs: usize) -> DVector<f64> {
        let n_unconstrained = (0..total_dofs)
            .filter(|&dof| !self.is_constrained(dof))
            .count();
        assert_eq!(
            reduced.len(),
            n_unconstrained,
            "reduced vector must have one entry per unconstrained degree of freedom"
        );

        let mut out = DVector::zeros(total_dofs);
        let unconstrained = (0..total_dofs).filter(|&dof| !self.is_constrained(dof));
        for (dof, value) in unconstrained.zip(reduced.iter()) {
            out[dof] = *value;
        }
        for dof in 0..total_dofs {
            if let Some(constraint) = self.get(dof) {
                out[dof] = constraint.rhs
                    + constraint
                        .terms
                        .iter()
                        .map(|t| t.weight * out[t.dof])
                        .sum::<f64>();
            }
        }
        out
    }

    /// Folds the entries of constrained degrees of freedom onto the degrees of freedom they
    /// depend on and returns the entries of the unconstrained degrees of freedom.
    ///
    /// This is the transpose of [`distribute_vector`](Self::distribute_vector) for
    /// homogeneous constraints.
    pub fn condense_vector(&self, all: &DVector<f64>) -> DVector<f64> {
        let mut condensed = all.clone();
        for dof in (0..all.len()).rev() {
            if let Some(constraint) = self.get(dof) {
                let value = condensed[dof];
                condensed[dof] = 0.0;
                for t in &constraint.terms {
                    debug_assert!(t.dof < dof);
                    condensed[t.dof] += t.weight * value;
                }
            }
        }
        let values: Vec<f64> = (0..all.len())
            .filter(|&dof| !self.is_constrained(dof))
            .map(|dof| condensed[dof])
            .collect();
        DVector::from_vec(values)
    }
}

/// Removes the rows constrained by `row_cm` and the columns constrained by `col_cm`.
pub fn remove_constrained(row_cm: &ConstraintMatrix, col_cm: &ConstraintMatrix, matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let rows: Vec<usize> = (0..matrix.nrows())
        .filter(|&r| !row_cm.is_constrained(r))
        .collect();
    let cols: Vec<usize> = (0..matrix.ncols())
        .filter(|&c| !col_cm.is_constrained(c))
        .collect();
    DMatrix::from_fn(rows.len(), cols.len(), |i, j| matrix[(rows[i], cols[j])])
}

/// Condenses an operator acting on all degrees of freedom into an operator acting on the
/// unconstrained degrees of freedom only.
///
/// Entries in constrained rows and columns are folded onto the rows and columns they depend
/// on, from the largest index downward, before the constrained rows and columns are removed.
pub fn condense_matrix(row_cm: &ConstraintMatrix, col_cm: &ConstraintMatrix, matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let mut condensed = matrix.clone();
    for row in (0..matrix.nrows()).rev() {
        for col in (0..matrix.ncols()).rev() {
            let value = condensed[(row, col)];
            if let Some(constraint) = row_cm.get(row) {
                condensed[(row, col)] = 0.0;
                for t in &constraint.terms {
                    condensed[(t.dof, col)] += t.weight * value;
                }
            } else if let Some(constraint) = col_cm.get(col) {
                condensed[(row, col)] = 0.0;
                for t in &constraint.terms {
                    condensed[(row, t.dof)] += t.weight * value;
                }
            }
        }
    }
    remove_constrained(row_cm, col_cm, &condensed)
}

/// An operator between vector valued functions, stored as a grid of scalar operators.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOperator {
    pub n_comp_rows: usize,
    pub n_comp_cols: usize,
    /// Row-major grid of component operators.
    pub ops: Vec<DMatrix<f64>>,
}

impl BlockOperator {
    /// # Panics
    ///
    /// Panics if the number of operators does not match the number of components.
    pub fn new(n_comp_rows: usize, n_comp_cols: usize, ops: Vec<DMatrix<f64>>) -> Self {
        assert_eq!(ops.len(), n_comp_rows * n_comp_cols, "wrong number of component operators");
        Self {
            n_comp_rows,
            n_comp_cols,
            ops,
        }
    }

    pub fn op(&self, row: usize, col: usize) -> &DMatrix<f64> {
        &self.ops[row * self.n_comp_cols + col]
    }
}

/// Condenses each component operator with the constraints of its row and column components.
pub fn condense_block_operator(
    row_cms: &[ConstraintMatrix],
    col_cms: &[ConstraintMatrix],
    op: &BlockOperator,
) -> BlockOperator {
    assert_eq!(row_cms.len(), op.n_comp_rows);
    assert_eq!(col_cms.len(), op.n_comp_cols);
    let ops = iproduct!(0..op.n_comp_rows, 0..op.n_comp_cols)
        .map(|(r, c)| condense_matrix(&row_cms[r], &col_cms[c], op.op(r, c)))
        .collect();
    BlockOperator::new(op.n_comp_rows, op.n_comp_cols, ops)
}
