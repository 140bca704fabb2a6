//! The demand-function algebra: the contract by which the planner queries
//! and composes bandwidth requirements.
//!
//! A [`DemandFunction`] of degree `n` maps any non-empty, proper subset of
//! `0..n` (the "from-set") to the [`Capacity`] required on an edge that
//! splits the goals that way. Four concrete variants are provided —
//! [`FlatDemand`], [`PairDemand`], [`MatrixDemand`], [`TableDemand`] — plus
//! two structural combinators, [`Reduced`] and [`Mapped`], that every
//! variant gets for free through the trait's default methods.

mod flat;
mod mapped;
mod matrix;
mod pair;
mod reduced;
mod table;

pub use flat::FlatDemand;
pub use mapped::Mapped;
pub use matrix::MatrixDemand;
pub use pair::PairDemand;
pub use reduced::Reduced;
pub use table::TableDemand;

use error_stack::{report, Result};

use crate::bitset::GoalSet;
use crate::capacity::{BidiCapacity, Capacity};
use crate::error::DemandError;

/// Degree at or below which [`DemandFunction::tabulate`] materialises a
/// lookup table by default. Whether tabulation should be unconditional is
/// a judgment call with no single right answer, so `treecast` exposes it
/// as a constant plus [`DemandFunction::tabulate_with_threshold`] rather
/// than guessing either way.
pub const DEFAULT_TABULATE_THRESHOLD: u32 = 8;

/// The bandwidth-demand contract. All methods are pure, idempotent, and
/// safe to share across threads — hence the `Send + Sync` supertrait
/// bound.
pub trait DemandFunction: Send + Sync {
    /// The number of goals this function describes.
    fn degree(&self) -> usize;

    /// The capacity required when `from_set` is upstream of the edge and
    /// its complement is downstream.
    ///
    /// # Errors
    /// [`DemandError::EmptySubset`] / [`DemandError::FullSubset`] /
    /// [`DemandError::SubsetOutOfRange`] if `from_set` is not a non-empty,
    /// proper subset of `0..degree()`.
    fn get(&self, from_set: &GoalSet) -> Result<Capacity, DemandError>;

    /// `(get(from_set), get(¬from_set))`. The default is exactly this pair;
    /// variants for which computing both sides together is cheaper (e.g.
    /// [`MatrixDemand`]) override it.
    fn get_pair(&self, from_set: &GoalSet) -> Result<BidiCapacity, DemandError> {
        let ingress = self.get(from_set)?;
        let egress = self.get(&from_set.complement(self.degree()))?;
        Ok(BidiCapacity::new(ingress, egress))
    }

    /// Build a lower-degree function by grouping goals: `reduced.get(T) ==
    /// self.get(union of groups selected by T)`.
    ///
    /// # Errors
    /// [`DemandError::NotAPartition`] if `groups` are not pairwise disjoint,
    /// do not cover `0..degree()`, or reference a bit at or beyond
    /// `degree()`.
    fn reduce(&self, groups: &[GoalSet]) -> Result<Reduced<'_, Self>, DemandError>
    where
        Self: Sized,
    {
        Reduced::new(self, groups)
    }

    /// Build a relabelled function: `mapped.get(S) == self.get({π(i) : i in
    /// S})`.
    ///
    /// # Errors
    /// [`DemandError::NotAPermutation`] if `permutation` is not a
    /// permutation of `0..degree()`.
    fn map(&self, permutation: &[usize]) -> Result<Mapped<'_, Self>, DemandError>
    where
        Self: Sized,
    {
        Mapped::new(self, permutation)
    }

    /// Materialise an equivalent table-backed function using
    /// [`DEFAULT_TABULATE_THRESHOLD`].
    fn tabulate(&self) -> Tabulated<'_, Self>
    where
        Self: Sized,
    {
        self.tabulate_with_threshold(DEFAULT_TABULATE_THRESHOLD)
    }

    /// Materialise an equivalent table-backed function if `degree() <=
    /// threshold`; otherwise defer to `self` unchanged.
    fn tabulate_with_threshold(&self, threshold: u32) -> Tabulated<'_, Self>
    where
        Self: Sized,
    {
        if self.degree() as u32 <= threshold {
            Tabulated::Table(
                TableDemand::from_function(self).expect("self's own degree is self-consistent"),
            )
        } else {
            Tabulated::Deferred(self)
        }
    }
}

/// The result of [`DemandFunction::tabulate`]: either a materialised
/// [`TableDemand`], or a deferred reference to the function that produced
/// it, when tabulation was judged uneconomical at this degree.
pub enum Tabulated<'a, D> {
    /// The degree was at or below the threshold: a lookup table was built.
    Table(TableDemand),
    /// The degree exceeded the threshold: querying falls through to `D`.
    Deferred(&'a D),
}

impl<D: DemandFunction> DemandFunction for Tabulated<'_, D> {
    fn degree(&self) -> usize {
        match self {
            Self::Table(t) => t.degree(),
            Self::Deferred(d) => d.degree(),
        }
    }

    fn get(&self, from_set: &GoalSet) -> Result<Capacity, DemandError> {
        match self {
            Self::Table(t) => t.get(from_set),
            Self::Deferred(d) => d.get(from_set),
        }
    }
}

/// Validate that `from_set` is a legal argument to `get`/`get_pair`:
/// non-empty, a proper subset of `0..degree`, and free of bits at or
/// beyond `degree`.
pub(crate) fn validate_subset(from_set: &GoalSet, degree: usize) -> Result<(), DemandError> {
    if let Some(bit) = from_set.iter_set_bits().find(|&b| b >= degree) {
        return Err(report!(DemandError::SubsetOutOfRange { bit, degree }));
    }
    if from_set.is_empty() {
        return Err(report!(DemandError::EmptySubset));
    }
    if from_set.is_full(degree) {
        return Err(report!(DemandError::FullSubset));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabulate_below_threshold_builds_a_table() {
        let flat = FlatDemand::new(4, Capacity::at(2.0));
        match flat.tabulate() {
            Tabulated::Table(_) => {}
            Tabulated::Deferred(_) => panic!("degree 4 should tabulate"),
        }
    }

    #[test]
    fn tabulate_above_threshold_defers() {
        let flat = FlatDemand::new(20, Capacity::at(2.0));
        match flat.tabulate() {
            Tabulated::Table(_) => panic!("degree 20 should defer"),
            Tabulated::Deferred(_) => {}
        }
    }
}
