//! Error types returned by the public API.
//!
//! Mirrors the `petgraph-core`/`petgraph-entry` convention of a small
//! `Copy` enum that implements [`error_stack::Context`] rather than an
//! opaque `Box<dyn Error>` or a hand-rolled `Display` + `source()` chain.

use core::fmt::{self, Display, Formatter};

use error_stack::Context;

/// Misuse of a [`DemandFunction`](crate::demand::DemandFunction).
///
/// All variants correspond to a precondition spelled out in the trait's
/// documentation; none of them can be produced by well-formed input, so a
/// caller that constructs subsets from the crate's own [`GoalSet`] helpers
/// should never observe one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandError {
    /// `get`/`get_pair` was called with the empty subset.
    EmptySubset,
    /// `get`/`get_pair` was called with the subset covering every goal.
    FullSubset,
    /// A subset referenced a bit at or beyond the function's degree.
    SubsetOutOfRange {
        /// The offending bit index.
        bit: usize,
        /// The function's degree.
        degree: usize,
    },
    /// `reduce`'s groups are not a partition of `0..degree` (overlap, gap,
    /// or a bit at or beyond `degree`).
    NotAPartition,
    /// `map`'s permutation does not have exactly `degree` entries, or does
    /// not visit every index in `0..degree` exactly once.
    NotAPermutation,
}

impl Display for DemandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySubset => write!(f, "from-set must be non-empty"),
            Self::FullSubset => write!(f, "from-set must be a proper subset of the goals"),
            Self::SubsetOutOfRange { bit, degree } => {
                write!(f, "bit {bit} is out of range for degree {degree}")
            }
            Self::NotAPartition => {
                write!(f, "reduce groups must partition the full goal set")
            }
            Self::NotAPermutation => {
                write!(f, "map argument must be a permutation of 0..degree")
            }
        }
    }
}

impl Context for DemandError {}

/// Errors the planner itself can report, as opposed to transient pruning
/// states (empty mode sets, detached goals), which yield an empty result
/// stream rather than an error — see `PlanError`'s doc comment on
/// [`crate::planner::plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    /// A capacity was constructed with a negative minimum.
    InvalidCapacity {
        /// The offending (negative) minimum.
        min: f64,
    },
    /// The supplied demand function rejected an otherwise well-formed
    /// subset constructed internally by the planner. Seeing this indicates
    /// a bug in the demand function's `degree()`, since the planner never
    /// constructs a subset outside `[1, 2^degree - 2]`.
    Demand(DemandError),
}

impl Display for PlanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCapacity { min } => {
                write!(f, "capacity minimum must be non-negative, got {min}")
            }
            Self::Demand(inner) => write!(f, "demand function error: {inner}"),
        }
    }
}

impl Context for PlanError {}

impl From<DemandError> for PlanError {
    fn from(value: DemandError) -> Self {
        Self::Demand(value)
    }
}

/// Convenience alias defaulting the error context to `PlanError`.
pub type Result<T, C = PlanError> = error_stack::Result<T, C>;
