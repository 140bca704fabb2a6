//! `treecast` enumerates every feasible spanning tree connecting a set of
//! goal vertices in a directed, capacitated graph, where each candidate
//! edge must carry a bandwidth assignment consistent with a caller-supplied
//! demand function.
//!
//! The entry point is [`plan`]; [`plan_with_ports`] is a variant for edges
//! expressed over ports belonging to compound vertices, and
//! [`plan_with_assessor`] exposes the bias-based elimination pass that
//! `plan` otherwise skips. [`demand::DemandFunction`] is the trait
//! implementors provide to describe required bandwidth per goal subset;
//! [`demand::FlatDemand`], [`demand::PairDemand`], [`demand::MatrixDemand`],
//! and [`demand::TableDemand`] cover the common cases.

pub mod assess;
pub mod bitset;
pub mod cache;
pub mod capacity;
pub mod constraints;
pub mod demand;
pub mod error;
pub mod graph;
mod mixedradix;
pub mod planner;
mod routing;

pub use assess::{AllEdgeModes, Assessor, FixedThreshold};
pub use bitset::GoalSet;
pub use cache::{NetworkModelCache, ReachabilityKey};
pub use capacity::{BidiCapacity, Capacity};
pub use demand::DemandFunction;
pub use error::{DemandError, PlanError};
pub use graph::QualifiedEdge;
pub use planner::{plan, plan_with_assessor, plan_with_ports, EdgeAssignment, PlanIter, PlanSolution};
