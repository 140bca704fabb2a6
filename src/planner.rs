//! The driver that composes demand, routing, the constraint compiler, and
//! the mixed-radix iterator into a stream of feasible trees.

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexMap;

use crate::assess::{AllEdgeModes, Assessor};
use crate::bitset::GoalSet;
use crate::capacity::BidiCapacity;
use crate::constraints::{self, CompiledConstraints};
use crate::demand::DemandFunction;
use crate::error::{PlanError, Result};
use crate::graph::QualifiedEdge;
use crate::mixedradix::MixedRadixIter;
use crate::routing;

/// What one surviving edge carries in a particular solution: the goal
/// from-set it routes, and the bandwidth that from-set consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeAssignment {
    /// The goals upstream of this edge in the solution.
    pub source_set: GoalSet,
    /// `demand.get_pair(source_set)`, cached so callers don't recompute it.
    pub consumed: BidiCapacity,
}

/// One feasible spanning tree: the subset of input edges it uses, keyed by
/// each edge's position in the slice originally passed to [`plan`].
/// Edges absent from the map are unused in this solution.
///
/// Ordered by ascending edge index for reproducible iteration, using
/// [`indexmap::IndexMap`] rather than [`std::collections::HashMap`] to
/// keep the enumeration order itself deterministic.
#[derive(Debug, Clone, Default)]
pub struct PlanSolution {
    pub assignments: IndexMap<usize, EdgeAssignment>,
}

/// Enumerate every feasible tree connecting `goals` under `demand` using
/// `edges`. See the module documentation for the composition this performs.
///
/// `|goals| < 2` yields exactly one solution using no edges at all — there
/// is nothing to connect. A demand function that rejects a well-formed
/// subset the planner itself constructed surfaces as [`PlanError::Demand`];
/// that can only happen if `demand.degree()` disagrees with `goals.len()`.
pub fn plan<'a, V>(
    goals: &[V],
    demand: &'a dyn DemandFunction,
    edges: &[QualifiedEdge<V>],
) -> PlanIter<'a>
where
    V: Copy + Eq + Hash,
{
    plan_with_assessor(goals, demand, edges, &mut AllEdgeModes)
}

/// As [`plan`], but with an explicit [`Assessor`] controlling how
/// aggressively bias-based mode elimination runs. `plan` itself uses
/// [`AllEdgeModes`], which performs no elimination and preserves
/// completeness.
pub fn plan_with_assessor<'a, V>(
    goals: &[V],
    demand: &'a dyn DemandFunction,
    edges: &[QualifiedEdge<V>],
    assessor: &mut dyn Assessor,
) -> PlanIter<'a>
where
    V: Copy + Eq + Hash,
{
    if goals.len() < 2 {
        return PlanIter::Trivial(Some(Ok(PlanSolution::default())));
    }

    let (num_vertices, goal_vertices, internal_edges) = reindex(goals, edges);

    let outcome = match routing::prune_and_route(
        &goal_vertices,
        demand,
        &internal_edges,
        num_vertices,
        assessor,
    ) {
        Ok(Some(outcome)) => outcome,
        Ok(None) => return PlanIter::Empty,
        Err(e) => return PlanIter::Trivial(Some(Err(e))),
    };

    let compiled = constraints::compile(&goal_vertices, &internal_edges, &outcome, num_vertices);
    let degree = goal_vertices.len();
    let position_to_edge = compiled.position_to_edge.clone();
    let masks_of = compiled.masks_of.clone();
    let radices = compiled.radices.clone();

    let translate = move |digits: &[u32]| -> Result<PlanSolution> {
        let mut pairs: Vec<(usize, EdgeAssignment)> = Vec::new();
        for (pos, &digit) in digits.iter().enumerate() {
            if digit == 0 {
                continue;
            }
            let edge_index = position_to_edge[pos];
            let mask = masks_of[edge_index][(digit - 1) as usize] as u64;
            let source_set = GoalSet::from_bits(mask, degree);
            let consumed = match demand.get_pair(&source_set) {
                Ok(c) => c,
                Err(e) => {
                    let inner = *e.current_context();
                    return Err(e.change_context(PlanError::Demand(inner)));
                }
            };
            pairs.push((edge_index, EdgeAssignment { source_set, consumed }));
        }
        pairs.sort_by_key(|(edge_index, _)| *edge_index);
        Ok(PlanSolution {
            assignments: pairs.into_iter().collect(),
        })
    };

    let translate: Box<dyn FnMut(&[u32]) -> Result<PlanSolution> + 'a> = Box::new(translate);
    let iter = MixedRadixIter::new(radices, compiled, translate);
    PlanIter::Composed(Box::new(iter))
}

/// `plan`, but edges are expressed over "ports" that belong to compound
/// vertices, via a caller-supplied `port_to_vertex` projection. A thin
/// adaptor over [`plan`]: it remaps edges once up front rather than
/// duplicating the routing/constraint machinery for a second vertex
/// representation.
pub fn plan_with_ports<'a, V, P>(
    goals: &[V],
    demand: &'a dyn DemandFunction,
    edges: &[QualifiedEdge<P>],
    port_to_vertex: impl Fn(P) -> V,
) -> PlanIter<'a>
where
    V: Copy + Eq + Hash,
    P: Copy,
{
    let remapped: Vec<QualifiedEdge<V>> = edges
        .iter()
        .map(|e| {
            QualifiedEdge::new(
                port_to_vertex(e.start()),
                port_to_vertex(e.finish()),
                e.capacity(),
                e.cost(),
            )
        })
        .collect();
    plan(goals, demand, &remapped)
}

/// Assign every distinct vertex a dense `usize` index: goals first (in the
/// order given), then any other vertex discovered while scanning `edges`.
/// Stable across runs given the same input.
fn reindex<V: Copy + Eq + Hash>(
    goals: &[V],
    edges: &[QualifiedEdge<V>],
) -> (usize, Vec<usize>, Vec<QualifiedEdge<usize>>) {
    let mut index_of: HashMap<V, usize> = HashMap::new();
    let mut next = 0usize;
    let mut intern = |v: V| -> usize {
        *index_of.entry(v).or_insert_with(|| {
            let i = next;
            next += 1;
            i
        })
    };

    let goal_vertices: Vec<usize> = goals.iter().map(|&g| intern(g)).collect();
    let internal_edges: Vec<QualifiedEdge<usize>> = edges
        .iter()
        .map(|e| {
            QualifiedEdge::new(intern(e.start()), intern(e.finish()), e.capacity(), e.cost())
        })
        .collect();
    drop(intern);

    (next, goal_vertices, internal_edges)
}

type ComposedIter<'a> = MixedRadixIter<
    CompiledConstraints,
    Box<dyn FnMut(&[u32]) -> Result<PlanSolution> + 'a>,
>;

/// The iterator returned by [`plan`] and its variants.
pub enum PlanIter<'a> {
    /// `|goals| < 2`, or the demand function errored while building the
    /// one-shot trivial solution: exactly one item, then exhausted.
    Trivial(Option<Result<PlanSolution>>),
    /// Pruning eliminated every candidate tree: no items.
    Empty,
    /// The general case: driven by the mixed-radix iterator.
    Composed(Box<ComposedIter<'a>>),
}

impl Iterator for PlanIter<'_> {
    type Item = Result<PlanSolution>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Trivial(slot) => slot.take(),
            Self::Empty => None,
            Self::Composed(iter) => iter.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::Capacity;
    use crate::demand::FlatDemand;

    fn edge(start: usize, finish: usize, cap: f64, cost: f64) -> QualifiedEdge<usize> {
        QualifiedEdge::new(start, finish, BidiCapacity::of(Capacity::at(cap)), cost)
    }

    #[test]
    fn fewer_than_two_goals_yields_one_empty_solution() {
        let demand = FlatDemand::new(1, Capacity::at(1.0));
        let goals = vec![0usize];
        let edges: Vec<QualifiedEdge<usize>> = vec![];
        let mut results = plan(&goals, &demand, &edges);
        let first = results.next().unwrap().unwrap();
        assert!(first.assignments.is_empty());
        assert!(results.next().is_none());
    }

    #[test]
    fn two_goals_one_edge_finds_the_connecting_tree() {
        // Goal 0 and goal 1 joined by a single edge able to carry 1.0. Each
        // goal has exactly one incident edge, so the goal-cover check
        // still applies (it doesn't require >= 2 incident edges) and
        // rejects leaving the edge disused: exactly one tree comes out.
        let demand = FlatDemand::new(2, Capacity::at(1.0));
        let goals = vec![0usize, 1usize];
        let edges = vec![edge(0, 1, 1.0, 1.0)];
        let solutions: Vec<_> = plan(&goals, &demand, &edges)
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(solutions.len(), 1);
        let assignment = solutions[0].assignments.get(&0).unwrap();
        assert_eq!(assignment.source_set, GoalSet::from_bits(0b01, 2));
    }

    #[test]
    fn insufficient_capacity_yields_no_solutions() {
        let demand = FlatDemand::new(2, Capacity::at(10.0));
        let goals = vec![0usize, 1usize];
        let edges = vec![edge(0, 1, 1.0, 1.0)];
        let solutions: Vec<_> = plan(&goals, &demand, &edges).collect();
        assert!(solutions.is_empty());
    }
}
