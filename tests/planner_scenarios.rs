//! Literal scenarios and general soundness/determinism properties for
//! [`treecast::plan`], exercised through the public `plan`/
//! `plan_with_assessor` entry points rather than any internal module.

use treecast::demand::FlatDemand;
use treecast::{plan, plan_with_assessor, BidiCapacity, Capacity, FixedThreshold, QualifiedEdge};

fn edge(start: usize, finish: usize, cap: f64, cost: f64) -> QualifiedEdge<usize> {
    QualifiedEdge::new(start, finish, BidiCapacity::of(Capacity::at(cap)), cost)
}

/// A single edge directly joining the two goals. The only way to connect
/// them is to use it, so exactly one tree comes out.
#[test]
fn single_edge_between_two_goals_yields_one_tree() {
    let demand = FlatDemand::new(2, Capacity::at(1.0));
    let goals = vec![0usize, 1usize];
    let edges = vec![edge(0, 1, 1.0, 1.0)];
    let solutions: Vec<_> = plan(&goals, &demand, &edges).map(|r| r.unwrap()).collect();
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].assignments.len(), 1);
}

/// Two goals joined by two independent two-hop paths through distinct
/// intermediate vertices, neither path shared. Each path alone satisfies
/// the goal cover/disjointness constraints at every vertex; using both at
/// once collides at the goal vertices (same from-set offered twice), so
/// exactly two trees come out, one per path.
#[test]
fn two_parallel_paths_yield_two_trees() {
    let demand = FlatDemand::new(2, Capacity::at(1.0));
    let goals = vec![0usize, 1usize]; // A, B
    let edges = vec![
        edge(0, 2, 1.0, 1.0), // A -> mid1
        edge(2, 1, 1.0, 1.0), // mid1 -> B
        edge(0, 3, 1.0, 1.0), // A -> mid2
        edge(3, 1, 1.0, 1.0), // mid2 -> B
    ];
    let solutions: Vec<_> = plan(&goals, &demand, &edges).map(|r| r.unwrap()).collect();
    assert_eq!(solutions.len(), 2);
    for solution in &solutions {
        assert_eq!(solution.assignments.len(), 2);
    }
    // The two solutions use disjoint edge pairs: {0, 1} and {2, 3}.
    let mut used_edge_sets: Vec<Vec<usize>> = solutions
        .iter()
        .map(|s| {
            let mut keys: Vec<usize> = s.assignments.keys().copied().collect();
            keys.sort_unstable();
            keys
        })
        .collect();
    used_edge_sets.sort();
    assert_eq!(used_edge_sets, vec![vec![0, 1], vec![2, 3]]);
}

/// Every edge a solution uses carries a consumed capacity within that
/// edge's own bidirectional bounds.
#[test]
fn every_emitted_tree_is_capacity_sound() {
    let demand = FlatDemand::new(2, Capacity::at(1.0));
    let goals = vec![0usize, 1usize];
    let edges = vec![
        edge(0, 2, 2.0, 1.0),
        edge(2, 1, 2.0, 1.0),
        edge(0, 3, 2.0, 1.0),
        edge(3, 1, 2.0, 1.0),
    ];
    let solutions: Vec<_> = plan(&goals, &demand, &edges).map(|r| r.unwrap()).collect();
    assert!(!solutions.is_empty());
    for solution in &solutions {
        for (&edge_index, assignment) in solution.assignments.iter() {
            let cap = edges[edge_index].capacity();
            let consumed = assignment.consumed;
            assert!(consumed.ingress().min() <= cap.ingress().min());
            assert!(consumed.egress().min() <= cap.egress().min());
        }
    }
}

/// Planning the same inputs twice yields the same sequence of solutions,
/// since nothing in the planner depends on process-wide mutable state or
/// unordered iteration.
#[test]
fn planner_is_deterministic_across_runs() {
    let demand = FlatDemand::new(2, Capacity::at(1.0));
    let goals = vec![0usize, 1usize];
    let edges = vec![
        edge(0, 2, 1.0, 1.0),
        edge(2, 1, 1.0, 1.0),
        edge(0, 3, 1.0, 1.0),
        edge(3, 1, 1.0, 1.0),
    ];
    let first: Vec<_> = plan(&goals, &demand, &edges).map(|r| r.unwrap()).collect();
    let second: Vec<_> = plan(&goals, &demand, &edges).map(|r| r.unwrap()).collect();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        let a_keys: Vec<_> = a.assignments.keys().copied().collect();
        let b_keys: Vec<_> = b.assignments.keys().copied().collect();
        assert_eq!(a_keys, b_keys);
    }
}

/// A goal left with no surviving incident edge (here, its only edge is
/// pruned for insufficient capacity) makes the whole tree infeasible, not
/// just that edge.
#[test]
fn detached_goal_yields_no_solutions() {
    let demand = FlatDemand::new(2, Capacity::at(1.0));
    let goals = vec![0usize, 1usize];
    let edges = vec![edge(0, 1, 0.0, 1.0)];
    let solutions: Vec<_> = plan(&goals, &demand, &edges).collect();
    assert!(solutions.is_empty());
}

/// Bias-based elimination only ever removes candidate modes, so anything
/// [`plan_with_assessor`] emits under [`FixedThreshold`] is also emitted
/// by the unconstrained [`plan`] (which uses [`treecast::AllEdgeModes`]
/// and performs no elimination).
#[test]
fn fixed_threshold_elimination_is_a_subset_of_all_edge_modes() {
    let demand = FlatDemand::new(2, Capacity::at(1.0));
    let goals = vec![0usize, 1usize];
    let edges = vec![
        edge(0, 2, 1.0, 1.0),
        edge(2, 1, 1.0, 1.0),
        edge(0, 3, 1.0, 3.0),
        edge(3, 1, 1.0, 3.0),
    ];

    let complete: Vec<Vec<usize>> = plan(&goals, &demand, &edges)
        .map(|r| {
            let mut keys: Vec<usize> = r.unwrap().assignments.keys().copied().collect();
            keys.sort_unstable();
            keys
        })
        .collect();

    let mut assessor = FixedThreshold::new(0.0);
    let restricted: Vec<Vec<usize>> = plan_with_assessor(&goals, &demand, &edges, &mut assessor)
        .map(|r| {
            let mut keys: Vec<usize> = r.unwrap().assignments.keys().copied().collect();
            keys.sort_unstable();
            keys
        })
        .collect();

    for solution in &restricted {
        assert!(
            complete.contains(solution),
            "restricted solution {solution:?} missing from the unconstrained set"
        );
    }
}
