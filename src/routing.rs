//! Mode pruning, goal-reachability routing, and bias-based mode
//! elimination — the hardest part of the planner.
//!
//! Vertices and edges are addressed by dense integer index here rather
//! than by the caller's own vertex type: [`crate::planner`] assigns each
//! vertex a stable integer index once up front and everything below
//! operates purely on `usize` vertex ids and edge positions, rather than
//! keying anything by the caller's own vertex identity.

use std::collections::VecDeque;

use crate::assess::Assessor;
use crate::demand::DemandFunction;
use crate::error::{PlanError, Result};
use crate::graph::QualifiedEdge;

/// The set of feasible from-set bitmasks for one edge, `M[e]`. Backed by
/// a dense `Vec<bool>` indexed directly by bitmask — the search space
/// here is inherently exponential in the number of goals, so this crate
/// targets the practical regime of a modest goal count rather than a
/// sparse representation.
#[derive(Debug, Clone)]
pub(crate) struct ModeSet {
    size: usize,
    present: Vec<bool>,
}

impl ModeSet {
    fn with_capacity_for(degree: usize) -> Self {
        Self {
            size: 1usize << degree,
            present: vec![false; 1usize << degree],
        }
    }

    fn insert(&mut self, mask: usize) {
        self.present[mask] = true;
    }

    pub(crate) fn contains(&self, mask: usize) -> bool {
        self.present[mask]
    }

    pub(crate) fn clear(&mut self) {
        self.present.iter_mut().for_each(|b| *b = false);
    }

    pub(crate) fn is_empty(&self) -> bool {
        !self.present.iter().any(|&b| b)
    }

    pub(crate) fn len(&self) -> u32 {
        self.present.iter().filter(|&&b| b).count() as u32
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).filter(move |&m| self.present[m])
    }

    /// Whether some present mode has goal `g` set in its from-set.
    fn has_goal_set(&self, goal: usize) -> bool {
        self.iter().any(|m| m & (1 << goal) != 0)
    }

    /// Whether some present mode has goal `g` clear in its from-set.
    fn has_goal_clear(&self, goal: usize) -> bool {
        self.iter().any(|m| m & (1 << goal) == 0)
    }

    /// Remove every present mode with goal `g` set.
    fn remove_goal_set(&mut self, goal: usize) {
        for m in 0..self.size {
            if self.present[m] && m & (1 << goal) != 0 {
                self.present[m] = false;
            }
        }
    }

    /// Remove every present mode with goal `g` clear.
    fn remove_goal_clear(&mut self, goal: usize) {
        for m in 0..self.size {
            if self.present[m] && m & (1 << goal) == 0 {
                self.present[m] = false;
            }
        }
    }
}

/// The output of [`prune_and_route`]: surviving per-edge mode sets plus
/// the finalised incidence topology.
pub(crate) struct RoutingOutcome {
    pub(crate) mode_sets: Vec<ModeSet>,
    pub(crate) inwards: Vec<Vec<usize>>,
    pub(crate) outwards: Vec<Vec<usize>>,
}

/// Run initial pruning, leaf stripping, and bias elimination to a
/// fixpoint. Returns `None` when any goal ends up with no remaining
/// incident edge.
pub(crate) fn prune_and_route(
    goal_vertices: &[usize],
    demand: &dyn DemandFunction,
    edges: &[QualifiedEdge<usize>],
    num_vertices: usize,
    assessor: &mut dyn Assessor,
) -> Result<Option<RoutingOutcome>> {
    let degree = goal_vertices.len();
    let is_goal = {
        let mut v = vec![false; num_vertices];
        for &g in goal_vertices {
            v[g] = true;
        }
        v
    };

    let mut mode_sets = initial_prune(goal_vertices, demand, edges)?;
    let (mut inwards, mut outwards) = build_topology(num_vertices, edges);
    strip_leaves(&is_goal, edges, &mut mode_sets, &inwards, &outwards);

    let mut current_threshold = f64::INFINITY;
    loop {
        let dist = compute_distances(goal_vertices, &mode_sets, edges, num_vertices);

        let radices: Vec<u32> = mode_sets.iter().map(|m| m.len() + 1).collect();
        let next_threshold = assessor.assess(current_threshold, &radices);
        if next_threshold < 0.0 || next_threshold >= current_threshold {
            break;
        }
        current_threshold = next_threshold;
        eliminate_by_bias(edges, &dist, &mut mode_sets, current_threshold, degree);
    }

    // Topology finalisation: rebuild from surviving modes, fail if
    // any goal is left without an incident edge.
    for edges_at_v in inwards.iter_mut().chain(outwards.iter_mut()) {
        edges_at_v.retain(|&ei| !mode_sets[ei].is_empty());
    }
    for &g in goal_vertices {
        if inwards[g].is_empty() && outwards[g].is_empty() {
            return Ok(None);
        }
    }

    Ok(Some(RoutingOutcome {
        mode_sets,
        inwards,
        outwards,
    }))
}

/// Capacity-based initial pruning.
fn initial_prune(
    goal_vertices: &[usize],
    demand: &dyn DemandFunction,
    edges: &[QualifiedEdge<usize>],
) -> Result<Vec<ModeSet>> {
    let degree = goal_vertices.len();
    let goal_index_of = |v: usize| goal_vertices.iter().position(|&g| g == v);

    let mut mode_sets: Vec<ModeSet> = (0..edges.len())
        .map(|_| ModeSet::with_capacity_for(degree))
        .collect();

    for mask in 1..=(1usize << degree) - 2 {
        let from_set = crate::bitset::GoalSet::from_bits(mask as u64, degree);
        let req = match demand.get_pair(&from_set) {
            Ok(req) => req,
            Err(e) => {
                let inner = *e.current_context();
                return Err(e.change_context(PlanError::Demand(inner)));
            }
        };

        for (ei, edge) in edges.iter().enumerate() {
            if req.ingress().min() > edge.capacity().ingress().min() {
                continue;
            }
            if req.egress().min() > edge.capacity().egress().min() {
                continue;
            }
            if let Some(g) = goal_index_of(edge.start()) {
                if mask & (1 << g) == 0 {
                    continue;
                }
            }
            if let Some(g) = goal_index_of(edge.finish()) {
                if mask & (1 << g) != 0 {
                    continue;
                }
            }
            mode_sets[ei].insert(mask);
        }
    }
    Ok(mode_sets)
}

/// Builds inward/outward incidence lists over every edge.
fn build_topology(
    num_vertices: usize,
    edges: &[QualifiedEdge<usize>],
) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
    let mut inwards = vec![Vec::new(); num_vertices];
    let mut outwards = vec![Vec::new(); num_vertices];
    for (ei, edge) in edges.iter().enumerate() {
        outwards[edge.start()].push(ei);
        inwards[edge.finish()].push(ei);
    }
    (inwards, outwards)
}

fn incident_edges<'a>(
    v: usize,
    inwards: &'a [Vec<usize>],
    outwards: &'a [Vec<usize>],
    mode_sets: &'a [ModeSet],
) -> impl Iterator<Item = usize> + 'a {
    inwards[v]
        .iter()
        .chain(outwards[v].iter())
        .copied()
        .filter(move |&ei| !mode_sets[ei].is_empty())
}

/// Iteratively strip non-goal vertices with fewer than two surviving
/// incident edges, emptying the mode set of the lone survivor (if any)
/// and re-examining its opposite endpoint.
fn strip_leaves(
    is_goal: &[bool],
    edges: &[QualifiedEdge<usize>],
    mode_sets: &mut [ModeSet],
    inwards: &[Vec<usize>],
    outwards: &[Vec<usize>],
) {
    let num_vertices = is_goal.len();
    let mut queue: VecDeque<usize> = (0..num_vertices).collect();
    let mut queued = vec![true; num_vertices];

    while let Some(v) = queue.pop_front() {
        queued[v] = false;
        if is_goal[v] {
            continue;
        }
        let incident: Vec<usize> = incident_edges(v, inwards, outwards, mode_sets).collect();
        if incident.len() >= 2 {
            continue;
        }
        for &ei in &incident {
            mode_sets[ei].clear();
            let opposite = if edges[ei].start() == v {
                edges[ei].finish()
            } else {
                edges[ei].start()
            };
            if !queued[opposite] {
                queued[opposite] = true;
                queue.push_back(opposite);
            }
        }
    }
}

/// Goal-reachability shortest paths, one source-relaxation per
/// goal, propagated via a work queue in the manner of `petgraph`'s own
/// `algo::spfa` (an SPFA-style improvement on Bellman-Ford for graphs with
/// no negative edges here, since costs are non-negative). This recomputes
/// a fresh fixpoint on every call rather than literally carrying an
/// invalidation queue across elimination rounds — see `DESIGN.md` for why
/// that is a safe simplification.
fn compute_distances(
    goal_vertices: &[usize],
    mode_sets: &[ModeSet],
    edges: &[QualifiedEdge<usize>],
    num_vertices: usize,
) -> Vec<Vec<f64>> {
    let degree = goal_vertices.len();
    let mut dist = vec![vec![f64::INFINITY; degree]; num_vertices];

    for (g, &gv) in goal_vertices.iter().enumerate() {
        dist[gv][g] = 0.0;

        let mut queue: VecDeque<usize> = VecDeque::new();
        let mut in_queue = vec![false; num_vertices];
        queue.push_back(gv);
        in_queue[gv] = true;

        while let Some(v) = queue.pop_front() {
            in_queue[v] = false;
            let d_v = dist[v][g];

            // Incoming edges at v (x -> v): usable toward v when some
            // surviving mode has goal g set, which relaxes dist[x][g].
            for &ei in &edges_incoming(v, edges) {
                if !mode_sets[ei].has_goal_set(g) {
                    continue;
                }
                let x = edges[ei].start();
                let candidate = d_v + edges[ei].cost();
                if candidate < dist[x][g] {
                    dist[x][g] = candidate;
                    if !in_queue[x] {
                        in_queue[x] = true;
                        queue.push_back(x);
                    }
                }
            }
            // Outgoing edges at v (v -> y): usable toward v when some
            // surviving mode has goal g clear, which relaxes dist[y][g].
            for &ei in &edges_outgoing(v, edges) {
                if !mode_sets[ei].has_goal_clear(g) {
                    continue;
                }
                let y = edges[ei].finish();
                let candidate = d_v + edges[ei].cost();
                if candidate < dist[y][g] {
                    dist[y][g] = candidate;
                    if !in_queue[y] {
                        in_queue[y] = true;
                        queue.push_back(y);
                    }
                }
            }
        }
    }
    dist
}

fn edges_incoming(v: usize, edges: &[QualifiedEdge<usize>]) -> Vec<usize> {
    edges
        .iter()
        .enumerate()
        .filter(|(_, e)| e.finish() == v)
        .map(|(i, _)| i)
        .collect()
}

fn edges_outgoing(v: usize, edges: &[QualifiedEdge<usize>]) -> Vec<usize> {
    edges
        .iter()
        .enumerate()
        .filter(|(_, e)| e.start() == v)
        .map(|(i, _)| i)
        .collect()
}

/// Bias-based mode elimination for one round at `threshold`.
fn eliminate_by_bias(
    edges: &[QualifiedEdge<usize>],
    dist: &[Vec<f64>],
    mode_sets: &mut [ModeSet],
    threshold: f64,
    degree: usize,
) {
    for (ei, edge) in edges.iter().enumerate() {
        if mode_sets[ei].is_empty() {
            continue;
        }
        let cost = edge.cost();
        if cost <= 0.0 {
            // A zero/negative-cost edge has no meaningful bias; leave it
            // to capacity pruning and leaf stripping instead.
            continue;
        }
        for g in 0..degree {
            let d_s = dist[edge.start()][g];
            let d_f = dist[edge.finish()][g];
            if d_s.is_infinite() || d_f.is_infinite() {
                mode_sets[ei].clear();
                break;
            }
            let bias = (d_s - d_f) / cost;
            if bias > threshold {
                mode_sets[ei].remove_goal_set(g);
            } else if bias < -threshold {
                mode_sets[ei].remove_goal_clear(g);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::{BidiCapacity, Capacity};
    use crate::demand::FlatDemand;

    fn edge(start: usize, finish: usize, cap: f64, cost: f64) -> QualifiedEdge<usize> {
        QualifiedEdge::new(start, finish, BidiCapacity::of(Capacity::at(cap)), cost)
    }

    #[test]
    fn initial_prune_respects_goal_side_constraints() {
        // 2 goals: vertex 0 = goal A, vertex 1 = goal B. Single edge A->B.
        let goals = vec![0usize, 1usize];
        let demand = FlatDemand::new(2, Capacity::at(5.0));
        let edges = vec![edge(0, 1, 10.0, 1.0)];
        let modes = initial_prune(&goals, &demand, &edges).unwrap();
        // Only mode 0b01 (from-set = {A}) is consistent with A being
        // upstream and B downstream.
        assert!(modes[0].contains(0b01));
        assert!(!modes[0].contains(0b10));
    }

    #[test]
    fn strip_leaves_clears_dead_end_edges() {
        // 2 goals A(0), B(1); a dangling non-goal vertex 2 with a single
        // edge to it should be stripped.
        let is_goal = vec![true, true, false];
        let edges = vec![edge(0, 1, 10.0, 1.0), edge(1, 2, 10.0, 1.0)];
        let (inwards, outwards) = build_topology(3, &edges);
        let mut mode_sets = vec![
            ModeSet::with_capacity_for(2),
            ModeSet::with_capacity_for(2),
        ];
        mode_sets[0].insert(0b01);
        mode_sets[1].insert(0b01);
        strip_leaves(&is_goal, &edges, &mut mode_sets, &inwards, &outwards);
        assert!(mode_sets[1].is_empty());
        assert!(!mode_sets[0].is_empty());
    }
}
