//! Compiles per-vertex structural constraints into checks attached to the
//! mixed-radix digit position that makes them decidable, and assigns that
//! digit ordering itself.
//!
//! Edges are ordered so that edges nearer a goal occupy higher (more
//! significant) digit positions: [`MixedRadixIter`](crate::mixedradix::MixedRadixIter)
//! descends from the highest position first, so goal-adjacent structure is
//! validated before the solver commits to anything farther out, maximising
//! how much of the search tree a single rejection prunes.

use std::collections::VecDeque;

use crate::bitset::GoalSet;
use crate::graph::QualifiedEdge;
use crate::mixedradix::Validator;
use crate::routing::RoutingOutcome;

/// One vertex's incident edge, together with its role there.
#[derive(Clone, Copy)]
struct Member {
    position: usize,
    /// `true` if this edge is inward at the vertex the check is compiled
    /// for (`edge.finish() == v`), `false` if outward (`edge.start() == v`).
    inward: bool,
}

enum Check {
    /// The external sets of `members` must be pairwise disjoint.
    Disjoint { members: Vec<Member> },
    /// The union of external sets must be the full goal set, or every
    /// member must be disused.
    NonGoalCover { members: Vec<Member> },
    /// As `NonGoalCover`, but the union also includes the vertex's own
    /// goal bit, and at least one member must be in use.
    GoalCover { goal_bit: usize, members: Vec<Member> },
}

/// The compiled digit ordering and per-position validity checks for one
/// planning run.
pub(crate) struct CompiledConstraints {
    degree: usize,
    /// `position_to_edge[p]` is the original edge index assigned digit
    /// position `p`.
    pub(crate) position_to_edge: Vec<usize>,
    /// Per position, the per-digit radix (`|M[e]| + 1`).
    pub(crate) radices: Vec<u32>,
    /// Per original edge index, the ascending list of surviving from-set
    /// masks; digit value `k > 0` at that edge's position selects
    /// `masks_of[edge][k - 1]`.
    pub(crate) masks_of: Vec<Vec<usize>>,
    checks_at: Vec<Vec<Check>>,
}

impl CompiledConstraints {
    fn external_set(&self, member: Member, digits: &[u32]) -> GoalSet {
        let digit = digits[member.position];
        if digit == 0 {
            return GoalSet::empty(self.degree);
        }
        let edge = self.position_to_edge[member.position];
        let mask = self.masks_of[edge][(digit - 1) as usize] as u64;
        let from_set = GoalSet::from_bits(mask, self.degree);
        if member.inward {
            from_set
        } else {
            from_set.complement(self.degree)
        }
    }

    fn check_ok(&self, check: &Check, digits: &[u32]) -> bool {
        match check {
            Check::Disjoint { members } => {
                let mut seen = GoalSet::empty(self.degree);
                for &m in members {
                    let s = self.external_set(m, digits);
                    if !seen.is_disjoint(&s) {
                        return false;
                    }
                    seen = seen.union(&s);
                }
                true
            }
            Check::NonGoalCover { members } => {
                let mut union = GoalSet::empty(self.degree);
                for &m in members {
                    union = union.union(&self.external_set(m, digits));
                }
                union.is_full(self.degree) || union.is_empty()
            }
            Check::GoalCover { goal_bit, members } => {
                let mut union = GoalSet::singleton(*goal_bit, self.degree);
                let mut any_used = false;
                for &m in members {
                    let s = self.external_set(m, digits);
                    if !s.is_empty() {
                        any_used = true;
                    }
                    union = union.union(&s);
                }
                any_used && union.is_full(self.degree)
            }
        }
    }
}

impl Validator for CompiledConstraints {
    fn valid(&self, pos: usize, digits: &[u32]) -> bool {
        self.checks_at[pos]
            .iter()
            .all(|c| self.check_ok(c, digits))
    }
}

/// Compile the per-vertex constraints and digit ordering from a finished
/// routing pass.
pub(crate) fn compile(
    goal_vertices: &[usize],
    edges: &[QualifiedEdge<usize>],
    outcome: &RoutingOutcome,
    num_vertices: usize,
) -> CompiledConstraints {
    let degree = goal_vertices.len();
    let position_to_edge = order_edges_by_goal_distance(goal_vertices, edges, outcome, num_vertices);
    let mut edge_to_position = vec![0usize; edges.len()];
    for (p, &e) in position_to_edge.iter().enumerate() {
        edge_to_position[e] = p;
    }

    let masks_of: Vec<Vec<usize>> = outcome
        .mode_sets
        .iter()
        .map(|m| m.iter().collect::<Vec<_>>())
        .collect();
    let radices: Vec<u32> = position_to_edge
        .iter()
        .map(|&e| masks_of[e].len() as u32 + 1)
        .collect();

    let goal_bit_of = |v: usize| goal_vertices.iter().position(|&g| g == v);

    let mut checks_at: Vec<Vec<Check>> = (0..edges.len()).map(|_| Vec::new()).collect();

    for v in 0..num_vertices {
        let mut incident: Vec<Member> = outcome.inwards[v]
            .iter()
            .map(|&ei| Member {
                position: edge_to_position[ei],
                inward: true,
            })
            .chain(outcome.outwards[v].iter().map(|&ei| Member {
                position: edge_to_position[ei],
                inward: false,
            }))
            .collect();
        if incident.is_empty() {
            continue;
        }
        incident.sort_by_key(|m| m.position);

        // One disjointness check per suffix of length >= 2. A vertex with
        // a single incident edge has nothing to compare, so this is
        // skipped, but the cover check below still applies to it — a goal
        // with exactly one candidate edge must still use it.
        if incident.len() >= 2 {
            for start in 0..=(incident.len() - 2) {
                let members = incident[start..].to_vec();
                let base = members[0].position;
                checks_at[base].push(Check::Disjoint { members });
            }
        }

        // One cover check over every incident edge.
        let base = incident[0].position;
        let check = match goal_bit_of(v) {
            Some(goal_bit) => Check::GoalCover {
                goal_bit,
                members: incident.clone(),
            },
            None => Check::NonGoalCover {
                members: incident.clone(),
            },
        };
        checks_at[base].push(check);
    }

    CompiledConstraints {
        degree,
        position_to_edge,
        radices,
        masks_of,
        checks_at,
    }
}

/// Assigns digit positions by BFS distance (in edge-cost-agnostic hops,
/// over surviving edges only) from the nearest goal: position `0` goes to
/// the farthest edge, position `len - 1` to the nearest.
fn order_edges_by_goal_distance(
    goal_vertices: &[usize],
    edges: &[QualifiedEdge<usize>],
    outcome: &RoutingOutcome,
    num_vertices: usize,
) -> Vec<usize> {
    let mut vertex_dist = vec![usize::MAX; num_vertices];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for &g in goal_vertices {
        if vertex_dist[g] == usize::MAX {
            vertex_dist[g] = 0;
            queue.push_back(g);
        }
    }
    while let Some(v) = queue.pop_front() {
        let d = vertex_dist[v];
        for &ei in outcome.inwards[v].iter().chain(outcome.outwards[v].iter()) {
            let other = if edges[ei].start() == v {
                edges[ei].finish()
            } else {
                edges[ei].start()
            };
            if vertex_dist[other] == usize::MAX {
                vertex_dist[other] = d + 1;
                queue.push_back(other);
            }
        }
    }

    let edge_distance = |ei: usize| -> usize {
        let e = &edges[ei];
        vertex_dist[e.start()]
            .saturating_add(1)
            .min(vertex_dist[e.finish()].saturating_add(1))
    };

    let mut order: Vec<usize> = (0..edges.len()).collect();
    order.sort_by_key(|&ei| (std::cmp::Reverse(edge_distance(ei)), ei));
    order
}
