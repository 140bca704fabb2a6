use error_stack::Result;

use super::validate_subset;
use crate::bitset::GoalSet;
use crate::capacity::{BidiCapacity, Capacity};
use crate::error::DemandError;

use super::DemandFunction;

/// A demand function keyed by an `n x n` asymmetric rate matrix: entry
/// `(i, j)` is the directional demand flowing from goal `i` toward goal
/// `j`. The diagonal is ignored.
///
/// `get(S) = sum of matrix[i][j] for i in S, j not in S` — a directional
/// sum, so `get_pair` is overridden rather than derived, since the egress
/// side needs the *reverse* cells (`matrix[j][i]`), not a second call to
/// `get` on the complement re-deriving the same sum from scratch.
#[derive(Debug, Clone)]
pub struct MatrixDemand {
    degree: usize,
    matrix: Vec<Vec<Capacity>>,
}

impl MatrixDemand {
    /// Build a matrix demand function from a square rate matrix. The
    /// diagonal is never read.
    pub fn new(matrix: Vec<Vec<Capacity>>) -> Self {
        let degree = matrix.len();
        for row in &matrix {
            assert_eq!(row.len(), degree, "matrix must be square");
        }
        Self { degree, matrix }
    }
}

impl DemandFunction for MatrixDemand {
    fn degree(&self) -> usize {
        self.degree
    }

    fn get(&self, from_set: &GoalSet) -> Result<Capacity, DemandError> {
        validate_subset(from_set, self.degree)?;
        Ok(self.directional_sum(from_set, Direction::Forward))
    }

    fn get_pair(&self, from_set: &GoalSet) -> Result<BidiCapacity, DemandError> {
        validate_subset(from_set, self.degree)?;
        let ingress = self.directional_sum(from_set, Direction::Forward);
        let egress = self.directional_sum(from_set, Direction::Reverse);
        Ok(BidiCapacity::new(ingress, egress))
    }
}

enum Direction {
    /// `matrix[i][j]`, `i` in the from-set, `j` outside it.
    Forward,
    /// `matrix[j][i]`, `i` in the from-set, `j` outside it — the cells
    /// describing flow back toward the from-set, used for the egress side.
    Reverse,
}

impl MatrixDemand {
    fn directional_sum(&self, from_set: &GoalSet, direction: Direction) -> Capacity {
        let mut acc = Capacity::default();
        for i in from_set.iter_set_bits() {
            for j in 0..self.degree {
                if from_set.contains(j) || i == j {
                    continue;
                }
                let cell = match direction {
                    Direction::Forward => self.matrix[i][j],
                    Direction::Reverse => self.matrix[j][i],
                };
                acc = acc.add(cell);
            }
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_matrix(n: usize) -> Vec<Vec<Capacity>> {
        vec![vec![Capacity::default(); n]; n]
    }

    #[test]
    fn get_sums_forward_cells_crossing_the_cut() {
        let mut m = zero_matrix(4);
        m[0][3] = Capacity::at(5.0);
        let demand = MatrixDemand::new(m);
        let s = GoalSet::from_bits(0b0001, 4); // {0}
        assert_eq!(demand.get(&s).unwrap(), Capacity::at(5.0));

        let not_crossing = GoalSet::from_bits(0b0011, 4); // {0, 1}: j=3 still outside
        assert_eq!(demand.get(&not_crossing).unwrap(), Capacity::at(5.0));

        let both_sides = GoalSet::from_bits(0b1001, 4); // {0, 3}: no longer crosses
        assert_eq!(demand.get(&both_sides).unwrap(), Capacity::default());
    }

    #[test]
    fn get_pair_egress_uses_reverse_cells() {
        let mut m = zero_matrix(3);
        m[0][2] = Capacity::at(5.0);
        m[2][0] = Capacity::at(7.0);
        let demand = MatrixDemand::new(m);
        let s = GoalSet::from_bits(0b001, 3); // {0}
        let pair = demand.get_pair(&s).unwrap();
        assert_eq!(pair.ingress(), Capacity::at(5.0));
        assert_eq!(pair.egress(), Capacity::at(7.0));
    }

    #[test]
    fn diagonal_is_never_read() {
        let mut m = zero_matrix(2);
        m[0][0] = Capacity::at(99.0);
        m[1][1] = Capacity::at(99.0);
        let demand = MatrixDemand::new(m);
        let s = GoalSet::from_bits(0b01, 2);
        assert_eq!(demand.get(&s).unwrap(), Capacity::default());
    }
}
