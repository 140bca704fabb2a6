use error_stack::{report, Result};

use super::{validate_subset, DemandFunction};
use crate::bitset::GoalSet;
use crate::capacity::Capacity;
use crate::error::DemandError;

/// A demand function built by grouping a base function's goals into
/// disjoint, covering clusters: `reduced.get(T) == base.get(union of
/// groups selected by T)`.
pub struct Reduced<'a, D> {
    base: &'a D,
    groups: Vec<GoalSet>,
}

impl<'a, D: DemandFunction> Reduced<'a, D> {
    pub(super) fn new(base: &'a D, groups: &[GoalSet]) -> Result<Self, DemandError> {
        let degree = base.degree();
        let mut seen = GoalSet::empty(degree);
        for group in groups {
            if group.is_empty() {
                return Err(report!(DemandError::NotAPartition));
            }
            if let Some(bit) = group.iter_set_bits().find(|&b| b >= degree) {
                return Err(report!(DemandError::SubsetOutOfRange { bit, degree }));
            }
            if !seen.is_disjoint(group) {
                return Err(report!(DemandError::NotAPartition));
            }
            seen = seen.union(group);
        }
        if !seen.is_full(degree) {
            return Err(report!(DemandError::NotAPartition));
        }
        Ok(Self {
            base,
            groups: groups.to_vec(),
        })
    }
}

impl<D: DemandFunction> DemandFunction for Reduced<'_, D> {
    fn degree(&self) -> usize {
        self.groups.len()
    }

    fn get(&self, from_set: &GoalSet) -> Result<Capacity, DemandError> {
        validate_subset(from_set, self.degree())?;
        let base_degree = self.base.degree();
        let mut union = GoalSet::empty(base_degree);
        for i in from_set.iter_set_bits() {
            union = union.union(&self.groups[i]);
        }
        self.base.get(&union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::{FlatDemand, MatrixDemand};

    #[test]
    fn reduction_law_holds_against_the_base_function() {
        let mut m = vec![vec![Capacity::default(); 4]; 4];
        m[0][2] = Capacity::at(3.0);
        m[0][3] = Capacity::at(4.0);
        let base = MatrixDemand::new(m);

        // Group {0,1} and {2,3}: reduced degree 2.
        let groups = vec![
            GoalSet::from_bits(0b0011, 4),
            GoalSet::from_bits(0b1100, 4),
        ];
        let reduced = base.reduce(&groups).unwrap();

        let t = GoalSet::from_bits(0b01, 2); // group 0 only == base {0,1}
        let expected = base.get(&GoalSet::from_bits(0b0011, 4)).unwrap();
        assert_eq!(reduced.get(&t).unwrap(), expected);
    }

    #[test]
    fn rejects_non_covering_groups() {
        let base = FlatDemand::new(4, Capacity::at(1.0));
        let groups = vec![GoalSet::from_bits(0b0011, 4)]; // misses bits 2,3
        assert!(base.reduce(&groups).is_err());
    }

    #[test]
    fn rejects_overlapping_groups() {
        let base = FlatDemand::new(4, Capacity::at(1.0));
        let groups = vec![
            GoalSet::from_bits(0b0011, 4),
            GoalSet::from_bits(0b0110, 4),
        ];
        assert!(base.reduce(&groups).is_err());
    }
}
