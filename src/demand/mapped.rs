use error_stack::{report, Result};

use super::{validate_subset, DemandFunction};
use crate::bitset::GoalSet;
use crate::capacity::Capacity;
use crate::error::DemandError;

/// A demand function built by relabelling a base function's goals through
/// a permutation: `mapped.get(S) == base.get({permutation(i) : i in S})`.
pub struct Mapped<'a, D> {
    base: &'a D,
    permutation: Vec<usize>,
}

impl<'a, D: DemandFunction> Mapped<'a, D> {
    pub(super) fn new(base: &'a D, permutation: &[usize]) -> Result<Self, DemandError> {
        let degree = base.degree();
        if permutation.len() != degree {
            return Err(report!(DemandError::NotAPermutation));
        }
        let mut seen = vec![false; degree];
        for &p in permutation {
            if p >= degree || seen[p] {
                return Err(report!(DemandError::NotAPermutation));
            }
            seen[p] = true;
        }
        Ok(Self {
            base,
            permutation: permutation.to_vec(),
        })
    }
}

impl<D: DemandFunction> DemandFunction for Mapped<'_, D> {
    fn degree(&self) -> usize {
        self.base.degree()
    }

    fn get(&self, from_set: &GoalSet) -> Result<Capacity, DemandError> {
        validate_subset(from_set, self.degree())?;
        let mut mapped = GoalSet::empty(self.base.degree());
        for i in from_set.iter_set_bits() {
            mapped.insert(self.permutation[i]);
        }
        self.base.get(&mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::PairDemand;

    fn rate(v: f64) -> Capacity {
        Capacity::at(v)
    }

    #[test]
    fn identity_permutation_matches_the_base_function() {
        let base = PairDemand::new(vec![rate(1.0), rate(2.0), rate(3.0)], vec![rate(1.0); 3]);
        let mapped = base.map(&[0, 1, 2]).unwrap();
        let s = GoalSet::from_bits(0b011, 3);
        assert_eq!(mapped.get(&s).unwrap(), base.get(&s).unwrap());
    }

    #[test]
    fn mapping_law_relabels_the_queried_subset() {
        let base = PairDemand::new(
            vec![rate(1.0), rate(2.0), rate(3.0)],
            vec![rate(9.0), rate(9.0), rate(9.0)],
        );
        // swap goals 0 and 2
        let mapped = base.map(&[2, 1, 0]).unwrap();
        let s = GoalSet::from_bits(0b001, 3); // {0}
        let expected = base.get(&GoalSet::from_bits(0b100, 3)).unwrap(); // {2}
        assert_eq!(mapped.get(&s).unwrap(), expected);
    }

    #[test]
    fn rejects_non_permutations() {
        let base = PairDemand::new(vec![rate(1.0); 3], vec![rate(1.0); 3]);
        assert!(base.map(&[0, 0, 2]).is_err());
        assert!(base.map(&[0, 1]).is_err());
        assert!(base.map(&[0, 1, 3]).is_err());
    }
}
