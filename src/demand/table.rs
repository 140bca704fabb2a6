use error_stack::Result;

use super::validate_subset;
use crate::bitset::GoalSet;
use crate::capacity::Capacity;
use crate::error::DemandError;

use super::DemandFunction;

/// A demand function backed by a direct lookup table of size `2^degree -
/// 2`, indexed by `bitmask - 1`. This is what
/// [`DemandFunction::tabulate`] produces from any other variant.
#[derive(Debug, Clone)]
pub struct TableDemand {
    degree: usize,
    table: Vec<Capacity>,
}

impl TableDemand {
    /// Build a table directly from precomputed entries.
    ///
    /// `table[k]` must hold the capacity for from-set bitmask `k + 1`, for
    /// `k` in `0..2^degree - 2`.
    pub fn from_table(degree: usize, table: Vec<Capacity>) -> Self {
        assert_eq!(
            table.len(),
            table_len(degree),
            "table must have exactly 2^degree - 2 entries"
        );
        Self { degree, table }
    }

    /// Materialise a table by evaluating `base.get` at every valid
    /// bitmask.
    ///
    /// # Errors
    /// Propagates any error `base.get` returns; none is expected for
    /// well-formed `base` since every mask probed is already a non-empty,
    /// proper subset.
    pub fn from_function<D: DemandFunction + ?Sized>(base: &D) -> Result<Self, DemandError> {
        let degree = base.degree();
        let len = table_len(degree);
        let mut table = Vec::with_capacity(len);
        for k in 0..len {
            let mask = (k as u64) + 1;
            let from_set = GoalSet::from_bits(mask, degree);
            table.push(base.get(&from_set)?);
        }
        Ok(Self { degree, table })
    }
}

fn table_len(degree: usize) -> usize {
    if degree == 0 {
        0
    } else {
        (1usize << degree).saturating_sub(2)
    }
}

impl DemandFunction for TableDemand {
    fn degree(&self) -> usize {
        self.degree
    }

    fn get(&self, from_set: &GoalSet) -> Result<Capacity, DemandError> {
        validate_subset(from_set, self.degree)?;
        let bits = from_set
            .as_u64()
            .expect("table-backed degrees always fit the u64 fast path");
        Ok(self.table[(bits - 1) as usize])
    }
}
