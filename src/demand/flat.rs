use error_stack::Result;

use super::validate_subset;
use crate::bitset::GoalSet;
use crate::capacity::Capacity;
use crate::error::DemandError;

use super::DemandFunction;

/// A demand function that returns the same [`Capacity`] regardless of which
/// goals are on which side of the cut.
#[derive(Debug, Clone, Copy)]
pub struct FlatDemand {
    degree: usize,
    capacity: Capacity,
}

impl FlatDemand {
    /// Build a flat demand function of the given degree, constant at `capacity`.
    pub fn new(degree: usize, capacity: Capacity) -> Self {
        Self { degree, capacity }
    }
}

impl DemandFunction for FlatDemand {
    fn degree(&self) -> usize {
        self.degree
    }

    fn get(&self, from_set: &GoalSet) -> Result<Capacity, DemandError> {
        validate_subset(from_set, self.degree)?;
        Ok(self.capacity)
    }
}
