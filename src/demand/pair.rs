use error_stack::Result;

use super::validate_subset;
use crate::bitset::GoalSet;
use crate::capacity::Capacity;
use crate::error::DemandError;

use super::DemandFunction;

/// A demand function keyed by per-goal ingress/egress rates: goal `i`
/// injects `ingress[i]` units when it is on the sending side, and absorbs
/// `egress[i]` units when it is on the receiving side.
///
/// `get(S) = min(sum of ingress[i] for i in S, sum of egress[i] for i not
/// in S)` — the edge can only carry as much as the smaller of "what the
/// senders are offering" and "what the receivers can take."
#[derive(Debug, Clone)]
pub struct PairDemand {
    ingress: Vec<Capacity>,
    egress: Vec<Capacity>,
}

impl PairDemand {
    /// Build a pair demand function from per-goal ingress/egress rates.
    ///
    /// `ingress` and `egress` must have the same length; that length
    /// becomes the function's degree.
    pub fn new(ingress: Vec<Capacity>, egress: Vec<Capacity>) -> Self {
        assert_eq!(
            ingress.len(),
            egress.len(),
            "ingress and egress must describe the same goals"
        );
        Self { ingress, egress }
    }
}

impl DemandFunction for PairDemand {
    fn degree(&self) -> usize {
        self.ingress.len()
    }

    fn get(&self, from_set: &GoalSet) -> Result<Capacity, DemandError> {
        validate_subset(from_set, self.degree())?;
        let up = sum_over(&self.ingress, from_set);
        let dn = sum_over_complement(&self.egress, from_set, self.degree());
        Ok(up.min_with(dn))
    }
}

fn sum_over(rates: &[Capacity], set: &GoalSet) -> Capacity {
    set.iter_set_bits()
        .fold(Capacity::default(), |acc, i| acc.add(rates[i]))
}

fn sum_over_complement(rates: &[Capacity], set: &GoalSet, degree: usize) -> Capacity {
    (0..degree)
        .filter(|i| !set.contains(*i))
        .fold(Capacity::default(), |acc, i| acc.add(rates[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(v: f64) -> Capacity {
        Capacity::at(v)
    }

    #[test]
    fn get_is_min_of_ingress_and_egress_sums() {
        // 3 goals, each ingress=2, egress=2. S = {0}: up = 2, dn = 2+2 = 4 -> min = 2
        let demand = PairDemand::new(vec![rate(2.0); 3], vec![rate(2.0); 3]);
        let s = GoalSet::from_bits(0b001, 3);
        let result = demand.get(&s).unwrap();
        assert_eq!(result, rate(2.0));
    }

    #[test]
    fn get_pair_is_symmetric_via_complement() {
        let demand = PairDemand::new(vec![rate(1.0), rate(3.0)], vec![rate(5.0), rate(1.0)]);
        let s = GoalSet::from_bits(0b01, 2);
        let pair = demand.get_pair(&s).unwrap();
        assert_eq!(pair.ingress(), demand.get(&s).unwrap());
        assert_eq!(pair.egress(), demand.get(&s.complement(2)).unwrap());
    }
}
