//! Goal-subset bitmasks.
//!
//! Bit `i` of a [`GoalSet`] denotes goal `i`. The practical regime the
//! planner runs in rarely exceeds a few dozen goals, so a plain `u64` is the
//! fast path; [`GoalSet`] falls back to a [`fixedbitset::FixedBitSet`] only
//! once `degree` exceeds 64, so callers never have to pick a representation
//! themselves.
//!
//! [`GoalSet`]'s `Ord` impl is a plain lexicographic compare over set bit
//! positions, least significant first.

use core::cmp::Ordering;
use core::fmt;

use fixedbitset::FixedBitSet;

/// A subset of `0..degree` goals, represented as densely as the degree
/// allows.
#[derive(Debug, Clone)]
pub enum GoalSet {
    /// Fast path: `degree <= 64`.
    Small(u64),
    /// Fallback: `degree > 64`.
    Big(FixedBitSet),
}

impl GoalSet {
    /// The threshold below which `GoalSet` prefers the `u64` backing.
    pub const SMALL_LIMIT: usize = 64;

    /// The empty subset for a graph of the given degree.
    pub fn empty(degree: usize) -> Self {
        if degree <= Self::SMALL_LIMIT {
            Self::Small(0)
        } else {
            Self::Big(FixedBitSet::with_capacity(degree))
        }
    }

    /// The subset containing exactly goal `i`.
    pub fn singleton(i: usize, degree: usize) -> Self {
        let mut s = Self::empty(degree);
        s.insert(i);
        s
    }

    /// The subset containing every goal `0..degree`.
    pub fn full(degree: usize) -> Self {
        let mut s = Self::empty(degree);
        for i in 0..degree {
            s.insert(i);
        }
        s
    }

    /// Build a `GoalSet` from a raw bitmask, for the `degree <= 64` regime.
    pub fn from_bits(bits: u64, degree: usize) -> Self {
        if degree <= Self::SMALL_LIMIT {
            Self::Small(bits & mask_for(degree))
        } else {
            let mut s = Self::empty(degree);
            for i in 0..degree {
                if bits & (1u64 << i) != 0 {
                    s.insert(i);
                }
            }
            s
        }
    }

    /// Insert goal `i`.
    pub fn insert(&mut self, i: usize) {
        match self {
            Self::Small(bits) => *bits |= 1u64 << i,
            Self::Big(set) => set.insert(i),
        }
    }

    /// Remove goal `i`.
    pub fn remove(&mut self, i: usize) {
        match self {
            Self::Small(bits) => *bits &= !(1u64 << i),
            Self::Big(set) => set.set(i, false),
        }
    }

    /// Whether goal `i` is in the subset.
    pub fn contains(&self, i: usize) -> bool {
        match self {
            Self::Small(bits) => bits & (1u64 << i) != 0,
            Self::Big(set) => set.contains(i),
        }
    }

    /// Whether the subset is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Small(bits) => *bits == 0,
            Self::Big(set) => set.count_ones(..) == 0,
        }
    }

    /// Whether the subset contains every goal `0..degree`.
    pub fn is_full(&self, degree: usize) -> bool {
        match self {
            Self::Small(bits) => *bits == mask_for(degree),
            Self::Big(set) => set.count_ones(..) == degree,
        }
    }

    /// The complement within `0..degree`.
    pub fn complement(&self, degree: usize) -> Self {
        match self {
            Self::Small(bits) => Self::Small((!bits) & mask_for(degree)),
            Self::Big(set) => {
                let mut out = set.clone();
                out.toggle_range(..degree);
                Self::Big(out)
            }
        }
    }

    /// The union of two subsets of the same degree.
    pub fn union(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Small(a), Self::Small(b)) => Self::Small(a | b),
            (Self::Big(a), Self::Big(b)) => {
                let mut out = a.clone();
                out.union_with(b);
                Self::Big(out)
            }
            _ => unreachable!("GoalSet operands must share a representation"),
        }
    }

    /// The intersection of two subsets of the same degree.
    pub fn intersection(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Small(a), Self::Small(b)) => Self::Small(a & b),
            (Self::Big(a), Self::Big(b)) => {
                let mut out = a.clone();
                out.intersect_with(b);
                Self::Big(out)
            }
            _ => unreachable!("GoalSet operands must share a representation"),
        }
    }

    /// Whether two subsets share no goal.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Small(a), Self::Small(b)) => a & b == 0,
            (Self::Big(a), Self::Big(b)) => a.is_disjoint(b),
            _ => unreachable!("GoalSet operands must share a representation"),
        }
    }

    /// Number of goals in the subset.
    pub fn popcount(&self) -> u32 {
        match self {
            Self::Small(bits) => bits.count_ones(),
            Self::Big(set) => set.count_ones(..) as u32,
        }
    }

    /// Iterate the set bit positions, ascending.
    pub fn iter_set_bits(&self) -> impl Iterator<Item = usize> + '_ {
        let small_iter = match self {
            Self::Small(bits) => Some(*bits),
            Self::Big(_) => None,
        };
        let big_iter = match self {
            Self::Big(set) => Some(set.ones()),
            Self::Small(_) => None,
        };
        SmallOrBigBits {
            small: small_iter,
            big: big_iter,
        }
    }

    /// The raw `u64` bitmask, if this `GoalSet` is in the `Small`
    /// representation. Used by table-backed demand functions, which only
    /// ever operate at small degrees.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Small(bits) => Some(*bits),
            Self::Big(_) => None,
        }
    }
}

struct SmallOrBigBits<'a> {
    small: Option<u64>,
    big: Option<fixedbitset::Ones<'a>>,
}

impl Iterator for SmallOrBigBits<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if let Some(bits) = &mut self.small {
            if *bits == 0 {
                return None;
            }
            let i = bits.trailing_zeros() as usize;
            *bits &= *bits - 1;
            return Some(i);
        }
        if let Some(iter) = &mut self.big {
            return iter.next();
        }
        None
    }
}

fn mask_for(degree: usize) -> u64 {
    if degree >= 64 {
        u64::MAX
    } else {
        (1u64 << degree) - 1
    }
}

impl PartialEq for GoalSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter_set_bits().eq(other.iter_set_bits())
    }
}

impl Eq for GoalSet {}

impl PartialOrd for GoalSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GoalSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter_set_bits().cmp(other.iter_set_bits())
    }
}

impl core::hash::Hash for GoalSet {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        for bit in self.iter_set_bits() {
            bit.hash(state);
        }
    }
}

impl fmt::Display for GoalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, bit) in self.iter_set_bits().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{bit}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complement_is_involutive() {
        let s = GoalSet::from_bits(0b0101, 4);
        let cc = s.complement(4).complement(4);
        assert_eq!(s, cc);
    }

    #[test]
    fn full_and_empty_are_complements() {
        assert_eq!(GoalSet::empty(5).complement(5), GoalSet::full(5));
    }

    #[test]
    fn singleton_contains_only_itself() {
        let s = GoalSet::singleton(2, 5);
        assert!(s.contains(2));
        assert!(!s.contains(0));
        assert_eq!(s.popcount(), 1);
    }

    #[test]
    fn union_and_intersection() {
        let a = GoalSet::from_bits(0b0011, 4);
        let b = GoalSet::from_bits(0b0110, 4);
        assert_eq!(a.union(&b), GoalSet::from_bits(0b0111, 4));
        assert_eq!(a.intersection(&b), GoalSet::from_bits(0b0010, 4));
    }

    #[test]
    fn disjoint_detection() {
        let a = GoalSet::from_bits(0b0001, 4);
        let b = GoalSet::from_bits(0b0010, 4);
        assert!(a.is_disjoint(&b));
        assert!(!a.is_disjoint(&a.clone()));
    }

    #[test]
    fn big_representation_matches_small_semantics() {
        let degree = 70;
        let mut small = GoalSet::empty(8);
        let mut big = GoalSet::empty(degree);
        for i in [0usize, 3, 65, 69] {
            if i < 8 {
                small.insert(i);
            }
            big.insert(i);
        }
        assert_eq!(big.popcount(), 4);
        assert!(big.contains(65));
        assert!(!big.contains(64));
        let comp = big.complement(degree);
        assert!(!comp.contains(65));
        assert!(comp.contains(64));
    }

    #[test]
    fn iter_set_bits_is_ascending() {
        let s = GoalSet::from_bits(0b10110, 6);
        let bits: Vec<_> = s.iter_set_bits().collect();
        assert_eq!(bits, vec![1, 2, 4]);
    }

    #[test]
    fn ordering_is_lexicographic_over_set_bits() {
        let a = GoalSet::from_bits(0b0001, 4);
        let b = GoalSet::from_bits(0b0010, 4);
        assert!(a < b);
    }
}
