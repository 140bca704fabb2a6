//! A lazy, constrained mixed-radix odometer.
//!
//! Enumerates every digit tuple `(d_0, ..., d_{L-1})` with per-position
//! radix `r_i`, in odometer order (`d_0` increments fastest), skipping
//! entire suffix-sharing sub-trees whenever a [`Validator`] rejects the
//! digit just set at some position. This is what lets the planner's
//! per-vertex structural constraints prune the search without ever
//! materialising the full Cartesian product of edge modes.

use std::time::Instant;

/// Checked whenever the digit at `pos` has just been assigned a new value.
///
/// Contract: `digits[pos..]` are the tuple's currently committed values;
/// `digits[..pos]` are not yet meaningful and must not be read. Returning
/// `false` prunes every tuple sharing `digits[pos..]` as a suffix — the
/// iterator will never again visit this suffix with a lower-or-equal
/// combination at position `pos` unless that digit's value changes.
pub trait Validator {
    /// Decide whether the partially-built suffix `digits[pos..]` can ever
    /// lead to a valid tuple.
    fn valid(&self, pos: usize, digits: &[u32]) -> bool;
}

impl<F> Validator for F
where
    F: Fn(usize, &[u32]) -> bool,
{
    fn valid(&self, pos: usize, digits: &[u32]) -> bool {
        self(pos, digits)
    }
}

/// Lazily enumerates digit tuples satisfying a [`Validator`], translating
/// each one through `translate` before yielding it.
pub struct MixedRadixIter<Val, F> {
    radices: Vec<u32>,
    digits: Vec<u32>,
    validator: Val,
    translate: F,
    state: State,
    deadline: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No tuple has been emitted yet; the next call must descend from the
    /// highest position.
    Fresh,
    /// At least one tuple has been emitted; the next call must advance
    /// from position 0.
    Running,
    /// The carry has overflowed past the highest position, or the
    /// deadline has passed.
    Exhausted,
}

impl<Val, F, T> MixedRadixIter<Val, F>
where
    Val: Validator,
    F: FnMut(&[u32]) -> T,
{
    /// Build an iterator over tuples of length `radices.len()`, with digit
    /// `i` ranging over `0..radices[i]`.
    pub fn new(radices: Vec<u32>, validator: Val, translate: F) -> Self {
        let len = radices.len();
        Self {
            radices,
            digits: vec![0; len],
            validator,
            translate,
            state: State::Fresh,
            deadline: None,
        }
    }

    /// Stop emitting once `deadline` has passed, ending the stream cleanly
    /// rather than returning an error.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn len(&self) -> usize {
        self.radices.len()
    }

    /// Increment the digit at `p`, carrying into higher positions as
    /// needed. Returns the position whose value just changed, or `None` if
    /// the carry overflowed past the last position.
    fn carry(&mut self, mut p: usize) -> Option<usize> {
        loop {
            self.digits[p] += 1;
            if self.digits[p] < self.radices[p] {
                return Some(p);
            }
            self.digits[p] = 0;
            if p + 1 >= self.len() {
                return None;
            }
            p += 1;
        }
    }

    /// Find the next tuple satisfying the validator at every position,
    /// starting the search at `p` (whose digit has just been set).
    fn seek(&mut self, mut p: usize) -> bool {
        loop {
            if !self.validator.valid(p, &self.digits) {
                match self.carry(p) {
                    Some(new_p) => {
                        p = new_p;
                        continue;
                    }
                    None => return false,
                }
            }
            if p == 0 {
                return true;
            }
            p -= 1;
            self.digits[p] = 0;
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl<Val, F, T> Iterator for MixedRadixIter<Val, F>
where
    Val: Validator,
    F: FnMut(&[u32]) -> T,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.state == State::Exhausted || self.deadline_passed() {
            self.state = State::Exhausted;
            return None;
        }

        if self.len() == 0 {
            // A zero-length tuple has exactly one (empty) assignment.
            if self.state == State::Fresh {
                self.state = State::Exhausted;
                return Some((self.translate)(&[]));
            }
            return None;
        }

        let start = match self.state {
            State::Fresh => self.len() - 1,
            State::Running => match self.carry(0) {
                Some(p) => p,
                None => {
                    self.state = State::Exhausted;
                    return None;
                }
            },
            State::Exhausted => unreachable!("checked above"),
        };

        if self.seek(start) {
            self.state = State::Running;
            Some((self.translate)(&self.digits))
        } else {
            self.state = State::Exhausted;
            None
        }
    }
}
