//! Elastic distance value.

use std::cmp::Ordering;
use std::fmt;

/// A non-negative accumulated alignment cost, or the "exceeded" sentinel.
///
/// Ordered totally via [`f64::total_cmp`] so it can key a sorted map. Values
/// produced by the kernels are never NaN. A computed cost that overflows
/// saturates at `f64::MAX`, so `+inf` only ever means [`Distance::EXCEEDED`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance(f64);

impl Distance {
    /// Sentinel returned when a comparison was abandoned because it provably exceeds the cutoff.
    pub const EXCEEDED: Self = Self(f64::INFINITY);

    /// Zero distance.
    pub const ZERO: Self = Self(0.0);

    /// Create a new distance from a raw value.
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw distance value. `f64::INFINITY` for [`Distance::EXCEEDED`].
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Return true if the computation was abandoned and the exact value is unknown.
    #[must_use]
    pub fn is_exceeded(self) -> bool {
        self.0 == f64::INFINITY
    }

    /// Total ordering comparison using [`f64::total_cmp`].
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Add a local cost to an accumulated cost, saturating at `f64::MAX`.
///
/// An unreachable predecessor (`+inf`) stays unreachable.
#[inline]
pub(crate) fn saturating_add(acc: f64, cost: f64) -> f64 {
    if acc == f64::INFINITY {
        return acc;
    }
    (acc + cost).min(f64::MAX)
}

impl Eq for Distance {}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Distance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl From<Distance> for f64 {
    fn from(distance: Distance) -> Self {
        distance.0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exceeded() {
            f.write_str("exceeded")
        } else {
            write!(f, "{:.6}", self.0)
        }
    }
}
