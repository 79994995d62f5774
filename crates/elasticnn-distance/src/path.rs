//! Alignment path types for DTW and ERP.

/// A single step in a DTW warping path, mapping index `a` in the first sequence
/// to index `b` in the second sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarpingStep {
    /// Index in the first sequence.
    pub a: usize,
    /// Index in the second sequence.
    pub b: usize,
}

/// An ordered sequence of warping steps from `(0, 0)` to `(n-1, m-1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpingPath(Vec<WarpingStep>);

impl WarpingPath {
    pub(crate) fn new(steps: Vec<WarpingStep>) -> Self {
        Self(steps)
    }

    /// Return the warping steps as a slice.
    #[must_use]
    pub fn steps(&self) -> &[WarpingStep] {
        &self.0
    }

    /// Return the number of steps in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the path contains no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a WarpingPath {
    type Item = &'a WarpingStep;
    type IntoIter = std::slice::Iter<'a, WarpingStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One operation of an ERP edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStep {
    /// Point `a` of the first sequence is matched with point `b` of the second.
    Match {
        /// Index in the first sequence.
        a: usize,
        /// Index in the second sequence.
        b: usize,
    },

    /// Point `b` of the second sequence is matched against the gap value.
    GapInA {
        /// Index in the second sequence.
        b: usize,
    },

    /// Point `a` of the first sequence is matched against the gap value.
    GapInB {
        /// Index in the first sequence.
        a: usize,
    },
}

/// Ordered ERP edit script. Every index of both sequences appears exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct EditPath(Vec<EditStep>);

impl EditPath {
    pub(crate) fn new(steps: Vec<EditStep>) -> Self {
        Self(steps)
    }

    /// Return the edit steps as a slice.
    #[must_use]
    pub fn steps(&self) -> &[EditStep] {
        &self.0
    }

    /// Return the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the script is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count the steps that match a point against the gap value.
    #[must_use]
    pub fn n_gaps(&self) -> usize {
        self.0
            .iter()
            .filter(|step| !matches!(step, EditStep::Match { .. }))
            .count()
    }
}

impl<'a> IntoIterator for &'a EditPath {
    type Item = &'a EditStep;
    type IntoIter = std::slice::Iter<'a, EditStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
