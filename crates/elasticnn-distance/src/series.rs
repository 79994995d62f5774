//! Sequence types with validation guarantees.
//!
//! Values are stored channel-major: channel `c` occupies
//! `data[c * len..(c + 1) * len]`. A univariate sequence is simply a sequence
//! with one channel.

use crate::error::SeriesError;

/// Owned, validated sequence. Guaranteed non-empty, at least one channel,
/// equal-length channels, all values finite.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    data: Vec<f64>,
    n_channels: usize,
    len: usize,
}

impl Sequence {
    /// Create a univariate sequence.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SeriesError::EmptySeries`] | `values` is empty |
    /// | [`SeriesError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(values: Vec<f64>) -> Result<Self, SeriesError> {
        validate_channel(0, &values)?;
        let len = values.len();
        Ok(Self {
            data: values,
            n_channels: 1,
            len,
        })
    }

    /// Create a multivariate sequence from one vector per channel.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SeriesError::NoChannels`] | `channels` is empty |
    /// | [`SeriesError::EmptySeries`] | A channel is empty |
    /// | [`SeriesError::RaggedChannels`] | Channel lengths differ |
    /// | [`SeriesError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn multivariate(channels: Vec<Vec<f64>>) -> Result<Self, SeriesError> {
        let Some(first) = channels.first() else {
            return Err(SeriesError::NoChannels);
        };
        let len = first.len();
        for (channel, values) in channels.iter().enumerate() {
            validate_channel(channel, values)?;
            if values.len() != len {
                return Err(SeriesError::RaggedChannels {
                    channel,
                    expected: len,
                    got: values.len(),
                });
            }
        }
        let n_channels = channels.len();
        let data = channels.into_iter().flatten().collect();
        Ok(Self {
            data,
            n_channels,
            len,
        })
    }

    /// Split a flat row of values into `n_channels` contiguous, equal-length channels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SeriesError::NoChannels`] | `n_channels` is zero |
    /// | [`SeriesError::UnevenChannelSplit`] | `values.len()` is not a multiple of `n_channels` |
    /// | [`SeriesError::EmptySeries`] | `values` is empty |
    /// | [`SeriesError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn from_flat(values: Vec<f64>, n_channels: usize) -> Result<Self, SeriesError> {
        if n_channels == 0 {
            return Err(SeriesError::NoChannels);
        }
        if values.len() % n_channels != 0 {
            return Err(SeriesError::UnevenChannelSplit {
                len: values.len(),
                n_channels,
            });
        }
        let len = values.len() / n_channels;
        if len == 0 {
            return Err(SeriesError::EmptySeries);
        }
        for (channel, chunk) in values.chunks(len).enumerate() {
            validate_channel(channel, chunk)?;
        }
        Ok(Self {
            data: values,
            n_channels,
            len,
        })
    }

    /// Assemble a sequence from already-validated channel-major data.
    pub(crate) fn from_parts_unchecked(data: Vec<f64>, n_channels: usize, len: usize) -> Self {
        debug_assert_eq!(data.len(), n_channels * len);
        Self {
            data,
            n_channels,
            len,
        }
    }

    /// Borrow this sequence as a zero-copy view.
    #[must_use]
    pub fn as_view(&self) -> SequenceView<'_> {
        SequenceView {
            data: &self.data,
            n_channels: self.n_channels,
            len: self.len,
        }
    }

    /// Return the number of time steps per channel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return true if the sequence has no time steps.
    ///
    /// Always `false` for a validated sequence. Provided to satisfy the
    /// `len_without_is_empty` convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return the number of channels.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Return the values of one channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= n_channels()`.
    #[must_use]
    pub fn channel(&self, channel: usize) -> &[f64] {
        self.as_view().channel(channel)
    }

    /// Consume and return one vector per channel.
    #[must_use]
    pub fn into_channels(self) -> Vec<Vec<f64>> {
        self.data.chunks(self.len).map(<[f64]>::to_vec).collect()
    }
}

impl AsRef<[f64]> for Sequence {
    fn as_ref(&self) -> &[f64] {
        &self.data
    }
}

impl TryFrom<Vec<f64>> for Sequence {
    type Error = SeriesError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

/// Borrowed, validated view into a sequence. Zero-copy reference.
#[derive(Debug, Clone, Copy)]
pub struct SequenceView<'a> {
    data: &'a [f64],
    n_channels: usize,
    len: usize,
}

impl<'a> SequenceView<'a> {
    /// Create a univariate view, validating that the slice is non-empty and finite.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SeriesError::EmptySeries`] | `slice` is empty |
    /// | [`SeriesError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(slice: &'a [f64]) -> Result<Self, SeriesError> {
        validate_channel(0, slice)?;
        Ok(Self::new_unchecked(slice))
    }

    /// Create a univariate view without validation. For internal use where data
    /// is already validated.
    pub(crate) fn new_unchecked(slice: &'a [f64]) -> Self {
        Self {
            data: slice,
            n_channels: 1,
            len: slice.len(),
        }
    }

    /// Return the channel-major backing slice.
    #[must_use]
    pub fn as_slice(&self) -> &'a [f64] {
        self.data
    }

    /// Return the number of time steps per channel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return true if the view has no time steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return the number of channels.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Return the values of one channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= n_channels()`.
    #[must_use]
    pub fn channel(&self, channel: usize) -> &'a [f64] {
        assert!(
            channel < self.n_channels,
            "channel {channel} out of range for {} channels",
            self.n_channels
        );
        &self.data[channel * self.len..(channel + 1) * self.len]
    }

    /// Return a univariate view of one channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= n_channels()`.
    #[must_use]
    pub fn channel_view(&self, channel: usize) -> SequenceView<'a> {
        Self::new_unchecked(self.channel(channel))
    }

    /// Return the value at `index` in `channel`.
    #[must_use]
    pub fn value(&self, channel: usize, index: usize) -> f64 {
        self.data[channel * self.len + index]
    }

    /// Squared difference between point `i` of `self` and point `j` of `other`,
    /// summed across channels. Channel counts must already be checked equal.
    #[inline]
    pub(crate) fn point_cost(&self, i: usize, other: &SequenceView<'_>, j: usize) -> f64 {
        if self.n_channels == 1 {
            let d = self.data[i] - other.data[j];
            return (d * d).min(f64::MAX);
        }
        (0..self.n_channels)
            .map(|c| {
                let d = self.data[c * self.len + i] - other.data[c * other.len + j];
                d * d
            })
            .sum::<f64>()
            .min(f64::MAX)
    }

    /// Squared difference between point `i` and the constant `g`, summed across channels.
    #[inline]
    pub(crate) fn gap_cost(&self, i: usize, g: f64) -> f64 {
        (0..self.n_channels)
            .map(|c| {
                let d = self.data[c * self.len + i] - g;
                d * d
            })
            .sum::<f64>()
            .min(f64::MAX)
    }
}

impl AsRef<[f64]> for SequenceView<'_> {
    fn as_ref(&self) -> &[f64] {
        self.data
    }
}

fn validate_channel(channel: usize, values: &[f64]) -> Result<(), SeriesError> {
    if values.is_empty() {
        return Err(SeriesError::EmptySeries);
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(SeriesError::NonFiniteValue { channel, index });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_vec() {
        let result = Sequence::new(vec![]);
        assert!(matches!(result, Err(SeriesError::EmptySeries)));
    }

    #[test]
    fn rejects_nan() {
        let result = Sequence::new(vec![1.0, f64::NAN, 3.0]);
        assert!(matches!(
            result,
            Err(SeriesError::NonFiniteValue { channel: 0, index: 1 })
        ));
    }

    #[test]
    fn rejects_neg_infinity_in_second_channel() {
        let result = Sequence::multivariate(vec![vec![1.0, 2.0], vec![f64::NEG_INFINITY, 2.0]]);
        assert!(matches!(
            result,
            Err(SeriesError::NonFiniteValue { channel: 1, index: 0 })
        ));
    }

    #[test]
    fn rejects_ragged_channels() {
        let result = Sequence::multivariate(vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0]]);
        assert!(matches!(
            result,
            Err(SeriesError::RaggedChannels {
                channel: 1,
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn rejects_zero_channels() {
        let result = Sequence::multivariate(vec![]);
        assert!(matches!(result, Err(SeriesError::NoChannels)));
    }

    #[test]
    fn multivariate_layout_is_channel_major() {
        let seq =
            Sequence::multivariate(vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]]).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.n_channels(), 2);
        assert_eq!(seq.channel(1), &[10.0, 20.0, 30.0]);
        assert_eq!(seq.as_view().value(1, 2), 30.0);
        assert_eq!(seq.as_ref(), &[1.0, 2.0, 3.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn from_flat_splits_evenly() {
        let seq = Sequence::from_flat(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.channel(2), &[5.0, 6.0]);
    }

    #[test]
    fn from_flat_rejects_uneven_split() {
        let result = Sequence::from_flat(vec![1.0, 2.0, 3.0], 2);
        assert!(matches!(
            result,
            Err(SeriesError::UnevenChannelSplit { len: 3, n_channels: 2 })
        ));
    }

    #[test]
    fn view_rejects_empty() {
        let result = SequenceView::new(&[]);
        assert!(matches!(result, Err(SeriesError::EmptySeries)));
    }

    #[test]
    fn point_cost_sums_channels() {
        let a = Sequence::multivariate(vec![vec![0.0, 1.0], vec![0.0, 2.0]]).unwrap();
        let b = Sequence::multivariate(vec![vec![1.0, 1.0], vec![3.0, 2.0]]).unwrap();
        // (0-1)^2 + (0-3)^2
        assert_eq!(a.as_view().point_cost(0, &b.as_view(), 0), 10.0);
        assert_eq!(a.as_view().point_cost(1, &b.as_view(), 1), 0.0);
    }

    #[test]
    fn into_channels_roundtrip() {
        let channels = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let seq = Sequence::multivariate(channels.clone()).unwrap();
        assert_eq!(seq.into_channels(), channels);
    }

    #[test]
    fn try_from_vec() {
        let seq: Result<Sequence, _> = vec![1.0, 2.0].try_into();
        assert!(seq.is_ok());
    }
}
