//! Error types for sequence validation, kernel configuration and distance calls.

/// Errors from constructing or transforming a [`Sequence`](crate::Sequence).
#[derive(Debug, thiserror::Error)]
pub enum SeriesError {
    /// Returned when a channel has no time steps.
    #[error("time series must be non-empty")]
    EmptySeries,

    /// Returned when a multivariate sequence is built from zero channels.
    #[error("sequence must have at least one channel")]
    NoChannels,

    /// Returned when a value is NaN, infinity, or negative infinity.
    #[error("time series contains non-finite value at channel {channel}, index {index}")]
    NonFiniteValue {
        /// Channel holding the offending value.
        channel: usize,
        /// Position of the first non-finite value found in that channel.
        index: usize,
    },

    /// Returned when the channels of a multivariate sequence differ in length.
    #[error("channel {channel} has length {got}, expected {expected}")]
    RaggedChannels {
        /// Channel whose length differs from channel 0.
        channel: usize,
        /// Length of channel 0.
        expected: usize,
        /// Length of the offending channel.
        got: usize,
    },

    /// Returned when a flat buffer cannot be split into equal channels.
    #[error("{len} values cannot be split into {n_channels} equal channels")]
    UnevenChannelSplit {
        /// Total number of values.
        len: usize,
        /// Requested channel count.
        n_channels: usize,
    },

    /// Returned when z-normalizing a channel with zero variance.
    #[error("cannot z-normalize constant channel {channel} (all values equal {value})")]
    ConstantChannel {
        /// The constant channel.
        channel: usize,
        /// The value every time step holds.
        value: f64,
    },

    /// Returned when the derivative transform is applied to fewer than 3 time steps.
    #[error("derivative needs at least 3 time steps, got {len}")]
    TooShortForDerivative {
        /// Length of the sequence.
        len: usize,
    },
}

/// Errors from validating kernel parameters. Raised at construction, never per call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Returned when an absolute warping radius is below -1.
    #[error("warping radius must be -1 (full window) or non-negative, got {radius}")]
    InvalidRadius {
        /// The rejected radius.
        radius: i64,
    },

    /// Returned when a fractional window is outside `[0, 1]` or NaN.
    #[error("warping window fraction must be in [0, 1], got {fraction}")]
    InvalidFraction {
        /// The rejected fraction.
        fraction: f64,
    },

    /// Returned when the ERP gap value is negative or non-finite.
    #[error("ERP gap penalty must be finite and non-negative, got {g}")]
    InvalidPenalty {
        /// The rejected gap value.
        g: f64,
    },

    /// Returned when the WDTW weight steepness is negative or non-finite.
    #[error("WDTW steepness must be finite and non-negative, got {g}")]
    InvalidSteepness {
        /// The rejected steepness.
        g: f64,
    },
}

/// Errors surfaced by a single distance computation.
///
/// Pruning is not an error: an abandoned comparison returns
/// [`Distance::EXCEEDED`](crate::Distance::EXCEEDED).
#[derive(Debug, thiserror::Error)]
pub enum DistanceError {
    /// Returned when the cutoff is negative or NaN.
    #[error("cutoff must be non-negative, got {cutoff}")]
    InvalidCutoff {
        /// The rejected cutoff.
        cutoff: f64,
    },

    /// Returned when a kernel that requires equal lengths receives unequal sequences.
    #[error("sequence lengths differ: {a} vs {b}")]
    LengthMismatch {
        /// Length of the first sequence.
        a: usize,
        /// Length of the second sequence.
        b: usize,
    },

    /// Returned when the two sequences have different channel counts.
    #[error("channel counts differ: {a} vs {b}")]
    ChannelMismatch {
        /// Channel count of the first sequence.
        a: usize,
        /// Channel count of the second sequence.
        b: usize,
    },
}
