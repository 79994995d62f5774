use elasticnn_distance::{ConfigError, DistanceError};
use elasticnn_select::SelectError;

/// Errors from nearest-neighbour search and the classifier built on it.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Returned when the neighbour count is zero.
    #[error("k must be at least 1, got {k}")]
    InvalidK {
        /// The invalid k value provided.
        k: usize,
    },

    /// Returned when the class count is zero.
    #[error("number of classes must be at least 1")]
    ZeroClasses,

    /// Returned when fitting on zero training sequences.
    #[error("training set must contain at least one sequence")]
    EmptyTrainingSet,

    /// Returned when scoring an empty query set.
    #[error("query set must contain at least one sequence")]
    EmptyQuerySet,

    /// Returned when sequences and labels differ in count.
    #[error("got {n_sequences} sequences but {n_labels} labels")]
    LabelCountMismatch {
        /// Number of sequences provided.
        n_sequences: usize,
        /// Number of labels provided.
        n_labels: usize,
    },

    /// Returned when a label is not a valid class index.
    #[error("label {label} out of range for {n_classes} classes")]
    LabelOutOfRange {
        /// The offending label.
        label: usize,
        /// Number of classes.
        n_classes: usize,
    },

    /// Returned when a training sequence has a different channel count than the first.
    #[error("training sequence {index} has {got} channels, expected {expected}")]
    ChannelMismatch {
        /// Index of the offending training sequence.
        index: usize,
        /// Channel count of training sequence 0.
        expected: usize,
        /// Channel count of the offending sequence.
        got: usize,
    },

    /// Returned when a search is finalized without retaining any neighbour.
    #[error("no neighbours were retained; the training set is empty")]
    NoNeighbours,

    /// Returned when a finalized search is fed or finalized again.
    #[error("search already finalized")]
    AlreadyFinalized,

    /// Returned when test sequences and test labels differ in count.
    #[error("got {n_queries} queries but {n_labels} labels")]
    QueryLabelMismatch {
        /// Number of queries provided.
        n_queries: usize,
        /// Number of labels provided.
        n_labels: usize,
    },

    /// Wraps an invalid selector configuration.
    #[error(transparent)]
    Select(#[from] SelectError),

    /// Wraps a per-call distance failure (shape mismatch).
    #[error(transparent)]
    Distance(#[from] DistanceError),

    /// Wraps an invalid kernel configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
