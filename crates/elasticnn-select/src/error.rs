/// Errors from configuring a [`BestKSelector`](crate::BestKSelector).
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// Returned when the retention limit is zero.
    #[error("selector limit must be at least 1, got {limit}")]
    InvalidLimit {
        /// The invalid limit provided.
        limit: usize,
    },
}
