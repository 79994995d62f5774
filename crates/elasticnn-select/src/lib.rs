//! Bounded best-K selection over a stream of scored items.
//!
//! Items sharing a key form a draw group. Draw groups at the retention
//! boundary are kept whole while streaming and trimmed only once, on
//! finalization, with a seedable random source.

mod error;
mod selection;
mod selector;

pub use error::SelectError;
pub use selection::Selection;
pub use selector::{BestKSelector, DiscardPolicy, Retain};
