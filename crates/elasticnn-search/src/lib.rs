//! Nearest-neighbour classification over elastic distances.
//!
//! [`NeighbourSearch`] runs one query against a stream of labelled training
//! sequences, feeding the selector's worst retained distance back into the
//! kernel as the early-abandon cutoff. [`KnnConfig`] and [`KnnModel`] wrap it
//! into a fit/predict classifier with parallel batch prediction.

mod classifier;
mod distribution;
mod error;
mod search;

pub use classifier::{KnnConfig, KnnModel};
pub use distribution::ClassDistribution;
pub use error::SearchError;
pub use search::{Neighbour, NeighbourSearch, Prediction, SearchState};
