//! Dataset reading, label encoding and prediction artifacts for elasticnn.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ClassLabels, ExperimentName, LabelledDataset, SampleId};
pub use error::IoError;
pub use reader::LabelledCsvReader;
pub use writer::{ArtifactSummary, PredictionWriter, RunInfo};
