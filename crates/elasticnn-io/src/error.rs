//! I/O error types for elasticnn-io.

use std::path::PathBuf;

use elasticnn_distance::SeriesError;

/// Errors from file I/O, CSV parsing, label encoding and artifact serialization.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when the header has no value columns after `id,label`.
    #[error("header of {path} has {got} columns, expected id, label and at least one value")]
    MissingValueColumns {
        /// Path to the CSV file.
        path: PathBuf,
        /// Number of header columns.
        got: usize,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error(
        "inconsistent row length in {path}: row {row_index} (id {id}) has {got} columns, \
         expected {expected}"
    )]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Sample ID of the offending row.
        id: String,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when the id or label cell of a row is blank.
    #[error("empty {field} in {path}: row {row_index}")]
    EmptyField {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Which field was blank (`id` or `label`).
        field: &'static str,
    },

    /// Returned when a cell value is NaN, Inf, or otherwise not a finite float.
    #[error("non-finite value in {path}: row {row_index}, column {col_index}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Zero-based column index (excluding the id and label columns).
        col_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when the same sample ID appears more than once.
    #[error(
        "duplicate sample ID \"{id}\" in {path}: first at row {first_row}, \
         again at row {second_row}"
    )]
    DuplicateId {
        /// Path to the CSV file.
        path: PathBuf,
        /// The duplicated ID.
        id: String,
        /// Zero-based row index of the first occurrence.
        first_row: usize,
        /// Zero-based row index of the second occurrence.
        second_row: usize,
    },

    /// Returned when a row's values cannot be split into the requested channels.
    #[error("cannot build sequence for row {row_index} (id {id}) in {path}")]
    ChannelSplit {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Sample ID of the offending row.
        id: String,
        /// Underlying sequence error.
        source: SeriesError,
    },

    /// Returned when a label is absent from the class dictionary.
    #[error("unknown label \"{label}\" for sample {id} in {path}")]
    UnknownLabel {
        /// Path of the dataset holding the sample.
        path: PathBuf,
        /// Sample ID carrying the label.
        id: String,
        /// The unrecognised label.
        label: String,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the number of predictions differs from the number of queries.
    #[error("{n_predictions} predictions for {n_queries} queries")]
    PredictionCountMismatch {
        /// Number of query samples.
        n_queries: usize,
        /// Number of predictions supplied.
        n_predictions: usize,
    },

    /// Returned when a neighbour refers to a training index with no known ID.
    #[error("neighbour index {index} out of range for {n_train} training samples")]
    UnknownTrainingIndex {
        /// The offending index.
        index: usize,
        /// Number of training IDs supplied.
        n_train: usize,
    },

    /// Returned when a class index has no entry in the class dictionary.
    #[error("class index {index} out of range for {n_classes} classes")]
    UnknownClassIndex {
        /// The offending index.
        index: usize,
        /// Number of known classes.
        n_classes: usize,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an artifact cannot be serialized.
    #[error("cannot serialize artifact for {path}")]
    Serialize {
        /// Destination of the artifact.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
