//! Labelled CSV dataset reader with full input validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use elasticnn_distance::Sequence;
use tracing::{debug, info, instrument};

use crate::domain::{LabelledDataset, SampleId};
use crate::IoError;

/// Reads a labelled sequence dataset from a CSV file.
///
/// Expected CSV format:
/// - Header row required: `id,label,v0,v1,...,vn`
/// - One row per sample, all rows must have the same number of columns
/// - With `C` channels the value columns are split into `C` contiguous,
///   equal-length channels (`v0..v{n/C}` is channel 0, and so on)
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingValueColumns`] | Header has fewer than three columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::EmptyField`] | Blank id or label |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::DuplicateId`] | Same id appears twice |
/// | [`IoError::ChannelSplit`] | Value count not divisible by the channel count |
pub struct LabelledCsvReader {
    path: PathBuf,
    n_channels: usize,
}

impl LabelledCsvReader {
    /// Create a new univariate reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            n_channels: 1,
        }
    }

    /// Split each row into `n_channels` channels.
    #[must_use]
    pub fn with_channels(mut self, n_channels: usize) -> Self {
        self.n_channels = n_channels;
        self
    }

    /// Read and validate the CSV file, returning a [`LabelledDataset`].
    #[instrument(skip(self), fields(path = %self.path.display(), n_channels = self.n_channels))]
    pub fn read(&self) -> Result<LabelledDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets InconsistentRowLength fire instead of a generic CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let expected_cols = header.len();
        if expected_cols < 3 {
            return Err(IoError::MissingValueColumns {
                path: self.path.clone(),
                got: expected_cols,
            });
        }
        debug!(expected_cols, "read CSV header");

        let mut ids = Vec::new();
        let mut labels = Vec::new();
        let mut sequences = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            let id = record.get(0).unwrap_or("").trim().to_string();
            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    id,
                    expected: expected_cols,
                    got: record.len(),
                });
            }
            if id.is_empty() {
                return Err(self.empty_field(row_index, "id"));
            }
            let label = record.get(1).unwrap_or("").trim().to_string();
            if label.is_empty() {
                return Err(self.empty_field(row_index, "label"));
            }

            if let Some(&first_row) = seen.get(&id) {
                return Err(IoError::DuplicateId {
                    path: self.path.clone(),
                    id,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(id.clone(), row_index);

            let mut values = Vec::with_capacity(expected_cols - 2);
            for (col_index, raw) in record.iter().skip(2).enumerate() {
                let value = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        col_index,
                        raw: raw.to_string(),
                    })?;
                values.push(value);
            }

            let sequence = Sequence::from_flat(values, self.n_channels).map_err(|e| {
                IoError::ChannelSplit {
                    path: self.path.clone(),
                    row_index,
                    id: id.clone(),
                    source: e,
                }
            })?;

            ids.push(SampleId::new(id));
            labels.push(label);
            sequences.push(sequence);
        }

        if ids.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_samples = ids.len(),
            n_timesteps = sequences.first().map_or(0, Sequence::len),
            "dataset loaded"
        );

        Ok(LabelledDataset {
            source: self.path.clone(),
            ids,
            labels,
            sequences,
        })
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }

    fn empty_field(&self, row_index: usize, field: &'static str) -> IoError {
        IoError::EmptyField {
            path: self.path.clone(),
            row_index,
            field,
        }
    }
}
