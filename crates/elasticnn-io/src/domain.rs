//! Domain types for elasticnn-io.

use std::path::PathBuf;

use elasticnn_distance::Sequence;

use crate::IoError;

/// A sample identifier.
///
/// Wraps a non-empty string parsed from the first column of the input CSV.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleId(String);

impl SampleId {
    /// Create a new sample ID from a non-empty string.
    pub(crate) fn new(id: String) -> Self {
        debug_assert!(!id.is_empty(), "sample ID must not be empty");
        Self(id)
    }

    /// Return the sample ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SampleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dictionary from string class labels to dense class indices.
///
/// Labels are sorted and deduplicated, so index `i` is the `i`-th label in
/// lexicographic order regardless of the order rows appeared in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    /// Build the dictionary from every label occurrence.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = labels.into_iter().map(|l| l.as_ref().to_owned()).collect();
        names.sort_unstable();
        names.dedup();
        Self { names }
    }

    /// Return the class index of a label.
    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.names
            .binary_search_by(|name| name.as_str().cmp(label))
            .ok()
    }

    /// Return the label of a class index.
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Return the number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Return true if the dictionary holds no classes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Return all labels in class index order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A labelled dataset of sequences.
///
/// Produced by [`LabelledCsvReader`](crate::LabelledCsvReader). IDs, labels
/// and sequences are stored in parallel vectors: `ids[i]` carries
/// `labels[i]` and `sequences[i]`.
#[derive(Debug)]
pub struct LabelledDataset {
    /// File the dataset was read from.
    pub source: PathBuf,
    /// Sample identifiers in CSV row order.
    pub ids: Vec<SampleId>,
    /// Raw string labels in the same order as `ids`.
    pub labels: Vec<String>,
    /// Validated sequences in the same order as `ids`.
    pub sequences: Vec<Sequence>,
}

impl LabelledDataset {
    /// Return the number of samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.ids.len()
    }

    /// Return the channel count of the first sequence.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.sequences.first().map_or(0, Sequence::n_channels)
    }

    /// Map every label to its class index.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnknownLabel`] for the first label absent from `classes`.
    pub fn encode_labels(&self, classes: &ClassLabels) -> Result<Vec<usize>, IoError> {
        self.ids
            .iter()
            .zip(&self.labels)
            .map(|(id, label)| {
                classes.index_of(label).ok_or_else(|| IoError::UnknownLabel {
                    path: self.source.clone(),
                    id: id.as_str().to_owned(),
                    label: label.clone(),
                })
            })
            .collect()
    }
}
