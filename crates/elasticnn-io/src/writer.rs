//! JSON writer for classification outputs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use elasticnn_search::Prediction;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::{ClassLabels, ExperimentName, LabelledDataset, SampleId};
use crate::IoError;

/// Settings of the classification run recorded in the artifact header.
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    /// Kernel name, e.g. `dtw` or `erp-i`.
    pub kernel: String,
    /// Number of neighbours.
    pub k: usize,
    /// Base seed of the tie trim.
    pub seed: u64,
}

/// What [`PredictionWriter::write_predictions`] wrote.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    /// Experiment name.
    pub experiment: String,
    /// Location of the artifact.
    pub path: PathBuf,
    /// Number of classified queries.
    pub n_queries: usize,
    /// Queries whose predicted label equals the true label.
    pub n_correct: usize,
    /// `n_correct / n_queries`.
    pub accuracy: f64,
}

/// Writes classification results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_predictions.json`.
pub struct PredictionWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl PredictionWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Return the path of the predictions artifact.
    #[must_use]
    pub fn predictions_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_predictions.json", self.experiment.as_str()))
    }

    /// Write one entry per query to `{experiment}_predictions.json`.
    ///
    /// `predictions[i]` must belong to `queries.ids[i]`; neighbour indices
    /// refer to positions in `train_ids`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::PredictionCountMismatch`] | `predictions.len() != queries.n_samples()` |
    /// | [`IoError::UnknownTrainingIndex`] | A neighbour index is outside `train_ids` |
    /// | [`IoError::UnknownClassIndex`] | A class index is outside `classes` |
    /// | [`IoError::Serialize`] | The artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all, fields(n_queries = queries.n_samples()))]
    pub fn write_predictions(
        &self,
        run: &RunInfo,
        train_ids: &[SampleId],
        queries: &LabelledDataset,
        predictions: &[Prediction],
        classes: &ClassLabels,
    ) -> Result<ArtifactSummary, IoError> {
        if predictions.len() != queries.n_samples() {
            return Err(IoError::PredictionCountMismatch {
                n_queries: queries.n_samples(),
                n_predictions: predictions.len(),
            });
        }
        let path = self.predictions_path();

        let class_name = |index: usize| {
            classes.name(index).ok_or(IoError::UnknownClassIndex {
                index,
                n_classes: classes.len(),
            })
        };

        let mut entries = Vec::with_capacity(predictions.len());
        let mut n_correct = 0;
        let rows = queries.ids.iter().zip(&queries.labels).zip(predictions);
        for ((id, true_label), prediction) in rows {
            let predicted_label = class_name(prediction.predicted_class())?;
            let correct = predicted_label == true_label.as_str();
            n_correct += usize::from(correct);

            let probabilities = prediction
                .distribution()
                .as_slice()
                .iter()
                .enumerate()
                .map(|(class, &p)| class_name(class).map(|name| (name, p)))
                .collect::<Result<BTreeMap<_, _>, IoError>>()?;

            let mut neighbours = Vec::with_capacity(prediction.neighbours().len());
            for neighbour in prediction.neighbours() {
                let train_id = train_ids.get(neighbour.index).ok_or(IoError::UnknownTrainingIndex {
                    index: neighbour.index,
                    n_train: train_ids.len(),
                })?;
                neighbours.push(NeighbourEntry {
                    train_id: train_id.as_str(),
                    label: class_name(neighbour.label)?,
                    distance: neighbour.distance,
                });
            }

            entries.push(PredictionEntry {
                id: id.as_str(),
                true_label,
                predicted_label,
                correct,
                probabilities,
                neighbours,
            });
        }

        let n_queries = entries.len();
        let accuracy = if n_queries == 0 {
            0.0
        } else {
            n_correct as f64 / n_queries as f64
        };

        let artifact = PredictionsArtifact {
            experiment: self.experiment.as_str(),
            run,
            classes: classes.names(),
            n_queries,
            n_correct,
            accuracy,
            predictions: entries,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), accuracy, "predictions written");
        Ok(ArtifactSummary {
            experiment: self.experiment.as_str().to_owned(),
            path,
            n_queries,
            n_correct,
            accuracy,
        })
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct PredictionsArtifact<'a> {
    experiment: &'a str,
    run: &'a RunInfo,
    classes: &'a [String],
    n_queries: usize,
    n_correct: usize,
    accuracy: f64,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    id: &'a str,
    true_label: &'a str,
    predicted_label: &'a str,
    correct: bool,
    probabilities: BTreeMap<&'a str, f64>,
    neighbours: Vec<NeighbourEntry<'a>>,
}

#[derive(Serialize)]
struct NeighbourEntry<'a> {
    train_id: &'a str,
    label: &'a str,
    distance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use elasticnn_distance::{KernelSpec, Sequence};
    use elasticnn_search::KnnConfig;
    use tempfile::TempDir;

    fn ids(prefix: &str, n: usize) -> Vec<SampleId> {
        (0..n).map(|i| SampleId::new(format!("{prefix}{i}"))).collect()
    }

    fn run() -> RunInfo {
        RunInfo {
            kernel: "dtw".into(),
            k: 1,
            seed: 0,
        }
    }

    /// Training set of two flat sequences (`high`, `low`) and three queries.
    fn fixture() -> (Vec<SampleId>, LabelledDataset, Vec<Prediction>, ClassLabels) {
        let train = vec![
            Sequence::new(vec![10.0; 4]).unwrap(),
            Sequence::new(vec![0.0; 4]).unwrap(),
        ];
        let classes = ClassLabels::from_labels(["low", "high"]);
        let train_labels = vec![0, 1];
        let model = KnnConfig::new(1, KernelSpec::dtw())
            .unwrap()
            .fit(train, train_labels, classes.len())
            .unwrap();

        let queries = LabelledDataset {
            source: PathBuf::from("queries.csv"),
            ids: ids("q", 3),
            labels: vec!["low".into(); 3],
            sequences: vec![
                Sequence::new(vec![9.0; 4]).unwrap(),
                Sequence::new(vec![1.0; 4]).unwrap(),
                Sequence::new(vec![2.0; 4]).unwrap(),
            ],
        };
        let predictions = model.predict_batch(&queries.sequences).unwrap();
        (ids("t", 2), queries, predictions, classes)
    }

    #[test]
    fn predictions_json_structure() {
        let dir = TempDir::new().unwrap();
        let experiment = ExperimentName::new("test_run".into()).unwrap();
        let writer = PredictionWriter::new(dir.path(), experiment).unwrap();
        let (train_ids, queries, predictions, classes) = fixture();

        let summary = writer
            .write_predictions(&run(), &train_ids, &queries, &predictions, &classes)
            .unwrap();

        let path = dir.path().join("test_run_predictions.json");
        assert_eq!(summary.path, path);
        assert!(path.exists());

        let content: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content["experiment"], "test_run");
        assert_eq!(content["run"]["kernel"], "dtw");
        assert_eq!(content["run"]["k"], 1);
        assert_eq!(content["classes"], serde_json::json!(["high", "low"]));
        assert_eq!(content["n_queries"], 3);

        let entries = content["predictions"].as_array().unwrap();
        assert_eq!(entries.len(), 3);
        let first = &entries[0];
        assert_eq!(first["id"], "q0");
        assert_eq!(first["true_label"], "low");
        assert_eq!(first["predicted_label"], "high");
        assert_eq!(first["correct"], false);
        assert_eq!(first["probabilities"]["high"], 1.0);
        assert_eq!(first["probabilities"]["low"], 0.0);
        let neighbours = first["neighbours"].as_array().unwrap();
        assert_eq!(neighbours.len(), 1);
        assert_eq!(neighbours[0]["train_id"], "t0");
        assert_eq!(neighbours[0]["label"], "high");
        assert_eq!(neighbours[0]["distance"], 4.0);
    }

    #[test]
    fn accuracy_counts_matching_labels() {
        let dir = TempDir::new().unwrap();
        let experiment = ExperimentName::new("acc".into()).unwrap();
        let writer = PredictionWriter::new(dir.path(), experiment).unwrap();
        let (train_ids, queries, predictions, classes) = fixture();

        let summary = writer
            .write_predictions(&run(), &train_ids, &queries, &predictions, &classes)
            .unwrap();

        // q0 is labelled low but sits next to the high sequence.
        assert_eq!(summary.n_queries, 3);
        assert_eq!(summary.n_correct, 2);
        assert!((summary.accuracy - 2.0 / 3.0).abs() < 1e-10);
        assert_eq!(summary.experiment, "acc");
    }

    #[test]
    fn prediction_count_mismatch() {
        let dir = TempDir::new().unwrap();
        let experiment = ExperimentName::new("mismatch".into()).unwrap();
        let writer = PredictionWriter::new(dir.path(), experiment).unwrap();
        let (train_ids, queries, predictions, classes) = fixture();

        let result =
            writer.write_predictions(&run(), &train_ids, &queries, &predictions[..2], &classes);
        assert!(matches!(
            result,
            Err(IoError::PredictionCountMismatch {
                n_queries: 3,
                n_predictions: 2
            })
        ));
    }

    #[test]
    fn missing_training_id_is_an_error() {
        let dir = TempDir::new().unwrap();
        let experiment = ExperimentName::new("short_ids".into()).unwrap();
        let writer = PredictionWriter::new(dir.path(), experiment).unwrap();
        let (train_ids, queries, predictions, classes) = fixture();

        let result =
            writer.write_predictions(&run(), &train_ids[..1], &queries, &predictions, &classes);
        assert!(matches!(
            result,
            Err(IoError::UnknownTrainingIndex { index: 1, n_train: 1 })
        ));
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let experiment = ExperimentName::new("nested".into()).unwrap();
        let writer = PredictionWriter::new(&nested, experiment).unwrap();
        assert!(nested.is_dir());
        assert_eq!(writer.predictions_path(), nested.join("nested_predictions.json"));
    }
}
