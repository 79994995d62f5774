//! Fit/predict k-nearest-neighbour classifier.

use elasticnn_distance::{ChannelMode, DistanceKernel, KernelSpec, Sequence, SequenceView};
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tracing::{info, instrument, warn};

use crate::distribution::ClassDistribution;
use crate::error::SearchError;
use crate::search::{NeighbourSearch, Prediction};

/// Configuration for a k-nearest-neighbour classifier.
///
/// Construct via [`KnnConfig::new`], then chain `with_*` methods to override defaults.
///
/// # Defaults
///
/// | Parameter       | Default                     |
/// |-----------------|-----------------------------|
/// | `channel_mode`  | [`ChannelMode::Dependent`]  |
/// | `seed`          | 42                          |
/// | `early_abandon` | true                        |
#[derive(Debug, Clone)]
pub struct KnnConfig {
    k: usize,
    spec: KernelSpec,
    channel_mode: ChannelMode,
    seed: u64,
    early_abandon: bool,
}

impl KnnConfig {
    /// Create a configuration with the given neighbour count and kernel.
    ///
    /// The kernel parameters are validated here so that a bad window or
    /// penalty fails before any data is touched.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::InvalidK`] | `k` is zero |
    /// | [`SearchError::Config`] | The kernel parameters are invalid |
    pub fn new(k: usize, spec: KernelSpec) -> Result<Self, SearchError> {
        if k == 0 {
            return Err(SearchError::InvalidK { k });
        }
        spec.build(ChannelMode::Dependent)?;
        Ok(Self {
            k,
            spec,
            channel_mode: ChannelMode::Dependent,
            seed: 42,
            early_abandon: true,
        })
    }

    /// Set how multi-channel sequences are aligned.
    #[must_use]
    pub fn with_channel_mode(mut self, channel_mode: ChannelMode) -> Self {
        self.channel_mode = channel_mode;
        self
    }

    /// Set the seed for tie-breaking among equidistant neighbours.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable cutoff propagation into the kernel.
    #[must_use]
    pub fn with_early_abandon(mut self, early_abandon: bool) -> Self {
        self.early_abandon = early_abandon;
        self
    }

    /// Return the neighbour count.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Return the kernel specification.
    #[must_use]
    pub fn spec(&self) -> KernelSpec {
        self.spec
    }

    /// Return the channel mode.
    #[must_use]
    pub fn channel_mode(&self) -> ChannelMode {
        self.channel_mode
    }

    /// Return the tie-breaking seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return whether cutoff propagation is enabled.
    #[must_use]
    pub fn early_abandon(&self) -> bool {
        self.early_abandon
    }

    /// Store a labelled training set and build the kernel.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::ZeroClasses`] | `n_classes` is zero |
    /// | [`SearchError::EmptyTrainingSet`] | `sequences` is empty |
    /// | [`SearchError::LabelCountMismatch`] | `sequences.len() != labels.len()` |
    /// | [`SearchError::LabelOutOfRange`] | A label is `>= n_classes` |
    /// | [`SearchError::ChannelMismatch`] | Training sequences differ in channel count |
    #[instrument(skip(self, sequences, labels), fields(n_train = sequences.len()))]
    pub fn fit(
        &self,
        sequences: Vec<Sequence>,
        labels: Vec<usize>,
        n_classes: usize,
    ) -> Result<KnnModel, SearchError> {
        if n_classes == 0 {
            return Err(SearchError::ZeroClasses);
        }
        let Some(first) = sequences.first() else {
            return Err(SearchError::EmptyTrainingSet);
        };
        if sequences.len() != labels.len() {
            return Err(SearchError::LabelCountMismatch {
                n_sequences: sequences.len(),
                n_labels: labels.len(),
            });
        }
        if let Some(&label) = labels.iter().find(|&&label| label >= n_classes) {
            return Err(SearchError::LabelOutOfRange { label, n_classes });
        }
        let expected = first.n_channels();
        if let Some((index, seq)) = sequences
            .iter()
            .enumerate()
            .find(|(_, seq)| seq.n_channels() != expected)
        {
            return Err(SearchError::ChannelMismatch {
                index,
                expected,
                got: seq.n_channels(),
            });
        }

        let kernel = self.spec.build(self.channel_mode)?;
        if sequences.len() < self.k {
            warn!(
                n_train = sequences.len(),
                k = self.k,
                "training set smaller than k; predictions will use every sequence"
            );
        }
        info!(
            kernel = %kernel.name(),
            k = self.k,
            n_classes,
            n_channels = expected,
            "knn model fitted"
        );

        Ok(KnnModel {
            config: self.clone(),
            kernel,
            sequences,
            labels,
            n_classes,
        })
    }
}

/// A fitted k-nearest-neighbour classifier. Read-only; safe to share across threads.
#[derive(Debug)]
pub struct KnnModel {
    config: KnnConfig,
    kernel: Box<dyn DistanceKernel>,
    sequences: Vec<Sequence>,
    labels: Vec<usize>,
    n_classes: usize,
}

impl KnnModel {
    /// Run a full neighbour search for one query, returning neighbours and statistics.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Distance`] when the query shape does not fit the kernel.
    pub fn predict_detailed(&self, query: SequenceView<'_>) -> Result<Prediction, SearchError> {
        self.search(query, self.config.seed)
    }

    /// Predict the class index for one query.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Distance`] when the query shape does not fit the kernel.
    pub fn predict(&self, query: SequenceView<'_>) -> Result<usize, SearchError> {
        Ok(self.predict_detailed(query)?.predicted_class())
    }

    /// Return the class probability distribution for one query.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Distance`] when the query shape does not fit the kernel.
    pub fn predict_proba(&self, query: SequenceView<'_>) -> Result<ClassDistribution, SearchError> {
        Ok(self.predict_detailed(query)?.into_distribution())
    }

    /// Predict a batch of queries in parallel.
    ///
    /// Query `i` breaks ties with seed `seed + i`, so the output does not depend
    /// on the thread count.
    ///
    /// # Errors
    ///
    /// Returns the first [`SearchError`] encountered.
    #[instrument(skip(self, queries), fields(n_queries = queries.len()))]
    pub fn predict_batch(&self, queries: &[Sequence]) -> Result<Vec<Prediction>, SearchError> {
        let predictions: Vec<Prediction> = queries
            .par_iter()
            .enumerate()
            .map(|(i, query)| self.search(query.as_view(), self.config.seed.wrapping_add(i as u64)))
            .collect::<Result<_, _>>()?;

        let compared: usize = predictions.iter().map(Prediction::n_compared).sum();
        let abandoned: usize = predictions.iter().map(Prediction::n_abandoned).sum();
        info!(
            n_queries = queries.len(),
            compared,
            abandoned,
            "batch prediction complete"
        );
        Ok(predictions)
    }

    /// Classify a labelled test set and return the fraction predicted correctly.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::QueryLabelMismatch`] | `queries.len() != labels.len()` |
    /// | [`SearchError::EmptyQuerySet`] | `queries` is empty |
    /// | [`SearchError::Distance`] | A query shape does not fit the kernel |
    pub fn accuracy(&self, queries: &[Sequence], labels: &[usize]) -> Result<f64, SearchError> {
        if queries.len() != labels.len() {
            return Err(SearchError::QueryLabelMismatch {
                n_queries: queries.len(),
                n_labels: labels.len(),
            });
        }
        if queries.is_empty() {
            return Err(SearchError::EmptyQuerySet);
        }
        let predictions = self.predict_batch(queries)?;
        let correct = predictions
            .iter()
            .zip(labels)
            .filter(|&(prediction, &label)| prediction.predicted_class() == label)
            .count();
        Ok(correct as f64 / queries.len() as f64)
    }

    /// Return the configuration this model was fitted with.
    #[must_use]
    pub fn config(&self) -> &KnnConfig {
        &self.config
    }

    /// Return the kernel.
    #[must_use]
    pub fn kernel(&self) -> &dyn DistanceKernel {
        self.kernel.as_ref()
    }

    /// Return the number of training sequences.
    #[must_use]
    pub fn n_train(&self) -> usize {
        self.sequences.len()
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn search(&self, query: SequenceView<'_>, seed: u64) -> Result<Prediction, SearchError> {
        let mut search =
            NeighbourSearch::new(self.kernel.as_ref(), query, self.config.k, self.n_classes, seed)?
                .with_early_abandon(self.config.early_abandon);
        for (index, (candidate, &label)) in self.sequences.iter().zip(&self.labels).enumerate() {
            search.offer(index, candidate.as_view(), label)?;
        }
        search.finalize()
    }
}

#[cfg(test)]
mod tests {
    use elasticnn_distance::Window;

    use super::*;

    fn seq(values: &[f64]) -> Sequence {
        Sequence::new(values.to_vec()).unwrap()
    }

    fn toy_model(config: &KnnConfig) -> KnnModel {
        let train = vec![
            seq(&[0.0, 0.0, 0.0, 0.0]),
            seq(&[0.0, 0.5, 0.0, 0.5]),
            seq(&[10.0, 10.0, 10.0, 10.0]),
            seq(&[9.5, 10.0, 9.5, 10.0]),
        ];
        config.fit(train, vec![0, 0, 1, 1], 2).unwrap()
    }

    #[test]
    fn config_defaults() {
        let config = KnnConfig::new(1, KernelSpec::dtw()).unwrap();
        assert_eq!(config.k(), 1);
        assert_eq!(config.seed(), 42);
        assert_eq!(config.channel_mode(), ChannelMode::Dependent);
        assert!(config.early_abandon());
    }

    #[test]
    fn config_rejects_bad_parameters() {
        assert!(matches!(
            KnnConfig::new(0, KernelSpec::dtw()),
            Err(SearchError::InvalidK { k: 0 })
        ));
        let bad = KernelSpec::Erp {
            window: Window::Full,
            g: -1.0,
        };
        assert!(matches!(KnnConfig::new(1, bad), Err(SearchError::Config(_))));
    }

    #[test]
    fn fit_validates_training_set() {
        let config = KnnConfig::new(1, KernelSpec::dtw()).unwrap();
        assert!(matches!(
            config.fit(vec![], vec![], 2),
            Err(SearchError::EmptyTrainingSet)
        ));
        assert!(matches!(
            config.fit(vec![seq(&[1.0])], vec![0, 1], 2),
            Err(SearchError::LabelCountMismatch { .. })
        ));
        assert!(matches!(
            config.fit(vec![seq(&[1.0])], vec![3], 2),
            Err(SearchError::LabelOutOfRange { label: 3, n_classes: 2 })
        ));
        let mixed = vec![
            seq(&[1.0, 2.0]),
            Sequence::multivariate(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap(),
        ];
        assert!(matches!(
            config.fit(mixed, vec![0, 1], 2),
            Err(SearchError::ChannelMismatch { index: 1, expected: 1, got: 2 })
        ));
    }

    #[test]
    fn predicts_nearest_class() {
        let model = toy_model(&KnnConfig::new(1, KernelSpec::dtw()).unwrap());
        assert_eq!(model.predict(seq(&[1.0, 1.0, 1.0, 1.0]).as_view()).unwrap(), 0);
        assert_eq!(model.predict(seq(&[8.0, 9.0, 8.0, 9.0]).as_view()).unwrap(), 1);
    }

    #[test]
    fn predict_proba_with_k_two() {
        let model = toy_model(&KnnConfig::new(2, KernelSpec::wdtw()).unwrap());
        let proba = model.predict_proba(seq(&[0.0, 0.2, 0.0, 0.2]).as_view()).unwrap();
        assert_eq!(proba.as_slice(), &[1.0, 0.0]);
    }

    #[test]
    fn batch_matches_single_for_first_query() {
        let model = toy_model(&KnnConfig::new(1, KernelSpec::erp()).unwrap());
        let queries = vec![seq(&[0.1, 0.1, 0.1, 0.1]), seq(&[10.0, 9.0, 10.0, 9.0])];
        let batch = model.predict_batch(&queries).unwrap();
        let single = model.predict_detailed(queries[0].as_view()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].predicted_class(), single.predicted_class());
        assert_eq!(batch[0].neighbours(), single.neighbours());
        assert_eq!(batch[1].predicted_class(), 1);
    }

    #[test]
    fn early_abandon_does_not_change_predictions() {
        let on = KnnConfig::new(3, KernelSpec::dtw()).unwrap();
        let off = on.clone().with_early_abandon(false);
        let queries = vec![seq(&[0.3, 0.2, 0.1, 0.0]), seq(&[9.0, 9.0, 9.0, 9.0])];
        let a = toy_model(&on).predict_batch(&queries).unwrap();
        let b = toy_model(&off).predict_batch(&queries).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.distribution(), y.distribution());
            assert_eq!(x.neighbours(), y.neighbours());
            assert!(x.n_abandoned() >= y.n_abandoned());
        }
    }

    #[test]
    fn accuracy_counts_correct_predictions() {
        let model = toy_model(&KnnConfig::new(1, KernelSpec::dtw()).unwrap());
        let queries = vec![seq(&[0.0; 4]), seq(&[10.0; 4]), seq(&[10.0; 4])];
        let acc = model.accuracy(&queries, &[0, 1, 0]).unwrap();
        assert!((acc - 2.0 / 3.0).abs() < 1e-10);
        assert!(matches!(
            model.accuracy(&queries, &[0]),
            Err(SearchError::QueryLabelMismatch { .. })
        ));
    }

    #[test]
    fn accuracy_rejects_empty_query_set() {
        let model = toy_model(&KnnConfig::new(1, KernelSpec::dtw()).unwrap());
        let result = model.accuracy(&[], &[]);
        assert!(matches!(result, Err(SearchError::EmptyQuerySet)));
        assert_eq!(
            result.unwrap_err().to_string(),
            "query set must contain at least one sequence"
        );
    }

    #[test]
    fn independent_mode_is_used() {
        let config = KnnConfig::new(1, KernelSpec::dtw())
            .unwrap()
            .with_channel_mode(ChannelMode::Independent);
        let train = vec![
            Sequence::multivariate(vec![vec![0.0, 0.0], vec![0.0, 0.0]]).unwrap(),
            Sequence::multivariate(vec![vec![5.0, 5.0], vec![5.0, 5.0]]).unwrap(),
        ];
        let model = config.fit(train, vec![0, 1], 2).unwrap();
        assert_eq!(model.kernel().name(), "dtw-i");
        let query = Sequence::multivariate(vec![vec![4.0, 4.0], vec![6.0, 5.0]]).unwrap();
        assert_eq!(model.predict(query.as_view()).unwrap(), 1);
    }
}
