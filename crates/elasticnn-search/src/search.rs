//! Per-query nearest-neighbour search with cutoff propagation.

use elasticnn_distance::{Distance, DistanceKernel, SequenceView};
use elasticnn_select::BestKSelector;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::distribution::ClassDistribution;
use crate::error::SearchError;

/// Lifecycle of a [`NeighbourSearch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// Created, no candidate offered yet.
    Init,
    /// At least one candidate offered.
    Scanning,
    /// [`NeighbourSearch::finalize`] has run; the search accepts nothing further.
    Finalized,
}

/// A retained training sequence.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Neighbour {
    /// Position of the sequence in the training set.
    pub index: usize,
    /// Class index of the sequence.
    pub label: usize,
    /// Distance from the query.
    pub distance: f64,
}

/// Result of one query.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Prediction {
    predicted_class: usize,
    distribution: ClassDistribution,
    neighbours: Vec<Neighbour>,
    n_compared: usize,
    n_abandoned: usize,
}

impl Prediction {
    /// Return the predicted class index. Probability ties were broken with
    /// the query's seed.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        self.predicted_class
    }

    /// Return the class probability distribution.
    #[must_use]
    pub fn distribution(&self) -> &ClassDistribution {
        &self.distribution
    }

    /// Return the retained neighbours, nearest first.
    #[must_use]
    pub fn neighbours(&self) -> &[Neighbour] {
        &self.neighbours
    }

    /// Return the number of kernel calls made.
    #[must_use]
    pub fn n_compared(&self) -> usize {
        self.n_compared
    }

    /// Return the number of kernel calls that were abandoned against the cutoff.
    #[must_use]
    pub fn n_abandoned(&self) -> usize {
        self.n_abandoned
    }

    /// Consume into the class distribution.
    #[must_use]
    pub fn into_distribution(self) -> ClassDistribution {
        self.distribution
    }
}

/// Finds the `k` nearest training sequences to one query.
///
/// Every candidate is compared with `cutoff = worst retained distance` once
/// `k` neighbours are held, and with `+inf` before that. Candidates the kernel
/// abandons are dropped without being stored.
#[derive(Debug)]
pub struct NeighbourSearch<'a, D: ?Sized> {
    kernel: &'a D,
    query: SequenceView<'a>,
    selector: BestKSelector<Distance, (usize, usize)>,
    tie_rng: ChaCha8Rng,
    n_classes: usize,
    early_abandon: bool,
    state: SearchState,
    n_compared: usize,
    n_abandoned: usize,
}

impl<'a, D: DistanceKernel + ?Sized> NeighbourSearch<'a, D> {
    /// Create a search for `query` retaining `k` neighbours over `n_classes` classes.
    ///
    /// `seed` drives the random trim of distance ties at the k-th position and
    /// the choice between classes with equal vote shares.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::InvalidK`] | `k` is zero |
    /// | [`SearchError::ZeroClasses`] | `n_classes` is zero |
    pub fn new(
        kernel: &'a D,
        query: SequenceView<'a>,
        k: usize,
        n_classes: usize,
        seed: u64,
    ) -> Result<Self, SearchError> {
        if k == 0 {
            return Err(SearchError::InvalidK { k });
        }
        if n_classes == 0 {
            return Err(SearchError::ZeroClasses);
        }
        let selector = BestKSelector::new(k, ChaCha8Rng::seed_from_u64(seed))?;
        let mut tie_rng = ChaCha8Rng::seed_from_u64(seed);
        tie_rng.set_stream(1);
        Ok(Self {
            kernel,
            query,
            selector,
            tie_rng,
            n_classes,
            early_abandon: true,
            state: SearchState::Init,
            n_compared: 0,
            n_abandoned: 0,
        })
    }

    /// Enable or disable cutoff propagation. When disabled every candidate is
    /// compared exactly.
    #[must_use]
    pub fn with_early_abandon(mut self, early_abandon: bool) -> Self {
        self.early_abandon = early_abandon;
        self
    }

    /// Return the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Return the cutoff the next candidate will be compared with.
    #[must_use]
    pub fn cutoff(&self) -> f64 {
        if !self.early_abandon || !self.selector.is_full() {
            return f64::INFINITY;
        }
        self.selector
            .worst_key()
            .map_or(f64::INFINITY, |worst| worst.value())
    }

    /// Compare one labelled training sequence against the query.
    ///
    /// Returns the exact distance, or `None` when the kernel abandoned the
    /// comparison because the candidate cannot enter the top k.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::AlreadyFinalized`] | The search was finalized |
    /// | [`SearchError::LabelOutOfRange`] | `label >= n_classes` |
    /// | [`SearchError::Distance`] | The kernel rejected the pair (shape mismatch) |
    pub fn offer(
        &mut self,
        index: usize,
        candidate: SequenceView<'_>,
        label: usize,
    ) -> Result<Option<Distance>, SearchError> {
        if self.state == SearchState::Finalized {
            return Err(SearchError::AlreadyFinalized);
        }
        if label >= self.n_classes {
            return Err(SearchError::LabelOutOfRange {
                label,
                n_classes: self.n_classes,
            });
        }
        self.state = SearchState::Scanning;

        let cutoff = self.cutoff();
        let distance = self.kernel.distance(self.query, candidate, cutoff)?;
        self.n_compared += 1;

        if distance.is_exceeded() {
            self.n_abandoned += 1;
            return Ok(None);
        }
        self.selector.add((index, label), distance);
        Ok(Some(distance))
    }

    /// Trim distance ties, build the class distribution, pick the predicted
    /// class and close the search.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::AlreadyFinalized`] | Called twice |
    /// | [`SearchError::NoNeighbours`] | No candidate was ever retained |
    pub fn finalize(&mut self) -> Result<Prediction, SearchError> {
        if self.state == SearchState::Finalized {
            return Err(SearchError::AlreadyFinalized);
        }
        self.state = SearchState::Finalized;

        let k = self.selector.limit();
        let selection = self.selector.finalize();
        if selection.is_empty() {
            return Err(SearchError::NoNeighbours);
        }
        if selection.len() < k {
            warn!(
                k,
                retained = selection.len(),
                "fewer training sequences than neighbours requested"
            );
        }

        let mut counts = vec![0usize; self.n_classes];
        let neighbours: Vec<Neighbour> = selection
            .iter()
            .map(|(distance, &(index, label))| {
                counts[label] += 1;
                Neighbour {
                    index,
                    label,
                    distance: distance.value(),
                }
            })
            .collect();

        debug!(
            kernel = %self.kernel.name(),
            n_compared = self.n_compared,
            n_abandoned = self.n_abandoned,
            nearest = neighbours[0].distance,
            "query complete"
        );

        let distribution = ClassDistribution::from_counts(&counts);
        Ok(Prediction {
            predicted_class: distribution.predicted_class(&mut self.tie_rng),
            distribution,
            neighbours,
            n_compared: self.n_compared,
            n_abandoned: self.n_abandoned,
        })
    }
}
