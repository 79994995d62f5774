//! Class probability distribution.

use rand::Rng;

/// Class probability distribution from a prediction. Probabilities sum to 1.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClassDistribution {
    probs: Vec<f64>,
}

impl ClassDistribution {
    /// Normalize per-class vote counts into probabilities.
    ///
    /// `counts` must have at least one non-zero entry.
    pub(crate) fn from_counts(counts: &[usize]) -> Self {
        let total: usize = counts.iter().sum();
        let probs = counts
            .iter()
            .map(|&count| count as f64 / total as f64)
            .collect();
        Self { probs }
    }

    /// Return the predicted class (argmax of probabilities).
    ///
    /// Classes sharing the highest probability are drawn uniformly with `rng`.
    /// The generator is only consumed on a tie.
    pub fn predicted_class<R: Rng>(&self, rng: &mut R) -> usize {
        let Some(max) = self.probs.iter().copied().max_by(f64::total_cmp) else {
            return 0;
        };
        let tied: Vec<usize> = self
            .probs
            .iter()
            .enumerate()
            .filter(|&(_, p)| p.total_cmp(&max).is_eq())
            .map(|(idx, _)| idx)
            .collect();
        match tied.as_slice() {
            [only] => *only,
            _ => tied[rng.gen_range(0..tied.len())],
        }
    }

    /// Return the probability of one class, or 0 for an unknown class.
    #[must_use]
    pub fn probability(&self, class: usize) -> f64 {
        self.probs.get(class).copied().unwrap_or(0.0)
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.probs.len()
    }

    /// Return the probability distribution as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}
