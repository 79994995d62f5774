//! Weighted DTW: DTW with a logistic penalty on the warping offset `|i - j|`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{instrument, trace};

use crate::distance::Distance;
use crate::dtw::accumulate_rolling;
use crate::error::{ConfigError, DistanceError};
use crate::kernel::{check_channels, check_cutoff, check_equal_length, DistanceKernel};
use crate::series::SequenceView;
use crate::window::Window;

/// Weighted DTW kernel.
///
/// Each cell cost is scaled by `w(|i-j|) = 1 / (1 + exp(-g * (|i-j| - L/2)))`
/// where `L` is the longer sequence length. Weight vectors are memoized per
/// length for the lifetime of the kernel instance.
#[derive(Debug)]
pub struct Wdtw {
    window: Window,
    g: f64,
    weights: RwLock<HashMap<usize, Arc<[f64]>>>,
}

impl Wdtw {
    /// Default logistic steepness.
    pub const DEFAULT_G: f64 = 0.05;

    /// Create a WDTW kernel.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ConfigError::InvalidFraction`] | Fractional window outside `[0, 1]` |
    /// | [`ConfigError::InvalidSteepness`] | `g` is negative or non-finite |
    pub fn new(window: Window, g: f64) -> Result<Self, ConfigError> {
        window.validate()?;
        if !g.is_finite() || g < 0.0 {
            return Err(ConfigError::InvalidSteepness { g });
        }
        Ok(Self {
            window,
            g,
            weights: RwLock::new(HashMap::new()),
        })
    }

    /// Return the configured warping window.
    #[must_use]
    pub fn window(&self) -> Window {
        self.window
    }

    /// Return the logistic steepness.
    #[must_use]
    pub fn g(&self) -> f64 {
        self.g
    }

    /// Return the weight vector for sequences of length `len`, computing it on first use.
    pub(crate) fn weights_for(&self, len: usize) -> Arc<[f64]> {
        if let Some(weights) = self.weights.read().get(&len) {
            return Arc::clone(weights);
        }
        let mut cache = self.weights.write();
        Arc::clone(cache.entry(len).or_insert_with(|| {
            trace!(len, g = self.g, "computing wdtw weights");
            logistic_weights(len, self.g)
        }))
    }
}

impl Clone for Wdtw {
    fn clone(&self) -> Self {
        Self {
            window: self.window,
            g: self.g,
            weights: RwLock::new(HashMap::new()),
        }
    }
}

impl DistanceKernel for Wdtw {
    fn name(&self) -> String {
        "wdtw".to_string()
    }

    #[instrument(level = "trace", skip(a, b))]
    fn distance(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
        cutoff: f64,
    ) -> Result<Distance, DistanceError> {
        check_cutoff(cutoff)?;
        check_channels(&a, &b)?;
        check_equal_length(&a, &b)?;
        let longest = a.len().max(b.len());
        let band = self.window.resolve(longest);
        let weights = self.weights_for(longest);
        let dist = accumulate_rolling(a.len(), b.len(), band, cutoff, |i, j| {
            weights[i.abs_diff(j)] * a.point_cost(i, &b, j)
        });
        Ok(Distance::new(dist))
    }
}

fn logistic_weights(len: usize, g: f64) -> Arc<[f64]> {
    let half = len as f64 / 2.0;
    (0..len)
        .map(|offset| 1.0 / (1.0 + (-g * (offset as f64 - half)).exp()))
        .collect()
}
