//! Independent multivariate aggregation.
//!
//! Dependent aggregation needs no wrapper: every kernel already sums squared
//! differences across channels inside the cell cost.

use tracing::instrument;

use crate::distance::{saturating_add, Distance};
use crate::error::DistanceError;
use crate::kernel::{check_channels, check_cutoff, DistanceKernel};
use crate::series::SequenceView;

/// Runs the inner kernel once per channel and sums the channel distances.
///
/// Each channel is aligned with pruning disabled. The cutoff applies to the
/// running sum, which is checked after every channel.
#[derive(Debug, Clone)]
pub struct Independent<K> {
    inner: K,
}

impl<K: DistanceKernel> Independent<K> {
    /// Wrap a kernel for independent per-channel alignment.
    #[must_use]
    pub fn new(inner: K) -> Self {
        Self { inner }
    }

    /// Return the wrapped kernel.
    #[must_use]
    pub fn inner(&self) -> &K {
        &self.inner
    }
}

impl<K: DistanceKernel> DistanceKernel for Independent<K> {
    fn name(&self) -> String {
        format!("{}-i", self.inner.name())
    }

    #[instrument(level = "trace", skip(self, a, b), fields(kernel = %self.inner.name()))]
    fn distance(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
        cutoff: f64,
    ) -> Result<Distance, DistanceError> {
        check_cutoff(cutoff)?;
        check_channels(&a, &b)?;

        let mut total = 0.0;
        for channel in 0..a.n_channels() {
            let d = self
                .inner
                .distance_unbounded(a.channel_view(channel), b.channel_view(channel))?;
            total = saturating_add(total, d.value());
            if total > cutoff {
                return Ok(Distance::EXCEEDED);
            }
        }
        Ok(Distance::new(total))
    }
}
