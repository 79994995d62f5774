//! The distance kernel contract and the kernel configuration surface.

use std::fmt;

use crate::distance::Distance;
use crate::dtw::Dtw;
use crate::erp::Erp;
use crate::error::{ConfigError, DistanceError};
use crate::multivariate::Independent;
use crate::series::SequenceView;
use crate::wdtw::Wdtw;
use crate::window::Window;

/// A pluggable elastic distance.
///
/// `distance(a, b, cutoff)` returns the exact distance when it is at most
/// `cutoff`, and [`Distance::EXCEEDED`] when the distance provably exceeds it.
/// Passing `f64::INFINITY` disables pruning. Implementations are pure: the
/// result depends only on the inputs and the kernel parameters.
pub trait DistanceKernel: fmt::Debug + Send + Sync {
    /// Short human-readable kernel name, e.g. `"dtw"`.
    fn name(&self) -> String;

    /// Compute the distance between `a` and `b`, abandoning once it exceeds `cutoff`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::InvalidCutoff`] | `cutoff` is negative or NaN |
    /// | [`DistanceError::ChannelMismatch`] | Channel counts differ |
    /// | [`DistanceError::LengthMismatch`] | Lengths differ and the kernel requires equality |
    fn distance(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
        cutoff: f64,
    ) -> Result<Distance, DistanceError>;

    /// Compute the exact distance with pruning disabled.
    ///
    /// # Errors
    ///
    /// Same as [`DistanceKernel::distance`].
    fn distance_unbounded(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
    ) -> Result<Distance, DistanceError> {
        self.distance(a, b, f64::INFINITY)
    }
}

impl<K: DistanceKernel + ?Sized> DistanceKernel for Box<K> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn distance(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
        cutoff: f64,
    ) -> Result<Distance, DistanceError> {
        (**self).distance(a, b, cutoff)
    }
}

/// How a kernel treats multi-channel sequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelMode {
    /// One joint alignment; the cell cost sums squared differences over channels.
    #[default]
    Dependent,

    /// One alignment per channel, channel distances summed.
    Independent,
}

/// Declarative kernel choice, validated and turned into a kernel by [`KernelSpec::build`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KernelSpec {
    /// Banded dynamic time warping.
    Dtw {
        /// Warping window.
        window: Window,
    },

    /// Weighted DTW with a logistic penalty on warping distance.
    Wdtw {
        /// Warping window.
        window: Window,
        /// Logistic steepness.
        g: f64,
    },

    /// Edit distance with real penalty.
    Erp {
        /// Warping window.
        window: Window,
        /// Gap reference value.
        g: f64,
    },
}

impl KernelSpec {
    /// Unconstrained DTW.
    #[must_use]
    pub fn dtw() -> Self {
        Self::Dtw {
            window: Window::Full,
        }
    }

    /// Unconstrained WDTW with the default steepness.
    #[must_use]
    pub fn wdtw() -> Self {
        Self::Wdtw {
            window: Window::Full,
            g: Wdtw::DEFAULT_G,
        }
    }

    /// Unconstrained ERP with the default gap value.
    #[must_use]
    pub fn erp() -> Self {
        Self::Erp {
            window: Window::Full,
            g: Erp::DEFAULT_G,
        }
    }

    /// Validate the parameters and build a kernel for the given channel mode.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ConfigError::InvalidFraction`] | Fractional window outside `[0, 1]` |
    /// | [`ConfigError::InvalidSteepness`] | WDTW `g` negative or non-finite |
    /// | [`ConfigError::InvalidPenalty`] | ERP `g` negative or non-finite |
    pub fn build(&self, mode: ChannelMode) -> Result<Box<dyn DistanceKernel>, ConfigError> {
        let kernel: Box<dyn DistanceKernel> = match *self {
            Self::Dtw { window } => Box::new(Dtw::new(window)?),
            Self::Wdtw { window, g } => Box::new(Wdtw::new(window, g)?),
            Self::Erp { window, g } => Box::new(Erp::new(window, g)?),
        };
        Ok(match mode {
            ChannelMode::Dependent => kernel,
            ChannelMode::Independent => Box::new(Independent::new(kernel)),
        })
    }
}

/// Reject negative or NaN cutoffs.
pub(crate) fn check_cutoff(cutoff: f64) -> Result<(), DistanceError> {
    if cutoff.is_nan() || cutoff < 0.0 {
        return Err(DistanceError::InvalidCutoff { cutoff });
    }
    Ok(())
}

/// Reject sequences with different channel counts.
pub(crate) fn check_channels(
    a: &SequenceView<'_>,
    b: &SequenceView<'_>,
) -> Result<(), DistanceError> {
    if a.n_channels() != b.n_channels() {
        return Err(DistanceError::ChannelMismatch {
            a: a.n_channels(),
            b: b.n_channels(),
        });
    }
    Ok(())
}

/// Reject sequences of different lengths.
pub(crate) fn check_equal_length(
    a: &SequenceView<'_>,
    b: &SequenceView<'_>,
) -> Result<(), DistanceError> {
    if a.len() != b.len() {
        return Err(DistanceError::LengthMismatch {
            a: a.len(),
            b: b.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Sequence;

    #[test]
    fn build_rejects_bad_fraction() {
        let spec = KernelSpec::Dtw {
            window: Window::Fraction(2.0),
        };
        assert!(matches!(
            spec.build(ChannelMode::Dependent),
            Err(ConfigError::InvalidFraction { .. })
        ));
    }

    #[test]
    fn build_rejects_negative_g() {
        let wdtw = KernelSpec::Wdtw {
            window: Window::Full,
            g: -0.1,
        };
        assert!(matches!(
            wdtw.build(ChannelMode::Dependent),
            Err(ConfigError::InvalidSteepness { .. })
        ));
        let erp = KernelSpec::Erp {
            window: Window::Full,
            g: -1.0,
        };
        assert!(matches!(
            erp.build(ChannelMode::Dependent),
            Err(ConfigError::InvalidPenalty { .. })
        ));
    }

    #[test]
    fn boxed_kernel_delegates() {
        let kernel = KernelSpec::dtw().build(ChannelMode::Dependent).unwrap();
        let a = Sequence::new(vec![0.0, 1.0]).unwrap();
        let b = Sequence::new(vec![1.0, 0.0]).unwrap();
        let d = kernel.distance_unbounded(a.as_view(), b.as_view()).unwrap();
        assert!((d.value() - 2.0).abs() < 1e-10);
        assert_eq!(kernel.name(), "dtw");
    }

    #[test]
    fn independent_mode_is_named() {
        let kernel = KernelSpec::erp().build(ChannelMode::Independent).unwrap();
        assert_eq!(kernel.name(), "erp-i");
    }

    #[test]
    fn cutoff_validation() {
        assert!(check_cutoff(0.0).is_ok());
        assert!(check_cutoff(f64::INFINITY).is_ok());
        assert!(matches!(
            check_cutoff(-1.0),
            Err(DistanceError::InvalidCutoff { .. })
        ));
        assert!(matches!(
            check_cutoff(f64::NAN),
            Err(DistanceError::InvalidCutoff { .. })
        ));
    }
}
