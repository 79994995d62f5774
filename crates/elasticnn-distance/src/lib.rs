//! Elastic distance kernels for nearest-neighbour classification.
//!
//! Pure math library, zero I/O. Provides banded dynamic time warping (DTW),
//! weighted DTW (WDTW) and edit distance with real penalty (ERP), each with
//! early abandoning against a cutoff, plus dependent and independent handling
//! of multivariate sequences.

mod distance;
mod dtw;
mod erp;
mod error;
mod kernel;
mod multivariate;
mod path;
mod preprocess;
mod series;
mod wdtw;
mod window;

pub use distance::Distance;
pub use dtw::Dtw;
pub use erp::Erp;
pub use error::{ConfigError, DistanceError, SeriesError};
pub use kernel::{ChannelMode, DistanceKernel, KernelSpec};
pub use multivariate::Independent;
pub use path::{EditPath, EditStep, WarpingPath, WarpingStep};
pub use preprocess::{derivative, z_normalize, z_normalize_batch};
pub use series::{Sequence, SequenceView};
pub use wdtw::Wdtw;
pub use window::{BandConstraint, Window};
