//! Banded DTW distance computation with early abandoning.

use tracing::instrument;

use crate::distance::{saturating_add, Distance};
use crate::error::{ConfigError, DistanceError};
use crate::kernel::{check_channels, check_cutoff, check_equal_length, DistanceKernel};
use crate::path::{WarpingPath, WarpingStep};
use crate::series::SequenceView;
use crate::window::{BandConstraint, Window};

/// Immutable DTW configuration. Thread-safe and copyable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dtw {
    window: Window,
}

impl Dtw {
    /// Create a DTW kernel with the given warping window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFraction`] for a fractional window outside `[0, 1]`.
    pub fn new(window: Window) -> Result<Self, ConfigError> {
        window.validate()?;
        Ok(Self { window })
    }

    /// Create an unconstrained DTW kernel.
    #[must_use]
    pub fn unconstrained() -> Self {
        Self {
            window: Window::Full,
        }
    }

    /// Create a DTW kernel with an absolute Sakoe-Chiba radius.
    #[must_use]
    pub fn with_sakoe_chiba(radius: usize) -> Self {
        Self {
            window: Window::Radius(radius),
        }
    }

    /// Return the configured warping window.
    #[must_use]
    pub fn window(&self) -> Window {
        self.window
    }

    /// Compute the DTW distance and optimal warping path between two sequences.
    ///
    /// Allocates the full banded cost matrix and a direction array for traceback.
    /// Runs in O(n * bw) time and space. Ties between predecessors resolve
    /// diagonal first, then above, then left.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::ChannelMismatch`] | Channel counts differ |
    /// | [`DistanceError::LengthMismatch`] | Lengths differ |
    #[instrument(level = "trace", skip(a, b))]
    pub fn alignment(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
    ) -> Result<(Distance, WarpingPath), DistanceError> {
        check_channels(&a, &b)?;
        check_equal_length(&a, &b)?;
        let band = self.window.resolve(a.len().max(b.len()));
        let (dist, steps) = full_band(&a, &b, band);
        Ok((Distance::new(dist), WarpingPath::new(steps)))
    }
}

impl DistanceKernel for Dtw {
    fn name(&self) -> String {
        "dtw".to_string()
    }

    /// Rolling two-row DTW. Runs in O(n * bw) time and O(bw) space, where `bw`
    /// is the band width.
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
        let band = self.window.resolve(a.len().max(b.len()));
        let dist = accumulate_rolling(a.len(), b.len(), band, cutoff, |i, j| {
            a.point_cost(i, &b, j)
        });
        Ok(Distance::new(dist))
    }
}

/// Rolling two-row buffer DTW recurrence with early abandoning.
///
/// Shared by DTW and WDTW, which differ only in the local `cost(i, j)`.
///
/// Each row buffer has `bw + 2` slots. Index 0 is the left sentinel (INF) and
/// trailing slots stay INF. Active columns of row `i` start at index 1.
///
/// For column `j` in row `i`:
/// - current local index: `j - curr_start + 1`
/// - predecessor above `C[i-1][j]`: `j - prev_start + 1` in `prev`
/// - predecessor diagonal `C[i-1][j-1]`: `j - prev_start` in `prev`
/// - predecessor left `C[i][j-1]`: `curr_local - 1`
///
/// Returns `f64::INFINITY` as soon as the minimum accumulated cost of a
/// completed row exceeds `cutoff`. Computed costs saturate at `f64::MAX`.
pub(crate) fn accumulate_rolling<F>(
    n: usize,
    m: usize,
    band: BandConstraint,
    cutoff: f64,
    cost: F,
) -> f64
where
    F: Fn(usize, usize) -> f64,
{
    let bw = band.band_width(n, m);
    let buf_width = bw + 2;

    let mut prev = vec![f64::INFINITY; buf_width];
    let mut curr = vec![f64::INFINITY; buf_width];

    let mut prev_start: usize = 0;

    for i in 0..n {
        curr.fill(f64::INFINITY);

        let col_range = band.column_range(i, n, m);
        let curr_start = col_range.start;
        let mut row_min = f64::INFINITY;

        for j in col_range {
            let c = cost(i, j);
            let cj = j - curr_start + 1;

            if i == 0 && j == 0 {
                curr[cj] = saturating_add(0.0, c);
                row_min = row_min.min(curr[cj]);
                continue;
            }

            // Left: C[i][j-1]
            let left = if j > curr_start {
                curr[cj - 1]
            } else {
                f64::INFINITY
            };

            // Above: C[i-1][j]
            let above = if i > 0 && j >= prev_start {
                prev.get(j - prev_start + 1).copied().unwrap_or(f64::INFINITY)
            } else {
                f64::INFINITY
            };

            // Diagonal: C[i-1][j-1]
            let diag = if i > 0 && j > prev_start {
                prev.get(j - prev_start).copied().unwrap_or(f64::INFINITY)
            } else {
                f64::INFINITY
            };

            let val = saturating_add(left.min(above).min(diag), c);
            curr[cj] = val;
            row_min = row_min.min(val);
        }

        // Every warping path visits at least one cell per row, so `row_min`
        // lower-bounds the final cost. The last row is settled by the
        // final-cell check below.
        if i < n - 1 && row_min > cutoff {
            return f64::INFINITY;
        }

        prev_start = curr_start;
        std::mem::swap(&mut prev, &mut curr);
    }

    // After the final swap, `prev` holds the last completed row.
    let final_range = band.column_range(n - 1, n, m);
    let local = (m - 1) - final_range.start + 1;
    let final_cost = prev[local];

    if final_cost > cutoff {
        return f64::INFINITY;
    }
    final_cost
}

/// Full banded cost matrix DTW, returning both distance and warping path.
///
/// Stores all rows so the optimal path can be reconstructed via direction
/// bits (`dirs`): 0 = diagonal, 1 = above, 2 = left.
///
/// Cell `(i, j)` maps to flat index `i * bw + (j - col_range.start)`.
fn full_band(
    a: &SequenceView<'_>,
    b: &SequenceView<'_>,
    band: BandConstraint,
) -> (f64, Vec<WarpingStep>) {
    let n = a.len();
    let m = b.len();
    let bw = band.band_width(n, m);

    let mut cost = vec![f64::INFINITY; n * bw];
    let mut dirs = vec![0u8; n * bw];

    for i in 0..n {
        let col_range = band.column_range(i, n, m);
        let prev_col_range = if i > 0 {
            band.column_range(i - 1, n, m)
        } else {
            0..0
        };

        for j in col_range.clone() {
            let c = a.point_cost(i, b, j);
            let local_j = j - col_range.start;
            let idx = i * bw + local_j;

            if i == 0 && j == 0 {
                cost[idx] = saturating_add(0.0, c);
                dirs[idx] = 0;
                continue;
            }

            // Diagonal: C[i-1][j-1]
            let diag = if i > 0 && j > 0 && prev_col_range.contains(&(j - 1)) {
                cost[(i - 1) * bw + (j - 1 - prev_col_range.start)]
            } else {
                f64::INFINITY
            };

            // Above: C[i-1][j]
            let above = if i > 0 && prev_col_range.contains(&j) {
                cost[(i - 1) * bw + (j - prev_col_range.start)]
            } else {
                f64::INFINITY
            };

            // Left: C[i][j-1]
            let left = if j > col_range.start {
                cost[idx - 1]
            } else {
                f64::INFINITY
            };

            let (min_val, dir) = if diag <= above && diag <= left {
                (diag, 0u8)
            } else if above <= left {
                (above, 1u8)
            } else {
                (left, 2u8)
            };

            cost[idx] = saturating_add(min_val, c);
            dirs[idx] = dir;
        }
    }

    // Traceback from (n-1, m-1) to (0, 0).
    let mut path = Vec::new();
    let mut i = n - 1;
    let mut j = m - 1;

    loop {
        path.push(WarpingStep { a: i, b: j });
        if i == 0 && j == 0 {
            break;
        }
        let col_range = band.column_range(i, n, m);
        let idx = i * bw + (j - col_range.start);
        match dirs[idx] {
            0 => {
                i -= 1;
                j -= 1;
            }
            1 => {
                i -= 1;
            }
            2 => {
                j -= 1;
            }
            _ => unreachable!("invalid direction byte"),
        }
    }

    path.reverse();

    let final_range = band.column_range(n - 1, n, m);
    let dist = cost[(n - 1) * bw + (m - 1 - final_range.start)];

    (dist, path)
}
