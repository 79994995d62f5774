//! Edit distance with real penalty (ERP).
//!
//! The cost matrix carries a border row and column so that a whole prefix can
//! be matched against the gap value. Cell `(i, j)` of the bordered matrix
//! covers `a[..i]` and `b[..j]`:
//!
//! ```text
//! D[0][0] = 0
//! D[i][j] = min(
//!     D[i-1][j-1] + cost(a[i-1], b[j-1]),   // match (diag)
//!     D[i][j-1]   + cost(b[j-1], g),        // gap in a (left)
//!     D[i-1][j]   + cost(a[i-1], g),        // gap in b (top)
//! )
//! ```
//!
//! Ties resolve diag, then left, then top.

use tracing::instrument;

use crate::distance::{saturating_add, Distance};
use crate::error::{ConfigError, DistanceError};
use crate::kernel::{check_channels, check_cutoff, DistanceKernel};
use crate::path::{EditPath, EditStep};
use crate::series::SequenceView;
use crate::window::{BandConstraint, Window};

/// ERP kernel. Accepts sequences of different lengths; the band is scaled
/// to the ratio of the two lengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Erp {
    window: Window,
    g: f64,
}

const DIAG: u8 = 0;
const LEFT: u8 = 1;
const TOP: u8 = 2;

impl Erp {
    /// Default gap value.
    pub const DEFAULT_G: f64 = 0.0;

    /// Create an ERP kernel.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ConfigError::InvalidFraction`] | Fractional window outside `[0, 1]` |
    /// | [`ConfigError::InvalidPenalty`] | `g` is negative or non-finite |
    pub fn new(window: Window, g: f64) -> Result<Self, ConfigError> {
        window.validate()?;
        if !g.is_finite() || g < 0.0 {
            return Err(ConfigError::InvalidPenalty { g });
        }
        Ok(Self { window, g })
    }

    /// Return the configured warping window.
    #[must_use]
    pub fn window(&self) -> Window {
        self.window
    }

    /// Return the gap value.
    #[must_use]
    pub fn g(&self) -> f64 {
        self.g
    }

    /// Compute the ERP distance and the edit script that realizes it.
    ///
    /// Allocates the full `(n+1) x (m+1)` matrix.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::ChannelMismatch`] when channel counts differ.
    #[instrument(level = "trace", skip(a, b))]
    pub fn alignment(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
    ) -> Result<(Distance, EditPath), DistanceError> {
        check_channels(&a, &b)?;
        let (n, m) = (a.len(), b.len());
        let band = self.window.resolve(n.max(m));
        let width = m + 1;

        let mut cost = vec![f64::INFINITY; (n + 1) * width];
        let mut dirs = vec![DIAG; (n + 1) * width];
        cost[0] = 0.0;

        for (i, j) in border_cells(n, m, band) {
            let idx = i * width + j;
            if i == 0 {
                cost[idx] = saturating_add(cost[idx - 1], b.gap_cost(j - 1, self.g));
                dirs[idx] = LEFT;
            } else {
                cost[idx] = saturating_add(cost[idx - width], a.gap_cost(i - 1, self.g));
                dirs[idx] = TOP;
            }
        }

        for i in 1..=n {
            for j in band.column_range(i - 1, n, m) {
                let idx = i * width + j + 1;
                let (val, dir) = step(
                    saturating_add(cost[idx - width - 1], a.point_cost(i - 1, &b, j)),
                    saturating_add(cost[idx - 1], b.gap_cost(j, self.g)),
                    saturating_add(cost[idx - width], a.gap_cost(i - 1, self.g)),
                );
                cost[idx] = val;
                dirs[idx] = dir;
            }
        }

        let mut steps = Vec::with_capacity(n + m);
        let (mut i, mut j) = (n, m);
        while i > 0 || j > 0 {
            match dirs[i * width + j] {
                DIAG => {
                    steps.push(EditStep::Match { a: i - 1, b: j - 1 });
                    i -= 1;
                    j -= 1;
                }
                LEFT => {
                    steps.push(EditStep::GapInA { b: j - 1 });
                    j -= 1;
                }
                _ => {
                    steps.push(EditStep::GapInB { a: i - 1 });
                    i -= 1;
                }
            }
        }
        steps.reverse();

        Ok((Distance::new(cost[n * width + m]), EditPath::new(steps)))
    }
}

impl DistanceKernel for Erp {
    fn name(&self) -> String {
        "erp".to_string()
    }

    /// Rolling two-row ERP over the bordered matrix. O(n * m) time in the worst
    /// case, O(m) space.
    #[instrument(level = "trace", skip(a, b))]
    fn distance(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
        cutoff: f64,
    ) -> Result<Distance, DistanceError> {
        check_cutoff(cutoff)?;
        check_channels(&a, &b)?;
        let (n, m) = (a.len(), b.len());
        let band = self.window.resolve(n.max(m));

        let mut prev = vec![f64::INFINITY; m + 1];
        let mut curr = vec![f64::INFINITY; m + 1];

        // Border row: a[..0] against prefixes of b.
        prev[0] = 0.0;
        for j in band.column_range(0, n, m) {
            prev[j + 1] = saturating_add(prev[j], b.gap_cost(j, self.g));
        }

        for i in 1..=n {
            curr.fill(f64::INFINITY);
            let cols = band.column_range(i - 1, n, m);

            if cols.start == 0 {
                curr[0] = saturating_add(prev[0], a.gap_cost(i - 1, self.g));
            }
            let mut row_min = curr[0];

            for j in cols {
                let (val, _) = step(
                    saturating_add(prev[j], a.point_cost(i - 1, &b, j)),
                    saturating_add(curr[j], b.gap_cost(j, self.g)),
                    saturating_add(prev[j + 1], a.gap_cost(i - 1, self.g)),
                );
                curr[j + 1] = val;
                row_min = row_min.min(val);
            }

            if i < n && row_min > cutoff {
                return Ok(Distance::EXCEEDED);
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        let final_cost = prev[m];
        if final_cost > cutoff {
            return Ok(Distance::EXCEEDED);
        }
        Ok(Distance::new(final_cost))
    }
}

/// Border cells inside the band, in row-major order, excluding `(0, 0)`.
///
/// The border column entry of row `i` is reachable only when row `i - 1`
/// of the inner matrix starts at column 0. The border row admits the
/// columns of inner row 0.
fn border_cells(
    n: usize,
    m: usize,
    band: BandConstraint,
) -> impl Iterator<Item = (usize, usize)> {
    let top = band.column_range(0, n, m).map(|j| (0, j + 1));
    let left = (1..=n)
        .filter(move |&i| band.column_range(i - 1, n, m).start == 0)
        .map(|i| (i, 0));
    top.chain(left)
}

/// Pick the cheapest transition, preferring diag, then left, then top.
#[inline]
fn step(diag: f64, left: f64, top: f64) -> (f64, u8) {
    if diag <= left && diag <= top {
        (diag, DIAG)
    } else if left <= top {
        (left, LEFT)
    } else {
        (top, TOP)
    }
}
