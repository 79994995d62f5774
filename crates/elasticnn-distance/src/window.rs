//! Warping window configuration and the resolved band constraint.

use std::ops::Range;

use crate::error::ConfigError;

/// Warping window as configured by the user.
///
/// A window is resolved into a [`BandConstraint`] once the lengths of the
/// two sequences being compared are known.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Window {
    /// No constraint, the full cost matrix is reachable.
    #[default]
    Full,

    /// Absolute Sakoe-Chiba radius in time steps.
    Radius(usize),

    /// Radius as a fraction of the longer sequence length, in `[0, 1]`.
    Fraction(f64),
}

impl Window {
    /// Build a window from a signed radius where `-1` means "no band".
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRadius`] when `radius < -1`.
    pub fn from_radius(radius: i64) -> Result<Self, ConfigError> {
        match radius {
            -1 => Ok(Self::Full),
            r if r < -1 => Err(ConfigError::InvalidRadius { radius }),
            r => Ok(Self::Radius(r as usize)),
        }
    }

    /// Build a fractional window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFraction`] when `fraction` is NaN or outside `[0, 1]`.
    pub fn fraction(fraction: f64) -> Result<Self, ConfigError> {
        let window = Self::Fraction(fraction);
        window.validate()?;
        Ok(window)
    }

    /// Check that a directly constructed window holds a valid value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFraction`] for a fraction outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Fraction(fraction) if !(0.0..=1.0).contains(&fraction) => {
                Err(ConfigError::InvalidFraction { fraction })
            }
            _ => Ok(()),
        }
    }

    /// Resolve the window against the longer of the two sequence lengths.
    ///
    /// Any radius that covers the whole matrix collapses to
    /// [`BandConstraint::Unconstrained`].
    #[must_use]
    pub fn resolve(&self, longest: usize) -> BandConstraint {
        let radius = match *self {
            Self::Full => return BandConstraint::Unconstrained,
            Self::Radius(r) => r,
            Self::Fraction(f) => (f * longest as f64).round() as usize,
        };
        if radius >= longest {
            BandConstraint::Unconstrained
        } else {
            BandConstraint::SakoeChibaRadius(radius)
        }
    }
}

/// Constraint on the warping window for a concrete pair of lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BandConstraint {
    /// No constraint, full cost matrix is computed.
    #[default]
    Unconstrained,

    /// Sakoe-Chiba band: for equal lengths, cell (i,j) is valid only if |i - j| <= radius.
    SakoeChibaRadius(usize),
}

impl BandConstraint {
    /// Return the valid column range for `row` of an `n_rows x n_cols` cost matrix.
    ///
    /// The band follows the matrix diagonal scaled to the two lengths. With
    /// `R = r * min(n, m)`, cell `(i, j)` is inside the band iff
    /// `j*n < (i+1)*m + R` and `i*m < (j+1)*n + R`. The rule is unchanged when
    /// rows and columns swap roles, so the band of an `m x n` matrix is the
    /// transpose of the band of an `n x m` one. For square matrices row `i`
    /// covers exactly `[i - r, i + r]`, and consecutive rows always overlap so
    /// the corner cell stays reachable.
    #[must_use]
    pub fn column_range(&self, row: usize, n_rows: usize, n_cols: usize) -> Range<usize> {
        match self {
            Self::Unconstrained => 0..n_cols,
            Self::SakoeChibaRadius(r) => {
                let reach = r * n_rows.min(n_cols);
                let start = (row * n_cols).saturating_sub(reach) / n_rows;
                let end = ((row + 1) * n_cols + reach).div_ceil(n_rows).min(n_cols);
                start..end
            }
        }
    }

    /// Return the widest column range over all rows.
    ///
    /// For unconstrained DTW, returns `n_cols`. For a square Sakoe-Chiba band of
    /// radius `r`, returns `min(2*r + 1, n_cols)`.
    #[must_use]
    pub fn band_width(&self, n_rows: usize, n_cols: usize) -> usize {
        match self {
            Self::Unconstrained => n_cols,
            Self::SakoeChibaRadius(_) => (0..n_rows)
                .map(|row| self.column_range(row, n_rows, n_cols).len())
                .max()
                .unwrap_or(0),
        }
    }
}
