//! Sequence preprocessing: z-normalization and derivative transform.
//!
//! Both transforms work channel by channel.

use crate::error::SeriesError;
use crate::series::Sequence;

/// Z-normalize every channel to zero mean and unit variance.
///
/// Uses population standard deviation (divides by n, not n-1).
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`SeriesError::ConstantChannel`] | A channel has zero variance |
#[must_use = "returns a new normalized sequence; the original is unchanged"]
pub fn z_normalize(sequence: &Sequence) -> Result<Sequence, SeriesError> {
    let len = sequence.len();
    let n = len as f64;
    let mut data = Vec::with_capacity(sequence.as_ref().len());

    for channel in 0..sequence.n_channels() {
        let values = sequence.channel(channel);
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();

        if std == 0.0 {
            return Err(SeriesError::ConstantChannel {
                channel,
                value: values[0],
            });
        }

        data.extend(values.iter().map(|&x| (x - mean) / std));
    }

    Ok(Sequence::from_parts_unchecked(
        data,
        sequence.n_channels(),
        len,
    ))
}

/// Z-normalize a batch of sequences independently.
///
/// # Errors
///
/// Returns the first [`SeriesError`] encountered.
#[must_use = "returns a new vector of normalized sequences"]
pub fn z_normalize_batch(sequences: &[Sequence]) -> Result<Vec<Sequence>, SeriesError> {
    sequences.iter().map(z_normalize).collect()
}

/// Compute the Keogh-Pazzani first derivative of every channel.
///
/// For interior points (1..n-1): `d[i] = ((x[i] - x[i-1]) + (x[i+1] - x[i-1]) / 2) / 2`
/// Output length is `n - 2` (drops first and last points).
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`SeriesError::TooShortForDerivative`] | Fewer than 3 time steps |
#[must_use = "returns a new derivative sequence; the original is unchanged"]
pub fn derivative(sequence: &Sequence) -> Result<Sequence, SeriesError> {
    let n = sequence.len();
    if n < 3 {
        return Err(SeriesError::TooShortForDerivative { len: n });
    }

    let mut data = Vec::with_capacity(sequence.n_channels() * (n - 2));
    for channel in 0..sequence.n_channels() {
        let x = sequence.channel(channel);
        data.extend((1..n - 1).map(|i| ((x[i] - x[i - 1]) + (x[i + 1] - x[i - 1]) / 2.0) / 2.0));
    }

    Ok(Sequence::from_parts_unchecked(
        data,
        sequence.n_channels(),
        n - 2,
    ))
}
