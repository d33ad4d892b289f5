//! Categorical support codec for value and reward targets.
//!
//! A scalar is represented as a distribution over the `2 * num_bins + 1` integer points
//! `-num_bins ..= num_bins`. Before encoding, raw magnitudes are compressed with
//! `h(x) = sign(x) * (sqrt(|x| + 1) - 1) + eps * x`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SupportError {
    #[error("support needs at least one bin on each side of zero")]
    ZeroBins,

    #[error("expected a distribution of width {expected}, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("cannot place NaN on the support")]
    NotANumber,
}

/// Number of support points for `num_bins` bins on each side of zero
pub fn support_width(num_bins: usize) -> usize {
    2 * num_bins + 1
}

/// Map each scalar onto a categorical distribution over `-num_bins ..= num_bins`.
///
/// Values are clipped to the representable range and split between their two neighbouring
/// support points so that the expectation of the distribution equals the clipped value.
pub fn scalar_to_support(values: &[f64], num_bins: usize) -> Result<Vec<Vec<f64>>, SupportError> {
    if num_bins == 0 {
        return Err(SupportError::ZeroBins);
    }
    let bound = num_bins as f64;

    values
        .iter()
        .map(|&x| {
            if x.is_nan() {
                return Err(SupportError::NotANumber);
            }
            let clipped = x.clamp(-bound, bound);
            let floor = clipped.floor();
            let upper_weight = clipped - floor;
            let index = (floor + bound) as usize;

            let mut distribution = vec![0.0; support_width(num_bins)];
            distribution[index] = 1.0 - upper_weight;
            if upper_weight > 0.0 {
                distribution[index + 1] = upper_weight;
            }
            Ok(distribution)
        })
        .collect()
}

/// Expectation of each distribution over the support points.
pub fn support_to_scalar(
    distributions: &[Vec<f64>],
    num_bins: usize,
) -> Result<Vec<f64>, SupportError> {
    if num_bins == 0 {
        return Err(SupportError::ZeroBins);
    }
    let width = support_width(num_bins);

    distributions
        .iter()
        .map(|distribution| {
            if distribution.len() != width {
                return Err(SupportError::WidthMismatch {
                    expected: width,
                    actual: distribution.len(),
                });
            }
            Ok(distribution
                .iter()
                .enumerate()
                .map(|(i, p)| p * (i as f64 - num_bins as f64))
                .sum())
        })
        .collect()
}

/// `h(x) = sign(x) * (sqrt(|x| + 1) - 1) + eps * x`
pub fn forward_reward_transform(x: f64, eps: f64) -> f64 {
    x.signum() * ((x.abs() + 1.0).sqrt() - 1.0) + eps * x
}

/// Exact inverse of [`forward_reward_transform`] for the same `eps`.
pub fn inverse_reward_transform(y: f64, eps: f64) -> f64 {
    let magnitude = if eps == 0.0 {
        (y.abs() + 1.0).powi(2) - 1.0
    } else {
        let root = ((1.0 + 4.0 * eps * (y.abs() + 1.0 + eps)).sqrt() - 1.0) / (2.0 * eps);
        root * root - 1.0
    };
    y.signum() * magnitude
}

/// Training-target encoding of a raw value or reward.
///
/// With `support_size == 0` the target is the raw scalar (regression); otherwise the
/// compressed scalar placed on the categorical support.
pub fn encode_target(value: f64, support_size: usize, eps: f64) -> Result<Vec<f64>, SupportError> {
    if support_size == 0 {
        return Ok(vec![value]);
    }
    let compressed = forward_reward_transform(value, eps);
    let mut encoded = scalar_to_support(&[compressed], support_size)?;
    Ok(encoded.remove(0))
}

/// Inverse of [`encode_target`] for a network head output.
pub fn decode_prediction(
    distribution: &[f64],
    support_size: usize,
    eps: f64,
) -> Result<f64, SupportError> {
    if support_size == 0 {
        return match distribution {
            [value] => Ok(*value),
            _ => Err(SupportError::WidthMismatch {
                expected: 1,
                actual: distribution.len(),
            }),
        };
    }
    let expectation = support_to_scalar(&[distribution.to_vec()], support_size)?;
    Ok(inverse_reward_transform(expectation[0], eps))
}
