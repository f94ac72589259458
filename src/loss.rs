//! Error measures.
//!
//! Training always descends the squared error: the output error written into
//! `Gradients::d_output_mut()` is `actual - expected`, which is the gradient of
//! `0.5 * sum((actual - expected)^2)`. `Loss` is for reporting and evaluation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use crate::math::max_abs_diff;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Supported error measures.
pub enum Loss {
    /// Sum of absolute differences.
    Absolute,
    /// Sum of squared differences.
    Squared,
    /// Mean of squared differences.
    #[default]
    MeanSquared,
}

impl Loss {
    /// Compute the error between `actual` and `expected`.
    ///
    /// Shape contract: `actual.len() == expected.len()`.
    #[inline]
    pub fn compute(self, actual: &[f32], expected: &[f32]) -> f32 {
        assert_eq!(
            actual.len(),
            expected.len(),
            "actual len {} does not match expected len {}",
            actual.len(),
            expected.len()
        );

        match self {
            Loss::Absolute => actual
                .iter()
                .zip(expected)
                .map(|(a, e)| (a - e).abs())
                .sum(),
            Loss::Squared => squared(actual, expected),
            Loss::MeanSquared => {
                if actual.is_empty() {
                    0.0
                } else {
                    squared(actual, expected) / actual.len() as f32
                }
            }
        }
    }
}

/// Write the output error `actual - expected` into `d_out`.
///
/// Returns the sum of squared differences.
///
/// Shape contract: all three slices have the same length.
#[inline]
pub fn output_error(actual: &[f32], expected: &[f32], d_out: &mut [f32]) -> f32 {
    assert_eq!(
        actual.len(),
        expected.len(),
        "actual len {} does not match expected len {}",
        actual.len(),
        expected.len()
    );
    assert_eq!(
        actual.len(),
        d_out.len(),
        "actual len {} does not match d_out len {}",
        actual.len(),
        d_out.len()
    );

    let mut sum_sq = 0.0_f32;
    for i in 0..actual.len() {
        let diff = actual[i] - expected[i];
        sum_sq = diff.mul_add(diff, sum_sq);
        d_out[i] = diff;
    }
    sum_sq
}

#[inline]
fn squared(actual: &[f32], expected: &[f32]) -> f32 {
    let mut sum_sq = 0.0_f32;
    for (a, e) in actual.iter().zip(expected) {
        let diff = a - e;
        sum_sq = diff.mul_add(diff, sum_sq);
    }
    sum_sq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_when_equal() {
        let y = [1.0_f32, -2.0, 0.5];
        for loss in [Loss::Absolute, Loss::Squared, Loss::MeanSquared] {
            assert_eq!(loss.compute(&y, &y), 0.0);
        }
    }

    #[test]
    fn known_values() {
        let actual = [1.0_f32, 2.0];
        let expected = [0.0_f32, 4.0];

        assert_eq!(Loss::Absolute.compute(&actual, &expected), 3.0);
        assert_eq!(Loss::Squared.compute(&actual, &expected), 5.0);
        assert_eq!(Loss::MeanSquared.compute(&actual, &expected), 2.5);
        assert_eq!(Loss::default(), Loss::MeanSquared);
    }

    #[test]
    fn output_error_is_actual_minus_expected() {
        let mut d = [0.0_f32; 2];
        let sq = output_error(&[0.5, 1.0], &[1.0, 0.0], &mut d);
        assert_eq!(d, [-0.5, 1.0]);
        assert!((sq - 1.25).abs() < 1e-6);
    }

    #[test]
    #[should_panic]
    fn output_error_panics_on_len_mismatch() {
        let mut d = [0.0_f32; 1];
        output_error(&[0.5, 1.0], &[1.0, 0.0], &mut d);
    }
}
