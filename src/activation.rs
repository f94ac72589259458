//! Activation functions.
//!
//! A dense layer computes a pre-activation value `z = W x + b` and then applies an
//! activation function: `y = activation(z)`. Every variant except `Softmax` works
//! element-wise; softmax normalises over the whole layer, which is why the layer-level
//! entry points (`apply`, `derivative`) take slices.
//!
//! Derivatives are evaluated at the cached pre-activation values `z`, not at the
//! outputs. That keeps `HardTanh`, `Softplus` and `Binary` expressible, none of which
//! can recover `f'(z)` from `f(z)` alone.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Slope used by [`Activation::leaky_relu`].
pub const DEFAULT_LEAKY_SLOPE: f32 = 0.01;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
/// Activation function of a layer.
pub enum Activation {
    /// `f(x) = x`.
    Identity,
    /// Logistic sigmoid.
    #[default]
    Sigmoid,
    /// Hyperbolic tangent.
    Tanh,
    /// Tanh hard-clipped to `[-1, 1]`.
    HardTanh,
    /// `max(0, x)`.
    #[cfg_attr(feature = "serde", serde(rename = "relu"))]
    ReLU,
    /// `x` for positive inputs, `alpha * x` otherwise.
    #[cfg_attr(feature = "serde", serde(rename = "leaky_relu"))]
    LeakyReLU { alpha: f32 },
    /// `ln(1 + e^x)`.
    Softplus,
    /// Normalised exponentials over the layer.
    ///
    /// The derivative is a placeholder (all ones).
    Softmax,
    /// Binary step: `0` for `x < 0`, `1` otherwise.
    ///
    /// The derivative is a placeholder (see [`Activation::grad`]).
    Binary,
}

impl Activation {
    /// Leaky ReLU with the conventional `0.01` slope.
    #[inline]
    pub const fn leaky_relu() -> Self {
        Activation::LeakyReLU {
            alpha: DEFAULT_LEAKY_SLOPE,
        }
    }

    /// Validate activation parameters.
    pub fn validate(self) -> Result<()> {
        match self {
            Activation::LeakyReLU { alpha } => {
                if !(alpha.is_finite() && alpha >= 0.0) {
                    return Err(Error::InvalidConfig(format!(
                        "leaky ReLU alpha must be finite and >= 0, got {alpha}"
                    )));
                }
            }
            Activation::Identity
            | Activation::Sigmoid
            | Activation::Tanh
            | Activation::HardTanh
            | Activation::ReLU
            | Activation::Softplus
            | Activation::Softmax
            | Activation::Binary => {}
        }

        Ok(())
    }

    /// Returns false for activations whose gradient is a placeholder.
    #[inline]
    pub fn has_exact_derivative(self) -> bool {
        !matches!(self, Activation::Softmax | Activation::Binary)
    }

    /// Returns true if the activation couples the outputs of a layer.
    #[inline]
    pub fn is_vector_wise(self) -> bool {
        matches!(self, Activation::Softmax)
    }

    /// Apply the activation to a whole layer: `out[i] = f(z)[i]`.
    ///
    /// Shape contract: `z.len() == out.len()`.
    #[inline]
    pub fn apply(self, z: &[f32], out: &mut [f32]) {
        debug_assert_eq!(z.len(), out.len());

        if self.is_vector_wise() {
            softmax(z, out);
        } else {
            for (o, &x) in out.iter_mut().zip(z) {
                *o = self.forward(x);
            }
        }
    }

    /// Derivative of the activation at the pre-activation values `z`.
    ///
    /// Shape contract: `z.len() == out.len()`.
    #[inline]
    pub fn derivative(self, z: &[f32], out: &mut [f32]) {
        debug_assert_eq!(z.len(), out.len());

        match self {
            // Placeholder: the softmax Jacobian is not diagonal and is not modelled here.
            Activation::Softmax => out.fill(1.0),
            _ => {
                for (o, &x) in out.iter_mut().zip(z) {
                    *o = self.grad(x);
                }
            }
        }
    }

    /// Scalar forward for the element-wise variants.
    ///
    /// For `Softmax` this is the identity; use [`Activation::apply`] on the full layer.
    #[inline]
    pub fn forward(self, x: f32) -> f32 {
        match self {
            Activation::Identity | Activation::Softmax => x,
            Activation::Sigmoid => sigmoid(x),
            Activation::Tanh => x.tanh(),
            Activation::HardTanh => x.clamp(-1.0, 1.0),
            Activation::ReLU => x.max(0.0),
            Activation::LeakyReLU { alpha } => {
                if x > 0.0 {
                    x
                } else {
                    alpha * x
                }
            }
            Activation::Softplus => softplus(x),
            Activation::Binary => {
                if x < 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// Scalar derivative `f'(x)` evaluated at the pre-activation `x`.
    ///
    /// `Binary` has no useful gradient. It returns `0` exactly at `x == 0` and `1`
    /// elsewhere so that error still flows through the step (straight-through).
    #[inline]
    pub fn grad(self, x: f32) -> f32 {
        match self {
            Activation::Identity | Activation::Softmax => 1.0,
            Activation::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
            Activation::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            Activation::HardTanh => {
                if -1.0 < x && x < 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::ReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::LeakyReLU { alpha } => {
                if x > 0.0 {
                    1.0
                } else {
                    alpha
                }
            }
            Activation::Softplus => sigmoid(x),
            Activation::Binary => {
                if x == 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }
}

#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

#[inline]
fn softplus(x: f32) -> f32 {
    // ln(1 + e^x) = max(x, 0) + ln(1 + e^-|x|)
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

#[inline]
fn softmax(z: &[f32], out: &mut [f32]) {
    if z.is_empty() {
        return;
    }

    let max = z.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0_f32;
    for (o, &x) in out.iter_mut().zip(z) {
        *o = (x - max).exp();
        sum += *o;
    }

    let inv = 1.0 / sum;
    for o in out.iter_mut() {
        *o *= inv;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ELEMENTWISE: [Activation; 7] = [
        Activation::Identity,
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::HardTanh,
        Activation::ReLU,
        Activation::LeakyReLU { alpha: 0.01 },
        Activation::Softplus,
    ];

    // Away from the kinks at -1, 0 and 1.
    const POINTS: [f32; 6] = [-2.5, -0.6, -0.2, 0.3, 0.8, 1.7];

    #[test]
    fn leaky_relu_alpha_must_be_finite_and_non_negative() {
        assert!(
            Activation::LeakyReLU { alpha: f32::NAN }
                .validate()
                .is_err()
        );
        assert!(Activation::LeakyReLU { alpha: -0.1 }.validate().is_err());
        assert!(Activation::leaky_relu().validate().is_ok());
    }

    #[test]
    fn derivatives_match_numeric_derivatives() {
        let eps = 1e-3_f32;
        for act in ELEMENTWISE {
            assert!(act.has_exact_derivative());
            for x in POINTS {
                let numeric = (act.forward(x + eps) - act.forward(x - eps)) / (2.0 * eps);
                let analytic = act.grad(x);
                assert!(
                    (numeric - analytic).abs() < 2e-3,
                    "{act:?} at {x}: analytic={analytic} numeric={numeric}"
                );
            }
        }
    }

    #[test]
    fn sigmoid_basic_values() {
        let y0 = Activation::Sigmoid.forward(0.0);
        assert!((y0 - 0.5).abs() < 1e-6);

        assert!(Activation::Sigmoid.forward(10.0) > 0.999);
        assert!(Activation::Sigmoid.forward(-10.0) < 0.001);
        assert!((Activation::Sigmoid.grad(0.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn relu_family_shapes() {
        assert_eq!(Activation::ReLU.forward(-2.0), 0.0);
        assert_eq!(Activation::ReLU.forward(3.0), 3.0);
        assert_eq!(Activation::ReLU.grad(0.0), 0.0);

        let act = Activation::leaky_relu();
        assert_eq!(act.forward(3.0), 3.0);
        assert!((act.forward(-2.0) + 0.02).abs() < 1e-7);
        assert_eq!(act.grad(-2.0), 0.01);
        assert_eq!(act.grad(3.0), 1.0);
    }

    #[test]
    fn hard_tanh_clips() {
        assert_eq!(Activation::HardTanh.forward(4.0), 1.0);
        assert_eq!(Activation::HardTanh.forward(-4.0), -1.0);
        assert_eq!(Activation::HardTanh.forward(0.25), 0.25);
        assert_eq!(Activation::HardTanh.grad(1.0), 0.0);
    }

    #[test]
    fn softplus_is_stable_for_large_inputs() {
        assert!((Activation::Softplus.forward(100.0) - 100.0).abs() < 1e-3);
        assert!(Activation::Softplus.forward(-100.0) >= 0.0);
        assert!((Activation::Softplus.forward(0.0) - 2.0_f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn softmax_normalises_and_has_placeholder_derivative() {
        let z = [1.0_f32, 2.0, 3.0];
        let mut y = [0.0_f32; 3];
        Activation::Softmax.apply(&z, &mut y);

        let sum: f32 = y.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(y[0] < y[1] && y[1] < y[2]);

        let e: f32 = z.iter().map(|v| v.exp()).sum();
        assert!((y[2] - 3.0_f32.exp() / e).abs() < 1e-6);

        let mut d = [0.0_f32; 3];
        Activation::Softmax.derivative(&z, &mut d);
        assert_eq!(d, [1.0, 1.0, 1.0]);
        assert!(!Activation::Softmax.has_exact_derivative());
        assert!(Activation::Softmax.is_vector_wise());
        assert!(!Activation::Sigmoid.is_vector_wise());
    }

    #[test]
    fn binary_step_and_its_placeholder_gradient() {
        assert_eq!(Activation::Binary.forward(-0.1), 0.0);
        assert_eq!(Activation::Binary.forward(0.0), 1.0);
        assert_eq!(Activation::Binary.forward(2.0), 1.0);

        assert_eq!(Activation::Binary.grad(0.0), 0.0);
        assert_eq!(Activation::Binary.grad(0.5), 1.0);
        assert!(!Activation::Binary.has_exact_derivative());
    }
}
