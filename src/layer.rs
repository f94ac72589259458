use rand::Rng;
use rand::distributions::{Distribution, Uniform};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Activation, Error, Result, math};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Weight initialisation scheme.
pub enum Init {
    /// Uniform in `[low, high)`.
    Uniform { low: f32, high: f32 },
    /// Glorot/Xavier uniform: `limit = sqrt(6 / (in_dim + out_dim))`.
    Xavier,
    /// He/Kaiming uniform: `limit = sqrt(6 / in_dim)`.
    He,
}

impl Init {
    /// `Uniform` over `[0, 1)`.
    pub const UNIT: Init = Init::Uniform {
        low: 0.0,
        high: 1.0,
    };

    pub fn validate(self) -> Result<()> {
        if let Init::Uniform { low, high } = self {
            if !(low.is_finite() && high.is_finite() && low < high) {
                return Err(Error::InvalidConfig(format!(
                    "uniform init needs finite low < high, got [{low}, {high})"
                )));
            }
        }
        Ok(())
    }

    fn distribution(self, in_dim: usize, out_dim: usize) -> Uniform<f32> {
        match self {
            Init::Uniform { low, high } => Uniform::new(low, high),
            Init::Xavier => {
                let limit = (6.0 / (in_dim + out_dim) as f32).sqrt();
                Uniform::new_inclusive(-limit, limit)
            }
            Init::He => {
                let limit = (6.0 / in_dim as f32).sqrt();
                Uniform::new_inclusive(-limit, limit)
            }
        }
    }
}

/// One fully-connected stage: `y = f(W x + b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    in_dim: usize,
    out_dim: usize,
    activation: Activation,
    /// Row-major matrix with shape (out_dim, in_dim).
    weights: Vec<f32>,
    /// `None` when the layer was built without a bias term.
    biases: Option<Vec<f32>>,
}

impl Layer {
    /// Create a layer with randomly initialised parameters.
    pub fn new_with_rng<R: Rng + ?Sized>(
        in_dim: usize,
        out_dim: usize,
        activation: Activation,
        bias: bool,
        init: Init,
        rng: &mut R,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }
        activation.validate()?;
        init.validate()?;

        let dist = init.distribution(in_dim, out_dim);
        let weights = (0..in_dim * out_dim).map(|_| dist.sample(rng)).collect();
        let biases = bias.then(|| (0..out_dim).map(|_| dist.sample(rng)).collect());

        warn_on_placeholder_gradient(activation);
        Ok(Self {
            in_dim,
            out_dim,
            activation,
            weights,
            biases,
        })
    }

    /// Build a layer from explicit parameters.
    ///
    /// `weights` is row-major `(out_dim, in_dim)`; `biases`, if present, has `out_dim` entries.
    pub fn from_parts(
        in_dim: usize,
        out_dim: usize,
        activation: Activation,
        weights: Vec<f32>,
        biases: Option<Vec<f32>>,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidShape(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }
        let expected_w = in_dim
            .checked_mul(out_dim)
            .ok_or_else(|| Error::InvalidShape("layer weight shape overflow".to_owned()))?;
        if weights.len() != expected_w {
            return Err(Error::InvalidShape(format!(
                "weights length {} does not match out_dim * in_dim ({out_dim} * {in_dim})",
                weights.len()
            )));
        }
        if let Some(b) = &biases {
            if b.len() != out_dim {
                return Err(Error::InvalidShape(format!(
                    "biases length {} does not match out_dim {out_dim}",
                    b.len()
                )));
            }
            if !math::all_finite(b) {
                return Err(Error::InvalidData(
                    "biases must contain only finite values".to_owned(),
                ));
            }
        }
        if !math::all_finite(&weights) {
            return Err(Error::InvalidData(
                "weights must contain only finite values".to_owned(),
            ));
        }
        activation.validate()?;

        warn_on_placeholder_gradient(activation);
        Ok(Self {
            in_dim,
            out_dim,
            activation,
            weights,
            biases,
        })
    }

    /// Import an input-major matrix `[prev neuron][this neuron]`.
    ///
    /// With `in_dim + 1` rows the last row holds the bias weights (the weights of a
    /// constant `1` pseudo-input). With `in_dim` rows the layer has no bias.
    pub fn from_matrix(in_dim: usize, activation: Activation, matrix: &[Vec<f32>]) -> Result<Self> {
        let out_dim = matrix.first().map(Vec::len).unwrap_or(0);
        if let Some((i, row)) = matrix.iter().enumerate().find(|(_, r)| r.len() != out_dim) {
            return Err(Error::InvalidShape(format!(
                "matrix row {i} has len {}, expected {out_dim}",
                row.len()
            )));
        }

        let bias = if matrix.len() == in_dim + 1 {
            true
        } else if matrix.len() == in_dim {
            false
        } else {
            return Err(Error::InvalidShape(format!(
                "matrix has {} rows; expected {in_dim} (no bias) or {} (bias)",
                matrix.len(),
                in_dim + 1
            )));
        };

        let mut weights = vec![0.0_f32; in_dim * out_dim];
        for (i, row) in matrix[..in_dim].iter().enumerate() {
            for (o, &w) in row.iter().enumerate() {
                weights[o * in_dim + i] = w;
            }
        }
        let biases = bias.then(|| matrix[in_dim].clone());

        Self::from_parts(in_dim, out_dim, activation, weights, biases)
    }

    /// Export in the input-major layout accepted by [`Layer::from_matrix`].
    pub fn to_matrix(&self) -> Vec<Vec<f32>> {
        let mut rows = Vec::with_capacity(self.in_dim + usize::from(self.has_bias()));
        for i in 0..self.in_dim {
            rows.push(
                (0..self.out_dim)
                    .map(|o| self.weights[o * self.in_dim + i])
                    .collect(),
            );
        }
        if let Some(b) = &self.biases {
            rows.push(b.clone());
        }
        rows
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn has_bias(&self) -> bool {
        self.biases.is_some()
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> Option<&[f32]> {
        self.biases.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    #[cfg(test)]
    pub(crate) fn biases_mut(&mut self) -> Option<&mut [f32]> {
        self.biases.as_deref_mut()
    }

    /// Forward pass for a single sample.
    ///
    /// Computes:
    /// - `pre_activations = W * inputs + b`
    /// - `outputs = activation(pre_activations)`
    ///
    /// Shape contract:
    /// - `inputs.len() == self.in_dim`
    /// - `pre_activations.len() == outputs.len() == self.out_dim`
    #[inline]
    pub fn forward(&self, inputs: &[f32], pre_activations: &mut [f32], outputs: &mut [f32]) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(pre_activations.len(), self.out_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);

        for o in 0..self.out_dim {
            let mut sum = self.biases.as_ref().map_or(0.0, |b| b[o]);
            let row = o * self.in_dim;
            for i in 0..self.in_dim {
                sum = self.weights[row + i].mul_add(inputs[i], sum);
            }
            pre_activations[o] = sum;
        }
        self.activation.apply(pre_activations, outputs);
    }

    /// Backward pass for a single sample.
    ///
    /// This uses overwrite semantics: `delta`, `d_inputs`, `d_weights` and `d_biases`
    /// are all overwritten.
    ///
    /// Inputs:
    /// - `inputs`: the same inputs passed to `forward`
    /// - `pre_activations`: the weighted sums previously produced by `forward`
    /// - `d_outputs`: error arriving at this layer's outputs
    ///
    /// Writes:
    /// - `delta = f'(pre_activations) ⊙ d_outputs`
    /// - `d_inputs = Wᵀ delta` (the error handed to the previous layer)
    /// - `d_weights = delta ⊗ inputs`
    /// - `d_biases = delta` (left untouched when the layer has no bias)
    ///
    /// Shape contract:
    /// - `inputs.len() == d_inputs.len() == self.in_dim`
    /// - `pre_activations.len() == d_outputs.len() == delta.len() == self.out_dim`
    /// - `d_weights.len() == self.weights.len()`
    /// - `d_biases.len() == self.out_dim`
    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub fn backward(
        &self,
        inputs: &[f32],
        pre_activations: &[f32],
        d_outputs: &[f32],
        delta: &mut [f32],
        d_inputs: &mut [f32],
        d_weights: &mut [f32],
        d_biases: &mut [f32],
    ) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(pre_activations.len(), self.out_dim);
        debug_assert_eq!(d_outputs.len(), self.out_dim);
        debug_assert_eq!(delta.len(), self.out_dim);
        debug_assert_eq!(d_inputs.len(), self.in_dim);
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.out_dim);

        self.activation.derivative(pre_activations, delta);
        math::hadamard_in_place(delta, d_outputs);

        if self.biases.is_some() {
            d_biases.copy_from_slice(delta);
        }

        for o in 0..self.out_dim {
            let d_z = delta[o];
            let row = o * self.in_dim;
            for i in 0..self.in_dim {
                d_weights[row + i] = d_z * inputs[i];
            }
        }

        math::mul_vec_transposed(&self.weights, self.out_dim, self.in_dim, delta, d_inputs);
    }

    /// Gradient-descent update: `param -= lr * grad` for every weight and bias.
    #[inline]
    pub fn sgd_step(&mut self, d_weights: &[f32], d_biases: &[f32], lr: f32) {
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.out_dim);

        for (w, &g) in self.weights.iter_mut().zip(d_weights) {
            *w = (-lr).mul_add(g, *w);
        }
        if let Some(biases) = &mut self.biases {
            for (b, &g) in biases.iter_mut().zip(d_biases) {
                *b = (-lr).mul_add(g, *b);
            }
        }
    }
}

fn warn_on_placeholder_gradient(activation: Activation) {
    if !activation.has_exact_derivative() {
        tracing::warn!(
            ?activation,
            "activation has no exact derivative; training through this layer uses a placeholder gradient"
        );
    }
}
