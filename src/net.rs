use chrono::{DateTime, Utc};

use crate::matmul::gemm_f32;
use crate::{Activation, Error, Inputs, Layer, Result, loss};

/// Learning rate used when none is configured.
pub const DEFAULT_LEARNING_RATE: f32 = 0.01;
/// Convergence threshold used when none is configured.
pub const DEFAULT_PRECISION: f32 = 0.01;

/// Bookkeeping carried alongside the layers.
#[derive(Debug, Clone, PartialEq)]
pub struct NetMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Default learning rate for training calls that do not pass one.
    pub learning_rate: f32,
    /// Largest tolerated output deviation for `fit` to count as converged.
    pub precision: f32,
}

impl Default for NetMeta {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            title: None,
            description: None,
            created_at: now,
            updated_at: now,
            learning_rate: DEFAULT_LEARNING_RATE,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl NetMeta {
    pub fn validate(&self) -> Result<()> {
        check_learning_rate(self.learning_rate)?;
        check_precision(self.precision)
    }
}

/// A stack of fully-connected layers.
///
/// Layer `i` feeds layer `i + 1`; the constructors reject any stack whose adjacent
/// dimensions disagree, so every `Net` value is well-formed.
#[derive(Debug, Clone)]
pub struct Net {
    layers: Vec<Layer>,
    pub(crate) meta: NetMeta,
}

/// Reusable buffers for `Net::forward`.
///
/// The output of the most recent forward pass lives inside `Scratch`.
#[derive(Debug, Clone)]
pub struct Scratch {
    // Weighted sums before activation; derivatives are evaluated here.
    pre_activations: Vec<Vec<f32>>,
    layer_outputs: Vec<Vec<f32>>,
}

/// Parameter gradients for a `Net` (overwrite semantics).
///
/// Allocate once via `Net::gradients()` and reuse across training steps.
#[derive(Debug, Clone)]
pub struct Gradients {
    d_weights: Vec<Vec<f32>>,
    d_biases: Vec<Vec<f32>>,
    deltas: Vec<Vec<f32>>,

    // Error arriving at each layer's output. The last entry is the net output error,
    // written by the caller before `Net::backward`.
    d_layer_outputs: Vec<Vec<f32>>,

    d_input: Vec<f32>,
}

impl Net {
    /// Assemble a net from pre-built layers, checking adjacent dimensions.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Self> {
        validate_layers(&layers).map_err(|e| e.logged("from_layers"))?;
        Ok(Self {
            layers,
            meta: NetMeta::default(),
        })
    }

    /// Assemble a net from input-major weight matrices (see [`Layer::from_matrix`]).
    ///
    /// Each layer independently may carry a bias row.
    pub fn from_matrices(input_dim: usize, layers: &[(Activation, Vec<Vec<f32>>)]) -> Result<Self> {
        let mut built = Vec::with_capacity(layers.len());
        let mut in_dim = input_dim;
        for (activation, matrix) in layers {
            let layer = Layer::from_matrix(in_dim, *activation, matrix)
                .map_err(|e| e.logged("from_matrices"))?;
            in_dim = layer.out_dim();
            built.push(layer);
        }
        Self::from_layers(built)
    }

    /// Replace the metadata.
    pub fn with_meta(mut self, meta: NetMeta) -> Result<Self> {
        meta.validate().map_err(|e| e.logged("with_meta"))?;
        self.meta = meta;
        Ok(self)
    }

    #[inline]
    pub fn meta(&self) -> &NetMeta {
        &self.meta
    }

    #[inline]
    pub fn learning_rate(&self) -> f32 {
        self.meta.learning_rate
    }

    #[inline]
    pub fn precision(&self) -> f32 {
        self.meta.precision
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.layers[0].in_dim()
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].out_dim()
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    #[cfg(test)]
    pub(crate) fn layer_mut(&mut self, idx: usize) -> &mut Layer {
        &mut self.layers[idx]
    }

    /// Check a sample against the declared input and output widths.
    pub fn check_sample(&self, input: &[f32], expected: Option<&[f32]>) -> Result<()> {
        if input.len() != self.input_dim() {
            return Err(Error::InvalidShape(format!(
                "input len {} does not match net input_dim {}",
                input.len(),
                self.input_dim()
            )));
        }
        if !crate::math::all_finite(input) {
            return Err(Error::InvalidData(
                "input must contain only finite values".to_owned(),
            ));
        }
        if let Some(expected) = expected {
            if expected.len() != self.output_dim() {
                return Err(Error::InvalidShape(format!(
                    "expected output len {} does not match net output_dim {}",
                    expected.len(),
                    self.output_dim()
                )));
            }
            if !crate::math::all_finite(expected) {
                return Err(Error::InvalidData(
                    "expected output must contain only finite values".to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// Re-check the whole net, and optionally a sample against it.
    pub fn validate(&self, input: Option<&[f32]>, expected: Option<&[f32]>) -> Result<()> {
        validate_layers(&self.layers)?;
        self.meta.validate()?;
        match (input, expected) {
            (Some(input), expected) => self.check_sample(input, expected),
            (None, Some(expected)) if expected.len() != self.output_dim() => {
                Err(Error::InvalidShape(format!(
                    "expected output len {} does not match net output_dim {}",
                    expected.len(),
                    self.output_dim()
                )))
            }
            (None, _) => Ok(()),
        }
    }

    pub fn scratch(&self) -> Scratch {
        Scratch::new(self)
    }

    pub fn gradients(&self) -> Gradients {
        Gradients::new(self)
    }

    /// Convenience constructor: allocate all training buffers.
    #[inline]
    pub fn trainer(&self) -> Trainer {
        Trainer::new(self)
    }

    /// Compute the net output for one sample.
    pub fn calc(&self, input: &[f32]) -> Result<Vec<f32>> {
        self.check_sample(input, None)
            .map_err(|e| e.logged("calc"))?;
        let mut scratch = self.scratch();
        Ok(self.forward(input, &mut scratch).to_vec())
    }

    /// Shape-checked, non-allocating inference.
    pub fn predict_into(&self, input: &[f32], scratch: &mut Scratch, out: &mut [f32]) -> Result<()> {
        self.check_sample(input, None)
            .map_err(|e| e.logged("predict_into"))?;
        if !scratch.fits(self) {
            return Err(Error::InvalidShape("scratch was built for another net".to_owned())
                .logged("predict_into"));
        }
        if out.len() != self.output_dim() {
            return Err(Error::InvalidShape(format!(
                "out len {} does not match net output_dim {}",
                out.len(),
                self.output_dim()
            ))
            .logged("predict_into"));
        }
        out.copy_from_slice(self.forward(input, scratch));
        Ok(())
    }

    /// Compute outputs for a batch of samples given as rows.
    pub fn calc_batch(&self, inputs: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        let inputs = Inputs::from_rows(inputs).map_err(|e| e.logged("calc_batch"))?;
        let flat = self.calc_inputs(&inputs)?;
        Ok(flat
            .chunks_exact(self.output_dim())
            .map(<[f32]>::to_vec)
            .collect())
    }

    /// Compute outputs for all rows of `inputs`.
    ///
    /// Returns a flat buffer with shape `(len, output_dim)`. Each layer is evaluated
    /// for the whole batch with one matrix product.
    pub fn calc_inputs(&self, inputs: &Inputs) -> Result<Vec<f32>> {
        if inputs.is_empty() {
            return Err(Error::InvalidData("inputs must not be empty".to_owned()).logged("calc_inputs"));
        }
        if inputs.input_dim() != self.input_dim() {
            return Err(Error::InvalidShape(format!(
                "inputs input_dim {} does not match net input_dim {}",
                inputs.input_dim(),
                self.input_dim()
            ))
            .logged("calc_inputs"));
        }

        let n = inputs.len();
        let mut current = inputs.as_slice().to_vec();
        for layer in &self.layers {
            let (in_dim, out_dim) = (layer.in_dim(), layer.out_dim());

            let mut z = vec![0.0_f32; n * out_dim];
            if let Some(b) = layer.biases() {
                for row in z.chunks_exact_mut(out_dim) {
                    row.copy_from_slice(b);
                }
            }

            // Z (n, out) += X (n, in) * Wᵀ (in, out)
            gemm_f32(
                n,
                out_dim,
                in_dim,
                1.0,
                &current,
                in_dim,
                1,
                layer.weights(),
                1,
                in_dim,
                1.0,
                &mut z,
                out_dim,
                1,
            );

            let mut y = vec![0.0_f32; n * out_dim];
            for (zr, yr) in z.chunks_exact(out_dim).zip(y.chunks_exact_mut(out_dim)) {
                layer.activation().apply(zr, yr);
            }
            current = y;
        }

        Ok(current)
    }

    /// Forward pass for a single sample.
    ///
    /// Writes intermediate results into `scratch` and returns the final output slice.
    ///
    /// Shape contract:
    /// - `input.len() == self.input_dim()`
    /// - `scratch` must be built for this `Net` (same layer count and output sizes)
    pub fn forward<'a>(&self, input: &[f32], scratch: &'a mut Scratch) -> &'a [f32] {
        assert_eq!(
            input.len(),
            self.input_dim(),
            "input len {} does not match net input_dim {}",
            input.len(),
            self.input_dim()
        );
        assert!(
            scratch.fits(self),
            "scratch does not match the layer layout of this net"
        );

        for (idx, layer) in self.layers.iter().enumerate() {
            let z = &mut scratch.pre_activations[idx];
            if idx == 0 {
                layer.forward(input, z, &mut scratch.layer_outputs[0]);
            } else {
                // Borrow the previous output immutably and the current output mutably.
                let (left, right) = scratch.layer_outputs.split_at_mut(idx);
                layer.forward(&left[idx - 1], z, &mut right[0]);
            }
        }

        scratch.output()
    }

    /// Backward pass for a single sample.
    ///
    /// You must call `forward` first using the same `input` and `scratch`, then write the
    /// output error (`actual - expected` for squared error) into `grads.d_output_mut()`.
    ///
    /// Overwrite semantics: `grads` is overwritten with gradients for this sample.
    ///
    /// Returns the error propagated back to the input.
    pub fn backward<'a>(
        &self,
        input: &[f32],
        scratch: &Scratch,
        grads: &'a mut Gradients,
    ) -> &'a [f32] {
        assert_eq!(
            input.len(),
            self.input_dim(),
            "input len {} does not match net input_dim {}",
            input.len(),
            self.input_dim()
        );
        assert!(
            scratch.fits(self),
            "scratch does not match the layer layout of this net"
        );
        assert!(
            grads.fits(self),
            "gradients do not match the layer layout of this net"
        );

        for idx in (0..self.layers.len()).rev() {
            let layer = &self.layers[idx];

            let layer_input: &[f32] = if idx == 0 {
                input
            } else {
                &scratch.layer_outputs[idx - 1]
            };
            let z = &scratch.pre_activations[idx];

            if idx == 0 {
                layer.backward(
                    layer_input,
                    z,
                    &grads.d_layer_outputs[0],
                    &mut grads.deltas[0],
                    &mut grads.d_input,
                    &mut grads.d_weights[0],
                    &mut grads.d_biases[0],
                );
            } else {
                // The current layer reads its own output error and writes the error for
                // the previous layer's output.
                let (left, right) = grads.d_layer_outputs.split_at_mut(idx);
                layer.backward(
                    layer_input,
                    z,
                    &right[0],
                    &mut grads.deltas[idx],
                    &mut left[idx - 1],
                    &mut grads.d_weights[idx],
                    &mut grads.d_biases[idx],
                );
            }
        }

        &grads.d_input
    }

    /// Applies a gradient-descent update to all layers.
    #[inline]
    pub fn sgd_step(&mut self, grads: &Gradients, lr: f32) {
        assert!(
            lr.is_finite() && lr > 0.0,
            "learning rate must be finite and > 0"
        );
        assert!(
            grads.fits(self),
            "gradients do not match the layer layout of this net"
        );

        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.sgd_step(&grads.d_weights[i], &grads.d_biases[i], lr);
        }
    }

    /// One stochastic gradient step on one sample, in place.
    ///
    /// Returns the squared error of the output *before* the update. Panics on shape
    /// mismatch like the other hot-path methods; `Net::train` is the checked variant.
    pub fn train_step(
        &mut self,
        input: &[f32],
        expected: &[f32],
        lr: f32,
        trainer: &mut Trainer,
    ) -> f32 {
        self.forward(input, &mut trainer.scratch);
        let err = loss::output_error(
            trainer.scratch.output(),
            expected,
            trainer.grads.d_output_mut(),
        );
        self.backward(input, &trainer.scratch, &mut trainer.grads);
        self.sgd_step(&trainer.grads, lr);
        err
    }
}

pub(crate) fn validate_layers(layers: &[Layer]) -> Result<()> {
    if layers.is_empty() {
        return Err(Error::InvalidShape(
            "net must have at least one layer".to_owned(),
        ));
    }
    for (i, pair) in layers.windows(2).enumerate() {
        if pair[0].out_dim() != pair[1].in_dim() {
            return Err(Error::InvalidShape(format!(
                "layer {} in_dim {} does not match layer {i} out_dim {}",
                i + 1,
                pair[1].in_dim(),
                pair[0].out_dim()
            )));
        }
    }
    Ok(())
}

pub(crate) fn check_learning_rate(lr: f32) -> Result<()> {
    if !(lr.is_finite() && lr > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "learning rate must be finite and > 0, got {lr}"
        )));
    }
    Ok(())
}

pub(crate) fn check_precision(precision: f32) -> Result<()> {
    if !(precision.is_finite() && precision >= 0.0) {
        return Err(Error::InvalidConfig(format!(
            "precision must be finite and >= 0, got {precision}"
        )));
    }
    Ok(())
}

/// Reusable buffers for training a specific `Net`.
///
/// This is the ergonomic wrapper around `Scratch` + `Gradients`.
#[derive(Debug, Clone)]
pub struct Trainer {
    pub scratch: Scratch,
    pub grads: Gradients,
}

impl Trainer {
    pub fn new(net: &Net) -> Self {
        Self {
            scratch: Scratch::new(net),
            grads: Gradients::new(net),
        }
    }
}

impl Scratch {
    pub fn new(net: &Net) -> Self {
        let per_layer = || {
            net.layers
                .iter()
                .map(|l| vec![0.0; l.out_dim()])
                .collect::<Vec<_>>()
        };
        Self {
            pre_activations: per_layer(),
            layer_outputs: per_layer(),
        }
    }

    fn fits(&self, net: &Net) -> bool {
        self.layer_outputs.len() == net.layers.len()
            && self.pre_activations.len() == net.layers.len()
            && net
                .layers
                .iter()
                .zip(&self.layer_outputs)
                .all(|(l, o)| o.len() == l.out_dim())
    }

    #[inline]
    pub fn output(&self) -> &[f32] {
        self.layer_outputs
            .last()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Weighted sums (before activation) of layer `idx` from the last forward pass.
    #[inline]
    pub fn pre_activations(&self, idx: usize) -> &[f32] {
        &self.pre_activations[idx]
    }
}

impl Gradients {
    pub fn new(net: &Net) -> Self {
        let mut d_weights = Vec::with_capacity(net.layers.len());
        let mut d_biases = Vec::with_capacity(net.layers.len());
        let mut deltas = Vec::with_capacity(net.layers.len());
        let mut d_layer_outputs = Vec::with_capacity(net.layers.len());

        for layer in &net.layers {
            d_weights.push(vec![0.0; layer.in_dim() * layer.out_dim()]);
            d_biases.push(vec![0.0; layer.out_dim()]);
            deltas.push(vec![0.0; layer.out_dim()]);
            d_layer_outputs.push(vec![0.0; layer.out_dim()]);
        }

        Self {
            d_weights,
            d_biases,
            deltas,
            d_layer_outputs,
            d_input: vec![0.0; net.input_dim()],
        }
    }

    fn fits(&self, net: &Net) -> bool {
        let n = net.layers.len();
        self.d_weights.len() == n
            && self.d_biases.len() == n
            && self.deltas.len() == n
            && self.d_layer_outputs.len() == n
            && self.d_input.len() == net.input_dim()
            && net.layers.iter().enumerate().all(|(i, l)| {
                self.d_weights[i].len() == l.in_dim() * l.out_dim()
                    && self.d_layer_outputs[i].len() == l.out_dim()
            })
    }

    /// Mutable view of the error buffer for the final net output.
    ///
    /// Typical training flow:
    /// - `net.forward(input, &mut scratch)`
    /// - write `actual - expected` into `grads.d_output_mut()`
    /// - `net.backward(input, &scratch, &mut grads)`
    #[inline]
    pub fn d_output_mut(&mut self) -> &mut [f32] {
        self.d_layer_outputs
            .last_mut()
            .map(Vec::as_mut_slice)
            .unwrap_or_default()
    }

    #[inline]
    pub fn d_input(&self) -> &[f32] {
        &self.d_input
    }

    /// Per-neuron delta of layer `layer_idx` from the last backward pass.
    #[inline]
    pub fn delta(&self, layer_idx: usize) -> &[f32] {
        &self.deltas[layer_idx]
    }

    #[inline]
    pub fn d_weights(&self, layer_idx: usize) -> &[f32] {
        &self.d_weights[layer_idx]
    }

    #[inline]
    pub fn d_biases(&self, layer_idx: usize) -> &[f32] {
        &self.d_biases[layer_idx]
    }
}
