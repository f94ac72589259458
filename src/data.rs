//! Training samples and their contiguous storage.
//!
//! `Inputs` holds a batch of input vectors; `Dataset` pairs every input with the output the
//! net is expected to produce. Both keep rows back to back in one `Vec<f32>` so the training
//! loop only ever hands out slices.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result, math};

/// One training sample: an input vector and the output the net should produce for it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub input: Vec<f32>,
    pub output: Vec<f32>,
}

impl Sample {
    pub fn new(input: impl Into<Vec<f32>>, output: impl Into<Vec<f32>>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Checks a flat row-major buffer of `width`-wide rows and returns the row count.
fn check_flat(buf: &[f32], width: usize, what: &str) -> Result<usize> {
    if width == 0 {
        return Err(Error::InvalidData(format!("{what} width must be > 0")));
    }
    if !buf.len().is_multiple_of(width) {
        return Err(Error::InvalidShape(format!(
            "{what} length {} is not a multiple of width {width}",
            buf.len()
        )));
    }
    if !math::all_finite(buf) {
        return Err(Error::InvalidData(format!(
            "{what} must contain only finite values"
        )));
    }
    Ok(buf.len() / width)
}

/// Concatenates equally long rows. An empty slice yields an empty buffer of width 0.
fn flatten_rows(rows: &[Vec<f32>], what: &str) -> Result<(Vec<f32>, usize)> {
    let width = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(Error::InvalidShape(format!(
            "{what} row {i} has {} values, expected {width}",
            row.len()
        )));
    }
    Ok((rows.concat(), width))
}

/// A batch of input vectors, row-major `(len, input_dim)`.
#[derive(Debug, Clone)]
pub struct Inputs {
    buf: Vec<f32>,
    len: usize,
    input_dim: usize,
}

impl Inputs {
    pub fn from_flat(buf: Vec<f32>, input_dim: usize) -> Result<Self> {
        let len = check_flat(&buf, input_dim, "inputs")?;
        Ok(Self {
            buf,
            len,
            input_dim,
        })
    }

    /// Copies per-sample rows into one buffer. At least one row is required.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::InvalidData("inputs must not be empty".to_owned()));
        }
        let (buf, input_dim) = flatten_rows(rows, "input")?;
        Self::from_flat(buf, input_dim)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Row `idx`. Panics if `idx >= len`.
    #[inline]
    pub fn input(&self, idx: usize) -> &[f32] {
        &self.buf[idx * self.input_dim..(idx + 1) * self.input_dim]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.buf
    }
}

/// Inputs paired with expected outputs.
///
/// Both sides are row-major: `len * input_dim` inputs and `len * target_dim` expected values.
#[derive(Debug, Clone)]
pub struct Dataset {
    inputs: Inputs,
    expected: Vec<f32>,
    target_dim: usize,
}

impl Dataset {
    pub fn from_flat(
        inputs: Vec<f32>,
        expected: Vec<f32>,
        input_dim: usize,
        target_dim: usize,
    ) -> Result<Self> {
        let inputs = Inputs::from_flat(inputs, input_dim)?;
        let rows = check_flat(&expected, target_dim, "expected outputs")?;
        if rows != inputs.len() {
            return Err(Error::InvalidShape(format!(
                "{} inputs but {rows} expected outputs",
                inputs.len()
            )));
        }

        Ok(Self {
            inputs,
            expected,
            target_dim,
        })
    }

    pub fn from_rows(inputs: &[Vec<f32>], expected: &[Vec<f32>]) -> Result<Self> {
        if inputs.len() != expected.len() {
            return Err(Error::InvalidData(format!(
                "{} inputs but {} expected outputs",
                inputs.len(),
                expected.len()
            )));
        }
        let inputs = Inputs::from_rows(inputs)?;
        let (expected, target_dim) = flatten_rows(expected, "expected output")?;
        let input_dim = inputs.input_dim();
        Self::from_flat(inputs.buf, expected, input_dim, target_dim)
    }

    pub fn from_samples(samples: &[Sample]) -> Result<Self> {
        let (xs, ys): (Vec<_>, Vec<_>) = samples
            .iter()
            .map(|s| (s.input.clone(), s.output.clone()))
            .unzip();
        Self::from_rows(&xs, &ys)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.inputs.input_dim()
    }

    #[inline]
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    #[inline]
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    #[inline]
    pub fn input(&self, idx: usize) -> &[f32] {
        self.inputs.input(idx)
    }

    /// Expected output for sample `idx`. Panics if `idx >= len`.
    #[inline]
    pub fn target(&self, idx: usize) -> &[f32] {
        &self.expected[idx * self.target_dim..(idx + 1) * self.target_dim]
    }

    /// `(input, expected)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f32], &[f32])> + '_ {
        (0..self.len()).map(|i| (self.input(i), self.target(i)))
    }
}
