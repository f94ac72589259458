//! The single-neuron perceptron.
//!
//! Output is a binary step of the weighted sum: `1` if `w·x + b >= 0`, else `0`. Training
//! uses the perceptron rule rather than backpropagation.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::net::check_learning_rate;
use crate::{Activation, Error, Inputs, Result, math};

#[derive(Debug, Clone, PartialEq)]
pub struct Perceptron {
    weights: Vec<f32>,
    bias: f32,
}

impl Perceptron {
    /// Weights and bias drawn uniformly from `[0, 1)`.
    pub fn new_with_rng<R: Rng + ?Sized>(num_inputs: usize, rng: &mut R) -> Result<Self> {
        if num_inputs == 0 {
            return Err(Error::InvalidConfig("num_inputs must be > 0".to_owned()));
        }
        let dist = Uniform::new(0.0_f32, 1.0);
        Ok(Self {
            bias: dist.sample(rng),
            weights: (0..num_inputs).map(|_| dist.sample(rng)).collect(),
        })
    }

    pub fn new_with_seed(num_inputs: usize, seed: u64) -> Result<Self> {
        Self::new_with_rng(num_inputs, &mut StdRng::seed_from_u64(seed))
    }

    pub fn from_parts(weights: Vec<f32>, bias: f32) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::InvalidShape(
                "perceptron needs at least one weight".to_owned(),
            ));
        }
        if !(math::all_finite(&weights) && bias.is_finite()) {
            return Err(Error::InvalidData(
                "perceptron parameters must be finite".to_owned(),
            ));
        }
        Ok(Self { weights, bias })
    }

    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn calc(&self, input: &[f32]) -> Result<f32> {
        self.check_input(input).map_err(|e| e.logged("perceptron.calc"))?;
        Ok(self.fire(input))
    }

    /// Outputs for every row of `inputs`.
    pub fn calc_batch(&self, inputs: &Inputs) -> Result<Vec<f32>> {
        self.check_inputs(inputs)
            .map_err(|e| e.logged("perceptron.calc_batch"))?;
        Ok((0..inputs.len()).map(|i| self.fire(inputs.input(i))).collect())
    }

    /// One perceptron-rule update: `w += lr·(t - y)·x`, `b += lr·(t - y)`.
    pub fn train(&self, input: &[f32], expected: f32, lr: f32) -> Result<Perceptron> {
        self.check_input(input)
            .and_then(|()| check_target(expected))
            .and_then(|()| check_learning_rate(lr))
            .map_err(|e| e.logged("perceptron.train"))?;

        let error = expected - self.fire(input);
        let mut next = self.clone();
        for (w, &x) in next.weights.iter_mut().zip(input) {
            *w += lr * (error * x);
        }
        next.bias += lr * error;
        Ok(next)
    }

    /// The update of [`Perceptron::train`] averaged over a batch and applied once.
    pub fn train_batch(&self, inputs: &Inputs, expected: &[f32], lr: f32) -> Result<Perceptron> {
        self.check_inputs(inputs)
            .and_then(|()| {
                if expected.len() != inputs.len() {
                    return Err(Error::InvalidShape(format!(
                        "{} targets for {} inputs",
                        expected.len(),
                        inputs.len()
                    )));
                }
                expected.iter().try_for_each(|&t| check_target(t))
            })
            .and_then(|()| check_learning_rate(lr))
            .map_err(|e| e.logged("perceptron.train_batch"))?;

        let n = inputs.len() as f32;
        let mut delta_w = vec![0.0_f32; self.num_inputs()];
        let mut delta_b = 0.0_f32;
        for (i, &t) in expected.iter().enumerate() {
            let x = inputs.input(i);
            let error = t - self.fire(x);
            delta_b += error;
            for (d, &xi) in delta_w.iter_mut().zip(x) {
                *d += error * xi;
            }
        }

        let mut next = self.clone();
        for (w, d) in next.weights.iter_mut().zip(delta_w) {
            *w += lr * (d / n);
        }
        next.bias += lr * (delta_b / n);
        Ok(next)
    }

    #[inline]
    fn fire(&self, input: &[f32]) -> f32 {
        Activation::Binary.forward(math::dot(&self.weights, input) + self.bias)
    }

    fn check_input(&self, input: &[f32]) -> Result<()> {
        if input.len() != self.num_inputs() {
            return Err(Error::InvalidShape(format!(
                "input len {} does not match perceptron num_inputs {}",
                input.len(),
                self.num_inputs()
            )));
        }
        if !math::all_finite(input) {
            return Err(Error::InvalidData(
                "input must contain only finite values".to_owned(),
            ));
        }
        Ok(())
    }

    fn check_inputs(&self, inputs: &Inputs) -> Result<()> {
        if inputs.is_empty() {
            return Err(Error::InvalidData("inputs must not be empty".to_owned()));
        }
        if inputs.input_dim() != self.num_inputs() {
            return Err(Error::InvalidShape(format!(
                "inputs input_dim {} does not match perceptron num_inputs {}",
                inputs.input_dim(),
                self.num_inputs()
            )));
        }
        Ok(())
    }
}

fn check_target(t: f32) -> Result<()> {
    if !t.is_finite() {
        return Err(Error::InvalidData(format!("target must be finite, got {t}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUTH_INPUTS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
    const AND: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    const NAND: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

    fn start() -> Perceptron {
        Perceptron::from_parts(vec![1.2, 0.3], -0.5).unwrap()
    }

    fn truth_inputs() -> Inputs {
        Inputs::from_flat(TRUTH_INPUTS.concat(), 2).unwrap()
    }

    fn assert_params(p: &Perceptron, weights: [f32; 2], bias: f32) {
        for (a, b) in p.weights().iter().zip(weights) {
            assert!((a - b).abs() < 1e-6, "{:?} vs {weights:?}", p.weights());
        }
        assert!((p.bias() - bias).abs() < 1e-6, "{} vs {bias}", p.bias());
    }

    #[test]
    fn calc_is_a_step_of_the_weighted_sum() {
        let p = start();
        let outputs: Vec<f32> = TRUTH_INPUTS.iter().map(|x| p.calc(x).unwrap()).collect();
        assert_eq!(outputs, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(p.calc_batch(&truth_inputs()).unwrap(), outputs);

        // Exactly on the boundary fires.
        let edge = Perceptron::from_parts(vec![1.0], -1.0).unwrap();
        assert_eq!(edge.calc(&[1.0]).unwrap(), 1.0);
    }

    #[test]
    fn train_applies_the_perceptron_rule() {
        let p = start();

        // Correct answers leave the parameters alone.
        assert_eq!(p.train(&[1.0, 1.0], 1.0, 0.1).unwrap(), p);

        // [1, 0] fires but should not: error -1.
        assert_params(&p.train(&[1.0, 0.0], 0.0, 0.1).unwrap(), [1.1, 0.3], -0.6);

        // [0, 0] stays silent but should fire (NAND): error +1, only the bias moves.
        assert_params(&p.train(&[0.0, 0.0], 1.0, 0.1).unwrap(), [1.2, 0.3], -0.4);
    }

    #[test]
    fn train_batch_averages_the_updates() {
        let p = start();
        let inputs = truth_inputs();

        assert_params(&p.train_batch(&inputs, &AND, 0.1).unwrap(), [1.175, 0.3], -0.525);
        assert_params(&p.train_batch(&inputs, &NAND, 0.1).unwrap(), [1.15, 0.275], -0.525);
    }

    #[test]
    fn learns_and() {
        let mut p = Perceptron::new_with_seed(2, 42).unwrap();
        for _ in 0..1000 {
            for (x, &t) in TRUTH_INPUTS.iter().zip(&AND) {
                p = p.train(x, t, 0.1).unwrap();
            }
        }
        for (x, &t) in TRUTH_INPUTS.iter().zip(&AND) {
            assert_eq!(p.calc(x).unwrap(), t, "input {x:?}");
        }
    }

    #[test]
    fn rejects_bad_arguments() {
        let p = start();
        assert!(matches!(p.calc(&[1.0]), Err(Error::InvalidShape(_))));
        assert!(matches!(p.train(&[1.0, 0.0], f32::NAN, 0.1), Err(Error::InvalidData(_))));
        assert!(matches!(p.train(&[1.0, 0.0], 1.0, -0.1), Err(Error::InvalidConfig(_))));
        assert!(p.train_batch(&truth_inputs(), &AND[..3], 0.1).is_err());
        assert!(Perceptron::new_with_seed(0, 1).is_err());
        assert!(Perceptron::from_parts(vec![f32::NAN], 0.0).is_err());
    }
}
