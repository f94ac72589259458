use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::net::{check_learning_rate, check_precision};
use crate::{Dataset, Error, Loss, Net, Result, Scratch, math};

/// Order in which a pass over a dataset visits the samples.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shuffle {
    /// Storage order.
    #[default]
    None,
    /// Reshuffled every pass by an RNG seeded once with this value.
    Seeded(u64),
    /// Reshuffled every pass by an RNG seeded from the OS.
    Random,
}

impl Shuffle {
    fn rng(self) -> Option<StdRng> {
        match self {
            Shuffle::None => None,
            Shuffle::Seeded(seed) => Some(StdRng::seed_from_u64(seed)),
            Shuffle::Random => Some(StdRng::from_entropy()),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    pub max_epochs: usize,
    /// Falls back to the net's own learning rate.
    pub learning_rate: Option<f32>,
    /// Falls back to the net's own precision.
    pub precision: Option<f32>,
    pub shuffle: Shuffle,
    /// Log progress every `n` epochs at `info`.
    pub log_every: Option<usize>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_epochs: 1000,
            learning_rate: None,
            precision: None,
            shuffle: Shuffle::None,
            log_every: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitReport {
    /// Completed passes over the dataset.
    pub epochs: usize,
    /// Largest absolute output deviation over the dataset after the last epoch.
    pub max_error: f32,
    /// Mean per-sample `Loss::MeanSquared` after the last epoch.
    pub loss: f32,
    pub converged: bool,
}

impl Net {
    /// Check that `data` is non-empty and matches this net's input and output widths.
    pub fn check_dataset(&self, data: &Dataset) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidData("dataset must not be empty".to_owned()));
        }
        if data.input_dim() != self.input_dim() {
            return Err(Error::InvalidShape(format!(
                "dataset input_dim {} does not match net input_dim {}",
                data.input_dim(),
                self.input_dim()
            )));
        }
        if data.target_dim() != self.output_dim() {
            return Err(Error::InvalidShape(format!(
                "dataset target_dim {} does not match net output_dim {}",
                data.target_dim(),
                self.output_dim()
            )));
        }
        Ok(())
    }

    /// One gradient-descent step on one sample.
    ///
    /// Returns the updated net; `self` is left untouched.
    pub fn train(&self, input: &[f32], expected: &[f32], lr: f32) -> Result<Net> {
        self.check_sample(input, Some(expected))
            .and_then(|()| check_learning_rate(lr))
            .map_err(|e| e.logged("train"))?;

        let mut next = self.clone();
        let mut trainer = next.trainer();
        next.train_step(input, expected, lr, &mut trainer);
        next.meta.updated_at = Utc::now();
        Ok(next)
    }

    /// One gradient-descent step per sample of `data`.
    ///
    /// Returns the updated net; `self` is left untouched.
    pub fn train_set(&self, data: &Dataset, lr: f32, shuffle: Shuffle) -> Result<Net> {
        self.check_dataset(data)
            .and_then(|()| check_learning_rate(lr))
            .map_err(|e| e.logged("train_set"))?;

        let mut next = self.clone();
        let mut trainer = next.trainer();
        let mut order: Vec<usize> = (0..data.len()).collect();
        if let Some(mut rng) = shuffle.rng() {
            order.shuffle(&mut rng);
        }
        for &idx in &order {
            next.train_step(data.input(idx), data.target(idx), lr, &mut trainer);
        }
        next.meta.updated_at = Utc::now();
        Ok(next)
    }

    /// Train in place until every output is within `precision` of its target, or until
    /// `max_epochs` passes have run.
    ///
    /// Buffers are allocated once up front; epochs do not allocate.
    pub fn fit(&mut self, data: &Dataset, cfg: FitConfig) -> Result<FitReport> {
        let lr = cfg.learning_rate.unwrap_or(self.meta.learning_rate);
        let precision = cfg.precision.unwrap_or(self.meta.precision);
        self.check_dataset(data)
            .and_then(|()| check_learning_rate(lr))
            .and_then(|()| check_precision(precision))
            .and_then(|()| {
                if cfg.max_epochs == 0 {
                    Err(Error::InvalidConfig("max_epochs must be > 0".to_owned()))
                } else {
                    Ok(())
                }
            })
            .map_err(|e| e.logged("fit"))?;

        let mut trainer = self.trainer();
        let mut order: Vec<usize> = (0..data.len()).collect();
        let mut rng = cfg.shuffle.rng();

        let (mut max_error, mut loss) = self.measure(data, &mut trainer.scratch);
        let mut epochs = 0;
        while max_error > precision && epochs < cfg.max_epochs {
            if let Some(rng) = rng.as_mut() {
                order.shuffle(rng);
            }
            for &idx in &order {
                self.train_step(data.input(idx), data.target(idx), lr, &mut trainer);
            }
            epochs += 1;
            (max_error, loss) = self.measure(data, &mut trainer.scratch);

            if let Some(every) = cfg.log_every {
                if every > 0 && epochs.is_multiple_of(every) {
                    tracing::info!(epoch = epochs, max_error, loss, "training");
                }
            }
        }

        if epochs > 0 {
            self.meta.updated_at = Utc::now();
        }
        let converged = max_error <= precision;
        if !max_error.is_finite() {
            tracing::warn!(epochs, lr, "training diverged");
        }
        tracing::info!(epochs, max_error, loss, converged, "fit finished");

        Ok(FitReport {
            epochs,
            max_error,
            loss,
            converged,
        })
    }

    /// Mean per-sample loss over `data`.
    pub fn evaluate(&self, data: &Dataset, loss: Loss) -> Result<f32> {
        self.check_dataset(data).map_err(|e| e.logged("evaluate"))?;

        let mut scratch = self.scratch();
        let mut total = 0.0_f32;
        for (input, target) in data.iter() {
            total += loss.compute(self.forward(input, &mut scratch), target);
        }
        Ok(total / data.len() as f32)
    }

    /// Largest absolute deviation between any output and its target over `data`.
    pub fn max_error(&self, data: &Dataset) -> Result<f32> {
        self.check_dataset(data).map_err(|e| e.logged("max_error"))?;

        let mut scratch = self.scratch();
        Ok(self.measure(data, &mut scratch).0)
    }

    // (max abs deviation, mean MeanSquared loss)
    fn measure(&self, data: &Dataset, scratch: &mut Scratch) -> (f32, f32) {
        let mut max_error = 0.0_f32;
        let mut total = 0.0_f32;
        for (input, target) in data.iter() {
            let y = self.forward(input, scratch);
            let diff = math::max_abs_diff(y, target);
            // NaN must win so that divergence is reported.
            if diff.is_nan() || diff > max_error {
                max_error = diff;
            }
            total += Loss::MeanSquared.compute(y, target);
        }
        (max_error, total / data.len() as f32)
    }
}
