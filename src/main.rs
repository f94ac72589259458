//! Train a net on one of a few small demo problems and print what it learned.
//!
//! ```text
//! cargo run -- xor
//! cargo run -- ackermann --hidden 8 --epochs 20000 --lr 0.05
//! cargo run -- half-adder --config run.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fc_net::{Activation, ActivationOptions, Dataset, FitConfig, NetOptions, RunConfig, Shuffle};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Train a fully-connected net on a demo problem")]
struct Args {
    /// Problem to learn
    #[arg(value_enum, default_value_t = Task::Xor)]
    task: Task,

    /// JSON run configuration; replaces the task's defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hidden layer sizes, comma separated
    #[arg(long, value_delimiter = ',')]
    hidden: Option<Vec<usize>>,

    /// Maximum number of epochs
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Learning rate
    #[arg(long)]
    lr: Option<f32>,

    /// Stop once every output is this close to its target
    #[arg(long)]
    precision: Option<f32>,

    /// Seed for weight initialisation and shuffling
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Task {
    Xor,
    And,
    HalfAdder,
    Double,
    Ackermann,
}

impl Task {
    fn data(self) -> Result<Dataset> {
        let truth = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let data = match self {
            Task::Xor => Dataset::from_rows(&truth, &[vec![0.0], vec![1.0], vec![1.0], vec![0.0]]),
            Task::And => Dataset::from_rows(&truth, &[vec![0.0], vec![0.0], vec![0.0], vec![1.0]]),
            // (sum, carry)
            Task::HalfAdder => Dataset::from_rows(
                &truth,
                &[vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
            ),
            Task::Double => {
                let xs: Vec<Vec<f32>> = (1..=5).map(|i| vec![i as f32 / 5.0]).collect();
                let ys: Vec<Vec<f32>> = xs.iter().map(|x| vec![2.0 * x[0]]).collect();
                Dataset::from_rows(&xs, &ys)
            }
            // A(3, n) = 2^(n + 3) - 3, scaled into [0, 1].
            Task::Ackermann => {
                let n_max = 5;
                let top = ackermann(3, n_max) as f32;
                let xs: Vec<Vec<f32>> = (0..=n_max).map(|n| vec![n as f32 / n_max as f32]).collect();
                let ys: Vec<Vec<f32>> = (0..=n_max)
                    .map(|n| vec![ackermann(3, n) as f32 / top])
                    .collect();
                Dataset::from_rows(&xs, &ys)
            }
        };
        Ok(data?)
    }

    fn defaults(self) -> RunConfig {
        let (hidden, activations, lr, max_epochs) = match self {
            Task::Xor | Task::HalfAdder => (
                vec![4],
                ActivationOptions {
                    all_layers: Some(Activation::Sigmoid),
                    ..Default::default()
                },
                0.5,
                20_000,
            ),
            Task::And => (
                vec![],
                ActivationOptions {
                    output_layer: Some(Activation::Sigmoid),
                    ..Default::default()
                },
                0.5,
                5_000,
            ),
            Task::Double => (
                vec![],
                ActivationOptions {
                    output_layer: Some(Activation::Identity),
                    ..Default::default()
                },
                0.1,
                1_000,
            ),
            Task::Ackermann => (
                vec![8],
                ActivationOptions {
                    all_hidden_layers: Some(Activation::Tanh),
                    output_layer: Some(Activation::Identity),
                    ..Default::default()
                },
                0.05,
                20_000,
            ),
        };

        RunConfig {
            net: NetOptions {
                title: Some(format!("{self:?}").to_lowercase()),
                seed: Some(0),
                activations,
                ..Default::default()
            },
            hidden,
            fit: FitConfig {
                max_epochs,
                learning_rate: Some(lr),
                precision: Some(0.05),
                shuffle: Shuffle::Seeded(0),
                log_every: Some(max_epochs / 10),
            },
        }
    }
}

fn ackermann(m: u64, n: u64) -> u64 {
    let mut stack = vec![m];
    let mut n = n;
    while let Some(m) = stack.pop() {
        if m == 0 {
            n += 1;
        } else if n == 0 {
            stack.push(m - 1);
            n = 1;
        } else {
            stack.push(m - 1);
            stack.push(m);
            n -= 1;
        }
    }
    n
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let mut cfg = match &args.config {
        Some(path) => {
            RunConfig::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => args.task.defaults(),
    };
    if let Some(hidden) = args.hidden {
        cfg.hidden = hidden;
    }
    if let Some(epochs) = args.epochs {
        cfg.fit.max_epochs = epochs;
    }
    if args.lr.is_some() {
        cfg.fit.learning_rate = args.lr;
    }
    if args.precision.is_some() {
        cfg.fit.precision = args.precision;
    }
    if let Some(seed) = args.seed {
        cfg.net.seed = Some(seed);
        cfg.fit.shuffle = Shuffle::Seeded(seed);
    }

    let data = args.task.data()?;
    let mut net = cfg
        .build(data.input_dim(), data.target_dim())
        .context("building net")?;

    println!("task: {:?}, hidden: {:?}", args.task, cfg.hidden);
    let report = net.fit(&data, cfg.fit).context("training")?;
    println!(
        "epochs: {}, max error: {:.4}, loss: {:.6}, converged: {}",
        report.epochs, report.max_error, report.loss, report.converged
    );

    for (input, target) in data.iter() {
        let output = net.calc(input)?;
        println!("{input:?} -> {output:.3?} (target {target:?})");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ackermann_small_values() {
        assert_eq!(ackermann(0, 0), 1);
        assert_eq!(ackermann(1, 2), 4);
        assert_eq!(ackermann(2, 3), 9);
        assert_eq!(ackermann(3, 3), 61);
    }

    #[test]
    fn every_task_builds_a_matching_net() {
        for task in Task::value_variants() {
            let data = task.data().unwrap();
            let net = task.defaults().build(data.input_dim(), data.target_dim()).unwrap();
            assert_eq!(net.input_dim(), data.input_dim());
            assert_eq!(net.output_dim(), data.target_dim());
        }
    }
}
