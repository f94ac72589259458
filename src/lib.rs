//! A fully-connected feed-forward neural network trained by backpropagation.
//!
//! `fc-net` stacks dense layers (`y = f(W x + b)`), runs them forward, and trains them with
//! per-sample gradient descent on the squared error. The per-sample hot path reuses buffers
//! (`Scratch` / `Gradients`) and does not allocate.
//!
//! # Panics vs `Result`
//!
//! Two layers of API:
//!
//! - Low-level hot path (panics on misuse):
//!   - [`Net::forward`], [`Net::backward`], [`Net::sgd_step`], [`Net::train_step`]
//!     Shape mismatches are programmer error and panic via `assert!`.
//!
//! - High-level API (shape-checked):
//!   - [`init`], [`Net::calc`], [`Net::train`], [`Net::train_set`], [`Net::fit`]
//!     These validate their arguments, return [`Result`], and log a `warn` event through
//!     `tracing` when they reject a call.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f32`.
//! - Layer weights are row-major with shape `(out_dim, in_dim)`; the bias is a separate,
//!   optional `out_dim` vector. [`Layer::from_matrix`] and [`Layer::to_matrix`] convert to
//!   and from the folded "one row per input, bias row last" layout.
//! - [`Dataset`] and [`Inputs`] store samples contiguously in row-major layout.

//! # Quick start
//!
//! ```rust
//! use fc_net::{Activation, ActivationOptions, Dataset, FitConfig, NetOptions, Shuffle, init};
//!
//! # fn main() -> fc_net::Result<()> {
//! let xs = vec![
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![1.0, 0.0],
//!     vec![1.0, 1.0],
//! ];
//! let ys = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
//! let data = Dataset::from_rows(&xs, &ys)?;
//!
//! let options = NetOptions {
//!     seed: Some(0),
//!     activations: ActivationOptions {
//!         all_layers: Some(Activation::Sigmoid),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! let mut net = init(2, 1, &[3], &options)?;
//!
//! let report = net.fit(
//!     &data,
//!     FitConfig {
//!         max_epochs: 100,
//!         learning_rate: Some(0.5),
//!         precision: Some(0.1),
//!         shuffle: Shuffle::Seeded(0),
//!         log_every: None,
//!     },
//! )?;
//! assert!(report.epochs <= 100);
//!
//! let y = net.calc(&[1.0, 0.0])?;
//! assert_eq!(y.len(), 1);
//! # Ok(())
//! # }
//! ```

//! # Allocation-free training (advanced)
//!
//! To drive training yourself, allocate buffers once and reuse them across steps:
//!
//! ```rust
//! use fc_net::{Activation, NetBuilder, loss};
//!
//! # fn main() -> fc_net::Result<()> {
//! let mut net = NetBuilder::new(3)?
//!     .add_layer(8, Activation::Tanh)?
//!     .add_layer(2, Activation::Identity)?
//!     .build_with_seed(0)?;
//!
//! let mut trainer = net.trainer();
//! let x = [0.1_f32, -0.2, 0.3];
//! let t = [0.0_f32, 1.0];
//!
//! let y = net.forward(&x, &mut trainer.scratch);
//! let _sq = loss::output_error(y, &t, trainer.grads.d_output_mut());
//! net.backward(&x, &trainer.scratch, &mut trainer.grads);
//! net.sgd_step(&trainer.grads, 1e-2);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
#[cfg(feature = "serde")]
pub mod config;
pub mod data;
pub mod error;
pub mod layer;
pub mod loss;
pub mod math;
pub(crate) mod matmul;
pub mod net;
pub mod perceptron;
pub mod train;

pub use activation::Activation;
pub use builder::{ActivationOptions, NetBuilder, NetOptions, init};
#[cfg(feature = "serde")]
pub use config::RunConfig;
pub use data::{Dataset, Inputs, Sample};
pub use error::{Error, Result};
pub use layer::{Init, Layer};
pub use loss::Loss;
pub use net::{Gradients, Net, NetMeta, Scratch, Trainer};
pub use perceptron::Perceptron;
pub use train::{FitConfig, FitReport, Shuffle};
