//! Network construction.
//!
//! Two entry points:
//!
//! - [`init`] takes the classic `(inputs, outputs, hidden sizes, options)` description and
//!   resolves one activation per layer from [`ActivationOptions`].
//! - [`NetBuilder`] defines the layer stack explicitly.
//!
//! Unless told otherwise, weights are drawn from an initialiser suited to the activation:
//!
//! - `sigmoid` / `tanh` / `identity` and the other saturating or linear functions: Xavier/Glorot
//! - `relu` / `leaky relu`: He/Kaiming

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::net::{check_learning_rate, check_precision};
use crate::{Activation, Error, Init, Layer, Net, NetMeta, Result};

/// Per-layer activation choices for [`init`].
///
/// Hidden layer `i` uses `hidden_layers[i]`, then `all_hidden_layers`, then `all_layers`,
/// then `Sigmoid`. The output layer uses `output_layer`, then `all_layers`, then `ReLU`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivationOptions {
    pub all_layers: Option<Activation>,
    pub all_hidden_layers: Option<Activation>,
    pub hidden_layers: Vec<Activation>,
    pub output_layer: Option<Activation>,
}

impl ActivationOptions {
    pub fn hidden(&self, idx: usize) -> Activation {
        self.hidden_layers
            .get(idx)
            .copied()
            .or(self.all_hidden_layers)
            .or(self.all_layers)
            .unwrap_or(Activation::Sigmoid)
    }

    pub fn output(&self) -> Activation {
        self.output_layer
            .or(self.all_layers)
            .unwrap_or(Activation::ReLU)
    }
}

/// Options for [`init`]. Every field is optional.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub learning_rate: Option<f32>,
    pub precision: Option<f32>,
    /// Build every layer without a bias term.
    pub no_bias: bool,
    /// Seed for weight initialisation; entropy is used when absent.
    pub seed: Option<u64>,
    /// Override the per-activation default initialiser.
    pub init: Option<Init>,
    pub activations: ActivationOptions,
}

impl NetOptions {
    fn meta(&self) -> Result<NetMeta> {
        let mut meta = NetMeta {
            title: self.title.clone(),
            description: self.description.clone(),
            ..NetMeta::default()
        };
        if let Some(lr) = self.learning_rate {
            meta.learning_rate = lr;
        }
        if let Some(precision) = self.precision {
            meta.precision = precision;
        }
        meta.validate()?;
        Ok(meta)
    }
}

/// Create a randomly initialised net.
///
/// The result has `hidden.len() + 1` layers: one per hidden size, then the output layer.
///
/// ```rust
/// use fc_net::{Activation, ActivationOptions, NetOptions, init};
///
/// # fn main() -> fc_net::Result<()> {
/// let options = NetOptions {
///     seed: Some(7),
///     activations: ActivationOptions {
///         all_hidden_layers: Some(Activation::Tanh),
///         ..Default::default()
///     },
///     ..Default::default()
/// };
/// let net = init(2, 1, &[4, 3], &options)?;
/// assert_eq!(net.num_layers(), 3);
/// # Ok(())
/// # }
/// ```
pub fn init(
    num_inputs: usize,
    num_outputs: usize,
    hidden: &[usize],
    options: &NetOptions,
) -> Result<Net> {
    build_from_options(num_inputs, num_outputs, hidden, options).map_err(|e| e.logged("init"))
}

fn build_from_options(
    num_inputs: usize,
    num_outputs: usize,
    hidden: &[usize],
    options: &NetOptions,
) -> Result<Net> {
    let acts = &options.activations;
    if acts.hidden_layers.len() > hidden.len() {
        return Err(Error::InvalidConfig(format!(
            "{} hidden activations given for {} hidden layers",
            acts.hidden_layers.len(),
            hidden.len()
        )));
    }

    let mut builder = NetBuilder::new(num_inputs)?;
    for (i, &size) in hidden.iter().enumerate() {
        builder = builder.add_layer(size, acts.hidden(i))?;
    }
    builder = builder.add_layer(num_outputs, acts.output())?;

    if options.no_bias {
        builder = builder.no_bias();
    }
    if let Some(init) = options.init {
        builder = builder.init(init);
    }
    builder = builder.meta(options.meta()?);

    match options.seed {
        Some(seed) => builder.build_with_seed(seed),
        None => builder.build_with_rng(&mut StdRng::from_entropy()),
    }
}

#[derive(Debug, Clone, Copy)]
struct LayerSpec {
    out_dim: usize,
    activation: Activation,
}

#[derive(Debug, Clone)]
/// Builder for a `Net`.
///
/// Example:
///
/// ```rust
/// use fc_net::{Activation, NetBuilder};
///
/// # fn main() -> fc_net::Result<()> {
/// let net = NetBuilder::new(2)?
///     .add_layer(8, Activation::ReLU)?
///     .add_layer(1, Activation::Sigmoid)?
///     .build_with_seed(0)?;
/// assert_eq!(net.output_dim(), 1);
/// # Ok(())
/// # }
/// ```
pub struct NetBuilder {
    input_dim: usize,
    layers: Vec<LayerSpec>,
    bias: bool,
    init: Option<Init>,
    meta: Option<NetMeta>,
}

impl NetBuilder {
    /// Start building a net that accepts inputs of length `input_dim`.
    pub fn new(input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidConfig("input_dim must be > 0".to_owned()));
        }
        Ok(Self {
            input_dim,
            layers: Vec::new(),
            bias: true,
            init: None,
            meta: None,
        })
    }

    /// Convenience constructor from a sizes list + activations.
    ///
    /// `sizes` includes input and output dimensions, so its length must be at least 2.
    /// `activations` must have length `sizes.len() - 1`.
    pub fn from_sizes(sizes: &[usize], activations: &[Activation]) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(Error::InvalidConfig(
                "sizes must include input and output dims".to_owned(),
            ));
        }
        if activations.len() != sizes.len() - 1 {
            return Err(Error::InvalidConfig(format!(
                "activations length {} does not match sizes.len() - 1 ({})",
                activations.len(),
                sizes.len() - 1
            )));
        }

        let mut b = Self::new(sizes[0])?;
        for (out_dim, &act) in sizes[1..].iter().zip(activations) {
            b = b.add_layer(*out_dim, act)?;
        }
        Ok(b)
    }

    /// Add a dense layer with `out_dim` neurons.
    pub fn add_layer(mut self, out_dim: usize, activation: Activation) -> Result<Self> {
        if out_dim == 0 {
            return Err(Error::InvalidConfig("layer out_dim must be > 0".to_owned()));
        }
        activation.validate()?;

        self.layers.push(LayerSpec {
            out_dim,
            activation,
        });
        Ok(self)
    }

    /// Build every layer without a bias term.
    pub fn no_bias(mut self) -> Self {
        self.bias = false;
        self
    }

    /// Use `init` for every layer instead of the per-activation default.
    pub fn init(mut self, init: Init) -> Self {
        self.init = Some(init);
        self
    }

    /// Attach metadata (title, learning rate, precision, ...).
    pub fn meta(mut self, meta: NetMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Shorthand for setting the default learning rate in the metadata.
    pub fn learning_rate(mut self, lr: f32) -> Self {
        self.meta.get_or_insert_with(NetMeta::default).learning_rate = lr;
        self
    }

    /// Shorthand for setting the convergence precision in the metadata.
    pub fn precision(mut self, precision: f32) -> Self {
        self.meta.get_or_insert_with(NetMeta::default).precision = precision;
        self
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<Net> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build using the provided RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Net> {
        if self.layers.is_empty() {
            return Err(Error::InvalidConfig(
                "net must have at least one layer".to_owned(),
            ));
        }
        let meta = self.meta.unwrap_or_default();
        check_learning_rate(meta.learning_rate)?;
        check_precision(meta.precision)?;

        let mut layers = Vec::with_capacity(self.layers.len());
        let mut in_dim = self.input_dim;
        for spec in self.layers {
            let init = self
                .init
                .unwrap_or_else(|| default_init_for_activation(spec.activation));
            let layer =
                Layer::new_with_rng(in_dim, spec.out_dim, spec.activation, self.bias, init, rng)?;
            layers.push(layer);
            in_dim = spec.out_dim;
        }

        tracing::debug!(
            input_dim = self.input_dim,
            layers = layers.len(),
            bias = self.bias,
            "built net"
        );
        Net::from_layers(layers)?.with_meta(meta)
    }
}

/// The initialiser used for a layer when none is configured.
#[inline]
pub fn default_init_for_activation(act: Activation) -> Init {
    match act {
        Activation::ReLU | Activation::LeakyReLU { .. } => Init::He,
        Activation::Identity
        | Activation::Sigmoid
        | Activation::Tanh
        | Activation::HardTanh
        | Activation::Softplus
        | Activation::Softmax
        | Activation::Binary => Init::Xavier,
    }
}
