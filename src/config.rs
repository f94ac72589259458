//! JSON run configuration: how to build a net and how to train it.
//!
//! ```json
//! {
//!   "net": { "title": "xor", "seed": 7, "activations": { "all_layers": { "kind": "sigmoid" } } },
//!   "hidden": [3],
//!   "fit": { "max_epochs": 5000, "learning_rate": 0.5, "precision": 0.05 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, FitConfig, Net, NetOptions, Result, builder};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub net: NetOptions,
    /// Hidden layer sizes; the input and output widths come from the data.
    pub hidden: Vec<usize>,
    pub fit: FitConfig,
}

impl RunConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::from(e).logged("config"))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read {}: {e}", path.display())).logged("config")
        })?;
        tracing::debug!(path = %path.display(), "loaded run config");
        Self::from_json_str(&json)
    }

    /// Initialise a net for `num_inputs` inputs and `num_outputs` outputs.
    pub fn build(&self, num_inputs: usize, num_outputs: usize) -> Result<Net> {
        builder::init(num_inputs, num_outputs, &self.hidden, &self.net)
    }
}
