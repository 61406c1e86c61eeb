//! Configuration for selecting consensus parameters.

use crate::error::{ConsensusError, Result};
use crate::params::{ChainParameters, Network};
use crate::registry::registry;
use crate::types::{BlockHash, Height};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Which network to validate against, plus any locally trusted checkpoints.
///
/// ```json
/// { "network": "org.ulord.regtest", "checkpoints": { "100": "<block hash>" } }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ConsensusConfig {
    /// Network string id or payment protocol id.
    pub network: String,

    /// Extra checkpoints by height. They must agree with the built-in ones.
    pub checkpoints: BTreeMap<Height, BlockHash>,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            network: Network::Main.id().to_string(),
            checkpoints: BTreeMap::new(),
        }
    }
}

impl ConsensusConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConsensusError::Config(format!("invalid config: {e}")))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| ConsensusError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn network(&self) -> Result<Network> {
        self.network.parse()
    }

    /// Parameters for the configured network with the extra checkpoints applied.
    pub fn chain_parameters(&self) -> Result<ChainParameters> {
        let network = self.network()?;
        let params = registry()
            .get(network)
            .clone()
            .with_checkpoints(self.checkpoints.iter().map(|(height, hash)| (*height, *hash)))?;

        info!(
            %network,
            checkpoints = params.checkpoints.len(),
            "loaded consensus parameters"
        );
        Ok(params)
    }
}
