//! Eagerly built parameter registry

use crate::error::{ConsensusError, Result};
use crate::params::{ChainParameters, Network};
use once_cell::sync::Lazy;
use tracing::debug;

/// Parameters for every network, built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRegistry {
    main: ChainParameters,
    test: ChainParameters,
    regtest: ChainParameters,
    unit_test: ChainParameters,
}

impl ChainRegistry {
    pub fn new() -> Self {
        debug!("building chain parameter registry");
        ChainRegistry {
            main: ChainParameters::main(),
            test: ChainParameters::testnet(),
            regtest: ChainParameters::regtest(),
            unit_test: ChainParameters::unit_tests(),
        }
    }

    pub fn get(&self, network: Network) -> &ChainParameters {
        match network {
            Network::Main => &self.main,
            Network::Test => &self.test,
            Network::Regtest => &self.regtest,
            Network::UnitTest => &self.unit_test,
        }
    }

    /// Look up by string id or payment protocol id.
    pub fn lookup(&self, id: &str) -> Result<&ChainParameters> {
        let network: Network = id.parse()?;
        Ok(self.get(network))
    }

    /// Look up by string id only.
    pub fn by_id(&self, id: &str) -> Result<&ChainParameters> {
        Network::from_id(id)
            .map(|network| self.get(network))
            .ok_or_else(|| ConsensusError::UnknownNetwork(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainParameters> {
        Network::ALL.into_iter().map(move |network| self.get(network))
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: Lazy<ChainRegistry> = Lazy::new(ChainRegistry::new);

/// The process-wide registry, built on first use.
pub fn registry() -> &'static ChainRegistry {
    &REGISTRY
}
