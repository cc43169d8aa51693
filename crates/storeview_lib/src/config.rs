//! Service configuration parsing and validation.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use storeview_common_types::Address;
use url::Url;

/// A [`serde`]-compatible representation of the service's YAML
/// configuration file. Loaded once at startup, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the indexer that archives the world's record log.
    pub indexer_url: Url,
    /// Chain id the world is deployed on.
    pub chain_id: u64,
    /// Address of the world store contract.
    pub world_address: Address,
    /// The port on which the API server should listen.
    #[serde(default = "Config::default_api_port")]
    pub api_port: u16,
    /// Optional display labels for materials, keyed by material name. Used
    /// by the orders view.
    #[serde(default)]
    pub material_labels: HashMap<String, String>,
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("cannot open config file `{}`", path.display()))?;
        serde_yaml::from_reader(file).context("invalid config file")
    }

    fn default_api_port() -> u16 {
        8080
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config: Config = serde_yaml::from_str(
            r#"
            indexerUrl: "https://indexer.example.com"
            chainId: 690
            worldAddress: "0x4ab7e8b94347cb0236e3de126db9c50599f7db2d"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_port, 8080);
        assert!(config.material_labels.is_empty());
        assert_eq!(config.chain_id, 690);
    }

    #[test]
    fn parses_material_labels() {
        let config: Config = serde_yaml::from_str(
            r#"
            indexerUrl: "https://indexer.example.com"
            chainId: 690
            worldAddress: "0x4ab7e8b94347cb0236e3de126db9c50599f7db2d"
            apiPort: 9000
            materialLabels:
              BUG: "Bugs"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_port, 9000);
        assert_eq!(config.material_labels["BUG"], "Bugs");
    }
}
