//! Kernel configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! network_scope = "anchor"
//! confirmation = "finalized"
//! validate_before_dispatch = true
//! page_size = 100
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use anchor_kernel_core::NetworkScope;
use anchor_kernel_gateway::ConfirmationPolicy;

use crate::error::{KernelError, Result};

/// Configuration for the Kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelConfig {
    /// Scope segment of every URI this kernel derives.
    pub network_scope: String,

    /// How long `submit` waits.
    pub confirmation: ConfirmationPolicy,

    /// Check entry content against the registry's schema before dispatching.
    pub validate_before_dispatch: bool,

    /// Page size for key enumeration.
    pub page_size: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            network_scope: anchor_kernel_core::uri::DEFAULT_SCOPE.to_string(),
            confirmation: ConfirmationPolicy::InBlock,
            validate_before_dispatch: true,
            page_size: 100,
        }
    }
}

impl KernelConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("parsing kernel config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("loading {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(KernelError::Config("page_size must be positive".into()));
        }
        self.scope()?;
        Ok(())
    }

    /// The parsed network scope.
    pub fn scope(&self) -> Result<NetworkScope> {
        NetworkScope::new(self.network_scope.clone())
            .map_err(|e| KernelError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = KernelConfig::from_toml_str("").unwrap();
        assert_eq!(config, KernelConfig::default());
        assert_eq!(config.scope().unwrap(), NetworkScope::default());
    }

    #[test]
    fn test_parse() {
        let config = KernelConfig::from_toml_str(
            r#"
            network_scope = "testnet"
            confirmation = "finalized"
            validate_before_dispatch = false
            page_size = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.network_scope, "testnet");
        assert_eq!(config.confirmation, ConfirmationPolicy::Finalized);
        assert!(!config.validate_before_dispatch);
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(KernelConfig::from_toml_str("page_size = 0").is_err());
        assert!(KernelConfig::from_toml_str("confirmation = \"eventually\"").is_err());
        assert!(KernelConfig::from_toml_str("batch_size = 5").is_err());
        assert!(KernelConfig::from_toml_str("network_scope = \"a:b\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_size = 7").unwrap();
        let config = KernelConfig::load(file.path()).unwrap();
        assert_eq!(config.page_size, 7);

        let err = KernelConfig::load("/nonexistent/anchor.toml").unwrap_err();
        assert!(err.to_string().contains("reading"));
    }
}
