//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: several parties, each with its
//! own kernel, all talking to one shared [`MemoryGateway`].

use std::sync::{Arc, Once};

use serde_json::json;

use anchor_kernel::{Kernel, KernelConfig, Result};
use anchor_kernel_core::{Did, Keypair, NamespaceRecord, RegistryRecord};
use anchor_kernel_gateway::{KeypairSigner, MemoryGateway};
use anchor_kernel_perms::AuthorizationGrant;

/// A shared in-memory ledger and the config every party's kernel uses.
pub struct TestFixture {
    pub gateway: Arc<MemoryGateway>,
    pub config: KernelConfig,
}

/// A namespace and a registry inside it, with their creator's root grants.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub namespace: NamespaceRecord,
    pub namespace_admin: AuthorizationGrant,
    pub registry: RegistryRecord,
    pub registry_admin: AuthorizationGrant,
}

impl TestFixture {
    /// Create a fixture over an empty ledger with the default config.
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    pub fn with_config(config: KernelConfig) -> Self {
        Self {
            gateway: Arc::new(MemoryGateway::new()),
            config,
        }
    }

    /// Deterministic identity for a party.
    pub fn did(seed: u8) -> Did {
        Keypair::from_seed(&[seed; 32]).did()
    }

    /// A kernel acting as the party with this seed.
    pub fn party(&self, seed: u8) -> Kernel<MemoryGateway> {
        let signer = KeypairSigner::new(Keypair::from_seed(&[seed; 32]));
        let key = signer.key_context();
        Kernel::new(
            Arc::clone(&self.gateway),
            Arc::new(signer),
            key,
            self.config.clone(),
        )
        .expect("fixture config is valid")
    }

    /// Create a namespace and a schema-less registry as `kernel`.
    pub async fn bootstrap(&self, kernel: &Kernel<MemoryGateway>) -> Result<Bootstrap> {
        let namespace = kernel
            .create_namespace(&json!({"name": "fixture", "creator": kernel.account().to_string()}))
            .await?;
        let namespace_admin = AuthorizationGrant::root(&namespace.uri, kernel.account())?;
        let registry = kernel
            .create_registry(&namespace.uri, &namespace_admin, &json!({"name": "items"}), None)
            .await?;
        let registry_admin = AuthorizationGrant::root(&registry.uri, kernel.account())?;
        Ok(Bootstrap {
            namespace,
            namespace_admin,
            registry,
            registry_admin,
        })
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .try_init();
    });
}
