//! # Anchor Kernel
//!
//! Content-addressed records with permissioned lifecycles, anchored to an
//! externally owned ledger.
//!
//! ## Overview
//!
//! - **Records**: schemas, namespaces, registries and entries whose URIs are
//!   derived from their canonical content
//! - **Grants**: bitmask permissions delegated down Namespace → Registry → Entry
//! - **Lifecycle**: entries are created, updated, revoked, reinstated and
//!   handed to new owners; never deleted
//! - **Gateway**: the ledger is reached only through [`LedgerGateway`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use anchor_kernel::{Kernel, KernelConfig};
//! use anchor_kernel::core::Keypair;
//! use anchor_kernel::gateway::{KeypairSigner, MemoryGateway};
//! use anchor_kernel::perms::AuthorizationGrant;
//! use serde_json::json;
//!
//! async fn example() -> anchor_kernel::Result<()> {
//!     let signer = KeypairSigner::new(Keypair::generate());
//!     let key = signer.key_context();
//!     let kernel = Kernel::new(
//!         Arc::new(MemoryGateway::new()),
//!         Arc::new(signer),
//!         key,
//!         KernelConfig::default(),
//!     )?;
//!
//!     let namespace = kernel.create_namespace(&json!({"name": "acme"})).await?;
//!     let admin = AuthorizationGrant::root(&namespace.uri, kernel.account())?;
//!     let registry = kernel
//!         .create_registry(&namespace.uri, &admin, &json!({"name": "parts"}), None)
//!         .await?;
//!
//!     let owner = AuthorizationGrant::root(&registry.uri, kernel.account())?;
//!     let entry = kernel
//!         .create_entry(&registry, &owner, &json!({"sku": "A-1"}), None)
//!         .await?;
//!     kernel.revoke_entry(&entry, &owner).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `anchor_kernel::core` - Canonical encoding, identifiers, validation
//! - `anchor_kernel::perms` - Permissions and grants
//! - `anchor_kernel::gateway` - Ledger gateway contract and in-memory ledger

pub mod config;
pub mod error;
pub mod kernel;

// Re-export component crates
pub use anchor_kernel_core as core;
pub use anchor_kernel_gateway as gateway;
pub use anchor_kernel_perms as perms;

// Re-export main types for convenience
pub use config::KernelConfig;
pub use error::{ErrorKind, KernelError, Result};
pub use kernel::Kernel;

// Re-export commonly used types
pub use anchor_kernel_core::{
    Did, Digest, EntityKind, EntryRecord, EntryState, Keypair, NamespaceRecord, RegistryRecord,
    SchemaDefinition, SchemaRecord, Transition, Uri,
};
pub use anchor_kernel_gateway::{ConfirmationPolicy, LedgerGateway, MemoryGateway, Signer};
pub use anchor_kernel_perms::{AuthorizationGrant, Permissions};
