//! # Anchor Kernel Permissions
//!
//! Bitmask permissions and content-addressed authorization grants.
//!
//! ## Overview
//!
//! Authority flows down the Namespace → Registry → Entry hierarchy. Whoever
//! creates a namespace or registry holds a root grant with every bit over it.
//! Holders of DELEGATE or ADMIN may hand a subset of their bits to others;
//! namespace admins may also grant into the namespace's registries.
//!
//! ## Key Types
//!
//! - [`Permissions`] - ASSERT / DELEGATE / ADMIN bitmask
//! - [`AuthorizationGrant`] - (scope, delegate, permissions, delegator) with a derived URI
//! - [`DelegationChain`] - Root-to-leaf verification of a grant's provenance
//! - [`GrantIndex`] - Lookup of known grants by URI and by holder
//!
//! Revocation and expiry of grants are handled by the ledger.

pub mod chain;
pub mod error;
pub mod grant;
pub mod permissions;
pub mod state;

pub use chain::DelegationChain;
pub use error::{PermsError, Result};
pub use grant::{check_permission, AuthorizationGrant};
pub use permissions::Permissions;
pub use state::GrantIndex;
