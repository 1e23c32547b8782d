//! # Anchor Kernel Gateway
//!
//! The contract between the kernel and the ledger that anchors its records.
//!
//! ## Key Types
//!
//! - [`LedgerGateway`] - Existence checks, submission and paged key queries
//! - [`Call`] - A prepared transition, the unit that gets signed
//! - [`Signer`] - Injected signing capability
//! - [`MemoryGateway`] - In-memory ledger enforcing the same guards
//!
//! ## Design Notes
//!
//! The kernel is stateless with respect to the ledger. It never caches
//! existence answers and never retries; the gateway owns transport,
//! batching and confirmation tracking.

pub mod call;
pub mod error;
pub mod memory;
pub mod signer;
pub mod traits;

pub use call::Call;
pub use error::{GatewayError, Result};
pub use memory::MemoryGateway;
pub use signer::{KeyContext, KeypairSigner, Signer};
pub use traits::{Confirmation, ConfirmationPolicy, LedgerGateway, Page};
