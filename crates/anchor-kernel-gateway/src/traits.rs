//! LedgerGateway trait: the consumed interface to the ledger.
//!
//! The kernel never owns ledger state. It asks whether records exist, hands
//! prepared calls over for inclusion, and optionally pages through anchored
//! keys. Retries, batching and transport are the gateway's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use anchor_kernel_core::{Digest, EntityKind, Uri};

use crate::call::Call;
use crate::error::Result;
use crate::signer::{KeyContext, Signer};

/// How far a submission must progress before `submit` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationPolicy {
    /// Included in a block.
    #[default]
    InBlock,
    /// Included and finalized.
    Finalized,
}

/// Proof that a call was included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Transaction hash.
    pub tx: Digest,
    /// Block the call landed in.
    pub block: u64,
    pub finalized: bool,
}

/// One page of anchored keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub keys: Vec<Uri>,
    /// Cursor for the next page, if any.
    pub next: Option<Uri>,
}

/// The ledger as seen by the kernel.
///
/// # Design Notes
///
/// - **No locks**: `exists` followed by `submit` is check-then-act. The
///   ledger enforces the same guards when the call lands.
/// - **Pass-through errors**: failures come back as [`GatewayError`](crate::GatewayError)
///   and are not retried by the caller.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Whether a record with this URI is anchored.
    async fn exists(&self, uri: &Uri) -> Result<bool>;

    /// Sign and submit a call, waiting until `policy` is satisfied.
    async fn submit(
        &self,
        call: &Call,
        signer: &dyn Signer,
        key: &KeyContext,
        policy: ConfirmationPolicy,
    ) -> Result<Confirmation>;

    /// Enumerate anchored keys of one kind, `page_size` at a time, starting
    /// after `cursor`.
    async fn query_paged(
        &self,
        kind: EntityKind,
        page_size: usize,
        cursor: Option<&Uri>,
    ) -> Result<Page>;
}
