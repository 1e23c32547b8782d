//! Error types for the gateway module.

use thiserror::Error;

/// Errors surfaced by a ledger gateway.
///
/// The kernel passes these through unchanged; it does not distinguish
/// transient from permanent failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The ledger refused the call.
    #[error("rejected by ledger: {0}")]
    Rejected(String),

    /// The signing capability failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The call could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The confirmation policy was not satisfied in time.
    #[error("timed out waiting for {0}")]
    Timeout(String),
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
