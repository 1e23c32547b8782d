//! Error types for the Kernel.

use std::fmt;

use anchor_kernel_core::{CoreError, LifecycleError, ValidationError};
use anchor_kernel_gateway::GatewayError;
use anchor_kernel_perms::PermsError;
use thiserror::Error;

/// Errors that can occur during Kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Input could not be encoded or parsed.
    #[error("malformed input: {0}")]
    Malformed(#[from] CoreError),

    /// Structural or self-certification failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The transition is not allowed given the ledger's answer.
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Permission error.
    #[error("authorization error: {0}")]
    Authorization(#[from] PermsError),

    /// The gateway failed; passed through unchanged.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] GatewayError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// The externally visible error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedInput,
    Validation,
    IdentifierMismatch,
    AlreadyExists,
    NotFound,
    Authorization,
    Dispatch,
}

impl KernelError {
    /// Which kind this error belongs to. Every error has exactly one.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KernelError::Malformed(_) | KernelError::Config(_) => ErrorKind::MalformedInput,
            KernelError::Validation(ValidationError::Malformed(_)) => ErrorKind::MalformedInput,
            KernelError::Validation(e) if e.is_identifier_mismatch() => {
                ErrorKind::IdentifierMismatch
            }
            KernelError::Validation(_) => ErrorKind::Validation,
            KernelError::Lifecycle(LifecycleError::NotFound(_)) => ErrorKind::NotFound,
            KernelError::Lifecycle(LifecycleError::AlreadyExists(_)) => ErrorKind::AlreadyExists,
            KernelError::Authorization(_) => ErrorKind::Authorization,
            KernelError::Dispatch(_) => ErrorKind::Dispatch,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedInput => "MalformedInputError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::IdentifierMismatch => "IdentifierMismatchError",
            ErrorKind::AlreadyExists => "AlreadyExistsError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Authorization => "AuthorizationError",
            ErrorKind::Dispatch => "DispatchError",
        };
        f.write_str(name)
    }
}

/// Result type for Kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let mismatch = KernelError::from(ValidationError::IdentifierMismatch {
            declared: "a".into(),
            derived: "b".into(),
        });
        assert_eq!(mismatch.kind(), ErrorKind::IdentifierMismatch);

        let malformed =
            KernelError::from(ValidationError::Malformed(CoreError::MalformedInput("x".into())));
        assert_eq!(malformed.kind(), ErrorKind::MalformedInput);

        let missing = KernelError::from(LifecycleError::NotFound("entry:anchor:x".into()));
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.kind().to_string(), "NotFoundError");

        let denied = KernelError::from(PermsError::SelfDelegation);
        assert_eq!(denied.kind(), ErrorKind::Authorization);

        let dispatch = KernelError::from(GatewayError::Unavailable("down".into()));
        assert_eq!(dispatch.kind(), ErrorKind::Dispatch);
    }
}
