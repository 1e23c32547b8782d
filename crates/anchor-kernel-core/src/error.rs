//! Error types for the Anchor Kernel Core.

use thiserror::Error;

use crate::validation::ValidationReport;

/// Core errors raised while encoding records or parsing identifiers.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid uri: {0}")]
    InvalidUri(String),

    #[error("invalid network scope: {0:?}")]
    InvalidScope(String),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Validation errors for record structure and identifier self-consistency.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unknown meta-schema: {0:?}")]
    UnknownMetaSchema(String),

    #[error("structural validation failed: {0}")]
    Structural(ValidationReport),

    #[error("record does not declare an identifier")]
    MissingIdentifier,

    #[error("identifier mismatch: declared {declared}, derived {derived}")]
    IdentifierMismatch { declared: String, derived: String },

    #[error("digest mismatch: declared {declared}, computed {computed}")]
    DigestMismatch { declared: String, computed: String },

    #[error("registry is bound to schema {expected}, got {got}")]
    SchemaMismatch { expected: String, got: String },

    #[error("entry belongs to registry {expected}, got {got}")]
    RegistryMismatch { expected: String, got: String },

    #[error(transparent)]
    Malformed(#[from] CoreError),
}

impl ValidationError {
    /// Whether this error is a tamper/self-certification failure rather than
    /// a structural one.
    pub fn is_identifier_mismatch(&self) -> bool {
        matches!(
            self,
            ValidationError::IdentifierMismatch { .. } | ValidationError::DigestMismatch { .. }
        )
    }
}

/// A lifecycle transition attempted from a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("{0} is not anchored")]
    NotFound(String),

    #[error("{0} is already anchored")]
    AlreadyExists(String),
}
