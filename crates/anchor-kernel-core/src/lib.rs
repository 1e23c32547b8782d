//! # Anchor Kernel Core
//!
//! Pure primitives for the Anchor Kernel: canonical encoding, identifier
//! derivation, and structural validation of anchored records.
//!
//! This crate contains no I/O and no ledger access. Everything here is a
//! deterministic function of its inputs.
//!
//! ## Key Types
//!
//! - [`CanonicalBytes`] - Deterministic CBOR encoding of a record's content
//! - [`Digest`] - Blake3 hash, rendered as `0x`-prefixed hex
//! - [`Uri`] - Self-certifying `<prefix>:<scope>:<encoded-digest>` identifier
//! - [`Did`] - Ed25519-backed identity
//! - [`SchemaDefinition`] - Parsed schema with a tagged [`PropertyType`] tree
//! - [`ValidationReport`] - Validity plus the issues found
//!
//! ## Records
//!
//! [`SchemaRecord`], [`NamespaceRecord`], [`RegistryRecord`] and
//! [`EntryRecord`] bind content to the URI derived from it. See [`records`].
//! Entries move through [`EntryState`]s by [`Transition`]s; see [`lifecycle`].

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod identifier;
pub mod lifecycle;
pub mod metadata;
pub mod records;
pub mod schema;
pub mod uri;
pub mod validation;

pub use canonical::{canonicalize, decode_blob, length_prefixed, CanonicalBytes, ID_FIELD};
pub use crypto::{Did, Digest, Keypair, Signature};
pub use error::{CoreError, LifecycleError, ValidationError};
pub use identifier::{content_digest, derive_authorization_uri, derive_identifier};
pub use lifecycle::{EntryState, Transition};
pub use metadata::{LocalizedText, MetadataRecord, METADATA_SCHEMA_V1};
pub use records::{
    declared_identifier, verify_blob, EntryRecord, NamespaceRecord, RegistryRecord, SchemaRecord,
};
pub use schema::{
    MetaSchemaVersion, PropertyType, SchemaBuilder, SchemaDefinition, StringFormat, META_SCHEMA_V1,
};
pub use uri::{EntityKind, NetworkScope, Uri};
pub use validation::{
    check_content, check_metadata, check_schema, is_valid_schema, Issue, ValidationReport,
};

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
