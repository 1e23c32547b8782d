//! Anchored record types and their builders.
//!
//! Each builder canonicalizes the content, derives the record's URI with the
//! context bytes of its kind, and computes the blob and its digest:
//!
//! | Kind      | Context bytes                                   |
//! |-----------|-------------------------------------------------|
//! | schema    | namespace id, creator address                   |
//! | namespace | creator address                                 |
//! | registry  | namespace id, schema id (if any), creator address |
//! | entry     | registry id, creator address                    |

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::canonical::{canonicalize, decode_blob, CanonicalBytes, ID_FIELD};
use crate::crypto::{Did, Digest};
use crate::error::{CoreError, ValidationError};
use crate::identifier::{content_digest, derive_authorization_uri, derive_identifier};
use crate::schema::SchemaDefinition;
use crate::uri::{EntityKind, NetworkScope, Uri};
use crate::validation::check_schema;

/// Compare a derived URI against the declared one.
fn ensure_identifier(declared: &Uri, derived: &Uri) -> Result<(), ValidationError> {
    if declared != derived {
        return Err(ValidationError::IdentifierMismatch {
            declared: declared.to_string(),
            derived: derived.to_string(),
        });
    }
    Ok(())
}

/// Check that a blob hashes to the declared digest.
pub fn verify_blob(blob: &str, digest: &Digest) -> Result<(), ValidationError> {
    let raw = STANDARD
        .decode(blob)
        .map_err(|e| CoreError::DecodingError(e.to_string()))?;
    let computed = Digest::hash(&raw);
    if &computed != digest {
        return Err(ValidationError::DigestMismatch {
            declared: digest.to_hex(),
            computed: computed.to_hex(),
        });
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────
// Schema
// ─────────────────────────────────────────────────────────────────────────

/// A schema document bound to its namespace and creator.
///
/// `document` carries the derived `$id`.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRecord {
    pub uri: Uri,
    pub digest: Digest,
    pub namespace: Uri,
    pub creator: Did,
    pub document: Json,
}

impl SchemaRecord {
    /// Build a schema record from a definition.
    pub fn build(
        definition: &SchemaDefinition,
        namespace: &Uri,
        creator: &Did,
        scope: &NetworkScope,
    ) -> Result<Self, ValidationError> {
        Self::from_content(definition.to_document(), namespace, creator, scope)
    }

    /// Build from a raw schema document, ignoring any `$id` it carries.
    pub fn from_content(
        mut document: Json,
        namespace: &Uri,
        creator: &Did,
        scope: &NetworkScope,
    ) -> Result<Self, ValidationError> {
        check_schema(&document).into_result()?;
        let canonical = canonicalize(&document)?;
        let (uri, digest) = Self::derive(&canonical, namespace, creator, scope);

        if let Some(obj) = document.as_object_mut() {
            obj.insert(ID_FIELD.to_string(), Json::from(uri.to_string()));
        }
        Ok(Self {
            uri,
            digest,
            namespace: namespace.clone(),
            creator: *creator,
            document,
        })
    }

    /// Accept a document that declares its own `$id`, verifying the claim.
    pub fn from_document(
        document: Json,
        namespace: &Uri,
        creator: &Did,
    ) -> Result<Self, ValidationError> {
        check_schema(&document).into_result()?;
        let declared = declared_identifier(&document, EntityKind::Schema)?;
        let canonical = canonicalize(&document)?;
        let (uri, digest) = Self::derive(&canonical, namespace, creator, declared.scope());
        ensure_identifier(&declared, &uri)?;

        Ok(Self {
            uri,
            digest,
            namespace: namespace.clone(),
            creator: *creator,
            document,
        })
    }

    /// Decode a blob, re-validate it and check it against the claimed URI.
    pub fn from_blob(
        blob: &str,
        declared: &Uri,
        namespace: &Uri,
        creator: &Did,
    ) -> Result<Self, ValidationError> {
        let content = decode_blob(blob)?;
        let record = Self::from_content(content, namespace, creator, declared.scope())?;
        ensure_identifier(declared, &record.uri)?;
        Ok(record)
    }

    /// Re-check structure, self-certification and the digest.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_schema(&self.document).into_result()?;
        let declared = declared_identifier(&self.document, EntityKind::Schema)?;
        ensure_identifier(&self.uri, &declared)?;

        let canonical = canonicalize(&self.document)?;
        let (derived, digest) =
            Self::derive(&canonical, &self.namespace, &self.creator, declared.scope());
        ensure_identifier(&declared, &derived)?;

        if digest != self.digest {
            return Err(ValidationError::DigestMismatch {
                declared: self.digest.to_hex(),
                computed: digest.to_hex(),
            });
        }
        Ok(())
    }

    pub fn definition(&self) -> Result<SchemaDefinition, ValidationError> {
        SchemaDefinition::from_document(&self.document)
    }

    pub fn canonical(&self) -> Result<CanonicalBytes, ValidationError> {
        Ok(canonicalize(&self.document)?)
    }

    pub fn blob(&self) -> Result<String, ValidationError> {
        Ok(self.canonical()?.to_blob())
    }

    fn derive(
        canonical: &CanonicalBytes,
        namespace: &Uri,
        creator: &Did,
        scope: &NetworkScope,
    ) -> (Uri, Digest) {
        derive_identifier(
            EntityKind::Schema,
            canonical,
            &[namespace.id_bytes().as_slice(), creator.address().as_slice()],
            scope,
        )
    }
}

/// Read and parse the `$id` a document declares, requiring a kind.
pub fn declared_identifier(document: &Json, kind: EntityKind) -> Result<Uri, ValidationError> {
    let id = document
        .get(ID_FIELD)
        .and_then(Json::as_str)
        .ok_or(ValidationError::MissingIdentifier)?;
    Ok(Uri::parse_kind(id, kind)?)
}

// ─────────────────────────────────────────────────────────────────────────
// Namespace / Registry
// ─────────────────────────────────────────────────────────────────────────

/// A top-level container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    pub uri: Uri,
    pub digest: Digest,
    pub creator: Did,
    /// The creator's root grant.
    pub authorization: Uri,
    pub blob: String,
}

impl NamespaceRecord {
    pub fn build(content: &Json, creator: &Did, scope: &NetworkScope) -> Result<Self, ValidationError> {
        let canonical = canonicalize(content)?;
        let (uri, digest) = derive_identifier(
            EntityKind::Namespace,
            &canonical,
            &[creator.address().as_slice()],
            scope,
        );
        let authorization = derive_authorization_uri(&uri, creator, creator)?;
        Ok(Self {
            uri,
            digest,
            creator: *creator,
            authorization,
            blob: canonical.to_blob(),
        })
    }

    /// Re-derive the URI from the blob.
    pub fn verify(&self) -> Result<(), ValidationError> {
        verify_blob(&self.blob, &self.digest)?;
        let rebuilt = Self::build(&decode_blob(&self.blob)?, &self.creator, self.uri.scope())?;
        ensure_identifier(&self.uri, &rebuilt.uri)?;
        ensure_identifier(&self.authorization, &rebuilt.authorization)
    }
}

/// A container inside a namespace, optionally bound to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub uri: Uri,
    pub digest: Digest,
    pub namespace: Uri,
    pub schema: Option<Uri>,
    pub creator: Did,
    pub authorization: Uri,
    pub blob: String,
}

impl RegistryRecord {
    pub fn build(
        content: &Json,
        namespace: &Uri,
        schema: Option<&Uri>,
        creator: &Did,
        scope: &NetworkScope,
    ) -> Result<Self, ValidationError> {
        if let Some(schema) = schema {
            if schema.kind() != EntityKind::Schema {
                return Err(CoreError::InvalidUri(format!("{schema} is not a schema")).into());
            }
        }
        let canonical = canonicalize(content)?;

        let mut context: Vec<&[u8]> = vec![namespace.id_bytes().as_slice()];
        if let Some(schema) = schema {
            context.push(schema.id_bytes().as_slice());
        }
        context.push(creator.address().as_slice());

        let (uri, digest) = derive_identifier(EntityKind::Registry, &canonical, &context, scope);
        let authorization = derive_authorization_uri(&uri, creator, creator)?;
        Ok(Self {
            uri,
            digest,
            namespace: namespace.clone(),
            schema: schema.cloned(),
            creator: *creator,
            authorization,
            blob: canonical.to_blob(),
        })
    }

    pub fn verify(&self) -> Result<(), ValidationError> {
        verify_blob(&self.blob, &self.digest)?;
        let rebuilt = Self::build(
            &decode_blob(&self.blob)?,
            &self.namespace,
            self.schema.as_ref(),
            &self.creator,
            self.uri.scope(),
        )?;
        ensure_identifier(&self.uri, &rebuilt.uri)
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Entry
// ─────────────────────────────────────────────────────────────────────────

/// The mutable unit of record-keeping inside a registry.
///
/// The URI is fixed by the content the entry was created with; updates
/// replace `digest` and `blob` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub uri: Uri,
    pub registry: Uri,
    pub digest: Digest,
    pub blob: String,
    pub creator: Did,
    /// The grant currently authorizing mutations of this entry.
    pub authorization: Uri,
    pub revoked: bool,
}

impl EntryRecord {
    pub fn build(
        content: &Json,
        registry: &Uri,
        creator: &Did,
        authorization: &Uri,
        scope: &NetworkScope,
    ) -> Result<Self, ValidationError> {
        let canonical = canonicalize(content)?;
        let (uri, digest) = Self::derive(&canonical, registry, creator, scope);
        Ok(Self {
            uri,
            digest,
            blob: canonical.to_blob(),
            registry: registry.clone(),
            creator: *creator,
            authorization: authorization.clone(),
            revoked: false,
        })
    }

    /// Derive the URI an entry with this content and creator would have.
    pub fn derive_uri(
        content: &Json,
        registry: &Uri,
        creator: &Did,
        scope: &NetworkScope,
    ) -> Result<Uri, ValidationError> {
        let canonical = canonicalize(content)?;
        Ok(Self::derive(&canonical, registry, creator, scope).0)
    }

    /// The same entry carrying new content.
    pub fn with_content(&self, content: &Json) -> Result<Self, ValidationError> {
        let canonical = canonicalize(content)?;
        Ok(Self {
            digest: content_digest(&canonical),
            blob: canonical.to_blob(),
            ..self.clone()
        })
    }

    /// Decode the current content.
    pub fn content(&self) -> Result<Json, ValidationError> {
        Ok(decode_blob(&self.blob)?)
    }

    /// Check the blob against the digest.
    pub fn verify(&self) -> Result<(), ValidationError> {
        if self.uri.kind() != EntityKind::Entry {
            return Err(CoreError::InvalidUri(format!("{} is not an entry", self.uri)).into());
        }
        verify_blob(&self.blob, &self.digest)?;
        decode_blob(&self.blob)?;
        Ok(())
    }

    fn derive(
        canonical: &CanonicalBytes,
        registry: &Uri,
        creator: &Did,
        scope: &NetworkScope,
    ) -> (Uri, Digest) {
        derive_identifier(
            EntityKind::Entry,
            canonical,
            &[registry.id_bytes().as_slice(), creator.address().as_slice()],
            scope,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::schema::{PropertyType, SchemaBuilder};
    use serde_json::json;

    fn creator() -> Did {
        Keypair::from_seed(&[9; 32]).did()
    }

    fn namespace() -> NamespaceRecord {
        NamespaceRecord::build(&json!({"name": "acme"}), &creator(), &NetworkScope::default())
            .unwrap()
    }

    fn person() -> SchemaDefinition {
        SchemaBuilder::new("Person")
            .property("name", PropertyType::string())
            .property("age", PropertyType::Integer)
            .required(["name", "age"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema_record_is_self_certifying() {
        let space = namespace();
        let record =
            SchemaRecord::build(&person(), &space.uri, &creator(), &NetworkScope::default())
                .unwrap();
        assert_eq!(record.document["$id"], record.uri.to_string());
        record.validate().unwrap();

        let reparsed =
            SchemaRecord::from_document(record.document.clone(), &space.uri, &creator()).unwrap();
        assert_eq!(reparsed, record);
    }

    #[test]
    fn test_schema_tamper_detected() {
        let space = namespace();
        let mut record =
            SchemaRecord::build(&person(), &space.uri, &creator(), &NetworkScope::default())
                .unwrap();
        record.document["title"] = json!("Persona");

        let err = record.validate().unwrap_err();
        assert!(err.is_identifier_mismatch(), "{err}");
    }

    #[test]
    fn test_schema_missing_identifier() {
        let space = namespace();
        let result = SchemaRecord::from_document(person().to_document(), &space.uri, &creator());
        assert!(matches!(result, Err(ValidationError::MissingIdentifier)));
    }

    #[test]
    fn test_schema_from_blob() {
        let space = namespace();
        let record =
            SchemaRecord::build(&person(), &space.uri, &creator(), &NetworkScope::default())
                .unwrap();
        let blob = record.blob().unwrap();
        let decoded = SchemaRecord::from_blob(&blob, &record.uri, &space.uri, &creator()).unwrap();
        assert_eq!(decoded, record);

        let other = Keypair::from_seed(&[10; 32]).did();
        assert!(SchemaRecord::from_blob(&blob, &record.uri, &space.uri, &other).is_err());
    }

    #[test]
    fn test_namespace_verify() {
        let space = namespace();
        space.verify().unwrap();
        assert_eq!(space.authorization.kind(), EntityKind::NamespaceAuthorization);

        let mut forged = space.clone();
        forged.creator = Keypair::from_seed(&[11; 32]).did();
        assert!(forged.verify().is_err());
    }

    #[test]
    fn test_registry_schema_binding_changes_uri() {
        let space = namespace();
        let schema =
            SchemaRecord::build(&person(), &space.uri, &creator(), &NetworkScope::default())
                .unwrap();
        let content = json!({"name": "people"});
        let scope = NetworkScope::default();

        let plain = RegistryRecord::build(&content, &space.uri, None, &creator(), &scope).unwrap();
        let bound =
            RegistryRecord::build(&content, &space.uri, Some(&schema.uri), &creator(), &scope)
                .unwrap();
        assert_ne!(plain.uri, bound.uri);
        bound.verify().unwrap();

        assert!(RegistryRecord::build(&content, &space.uri, Some(&space.uri), &creator(), &scope)
            .is_err());
    }

    #[test]
    fn test_entry_update_keeps_uri() {
        let space = namespace();
        let scope = NetworkScope::default();
        let registry =
            RegistryRecord::build(&json!({"name": "r"}), &space.uri, None, &creator(), &scope)
                .unwrap();
        let entry = EntryRecord::build(
            &json!({"name": "Ada", "age": 36}),
            &registry.uri,
            &creator(),
            &registry.authorization,
            &scope,
        )
        .unwrap();
        entry.verify().unwrap();

        let updated = entry.with_content(&json!({"name": "Ada", "age": 37})).unwrap();
        assert_eq!(updated.uri, entry.uri);
        assert_ne!(updated.digest, entry.digest);
        assert_eq!(updated.content().unwrap()["age"], 37);
        updated.verify().unwrap();
    }

    #[test]
    fn test_entry_digest_mismatch() {
        let scope = NetworkScope::default();
        let space = namespace();
        let mut entry = EntryRecord::build(
            &json!({"k": 1}),
            &space.uri,
            &creator(),
            &space.authorization,
            &scope,
        )
        .unwrap();
        entry.digest = Digest::ZERO;
        assert!(matches!(
            entry.verify(),
            Err(ValidationError::DigestMismatch { .. })
        ));
    }
}
