//! Digest and identifier derivation.
//!
//! Content digests are `Blake3(canonical)`. Identifiers are
//! `Blake3(length_prefixed(canonical) || context...)`, where the context binds
//! the identifier to its creator and parent scope so equal content in
//! unrelated scopes never collides.

use crate::canonical::{length_prefixed, CanonicalBytes};
use crate::crypto::{Did, Digest};
use crate::error::CoreError;
use crate::uri::{EntityKind, NetworkScope, Uri};

/// Integrity digest of canonical bytes.
pub fn content_digest(canonical: &CanonicalBytes) -> Digest {
    Digest::hash(canonical.as_slice())
}

/// Derive a typed URI and the content digest for a record.
pub fn derive_identifier(
    kind: EntityKind,
    canonical: &CanonicalBytes,
    context: &[&[u8]],
    scope: &NetworkScope,
) -> (Uri, Digest) {
    let prefixed = canonical.length_prefixed();
    let mut parts: Vec<&[u8]> = Vec::with_capacity(context.len() + 1);
    parts.push(&prefixed);
    parts.extend_from_slice(context);

    let id = Digest::hash_parts(&parts);
    (Uri::from_id(kind, scope.clone(), id.0), content_digest(canonical))
}

/// Derive the URI of an authorization grant.
///
/// The grant kind follows the scope: namespace scopes yield namespace
/// authorizations, registry scopes yield registry authorizations.
pub fn derive_authorization_uri(
    scope_uri: &Uri,
    delegate: &Did,
    delegator: &Did,
) -> Result<Uri, CoreError> {
    let kind = scope_uri.kind().authorization_kind().ok_or_else(|| {
        CoreError::InvalidUri(format!("{} records cannot carry grants", scope_uri.kind()))
    })?;

    let prefixed = length_prefixed(scope_uri.id_bytes());
    let id = Digest::hash_parts(&[
        prefixed.as_slice(),
        delegate.address().as_slice(),
        delegator.address().as_slice(),
    ]);
    Ok(Uri::from_id(kind, scope_uri.scope().clone(), id.0))
}
