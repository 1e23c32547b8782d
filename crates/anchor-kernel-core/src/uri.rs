//! Typed, self-certifying URIs.
//!
//! Every anchored record is named `<prefix>:<scope>:<encoded-digest>`. The
//! encoded digest is base58 over `ident || hash || checksum`, where `ident` is
//! the kind's reserved numeric identifier and `checksum` is the first two
//! bytes of `Blake3(CHECKSUM_DOMAIN || ident || hash)`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Domain prefix mixed into the URI checksum.
pub const CHECKSUM_DOMAIN: &[u8] = b"ANCHOR-URI";

/// Default network scope.
pub const DEFAULT_SCOPE: &str = "anchor";

const ENCODED_LEN: usize = 2 + 32 + 2;

/// The kind of an anchored record.
///
/// Prefix and ident pairs are frozen: changing one re-addresses every record
/// of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum EntityKind {
    Schema = 8902,
    Namespace = 3390,
    NamespaceAuthorization = 2092,
    Registry = 9274,
    RegistryAuthorization = 10001,
    Entry = 12306,
}

impl EntityKind {
    /// All kinds, in ident order.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::NamespaceAuthorization,
        EntityKind::Namespace,
        EntityKind::Schema,
        EntityKind::Registry,
        EntityKind::RegistryAuthorization,
        EntityKind::Entry,
    ];

    /// Reserved numeric identifier.
    pub fn ident(self) -> u16 {
        self as u16
    }

    /// Reserved string prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::Schema => "schema",
            EntityKind::Namespace => "space",
            EntityKind::NamespaceAuthorization => "auth",
            EntityKind::Registry => "registry",
            EntityKind::RegistryAuthorization => "registryauth",
            EntityKind::Entry => "entry",
        }
    }

    /// Look up a kind by its prefix.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.prefix() == prefix)
    }

    /// Look up a kind by its ident.
    pub fn from_ident(ident: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.ident() == ident)
    }

    /// The authorization kind for grants scoped to this kind, if any.
    pub fn authorization_kind(self) -> Option<Self> {
        match self {
            EntityKind::Namespace => Some(EntityKind::NamespaceAuthorization),
            EntityKind::Registry => Some(EntityKind::RegistryAuthorization),
            _ => None,
        }
    }

    /// Whether this kind names an authorization grant.
    pub fn is_authorization(self) -> bool {
        matches!(
            self,
            EntityKind::NamespaceAuthorization | EntityKind::RegistryAuthorization
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// The network scope segment of a URI (e.g. `anchor`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkScope(String);

impl NetworkScope {
    /// Validate and wrap a scope. Lowercase ASCII letters, digits and `-`.
    pub fn new(scope: impl Into<String>) -> Result<Self, CoreError> {
        let scope = scope.into();
        let valid = !scope.is_empty()
            && scope.len() <= 32
            && scope
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
        if !valid {
            return Err(CoreError::InvalidScope(scope));
        }
        Ok(Self(scope))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NetworkScope {
    fn default() -> Self {
        Self(DEFAULT_SCOPE.to_string())
    }
}

impl fmt::Display for NetworkScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for NetworkScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NetworkScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        NetworkScope::new(s).map_err(serde::de::Error::custom)
    }
}

/// A typed URI naming an anchored record.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    kind: EntityKind,
    scope: NetworkScope,
    id: [u8; 32],
}

impl Uri {
    /// Assemble a URI from an already-derived identifier hash.
    pub fn from_id(kind: EntityKind, scope: NetworkScope, id: [u8; 32]) -> Self {
        Self { kind, scope, id }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn scope(&self) -> &NetworkScope {
        &self.scope
    }

    /// The raw identifier hash. Used as context bytes for child records.
    pub fn id_bytes(&self) -> &[u8; 32] {
        &self.id
    }

    /// The base58 encoded-digest segment.
    pub fn encoded_digest(&self) -> String {
        let ident = self.kind.ident().to_be_bytes();
        let mut buf = Vec::with_capacity(ENCODED_LEN);
        buf.extend_from_slice(&ident);
        buf.extend_from_slice(&self.id);
        buf.extend_from_slice(&checksum(&ident, &self.id));
        bs58::encode(buf).into_string()
    }

    /// Parse `<prefix>:<scope>:<encoded-digest>`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let mut parts = s.splitn(3, ':');
        let (prefix, scope, encoded) = match (parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(sc), Some(e)) => (p, sc, e),
            _ => return Err(CoreError::InvalidUri(format!("expected three segments: {s}"))),
        };

        let kind = EntityKind::from_prefix(prefix)
            .ok_or_else(|| CoreError::InvalidUri(format!("unknown prefix {prefix:?}")))?;
        let scope = NetworkScope::new(scope)?;

        let raw = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| CoreError::InvalidUri(e.to_string()))?;
        if raw.len() != ENCODED_LEN {
            return Err(CoreError::InvalidUri(format!(
                "encoded digest has {} bytes, expected {ENCODED_LEN}",
                raw.len()
            )));
        }

        let ident = [raw[0], raw[1]];
        if u16::from_be_bytes(ident) != kind.ident() {
            return Err(CoreError::InvalidUri(format!(
                "ident {} does not belong to prefix {prefix:?}",
                u16::from_be_bytes(ident)
            )));
        }

        let mut id = [0u8; 32];
        id.copy_from_slice(&raw[2..34]);
        if raw[34..] != checksum(&ident, &id) {
            return Err(CoreError::InvalidUri("checksum mismatch".into()));
        }

        Ok(Self { kind, scope, id })
    }

    /// Parse and require a specific kind.
    pub fn parse_kind(s: &str, kind: EntityKind) -> Result<Self, CoreError> {
        let uri = Self::parse(s)?;
        if uri.kind != kind {
            return Err(CoreError::InvalidUri(format!(
                "expected a {kind} uri, got {}",
                uri.kind
            )));
        }
        Ok(uri)
    }
}

fn checksum(ident: &[u8; 2], id: &[u8; 32]) -> [u8; 2] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(CHECKSUM_DOMAIN);
    hasher.update(ident);
    hasher.update(id);
    let out = hasher.finalize();
    [out.as_bytes()[0], out.as_bytes()[1]]
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind.prefix(), self.scope, self.encoded_digest())
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uri({self})")
    }
}

impl FromStr for Uri {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialOrd for Uri {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Uri {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.kind, &self.scope, &self.id).cmp(&(other.kind, &other.scope, &other.id))
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Uri::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: EntityKind) -> Uri {
        Uri::from_id(kind, NetworkScope::default(), [0x5a; 32])
    }

    #[test]
    fn test_prefix_and_ident_are_unique() {
        for (i, a) in EntityKind::ALL.iter().enumerate() {
            for b in &EntityKind::ALL[i + 1..] {
                assert_ne!(a.prefix(), b.prefix());
                assert_ne!(a.ident(), b.ident());
            }
        }
    }

    #[test]
    fn test_uri_text_roundtrip() {
        for kind in EntityKind::ALL {
            let uri = sample(kind);
            let text = uri.to_string();
            assert!(text.starts_with(&format!("{}:anchor:", kind.prefix())));
            assert_eq!(Uri::parse(&text).unwrap(), uri);
        }
    }

    #[test]
    fn test_uri_rejects_swapped_prefix() {
        let text = sample(EntityKind::Schema).to_string();
        let swapped = text.replacen("schema:", "entry:", 1);
        assert!(Uri::parse(&swapped).is_err());
    }

    #[test]
    fn test_uri_rejects_corrupted_digest() {
        let uri = sample(EntityKind::Entry);
        let encoded = uri.encoded_digest();
        let mut chars: Vec<char> = encoded.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '2' { '3' } else { '2' };
        let corrupted = format!("entry:anchor:{}", chars.into_iter().collect::<String>());
        assert!(Uri::parse(&corrupted).is_err());
    }

    #[test]
    fn test_parse_kind_enforces_kind() {
        let text = sample(EntityKind::Registry).to_string();
        assert!(Uri::parse_kind(&text, EntityKind::Registry).is_ok());
        assert!(Uri::parse_kind(&text, EntityKind::Namespace).is_err());
    }

    #[test]
    fn test_scope_validation() {
        assert!(NetworkScope::new("anchor").is_ok());
        assert!(NetworkScope::new("test-net-2").is_ok());
        assert!(NetworkScope::new("").is_err());
        assert!(NetworkScope::new("Main").is_err());
        assert!(NetworkScope::new("a:b").is_err());
    }

    #[test]
    fn test_authorization_kind() {
        assert_eq!(
            EntityKind::Namespace.authorization_kind(),
            Some(EntityKind::NamespaceAuthorization)
        );
        assert_eq!(
            EntityKind::Registry.authorization_kind(),
            Some(EntityKind::RegistryAuthorization)
        );
        assert_eq!(EntityKind::Entry.authorization_kind(), None);
    }
}
