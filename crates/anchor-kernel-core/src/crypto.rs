//! Cryptographic primitives for the Anchor Kernel.
//!
//! Wraps Blake3 hashing and Ed25519 identities with strong types.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// DID method used for every identity in the kernel.
pub const DID_METHOD: &str = "anchor";

/// A 32-byte Blake3 digest.
///
/// Rendered as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Compute the Blake3 digest of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Compute the Blake3 digest of several byte slices, concatenated.
    pub fn hash_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| CoreError::DecodingError(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::DecodingError("digest must be 32 bytes".into()))?;
        Ok(Self(arr))
    }

    /// The zero digest (sentinel value).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..18])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A decentralized identifier backed by an Ed25519 public key.
///
/// Text form: `did:anchor:<base58(public key)>`. The 32 public key bytes are
/// the identity's address, mixed into identifier derivation as context.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Did(pub [u8; 32]);

impl Did {
    /// Create from raw public key bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The address bytes used as derivation context.
    pub const fn address(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse `did:anchor:<base58>`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let rest = s
            .strip_prefix("did:")
            .and_then(|r| r.strip_prefix(DID_METHOD))
            .and_then(|r| r.strip_prefix(':'))
            .ok_or_else(|| CoreError::InvalidIdentity(format!("not a {DID_METHOD} did: {s}")))?;
        let bytes = bs58::decode(rest)
            .into_vec()
            .map_err(|e| CoreError::InvalidIdentity(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::InvalidIdentity("address must be 32 bytes".into()))?;
        Ok(Self(arr))
    }

    /// Verify a signature made by this identity.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CoreError> {
        let key = VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CoreError::InvalidIdentity(e.to_string()))?;
        key.verify(message, &DalekSignature::from_bytes(&signature.0))
            .map_err(|_| CoreError::InvalidSignature)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}", DID_METHOD, bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.to_string();
        write!(f, "Did({}…)", &s[..s.len().min(24)])
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Did {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Did::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sig({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An Ed25519 keypair controlling a [`Did`].
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The identity controlled by this keypair.
    pub fn did(&self) -> Did {
        Did(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.did())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_hex_format() {
        let digest = Digest::from_bytes([0xab; 32]);
        let hex = digest.to_hex();
        assert!(hex.starts_with("0xabab"));
        assert_eq!(hex.len(), 66);
        assert_eq!(Digest::from_hex(&hex).unwrap(), digest);
        assert_eq!(Digest::from_hex(&hex[2..]).unwrap(), digest);
    }

    #[test]
    fn test_hash_parts_matches_concatenation() {
        let joined = Digest::hash(b"hello world");
        let parts = Digest::hash_parts(&[b"hello", b" ", b"world"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_did_roundtrip() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let did = keypair.did();
        let text = did.to_string();
        assert!(text.starts_with("did:anchor:"));
        assert_eq!(Did::parse(&text).unwrap(), did);
    }

    #[test]
    fn test_did_rejects_foreign_method() {
        assert!(Did::parse("did:web:example.com").is_err());
        assert!(Did::parse("did:anchor:0OIl").is_err());
    }

    #[test]
    fn test_sign_verify() {
        let keypair = Keypair::generate();
        let signature = keypair.sign(b"payload");
        keypair.did().verify(b"payload", &signature).unwrap();
        assert!(keypair.did().verify(b"payloaD", &signature).is_err());
    }

    #[test]
    fn test_keypair_deterministic_from_seed() {
        let kp1 = Keypair::from_seed(&[7u8; 32]);
        let kp2 = Keypair::from_seed(&[7u8; 32]);
        assert_eq!(kp1.did(), kp2.did());
    }
}
