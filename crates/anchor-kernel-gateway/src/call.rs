//! Call descriptors: the transition payloads handed to the ledger.
//!
//! A call is what gets signed. Its signing bytes are the CBOR encoding of
//! the descriptor; the envelope around it belongs to the gateway.

use serde::{Deserialize, Serialize};

use anchor_kernel_core::{Digest, EntityKind, Uri};
use anchor_kernel_perms::AuthorizationGrant;

use crate::error::{GatewayError, Result};

/// A prepared transition.
///
/// `authorization` is always the grant the signer presents for the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Call {
    CreateNamespace {
        uri: Uri,
        authorization: Uri,
        digest: Digest,
        blob: String,
    },
    AddNamespaceDelegate {
        grant: AuthorizationGrant,
        authorization: Uri,
    },
    CreateRegistry {
        uri: Uri,
        namespace: Uri,
        schema: Option<Uri>,
        authorization: Uri,
        digest: Digest,
        blob: String,
    },
    AddRegistryDelegate {
        grant: AuthorizationGrant,
        authorization: Uri,
    },
    CreateSchema {
        uri: Uri,
        namespace: Uri,
        authorization: Uri,
        digest: Digest,
        blob: String,
    },
    CreateEntry {
        uri: Uri,
        registry: Uri,
        authorization: Uri,
        digest: Digest,
        blob: String,
    },
    UpdateEntry {
        uri: Uri,
        authorization: Uri,
        digest: Digest,
        blob: String,
    },
    RevokeEntry {
        uri: Uri,
        authorization: Uri,
    },
    ReinstateEntry {
        uri: Uri,
        authorization: Uri,
    },
    TransferEntryOwnership {
        uri: Uri,
        authorization: Uri,
        new_owner: AuthorizationGrant,
    },
}

impl Call {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Call::CreateNamespace { .. } => "create_namespace",
            Call::AddNamespaceDelegate { .. } => "add_namespace_delegate",
            Call::CreateRegistry { .. } => "create_registry",
            Call::AddRegistryDelegate { .. } => "add_registry_delegate",
            Call::CreateSchema { .. } => "create_schema",
            Call::CreateEntry { .. } => "create_entry",
            Call::UpdateEntry { .. } => "update_entry",
            Call::RevokeEntry { .. } => "revoke_entry",
            Call::ReinstateEntry { .. } => "reinstate_entry",
            Call::TransferEntryOwnership { .. } => "transfer_entry_ownership",
        }
    }

    /// The record the call creates or mutates.
    pub fn target(&self) -> &Uri {
        match self {
            Call::CreateNamespace { uri, .. }
            | Call::CreateRegistry { uri, .. }
            | Call::CreateSchema { uri, .. }
            | Call::CreateEntry { uri, .. }
            | Call::UpdateEntry { uri, .. }
            | Call::RevokeEntry { uri, .. }
            | Call::ReinstateEntry { uri, .. }
            | Call::TransferEntryOwnership { uri, .. } => uri,
            Call::AddNamespaceDelegate { grant, .. } | Call::AddRegistryDelegate { grant, .. } => {
                &grant.uri
            }
        }
    }

    /// The grant presented with the call.
    pub fn authorization(&self) -> &Uri {
        match self {
            Call::CreateNamespace { authorization, .. }
            | Call::AddNamespaceDelegate { authorization, .. }
            | Call::CreateRegistry { authorization, .. }
            | Call::AddRegistryDelegate { authorization, .. }
            | Call::CreateSchema { authorization, .. }
            | Call::CreateEntry { authorization, .. }
            | Call::UpdateEntry { authorization, .. }
            | Call::RevokeEntry { authorization, .. }
            | Call::ReinstateEntry { authorization, .. }
            | Call::TransferEntryOwnership { authorization, .. } => authorization,
        }
    }

    /// Whether the call brings a new record into existence.
    pub fn is_create(&self) -> bool {
        matches!(
            self,
            Call::CreateNamespace { .. }
                | Call::AddNamespaceDelegate { .. }
                | Call::CreateRegistry { .. }
                | Call::AddRegistryDelegate { .. }
                | Call::CreateSchema { .. }
                | Call::CreateEntry { .. }
        )
    }

    pub fn target_kind(&self) -> EntityKind {
        self.target().kind()
    }

    /// Bytes the signer signs.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| GatewayError::Encoding(e.to_string()))?;
        Ok(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| GatewayError::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_kernel_core::{Keypair, NetworkScope};

    fn entry_uri() -> Uri {
        Uri::from_id(EntityKind::Entry, NetworkScope::default(), [4; 32])
    }

    #[test]
    fn test_call_bytes_roundtrip() {
        let registry = Uri::from_id(EntityKind::Registry, NetworkScope::default(), [5; 32]);
        let grant = AuthorizationGrant::root(&registry, &Keypair::from_seed(&[1; 32]).did()).unwrap();
        let call = Call::CreateEntry {
            uri: entry_uri(),
            registry,
            authorization: grant.uri,
            digest: Digest::hash(b"blob"),
            blob: "oWFrAQ==".into(),
        };
        let bytes = call.to_bytes().unwrap();
        assert_eq!(Call::from_bytes(&bytes).unwrap(), call);
        assert_eq!(call.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_target_and_kind() {
        let auth = Uri::from_id(EntityKind::RegistryAuthorization, NetworkScope::default(), [6; 32]);
        let call = Call::RevokeEntry {
            uri: entry_uri(),
            authorization: auth.clone(),
        };
        assert_eq!(call.target(), &entry_uri());
        assert_eq!(call.authorization(), &auth);
        assert_eq!(call.target_kind(), EntityKind::Entry);
        assert!(!call.is_create());
        assert_eq!(call.name(), "revoke_entry");
    }
}
