//! The injected signing capability.

use async_trait::async_trait;

use anchor_kernel_core::{Did, Keypair, Signature};

use crate::error::{GatewayError, Result};

/// Which account a signature is requested for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyContext {
    pub account: Did,
}

impl KeyContext {
    pub fn new(account: Did) -> Self {
        Self { account }
    }
}

/// A signing capability.
///
/// Key custody lives behind this trait; the kernel only ever asks for a
/// signature over a call's bytes.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, message: &[u8], key: &KeyContext) -> Result<Signature>;
}

/// A signer backed by a single in-process keypair.
#[derive(Debug, Clone)]
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn did(&self) -> Did {
        self.keypair.did()
    }

    /// The key context matching this signer's account.
    pub fn key_context(&self) -> KeyContext {
        KeyContext::new(self.did())
    }
}

#[async_trait]
impl Signer for KeypairSigner {
    async fn sign(&self, message: &[u8], key: &KeyContext) -> Result<Signature> {
        if key.account != self.keypair.did() {
            return Err(GatewayError::Signing(format!(
                "no key for account {}",
                key.account
            )));
        }
        Ok(self.keypair.sign(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keypair_signer() {
        let signer = KeypairSigner::new(Keypair::from_seed(&[1; 32]));
        let key = signer.key_context();
        let sig = signer.sign(b"call", &key).await.unwrap();
        key.account.verify(b"call", &sig).unwrap();
    }

    #[tokio::test]
    async fn test_keypair_signer_rejects_foreign_account() {
        let signer = KeypairSigner::new(Keypair::from_seed(&[1; 32]));
        let other = KeyContext::new(Keypair::from_seed(&[2; 32]).did());
        assert!(matches!(
            signer.sign(b"call", &other).await,
            Err(GatewayError::Signing(_))
        ));
    }
}
