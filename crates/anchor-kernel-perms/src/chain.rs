//! Delegation chains.
//!
//! A chain runs from a root grant (creator to self) down to the grant being
//! exercised. Every link must be delegated by the previous link's delegate,
//! carry a subset of its bits, and stay in its scope or step from a
//! namespace into one of its registries under ADMIN.

use anchor_kernel_core::Uri;

use crate::error::{PermsError, Result};
use crate::grant::AuthorizationGrant;
use crate::permissions::Permissions;

/// An ordered root-to-leaf list of grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationChain {
    grants: Vec<AuthorizationGrant>,
}

impl DelegationChain {
    pub fn new(root: AuthorizationGrant) -> Self {
        Self { grants: vec![root] }
    }

    /// Build from grants already in root-to-leaf order.
    pub fn from_grants(grants: Vec<AuthorizationGrant>) -> Result<Self> {
        if grants.is_empty() {
            return Err(PermsError::BrokenChain("empty chain".into()));
        }
        Ok(Self { grants })
    }

    pub fn push(&mut self, grant: AuthorizationGrant) {
        self.grants.push(grant);
    }

    pub fn root(&self) -> &AuthorizationGrant {
        &self.grants[0]
    }

    pub fn leaf(&self) -> &AuthorizationGrant {
        &self.grants[self.grants.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    pub fn grants(&self) -> &[AuthorizationGrant] {
        &self.grants
    }

    /// Verify every link and return the leaf's effective permissions.
    ///
    /// `namespace_of` resolves a registry URI to the namespace it lives in;
    /// it is consulted only when a link crosses from namespace to registry.
    pub fn verify<F>(&self, namespace_of: F) -> Result<Permissions>
    where
        F: Fn(&Uri) -> Option<Uri>,
    {
        let root = self.root();
        root.verify()?;
        if !root.is_root() {
            return Err(PermsError::BrokenChain(format!(
                "chain starts at {} which is not a root grant",
                root.uri
            )));
        }

        for pair in self.grants.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            let namespace = if child.scope != parent.scope {
                namespace_of(&child.scope)
            } else {
                None
            };
            parent.admits(child, namespace.as_ref())?;
        }

        Ok(self.leaf().permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_kernel_core::{Did, EntityKind, Keypair, NetworkScope};

    fn party(seed: u8) -> Did {
        Keypair::from_seed(&[seed; 32]).did()
    }

    fn scope(kind: EntityKind, seed: u8) -> Uri {
        Uri::from_id(kind, NetworkScope::default(), [seed; 32])
    }

    fn no_parents(_: &Uri) -> Option<Uri> {
        None
    }

    #[test]
    fn test_linear_chain() {
        let registry = scope(EntityKind::Registry, 1);
        let root = AuthorizationGrant::root(&registry, &party(1)).unwrap();
        let a = root.delegate(&party(2), Permissions::ASSERT | Permissions::DELEGATE).unwrap();
        let b = a.delegate(&party(3), Permissions::ASSERT).unwrap();

        let chain = DelegationChain::from_grants(vec![root, a, b]).unwrap();
        assert_eq!(chain.verify(no_parents).unwrap(), Permissions::ASSERT);
    }

    #[test]
    fn test_chain_must_start_at_root() {
        let registry = scope(EntityKind::Registry, 1);
        let root = AuthorizationGrant::root(&registry, &party(1)).unwrap();
        let a = root.delegate(&party(2), Permissions::ASSERT).unwrap();
        let chain = DelegationChain::new(a);
        assert!(matches!(chain.verify(no_parents), Err(PermsError::BrokenChain(_))));
    }

    #[test]
    fn test_unlinked_grant_rejected() {
        let registry = scope(EntityKind::Registry, 1);
        let root = AuthorizationGrant::root(&registry, &party(1)).unwrap();
        let stranger = AuthorizationGrant::root(&registry, &party(5)).unwrap();
        let b = stranger.delegate(&party(3), Permissions::ASSERT).unwrap();

        let chain = DelegationChain::from_grants(vec![root, b]).unwrap();
        assert!(matches!(chain.verify(no_parents), Err(PermsError::BrokenChain(_))));
    }

    #[test]
    fn test_hand_built_escalation_rejected() {
        let registry = scope(EntityKind::Registry, 1);
        let root = AuthorizationGrant::root(&registry, &party(1)).unwrap();
        let a = root.delegate(&party(2), Permissions::ASSERT | Permissions::DELEGATE).unwrap();
        let mut b = a.delegate(&party(3), Permissions::ASSERT).unwrap();
        // Bits are not part of the grant URI, so this still verifies alone.
        b.permissions = Permissions::ADMIN;
        b.verify().unwrap();

        let chain = DelegationChain::from_grants(vec![root, a, b]).unwrap();
        assert!(matches!(chain.verify(no_parents), Err(PermsError::Escalation { .. })));
    }

    #[test]
    fn test_namespace_to_registry_step() {
        let namespace = scope(EntityKind::Namespace, 1);
        let registry = scope(EntityKind::Registry, 2);
        let root = AuthorizationGrant::root(&namespace, &party(1)).unwrap();
        let g = root
            .delegate_into(&registry, &namespace, &party(2), Permissions::ASSERT)
            .unwrap();

        let chain = DelegationChain::from_grants(vec![root, g]).unwrap();
        let ns = namespace.clone();
        assert_eq!(
            chain.verify(move |_| Some(ns.clone())).unwrap(),
            Permissions::ASSERT
        );
        assert!(matches!(chain.verify(no_parents), Err(PermsError::ScopeMismatch { .. })));
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert!(DelegationChain::from_grants(Vec::new()).is_err());
    }
}
