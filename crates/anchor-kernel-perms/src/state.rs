//! Grant index.
//!
//! An in-memory view of known grants, indexed by URI and by
//! `(scope, delegate)` for quick lookups when authorizing an action.

use std::collections::HashMap;

use anchor_kernel_core::{Did, Uri};

use crate::chain::DelegationChain;
use crate::error::{PermsError, Result};
use crate::grant::AuthorizationGrant;
use crate::permissions::Permissions;

/// Known grants.
#[derive(Debug, Default, Clone)]
pub struct GrantIndex {
    /// All grants indexed by grant URI.
    grants: HashMap<Uri, AuthorizationGrant>,

    /// Index: (scope, delegate) -> grant URIs, most recent last.
    by_scope: HashMap<(Uri, Did), Vec<Uri>>,
}

impl GrantIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a grant after checking its URI. Re-inserting a grant with the
    /// same URI replaces its bits.
    pub fn insert(&mut self, grant: AuthorizationGrant) -> Result<()> {
        grant.verify()?;
        let key = (grant.scope.clone(), grant.delegate);
        let uris = self.by_scope.entry(key).or_default();
        if !uris.contains(&grant.uri) {
            uris.push(grant.uri.clone());
        }
        self.grants.insert(grant.uri.clone(), grant);
        Ok(())
    }

    pub fn get(&self, uri: &Uri) -> Option<&AuthorizationGrant> {
        self.grants.get(uri)
    }

    pub fn contains(&self, uri: &Uri) -> bool {
        self.grants.contains_key(uri)
    }

    /// Grants a delegate holds over a scope.
    pub fn held_by(&self, scope: &Uri, delegate: &Did) -> Vec<&AuthorizationGrant> {
        self.by_scope
            .get(&(scope.clone(), *delegate))
            .map(|uris| uris.iter().filter_map(|u| self.grants.get(u)).collect())
            .unwrap_or_default()
    }

    /// Union of the bits a delegate holds over a scope.
    pub fn effective(&self, scope: &Uri, delegate: &Did) -> Permissions {
        self.held_by(scope, delegate)
            .into_iter()
            .fold(Permissions::NONE, |acc, g| acc | g.permissions)
    }

    /// Walk delegators back to a root grant within the grant's scope.
    ///
    /// At each step the parent is a grant held by the delegator that admits
    /// the child's bits, not merely any grant with delegating power.
    pub fn chain_for(&self, uri: &Uri) -> Result<DelegationChain> {
        let mut current = self
            .get(uri)
            .ok_or_else(|| PermsError::BrokenChain(format!("unknown grant {uri}")))?;
        let mut grants = vec![current.clone()];

        while !current.is_root() {
            if grants.len() > self.grants.len() {
                return Err(PermsError::BrokenChain("delegation cycle".into()));
            }
            let child = current;
            current = self
                .held_by(&child.scope, &child.delegator)
                .into_iter()
                .find(|g| g.admits(child, None).is_ok())
                .ok_or_else(|| {
                    PermsError::BrokenChain(format!("no delegating grant behind {}", child.uri))
                })?;
            grants.push(current.clone());
        }

        grants.reverse();
        DelegationChain::from_grants(grants)
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}
