//! Authorization grants.
//!
//! A grant gives a delegate a set of permission bits over a scope (a
//! namespace or a registry). Every grant is content-addressed: its URI is
//! derived from the scope and both parties, so a grant cannot be replayed
//! into another scope or attributed to another delegator.

use serde::{Deserialize, Serialize};

use anchor_kernel_core::{derive_authorization_uri, Did, EntityKind, Uri};

use crate::error::{PermsError, Result};
use crate::permissions::Permissions;

/// `(grant.permissions & required) == required`.
pub fn check_permission(grant: &AuthorizationGrant, required: Permissions) -> bool {
    grant.permissions.contains(required)
}

/// A delegated set of permissions over a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorizationGrant {
    /// Derived from `(scope, delegate, delegator)`.
    pub uri: Uri,

    /// The namespace or registry this grant applies to.
    pub scope: Uri,

    /// Who holds the permissions.
    pub delegate: Did,

    pub permissions: Permissions,

    /// Who handed them out.
    pub delegator: Did,
}

impl AuthorizationGrant {
    /// The implicit admin grant a creator holds over a scope it created.
    pub fn root(scope: &Uri, creator: &Did) -> Result<Self> {
        Self::assemble(scope, creator, Permissions::ALL, creator)
    }

    /// Delegate a subset of this grant's bits within the same scope.
    pub fn delegate(&self, to: &Did, permissions: Permissions) -> Result<Self> {
        self.check_delegation(to, permissions)?;
        Self::assemble(&self.scope, to, permissions, &self.delegate)
    }

    /// Delegate from a namespace into one of its registries.
    ///
    /// Requires ADMIN on the namespace. `registry_namespace` is the namespace
    /// the registry record declares.
    pub fn delegate_into(
        &self,
        registry: &Uri,
        registry_namespace: &Uri,
        to: &Did,
        permissions: Permissions,
    ) -> Result<Self> {
        if self.scope.kind() != EntityKind::Namespace || registry.kind() != EntityKind::Registry {
            return Err(PermsError::ScopeMismatch {
                expected: registry.clone(),
                got: self.scope.clone(),
            });
        }
        if registry_namespace != &self.scope {
            return Err(PermsError::ScopeMismatch {
                expected: registry_namespace.clone(),
                got: self.scope.clone(),
            });
        }
        self.require(Permissions::ADMIN)?;
        self.check_delegation(to, permissions)?;
        Self::assemble(registry, to, permissions, &self.delegate)
    }

    /// Whether the grant carries every bit in `required`.
    pub fn allows(&self, required: Permissions) -> bool {
        check_permission(self, required)
    }

    pub fn require(&self, required: Permissions) -> Result<()> {
        if !self.allows(required) {
            return Err(PermsError::PermissionDenied {
                required,
                held: self.permissions,
            });
        }
        Ok(())
    }

    /// Full check before acting: the grant is genuine, belongs to `caller`,
    /// covers `scope`, and carries `required`.
    pub fn authorize(&self, caller: &Did, scope: &Uri, required: Permissions) -> Result<()> {
        self.verify()?;
        if &self.delegate != caller {
            return Err(PermsError::NotDelegate {
                caller: *caller,
                grant: self.uri.clone(),
            });
        }
        if &self.scope != scope {
            return Err(PermsError::ScopeMismatch {
                expected: scope.clone(),
                got: self.scope.clone(),
            });
        }
        self.require(required)
    }

    /// Check a grant presented to mutate a record owned through `owner`.
    ///
    /// The presented grant must either be the owner grant itself or carry
    /// ADMIN over the scope.
    pub fn authorize_owned(
        &self,
        caller: &Did,
        scope: &Uri,
        owner: &Uri,
        required: Permissions,
    ) -> Result<()> {
        self.authorize(caller, scope, required)?;
        if &self.uri != owner && !self.allows(Permissions::ADMIN) {
            return Err(PermsError::NotOwner {
                grant: self.uri.clone(),
                owner: owner.clone(),
            });
        }
        Ok(())
    }

    /// Check an ownership handover to `new_owner`.
    ///
    /// The caller is the owner with DELEGATE or an ADMIN of the scope, and
    /// `new_owner` is an ASSERT grant over the same scope delegated by the
    /// caller from this grant.
    pub fn authorize_transfer(
        &self,
        caller: &Did,
        scope: &Uri,
        owner: &Uri,
        new_owner: &AuthorizationGrant,
    ) -> Result<()> {
        let required = if &self.uri == owner {
            Permissions::DELEGATE
        } else {
            Permissions::ADMIN
        };
        self.authorize_owned(caller, scope, owner, required)?;
        self.admits(new_owner, None)?;
        new_owner.require(Permissions::ASSERT)
    }

    /// Whether `child` is a valid delegation from this grant.
    ///
    /// Same-scope children need delegating power and a subset of bits.
    /// A child scoped to a registry of this grant's namespace additionally
    /// needs ADMIN here; `registry_namespace` is the namespace that registry
    /// lives in.
    pub fn admits(&self, child: &AuthorizationGrant, registry_namespace: Option<&Uri>) -> Result<()> {
        child.verify()?;
        if child.delegator != self.delegate {
            return Err(PermsError::BrokenChain(format!(
                "{} was not delegated by the holder of {}",
                child.uri, self.uri
            )));
        }
        if child.scope != self.scope {
            let crosses = self.scope.kind() == EntityKind::Namespace
                && child.scope.kind() == EntityKind::Registry
                && registry_namespace == Some(&self.scope);
            if !crosses {
                return Err(PermsError::ScopeMismatch {
                    expected: child.scope.clone(),
                    got: self.scope.clone(),
                });
            }
            self.require(Permissions::ADMIN)?;
        }
        self.check_delegation(&child.delegate, child.permissions)
    }

    /// Re-derive the URI from the grant's parties.
    pub fn verify(&self) -> Result<()> {
        let derived = derive_authorization_uri(&self.scope, &self.delegate, &self.delegator)?;
        if derived != self.uri {
            return Err(PermsError::GrantMismatch {
                declared: self.uri.clone(),
                derived,
            });
        }
        Ok(())
    }

    pub fn is_root(&self) -> bool {
        self.delegate == self.delegator
    }

    fn check_delegation(&self, to: &Did, permissions: Permissions) -> Result<()> {
        if !self.permissions.can_delegate() {
            return Err(PermsError::CannotDelegate(self.permissions));
        }
        if !permissions.is_subset_of(self.permissions) {
            return Err(PermsError::Escalation {
                requested: permissions,
                held: self.permissions,
            });
        }
        if to == &self.delegate {
            return Err(PermsError::SelfDelegation);
        }
        Ok(())
    }

    fn assemble(scope: &Uri, delegate: &Did, permissions: Permissions, delegator: &Did) -> Result<Self> {
        let uri = derive_authorization_uri(scope, delegate, delegator)?;
        Ok(Self {
            uri,
            scope: scope.clone(),
            delegate: *delegate,
            permissions,
            delegator: *delegator,
        })
    }
}
