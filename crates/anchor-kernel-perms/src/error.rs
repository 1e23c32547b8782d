//! Error types for the permissions module.

use thiserror::Error;

use anchor_kernel_core::{Did, Uri};

use crate::permissions::Permissions;

/// Errors raised by permission checks and delegation.
#[derive(Debug, Error)]
pub enum PermsError {
    /// The grant does not carry the required bits.
    #[error("permission denied: requires {required}, grant holds {held}")]
    PermissionDenied {
        required: Permissions,
        held: Permissions,
    },

    /// The grant holds neither DELEGATE nor ADMIN.
    #[error("grant holding {0} cannot delegate")]
    CannotDelegate(Permissions),

    /// A delegate tried to hand out bits it does not hold.
    #[error("cannot grant {requested}: delegator holds only {held}")]
    Escalation {
        requested: Permissions,
        held: Permissions,
    },

    /// The acting identity is not the grant's delegate.
    #[error("{caller} is not the delegate of grant {grant}")]
    NotDelegate { caller: Did, grant: Uri },

    /// The grant neither owns the record nor administers its scope.
    #[error("grant {grant} is not the owner {owner} and lacks ADMIN")]
    NotOwner { grant: Uri, owner: Uri },

    /// The grant applies to a different scope.
    #[error("grant scope {got} does not cover {expected}")]
    ScopeMismatch { expected: Uri, got: Uri },

    /// The grant's URI does not match its parties.
    #[error("grant identifier mismatch: declared {declared}, derived {derived}")]
    GrantMismatch { declared: Uri, derived: Uri },

    /// Delegating to oneself would collide with the root grant.
    #[error("cannot delegate to self")]
    SelfDelegation,

    /// Bits outside ASSERT|DELEGATE|ADMIN.
    #[error("unknown permission bits: {0:#x}")]
    UnknownBits(u32),

    /// A delegation chain is not linked root to leaf.
    #[error("broken delegation chain: {0}")]
    BrokenChain(String),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] anchor_kernel_core::CoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
