//! Entry lifecycle state machine.
//!
//! ```text
//!   Absent ──Create──► Active ◄──Reinstate── Revoked
//!                        └───────Revoke────────►
//! ```
//!
//! Revoke and Reinstate set the flag whatever its prior value. Update and
//! TransferOwnership apply in both Active and Revoked and leave the flag
//! alone. Entries are never removed.

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;
use crate::records::EntryRecord;
use crate::uri::Uri;

/// Where an entry sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryState {
    Absent,
    Active,
    Revoked,
}

impl EntryState {
    /// State of an entry as last seen on the ledger.
    pub fn of(entry: Option<&EntryRecord>) -> Self {
        match entry {
            None => EntryState::Absent,
            Some(e) if e.revoked => EntryState::Revoked,
            Some(_) => EntryState::Active,
        }
    }

    pub fn exists(self) -> bool {
        self != EntryState::Absent
    }

    /// Apply `transition` to an entry at `uri` in this state.
    pub fn apply(self, transition: Transition, uri: &Uri) -> Result<EntryState, LifecycleError> {
        use EntryState::*;
        use Transition::*;

        match (self, transition) {
            (Absent, Create) => Ok(Active),
            (Absent, _) => Err(LifecycleError::NotFound(uri.to_string())),
            (_, Create) => Err(LifecycleError::AlreadyExists(uri.to_string())),
            (_, Revoke) => Ok(Revoked),
            (_, Reinstate) => Ok(Active),
            (state, Update | TransferOwnership) => Ok(state),
        }
    }
}

/// A lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    Create,
    Update,
    Revoke,
    Reinstate,
    TransferOwnership,
}

impl Transition {
    /// Check the existence precondition alone, for callers that only know
    /// whether the entry is anchored.
    pub fn check_presence(self, exists: bool, uri: &Uri) -> Result<(), LifecycleError> {
        match (self, exists) {
            (Transition::Create, true) => Err(LifecycleError::AlreadyExists(uri.to_string())),
            (Transition::Create, false) | (_, true) => Ok(()),
            (_, false) => Err(LifecycleError::NotFound(uri.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Transition::Create => "create",
            Transition::Update => "update",
            Transition::Revoke => "revoke",
            Transition::Reinstate => "reinstate",
            Transition::TransferOwnership => "transfer_ownership",
        }
    }
}
