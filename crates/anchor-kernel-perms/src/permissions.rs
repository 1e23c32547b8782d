//! Permission bitmasks.
//!
//! Each bit is an independent power of two, combined with `|`:
//!
//! | Bit      | Value | Allows                                  |
//! |----------|-------|-----------------------------------------|
//! | ASSERT   | 1     | create and mutate entries in the scope  |
//! | DELEGATE | 2     | hand a subset of one's bits to others   |
//! | ADMIN    | 4     | manage the scope and its child scopes   |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use crate::error::PermsError;

/// A set of permission bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Permissions(u32);

impl Permissions {
    pub const NONE: Self = Self(0);
    pub const ASSERT: Self = Self(1);
    pub const DELEGATE: Self = Self(2);
    pub const ADMIN: Self = Self(4);
    pub const ALL: Self = Self(7);

    const NAMED: [(Permissions, &'static str); 3] = [
        (Permissions::ASSERT, "ASSERT"),
        (Permissions::DELEGATE, "DELEGATE"),
        (Permissions::ADMIN, "ADMIN"),
    ];

    /// Accept a mask only if every bit is known.
    pub fn from_bits(bits: u32) -> Option<Self> {
        (bits & !Self::ALL.0 == 0).then_some(Self(bits))
    }

    /// Drop unknown bits.
    pub fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `(self & other) == other`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_subset_of(self, other: Self) -> bool {
        other.contains(self)
    }

    /// Whether a holder of these bits may delegate at all.
    pub const fn can_delegate(self) -> bool {
        self.0 & (Self::DELEGATE.0 | Self::ADMIN.0) != 0
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permissions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl TryFrom<u32> for Permissions {
    type Error = PermsError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::from_bits(bits).ok_or(PermsError::UnknownBits(bits))
    }
}

impl From<Permissions> for u32 {
    fn from(p: Permissions) -> u32 {
        p.0
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permissions({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bit_values() {
        assert_eq!(Permissions::ASSERT.bits(), 1);
        assert_eq!(Permissions::DELEGATE.bits(), 2);
        assert_eq!(Permissions::ADMIN.bits(), 4);
        assert_eq!(
            Permissions::ASSERT | Permissions::DELEGATE | Permissions::ADMIN,
            Permissions::ALL
        );
    }

    #[test]
    fn test_contains() {
        let held = Permissions::ASSERT | Permissions::DELEGATE;
        assert!(held.contains(Permissions::ASSERT));
        assert!(held.contains(held));
        assert!(!held.contains(Permissions::ADMIN));
        assert!(held.contains(Permissions::NONE));
    }

    #[test]
    fn test_display() {
        assert_eq!(Permissions::ALL.to_string(), "ASSERT|DELEGATE|ADMIN");
        assert_eq!(Permissions::NONE.to_string(), "NONE");
        assert_eq!(format!("{:?}", Permissions::ADMIN), "Permissions(ADMIN)");
    }

    #[test]
    fn test_unknown_bits_rejected() {
        assert!(Permissions::from_bits(8).is_none());
        assert_eq!(Permissions::from_bits_truncate(0xf), Permissions::ALL);
        assert!(serde_json::from_str::<Permissions>("9").is_err());
        assert_eq!(serde_json::from_str::<Permissions>("3").unwrap().bits(), 3);
    }

    #[test]
    fn test_can_delegate() {
        assert!(!Permissions::ASSERT.can_delegate());
        assert!(Permissions::DELEGATE.can_delegate());
        assert!(Permissions::ADMIN.can_delegate());
    }

    proptest! {
        #[test]
        fn prop_contains_matches_mask(a in 0u32..8, b in 0u32..8) {
            let (pa, pb) = (Permissions::from_bits_truncate(a), Permissions::from_bits_truncate(b));
            prop_assert_eq!(pa.contains(pb), a & b == b);
            prop_assert_eq!(pb.is_subset_of(pa), a & b == b);
        }
    }
}
