//! Allow/deny pairs, one per precedence tier.

use bitgate_core::{status, BitStatus, Bitfield, PermissionBit};
use serde::{Deserialize, Serialize};

/// The `(allow, deny)` bitfields a tier contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPair {
    pub allow: Bitfield,
    pub deny: Bitfield,
}

impl TierPair {
    pub fn new(allow: Bitfield, deny: Bitfield) -> Self {
        Self { allow, deny }
    }

    /// The identity pair `(0, 0)`.
    pub fn zero() -> Self {
        Self::default()
    }

    /// OR both sides with another pair.
    pub fn merge(&self, other: &TierPair) -> TierPair {
        TierPair {
            allow: self.allow.union(&other.allow),
            deny: self.deny.union(&other.deny),
        }
    }

    /// Deny-first status of one bit in this tier.
    pub fn status(&self, bit: PermissionBit) -> BitStatus {
        status(&self.allow, &self.deny, bit)
    }

    /// Bits this tier has an opinion on.
    pub fn decided(&self) -> Bitfield {
        self.allow.union(&self.deny)
    }

    /// Bits this tier allows (deny removed).
    pub fn granted(&self) -> Bitfield {
        self.allow.difference(&self.deny)
    }

    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }
}
