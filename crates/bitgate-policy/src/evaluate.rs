//! The precedence waterfall.
//!
//! ```text
//! scope ──opinion?──▶ decide
//!   │ undefined
//!   ▼
//! role ───opinion?──▶ decide
//!   │ undefined
//!   ▼
//! user ───opinion?──▶ decide
//!   │ undefined
//!   ▼
//! default: denied
//! ```
//!
//! Only the first tier with an opinion on the bit decides. A lower tier is
//! never consulted once a higher one resolves, so a scope deny cannot be
//! lifted by a role or user allow, and a role deny cannot be lifted by a
//! user allow.

use std::fmt;

use bitgate_core::{BitStatus, Bitfield, PermissionBit};
use serde::{Deserialize, Serialize};

use crate::tier::TierPair;

/// The tier that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionLevel {
    Scope,
    Role,
    User,
    /// No tier had an opinion; fail closed.
    Default,
}

impl DecisionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionLevel::Scope => "scope",
            DecisionLevel::Role => "role",
            DecisionLevel::User => "user",
            DecisionLevel::Default => "default",
        }
    }
}

impl fmt::Display for DecisionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final outcome for one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectiveDecision {
    pub allowed: bool,
    pub deciding_level: DecisionLevel,
}

impl EffectiveDecision {
    pub const fn allowed_by(level: DecisionLevel) -> Self {
        Self {
            allowed: true,
            deciding_level: level,
        }
    }

    pub const fn denied_by(level: DecisionLevel) -> Self {
        Self {
            allowed: false,
            deciding_level: level,
        }
    }

    /// The fail-closed decision.
    pub const fn default_deny() -> Self {
        Self::denied_by(DecisionLevel::Default)
    }
}

/// Run the waterfall for one bit.
pub fn evaluate(
    scope: &TierPair,
    role: &TierPair,
    user: &TierPair,
    bit: PermissionBit,
) -> EffectiveDecision {
    let tiers = [
        (scope, DecisionLevel::Scope),
        (role, DecisionLevel::Role),
        (user, DecisionLevel::User),
    ];

    for (pair, level) in tiers {
        match pair.status(bit) {
            BitStatus::Deny => return EffectiveDecision::denied_by(level),
            BitStatus::Allow => return EffectiveDecision::allowed_by(level),
            BitStatus::Undefined => {}
        }
    }

    EffectiveDecision::default_deny()
}

/// Every bit the waterfall allows, computed with set algebra.
///
/// Agrees with [`evaluate`] on every bit: a bit is in the result exactly
/// when `evaluate(..).allowed` is true for it.
pub fn effective_permissions(scope: &TierPair, role: &TierPair, user: &TierPair) -> Bitfield {
    let scope_decided = scope.decided();
    let role_decided = role.decided();

    let from_scope = scope.granted();
    let from_role = role.granted().difference(&scope_decided);
    let from_user = user
        .granted()
        .difference(&scope_decided)
        .difference(&role_decided);

    Bitfield::union_all([&from_scope, &from_role, &from_user])
}

/// The three tier pairs for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSet {
    pub scope: TierPair,
    pub role: TierPair,
    pub user: TierPair,
}

impl TierSet {
    /// Decide one bit.
    pub fn decide(&self, bit: PermissionBit) -> EffectiveDecision {
        evaluate(&self.scope, &self.role, &self.user, bit)
    }

    /// All allowed bits.
    pub fn effective(&self) -> Bitfield {
        effective_permissions(&self.scope, &self.role, &self.user)
    }
}
