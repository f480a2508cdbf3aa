//! The default role set created at scope-root setup.
//!
//! Each tier includes every capability of the tier below it. The owner tier
//! is every active capability in the registry, so it picks up new
//! capabilities automatically when the registry grows.

use bitgate_core::catalog::{
    ARTICLE_CREATE, ARTICLE_DELETE, ARTICLE_PUBLISH, ARTICLE_READ, ARTICLE_UPDATE, AUDIT_VIEW,
    COMMENT_CREATE, COMMENT_MODERATE, MEMBER_BAN, MEMBER_INVITE, MEMBER_KICK, OVERRIDE_MANAGE,
    ROLE_ASSIGN, ROLE_MANAGE, SCOPE_MANAGE, SCOPE_VIEW,
};
use bitgate_core::{Bitfield, PermissionRegistry, Role, RoleId};
use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, Result};

/// The built-in role tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultTier {
    Everyone,
    Member,
    Moderator,
    Admin,
    Owner,
}

impl DefaultTier {
    pub const ALL: [DefaultTier; 5] = [
        DefaultTier::Everyone,
        DefaultTier::Member,
        DefaultTier::Moderator,
        DefaultTier::Admin,
        DefaultTier::Owner,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DefaultTier::Everyone => "everyone",
            DefaultTier::Member => "member",
            DefaultTier::Moderator => "moderator",
            DefaultTier::Admin => "admin",
            DefaultTier::Owner => "owner",
        }
    }

    /// Position relative to the lowest default role.
    pub fn rank(&self) -> i32 {
        *self as i32
    }

    /// Keys this tier adds on top of the tier below.
    fn added_keys(&self) -> &'static [&'static str] {
        match self {
            DefaultTier::Everyone => &[],
            DefaultTier::Member => &[SCOPE_VIEW, ARTICLE_READ, ARTICLE_CREATE, COMMENT_CREATE],
            DefaultTier::Moderator => &[
                ARTICLE_UPDATE,
                ARTICLE_PUBLISH,
                COMMENT_MODERATE,
                MEMBER_KICK,
                AUDIT_VIEW,
            ],
            DefaultTier::Admin => &[
                ARTICLE_DELETE,
                MEMBER_INVITE,
                MEMBER_BAN,
                ROLE_MANAGE,
                ROLE_ASSIGN,
                OVERRIDE_MANAGE,
                SCOPE_MANAGE,
            ],
            DefaultTier::Owner => &[],
        }
    }

    fn color(&self) -> u32 {
        match self {
            DefaultTier::Everyone => 0x99aab5,
            DefaultTier::Member => 0x3498db,
            DefaultTier::Moderator => 0x2ecc71,
            DefaultTier::Admin => 0xe67e22,
            DefaultTier::Owner => 0xe74c3c,
        }
    }
}

/// The canonical bitfield for a tier.
///
/// Fails if the registry lacks one of the tier's capabilities.
pub fn compose(tier: DefaultTier, registry: &PermissionRegistry) -> Result<Bitfield> {
    if tier == DefaultTier::Owner {
        return Ok(registry.all_active());
    }

    let keys = DefaultTier::ALL
        .iter()
        .filter(|t| **t <= tier)
        .flat_map(|t| t.added_keys().iter().copied());
    Ok(registry.bitfield_of(keys)?)
}

/// The five default roles, with ids starting at `first_id`.
///
/// Positions run 0 (everyone) to 4 (owner). Fails if the ids would pass
/// `u64::MAX`.
pub fn default_roles(registry: &PermissionRegistry, first_id: RoleId) -> Result<Vec<Role>> {
    DefaultTier::ALL
        .iter()
        .map(|tier| -> Result<Role> {
            let id = first_id
                .0
                .checked_add(tier.rank() as u64)
                .ok_or(PolicyError::RoleIdOverflow(first_id))?;
            Ok(Role::new(RoleId(id), tier.name(), tier.rank(), compose(*tier, registry)?)
                .with_color(tier.color())
                .with_mentionable(*tier != DefaultTier::Everyone))
        })
        .collect()
}
