//! Role hierarchy guard.
//!
//! Capability bits say *what* an actor may do to roles; the hierarchy says
//! *which* roles. An actor can only assign, edit or delete roles strictly
//! below its own highest role, so holding `role.manage` never lets anyone
//! promote themselves. Holders of the owner capability and the system
//! itself are exempt from the position check.

use bitgate_core::{Bitfield, PermissionBit, Role, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::highest_position;
use crate::error::{PolicyError, Result};

/// A member acting on roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberActor {
    pub user_id: UserId,
    /// Highest position among the member's roles; `None` if they hold none.
    pub highest_position: Option<i32>,
    /// The member's permissions, used to detect the owner capability.
    pub permissions: Bitfield,
}

impl MemberActor {
    /// Derive rank and permissions from the member's assigned roles.
    pub fn from_roles(user_id: UserId, roles: &[Role]) -> Self {
        Self {
            user_id,
            highest_position: highest_position(roles),
            permissions: Bitfield::union_all(roles.iter().map(|r| &r.base_permissions)),
        }
    }

    /// Replace the permissions, e.g. with evaluated effective permissions.
    pub fn with_permissions(mut self, permissions: Bitfield) -> Self {
        self.permissions = permissions;
        self
    }
}

/// Who is performing a role mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// Internal callers (migrations, integrations). Not bound by position.
    System,
    Member(MemberActor),
}

/// The change being attempted on a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoleMutation {
    /// Grant the role to, or remove it from, a member.
    Assign,
    /// Change permissions or metadata; `new_position` when moving the role.
    Edit { new_position: Option<i32> },
    /// Delete the role; `member_count` is how many members still hold it.
    Delete { member_count: u64 },
}

/// Check whether `actor` may apply `mutation` to `target`.
///
/// `owner_bit` is the capability that lifts the position check.
pub fn authorize_role_mutation(
    actor: &Actor,
    target: &Role,
    mutation: RoleMutation,
    owner_bit: PermissionBit,
) -> Result<()> {
    if let RoleMutation::Delete { member_count } = mutation {
        if member_count > 0 {
            return Err(PolicyError::RoleInUse {
                role: target.id,
                members: member_count,
            });
        }
    }

    let member = match actor {
        Actor::System => return Ok(()),
        Actor::Member(member) => member,
    };

    if target.managed {
        return Err(PolicyError::ManagedRole(target.id));
    }

    if member.permissions.is_set(owner_bit) {
        return Ok(());
    }

    check_outranks(member, target, target.position)?;
    if let RoleMutation::Edit {
        new_position: Some(position),
    } = mutation
    {
        check_outranks(member, target, position)?;
    }

    Ok(())
}

fn check_outranks(member: &MemberActor, target: &Role, position: i32) -> Result<()> {
    match member.highest_position {
        Some(own) if own > position => Ok(()),
        actor_position => Err(PolicyError::InsufficientHierarchy {
            role: target.id,
            actor_position,
            target_position: position,
        }),
    }
}
