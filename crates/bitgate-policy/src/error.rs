//! Error types for the policy layer.

use bitgate_core::{CoreError, RoleId};
use thiserror::Error;

/// Errors raised by role-mutation guards and policy construction.
///
/// Capability evaluation itself never fails; only key lookups (via
/// [`CoreError`]) and hierarchy checks do.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The actor does not outrank the role it is trying to change.
    #[error(
        "insufficient hierarchy: actor position {actor_position:?} does not exceed {target_position} for {role}"
    )]
    InsufficientHierarchy {
        role: RoleId,
        actor_position: Option<i32>,
        target_position: i32,
    },

    /// Managed roles can only be changed by the system.
    #[error("role {0} is managed and cannot be modified by this actor")]
    ManagedRole(RoleId),

    /// Roles cannot be deleted while members still hold them.
    #[error("role {role} is still held by {members} member(s)")]
    RoleInUse { role: RoleId, members: u64 },

    /// Default role ids starting at this id would overflow.
    #[error("default role ids starting at {0} overflow")]
    RoleIdOverflow(RoleId),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
