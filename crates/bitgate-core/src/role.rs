//! Role records.

use serde::{Deserialize, Serialize};

use crate::bitfield::Bitfield;
use crate::types::RoleId;

/// A named bundle of capabilities with a seniority position.
///
/// Positions are unique within a scope root; a higher position is more
/// senior. Roles carry no deny bits of their own, only scope overrides can
/// deny a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub position: i32,
    #[serde(default)]
    pub base_permissions: Bitfield,
    #[serde(default)]
    pub mentionable: bool,
    /// Owned by the system (e.g. an integration); non-system actors may not edit it.
    #[serde(default)]
    pub managed: bool,
    /// Display color as `0xRRGGBB`.
    #[serde(default)]
    pub color: u32,
}

impl Role {
    pub fn new(id: RoleId, name: impl Into<String>, position: i32, base_permissions: Bitfield) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            base_permissions,
            mentionable: false,
            managed: false,
            color: 0,
        }
    }

    /// Mark as system-managed.
    pub fn managed(mut self) -> Self {
        self.managed = true;
        self
    }

    pub fn with_mentionable(mut self, mentionable: bool) -> Self {
        self.mentionable = mentionable;
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Whether this role is strictly more senior than `other`.
    pub fn outranks(&self, other: &Role) -> bool {
        self.position > other.position
    }
}
