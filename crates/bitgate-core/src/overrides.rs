//! Scope overrides: time-limited allow/deny grants attached to a role or a
//! user within one scope.

use serde::{Deserialize, Serialize};

use crate::bitfield::Bitfield;
use crate::types::{RoleId, ScopeId, UserId};

/// Who an override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Subject {
    Role(RoleId),
    User(UserId),
}

/// Subject discriminator, for partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    Role,
    User,
}

impl Subject {
    pub fn subject_type(&self) -> SubjectType {
        match self {
            Subject::Role(_) => SubjectType::Role,
            Subject::User(_) => SubjectType::User,
        }
    }
}

/// One override row.
///
/// Missing `allow`/`deny` are the zero bitfield and a missing `expires_at`
/// never expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeOverride {
    pub scope_id: ScopeId,
    pub subject: Subject,
    #[serde(default)]
    pub allow: Bitfield,
    #[serde(default)]
    pub deny: Bitfield,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Expiry as Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl ScopeOverride {
    /// An empty override for a subject.
    pub fn new(scope_id: ScopeId, subject: Subject) -> Self {
        Self {
            scope_id,
            subject,
            allow: Bitfield::zero(),
            deny: Bitfield::zero(),
            reason: None,
            expires_at: None,
        }
    }

    pub fn for_role(scope_id: ScopeId, role_id: RoleId) -> Self {
        Self::new(scope_id, Subject::Role(role_id))
    }

    pub fn for_user(scope_id: ScopeId, user_id: UserId) -> Self {
        Self::new(scope_id, Subject::User(user_id))
    }

    pub fn allowing(mut self, allow: Bitfield) -> Self {
        self.allow = allow;
        self
    }

    pub fn denying(mut self, deny: Bitfield) -> Self {
        self.deny = deny;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn expiring_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the row still takes part in evaluation at `now`.
    ///
    /// A row expires at its `expires_at` instant, inclusive.
    pub fn is_active(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires) => expires > now,
            None => true,
        }
    }

    pub fn subject_type(&self) -> SubjectType {
        self.subject.subject_type()
    }
}
