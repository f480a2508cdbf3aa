//! Evaluation snapshots.
//!
//! A snapshot holds every input for one evaluation, read from a single
//! consistent view of the caller's storage. Mixing reads from different
//! moments (roles from one, overrides from another) can produce decisions
//! that were never true at any instant, so the engine only accepts inputs
//! in this form.
//!
//! Tier sources:
//!
//! - **scope**: active rows stored on the target scope, for the user's roles
//!   and for the user, merged into one pair.
//! - **role**: base permissions of the user's roles plus active role rows on
//!   the scope root.
//! - **user**: active rows for the user on the scope root.
//!
//! When there is no target scope (or it is the root itself), the scope tier
//! is empty.

use bitgate_core::{Role, ScopeId, ScopeOverride, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate_roles, role_override_pair};
use crate::evaluate::TierSet;
use crate::resolve::{resolve_scope, ResolvedScope};

/// Overrides stored on the resource being accessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetScope {
    pub scope_id: ScopeId,
    #[serde(default)]
    pub overrides: Vec<ScopeOverride>,
}

/// Immutable evaluation inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSnapshot {
    pub user_id: UserId,
    pub scope_root: ScopeId,
    /// Roles directly assigned to the user within `scope_root`.
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Override rows stored on `scope_root`.
    #[serde(default)]
    pub root_overrides: Vec<ScopeOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetScope>,
    /// Evaluation instant, Unix milliseconds.
    pub now: i64,
}

/// Diagnostics gathered while building tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub expired_rows: usize,
    pub foreign_rows: usize,
    /// Scopes in which the user had more than one row.
    pub duplicate_user_scopes: usize,
}

impl ResolutionStats {
    fn record(&mut self, resolved: &ResolvedScope<'_>) {
        self.expired_rows += resolved.expired;
        self.foreign_rows += resolved.foreign;
        if resolved.has_duplicate_user_rows() {
            self.duplicate_user_scopes += 1;
        }
    }
}

impl EvaluationSnapshot {
    /// A snapshot at the scope root with no roles and no overrides.
    pub fn new(user_id: UserId, scope_root: ScopeId, now: i64) -> Self {
        Self {
            user_id,
            scope_root,
            roles: Vec::new(),
            root_overrides: Vec::new(),
            target: None,
            now,
        }
    }

    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_root_overrides(mut self, overrides: Vec<ScopeOverride>) -> Self {
        self.root_overrides = overrides;
        self
    }

    pub fn with_target(mut self, scope_id: ScopeId, overrides: Vec<ScopeOverride>) -> Self {
        self.target = Some(TargetScope { scope_id, overrides });
        self
    }

    /// Same inputs, different clock.
    pub fn at(mut self, now: i64) -> Self {
        self.now = now;
        self
    }

    /// Build the three tier pairs.
    pub fn tiers(&self) -> TierSet {
        self.tiers_with_stats().0
    }

    /// Build the tier pairs and report what was filtered out.
    pub fn tiers_with_stats(&self) -> (TierSet, ResolutionStats) {
        let mut stats = ResolutionStats::default();

        let root = resolve_scope(self.scope_root, &self.root_overrides, self.user_id, self.now);
        stats.record(&root);

        let role = aggregate_roles(&self.roles, root.role_rows.iter().copied());
        let user = root.user.clone();

        let scope = match &self.target {
            Some(target) if target.scope_id != self.scope_root => {
                let resolved =
                    resolve_scope(target.scope_id, &target.overrides, self.user_id, self.now);
                stats.record(&resolved);
                role_override_pair(&self.roles, resolved.role_rows.iter().copied())
                    .merge(&resolved.user)
            }
            _ => Default::default(),
        };

        (TierSet { scope, role, user }, stats)
    }
}
