//! Scope override resolution.
//!
//! Takes every override row stored for one scope, drops the rows that have
//! expired at the evaluation instant, and splits the rest by subject: role
//! rows go on to role aggregation, rows for the evaluating user are merged
//! into one pair. Resolution is total; malformed-but-readable input (such
//! as two rows for the same user) is merged, never rejected.

use bitgate_core::{ScopeId, ScopeOverride, Subject, UserId};

use crate::tier::TierPair;

/// Overrides for one scope, filtered and partitioned for one user.
#[derive(Debug, Clone, Default)]
pub struct ResolvedScope<'a> {
    /// Active role-targeted rows, in input order.
    pub role_rows: Vec<&'a ScopeOverride>,
    /// Merged active rows targeting the evaluating user.
    pub user: TierPair,
    /// Number of active rows for the evaluating user. More than one is a
    /// data anomaly that was resolved by OR-merging.
    pub user_rows: usize,
    /// Rows dropped because they expired at or before `now`.
    pub expired: usize,
    /// Rows dropped because they belong to a different scope.
    pub foreign: usize,
}

impl ResolvedScope<'_> {
    /// Whether the user had more than one active row in this scope.
    pub fn has_duplicate_user_rows(&self) -> bool {
        self.user_rows > 1
    }
}

/// Active rows of `scope_id` at `now`.
pub fn active_rows<'a>(
    scope_id: ScopeId,
    rows: &'a [ScopeOverride],
    now: i64,
) -> impl Iterator<Item = &'a ScopeOverride> + 'a {
    rows.iter()
        .filter(move |row| row.scope_id == scope_id && row.is_active(now))
}

/// Filter and partition the rows stored for `scope_id`.
pub fn resolve_scope(
    scope_id: ScopeId,
    rows: &[ScopeOverride],
    user_id: UserId,
    now: i64,
) -> ResolvedScope<'_> {
    let mut resolved = ResolvedScope::default();

    for row in rows {
        if row.scope_id != scope_id {
            resolved.foreign += 1;
            continue;
        }
        if !row.is_active(now) {
            resolved.expired += 1;
            continue;
        }
        match row.subject {
            Subject::Role(_) => resolved.role_rows.push(row),
            Subject::User(id) if id == user_id => {
                resolved.user = resolved.user.merge(&TierPair {
                    allow: row.allow.clone(),
                    deny: row.deny.clone(),
                });
                resolved.user_rows += 1;
            }
            Subject::User(_) => {}
        }
    }

    resolved
}
