//! Proptest generators for property-based testing.

use proptest::prelude::*;

use bitgate_core::{Bitfield, PermissionBit, Role, RoleId, ScopeId, ScopeOverride, Subject, UserId};
use bitgate_policy::{EvaluationSnapshot, TierPair};

/// Highest bit index generated by default.
pub const MAX_BIT: u32 = 200;

/// Generate a bit index below `max`.
pub fn permission_bit(max: u32) -> impl Strategy<Value = PermissionBit> {
    (0..max).prop_map(PermissionBit)
}

/// Generate a bitfield with up to 24 bits below `max`.
pub fn bitfield(max: u32) -> impl Strategy<Value = Bitfield> {
    prop::collection::vec(permission_bit(max), 0..24).prop_map(Bitfield::from_bits)
}

/// Generate an allow/deny pair.
pub fn tier_pair(max: u32) -> impl Strategy<Value = TierPair> {
    (bitfield(max), bitfield(max)).prop_map(|(allow, deny)| TierPair::new(allow, deny))
}

/// Generate an expiry: none, or within a window around `now`.
pub fn expiry(now: i64) -> impl Strategy<Value = Option<i64>> {
    prop_oneof![
        Just(None),
        (now - 1_000..now + 1_000).prop_map(Some),
    ]
}

/// Generate a role with an id from `ids`.
pub fn role(ids: std::ops::Range<u64>) -> impl Strategy<Value = Role> {
    (ids, -5i32..20, bitfield(MAX_BIT)).prop_map(|(id, position, bits)| {
        Role::new(RoleId(id), format!("role-{id}"), position, bits)
    })
}

/// Generate an override row on `scope` for one of `roles` or `user`.
pub fn scope_override(
    scope: ScopeId,
    roles: std::ops::Range<u64>,
    user: UserId,
    now: i64,
) -> impl Strategy<Value = ScopeOverride> {
    let subject = prop_oneof![
        roles.prop_map(|id| Subject::Role(RoleId(id))),
        Just(Subject::User(user)),
    ];
    (subject, bitfield(MAX_BIT), bitfield(MAX_BIT), expiry(now)).prop_map(
        move |(subject, allow, deny, expires_at)| ScopeOverride {
            expires_at,
            ..ScopeOverride::new(scope, subject).allowing(allow).denying(deny)
        },
    )
}

/// Parameters for generating a snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotParams {
    pub user_id: UserId,
    pub scope_root: ScopeId,
    pub target_scope: ScopeId,
    pub now: i64,
}

impl Default for SnapshotParams {
    fn default() -> Self {
        Self {
            user_id: UserId(7),
            scope_root: ScopeId(1),
            target_scope: ScopeId(2),
            now: 1_700_000_000_000,
        }
    }
}

/// Generate a full snapshot: up to 4 roles, root rows and target rows.
///
/// Role ids are drawn from 1..8, so some overrides name roles the user
/// does not hold.
pub fn snapshot(params: SnapshotParams) -> impl Strategy<Value = EvaluationSnapshot> {
    let SnapshotParams {
        user_id,
        scope_root,
        target_scope,
        now,
    } = params;
    (
        prop::collection::vec(role(1..5), 0..4),
        prop::collection::vec(scope_override(scope_root, 1..8, user_id, now), 0..5),
        prop::collection::vec(scope_override(target_scope, 1..8, user_id, now), 0..5),
    )
        .prop_map(move |(roles, root_rows, target_rows)| {
            EvaluationSnapshot::new(user_id, scope_root, now)
                .with_roles(roles)
                .with_root_overrides(root_rows)
                .with_target(target_scope, target_rows)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitgate_policy::DecisionLevel;

    proptest! {
        #[test]
        fn test_effective_matches_per_bit_decisions(
            snap in snapshot(SnapshotParams::default()),
            bit in permission_bit(MAX_BIT),
        ) {
            let tiers = snap.tiers();
            let decision = tiers.decide(bit);
            prop_assert_eq!(tiers.effective().is_set(bit), decision.allowed);
        }

        #[test]
        fn test_role_order_does_not_matter(
            snap in snapshot(SnapshotParams::default()),
            bit in permission_bit(MAX_BIT),
        ) {
            let mut reversed = snap.clone();
            reversed.roles.reverse();
            reversed.root_overrides.reverse();
            prop_assert_eq!(snap.tiers().decide(bit), reversed.tiers().decide(bit));
        }

        #[test]
        fn test_expired_rows_are_invisible(
            snap in snapshot(SnapshotParams::default()),
            bit in permission_bit(MAX_BIT),
        ) {
            let now = snap.now;
            let mut pruned = snap.clone();
            pruned.root_overrides.retain(|o| o.is_active(now));
            if let Some(target) = pruned.target.as_mut() {
                target.overrides.retain(|o| o.is_active(now));
            }
            prop_assert_eq!(snap.tiers().decide(bit), pruned.tiers().decide(bit));
        }

        #[test]
        fn test_scope_deny_is_final(
            snap in snapshot(SnapshotParams::default()),
            bit in permission_bit(MAX_BIT),
        ) {
            let target_scope = SnapshotParams::default().target_scope;
            let denied = snap.clone().with_target(
                target_scope,
                vec![ScopeOverride::for_user(target_scope, snap.user_id)
                    .denying(Bitfield::zero().with_bit(bit))],
            );
            let decision = denied.tiers().decide(bit);
            prop_assert!(!decision.allowed);
            prop_assert_eq!(decision.deciding_level, DecisionLevel::Scope);
        }
    }
}
