//! Role aggregation.
//!
//! Folds a user's roles and the role-targeted overrides that apply to them
//! into one [`TierPair`]. Every step is a union, so the result does not
//! depend on the order of either input.

use std::collections::HashSet;

use bitgate_core::{Bitfield, Role, RoleId, ScopeOverride, Subject};

use crate::tier::TierPair;

/// Aggregate assigned roles plus active role-targeted overrides.
///
/// - `allow` is the union of every role's base permissions and the `allow`
///   of every override whose subject is one of `roles`.
/// - `deny` is the union of those overrides' `deny`. Roles have no deny of
///   their own.
///
/// Overrides naming a role the user does not hold, or naming a user, are
/// ignored. Callers are expected to have dropped expired rows already
/// (see [`resolve_scope`](crate::resolve::resolve_scope)).
pub fn aggregate_roles<'a, I>(roles: &[Role], role_overrides: I) -> TierPair
where
    I: IntoIterator<Item = &'a ScopeOverride>,
{
    let base = Bitfield::union_all(roles.iter().map(|r| &r.base_permissions));
    let overrides = role_override_pair(roles, role_overrides);

    TierPair {
        allow: base.union(&overrides.allow),
        deny: overrides.deny,
    }
}

/// Union of the overrides targeting any of `roles`, without base permissions.
pub fn role_override_pair<'a, I>(roles: &[Role], role_overrides: I) -> TierPair
where
    I: IntoIterator<Item = &'a ScopeOverride>,
{
    let held: HashSet<RoleId> = roles.iter().map(|r| r.id).collect();

    role_overrides
        .into_iter()
        .filter(|row| matches!(row.subject, Subject::Role(id) if held.contains(&id)))
        .fold(TierPair::zero(), |mut acc, row| {
            acc.allow = acc.allow.union(&row.allow);
            acc.deny = acc.deny.union(&row.deny);
            acc
        })
}

/// Highest position among `roles`, if any.
pub fn highest_position(roles: &[Role]) -> Option<i32> {
    roles.iter().map(|r| r.position).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitgate_core::{PermissionBit, ScopeId, UserId};
    use proptest::prelude::*;

    fn bits(b: &[u32]) -> Bitfield {
        b.iter().copied().map(PermissionBit).collect()
    }

    fn role(id: u64, position: i32, base: &[u32]) -> Role {
        Role::new(RoleId(id), format!("r{id}"), position, bits(base))
    }

    #[test]
    fn test_base_permissions_are_unioned() {
        let roles = vec![role(1, 1, &[0, 1]), role(2, 2, &[1, 5])];
        let pair = aggregate_roles(&roles, std::iter::empty());

        assert_eq!(pair.allow, bits(&[0, 1, 5]));
        assert!(pair.deny.is_empty());
    }

    #[test]
    fn test_no_roles_is_zero() {
        let pair = aggregate_roles(&[], std::iter::empty());
        assert!(pair.is_empty());
        assert_eq!(highest_position(&[]), None);
    }

    #[test]
    fn test_one_denied_role_is_visible() {
        let roles = vec![role(1, 1, &[5]), role(2, 2, &[5]), role(3, 3, &[])];
        let rows = vec![ScopeOverride::for_role(ScopeId(1), RoleId(3)).denying(bits(&[5]))];
        let pair = aggregate_roles(&roles, &rows);

        assert!(pair.allow.is_set(PermissionBit(5)));
        assert!(pair.deny.is_set(PermissionBit(5)));
        assert_eq!(pair.status(PermissionBit(5)), bitgate_core::BitStatus::Deny);
    }

    #[test]
    fn test_overrides_for_unheld_roles_and_users_ignored() {
        let roles = vec![role(1, 1, &[])];
        let rows = vec![
            ScopeOverride::for_role(ScopeId(1), RoleId(99)).denying(bits(&[2])),
            ScopeOverride::for_user(ScopeId(1), UserId(1)).allowing(bits(&[3])),
            ScopeOverride::for_role(ScopeId(1), RoleId(1)).allowing(bits(&[4])),
        ];
        let pair = aggregate_roles(&roles, &rows);

        assert_eq!(pair.allow, bits(&[4]));
        assert!(pair.deny.is_empty());
    }

    #[test]
    fn test_highest_position() {
        let roles = vec![role(1, 4, &[]), role(2, 9, &[]), role(3, -1, &[])];
        assert_eq!(highest_position(&roles), Some(9));
    }

    fn roles_and_rows() -> impl Strategy<Value = (Vec<Role>, Vec<ScopeOverride>)> {
        let roles = prop::collection::vec(prop::collection::vec(0u32..64, 0..6), 0..6).prop_map(
            |bases| {
                bases
                    .iter()
                    .enumerate()
                    .map(|(i, base)| role(i as u64, i as i32, base))
                    .collect::<Vec<_>>()
            },
        );
        // Row subjects range past the held role ids, so some rows never apply.
        let rows = prop::collection::vec(
            (
                0u64..8,
                prop::collection::vec(0u32..64, 0..4),
                prop::collection::vec(0u32..64, 0..4),
            ),
            0..8,
        )
        .prop_map(|specs| {
            specs
                .iter()
                .map(|(id, allow, deny)| {
                    ScopeOverride::for_role(ScopeId(1), RoleId(*id))
                        .allowing(bits(allow))
                        .denying(bits(deny))
                })
                .collect::<Vec<_>>()
        });
        (roles, rows)
    }

    proptest! {
        #[test]
        fn test_permutation_invariant(
            (roles, rows, shuffled_roles, shuffled_rows) in roles_and_rows().prop_flat_map(
                |(roles, rows)| {
                    (
                        Just(roles.clone()),
                        Just(rows.clone()),
                        Just(roles).prop_shuffle(),
                        Just(rows).prop_shuffle(),
                    )
                },
            ),
        ) {
            prop_assert_eq!(
                aggregate_roles(&shuffled_roles, &shuffled_rows),
                aggregate_roles(&roles, &rows)
            );
        }
    }
}
