//! The built-in capability catalog.
//!
//! Bit indices in this table are permanent. New capabilities are appended
//! with the next free index; removed capabilities move to the retired list
//! and keep their index.

use crate::registry::PermissionRegistry;

pub const SCOPE_VIEW: &str = "scope.view";
pub const SCOPE_MANAGE: &str = "scope.manage";
pub const SCOPE_OWNER: &str = "scope.owner";
pub const ARTICLE_READ: &str = "article.read";
pub const ARTICLE_CREATE: &str = "article.create";
pub const ARTICLE_UPDATE: &str = "article.update";
pub const ARTICLE_DELETE: &str = "article.delete";
pub const ARTICLE_PUBLISH: &str = "article.publish";
pub const COMMENT_CREATE: &str = "comment.create";
pub const COMMENT_MODERATE: &str = "comment.moderate";
pub const MEMBER_INVITE: &str = "member.invite";
pub const MEMBER_KICK: &str = "member.kick";
pub const MEMBER_BAN: &str = "member.ban";
pub const ROLE_MANAGE: &str = "role.manage";
pub const ROLE_ASSIGN: &str = "role.assign";
pub const OVERRIDE_MANAGE: &str = "override.manage";
pub const AUDIT_VIEW: &str = "audit.view";

/// `(key, bit, description)` for every active built-in capability.
pub const BUILTIN_PERMISSIONS: &[(&str, u32, &str)] = &[
    (SCOPE_VIEW, 0, "See the scope and its public content"),
    (SCOPE_MANAGE, 1, "Edit scope settings"),
    (SCOPE_OWNER, 2, "Full control, bypasses the role hierarchy"),
    (ARTICLE_READ, 3, "Read articles"),
    (ARTICLE_CREATE, 4, "Create articles"),
    (ARTICLE_UPDATE, 5, "Edit articles"),
    (ARTICLE_DELETE, 6, "Delete articles"),
    (ARTICLE_PUBLISH, 7, "Publish drafts"),
    (COMMENT_CREATE, 8, "Post comments"),
    (COMMENT_MODERATE, 9, "Hide or remove other members' comments"),
    (MEMBER_INVITE, 10, "Invite new members"),
    (MEMBER_KICK, 11, "Remove members"),
    (MEMBER_BAN, 12, "Ban members"),
    (ROLE_MANAGE, 13, "Create, edit and delete roles"),
    (ROLE_ASSIGN, 14, "Assign roles to members"),
    (OVERRIDE_MANAGE, 15, "Create and edit scope overrides"),
    (AUDIT_VIEW, 16, "Read the audit trail"),
];

/// `(key, bit)` for retired built-in capabilities. Never reuse these bits.
pub const RETIRED_PERMISSIONS: &[(&str, u32)] = &[];

/// Registry holding the built-in catalog.
pub fn builtin_registry() -> PermissionRegistry {
    let builder = BUILTIN_PERMISSIONS
        .iter()
        .fold(PermissionRegistry::builder(), |b, (key, bit, desc)| {
            b.register_described(key, *bit, desc)
        });
    RETIRED_PERMISSIONS
        .iter()
        .fold(builder, |b, (key, bit)| b.retire(key, *bit))
        .build()
        .expect("built-in permission catalog is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitfield::PermissionBit;

    #[test]
    fn test_builtin_registry_builds() {
        let reg = builtin_registry();
        assert_eq!(reg.len(), BUILTIN_PERMISSIONS.len() + RETIRED_PERMISSIONS.len());
        assert_eq!(reg.lookup(ARTICLE_UPDATE).unwrap(), PermissionBit(5));
        assert_eq!(reg.lookup(SCOPE_OWNER).unwrap(), PermissionBit(2));
    }

    #[test]
    fn test_builtin_bits_are_dense_and_ordered() {
        for (i, (_, bit, _)) in BUILTIN_PERMISSIONS.iter().enumerate() {
            assert_eq!(*bit as usize, i);
        }
    }
}
