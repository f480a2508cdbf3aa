//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: an engine over the built-in
//! catalog, the default role set, and shorthand for writing overrides by
//! permission key instead of by bit.

use bitgate::Engine;
use bitgate_core::{Bitfield, Role, RoleId, ScopeId, ScopeOverride, UserId};
use bitgate_policy::{DefaultTier, EvaluationSnapshot};

/// Scope root used by fixtures.
pub const ROOT_SCOPE: ScopeId = ScopeId(1);

/// A resource scope inside [`ROOT_SCOPE`].
pub const ARTICLE_SCOPE: ScopeId = ScopeId(100);

/// The user fixtures evaluate for.
pub const TEST_USER: UserId = UserId(7);

/// First id of the default role set.
pub const FIRST_DEFAULT_ROLE: RoleId = RoleId(1);

/// Engine, default roles and helpers.
pub struct TestFixture {
    pub engine: Engine,
    pub default_roles: Vec<Role>,
}

impl TestFixture {
    /// Fixture over the built-in catalog.
    pub fn new() -> Self {
        let engine = Engine::with_builtin_catalog().expect("built-in engine");
        let default_roles = engine
            .default_roles(FIRST_DEFAULT_ROLE)
            .expect("default roles compose");
        Self {
            engine,
            default_roles,
        }
    }

    /// Bitfield of the named keys. Panics on unknown keys.
    pub fn bits(&self, keys: &[&str]) -> Bitfield {
        self.engine
            .registry()
            .bitfield_of(keys)
            .expect("fixture keys are registered")
    }

    /// One of the default roles.
    pub fn default_role(&self, tier: DefaultTier) -> Role {
        self.default_roles
            .iter()
            .find(|r| r.name == tier.name())
            .cloned()
            .expect("default tier present")
    }

    /// A custom role granting `keys`.
    pub fn role(&self, id: u64, name: &str, position: i32, keys: &[&str]) -> Role {
        Role::new(RoleId(id), name, position, self.bits(keys))
    }

    /// An override for a role.
    pub fn role_override(
        &self,
        scope: ScopeId,
        role: RoleId,
        allow: &[&str],
        deny: &[&str],
    ) -> ScopeOverride {
        ScopeOverride::for_role(scope, role)
            .allowing(self.bits(allow))
            .denying(self.bits(deny))
    }

    /// An override for a user.
    pub fn user_override(
        &self,
        scope: ScopeId,
        user: UserId,
        allow: &[&str],
        deny: &[&str],
    ) -> ScopeOverride {
        ScopeOverride::for_user(scope, user)
            .allowing(self.bits(allow))
            .denying(self.bits(deny))
    }

    /// An empty snapshot for [`TEST_USER`] at [`ROOT_SCOPE`].
    pub fn snapshot(&self, now: i64) -> EvaluationSnapshot {
        EvaluationSnapshot::new(TEST_USER, ROOT_SCOPE, now)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitgate_core::catalog::{ARTICLE_READ, ARTICLE_UPDATE};

    #[test]
    fn test_fixture_default_roles() {
        let fixture = TestFixture::new();
        assert_eq!(fixture.default_roles.len(), 5);
        assert!(fixture
            .default_role(DefaultTier::Everyone)
            .base_permissions
            .is_empty());
        assert_eq!(fixture.default_role(DefaultTier::Owner).position, 4);
    }

    #[test]
    fn test_fixture_overrides_by_key() {
        let fixture = TestFixture::new();
        let row = fixture.role_override(ARTICLE_SCOPE, RoleId(3), &[ARTICLE_READ], &[ARTICLE_UPDATE]);

        let reg = fixture.engine.registry();
        assert!(reg.has_permission(&row.allow, ARTICLE_READ).unwrap());
        assert!(reg.has_permission(&row.deny, ARTICLE_UPDATE).unwrap());
        assert_eq!(row.scope_id, ARTICLE_SCOPE);
    }
}
