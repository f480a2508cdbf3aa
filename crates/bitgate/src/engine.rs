//! The Engine: the entry point calling services use.
//!
//! The Engine binds an immutable [`PermissionRegistry`] to the policy
//! functions, translating permission keys to bits at the edge and logging
//! each decision. It holds no mutable state; clone it freely and share it
//! across threads.

use std::sync::Arc;

use bitgate_core::{
    builtin_registry, Bitfield, CoreError, PermissionBit, PermissionKey, PermissionRegistry,
    Role, RoleId,
};
use bitgate_policy::{
    authorize_role_mutation, default_roles, Actor, EffectiveDecision, EvaluationSnapshot,
    MemberActor, RoleMutation, TierSet,
};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// Authorization engine over one permission registry.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<PermissionRegistry>,
    config: EngineConfig,
    owner_bit: PermissionBit,
}

impl Engine {
    /// Create an engine.
    ///
    /// Fails if the configured owner capability is not an active key in
    /// `registry`.
    pub fn new(registry: Arc<PermissionRegistry>, config: EngineConfig) -> Result<Self> {
        let owner_bit = registry.lookup(&config.owner_permission).map_err(|e| {
            EngineError::Config(format!(
                "owner_permission {:?}: {e}",
                config.owner_permission
            ))
        })?;

        info!(
            permissions = registry.len(),
            owner_permission = %config.owner_permission,
            %owner_bit,
            "authorization engine ready"
        );

        Ok(Self {
            registry,
            config,
            owner_bit,
        })
    }

    /// An engine over the built-in catalog with default configuration.
    pub fn with_builtin_catalog() -> Result<Self> {
        Self::new(Arc::new(builtin_registry()), EngineConfig::default())
    }

    pub fn registry(&self) -> &PermissionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The bit of the owner capability.
    pub fn owner_bit(&self) -> PermissionBit {
        self.owner_bit
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve a key, logging failures before propagating them.
    pub fn lookup(&self, key: &str) -> Result<PermissionBit> {
        self.registry.lookup(key).map_err(|e| {
            match &e {
                CoreError::RetiredPermission { .. } => {
                    warn!(key, "lookup of retired permission")
                }
                _ => warn!(key, error = %e, "permission lookup failed"),
            }
            EngineError::from(e)
        })
    }

    /// Key for a bit, for audit output.
    pub fn reverse_lookup(&self, bit: PermissionBit) -> Option<&PermissionKey> {
        self.registry.reverse_lookup(bit)
    }

    /// Keys of every registered bit in `permissions`.
    pub fn describe(&self, permissions: &Bitfield) -> Vec<String> {
        self.registry
            .keys_in(permissions)
            .into_iter()
            .map(|k| k.to_string())
            .collect()
    }

    /// Check one named capability against a precomputed bitfield.
    pub fn has_permission(&self, permissions: &Bitfield, key: &str) -> Result<bool> {
        Ok(permissions.is_set(self.lookup(key)?))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Evaluation
    // ─────────────────────────────────────────────────────────────────────────

    /// Decide one named capability for the snapshot's user.
    pub fn evaluate(&self, snapshot: &EvaluationSnapshot, key: &str) -> Result<EffectiveDecision> {
        let bit = self.lookup(key)?;
        let tiers = self.tiers(snapshot);
        Ok(self.decide(snapshot, &tiers, bit))
    }

    /// Decide one bit. Total: never fails.
    pub fn evaluate_bit(&self, snapshot: &EvaluationSnapshot, bit: PermissionBit) -> EffectiveDecision {
        let tiers = self.tiers(snapshot);
        self.decide(snapshot, &tiers, bit)
    }

    /// Decide several keys against one snapshot, resolving tiers once.
    ///
    /// All keys are looked up before anything is evaluated, so an unknown key
    /// fails the whole call.
    pub fn evaluate_many<I, K>(
        &self,
        snapshot: &EvaluationSnapshot,
        keys: I,
    ) -> Result<Vec<(PermissionBit, EffectiveDecision)>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let bits = keys
            .into_iter()
            .map(|k| self.lookup(k.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let tiers = self.tiers(snapshot);
        Ok(bits
            .into_iter()
            .map(|bit| (bit, self.decide(snapshot, &tiers, bit)))
            .collect())
    }

    /// Every capability the snapshot's user is allowed.
    ///
    /// Only registered, non-retired bits are reported.
    pub fn effective_permissions(&self, snapshot: &EvaluationSnapshot) -> Bitfield {
        self.tiers(snapshot)
            .effective()
            .intersection(&self.registry.all_active())
    }

    fn tiers(&self, snapshot: &EvaluationSnapshot) -> TierSet {
        let (tiers, stats) = snapshot.tiers_with_stats();
        if stats.duplicate_user_scopes > 0 {
            warn!(
                user = %snapshot.user_id,
                scopes = stats.duplicate_user_scopes,
                "multiple overrides for one user in a scope; merged"
            );
        }
        if stats.foreign_rows > 0 {
            debug!(
                user = %snapshot.user_id,
                rows = stats.foreign_rows,
                "ignored override rows from other scopes"
            );
        }
        tiers
    }

    fn decide(
        &self,
        snapshot: &EvaluationSnapshot,
        tiers: &TierSet,
        bit: PermissionBit,
    ) -> EffectiveDecision {
        let decision = tiers.decide(bit);
        if self.config.trace_decisions {
            let key = self
                .registry
                .reverse_lookup(bit)
                .map(|k| k.as_str())
                .unwrap_or("<unregistered>");
            debug!(
                user = %snapshot.user_id,
                scope = %snapshot.target.as_ref().map_or(snapshot.scope_root, |t| t.scope_id),
                key,
                %bit,
                allowed = decision.allowed,
                level = %decision.deciding_level,
                "permission decision"
            );
        }
        decision
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────────

    /// The acting member for a snapshot: rank from their roles, owner
    /// capability from their effective permissions.
    pub fn member_actor(&self, snapshot: &EvaluationSnapshot) -> MemberActor {
        MemberActor::from_roles(snapshot.user_id, &snapshot.roles)
            .with_permissions(self.effective_permissions(snapshot))
    }

    /// Guard a role assignment, edit or deletion.
    pub fn authorize_role_mutation(
        &self,
        actor: &Actor,
        target: &Role,
        mutation: RoleMutation,
    ) -> Result<()> {
        authorize_role_mutation(actor, target, mutation, self.owner_bit).map_err(|e| {
            warn!(role = %target.id, ?mutation, error = %e, "role mutation rejected");
            EngineError::from(e)
        })
    }

    /// The default role set for a new scope root.
    pub fn default_roles(&self, first_id: RoleId) -> Result<Vec<Role>> {
        let roles = default_roles(&self.registry, first_id)?;
        info!(count = roles.len(), first = %first_id, "composed default roles");
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitgate_core::catalog::{ARTICLE_READ, ARTICLE_UPDATE, ROLE_MANAGE};
    use bitgate_core::{ScopeId, ScopeOverride, UserId};
    use bitgate_policy::DecisionLevel;
    use proptest::prelude::*;

    const ROOT: ScopeId = ScopeId(1);
    const ME: UserId = UserId(42);

    fn engine() -> Engine {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        Engine::with_builtin_catalog().unwrap()
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_unknown_owner_permission_rejected() {
        let config = EngineConfig {
            owner_permission: "org.owner".into(),
            ..EngineConfig::default()
        };
        let result = Engine::new(Arc::new(builtin_registry()), config);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_evaluate_unknown_key_propagates() {
        let engine = engine();
        let snap = EvaluationSnapshot::new(ME, ROOT, 0);

        let err = engine.evaluate(&snap, "article.teleport").unwrap_err();
        assert!(err.is_unknown_permission());
        assert!(engine.evaluate(&snap, "not a key").is_err());
        assert!(engine.has_permission(&Bitfield::zero(), "article.teleport").is_err());
    }

    #[test]
    fn test_evaluate_with_default_roles() {
        let engine = engine();
        let roles = engine.default_roles(RoleId(1)).unwrap();
        let member = roles[1].clone();
        let snap = EvaluationSnapshot::new(ME, ROOT, 0).with_roles(vec![member]);

        let read = engine.evaluate(&snap, ARTICLE_READ).unwrap();
        assert_eq!(read, EffectiveDecision::allowed_by(DecisionLevel::Role));

        let update = engine.evaluate(&snap, ARTICLE_UPDATE).unwrap();
        assert_eq!(update, EffectiveDecision::default_deny());
    }

    #[test]
    fn test_evaluate_many_and_effective() {
        let engine = engine();
        let roles = engine.default_roles(RoleId(1)).unwrap();
        let moderator = roles[2].clone();
        let snap = EvaluationSnapshot::new(ME, ROOT, 0)
            .with_roles(vec![moderator.clone()])
            .with_root_overrides(vec![ScopeOverride::for_user(ROOT, ME)
                .allowing(engine.registry().bitfield_of([ROLE_MANAGE]).unwrap())]);

        let results = engine
            .evaluate_many(&snap, [ARTICLE_UPDATE, ROLE_MANAGE, "article.delete"])
            .unwrap();
        let allowed: Vec<bool> = results.iter().map(|(_, d)| d.allowed).collect();
        assert_eq!(allowed, [true, true, false]);
        assert_eq!(results[1].1.deciding_level, DecisionLevel::User);

        let effective = engine.effective_permissions(&snap);
        assert!(moderator.base_permissions.is_subset(&effective));
        assert!(engine.has_permission(&effective, ROLE_MANAGE).unwrap());
        assert!(engine.describe(&effective).contains(&ROLE_MANAGE.to_string()));

        assert!(engine.evaluate_many(&snap, [ARTICLE_UPDATE, "bogus.key"]).is_err());
    }

    #[test]
    fn test_effective_excludes_unregistered_bits() {
        let engine = engine();
        let stray = Bitfield::zero().with_bit(PermissionBit(500));
        let snap = EvaluationSnapshot::new(ME, ROOT, 0)
            .with_roles(vec![Role::new(RoleId(1), "odd", 1, stray.clone())]);

        assert!(engine.evaluate_bit(&snap, PermissionBit(500)).allowed);
        assert!(engine.effective_permissions(&snap).is_empty());
    }

    #[test]
    fn test_role_mutation_through_engine() {
        let engine = engine();
        let roles = engine.default_roles(RoleId(1)).unwrap();
        let (moderator, admin, owner) = (roles[2].clone(), roles[3].clone(), roles[4].clone());

        let admin_snap = EvaluationSnapshot::new(ME, ROOT, 0).with_roles(vec![admin.clone()]);
        let admin_actor = Actor::Member(engine.member_actor(&admin_snap));
        assert!(engine
            .authorize_role_mutation(&admin_actor, &moderator, RoleMutation::Assign)
            .is_ok());
        let err = engine
            .authorize_role_mutation(&admin_actor, &owner, RoleMutation::Assign)
            .unwrap_err();
        assert!(err.is_insufficient_hierarchy());

        let owner_snap = EvaluationSnapshot::new(ME, ROOT, 0).with_roles(vec![owner.clone()]);
        let owner_actor = Actor::Member(engine.member_actor(&owner_snap));
        assert!(engine
            .authorize_role_mutation(&owner_actor, &owner, RoleMutation::Edit { new_position: None })
            .is_ok());
    }

    #[test]
    fn test_expired_owner_grant_gives_no_bypass() {
        let engine = engine();
        let roles = engine.default_roles(RoleId(1)).unwrap();
        let owner = roles[4].clone();
        let snap = EvaluationSnapshot::new(ME, ROOT, 0)
            .with_roles(vec![roles[3].clone()])
            .with_target(
                ScopeId(2),
                vec![ScopeOverride::for_user(ScopeId(2), ME)
                    .allowing(Bitfield::zero().with_bit(engine.owner_bit()))
                    .expiring_at(1)],
            )
            .at(10);

        let actor = Actor::Member(engine.member_actor(&snap));
        assert!(engine
            .authorize_role_mutation(&actor, &owner, RoleMutation::Assign)
            .is_err());
    }

    proptest! {
        #[test]
        fn test_effective_agrees_with_evaluate_bit(
            role_bits in prop::collection::vec(0u32..20, 0..10),
            denied in prop::collection::vec(0u32..20, 0..4),
            bit in 0u32..20,
        ) {
            let engine = engine();
            let role = Role::new(
                RoleId(1),
                "r",
                1,
                role_bits.into_iter().map(PermissionBit).collect(),
            );
            let snap = EvaluationSnapshot::new(ME, ROOT, 0)
                .with_roles(vec![role])
                .with_target(
                    ScopeId(2),
                    vec![ScopeOverride::for_user(ScopeId(2), ME)
                        .denying(denied.into_iter().map(PermissionBit).collect())],
                );

            let bit = PermissionBit(bit);
            let registered = engine.reverse_lookup(bit).is_some();
            let decision = engine.evaluate_bit(&snap, bit);
            prop_assert_eq!(
                engine.effective_permissions(&snap).is_set(bit),
                decision.allowed && registered
            );
        }
    }
}
