//! # Bitgate
//!
//! Bitfield-based authorization: decide whether a user holds a capability
//! given their roles and any scoped allow/deny overrides.
//!
//! ## Overview
//!
//! - **Bitfields**: every capability is one bit; sets of capabilities are
//!   growable bitfields combined with OR.
//! - **Registry**: an append-only mapping between `component.action` keys and
//!   bits, built once and shared read-only.
//! - **Tiers**: scope overrides, then roles, then user overrides. The first
//!   tier with an opinion decides; within a tier deny beats allow; with no
//!   opinion anywhere the answer is no.
//! - **Hierarchy**: role mutations require strictly outranking the target.
//!
//! ## Usage
//!
//! ```rust
//! use bitgate::{Engine, EvaluationSnapshot, DecisionLevel};
//! use bitgate::core::{RoleId, ScopeId, ScopeOverride, UserId};
//!
//! let engine = Engine::with_builtin_catalog().unwrap();
//! let roles = engine.default_roles(RoleId(1)).unwrap();
//!
//! // A moderator, but this article has a scope override denying edits to moderators.
//! let moderator = roles[2].clone();
//! let deny_edit = engine.registry().bitfield_of(["article.update"]).unwrap();
//! let snapshot = EvaluationSnapshot::new(UserId(7), ScopeId(1), 1_700_000_000_000)
//!     .with_roles(vec![moderator.clone()])
//!     .with_target(
//!         ScopeId(99),
//!         vec![ScopeOverride::for_role(ScopeId(99), moderator.id).denying(deny_edit)],
//!     );
//!
//! let decision = engine.evaluate(&snapshot, "article.update").unwrap();
//! assert!(!decision.allowed);
//! assert_eq!(decision.deciding_level, DecisionLevel::Scope);
//! ```
//!
//! ## Re-exports
//!
//! - `bitgate::core` - Bitfields, keys, registry, data model
//! - `bitgate::policy` - Aggregation, resolution, evaluation, hierarchy

pub mod config;
pub mod engine;
pub mod error;

// Re-export component crates
pub use bitgate_core as core;
pub use bitgate_policy as policy;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, Result};

pub use bitgate_core::{
    BitStatus, Bitfield, PermissionBit, PermissionKey, PermissionRegistry, Role, RoleId, ScopeId,
    ScopeOverride, Subject, UserId,
};
pub use bitgate_policy::{
    Actor, DecisionLevel, EffectiveDecision, EvaluationSnapshot, MemberActor, RoleMutation,
};
