//! # Bitgate Policy
//!
//! Turns roles and scope overrides into capability decisions.
//!
//! ## Overview
//!
//! Evaluation is a pure function of an [`EvaluationSnapshot`]:
//!
//! 1. **Resolve** the override rows of each scope: drop rows expired at the
//!    snapshot's `now`, split role rows from the user's rows.
//! 2. **Aggregate** the user's roles with the role rows into one
//!    allow/deny pair.
//! 3. **Evaluate** the scope, role and user pairs as a waterfall: the first
//!    tier with an opinion on the bit decides, otherwise deny.
//!
//! Nothing here performs I/O, holds a cache, or mutates shared state, so
//! evaluations can run concurrently on any thread.
//!
//! Role mutations are guarded separately by
//! [`authorize_role_mutation`], which enforces strict seniority.
//!
//! ## Usage
//!
//! ```rust
//! use bitgate_core::{builtin_registry, RoleId, ScopeId, UserId};
//! use bitgate_policy::{default_roles, EvaluationSnapshot, DecisionLevel};
//!
//! let registry = builtin_registry();
//! let roles = default_roles(&registry, RoleId(1)).unwrap();
//! let member = roles[1].clone();
//!
//! let snapshot = EvaluationSnapshot::new(UserId(7), ScopeId(1), 0).with_roles(vec![member]);
//! let bit = registry.lookup("article.read").unwrap();
//!
//! let decision = snapshot.tiers().decide(bit);
//! assert!(decision.allowed);
//! assert_eq!(decision.deciding_level, DecisionLevel::Role);
//! ```

pub mod aggregate;
pub mod defaults;
pub mod error;
pub mod evaluate;
pub mod hierarchy;
pub mod resolve;
pub mod snapshot;
pub mod tier;

pub use aggregate::{aggregate_roles, highest_position, role_override_pair};
pub use defaults::{compose, default_roles, DefaultTier};
pub use error::{PolicyError, Result};
pub use evaluate::{effective_permissions, evaluate, DecisionLevel, EffectiveDecision, TierSet};
pub use hierarchy::{authorize_role_mutation, Actor, MemberActor, RoleMutation};
pub use resolve::{active_rows, resolve_scope, ResolvedScope};
pub use snapshot::{EvaluationSnapshot, ResolutionStats, TargetScope};
pub use tier::TierPair;
