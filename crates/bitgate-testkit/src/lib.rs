//! # Bitgate Testkit
//!
//! Testing utilities for Bitgate.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Scenario vectors**: Named snapshots with the decision every evaluator must produce
//! - **Generators**: Proptest strategies for bitfields, roles, overrides and snapshots
//! - **Fixtures**: An engine over the built-in catalog plus key-based helpers
//!
//! ## Scenario Vectors
//!
//! ```rust
//! use bitgate_testkit::fixtures::TestFixture;
//! use bitgate_testkit::vectors::verify_all_vectors;
//!
//! let fixture = TestFixture::new();
//! for (name, matches, actual) in verify_all_vectors(&fixture.engine, &fixture) {
//!     assert!(matches, "{name}: {actual:?}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use bitgate_testkit::generators::{permission_bit, snapshot, SnapshotParams, MAX_BIT};
//!
//! proptest! {
//!     #[test]
//!     fn decisions_are_deterministic(
//!         snap in snapshot(SnapshotParams::default()),
//!         bit in permission_bit(MAX_BIT),
//!     ) {
//!         prop_assert_eq!(snap.tiers().decide(bit), snap.tiers().decide(bit));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use bitgate_testkit::fixtures::{TestFixture, ROOT_SCOPE};
//! use bitgate_core::RoleId;
//!
//! let fixture = TestFixture::new();
//! let row = fixture.role_override(ROOT_SCOPE, RoleId(3), &[], &["article.delete"]);
//! assert!(!row.deny.is_empty());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::TestFixture;
pub use generators::{snapshot, SnapshotParams};
pub use vectors::{all_vectors, verify_all_vectors, vectors_json, ScenarioVector};
