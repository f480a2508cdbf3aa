//! # Bitgate Core
//!
//! Pure primitives for Bitgate: permission bitfields, permission keys, the
//! key registry, and the role/override data model.
//!
//! This crate contains no I/O beyond reading a registry manifest, no logging
//! and no shared mutable state.
//!
//! ## Key Types
//!
//! - [`Bitfield`] - Growable set of capability bits
//! - [`PermissionBit`] - Index of one capability
//! - [`PermissionKey`] - Human-readable `component.action` name
//! - [`PermissionRegistry`] - Append-only `key <-> bit` mapping
//! - [`Role`] and [`ScopeOverride`] - Evaluation inputs
//!
//! ## Bit status
//!
//! Every precedence decision downstream is built on [`status`]: for one bit,
//! deny is checked before allow, so a bit present on both sides is a deny.

pub mod bitfield;
pub mod catalog;
pub mod error;
pub mod key;
pub mod overrides;
pub mod registry;
pub mod role;
pub mod types;

pub use bitfield::{status, BitStatus, Bitfield, PermissionBit, MAX_BIT_INDEX, MAX_DECIMAL_DIGITS};
pub use catalog::builtin_registry;
pub use error::{CoreError, Result};
pub use key::{KeyParts, PermissionKey};
pub use overrides::{ScopeOverride, Subject, SubjectType};
pub use registry::{
    PermissionDefinition, PermissionEntry, PermissionRegistry, RegistryBuilder, RegistryManifest,
};
pub use role::Role;
pub use types::{RoleId, ScopeId, UserId};
