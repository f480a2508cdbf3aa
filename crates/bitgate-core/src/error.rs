//! Error types for Bitgate Core.

use thiserror::Error;

use crate::bitfield::PermissionBit;

/// Errors raised by bitfield construction and the key registry.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid bitfield: {0}")]
    InvalidBitfield(String),

    #[error("malformed permission key: {0:?}")]
    InvalidPermissionKey(String),

    #[error("unknown permission: {0}")]
    UnknownPermission(String),

    #[error("permission {key} ({bit}) has been retired")]
    RetiredPermission { key: String, bit: PermissionBit },

    #[error("duplicate permission key in registry: {0}")]
    DuplicateKey(String),

    #[error("permission bit {bit} already assigned to {existing}")]
    DuplicateBit { bit: PermissionBit, existing: String },

    #[error("permission bit {bit} is above the maximum index {max}")]
    BitOutOfRange { bit: PermissionBit, max: u32 },

    #[error("invalid registry manifest: {0}")]
    Manifest(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
