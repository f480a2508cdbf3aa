//! Error types for the Engine.

use bitgate_core::CoreError;
use bitgate_policy::PolicyError;
use thiserror::Error;

/// Errors that can occur during Engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Key, bitfield or registry error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Role hierarchy or default-role composition error.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Invalid engine configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// Whether this is a hierarchy violation from a role mutation check.
    pub fn is_insufficient_hierarchy(&self) -> bool {
        matches!(
            self,
            EngineError::Policy(PolicyError::InsufficientHierarchy { .. })
        )
    }

    /// Whether a permission key was not registered.
    pub fn is_unknown_permission(&self) -> bool {
        matches!(
            self,
            EngineError::Core(CoreError::UnknownPermission(_))
                | EngineError::Policy(PolicyError::Core(CoreError::UnknownPermission(_)))
        )
    }
}

/// Result type for Engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
