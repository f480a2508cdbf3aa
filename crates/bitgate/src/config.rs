//! Engine configuration.

use std::path::Path;

use bitgate_core::catalog::SCOPE_OWNER;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Configuration for the Engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Key of the capability that lifts the role hierarchy check.
    pub owner_permission: String,
    /// Emit a debug event for every decision.
    pub trace_decisions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            owner_permission: SCOPE_OWNER.to_string(),
            trace_decisions: true,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Read a JSON config file.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.owner_permission, "scope.owner");
        assert!(config.trace_decisions);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(r#"{"trace_decisions": false}"#).unwrap();
        assert_eq!(config.owner_permission, "scope.owner");
        assert!(!config.trace_decisions);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"owner_permission": "org.owner"}}"#).unwrap();

        let config = EngineConfig::from_json_path(file.path()).unwrap();
        assert_eq!(config.owner_permission, "org.owner");
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            EngineConfig::from_json_str("[1, 2"),
            Err(EngineError::Config(_))
        ));
    }
}
