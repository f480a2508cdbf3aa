//! Human-readable permission keys of the form `component.action`.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

static KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_]+\.[a-z_]+$").expect("static key pattern compiles"));

static PART_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_]+$").expect("static part pattern compiles"));

/// A syntactically valid permission key.
///
/// Validity here is purely about shape. Whether the key names a real
/// capability is decided by the [`PermissionRegistry`](crate::PermissionRegistry).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey(String);

/// The two halves of a permission key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyParts {
    pub component: String,
    pub action: String,
}

impl PermissionKey {
    /// Build a key from its component and action.
    pub fn new(component: &str, action: &str) -> Result<Self> {
        if !PART_PATTERN.is_match(component) || !PART_PATTERN.is_match(action) {
            return Err(CoreError::InvalidPermissionKey(format!(
                "{component}.{action}"
            )));
        }
        Ok(Self(format!("{component}.{action}")))
    }

    /// Parse and validate a key string.
    pub fn parse(s: &str) -> Result<Self> {
        if !KEY_PATTERN.is_match(s) {
            return Err(CoreError::InvalidPermissionKey(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the dot.
    pub fn component(&self) -> &str {
        self.split().0
    }

    /// The part after the dot.
    pub fn action(&self) -> &str {
        self.split().1
    }

    /// Split into owned parts.
    pub fn parts(&self) -> KeyParts {
        let (component, action) = self.split();
        KeyParts {
            component: component.to_string(),
            action: action.to_string(),
        }
    }

    fn split(&self) -> (&str, &str) {
        // Validated on construction: exactly one dot.
        self.0.split_once('.').unwrap_or((self.0.as_str(), ""))
    }
}

impl fmt::Debug for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionKey({})", self.0)
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PermissionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for PermissionKey {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<PermissionKey> for String {
    fn from(key: PermissionKey) -> Self {
        key.0
    }
}
