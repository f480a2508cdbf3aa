//! Strong identifier types.
//!
//! Identifiers are newtypes so a role id can never be passed where a user id
//! is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Identifies a role within a scope root.
    RoleId,
    "role"
);

id_type!(
    /// Identifies a user.
    UserId,
    "user"
);

id_type!(
    /// Identifies a scope: a scope root (e.g. an organization) or a resource inside it.
    ScopeId,
    "scope"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_debug() {
        assert_eq!(RoleId(7).to_string(), "role:7");
        assert_eq!(format!("{:?}", UserId(3)), "UserId(3)");
        assert_eq!(ScopeId::new(9).get(), 9);
    }

    #[test]
    fn test_id_serde_transparent() {
        let json = serde_json::to_string(&RoleId(42)).unwrap();
        assert_eq!(json, "42");
        let back: RoleId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RoleId(42));
    }
}
