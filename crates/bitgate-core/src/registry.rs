//! The permission key registry.
//!
//! The registry is the only place where a [`PermissionKey`] becomes a
//! [`PermissionBit`]. It is built once (from code or a JSON manifest),
//! validated as a whole, and then only read. Growth happens by building a
//! new registry that extends the old one; existing bits never change
//! meaning, and retired bits stay reserved.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bitfield::{Bitfield, PermissionBit, MAX_BIT_INDEX};
use crate::error::{CoreError, Result};
use crate::key::{KeyParts, PermissionKey};

/// One registered capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionEntry {
    pub key: PermissionKey,
    pub bit: PermissionBit,
    /// Retired capabilities keep their bit reserved but can no longer be looked up.
    pub retired: bool,
    pub description: Option<String>,
}

/// Serialized registry definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryManifest {
    pub permissions: Vec<PermissionDefinition>,
}

/// One manifest row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    pub key: String,
    pub bit: u32,
    #[serde(default)]
    pub retired: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Collects definitions; all validation happens in [`RegistryBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    definitions: Vec<PermissionDefinition>,
    unknown_retirements: Vec<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active capability.
    pub fn register(mut self, key: &str, bit: u32) -> Self {
        self.definitions.push(PermissionDefinition {
            key: key.to_string(),
            bit,
            retired: false,
            description: None,
        });
        self
    }

    /// Register an active capability with a description.
    pub fn register_described(mut self, key: &str, bit: u32, description: &str) -> Self {
        self.definitions.push(PermissionDefinition {
            key: key.to_string(),
            bit,
            retired: false,
            description: Some(description.to_string()),
        });
        self
    }

    /// Reserve a bit for a retired capability.
    pub fn retire(mut self, key: &str, bit: u32) -> Self {
        self.definitions.push(PermissionDefinition {
            key: key.to_string(),
            bit,
            retired: true,
            description: None,
        });
        self
    }

    /// Mark an already-added definition as retired.
    ///
    /// Unknown keys are left for `build` to report as missing.
    pub fn mark_retired(mut self, key: &str) -> Self {
        let mut found = false;
        for def in self.definitions.iter_mut().filter(|d| d.key == key) {
            def.retired = true;
            found = true;
        }
        if !found {
            self.unknown_retirements.push(key.to_string());
        }
        self
    }

    /// Add a manifest row as-is.
    pub fn define(mut self, definition: PermissionDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Validate and freeze.
    pub fn build(self) -> Result<PermissionRegistry> {
        let mut entries: BTreeMap<PermissionBit, PermissionEntry> = BTreeMap::new();
        let mut by_key: HashMap<PermissionKey, PermissionBit> = HashMap::new();

        if let Some(key) = self.unknown_retirements.into_iter().next() {
            return Err(CoreError::UnknownPermission(key));
        }

        for def in self.definitions {
            let key = PermissionKey::parse(&def.key)?;
            let bit = PermissionBit(def.bit);

            if def.bit > MAX_BIT_INDEX {
                return Err(CoreError::BitOutOfRange {
                    bit,
                    max: MAX_BIT_INDEX,
                });
            }
            if by_key.contains_key(&key) {
                return Err(CoreError::DuplicateKey(def.key));
            }
            if let Some(existing) = entries.get(&bit) {
                return Err(CoreError::DuplicateBit {
                    bit,
                    existing: existing.key.to_string(),
                });
            }

            by_key.insert(key.clone(), bit);
            entries.insert(
                bit,
                PermissionEntry {
                    key,
                    bit,
                    retired: def.retired,
                    description: def.description,
                },
            );
        }

        Ok(PermissionRegistry { entries, by_key })
    }
}

/// Immutable bidirectional `key <-> bit` mapping.
#[derive(Debug, Clone, Default)]
pub struct PermissionRegistry {
    entries: BTreeMap<PermissionBit, PermissionEntry>,
    by_key: HashMap<PermissionKey, PermissionBit>,
}

impl PermissionRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Start a builder that already holds every entry of this registry.
    ///
    /// The only way to grow a registry: existing bits are carried over, so
    /// any reuse by a new definition fails at `build`.
    pub fn extend(&self) -> RegistryBuilder {
        self.entries
            .values()
            .fold(RegistryBuilder::new(), |builder, entry| {
                builder.define(PermissionDefinition {
                    key: entry.key.to_string(),
                    bit: entry.bit.0,
                    retired: entry.retired,
                    description: entry.description.clone(),
                })
            })
    }

    /// Build from a manifest.
    pub fn from_manifest(manifest: RegistryManifest) -> Result<Self> {
        manifest
            .permissions
            .into_iter()
            .fold(RegistryBuilder::new(), RegistryBuilder::define)
            .build()
    }

    /// Build from manifest JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let manifest: RegistryManifest =
            serde_json::from_str(json).map_err(|e| CoreError::Manifest(e.to_string()))?;
        Self::from_manifest(manifest)
    }

    /// Build from a manifest JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Manifest(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Export as a manifest, ordered by bit.
    pub fn to_manifest(&self) -> RegistryManifest {
        RegistryManifest {
            permissions: self
                .entries
                .values()
                .map(|e| PermissionDefinition {
                    key: e.key.to_string(),
                    bit: e.bit.0,
                    retired: e.retired,
                    description: e.description.clone(),
                })
                .collect(),
        }
    }

    /// Resolve a key to its bit.
    ///
    /// Malformed, unregistered and retired keys are all errors.
    pub fn lookup(&self, key: &str) -> Result<PermissionBit> {
        let parsed = PermissionKey::parse(key)?;
        let bit = *self
            .by_key
            .get(&parsed)
            .ok_or_else(|| CoreError::UnknownPermission(key.to_string()))?;
        match self.entries.get(&bit) {
            Some(entry) if entry.retired => Err(CoreError::RetiredPermission {
                key: key.to_string(),
                bit,
            }),
            Some(_) => Ok(bit),
            None => Err(CoreError::UnknownPermission(key.to_string())),
        }
    }

    /// Resolve a bit back to its key. Retired keys still resolve.
    pub fn reverse_lookup(&self, bit: PermissionBit) -> Option<&PermissionKey> {
        self.entries.get(&bit).map(|e| &e.key)
    }

    pub fn entry(&self, bit: PermissionBit) -> Option<&PermissionEntry> {
        self.entries.get(&bit)
    }

    /// Build a registered key from its parts.
    pub fn build_key(&self, component: &str, action: &str) -> Result<PermissionKey> {
        let key = PermissionKey::new(component, action)?;
        self.lookup(key.as_str())?;
        Ok(key)
    }

    /// Split a registered key into its parts.
    pub fn parse_key(&self, key: &str) -> Result<KeyParts> {
        self.lookup(key)?;
        Ok(PermissionKey::parse(key)?.parts())
    }

    /// Check one named capability against a bitfield.
    pub fn has_permission(&self, permissions: &Bitfield, key: &str) -> Result<bool> {
        Ok(permissions.is_set(self.lookup(key)?))
    }

    /// OR together the bits of several keys.
    pub fn bitfield_of<I, K>(&self, keys: I) -> Result<Bitfield>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .map(|k| self.lookup(k.as_ref()))
            .collect::<Result<Bitfield>>()
    }

    /// Keys for every registered bit in `permissions`, ascending by bit.
    ///
    /// Bits with no registry entry are skipped.
    pub fn keys_in(&self, permissions: &Bitfield) -> Vec<&PermissionKey> {
        permissions
            .iter()
            .filter_map(|bit| self.reverse_lookup(bit))
            .collect()
    }

    /// Bits of every active (non-retired) capability.
    pub fn all_active(&self) -> Bitfield {
        self.entries
            .values()
            .filter(|e| !e.retired)
            .map(|e| e.bit)
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lookup(key).is_ok()
    }

    /// All entries, ascending by bit.
    pub fn iter(&self) -> impl Iterator<Item = &PermissionEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> PermissionRegistry {
        PermissionRegistry::builder()
            .register("article.read", 0)
            .register("article.update", 1)
            .retire("article.legacy_export", 2)
            .register("comment.create", 3)
            .build()
            .unwrap()
    }

    #[test]
    fn test_lookup_and_reverse() {
        let reg = sample();
        assert_eq!(reg.lookup("article.update").unwrap(), PermissionBit(1));
        assert_eq!(
            reg.reverse_lookup(PermissionBit(3)).map(|k| k.as_str()),
            Some("comment.create")
        );
        assert!(reg.reverse_lookup(PermissionBit(99)).is_none());
    }

    #[test]
    fn test_unknown_and_malformed_keys_fail() {
        let reg = sample();
        assert!(matches!(
            reg.lookup("article.delete"),
            Err(CoreError::UnknownPermission(_))
        ));
        assert!(matches!(
            reg.lookup("ARTICLE"),
            Err(CoreError::InvalidPermissionKey(_))
        ));
        assert!(reg.has_permission(&Bitfield::zero(), "nope.nope").is_err());
    }

    #[test]
    fn test_retired_bit_reserved_and_not_looked_up() {
        let reg = sample();
        assert!(matches!(
            reg.lookup("article.legacy_export"),
            Err(CoreError::RetiredPermission { .. })
        ));
        assert_eq!(
            reg.reverse_lookup(PermissionBit(2)).map(|k| k.as_str()),
            Some("article.legacy_export")
        );

        let reuse = reg.extend().register("article.archive", 2).build();
        assert!(matches!(reuse, Err(CoreError::DuplicateBit { .. })));
        assert!(!reg.all_active().is_set(PermissionBit(2)));
    }

    #[test]
    fn test_mark_retired() {
        let reg = sample()
            .extend()
            .mark_retired("comment.create")
            .build()
            .unwrap();
        assert!(matches!(
            reg.lookup("comment.create"),
            Err(CoreError::RetiredPermission { .. })
        ));

        let missing = sample().extend().mark_retired("comment.delete").build();
        assert!(matches!(missing, Err(CoreError::UnknownPermission(_))));
    }

    #[test]
    fn test_duplicates_rejected_at_build() {
        let dup_key = PermissionRegistry::builder()
            .register("article.read", 0)
            .register("article.read", 1)
            .build();
        assert!(matches!(dup_key, Err(CoreError::DuplicateKey(_))));

        let dup_bit = PermissionRegistry::builder()
            .register("article.read", 0)
            .register("article.update", 0)
            .build();
        assert!(matches!(dup_bit, Err(CoreError::DuplicateBit { .. })));

        let bad_key = PermissionRegistry::builder()
            .register("Article.Read", 0)
            .build();
        assert!(matches!(bad_key, Err(CoreError::InvalidPermissionKey(_))));
    }

    #[test]
    fn test_extend_keeps_existing_bits() {
        let grown = sample()
            .extend()
            .register("comment.delete", 4)
            .build()
            .unwrap();
        assert_eq!(grown.lookup("article.read").unwrap(), PermissionBit(0));
        assert_eq!(grown.lookup("comment.delete").unwrap(), PermissionBit(4));
        assert_eq!(grown.len(), 5);
    }

    #[test]
    fn test_build_and_parse_key_roundtrip() {
        let reg = sample();
        let key = reg.build_key("article", "update").unwrap();
        let parts = reg.parse_key(key.as_str()).unwrap();
        assert_eq!(parts.component, "article");
        assert_eq!(parts.action, "update");

        assert!(reg.build_key("article", "delete").is_err());
        assert!(reg.parse_key("article.delete").is_err());
        assert!(reg.build_key("Article", "update").is_err());
        assert!(reg.parse_key("article").is_err());
    }

    #[test]
    fn test_bitfield_of_and_keys_in() {
        let reg = sample();
        let bf = reg.bitfield_of(["article.read", "comment.create"]).unwrap();
        assert!(reg.has_permission(&bf, "article.read").unwrap());
        assert!(!reg.has_permission(&bf, "article.update").unwrap());

        let with_stray = bf.with_bit(PermissionBit(50));
        let keys: Vec<&str> = reg.keys_in(&with_stray).iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["article.read", "comment.create"]);

        assert!(reg.bitfield_of(["article.read", "bogus.key"]).is_err());
    }

    #[test]
    fn test_manifest_json_roundtrip_from_file() {
        let reg = sample();
        let json = serde_json::to_string_pretty(&reg.to_manifest()).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = PermissionRegistry::from_json_path(file.path()).unwrap();
        assert_eq!(loaded.to_manifest(), reg.to_manifest());
    }

    #[test]
    fn test_manifest_defaults_and_errors() {
        let reg = PermissionRegistry::from_json_str(
            r#"{"permissions":[{"key":"member.invite","bit":5}]}"#,
        )
        .unwrap();
        assert_eq!(reg.lookup("member.invite").unwrap(), PermissionBit(5));

        assert!(matches!(
            PermissionRegistry::from_json_str("{not json"),
            Err(CoreError::Manifest(_))
        ));
        assert!(matches!(
            PermissionRegistry::from_json_path("/definitely/not/here.json"),
            Err(CoreError::Manifest(_))
        ));
    }

    #[test]
    fn test_bits_above_codec_limit_rejected() {
        let at_limit = PermissionRegistry::builder()
            .register("audit.export", MAX_BIT_INDEX)
            .build()
            .unwrap();
        assert_eq!(at_limit.lookup("audit.export").unwrap(), PermissionBit(MAX_BIT_INDEX));

        let result = PermissionRegistry::from_json_str(
            r#"{"permissions":[{"key":"audit.export","bit":4000000000}]}"#,
        );
        assert!(matches!(
            result,
            Err(CoreError::BitOutOfRange { bit: PermissionBit(4_000_000_000), .. })
        ));
    }
}
