//! Patch manifest persistence for build reuse.
//!
//! After a successful patch, a [`PatchManifest`] is written next to the merged
//! index. On the next run the patcher compares it against the current inputs;
//! if the descriptor list and input fingerprint match and the merged index is
//! still on disk, the merge is skipped.
//!
//! The manifest records *what* was merged, not *how*. Any mismatch triggers a
//! full rebuild.

use crate::error::Result;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// Current manifest schema version.
pub const MANIFEST_VERSION: u32 = 1;

/// Snapshot of a patch run.
///
/// # JSON format
///
/// ```json
/// {
///   "version": 1,
///   "requestedMods": ["mod-a", "mod-b", "mod-c"],
///   "mergedMods": ["mod-a", "mod-c"],
///   "inputFingerprint": 1234567890
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchManifest {
    /// Schema version; manifests with another version never match.
    pub version: u32,

    /// Ids of every supplied descriptor, in merge order.
    pub requested_mods: Vec<String>,

    /// Ids of the mods that were actually merged, in merge order.
    pub merged_mods: Vec<String>,

    /// xxHash3 fingerprint of the base index, every mod index and every
    /// backing archive's size and modification time.
    pub input_fingerprint: u64,
}

impl Default for PatchManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            requested_mods: Vec::new(),
            merged_mods: Vec::new(),
            input_fingerprint: 0,
        }
    }
}

impl PatchManifest {
    pub fn new(
        requested_mods: Vec<String>,
        merged_mods: Vec<String>,
        input_fingerprint: u64,
    ) -> Self {
        Self {
            version: MANIFEST_VERSION,
            requested_mods,
            merged_mods,
            input_fingerprint,
        }
    }

    /// Load a manifest.
    ///
    /// Returns `Ok(None)` if the file doesn't exist and `Err` if it exists but
    /// cannot be parsed.
    pub fn load(path: &Utf8Path) -> Result<Option<Self>> {
        if !path.as_std_path().exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path.as_std_path())?;
        let manifest: Self = serde_json::from_str(&contents)?;
        Ok(Some(manifest))
    }

    /// Save the manifest, creating parent directories if needed.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_std_path(), contents)?;
        Ok(())
    }

    /// Whether this manifest describes a run over the same inputs.
    pub fn matches(&self, requested_mods: &[String], input_fingerprint: u64) -> bool {
        self.version == MANIFEST_VERSION
            && self.requested_mods == requested_mods
            && self.input_fingerprint == input_fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_manifest() {
        let manifest = PatchManifest::default();
        assert_eq!(manifest.version, MANIFEST_VERSION);
        assert!(manifest.requested_mods.is_empty());
        assert_eq!(manifest.input_fingerprint, 0);
    }

    #[test]
    fn test_matches() {
        let manifest = PatchManifest::new(ids(&["a", "b"]), ids(&["a"]), 0x1234);

        assert!(manifest.matches(&ids(&["a", "b"]), 0x1234));
        assert!(!manifest.matches(&ids(&["b", "a"]), 0x1234));
        assert!(!manifest.matches(&ids(&["a"]), 0x1234));
        assert!(!manifest.matches(&ids(&["a", "b"]), 0x5678));
    }

    #[test]
    fn test_other_version_never_matches() {
        let mut manifest = PatchManifest::new(ids(&["a"]), ids(&["a"]), 1);
        manifest.version = MANIFEST_VERSION + 1;
        assert!(!manifest.matches(&ids(&["a"]), 1));
    }

    #[test]
    fn test_save_and_load() {
        let temp = NamedTempFile::new().unwrap();
        let path = Utf8Path::from_path(temp.path()).unwrap();

        let manifest = PatchManifest::new(ids(&["a", "b"]), ids(&["b"]), 0xABCD);
        manifest.save(path).unwrap();

        let loaded = PatchManifest::load(path).unwrap().unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_load_nonexistent() {
        let temp = NamedTempFile::new().unwrap();
        let std_path = temp.path().with_extension("missing");
        let path = Utf8Path::from_path(&std_path).unwrap();

        assert!(PatchManifest::load(path).unwrap().is_none());
    }

    #[test]
    fn test_load_invalid_json() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"{ not json").unwrap();
        temp.flush().unwrap();

        let path = Utf8Path::from_path(temp.path()).unwrap();
        assert!(PatchManifest::load(path).is_err());
    }

    #[test]
    fn test_serialization_format() {
        let manifest = PatchManifest::new(ids(&["a"]), ids(&["a"]), 7);
        let json = serde_json::to_string(&manifest).unwrap();

        assert!(json.contains("\"version\":1"));
        assert!(json.contains("\"requestedMods\""));
        assert!(json.contains("\"mergedMods\""));
        assert!(json.contains("\"inputFingerprint\":7"));
    }
}
