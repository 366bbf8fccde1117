//! Mod descriptors supplied by whatever discovers mods on disk.

use camino::{Utf8Path, Utf8PathBuf};
use replicant_archive::MOD_INDEX_FILE_NAME;
use serde::{Deserialize, Serialize};

/// One mod to merge.
///
/// # JSON format
///
/// ```json
/// {
///   "id": "better-textures",
///   "indexPath": "mods/better-textures/info.arc"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModDescriptor {
    /// Merge order key. Mods are merged in ascending id order, so the mod with
    /// the greatest id wins a path conflict.
    pub id: String,

    /// Backing archive. When absent, the archive named by the mod's index is
    /// looked up next to the index file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<Utf8PathBuf>,

    /// The mod's compressed `tpArchiveFileParam` index.
    pub index_path: Utf8PathBuf,
}

impl ModDescriptor {
    pub fn new(id: impl Into<String>, index_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            id: id.into(),
            archive_path: None,
            index_path: index_path.into(),
        }
    }

    /// Descriptor for a mod folder holding an `info.arc` index.
    pub fn from_mod_dir(id: impl Into<String>, mod_dir: &Utf8Path) -> Self {
        Self::new(id, mod_dir.join(MOD_INDEX_FILE_NAME))
    }

    pub fn with_archive_path(mut self, archive_path: impl Into<Utf8PathBuf>) -> Self {
        self.archive_path = Some(archive_path.into());
        self
    }

    /// Directory containing the index file.
    pub fn index_dir(&self) -> &Utf8Path {
        self.index_path.parent().unwrap_or(Utf8Path::new(""))
    }
}
