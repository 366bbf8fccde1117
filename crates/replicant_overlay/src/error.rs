//! Error types for patch operations.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. Per-mod failures carry the mod id so the merge can log
//! them and move on; everything else is fatal to the patch.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a patched index.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (reading the base index, writing the output, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The base index could not be decoded, or the merged index could not be
    /// encoded.
    #[error("Archive error: {0}")]
    Archive(#[from] replicant_archive::Error),

    /// Failed to parse or serialize the patch manifest.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A mod's index file is unreadable, not zstd, not BXON, or malformed.
    #[error("Invalid index for mod '{mod_id}': {source}")]
    ModIndex {
        mod_id: String,
        #[source]
        source: replicant_archive::Error,
    },

    /// A mod's index lists no archives.
    #[error("Index for mod '{mod_id}' lists no archives")]
    EmptyModIndex { mod_id: String },

    /// The archive a mod's index points at does not exist.
    #[error("Archive for mod '{mod_id}' not found: {path}")]
    MissingArchive { mod_id: String, path: Utf8PathBuf },

    /// A mod's offsets cannot be expressed with the offset scale of the archive
    /// slot it was merged into.
    #[error("Offsets of mod '{mod_id}' do not fit archive slot: {source}")]
    OffsetRescale {
        mod_id: String,
        #[source]
        source: replicant_archive::Error,
    },

    /// The merged index has no free archive slot for a mod's archive.
    #[error("No archive slot for mod '{mod_id}': {source}")]
    ArchiveSlot {
        mod_id: String,
        #[source]
        source: replicant_archive::Error,
    },

    /// Every supplied mod was skipped.
    #[error("No valid mods to merge")]
    NoValidMods,
}

impl Error {
    /// Whether this error only affects one mod and the merge can continue.
    pub fn is_per_mod(&self) -> bool {
        matches!(
            self,
            Error::ModIndex { .. }
                | Error::EmptyModIndex { .. }
                | Error::MissingArchive { .. }
                | Error::OffsetRescale { .. }
                | Error::ArchiveSlot { .. }
        )
    }
}
