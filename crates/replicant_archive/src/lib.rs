//! Codecs for NieR Replicant ver.1.22 archive data.
//!
//! The game finds every asset through a zstd-compressed BXON container of
//! type `tpArchiveFileParam` (`data/info.arc`). It maps the FNV-1 hash of a
//! logical path to a backing `.arc` file and an offset inside it. This crate
//! reads and writes all of those layers:
//!
//! - **[`io`]**: little-endian writer with relative-offset patching, a
//!   bounds-checked reader and a string pool
//! - **[`compression`]**: zstd frames the game's decoder accepts
//! - **[`bxon`]**: the typed container
//! - **[`arc`]**: laying out files into an archive in either build mode
//! - **[`index`]**: the archive index model and its binary encoding
//! - **[`pack`]**: PACK header probe for the sizes the index records
//! - **[`package`]**: writing a self-contained mod folder
//!
//! # Example
//!
//! ```no_run
//! use replicant_archive::{ArchiveIndex, CompressionConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("data/info.arc")?;
//! let mut loaded = ArchiveIndex::from_compressed_bxon(&data)?;
//!
//! if let Some(file) = loaded.index.find_file("core/core.pack") {
//!     println!("archive={} offset={:#x}", file.archive_index, file.scaled_offset);
//! }
//!
//! loaded.index.sort_files();
//! let patched = loaded.index.to_compressed_bxon(
//!     loaded.header.version,
//!     loaded.header.project_id,
//!     CompressionConfig::default(),
//! )?;
//! std::fs::write("patched.arc", patched)?;
//! # Ok(())
//! # }
//! ```

pub mod arc;
pub mod bxon;
pub mod compression;
pub mod error;
pub mod hash;
pub mod index;
pub mod io;
pub mod pack;
pub mod package;

pub use arc::{ArchiveBuilder, ArchiveEntryInfo, ArchiveInput, BuildMode, BuiltArchive};
pub use bxon::{Bxon, BxonHeader};
pub use compression::CompressionConfig;
pub use error::{BuildError, CompressionError, Error, ParseError, Result};
pub use hash::hash_path;
pub use index::{
    ArchiveEntry, ArchiveIndex, FileEntry, LoadType, LoadedIndex, ARCHIVE_PARAM_ASSET_TYPE,
    DEFAULT_OFFSET_SCALE,
};
pub use package::{ModPackage, ModPackageWriter, MOD_INDEX_FILE_NAME};
