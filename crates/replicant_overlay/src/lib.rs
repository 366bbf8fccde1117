//! Mod index merging for NieR Replicant ver.1.22.
//!
//! The game looks up every asset through `data/info.arc`. This crate builds a
//! patched copy of that index with each mod's files pointed at the mod's own
//! archive, so the game can be redirected to it without touching its own
//! files:
//!
//! - **Deterministic merge order**: mods are merged by ascending id, the last
//!   one wins a path conflict
//! - **Per-mod isolation**: a broken mod is logged and skipped
//! - **Build reuse**: an unchanged set of inputs keeps the previous output
//! - **Background patching**: [`PatchSession`] runs the merge on a worker
//!   thread and publishes its outcome once
//!
//! # Example
//!
//! ```no_run
//! use replicant_overlay::{IndexPatcher, ModDescriptor, PatchSession, DEFAULT_WAIT_TIMEOUT};
//! use camino::Utf8Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = Utf8Path::new("C:/Games/NieR Replicant ver.1.22474487139");
//!
//! let mut patcher = IndexPatcher::for_game_root(root);
//! patcher.set_mods(vec![
//!     ModDescriptor::from_mod_dir("better-textures", &root.join("mods/better-textures")),
//! ]);
//!
//! let session = PatchSession::start(patcher)?;
//! match session.redirect_target(DEFAULT_WAIT_TIMEOUT) {
//!     Some(path) => println!("Loading patched index from {}", path),
//!     None => println!("Using the game's own index"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod descriptor;
pub mod error;
pub mod patcher;
pub mod state;
pub mod status;
pub mod utils;

/// Directory the game resolves archive names against, relative to the game root.
pub const GAME_DATA_DIR: &str = "data";

/// The game's own index, relative to the game root.
pub const BASE_INDEX_PATH: &str = "data/info.arc";

/// Where the merged index is written, relative to the game root.
pub const PATCHED_INDEX_PATH: &str = "LunarTear/LunarTear.arc";

// Re-export main types
pub use descriptor::ModDescriptor;
pub use error::{Error, Result};
pub use patcher::{IndexMerger, IndexPatcher, LoadedMod, MergeStats, PatchReport, SkippedMod};
pub use replicant_archive::MOD_INDEX_FILE_NAME;
pub use state::PatchManifest;
pub use status::{
    PatchSession, PatchStatus, PatchStatusCell, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT,
};
