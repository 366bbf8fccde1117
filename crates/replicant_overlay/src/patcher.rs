//! Merging mod indices into the game's archive index.
//!
//! # Patch Algorithm
//!
//! 1. Read and decode the base index. Any failure here is fatal.
//! 2. Sort the descriptors by id and load each mod's index. A mod whose index
//!    cannot be decoded, lists no archives, or whose archive is missing is
//!    logged and skipped.
//! 3. Fingerprint the inputs. If the saved [`PatchManifest`] matches and the
//!    merged index is still on disk, stop.
//! 4. Register each mod's archive in the merged index under its path relative
//!    to the game data directory, then overwrite or append every file entry.
//!    Later mods win path conflicts.
//! 5. Re-sort by path hash, wrap with the base header, compress and write the
//!    output through a temp file. Persist the new manifest.

use crate::descriptor::ModDescriptor;
use crate::error::{Error, Result};
use crate::state::PatchManifest;
use crate::utils::{archive_name_relative_to, combine_fingerprints, file_stamp, write_replacing};
use crate::{BASE_INDEX_PATH, GAME_DATA_DIR, PATCHED_INDEX_PATH};
use camino::{Utf8Path, Utf8PathBuf};
use replicant_archive::index::{scale_offset, unscale_offset};
use replicant_archive::{hash_path, ArchiveIndex, CompressionConfig, FileEntry, LoadedIndex};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use xxhash_rust::xxh3::xxh3_64;

/// A mod whose index decoded and whose backing archive exists.
#[derive(Debug, Clone)]
pub struct LoadedMod {
    pub descriptor: ModDescriptor,
    pub archive_path: Utf8PathBuf,
    pub index: ArchiveIndex,
    /// xxHash3 of the compressed index file.
    pub index_hash: u64,
}

impl LoadedMod {
    /// Read, decompress and decode the index named by `descriptor`, then
    /// resolve its backing archive.
    pub fn load(descriptor: &ModDescriptor) -> Result<Self> {
        let mod_id = || descriptor.id.clone();

        let data = std::fs::read(&descriptor.index_path).map_err(|err| Error::ModIndex {
            mod_id: mod_id(),
            source: err.into(),
        })?;
        let loaded = ArchiveIndex::from_compressed_bxon(&data).map_err(|source| Error::ModIndex {
            mod_id: mod_id(),
            source,
        })?;
        let index = loaded.index;

        let Some(archive) = index.archives.first() else {
            return Err(Error::EmptyModIndex { mod_id: mod_id() });
        };
        if index.archives.len() > 1 {
            tracing::warn!(
                "Mod id={} index lists {} archives, only '{}' is used",
                descriptor.id,
                index.archives.len(),
                archive.filename
            );
        }

        let archive_path = match &descriptor.archive_path {
            Some(path) => path.clone(),
            None => descriptor.index_dir().join(&archive.filename),
        };
        if !archive_path.is_file() {
            return Err(Error::MissingArchive {
                mod_id: mod_id(),
                path: archive_path,
            });
        }

        tracing::debug!(
            "Loaded mod id={} files={} archive={}",
            descriptor.id,
            index.files.len(),
            archive_path
        );
        Ok(Self {
            descriptor: descriptor.clone(),
            archive_path,
            index,
            index_hash: xxh3_64(&data),
        })
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }
}

/// Entry counts for one merged mod.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub overwritten: usize,
    pub added: usize,
    /// Entries pointing at an archive slot the mod's index doesn't use.
    pub ignored: usize,
}

/// Applies mods to an index one at a time.
///
/// Keeps a path lookup so each entry is overwritten or appended without a
/// linear scan. The file table is unsorted until [`finish`](Self::finish).
pub struct IndexMerger<'a> {
    index: &'a mut ArchiveIndex,
    positions: HashMap<String, usize>,
}

impl<'a> IndexMerger<'a> {
    pub fn new(index: &'a mut ArchiveIndex) -> Self {
        let mut positions = HashMap::with_capacity(index.files.len());
        for (position, file) in index.files.iter().enumerate() {
            if !file.path.is_empty() {
                positions.entry(file.path.clone()).or_insert(position);
            }
        }
        Self { index, positions }
    }

    /// Merge `loaded` into the index, registering its archive as
    /// `archive_name`.
    ///
    /// The index is untouched if the mod's offsets don't fit the slot or no
    /// slot is free.
    pub fn merge(&mut self, loaded: &LoadedMod, archive_name: &str) -> Result<MergeStats> {
        let mod_id = loaded.id();
        let Some(source) = loaded.index.archives.first() else {
            return Err(Error::EmptyModIndex {
                mod_id: mod_id.to_string(),
            });
        };

        let existing_scale = self
            .index
            .archives
            .iter()
            .find(|a| a.filename == archive_name)
            .map(|a| a.offset_scale);
        let target_scale = existing_scale.unwrap_or(source.offset_scale);

        let mut stats = MergeStats::default();
        let mut planned = Vec::with_capacity(loaded.index.files.len());
        for entry in &loaded.index.files {
            if entry.archive_index != 0 {
                tracing::warn!(
                    "Mod id={} entry '{}' uses archive slot {}, ignoring",
                    mod_id,
                    entry.path,
                    entry.archive_index
                );
                stats.ignored += 1;
                continue;
            }
            let scaled_offset = if target_scale == source.offset_scale {
                entry.scaled_offset
            } else {
                unscale_offset(entry.scaled_offset, source.offset_scale)
                    .and_then(|bytes| scale_offset(bytes, target_scale))
                    .map_err(|source| Error::OffsetRescale {
                        mod_id: mod_id.to_string(),
                        source,
                    })?
            };
            planned.push((entry, scaled_offset));
        }

        let slot = self
            .index
            .add_archive(archive_name, source.load_type)
            .map_err(|source| Error::ArchiveSlot {
                mod_id: mod_id.to_string(),
                source,
            })?;
        if existing_scale.is_none() {
            if let Some(archive) = self.index.archive_mut(slot) {
                archive.offset_scale = source.offset_scale;
            }
        }

        for (entry, scaled_offset) in planned {
            match self.positions.get(&entry.path).copied() {
                Some(position) => {
                    let file = &mut self.index.files[position];
                    file.archive_index = slot;
                    file.scaled_offset = scaled_offset;
                    file.compressed_size = entry.compressed_size;
                    file.pack_serialized_size = entry.pack_serialized_size;
                    file.pack_resource_size = entry.pack_resource_size;
                    stats.overwritten += 1;
                    tracing::trace!("Overwrote '{}' -> slot {}", entry.path, slot);
                }
                None => {
                    let file = FileEntry {
                        path_hash: hash_path(&entry.path),
                        archive_index: slot,
                        scaled_offset,
                        ..entry.clone()
                    };
                    if !file.path.is_empty() {
                        self.positions
                            .insert(file.path.clone(), self.index.files.len());
                    }
                    self.index.files.push(file);
                    stats.added += 1;
                    tracing::trace!("Added '{}' -> slot {}", entry.path, slot);
                }
            }
        }

        Ok(stats)
    }

    /// Restore hash order.
    pub fn finish(self) {
        self.index.sort_files();
    }
}

/// A descriptor that was not merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMod {
    pub id: String,
    pub reason: String,
}

/// Summary returned after a patch run.
#[derive(Debug, Clone)]
pub struct PatchReport {
    pub output_path: Utf8PathBuf,
    /// Ids of merged mods, in merge order.
    pub merged_mods: Vec<String>,
    pub skipped_mods: Vec<SkippedMod>,
    pub files_overwritten: usize,
    pub files_added: usize,
    /// The merged index from a previous run was still valid and kept as is.
    pub reused: bool,
    pub build_time: Duration,
}

/// Produces the patched archive index.
///
/// ```no_run
/// use replicant_overlay::{IndexPatcher, ModDescriptor};
/// use camino::Utf8Path;
///
/// let root = Utf8Path::new("C:/Games/NieR Replicant");
/// let mut patcher = IndexPatcher::for_game_root(root);
/// patcher.set_mods(vec![ModDescriptor::from_mod_dir("hd-ui", &root.join("mods/hd-ui"))]);
/// let report = patcher.patch()?;
/// println!("merged {:?}", report.merged_mods);
/// # Ok::<(), replicant_overlay::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct IndexPatcher {
    base_index_path: Utf8PathBuf,
    output_path: Utf8PathBuf,
    data_dir: Utf8PathBuf,
    mods: Vec<ModDescriptor>,
    compression: CompressionConfig,
    reuse: bool,
}

impl IndexPatcher {
    /// Patch `base_index_path` into `output_path`. Archive names are resolved
    /// against the base index's directory.
    pub fn new(
        base_index_path: impl Into<Utf8PathBuf>,
        output_path: impl Into<Utf8PathBuf>,
    ) -> Self {
        let base_index_path = base_index_path.into();
        let data_dir = base_index_path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or(Utf8Path::new("."))
            .to_path_buf();

        Self {
            base_index_path,
            output_path: output_path.into(),
            data_dir,
            mods: Vec::new(),
            compression: CompressionConfig::default(),
            reuse: true,
        }
    }

    /// Patcher using the game's own layout under `root`.
    pub fn for_game_root(root: &Utf8Path) -> Self {
        Self::new(root.join(BASE_INDEX_PATH), root.join(PATCHED_INDEX_PATH))
            .with_data_dir(root.join(GAME_DATA_DIR))
    }

    /// Directory the game resolves archive names against.
    pub fn with_data_dir(mut self, data_dir: impl Into<Utf8PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    /// Whether a still-valid output from a previous run may be kept.
    pub fn with_reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }

    pub fn set_mods(&mut self, mods: Vec<ModDescriptor>) {
        self.mods = mods;
    }

    pub fn mods(&self) -> &[ModDescriptor] {
        &self.mods
    }

    pub fn base_index_path(&self) -> &Utf8Path {
        &self.base_index_path
    }

    pub fn output_path(&self) -> &Utf8Path {
        &self.output_path
    }

    /// Manifest written next to the output.
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.output_path.with_extension("json")
    }

    /// Run the merge. See the module docs for the algorithm.
    pub fn patch(&self) -> Result<PatchReport> {
        let start_time = Instant::now();
        tracing::info!("Patching archive index...");
        tracing::info!("Base index: {}", self.base_index_path);
        tracing::info!("Output: {}", self.output_path);
        tracing::info!("Mods: {}", self.mods.len());

        let base_data = std::fs::read(&self.base_index_path)?;
        let LoadedIndex {
            header,
            index: mut merged,
        } = ArchiveIndex::from_compressed_bxon(&base_data)?;
        tracing::info!(
            "Base index: archives={} files={}",
            merged.archives.len(),
            merged.files.len()
        );

        let mut descriptors = self.mods.clone();
        descriptors.sort_by(|a, b| a.id.cmp(&b.id));
        let requested: Vec<String> = descriptors.iter().map(|d| d.id.clone()).collect();

        let mut loaded = Vec::with_capacity(descriptors.len());
        let mut skipped_mods = Vec::new();
        for descriptor in &descriptors {
            match LoadedMod::load(descriptor) {
                Ok(loaded_mod) => loaded.push(loaded_mod),
                Err(err) => skipped_mods.push(skip(&descriptor.id, err)),
            }
        }

        let fingerprint = self.input_fingerprint(&base_data, &loaded);
        let manifest_path = self.manifest_path();
        if let Some(manifest) = self.reusable_manifest(&manifest_path, &requested, fingerprint) {
            tracing::info!(
                "Reusing patched index {} (inputs unchanged)",
                self.output_path
            );
            return Ok(PatchReport {
                output_path: self.output_path.clone(),
                merged_mods: manifest.merged_mods,
                skipped_mods,
                files_overwritten: 0,
                files_added: 0,
                reused: true,
                build_time: start_time.elapsed(),
            });
        }

        let mut merged_mods = Vec::with_capacity(loaded.len());
        let mut files_overwritten = 0;
        let mut files_added = 0;
        let mut merger = IndexMerger::new(&mut merged);
        for loaded_mod in &loaded {
            let archive_name = archive_name_relative_to(&loaded_mod.archive_path, &self.data_dir);
            match merger.merge(loaded_mod, &archive_name) {
                Ok(stats) => {
                    tracing::info!(
                        "Merged mod id={} archive='{}' overwritten={} added={}",
                        loaded_mod.id(),
                        archive_name,
                        stats.overwritten,
                        stats.added
                    );
                    files_overwritten += stats.overwritten;
                    files_added += stats.added;
                    merged_mods.push(loaded_mod.id().to_string());
                }
                Err(err) if err.is_per_mod() => skipped_mods.push(skip(loaded_mod.id(), err)),
                Err(err) => return Err(err),
            }
        }
        merger.finish();

        if merged_mods.is_empty() {
            tracing::error!("No valid mods to merge, {} skipped", skipped_mods.len());
            return Err(Error::NoValidMods);
        }

        let compressed =
            merged.to_compressed_bxon(header.version, header.project_id, self.compression)?;
        write_replacing(&self.output_path, &compressed)?;
        tracing::info!(
            "Wrote patched index {} files={} bytes={}",
            self.output_path,
            merged.files.len(),
            compressed.len()
        );

        let manifest = PatchManifest::new(requested, merged_mods.clone(), fingerprint);
        if let Err(err) = manifest.save(&manifest_path) {
            tracing::warn!("Failed to save patch manifest {}: {}", manifest_path, err);
        }

        let build_time = start_time.elapsed();
        tracing::info!(
            "Patch complete: merged={} skipped={} in {:.2}s",
            merged_mods.len(),
            skipped_mods.len(),
            build_time.as_secs_f64()
        );
        Ok(PatchReport {
            output_path: self.output_path.clone(),
            merged_mods,
            skipped_mods,
            files_overwritten,
            files_added,
            reused: false,
            build_time,
        })
    }

    fn reusable_manifest(
        &self,
        manifest_path: &Utf8Path,
        requested: &[String],
        fingerprint: u64,
    ) -> Option<PatchManifest> {
        if !self.reuse || !self.output_path.is_file() {
            return None;
        }
        match PatchManifest::load(manifest_path) {
            Ok(Some(manifest)) if manifest.matches(requested, fingerprint) => Some(manifest),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(
                    "Ignoring unreadable patch manifest {}: {}",
                    manifest_path,
                    err
                );
                None
            }
        }
    }

    fn input_fingerprint(&self, base_data: &[u8], loaded: &[LoadedMod]) -> u64 {
        let mut parts = vec![
            xxh3_64(base_data),
            xxh3_64(self.data_dir.as_str().as_bytes()),
            u64::from(self.compression.level as u32),
            u64::from(self.compression.window_log),
        ];
        for loaded_mod in loaded {
            parts.push(xxh3_64(loaded_mod.id().as_bytes()));
            parts.push(loaded_mod.index_hash);
            parts.push(xxh3_64(loaded_mod.archive_path.as_str().as_bytes()));
            parts.push(file_stamp(&loaded_mod.archive_path));
        }
        combine_fingerprints(&parts)
    }
}

fn skip(mod_id: &str, err: Error) -> SkippedMod {
    match &err {
        Error::MissingArchive { .. } => tracing::error!("Skipping mod id={}: {}", mod_id, err),
        _ => tracing::warn!("Skipping mod id={}: {}", mod_id, err),
    }
    SkippedMod {
        id: mod_id.to_string(),
        reason: err.to_string(),
    }
}
