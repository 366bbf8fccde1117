//! Mod package writer: one archive plus the `info.arc` index describing it.
//!
//! A mod folder produced here is exactly what the overlay's merge step
//! consumes: the index names a single archive, sitting next to it.

use crate::arc::{ArchiveBuilder, ArchiveInput, BuildMode};
use crate::compression::CompressionConfig;
use crate::error::Result;
use crate::index::ArchiveIndex;
use camino::{Utf8Path, Utf8PathBuf};

/// File name of a mod's compressed index inside its folder.
pub const MOD_INDEX_FILE_NAME: &str = "info.arc";

/// BXON version written into freshly built mod indices.
pub const DEFAULT_INDEX_VERSION: u32 = 0x2009_0422;

/// BXON project id written into freshly built mod indices ("TEST").
pub const DEFAULT_PROJECT_ID: u32 = 0x5445_5354;

/// Paths and index of a written mod package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModPackage {
    pub archive_path: Utf8PathBuf,
    pub index_path: Utf8PathBuf,
    pub index: ArchiveIndex,
}

/// Builder for a mod folder.
///
/// ```no_run
/// # use replicant_archive::package::ModPackageWriter;
/// # use replicant_archive::arc::ArchiveInput;
/// # use camino::Utf8Path;
/// let mut writer = ModPackageWriter::new("mymod.arc");
/// writer.add_file(ArchiveInput::new("core/unit.pack", std::fs::read("unit.pack")?))?;
/// let package = writer.write(Utf8Path::new("mods/mymod"))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct ModPackageWriter {
    archive_name: String,
    builder: ArchiveBuilder,
    mode: Option<BuildMode>,
    version: u32,
    project_id: u32,
    compression: CompressionConfig,
}

impl ModPackageWriter {
    pub fn new(archive_name: impl Into<String>) -> Self {
        Self {
            archive_name: archive_name.into(),
            builder: ArchiveBuilder::new(),
            mode: None,
            version: DEFAULT_INDEX_VERSION,
            project_id: DEFAULT_PROJECT_ID,
            compression: CompressionConfig::default(),
        }
    }

    /// Force a build mode instead of picking it by majority load type.
    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_header(mut self, version: u32, project_id: u32) -> Self {
        self.version = version;
        self.project_id = project_id;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.builder = self.builder.with_compression(compression);
        self.compression = compression;
        self
    }

    pub fn add_file(&mut self, input: ArchiveInput) -> Result<()> {
        self.builder.add_file(input)
    }

    pub fn add_pack_file(&mut self, key: impl Into<String>, data: Vec<u8>) -> Result<()> {
        self.builder.add_pack_file(key, data)
    }

    /// Write `<dir>/<archive_name>` and `<dir>/info.arc`.
    pub fn write(&self, dir: &Utf8Path) -> Result<ModPackage> {
        let mode = self.mode.unwrap_or_else(|| self.builder.mode());
        let archive_path = dir.join(&self.archive_name);
        let entries = self.builder.write_to_file(mode, &archive_path)?;

        let mut index = ArchiveIndex::new();
        index.register_archive(self.archive_name.as_str(), mode.load_type(), &entries)?;
        index.sort_files();

        let index_path = dir.join(MOD_INDEX_FILE_NAME);
        let compressed = index.to_compressed_bxon(self.version, self.project_id, self.compression)?;
        std::fs::write(&index_path, compressed)?;

        tracing::info!(
            "Wrote mod package {} ({} files, {:?})",
            dir,
            index.files.len(),
            mode
        );
        Ok(ModPackage {
            archive_path,
            index_path,
            index,
        })
    }
}
