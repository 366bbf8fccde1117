//! Archive payload builder.
//!
//! An archive is a plain concatenation of zstd data in one of two layouts:
//!
//! - [`BuildMode::SingleStream`]: every file is concatenated into one blob,
//!   each starting on a 16-byte boundary, and the blob is compressed as one
//!   frame. Offsets are positions in the *decompressed* blob. The game
//!   decompresses these archives whole when it loads them.
//! - [`BuildMode::ConcatenatedFrames`]: every file is its own frame, padded
//!   to 16 bytes. Offsets are physical positions in the archive file, so the
//!   game can seek to and decompress a single file on demand.

use crate::compression::{self, CompressionConfig};
use crate::error::{BuildError, Result};
use crate::index::LoadType;
use crate::pack::PackHeader;
use camino::Utf8Path;
use std::collections::HashSet;
use std::io::{BufWriter, Write};

/// Alignment of every file (SingleStream) or frame (ConcatenatedFrames).
pub const ARCHIVE_ALIGNMENT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildMode {
    SingleStream,
    ConcatenatedFrames,
}

impl BuildMode {
    pub fn for_load_type(load_type: LoadType) -> Self {
        if load_type.is_streamed() {
            Self::ConcatenatedFrames
        } else {
            Self::SingleStream
        }
    }

    /// Pick the mode used by the majority of `load_types`. Ties go to
    /// [`SingleStream`](Self::SingleStream).
    pub fn select(load_types: impl IntoIterator<Item = LoadType>) -> Self {
        let mut streamed = 0usize;
        let mut preloaded = 0usize;
        for load_type in load_types {
            match Self::for_load_type(load_type) {
                Self::ConcatenatedFrames => streamed += 1,
                Self::SingleStream => preloaded += 1,
            }
        }

        if streamed > preloaded {
            Self::ConcatenatedFrames
        } else {
            Self::SingleStream
        }
    }

    /// Load type to register an archive built in this mode under.
    pub fn load_type(self) -> LoadType {
        match self {
            Self::SingleStream => LoadType::PreloadDecompress,
            Self::ConcatenatedFrames => LoadType::Stream,
        }
    }
}

/// A file waiting to be packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInput {
    /// Logical path the file is registered under in the index.
    pub key: String,
    pub data: Vec<u8>,
    /// Load type the file would prefer; decides the build mode by majority.
    pub load_type: LoadType,
    pub pack_serialized_size: u32,
    pub pack_resource_size: u32,
}

impl ArchiveInput {
    /// A raw input. The whole payload counts as serialized data.
    pub fn new(key: impl Into<String>, data: Vec<u8>) -> Self {
        let pack_serialized_size = u32::try_from(data.len()).unwrap_or(u32::MAX);
        Self {
            key: key.into(),
            data,
            load_type: LoadType::PreloadDecompress,
            pack_serialized_size,
            pack_resource_size: 0,
        }
    }

    /// An input whose sizes come from its PACK header.
    pub fn from_pack_bytes(key: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let header = PackHeader::probe(&data)?;
        let mut input = Self::new(key, data);
        input.pack_serialized_size = header.serialized_size;
        input.pack_resource_size = header.resource_size;
        Ok(input)
    }

    pub fn with_load_type(mut self, load_type: LoadType) -> Self {
        self.load_type = load_type;
        self
    }
}

/// Where a packed file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntryInfo {
    pub key: String,
    /// Byte offset: in the decompressed blob (SingleStream) or in the archive
    /// file (ConcatenatedFrames).
    pub offset: u64,
    /// Unpadded frame size, `0` in SingleStream mode.
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub pack_serialized_size: u32,
    pub pack_resource_size: u32,
}

/// A finished archive held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltArchive {
    pub mode: BuildMode,
    pub data: Vec<u8>,
    pub entries: Vec<ArchiveEntryInfo>,
}

impl BuiltArchive {
    pub fn load_type(&self) -> LoadType {
        self.mode.load_type()
    }
}

/// Collects files and lays them out into an archive.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    inputs: Vec<ArchiveInput>,
    keys: HashSet<String>,
    compression: CompressionConfig,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn inputs(&self) -> &[ArchiveInput] {
        &self.inputs
    }

    /// Queue a file. Keys must be unique and non-empty; payloads must be
    /// non-empty and fit in 32 bits.
    pub fn add_file(&mut self, input: ArchiveInput) -> Result<()> {
        if input.key.is_empty() || input.data.is_empty() {
            return Err(BuildError::EmptyInput(input.key).into());
        }
        checked_u32("file size", input.data.len())?;
        if !self.keys.insert(input.key.clone()) {
            return Err(BuildError::DuplicateKey(input.key).into());
        }

        tracing::trace!("Queued '{}' ({} bytes)", input.key, input.data.len());
        self.inputs.push(input);
        Ok(())
    }

    /// Queue a PACK file, reading its sizes from the header.
    pub fn add_pack_file(&mut self, key: impl Into<String>, data: Vec<u8>) -> Result<()> {
        self.add_file(ArchiveInput::from_pack_bytes(key, data)?)
    }

    /// Read a PACK file from disk and queue it.
    pub fn add_pack_file_from_disk(
        &mut self,
        key: impl Into<String>,
        path: &Utf8Path,
    ) -> Result<()> {
        let data = std::fs::read(path)?;
        self.add_pack_file(key, data)
    }

    /// Build mode chosen by the majority load type of the queued files.
    pub fn mode(&self) -> BuildMode {
        BuildMode::select(self.inputs.iter().map(|input| input.load_type))
    }

    pub fn build(&self) -> Result<BuiltArchive> {
        self.build_with_mode(self.mode())
    }

    pub fn build_with_mode(&self, mode: BuildMode) -> Result<BuiltArchive> {
        let mut data = Vec::new();
        let entries = self.build_into(mode, &mut data)?;
        Ok(BuiltArchive {
            mode,
            data,
            entries,
        })
    }

    /// Build straight into a file at `path`, replacing it if it exists.
    pub fn write_to_file(&self, mode: BuildMode, path: &Utf8Path) -> Result<Vec<ArchiveEntryInfo>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = BufWriter::new(std::fs::File::create(path)?);
        let entries = self.build_into(mode, &mut file)?;
        file.flush()?;

        tracing::info!(
            "Wrote archive {} ({:?}, {} files)",
            path,
            mode,
            entries.len()
        );
        Ok(entries)
    }

    /// Lay out every queued file into `out` and report where each one went.
    pub fn build_into<W: Write>(
        &self,
        mode: BuildMode,
        out: &mut W,
    ) -> Result<Vec<ArchiveEntryInfo>> {
        match mode {
            BuildMode::SingleStream => self.build_single_stream(out),
            BuildMode::ConcatenatedFrames => self.build_concatenated_frames(out),
        }
    }

    fn build_single_stream<W: Write>(&self, out: &mut W) -> Result<Vec<ArchiveEntryInfo>> {
        let mut blob = Vec::new();
        let mut entries = Vec::with_capacity(self.inputs.len());

        for input in &self.inputs {
            blob.resize(align_up(blob.len(), ARCHIVE_ALIGNMENT), 0);
            entries.push(entry_info(input, blob.len() as u64, 0)?);
            blob.extend_from_slice(&input.data);
        }

        let compressed = compression::compress_with(&blob, self.compression)?;
        out.write_all(&compressed)?;

        tracing::debug!(
            "Built single-stream archive: {} files, {} -> {} bytes",
            entries.len(),
            blob.len(),
            compressed.len()
        );
        Ok(entries)
    }

    fn build_concatenated_frames<W: Write>(&self, out: &mut W) -> Result<Vec<ArchiveEntryInfo>> {
        let mut position = 0u64;
        let mut entries = Vec::with_capacity(self.inputs.len());

        for input in &self.inputs {
            let frame = compression::compress_with(&input.data, self.compression)?;
            let padded = align_up(frame.len(), ARCHIVE_ALIGNMENT);
            let compressed_size = checked_u32("compressed size", frame.len())?;

            entries.push(entry_info(input, position, compressed_size)?);
            out.write_all(&frame)?;
            out.write_all(&vec![0; padded - frame.len()])?;
            position += padded as u64;
        }

        tracing::debug!(
            "Built concatenated-frame archive: {} files, {} bytes",
            entries.len(),
            position
        );
        Ok(entries)
    }
}

fn entry_info(input: &ArchiveInput, offset: u64, compressed_size: u32) -> Result<ArchiveEntryInfo> {
    let uncompressed_size = checked_u32("file size", input.data.len())?;
    Ok(ArchiveEntryInfo {
        key: input.key.clone(),
        offset,
        compressed_size,
        uncompressed_size,
        pack_serialized_size: input.pack_serialized_size,
        pack_resource_size: input.pack_resource_size,
    })
}

fn checked_u32(what: &'static str, value: usize) -> Result<u32> {
    let too_large = BuildError::ValueTooLarge {
        what,
        value: value as u64,
    };
    u32::try_from(value).map_err(|_| too_large.into())
}

fn align_up(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}
