//! The archive index (`tpArchiveFileParam`): which archive, and where in it,
//! holds each logical asset path.
//!
//! Payload layout, every offset relative to its own field:
//!
//! ```text
//! param header (16)   archive count, -> archive array, file count, -> file table
//! align 16
//! archive entries     12 bytes each: -> filename, offset scale, load type, pad[3]
//! align 16
//! file entries        28 bytes each: hash, -> path, scaled offset, compressed size,
//!                     pack serialized size, pack resource size, archive, flags, pad[2]
//! align 16
//! string pool         sorted, deduplicated, NUL-terminated
//! ```
//!
//! The game looks files up by binary search over `path_hash`, so the file table
//! must be sorted before it is persisted. Nothing here sorts implicitly: call
//! [`ArchiveIndex::sort_files`] once all edits are done.

use crate::arc::ArchiveEntryInfo;
use crate::bxon::{self, Bxon, BxonHeader};
use crate::compression::{self, CompressionConfig};
use crate::error::{BuildError, Result};
use crate::hash::hash_path;
use crate::io::{RawRecord, Reader, StringPool, Writer};
use binrw::binrw;

/// BXON asset type name of an archive index.
pub const ARCHIVE_PARAM_ASSET_TYPE: &str = "tpArchiveFileParam";

/// Offset scale given to archives registered with [`ArchiveIndex::add_archive`].
pub const DEFAULT_OFFSET_SCALE: u32 = 4;

const TABLE_ALIGNMENT: usize = 16;

/// How the game loads an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadType {
    /// Decompressed into memory in one piece when first opened.
    #[default]
    PreloadDecompress,
    /// Each file is decompressed on demand.
    Stream,
    StreamSpecial,
    /// A value with no known meaning, kept so it round-trips.
    Unknown(u8),
}

impl LoadType {
    /// Whether files in the archive are independently seekable frames.
    pub fn is_streamed(self) -> bool {
        matches!(self, Self::Stream | Self::StreamSpecial)
    }
}

impl From<u8> for LoadType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::PreloadDecompress,
            1 => Self::Stream,
            2 => Self::StreamSpecial,
            other => Self::Unknown(other),
        }
    }
}

impl From<LoadType> for u8 {
    fn from(value: LoadType) -> Self {
        match value {
            LoadType::PreloadDecompress => 0,
            LoadType::Stream => 1,
            LoadType::StreamSpecial => 2,
            LoadType::Unknown(other) => other,
        }
    }
}

/// One physical `.arc` file referenced by the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub filename: String,
    pub load_type: LoadType,
    /// Right-shift applied to byte offsets of files in this archive.
    ///
    /// Read and written verbatim; [`DEFAULT_OFFSET_SCALE`] for new archives.
    pub offset_scale: u32,
}

/// Location of one logical asset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileEntry {
    pub path_hash: u32,
    pub path: String,
    pub archive_index: u8,
    /// Byte offset shifted right by the owning archive's offset scale.
    pub scaled_offset: u32,
    /// Compressed frame size, `0` for files in a preloaded archive.
    pub compressed_size: u32,
    pub pack_serialized_size: u32,
    pub pack_resource_size: u32,
    pub flags: u8,
}

impl FileEntry {
    /// A blank entry for `path` with its hash filled in.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path_hash: hash_path(&path),
            path,
            ..Default::default()
        }
    }

    /// Byte offset of this file given its archive's offset scale.
    pub fn byte_offset(&self, offset_scale: u32) -> Result<u64> {
        unscale_offset(self.scaled_offset, offset_scale)
    }

    /// Store `byte_offset`, failing if it cannot be expressed with `offset_scale`.
    pub fn set_byte_offset(&mut self, byte_offset: u64, offset_scale: u32) -> Result<()> {
        self.scaled_offset = scale_offset(byte_offset, offset_scale)?;
        Ok(())
    }
}

/// Convert a byte offset to its stored form.
///
/// The offset must be a multiple of `1 << offset_scale` and the result must fit
/// in 32 bits.
pub fn scale_offset(byte_offset: u64, offset_scale: u32) -> Result<u32> {
    let unrepresentable = || BuildError::UnrepresentableOffset {
        offset: byte_offset,
        scale: offset_scale,
    };

    if offset_scale >= u64::BITS {
        return Err(unrepresentable().into());
    }
    let mask = (1u64 << offset_scale) - 1;
    if byte_offset & mask != 0 {
        return Err(unrepresentable().into());
    }
    u32::try_from(byte_offset >> offset_scale).map_err(|_| unrepresentable().into())
}

/// Convert a stored offset back to bytes.
pub fn unscale_offset(scaled_offset: u32, offset_scale: u32) -> Result<u64> {
    if offset_scale > u32::BITS {
        return Err(BuildError::UnrepresentableOffset {
            offset: u64::from(scaled_offset),
            scale: offset_scale,
        }
        .into());
    }
    Ok(u64::from(scaled_offset) << offset_scale)
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct RawParamHeader {
    archive_count: u32,
    archive_offset: u32,
    file_count: u32,
    file_offset: u32,
}

impl RawRecord for RawParamHeader {
    const SIZE: usize = 16;
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct RawArchiveEntry {
    filename_offset: u32,
    offset_scale: u32,
    #[brw(pad_after = 3)]
    load_type: u8,
}

impl RawRecord for RawArchiveEntry {
    const SIZE: usize = 12;
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct RawFileEntry {
    path_hash: u32,
    name_offset: u32,
    scaled_offset: u32,
    compressed_size: u32,
    pack_serialized_size: u32,
    pack_resource_size: u32,
    archive_index: u8,
    #[brw(pad_after = 2)]
    flags: u8,
}

impl RawRecord for RawFileEntry {
    const SIZE: usize = 28;
}

/// An index together with the container header it was loaded from.
///
/// The header's version and project id must be reused when the index is
/// written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedIndex {
    pub header: BxonHeader,
    pub index: ArchiveIndex,
}

/// In-memory archive index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveIndex {
    pub archives: Vec<ArchiveEntry>,
    pub files: Vec<FileEntry>,
}

impl ArchiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an archive by filename and return its slot.
    ///
    /// An existing entry with the same filename is returned unchanged. New
    /// entries get [`DEFAULT_OFFSET_SCALE`].
    pub fn add_archive(&mut self, filename: impl Into<String>, load_type: LoadType) -> Result<u8> {
        let filename = filename.into();
        if let Some(slot) = self.archives.iter().position(|a| a.filename == filename) {
            return slot_index(slot);
        }

        let slot = slot_index(self.archives.len())?;
        self.archives.push(ArchiveEntry {
            filename,
            load_type,
            offset_scale: DEFAULT_OFFSET_SCALE,
        });
        Ok(slot)
    }

    pub fn archive(&self, slot: u8) -> Option<&ArchiveEntry> {
        self.archives.get(usize::from(slot))
    }

    pub fn archive_mut(&mut self, slot: u8) -> Option<&mut ArchiveEntry> {
        self.archives.get_mut(usize::from(slot))
    }

    /// Linear lookup by exact path.
    pub fn find_file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn find_file_mut(&mut self, path: &str) -> Option<&mut FileEntry> {
        self.files.iter_mut().find(|f| f.path == path)
    }

    /// Restore ascending `path_hash` order. Entries with equal hashes keep their
    /// relative order.
    pub fn sort_files(&mut self) {
        self.files.sort_by_key(|f| f.path_hash);
    }

    pub fn is_sorted(&self) -> bool {
        self.files
            .windows(2)
            .all(|pair| pair[0].path_hash <= pair[1].path_hash)
    }

    /// Point the index at a freshly built archive.
    ///
    /// The archive is registered under `filename`; every entry in `entries`
    /// either overwrites the file with the same path or is appended. Offsets
    /// are scaled by the archive slot's offset scale. Nothing is modified if
    /// any offset is unrepresentable. The file table is left unsorted.
    pub fn register_archive(
        &mut self,
        filename: impl Into<String>,
        load_type: LoadType,
        entries: &[ArchiveEntryInfo],
    ) -> Result<u8> {
        let filename = filename.into();
        let offset_scale = self
            .archives
            .iter()
            .find(|a| a.filename == filename)
            .map_or(DEFAULT_OFFSET_SCALE, |a| a.offset_scale);

        let scaled = entries
            .iter()
            .map(|entry| scale_offset(entry.offset, offset_scale))
            .collect::<Result<Vec<_>>>()?;

        let slot = self.add_archive(filename, load_type)?;
        for (entry, scaled_offset) in entries.iter().zip(scaled) {
            let position = match self.files.iter().position(|f| f.path == entry.key) {
                Some(position) => position,
                None => {
                    self.files.push(FileEntry::new(entry.key.as_str()));
                    self.files.len() - 1
                }
            };
            let file = &mut self.files[position];
            file.archive_index = slot;
            file.scaled_offset = scaled_offset;
            file.compressed_size = entry.compressed_size;
            file.pack_serialized_size = entry.pack_serialized_size;
            file.pack_resource_size = entry.pack_resource_size;
        }

        Ok(slot)
    }

    /// Encode the index payload (without the BXON wrapper).
    pub fn serialize_payload(&self) -> Result<Vec<u8>> {
        if !self.is_sorted() {
            tracing::warn!(
                "Serializing archive index with unsorted file table ({} files)",
                self.files.len()
            );
        }

        let archive_count = count_u32("archive count", self.archives.len())?;
        let file_count = count_u32("file count", self.files.len())?;

        let mut writer = Writer::with_capacity(
            RawParamHeader::SIZE
                + self.archives.len() * RawArchiveEntry::SIZE
                + self.files.len() * RawFileEntry::SIZE
                + 3 * TABLE_ALIGNMENT,
        );
        let mut strings = StringPool::new();

        writer.write_u32(archive_count)?;
        let archive_table = writer.reserve_offset()?;
        writer.write_u32(file_count)?;
        let file_table = writer.reserve_offset()?;

        writer.align(TABLE_ALIGNMENT)?;
        writer.satisfy_offset_here(archive_table)?;
        for archive in &self.archives {
            let name = writer.reserve_offset()?;
            strings.add(&archive.filename, name);
            writer.write_u32(archive.offset_scale)?;
            writer.write_u8(archive.load_type.into())?;
            writer.write_bytes(&[0; 3])?;
        }

        writer.align(TABLE_ALIGNMENT)?;
        writer.satisfy_offset_here(file_table)?;
        for file in &self.files {
            writer.write_u32(file.path_hash)?;
            let name = writer.reserve_offset()?;
            strings.add(&file.path, name);
            writer.write_u32(file.scaled_offset)?;
            writer.write_u32(file.compressed_size)?;
            writer.write_u32(file.pack_serialized_size)?;
            writer.write_u32(file.pack_resource_size)?;
            writer.write_u8(file.archive_index)?;
            writer.write_u8(file.flags)?;
            writer.write_bytes(&[0; 2])?;
        }

        writer.align(TABLE_ALIGNMENT)?;
        strings.flush(&mut writer)?;

        Ok(writer.into_inner())
    }

    /// Encode the index wrapped in a `tpArchiveFileParam` container.
    pub fn serialize(&self, version: u32, project_id: u32) -> Result<Vec<u8>> {
        let payload = self.serialize_payload()?;
        bxon::build(ARCHIVE_PARAM_ASSET_TYPE, version, project_id, &payload)
    }

    /// Decode an index payload (without the BXON wrapper).
    pub fn deserialize(payload: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(payload);
        let header = reader.view::<RawParamHeader>()?;

        let mut archives = Vec::new();
        if header.archive_count > 0 {
            let start = reader.resolve(header.offset_at(4, header.archive_offset))?;
            let raw_entries = reader
                .at(start)
                .view_array::<RawArchiveEntry>(header.archive_count as usize)?;

            archives.reserve(raw_entries.len());
            for raw in raw_entries {
                archives.push(ArchiveEntry {
                    filename: reader.read_string_relative(raw.offset_at(0, raw.filename_offset))?,
                    load_type: LoadType::from(raw.load_type),
                    offset_scale: raw.offset_scale,
                });
            }
        }

        let mut files = Vec::new();
        if header.file_count > 0 {
            let start = reader.resolve(header.offset_at(12, header.file_offset))?;
            let raw_entries = reader
                .at(start)
                .view_array::<RawFileEntry>(header.file_count as usize)?;

            files.reserve(raw_entries.len());
            for raw in raw_entries {
                files.push(FileEntry {
                    path_hash: raw.path_hash,
                    path: reader.read_string_relative(raw.offset_at(4, raw.name_offset))?,
                    archive_index: raw.archive_index,
                    scaled_offset: raw.scaled_offset,
                    compressed_size: raw.compressed_size,
                    pack_serialized_size: raw.pack_serialized_size,
                    pack_resource_size: raw.pack_resource_size,
                    flags: raw.flags,
                });
            }
        }

        tracing::debug!(
            "Parsed archive index: {} archives, {} files",
            archives.len(),
            files.len()
        );
        Ok(Self { archives, files })
    }

    /// Decode an uncompressed `tpArchiveFileParam` container.
    pub fn from_bxon(buffer: &[u8]) -> Result<LoadedIndex> {
        let bxon = Bxon::parse_as(buffer, ARCHIVE_PARAM_ASSET_TYPE)?;
        let index = Self::deserialize(bxon.payload)?;
        Ok(LoadedIndex {
            header: bxon.header,
            index,
        })
    }

    /// Decode a zstd-compressed `tpArchiveFileParam` container, as stored on disk.
    pub fn from_compressed_bxon(data: &[u8]) -> Result<LoadedIndex> {
        let decompressed = compression::decompress_frame(data)?;
        Self::from_bxon(&decompressed)
    }

    /// Encode, wrap and compress the index, ready to be written to disk.
    pub fn to_compressed_bxon(
        &self,
        version: u32,
        project_id: u32,
        config: CompressionConfig,
    ) -> Result<Vec<u8>> {
        let container = self.serialize(version, project_id)?;
        compression::compress_with(&container, config)
    }
}

fn slot_index(slot: usize) -> Result<u8> {
    u8::try_from(slot).map_err(|_| BuildError::TooManyArchives(slot).into())
}

fn count_u32(what: &'static str, count: usize) -> Result<u32> {
    u32::try_from(count).map_err(|_| {
        BuildError::ValueTooLarge {
            what,
            value: count as u64,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ParseError};
    use binrw::BinWrite;
    use std::io::Cursor;

    fn sample_index() -> ArchiveIndex {
        let mut index = ArchiveIndex::new();
        index
            .add_archive("data000.arc", LoadType::PreloadDecompress)
            .unwrap();
        index.add_archive("data001.arc", LoadType::Stream).unwrap();

        let mut texture = FileEntry::new("core/texture.dat");
        texture.archive_index = 1;
        texture.scaled_offset = 0x40;
        texture.compressed_size = 512;
        texture.pack_serialized_size = 256;
        texture.pack_resource_size = 1024;
        texture.flags = 3;

        let mut table = FileEntry::new("core/table.dat");
        table.scaled_offset = 2;
        table.pack_serialized_size = 64;

        index.files = vec![texture, table];
        index.sort_files();
        index
    }

    fn encoded_len<T: for<'a> BinWrite<Args<'a> = ()>>(value: &T) -> usize {
        let mut cursor = Cursor::new(Vec::new());
        value.write_le(&mut cursor).unwrap();
        cursor.into_inner().len()
    }

    #[test]
    fn test_raw_record_sizes() {
        assert_eq!(
            encoded_len(&RawParamHeader::default()),
            RawParamHeader::SIZE
        );
        assert_eq!(
            encoded_len(&RawArchiveEntry::default()),
            RawArchiveEntry::SIZE
        );
        assert_eq!(encoded_len(&RawFileEntry::default()), RawFileEntry::SIZE);
    }

    #[test]
    fn test_load_type_conversion() {
        assert_eq!(LoadType::from(0), LoadType::PreloadDecompress);
        assert_eq!(LoadType::from(2), LoadType::StreamSpecial);
        assert_eq!(LoadType::from(9), LoadType::Unknown(9));
        assert_eq!(u8::from(LoadType::Unknown(9)), 9);
        assert!(LoadType::Stream.is_streamed());
        assert!(!LoadType::PreloadDecompress.is_streamed());
    }

    #[test]
    fn test_add_archive_dedups() {
        let mut index = ArchiveIndex::new();
        assert_eq!(index.add_archive("a.arc", LoadType::Stream).unwrap(), 0);
        assert_eq!(index.add_archive("b.arc", LoadType::Stream).unwrap(), 1);
        assert_eq!(index.add_archive("a.arc", LoadType::Stream).unwrap(), 0);
        assert_eq!(index.archives.len(), 2);
        assert_eq!(index.archives[1].offset_scale, DEFAULT_OFFSET_SCALE);
    }

    #[test]
    fn test_add_archive_existing_entry_unchanged() {
        let mut index = ArchiveIndex::new();
        index
            .add_archive("data000.arc", LoadType::PreloadDecompress)
            .unwrap();
        let before = index.clone();

        let slot = index.add_archive("data000.arc", LoadType::Stream).unwrap();
        assert_eq!(slot, 0);
        assert_eq!(index, before);
        assert_eq!(index.archives[0].load_type, LoadType::PreloadDecompress);
    }

    #[test]
    fn test_add_archive_slot_limit() {
        let mut index = ArchiveIndex::new();
        for i in 0..256 {
            index
                .add_archive(format!("{i}.arc"), LoadType::Stream)
                .unwrap();
        }
        assert!(matches!(
            index.add_archive("overflow.arc", LoadType::Stream),
            Err(Error::Build(BuildError::TooManyArchives(256)))
        ));
    }

    #[test]
    fn test_scale_offset() {
        assert_eq!(scale_offset(0x100, 4).unwrap(), 0x10);
        assert_eq!(unscale_offset(0x10, 4).unwrap(), 0x100);
        // Not a multiple of 16
        assert!(scale_offset(0x108, 4).is_err());
        // Too large for 32 bits even after scaling
        assert!(scale_offset(1 << 40, 4).is_err());
        assert_eq!(scale_offset(1 << 35, 4).unwrap(), 1 << 31);
    }

    #[test]
    fn test_payload_layout() {
        let mut index = ArchiveIndex::new();
        index.add_archive("x.arc", LoadType::Stream).unwrap();
        index.files.push(FileEntry::new("x.dat"));
        let payload = index.serialize_payload().unwrap();

        let word = |pos: usize| u32::from_le_bytes(payload[pos..pos + 4].try_into().unwrap());
        assert_eq!(word(0), 1);
        // Archive array at 16, file table at 32 (16 + 12 aligned up)
        assert_eq!(word(4), 16 - 4);
        assert_eq!(word(8), 1);
        assert_eq!(word(12), 32 - 12);
        // Strings start at 64 (32 + 28 aligned up), sorted: "x.arc" then "x.dat"
        assert_eq!(&payload[64..76], b"x.arc\0x.dat\0");
        assert_eq!(word(16), 64 - 16);
        assert_eq!(word(36), 70 - 36);
        assert_eq!(word(32), hash_path("x.dat"));
        assert_eq!(payload[24], 1);
    }

    #[test]
    fn test_round_trip() {
        let index = sample_index();
        let container = index.serialize(0x2009_0422, 0x5445_5354).unwrap();
        let loaded = ArchiveIndex::from_bxon(&container).unwrap();

        assert_eq!(loaded.header.version, 0x2009_0422);
        assert_eq!(loaded.header.project_id, 0x5445_5354);
        assert_eq!(loaded.header.asset_type, ARCHIVE_PARAM_ASSET_TYPE);
        assert_eq!(loaded.index, index);
    }

    #[test]
    fn test_round_trip_preserves_unknown_values() {
        let mut index = sample_index();
        index.archives[0].load_type = LoadType::Unknown(0xEE);
        index.archives[1].offset_scale = 0xDEAD_BEEF;

        let payload = index.serialize_payload().unwrap();
        let decoded = ArchiveIndex::deserialize(&payload).unwrap();
        assert_eq!(decoded.archives[0].load_type, LoadType::Unknown(0xEE));
        assert_eq!(decoded.archives[1].offset_scale, 0xDEAD_BEEF);

        // Byte-exact re-encoding
        assert_eq!(decoded.serialize_payload().unwrap(), payload);
    }

    #[test]
    fn test_empty_index_round_trip() {
        let index = ArchiveIndex::new();
        let payload = index.serialize_payload().unwrap();
        assert_eq!(ArchiveIndex::deserialize(&payload).unwrap(), index);
    }

    #[test]
    fn test_compressed_round_trip() {
        let index = sample_index();
        let compressed = index
            .to_compressed_bxon(1, 2, CompressionConfig::default())
            .unwrap();
        let loaded = ArchiveIndex::from_compressed_bxon(&compressed).unwrap();
        assert_eq!(loaded.index, index);
    }

    #[test]
    fn test_deserialize_truncated_file_table() {
        let payload = sample_index().serialize_payload().unwrap();
        // Claim far more files than the buffer holds
        let mut corrupted = payload.clone();
        corrupted[8..12].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(
            ArchiveIndex::deserialize(&corrupted),
            Err(Error::Parse(ParseError::OutOfBounds { .. }))
        ));
    }

    #[test]
    fn test_deserialize_bad_string_offset() {
        let mut payload = sample_index().serialize_payload().unwrap();
        // First archive's filename offset points past the end
        let len = payload.len() as u32;
        payload[16..20].copy_from_slice(&len.to_le_bytes());
        assert!(matches!(
            ArchiveIndex::deserialize(&payload),
            Err(Error::Parse(ParseError::InvalidOffset { field_pos: 16, .. }))
        ));
    }

    #[test]
    fn test_from_bxon_rejects_other_asset_types() {
        let container = bxon::build("tpGxTexHead", 1, 1, &[0; 16]).unwrap();
        assert!(matches!(
            ArchiveIndex::from_bxon(&container),
            Err(Error::Parse(ParseError::UnexpectedAssetType { .. }))
        ));
    }

    #[test]
    fn test_register_archive_overwrites_and_appends() {
        let mut index = sample_index();
        let before = index.files.len();

        let entries = vec![
            ArchiveEntryInfo {
                key: "core/table.dat".into(),
                offset: 0x20,
                compressed_size: 0,
                uncompressed_size: 40,
                pack_serialized_size: 40,
                pack_resource_size: 0,
            },
            ArchiveEntryInfo {
                key: "mod/new.dat".into(),
                offset: 0x40,
                compressed_size: 0,
                uncompressed_size: 8,
                pack_serialized_size: 8,
                pack_resource_size: 0,
            },
        ];
        let slot = index
            .register_archive("mod.arc", LoadType::PreloadDecompress, &entries)
            .unwrap();
        assert_eq!(slot, 2);
        assert_eq!(index.files.len(), before + 1);

        let table = index.find_file("core/table.dat").unwrap();
        assert_eq!(table.archive_index, 2);
        assert_eq!(table.byte_offset(DEFAULT_OFFSET_SCALE).unwrap(), 0x20);
        assert_eq!(table.pack_serialized_size, 40);

        let added = index.find_file("mod/new.dat").unwrap();
        assert_eq!(added.path_hash, hash_path("mod/new.dat"));
        assert_eq!(added.scaled_offset, 0x4);
    }

    #[test]
    fn test_register_archive_is_atomic() {
        let mut index = sample_index();
        let snapshot = index.clone();

        let entries = vec![ArchiveEntryInfo {
            key: "core/table.dat".into(),
            offset: 0x21,
            compressed_size: 0,
            uncompressed_size: 1,
            pack_serialized_size: 1,
            pack_resource_size: 0,
        }];
        assert!(index
            .register_archive("mod.arc", LoadType::Stream, &entries)
            .is_err());
        assert_eq!(index, snapshot);
    }

    #[test]
    fn test_sort_files() {
        let mut index = ArchiveIndex::new();
        index.files = vec![
            FileEntry::new("b"),
            FileEntry::new("a"),
            FileEntry::new("c"),
        ];
        index.sort_files();
        assert!(index.is_sorted());
    }
}
