//! BXON: the typed container wrapping most game asset payloads.
//!
//! Layout (little endian):
//!
//! ```text
//! 0x00  magic "BXON"
//! 0x04  version
//! 0x08  project id
//! 0x0C  offset to asset type name (relative to 0x0C)
//! 0x10  offset to asset data      (relative to 0x10)
//! ```
//!
//! The container does not store the payload length: the payload runs from its
//! start to the end of the buffer, and the inner format delimits itself.

use crate::error::{ParseError, Result};
use crate::io::{RawRecord, Reader, Writer};
use binrw::binrw;

pub const BXON_MAGIC: [u8; 4] = *b"BXON";

/// Alignment of the asset type name and of the payload start.
pub const BXON_ALIGNMENT: usize = 16;

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawBxonHeader {
    magic: [u8; 4],
    version: u32,
    project_id: u32,
    asset_type_offset: u32,
    asset_data_offset: u32,
}

impl RawRecord for RawBxonHeader {
    const SIZE: usize = 20;
}

const ASSET_TYPE_FIELD: usize = 12;
const ASSET_DATA_FIELD: usize = 16;

/// Container metadata, everything except the payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BxonHeader {
    pub version: u32,
    pub project_id: u32,
    pub asset_type: String,
}

/// A parsed container borrowing its payload from the source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bxon<'a> {
    pub header: BxonHeader,
    pub payload: &'a [u8],
}

impl<'a> Bxon<'a> {
    /// Parse a container from `buffer`.
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        let mut reader = Reader::new(buffer);
        let raw = reader.view::<RawBxonHeader>()?;

        if raw.magic != BXON_MAGIC {
            return Err(ParseError::BadMagic {
                expected: BXON_MAGIC,
                found: raw.magic,
            }
            .into());
        }

        let asset_type =
            reader.read_string_relative(raw.offset_at(ASSET_TYPE_FIELD, raw.asset_type_offset))?;

        let data_offset = raw.offset_at(ASSET_DATA_FIELD, raw.asset_data_offset);
        if data_offset.is_null() {
            return Err(
                ParseError::Inconsistent("BXON asset data offset is null".into()).into(),
            );
        }
        let payload_start = reader.resolve_allow_end(data_offset)?;

        tracing::trace!(
            "Parsed BXON type='{}' version={:#x} payload={} bytes",
            asset_type,
            raw.version,
            buffer.len() - payload_start
        );

        Ok(Self {
            header: BxonHeader {
                version: raw.version,
                project_id: raw.project_id,
                asset_type,
            },
            payload: &buffer[payload_start..],
        })
    }

    /// Parse a container and require that it holds `asset_type`.
    pub fn parse_as(buffer: &'a [u8], asset_type: &'static str) -> Result<Self> {
        let bxon = Self::parse(buffer)?;
        bxon.expect_asset_type(asset_type)?;
        Ok(bxon)
    }

    pub fn expect_asset_type(&self, expected: &'static str) -> Result<()> {
        if self.header.asset_type != expected {
            return Err(ParseError::UnexpectedAssetType {
                expected,
                found: self.header.asset_type.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// Wrap `payload` in a container.
///
/// The asset type name and the payload each start on a 16-byte boundary. The
/// end is not padded, so [`Bxon::parse`] returns exactly `payload`.
pub fn build(asset_type: &str, version: u32, project_id: u32, payload: &[u8]) -> Result<Vec<u8>> {
    let mut writer = Writer::with_capacity(
        RawBxonHeader::SIZE + asset_type.len() + payload.len() + 2 * BXON_ALIGNMENT,
    );

    writer.write_bytes(&BXON_MAGIC)?;
    writer.write_u32(version)?;
    writer.write_u32(project_id)?;
    let asset_type_token = writer.reserve_offset()?;
    let asset_data_token = writer.reserve_offset()?;

    writer.align(BXON_ALIGNMENT)?;
    writer.satisfy_offset_here(asset_type_token)?;
    writer.write_cstr(asset_type.as_bytes())?;

    writer.align(BXON_ALIGNMENT)?;
    writer.satisfy_offset_here(asset_data_token)?;
    writer.write_bytes(payload)?;

    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn round_trip(payload: &[u8]) {
        let built = build("tpTestAsset", 0x2009_0422, 0x5445_5354, payload).unwrap();
        let bxon = Bxon::parse(&built).unwrap();
        assert_eq!(bxon.header.asset_type, "tpTestAsset");
        assert_eq!(bxon.header.version, 0x2009_0422);
        assert_eq!(bxon.header.project_id, 0x5445_5354);
        assert_eq!(bxon.payload, payload);
    }

    #[test]
    fn test_round_trip_empty_payload() {
        round_trip(&[]);
    }

    #[test]
    fn test_round_trip_single_byte() {
        round_trip(&[0x42]);
    }

    #[test]
    fn test_round_trip_large_payload() {
        let payload: Vec<u8> = (0..70_000u32).map(|i| (i * 31 % 256) as u8).collect();
        round_trip(&payload);
    }

    #[test]
    fn test_layout() {
        let built = build("tpArchiveFileParam", 1, 2, &[0xAA; 4]).unwrap();

        assert_eq!(&built[0..4], b"BXON");
        // Asset type name at 0x20 (19 bytes with terminator), payload at 0x40
        assert_eq!(
            u32::from_le_bytes(built[12..16].try_into().unwrap()),
            0x20 - 12
        );
        assert_eq!(&built[0x20..0x33], b"tpArchiveFileParam\0");
        assert_eq!(
            u32::from_le_bytes(built[16..20].try_into().unwrap()),
            0x40 - 16
        );
        assert_eq!(&built[0x40..], &[0xAA; 4]);
    }

    #[test]
    fn test_bad_magic() {
        let mut built = build("tpTestAsset", 1, 1, b"data").unwrap();
        built[0..4].copy_from_slice(b"NOXB");
        assert!(matches!(
            Bxon::parse(&built),
            Err(Error::Parse(ParseError::BadMagic { found, .. })) if &found == b"NOXB"
        ));
    }

    #[test]
    fn test_truncated_header() {
        assert!(matches!(
            Bxon::parse(b"BXON\x01\x00"),
            Err(Error::Parse(ParseError::OutOfBounds { .. }))
        ));
    }

    #[test]
    fn test_payload_offset_outside_buffer() {
        let mut built = build("tpTestAsset", 1, 1, b"data").unwrap();
        let len = built.len() as u32;
        built[16..20].copy_from_slice(&len.to_le_bytes());
        assert!(matches!(
            Bxon::parse(&built),
            Err(Error::Parse(ParseError::InvalidOffset { field_pos: 16, .. }))
        ));
    }

    #[test]
    fn test_expect_asset_type() {
        let built = build("tpGxTexHead", 1, 1, b"data").unwrap();
        assert!(Bxon::parse_as(&built, "tpGxTexHead").is_ok());
        assert!(matches!(
            Bxon::parse_as(&built, "tpArchiveFileParam"),
            Err(Error::Parse(ParseError::UnexpectedAssetType { found, .. }))
                if found == "tpGxTexHead"
        ));
    }
}
