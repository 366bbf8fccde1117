//! Header probe for PACK files, the asset bundles stored inside archives.
//!
//! Only the fixed header is decoded. The index needs the serialized and
//! resource sizes of every packed file, nothing else.

use crate::error::{ParseError, Result};
use crate::io::{RawRecord, Reader};
use binrw::binrw;

pub const PACK_MAGIC: [u8; 4] = *b"PACK";

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawPackHeader {
    magic: [u8; 4],
    version: u32,
    total_size: u32,
    serialized_size: u32,
    resource_size: u32,
    import_count: u32,
    import_offset: u32,
    asset_package_count: u32,
    asset_package_offset: u32,
    file_count: u32,
    file_offset: u32,
}

impl RawRecord for RawPackHeader {
    const SIZE: usize = 44;
}

/// Sizes and counts from a PACK header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackHeader {
    pub version: u32,
    pub total_size: u32,
    /// Bytes of everything except the trailing asset data.
    pub serialized_size: u32,
    /// Bytes of the trailing asset data.
    pub resource_size: u32,
    pub import_count: u32,
    pub asset_package_count: u32,
    pub file_count: u32,
}

impl PackHeader {
    /// Decode and sanity-check the header at the start of `data`.
    pub fn probe(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let raw = reader.view::<RawPackHeader>()?;

        if raw.magic != PACK_MAGIC {
            return Err(ParseError::BadMagic {
                expected: PACK_MAGIC,
                found: raw.magic,
            }
            .into());
        }
        if raw.total_size as usize > data.len() {
            return Err(ParseError::Inconsistent(format!(
                "PACK total size {} exceeds buffer size {}",
                raw.total_size,
                data.len()
            ))
            .into());
        }

        let imports = reader.resolve_allow_end(raw.offset_at(24, raw.import_offset))?;
        let asset_packages = reader.resolve_allow_end(raw.offset_at(32, raw.asset_package_offset))?;
        let files = reader.resolve_allow_end(raw.offset_at(40, raw.file_offset))?;

        let imports_out_of_order =
            raw.import_count > 0 && raw.asset_package_count > 0 && imports > asset_packages;
        let packages_out_of_order =
            raw.asset_package_count > 0 && raw.file_count > 0 && asset_packages > files;
        if imports_out_of_order || packages_out_of_order {
            return Err(
                ParseError::Inconsistent("PACK header offsets are not sequential".into()).into(),
            );
        }

        Ok(Self {
            version: raw.version,
            total_size: raw.total_size,
            serialized_size: raw.serialized_size,
            resource_size: raw.resource_size,
            import_count: raw.import_count,
            asset_package_count: raw.asset_package_count,
            file_count: raw.file_count,
        })
    }

    /// Cheap magic check without validating the rest of the header.
    pub fn is_pack(data: &[u8]) -> bool {
        data.starts_with(&PACK_MAGIC)
    }
}
