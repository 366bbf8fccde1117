//! zstd adapter.
//!
//! The game's decoder only accepts frames whose window fits in 32 KiB and whose
//! header records the decompressed size, so every frame produced here caps the
//! window log at [`MAX_WINDOW_LOG`] and writes the content size.

use crate::error::{CompressionError, Result};
use zstd::zstd_safe::{self, CParameter};

/// Compression level used when the caller has no preference.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 1;

/// Largest window log the game's decoder accepts.
pub const MAX_WINDOW_LOG: u32 = 15;

/// Encoder settings for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionConfig {
    pub level: i32,
    pub window_log: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
            window_log: MAX_WINDOW_LOG,
        }
    }
}

impl CompressionConfig {
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Set the window log. Values above [`MAX_WINDOW_LOG`] are clamped.
    pub fn with_window_log(mut self, window_log: u32) -> Self {
        self.window_log = window_log.min(MAX_WINDOW_LOG);
        self
    }
}

/// Compress `data` into a single frame at `level`.
pub fn compress(data: &[u8], level: i32) -> Result<Vec<u8>> {
    compress_with(data, CompressionConfig::default().with_level(level))
}

/// Compress `data` into a single frame using `config`.
///
/// Empty input yields empty output rather than an empty frame.
pub fn compress_with(data: &[u8], config: CompressionConfig) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut compressor =
        zstd::bulk::Compressor::new(config.level).map_err(CompressionError::Compress)?;
    compressor
        .set_parameter(CParameter::WindowLog(config.window_log.min(MAX_WINDOW_LOG)))
        .map_err(CompressionError::Compress)?;
    compressor
        .set_parameter(CParameter::ContentSizeFlag(true))
        .map_err(CompressionError::Compress)?;

    let compressed = compressor
        .compress(data)
        .map_err(CompressionError::Compress)?;

    tracing::trace!(
        "Compressed {} -> {} bytes (level={})",
        data.len(),
        compressed.len(),
        config.level
    );
    Ok(compressed)
}

/// Decompressed size recorded in the frame header of `data`.
pub fn decompressed_size(data: &[u8]) -> Result<usize> {
    if data.is_empty() {
        return Err(CompressionError::EmptyInput.into());
    }

    match zstd_safe::get_frame_content_size(data) {
        Ok(Some(size)) => usize::try_from(size)
            .map_err(|_| CompressionError::UnknownContentSize.into()),
        Ok(None) => Err(CompressionError::UnknownContentSize.into()),
        Err(_) => Err(CompressionError::InvalidFrame.into()),
    }
}

/// Decompress `data`, which must decode to exactly `known_size` bytes.
pub fn decompress(data: &[u8], known_size: usize) -> Result<Vec<u8>> {
    if data.is_empty() {
        return if known_size == 0 {
            Ok(Vec::new())
        } else {
            Err(CompressionError::EmptyInput.into())
        };
    }

    // Catch a mismatch up front when the header records a size; the decoder
    // would otherwise fail with a less precise "buffer too small".
    if let Ok(Some(recorded)) = zstd_safe::get_frame_content_size(data) {
        if recorded != known_size as u64 {
            return Err(CompressionError::SizeMismatch {
                expected: known_size as u64,
                actual: recorded,
            }
            .into());
        }
    }

    let decompressed =
        zstd::bulk::decompress(data, known_size).map_err(CompressionError::Decompress)?;
    if decompressed.len() != known_size {
        return Err(CompressionError::SizeMismatch {
            expected: known_size as u64,
            actual: decompressed.len() as u64,
        }
        .into());
    }
    Ok(decompressed)
}

/// Decompress a frame whose header records its own content size.
pub fn decompress_frame(data: &[u8]) -> Result<Vec<u8>> {
    let size = decompressed_size(data)?;
    decompress(data, size)
}
