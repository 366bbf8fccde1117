//! Error types for archive, container and index codecs.
//!
//! Every fallible function in this crate returns [`Result<T>`]. The top-level
//! [`Error`] groups failures by kind so callers can decide whether a failure is
//! recoverable (a malformed mod file) or fatal (a failed write).

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing archive data.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (reading an index, writing an archive, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input bytes are malformed: bad magic, truncation, or an offset that
    /// resolves outside the buffer.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// zstd compression or decompression failed.
    #[error("Compression error: {0}")]
    Compression(#[from] CompressionError),

    /// An internal invariant was violated while serializing.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),
}

/// Errors raised by the bounds-checked [`Reader`](crate::io::Reader) and the
/// decoders built on top of it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A fixed-size view or array runs past the end of the buffer.
    #[error("buffer overrun: needed {needed} bytes at {position}, buffer is {len} bytes")]
    OutOfBounds {
        position: usize,
        needed: usize,
        len: usize,
    },

    /// The field holding a relative offset is itself outside the buffer.
    #[error("offset field at {field_pos} is outside the buffer ({len} bytes)")]
    InvalidPointer { field_pos: usize, len: usize },

    /// A relative offset resolves outside the buffer.
    #[error("relative offset {delta} from field {field_pos} points outside the buffer ({len} bytes)")]
    InvalidOffset {
        field_pos: usize,
        delta: i32,
        len: usize,
    },

    /// A string is not valid UTF-8.
    #[error("string at {position} is not valid UTF-8")]
    InvalidString { position: usize },

    /// A magic number did not match.
    #[error("invalid magic: expected {expected:?}, found {found:?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },

    /// A BXON container holds a different asset type than the caller expected.
    #[error("unexpected asset type '{found}', expected '{expected}'")]
    UnexpectedAssetType {
        expected: &'static str,
        found: String,
    },

    /// A header field is inconsistent with the buffer it describes.
    #[error("{0}")]
    Inconsistent(String),
}

/// Errors raised by the compression adapter.
#[derive(Error, Debug)]
pub enum CompressionError {
    /// The encoder rejected its parameters or failed mid-frame.
    #[error("zstd compression failed: {0}")]
    Compress(#[source] std::io::Error),

    /// The decoder rejected the frame.
    #[error("zstd decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    /// The frame decoded to a different length than the caller expected.
    #[error("decompressed size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// The frame header does not record its content size.
    #[error("frame content size is not recorded in the header")]
    UnknownContentSize,

    /// The data does not start with a valid zstd frame header.
    #[error("data is not a valid zstd frame")]
    InvalidFrame,

    /// Empty input where a frame was required.
    #[error("input data cannot be empty")]
    EmptyInput,
}

/// Errors raised while serializing archives, containers and indices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// An offset placeholder lies outside the written buffer.
    #[error("offset token at {token} is outside the buffer ({len} bytes)")]
    OffsetOutOfRange { token: usize, len: usize },

    /// The distance between a placeholder and its target does not fit in 32 bits.
    #[error("relative offset from {token} to {target} does not fit in 32 bits")]
    OffsetOverflow { token: usize, target: usize },

    /// An index can address at most 256 archives.
    #[error("too many archives: slot {0} does not fit in a u8")]
    TooManyArchives(usize),

    /// A byte offset cannot be stored with the archive's offset scale.
    #[error("offset {offset:#x} is not representable with offset scale {scale}")]
    UnrepresentableOffset { offset: u64, scale: u32 },

    /// A size or count does not fit in its 32-bit field.
    #[error("{what} ({value}) does not fit in 32 bits")]
    ValueTooLarge { what: &'static str, value: u64 },

    /// A file key was added twice to the same archive.
    #[error("duplicate key added to archive: {0}")]
    DuplicateKey(String),

    /// An archive input has an empty key or empty payload.
    #[error("archive input '{0}' has an empty key or empty payload")]
    EmptyInput(String),
}
