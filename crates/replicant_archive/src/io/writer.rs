//! Append-only byte writer with relative-offset patching.

use crate::error::{BuildError, Result};
use byteorder::{ByteOrder, WriteBytesExt, LE};
use std::collections::BTreeMap;
use std::io::Write;

/// A 4-byte placeholder reserved by [`Writer::reserve_offset`].
///
/// Tokens are move-only: satisfying one consumes it, so a placeholder can be
/// patched at most once. A token that is dropped unsatisfied leaves `0` in the
/// output, which readers treat as "absent".
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an unsatisfied offset token leaves a null offset in the output"]
pub struct OffsetToken(usize);

impl OffsetToken {
    /// Position of the placeholder in the writer's buffer.
    pub fn position(&self) -> usize {
        self.0
    }
}

/// Forward-only little-endian byte writer.
///
/// Relative offsets are written as placeholders and patched once their target
/// is known. The stored value is always `target - placeholder_position`, i.e.
/// relative to the field's own address, never to the buffer start.
#[derive(Debug, Default)]
pub struct Writer {
    buffer: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Current write position (equal to the number of bytes written).
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.buffer.write_u8(value)?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.buffer.write_u32::<LE>(value)?;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.write_all(bytes)?;
        Ok(())
    }

    /// Write `bytes` followed by a NUL terminator.
    pub fn write_cstr(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_bytes(bytes)?;
        self.write_u8(0)
    }

    /// Pad with zero bytes up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        if alignment == 0 {
            return Ok(());
        }
        let padding = (alignment - self.position() % alignment) % alignment;
        self.buffer.write_all(&vec![0; padding])?;
        Ok(())
    }

    /// Write a 4-byte placeholder and return a token for it.
    pub fn reserve_offset(&mut self) -> Result<OffsetToken> {
        let position = self.position();
        self.write_u32(0)?;
        Ok(OffsetToken(position))
    }

    /// Patch `token` so that it points at `target`.
    pub fn satisfy_offset(&mut self, token: OffsetToken, target: usize) -> Result<()> {
        let position = token.0;
        if position
            .checked_add(4)
            .map_or(true, |end| end > self.buffer.len())
        {
            return Err(BuildError::OffsetOutOfRange {
                token: position,
                len: self.buffer.len(),
            }
            .into());
        }

        let delta = i64::try_from(target)
            .ok()
            .zip(i64::try_from(position).ok())
            .and_then(|(target, position)| i32::try_from(target - position).ok())
            .ok_or(BuildError::OffsetOverflow {
                token: position,
                target,
            })?;

        LE::write_i32(&mut self.buffer[position..position + 4], delta);
        Ok(())
    }

    /// Patch `token` so that it points at the current write position.
    pub fn satisfy_offset_here(&mut self, token: OffsetToken) -> Result<()> {
        let target = self.position();
        self.satisfy_offset(token, target)
    }
}

/// Deduplicating pool of strings referenced by relative offsets.
///
/// Strings are collected during serialization and written in one block by
/// [`flush`](Self::flush). Each distinct string is written once, in sorted
/// order, and every placeholder that referenced it is patched to point at it.
#[derive(Debug, Default)]
pub struct StringPool {
    pending: BTreeMap<String, Vec<OffsetToken>>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a placeholder that should point at `value`.
    ///
    /// Empty strings are never pooled; their placeholder stays `0`.
    pub fn add(&mut self, value: &str, token: OffsetToken) {
        if value.is_empty() {
            return;
        }
        self.pending
            .entry(value.to_owned())
            .or_default()
            .push(token);
    }

    /// Number of distinct strings waiting to be written.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Write every pooled string and patch all references to it.
    pub fn flush(&mut self, writer: &mut Writer) -> Result<()> {
        for (value, tokens) in std::mem::take(&mut self.pending) {
            let start = writer.position();
            writer.write_cstr(value.as_bytes())?;
            for token in tokens {
                writer.satisfy_offset(token, start)?;
            }
        }
        Ok(())
    }
}
