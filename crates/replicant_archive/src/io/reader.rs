//! Bounds-checked reader over an immutable byte buffer.

use crate::error::{ParseError, Result};
use binrw::BinRead;
use std::io::Cursor;
use std::ops::Deref;

/// A signed delta stored at `field_pos`, pointing at `field_pos + delta`.
///
/// Every offset in the container and index formats is relative to the address
/// of the field that stores it. A zero delta means "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeOffset {
    field_pos: usize,
    delta: i32,
}

impl RelativeOffset {
    /// Wrap a raw little-endian field value read at `field_pos`.
    pub fn new(field_pos: usize, raw: u32) -> Self {
        Self {
            field_pos,
            delta: raw as i32,
        }
    }

    pub fn field_pos(&self) -> usize {
        self.field_pos
    }

    pub fn delta(&self) -> i32 {
        self.delta
    }

    pub fn is_null(&self) -> bool {
        self.delta == 0
    }

    /// Absolute target, or `None` if it falls below zero or overflows.
    pub fn target(&self) -> Option<usize> {
        self.field_pos.checked_add_signed(self.delta as isize)
    }
}

/// A fixed-size on-disk record that can be viewed by [`Reader::view`].
pub trait RawRecord {
    /// Encoded size in bytes.
    const SIZE: usize;
}

/// A decoded record together with the buffer position it was read from.
///
/// The position is needed to resolve relative offsets stored inside the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located<T> {
    pub pos: usize,
    pub value: T,
}

impl<T> Located<T> {
    /// Build a [`RelativeOffset`] for the field `field_offset` bytes into the record.
    pub fn offset_at(&self, field_offset: usize, raw: u32) -> RelativeOffset {
        RelativeOffset::new(self.pos + field_offset, raw)
    }
}

impl<T> Deref for Located<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Cursor over a byte slice. Nothing it returns can point outside the slice.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// A reader over the same buffer, positioned at `position`.
    pub fn at(&self, position: usize) -> Self {
        Self {
            data: self.data,
            position,
        }
    }

    fn check(&self, needed: usize) -> std::result::Result<std::ops::Range<usize>, ParseError> {
        self.position
            .checked_add(needed)
            .filter(|&end| end <= self.data.len())
            .map(|end| self.position..end)
            .ok_or(ParseError::OutOfBounds {
                position: self.position,
                needed,
                len: self.data.len(),
            })
    }

    /// Decode one `T` at the cursor and advance past it.
    pub fn view<T>(&mut self) -> Result<Located<T>>
    where
        T: RawRecord + for<'b> BinRead<Args<'b> = ()>,
    {
        let range = self.check(T::SIZE)?;
        let pos = range.start;
        let mut cursor = Cursor::new(&self.data[range.clone()]);
        let value = T::read_le(&mut cursor)
            .map_err(|err| ParseError::Inconsistent(format!("record at {pos}: {err}")))?;
        self.position = range.end;
        Ok(Located { pos, value })
    }

    /// Decode `count` consecutive `T` records at the cursor.
    pub fn view_array<T>(&mut self, count: usize) -> Result<Vec<Located<T>>>
    where
        T: RawRecord + for<'b> BinRead<Args<'b> = ()>,
    {
        let total = T::SIZE.checked_mul(count).ok_or(ParseError::OutOfBounds {
            position: self.position,
            needed: usize::MAX,
            len: self.data.len(),
        })?;
        self.check(total)?;

        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            records.push(self.view::<T>()?);
        }
        Ok(records)
    }

    fn resolve_within(&self, offset: RelativeOffset, allow_end: bool) -> Result<usize> {
        let len = self.data.len();
        if offset
            .field_pos()
            .checked_add(4)
            .map_or(true, |end| end > len)
        {
            return Err(ParseError::InvalidPointer {
                field_pos: offset.field_pos(),
                len,
            }
            .into());
        }

        offset
            .target()
            .filter(|&target| target < len || (allow_end && target == len))
            .ok_or_else(|| {
                ParseError::InvalidOffset {
                    field_pos: offset.field_pos(),
                    delta: offset.delta(),
                    len,
                }
                .into()
            })
    }

    /// Resolve `offset` to an absolute position inside `[0, len)`.
    pub fn resolve(&self, offset: RelativeOffset) -> Result<usize> {
        self.resolve_within(offset, false)
    }

    /// Like [`resolve`](Self::resolve), but also accepts a target equal to
    /// `len`. Used for regions that may legitimately be empty.
    pub fn resolve_allow_end(&self, offset: RelativeOffset) -> Result<usize> {
        self.resolve_within(offset, true)
    }

    /// Read the string `offset` points at.
    ///
    /// Returns an empty string for a null offset. The string ends at the first
    /// NUL byte or at the end of the buffer, whichever comes first.
    pub fn read_string_relative(&self, offset: RelativeOffset) -> Result<String> {
        if offset.is_null() {
            return Ok(String::new());
        }

        let start = self.resolve(offset)?;
        let tail = &self.data[start..];
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());

        std::str::from_utf8(&tail[..end])
            .map(str::to_owned)
            .map_err(|_| ParseError::InvalidString { position: start }.into())
    }
}
