//! Little-endian serialization primitives shared by every codec in the crate.

mod reader;
mod writer;

pub use reader::{Located, RawRecord, Reader, RelativeOffset};
pub use writer::{OffsetToken, StringPool, Writer};
