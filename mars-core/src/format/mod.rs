//! The MARS packed resource container.
//!
//! Layout (varints are described in [`varint`]):
//! - `b"MARS"`
//! - varint declared resource count
//! - varint declared total payload size
//! - records, each:
//!     - u8 record type (0 terminates the container)
//!     - varint payload size
//!     - payload bytes

mod container;
mod varint;
mod writer;

pub use container::{LoadSummary, ResourceLoader, MAGIC};
pub use varint::{read_varint, varint_len, write_varint, MAX_VARINT, MAX_VARINT_GROUPS};
pub use writer::ContainerWriter;

use crate::resource::ResourceError;

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("bad container magic: byte {index} is {found:#04x}, expected {expected:#04x}")]
    BadMagic { index: usize, found: u8, expected: u8 },

    #[error("unknown record type {ty} at handle {handle}")]
    UnknownRecordType { ty: u8, handle: u32 },

    #[error("varint value {0:#x} does not fit in 28 bits")]
    VarintTooLarge(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}
