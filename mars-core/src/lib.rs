//! This crate implements the data side of the MARS runtime bridge
//!
//! It holds the guest memory buffer with its typed accessors, the packed resource
//! container format, and the handle-addressed resource table the VM refers to.

#![allow(clippy::uninlined_format_args)]

pub mod bits;
pub mod format;
pub mod bitmap;
pub mod memory;
pub mod resource;

pub use bitmap::{Bitmap, ImageDecoder, RasterDecoder};
pub use format::{ContainerWriter, FormatError, LoadSummary, ResourceLoader};
pub use memory::{MemoryBuffer, MemoryError, Scalar};
pub use resource::{Handle, Payload, Resource, ResourceError, ResourceTable, ResourceType};
