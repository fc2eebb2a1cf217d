use std::io::Write;

use super::{write_varint, FormatError, MAGIC};
use crate::resource::ResourceType;

/// Builds a MARS container in memory.
///
/// Header count and size are computed from the records added, so a written
/// container always agrees with its own header.
#[derive(Debug, Default, Clone)]
pub struct ContainerWriter {
    records: Vec<(u8, Vec<u8>)>,
}

impl ContainerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placeholder(mut self) -> Self {
        self.records.push((ResourceType::Placeholder.tag(), Vec::new()));
        self
    }

    pub fn binary(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.record(ResourceType::Binary, bytes)
    }

    pub fn ubin(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.record(ResourceType::UBin, bytes)
    }

    /// An image record; `bytes` are the compressed image as the decoder expects it.
    pub fn image(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.record(ResourceType::Image, bytes)
    }

    pub fn label(self, name: &str) -> Self {
        let mut bytes = name.as_bytes().to_vec();
        bytes.push(0);
        self.record(ResourceType::Label, bytes)
    }

    pub fn record(self, ty: ResourceType, bytes: impl Into<Vec<u8>>) -> Self {
        self.raw_record(ty.tag(), bytes)
    }

    /// A record with an arbitrary tag, including ones no reader understands.
    pub fn raw_record(mut self, tag: u8, bytes: impl Into<Vec<u8>>) -> Self {
        self.records.push((tag, bytes.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), FormatError> {
        let total: usize = self.records.iter().map(|(_, b)| b.len()).sum();
        let count = u32::try_from(self.records.len()).unwrap_or(u32::MAX);
        let total = u32::try_from(total).unwrap_or(u32::MAX);

        w.write_all(&MAGIC)?;
        write_varint(w, count)?;
        write_varint(w, total)?;
        for (tag, bytes) in &self.records {
            let size = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
            w.write_all(&[*tag])?;
            write_varint(w, size)?;
            w.write_all(bytes)?;
        }
        w.write_all(&[0])?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}
