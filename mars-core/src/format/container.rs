use std::io::{self, Read};

use byteorder::ReadBytesExt;

use super::{read_varint, FormatError};
use crate::bitmap::ImageDecoder;
use crate::memory::MemoryBuffer;
use crate::resource::{Payload, Resource, ResourceError, ResourceTable, ResourceType};

pub const MAGIC: [u8; 4] = *b"MARS";

/// What a successful load saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Records read before the terminator.
    pub records: u32,
    pub declared_count: u32,
    pub declared_size: u32,
    /// Sum of the per-record payload sizes.
    pub payload_bytes: u64,
}

impl LoadSummary {
    pub fn matches_header(&self) -> bool {
        u64::from(self.declared_count) == u64::from(self.records)
            && u64::from(self.declared_size) == self.payload_bytes
    }
}

/// Reads a MARS container into a [`ResourceTable`].
///
/// Image records are handed to the decoder when one is set; without a decoder the
/// compressed bytes are kept as a binary payload under the `IMAGE` tag.
#[derive(Clone, Copy, Default)]
pub struct ResourceLoader<'d> {
    decoder: Option<&'d dyn ImageDecoder>,
}

impl<'d> ResourceLoader<'d> {
    pub fn new(decoder: Option<&'d dyn ImageDecoder>) -> Self {
        Self { decoder }
    }

    /// Load every record of `reader` into `table`.
    ///
    /// Handles are numbered from 1 again for each load. Every record is stored at its
    /// handle before its payload is read, so records inserted before an error stay in
    /// the table; there is no rollback. A record with an unknown tag is stored as a
    /// placeholder and then fails the load.
    pub fn load<R: Read + ?Sized>(
        &self,
        reader: &mut R,
        table: &mut ResourceTable,
    ) -> Result<LoadSummary, FormatError> {
        for (index, &expected) in MAGIC.iter().enumerate() {
            let found = reader.read_u8()?;
            if found != expected {
                return Err(FormatError::BadMagic { index, found, expected });
            }
        }

        let mut summary = LoadSummary {
            declared_count: read_varint(reader)?,
            declared_size: read_varint(reader)?,
            ..Default::default()
        };
        log::debug!(
            "container header: {} resources, {} payload bytes",
            summary.declared_count,
            summary.declared_size
        );

        table.reset_counter();

        loop {
            let tag = reader.read_u8()?;
            if tag == 0 {
                break;
            }

            let size = read_varint(reader)?;
            let handle = table.next_handle().ok_or(ResourceError::HandlesExhausted)?;
            let Some(ty) = ResourceType::from_tag(tag) else {
                table.set(handle, Resource::placeholder());
                return Err(FormatError::UnknownRecordType { ty: tag, handle: handle.get() });
            };

            table.set(handle, Resource::new(ty, Payload::Empty));
            let payload = self.read_payload(reader, ty, size, handle.get())?;
            if let Some(r) = table.get_mut(ty, handle) {
                r.set_payload(payload);
            }

            log::debug!("resource {}: {} ({} bytes)", handle, ty, size);
            table.advance_counter()?;
            summary.records += 1;
            summary.payload_bytes += u64::from(size);
        }

        if !summary.matches_header() {
            log::warn!(
                "container header declares {} resources / {} bytes, stream held {} / {}",
                summary.declared_count,
                summary.declared_size,
                summary.records,
                summary.payload_bytes
            );
        }

        Ok(summary)
    }

    fn read_payload<R: Read + ?Sized>(
        &self,
        reader: &mut R,
        ty: ResourceType,
        size: u32,
        handle: u32,
    ) -> Result<Payload, FormatError> {
        match ty {
            ResourceType::Placeholder => Ok(Payload::Empty),
            ResourceType::Binary | ResourceType::UBin => {
                Ok(Payload::Binary(MemoryBuffer::from(read_record(reader, size)?)))
            }
            ResourceType::Image => {
                let bytes = read_record(reader, size)?;
                let Some(decoder) = self.decoder else {
                    return Ok(Payload::Binary(MemoryBuffer::from(bytes)));
                };
                match decoder.decode(&bytes) {
                    Ok(bitmap) => Ok(Payload::Image(bitmap)),
                    Err(e) => {
                        log::warn!("resource {}: image decode failed: {:#}", handle, e);
                        Ok(Payload::Empty)
                    }
                }
            }
            ResourceType::Skip => {
                let mut limited = (&mut *reader).take(u64::from(size));
                let skipped = io::copy(&mut limited, &mut io::sink())?;
                if skipped != u64::from(size) {
                    return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
                }
                Ok(Payload::Empty)
            }
            ResourceType::Label => {
                let bytes = read_record(reader, size)?;
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Ok(Payload::Label(String::from_utf8_lossy(&bytes[..end]).into_owned()))
            }
            ResourceType::Sprite => Err(FormatError::UnknownRecordType { ty: ty.tag(), handle }),
        }
    }
}

/// Read a `size`-byte payload. The buffer grows with the data actually present, so a
/// size field larger than the stream fails at EOF without reserving it up front.
fn read_record<R: Read + ?Sized>(reader: &mut R, size: u32) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    (&mut *reader).take(u64::from(size)).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != u64::from(size) {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    }
    Ok(bytes)
}
