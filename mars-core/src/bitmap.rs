//! Image decoding collaborator.
//!
//! The loader never looks inside a decoded image; it only stores whatever the
//! decoder hands back as the resource payload.

use anyhow::{Context, Result};

pub type Bitmap = image::RgbaImage;

pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap>;
}

/// Decodes PNG and JPEG payloads with the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap> {
        let format = image::guess_format(bytes).context("unrecognized image payload")?;
        let img = image::load_from_memory_with_format(bytes, format)
            .with_context(|| format!("failed to decode {:?} image ({} bytes)", format, bytes.len()))?;
        Ok(img.to_rgba8())
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = Bitmap::from_pixel(width, height, image::Rgba([0x10, 0x20, 0x30, 0xFF]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
