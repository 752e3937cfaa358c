use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Longest edge kept after decoding; larger photos are downscaled preserving aspect ratio.
pub const MAX_SOURCE_EDGE: u32 = 4096;

/// A decoded still image ready for the frame renderer.
#[derive(Clone, Debug)]
pub struct SourceImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl SourceImage {
    /// Wrap already-premultiplied pixels.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::validation("image width/height must be non-zero"));
        }
        if rgba8_premul.len() != (width as usize) * (height as usize) * 4 {
            return Err(ReelError::validation(
                "image byte length must equal width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Read and decode an image file.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        decode_image(&bytes)
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
#[tracing::instrument(skip_all, fields(bytes = bytes.len()))]
pub fn decode_image(bytes: &[u8]) -> ReelResult<SourceImage> {
    let mut dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    if dyn_img.width() > MAX_SOURCE_EDGE || dyn_img.height() > MAX_SOURCE_EDGE {
        tracing::debug!(
            width = dyn_img.width(),
            height = dyn_img.height(),
            "downscaling oversized source image"
        );
        dyn_img = dyn_img.resize(
            MAX_SOURCE_EDGE,
            MAX_SOURCE_EDGE,
            image::imageops::FilterType::Triangle,
        );
    }

    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(ReelError::validation("decoded image is empty"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    tracing::debug!(width, height, "decoded source image");
    Ok(SourceImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
