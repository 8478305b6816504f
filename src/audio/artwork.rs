// src/audio/artwork.rs
//! Cover art normalisation: square, opaque, baseline JPEG.

use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tracing::debug;

use crate::error::{Error, Result};
use crate::fs::{detect_bytes, detect_file_type, FileCategory};

/// Edge length of the embedded cover, in pixels.
pub const COVER_SIZE: u32 = 500;

/// Read an image file and turn it into embeddable cover bytes.
pub fn prepare_cover(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let kind = detect_file_type(path)?;
    if kind.category != FileCategory::Image {
        return Err(Error::UnsupportedFormat(kind.mime));
    }
    prepare_cover_bytes(&std::fs::read(path)?)
}

/// Normalise encoded image bytes (PNG, JPEG, ...) into a 500×500 JPEG.
///
/// Transparent pixels are composited onto white before the alpha channel is
/// dropped.
pub fn prepare_cover_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    if let Some(kind) = detect_bytes(bytes) {
        if kind.category != FileCategory::Image {
            return Err(Error::UnsupportedFormat(kind.mime));
        }
        debug!(mime = %kind.mime, size = bytes.len(), "processing cover image");
    }

    let img = image::load_from_memory(bytes)?;
    let (w, h) = (img.width(), img.height());
    let flat = flatten_onto_white(&img);
    let resized = imageops::resize(&flat, COVER_SIZE, COVER_SIZE, FilterType::Lanczos3);

    let mut out = Vec::new();
    DynamicImage::ImageRgb8(resized).write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)?;
    debug!(from = ?(w, h), jpeg_bytes = out.len(), "cover converted to {COVER_SIZE}x{COVER_SIZE} JPEG");
    Ok(out)
}

/// Alpha-composite every pixel over an opaque white background.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u16;
        let blend = |c: u8| ((c as u16 * a + 255 * (255 - a)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
