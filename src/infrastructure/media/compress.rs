use std::io::Cursor;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

/// Re-encode an image as JPEG, capping the long edge. Callers treat any
/// failure as "use the original bytes": this is a best-effort size
/// reduction, not a validation step.
pub fn recompress_jpeg(bytes: &[u8], max_long_edge: u32, quality: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).context("Failed to decode image")?;

    let img = if img.width().max(img.height()) > max_long_edge {
        img.resize(max_long_edge, max_long_edge, FilterType::Triangle)
    } else {
        img
    };

    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    img.write_with_encoder(encoder)
        .context("Failed to encode JPEG")?;
    Ok(out.into_inner())
}
