//! Image payload utilities.
//!
//! Payloads travel through the pipeline as base64 strings and are only ever
//! decoded here: once on the way in (reference normalization) and once on the
//! way out (storage recompression, file download). Both paths share the same
//! width-bounded lossy JPEG re-encode, because the persistence medium has a
//! hard capacity ceiling and working-resolution images would blow through it.

use crate::error::{AppError, Result};
use crate::types::{Orientation, Style};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;

/// Maximum pixel width of recompressed copies (stored history images and
/// normalized reference inputs).
pub const BOUNDED_WIDTH: u32 = 800;

/// JPEG quality for lossy re-encodes.
const JPEG_QUALITY: u8 = 80;

/// Removes a leading `data:image/...;base64,` prefix if present.
///
/// Payloads pasted in from browser contexts carry the prefix; everything
/// produced internally does not.
pub fn strip_data_url(payload: &str) -> &str {
    match payload.find("base64,") {
        Some(idx) if payload.starts_with("data:") => &payload[idx + "base64,".len()..],
        _ => payload,
    }
}

/// Decodes a base64 payload into raw bytes.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(strip_data_url(payload).as_bytes())
        .map_err(|e| AppError::image(format!("Invalid base64 payload: {e}")))
}

/// Normalizes an uploaded or preset reference image: decode, clamp width,
/// re-encode as JPEG, return base64. User uploads and default presets go
/// through this identically before being handed to the synthesizer.
pub fn normalize_reference(bytes: &[u8]) -> Result<String> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| AppError::image(format!("Failed to decode reference image: {e}")))?;
    encode_to_base64_jpeg(&clamp_width(decoded, BOUNDED_WIDTH))
}

/// Produces the recompressed storage copy of a working-resolution payload.
pub fn shrink_for_storage(payload: &str) -> Result<String> {
    let bytes = decode_payload(payload)?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| AppError::image(format!("Failed to decode image payload: {e}")))?;
    encode_to_base64_jpeg(&clamp_width(decoded, BOUNDED_WIDTH))
}

fn clamp_width(image: DynamicImage, max_width: u32) -> DynamicImage {
    if image.width() <= max_width {
        return image;
    }
    let height = (image.height() as u64 * max_width as u64 / image.width() as u64).max(1) as u32;
    image.resize_exact(max_width, height, image::imageops::FilterType::Triangle)
}

/// Encodes a DynamicImage to a base64 JPEG string at storage quality.
fn encode_to_base64_jpeg(image: &DynamicImage) -> Result<String> {
    let mut buffer: Vec<u8> = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), JPEG_QUALITY);
    image
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| AppError::image(format!("Failed to encode image: {e}")))?;
    Ok(BASE64.encode(buffer))
}

/// Milliseconds since the Unix epoch.
pub fn timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Download filename encoding style, aspect ratio and a timestamp.
pub fn download_filename(style: Style, orientation: Orientation, timestamp: u64) -> String {
    format!("thumbsmith-{}-{}-{}.png", style.label(), orientation.ratio_slug(), timestamp)
}
