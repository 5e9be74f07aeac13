//! Image payload decoding.
//!
//! Callers send canvas snapshots as data URIs (`data:image/png;base64,...`).
//! Everything before the first comma is a header and is discarded.

use base64::{Engine, engine::general_purpose::STANDARD};
use image::ImageFormat;
use tracing::debug;

use inkcalc_core::{CalcError, DecodedImage};

/// Split a data URI into its header and base64 body.
///
/// Fails with [`CalcError::InvalidInput`] when there is no comma.
pub fn split_data_uri(payload: &str) -> Result<(&str, &str), CalcError> {
    payload.split_once(',').ok_or_else(|| {
        CalcError::InvalidInput("malformed image data: expected `<header>,<base64>`".into())
    })
}

/// Decode the base64 body of a data URI into raw image bytes.
pub fn decode_base64_payload(payload: &str) -> Result<Vec<u8>, CalcError> {
    let (header, body) = split_data_uri(payload)?;
    debug!(header = %header, body_len = body.len(), "Decoding image payload");
    STANDARD
        .decode(body.trim())
        .map_err(|e| CalcError::Processing(format!("invalid base64 image data: {}", e)))
}

/// Decode a full data URI payload into a validated image.
pub fn decode_image_payload(payload: &str) -> Result<DecodedImage, CalcError> {
    let bytes = decode_base64_payload(payload)?;
    decode_image_bytes(bytes)
}

/// Decode raw image bytes to pixels, recording format and dimensions.
pub fn decode_image_bytes(bytes: Vec<u8>) -> Result<DecodedImage, CalcError> {
    let format = image::guess_format(&bytes)
        .map_err(|e| CalcError::Processing(format!("unrecognized image format: {}", e)))?;
    let pixels = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| CalcError::Processing(format!("failed to decode image: {}", e)))?;

    debug!(
        width = pixels.width(),
        height = pixels.height(),
        format = ?format,
        "Image decoded"
    );

    Ok(DecodedImage {
        mime_type: mime_for(format).to_string(),
        width: pixels.width(),
        height: pixels.height(),
        bytes,
    })
}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        _ => "application/octet-stream",
    }
}
