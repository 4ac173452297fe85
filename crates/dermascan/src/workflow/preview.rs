use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat};

/// Longest side of a preview thumbnail, in pixels.
pub const PREVIEW_MAX_DIMENSION: u32 = 512;

/// Renders a PNG data URI preview of an image.
///
/// Returns `None` for anything that does not decode; a missing preview
/// never affects the scan itself. CPU-bound, so callers on the runtime
/// should go through `spawn_blocking`.
pub fn render_preview(bytes: &[u8]) -> Option<String> {
    let decoded = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::debug!(error = %e, "No preview for undecodable image");
            return None;
        }
    };

    let thumbnail = fit_within(decoded, PREVIEW_MAX_DIMENSION);

    let mut png = Vec::new();
    if let Err(e) = thumbnail.write_to(&mut Cursor::new(&mut png), ImageFormat::Png) {
        tracing::debug!(error = %e, "Failed to encode preview");
        return None;
    }

    Some(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}

fn fit_within(img: DynamicImage, max: u32) -> DynamicImage {
    if img.width() <= max && img.height() <= max {
        img
    } else {
        img.thumbnail(max, max)
    }
}
