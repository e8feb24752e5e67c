//! Image validation and preprocessing for the classifier.
//!
//! The format is always detected from the payload's magic bytes, never from a
//! file name or declared content type, so mislabeled payloads are rejected.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use ndarray::Array4;
use tracing::debug;

use crate::errors::PipelineError;

/// Fewest bytes needed before format detection is attempted
pub const MIN_FORMAT_BYTES: usize = 8;

/// Detect the image format from the payload content
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, PipelineError> {
    if bytes.len() < MIN_FORMAT_BYTES {
        return Err(PipelineError::UnrecognizedFormat);
    }
    let format = image::guess_format(bytes).map_err(|_| PipelineError::UnrecognizedFormat)?;
    debug!(format = ?format, "Detected image format");
    Ok(format)
}

/// Decode the payload using the detected format
pub fn decode(bytes: &[u8], format: ImageFormat) -> Result<DynamicImage, PipelineError> {
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PipelineError::Decode(e.to_string()))
}

/// Resize to `size`×`size` RGB and lay out as NHWC `[1, size, size, 3]` in [0,1]
pub fn to_input_tensor(image: &DynamicImage, size: u32) -> Array4<f32> {
    let rgb = image.resize_exact(size, size, FilterType::CatmullRom).to_rgb8();
    let edge = size as usize;
    Array4::from_shape_fn((1, edge, edge, 3), |(_, y, x, c)| {
        f32::from(rgb.get_pixel(x as u32, y as u32)[c]) / 255.0
    })
}

/// Run detection, decoding and preprocessing on a raw payload
pub fn prepare(bytes: &[u8], size: u32) -> Result<Array4<f32>, PipelineError> {
    let format = detect_format(bytes)?;
    let image = decode(bytes, format)?;
    debug!(
        width = image.width(),
        height = image.height(),
        target = size,
        "Preprocessing image"
    );
    Ok(to_input_tensor(&image, size))
}
