//! Decoding and encoding of image files and data URLs

use super::raster::{frame_to_rgba, rgba_to_frame};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use inkframe_domain::{ImageFrame, ToolError};
use std::io::Cursor;
use std::path::Path;

/// Output formats `image.save` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Png,
    Jpeg { quality: u8 },
}

impl ImageEncoding {
    /// `png` (default), `jpeg`/`jpg` with quality in `[0, 1]` or `[1, 100]`.
    pub fn parse(format: &str, quality: Option<f64>) -> Result<Self, ToolError> {
        match format.to_ascii_lowercase().as_str() {
            "png" | "image/png" => Ok(Self::Png),
            "jpeg" | "jpg" | "image/jpeg" => {
                let q = quality.unwrap_or(0.92);
                let q = if q <= 1.0 { q * 100.0 } else { q };
                Ok(Self::Jpeg {
                    quality: q.round().clamp(1.0, 100.0) as u8,
                })
            }
            other => Err(ToolError::invalid_argument(format!(
                "Unsupported image format: {}",
                other
            ))),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpeg",
        }
    }
}

fn decode_error(e: image::ImageError) -> ToolError {
    ToolError::invalid_argument(format!("Could not decode image: {}", e))
}

pub fn decode_bytes(bytes: &[u8]) -> Result<ImageFrame, ToolError> {
    let decoded = image::load_from_memory(bytes).map_err(decode_error)?;
    rgba_to_frame(decoded.to_rgba8())
}

pub fn decode_file(path: &Path) -> Result<ImageFrame, ToolError> {
    let bytes = std::fs::read(path)?;
    decode_bytes(&bytes)
}

/// Decode `data:image/...;base64,<payload>`.
pub fn decode_data_url(url: &str) -> Result<ImageFrame, ToolError> {
    let payload = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| ToolError::invalid_argument("Expected a base64 data URL"))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ToolError::invalid_argument(format!("Invalid base64 payload: {}", e)))?;
    decode_bytes(&bytes)
}

/// Build a frame from base64-encoded raw RGBA bytes.
pub fn decode_raw_rgba(width: u32, height: u32, rgba_base64: &str) -> Result<ImageFrame, ToolError> {
    let bytes = STANDARD
        .decode(rgba_base64.trim())
        .map_err(|e| ToolError::invalid_argument(format!("Invalid base64 payload: {}", e)))?;
    ImageFrame::from_rgba(width, height, bytes).ok_or_else(|| {
        ToolError::invalid_argument(format!("RGBA buffer does not match {}x{}", width, height))
    })
}

pub fn encode(frame: &ImageFrame, encoding: ImageEncoding) -> Result<Vec<u8>, ToolError> {
    let rgba = DynamicImage::ImageRgba8(frame_to_rgba(frame)?);
    let mut bytes = Vec::new();
    let result = match encoding {
        ImageEncoding::Png => rgba.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png),
        ImageEncoding::Jpeg { quality } => {
            // JPEG has no alpha channel
            let rgb = rgba.to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&rgb)
        }
    };
    result.map_err(|e| ToolError::Surface(format!("Could not encode image: {}", e)))?;
    Ok(bytes)
}

pub fn to_data_url(bytes: &[u8], encoding: ImageEncoding) -> String {
    format!("data:{};base64,{}", encoding.mime_type(), STANDARD.encode(bytes))
}
