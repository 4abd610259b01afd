//! Named pixel filters for `image.applyFilter`
//!
//! | Id | Options | Effect |
//! |----|---------|--------|
//! | `grayscale` | | Rec. 601 luma on RGB, alpha kept |
//! | `invert` | | `255 - c` on RGB, alpha kept |
//! | `blur` | `radius` (1), `sigma` (`radius / 2`) | Gaussian blur |
//! | `sharpen` | `amount` (1), `radius` (1), `threshold` (0) | Unsharp mask |
//! | `sepia` | `intensity` (1) | Sepia tone |
//!
//! A filter must return a frame of the same dimensions; the registry
//! rejects anything else.

use super::raster::{frame_to_rgba, rgba_to_frame};
use image::{RgbaImage, imageops};
use inkframe_domain::{ImageFrame, ToolError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Free-form filter options from the command payload.
pub type FilterOptions = Map<String, Value>;

pub trait ImageFilter: Send + Sync {
    fn apply(&self, frame: &ImageFrame, options: &FilterOptions) -> Result<ImageFrame, ToolError>;
}

impl<F> ImageFilter for F
where
    F: Fn(&ImageFrame, &FilterOptions) -> Result<ImageFrame, ToolError> + Send + Sync,
{
    fn apply(&self, frame: &ImageFrame, options: &FilterOptions) -> Result<ImageFrame, ToolError> {
        self(frame, options)
    }
}

#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: BTreeMap<String, Arc<dyn ImageFilter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the five built-in filters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("grayscale", Arc::new(grayscale));
        registry.register("invert", Arc::new(invert));
        registry.register("blur", Arc::new(blur));
        registry.register("sharpen", Arc::new(sharpen));
        registry.register("sepia", Arc::new(sepia));
        registry
    }

    /// Returns `false` for an empty or already registered id.
    pub fn register(&mut self, id: &str, filter: Arc<dyn ImageFilter>) -> bool {
        if id.is_empty() {
            tracing::error!("Invalid filter ID");
            return false;
        }
        if self.filters.contains_key(id) {
            tracing::warn!("Filter with id {} is already registered", id);
            return false;
        }
        self.filters.insert(id.to_string(), filter);
        tracing::debug!(filter = %id, "Filter registered");
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.filters.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.filters.keys().map(String::as_str).collect()
    }

    pub fn apply(
        &self,
        id: &str,
        frame: &ImageFrame,
        options: &FilterOptions,
    ) -> Result<ImageFrame, ToolError> {
        let filter = self
            .filters
            .get(id)
            .ok_or_else(|| ToolError::not_found(format!("Filter {} is not registered", id)))?;
        let output = filter.apply(frame, options)?;
        if output.width() != frame.width() || output.height() != frame.height() {
            return Err(ToolError::Surface(format!(
                "Filter {} returned a {}x{} frame for a {}x{} input",
                id,
                output.width(),
                output.height(),
                frame.width(),
                frame.height()
            )));
        }
        Ok(output)
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.filters.keys()).finish()
    }
}

fn option_f64(options: &FilterOptions, key: &str) -> Option<f64> {
    options.get(key).and_then(Value::as_f64)
}

/// Apply `f` to the RGB channels of every pixel, leaving alpha untouched.
fn map_rgb(frame: &ImageFrame, f: impl Fn([f64; 3]) -> [f64; 3]) -> Result<ImageFrame, ToolError> {
    let mut img = frame_to_rgba(frame)?;
    for pixel in img.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let out = f([r as f64, g as f64, b as f64]);
        for (channel, value) in pixel.0.iter_mut().zip(out) {
            *channel = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    rgba_to_frame(img)
}

fn grayscale(frame: &ImageFrame, _options: &FilterOptions) -> Result<ImageFrame, ToolError> {
    map_rgb(frame, |[r, g, b]| {
        let luma = r * 0.299 + g * 0.587 + b * 0.114;
        [luma, luma, luma]
    })
}

fn invert(frame: &ImageFrame, _options: &FilterOptions) -> Result<ImageFrame, ToolError> {
    map_rgb(frame, |[r, g, b]| [255.0 - r, 255.0 - g, 255.0 - b])
}

fn gaussian(img: &RgbaImage, radius: f64, sigma: Option<f64>) -> RgbaImage {
    let radius = radius.round().max(1.0);
    let sigma = sigma.unwrap_or(radius / 2.0).max(0.1);
    imageops::blur(img, sigma as f32)
}

fn blur(frame: &ImageFrame, options: &FilterOptions) -> Result<ImageFrame, ToolError> {
    let img = frame_to_rgba(frame)?;
    let radius = option_f64(options, "radius").unwrap_or(1.0);
    rgba_to_frame(gaussian(&img, radius, option_f64(options, "sigma")))
}

fn sharpen(frame: &ImageFrame, options: &FilterOptions) -> Result<ImageFrame, ToolError> {
    let amount = option_f64(options, "amount").unwrap_or(1.0);
    let radius = option_f64(options, "radius").unwrap_or(1.0);
    let threshold = option_f64(options, "threshold").unwrap_or(0.0);

    let mut img = frame_to_rgba(frame)?;
    let blurred = gaussian(&img, radius, None);
    for (pixel, soft) in img.pixels_mut().zip(blurred.pixels()) {
        let diff: Vec<f64> = (0..3)
            .map(|c| pixel.0[c] as f64 - soft.0[c] as f64)
            .collect();
        if diff.iter().any(|d| d.abs() > threshold) {
            for (c, d) in diff.iter().enumerate() {
                pixel.0[c] = (pixel.0[c] as f64 + amount * d).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    rgba_to_frame(img)
}

fn sepia(frame: &ImageFrame, options: &FilterOptions) -> Result<ImageFrame, ToolError> {
    let k = option_f64(options, "intensity").unwrap_or(1.0);
    map_rgb(frame, |[r, g, b]| {
        [
            r * (1.0 - 0.607 * k) + g * 0.769 * k + b * 0.189 * k,
            r * 0.349 * k + g * (1.0 - 0.314 * k) + b * 0.168 * k,
            r * 0.272 * k + g * 0.534 * k + b * (1.0 - 0.869 * k),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> ImageFrame {
        let pixels = rgba.repeat((width * height) as usize);
        ImageFrame::from_rgba(width, height, pixels).unwrap()
    }

    #[test]
    fn test_default_filters_registered() {
        let registry = FilterRegistry::with_defaults();
        assert_eq!(registry.ids(), vec!["blur", "grayscale", "invert", "sepia", "sharpen"]);
    }

    #[test]
    fn test_grayscale_keeps_alpha() {
        let registry = FilterRegistry::with_defaults();
        let out = registry
            .apply("grayscale", &solid(2, 2, [255, 0, 0, 100]), &FilterOptions::new())
            .unwrap();
        assert_eq!(out.pixel(0, 0), Some([76, 76, 76, 100]));
    }

    #[test]
    fn test_invert() {
        let registry = FilterRegistry::with_defaults();
        let out = registry
            .apply("invert", &solid(1, 1, [10, 20, 30, 255]), &FilterOptions::new())
            .unwrap();
        assert_eq!(out.pixel(0, 0), Some([245, 235, 225, 255]));
    }

    #[test]
    fn test_blur_of_uniform_image_is_unchanged() {
        let registry = FilterRegistry::with_defaults();
        let frame = solid(6, 6, [90, 90, 90, 255]);
        let mut options = FilterOptions::new();
        options.insert("radius".into(), json!(2));
        let out = registry.apply("blur", &frame, &options).unwrap();
        assert_eq!(out.width(), 6);
        assert_eq!(out.pixel(3, 3), Some([90, 90, 90, 255]));
    }

    #[test]
    fn test_sepia_zero_intensity_is_identity() {
        let registry = FilterRegistry::with_defaults();
        let frame = solid(1, 1, [12, 34, 56, 255]);
        let mut options = FilterOptions::new();
        options.insert("intensity".into(), json!(0.0));
        assert_eq!(registry.apply("sepia", &frame, &options).unwrap(), frame);
    }

    #[test]
    fn test_unknown_filter() {
        let registry = FilterRegistry::with_defaults();
        let err = registry
            .apply("posterize", &solid(1, 1, [0; 4]), &FilterOptions::new())
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn test_filter_changing_dimensions_is_rejected() {
        let mut registry = FilterRegistry::new();
        assert!(registry.register(
            "shrink",
            Arc::new(|_: &ImageFrame, _: &FilterOptions| {
                Ok::<_, ToolError>(ImageFrame::blank(1, 1))
            })
        ));
        assert!(!registry.register("shrink", Arc::new(invert)));

        let err = registry
            .apply("shrink", &solid(2, 2, [0; 4]), &FilterOptions::new())
            .unwrap_err();
        assert!(matches!(err, ToolError::Surface(_)));
    }
}
