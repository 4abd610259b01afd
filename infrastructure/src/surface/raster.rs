//! `image`-backed implementation of the drawing surface port

use super::color::parse_color;
use image::{RgbaImage, imageops};
use inkframe_application::ports::surface::{DrawOp, DrawableSurface, SurfaceFactory};
use inkframe_domain::{ImageFrame, ToolError};

pub(crate) fn frame_to_rgba(frame: &ImageFrame) -> Result<RgbaImage, ToolError> {
    RgbaImage::from_raw(frame.width(), frame.height(), frame.pixels().to_vec())
        .ok_or_else(|| ToolError::Surface("frame buffer does not match its dimensions".into()))
}

pub(crate) fn rgba_to_frame(image: RgbaImage) -> Result<ImageFrame, ToolError> {
    let (width, height) = image.dimensions();
    ImageFrame::from_rgba(width, height, image.into_raw())
        .ok_or_else(|| ToolError::Surface("raster buffer does not match its dimensions".into()))
}

/// Canvas-like drawing state.
#[derive(Debug, Clone)]
struct DrawState {
    fill: [u8; 4],
    stroke: [u8; 4],
    line_width: f64,
    global_alpha: f64,
    cursor: Option<(f64, f64)>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            fill: [0, 0, 0, 255],
            stroke: [0, 0, 0, 255],
            line_width: 1.0,
            global_alpha: 1.0,
            cursor: None,
        }
    }
}

/// RGBA raster held in memory.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
    state: DrawState,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            state: DrawState::default(),
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let alpha = (color[3] as f64 / 255.0) * self.state.global_alpha;
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        let dst_alpha = dst.0[3] as f64 / 255.0;
        let out_alpha = alpha + dst_alpha * (1.0 - alpha);
        if out_alpha <= 0.0 {
            dst.0 = [0, 0, 0, 0];
            return;
        }
        for c in 0..3 {
            let value = (color[c] as f64 * alpha + dst.0[c] as f64 * dst_alpha * (1.0 - alpha))
                / out_alpha;
            dst.0[c] = value.round().clamp(0.0, 255.0) as u8;
        }
        dst.0[3] = (out_alpha * 255.0).round() as u8;
    }

    /// Pixel span covered by `[start, start + len)`, clipped to `[0, limit)`.
    fn span(start: f64, len: f64, limit: u32) -> (i64, i64) {
        let (a, b) = if len < 0.0 { (start + len, start) } else { (start, start + len) };
        let lo = a.max(0.0).floor() as i64;
        let hi = b.min(limit as f64).ceil() as i64;
        (lo, hi)
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: [u8; 4]) {
        let (x0, x1) = Self::span(x, width, self.image.width());
        let (y0, y1) = Self::span(y, height, self.image.height());
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color);
            }
        }
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let (x0, x1) = Self::span(x, width, self.image.width());
        let (y0, y1) = Self::span(y, height, self.image.height());
        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px as u32, py as u32, image::Rgba([0, 0, 0, 0]));
            }
        }
    }

    /// Stroke a segment by stamping a square brush of the current line width.
    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let color = self.state.stroke;
        let half = (self.state.line_width.max(1.0) / 2.0).max(0.5);
        let length = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();
        let steps = (length * 2.0).ceil().max(1.0) as usize;

        let mut stamped = std::collections::HashSet::new();
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let cx = x1 + (x2 - x1) * t;
            let cy = y1 + (y2 - y1) * t;
            let (bx0, by0) = ((cx - half).floor() as i64, (cy - half).floor() as i64);
            let (bx1, by1) = ((cx + half).ceil() as i64, (cy + half).ceil() as i64);
            for py in by0..by1 {
                for px in bx0..bx1 {
                    // Blend each pixel once so alpha does not accumulate
                    if stamped.insert((px, py)) {
                        self.blend(px, py, color);
                    }
                }
            }
        }
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let (r, b) = (x + width, y + height);
        self.line(x, y, r, y);
        self.line(r, y, r, b);
        self.line(r, b, x, b);
        self.line(x, b, x, y);
    }

    fn set_color(target: &mut [u8; 4], color: &str) {
        match parse_color(color) {
            Some(parsed) => *target = parsed,
            None => tracing::warn!(color = %color, "Unrecognized colour, keeping previous style"),
        }
    }
}

impl DrawableSurface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn snapshot(&self) -> ImageFrame {
        let (width, height) = self.image.dimensions();
        ImageFrame::from_rgba(width, height, self.image.as_raw().clone())
            .unwrap_or_else(|| ImageFrame::blank(width, height))
    }

    fn load(&mut self, frame: &ImageFrame) {
        match frame_to_rgba(frame) {
            Ok(image) => self.image = image,
            Err(e) => tracing::error!(error = %e, "Could not load frame onto surface"),
        }
        self.state.cursor = None;
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), ToolError> {
        if width == 0 || height == 0 {
            return Err(ToolError::invalid_argument(format!(
                "Cannot resize to {}x{}",
                width, height
            )));
        }
        self.image = imageops::resize(&self.image, width, height, imageops::FilterType::Triangle);
        Ok(())
    }

    fn crop(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<(), ToolError> {
        let (w, h) = self.image.dimensions();
        if width == 0 || height == 0 || x + width > w || y + height > h {
            return Err(ToolError::Surface(format!(
                "Crop region {}x{} at ({}, {}) exceeds {}x{} canvas",
                width, height, x, y, w, h
            )));
        }
        self.image = imageops::crop_imm(&self.image, x, y, width, height).to_image();
        Ok(())
    }

    fn rotate(&mut self, degrees: f64) -> Result<(), ToolError> {
        if !degrees.is_finite() {
            return Err(ToolError::invalid_argument("Rotation angle must be finite"));
        }
        let (w, h) = (self.image.width() as f64, self.image.height() as f64);
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();

        // Tolerance keeps exact right angles from flooring one pixel short
        let new_w = (w * cos.abs() + h * sin.abs() + 1e-9).floor().max(1.0) as u32;
        let new_h = (w * sin.abs() + h * cos.abs() + 1e-9).floor().max(1.0) as u32;

        let (cx, cy) = (w / 2.0, h / 2.0);
        let (ncx, ncy) = (new_w as f64 / 2.0, new_h as f64 / 2.0);
        let mut rotated = RgbaImage::new(new_w, new_h);
        for (dx, dy, pixel) in rotated.enumerate_pixels_mut() {
            let rx = dx as f64 + 0.5 - ncx;
            let ry = dy as f64 + 0.5 - ncy;
            let sx = (rx * cos + ry * sin + cx).floor();
            let sy = (-rx * sin + ry * cos + cy).floor();
            if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
                *pixel = *self.image.get_pixel(sx as u32, sy as u32);
            }
        }
        self.image = rotated;
        Ok(())
    }

    fn flip(&mut self, horizontal: bool, vertical: bool) {
        if horizontal {
            imageops::flip_horizontal_in_place(&mut self.image);
        }
        if vertical {
            imageops::flip_vertical_in_place(&mut self.image);
        }
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            pixel.0 = [0, 0, 0, 0];
        }
    }

    fn region(&self, x: u32, y: u32, width: u32, height: u32) -> Option<ImageFrame> {
        let (w, h) = self.image.dimensions();
        if width == 0 || height == 0 || x + width > w || y + height > h {
            return None;
        }
        let view = imageops::crop_imm(&self.image, x, y, width, height).to_image();
        rgba_to_frame(view).ok()
    }

    fn blit(&mut self, frame: &ImageFrame, x: u32, y: u32) {
        match frame_to_rgba(frame) {
            Ok(top) => imageops::replace(&mut self.image, &top, x as i64, y as i64),
            Err(e) => tracing::error!(error = %e, "Could not blit frame"),
        }
    }

    fn draw(&mut self, op: &DrawOp) {
        match op {
            DrawOp::FillRect {
                x,
                y,
                width,
                height,
            } => {
                let fill = self.state.fill;
                self.fill_rect(*x, *y, *width, *height, fill);
            }
            DrawOp::StrokeRect {
                x,
                y,
                width,
                height,
            } => self.stroke_rect(*x, *y, *width, *height),
            DrawOp::ClearRect {
                x,
                y,
                width,
                height,
            } => self.clear_rect(*x, *y, *width, *height),
            DrawOp::MoveTo { x, y } => self.state.cursor = Some((*x, *y)),
            DrawOp::LineTo { x, y } => {
                let (fx, fy) = self.state.cursor.unwrap_or((*x, *y));
                self.line(fx, fy, *x, *y);
                self.state.cursor = Some((*x, *y));
            }
            DrawOp::Line { x1, y1, x2, y2 } => self.line(*x1, *y1, *x2, *y2),
            DrawOp::SetFillStyle { color } => Self::set_color(&mut self.state.fill, color),
            DrawOp::SetStrokeStyle { color } => Self::set_color(&mut self.state.stroke, color),
            DrawOp::SetLineWidth { width } => {
                if *width > 0.0 && width.is_finite() {
                    self.state.line_width = *width;
                }
            }
            DrawOp::SetGlobalAlpha { alpha } => {
                if alpha.is_finite() {
                    self.state.global_alpha = alpha.clamp(0.0, 1.0);
                }
            }
        }
    }
}

/// Hands out [`RasterSurface`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterSurfaceFactory;

impl SurfaceFactory for RasterSurfaceFactory {
    fn create_surface(&self, width: u32, height: u32) -> Box<dyn DrawableSurface> {
        Box::new(RasterSurface::new(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_with_marker() -> RasterSurface {
        // 4x2 canvas, red pixel at (0, 0)
        let mut surface = RasterSurface::new(4, 2);
        surface.draw(&DrawOp::SetFillStyle {
            color: "#ff0000".into(),
        });
        surface.draw(&DrawOp::FillRect {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        });
        surface
    }

    #[test]
    fn test_fill_rect_clips_to_canvas() {
        let mut surface = RasterSurface::new(3, 3);
        surface.draw(&DrawOp::FillRect {
            x: 1.0,
            y: 1.0,
            width: 10.0,
            height: 10.0,
        });
        let frame = surface.snapshot();
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(frame.pixel(2, 2), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_global_alpha_blends() {
        let mut surface = RasterSurface::new(1, 1);
        surface.draw(&DrawOp::SetFillStyle {
            color: "white".into(),
        });
        surface.draw(&DrawOp::SetGlobalAlpha { alpha: 0.5 });
        surface.draw(&DrawOp::FillRect {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        });
        assert_eq!(surface.snapshot().pixel(0, 0), Some([255, 255, 255, 128]));
    }

    #[test]
    fn test_line_and_path() {
        let mut surface = RasterSurface::new(5, 5);
        surface.draw(&DrawOp::MoveTo { x: 0.5, y: 2.5 });
        surface.draw(&DrawOp::LineTo { x: 4.5, y: 2.5 });
        let frame = surface.snapshot();
        for x in 0..5 {
            assert_eq!(frame.pixel(x, 2).unwrap()[3], 255);
        }
        assert_eq!(frame.pixel(2, 0).unwrap()[3], 0);
    }

    #[test]
    fn test_rotate_right_angle_swaps_dimensions() {
        let mut surface = surface_with_marker();
        surface.rotate(90.0).unwrap();
        assert_eq!((surface.width(), surface.height()), (2, 4));
        // Top-left corner ends up at the top-right after a clockwise turn
        assert_eq!(surface.snapshot().pixel(1, 0), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_rotate_bounding_box() {
        let mut surface = RasterSurface::new(10, 10);
        surface.rotate(45.0).unwrap();
        // floor(10·cos45 + 10·sin45) = floor(14.14)
        assert_eq!((surface.width(), surface.height()), (14, 14));
    }

    #[test]
    fn test_flip_and_crop() {
        let mut surface = surface_with_marker();
        surface.flip(true, false);
        assert_eq!(surface.snapshot().pixel(3, 0), Some([255, 0, 0, 255]));

        surface.crop(2, 0, 2, 1).unwrap();
        assert_eq!((surface.width(), surface.height()), (2, 1));
        assert_eq!(surface.snapshot().pixel(1, 0), Some([255, 0, 0, 255]));
        assert!(surface.crop(0, 0, 3, 1).is_err());
    }

    #[test]
    fn test_region_and_blit() {
        let mut surface = surface_with_marker();
        let copied = surface.region(0, 0, 1, 1).unwrap();
        surface.blit(&copied, 3, 1);
        assert_eq!(surface.snapshot().pixel(3, 1), Some([255, 0, 0, 255]));
        assert!(surface.region(3, 1, 2, 2).is_none());
    }

    #[test]
    fn test_resize_and_clear() {
        let mut surface = surface_with_marker();
        surface.resize(8, 4).unwrap();
        assert_eq!((surface.width(), surface.height()), (8, 4));
        assert!(surface.resize(0, 4).is_err());

        surface.clear();
        assert!(surface.snapshot().pixels().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_factory_creates_transparent_surface() {
        let surface = RasterSurfaceFactory.create_surface(2, 3);
        assert_eq!((surface.width(), surface.height()), (2, 3));
        assert_eq!(surface.snapshot(), ImageFrame::blank(2, 3));
    }
}
