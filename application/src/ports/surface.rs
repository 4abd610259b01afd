//! Drawing surface port
//!
//! The image editor never touches pixels directly. It drives a
//! [`DrawableSurface`] obtained from an injected [`SurfaceFactory`], so the
//! raster backend can be swapped (in-memory for the CLI and tests, a GPU
//! canvas in a host application).
//!
//! # Draw operations
//!
//! Drawing commands arrive as JSON objects tagged by `op`:
//!
//! ```json
//! {"op": "setFillStyle", "color": "#ff0000"}
//! {"op": "fillRect", "x": 10, "y": 10, "width": 20, "height": 5}
//! {"op": "line", "x1": 0, "y1": 0, "x2": 40, "y2": 40}
//! ```

use inkframe_domain::{ImageFrame, ToolError};
use serde::{Deserialize, Serialize};

/// A single canvas-style drawing instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    StrokeRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    ClearRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    SetFillStyle {
        color: String,
    },
    SetStrokeStyle {
        color: String,
    },
    SetLineWidth {
        width: f64,
    },
    SetGlobalAlpha {
        alpha: f64,
    },
}

/// Mutable raster the image editor draws on.
///
/// Coordinates are pixels with the origin at the top-left corner.
/// Operations that would leave the canvas are clipped, never rejected.
pub trait DrawableSurface: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Copy of the current pixels.
    fn snapshot(&self) -> ImageFrame;

    /// Replace the surface content (and dimensions) with `frame`.
    fn load(&mut self, frame: &ImageFrame);

    /// Scale the content to the new dimensions.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), ToolError>;

    /// Keep only the given region; the surface takes the region's size.
    fn crop(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<(), ToolError>;

    /// Rotate about the centre, growing the canvas to the rotated bounding box.
    fn rotate(&mut self, degrees: f64) -> Result<(), ToolError>;

    fn flip(&mut self, horizontal: bool, vertical: bool);

    /// Make every pixel transparent.
    fn clear(&mut self);

    /// Copy of a region, or `None` when it lies outside the canvas.
    fn region(&self, x: u32, y: u32, width: u32, height: u32) -> Option<ImageFrame>;

    /// Paste `frame` with its top-left corner at `(x, y)`.
    fn blit(&mut self, frame: &ImageFrame, x: u32, y: u32);

    fn draw(&mut self, op: &DrawOp);
}

/// Creates surfaces for the image editor.
pub trait SurfaceFactory: Send + Sync {
    fn create_surface(&self, width: u32, height: u32) -> Box<dyn DrawableSurface>;
}
