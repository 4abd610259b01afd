//! In-memory raster backend for the image editor
//!
//! [`RasterSurface`] implements the [`DrawableSurface`] port on top of an
//! `image::RgbaImage`; [`FilterRegistry`] holds the named pixel filters
//! `image.applyFilter` can run.
//!
//! [`DrawableSurface`]: inkframe_application::DrawableSurface

pub mod codec;
mod color;
pub mod filters;
pub mod raster;

pub use codec::ImageEncoding;
pub use filters::{FilterOptions, FilterRegistry, ImageFilter};
pub use raster::{RasterSurface, RasterSurfaceFactory};
