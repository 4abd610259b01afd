//! Application-level configuration.
//!
//! - [`EditorParams`]: session defaults handed to tools and integrations
//!   (history length, layout grid, languages, extra comic terms)

pub mod editor_params;

pub use editor_params::EditorParams;
