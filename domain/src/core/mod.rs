//! Core domain types shared by every editor component

pub mod error;
pub mod geometry;
pub mod image;
