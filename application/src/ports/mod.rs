//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod event_logger;
pub mod ocr_processor;
pub mod spell_checker;
pub mod surface;
pub mod translation_processor;
