//! Document content model and per-document tracking state.
//!
//! This module provides:
//! - `split_lines` for turning a full-text snapshot into ordered lines
//! - `BaselineCache` for the last-known content of each tracked document

mod baseline;
mod content;

pub use baseline::BaselineCache;
pub use content::split_lines;
