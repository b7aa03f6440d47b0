//! Browser-independent core of the segview DICOM viewer.
//!
//! Everything here is plain Rust so it can be unit tested natively: the
//! segmentation class visibility store, viewport interaction math, the
//! per-viewport load state machine, the DICOM JSON metadata model and the
//! capability trait through which an external image engine is driven.

pub mod config;
pub mod dicom_json;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod segmentation;
pub mod series;
pub mod types;
pub mod viewport;

pub use error::{ConfigError, EngineError, LoadError};
pub use types::{DicomImage, ViewId};
