//! Configuration management for the OCR pipeline.
//!
//! This module provides the configuration error type, the validation trait
//! shared by every configuration struct, and the macros used to implement it.

pub mod derive;
pub mod errors;

pub use errors::{ConfigError, ConfigValidator};
