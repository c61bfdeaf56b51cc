//! # Printer Module
//!
//! This module provides the emulated printer's physical characteristics.
//!
//! ## Modules
//!
//! - [`config`]: Paper widths and characters per line

pub mod config;

pub use config::Paper;
