//! # Error Types
//!
//! This module defines error types used throughout the recibo library.
//!
//! Malformed printer input is never an error: the decoder reports it as
//! [`Event::Unsupported`](crate::protocol::Event::Unsupported) and keeps going.
//! The variants below cover the things that can actually stop a connection or
//! the process.

use thiserror::Error;

/// Main error type for recibo operations
#[derive(Debug, Error)]
pub enum ReciboError {
    /// Transport-level errors (bind, accept, socket failures)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid configuration value or config file
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
