//! Typed error definitions for the tickcast system.
//!
//! Provides [`TickcastError`] for domain-specific errors that are more
//! informative than plain `anyhow::Error` strings. All variants implement
//! `std::error::Error` via `thiserror`, so they integrate seamlessly with
//! `anyhow::Result` at the application boundary.

use thiserror::Error;

/// Domain-specific errors for the tickcast system.
#[derive(Debug, Error)]
pub enum TickcastError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Socket creation, bind, listen, or group-membership error.
    #[error("socket error: {0}")]
    Socket(String),

    /// Malformed wire data (wrong length, bad framing).
    #[error("wire error: {0}")]
    Wire(String),
}
