//! Common types and utilities shared across the promo tweeter crates.
//!
//! This crate defines the shared error type and the observability helpers
//! used throughout the workspace. It is intentionally lightweight so that
//! every crate can depend on it without pulling in the HTTP or runtime stack.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`PromoError`] and [`Result`]: Shared error handling
//! - [`APP_NAME`] / [`VERSION`]: identity used in logs, file names and `--version`
//!
//! # Examples
//!
//! ```rust
//! use promo_common::{PromoError, Result};
//!
//! fn require(value: &str) -> Result<&str> {
//!     if value.trim().is_empty() {
//!         return Err(PromoError::Config("value is blank".into()));
//!     }
//!     Ok(value)
//! }
//!
//! assert!(require("  ").is_err());
//! assert_eq!(require("ok").unwrap(), "ok");
//! ```

pub mod observability;

/// Binary name; also the stem of the log file.
pub const APP_NAME: &str = "bsky-promo-tweeter";

/// Human readable product name used in banners.
pub const DISPLAY_NAME: &str = "Bluesky Twitter Bot";

/// Workspace version, shared by every crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types used across the promo tweeter.
#[derive(thiserror::Error, Debug)]
pub enum PromoError {
    /// Configuration was missing, malformed or incomplete.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging could not be initialised.
    #[error("Logging error: {0}")]
    Logging(String),
}

/// Convenient alias for results that use [`PromoError`].
pub type Result<T> = std::result::Result<T, PromoError>;
