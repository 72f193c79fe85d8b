//! Error types for the Docdex library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`DocdexError`] enum. Fetch errors are retryable by the caller; format
//! errors are permanent (the same document will never parse differently).
//!
//! # Examples
//!
//! ```
//! use docdex::error::{DocdexError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(DocdexError::malformed("truncated record line"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Docdex operations.
///
/// This enum represents all possible errors that can occur in the Docdex
/// library. It uses the `thiserror` crate for automatic `Error` trait
/// implementation and provides convenient constructor methods for the
/// string-carrying variants.
#[derive(Error, Debug)]
pub enum DocdexError {
    /// I/O errors (filesystem access, store file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Network fetch failed. `status` is present for non-success HTTP
    /// responses and absent for transport-level failures.
    #[error("{}", fetch_display(.status, .message))]
    Fetch {
        /// HTTP status code, if the server responded at all.
        status: Option<u16>,
        /// Human-readable failure description.
        message: String,
    },

    /// The inventory document's first line is not a recognized format marker.
    #[error("Unsupported inventory format: {0}")]
    UnsupportedFormat(String),

    /// The inventory body could not be decoded after its format marker
    /// was recognized.
    #[error("Malformed inventory: {0}")]
    MalformedInventory(String),

    /// An inventory URL could not be parsed or normalized.
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    /// Store-file framing errors (bad magic, truncation, checksum mismatch).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Value (de)serialization errors from the store layer.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The global index references an inventory URL with no stored
    /// inventory entry. The store was mutated outside this library's
    /// contract.
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    /// JSON serialization/deserialization errors (CLI output).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

fn fetch_display(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Fetch error (status {code}): {message}"),
        None => format!("Fetch error: {message}"),
    }
}

/// Result type alias for operations that may fail with DocdexError.
pub type Result<T> = std::result::Result<T, DocdexError>;

impl DocdexError {
    /// Create a new fetch error with an HTTP status code.
    pub fn fetch_status<S: Into<String>>(status: u16, msg: S) -> Self {
        DocdexError::Fetch {
            status: Some(status),
            message: msg.into(),
        }
    }

    /// Create a new fetch error for a transport-level failure.
    pub fn fetch_transport<S: Into<String>>(msg: S) -> Self {
        DocdexError::Fetch {
            status: None,
            message: msg.into(),
        }
    }

    /// Create a new unsupported-format error.
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        DocdexError::UnsupportedFormat(msg.into())
    }

    /// Create a new malformed-inventory error.
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        DocdexError::MalformedInventory(msg.into())
    }

    /// Create a new malformed-URL error.
    pub fn malformed_url<S: Into<String>>(msg: S) -> Self {
        DocdexError::MalformedUrl(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        DocdexError::Storage(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        DocdexError::Serialization(msg.into())
    }

    /// Create a new corrupt-index error.
    pub fn corrupt_index<S: Into<String>>(msg: S) -> Self {
        DocdexError::CorruptIndex(msg.into())
    }
}
