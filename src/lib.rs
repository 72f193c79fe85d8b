//! # Docdex
//!
//! A documentation symbol inventory cache and resolver for Rust.
//!
//! Docdex fetches the symbol-inventory files published by documentation
//! generators, merges every fetched inventory into a persistent global
//! name index, and answers "where is symbol X documented?" queries
//! against the merged index.
//!
//! ## Features
//!
//! - Both published inventory wire formats (plain text and zlib-compressed)
//! - Idempotent source registration: re-adding a known URL is a no-op
//! - A crash-safe snapshot store holding cached inventories and the index
//! - Lazy lookup: candidate inventories load only as results are pulled

pub mod cache;
pub mod cli;
pub mod error;
pub mod fetch;
pub mod inventory;
pub mod parser;
pub mod paths;
pub mod store;

pub mod prelude {
    pub use crate::cache::DocInventory;
    pub use crate::error::{DocdexError, Result};
    pub use crate::inventory::Topic;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
