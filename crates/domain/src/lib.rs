//! # Goldfish Domain
//!
//! Business domain types and models for Goldfish.
//!
//! This crate contains:
//! - The unified task model and its identity key
//! - Credential, sync report and course note types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Text normalization helpers shared by every source adapter
//!
//! ## Architecture
//! - No dependencies on other Goldfish crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::text::{excerpt, strip_html, truncate_with_ellipsis};
