//! # Goldfish Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories for tasks, credentials and course notes
//! - The shared HTTP client
//! - Canvas, Google Classroom and USTeP portal adapters
//! - Configuration loading from files and environment
//!
//! ## Architecture
//! - Implements traits defined in `goldfish-core`
//! - Depends on `goldfish-domain` and `goldfish-core`
//! - Contains all "impure" code (I/O, network)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;

// Re-export commonly used items
pub use database::*;
pub use errors::InfraError;
pub use http::*;
pub use integrations::*;
