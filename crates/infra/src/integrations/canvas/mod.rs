//! Canvas LMS integration

pub mod adapter;
pub mod client;
pub mod types;

pub use adapter::{CanvasAdapter, CanvasMode};
pub use client::CanvasClient;
pub use types::{CanvasAssignment, CanvasCourse};
