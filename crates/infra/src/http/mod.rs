//! Shared HTTP client for upstream APIs

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
