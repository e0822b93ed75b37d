//! Upstream learning platform integrations

pub mod canvas;
pub mod classroom;
pub mod factory;
pub mod portal;

pub use factory::{create_adapter, create_all_adapters};
