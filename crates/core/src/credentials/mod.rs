//! Per-user, per-source credential management

pub mod ports;
pub mod store;

pub use store::CredentialStore;
