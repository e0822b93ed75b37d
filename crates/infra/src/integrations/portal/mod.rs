//! USTeP portal (Moodle web services) integration

pub mod adapter;
pub mod client;
pub mod types;

pub use adapter::PortalAdapter;
pub use client::PortalClient;
pub use types::PortalAssignment;
