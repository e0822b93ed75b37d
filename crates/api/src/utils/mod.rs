//! Cross-cutting helpers for the HTTP layer

pub mod cors;
pub mod health;
pub mod logging;
