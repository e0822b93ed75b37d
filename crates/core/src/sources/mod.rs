//! Source adapter contract

pub mod ports;
