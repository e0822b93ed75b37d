//! Pure helper functions shared across the domain

pub mod text;
