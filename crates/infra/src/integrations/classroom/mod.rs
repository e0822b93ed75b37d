//! Google Classroom integration

pub mod adapter;
pub mod types;

pub use adapter::ClassroomAdapter;
