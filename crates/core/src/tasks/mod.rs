//! Task storage ports and user-facing task operations

pub mod ports;
pub mod service;

pub use service::{apply_view, group_by_course, ListQuery, TaskService};
