//! Shared test helpers for `goldfish-core` integration tests.
//!
//! In-memory implementations of the storage ports and scripted source
//! adapters, so sync tests can focus on behaviour instead of I/O.

#![allow(dead_code)]

pub mod adapters;
pub mod repositories;

use goldfish_domain::{Source, TaskCandidate, TaskStatus};

/// Minimal candidate for `source` with the given upstream id.
pub fn candidate(source: Source, source_id: &str) -> TaskCandidate {
    TaskCandidate {
        title: format!("{source} assignment {source_id}"),
        platform: source.platform(),
        source,
        source_id: source_id.to_string(),
        course_name: "Course".into(),
        course_code: None,
        due_date: None,
        status: TaskStatus::Pending,
        original_link: None,
        description: String::new(),
    }
}
