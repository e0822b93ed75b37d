//! Multi-source synchronization: orchestration and merging

pub mod merge;
pub mod orchestrator;

pub use merge::{plan_merge, MergeEngine, MergeOutcome, MergePlan};
pub use orchestrator::SyncOrchestrator;
