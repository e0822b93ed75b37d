//! # Goldfish Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for source adapters and storage
//! - The credential store with its needs-credential signal
//! - The merge engine and sync orchestrator
//! - Task listing, editing and grouping use cases
//!
//! ## Architecture Principles
//! - Only depends on `goldfish-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod credentials;
pub mod sources;
pub mod sync;
pub mod tasks;

pub use credentials::ports::CredentialRepository;
pub use credentials::CredentialStore;
pub use sources::ports::{require_credential, SourceAdapter};
pub use sync::{plan_merge, MergeEngine, MergeOutcome, MergePlan, SyncOrchestrator};
pub use tasks::ports::{NoteRepository, TaskRepository};
pub use tasks::{ListQuery, TaskService};
