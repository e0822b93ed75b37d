//! Domain types and models

pub mod credential;
pub mod note;
pub mod source;
pub mod sync;
pub mod task;
pub mod view;

pub use credential::{AccessToken, CredentialState, CredentialStatus, StoredCredential};
pub use note::{CourseNote, NoteUpdate};
pub use source::{Platform, Source};
pub use sync::{
    MergeCounts, MergeReport, SourceStatus, SourceSyncResult, SyncOptions, SyncSummary,
};
pub use task::{NewManualTask, Task, TaskCandidate, TaskChange, TaskKey, TaskStatus};
pub use view::{ArchiveWindow, CourseGroup, TaskView};
