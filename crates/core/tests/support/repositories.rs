use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use goldfish_core::{CredentialRepository, NoteRepository, TaskRepository};
use goldfish_domain::{
    AccessToken, CourseNote, GoldfishError, NoteUpdate, Result, Source, StoredCredential, Task,
    TaskChange, TaskKey, TaskStatus,
};
use tokio::sync::broadcast;

/// In-memory task collection that enforces the identity-key invariant.
pub struct InMemoryTaskRepository {
    tasks: Arc<Mutex<Vec<Task>>>,
    changes: broadcast::Sender<TaskChange>,
    fail_batches: AtomicBool,
    fail_source_ids: Mutex<HashSet<String>>,
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl InMemoryTaskRepository {
    pub fn new(seed: Vec<Task>) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            tasks: Arc::new(Mutex::new(seed)),
            changes,
            fail_batches: AtomicBool::new(false),
            fail_source_ids: Mutex::new(HashSet::new()),
        }
    }

    /// Make every `insert_batch` call fail.
    pub fn fail_batches(&self) {
        self.fail_batches.store(true, Ordering::SeqCst);
    }

    /// Make `insert_one` fail for tasks with this upstream id.
    pub fn fail_insert_of(&self, source_id: &str) {
        self.fail_source_ids.lock().unwrap().insert(source_id.to_string());
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().clone()
    }

    fn try_insert(&self, task: &Task) -> bool {
        let mut tasks = self.tasks.lock().unwrap();
        let key = task.key();
        let duplicate = key.is_some()
            && tasks.iter().any(|t| t.user_id == task.user_id && t.key() == key);
        if duplicate {
            return false;
        }
        tasks.push(task.clone());
        true
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        Ok(self.tasks.lock().unwrap().iter().filter(|t| t.user_id == user_id).cloned().collect())
    }

    async fn source_keys(&self, user_id: &str) -> Result<HashSet<TaskKey>> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .filter_map(Task::key)
            .collect())
    }

    async fn insert_batch(&self, tasks: Vec<Task>) -> Result<Vec<Task>> {
        if self.fail_batches.load(Ordering::SeqCst) {
            return Err(GoldfishError::Database("batch write rejected".into()));
        }
        let mut inserted = Vec::new();
        for task in tasks {
            if self.try_insert(&task) {
                let _ = self.changes.send(TaskChange::Inserted { task: task.clone() });
                inserted.push(task);
            }
        }
        Ok(inserted)
    }

    async fn insert_one(&self, task: Task) -> Result<bool> {
        if let Some(id) = &task.source_id {
            if self.fail_source_ids.lock().unwrap().contains(id) {
                return Err(GoldfishError::Database(format!("cannot write {id}")));
            }
        }
        let inserted = self.try_insert(&task);
        if inserted {
            let _ = self.changes.send(TaskChange::Inserted { task });
        }
        Ok(inserted)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<Task>> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.user_id == user_id && t.id == id)
            .cloned())
    }

    async fn update_status(
        &self,
        user_id: &str,
        id: &str,
        status: TaskStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Task> {
        let updated = {
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks
                .iter_mut()
                .find(|t| t.user_id == user_id && t.id == id)
                .ok_or_else(|| GoldfishError::NotFound(format!("task {id}")))?;
            task.status = status;
            task.updated_at = updated_at;
            task.clone()
        };
        let _ = self.changes.send(TaskChange::StatusChanged { task: updated.clone() });
        Ok(updated)
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool> {
        let removed = {
            let mut tasks = self.tasks.lock().unwrap();
            let before = tasks.len();
            tasks.retain(|t| !(t.user_id == user_id && t.id == id));
            before != tasks.len()
        };
        if removed {
            let _ = self
                .changes
                .send(TaskChange::Deleted { user_id: user_id.into(), id: id.into() });
        }
        Ok(removed)
    }

    async fn delete_many(&self, user_id: &str, ids: &[String]) -> Result<usize> {
        let mut count = 0;
        for id in ids {
            if self.delete(user_id, id).await? {
                count += 1;
            }
        }
        Ok(count)
    }

    fn subscribe(&self) -> broadcast::Receiver<TaskChange> {
        self.changes.subscribe()
    }
}

/// In-memory credential slots.
#[derive(Default)]
pub struct InMemoryCredentialRepository {
    slots: Mutex<HashMap<(String, Source), StoredCredential>>,
}

impl InMemoryCredentialRepository {
    pub fn with_token(self, user_id: &str, source: Source, token: &str) -> Self {
        let token = AccessToken::new(token).unwrap();
        self.slots
            .lock()
            .unwrap()
            .insert((user_id.to_string(), source), StoredCredential::Valid(token));
        self
    }

    pub fn stored(&self, user_id: &str, source: Source) -> StoredCredential {
        self.slots
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), source))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn load(&self, user_id: &str, source: Source) -> Result<StoredCredential> {
        Ok(self.stored(user_id, source))
    }

    async fn save(&self, user_id: &str, source: Source, token: &AccessToken) -> Result<()> {
        self.slots
            .lock()
            .unwrap()
            .insert((user_id.to_string(), source), StoredCredential::Valid(token.clone()));
        Ok(())
    }

    async fn tombstone(&self, user_id: &str, source: Source) -> Result<()> {
        self.slots
            .lock()
            .unwrap()
            .insert((user_id.to_string(), source), StoredCredential::Invalidated);
        Ok(())
    }
}

/// In-memory notes keyed by (user, course).
#[derive(Default)]
pub struct InMemoryNoteRepository {
    notes: Mutex<HashMap<(String, String), CourseNote>>,
}

#[async_trait]
impl NoteRepository for InMemoryNoteRepository {
    async fn get(&self, user_id: &str, course_id: &str) -> Result<Option<CourseNote>> {
        Ok(self.notes.lock().unwrap().get(&(user_id.into(), course_id.into())).cloned())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<CourseNote>> {
        Ok(self.notes.lock().unwrap().values().filter(|n| n.user_id == user_id).cloned().collect())
    }

    async fn upsert(
        &self,
        user_id: &str,
        course_id: &str,
        update: NoteUpdate,
        now: DateTime<Utc>,
    ) -> Result<CourseNote> {
        let mut notes = self.notes.lock().unwrap();
        let note = notes
            .entry((user_id.into(), course_id.into()))
            .and_modify(|note| {
                note.course_name = update.course_name.clone();
                note.content = update.content.clone();
                note.updated_at = now;
            })
            .or_insert_with(|| CourseNote {
                user_id: user_id.into(),
                course_id: course_id.into(),
                course_name: update.course_name.clone(),
                content: update.content.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(note.clone())
    }
}
