//! Credential persistence in the `user_profiles` table
//!
//! Each source owns a token column and a state column. An invalidated
//! credential keeps its row with a `NULL` token and state `invalid`, which
//! is distinct from a slot that was never set.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use goldfish_core::CredentialRepository;
use goldfish_domain::{
    AccessToken, CredentialState, GoldfishError, Result, Source, StoredCredential,
};
use rusqlite::{params, OptionalExtension};
use tokio::task;
use tracing::{info, instrument};

use super::format_timestamp;
use super::manager::{map_join_error, map_sql_error, DbManager};

/// `(token column, state column)` for a source.
fn columns(source: Source) -> Result<(&'static str, &'static str)> {
    match source {
        Source::Canvas => Ok(("canvas_token", "canvas_state")),
        Source::GoogleClassroom => Ok(("google_access_token", "google_state")),
        Source::Ustep => Ok(("ustep_token", "ustep_state")),
        Source::Manual => {
            Err(GoldfishError::InvalidInput("manual tasks have no credential".into()))
        }
    }
}

/// Credential repository over the shared [`DbManager`].
pub struct SqliteCredentialRepository {
    db: Arc<DbManager>,
}

impl SqliteCredentialRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    async fn write_slot(
        &self,
        user_id: &str,
        source: Source,
        token: Option<String>,
        state: CredentialState,
    ) -> Result<()> {
        let (token_col, state_col) = columns(source)?;
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let sql = format!(
                "INSERT INTO user_profiles (user_id, {token_col}, {state_col}, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                     {token_col} = excluded.{token_col},
                     {state_col} = excluded.{state_col},
                     updated_at = excluded.updated_at"
            );
            conn.execute(
                &sql,
                params![&user_id, token, state.to_string(), format_timestamp(&Utc::now())],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl CredentialRepository for SqliteCredentialRepository {
    async fn load(&self, user_id: &str, source: Source) -> Result<StoredCredential> {
        let (token_col, state_col) = columns(source)?;
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<StoredCredential> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {token_col}, {state_col} FROM user_profiles WHERE user_id = ?1");
            let row: Option<(Option<String>, String)> = conn
                .query_row(&sql, params![&user_id], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()
                .map_err(map_sql_error)?;

            let Some((token, state)) = row else {
                return Ok(StoredCredential::Absent);
            };
            let state = state.parse::<CredentialState>().map_err(GoldfishError::Database)?;
            Ok(match state {
                CredentialState::Invalid => StoredCredential::Invalidated,
                CredentialState::Valid => {
                    token.and_then(AccessToken::new).map_or(StoredCredential::Absent, StoredCredential::Valid)
                }
                CredentialState::Absent => StoredCredential::Absent,
            })
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self, token))]
    async fn save(&self, user_id: &str, source: Source, token: &AccessToken) -> Result<()> {
        self.write_slot(user_id, source, Some(token.expose().to_string()), CredentialState::Valid)
            .await
    }

    #[instrument(skip(self))]
    async fn tombstone(&self, user_id: &str, source: Source) -> Result<()> {
        self.write_slot(user_id, source, None, CredentialState::Invalid).await?;
        info!(user_id, %source, "credential tombstoned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn setup_test_db() -> (SqliteCredentialRepository, TempDir) {
        let temp_dir = TempDir::new().expect("create temp dir");
        let manager = DbManager::new(temp_dir.path().join("test.db"), 2).expect("create db manager");
        manager.run_migrations().expect("run migrations");
        (SqliteCredentialRepository::new(Arc::new(manager)), temp_dir)
    }

    #[tokio::test]
    async fn unknown_user_has_absent_slots() {
        let (repo, _dir) = setup_test_db();
        assert_eq!(repo.load("u", Source::Canvas).await.unwrap(), StoredCredential::Absent);
    }

    #[tokio::test]
    async fn slots_are_independent_per_source() {
        let (repo, _dir) = setup_test_db();
        let canvas = AccessToken::new("canvas-secret").unwrap();
        repo.save("u", Source::Canvas, &canvas).await.unwrap();
        repo.save("u", Source::Ustep, &AccessToken::new("portal").unwrap()).await.unwrap();

        assert_eq!(repo.load("u", Source::Canvas).await.unwrap(), StoredCredential::Valid(canvas));
        assert_eq!(
            repo.load("u", Source::GoogleClassroom).await.unwrap(),
            StoredCredential::Absent
        );
    }

    #[tokio::test]
    async fn tombstone_then_save_restores_validity() {
        let (repo, _dir) = setup_test_db();
        let token = AccessToken::new("one").unwrap();
        repo.save("u", Source::Ustep, &token).await.unwrap();

        repo.tombstone("u", Source::Ustep).await.unwrap();
        assert_eq!(repo.load("u", Source::Ustep).await.unwrap(), StoredCredential::Invalidated);

        let fresh = AccessToken::new("two").unwrap();
        repo.save("u", Source::Ustep, &fresh).await.unwrap();
        assert_eq!(repo.load("u", Source::Ustep).await.unwrap(), StoredCredential::Valid(fresh));
    }

    #[tokio::test]
    async fn manual_source_is_rejected() {
        let (repo, _dir) = setup_test_db();
        assert!(matches!(
            repo.load("u", Source::Manual).await,
            Err(GoldfishError::InvalidInput(_))
        ));
    }
}
