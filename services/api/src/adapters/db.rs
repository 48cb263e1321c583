//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StorageService` port from the `core` crate. It handles all interactions
//! with the local SQLite database using `sqlx`.
//!
//! Sessions are stored as JSON documents keyed by id; settings, the streak and
//! the leaderboards live in a small key-value table.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use math_drill_core::domain::{LeaderboardEntry, QuestionResult, Session, Settings, Streak};
use math_drill_core::ports::{PortError, PortResult, StorageService};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

const SETTINGS_KEY: &str = "settings";
const STREAK_KEY: &str = "streak";
const LEADERBOARD_PREFIX: &str = "leaderboard:";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StorageService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn read_value<T: DeserializeOwned>(&self, key: &str) -> PortResult<Option<T>> {
        let record = sqlx::query_as::<_, KvRecord>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        record
            .map(|r| serde_json::from_str(&r.value))
            .transpose()
            .map_err(|e| PortError::Unexpected(format!("Corrupt value under '{}': {}", key, e)))
    }

    async fn write_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> PortResult<()> {
        let json = serde_json::to_string(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
        sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES (?, ?) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(json)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn write_session(&self, session: &Session) -> PortResult<()> {
        let payload = serde_json::to_string(session).map_err(|e| PortError::Unexpected(e.to_string()))?;
        sqlx::query(
            "INSERT INTO sessions (id, started_at, payload) VALUES (?, ?, ?) \
             ON CONFLICT (id) DO UPDATE SET payload = excluded.payload",
        )
        .bind(session.id.to_string())
        .bind(session.date.to_rfc3339_opts(SecondsFormat::Micros, true))
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SessionRecord {
    id: String,
    payload: String,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<Session> {
        serde_json::from_str(&self.payload)
            .map_err(|e| PortError::Unexpected(format!("Corrupt session {}: {}", self.id, e)))
    }
}

#[derive(FromRow)]
struct KvRecord {
    value: String,
}

//=========================================================================================
// `StorageService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StorageService for DbAdapter {
    async fn list_sessions(&self) -> PortResult<Vec<Session>> {
        let records = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, payload FROM sessions ORDER BY started_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>("SELECT id, payload FROM sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("Session {} not found", session_id)),
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn create_session(&self, session: &Session) -> PortResult<()> {
        self.write_session(session).await
    }

    async fn update_session(
        &self,
        session_id: Uuid,
        questions: Vec<QuestionResult>,
        total_time: f64,
        completed: bool,
    ) -> PortResult<Session> {
        let mut session = self.get_session(session_id).await?;
        session.record_progress(questions, total_time, completed, Utc::now());
        self.write_session(&session).await?;
        Ok(session)
    }

    async fn get_settings(&self) -> PortResult<Settings> {
        Ok(self.read_value(SETTINGS_KEY).await?.unwrap_or_default())
    }

    async fn save_settings(&self, settings: &Settings) -> PortResult<()> {
        self.write_value(SETTINGS_KEY, settings).await
    }

    async fn get_streak(&self) -> PortResult<Streak> {
        Ok(self.read_value(STREAK_KEY).await?.unwrap_or_default())
    }

    async fn save_streak(&self, streak: &Streak) -> PortResult<()> {
        self.write_value(STREAK_KEY, streak).await
    }

    async fn get_leaderboard(&self, key: &str) -> PortResult<Vec<LeaderboardEntry>> {
        let key = format!("{}{}", LEADERBOARD_PREFIX, key);
        Ok(self.read_value(&key).await?.unwrap_or_default())
    }

    async fn save_leaderboard(&self, key: &str, entries: &[LeaderboardEntry]) -> PortResult<()> {
        let key = format!("{}{}", LEADERBOARD_PREFIX, key);
        self.write_value(&key, entries).await
    }
}
