//! services/api/src/adapters/memory.rs
//!
//! A process-local implementation of the `StorageService` port. Nothing is
//! persisted; used by the integration tests and handy for demos.

use async_trait::async_trait;
use chrono::Utc;
use math_drill_core::domain::{LeaderboardEntry, QuestionResult, Session, Settings, Streak};
use math_drill_core::ports::{PortError, PortResult, StorageService};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryStorage {
    sessions: RwLock<Vec<Session>>,
    settings: RwLock<Settings>,
    streak: RwLock<Streak>,
    leaderboards: RwLock<HashMap<String, Vec<LeaderboardEntry>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `sessions`.
    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        Self {
            sessions: RwLock::new(sessions),
            ..Self::default()
        }
    }
}

#[async_trait]
impl StorageService for InMemoryStorage {
    async fn list_sessions(&self) -> PortResult<Vec<Session>> {
        let mut sessions = self.sessions.read().await.clone();
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(sessions)
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session> {
        self.sessions
            .read()
            .await
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    async fn create_session(&self, session: &Session) -> PortResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|s| s.id != session.id);
        sessions.push(session.clone());
        Ok(())
    }

    async fn update_session(
        &self,
        session_id: Uuid,
        questions: Vec<QuestionResult>,
        total_time: f64,
        completed: bool,
    ) -> PortResult<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;
        session.record_progress(questions, total_time, completed, Utc::now());
        Ok(session.clone())
    }

    async fn get_settings(&self) -> PortResult<Settings> {
        Ok(self.settings.read().await.clone())
    }

    async fn save_settings(&self, settings: &Settings) -> PortResult<()> {
        *self.settings.write().await = settings.clone();
        Ok(())
    }

    async fn get_streak(&self) -> PortResult<Streak> {
        Ok(self.streak.read().await.clone())
    }

    async fn save_streak(&self, streak: &Streak) -> PortResult<()> {
        *self.streak.write().await = streak.clone();
        Ok(())
    }

    async fn get_leaderboard(&self, key: &str) -> PortResult<Vec<LeaderboardEntry>> {
        Ok(self.leaderboards.read().await.get(key).cloned().unwrap_or_default())
    }

    async fn save_leaderboard(&self, key: &str, entries: &[LeaderboardEntry]) -> PortResult<()> {
        self.leaderboards
            .write()
            .await
            .insert(key.to_string(), entries.to_vec());
        Ok(())
    }
}
