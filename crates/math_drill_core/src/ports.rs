//! crates/math_drill_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! Randomness and storage are passed in explicitly so that the generator and
//! the analysis stay free of ambient global state.

use async_trait::async_trait;
use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use uuid::Uuid;
use crate::domain::{LeaderboardEntry, QuestionResult, Session, Settings, Streak};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., the database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Random Source
//=========================================================================================

/// Source of randomness for question generation.
pub trait RandomSource {
    /// Uniform integer in the inclusive range `[low, high]`. Callers guarantee `low <= high`.
    fn int_in_range(&mut self, low: u32, high: u32) -> u32;

    /// Uniform float in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Picks one element of a non-empty slice.
    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T
    where
        Self: Sized,
    {
        let last = items.len().saturating_sub(1) as u32;
        &items[self.int_in_range(0, last) as usize]
    }
}

/// Thread-local RNG, for production use.
pub struct ThreadRandom(ThreadRng);

impl ThreadRandom {
    pub fn new() -> Self {
        Self(rand::rng())
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn int_in_range(&mut self, low: u32, high: u32) -> u32 {
        self.0.random_range(low..=high)
    }

    fn unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

/// Deterministic RNG seeded from a `u64`, for reproducible tests and replays.
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn int_in_range(&mut self, low: u32, high: u32) -> u32 {
        self.0.random_range(low..=high)
    }

    fn unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

//=========================================================================================
// Storage Port
//=========================================================================================

/// The persistent key-value store behind the game: sessions, settings,
/// streak and per-difficulty leaderboards.
#[async_trait]
pub trait StorageService: Send + Sync {
    // --- Sessions ---
    /// All stored sessions, newest first.
    async fn list_sessions(&self) -> PortResult<Vec<Session>>;

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session>;

    async fn create_session(&self, session: &Session) -> PortResult<()>;

    /// Replaces the question log and timing of an existing session.
    async fn update_session(
        &self,
        session_id: Uuid,
        questions: Vec<QuestionResult>,
        total_time: f64,
        completed: bool,
    ) -> PortResult<Session>;

    // --- Player Profile ---
    async fn get_settings(&self) -> PortResult<Settings>;

    async fn save_settings(&self, settings: &Settings) -> PortResult<()>;

    async fn get_streak(&self) -> PortResult<Streak>;

    async fn save_streak(&self, streak: &Streak) -> PortResult<()>;

    // --- Leaderboards ---
    async fn get_leaderboard(&self, key: &str) -> PortResult<Vec<LeaderboardEntry>>;

    async fn save_leaderboard(&self, key: &str, entries: &[LeaderboardEntry]) -> PortResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sources_repeat() {
        let mut a = SeededRandom::new(7);
        let mut b = SeededRandom::new(7);
        for _ in 0..100 {
            assert_eq!(a.int_in_range(1, 50), b.int_in_range(1, 50));
        }
    }

    #[test]
    fn ranges_are_inclusive() {
        let mut rng = SeededRandom::new(1);
        let mut seen = [false; 3];
        for _ in 0..500 {
            let v = rng.int_in_range(2, 4);
            assert!((2..=4).contains(&v));
            seen[(v - 2) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(rng.int_in_range(5, 5), 5);
    }
}
