//! crates/math_drill_core/src/gamification.rs
//!
//! Daily streaks and per-difficulty leaderboards.

use chrono::NaiveDate;
use crate::domain::{DifficultyConfig, LeaderboardEntry, Streak};

/// Number of entries kept on each leaderboard.
pub const LEADERBOARD_SIZE: usize = 5;

impl Streak {
    /// Records a completed game on `today`.
    ///
    /// Playing twice on the same day leaves the streak unchanged, playing on
    /// the day after the last game extends it, and any longer gap restarts it at 1.
    pub fn record_play(&self, today: NaiveDate) -> Streak {
        if self.last_played_date == Some(today) {
            return self.clone();
        }

        let continues = self
            .last_played_date
            .and_then(|last| last.succ_opt())
            .is_some_and(|next| next == today);
        let current_streak = if continues { self.current_streak + 1 } else { 1 };

        Streak {
            current_streak,
            max_streak: self.max_streak.max(current_streak),
            last_played_date: Some(today),
        }
    }
}

/// The leaderboard key of a difficulty: `"20"` for a plain level, and
/// `"custom-30-mul-div"` style keys when the operator set was chosen explicitly.
/// Operators appear in `+ - * /` order whatever order they were picked in.
pub fn difficulty_key(config: &DifficultyConfig) -> String {
    let config = config.normalized();
    if config.has_default_ops() {
        config.max.to_string()
    } else {
        let mut ops = config.ops.clone();
        ops.sort();
        let ops: Vec<&str> = ops.iter().map(|op| op.code()).collect();
        format!("custom-{}-{}", config.max, ops.join("-"))
    }
}

/// Top scores for one difficulty, fastest first, fewer mistakes breaking ties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new(mut entries: Vec<LeaderboardEntry>) -> Self {
        entries.sort_by_key(|e| (e.time, e.mistakes));
        entries.truncate(LEADERBOARD_SIZE);
        Self { entries }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LeaderboardEntry> {
        self.entries
    }

    /// Whether a finished game with this result earns a place.
    pub fn qualifies(&self, time: u32, mistakes: u32) -> bool {
        if self.entries.len() < LEADERBOARD_SIZE {
            return true;
        }
        match self.entries.last() {
            Some(worst) => time < worst.time || (time == worst.time && mistakes < worst.mistakes),
            None => true,
        }
    }

    /// Inserts the entry if it qualifies. Returns whether it was kept.
    pub fn insert(&mut self, entry: LeaderboardEntry) -> bool {
        if !self.qualifies(entry.time, entry.mistakes) {
            return false;
        }
        let position = self
            .entries
            .iter()
            .position(|e| (entry.time, entry.mistakes) < (e.time, e.mistakes))
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
        self.entries.truncate(LEADERBOARD_SIZE);
        true
    }
}
