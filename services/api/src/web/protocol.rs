//! services/api/src/web/protocol.rs
//!
//! Request and response payloads exchanged between the game client and the API.
//! Domain values (questions, sessions, difficulty configs) travel in the same
//! JSON shape the client keeps in local storage.

use math_drill_core::domain::{
    DifficultyConfig, GameMode, LeaderboardEntry, QuestionResult, Settings,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

//=========================================================================================
// Questions
//=========================================================================================

/// Asks for the next question.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionRequest {
    /// A bare level such as `20`, or `{ "max": 20, "ops": ["+", "*"] }`.
    #[schema(value_type = Object)]
    pub config: DifficultyConfig,
    /// Questions answered so far in this game, oldest first.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub history: Vec<QuestionResult>,
    /// Overrides the server's repetition lookback.
    pub lookback: Option<usize>,
    /// `standard` or `detective`.
    #[serde(default)]
    #[schema(value_type = String)]
    pub mode: GameMode,
}

//=========================================================================================
// Sessions
//=========================================================================================

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[schema(value_type = Object)]
    pub difficulty: DifficultyConfig,
    #[serde(default)]
    #[schema(value_type = String)]
    pub mode: GameMode,
    #[serde(default)]
    pub device: Option<String>,
}

/// The client's latest view of a running or finished game.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    #[schema(value_type = Object)]
    pub questions: Vec<QuestionResult>,
    pub total_time: f64,
    #[serde(default)]
    pub completed: bool,
}

//=========================================================================================
// Settings
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPayload {
    pub question_count: u32,
    pub time_minutes: u32,
    #[serde(default)]
    pub dark_mode: bool,
}

impl From<Settings> for SettingsPayload {
    fn from(settings: Settings) -> Self {
        Self {
            question_count: settings.question_count,
            time_minutes: settings.time_minutes,
            dark_mode: settings.dark_mode,
        }
    }
}

impl From<SettingsPayload> for Settings {
    fn from(payload: SettingsPayload) -> Self {
        Self {
            question_count: payload.question_count,
            time_minutes: payload.time_minutes,
            dark_mode: payload.dark_mode,
        }
    }
}

//=========================================================================================
// Leaderboards
//=========================================================================================

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    #[schema(value_type = Object)]
    pub difficulty: DifficultyConfig,
    pub name: String,
    /// Total seconds for the game.
    pub time: u32,
    pub mistakes: u32,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreResponse {
    /// The leaderboard the score was submitted to.
    pub key: String,
    /// Whether the score earned a place.
    pub accepted: bool,
    #[schema(value_type = Object)]
    pub entries: Vec<LeaderboardEntry>,
}
