//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    protocol::{
        CreateSessionRequest, GenerateQuestionRequest, SettingsPayload, SubmitScoreRequest,
        SubmitScoreResponse, UpdateSessionRequest,
    },
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use math_drill_core::{
    difficulty_key,
    domain::{LeaderboardEntry, Session},
    ports::PortError,
    Leaderboard, ThreadRandom,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_question_handler,
        list_sessions_handler,
        create_session_handler,
        get_session_handler,
        update_session_handler,
        recommendation_handler,
        get_settings_handler,
        save_settings_handler,
        get_streak_handler,
        record_play_handler,
        get_leaderboard_handler,
        submit_score_handler,
    ),
    components(
        schemas(
            GenerateQuestionRequest,
            CreateSessionRequest,
            UpdateSessionRequest,
            SettingsPayload,
            SubmitScoreRequest,
            SubmitScoreResponse,
        )
    ),
    tags(
        (name = "Math Drill API", description = "Question generation, play history and the smart trainer.")
    )
)]
pub struct ApiDoc;

type HandlerError = (StatusCode, String);

/// Maps a storage failure to a response, logging anything that is not a plain miss.
fn port_failure(action: &str, e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        other => {
            error!("Failed to {}: {:?}", action, other);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to {}", action))
        }
    }
}

//=========================================================================================
// Questions
//=========================================================================================

/// Generate the next question.
///
/// Never fails for a well-formed body: malformed difficulty settings are
/// clamped and an exhausted search still yields a valid question.
#[utoipa::path(
    post,
    path = "/questions",
    request_body = GenerateQuestionRequest,
    responses(
        (status = 200, description = "A freshly generated question"),
        (status = 422, description = "The body could not be parsed")
    )
)]
pub async fn generate_question_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<GenerateQuestionRequest>,
) -> impl IntoResponse {
    if !req.config.is_normalized() {
        warn!(config = %req.config, "clamping malformed difficulty config");
    }
    let lookback = req.lookback.unwrap_or(app_state.config.history_lookback);

    let mut rng = ThreadRandom::new();
    let question = app_state
        .generator
        .generate(&req.config, &req.history, lookback, req.mode, &mut rng);
    debug!(question = %question.display, "generated question");

    Json(question)
}

//=========================================================================================
// Sessions
//=========================================================================================

/// List all stored sessions, newest first.
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Stored sessions"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_sessions_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let sessions = app_state
        .store
        .list_sessions()
        .await
        .map_err(|e| port_failure("list sessions", e))?;
    Ok(Json(sessions))
}

/// Start a new play session.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created successfully"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_session_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let device = req.device.unwrap_or_else(|| "unknown".to_string());
    let session = Session::start(req.difficulty.normalized(), req.mode, device, Utc::now());

    app_state
        .store
        .create_session(&session)
        .await
        .map_err(|e| port_failure("create session", e))?;
    info!(session_id = %session.id, difficulty = %session.difficulty, "session started");

    Ok((StatusCode::CREATED, Json(session)))
}

/// Fetch one session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "The session id")),
    responses(
        (status = 200, description = "The session"),
        (status = 404, description = "No such session")
    )
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = app_state
        .store
        .get_session(session_id)
        .await
        .map_err(|e| port_failure("load session", e))?;
    Ok(Json(session))
}

/// Save the progress of a session.
#[utoipa::path(
    put,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "The session id")),
    request_body = UpdateSessionRequest,
    responses(
        (status = 200, description = "The updated session"),
        (status = 404, description = "No such session")
    )
)]
pub async fn update_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = app_state
        .store
        .update_session(session_id, req.questions, req.total_time, req.completed)
        .await
        .map_err(|e| port_failure("update session", e))?;

    if session.completed {
        info!(
            session_id = %session.id,
            questions = session.questions.len(),
            mistakes = session.mistakes(),
            "session completed"
        );
    }
    Ok(Json(session))
}

//=========================================================================================
// Smart Trainer
//=========================================================================================

/// Analyze recent sessions and suggest a practice drill.
#[utoipa::path(
    get,
    path = "/recommendation",
    responses(
        (status = 200, description = "A practice recommendation"),
        (status = 204, description = "Not enough recent play to recommend anything"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn recommendation_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Response, HandlerError> {
    let sessions = app_state
        .store
        .list_sessions()
        .await
        .map_err(|e| port_failure("list sessions", e))?;

    match app_state.analyzer.analyze(&sessions, Utc::now()) {
        Some(recommendation) => {
            debug!(id = %recommendation.id, "recommendation ready");
            Ok(Json(recommendation).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

//=========================================================================================
// Player Profile
//=========================================================================================

#[utoipa::path(
    get,
    path = "/settings",
    responses((status = 200, description = "Current settings", body = SettingsPayload))
)]
pub async fn get_settings_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let settings = app_state
        .store
        .get_settings()
        .await
        .map_err(|e| port_failure("load settings", e))?;
    Ok(Json(SettingsPayload::from(settings)))
}

#[utoipa::path(
    put,
    path = "/settings",
    request_body = SettingsPayload,
    responses(
        (status = 200, description = "Settings saved", body = SettingsPayload),
        (status = 400, description = "Invalid settings")
    )
)]
pub async fn save_settings_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SettingsPayload>,
) -> Result<impl IntoResponse, HandlerError> {
    if payload.question_count == 0 || payload.time_minutes == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "questionCount and timeMinutes must be positive".to_string(),
        ));
    }
    app_state
        .store
        .save_settings(&payload.into())
        .await
        .map_err(|e| port_failure("save settings", e))?;
    get_settings_handler(State(app_state)).await
}

/// Current daily streak.
#[utoipa::path(
    get,
    path = "/streak",
    responses((status = 200, description = "The streak"))
)]
pub async fn get_streak_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let streak = app_state
        .store
        .get_streak()
        .await
        .map_err(|e| port_failure("load streak", e))?;
    Ok(Json(streak))
}

/// Record a completed game today and return the updated streak.
#[utoipa::path(
    post,
    path = "/streak",
    responses((status = 200, description = "The updated streak"))
)]
pub async fn record_play_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let _guard = app_state.profile_writes.lock().await;
    let current = app_state
        .store
        .get_streak()
        .await
        .map_err(|e| port_failure("load streak", e))?;

    let updated = current.record_play(Utc::now().date_naive());
    if updated != current {
        app_state
            .store
            .save_streak(&updated)
            .await
            .map_err(|e| port_failure("save streak", e))?;
        info!(current = updated.current_streak, best = updated.max_streak, "streak updated");
    }
    Ok(Json(updated))
}

//=========================================================================================
// Leaderboards
//=========================================================================================

/// Top scores for a difficulty key such as `20` or `custom-30-mul-div`.
#[utoipa::path(
    get,
    path = "/leaderboard/{key}",
    params(("key" = String, Path, description = "The difficulty key")),
    responses((status = 200, description = "Leaderboard entries, best first"))
)]
pub async fn get_leaderboard_handler(
    State(app_state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let entries = app_state
        .store
        .get_leaderboard(&key)
        .await
        .map_err(|e| port_failure("load leaderboard", e))?;
    Ok(Json(Leaderboard::new(entries).into_entries()))
}

/// Submit a finished game's score.
#[utoipa::path(
    post,
    path = "/leaderboard",
    request_body = SubmitScoreRequest,
    responses(
        (status = 200, description = "Whether the score was placed", body = SubmitScoreResponse),
        (status = 400, description = "Missing player name")
    )
)]
pub async fn submit_score_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<SubmitScoreRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".to_string()));
    }

    let key = difficulty_key(&req.difficulty);
    let _guard = app_state.profile_writes.lock().await;
    let entries = app_state
        .store
        .get_leaderboard(&key)
        .await
        .map_err(|e| port_failure("load leaderboard", e))?;

    let mut board = Leaderboard::new(entries);
    let accepted = board.insert(LeaderboardEntry {
        name: name.to_string(),
        date: Utc::now(),
        time: req.time,
        mistakes: req.mistakes,
    });
    if accepted {
        app_state
            .store
            .save_leaderboard(&key, board.entries())
            .await
            .map_err(|e| port_failure("save leaderboard", e))?;
        info!(%key, time = req.time, mistakes = req.mistakes, "new high score");
    }

    Ok(Json(SubmitScoreResponse {
        key,
        accepted,
        entries: board.into_entries(),
    }))
}
