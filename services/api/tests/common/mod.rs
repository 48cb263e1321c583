#![allow(dead_code)]

use api_lib::{
    adapters::InMemoryStorage,
    config::Config,
    web::{self, state::AppState},
};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use math_drill_core::{
    Attempt, AnalyzerPolicy, DifficultyConfig, GameMode, HiddenPart, Operator, Question,
    QuestionResult, Session, DEFAULT_LOOKBACK,
};
use std::sync::Arc;
use tower::ServiceExt;

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "sqlite::memory:".to_string(),
        log_level: tracing::Level::DEBUG,
        cors_origin: "http://localhost:5173".to_string(),
        history_lookback: DEFAULT_LOOKBACK,
        analyzer: AnalyzerPolicy::default(),
    }
}

pub fn create_test_app() -> Router {
    create_test_app_with(InMemoryStorage::new())
}

pub fn create_test_app_with(store: InMemoryStorage) -> Router {
    let state = AppState::new(Arc::new(store), Arc::new(test_config()));
    web::router(Arc::new(state))
}

/// Sends one request and returns the status with the body parsed as JSON
/// (`Value::Null` for an empty body).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

fn result(operator: Operator, missed: bool) -> QuestionResult {
    let (a, b) = match operator {
        Operator::Div => (12, 3),
        _ => (7, 3),
    };
    let attempts = if missed {
        vec![Attempt {
            value: "0".to_string(),
            time: 2.0,
            delta: 2.0,
        }]
    } else {
        Vec::new()
    };
    QuestionResult::answered(
        Question::new(a, b, operator, HiddenPart::Answer).unwrap(),
        3.0,
        false,
        attempts,
    )
}

/// A completed session from `days_ago` with `(operator, total, missed)` blocks of questions.
pub fn played_session(days_ago: i64, parts: &[(Operator, usize, usize)]) -> Session {
    let mut session = Session::start(
        DifficultyConfig::new(20, Operator::ALL),
        GameMode::Standard,
        "test",
        Utc::now() - Duration::days(days_ago),
    );
    for (operator, total, missed) in parts {
        for i in 0..*total {
            session.questions.push(result(*operator, i < *missed));
        }
    }
    session.completed = true;
    session
}
