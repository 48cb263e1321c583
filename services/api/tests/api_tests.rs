use axum::http::StatusCode;
use math_drill_core::Operator;
use serde_json::json;

mod common;

use common::{create_test_app, create_test_app_with, played_session, send};

//=========================================================================================
// Questions
//=========================================================================================

#[tokio::test]
async fn test_generate_question_respects_config() {
    let app = create_test_app();

    for _ in 0..20 {
        let (status, json) = send(
            &app,
            "POST",
            "/questions",
            Some(json!({ "config": { "max": 12, "ops": ["*"] } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["operator"], "*");
        let num1 = json["num1"].as_u64().unwrap();
        let num2 = json["num2"].as_u64().unwrap();
        assert!(num1 <= 12 && num2 <= 12);
        assert_eq!(json["answer"].as_u64().unwrap(), num1 * num2);
        assert_eq!(json["str"], format!("{} * {}", num1, num2));
        assert_eq!(json["hiddenPart"], "answer");
    }
}

#[tokio::test]
async fn test_generate_question_accepts_legacy_level_and_history() {
    let app = create_test_app();
    let history = json!([
        { "num1": 3, "num2": 4, "operator": "+", "answer": 7, "str": "3 + 4" },
        { "num1": 9, "num2": 2, "operator": "-", "answer": 7, "displayString": "9 - 2" }
    ]);

    let (status, json) = send(
        &app,
        "POST",
        "/questions",
        Some(json!({ "config": 20, "history": history })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["operator"] == "+" || json["operator"] == "-");
    assert_ne!(json["str"], "3 + 4");
    assert_ne!(json["str"], "9 - 2");
}

#[tokio::test]
async fn test_generate_question_clamps_malformed_config() {
    let app = create_test_app();
    let (status, json) = send(
        &app,
        "POST",
        "/questions",
        Some(json!({ "config": { "max": 0, "ops": [] } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["answer"].as_u64().is_some());
}

#[tokio::test]
async fn test_detective_mode_hides_an_operand() {
    let app = create_test_app();
    let (status, json) = send(
        &app,
        "POST",
        "/questions",
        Some(json!({ "config": 20, "mode": "detective" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["hiddenPart"] == "num1" || json["hiddenPart"] == "num2");
}

//=========================================================================================
// Sessions
//=========================================================================================

#[tokio::test]
async fn test_session_lifecycle() {
    let app = create_test_app();

    let (status, created) = send(
        &app,
        "POST",
        "/sessions",
        Some(json!({ "difficulty": 20, "device": "tablet" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["completed"], false);
    assert_eq!(created["device"], "tablet");
    let id = created["id"].as_str().unwrap().to_string();

    let questions = json!([
        { "num1": 2, "num2": 3, "operator": "+", "answer": 5, "str": "2 + 3", "time": 1.5 },
        {
            "num1": 8, "num2": 4, "operator": "-", "answer": 4, "str": "8 - 4", "time": 4.0,
            "attempts": [{ "value": "5", "time": 2.0, "delta": 2.0 }]
        }
    ]);
    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/sessions/{}", id),
        Some(json!({ "questions": questions, "totalTime": 5.5, "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["questions"].as_array().unwrap().len(), 2);
    assert!(updated["lastUpdated"].is_string());

    let (status, fetched) = send(&app, "GET", &format!("/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, updated);

    let (status, listed) = send(&app, "GET", "/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_session_returns_404() {
    let app = create_test_app();
    let missing = "/sessions/00000000-0000-4000-8000-000000000000";

    let (status, _) = send(&app, "GET", missing, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PUT",
        missing,
        Some(json!({ "questions": [], "totalTime": 0, "completed": false })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//=========================================================================================
// Smart Trainer
//=========================================================================================

#[tokio::test]
async fn test_recommendation_needs_enough_history() {
    let store = api_lib::adapters::InMemoryStorage::with_sessions(vec![
        played_session(1, &[(Operator::Mul, 10, 5)]),
        played_session(2, &[(Operator::Mul, 10, 5)]),
    ]);
    let app = create_test_app_with(store);

    let (status, body) = send(&app, "GET", "/recommendation", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_recommendation_targets_weak_operator() {
    let parts = [(Operator::Add, 10, 0), (Operator::Mul, 10, 3)];
    let store = api_lib::adapters::InMemoryStorage::with_sessions(vec![
        played_session(1, &parts),
        played_session(3, &parts),
        played_session(5, &parts),
        // Outside the analysis window.
        played_session(40, &[(Operator::Add, 10, 10)]),
    ]);
    let app = create_test_app_with(store);

    let (status, json) = send(&app, "GET", "/recommendation", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "trainer-weakness-multiplication");
    assert!(json["reason"].as_str().unwrap().contains("30%"));
    assert_eq!(json["config"]["max"], 30);
    assert_eq!(json["config"]["ops"], json!(["*"]));
}

#[tokio::test]
async fn test_recommendation_without_weakness_raises_the_bar() {
    let parts = [(Operator::Add, 10, 0), (Operator::Sub, 10, 1)];
    let store = api_lib::adapters::InMemoryStorage::with_sessions(vec![
        played_session(1, &parts),
        played_session(2, &parts),
        played_session(3, &parts),
    ]);
    let app = create_test_app_with(store);

    let (status, json) = send(&app, "GET", "/recommendation", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "trainer-challenge");
    assert_eq!(json["config"]["max"], 50);
}

//=========================================================================================
// Player Profile
//=========================================================================================

#[tokio::test]
async fn test_settings_default_and_update() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "questionCount": 48, "timeMinutes": 10, "darkMode": false }));

    let (status, json) = send(
        &app,
        "PUT",
        "/settings",
        Some(json!({ "questionCount": 24, "timeMinutes": 5, "darkMode": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["questionCount"], 24);
    assert_eq!(json["darkMode"], true);

    let (status, _) = send(
        &app,
        "PUT",
        "/settings",
        Some(json!({ "questionCount": 0, "timeMinutes": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_streak_counts_one_game_per_day() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/streak", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["currentStreak"], 0);

    let (_, first) = send(&app, "POST", "/streak", None).await;
    let (status, second) = send(&app, "POST", "/streak", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["currentStreak"], 1);
    assert_eq!(second, first);
    assert_eq!(second["maxStreak"], 1);
}

//=========================================================================================
// Leaderboards
//=========================================================================================

#[tokio::test]
async fn test_leaderboard_keeps_the_five_fastest() {
    let app = create_test_app();

    for (i, time) in [90, 60, 120, 75, 100].into_iter().enumerate() {
        let (status, json) = send(
            &app,
            "POST",
            "/leaderboard",
            Some(json!({ "difficulty": 20, "name": format!("p{}", i), "time": time, "mistakes": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["key"], "20");
        assert_eq!(json["accepted"], true);
    }

    let (_, json) = send(
        &app,
        "POST",
        "/leaderboard",
        Some(json!({ "difficulty": 20, "name": "slow", "time": 200, "mistakes": 0 })),
    )
    .await;
    assert_eq!(json["accepted"], false);

    let (_, json) = send(
        &app,
        "POST",
        "/leaderboard",
        Some(json!({ "difficulty": 20, "name": "fast", "time": 50, "mistakes": 0 })),
    )
    .await;
    assert_eq!(json["accepted"], true);

    let (status, entries) = send(&app, "GET", "/leaderboard/20", None).await;
    assert_eq!(status, StatusCode::OK);
    let times: Vec<u64> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["time"].as_u64().unwrap())
        .collect();
    assert_eq!(times, vec![50, 60, 75, 90, 100]);
    assert_eq!(entries[0]["name"], "fast");
}

#[tokio::test]
async fn test_leaderboards_are_separate_per_difficulty() {
    let app = create_test_app();

    let (_, json) = send(
        &app,
        "POST",
        "/leaderboard",
        Some(json!({
            "difficulty": { "max": 30, "ops": ["*", "/"] },
            "name": "ada",
            "time": 80,
            "mistakes": 0
        })),
    )
    .await;
    assert_eq!(json["key"], "custom-30-mul-div");

    let (_, custom) = send(&app, "GET", "/leaderboard/custom-30-mul-div", None).await;
    assert_eq!(custom.as_array().unwrap().len(), 1);
    let (_, plain) = send(&app, "GET", "/leaderboard/30", None).await;
    assert!(plain.as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "POST",
        "/leaderboard",
        Some(json!({ "difficulty": 20, "name": "  ", "time": 10, "mistakes": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_operator_order_does_not_split_leaderboards() {
    let app = create_test_app();

    for ops in [json!(["*", "/"]), json!(["/", "*"])] {
        let (_, json) = send(
            &app,
            "POST",
            "/leaderboard",
            Some(json!({ "difficulty": { "max": 30, "ops": ops }, "name": "ada", "time": 80, "mistakes": 0 })),
        )
        .await;
        assert_eq!(json["key"], "custom-30-mul-div");
    }

    let (_, entries) = send(&app, "GET", "/leaderboard/custom-30-mul-div", None).await;
    assert_eq!(entries.as_array().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scores_are_all_kept() {
    let app = create_test_app();

    let submissions: Vec<_> = (0..5u32)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                send(
                    &app,
                    "POST",
                    "/leaderboard",
                    Some(json!({ "difficulty": 10, "name": format!("p{}", i), "time": 60 + i, "mistakes": 0 })),
                )
                .await
            })
        })
        .collect();
    for submission in submissions {
        let (status, json) = submission.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["accepted"], true);
    }

    let (_, entries) = send(&app, "GET", "/leaderboard/10", None).await;
    let names: Vec<&str> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["p0", "p1", "p2", "p3", "p4"]);
}
