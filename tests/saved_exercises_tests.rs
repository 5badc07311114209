// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saved exercise route tests.

use axum::http::StatusCode;
use gym_guru::db::UserStore;
use serde_json::json;

mod common;
use common::{
    body_json, create_test_app, empty_request, json_request, raw_request, register, send,
};

fn bench_press() -> serde_json::Value {
    json!({"id": "0025", "name": "barbell bench press", "equipment": "barbell", "target": "pectorals"})
}

#[tokio::test]
async fn test_save_list_and_remove() {
    let (app, _, _) = create_test_app();
    let token = register(&app, "a@x.com", "a", "p").await;

    let response = send(&app, empty_request("GET", "/saved-exercises", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["savedExercises"], json!([]));

    let response = send(
        &app,
        json_request("POST", "/saved-exercises", Some(&token), bench_press()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Exercise saved");
    assert_eq!(body["savedExercises"], json!([bench_press()]));

    let response = send(&app, empty_request("GET", "/saved-exercises", Some(&token))).await;
    assert_eq!(body_json(response).await["savedExercises"], json!([bench_press()]));

    let response = send(
        &app,
        json_request("DELETE", "/saved-exercises", Some(&token), json!({"id": "0025"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Exercise removed");
    assert_eq!(body["savedExercises"], json!([]));
}

#[tokio::test]
async fn test_save_duplicate_rejected() {
    let (app, _, _) = create_test_app();
    let token = register(&app, "a@x.com", "a", "p").await;

    send(&app, json_request("POST", "/saved-exercises", Some(&token), bench_press())).await;
    let response = send(
        &app,
        json_request("POST", "/saved-exercises", Some(&token), bench_press()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Exercise already saved");
}

#[tokio::test]
async fn test_save_requires_id() {
    let (app, _, _) = create_test_app();
    let token = register(&app, "a@x.com", "a", "p").await;

    let response = send(
        &app,
        json_request("POST", "/saved-exercises", Some(&token), json!({"name": "curl"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Missing exercise id");
}

#[tokio::test]
async fn test_save_with_only_id() {
    let (app, _, _) = create_test_app();
    let token = register(&app, "a@x.com", "a", "p").await;

    let response = send(
        &app,
        json_request("POST", "/saved-exercises", Some(&token), json!({"id": "0001"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["savedExercises"][0]["id"], "0001");
}

#[tokio::test]
async fn test_remove_requires_id() {
    let (app, _, _) = create_test_app();
    let token = register(&app, "a@x.com", "a", "p").await;

    let response = send(
        &app,
        json_request("DELETE", "/saved-exercises", Some(&token), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Missing exerciseId");
}

#[tokio::test]
async fn test_saved_lists_are_per_user() {
    let (app, _, db) = create_test_app();
    let alice = register(&app, "alice@x.com", "alice", "p").await;
    let bob = register(&app, "bob@x.com", "bob", "p").await;

    send(&app, json_request("POST", "/saved-exercises", Some(&alice), bench_press())).await;

    let response = send(&app, empty_request("GET", "/saved-exercises", Some(&bob))).await;
    assert_eq!(body_json(response).await["savedExercises"], json!([]));

    let stored = gym_guru::db::find_user_by_login(&db, "alice")
        .await
        .unwrap()
        .unwrap();
    let stored = db.get_user(&stored.id).await.unwrap().unwrap();
    assert_eq!(stored.saved_exercises.len(), 1);
}

#[tokio::test]
async fn test_unusable_body_gets_json_error() {
    let (app, _, _) = create_test_app();
    let token = register(&app, "a@x.com", "a", "p").await;

    for method in ["POST", "DELETE"] {
        let response = send(
            &app,
            raw_request(method, "/saved-exercises", Some(&token), None, "id=0001"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["message"], "Invalid request body");
    }
}
