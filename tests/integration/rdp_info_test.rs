//! Integration tests for the credential callback.

mod helpers;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use anivps_entity::session::{ProvisionPhase, SessionStatus};
use anivps_entity::user::UserRole;

fn callback_key() -> Vec<(&'static str, String)> {
    vec![("x-callback-key", helpers::CALLBACK_SECRET.to_string())]
}

fn rdp_body(repo: &str) -> serde_json::Value {
    json!({
        "repoName": repo,
        "ngrokUrl": "0.tcp.ngrok.io:14321",
        "rdpUser": "runneradmin",
        "rdpPassword": "P@ssw0rd!",
    })
}

#[tokio::test]
async fn test_callback_requires_secret_when_configured() {
    let app = helpers::TestApp::new();
    app.seed(
        Uuid::new_v4(),
        "octo/vps-cb0",
        ProvisionPhase::AwaitingCallback,
        Duration::minutes(1),
    )
    .await;

    let response = app
        .request_with_headers("POST", "/api/update-rdp-info", Some(rdp_body("vps-cb0")), &[])
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_callback_connects_session_by_bare_name() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let session = app
        .seed(
            owner,
            "octo/vps-cb1",
            ProvisionPhase::AwaitingCallback,
            Duration::minutes(3),
        )
        .await;

    let response = app
        .request_with_headers(
            "POST",
            "/api/update-rdp-info",
            Some(rdp_body("vps-cb1")),
            &callback_key(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["session_id"], session.id.to_string());
    assert_eq!(data["status"], "connected");
    assert!(data.get("rdp_password").is_none());

    let token = app.token(owner, UserRole::User);
    let fetched = app
        .request("GET", &format!("/api/sessions/{}", session.id), None, Some(&token))
        .await;
    assert_eq!(fetched.data()["rdp_address"], "0.tcp.ngrok.io:14321");
    assert_eq!(fetched.data()["rdp_username"], "runneradmin");

    let logs = app
        .request(
            "GET",
            &format!("/api/sessions/{}/logs?limit=1", session.id),
            None,
            Some(&token),
        )
        .await;
    let entries = logs.data().as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["log_type"], "success");
}

#[tokio::test]
async fn test_callback_unknown_repo_is_not_found() {
    let app = helpers::TestApp::new();

    let response = app
        .request_with_headers(
            "POST",
            "/api/update-rdp-info",
            Some(rdp_body("vps-nowhere")),
            &callback_key(),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_callback_rejects_blank_fields() {
    let app = helpers::TestApp::new();
    let mut body = rdp_body("vps-cb2");
    body["rdpPassword"] = json!("");

    let response = app
        .request_with_headers("POST", "/api/update-rdp-info", Some(body), &callback_key())
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_for_killed_session_conflicts() {
    let app = helpers::TestApp::new();
    let session = app
        .seed(
            Uuid::new_v4(),
            "octo/vps-cb3",
            ProvisionPhase::Killed,
            Duration::minutes(3),
        )
        .await;

    let response = app
        .request_with_headers(
            "POST",
            "/api/update-rdp-info",
            Some(rdp_body("octo/vps-cb3")),
            &callback_key(),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(
        app.load(session.id).await.unwrap().status,
        SessionStatus::Killed
    );
}
