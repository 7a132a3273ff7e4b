//! Integration tests for kill/start through the management endpoint.

mod helpers;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use anivps_entity::session::{ProvisionPhase, SessionStatus};
use anivps_entity::user::UserRole;

#[tokio::test]
async fn test_kill_pending_session_without_run() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let token = app.token(owner, UserRole::User);
    let session = app
        .seed(owner, "octo/vps-k1", ProvisionPhase::Dispatching, Duration::minutes(1))
        .await;

    let response = app
        .request(
            "POST",
            "/api/manage-session",
            Some(json!({ "sessionId": session.id, "action": "kill" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["action"], "kill");
    assert_eq!(data["session"]["status"], "killed");
    assert_eq!(data["session"]["is_active"], false);
    assert_eq!(data["remote_cancel"]["outcome"], "skipped");
    assert_eq!(app.driver.cancel_count(), 0);

    let stored = app.load(session.id).await.unwrap();
    assert_eq!(stored.status, SessionStatus::Killed);
    assert!(stored.next_poll_at.is_none());
}

#[tokio::test]
async fn test_kill_cancels_named_run() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let token = app.token(owner, UserRole::User);
    let session = app
        .seed(owner, "octo/vps-k2", ProvisionPhase::Ready, Duration::minutes(30))
        .await;

    let response = app
        .request(
            "POST",
            "/api/manage-session",
            Some(json!({
                "sessionId": session.id,
                "action": "kill",
                "githubToken": "ghp_override",
                "workflowRunId": 9001,
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["remote_cancel"]["outcome"], "confirmed");
    assert_eq!(app.driver.cancel_count(), 1);
}

#[tokio::test]
async fn test_kill_succeeds_when_provider_refuses_cancel() {
    let app = helpers::TestApp::new();
    *app.driver.cancel_rejection.lock().unwrap() = Some("Run already completed".to_string());
    let owner = Uuid::new_v4();
    let token = app.token(owner, UserRole::User);
    let session = app
        .seed(owner, "octo/vps-k3", ProvisionPhase::Ready, Duration::minutes(30))
        .await;

    let response = app
        .request(
            "POST",
            "/api/manage-session",
            Some(json!({
                "sessionId": session.id,
                "action": "kill",
                "githubToken": "ghp_override",
                "workflowRunId": 77,
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["session"]["status"], "killed");
    assert_eq!(data["remote_cancel"]["outcome"], "rejected");
    assert_eq!(data["remote_cancel"]["reason"], "Run already completed");
}

#[tokio::test]
async fn test_kill_unknown_session_is_not_found() {
    let app = helpers::TestApp::new();
    let token = app.token(Uuid::new_v4(), UserRole::User);

    let response = app
        .request(
            "POST",
            "/api/manage-session",
            Some(json!({ "sessionId": Uuid::new_v4(), "action": "kill" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_kill_someone_elses_session_is_forbidden() {
    let app = helpers::TestApp::new();
    let session = app
        .seed(
            Uuid::new_v4(),
            "octo/vps-k4",
            ProvisionPhase::Ready,
            Duration::minutes(5),
        )
        .await;
    let token = app.token(Uuid::new_v4(), UserRole::User);

    let response = app
        .request(
            "POST",
            "/api/manage-session",
            Some(json!({ "sessionId": session.id, "action": "kill" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(
        app.load(session.id).await.unwrap().status,
        SessionStatus::Connected
    );
}

#[tokio::test]
async fn test_start_without_token_is_bad_request() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let token = app.token(owner, UserRole::User);
    let session = app
        .seed(owner, "octo/vps-s1", ProvisionPhase::Killed, Duration::minutes(5))
        .await;

    let response = app
        .request(
            "POST",
            "/api/manage-session",
            Some(json!({ "sessionId": session.id, "action": "start" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_start_redispatches_killed_session() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let token = app.token(owner, UserRole::User);
    let session = app
        .seed(owner, "octo/vps-s2", ProvisionPhase::Killed, Duration::hours(2))
        .await;

    let response = app
        .request(
            "POST",
            "/api/manage-session",
            Some(json!({
                "sessionId": session.id,
                "action": "start",
                "githubToken": "ghp_restart",
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["session"]["status"], "pending");
    assert_eq!(data["session"]["phase"], "dispatching");
    assert_eq!(data["session"]["is_active"], true);
    assert!(data.get("remote_cancel").is_none());

    let stored = app.load(session.id).await.unwrap();
    assert!(stored.expires_at > session.expires_at);
    assert_eq!(app.state.vault.get(session.id).await.as_deref(), Some("ghp_restart"));
}

#[tokio::test]
async fn test_start_while_in_flight_conflicts() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let token = app.token(owner, UserRole::User);
    let session = app
        .seed(owner, "octo/vps-s3", ProvisionPhase::Polling, Duration::minutes(1))
        .await;

    let response = app
        .request(
            "POST",
            "/api/manage-session",
            Some(json!({
                "sessionId": session.id,
                "action": "start",
                "githubToken": "ghp_restart",
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
}
