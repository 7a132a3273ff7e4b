//! Integration tests for the janitor trigger.

mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use uuid::Uuid;

use anivps_core::config::AppConfig;
use anivps_entity::session::ProvisionPhase;

fn api_key(value: &str) -> Vec<(&'static str, String)> {
    vec![("x-api-key", value.to_string())]
}

#[tokio::test]
async fn test_cleanup_requires_api_key() {
    let app = helpers::TestApp::new();

    let missing = app
        .request_with_headers("POST", "/api/cleanup-sessions", None, &[])
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let wrong = app
        .request_with_headers("POST", "/api/cleanup-sessions", None, &api_key("nope"))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["success"], false);
}

#[tokio::test]
async fn test_cleanup_disabled_without_configured_key() {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    let app = helpers::TestApp::with_config(config, helpers::StubDriver::default());

    let response = app
        .request_with_headers("POST", "/api/cleanup-sessions", None, &api_key(""))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cleanup_deletes_exactly_the_defunct_sessions() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();

    let failed = app
        .seed(owner, "octo/vps-failed", ProvisionPhase::Failed, Duration::minutes(1))
        .await;
    let stale = app
        .seed(
            owner,
            "octo/vps-stale",
            ProvisionPhase::AwaitingCallback,
            Duration::hours(2),
        )
        .await;
    let mut expired = helpers::session_row(
        owner,
        "octo/vps-expired",
        ProvisionPhase::Ready,
        Utc::now() - Duration::hours(7),
    );
    expired.expires_at = Utc::now() - Duration::hours(1);
    app.store.seed(expired.clone()).await;
    let healthy = app
        .seed(owner, "octo/vps-healthy", ProvisionPhase::Ready, Duration::minutes(10))
        .await;

    let response = app
        .request_with_headers(
            "POST",
            "/api/cleanup-sessions",
            None,
            &api_key(helpers::JANITOR_KEY),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["deleted_count"], 3);

    let mut repos: Vec<&str> = response.body["deleted_sessions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["github_repo"].as_str().unwrap())
        .collect();
    repos.sort_unstable();
    assert_eq!(
        repos,
        vec!["octo/vps-expired", "octo/vps-failed", "octo/vps-stale"]
    );

    for gone in [failed.id, stale.id, expired.id] {
        assert!(app.load(gone).await.is_none());
    }
    assert!(app.load(healthy.id).await.is_some());

    let again = app
        .request_with_headers(
            "POST",
            "/api/cleanup-sessions",
            None,
            &api_key(helpers::JANITOR_KEY),
        )
        .await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body["deleted_count"], 0);
    assert_eq!(app.store.session_count().await, 1);
}
