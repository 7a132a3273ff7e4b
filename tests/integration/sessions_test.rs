//! Integration tests for session creation, queries, logs and analytics.

mod helpers;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use anivps_entity::session::ProvisionPhase;
use anivps_entity::user::UserRole;

fn create_body(repo: &str) -> serde_json::Value {
    json!({
        "githubToken": "ghp_integration",
        "workflowContent": "name: vps\non: workflow_dispatch\n",
        "repoName": repo,
        "osType": "ubuntu",
        "networkingType": "ngrok",
    })
}

#[tokio::test]
async fn test_health_needs_no_auth() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");

    let detailed = app.request("GET", "/api/health/detailed", None, None).await;
    assert_eq!(detailed.status, StatusCode::OK);
    assert_eq!(detailed.data()["database"], "in-memory");
    assert_eq!(detailed.data()["held_tokens"], 0);
    assert_eq!(detailed.data()["log_channels"], 0);
}

#[tokio::test]
async fn test_create_session_schedules_dispatch() {
    let app = helpers::TestApp::new();
    let user = Uuid::new_v4();
    let token = app.token(user, UserRole::User);

    let response = app
        .request("POST", "/api/sessions", Some(create_body("vps-create")), Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let data = response.data();
    assert_eq!(data["status"], "pending");
    assert_eq!(data["phase"], "dispatching");
    assert_eq!(data["github_repo"], "octo/vps-create");
    assert_eq!(data["os_type"], "ubuntu");
    assert_eq!(data["user_id"], user.to_string());
    assert_eq!(app.state.vault.len().await, 1);

    let id = data["id"].as_str().unwrap();
    let logs = app
        .request("GET", &format!("/api/sessions/{id}/logs"), None, Some(&token))
        .await;
    assert_eq!(logs.status, StatusCode::OK);
    let entries = logs.data().as_array().unwrap();
    assert!(entries.len() >= 3);
    assert!(
        entries[0]["message"]
            .as_str()
            .unwrap()
            .contains("dispatch scheduled")
    );
}

#[tokio::test]
async fn test_create_requires_bearer_token() {
    let app = helpers::TestApp::new();

    let response = app
        .request("POST", "/api/sessions", Some(create_body("vps-anon")), None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "UNAUTHORIZED");
    assert_eq!(app.store.session_count().await, 0);
}

#[tokio::test]
async fn test_create_rejects_bad_input_before_provider_calls() {
    let app = helpers::TestApp::new();
    let token = app.token(Uuid::new_v4(), UserRole::User);

    let mut bad_os = create_body("vps-bad-os");
    bad_os["osType"] = json!("beos");
    let response = app
        .request("POST", "/api/sessions", Some(bad_os), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");

    let mut no_token = create_body("vps-no-token");
    no_token["githubToken"] = json!("");
    let response = app
        .request("POST", "/api/sessions", Some(no_token), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.store.session_count().await, 0);
}

#[tokio::test]
async fn test_provider_failure_is_bad_gateway_and_fails_session() {
    let mut config = anivps_core::config::AppConfig::default();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    let driver = helpers::StubDriver {
        fail_create: true,
        ..helpers::StubDriver::default()
    };
    let app = helpers::TestApp::with_config(config, driver);
    let user = Uuid::new_v4();
    let token = app.token(user, UserRole::User);

    let response = app
        .request("POST", "/api/sessions", Some(create_body("vps-denied")), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["error"], "PROVIDER_ERROR");
    assert!(
        response.body["message"]
            .as_str()
            .unwrap()
            .contains("Bad credentials")
    );

    let list = app.request("GET", "/api/sessions", None, Some(&token)).await;
    let sessions = list.data().as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["status"], "failed");
}

#[tokio::test]
async fn test_list_is_scoped_to_caller_and_filters() {
    let app = helpers::TestApp::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    app.seed(alice, "octo/vps-a1", ProvisionPhase::Ready, Duration::minutes(5))
        .await;
    app.seed(alice, "octo/vps-a2", ProvisionPhase::Failed, Duration::minutes(3))
        .await;
    app.seed(bob, "octo/vps-b1", ProvisionPhase::Ready, Duration::minutes(1))
        .await;

    let token = app.token(alice, UserRole::User);
    let all = app.request("GET", "/api/sessions", None, Some(&token)).await;
    assert_eq!(all.status, StatusCode::OK);
    let sessions = all.data().as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["github_repo"], "octo/vps-a2");

    let connected = app
        .request("GET", "/api/sessions?status=connected", None, Some(&token))
        .await;
    let sessions = connected.data().as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["github_repo"], "octo/vps-a1");

    let bad = app
        .request("GET", "/api/sessions?status=sleeping", None, Some(&token))
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_enforces_ownership() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let session = app
        .seed(owner, "octo/vps-own", ProvisionPhase::Ready, Duration::minutes(1))
        .await;
    let path = format!("/api/sessions/{}", session.id);

    let stranger = app.token(Uuid::new_v4(), UserRole::User);
    let response = app.request("GET", &path, None, Some(&stranger)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let admin = app.token(Uuid::new_v4(), UserRole::Admin);
    let response = app.request("GET", &path, None, Some(&admin)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["rdp_address"], "203.0.113.7");

    let missing = format!("/api/sessions/{}", Uuid::new_v4());
    let response = app.request("GET", &missing, None, Some(&admin)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_connect_counts_only_connected_sessions() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let token = app.token(owner, UserRole::User);
    let ready = app
        .seed(owner, "octo/vps-ready", ProvisionPhase::Ready, Duration::minutes(1))
        .await;
    let pending = app
        .seed(
            owner,
            "octo/vps-pending",
            ProvisionPhase::AwaitingCallback,
            Duration::minutes(1),
        )
        .await;

    for expected in 1..=2 {
        let response = app
            .request(
                "POST",
                &format!("/api/sessions/{}/connect", ready.id),
                None,
                Some(&token),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.data()["connection_count"], expected);
    }

    let response = app
        .request(
            "POST",
            &format!("/api/sessions/{}/connect", pending.id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_removes_session() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let token = app.token(owner, UserRole::User);
    let session = app
        .seed(owner, "octo/vps-del", ProvisionPhase::Killed, Duration::minutes(1))
        .await;
    let path = format!("/api/sessions/{}", session.id);

    let response = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(app.load(session.id).await.is_none());

    let response = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_analytics_success_rate() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let token = app.token(owner, UserRole::User);

    for i in 0..6 {
        app.seed(
            owner,
            &format!("octo/vps-ok-{i}"),
            ProvisionPhase::Ready,
            Duration::minutes(10),
        )
        .await;
    }
    app.seed(owner, "octo/vps-killed", ProvisionPhase::Killed, Duration::minutes(10))
        .await;
    for i in 0..3 {
        app.seed(
            owner,
            &format!("octo/vps-fail-{i}"),
            ProvisionPhase::Failed,
            Duration::minutes(10),
        )
        .await;
    }
    // Someone else's session does not count.
    app.seed(
        Uuid::new_v4(),
        "octo/vps-other",
        ProvisionPhase::Failed,
        Duration::minutes(10),
    )
    .await;

    let response = app
        .request("GET", "/api/analytics?tz_offset_minutes=120", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["total_sessions"], 10);
    assert_eq!(data["failed_sessions"], 3);
    assert_eq!(data["success_rate"], 70.0);
    assert_eq!(data["daily_usage"].as_array().unwrap().len(), 7);

    let response = app
        .request("GET", "/api/analytics?tz_offset_minutes=2000", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_listing_requires_admin() {
    let app = helpers::TestApp::new();
    for i in 0..3 {
        app.seed(
            Uuid::new_v4(),
            &format!("octo/vps-all-{i}"),
            ProvisionPhase::Ready,
            Duration::minutes(i),
        )
        .await;
    }

    let user = app.token(Uuid::new_v4(), UserRole::User);
    let response = app
        .request("GET", "/api/admin/sessions", None, Some(&user))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let admin = app.token(Uuid::new_v4(), UserRole::Admin);
    let response = app
        .request("GET", "/api/admin/sessions?page=1&per_page=2", None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["items"].as_array().unwrap().len(), 2);
}
