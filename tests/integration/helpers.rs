//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use anivps_api::{AppState, build_app};
use anivps_auth::JwtEncoder;
use anivps_core::config::AppConfig;
use anivps_core::error::AppError;
use anivps_core::result::AppResult;
use anivps_database::{MemoryStore, SessionLogStore, SessionStore};
use anivps_entity::session::{ProvisionPhase, VpsSession};
use anivps_entity::user::UserRole;
use anivps_github::{CancelOutcome, CommitRef, RepoHandle, WorkflowDriver, WorkflowRun};

/// Key accepted by the cleanup endpoint.
pub const JANITOR_KEY: &str = "janitor-test-key";

/// Secret expected on the RDP callback.
pub const CALLBACK_SECRET: &str = "callback-test-secret";

/// Provider stand-in that records calls and never touches the network.
#[derive(Debug, Default)]
pub struct StubDriver {
    /// Make `create_repository` fail like a rejected token.
    pub fail_create: bool,
    /// Answer to `cancel_run`; `None` confirms.
    pub cancel_rejection: Mutex<Option<String>>,
    pub dispatches: AtomicUsize,
    pub cancels: AtomicUsize,
}

impl StubDriver {
    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkflowDriver for StubDriver {
    async fn create_repository(
        &self,
        _token: &str,
        name: &str,
        _private: bool,
    ) -> AppResult<RepoHandle> {
        if self.fail_create {
            return Err(AppError::provider("Bad credentials"));
        }
        Ok(RepoHandle {
            owner: "octo".to_string(),
            name: name.to_string(),
            full_name: format!("octo/{name}"),
            html_url: format!("https://github.com/octo/{name}"),
            default_branch: "main".to_string(),
        })
    }

    async fn upload_file(
        &self,
        _token: &str,
        _owner: &str,
        _repo: &str,
        path: &str,
        _content: &str,
        _message: &str,
    ) -> AppResult<CommitRef> {
        Ok(CommitRef {
            sha: "0a1b2c".to_string(),
            path: path.to_string(),
        })
    }

    async fn dispatch_workflow(
        &self,
        _token: &str,
        _owner: &str,
        _repo: &str,
        _workflow_file: &str,
        _git_ref: &str,
    ) -> AppResult<()> {
        self.dispatches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_runs(
        &self,
        _token: &str,
        _owner: &str,
        _repo: &str,
    ) -> AppResult<Vec<WorkflowRun>> {
        Ok(Vec::new())
    }

    async fn download_run_logs(
        &self,
        _token: &str,
        _owner: &str,
        _repo: &str,
        _run_id: i64,
    ) -> AppResult<String> {
        Ok(String::new())
    }

    async fn cancel_run(
        &self,
        _token: &str,
        _owner: &str,
        _repo: &str,
        _run_id: i64,
    ) -> CancelOutcome {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        match self.cancel_rejection.lock().unwrap().clone() {
            Some(reason) => CancelOutcome::Rejected(reason),
            None => CancelOutcome::Confirmed,
        }
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Backing store, for seeding and direct assertions
    pub store: Arc<MemoryStore>,
    /// Provider stand-in
    pub driver: Arc<StubDriver>,
    /// Shared state, for reaching services directly
    pub state: AppState,
    encoder: JwtEncoder,
}

impl TestApp {
    /// Create a new test application with both shared secrets configured
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-test-secret".to_string();
        config.janitor.api_key = Some(JANITOR_KEY.to_string());
        config.callback.secret = Some(CALLBACK_SECRET.to_string());
        Self::with_config(config, StubDriver::default())
    }

    /// Create a test application from an explicit config and driver
    pub fn with_config(config: AppConfig, driver: StubDriver) -> Self {
        let store = Arc::new(MemoryStore::new());
        let driver = Arc::new(driver);
        let encoder = JwtEncoder::new(&config.auth);

        let state = AppState::build(
            config,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            Arc::clone(&store) as Arc<dyn SessionLogStore>,
            Arc::clone(&driver) as Arc<dyn WorkflowDriver>,
            None,
        );

        Self {
            router: build_app(state.clone()),
            store,
            driver,
            state,
            encoder,
        }
    }

    /// Bearer token for `user_id` with `role`
    pub fn token(&self, user_id: Uuid, role: UserRole) -> String {
        self.encoder
            .issue(user_id, role, Some("tester@example.com"))
            .expect("Failed to issue test token")
    }

    /// Store a session row owned by `owner` in `phase`, created `age` ago
    pub async fn seed(
        &self,
        owner: Uuid,
        repo: &str,
        phase: ProvisionPhase,
        age: Duration,
    ) -> VpsSession {
        let session = session_row(owner, repo, phase, Utc::now() - age);
        self.store.seed(session.clone()).await;
        session
    }

    /// Current row of a session
    pub async fn load(&self, id: Uuid) -> Option<VpsSession> {
        self.store.find_by_id(id).await.expect("store lookup failed")
    }

    /// Send a JSON request with an optional bearer token
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let headers: Vec<(&str, String)> = token
            .map(|t| vec![("Authorization", format!("Bearer {t}"))])
            .unwrap_or_default();
        self.request_with_headers(method, path, body, &headers).await
    }

    /// Send a JSON request with arbitrary extra headers
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, String)],
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        for (name, value) in headers {
            req = req.header(*name, value.as_str());
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// A complete session row, as the controller would have left it in `phase`
pub fn session_row(
    owner: Uuid,
    repo: &str,
    phase: ProvisionPhase,
    created_at: DateTime<Utc>,
) -> VpsSession {
    let connected = phase == ProvisionPhase::Ready;
    VpsSession {
        id: Uuid::new_v4(),
        user_id: Some(owner),
        github_repo: repo.to_string(),
        repo_url: Some(format!("https://github.com/{repo}")),
        default_branch: Some("main".to_string()),
        os_type: None,
        vps_config: None,
        networking_type: None,
        status: phase.status(),
        phase,
        is_active: phase != ProvisionPhase::Killed,
        workflow_run_id: None,
        poll_attempts: 0,
        next_poll_at: None,
        dispatched_at: None,
        rdp_address: connected.then(|| "203.0.113.7".to_string()),
        rdp_username: connected.then(|| "runneradmin".to_string()),
        rdp_password: connected.then(|| "s3cret!".to_string()),
        console_url: None,
        created_at,
        provisioning_started_at: created_at,
        started_at: connected.then_some(created_at),
        expires_at: created_at + Duration::hours(6),
        updated_at: created_at,
        total_uptime_minutes: 0,
        connection_count: 0,
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}
