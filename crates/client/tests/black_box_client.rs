use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use serde_json::{json, Value};

use freightdesk_auth::{Action, Credentials};
use freightdesk_client::resources::Cargo;
use freightdesk_client::{
    ApiError, AppState, ClientConfig, MemoryStorage, ReqwestTransport, SessionError, SessionEvent,
    SessionStatus, TokenStorage,
};
use freightdesk_core::EntityId;

const PASSWORD: &str = "correct-horse";

struct Backend {
    token: String,
    refreshed: String,
    cargo: Mutex<Vec<Value>>,
    next_id: AtomicI64,
    fail_cargo_list: AtomicBool,
}

struct TestServer {
    base_url: String,
    backend: Arc<Backend>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(exp: i64) -> Self {
        let backend = Arc::new(Backend {
            token: mint_jwt(exp),
            refreshed: mint_jwt(exp + 3600),
            cargo: Mutex::new(vec![cargo_json(2, 40.0), cargo_json(1, 25.0)]),
            next_id: AtomicI64::new(3),
            fail_cargo_list: AtomicBool::new(false),
        });

        let app = Router::new()
            .route("/api/public/auth/login", post(login))
            .route("/api/public/auth/refreshToken/:token", get(refresh))
            .route("/api/auth/current", get(current_user))
            .route("/api/cargo", get(list_cargo).post(create_cargo).put(update_cargo))
            .route("/api/cargo/:id", axum::routing::delete(delete_cargo))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            backend,
            handle,
        }
    }

    fn app(&self) -> (AppState, Arc<MemoryStorage>) {
        let config = ClientConfig::new(self.base_url.clone());
        let transport = ReqwestTransport::new(&config).expect("failed to build transport");
        let storage = Arc::new(MemoryStorage::new());
        let app = AppState::with_transport(config, Arc::new(transport), storage.clone());
        (app, storage)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Unsigned JWT; the client only reads the payload.
fn mint_jwt(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({ "alg": "none", "typ": "JWT" }).to_string());
    let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": "aida", "exp": exp }).to_string());
    format!("{header}.{payload}.signature")
}

fn cargo_json(id: i64, weight: f64) -> Value {
    json!({
        "id": id, "weight": weight, "volume": 2.0, "quantity": 1,
        "client": "ACME", "status": "IN_WAREHOUSE"
    })
}

fn ok(result: Value) -> Json<Value> {
    Json(json!({ "resultCode": { "value": "OK", "httpCode": 200 }, "result": result }))
}

fn authorized(backend: &Backend, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", backend.token);
    let accepted = format!("Bearer {}", backend.refreshed);
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected || v == accepted)
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Json<Value> {
    if body["password"] == PASSWORD {
        ok(json!(backend.token))
    } else {
        Json(json!({
            "resultCode": { "value": "BAD_CREDENTIALS", "httpCode": 401 },
            "result": { "message": "Invalid username or password" }
        }))
    }
}

async fn refresh(State(backend): State<Arc<Backend>>, Path(token): Path<String>) -> Response {
    if token == backend.token {
        // Bare token, not JSON.
        backend.refreshed.clone().into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn current_user(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if !authorized(&backend, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ok(json!({
        "id": 1,
        "name": "Aida",
        "login": "aida",
        "roles": [
            {
                "id": 10, "name": "dispatcher", "active": true,
                "permissions": [{ "id": 100, "name": { "value": "cargo" }, "access": 12 }]
            },
            {
                "id": 11, "name": "admin", "active": false,
                "permissions": [{ "id": 101, "name": { "value": "users" }, "access": 15 }]
            }
        ]
    }))
    .into_response()
}

async fn list_cargo(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if !authorized(&backend, &headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    if backend.fail_cargo_list.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "database unavailable" })))
            .into_response();
    }
    let cargo = backend.cargo.lock().unwrap().clone();
    ok(Value::Array(cargo)).into_response()
}

async fn create_cargo(State(backend): State<Arc<Backend>>, Json(mut body): Json<Value>) -> Json<Value> {
    if body["weight"].as_f64().unwrap_or(0.0) <= 0.0 {
        return Json(json!({
            "resultCode": { "value": "VALIDATION_ERROR", "httpCode": 400 },
            "result": { "message": "Weight must be positive" }
        }));
    }
    body["id"] = json!(backend.next_id.fetch_add(1, Ordering::SeqCst));
    backend.cargo.lock().unwrap().push(body.clone());
    ok(body)
}

async fn update_cargo(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Json<Value> {
    let mut cargo = backend.cargo.lock().unwrap();
    if let Some(slot) = cargo.iter_mut().find(|c| c["id"] == body["id"]) {
        *slot = body.clone();
    }
    ok(body)
}

async fn delete_cargo(State(backend): State<Arc<Backend>>, Path(id): Path<i64>) -> StatusCode {
    let mut cargo = backend.cargo.lock().unwrap();
    let before = cargo.len();
    cargo.retain(|c| c["id"] != json!(id));
    if cargo.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

fn future_exp() -> i64 {
    Utc::now().timestamp() + 3600
}

#[tokio::test]
async fn login_loads_user_and_derives_permissions() {
    let exp = future_exp();
    let server = TestServer::spawn(exp).await;
    let (app, storage) = server.app();
    let mut events = app.current().subscribe();

    let claims = app
        .session
        .login(&Credentials::new("aida", PASSWORD))
        .await
        .unwrap();

    let session = app.current();
    assert_eq!(claims.exp, exp);
    assert_eq!(storage.get("token").as_deref(), Some(server.backend.token.as_str()));
    assert_eq!(session.token(), server.backend.token);
    assert_eq!(session.expiry_millis(), Some(exp * 1000));
    assert_eq!(storage.get("expired"), Some((exp * 1000).to_string()));
    assert_eq!(session.status(), SessionStatus::Success);
    assert!(!session.is_expired(Utc::now()));

    let user = session.user().unwrap();
    assert_eq!(user.login, "aida");
    assert_eq!(session.active_role().unwrap().name, "dispatcher");

    assert!(session.check_access("cargo", Action::Read));
    assert!(session.check_access("cargo", Action::Create));
    assert!(!session.check_access("cargo", Action::Delete));
    // Granted only through an inactive role.
    assert!(!session.check_access("users", Action::Read));
    assert!(!session.check_access("payments", Action::Read));

    assert_eq!(events.recv().await.unwrap(), SessionEvent::UserLoaded);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedIn);
}

#[tokio::test]
async fn failed_login_clears_token_and_reports_backend_message() {
    let server = TestServer::spawn(future_exp()).await;
    let (app, storage) = server.app();
    storage.set("token", "stale".to_string());

    let err = app
        .session
        .login(&Credentials::new("aida", "wrong"))
        .await
        .unwrap_err();

    match &err {
        SessionError::Api(ApiError::Envelope { http_code, message, .. }) => {
            assert_eq!(*http_code, 401);
            assert_eq!(message, "Invalid username or password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(storage.get("token"), None);
    assert_eq!(app.current().status(), SessionStatus::Error);
    assert_eq!(
        app.current().last_error().as_deref(),
        Some("Invalid username or password")
    );
    assert!(!app.current().check_access("cargo", Action::Read));
}

#[tokio::test]
async fn refresh_accepts_bare_token_body() {
    let exp = future_exp();
    let server = TestServer::spawn(exp).await;
    let (app, storage) = server.app();
    app.session
        .login(&Credentials::new("aida", PASSWORD))
        .await
        .unwrap();

    let claims = app.session.refresh_token().await.unwrap();

    assert_eq!(claims.exp, exp + 3600);
    assert_eq!(storage.get("token").as_deref(), Some(server.backend.refreshed.as_str()));
    assert_eq!(app.current().expiry_millis(), Some((exp + 3600) * 1000));
    assert!(app.current().user().is_some());
}

#[tokio::test]
async fn rejected_refresh_drops_user_and_permissions() {
    let server = TestServer::spawn(future_exp()).await;
    let (app, storage) = server.app();
    app.session
        .login(&Credentials::new("aida", PASSWORD))
        .await
        .unwrap();
    assert!(app.current().check_access("cargo", Action::Read));
    storage.set("token", "revoked".to_string());

    let err = app.session.refresh_token().await.unwrap_err();

    let session = app.current();
    assert!(matches!(err, SessionError::Api(ApiError::Status { status: 401, .. })));
    assert_eq!(session.status(), SessionStatus::Error);
    assert!(session.last_error().is_some());
    assert!(session.user().is_none());
    assert!(session.expiry_millis().is_none());
    assert!(!session.check_access("cargo", Action::Read));
    assert_eq!(storage.get("token"), None);
    assert_eq!(storage.get("expired"), None);
}

#[tokio::test]
async fn init_restores_session_from_persisted_token() {
    let server = TestServer::spawn(future_exp()).await;
    let (app, storage) = server.app();
    storage.set("token", server.backend.token.clone());

    let user = app.session.init().await.unwrap().unwrap();

    assert_eq!(user.name, "Aida");
    assert_eq!(app.current().status(), SessionStatus::Success);
    assert!(app.current().check_access("cargo", Action::Read));
}

#[tokio::test]
async fn rejected_token_forces_logout() {
    let server = TestServer::spawn(future_exp()).await;
    let (app, storage) = server.app();
    storage.set("token", "revoked".to_string());
    let mut events = app.current().subscribe();

    let err = app.cargo.fetch_all().await.unwrap_err();

    assert_eq!(err, ApiError::Unauthorized { status: 403 });
    assert_eq!(storage.get("token"), None);
    assert_eq!(app.current().status(), SessionStatus::Anonymous);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::ForcedLogout { status: 403 });
    assert!(app.cargo.is_empty());
}

#[tokio::test]
async fn cargo_crud_round_trip() {
    let server = TestServer::spawn(future_exp()).await;
    let (app, _storage) = server.app();
    app.session
        .login(&Credentials::new("aida", PASSWORD))
        .await
        .unwrap();

    let listed = app.cargo.fetch_all().await.unwrap();
    let ids: Vec<_> = listed.iter().map(|c| c.id.unwrap().get()).collect();
    assert_eq!(ids, vec![1, 2]);

    let mut draft: Cargo = serde_json::from_value(cargo_json(0, 12.0)).unwrap();
    draft.id = None;
    let created = app.cargo.create(&draft).await.unwrap();
    assert_eq!(created.id, Some(EntityId::new(3)));
    assert_eq!(app.cargo.len(), 3);

    let mut edited = created.clone();
    edited.description = Some("fragile".into());
    app.cargo.update(&edited).await.unwrap();
    assert_eq!(
        app.cargo.get(EntityId::new(3)).unwrap().description.as_deref(),
        Some("fragile")
    );

    app.cargo.delete(EntityId::new(1)).await.unwrap();
    assert!(app.cargo.get(EntityId::new(1)).is_none());

    let err = app.cargo.delete(EntityId::new(1)).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(app.cargo.len(), 2);
}

#[tokio::test]
async fn backend_failures_leave_local_state_unchanged() {
    let server = TestServer::spawn(future_exp()).await;
    let (app, _storage) = server.app();
    app.session
        .login(&Credentials::new("aida", PASSWORD))
        .await
        .unwrap();
    let before = app.cargo.fetch_all().await.unwrap();

    server.backend.fail_cargo_list.store(true, Ordering::SeqCst);
    let err = app.cargo.fetch_all().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(app.cargo.items(), before);

    let mut invalid: Cargo = serde_json::from_value(cargo_json(0, 0.0)).unwrap();
    invalid.id = None;
    let err = app.cargo.create(&invalid).await.unwrap_err();
    assert_eq!(err.user_message(), "Weight must be positive");
    assert_eq!(app.cargo.items(), before);

    app.notifications.report_error(&err);
    assert_eq!(app.notifications.live()[0].message, "Weight must be positive");

    // The session survives ordinary backend errors.
    assert_eq!(app.current().status(), SessionStatus::Success);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let config = ClientConfig::new("http://127.0.0.1:9/api");
    let transport = ReqwestTransport::new(&config).unwrap();
    let storage = Arc::new(MemoryStorage::new());
    let app = AppState::with_transport(config, Arc::new(transport), storage.clone());

    let err = app
        .session
        .login(&Credentials::new("aida", PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Api(ApiError::Transport(_))));
    assert_eq!(app.current().status(), SessionStatus::Error);
    assert_eq!(storage.get("token"), None);
}
