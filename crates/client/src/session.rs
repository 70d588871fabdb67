//! Session store: token, expiry, current user, derived permissions.
//!
//! [`Session`] is the synchronous state container every component shares.
//! [`SessionStore`] drives the network side (login, refresh, loading the
//! current user) and mutates the `Session` only at well-defined points:
//!
//! ```text
//! Anonymous ──login──▶ Loading ──ok──▶ Success
//!     ▲                   │
//!     │                   └──err──▶ Error ──login──▶ Loading …
//!     └──────── logout (from any state) ────────────
//! ```

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use freightdesk_auth::{
    authorize, decode_claims, AccessMask, Action, AuthzError, Credentials, PermissionSet, Role,
    TokenClaims, User,
};

use crate::api::{ApiClient, RequestOptions};
use crate::error::{extract_message, ApiError, SessionError, FALLBACK_MESSAGE};
use crate::storage::{TokenStorage, EXPIRY_KEY, TOKEN_KEY};
use crate::transport::Method;

pub const LOGIN_PATH: &str = "/public/auth/login";
pub const REFRESH_PATH: &str = "/public/auth/refreshToken";
pub const CURRENT_USER_PATH: &str = "/auth/current";

/// Authentication status of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No authentication attempted (or logged out).
    #[default]
    Anonymous,
    /// Login or refresh in flight.
    Loading,
    /// A token is held.
    Success,
    /// The last login or refresh failed.
    Error,
}

/// Notable session transitions, broadcast to whoever renders the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    UserLoaded,
    LoggedOut,
    /// The backend rejected the token; the UI should return to the login view.
    ForcedLogout { status: u16 },
}

#[derive(Debug, Default)]
struct SessionState {
    token: String,
    status: SessionStatus,
    user: Option<User>,
    permissions: PermissionSet,
    expiry_millis: Option<i64>,
    last_error: Option<String>,
}

/// Shared, synchronous session state.
pub struct Session {
    state: RwLock<SessionState>,
    storage: Arc<dyn TokenStorage>,
    events: broadcast::Sender<SessionEvent>,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.read();
        f.debug_struct("Session")
            .field("status", &state.status)
            .field("has_token", &!state.token.is_empty())
            .field("expiry_millis", &state.expiry_millis)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            state: RwLock::new(SessionState::default()),
            storage,
            events,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ── queries ──────────────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.read().status
    }

    /// In-memory token; empty when unauthenticated.
    pub fn token(&self) -> String {
        self.read().token.clone()
    }

    /// Token as persisted in storage (what outgoing requests carry).
    pub fn persisted_token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn is_logged_in(&self) -> bool {
        !self.read().token.is_empty()
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn active_role(&self) -> Option<Role> {
        self.read().user.as_ref().and_then(|u| u.active_role().cloned())
    }

    pub fn permissions(&self) -> PermissionSet {
        self.read().permissions.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    /// Expiry as epoch milliseconds, from memory or the persisted value.
    pub fn expiry_millis(&self) -> Option<i64> {
        self.read()
            .expiry_millis
            .or_else(|| self.storage.get(EXPIRY_KEY).and_then(|v| v.parse().ok()))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry_millis().and_then(DateTime::from_timestamp_millis)
    }

    /// True once the recorded expiry has passed. Unknown expiry is not expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_millis()
            .is_some_and(|exp| now.timestamp_millis() >= exp)
    }

    pub fn check_access(&self, view: &str, action: Action) -> bool {
        self.read().permissions.check_access(view, action)
    }

    pub fn check_access_any(&self, view: &str, requested: AccessMask) -> bool {
        self.read().permissions.check_access_any(view, requested)
    }

    pub fn authorize(&self, view: &str, action: Action) -> Result<(), AuthzError> {
        let state = self.read();
        if state.token.is_empty() {
            return Err(AuthzError::Unauthenticated);
        }
        authorize(&state.permissions, view, action)
    }

    // ── transitions ──────────────────────────────────────────────────────────

    pub(crate) fn begin_auth(&self) {
        let mut state = self.write();
        state.status = SessionStatus::Loading;
        state.last_error = None;
    }

    pub(crate) fn auth_success(&self, token: &str) {
        let mut state = self.write();
        state.status = SessionStatus::Success;
        state.token = token.to_string();
        state.last_error = None;
        if state.expiry_millis.is_none() {
            state.expiry_millis = self.storage.get(EXPIRY_KEY).and_then(|v| v.parse().ok());
        }
    }

    /// Failed login/refresh: forget the token, user, and permissions, and
    /// remember why.
    pub(crate) fn auth_error(&self, message: impl Into<String>) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(EXPIRY_KEY);
        let mut state = self.write();
        *state = SessionState {
            status: SessionStatus::Error,
            last_error: Some(message.into()),
            ..SessionState::default()
        };
    }

    /// Persist a freshly issued token with its decoded expiry.
    pub(crate) fn store_token(&self, token: &str, claims: &TokenClaims) {
        self.storage.set(TOKEN_KEY, token.to_string());
        self.storage.set(EXPIRY_KEY, claims.expiry_millis().to_string());
        self.write().expiry_millis = Some(claims.expiry_millis());
    }

    /// Replace the current user; the permission set is rebuilt in the same
    /// write so readers never see a user with stale permissions.
    pub fn set_user(&self, user: User) {
        let permissions = PermissionSet::from_user(&user);
        {
            let mut state = self.write();
            state.permissions = permissions;
            state.user = Some(user);
        }
        self.emit(SessionEvent::UserLoaded);
    }

    /// Reset to anonymous and forget the persisted token. Always succeeds.
    pub fn logout(&self) {
        self.reset();
        self.emit(SessionEvent::LoggedOut);
    }

    pub(crate) fn force_logout(&self, status: u16) {
        self.reset();
        self.emit(SessionEvent::ForcedLogout { status });
    }

    fn reset(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(EXPIRY_KEY);
        let mut state = self.write();
        *state = SessionState::default();
    }
}

/// Network side of the session: login, refresh, loading the current user.
#[derive(Debug, Clone)]
pub struct SessionStore {
    api: ApiClient,
}

impl SessionStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.api.session()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Exchange credentials for a token, then load the current user.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenClaims, SessionError> {
        let session = self.session();
        let options = RequestOptions::json(credentials)?;
        session.begin_auth();
        tracing::info!(username = %credentials.username, "logging in");

        let response = match self.api.send_raw(Method::Post, LOGIN_PATH, options).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                session.auth_error(e.user_message());
                return Err(SessionError::Api(e));
            }
        };

        if let Some(rc) = response.result_code.as_ref().filter(|rc| !rc.is_ok()) {
            let message = extract_message(&response.data)
                .or_else(|| rc.value.clone())
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
            tracing::warn!(code = ?rc.value, "login rejected");
            session.auth_error(message.clone());
            return Err(SessionError::Rejected(message));
        }

        let claims = self.accept_token(response.data).await?;
        session.emit(SessionEvent::LoggedIn);
        tracing::info!(exp = claims.exp, "logged in");
        Ok(claims)
    }

    /// Exchange the current token for a fresh one.
    pub async fn refresh_token(&self) -> Result<TokenClaims, SessionError> {
        let session = self.session();
        let current = session
            .persisted_token()
            .unwrap_or_else(|| session.token());
        if current.is_empty() {
            session.auth_error("no session to refresh");
            return Err(SessionError::Rejected("no session to refresh".to_string()));
        }

        let path = format!("{REFRESH_PATH}/{current}");
        let data = match self.api.send_raw(Method::Get, &path, RequestOptions::new()).await {
            Ok(response) => response.data,
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed");
                session.auth_error(e.user_message());
                return Err(SessionError::Api(e));
            }
        };

        let claims = self.accept_token(data).await?;
        tracing::info!(exp = claims.exp, "token refreshed");
        Ok(claims)
    }

    /// Restore the session from a persisted token and load the current user.
    ///
    /// Returns `Ok(None)` when no token is persisted. A failing user fetch is
    /// reported but does not end the session.
    pub async fn init(&self) -> Result<Option<User>, SessionError> {
        let session = self.session();
        let Some(token) = session.persisted_token() else {
            return Ok(None);
        };
        session.auth_success(&token);

        match self.api.get::<User>(CURRENT_USER_PATH).await {
            Ok(user) => {
                tracing::debug!(login = %user.login, roles = user.roles.len(), "current user loaded");
                session.set_user(user.clone());
                Ok(Some(user))
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load current user");
                Err(SessionError::Api(e))
            }
        }
    }

    pub fn logout(&self) {
        tracing::info!("logging out");
        self.session().logout();
    }

    /// Decode, persist, and activate a token, then load the user (soft-fail).
    async fn accept_token(&self, data: serde_json::Value) -> Result<TokenClaims, SessionError> {
        let session = self.session();

        let Some(token) = data.as_str().map(str::to_string).filter(|t| !t.is_empty()) else {
            session.auth_error(FALLBACK_MESSAGE);
            return Err(SessionError::Api(ApiError::Decode(
                "authentication response carried no token".to_string(),
            )));
        };

        let claims = match decode_claims(&token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(error = %e, "backend issued an undecodable token");
                session.auth_error(FALLBACK_MESSAGE);
                return Err(SessionError::Token(e));
            }
        };

        session.store_token(&token, &claims);
        session.auth_success(&token);

        if let Err(e) = self.init().await {
            tracing::warn!(error = %e, "signed in, but the user record is unavailable");
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing::client;
    use crate::storage::MemoryStorage;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use freightdesk_auth::Permission;
    use serde_json::json;

    fn session() -> Session {
        Session::new(Arc::new(MemoryStorage::new()))
    }

    fn cargo_user(active: bool) -> User {
        let mut role = Role::new("dispatcher")
            .with_permission(Permission::new("cargo", AccessMask::from_bits_truncate(12)));
        role.active = active;
        User {
            login: "aida".to_string(),
            roles: vec![role],
            ..Default::default()
        }
    }

    #[test]
    fn starts_anonymous() {
        let s = session();
        assert_eq!(s.status(), SessionStatus::Anonymous);
        assert!(!s.is_logged_in());
        assert!(s.user().is_none());
        assert_eq!(s.authorize("cargo", Action::Read), Err(AuthzError::Unauthenticated));
    }

    #[test]
    fn set_user_recomputes_permissions() {
        let s = session();
        s.set_user(cargo_user(true));
        assert!(s.check_access("cargo", Action::Read));

        s.set_user(cargo_user(false));
        assert!(!s.check_access("cargo", Action::Read));
        assert!(s.permissions().is_empty());
    }

    #[test]
    fn auth_error_clears_persisted_token() {
        let storage = Arc::new(MemoryStorage::with_token("stale"));
        let s = Session::new(storage.clone());
        s.begin_auth();
        s.auth_error("bad credentials");

        assert_eq!(s.status(), SessionStatus::Error);
        assert_eq!(storage.get(TOKEN_KEY), None);
        assert_eq!(s.last_error().as_deref(), Some("bad credentials"));
    }

    #[test]
    fn auth_error_revokes_previous_user_and_permissions() {
        let storage = Arc::new(MemoryStorage::new());
        let s = Session::new(storage.clone());
        let claims = TokenClaims { exp: 2_000_000_000, sub: None, iat: None };
        s.store_token("tok", &claims);
        s.auth_success("tok");
        s.set_user(cargo_user(true));
        assert!(s.check_access("cargo", Action::Read));

        s.auth_error("refresh failed");

        assert_eq!(s.status(), SessionStatus::Error);
        assert!(!s.is_logged_in());
        assert!(s.token().is_empty());
        assert!(s.user().is_none());
        assert!(s.active_role().is_none());
        assert!(s.permissions().is_empty());
        assert!(s.expiry_millis().is_none());
        assert!(!s.check_access("cargo", Action::Read));
        assert_eq!(s.authorize("cargo", Action::Read), Err(AuthzError::Unauthenticated));
        assert_eq!(storage.get(EXPIRY_KEY), None);
        assert_eq!(s.last_error().as_deref(), Some("refresh failed"));
    }

    #[test]
    fn logout_resets_everything() {
        let storage = Arc::new(MemoryStorage::new());
        let s = Session::new(storage.clone());
        let claims = TokenClaims { exp: 2_000_000_000, sub: None, iat: None };
        s.store_token("tok", &claims);
        s.auth_success("tok");
        s.set_user(cargo_user(true));
        let mut events = s.subscribe();

        s.logout();

        assert_eq!(s.status(), SessionStatus::Anonymous);
        assert!(s.token().is_empty());
        assert!(s.user().is_none());
        assert!(s.expiry_millis().is_none());
        assert!(!s.check_access("cargo", Action::Read));
        assert_eq!(storage.get(TOKEN_KEY), None);
        assert_eq!(storage.get(EXPIRY_KEY), None);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);
    }

    #[test]
    fn expiry_comes_from_persisted_value() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(EXPIRY_KEY, "1700000000000".to_string());
        let s = Session::new(storage);

        let before = DateTime::from_timestamp(1_699_999_999, 0).unwrap();
        let after = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(s.expiry_millis(), Some(1_700_000_000_000));
        assert!(!s.is_expired(before));
        assert!(s.is_expired(after));
    }

    #[test]
    fn force_logout_emits_event() {
        let s = session();
        let mut events = s.subscribe();
        s.force_logout(401);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::ForcedLogout { status: 401 });
    }

    fn mint_jwt(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(json!({ "alg": "none" }).to_string());
        let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": "aida", "exp": exp }).to_string());
        format!("{header}.{payload}.sig")
    }

    fn ok(result: serde_json::Value) -> serde_json::Value {
        json!({ "resultCode": { "value": "OK", "httpCode": 200 }, "result": result })
    }

    fn cargo_user_json() -> serde_json::Value {
        json!({
            "id": 1, "login": "aida",
            "roles": [{
                "id": 10, "name": "dispatcher", "active": true,
                "permissions": [{ "id": 100, "name": { "value": "cargo" }, "access": 12 }]
            }]
        })
    }

    #[tokio::test]
    async fn failed_refresh_ends_the_session() {
        let (api, transport) = client();
        let store = SessionStore::new(api);
        transport.reply(200, ok(cargo_user_json()));
        store.init().await.unwrap();
        let session = store.session();
        assert!(session.check_access("cargo", Action::Read));

        transport.reply(500, json!({ "message": "down" }));
        let err = store.refresh_token().await.unwrap_err();

        assert!(matches!(err, SessionError::Api(ApiError::Status { status: 500, .. })));
        assert_eq!(session.status(), SessionStatus::Error);
        assert!(session.token().is_empty());
        assert!(session.persisted_token().is_none());
        assert!(session.user().is_none());
        assert!(session.permissions().is_empty());
        assert!(!session.check_access("cargo", Action::Read));
        assert_eq!(session.last_error().as_deref(), Some("down"));
        assert!(transport.requests()[1].url.ends_with("/public/auth/refreshToken/tok"));
    }

    #[tokio::test]
    async fn init_keeps_the_token_when_the_user_fetch_fails() {
        let (api, transport) = client();
        let store = SessionStore::new(api);
        transport.reply(500, json!({ "message": "down" }));

        let err = store.init().await.unwrap_err();

        let session = store.session();
        assert!(matches!(err, SessionError::Api(_)));
        assert_eq!(session.status(), SessionStatus::Success);
        assert!(session.is_logged_in());
        assert_eq!(session.persisted_token().as_deref(), Some("tok"));
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn login_succeeds_without_the_user_record() {
        let (api, transport) = client();
        let store = SessionStore::new(api);
        let exp = 2_000_000_000;
        let token = mint_jwt(exp);
        transport.reply(200, ok(json!(token)));
        transport.reply(500, json!({ "message": "down" }));
        let mut events = store.session().subscribe();

        let claims = store.login(&Credentials::new("aida", "secret")).await.unwrap();

        let session = store.session();
        assert_eq!(claims.exp, exp);
        assert_eq!(session.status(), SessionStatus::Success);
        assert_eq!(session.persisted_token().as_deref(), Some(token.as_str()));
        assert_eq!(session.expiry_millis(), Some(exp * 1000));
        assert!(session.user().is_none());
        assert!(!session.check_access("cargo", Action::Read));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedIn);
        assert_eq!(transport.requests().len(), 2);
    }
}
