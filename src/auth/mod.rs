//! Admin session management: login, refresh, profile, logout.
//!
//! The session lives in [`SessionStorage`] under four keys, written and
//! cleared together. `is_authenticated` and `current_user` only read
//! storage, they never touch the network.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::DemoConfig;
use crate::error::{ClientError, Result};
use crate::http::ApiClient;
use crate::mock::{demo_admin, DEMO_ACCESS_TOKEN, DEMO_REFRESH_TOKEN};
use crate::models::{Admin, ApiResponse, Credentials, LoginData, Session};
use crate::services::ReadFallback;
use crate::storage::{
    clear_session, SessionStorage, ADMIN_TOKEN, ADMIN_USER, LOGIN_TIMESTAMP, REFRESH_TOKEN,
};

pub const INVALID_CREDENTIALS: &str = "Email ou mot de passe incorrect";

#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileResponse {
    Bare(Admin),
    Wrapped(ApiResponse<Admin>),
}

pub struct AuthService {
    client: Arc<ApiClient>,
    fallback: Arc<dyn ReadFallback>,
    demo: DemoConfig,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>, fallback: Arc<dyn ReadFallback>, demo: DemoConfig) -> Self {
        Self {
            client,
            fallback,
            demo,
        }
    }

    fn storage(&self) -> &dyn SessionStorage {
        self.client.storage().as_ref()
    }

    /// Log in and persist the session.
    ///
    /// When the API cannot be reached and demo mode is enabled, the demo
    /// credentials produce a locally synthesized session; anything else is
    /// rejected as invalid credentials.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let response = self
            .client
            .post::<_, ApiResponse<LoginData>>("/auth/login", credentials)
            .await;

        match response {
            Ok(response) => {
                let timestamp = response.timestamp.clone();
                let data = response.into_result().map_err(|e| match e {
                    ClientError::Application(msg) if !msg.is_empty() => {
                        ClientError::InvalidCredentials(msg)
                    }
                    ClientError::Application(_) => {
                        ClientError::InvalidCredentials(INVALID_CREDENTIALS.to_string())
                    }
                    other => other,
                })?;

                let session = Session {
                    access_token: data.access_token,
                    refresh_token: data.refresh_token,
                    user: data.admin,
                    login_timestamp: timestamp.unwrap_or_else(|| Utc::now().to_rfc3339()),
                    demo: false,
                };
                self.persist(&session)?;
                info!(email = %session.user.email, "Admin logged in");
                Ok(session)
            }
            Err(ClientError::Http {
                status: 400 | 401,
                message,
            }) => Err(ClientError::InvalidCredentials(
                message.unwrap_or_else(|| INVALID_CREDENTIALS.to_string()),
            )),
            Err(e) if e.is_transport() && self.demo.enabled => {
                warn!(error = %e, "Auth API unreachable, falling back to demo login");
                self.demo_login(credentials)
            }
            Err(e) => Err(e),
        }
    }

    fn demo_login(&self, credentials: &Credentials) -> Result<Session> {
        if credentials.email != self.demo.email || credentials.password != self.demo.password {
            return Err(ClientError::InvalidCredentials(
                INVALID_CREDENTIALS.to_string(),
            ));
        }

        let session = Session {
            access_token: DEMO_ACCESS_TOKEN.to_string(),
            refresh_token: Some(DEMO_REFRESH_TOKEN.to_string()),
            user: demo_admin(),
            login_timestamp: Utc::now().to_rfc3339(),
            demo: true,
        };
        self.persist(&session)?;
        info!(email = %session.user.email, "Demo session created");
        Ok(session)
    }

    /// Write all four session keys, or none of them.
    fn persist(&self, session: &Session) -> Result<()> {
        let storage = self.storage();
        let written = write_session(storage, session);
        if let Err(e) = &written {
            warn!(error = %e, "Could not persist session, discarding partial write");
            if let Err(e) = clear_session(storage) {
                warn!(error = %e, "Failed to clear partial session");
            }
        }
        written
    }

    /// Exchange the stored refresh token for a new access token.
    pub async fn refresh(&self) -> Result<String> {
        self.client.refresh_access_token().await
    }

    /// Fetch the admin profile, caching it when a session exists.
    pub async fn profile(&self) -> Result<Admin> {
        let admin = match self.client.get::<ProfileResponse>("/auth/profile").await {
            Ok(ProfileResponse::Bare(admin)) => admin,
            Ok(ProfileResponse::Wrapped(response)) => response.into_result()?,
            Err(e) => return self.fallback.profile(e).await,
        };

        if self.is_authenticated() {
            self.storage()
                .set(ADMIN_USER, &serde_json::to_string(&admin)?)?;
        }
        Ok(admin)
    }

    /// Best-effort remote logout; the local session is always cleared.
    pub async fn logout(&self) {
        if let Err(e) = self
            .client
            .request_empty(Method::POST, "/auth/logout", None)
            .await
        {
            warn!(error = %e, "Logout request failed");
        }

        if let Err(e) = clear_session(self.storage()) {
            warn!(error = %e, "Failed to clear session storage on logout");
        }
        info!("Admin logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        let storage = self.storage();
        storage.get(ADMIN_TOKEN).is_some() && storage.get(ADMIN_USER).is_some()
    }

    pub fn current_user(&self) -> Option<Admin> {
        let raw = self.storage().get(ADMIN_USER)?;
        match serde_json::from_str(&raw) {
            Ok(admin) => Some(admin),
            Err(e) => {
                warn!(error = %e, "Stored admin user is not valid JSON");
                None
            }
        }
    }

    /// Rebuild the whole session from storage.
    pub fn current_session(&self) -> Option<Session> {
        let storage = self.storage();
        let access_token = storage.get(ADMIN_TOKEN)?;
        let user = self.current_user()?;
        Some(Session {
            demo: access_token == DEMO_ACCESS_TOKEN,
            access_token,
            refresh_token: storage.get(REFRESH_TOKEN),
            user,
            login_timestamp: storage.get(LOGIN_TIMESTAMP).unwrap_or_default(),
        })
    }
}

fn write_session(storage: &dyn SessionStorage, session: &Session) -> Result<()> {
    let user = serde_json::to_string(&session.user)?;
    storage.set(ADMIN_TOKEN, &session.access_token)?;
    match &session.refresh_token {
        Some(token) => storage.set(REFRESH_TOKEN, token)?,
        None => storage.remove(REFRESH_TOKEN)?,
    }
    storage.set(ADMIN_USER, &user)?;
    storage.set(LOGIN_TIMESTAMP, &session.login_timestamp)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDelays, MockProvider};
    use crate::services::{FailClosed, MockFallback};
    use crate::storage::{MemoryStorage, StorageError, SESSION_KEYS};
    use crate::test_support::{client_for, client_with_storage, spawn_server, unreachable_url};
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service_for(base: &str, demo: DemoConfig) -> (AuthService, Arc<MemoryStorage>) {
        let (client, storage) = client_for(base);
        let fallback = Arc::new(MockFallback::new(MockProvider::new(MockDelays::none())));
        (AuthService::new(client, fallback, demo), storage)
    }

    fn demo_credentials() -> Credentials {
        Credentials::new("admin@xarala.sn", "admin123")
    }

    async fn login(Json(body): Json<Value>) -> impl IntoResponse {
        if body["password"] == "s3cret" {
            (
                StatusCode::CREATED,
                Json(json!({
                    "success": true,
                    "data": {
                        "admin": {"id": "42", "name": "Khady Fall", "email": "khady@xarala.sn"},
                        "access_token": "live-access",
                        "refresh_token": "live-refresh"
                    },
                    "message": "Connexion réussie",
                    "timestamp": "2024-06-01T09:00:00.000Z"
                })),
            )
        } else if body["password"] == "disabled" {
            (
                StatusCode::OK,
                Json(json!({"success": false, "message": "Compte désactivé"})),
            )
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Identifiants invalides"})),
            )
        }
    }

    async fn logout(State(calls): State<Arc<AtomicUsize>>) -> StatusCode {
        calls.fetch_add(1, Ordering::SeqCst);
        StatusCode::NO_CONTENT
    }

    async fn profile() -> Json<Value> {
        Json(json!({"success": true, "data": {"id": "42", "name": "Khady Fall", "email": "khady@xarala.sn", "role": "admin"}}))
    }

    async fn auth_server() -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/logout", post(logout))
            .route("/auth/profile", get(profile))
            .with_state(calls.clone());
        (spawn_server(router).await, calls)
    }

    #[tokio::test]
    async fn test_demo_login_when_api_unreachable() {
        let (auth, storage) = service_for(&unreachable_url(), DemoConfig::default());
        assert!(!auth.is_authenticated());

        let session = auth.login(&demo_credentials()).await.unwrap();
        assert!(session.demo);
        assert!(auth.is_authenticated());
        assert_eq!(auth.current_user(), Some(demo_admin()));
        for key in SESSION_KEYS {
            assert!(storage.get(key).is_some(), "{} should be set", key);
        }
        assert!(auth.current_session().unwrap().demo);
    }

    #[tokio::test]
    async fn test_wrong_credentials_offline_are_rejected() {
        let (auth, _) = service_for(&unreachable_url(), DemoConfig::default());

        let result = auth
            .login(&Credentials::new("admin@xarala.sn", "wrong"))
            .await;
        match result {
            Err(ClientError::InvalidCredentials(msg)) => assert_eq!(msg, INVALID_CREDENTIALS),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_demo_disabled_surfaces_transport_error() {
        let demo = DemoConfig {
            enabled: false,
            ..Default::default()
        };
        let (auth, _) = service_for(&unreachable_url(), demo);
        assert!(auth.login(&demo_credentials()).await.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn test_live_login_persists_session() {
        let (base, _) = auth_server().await;
        let (auth, storage) = service_for(&base, DemoConfig::default());

        let session = auth
            .login(&Credentials::new("khady@xarala.sn", "s3cret"))
            .await
            .unwrap();
        assert!(!session.demo);
        assert_eq!(session.user.id, "42");
        assert_eq!(storage.get(ADMIN_TOKEN).as_deref(), Some("live-access"));
        assert_eq!(storage.get(REFRESH_TOKEN).as_deref(), Some("live-refresh"));
        assert_eq!(
            storage.get(LOGIN_TIMESTAMP).as_deref(),
            Some("2024-06-01T09:00:00.000Z")
        );
        assert_eq!(auth.current_user().unwrap().name, "Khady Fall");
    }

    #[tokio::test]
    async fn test_rejected_login_uses_server_message() {
        let (base, _) = auth_server().await;
        let (auth, _) = service_for(&base, DemoConfig::default());

        match auth.login(&Credentials::new("x@y.z", "nope")).await {
            Err(ClientError::InvalidCredentials(msg)) => assert_eq!(msg, "Identifiants invalides"),
            other => panic!("unexpected: {:?}", other),
        }

        match auth.login(&Credentials::new("x@y.z", "disabled")).await {
            Err(ClientError::InvalidCredentials(msg)) => assert_eq!(msg, "Compte désactivé"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_session_when_remote_fails() {
        let (auth, storage) = service_for(&unreachable_url(), DemoConfig::default());
        auth.login(&demo_credentials()).await.unwrap();

        auth.logout().await;

        for key in SESSION_KEYS {
            assert_eq!(storage.get(key), None, "{} should be cleared", key);
        }
        assert!(!auth.is_authenticated());
        assert_eq!(auth.current_user(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_session_when_remote_succeeds() {
        let (base, calls) = auth_server().await;
        let (auth, storage) = service_for(&base, DemoConfig::default());
        auth.login(&Credentials::new("khady@xarala.sn", "s3cret"))
            .await
            .unwrap();

        auth.logout().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for key in SESSION_KEYS {
            assert_eq!(storage.get(key), None);
        }
    }

    #[tokio::test]
    async fn test_refresh_requires_refresh_token() {
        let (auth, _) = service_for(&unreachable_url(), DemoConfig::default());
        assert!(matches!(
            auth.refresh().await,
            Err(ClientError::NoRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_profile_live_and_fallback() {
        let (base, _) = auth_server().await;
        let (auth, _) = service_for(&base, DemoConfig::default());
        let admin = auth.profile().await.unwrap();
        assert_eq!(admin.role.as_deref(), Some("admin"));

        let (offline, _) = service_for(&unreachable_url(), DemoConfig::default());
        assert_eq!(offline.profile().await.unwrap(), demo_admin());

        let (client, _) = client_for(&unreachable_url());
        let strict = AuthService::new(client, Arc::new(FailClosed), DemoConfig::default());
        tokio_test::assert_err!(strict.profile().await);
    }

    #[test]
    fn test_corrupt_stored_user_reads_as_none() {
        let (auth, storage) = service_for("http://127.0.0.1:1", DemoConfig::default());
        storage.set(ADMIN_TOKEN, "t").unwrap();
        storage.set(ADMIN_USER, "{not json").unwrap();
        assert!(auth.is_authenticated());
        assert_eq!(auth.current_user(), None);
        assert_eq!(auth.current_session(), None);
    }

    /// Memory storage whose writes to one key always fail.
    struct FailingKey {
        inner: MemoryStorage,
        key: &'static str,
    }

    impl SessionStorage for FailingKey {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
            if key == self.key {
                return Err(StorageError::Io {
                    path: "session.json".into(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_no_partial_session() {
        let storage = Arc::new(FailingKey {
            inner: MemoryStorage::new(),
            key: ADMIN_USER,
        });
        let client = client_with_storage(&unreachable_url(), storage.clone());
        let fallback = Arc::new(MockFallback::new(MockProvider::new(MockDelays::none())));
        let auth = AuthService::new(client, fallback, DemoConfig::default());

        let result = auth.login(&demo_credentials()).await;
        assert!(matches!(result, Err(ClientError::Storage(_))));
        for key in SESSION_KEYS {
            assert_eq!(storage.get(key), None, "{} should not be left behind", key);
        }
        assert!(!auth.is_authenticated());
    }
}
