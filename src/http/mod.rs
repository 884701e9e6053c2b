//! HTTP client for the bootcamp API.
//!
//! Every request gets the base URL, JSON headers, a fixed timeout and,
//! when a session exists, `Authorization: Bearer <adminToken>`.
//!
//! A 401 triggers exactly one refresh using the stored refresh token,
//! then the original request is replayed with the new access token.
//! Refreshes are single-flight: concurrent 401s wait on one refresh and
//! reuse its token. When no refresh token exists, the refresh fails, or
//! the replay is rejected again, the session is wiped and
//! [`SessionEvent::Expired`] is broadcast so the front end can send the
//! user back to the login page.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::{ApiConfig, Config, SessionConfig};
use crate::error::{extract_message, ClientError, Result};
use crate::storage::{clear_session, SessionStorage, ADMIN_TOKEN, REFRESH_TOKEN};

const LOGIN_PATH: &str = "/auth/login";
const REFRESH_PATH: &str = "/auth/refresh";
const LOGOUT_PATH: &str = "/auth/logout";

/// Session lifecycle notifications for the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session was torn down; the user must log in again at `redirect_to`.
    Expired { redirect_to: String },
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    base: Url,
    login_path: String,
    storage: Arc<dyn SessionStorage>,
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    pub fn new(
        api: &ApiConfig,
        session: &SessionConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(format!("bootcamp-admin/{}", env!("CARGO_PKG_VERSION")))
            .timeout(api.timeout())
            .build()?;

        let base_url = api.resolved_base_url();
        let base = Url::parse(&base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url));
        }
        debug!(base_url = %base_url, "API client configured");

        let (events, _) = broadcast::channel(16);

        Ok(Self {
            http,
            base_url,
            base,
            login_path: session.login_path.clone(),
            storage,
            refresh_lock: Mutex::new(()),
            events,
        })
    }

    pub fn from_config(config: &Config, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        Self::new(&config.api, &config.session, storage)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Listen for session teardown.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Join raw segments into a request path, each percent-encoded as a
    /// single segment so ids can never climb into another resource.
    ///
    /// `resource_path(&["leads", "42", "status"])` gives `/leads/42/status`.
    pub fn resource_path(&self, segments: &[&str]) -> Result<String> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(ClientError::InvalidUrl(format!(
                "{:?} is not a valid path segment",
                bad
            )));
        }

        let mut url = self.base.clone();
        let prefix = url.path().trim_end_matches('/').len();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.path()[prefix..].to_string())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, None, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(serde_json::to_value(body)?), None)
            .await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, path, Some(serde_json::to_value(body)?), None)
            .await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(serde_json::to_value(body)?), None)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::DELETE, path, None, None).await
    }

    /// Send a request and decode the JSON body.
    ///
    /// `headers` are merged over the client defaults. When a session exists
    /// its bearer token replaces any `Authorization` passed here.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<T> {
        let response = self.execute(method, path, body, headers.as_ref()).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request whose body, if any, is not needed (e.g. a 204).
    pub async fn request_empty(&self, method: Method, path: &str, body: Option<Value>) -> Result<()> {
        self.execute(method, path, body, None).await.map(|_| ())
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<&HeaderMap>,
    ) -> Result<Response> {
        let token = self.storage.get(ADMIN_TOKEN);
        let response = self
            .send(&method, path, body.as_ref(), headers, token.as_deref())
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED || !can_refresh(path) {
            return check_status(response).await;
        }

        debug!(path, "Got 401, attempting token refresh");
        let fresh = self.refresh_after_unauthorized(token.as_deref()).await?;

        let replay = self
            .send(&method, path, body.as_ref(), headers, Some(&fresh))
            .await?;
        if replay.status() == StatusCode::UNAUTHORIZED {
            warn!(path, "Request rejected again after token refresh");
            self.expire_session();
            return Err(ClientError::SessionExpired);
        }
        check_status(replay).await
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        headers: Option<&HeaderMap>,
        token: Option<&str>,
    ) -> Result<Response> {
        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(headers) = headers {
            let mut headers = headers.clone();
            if token.is_some() {
                headers.remove(AUTHORIZATION);
            }
            request = request.headers(headers);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %method, path, "API request");
        let response = request.send().await.map_err(|e| {
            warn!(method = %method, path, error = %e, "API request failed");
            ClientError::from(e)
        })?;
        debug!(status = response.status().as_u16(), path, "API response");

        Ok(response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Get a usable access token after `stale` was rejected.
    async fn refresh_after_unauthorized(&self, stale: Option<&str>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        // A concurrent request may have refreshed while we waited on the lock
        if let Some(current) = self.storage.get(ADMIN_TOKEN) {
            if Some(current.as_str()) != stale {
                debug!("Reusing access token refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.storage.get(REFRESH_TOKEN) else {
            warn!("Received 401 with no refresh token stored");
            self.expire_session();
            return Err(ClientError::SessionExpired);
        };

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(token) => {
                self.storage.set(ADMIN_TOKEN, &token)?;
                info!("Access token refreshed");
                Ok(token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.expire_session();
                Err(ClientError::SessionExpired)
            }
        }
    }

    /// Explicit refresh, outside the 401 path. Does not tear the session down on failure.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let refresh_token = self
            .storage
            .get(REFRESH_TOKEN)
            .ok_or(ClientError::NoRefreshToken)?;

        let _guard = self.refresh_lock.lock().await;
        let token = self.exchange_refresh_token(&refresh_token).await?;
        self.storage.set(ADMIN_TOKEN, &token)?;
        Ok(token)
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<String> {
        let body = serde_json::json!({ "refreshToken": refresh_token });
        let response = self
            .send(&Method::POST, REFRESH_PATH, Some(&body), None, None)
            .await?;
        let response = check_status(response).await?;
        let value: Value = serde_json::from_slice(&response.bytes().await?)?;

        access_token_from(&value)
            .ok_or_else(|| ClientError::Decode("refresh response has no access token".to_string()))
    }

    /// Wipe every session key and announce the redirect to the login page.
    pub fn expire_session(&self) {
        if let Err(e) = clear_session(self.storage.as_ref()) {
            error!(error = %e, "Failed to clear session storage");
        }
        info!(redirect_to = %self.login_path, "Session expired");
        // no subscribers is fine
        let _ = self.events.send(SessionEvent::Expired {
            redirect_to: self.login_path.clone(),
        });
    }
}

fn can_refresh(path: &str) -> bool {
    let path = format!("/{}", path.trim_start_matches('/'));
    ![LOGIN_PATH, REFRESH_PATH, LOGOUT_PATH].contains(&path.as_str())
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body);
    warn!(
        status = status.as_u16(),
        message = message.as_deref().unwrap_or(""),
        "API error response"
    );

    Err(ClientError::Http {
        status: status.as_u16(),
        message,
    })
}

/// The refresh endpoint has answered with `access_token`, `accessToken`,
/// and both wrapped in `data`.
fn access_token_from(value: &Value) -> Option<String> {
    std::iter::once(value)
        .chain(value.get("data"))
        .flat_map(|scope| ["access_token", "accessToken"].map(|key| scope.get(key)))
        .flatten()
        .find_map(|token| token.as_str().map(str::to_string))
}
