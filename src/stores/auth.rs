use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::auth::AuthService;
use crate::models::{Admin, Credentials};

use super::LoadStatus;

const LOGIN_FAILED: &str = "Erreur de connexion";
const SESSION_EXPIRED: &str = "Session expirée, veuillez vous reconnecter";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<Admin>,
    pub is_authenticated: bool,
    pub status: LoadStatus,
    pub loading: bool,
    pub error: Option<String>,
}

/// Session state as the admin screens see it, mirrored from [`AuthService`].
pub struct AuthStore {
    auth: Arc<AuthService>,
    state: RwLock<AuthState>,
}

impl AuthStore {
    pub fn new(auth: Arc<AuthService>) -> Self {
        let store = Self {
            auth,
            state: RwLock::new(AuthState::default()),
        };
        store.check_auth();
        store
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.read().clone()
    }

    pub async fn login(&self, credentials: &Credentials) -> AuthState {
        {
            let mut s = self.state.write();
            s.status = LoadStatus::Loading;
            s.loading = true;
            s.error = None;
        }

        let result = self.auth.login(credentials).await;

        let mut s = self.state.write();
        s.loading = false;
        match result {
            Ok(session) => {
                s.user = Some(session.user);
                s.is_authenticated = true;
                s.status = LoadStatus::Ready;
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                // A rejected attempt leaves whatever session storage still holds
                let user = self.stored_user();
                s.is_authenticated = user.is_some();
                s.user = user;
                s.status = LoadStatus::Failed;
                s.error = Some(e.display_message(LOGIN_FAILED));
            }
        }
        s.clone()
    }

    /// Never fails: the local session is dropped even if the API call errors.
    pub async fn logout(&self) -> AuthState {
        self.auth.logout().await;
        let mut s = self.state.write();
        *s = AuthState {
            status: LoadStatus::Ready,
            ..Default::default()
        };
        s.clone()
    }

    /// Re-derive the state from persisted storage, without a request.
    pub fn check_auth(&self) -> AuthState {
        let user = self.stored_user();
        debug!(is_authenticated = user.is_some(), "Checked stored session");

        let mut s = self.state.write();
        s.is_authenticated = user.is_some();
        s.user = user;
        s.clone()
    }

    fn stored_user(&self) -> Option<Admin> {
        if self.auth.is_authenticated() {
            self.auth.current_user()
        } else {
            None
        }
    }

    /// Drop the user after the client tore the session down.
    pub fn session_expired(&self) -> AuthState {
        let mut s = self.state.write();
        s.user = None;
        s.is_authenticated = false;
        s.loading = false;
        s.status = LoadStatus::Idle;
        s.error = Some(SESSION_EXPIRED.to_string());
        s.clone()
    }

    pub fn clear_error(&self) -> AuthState {
        let mut s = self.state.write();
        s.error = None;
        s.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;
    use crate::mock::{demo_admin, MockDelays, MockProvider};
    use crate::services::MockFallback;
    use crate::storage::{MemoryStorage, SessionStorage, ADMIN_TOKEN};
    use crate::test_support::{client_for, client_with_storage, unreachable_url};

    fn offline_store() -> (AuthStore, Arc<MemoryStorage>) {
        let (client, storage) = client_for(&unreachable_url());
        let fallback = Arc::new(MockFallback::new(MockProvider::new(MockDelays::none())));
        let service = AuthService::new(client, fallback, DemoConfig::default());
        (AuthStore::new(Arc::new(service)), storage)
    }

    #[tokio::test]
    async fn test_demo_login_and_logout() {
        let (store, storage) = offline_store();
        assert!(!store.snapshot().is_authenticated);

        let state = store
            .login(&Credentials::new("admin@xarala.sn", "admin123"))
            .await;
        assert!(state.is_authenticated);
        assert_eq!(state.user, Some(demo_admin()));
        assert_eq!(state.status, LoadStatus::Ready);
        assert!(!state.loading);
        assert!(storage.get(ADMIN_TOKEN).is_some());

        let state = store.logout().await;
        assert!(!state.is_authenticated);
        assert_eq!(state.user, None);
        assert_eq!(storage.get(ADMIN_TOKEN), None);
    }

    #[tokio::test]
    async fn test_failed_login_sets_error() {
        let (store, _) = offline_store();

        let state = store
            .login(&Credentials::new("admin@xarala.sn", "nope"))
            .await;
        assert!(!state.is_authenticated);
        assert_eq!(state.status, LoadStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("Email ou mot de passe incorrect"));

        assert_eq!(store.clear_error().error, None);
        assert_eq!(store.clear_error().error, None);
    }

    #[tokio::test]
    async fn test_failed_login_keeps_existing_session() {
        let (store, storage) = offline_store();
        store
            .login(&Credentials::new("admin@xarala.sn", "admin123"))
            .await;

        let state = store
            .login(&Credentials::new("admin@xarala.sn", "wrong"))
            .await;
        assert_eq!(state.status, LoadStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("Email ou mot de passe incorrect"));
        assert!(storage.get(ADMIN_TOKEN).is_some());
        assert!(state.is_authenticated);
        assert_eq!(state.is_authenticated, store.auth.is_authenticated());
        assert_eq!(state.user, Some(demo_admin()));
    }

    #[tokio::test]
    async fn test_check_auth_restores_from_storage() {
        let (first, storage) = offline_store();
        first
            .login(&Credentials::new("admin@xarala.sn", "admin123"))
            .await;

        let client = client_with_storage(&unreachable_url(), storage.clone());
        let service = AuthService::new(
            client,
            Arc::new(MockFallback::new(MockProvider::new(MockDelays::none()))),
            DemoConfig::default(),
        );
        let second = AuthStore::new(Arc::new(service));

        let state = second.snapshot();
        assert!(state.is_authenticated);
        assert_eq!(state.user.unwrap().email, "admin@xarala.sn");
    }

    #[tokio::test]
    async fn test_session_expired_drops_user() {
        let (store, _) = offline_store();
        store
            .login(&Credentials::new("admin@xarala.sn", "admin123"))
            .await;

        let state = store.session_expired();
        assert!(!state.is_authenticated);
        assert_eq!(state.user, None);
        assert_eq!(state.error.as_deref(), Some(SESSION_EXPIRED));
    }
}
