pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod mock;
pub mod models;
pub mod services;
pub mod storage;
pub mod stores;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use config::Config;
use error::Result;
use http::{ApiClient, SessionEvent};
use mock::{MockDelays, MockProvider};
use services::{BootcampService, FailClosed, LeadService, MockFallback, ReadFallback};
use storage::{FileStorage, SessionStorage};
use stores::{AuthStore, BootcampStore, LeadStore};

/// Everything the admin front end needs, wired over one shared client.
pub struct AppState {
    pub config: Config,
    pub client: Arc<ApiClient>,
    pub auth: Arc<auth::AuthService>,
    pub bootcamp_service: Arc<BootcampService>,
    pub lead_service: Arc<LeadService>,
    pub auth_store: AuthStore,
    pub bootcamps: BootcampStore,
    pub leads: LeadStore,
}

impl AppState {
    /// Build the state with sessions persisted to `session.storage_path`.
    pub fn new(config: Config) -> Result<Self> {
        let storage = FileStorage::open(&config.session.storage_path)?;
        Self::with_storage(config, Arc::new(storage))
    }

    pub fn with_storage(config: Config, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let client = Arc::new(ApiClient::from_config(&config, storage)?);

        let fallback: Arc<dyn ReadFallback> = if config.fallback.enabled {
            let delays = MockDelays::from_config(&config.fallback);
            Arc::new(MockFallback::new(MockProvider::new(delays)))
        } else {
            Arc::new(FailClosed)
        };

        let auth = Arc::new(auth::AuthService::new(
            client.clone(),
            fallback.clone(),
            config.demo.clone(),
        ));
        let bootcamp_service = Arc::new(BootcampService::new(client.clone(), fallback.clone()));
        let lead_service = Arc::new(LeadService::new(client.clone(), fallback));

        Ok(Self {
            auth_store: AuthStore::new(auth.clone()),
            bootcamps: BootcampStore::new(bootcamp_service.clone()),
            leads: LeadStore::new(lead_service.clone()),
            config,
            client,
            auth,
            bootcamp_service,
            lead_service,
        })
    }

    /// Keep the auth store in step with session teardowns done by the client.
    ///
    /// The task ends once the state is dropped.
    pub fn watch_session(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.client.subscribe();
        let state = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Expired { redirect_to }) => {
                        let Some(state) = state.upgrade() else {
                            break;
                        };
                        state.auth_store.session_expired();
                        info!(redirect_to = %redirect_to, "Session expired, login required");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session watcher fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
