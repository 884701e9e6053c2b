use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::models::{Bootcamp, CreateBootcamp, UpdateBootcamp};
use crate::services::BootcampApi;

use super::LoadStatus;

const FEATURED_COUNT: usize = 3;

const LOAD_LIST_FAILED: &str = "Erreur lors du chargement des bootcamps";
const LOAD_FEATURED_FAILED: &str = "Erreur lors du chargement des bootcamps en vedette";
const LOAD_ONE_FAILED: &str = "Erreur lors du chargement du bootcamp";
const CREATE_FAILED: &str = "Erreur lors de la création du bootcamp";
const UPDATE_FAILED: &str = "Erreur lors de la modification du bootcamp";
const DELETE_FAILED: &str = "Erreur lors de la suppression du bootcamp";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BootcampState {
    pub bootcamps: Vec<Bootcamp>,
    /// Active bootcamps shown on the home page, at most three
    pub featured_bootcamps: Vec<Bootcamp>,
    pub current_bootcamp: Option<Bootcamp>,
    pub status: LoadStatus,
    pub loading: bool,
    pub error: Option<String>,
}

impl BootcampState {
    fn begin(&mut self) {
        self.status = LoadStatus::Loading;
        self.loading = true;
        self.error = None;
    }

    fn settle(&mut self) {
        self.status = LoadStatus::Ready;
        self.loading = false;
    }

    fn fail(&mut self, message: String) {
        self.status = LoadStatus::Failed;
        self.loading = false;
        self.error = Some(message);
    }
}

pub struct BootcampStore {
    api: Arc<dyn BootcampApi>,
    state: RwLock<BootcampState>,
}

impl BootcampStore {
    pub fn new(api: Arc<dyn BootcampApi>) -> Self {
        Self {
            api,
            state: RwLock::new(BootcampState::default()),
        }
    }

    pub fn snapshot(&self) -> BootcampState {
        self.state.read().clone()
    }

    fn update(&self, f: impl FnOnce(&mut BootcampState)) {
        f(&mut self.state.write());
    }

    fn fail(&self, action: &str, err: &ClientError, fallback: &str) {
        warn!(action, error = %err, "Bootcamp action failed");
        let message = err.display_message(fallback);
        self.update(|s| s.fail(message));
    }

    /// Replace the list with the server's. On failure the previous list stays.
    pub async fn fetch_bootcamps(&self) -> BootcampState {
        self.update(BootcampState::begin);
        match self.api.list_bootcamps().await {
            Ok(bootcamps) => {
                debug!(count = bootcamps.len(), "Bootcamps loaded");
                self.update(|s| {
                    s.bootcamps = bootcamps;
                    s.settle();
                });
            }
            Err(e) => self.fail("fetch_bootcamps", &e, LOAD_LIST_FAILED),
        }
        self.snapshot()
    }

    pub async fn fetch_featured_bootcamps(&self) -> BootcampState {
        self.update(BootcampState::begin);
        match self.api.list_bootcamps().await {
            Ok(bootcamps) => {
                let featured: Vec<_> = bootcamps
                    .into_iter()
                    .filter(|b| b.is_active)
                    .take(FEATURED_COUNT)
                    .collect();
                self.update(|s| {
                    s.featured_bootcamps = featured;
                    s.settle();
                });
            }
            Err(e) => self.fail("fetch_featured_bootcamps", &e, LOAD_FEATURED_FAILED),
        }
        self.snapshot()
    }

    pub async fn fetch_bootcamp_by_id(&self, id: &str) -> BootcampState {
        self.update(BootcampState::begin);
        match self.api.get_bootcamp(id).await {
            Ok(bootcamp) => self.update(|s| {
                s.current_bootcamp = Some(bootcamp);
                s.settle();
            }),
            Err(e) => self.fail("fetch_bootcamp_by_id", &e, LOAD_ONE_FAILED),
        }
        self.snapshot()
    }

    /// Look a bootcamp up in the already loaded list, without a request.
    pub fn bootcamp_by_id(&self, id: &str) -> Option<Bootcamp> {
        self.state
            .read()
            .bootcamps
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    /// Create, then reload the full list to pick up server-assigned fields.
    pub async fn create_bootcamp(&self, data: &CreateBootcamp) -> BootcampState {
        self.update(BootcampState::begin);
        match self.api.create_bootcamp(data).await {
            Ok(created) => {
                debug!(id = %created.id, "Bootcamp created, reloading list");
                self.fetch_bootcamps().await;
                self.update(|s| s.loading = false);
            }
            Err(e) => self.fail("create_bootcamp", &e, CREATE_FAILED),
        }
        self.snapshot()
    }

    /// Update, then splice the returned record over the one with `id`.
    pub async fn update_bootcamp(&self, id: &str, data: &UpdateBootcamp) -> BootcampState {
        self.update(BootcampState::begin);
        match self.api.update_bootcamp(id, data).await {
            Ok(updated) => self.update(|s| {
                if let Some(slot) = s.bootcamps.iter_mut().find(|b| b.id == id) {
                    *slot = updated.clone();
                }
                if s.current_bootcamp.as_ref().is_some_and(|b| b.id == id) {
                    s.current_bootcamp = Some(updated);
                }
                s.settle();
            }),
            Err(e) => self.fail("update_bootcamp", &e, UPDATE_FAILED),
        }
        self.snapshot()
    }

    pub async fn delete_bootcamp(&self, id: &str) -> BootcampState {
        self.update(BootcampState::begin);
        match self.api.delete_bootcamp(id).await {
            Ok(_) => self.update(|s| {
                s.bootcamps.retain(|b| b.id != id);
                if s.current_bootcamp.as_ref().is_some_and(|b| b.id == id) {
                    s.current_bootcamp = None;
                }
                s.settle();
            }),
            Err(e) => self.fail("delete_bootcamp", &e, DELETE_FAILED),
        }
        self.snapshot()
    }

    pub fn clear_error(&self) -> BootcampState {
        self.update(|s| s.error = None);
        self.snapshot()
    }
}
