use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::models::{CreateLead, Lead, LeadStatus, Pagination};
use crate::services::LeadApi;

use super::LoadStatus;

/// Page the list returns to after a lead is created.
const FIRST_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;

const LOAD_LIST_FAILED: &str = "Erreur lors du chargement des leads";
const LOAD_ONE_FAILED: &str = "Erreur lors du chargement du lead";
const CREATE_FAILED: &str = "Erreur lors de la création du lead";
const STATUS_FAILED: &str = "Erreur lors de la mise à jour du statut";
const DELETE_FAILED: &str = "Erreur lors de la suppression du lead";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadState {
    pub leads: Vec<Lead>,
    pub current_lead: Option<Lead>,
    pub pagination: Pagination,
    pub status: LoadStatus,
    pub loading: bool,
    pub error: Option<String>,
}

impl LeadState {
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

pub struct LeadStore {
    api: Arc<dyn LeadApi>,
    state: RwLock<LeadState>,
}

impl LeadStore {
    pub fn new(api: Arc<dyn LeadApi>) -> Self {
        Self {
            api,
            state: RwLock::new(LeadState::default()),
        }
    }

    pub fn snapshot(&self) -> LeadState {
        self.state.read().clone()
    }

    fn update(&self, f: impl FnOnce(&mut LeadState)) {
        f(&mut self.state.write());
    }

    fn fail(&self, action: &str, err: &ClientError, fallback: &str) {
        warn!(action, error = %err, "Lead action failed");
        let message = err.display_message(fallback);
        self.update(|s| s.fail(message));
    }

    /// Load one page of leads.
    ///
    /// Overlapping calls are not sequenced: the response that arrives last
    /// overwrites the list and pagination, whichever page it was for.
    pub async fn fetch_leads(&self, page: u32, limit: u32) -> LeadState {
        self.update(LeadState::begin);
        match self.api.list_leads(page, limit).await {
            Ok(result) => {
                debug!(page, limit, count = result.items.len(), "Leads loaded");
                self.update(|s| {
                    s.leads = result.items;
                    s.pagination = result.pagination;
                    s.settle();
                });
            }
            Err(e) => self.fail("fetch_leads", &e, LOAD_LIST_FAILED),
        }
        self.snapshot()
    }

    pub async fn fetch_lead_by_id(&self, id: &str) -> LeadState {
        self.update(LeadState::begin);
        match self.api.get_lead(id).await {
            Ok(lead) => self.update(|s| {
                s.current_lead = Some(lead);
                s.settle();
            }),
            Err(e) => self.fail("fetch_lead_by_id", &e, LOAD_ONE_FAILED),
        }
        self.snapshot()
    }

    /// Create, then reload the first page.
    pub async fn create_lead(&self, data: &CreateLead) -> LeadState {
        self.update(LeadState::begin);
        match self.api.create_lead(data).await {
            Ok(created) => {
                debug!(id = %created.id, "Lead created, reloading first page");
                self.fetch_leads(FIRST_PAGE, DEFAULT_LIMIT).await;
                self.update(|s| s.loading = false);
            }
            Err(e) => self.fail("create_lead", &e, CREATE_FAILED),
        }
        self.snapshot()
    }

    /// Change a lead's status and splice the returned record in place.
    pub async fn update_lead_status(&self, id: &str, status: LeadStatus) -> LeadState {
        self.update(LeadState::begin);
        match self.api.update_lead_status(id, status).await {
            Ok(updated) => self.update(|s| {
                if let Some(slot) = s.leads.iter_mut().find(|l| l.id == id) {
                    *slot = updated.clone();
                }
                if s.current_lead.as_ref().is_some_and(|l| l.id == id) {
                    s.current_lead = Some(updated);
                }
                s.settle();
            }),
            Err(e) => self.fail("update_lead_status", &e, STATUS_FAILED),
        }
        self.snapshot()
    }

    pub async fn delete_lead(&self, id: &str) -> LeadState {
        self.update(LeadState::begin);
        match self.api.delete_lead(id).await {
            Ok(_) => self.update(|s| {
                s.leads.retain(|l| l.id != id);
                if s.current_lead.as_ref().is_some_and(|l| l.id == id) {
                    s.current_lead = None;
                }
                s.settle();
            }),
            Err(e) => self.fail("delete_lead", &e, DELETE_FAILED),
        }
        self.snapshot()
    }

    pub fn clear_error(&self) -> LeadState {
        self.update(|s| s.error = None);
        self.snapshot()
    }
}
