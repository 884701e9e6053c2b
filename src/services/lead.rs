use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::http::ApiClient;
use crate::models::{
    Ack, ApiResponse, CreateLead, Lead, LeadStatus, Page, PaginatedResponse, UpdateLeadStatus,
};

use super::ReadFallback;

#[async_trait]
pub trait LeadApi: Send + Sync {
    async fn list_leads(&self, page: u32, limit: u32) -> Result<Page<Lead>>;
    async fn get_lead(&self, id: &str) -> Result<Lead>;
    async fn create_lead(&self, data: &CreateLead) -> Result<Lead>;
    async fn update_lead_status(&self, id: &str, status: LeadStatus) -> Result<Lead>;
    async fn delete_lead(&self, id: &str) -> Result<String>;
}

/// `/leads` endpoints. Creation backs the public contact form; the rest is admin-only.
pub struct LeadService {
    client: Arc<ApiClient>,
    fallback: Arc<dyn ReadFallback>,
}

impl LeadService {
    pub fn new(client: Arc<ApiClient>, fallback: Arc<dyn ReadFallback>) -> Self {
        Self { client, fallback }
    }
}

#[async_trait]
impl LeadApi for LeadService {
    async fn list_leads(&self, page: u32, limit: u32) -> Result<Page<Lead>> {
        let path = format!("/leads?page={}&limit={}", page, limit);
        match self.client.get::<PaginatedResponse<Lead>>(&path).await {
            Ok(response) => response.into_page(page, limit),
            Err(e) => self.fallback.leads(page, limit, e).await,
        }
    }

    async fn get_lead(&self, id: &str) -> Result<Lead> {
        let path = self.client.resource_path(&["leads", id])?;
        match self.client.get::<ApiResponse<Lead>>(&path).await {
            Ok(response) => response.into_result(),
            Err(e) => self.fallback.lead(id, e).await,
        }
    }

    async fn create_lead(&self, data: &CreateLead) -> Result<Lead> {
        self.client
            .post::<_, ApiResponse<Lead>>("/leads", data)
            .await?
            .into_result()
    }

    async fn update_lead_status(&self, id: &str, status: LeadStatus) -> Result<Lead> {
        let path = self.client.resource_path(&["leads", id, "status"])?;
        self.client
            .patch::<_, ApiResponse<Lead>>(&path, &UpdateLeadStatus { status })
            .await?
            .into_result()
    }

    async fn delete_lead(&self, id: &str) -> Result<String> {
        let path = self.client.resource_path(&["leads", id])?;
        self.client
            .delete::<Ack>(&path)
            .await?
            .into_result()
    }
}
