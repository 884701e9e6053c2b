use async_trait::async_trait;
use tracing::warn;

use crate::error::{ClientError, Result};
use crate::mock::MockProvider;
use crate::models::{Admin, Bootcamp, Lead, Page};

/// What a read does when the API call behind it failed.
///
/// `cause` is the error from the live call. Returning it unchanged
/// propagates the failure; returning data substitutes it for the response.
#[async_trait]
pub trait ReadFallback: Send + Sync {
    async fn bootcamps(&self, cause: ClientError) -> Result<Vec<Bootcamp>>;
    async fn bootcamp(&self, id: &str, cause: ClientError) -> Result<Bootcamp>;
    async fn leads(&self, page: u32, limit: u32, cause: ClientError) -> Result<Page<Lead>>;
    async fn lead(&self, id: &str, cause: ClientError) -> Result<Lead>;
    async fn profile(&self, cause: ClientError) -> Result<Admin>;
}

/// Never substitutes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailClosed;

#[async_trait]
impl ReadFallback for FailClosed {
    async fn bootcamps(&self, cause: ClientError) -> Result<Vec<Bootcamp>> {
        Err(cause)
    }
    async fn bootcamp(&self, _id: &str, cause: ClientError) -> Result<Bootcamp> {
        Err(cause)
    }
    async fn leads(&self, _page: u32, _limit: u32, cause: ClientError) -> Result<Page<Lead>> {
        Err(cause)
    }
    async fn lead(&self, _id: &str, cause: ClientError) -> Result<Lead> {
        Err(cause)
    }
    async fn profile(&self, cause: ClientError) -> Result<Admin> {
        Err(cause)
    }
}

/// Serves fixture data when the API could not be reached at all.
///
/// HTTP and application errors still propagate: only a missing response
/// is papered over. Callers cannot tell fixture data from live data.
#[derive(Debug, Clone, Default)]
pub struct MockFallback {
    provider: MockProvider,
}

impl MockFallback {
    pub fn new(provider: MockProvider) -> Self {
        Self { provider }
    }

    fn absorb(&self, resource: &str, cause: ClientError) -> Result<()> {
        if cause.is_transport() {
            warn!(resource, error = %cause, "API unreachable, serving mock data");
            Ok(())
        } else {
            Err(cause)
        }
    }
}

#[async_trait]
impl ReadFallback for MockFallback {
    async fn bootcamps(&self, cause: ClientError) -> Result<Vec<Bootcamp>> {
        self.absorb("bootcamps", cause)?;
        Ok(self.provider.bootcamps().await)
    }

    async fn bootcamp(&self, id: &str, cause: ClientError) -> Result<Bootcamp> {
        self.absorb("bootcamp", cause)?;
        self.provider.bootcamp(id).await
    }

    async fn leads(&self, page: u32, limit: u32, cause: ClientError) -> Result<Page<Lead>> {
        self.absorb("leads", cause)?;
        Ok(self.provider.leads(page, limit).await)
    }

    async fn lead(&self, id: &str, cause: ClientError) -> Result<Lead> {
        self.absorb("lead", cause)?;
        self.provider.lead(id).await
    }

    async fn profile(&self, cause: ClientError) -> Result<Admin> {
        self.absorb("profile", cause)?;
        Ok(self.provider.profile().await)
    }
}
