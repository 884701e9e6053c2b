//! Response envelopes shared by every endpoint.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

fn default_success() -> bool {
    true
}

/// `{success, data, message, timestamp}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload, turning `success: false` into an application error.
    pub fn into_result(self) -> Result<T> {
        if !self.success {
            return Err(ClientError::Application(self.message));
        }
        self.data
            .ok_or_else(|| ClientError::Decode("response has no data".to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64) as u32
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            total: 0,
            total_pages: 0,
        }
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// `{success, data: [..], pagination, message, timestamp}`
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub message: String,
}

impl<T> PaginatedResponse<T> {
    /// `page`/`limit` are the requested values, used when the server omits pagination.
    pub fn into_page(self, page: u32, limit: u32) -> Result<Page<T>> {
        if !self.success {
            return Err(ClientError::Application(self.message));
        }
        let pagination = self
            .pagination
            .unwrap_or_else(|| Pagination::new(page, limit, self.data.len() as u64));
        Ok(Page {
            items: self.data,
            pagination,
        })
    }
}

/// `{success, message}`, returned by deletes.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl Ack {
    pub fn into_result(self) -> Result<String> {
        if self.success {
            Ok(self.message)
        } else {
            Err(ClientError::Application(self.message))
        }
    }
}
