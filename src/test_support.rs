//! Helpers shared by the in-crate tests: a throwaway API server and a
//! client wired to it.

use std::sync::Arc;

use axum::Router;

use crate::config::{ApiConfig, SessionConfig};
use crate::http::ApiClient;
use crate::storage::{MemoryStorage, SessionStorage};

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nobody listens on: the port was bound, then released.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn client_for(base_url: &str) -> (Arc<ApiClient>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let client = client_with_storage(base_url, storage.clone());
    (client, storage)
}

pub fn client_with_storage(base_url: &str, storage: Arc<dyn SessionStorage>) -> Arc<ApiClient> {
    let api = ApiConfig {
        base_url: Some(base_url.to_string()),
        timeout_secs: 5,
        ..Default::default()
    };
    Arc::new(ApiClient::new(&api, &SessionConfig::default(), storage).unwrap())
}
