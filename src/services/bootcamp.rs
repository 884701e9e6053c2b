use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::http::ApiClient;
use crate::models::{Ack, ApiResponse, Bootcamp, CreateBootcamp, UpdateBootcamp};

use super::ReadFallback;

#[async_trait]
pub trait BootcampApi: Send + Sync {
    async fn list_bootcamps(&self) -> Result<Vec<Bootcamp>>;
    async fn get_bootcamp(&self, id: &str) -> Result<Bootcamp>;
    async fn create_bootcamp(&self, data: &CreateBootcamp) -> Result<Bootcamp>;
    async fn update_bootcamp(&self, id: &str, data: &UpdateBootcamp) -> Result<Bootcamp>;
    /// Returns the server's confirmation message.
    async fn delete_bootcamp(&self, id: &str) -> Result<String>;
}

/// `/bootcamps` endpoints. Listing is public and unpaginated.
pub struct BootcampService {
    client: Arc<ApiClient>,
    fallback: Arc<dyn ReadFallback>,
}

impl BootcampService {
    pub fn new(client: Arc<ApiClient>, fallback: Arc<dyn ReadFallback>) -> Self {
        Self { client, fallback }
    }

    /// Full replacement (`PUT`), as opposed to the partial `PATCH` of `update_bootcamp`.
    pub async fn replace_bootcamp(&self, id: &str, data: &CreateBootcamp) -> Result<Bootcamp> {
        let path = self.client.resource_path(&["bootcamps", id])?;
        self.client
            .put::<_, ApiResponse<Bootcamp>>(&path, data)
            .await?
            .into_result()
    }
}

#[async_trait]
impl BootcampApi for BootcampService {
    async fn list_bootcamps(&self) -> Result<Vec<Bootcamp>> {
        match self.client.get::<ApiResponse<Vec<Bootcamp>>>("/bootcamps").await {
            Ok(response) => response.into_result(),
            Err(e) => self.fallback.bootcamps(e).await,
        }
    }

    async fn get_bootcamp(&self, id: &str) -> Result<Bootcamp> {
        let path = self.client.resource_path(&["bootcamps", id])?;
        match self.client.get::<ApiResponse<Bootcamp>>(&path).await {
            Ok(response) => response.into_result(),
            Err(e) => self.fallback.bootcamp(id, e).await,
        }
    }

    async fn create_bootcamp(&self, data: &CreateBootcamp) -> Result<Bootcamp> {
        self.client
            .post::<_, ApiResponse<Bootcamp>>("/bootcamps", data)
            .await?
            .into_result()
    }

    async fn update_bootcamp(&self, id: &str, data: &UpdateBootcamp) -> Result<Bootcamp> {
        let path = self.client.resource_path(&["bootcamps", id])?;
        self.client
            .patch::<_, ApiResponse<Bootcamp>>(&path, data)
            .await?
            .into_result()
    }

    async fn delete_bootcamp(&self, id: &str) -> Result<String> {
        let path = self.client.resource_path(&["bootcamps", id])?;
        self.client
            .delete::<Ack>(&path)
            .await?
            .into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::mock::{fixture_bootcamps, MockDelays, MockProvider};
    use crate::services::{FailClosed, MockFallback};
    use crate::test_support::{client_for, spawn_server, unreachable_url};
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn mock_fallback() -> Arc<dyn ReadFallback> {
        Arc::new(MockFallback::new(MockProvider::new(MockDelays::none())))
    }

    fn api_bootcamp(id: &str, title: &str) -> Value {
        json!({
            "id": id, "title": title, "description": "desc", "duration": "6 semaines",
            "price": "99000", "nextSession": "2025-01-06T00:00:00.000Z", "isActive": true,
            "createdAt": "2024-12-01T00:00:00.000Z", "updatedAt": "2024-12-01T00:00:00.000Z",
            "deletedAt": null
        })
    }

    async fn list() -> Json<Value> {
        Json(json!({
            "success": true,
            "data": [api_bootcamp("z", "Zeta"), api_bootcamp("a", "Alpha")],
            "message": "ok",
            "timestamp": "2024-12-01T00:00:00.000Z"
        }))
    }

    async fn create(Json(body): Json<Value>) -> Json<Value> {
        Json(json!({"success": true, "data": api_bootcamp("new", body["title"].as_str().unwrap())}))
    }

    async fn one(Path(id): Path<String>) -> impl IntoResponse {
        if id == "gone" {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"message": "Bootcamp introuvable"})),
            );
        }
        (StatusCode::OK, Json(json!({"success": true, "data": api_bootcamp(&id, "One")})))
    }

    async fn patch(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
        let mut bootcamp = api_bootcamp(&id, "One");
        bootcamp["price"] = json!(body["price"].to_string());
        Json(json!({"success": true, "data": bootcamp}))
    }

    async fn put(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
        Json(json!({"success": true, "data": api_bootcamp(&id, body["title"].as_str().unwrap())}))
    }

    async fn delete(Path(_id): Path<String>) -> Json<Value> {
        Json(json!({"success": false, "message": "Bootcamp lié à des leads"}))
    }

    async fn service(fallback: Arc<dyn ReadFallback>) -> BootcampService {
        let router = Router::new()
            .route("/bootcamps", get(list).post(create))
            .route("/bootcamps/:id", get(one).patch(patch).put(put).delete(delete));
        let base = spawn_server(router).await;
        let (client, _) = client_for(&base);
        BootcampService::new(client, fallback)
    }

    fn sample_create() -> CreateBootcamp {
        CreateBootcamp {
            title: "DevOps".to_string(),
            description: "CI/CD".to_string(),
            duration: "8 semaines".to_string(),
            price: 130000,
            next_session: "2025-02-03T00:00:00.000Z".to_string(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_list_preserves_server_order() {
        let service = service(mock_fallback()).await;
        let bootcamps = service.list_bootcamps().await.unwrap();
        let ids: Vec<_> = bootcamps.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);
    }

    #[tokio::test]
    async fn test_reads_degrade_to_fixtures_when_unreachable() {
        let (client, _) = client_for(&unreachable_url());
        let service = BootcampService::new(client, mock_fallback());

        assert_eq!(service.list_bootcamps().await.unwrap(), fixture_bootcamps());
        assert_eq!(service.get_bootcamp("3").await.unwrap().title, "Data Science & IA");
        assert!(matches!(
            service.get_bootcamp("999").await,
            Err(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_writes_never_degrade() {
        let (client, _) = client_for(&unreachable_url());
        let service = BootcampService::new(client, mock_fallback());

        let err = service.create_bootcamp(&sample_create()).await.unwrap_err();
        assert!(err.is_transport());

        let err = service
            .update_bootcamp("1", &UpdateBootcamp::default())
            .await
            .unwrap_err();
        assert!(err.is_transport());

        assert!(service.delete_bootcamp("1").await.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn test_fail_closed_surfaces_transport_error() {
        let (client, _) = client_for(&unreachable_url());
        let service = BootcampService::new(client, Arc::new(FailClosed));
        assert!(service.list_bootcamps().await.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn test_http_error_on_read_is_not_mocked() {
        let service = service(mock_fallback()).await;
        match service.get_bootcamp("gone").await {
            Err(ClientError::Http { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message.as_deref(), Some("Bootcamp introuvable"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_update_replace() {
        let service = service(mock_fallback()).await;

        let created = service.create_bootcamp(&sample_create()).await.unwrap();
        assert_eq!(created.id, "new");
        assert_eq!(created.title, "DevOps");

        let update = UpdateBootcamp {
            price: Some(140000),
            ..Default::default()
        };
        let updated = service.update_bootcamp("b7", &update).await.unwrap();
        assert_eq!(updated.id, "b7");
        assert_eq!(updated.price, "140000");

        let replaced = service.replace_bootcamp("b7", &sample_create()).await.unwrap();
        assert_eq!(replaced.title, "DevOps");
    }

    #[tokio::test]
    async fn test_delete_rejected_by_application() {
        let service = service(mock_fallback()).await;
        match service.delete_bootcamp("1").await {
            Err(ClientError::Application(msg)) => assert_eq!(msg, "Bootcamp lié à des leads"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
