use async_trait::async_trait;
use db::models::task::{CreateTask, Task, UpdateTask};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::error::BoardError;

/// Seam between the board state manager and the task resource API. The
/// board only ever talks to this trait, so tests can script outcomes.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, BoardError>;
    async fn create_task(&self, payload: &CreateTask) -> Result<Task, BoardError>;
    async fn update_task(&self, id: Uuid, payload: &UpdateTask) -> Result<Task, BoardError>;
    async fn delete_task(&self, id: Uuid) -> Result<(), BoardError>;
}

pub struct HttpTaskApi {
    client: Client,
    base_url: String,
    session_token: String,
}

impl HttpTaskApi {
    pub fn new(base_url: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            session_token: session_token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        response: Response,
    ) -> Result<T, BoardError> {
        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await?;
        match envelope.data {
            Some(data) if envelope.success => Ok(data),
            _ => Err(BoardError::Api {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "Unexpected API response".to_string()),
            }),
        }
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, BoardError> {
        let response = self
            .client
            .get(self.url("/api/tasks"))
            .bearer_auth(&self.session_token)
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }

    async fn create_task(&self, payload: &CreateTask) -> Result<Task, BoardError> {
        let response = self
            .client
            .post(self.url("/api/tasks"))
            .bearer_auth(&self.session_token)
            .json(payload)
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }

    async fn update_task(&self, id: Uuid, payload: &UpdateTask) -> Result<Task, BoardError> {
        let response = self
            .client
            .put(self.url(&format!("/api/tasks/{}", id)))
            .bearer_auth(&self.session_token)
            .json(payload)
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), BoardError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/tasks/{}", id)))
            .bearer_auth(&self.session_token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status.is_success() {
            return Ok(());
        }
        let envelope: ApiResponse<()> = response.json().await?;
        Err(BoardError::Api {
            status: status.as_u16(),
            message: envelope
                .message
                .unwrap_or_else(|| "Failed to delete task".to_string()),
        })
    }
}
