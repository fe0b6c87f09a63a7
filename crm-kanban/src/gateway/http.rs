//! HTTP gateway for the CRM task REST backend

use super::{GatewayResult, MoveReceipt, PersistenceGateway, TaskSnapshot};
use crate::error::GatewayError;
use crate::types::{ColumnId, Task, TaskDraft, TaskId, TaskPatch};
use crate::wire;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Extract a human-readable message from a JSON error body.
///
/// Tries `message`, then `error`, then falls back to the raw body.
fn extract_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = json.get("message").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
        if let Some(err) = json.get("error").and_then(|v| v.as_str()) {
            return err.to_string();
        }
    }
    body.to_string()
}

/// Talks to `{base_url}/api/tasks/...`
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpGateway {
    /// Build a gateway whose every request expires after `timeout`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}/api/tasks/{}", self.base_url, route)
    }

    fn url_for(&self, route: &str, id: &TaskId) -> String {
        self.url(&format!("{}/{}", route, urlencoding::encode(id.as_str())))
    }

    fn map_send_error(&self, error: reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            GatewayError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }
        } else {
            GatewayError::Request(error)
        }
    }

    /// Map a non-success response to `GatewayError::Status`
    async fn check_response(&self, response: Response) -> GatewayResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Status {
            status: status.as_u16(),
            message: extract_error_message(&body),
        })
    }

    async fn read_json(&self, response: Response) -> GatewayResult<Value> {
        let response = self.check_response(response).await?;
        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                self.map_send_error(e)
            } else {
                GatewayError::decode(e.to_string())
            }
        })
    }
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn list_tasks(&self) -> GatewayResult<TaskSnapshot> {
        let url = self.url("get");
        debug!(%url, "listing tasks");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        wire::parse_listing(self.read_json(response).await?)
    }

    async fn create_task(&self, draft: &TaskDraft) -> GatewayResult<Task> {
        let url = self.url("post");
        debug!(%url, title = %draft.title, "creating task");
        let response = self
            .client
            .post(&url)
            .json(&wire::draft_body(draft))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        wire::parse_created(&self.read_json(response).await?)
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<Task> {
        let url = self.url_for("update", id);
        debug!(%url, "updating task");
        let response = self
            .client
            .put(&url)
            .json(&wire::patch_body(patch))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        wire::parse_task(&self.read_json(response).await?)
    }

    async fn delete_task(&self, id: &TaskId) -> GatewayResult<()> {
        let url = self.url_for("delete", id);
        debug!(%url, "deleting task");
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.check_response(response).await?;
        Ok(())
    }

    async fn move_task(&self, id: &TaskId, destination: &ColumnId) -> GatewayResult<MoveReceipt> {
        let url = self.url_for("move", id);
        debug!(%url, %destination, "moving task");
        let response = self
            .client
            .put(&url)
            .json(&wire::move_body(destination))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        wire::parse_move_receipt(&self.read_json(response).await?, id)
    }
}
