//! HTTP client for the planning backend.

use crate::backend::wire::{
    ComponentRecord, NodeResource, NodeWriteBody, ProcessModelRecord, SyncReceipt,
    SyncTasksBody, TimelineTask,
};
use crate::backend::PlanningBackend;
use crate::config::BackendConfig;
use crate::error::TransportError;
use crate::types::{NodeKey, ProjectId};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

// Map transport-level reqwest failures to TransportError
fn map_http_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else if error.is_decode() {
        TransportError::Decode(error.to_string())
    } else {
        TransportError::Http(error.to_string())
    }
}

async fn check_status(response: Response, what: &str) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(match status.as_u16() {
        404 => TransportError::NotFound(format!("{}: {}", what, body)),
        code => TransportError::Status { status: code, body },
    })
}

/// reqwest-backed [`PlanningBackend`].
pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let response = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(map_http_error)?;
        let response = check_status(response, path).await?;
        response
            .json()
            .await
            .map_err(|e| TransportError::Decode(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl PlanningBackend for HttpBackend {
    #[instrument(skip(self))]
    async fn fetch_structure(
        &self,
        project: ProjectId,
    ) -> Result<Vec<ComponentRecord>, TransportError> {
        self.get_json(&format!("/projects/{}/structure", project)).await
    }

    #[instrument(skip(self))]
    async fn fetch_tasks_timeline(
        &self,
        project: ProjectId,
    ) -> Result<Vec<TimelineTask>, TransportError> {
        self.get_json(&format!("/projects/{}/tasks-timeline", project))
            .await
    }

    async fn fetch_process_models(&self) -> Result<Vec<ProcessModelRecord>, TransportError> {
        self.get_json("/process-models").await
    }

    async fn get_node(&self, key: NodeKey) -> Result<NodeResource, TransportError> {
        self.get_json(&format!("/{}/{}", key.level.collection(), key.id))
            .await
    }

    #[instrument(skip(self, body), fields(node = %key))]
    async fn put_node(&self, key: NodeKey, body: &NodeWriteBody) -> Result<(), TransportError> {
        let path = format!("/{}/{}", key.level.collection(), key.id);
        let response = self
            .authorize(self.client.put(self.url(&path)))
            .json(body)
            .send()
            .await
            .map_err(map_http_error)?;
        check_status(response, &path).await?;
        debug!("node write accepted");
        Ok(())
    }

    #[instrument(skip(self, body), fields(
        scheduled = body.start_map.unit.len(),
        visible = body.filters.unit_ids.len(),
        purged = body.purge_unit_ids.len()
    ))]
    async fn sync_tasks(
        &self,
        project: ProjectId,
        body: &SyncTasksBody,
    ) -> Result<SyncReceipt, TransportError> {
        let path = format!("/projects/{}/sync-tasks", project);
        let response = self
            .authorize(self.client.post(self.url(&path)))
            .json(body)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = check_status(response, &path).await?;

        // The backend answers with the tasks it created; only the count is kept.
        let text = response.text().await.map_err(map_http_error)?;
        let tasks_reported = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v.as_array().map(|a| a.len()))
            .unwrap_or(0);
        Ok(SyncReceipt { tasks_reported })
    }

    fn backend_name(&self) -> &str {
        "http"
    }
}
