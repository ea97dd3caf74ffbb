//! Planning Backend Abstraction
//!
//! Interface to the task-generation backend: structure and timeline reads, per-node
//! read-modify-write, and the bulk `sync-tasks` call. The HTTP client is the production
//! implementation; the in-memory mock backs tests and offline runs.

use crate::error::TransportError;
use crate::types::{NodeKey, ProjectId};
use async_trait::async_trait;

pub mod http;
pub mod mock;
pub mod wire;

pub use http::HttpBackend;
pub use mock::{BackendCall, MockBackend};
pub use wire::{
    AttributeWrite, ComponentRecord, NodeResource, NodeWriteBody, ProcessModelRecord,
    SyncReceipt, SyncTasksBody, TimelineTask,
};

/// Backend client trait
#[async_trait]
pub trait PlanningBackend: Send + Sync {
    /// `GET /projects/{id}/structure`
    async fn fetch_structure(&self, project: ProjectId)
        -> Result<Vec<ComponentRecord>, TransportError>;

    /// `GET /projects/{id}/tasks-timeline`
    async fn fetch_tasks_timeline(
        &self,
        project: ProjectId,
    ) -> Result<Vec<TimelineTask>, TransportError>;

    /// `GET /process-models`
    async fn fetch_process_models(&self) -> Result<Vec<ProcessModelRecord>, TransportError>;

    /// `GET /{collection}/{id}`
    async fn get_node(&self, key: NodeKey) -> Result<NodeResource, TransportError>;

    /// `PUT /{collection}/{id}`
    async fn put_node(&self, key: NodeKey, body: &NodeWriteBody) -> Result<(), TransportError>;

    /// `POST /projects/{id}/sync-tasks`
    async fn sync_tasks(
        &self,
        project: ProjectId,
        body: &SyncTasksBody,
    ) -> Result<SyncReceipt, TransportError>;

    /// Short name for logs.
    fn backend_name(&self) -> &str;
}
