use std::future::Future;
use tdash_core::{AgentSnapshot, DepartmentList, RowsPayload};
use thiserror::Error;

mod adapter;
mod http;

pub use adapter::{DataSourceAdapter, FetchOutcome, Fetched};
pub use http::{
    HttpBackend, AGENT_SNAPSHOT_PATH, ARCHIVED_TICKETS_PATH, DEPARTMENTS_PATH, METRICS_PATH,
};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned status {0}")]
    Status(u16),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Read-only view of the ticket backend. One call is one request; retries are
/// left to the refresh schedule.
pub trait TicketBackend: Send + Sync {
    fn departments(&self) -> impl Future<Output = Result<DepartmentList, FetchError>> + Send;

    fn agent_snapshot(&self) -> impl Future<Output = Result<AgentSnapshot, FetchError>> + Send;

    fn metrics(&self) -> impl Future<Output = Result<RowsPayload, FetchError>> + Send;

    fn archived(
        &self,
        department_id: &str,
    ) -> impl Future<Output = Result<RowsPayload, FetchError>> + Send;
}
