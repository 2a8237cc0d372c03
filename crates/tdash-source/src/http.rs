use crate::{FetchError, TicketBackend};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tdash_core::{AgentSnapshot, DepartmentList, RowsPayload};

pub const DEPARTMENTS_PATH: &str = "/api/zoho-departments";
pub const AGENT_SNAPSHOT_PATH: &str = "/api/zoho-assignees-with-ticket-counts";
pub const METRICS_PATH: &str = "/api/ticket-metrics-simple";
pub const ARCHIVED_TICKETS_PATH: &str = "/api/archived-tickets";

/// reqwest-backed [`TicketBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tdash/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        resp.json::<T>()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))
    }
}

impl TicketBackend for HttpBackend {
    async fn departments(&self) -> Result<DepartmentList, FetchError> {
        self.get_json(DEPARTMENTS_PATH, &[]).await
    }

    async fn agent_snapshot(&self) -> Result<AgentSnapshot, FetchError> {
        self.get_json(AGENT_SNAPSHOT_PATH, &[]).await
    }

    async fn metrics(&self) -> Result<RowsPayload, FetchError> {
        self.get_json(METRICS_PATH, &[]).await
    }

    async fn archived(&self, department_id: &str) -> Result<RowsPayload, FetchError> {
        self.get_json(ARCHIVED_TICKETS_PATH, &[("departmentId", department_id)])
            .await
    }
}
