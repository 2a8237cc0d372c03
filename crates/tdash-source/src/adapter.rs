use crate::TicketBackend;
use serde::Serialize;
use tdash_core::{AgentRecord, AgentSnapshot, ArchivedRow, Department, MetricsRow};
use tdash_storage::{keys, CacheExt, CacheStore};
use tracing::{debug, info, warn};

/// Where a dataset handed to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    Fresh,
    Cached,
    Empty,
}

impl FetchOutcome {
    pub fn is_fresh(self) -> bool {
        self == FetchOutcome::Fresh
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub outcome: FetchOutcome,
}

impl<T> Fetched<T> {
    fn fresh(data: T) -> Self {
        Self {
            data,
            outcome: FetchOutcome::Fresh,
        }
    }

    fn cached(data: T) -> Self {
        Self {
            data,
            outcome: FetchOutcome::Cached,
        }
    }
}

impl<T: Default> Fetched<T> {
    fn empty() -> Self {
        Self {
            data: T::default(),
            outcome: FetchOutcome::Empty,
        }
    }
}

/// Fetches datasets from the backend and keeps the cache in step.
///
/// Successful fetches overwrite their cache entries. Failed fetches never
/// surface an error: the caller gets the cached copy when one exists, or an
/// empty dataset otherwise.
pub struct DataSourceAdapter<B, S> {
    backend: B,
    cache: S,
}

impl<B, S> DataSourceAdapter<B, S>
where
    B: TicketBackend,
    S: CacheStore,
{
    pub fn new(backend: B, cache: S) -> Self {
        Self { backend, cache }
    }

    pub fn cache(&self) -> &S {
        &self.cache
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The department cache is purged before the request, so a failed fetch
    /// leaves the list empty instead of stale.
    pub async fn fetch_departments(&self) -> Fetched<Vec<Department>> {
        self.cache.forget(keys::DEPARTMENTS);
        match self.backend.departments().await {
            Ok(list) => {
                info!(count = list.departments.len(), "departments refreshed");
                self.cache.store_json(keys::DEPARTMENTS, &list.departments);
                Fetched::fresh(list.departments)
            }
            Err(err) => {
                warn!(error = %err, "department fetch failed");
                Fetched::empty()
            }
        }
    }

    pub async fn fetch_agent_snapshot(&self) -> Fetched<AgentSnapshot> {
        match self.backend.agent_snapshot().await {
            Ok(snapshot) => {
                info!(
                    agents = snapshot.members.len(),
                    unassigned = snapshot.unassigned_ticket_numbers.len(),
                    "agent snapshot refreshed"
                );
                self.cache.store_json(keys::AGENT_SNAPSHOT, &snapshot.members);
                self.cache.store_json(
                    keys::UNASSIGNED_NUMBERS,
                    &snapshot.unassigned_ticket_numbers,
                );
                Fetched::fresh(snapshot)
            }
            Err(err) => {
                warn!(error = %err, "agent snapshot fetch failed; using cache");
                let members: Option<Vec<AgentRecord>> =
                    self.cache.try_load_json(keys::AGENT_SNAPSHOT);
                let numbers: Option<Vec<String>> =
                    self.cache.try_load_json(keys::UNASSIGNED_NUMBERS);
                if members.is_none() && numbers.is_none() {
                    return Fetched::empty();
                }
                Fetched::cached(AgentSnapshot {
                    members: members.unwrap_or_default(),
                    unassigned_ticket_numbers: numbers.unwrap_or_default(),
                })
            }
        }
    }

    pub async fn fetch_metrics(&self) -> Fetched<Vec<MetricsRow>> {
        match self.backend.metrics().await {
            Ok(payload) => {
                info!(rows = payload.rows.len(), "metrics refreshed");
                self.cache.store_json(keys::METRICS_ROWS, &payload.rows);
                Fetched::fresh(payload.rows)
            }
            Err(err) => {
                warn!(error = %err, "metrics fetch failed; using cache");
                match self.cache.try_load_json(keys::METRICS_ROWS) {
                    Some(rows) => Fetched::cached(rows),
                    None => Fetched::empty(),
                }
            }
        }
    }

    /// Archived rows are not cached. Without a department there is nothing to
    /// ask for, so no request is issued.
    pub async fn fetch_archived(&self, department_id: Option<&str>) -> Fetched<Vec<ArchivedRow>> {
        let Some(department_id) = department_id.filter(|id| !id.is_empty()) else {
            debug!("archived fetch skipped: no department");
            return Fetched::empty();
        };
        match self.backend.archived(department_id).await {
            Ok(payload) => {
                info!(department_id, rows = payload.rows.len(), "archived tickets refreshed");
                Fetched::fresh(payload.rows)
            }
            Err(err) => {
                warn!(department_id, error = %err, "archived fetch failed");
                Fetched::empty()
            }
        }
    }
}
