use std::sync::Arc;
use tdash_core::{AgentSnapshot, ArchivedRow, Department, MetricsRow};
use tdash_source::{DataSourceAdapter, Fetched, TicketBackend};
use tdash_storage::CacheStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A completed fetch, delivered back to the application loop.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Departments(Fetched<Vec<Department>>),
    Snapshot {
        generation: u64,
        fetched: Fetched<AgentSnapshot>,
    },
    Metrics {
        generation: u64,
        fetched: Fetched<Vec<MetricsRow>>,
    },
    Archived {
        department_id: Option<String>,
        fetched: Fetched<Vec<ArchivedRow>>,
    },
}

/// Spawns adapter calls as tasks. Several may be in flight at once; results
/// arrive on the channel in completion order.
pub struct Fetcher<B, S> {
    adapter: Arc<DataSourceAdapter<B, S>>,
    tx: mpsc::Sender<FetchEvent>,
}

impl<B, S> Fetcher<B, S>
where
    B: TicketBackend + 'static,
    S: CacheStore + 'static,
{
    pub fn new(adapter: Arc<DataSourceAdapter<B, S>>, tx: mpsc::Sender<FetchEvent>) -> Self {
        Self { adapter, tx }
    }

    pub fn spawn_departments(&self) -> JoinHandle<()> {
        let adapter = Arc::clone(&self.adapter);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let fetched = adapter.fetch_departments().await;
            let _ = tx.send(FetchEvent::Departments(fetched)).await;
        })
    }

    /// Agent snapshot followed by metrics, tagged with the refresh generation.
    pub fn spawn_bulk(&self, generation: u64) -> JoinHandle<()> {
        debug!(generation, "bulk refresh started");
        let adapter = Arc::clone(&self.adapter);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let fetched = adapter.fetch_agent_snapshot().await;
            if tx
                .send(FetchEvent::Snapshot {
                    generation,
                    fetched,
                })
                .await
                .is_err()
            {
                return;
            }
            let fetched = adapter.fetch_metrics().await;
            let _ = tx
                .send(FetchEvent::Metrics {
                    generation,
                    fetched,
                })
                .await;
        })
    }

    pub fn spawn_archived(&self, department_id: Option<String>) -> JoinHandle<()> {
        let adapter = Arc::clone(&self.adapter);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let fetched = adapter.fetch_archived(department_id.as_deref()).await;
            let _ = tx
                .send(FetchEvent::Archived {
                    department_id,
                    fetched,
                })
                .await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdash_core::{AgentRecord, DepartmentList, RowsPayload};
    use tdash_source::{FetchError, FetchOutcome};
    use tdash_storage::MemoryCacheStore;

    struct OfflineForArchived;

    impl TicketBackend for OfflineForArchived {
        async fn departments(&self) -> Result<DepartmentList, FetchError> {
            Ok(DepartmentList {
                departments: vec![Department {
                    id: "3".to_string(),
                    name: "Billing".to_string(),
                }],
            })
        }

        async fn agent_snapshot(&self) -> Result<AgentSnapshot, FetchError> {
            Ok(AgentSnapshot {
                members: vec![AgentRecord {
                    id: "1".to_string(),
                    name: "Alice".to_string(),
                    ..AgentRecord::default()
                }],
                unassigned_ticket_numbers: vec!["9".to_string()],
            })
        }

        async fn metrics(&self) -> Result<RowsPayload, FetchError> {
            Ok(RowsPayload::default())
        }

        async fn archived(&self, _department_id: &str) -> Result<RowsPayload, FetchError> {
            Err(FetchError::Transport("connection refused".to_string()))
        }
    }

    fn fetcher() -> (
        Fetcher<OfflineForArchived, MemoryCacheStore>,
        mpsc::Receiver<FetchEvent>,
    ) {
        let (tx, rx) = mpsc::channel(8);
        let adapter = Arc::new(DataSourceAdapter::new(
            OfflineForArchived,
            MemoryCacheStore::new(),
        ));
        (Fetcher::new(adapter, tx), rx)
    }

    #[tokio::test]
    async fn bulk_refresh_reports_snapshot_then_metrics() {
        let (fetcher, mut rx) = fetcher();
        fetcher.spawn_bulk(4).await.expect("join");

        match rx.recv().await.expect("snapshot event") {
            FetchEvent::Snapshot {
                generation,
                fetched,
            } => {
                assert_eq!(generation, 4);
                assert_eq!(fetched.outcome, FetchOutcome::Fresh);
                assert_eq!(fetched.data.members[0].name, "Alice");
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(
            rx.recv().await,
            Some(FetchEvent::Metrics { generation: 4, .. })
        ));
    }

    #[tokio::test]
    async fn archived_failure_is_reported_as_empty() {
        let (fetcher, mut rx) = fetcher();
        fetcher.spawn_departments().await.expect("join");
        fetcher
            .spawn_archived(Some("3".to_string()))
            .await
            .expect("join");

        assert!(matches!(rx.recv().await, Some(FetchEvent::Departments(_))));
        assert_eq!(
            rx.recv().await,
            Some(FetchEvent::Archived {
                department_id: Some("3".to_string()),
                fetched: Fetched {
                    data: Vec::new(),
                    outcome: FetchOutcome::Empty,
                },
            })
        );
    }
}
