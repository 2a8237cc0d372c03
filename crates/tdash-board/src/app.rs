use crate::config::Config;
use crate::refresh::FetchEvent;
use crate::scheduler::{SchedulePlan, ScheduleShape, TimerKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tdash_core::{
    AgeView, AgentRecord, Department, FilterSelection, MetricsRow, SelectOption, SelectionSet,
    SortOrder, StatusKey,
};
use tdash_pipeline::{
    archived_target, build_dashboard, department_cache_rows, paginate, project, status_presets,
    AgentAgeRow, DashboardView, DepartmentSummaryRow, RawState, ViewCursor,
};
use tdash_source::FetchOutcome;
use tdash_storage::{keys, CacheExt, CacheStore};
use tracing::{debug, info};

/// Outcome of the latest fetch of each dataset, for the footer indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchStatus {
    pub departments: Option<FetchOutcome>,
    pub agents: Option<FetchOutcome>,
    pub metrics: Option<FetchOutcome>,
    pub archived: Option<FetchOutcome>,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl FetchStatus {
    /// True when the agent or metrics data on screen did not come from the
    /// latest request.
    pub fn is_stale(&self) -> bool {
        [self.agents, self.metrics]
            .into_iter()
            .flatten()
            .any(|outcome| !outcome.is_fresh())
    }

    pub fn label(&self) -> &'static str {
        match (self.agents, self.is_stale()) {
            (None, _) => "loading",
            (_, true) => "stale",
            (_, false) => "live",
        }
    }
}

/// Selection and cursor values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOverrides {
    pub departments: Vec<String>,
    pub agents: Vec<String>,
    pub statuses: Vec<StatusKey>,
    pub sort: Option<SortOrder>,
    pub page: Option<usize>,
    pub tables: Vec<AgeView>,
    /// (department id, agent name) pairs for the department panel.
    pub picks: Vec<(String, String)>,
}

/// What the main loop should do after a timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEffect {
    Redraw,
    Refresh(u64),
}

pub struct App<S> {
    pub config: Config,
    cache: S,
    pub raw: RawState,
    pub selection: FilterSelection,
    pub cursor: ViewCursor,
    pub view: DashboardView,
    pub status: FetchStatus,
    pub help_open: bool,
    pub status_note: Option<String>,
    unassigned_revision: u64,
    issued_generation: u64,
    snapshot_generation: u64,
    metrics_generation: u64,
    preset_index: usize,
    archived_requested: Option<Option<String>>,
    persisted_latest: Option<String>,
    persisted_department_rows: Option<(Vec<AgentAgeRow>, Vec<DepartmentSummaryRow>)>,
}

impl<S: CacheStore> App<S> {
    /// Seed state from the cache so the first frame shows the last known data.
    pub fn new(config: Config, cache: S) -> Self {
        let raw = RawState {
            agents: cache.load_json::<Vec<AgentRecord>>(keys::AGENT_SNAPSHOT),
            departments: cache.load_json::<Vec<Department>>(keys::DEPARTMENTS),
            metrics: cache.load_json::<Vec<MetricsRow>>(keys::METRICS_ROWS),
            archived: Vec::new(),
            unassigned_ticket_numbers: cache.load_json::<Vec<String>>(keys::UNASSIGNED_NUMBERS),
            latest_unassigned: cache.try_load_json::<String>(keys::LATEST_UNASSIGNED),
        };
        let selection = FilterSelection {
            departments: cache.load_json::<SelectionSet>(keys::SELECTED_DEPARTMENTS),
            candidates: cache.load_json::<SelectionSet>(keys::SELECTED_CANDIDATES),
            statuses: cache.load_json::<SelectionSet>(keys::SELECTED_STATUSES),
            ..FilterSelection::default()
        };
        info!(
            agents = raw.agents.len(),
            departments = selection.departments.len(),
            "restored dashboard state from cache"
        );
        let cursor = ViewCursor::default();
        let view = build_dashboard(&raw, &selection, &cursor);
        let persisted_latest = raw.latest_unassigned.clone();
        let persisted_department_rows = cache
            .try_load_json::<Vec<AgentAgeRow>>(keys::DEPARTMENT_ROWS)
            .zip(cache.try_load_json::<Vec<DepartmentSummaryRow>>(keys::DEPARTMENT_SUMMARY_ROWS));
        let mut app = Self {
            config,
            cache,
            raw,
            selection,
            cursor,
            view,
            status: FetchStatus::default(),
            help_open: false,
            status_note: None,
            unassigned_revision: 0,
            issued_generation: 0,
            snapshot_generation: 0,
            metrics_generation: 0,
            preset_index: 0,
            archived_requested: None,
            persisted_latest,
            persisted_department_rows,
        };
        app.recompute();
        app
    }

    pub fn cache(&self) -> &S {
        &self.cache
    }

    pub fn next_generation(&mut self) -> u64 {
        self.issued_generation += 1;
        self.issued_generation
    }

    fn accepts(&self, generation: u64, applied: u64) -> bool {
        if self.config.discard_stale && generation < applied {
            debug!(generation, applied, "discarding out-of-order response");
            return false;
        }
        true
    }

    pub fn apply_fetch(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Departments(fetched) => {
                self.status.departments = Some(fetched.outcome);
                self.raw.departments = fetched.data;
            }
            FetchEvent::Snapshot {
                generation,
                fetched,
            } => {
                if !self.accepts(generation, self.snapshot_generation) {
                    return;
                }
                self.snapshot_generation = self.snapshot_generation.max(generation);
                self.status.agents = Some(fetched.outcome);
                if fetched.outcome.is_fresh() {
                    self.status.last_refresh = Some(Utc::now());
                }
                if fetched.outcome != FetchOutcome::Empty {
                    self.raw.agents = fetched.data.members;
                    self.raw.unassigned_ticket_numbers = fetched.data.unassigned_ticket_numbers;
                    self.unassigned_revision += 1;
                    self.cache.store_json(
                        keys::DISPLAY_ROWS,
                        &project::display_rows(&self.raw.agents),
                    );
                }
            }
            FetchEvent::Metrics {
                generation,
                fetched,
            } => {
                if !self.accepts(generation, self.metrics_generation) {
                    return;
                }
                self.metrics_generation = self.metrics_generation.max(generation);
                self.status.metrics = Some(fetched.outcome);
                if fetched.outcome != FetchOutcome::Empty {
                    self.raw.metrics = fetched.data;
                }
            }
            FetchEvent::Archived {
                department_id,
                fetched,
            } => {
                if self.archived_requested.as_ref() != Some(&department_id) {
                    debug!(?department_id, "ignoring archived rows for a previous department");
                    return;
                }
                self.status.archived = Some(fetched.outcome);
                self.raw.archived = fetched.data;
            }
        }
        self.recompute();
    }

    pub fn on_timer(&mut self, kind: TimerKind) -> TimerEffect {
        match kind {
            TimerKind::BulkRefresh => return TimerEffect::Refresh(self.next_generation()),
            TimerKind::UnassignedCarousel => {
                self.cursor.unassigned_index = paginate::rotate_unassigned(
                    self.cursor.unassigned_index,
                    self.raw.unassigned_ticket_numbers.len(),
                );
            }
            TimerKind::PageRotation => {
                self.cursor.page = paginate::next_page(self.cursor.page, self.view.total_pages());
            }
        }
        self.recompute();
        TimerEffect::Redraw
    }

    pub fn schedule_shape(&self) -> ScheduleShape {
        ScheduleShape {
            unassigned_len: self.raw.unassigned_ticket_numbers.len(),
            unassigned_revision: self.unassigned_revision,
            candidate_count: self.view.candidate_count(),
            total_pages: self.view.total_pages(),
        }
    }

    pub fn schedule_plan(&self) -> SchedulePlan {
        SchedulePlan::for_shape(&self.schedule_shape())
    }

    /// Department to fetch archived rows for, when the archived table is on
    /// and its target changed since the last request.
    pub fn take_archived_request(&mut self) -> Option<Option<String>> {
        if !self.selection.age_view_enabled(AgeView::Archived) {
            self.archived_requested = None;
            return None;
        }
        let target = archived_target(&self.raw, &self.selection, &self.cursor);
        if self.archived_requested.as_ref() == Some(&target) {
            return None;
        }
        self.archived_requested = Some(target.clone());
        Some(target)
    }

    /// Rebuild the view and persist whatever derived state changed.
    pub fn recompute(&mut self) {
        self.view = build_dashboard(&self.raw, &self.selection, &self.cursor);
        self.cursor = self.view.cursor;

        let latest = project::latest_unassigned(
            &self.raw.unassigned_ticket_numbers,
            self.cursor.unassigned_index,
        );
        if latest.is_some() && latest != self.persisted_latest {
            self.cache.store_json(keys::LATEST_UNASSIGNED, &latest);
            self.raw.latest_unassigned = latest.clone();
            self.persisted_latest = latest;
        }

        let department_rows = department_cache_rows(&self.raw, &self.selection);
        if self.persisted_department_rows.as_ref() != Some(&department_rows) {
            self.cache
                .store_json(keys::DEPARTMENT_ROWS, &department_rows.0);
            self.cache
                .store_json(keys::DEPARTMENT_SUMMARY_ROWS, &department_rows.1);
            self.persisted_department_rows = Some(department_rows);
        }
    }

    fn persist_selection(&self) {
        self.cache
            .store_json(keys::SELECTED_DEPARTMENTS, &self.selection.departments);
        self.cache
            .store_json(keys::SELECTED_CANDIDATES, &self.selection.candidates);
        self.cache
            .store_json(keys::SELECTED_STATUSES, &self.selection.statuses);
    }

    fn selection_changed(&mut self) {
        self.persist_selection();
        self.recompute();
    }

    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.selection = selection;
        self.selection_changed();
    }

    /// Apply command-line overrides on top of the restored selection. A
    /// non-empty list replaces the matching persisted selection.
    pub fn apply_overrides(&mut self, overrides: ViewOverrides) {
        if !overrides.departments.is_empty() {
            self.selection.departments.clear();
            for id in overrides.departments {
                let label = self
                    .raw
                    .departments
                    .iter()
                    .find(|department| department.id == id)
                    .map(|department| department.name.clone())
                    .unwrap_or_else(|| id.clone());
                self.selection.departments.insert(SelectOption::new(id, label));
            }
        }
        if !overrides.agents.is_empty() {
            self.selection.candidates = overrides
                .agents
                .into_iter()
                .map(SelectOption::named)
                .collect::<Vec<_>>()
                .into();
        }
        if !overrides.statuses.is_empty() {
            self.selection.statuses = overrides
                .statuses
                .iter()
                .map(StatusKey::option)
                .collect::<Vec<_>>()
                .into();
        }
        if let Some(sort) = overrides.sort {
            self.selection.sort = sort;
        }
        for view in overrides.tables {
            if !self.selection.age_view_enabled(view) {
                self.selection.toggle_age_view(view);
            }
        }
        for (department_id, agent) in overrides.picks {
            if !self
                .selection
                .picked_agents(&department_id)
                .contains(&agent)
            {
                self.selection.toggle_department_agent(&department_id, &agent);
            }
        }
        if let Some(page) = overrides.page {
            self.cursor.page = page;
        }
        self.selection_changed();
    }

    pub fn toggle_sort(&mut self) {
        self.selection.sort = self.selection.sort.toggled();
        self.recompute();
    }

    pub fn cycle_status_preset(&mut self) {
        let presets = status_presets();
        self.preset_index = (self.preset_index + 1) % presets.len();
        self.selection.statuses.clear();
        for status in &presets[self.preset_index] {
            self.selection.toggle_status(*status);
        }
        self.status_note = Some(format!("statuses: {}", self.status_summary()));
        self.selection_changed();
    }

    pub fn status_summary(&self) -> String {
        let keys = self.selection.status_keys();
        if keys.is_empty() {
            return "total".to_string();
        }
        keys.iter()
            .map(|key| key.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn next_department(&mut self) {
        self.cursor.department_index = paginate::next_department(
            self.cursor.department_index,
            self.selection.departments.len(),
        );
        self.recompute();
    }

    pub fn prev_department(&mut self) {
        self.cursor.department_index = paginate::prev_department(
            self.cursor.department_index,
            self.selection.departments.len(),
        );
        self.recompute();
    }

    pub fn next_page(&mut self) {
        self.cursor.page = paginate::next_page(self.cursor.page, self.view.total_pages());
        self.recompute();
    }

    pub fn prev_page(&mut self) {
        self.cursor.page = paginate::previous_page(self.cursor.page, self.view.total_pages());
        self.recompute();
    }

    pub fn toggle_agent_tables(&mut self) {
        let enabled = self.selection.agent_buckets_enabled();
        self.selection.set_agent_buckets(!enabled);
        self.recompute();
    }

    pub fn toggle_table(&mut self, view: AgeView) {
        self.selection.toggle_age_view(view);
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;
    use tdash_core::AgentSnapshot;
    use tdash_source::Fetched;
    use tdash_storage::{MemoryCacheStore, SqliteCacheStore};

    fn test_config(discard_stale: bool) -> Config {
        Config {
            backend_url: "http://localhost:5000".to_string(),
            state_dir: PathBuf::from("."),
            http_timeout: Duration::from_secs(1),
            discard_stale,
            log_stdout: false,
            log_file: false,
        }
    }

    fn snapshot(names: &[(&str, u64)], numbers: &[&str]) -> AgentSnapshot {
        AgentSnapshot {
            members: names
                .iter()
                .map(|(name, open)| {
                    serde_json::from_value(json!({
                        "id": name.to_lowercase(),
                        "name": name,
                        "tickets": {"open": open, "unassigned": 1}
                    }))
                    .expect("agent")
                })
                .collect(),
            unassigned_ticket_numbers: numbers.iter().map(|n| n.to_string()).collect(),
        }
    }

    fn fresh<T>(data: T) -> Fetched<T> {
        Fetched {
            data,
            outcome: FetchOutcome::Fresh,
        }
    }

    #[test]
    fn restores_selection_and_data_from_cache() {
        let cache = MemoryCacheStore::new();
        cache.store_json(keys::AGENT_SNAPSHOT, &snapshot(&[("Alice", 2)], &[]).members);
        cache.store_json(keys::LATEST_UNASSIGNED, &"42");
        cache.store_json(
            keys::SELECTED_STATUSES,
            &vec![SelectOption::new("open", "Open")],
        );
        cache.set(keys::SELECTED_CANDIDATES, "{not json").expect("set");

        let app = App::new(test_config(false), cache);
        assert_eq!(app.raw.agents.len(), 1);
        assert_eq!(app.selection.status_keys(), vec![StatusKey::Open]);
        assert!(app.selection.candidates.is_empty());
        assert_eq!(app.view.ticket_number, "00042");
        assert_eq!(app.view.badge, "00042");
    }

    struct RecordingStore {
        inner: MemoryCacheStore,
        writes: std::sync::Mutex<Vec<String>>,
    }

    impl RecordingStore {
        fn written(&self) -> Vec<String> {
            self.writes.lock().expect("writes").clone()
        }
    }

    impl CacheStore for RecordingStore {
        fn get(&self, key: &str) -> Result<Option<String>, tdash_storage::StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), tdash_storage::StorageError> {
            self.writes.lock().expect("writes").push(key.to_string());
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), tdash_storage::StorageError> {
            self.inner.remove(key)
        }
    }

    fn seeded_department_cache() -> (MemoryCacheStore, RawState) {
        let agents: Vec<AgentRecord> = serde_json::from_value(json!([{
            "id": "a1",
            "name": "Alice",
            "departmentIds": ["1"],
            "tickets": {"open": 2},
            "departmentTicketCounts": {"1": 2},
            "departmentAgingCounts": {
                "1": {"openBetweenOneAndFifteenDaysTickets": [5, 6]}
            }
        }]))
        .expect("agents");
        let raw = RawState {
            agents,
            departments: vec![Department {
                id: "1".to_string(),
                name: "One".to_string(),
            }],
            ..RawState::default()
        };
        let cache = MemoryCacheStore::new();
        cache.store_json(keys::AGENT_SNAPSHOT, &raw.agents);
        cache.store_json(keys::DEPARTMENTS, &raw.departments);
        (cache, raw)
    }

    #[test]
    fn cached_department_rows_are_not_rewritten_on_startup() {
        let (cache, raw) = seeded_department_cache();
        let (rows, summary) = department_cache_rows(&raw, &FilterSelection::default());
        assert_eq!(rows.len(), 1);
        cache.store_json(keys::DEPARTMENT_ROWS, &rows);
        cache.store_json(keys::DEPARTMENT_SUMMARY_ROWS, &summary);

        let store = RecordingStore {
            inner: cache,
            writes: std::sync::Mutex::new(Vec::new()),
        };
        let app = App::new(test_config(false), store);
        let written = app.cache().written();
        assert!(!written.iter().any(|key| key == keys::DEPARTMENT_ROWS));
        assert!(!written.iter().any(|key| key == keys::DEPARTMENT_SUMMARY_ROWS));
    }

    #[test]
    fn outdated_department_rows_are_replaced_on_startup() {
        let (cache, raw) = seeded_department_cache();
        cache.store_json(keys::DEPARTMENT_ROWS, &Vec::<AgentAgeRow>::new());
        cache.store_json(keys::DEPARTMENT_SUMMARY_ROWS, &Vec::<DepartmentSummaryRow>::new());

        let app = App::new(test_config(false), cache);
        let rows: Vec<AgentAgeRow> = app.cache().load_json(keys::DEPARTMENT_ROWS);
        let summary: Vec<DepartmentSummaryRow> =
            app.cache().load_json(keys::DEPARTMENT_SUMMARY_ROWS);
        let expected = department_cache_rows(&raw, &FilterSelection::default());
        assert_eq!((rows, summary), expected);
        assert_eq!(expected.0.len(), 1);
    }

    #[test]
    fn snapshot_replaces_state_and_persists_derived_rows() {
        let mut app = App::new(test_config(false), MemoryCacheStore::new());
        app.apply_fetch(FetchEvent::Snapshot {
            generation: 1,
            fetched: fresh(snapshot(&[("Alice", 2), ("Bob", 0)], &["7", "8"])),
        });

        assert_eq!(app.view.grid.cells.len(), 2);
        assert_eq!(app.view.ticket_number, "00007");
        assert_eq!(app.status.label(), "live");
        let rows: Vec<serde_json::Value> = app.cache().load_json(keys::DISPLAY_ROWS);
        assert_eq!(rows.len(), 2);
        let latest: Option<String> = app.cache().try_load_json(keys::LATEST_UNASSIGNED);
        assert_eq!(latest.as_deref(), Some("7"));

        assert_eq!(app.on_timer(TimerKind::UnassignedCarousel), TimerEffect::Redraw);
        assert_eq!(app.view.ticket_number, "00008");
        let latest: Option<String> = app.cache().try_load_json(keys::LATEST_UNASSIGNED);
        assert_eq!(latest.as_deref(), Some("8"));
    }

    #[test]
    fn empty_fetch_keeps_previous_state() {
        let mut app = App::new(test_config(false), MemoryCacheStore::new());
        app.apply_fetch(FetchEvent::Snapshot {
            generation: 1,
            fetched: fresh(snapshot(&[("Alice", 2)], &["7"])),
        });
        app.apply_fetch(FetchEvent::Snapshot {
            generation: 2,
            fetched: Fetched {
                data: AgentSnapshot::default(),
                outcome: FetchOutcome::Empty,
            },
        });
        assert_eq!(app.raw.agents.len(), 1);
        assert_eq!(app.status.label(), "stale");
    }

    #[test]
    fn responses_apply_in_arrival_order_unless_guarded() {
        let older = FetchEvent::Snapshot {
            generation: 1,
            fetched: fresh(snapshot(&[("Old", 1)], &[])),
        };
        let newer = FetchEvent::Snapshot {
            generation: 2,
            fetched: fresh(snapshot(&[("New", 1)], &[])),
        };

        let mut app = App::new(test_config(false), MemoryCacheStore::new());
        app.apply_fetch(newer.clone());
        app.apply_fetch(older.clone());
        assert_eq!(app.raw.agents[0].name, "Old");

        let mut guarded = App::new(test_config(true), MemoryCacheStore::new());
        guarded.apply_fetch(newer);
        guarded.apply_fetch(older);
        assert_eq!(guarded.raw.agents[0].name, "New");
    }

    #[test]
    fn bulk_timer_issues_increasing_generations() {
        let mut app = App::new(test_config(false), MemoryCacheStore::new());
        assert_eq!(app.on_timer(TimerKind::BulkRefresh), TimerEffect::Refresh(1));
        assert_eq!(app.on_timer(TimerKind::BulkRefresh), TimerEffect::Refresh(2));
    }

    #[test]
    fn page_rotation_wraps_and_plan_tracks_pages() {
        let mut app = App::new(test_config(false), MemoryCacheStore::new());
        let names: Vec<(String, u64)> = (0..32).map(|i| (format!("Agent {i:02}"), 1)).collect();
        let refs: Vec<(&str, u64)> = names.iter().map(|(n, c)| (n.as_str(), *c)).collect();
        app.apply_fetch(FetchEvent::Snapshot {
            generation: 1,
            fetched: fresh(snapshot(&refs, &[])),
        });
        assert!(app.schedule_plan().contains(TimerKind::PageRotation));
        assert!(!app.schedule_plan().contains(TimerKind::UnassignedCarousel));

        for expected in [2, 3, 1] {
            app.on_timer(TimerKind::PageRotation);
            assert_eq!(app.cursor.page, expected);
        }
    }

    #[test]
    fn selection_changes_are_persisted_and_reset_department_index() {
        let mut app = App::new(test_config(false), MemoryCacheStore::new());
        let mut selection = FilterSelection::default();
        selection.departments.insert(SelectOption::new("1", "One"));
        selection.departments.insert(SelectOption::new("2", "Two"));
        app.set_selection(selection);
        app.next_department();
        assert_eq!(app.cursor.department_index, 2);

        let mut shrunk = app.selection.clone();
        shrunk.departments.remove("2");
        app.set_selection(shrunk);
        assert_eq!(app.cursor.department_index, 1);

        let stored: SelectionSet = app.cache().load_json(keys::SELECTED_DEPARTMENTS);
        assert_eq!(stored.values().collect::<Vec<_>>(), vec!["1"]);
    }

    #[test]
    fn archived_request_follows_toggle_and_department() {
        let mut app = App::new(test_config(false), MemoryCacheStore::new());
        assert_eq!(app.take_archived_request(), None);

        app.toggle_table(AgeView::Archived);
        assert_eq!(app.take_archived_request(), Some(None));
        assert_eq!(app.take_archived_request(), None);

        app.apply_fetch(FetchEvent::Departments(fresh(vec![Department {
            id: "9".to_string(),
            name: "Support".to_string(),
        }])));
        assert_eq!(app.take_archived_request(), Some(Some("9".to_string())));
    }

    #[test]
    fn overrides_replace_persisted_selection() {
        let cache = MemoryCacheStore::new();
        cache.store_json(
            keys::SELECTED_CANDIDATES,
            &vec![SelectOption::named("Zed")],
        );
        let names: Vec<(String, u64)> = (0..20).map(|i| (format!("Agent {i:02}"), 1)).collect();
        let refs: Vec<(&str, u64)> = names.iter().map(|(n, c)| (n.as_str(), *c)).collect();
        cache.store_json(keys::AGENT_SNAPSHOT, &snapshot(&refs, &[]).members);

        let mut app = App::new(test_config(false), cache);
        app.apply_overrides(ViewOverrides {
            agents: Vec::new(),
            statuses: vec![StatusKey::Open, StatusKey::Hold],
            sort: Some(SortOrder::Desc),
            tables: vec![AgeView::Pending],
            picks: vec![("7".to_string(), "Dave".to_string())],
            ..ViewOverrides::default()
        });
        assert_eq!(app.selection.candidates.values().collect::<Vec<_>>(), vec!["Zed"]);
        assert_eq!(
            app.selection.status_keys(),
            vec![StatusKey::Open, StatusKey::Hold]
        );
        assert_eq!(app.selection.picked_agents("7"), ["Dave".to_string()]);
        assert!(app.view.tables.pending.is_some());

        app.apply_overrides(ViewOverrides {
            agents: vec!["Agent 00".to_string()],
            page: Some(2),
            ..ViewOverrides::default()
        });
        assert_eq!(app.view.candidate_count(), 1);
        assert_eq!(app.cursor.page, 1);

        let stored: SelectionSet = app.cache().load_json(keys::SELECTED_STATUSES);
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn selections_survive_restart_with_sqlite_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cache.sqlite");
        {
            let store = SqliteCacheStore::open(&path).expect("open");
            let mut app = App::new(test_config(false), store);
            app.cycle_status_preset();
            assert_eq!(app.selection.status_keys(), vec![StatusKey::Total]);
        }
        let store = SqliteCacheStore::open(&path).expect("reopen");
        let app = App::new(test_config(false), store);
        assert_eq!(app.selection.status_keys(), vec![StatusKey::Total]);
        assert_eq!(app.view.legend.total, Some(0));
    }
}
