//! Turns raw agent snapshots into the dashboard view-model.
//!
//! Everything here is a pure function of the raw datasets, the filter
//! selection and the view cursor, so the caller can rebuild the whole view
//! after any mutation.

use serde::{Deserialize, Serialize};
use tdash_core::{
    AgeBucket, AgeView, AgentRecord, ArchivedRow, Department, FilterSelection, MetricsRow,
    SelectOption, SortOrder, StatusKey,
};

pub mod age;
pub mod aggregate;
pub mod filter;
pub mod paginate;
pub mod project;

pub use age::{AgeTables, AgedCounts, AgentAgeRow, BucketCounts, DepartmentSummaryRow, PendingRow};
pub use aggregate::{department_agents, global_sums, roster_map, DepartmentAgent};
pub use filter::{apply_filters, DepartmentOption, StatusProjection};
pub use paginate::{PageInfo, CANDIDATES_PER_PAGE};
pub use project::{DepartmentPanel, DisplayCell, DisplayRow, Legend};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawState {
    pub agents: Vec<AgentRecord>,
    pub departments: Vec<Department>,
    pub metrics: Vec<MetricsRow>,
    pub archived: Vec<ArchivedRow>,
    pub unassigned_ticket_numbers: Vec<String>,
    /// Last carousel number persisted from a previous run.
    pub latest_unassigned: Option<String>,
}

/// Positions the user (or a rotation timer) moved to. Page and department
/// index are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewCursor {
    pub page: usize,
    pub department_index: usize,
    pub unassigned_index: usize,
}

impl Default for ViewCursor {
    fn default() -> Self {
        Self {
            page: 1,
            department_index: 1,
            unassigned_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateGrid {
    pub cells: Vec<DisplayCell>,
    pub page: PageInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub legend: Legend,
    /// Current carousel value, padded to 5 digits.
    pub ticket_number: String,
    /// What the unassigned badge shows.
    pub badge: String,
    pub projection: StatusProjection,
    pub sort: SortOrder,
    pub grid: CandidateGrid,
    pub department: Option<DepartmentPanel>,
    pub department_index: usize,
    pub department_count: usize,
    pub candidate_options: Vec<SelectOption>,
    pub department_options: Vec<DepartmentOption>,
    pub tables: AgeTables,
    /// Cursor after stale positions were reset.
    pub cursor: ViewCursor,
}

impl DashboardView {
    pub fn total_pages(&self) -> usize {
        self.grid.page.total_pages
    }

    pub fn candidate_count(&self) -> usize {
        self.grid.page.count
    }
}

/// Cursor with stale page and department positions reset to the first one.
pub fn normalize_cursor(
    cursor: &ViewCursor,
    candidate_count: usize,
    selected_departments: usize,
    unassigned: usize,
) -> ViewCursor {
    ViewCursor {
        page: paginate::effective_page(cursor.page, paginate::total_pages(candidate_count)),
        department_index: paginate::department_index(cursor.department_index, selected_departments),
        unassigned_index: if unassigned == 0 {
            0
        } else {
            cursor.unassigned_index % unassigned
        },
    }
}

/// Selected department shown by the carousel, if any.
pub fn current_department<'a>(
    selection: &'a FilterSelection,
    cursor: &ViewCursor,
) -> Option<&'a SelectOption> {
    let index = paginate::department_index(cursor.department_index, selection.departments.len());
    selection.departments.get(index - 1)
}

/// Department the archived table is fetched for: the carousel department,
/// else the first known department.
pub fn archived_target(
    raw: &RawState,
    selection: &FilterSelection,
    cursor: &ViewCursor,
) -> Option<String> {
    current_department(selection, cursor)
        .map(|option| option.value.clone())
        .or_else(|| raw.departments.first().map(|department| department.id.clone()))
        .filter(|id| !id.is_empty())
}

fn department_label(raw: &RawState, option: &SelectOption) -> String {
    raw.departments
        .iter()
        .find(|department| department.id == option.value)
        .map(|department| department.name.clone())
        .unwrap_or_else(|| option.label.clone())
}

pub fn build_dashboard(
    raw: &RawState,
    selection: &FilterSelection,
    cursor: &ViewCursor,
) -> DashboardView {
    let sums = aggregate::global_sums(&raw.agents);
    let legend = Legend::from_sums(&sums, selection);
    let projection = StatusProjection::from_selection(selection);

    let filtered = apply_filters(&raw.agents, &selection.departments, &selection.candidates);
    let candidates = project::sorted_candidates(&filtered, selection.sort);
    let cursor = normalize_cursor(
        cursor,
        candidates.len(),
        selection.departments.len(),
        raw.unassigned_ticket_numbers.len(),
    );
    let page = PageInfo::resolve(cursor.page, candidates.len());
    let cells = project::project_cells(&candidates, page.range(), &projection);

    let ticket_number = project::carousel_ticket_number(
        &raw.unassigned_ticket_numbers,
        cursor.unassigned_index,
        raw.latest_unassigned.as_deref(),
    );
    let badge = project::unassigned_badge(sums.unassigned, &ticket_number);

    let rosters = roster_map(&raw.departments, &raw.agents);
    let current = current_department(selection, &cursor);
    let department = current.map(|option| {
        let roster = rosters
            .get(&option.value)
            .cloned()
            .unwrap_or_else(|| aggregate::department_roster(&raw.agents, &option.value));
        DepartmentPanel::build(
            &option.value,
            &department_label(raw, option),
            department_agents(&raw.agents, &option.value, &roster),
            selection.picked_agents(&option.value),
            &StatusProjection::for_panel(selection),
        )
    });

    let tables = build_tables(raw, selection, &filtered, current);

    DashboardView {
        legend,
        ticket_number,
        badge,
        projection,
        sort: selection.sort,
        grid: CandidateGrid { cells, page },
        department,
        department_index: cursor.department_index,
        department_count: selection.departments.len(),
        candidate_options: filter::candidate_options(&raw.agents),
        department_options: filter::department_options(&raw.departments, &rosters),
        tables,
        cursor,
    }
}

fn build_tables(
    raw: &RawState,
    selection: &FilterSelection,
    filtered: &[&AgentRecord],
    current: Option<&SelectOption>,
) -> AgeTables {
    let current_id = current.map(|option| option.value.as_str());
    let mut tables = AgeTables {
        agent_buckets: AgeView::AGENT_BUCKETS
            .iter()
            .filter(|view| selection.age_view_enabled(**view))
            .filter_map(|view| view.bucket())
            .collect::<Vec<AgeBucket>>(),
        ..AgeTables::default()
    };

    if !tables.agent_buckets.is_empty() {
        let picked = current_id
            .map(|id| selection.picked_agents(id))
            .unwrap_or(&[]);
        let scoped: Vec<&AgentRecord> = filtered
            .iter()
            .copied()
            .filter(|agent| picked.is_empty() || picked.iter().any(|name| name == agent.name.trim()))
            .collect();
        tables.agents = Some(age::agent_age_rows(&scoped, current_id, selection.sort));
    }

    if selection.age_view_enabled(AgeView::Department) {
        let scope = department_scope(raw, selection);
        tables.departments = Some(age::department_summary_rows(&raw.agents, &scope));
    }

    if selection.age_view_enabled(AgeView::Pending) {
        tables.pending = Some(age::pending_rows(filtered, selection.sort));
    }

    if selection.age_view_enabled(AgeView::Metrics) {
        tables.metrics = Some(raw.metrics.clone());
    }

    if selection.age_view_enabled(AgeView::Archived) {
        tables.archived = Some(raw.archived.clone());
    }

    tables
}

/// Departments covered by the department tables: the selection when there is
/// one, else every known department.
pub fn department_scope(raw: &RawState, selection: &FilterSelection) -> Vec<(String, String)> {
    if selection.departments.is_empty() {
        raw.departments
            .iter()
            .map(|department| (department.id.clone(), department.name.clone()))
            .collect()
    } else {
        selection
            .departments
            .iter()
            .map(|option| (option.value.clone(), department_label(raw, option)))
            .collect()
    }
}

/// Rows persisted for the department tables, independent of the toggles.
pub fn department_cache_rows(
    raw: &RawState,
    selection: &FilterSelection,
) -> (Vec<AgentAgeRow>, Vec<DepartmentSummaryRow>) {
    let scope = department_scope(raw, selection);
    let ids: Vec<String> = scope.iter().map(|(id, _)| id.clone()).collect();
    (
        age::department_rows(&raw.agents, &ids, selection.sort),
        age::department_summary_rows(&raw.agents, &scope),
    )
}

/// Status presets cycled from the keyboard, in order.
pub fn status_presets() -> Vec<Vec<StatusKey>> {
    vec![
        vec![],
        vec![StatusKey::Total],
        vec![StatusKey::Open],
        vec![StatusKey::Hold],
        vec![StatusKey::InProgress],
        vec![StatusKey::Escalated],
        vec![
            StatusKey::Open,
            StatusKey::Hold,
            StatusKey::InProgress,
            StatusKey::Escalated,
        ],
        vec![
            StatusKey::Open,
            StatusKey::Hold,
            StatusKey::InProgress,
            StatusKey::Escalated,
            StatusKey::Total,
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdash_core::TicketCounts;

    fn agent(name: &str, departments: &[&str], open: u64) -> AgentRecord {
        AgentRecord {
            id: name.to_lowercase(),
            name: name.to_string(),
            department_ids: departments.iter().map(|id| id.to_string()).collect(),
            tickets: TicketCounts {
                open,
                ..TicketCounts::default()
            },
            department_ticket_counts: departments
                .iter()
                .map(|id| (id.to_string(), open))
                .collect(),
            ..AgentRecord::default()
        }
    }

    fn departments() -> Vec<Department> {
        vec![
            Department {
                id: "1".to_string(),
                name: "Support".to_string(),
            },
            Department {
                id: "2".to_string(),
                name: "Billing".to_string(),
            },
        ]
    }

    #[test]
    fn empty_state_still_yields_a_view() {
        let view = build_dashboard(
            &RawState::default(),
            &FilterSelection::default(),
            &ViewCursor::default(),
        );
        assert!(view.grid.cells.is_empty());
        assert_eq!(view.grid.page.page, 1);
        assert_eq!(view.total_pages(), 0);
        assert_eq!(view.ticket_number, "00000");
        assert_eq!(view.badge, "00000");
        assert!(view.department.is_none());
        assert!(view.tables.is_empty());
    }

    #[test]
    fn department_selection_drives_panel_and_cursor() {
        let raw = RawState {
            agents: vec![agent("Alice", &["1"], 2), agent("Bob", &["2"], 1)],
            departments: departments(),
            ..RawState::default()
        };
        let mut selection = FilterSelection::default();
        selection
            .departments
            .insert(SelectOption::new("2", "Billing"));

        let cursor = ViewCursor {
            department_index: 4,
            ..ViewCursor::default()
        };
        let view = build_dashboard(&raw, &selection, &cursor);
        assert_eq!(view.cursor.department_index, 1);
        assert_eq!(view.department_count, 1);
        let panel = view.department.expect("panel");
        assert_eq!(panel.label, "Billing");
        assert_eq!(panel.cards.len(), 1);
        assert_eq!(panel.cards[0].name, "Bob");
        assert_eq!(view.grid.cells.len(), 1);
        assert_eq!(view.legend.open, 3);
    }

    #[test]
    fn archived_target_prefers_carousel_department() {
        let raw = RawState {
            departments: departments(),
            ..RawState::default()
        };
        let mut selection = FilterSelection::default();
        assert_eq!(
            archived_target(&raw, &selection, &ViewCursor::default()).as_deref(),
            Some("1")
        );

        selection
            .departments
            .insert(SelectOption::new("2", "Billing"));
        assert_eq!(
            archived_target(&raw, &selection, &ViewCursor::default()).as_deref(),
            Some("2")
        );

        assert_eq!(
            archived_target(
                &RawState::default(),
                &FilterSelection::default(),
                &ViewCursor::default()
            ),
            None
        );
    }

    #[test]
    fn toggles_switch_table_sections() {
        let raw = RawState {
            agents: vec![agent("Alice", &["1"], 2)],
            departments: departments(),
            ..RawState::default()
        };
        let mut selection = FilterSelection::default();
        selection.set_agent_buckets(true);
        selection.toggle_age_view(AgeView::Metrics);
        let view = build_dashboard(&raw, &selection, &ViewCursor::default());
        assert_eq!(view.tables.agent_buckets.len(), 3);
        assert!(view.tables.agents.is_some());
        assert_eq!(view.tables.metrics.as_deref(), Some(&[][..]));
        assert!(view.tables.pending.is_none());
        assert!(view.tables.archived.is_none());
    }

    #[test]
    fn department_cache_rows_cover_all_departments_without_selection() {
        let raw = RawState {
            agents: vec![agent("Alice", &["1"], 2)],
            departments: departments(),
            ..RawState::default()
        };
        let (_rows, summary) = department_cache_rows(&raw, &FilterSelection::default());
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[1].department_name, "Billing");
    }
}
