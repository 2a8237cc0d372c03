//! Cache keys. Every dataset and persisted selection lives under its own key.

pub const AGENT_SNAPSHOT: &str = "tickets.agents";
pub const DISPLAY_ROWS: &str = "tickets.display_rows";
pub const UNASSIGNED_NUMBERS: &str = "tickets.unassigned_numbers";
pub const LATEST_UNASSIGNED: &str = "tickets.latest_unassigned";
pub const METRICS_ROWS: &str = "tickets.metrics_rows";
pub const DEPARTMENTS: &str = "departments.list";
pub const DEPARTMENT_ROWS: &str = "departments.rows";
pub const DEPARTMENT_SUMMARY_ROWS: &str = "departments.summary_rows";
pub const SELECTED_DEPARTMENTS: &str = "selection.departments";
pub const SELECTED_CANDIDATES: &str = "selection.candidates";
pub const SELECTED_STATUSES: &str = "selection.statuses";
