use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tdash_core::{
    normalize_name, AgentRecord, Department, FilterSelection, SelectOption, SelectionSet, StatusKey,
};

/// Keep agents matching the department and candidate selections, in that
/// order. An empty selection leaves the list untouched.
pub fn apply_filters<'a>(
    agents: &'a [AgentRecord],
    departments: &SelectionSet,
    candidates: &SelectionSet,
) -> Vec<&'a AgentRecord> {
    let mut rows: Vec<&AgentRecord> = agents.iter().collect();

    if !departments.is_empty() {
        rows.retain(|agent| {
            agent
                .department_ids
                .iter()
                .any(|id| departments.contains(id))
        });
    }

    if !candidates.is_empty() {
        let allowed: HashSet<String> = candidates.values().map(normalize_name).collect();
        rows.retain(|agent| allowed.contains(&agent.name_key()));
    }

    rows
}

/// How counts are laid out per row: one summed box, or one box per status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "statuses", rename_all = "snake_case")]
pub enum StatusProjection {
    Total,
    Columns(Vec<StatusKey>),
}

impl StatusProjection {
    pub fn from_selection(selection: &FilterSelection) -> Self {
        let keys = selection.status_keys();
        if keys.is_empty() || keys == [StatusKey::Total] {
            return StatusProjection::Total;
        }
        StatusProjection::Columns(
            keys.into_iter()
                .filter(|key| *key != StatusKey::Total)
                .collect(),
        )
    }

    /// Department cards collapse to the single department total whenever
    /// "total" is among the selected statuses.
    pub fn for_panel(selection: &FilterSelection) -> Self {
        let keys = selection.status_keys();
        if keys.contains(&StatusKey::Total) {
            return StatusProjection::Total;
        }
        Self::from_selection(selection)
    }

    pub fn statuses(&self) -> &[StatusKey] {
        match self {
            StatusProjection::Total => &[StatusKey::Total],
            StatusProjection::Columns(keys) => keys,
        }
    }
}

/// Names offered by the agent picker: agents with any ticket, deduplicated
/// and sorted.
pub fn candidate_options(agents: &[AgentRecord]) -> Vec<SelectOption> {
    agents
        .iter()
        .filter(|agent| !agent.tickets.is_zero())
        .map(|agent| agent.name.trim())
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(SelectOption::named)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentOption {
    pub value: String,
    pub label: String,
    /// Agents with at least one ticket in this department.
    pub roster: Vec<String>,
}

pub fn department_options(
    departments: &[Department],
    rosters: &BTreeMap<String, Vec<String>>,
) -> Vec<DepartmentOption> {
    let mut sorted: Vec<&Department> = departments.iter().collect();
    sorted.sort_by(|a, b| compare_names(&a.name, &b.name));
    sorted
        .into_iter()
        .map(|department| DepartmentOption {
            value: department.id.clone(),
            label: department.name.clone(),
            roster: rosters.get(&department.id).cloned().unwrap_or_default(),
        })
        .collect()
}

/// Case-insensitive ordering with a byte-order tiebreak so results stay stable.
pub fn compare_names(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
