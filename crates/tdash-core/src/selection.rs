use crate::{AgeBucket, StatusKey};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One picker entry. `value` is the identity, `label` is what gets shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(deserialize_with = "deserialize_value")]
    pub value: String,
    #[serde(default)]
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option whose label is its value, as used by the agent picker.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            value: name,
        }
    }
}

fn deserialize_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom("expected string or number for value")),
    }
}

/// Insertion-ordered set of options, unique by `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<SelectOption>", into = "Vec<SelectOption>")]
pub struct SelectionSet {
    items: Vec<SelectOption>,
}

impl From<Vec<SelectOption>> for SelectionSet {
    fn from(items: Vec<SelectOption>) -> Self {
        let mut set = SelectionSet::default();
        for item in items {
            set.insert(item);
        }
        set
    }
}

impl From<SelectionSet> for Vec<SelectOption> {
    fn from(set: SelectionSet) -> Self {
        set.items
    }
}

impl SelectionSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectOption> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&SelectOption> {
        self.items.get(index)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.value.as_str())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.items.iter().any(|item| item.value == value)
    }

    /// Returns false when the value was already selected.
    pub fn insert(&mut self, option: SelectOption) -> bool {
        if self.contains(&option.value) {
            return false;
        }
        self.items.push(option);
        true
    }

    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.value != value);
        before != self.items.len()
    }

    pub fn toggle(&mut self, option: SelectOption) {
        if !self.remove(&option.value) {
            self.items.push(option);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Asc => "Asc",
            SortOrder::Desc => "Desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AgeView {
    FifteenDays,
    SixteenToThirty,
    Month,
    Department,
    Pending,
    Metrics,
    Archived,
}

impl AgeView {
    /// The three agent age-bucket views, toggled together by the "agents" switch.
    pub const AGENT_BUCKETS: [AgeView; 3] =
        [AgeView::FifteenDays, AgeView::SixteenToThirty, AgeView::Month];

    pub fn bucket(self) -> Option<AgeBucket> {
        match self {
            AgeView::FifteenDays => Some(AgeBucket::OneToFifteen),
            AgeView::SixteenToThirty => Some(AgeBucket::SixteenToThirty),
            AgeView::Month => Some(AgeBucket::OverThirty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub departments: SelectionSet,
    #[serde(default)]
    pub candidates: SelectionSet,
    #[serde(default)]
    pub statuses: SelectionSet,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default)]
    pub age_views: BTreeSet<AgeView>,
    /// Agents picked per department (department id -> roster names).
    #[serde(default)]
    pub department_agents: BTreeMap<String, Vec<String>>,
}

impl FilterSelection {
    /// Parsed status keys in selection order; unknown values are ignored.
    pub fn status_keys(&self) -> Vec<StatusKey> {
        self.statuses
            .values()
            .filter_map(|value| value.parse::<StatusKey>().ok())
            .collect()
    }

    pub fn toggle_status(&mut self, status: StatusKey) {
        self.statuses.toggle(status.option());
    }

    pub fn age_view_enabled(&self, view: AgeView) -> bool {
        self.age_views.contains(&view)
    }

    pub fn toggle_age_view(&mut self, view: AgeView) {
        if !self.age_views.remove(&view) {
            self.age_views.insert(view);
        }
    }

    /// The agent age table counts as enabled only when all three buckets are on.
    pub fn agent_buckets_enabled(&self) -> bool {
        AgeView::AGENT_BUCKETS
            .iter()
            .all(|view| self.age_views.contains(view))
    }

    pub fn set_agent_buckets(&mut self, enabled: bool) {
        for view in AgeView::AGENT_BUCKETS {
            if enabled {
                self.age_views.insert(view);
            } else {
                self.age_views.remove(&view);
            }
        }
    }

    pub fn picked_agents(&self, department_id: &str) -> &[String] {
        self.department_agents
            .get(department_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn toggle_department_agent(&mut self, department_id: &str, agent_name: &str) {
        let picked = self
            .department_agents
            .entry(department_id.to_string())
            .or_default();
        if let Some(pos) = picked.iter().position(|name| name == agent_name) {
            picked.remove(pos);
        } else {
            picked.push(agent_name.to_string());
        }
        if picked.is_empty() {
            self.department_agents.remove(department_id);
        }
    }
}
