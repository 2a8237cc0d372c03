use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

pub mod selection;

pub use selection::{AgeView, FilterSelection, SelectOption, SelectionSet, SortOrder};

/// Ticket counts as reported by the backend for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCounts {
    #[serde(default, deserialize_with = "deserialize_count")]
    pub open: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub hold: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub escalated: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub unassigned: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub in_progress: u64,
}

impl TicketCounts {
    pub fn get(&self, status: StatusKey) -> u64 {
        match status {
            StatusKey::Open => self.open,
            StatusKey::Hold => self.hold,
            StatusKey::InProgress => self.in_progress,
            StatusKey::Escalated => self.escalated,
            StatusKey::Unassigned => self.unassigned,
            StatusKey::Total => self.total(),
        }
    }

    pub fn total(&self) -> u64 {
        saturating_sum([
            self.open,
            self.hold,
            self.in_progress,
            self.escalated,
            self.unassigned,
        ])
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    pub fn accumulate(&mut self, other: &TicketCounts) {
        self.open = self.open.saturating_add(other.open);
        self.hold = self.hold.saturating_add(other.hold);
        self.in_progress = self.in_progress.saturating_add(other.in_progress);
        self.escalated = self.escalated.saturating_add(other.escalated);
        self.unassigned = self.unassigned.saturating_add(other.unassigned);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusKey {
    Open,
    Hold,
    InProgress,
    Escalated,
    Unassigned,
    Total,
}

/// Statuses offered by the status picker. Unassigned is shown in the legend only.
pub const STATUS_OPTIONS: [StatusKey; 5] = [
    StatusKey::Open,
    StatusKey::Hold,
    StatusKey::InProgress,
    StatusKey::Escalated,
    StatusKey::Total,
];

impl StatusKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKey::Open => "open",
            StatusKey::Hold => "hold",
            StatusKey::InProgress => "inProgress",
            StatusKey::Escalated => "escalated",
            StatusKey::Unassigned => "unassigned",
            StatusKey::Total => "total",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusKey::Open => "Open",
            StatusKey::Hold => "Hold",
            StatusKey::InProgress => "In Progress",
            StatusKey::Escalated => "Escalated",
            StatusKey::Unassigned => "Unassigned",
            StatusKey::Total => "Total",
        }
    }

    pub fn option(&self) -> SelectOption {
        SelectOption::new(self.as_str(), self.label())
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusKey {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "open" => Ok(StatusKey::Open),
            "hold" | "on-hold" | "on_hold" => Ok(StatusKey::Hold),
            "inprogress" | "in-progress" | "in_progress" | "in progress" => {
                Ok(StatusKey::InProgress)
            }
            "escalated" => Ok(StatusKey::Escalated),
            "unassigned" => Ok(StatusKey::Unassigned),
            "total" => Ok(StatusKey::Total),
            other => Err(format!("Unknown status: {other}")),
        }
    }
}

/// Statuses that the backend splits into age buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AgedStatus {
    Open,
    Hold,
    InProgress,
    Escalated,
}

impl AgedStatus {
    pub const ALL: [AgedStatus; 4] = [
        AgedStatus::Open,
        AgedStatus::Hold,
        AgedStatus::InProgress,
        AgedStatus::Escalated,
    ];

    pub fn status_key(self) -> StatusKey {
        match self {
            AgedStatus::Open => StatusKey::Open,
            AgedStatus::Hold => StatusKey::Hold,
            AgedStatus::InProgress => StatusKey::InProgress,
            AgedStatus::Escalated => StatusKey::Escalated,
        }
    }

    pub fn from_status_key(status: StatusKey) -> Option<Self> {
        match status {
            StatusKey::Open => Some(AgedStatus::Open),
            StatusKey::Hold => Some(AgedStatus::Hold),
            StatusKey::InProgress => Some(AgedStatus::InProgress),
            StatusKey::Escalated => Some(AgedStatus::Escalated),
            StatusKey::Unassigned | StatusKey::Total => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AgeBucket {
    OneToFifteen,
    SixteenToThirty,
    OverThirty,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 3] = [
        AgeBucket::OneToFifteen,
        AgeBucket::SixteenToThirty,
        AgeBucket::OverThirty,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::OneToFifteen => "1-15d",
            AgeBucket::SixteenToThirty => "16-30d",
            AgeBucket::OverThirty => ">30d",
        }
    }
}

/// Ticket ids of one status, split by age.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgeBuckets {
    pub one_to_fifteen: Vec<String>,
    pub sixteen_to_thirty: Vec<String>,
    pub over_thirty: Vec<String>,
}

impl AgeBuckets {
    pub fn tickets(&self, bucket: AgeBucket) -> &[String] {
        match bucket {
            AgeBucket::OneToFifteen => &self.one_to_fifteen,
            AgeBucket::SixteenToThirty => &self.sixteen_to_thirty,
            AgeBucket::OverThirty => &self.over_thirty,
        }
    }

    pub fn count(&self, bucket: AgeBucket) -> u64 {
        self.tickets(bucket).len() as u64
    }

    pub fn total(&self) -> u64 {
        saturating_sum(AgeBucket::ALL.iter().map(|bucket| self.count(*bucket)))
    }
}

/// Age buckets for every aged status of one agent inside one department.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DepartmentAgingWire", into = "DepartmentAgingWire")]
pub struct DepartmentAging {
    pub open: AgeBuckets,
    pub hold: AgeBuckets,
    pub in_progress: AgeBuckets,
    pub escalated: AgeBuckets,
}

impl DepartmentAging {
    pub fn buckets(&self, status: AgedStatus) -> &AgeBuckets {
        match status {
            AgedStatus::Open => &self.open,
            AgedStatus::Hold => &self.hold,
            AgedStatus::InProgress => &self.in_progress,
            AgedStatus::Escalated => &self.escalated,
        }
    }

    pub fn status_total(&self, status: AgedStatus) -> u64 {
        self.buckets(status).total()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DepartmentAgingWire {
    #[serde(default, deserialize_with = "deserialize_id_list")]
    open_between_one_and_fifteen_days_tickets: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    open_between_sixteen_and_thirty_days_tickets: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    open_older_than_thirty_days_tickets: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    hold_between_one_and_fifteen_days_tickets: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    hold_between_sixteen_and_thirty_days_tickets: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    hold_older_than_thirty_days_tickets: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    in_progress_between_one_and_fifteen_days_tickets: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    in_progress_between_sixteen_and_thirty_days_tickets: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    in_progress_older_than_thirty_days_tickets: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    escalated_between_one_and_fifteen_days_tickets: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    escalated_between_sixteen_and_thirty_days_tickets: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    escalated_older_than_thirty_days_tickets: Vec<String>,
}

impl From<DepartmentAgingWire> for DepartmentAging {
    fn from(wire: DepartmentAgingWire) -> Self {
        Self {
            open: AgeBuckets {
                one_to_fifteen: wire.open_between_one_and_fifteen_days_tickets,
                sixteen_to_thirty: wire.open_between_sixteen_and_thirty_days_tickets,
                over_thirty: wire.open_older_than_thirty_days_tickets,
            },
            hold: AgeBuckets {
                one_to_fifteen: wire.hold_between_one_and_fifteen_days_tickets,
                sixteen_to_thirty: wire.hold_between_sixteen_and_thirty_days_tickets,
                over_thirty: wire.hold_older_than_thirty_days_tickets,
            },
            in_progress: AgeBuckets {
                one_to_fifteen: wire.in_progress_between_one_and_fifteen_days_tickets,
                sixteen_to_thirty: wire.in_progress_between_sixteen_and_thirty_days_tickets,
                over_thirty: wire.in_progress_older_than_thirty_days_tickets,
            },
            escalated: AgeBuckets {
                one_to_fifteen: wire.escalated_between_one_and_fifteen_days_tickets,
                sixteen_to_thirty: wire.escalated_between_sixteen_and_thirty_days_tickets,
                over_thirty: wire.escalated_older_than_thirty_days_tickets,
            },
        }
    }
}

impl From<DepartmentAging> for DepartmentAgingWire {
    fn from(aging: DepartmentAging) -> Self {
        Self {
            open_between_one_and_fifteen_days_tickets: aging.open.one_to_fifteen,
            open_between_sixteen_and_thirty_days_tickets: aging.open.sixteen_to_thirty,
            open_older_than_thirty_days_tickets: aging.open.over_thirty,
            hold_between_one_and_fifteen_days_tickets: aging.hold.one_to_fifteen,
            hold_between_sixteen_and_thirty_days_tickets: aging.hold.sixteen_to_thirty,
            hold_older_than_thirty_days_tickets: aging.hold.over_thirty,
            in_progress_between_one_and_fifteen_days_tickets: aging.in_progress.one_to_fifteen,
            in_progress_between_sixteen_and_thirty_days_tickets: aging
                .in_progress
                .sixteen_to_thirty,
            in_progress_older_than_thirty_days_tickets: aging.in_progress.over_thirty,
            escalated_between_one_and_fifteen_days_tickets: aging.escalated.one_to_fifteen,
            escalated_between_sixteen_and_thirty_days_tickets: aging.escalated.sixteen_to_thirty,
            escalated_older_than_thirty_days_tickets: aging.escalated.over_thirty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    pub department_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub tickets: TicketCounts,
    #[serde(default, deserialize_with = "deserialize_count_map")]
    pub department_ticket_counts: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "null_default")]
    pub department_aging_counts: BTreeMap<String, DepartmentAging>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub latest_unassigned_ticket_id: Option<String>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

impl AgentRecord {
    /// Normalized identity used when matching agents by name.
    pub fn name_key(&self) -> String {
        normalize_name(&self.name)
    }

    /// Name shown in department rosters; falls back through the optional
    /// profile fields before giving up.
    pub fn roster_name(&self) -> &str {
        [
            self.display_name.as_deref(),
            self.full_name.as_deref(),
            Some(self.name.as_str()),
            self.email.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.is_empty())
        .unwrap_or("Unknown")
    }

    pub fn in_department(&self, department_id: &str) -> bool {
        self.department_ids.iter().any(|id| id == department_id)
    }

    pub fn department_ticket_count(&self, department_id: &str) -> u64 {
        self.department_ticket_counts
            .get(department_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn aging_for(&self, department_id: &str) -> Option<&DepartmentAging> {
        self.department_aging_counts.get(department_id)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
}

/// A metrics or archived-ticket row. The backend owns the column set, so the
/// row is kept as an ordered map and rendered generically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

pub type MetricsRow = TableRow;
pub type ArchivedRow = TableRow;

impl TableRow {
    pub fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSnapshot {
    #[serde(default, deserialize_with = "null_default")]
    pub members: Vec<AgentRecord>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    pub unassigned_ticket_numbers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentList {
    #[serde(default, deserialize_with = "null_default")]
    pub departments: Vec<Department>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowsPayload {
    #[serde(default, deserialize_with = "null_default")]
    pub rows: Vec<TableRow>,
}

/// Coerce a wire value into a non-negative count. Missing, null, negative or
/// unparseable values count as zero.
/// Counts can arrive as huge floats, so sums clamp at `u64::MAX`.
pub fn saturating_sum<I: IntoIterator<Item = u64>>(values: I) -> u64 {
    values.into_iter().fold(0, u64::saturating_add)
}

pub fn count_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(float_count))
            .unwrap_or(0),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<u64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(float_count))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn float_count(value: f64) -> Option<u64> {
    if value.is_finite() && value > 0.0 {
        Some(value.trunc() as u64)
    } else {
        None
    }
}

fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    Ok(count_from_value(&val))
}

fn deserialize_count_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, count_from_value(&value)))
        .collect())
}

/// Ids arrive as strings or numbers depending on the backend version.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    match val {
        Value::Null => Ok(String::new()),
        other => id_from_value(other)
            .ok_or_else(|| serde::de::Error::custom("expected string or number for id")),
    }
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    Ok(id_from_value(val).filter(|id| !id.is_empty()))
}

fn deserialize_id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(id_from_value)
        .collect())
}
