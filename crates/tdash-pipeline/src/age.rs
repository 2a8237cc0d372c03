use crate::filter::compare_names;
use serde::{Deserialize, Serialize};
use tdash_core::{
    saturating_sum, AgeBucket, AgeBuckets, AgedStatus, AgentRecord, ArchivedRow, DepartmentAging,
    MetricsRow, SortOrder,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    pub one_to_fifteen: u64,
    pub sixteen_to_thirty: u64,
    pub over_thirty: u64,
}

impl BucketCounts {
    pub fn from_buckets(buckets: &AgeBuckets) -> Self {
        Self {
            one_to_fifteen: buckets.count(AgeBucket::OneToFifteen),
            sixteen_to_thirty: buckets.count(AgeBucket::SixteenToThirty),
            over_thirty: buckets.count(AgeBucket::OverThirty),
        }
    }

    pub fn get(&self, bucket: AgeBucket) -> u64 {
        match bucket {
            AgeBucket::OneToFifteen => self.one_to_fifteen,
            AgeBucket::SixteenToThirty => self.sixteen_to_thirty,
            AgeBucket::OverThirty => self.over_thirty,
        }
    }

    pub fn total(&self) -> u64 {
        saturating_sum([self.one_to_fifteen, self.sixteen_to_thirty, self.over_thirty])
    }

    fn add(&mut self, other: &BucketCounts) {
        self.one_to_fifteen = self.one_to_fifteen.saturating_add(other.one_to_fifteen);
        self.sixteen_to_thirty = self.sixteen_to_thirty.saturating_add(other.sixteen_to_thirty);
        self.over_thirty = self.over_thirty.saturating_add(other.over_thirty);
    }
}

/// Bucket counts for every aged status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgedCounts {
    pub open: BucketCounts,
    pub hold: BucketCounts,
    pub in_progress: BucketCounts,
    pub escalated: BucketCounts,
}

impl AgedCounts {
    pub fn from_aging(aging: &DepartmentAging) -> Self {
        Self {
            open: BucketCounts::from_buckets(&aging.open),
            hold: BucketCounts::from_buckets(&aging.hold),
            in_progress: BucketCounts::from_buckets(&aging.in_progress),
            escalated: BucketCounts::from_buckets(&aging.escalated),
        }
    }

    pub fn get(&self, status: AgedStatus) -> &BucketCounts {
        match status {
            AgedStatus::Open => &self.open,
            AgedStatus::Hold => &self.hold,
            AgedStatus::InProgress => &self.in_progress,
            AgedStatus::Escalated => &self.escalated,
        }
    }

    /// Tickets of every aged status falling in one bucket.
    pub fn bucket_total(&self, bucket: AgeBucket) -> u64 {
        saturating_sum(
            AgedStatus::ALL
                .iter()
                .map(|status| self.get(*status).get(bucket)),
        )
    }

    pub fn total(&self) -> u64 {
        saturating_sum(AgedStatus::ALL.iter().map(|status| self.get(*status).total()))
    }

    pub fn accumulate(&mut self, other: &AgedCounts) {
        self.open.add(&other.open);
        self.hold.add(&other.hold);
        self.in_progress.add(&other.in_progress);
        self.escalated.add(&other.escalated);
    }
}

/// Aged counts of an agent, either inside one department or summed across
/// every department the backend reported buckets for.
pub fn agent_aged_counts(agent: &AgentRecord, department_id: Option<&str>) -> AgedCounts {
    match department_id {
        Some(id) => agent
            .aging_for(id)
            .map(AgedCounts::from_aging)
            .unwrap_or_default(),
        None => agent
            .department_aging_counts
            .values()
            .fold(AgedCounts::default(), |mut sum, aging| {
                sum.accumulate(&AgedCounts::from_aging(aging));
                sum
            }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAgeRow {
    pub agent_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    pub counts: AgedCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummaryRow {
    pub department_id: String,
    pub department_name: String,
    pub agent_count: usize,
    pub counts: AgedCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRow {
    pub agent_name: String,
    pub hold: u64,
    pub in_progress: u64,
    pub escalated: u64,
}

impl PendingRow {
    pub fn total(&self) -> u64 {
        saturating_sum([self.hold, self.in_progress, self.escalated])
    }
}

fn sort_rows<T>(rows: &mut [T], sort: SortOrder, name: impl Fn(&T) -> &str) {
    rows.sort_by(|a, b| {
        let ordering = compare_names(name(a), name(b));
        match sort {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// One row per agent with any aged ticket.
pub fn agent_age_rows(
    agents: &[&AgentRecord],
    department_id: Option<&str>,
    sort: SortOrder,
) -> Vec<AgentAgeRow> {
    let mut rows: Vec<AgentAgeRow> = agents
        .iter()
        .map(|agent| AgentAgeRow {
            agent_name: agent.name.trim().to_string(),
            department_id: department_id.map(str::to_string),
            counts: agent_aged_counts(agent, department_id),
        })
        .filter(|row| row.counts.total() > 0)
        .collect();
    sort_rows(&mut rows, sort, |row| &row.agent_name);
    rows
}

/// Per-department, per-agent rows for the department table.
pub fn department_rows(
    agents: &[AgentRecord],
    department_ids: &[String],
    sort: SortOrder,
) -> Vec<AgentAgeRow> {
    department_ids
        .iter()
        .flat_map(|department_id| {
            let members: Vec<&AgentRecord> = agents
                .iter()
                .filter(|agent| agent.in_department(department_id))
                .collect();
            agent_age_rows(&members, Some(department_id.as_str()), sort)
        })
        .collect()
}

/// Bucket sums per department, over every agent of that department.
pub fn department_summary_rows(
    agents: &[AgentRecord],
    departments: &[(String, String)],
) -> Vec<DepartmentSummaryRow> {
    departments
        .iter()
        .map(|(id, name)| {
            let mut counts = AgedCounts::default();
            let mut agent_count = 0;
            for agent in agents.iter().filter(|agent| agent.in_department(id)) {
                let aged = agent_aged_counts(agent, Some(id.as_str()));
                if aged.total() > 0 {
                    agent_count += 1;
                }
                counts.accumulate(&aged);
            }
            DepartmentSummaryRow {
                department_id: id.clone(),
                department_name: name.clone(),
                agent_count,
                counts,
            }
        })
        .collect()
}

pub fn pending_rows(agents: &[&AgentRecord], sort: SortOrder) -> Vec<PendingRow> {
    let mut rows: Vec<PendingRow> = agents
        .iter()
        .map(|agent| PendingRow {
            agent_name: agent.name.trim().to_string(),
            hold: agent.tickets.hold,
            in_progress: agent.tickets.in_progress,
            escalated: agent.tickets.escalated,
        })
        .filter(|row| row.total() > 0)
        .collect();
    sort_rows(&mut rows, sort, |row| &row.agent_name);
    rows
}

/// Tables enabled by the age-view toggles. A `None` section is switched off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgeTables {
    pub agent_buckets: Vec<AgeBucket>,
    pub agents: Option<Vec<AgentAgeRow>>,
    pub departments: Option<Vec<DepartmentSummaryRow>>,
    pub pending: Option<Vec<PendingRow>>,
    pub metrics: Option<Vec<MetricsRow>>,
    pub archived: Option<Vec<ArchivedRow>>,
}

impl AgeTables {
    pub fn is_empty(&self) -> bool {
        self.agents.is_none()
            && self.departments.is_none()
            && self.pending.is_none()
            && self.metrics.is_none()
            && self.archived.is_none()
    }
}
