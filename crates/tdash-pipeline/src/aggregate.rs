use crate::filter::compare_names;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tdash_core::{normalize_name, AgedStatus, AgentRecord, Department, TicketCounts};

/// Per-status sums over every agent. Filters never apply here, so the legend
/// always matches the backend totals.
pub fn global_sums<'a, I>(agents: I) -> TicketCounts
where
    I: IntoIterator<Item = &'a AgentRecord>,
{
    agents
        .into_iter()
        .fold(TicketCounts::default(), |mut sums, agent| {
            sums.accumulate(&agent.tickets);
            sums
        })
}

/// Counts of one agent inside one department, derived from the age buckets.
/// Unassigned is not bucketed and comes from the agent-wide summary.
pub fn department_status_counts(agent: &AgentRecord, department_id: &str) -> TicketCounts {
    let mut counts = TicketCounts {
        unassigned: agent.tickets.unassigned,
        ..TicketCounts::default()
    };
    if let Some(aging) = agent.aging_for(department_id) {
        counts.open = aging.status_total(AgedStatus::Open);
        counts.hold = aging.status_total(AgedStatus::Hold);
        counts.in_progress = aging.status_total(AgedStatus::InProgress);
        counts.escalated = aging.status_total(AgedStatus::Escalated);
    }
    counts
}

/// Roster names of agents holding at least one ticket in the department.
pub fn department_roster(agents: &[AgentRecord], department_id: &str) -> Vec<String> {
    let mut names: Vec<String> = agents
        .iter()
        .filter(|agent| {
            agent.in_department(department_id) && agent.department_ticket_count(department_id) > 0
        })
        .map(|agent| agent.roster_name().to_string())
        .collect();
    names.sort_by(|a, b| compare_names(a, b));
    names
}

pub fn roster_map(
    departments: &[Department],
    agents: &[AgentRecord],
) -> BTreeMap<String, Vec<String>> {
    departments
        .iter()
        .map(|department| {
            (
                department.id.clone(),
                department_roster(agents, &department.id),
            )
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentAgent {
    pub id: Option<String>,
    pub name: String,
    pub counts: TicketCounts,
    /// Tickets held in this department as reported by the backend.
    pub total_tickets: u64,
    /// True for roster names with no matching agent record.
    pub synthesized: bool,
}

impl DepartmentAgent {
    fn placeholder(name: &str) -> Self {
        Self {
            id: None,
            name: name.trim().to_string(),
            counts: TicketCounts::default(),
            total_tickets: 0,
            synthesized: true,
        }
    }
}

/// Every agent of a department, unique by normalized record name, followed
/// by zero-count entries for roster names matching no record name. A roster
/// entry built from a display name that differs from the record name gets
/// its own zero entry.
pub fn department_agents(
    agents: &[AgentRecord],
    department_id: &str,
    roster: &[String],
) -> Vec<DepartmentAgent> {
    let mut entries: Vec<DepartmentAgent> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut known: HashSet<String> = HashSet::new();

    for agent in agents.iter().filter(|agent| agent.in_department(department_id)) {
        let entry = DepartmentAgent {
            id: Some(agent.id.clone()).filter(|id| !id.is_empty()),
            name: agent.name.trim().to_string(),
            counts: department_status_counts(agent, department_id),
            total_tickets: agent.department_ticket_count(department_id),
            synthesized: false,
        };
        let key = agent.name_key();
        known.insert(key.clone());
        match slots.get(&key) {
            Some(&slot) => entries[slot] = entry,
            None => {
                slots.insert(key, entries.len());
                entries.push(entry);
            }
        }
    }

    for name in roster {
        let key = normalize_name(name);
        if known.insert(key) {
            entries.push(DepartmentAgent::placeholder(name));
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdash_core::{AgeBuckets, DepartmentAging};

    fn ids(n: usize, prefix: &str) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    fn agent_in(name: &str, department: &str, open: usize, hold: usize) -> AgentRecord {
        let mut agent = AgentRecord {
            id: format!("id-{}", name.to_lowercase()),
            name: name.to_string(),
            department_ids: vec![department.to_string()],
            ..AgentRecord::default()
        };
        agent.tickets.open = open as u64;
        agent.tickets.hold = hold as u64;
        agent
            .department_ticket_counts
            .insert(department.to_string(), (open + hold) as u64);
        agent.department_aging_counts.insert(
            department.to_string(),
            DepartmentAging {
                open: AgeBuckets {
                    one_to_fifteen: ids(open, "o"),
                    ..AgeBuckets::default()
                },
                hold: AgeBuckets {
                    over_thirty: ids(hold, "h"),
                    ..AgeBuckets::default()
                },
                ..DepartmentAging::default()
            },
        );
        agent
    }

    #[test]
    fn global_sums_cover_every_status() {
        let mut a = agent_in("A", "1", 2, 1);
        a.tickets.unassigned = 4;
        let b = agent_in("B", "2", 3, 0);
        let sums = global_sums(&[a, b]);
        assert_eq!(sums.open, 5);
        assert_eq!(sums.hold, 1);
        assert_eq!(sums.unassigned, 4);
        assert_eq!(sums.total(), 10);
    }

    #[test]
    fn department_counts_come_from_buckets() {
        let mut agent = agent_in("Erin", "7", 2, 3);
        agent.tickets.unassigned = 1;
        agent.tickets.open = 99;
        let counts = department_status_counts(&agent, "7");
        assert_eq!(counts.open, 2);
        assert_eq!(counts.hold, 3);
        assert_eq!(counts.unassigned, 1);

        let elsewhere = department_status_counts(&agent, "8");
        assert_eq!(elsewhere.open, 0);
        assert_eq!(elsewhere.unassigned, 1);
    }

    #[test]
    fn roster_lists_only_agents_with_department_tickets() {
        let agents = vec![
            agent_in("bob", "1", 1, 0),
            agent_in("Alice", "1", 0, 2),
            agent_in("Idle", "1", 0, 0),
            agent_in("Other", "2", 5, 0),
        ];
        assert_eq!(
            department_roster(&agents, "1"),
            vec!["Alice".to_string(), "bob".to_string()]
        );

        let departments = vec![
            Department {
                id: "1".to_string(),
                name: "One".to_string(),
            },
            Department {
                id: "3".to_string(),
                name: "Three".to_string(),
            },
        ];
        let map = roster_map(&departments, &agents);
        assert_eq!(map["1"].len(), 2);
        assert!(map["3"].is_empty());
    }

    #[test]
    fn missing_roster_names_are_synthesized() {
        let agents = vec![agent_in("Carol", "A", 3, 0)];
        let roster = vec!["Carol".to_string(), "Dave".to_string()];
        let entries = department_agents(&agents, "A", &roster);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Carol");
        assert_eq!(entries[0].counts.open, 3);
        assert!(!entries[0].synthesized);
        assert_eq!(entries[1].name, "Dave");
        assert!(entries[1].synthesized);
        assert!(entries[1].counts.is_zero());
        assert_eq!(entries[1].id, None);
    }

    #[test]
    fn duplicate_names_keep_the_last_record() {
        let first = agent_in("Carol", "A", 1, 0);
        let second = agent_in(" carol ", "A", 4, 0);
        let entries = department_agents(&[first, second], "A", &[]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].counts.open, 4);
    }

    #[test]
    fn roster_display_names_get_their_own_entry() {
        let mut agent = agent_in("carol", "A", 2, 0);
        agent.display_name = Some("Carol Jones".to_string());
        let roster = department_roster(std::slice::from_ref(&agent), "A");
        assert_eq!(roster, vec!["Carol Jones".to_string()]);

        let entries = department_agents(&[agent], "A", &roster);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "carol");
        assert_eq!(entries[0].total_tickets, 2);
        assert!(!entries[0].synthesized);
        assert_eq!(entries[1].name, "Carol Jones");
        assert!(entries[1].synthesized);
    }
}
