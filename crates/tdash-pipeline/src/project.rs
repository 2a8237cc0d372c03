use crate::aggregate::DepartmentAgent;
use crate::filter::{compare_names, StatusProjection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tdash_core::{saturating_sum, AgentRecord, FilterSelection, SortOrder, StatusKey, TicketCounts};

/// Animation offset between consecutive cells of a page.
pub const STAGGER_STEP_MS: u64 = 65;

pub const EMPTY_TICKET_NUMBER: &str = "00000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBox {
    pub status: StatusKey,
    pub count: u64,
}

pub fn count_boxes(projection: &StatusProjection, counts: &TicketCounts) -> Vec<CountBox> {
    match projection {
        StatusProjection::Total => vec![CountBox {
            status: StatusKey::Total,
            count: counts.total(),
        }],
        StatusProjection::Columns(statuses) => statuses
            .iter()
            .map(|status| CountBox {
                status: *status,
                count: counts.get(*status),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayCell {
    pub candidate_name: String,
    pub status_counts: TicketCounts,
    pub total_count: u64,
    pub boxes: Vec<CountBox>,
    /// Index within the full candidate list.
    pub position: usize,
    pub stagger_ms: u64,
}

/// Non-zero candidates ordered by name. Ties keep dataset order.
pub fn sorted_candidates<'a>(agents: &[&'a AgentRecord], sort: SortOrder) -> Vec<&'a AgentRecord> {
    let mut rows: Vec<&AgentRecord> = agents
        .iter()
        .copied()
        .filter(|agent| !agent.tickets.is_zero())
        .collect();
    rows.sort_by(|a, b| match sort {
        SortOrder::Asc => a.name.cmp(&b.name),
        SortOrder::Desc => b.name.cmp(&a.name),
    });
    rows
}

pub fn project_cells(
    candidates: &[&AgentRecord],
    range: std::ops::Range<usize>,
    projection: &StatusProjection,
) -> Vec<DisplayCell> {
    let start = range.start;
    candidates
        .get(range)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(offset, agent)| DisplayCell {
            candidate_name: agent.name.clone(),
            status_counts: agent.tickets,
            total_count: agent.tickets.total(),
            boxes: count_boxes(projection, &agent.tickets),
            position: start + offset,
            stagger_ms: offset as u64 * STAGGER_STEP_MS,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legend {
    pub open: u64,
    pub hold: u64,
    pub in_progress: u64,
    pub escalated: u64,
    pub unassigned: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl Legend {
    /// The total appears only when "total" is selected. It sums the other
    /// selected statuses, or every status when "total" stands alone.
    pub fn from_sums(sums: &TicketCounts, selection: &FilterSelection) -> Self {
        let keys = selection.status_keys();
        let total = keys.contains(&StatusKey::Total).then(|| {
            let picked: Vec<StatusKey> = keys
                .iter()
                .copied()
                .filter(|key| *key != StatusKey::Total)
                .collect();
            if picked.is_empty() {
                sums.total()
            } else {
                saturating_sum(picked.iter().map(|key| sums.get(*key)))
            }
        });
        Self {
            open: sums.open,
            hold: sums.hold,
            in_progress: sums.in_progress,
            escalated: sums.escalated,
            unassigned: sums.unassigned,
            total,
        }
    }

    pub fn get(&self, status: StatusKey) -> Option<u64> {
        match status {
            StatusKey::Open => Some(self.open),
            StatusKey::Hold => Some(self.hold),
            StatusKey::InProgress => Some(self.in_progress),
            StatusKey::Escalated => Some(self.escalated),
            StatusKey::Unassigned => Some(self.unassigned),
            StatusKey::Total => self.total,
        }
    }

    pub fn formatted(&self, status: StatusKey) -> Option<String> {
        self.get(status).map(pad3)
    }
}

pub fn pad3(value: u64) -> String {
    format!("{value:03}")
}

pub fn pad5(value: &str) -> String {
    format!("{value:0>5}")
}

/// Ticket number shown by the carousel. With nothing to rotate through, the
/// last persisted number is shown instead.
pub fn carousel_ticket_number(numbers: &[String], index: usize, latest: Option<&str>) -> String {
    if numbers.is_empty() {
        return latest
            .filter(|value| !value.is_empty())
            .map(pad5)
            .unwrap_or_else(|| EMPTY_TICKET_NUMBER.to_string());
    }
    pad5(&numbers[index % numbers.len()])
}

pub fn unassigned_badge(unassigned_sum: u64, ticket_number: &str) -> String {
    if unassigned_sum > 0 {
        ticket_number.to_string()
    } else {
        EMPTY_TICKET_NUMBER.to_string()
    }
}

/// Number to persist as the latest unassigned ticket, if any are known.
pub fn latest_unassigned(numbers: &[String], index: usize) -> Option<String> {
    numbers.get(index).or_else(|| numbers.first()).cloned()
}

/// Flattened agent row kept in the cache alongside the raw snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub key: String,
    pub name: String,
    pub cells: BTreeMap<String, String>,
    pub department_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_unassigned_ticket_id: Option<String>,
}

const ROW_STATUSES: [StatusKey; 5] = [
    StatusKey::Open,
    StatusKey::Hold,
    StatusKey::Escalated,
    StatusKey::Unassigned,
    StatusKey::InProgress,
];

pub fn display_rows(agents: &[AgentRecord]) -> Vec<DisplayRow> {
    agents
        .iter()
        .map(|agent| {
            let prefix = if agent.department_ids.is_empty() {
                "no_department".to_string()
            } else {
                agent.department_ids.join(",")
            };
            DisplayRow {
                key: format!("{prefix}_{}", agent.id),
                name: agent.name.clone(),
                cells: ROW_STATUSES
                    .iter()
                    .map(|status| {
                        (
                            status.as_str().to_string(),
                            agent.tickets.get(*status).to_string(),
                        )
                    })
                    .collect(),
                department_ids: agent.department_ids.clone(),
                latest_unassigned_ticket_id: agent.latest_unassigned_ticket_id.clone(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelCard {
    pub name: String,
    pub boxes: Vec<CountBox>,
    pub total_tickets: u64,
    pub synthesized: bool,
}

/// One department of the carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentPanel {
    pub department_id: String,
    pub label: String,
    /// Every known agent of the department, synthesized entries included.
    pub roster: Vec<DepartmentAgent>,
    /// Cards actually shown: picked agents, else agents holding tickets here.
    pub cards: Vec<PanelCard>,
}

impl DepartmentPanel {
    /// `projection` should come from [`StatusProjection::for_panel`]. A
    /// total projection shows the department ticket count, not the sum of
    /// the bucket-derived status counts.
    pub fn build(
        department_id: &str,
        label: &str,
        roster: Vec<DepartmentAgent>,
        picked: &[String],
        projection: &StatusProjection,
    ) -> Self {
        let mut shown: Vec<&DepartmentAgent> = if picked.is_empty() {
            roster.iter().filter(|agent| agent.total_tickets > 0).collect()
        } else {
            roster
                .iter()
                .filter(|agent| picked.iter().any(|name| name == &agent.name))
                .collect()
        };
        shown.sort_by(|a, b| compare_names(&a.name, &b.name));

        let cards = shown
            .into_iter()
            .map(|agent| {
                let boxes = match projection {
                    StatusProjection::Total => vec![CountBox {
                        status: StatusKey::Total,
                        count: agent.total_tickets,
                    }],
                    columns => count_boxes(columns, &agent.counts),
                };
                PanelCard {
                    name: agent.name.clone(),
                    boxes,
                    total_tickets: agent.total_tickets,
                    synthesized: agent.synthesized,
                }
            })
            .collect();

        Self {
            department_id: department_id.to_string(),
            label: label.to_string(),
            roster,
            cards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(name: &str, open: u64, in_progress: u64) -> AgentRecord {
        AgentRecord {
            id: name.to_lowercase(),
            name: name.to_string(),
            tickets: TicketCounts {
                open,
                in_progress,
                ..TicketCounts::default()
            },
            ..AgentRecord::default()
        }
    }

    #[test]
    fn cells_are_staggered_within_the_page() {
        let agents: Vec<AgentRecord> = (0..20).map(|i| agent(&format!("A{i:02}"), 1, 0)).collect();
        let refs: Vec<&AgentRecord> = agents.iter().collect();
        let cells = project_cells(&refs, 15..20, &StatusProjection::Total);
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[0].position, 15);
        assert_eq!(cells[0].stagger_ms, 0);
        assert_eq!(cells[4].stagger_ms, 4 * STAGGER_STEP_MS);
        assert_eq!(cells[0].boxes[0].count, 1);
    }

    #[test]
    fn sorting_drops_idle_agents_and_respects_order() {
        let agents = vec![agent("bob", 1, 0), agent("Alice", 0, 2), agent("Zed", 0, 0)];
        let refs: Vec<&AgentRecord> = agents.iter().collect();
        let asc: Vec<&str> = sorted_candidates(&refs, SortOrder::Asc)
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(asc, vec!["Alice", "bob"]);
        let desc: Vec<&str> = sorted_candidates(&refs, SortOrder::Desc)
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(desc, vec!["bob", "Alice"]);
    }

    #[test]
    fn column_projection_emits_one_box_per_status() {
        let counts = TicketCounts {
            open: 2,
            hold: 1,
            in_progress: 3,
            ..TicketCounts::default()
        };
        let boxes = count_boxes(
            &StatusProjection::Columns(vec![StatusKey::InProgress, StatusKey::Open]),
            &counts,
        );
        assert_eq!(
            boxes,
            vec![
                CountBox {
                    status: StatusKey::InProgress,
                    count: 3
                },
                CountBox {
                    status: StatusKey::Open,
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn legend_total_follows_status_selection() {
        let sums = TicketCounts {
            open: 2,
            hold: 3,
            in_progress: 1,
            escalated: 4,
            unassigned: 5,
        };
        let mut selection = FilterSelection::default();
        assert_eq!(Legend::from_sums(&sums, &selection).total, None);

        selection.toggle_status(StatusKey::Total);
        assert_eq!(Legend::from_sums(&sums, &selection).total, Some(15));

        selection.toggle_status(StatusKey::Open);
        selection.toggle_status(StatusKey::Hold);
        let legend = Legend::from_sums(&sums, &selection);
        assert_eq!(legend.total, Some(5));
        assert_eq!(legend.formatted(StatusKey::Open).as_deref(), Some("002"));
        assert_eq!(legend.formatted(StatusKey::Total).as_deref(), Some("005"));
    }

    #[test]
    fn ticket_numbers_are_padded_and_fall_back() {
        let numbers = vec!["12".to_string(), "345".to_string()];
        assert_eq!(carousel_ticket_number(&numbers, 0, None), "00012");
        assert_eq!(carousel_ticket_number(&numbers, 3, None), "00345");
        assert_eq!(carousel_ticket_number(&[], 0, Some("77")), "00077");
        assert_eq!(carousel_ticket_number(&[], 0, None), "00000");
        assert_eq!(pad5("1234567"), "1234567");

        assert_eq!(unassigned_badge(0, "00012"), "00000");
        assert_eq!(unassigned_badge(2, "00012"), "00012");
        assert_eq!(latest_unassigned(&numbers, 1).as_deref(), Some("345"));
        assert_eq!(latest_unassigned(&numbers, 9).as_deref(), Some("12"));
        assert_eq!(latest_unassigned(&[], 0), None);
    }

    #[test]
    fn display_rows_key_by_departments() {
        let mut with_departments = agent("Alice", 2, 1);
        with_departments.department_ids = vec!["7".to_string(), "9".to_string()];
        let rows = display_rows(&[with_departments, agent("Bob", 0, 0)]);
        assert_eq!(rows[0].key, "7,9_alice");
        assert_eq!(rows[0].cells["open"], "2");
        assert_eq!(rows[0].cells["inProgress"], "1");
        assert_eq!(rows[1].key, "no_department_bob");
    }

    #[test]
    fn panel_shows_picked_agents_even_without_tickets() {
        let roster = vec![
            DepartmentAgent {
                id: Some("c".to_string()),
                name: "Carol".to_string(),
                counts: TicketCounts {
                    open: 3,
                    ..TicketCounts::default()
                },
                total_tickets: 3,
                synthesized: false,
            },
            DepartmentAgent {
                id: None,
                name: "Dave".to_string(),
                counts: TicketCounts::default(),
                total_tickets: 0,
                synthesized: true,
            },
        ];

        let default_view =
            DepartmentPanel::build("A", "Dept A", roster.clone(), &[], &StatusProjection::Total);
        assert_eq!(default_view.roster.len(), 2);
        assert_eq!(default_view.cards.len(), 1);
        assert_eq!(default_view.cards[0].boxes[0].count, 3);

        let picked = vec!["Dave".to_string(), "Carol".to_string()];
        let picked_view = DepartmentPanel::build(
            "A",
            "Dept A",
            roster,
            &picked,
            &StatusProjection::Columns(vec![StatusKey::Open]),
        );
        let names: Vec<&str> = picked_view.cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Carol", "Dave"]);
        assert!(picked_view.cards[1].synthesized);
        assert_eq!(picked_view.cards[1].boxes[0].count, 0);
    }
}
