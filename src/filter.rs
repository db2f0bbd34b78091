//! Which people and relationships are visible for a cursor date and a set of toggles.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::FilterError;
use crate::graph::Graph;
use crate::people::{PersonId, RelationshipCategory, RelationshipId, RelationshipStatusType};
use crate::temporal::{self, has_started};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusPhase {
    Current,
    Past,
}

impl StatusPhase {
    pub const ALL: [Self; 2] = [Self::Current, Self::Past];

    fn of(is_ended: bool) -> Self {
        if is_ended { Self::Past } else { Self::Current }
    }
}

fn status_slug(status: RelationshipStatusType) -> &'static str {
    match status {
        RelationshipStatusType::BloodRelative => "bloodRelative",
        RelationshipStatusType::Sibling => "sibling",
        RelationshipStatusType::ParentChild => "parentChild",
        RelationshipStatusType::Married => "married",
        RelationshipStatusType::Engaged => "engaged",
        RelationshipStatusType::Dating => "dating",
        RelationshipStatusType::Rumour => "rumour",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKey {
    /// Members of one seminar.
    Seminar(String),
    /// People with no seminar membership.
    NonMember,
    /// People left without any visible relationship.
    Isolated,
    Relationship {
        category: RelationshipCategory,
        phase: StatusPhase,
    },
    /// Finer toggle for one status type; must agree with its category toggle.
    Status {
        status: RelationshipStatusType,
        phase: StatusPhase,
    },
}

impl FilterKey {
    pub fn name(&self) -> String {
        match self {
            Self::Seminar(name) => format!("seminar:{name}"),
            Self::NonMember => "notSeminar".to_owned(),
            Self::Isolated => "isolated".to_owned(),
            Self::Relationship { category, phase } => {
                let phase = match phase {
                    StatusPhase::Current => "Current",
                    StatusPhase::Past => "Old",
                };
                let category = match category {
                    RelationshipCategory::Serious => "Serious",
                    RelationshipCategory::Rumour => "Rumour",
                    RelationshipCategory::BloodBound => "BloodBound",
                };
                format!("is{phase}{category}")
            }
            Self::Status { status, phase } => {
                let phase = match phase {
                    StatusPhase::Current => "current",
                    StatusPhase::Past => "old",
                };
                format!("status:{}:{phase}", status_slug(*status))
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Seminar(name) => name.clone(),
            Self::NonMember => "Not in a seminar".to_owned(),
            Self::Isolated => "Without relationships".to_owned(),
            Self::Relationship { category, phase } => {
                let phase = match phase {
                    StatusPhase::Current => "Current",
                    StatusPhase::Past => "Old",
                };
                format!("{phase} {}", category.label())
            }
            Self::Status { status, phase } => match phase {
                StatusPhase::Current => format!("{} (current)", status.label()),
                StatusPhase::Past => format!("{} (past)", status.label()),
            },
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        if let Some(seminar) = name.strip_prefix("seminar:") {
            return Some(Self::Seminar(seminar.to_owned()));
        }
        match name {
            "notSeminar" => Some(Self::NonMember),
            "isolated" => Some(Self::Isolated),
            _ => Self::relationship_keys()
                .chain(Self::status_keys())
                .find(|key| key.name() == name),
        }
    }

    fn relationship_keys() -> impl Iterator<Item = Self> {
        RelationshipCategory::ALL.into_iter().flat_map(|category| {
            StatusPhase::ALL
                .into_iter()
                .map(move |phase| Self::Relationship { category, phase })
        })
    }

    fn status_keys() -> impl Iterator<Item = Self> {
        RelationshipStatusType::ALL.iter().flat_map(|status| {
            StatusPhase::ALL.into_iter().map(move |phase| Self::Status {
                status: *status,
                phase,
            })
        })
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, Self::Relationship { .. })
    }

    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub key: FilterKey,
    pub label: String,
    pub enabled: bool,
}

/// The visible subset, in graph order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphView {
    pub nodes: Vec<PersonId>,
    pub edges: Vec<RelationshipId>,
}

impl GraphView {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, id: PersonId) -> bool {
        self.nodes.contains(&id)
    }
}

pub struct FilterEngine {
    cursor: NaiveDate,
    filters: Vec<Filter>,
}

impl FilterEngine {
    /// One toggle per seminar in `graph`, then the fixed ones; all start enabled.
    pub fn new(graph: &Graph, cursor: NaiveDate) -> Self {
        let keys = graph
            .seminars()
            .iter()
            .cloned()
            .map(FilterKey::Seminar)
            .chain([FilterKey::NonMember, FilterKey::Isolated])
            .chain(FilterKey::relationship_keys())
            .chain(FilterKey::status_keys());

        Self {
            cursor,
            filters: keys
                .map(|key| Filter {
                    label: key.label(),
                    key,
                    enabled: true,
                })
                .collect(),
        }
    }

    pub fn cursor(&self) -> NaiveDate {
        self.cursor
    }

    pub fn set_time(&mut self, cursor: NaiveDate) -> bool {
        let changed = self.cursor != cursor;
        self.cursor = cursor;
        changed
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_enabled(&self, key: &FilterKey) -> bool {
        self.filters
            .iter()
            .any(|filter| filter.key == *key && filter.enabled)
    }

    /// Returns whether the toggle changed.
    pub fn set_filter(&mut self, key: &FilterKey, enabled: bool) -> Result<bool, FilterError> {
        let filter = self
            .filters
            .iter_mut()
            .find(|filter| filter.key == *key)
            .ok_or_else(|| FilterError::UnknownFilter(key.name()))?;
        let changed = filter.enabled != enabled;
        filter.enabled = enabled;
        Ok(changed)
    }

    pub fn set_filter_by_name(&mut self, name: &str, enabled: bool) -> Result<bool, FilterError> {
        let key = FilterKey::parse(name).ok_or_else(|| FilterError::UnknownFilter(name.to_owned()))?;
        self.set_filter(&key, enabled)
    }

    pub fn apply(&self, graph: &Graph) -> GraphView {
        let at = self.cursor;
        let enabled_seminars: Vec<&str> = self
            .filters
            .iter()
            .filter_map(|filter| match &filter.key {
                FilterKey::Seminar(name) if filter.enabled => Some(name.as_str()),
                _ => None,
            })
            .collect();
        let non_members = self.is_enabled(&FilterKey::NonMember);

        let passes: Vec<bool> = graph
            .nodes()
            .iter()
            .map(|node| {
                let person = &node.person;
                if !has_started(&person.birth_date, at) {
                    return false;
                }
                let mut seminars = person
                    .seminar_memberships()
                    .filter(|membership| has_started(&membership.date_started, at))
                    .peekable();
                if seminars.peek().is_none() {
                    non_members
                } else {
                    seminars.any(|membership| enabled_seminars.contains(&membership.group_name.as_str()))
                }
            })
            .collect();

        let mut degree = vec![0usize; passes.len()];
        let mut edges = Vec::new();
        for edge in graph.edges() {
            if !(passes[edge.source_index] && passes[edge.target_index]) {
                continue;
            }
            let Some(current) = temporal::current_status_as_of(&edge.relationship.statuses, at)
            else {
                continue;
            };
            let phase = StatusPhase::of(current.is_ended);
            let category = FilterKey::Relationship {
                category: current.status.category(),
                phase,
            };
            let status = FilterKey::Status {
                status: current.status,
                phase,
            };
            if self.is_enabled(&category) && self.is_enabled(&status) {
                degree[edge.source_index] += 1;
                degree[edge.target_index] += 1;
                edges.push(edge.id());
            }
        }

        let keep_isolated = self.is_enabled(&FilterKey::Isolated);
        let nodes: Vec<PersonId> = graph
            .nodes()
            .iter()
            .enumerate()
            .filter(|(index, _)| passes[*index] && (keep_isolated || degree[*index] > 0))
            .map(|(_, node)| node.id())
            .collect();

        debug!(%at, nodes = nodes.len(), edges = edges.len(), "filter pass");
        GraphView { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;
    use crate::graph::tests::sample_graph;
    use crate::people::parse_dataset;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    fn dating_couple() -> Graph {
        let dataset = parse_dataset(
            r#"[
                {"id": 1, "firstName": "Ivan", "lastName": "Lipa", "gender": 1, "birthDate": "1999-02-03"},
                {"id": 2, "firstName": "Nina", "lastName": "Dubová", "gender": 2, "birthDate": "2000-10-11"}
            ]"#,
            r#"[{"id": 7, "source": 1, "target": 2,
                 "statuses": [{"status": 6, "dateStart": "2021-01-01"}]}]"#,
        )
        .expect("dataset");
        Graph::build(dataset).expect("graph")
    }

    #[test]
    fn current_serious_toggle_controls_ongoing_dating() {
        let graph = dating_couple();
        let mut filter = FilterEngine::new(&graph, day(2022, 6, 1));

        filter
            .set_filter_by_name("isCurrentSerious", false)
            .expect("known filter");
        filter.set_filter_by_name("isOldSerious", true).expect("known filter");
        assert!(filter.apply(&graph).edges.is_empty());

        filter
            .set_filter_by_name("isCurrentSerious", true)
            .expect("known filter");
        assert_eq!(filter.apply(&graph).edges, [RelationshipId(7)]);
    }

    #[test]
    fn status_toggle_narrows_its_category() {
        let graph = dating_couple();
        let mut filter = FilterEngine::new(&graph, day(2022, 6, 1));

        filter
            .set_filter_by_name("status:married:current", false)
            .expect("known filter");
        assert_eq!(filter.apply(&graph).edges, [RelationshipId(7)]);

        filter
            .set_filter_by_name("status:dating:old", false)
            .expect("known filter");
        assert_eq!(filter.apply(&graph).edges, [RelationshipId(7)]);

        filter
            .set_filter_by_name("status:dating:current", false)
            .expect("known filter");
        assert!(filter.apply(&graph).edges.is_empty());

        filter
            .set_filter_by_name("status:dating:current", true)
            .expect("known filter");
        filter
            .set_filter_by_name("isCurrentSerious", false)
            .expect("known filter");
        assert!(filter.apply(&graph).edges.is_empty(), "category still applies");
    }

    #[test]
    fn isolated_toggle_drops_people_without_edges() {
        let graph = dating_couple();
        let mut filter = FilterEngine::new(&graph, day(2020, 6, 1));
        assert_eq!(filter.apply(&graph).nodes, [PersonId(1), PersonId(2)]);

        filter
            .set_filter(&FilterKey::Isolated, false)
            .expect("known filter");
        assert!(filter.apply(&graph).is_empty(), "relationship has not started yet");

        filter.set_time(day(2021, 1, 1));
        assert_eq!(filter.apply(&graph).nodes.len(), 2);
    }

    #[test]
    fn unborn_people_are_hidden() {
        let graph = dating_couple();
        let filter = FilterEngine::new(&graph, day(2000, 1, 1));
        assert_eq!(filter.apply(&graph).nodes, [PersonId(1)]);
    }

    #[test]
    fn seminar_toggles_use_or_semantics() {
        let graph = sample_graph();
        let mut filter = FilterEngine::new(&graph, day(2016, 1, 1));
        for seminar in ["KSP", "FKS", "Suši"] {
            filter
                .set_filter(&FilterKey::Seminar(seminar.to_owned()), false)
                .expect("known seminar");
        }
        filter.set_filter(&FilterKey::NonMember, false).expect("known filter");

        // Only KMS remains: Zuzana, and Ťomi who is also in KSP.
        assert_eq!(filter.apply(&graph).nodes, [PersonId(2), PersonId(7)]);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let graph = dating_couple();
        let mut filter = FilterEngine::new(&graph, day(2022, 1, 1));
        assert_eq!(
            filter.set_filter_by_name("isCurrentGossip", false),
            Err(FilterError::UnknownFilter("isCurrentGossip".to_owned()))
        );
        assert!(filter.set_filter_by_name("seminar:KSP", false).is_err());
    }

    #[test]
    fn names_round_trip_through_parse() {
        let graph = sample_graph();
        let filter = FilterEngine::new(&graph, day(2022, 1, 1));
        assert_eq!(filter.filters().len(), 4 + 2 + 6 + 14);
        for item in filter.filters() {
            assert_eq!(FilterKey::parse(&item.key.name()).as_ref(), Some(&item.key));
        }
    }

    fn toggles() -> impl Strategy<Value = Vec<bool>> {
        proptest::collection::vec(any::<bool>(), 26)
    }

    fn cursor() -> impl Strategy<Value = NaiveDate> {
        (1990i32..2025, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| day(y, m, d))
    }

    fn configured(graph: &Graph, at: NaiveDate, toggles: &[bool]) -> FilterEngine {
        let mut filter = FilterEngine::new(graph, at);
        let keys: Vec<FilterKey> = filter.filters().iter().map(|item| item.key.clone()).collect();
        for (key, enabled) in keys.iter().zip(toggles) {
            filter.set_filter(key, *enabled).expect("known filter");
        }
        filter
    }

    proptest! {
        #[test]
        fn every_edge_has_both_endpoints(at in cursor(), toggles in toggles()) {
            let graph = sample_graph();
            let view = configured(&graph, at, &toggles).apply(&graph);
            let nodes: HashSet<PersonId> = view.nodes.iter().copied().collect();
            for id in &view.edges {
                let edge = graph.edge(*id).expect("edge from graph");
                prop_assert!(nodes.contains(&edge.source()));
                prop_assert!(nodes.contains(&edge.target()));
            }
        }

        #[test]
        fn repeated_toggle_is_idempotent(
            at in cursor(),
            toggles in toggles(),
            index in 0usize..26,
            enabled in any::<bool>(),
        ) {
            let graph = sample_graph();
            let mut filter = configured(&graph, at, &toggles);
            let key = filter.filters()[index].key.clone();

            filter.set_filter(&key, enabled).expect("known filter");
            let once = filter.apply(&graph);
            let changed = filter.set_filter(&key, enabled).expect("known filter");
            prop_assert!(!changed);
            prop_assert_eq!(once, filter.apply(&graph));
        }

        #[test]
        fn same_inputs_give_same_view(at in cursor(), toggles in toggles()) {
            let graph = sample_graph();
            let first = configured(&graph, at, &toggles).apply(&graph);
            let mut reused = configured(&graph, day(2024, 1, 1), &[]);
            reused.apply(&graph);
            reused.set_time(at);
            let keys: Vec<FilterKey> = reused.filters().iter().map(|item| item.key.clone()).collect();
            for (key, enabled) in keys.iter().zip(&toggles) {
                reused.set_filter(key, *enabled).expect("known filter");
            }
            prop_assert_eq!(first, reused.apply(&graph));
        }
    }
}
