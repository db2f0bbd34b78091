use std::collections::HashMap;
use std::f32::consts::TAU;

use chrono::NaiveDate;
use eframe::egui::Color32;

use crate::people::{Person, PersonId, Relationship, RelationshipId, RelationshipStatusType};
use crate::temporal::{self, CurrentStatus, TimeDelta};

use super::Graph;

pub const DEFAULT_NODE_COLOR: Color32 = Color32::from_rgb(0x66, 0x66, 0x66);
const ENDED_EDGE_WIDTH: f32 = 1.0;

pub fn status_color(status: RelationshipStatusType) -> Color32 {
    match status {
        RelationshipStatusType::BloodRelative => Color32::from_rgb(0x00, 0x80, 0x80),
        RelationshipStatusType::Sibling => Color32::from_rgb(0x00, 0x87, 0x00),
        RelationshipStatusType::ParentChild => Color32::from_rgb(0x80, 0x80, 0xff),
        RelationshipStatusType::Married => Color32::from_rgb(0xb7, 0x00, 0x00),
        RelationshipStatusType::Engaged => Color32::from_rgb(0xff, 0xc0, 0x00),
        RelationshipStatusType::Dating => Color32::from_rgb(0xff, 0xff, 0xff),
        RelationshipStatusType::Rumour => Color32::from_rgb(0xff, 0x00, 0xff),
    }
}

pub fn seminar_color(name: &str) -> Color32 {
    match name {
        "KSP" => Color32::from_rgb(0x81, 0x8f, 0x3d),
        "KMS" => Color32::from_rgb(0x4a, 0x6f, 0xd8),
        "FKS" => Color32::from_rgb(0xe3, 0x9f, 0x3c),
        "Suši" => Color32::from_rgb(0xcd, 0x3c, 0x37),
        _ => DEFAULT_NODE_COLOR,
    }
}

pub fn duration_to_line_width(days: i64) -> f32 {
    match days {
        i64::MIN..30 => 1.0,
        30..90 => 1.5,
        90..365 => 2.0,
        365..1095 => 2.5,
        1095..1825 => 3.0,
        _ => 3.5,
    }
}

pub fn age_to_radius(years: i64) -> f32 {
    match years {
        i64::MIN..6 => 5.0,
        6..15 => 6.0,
        15..18 => 7.0,
        18..21 => 8.0,
        21..25 => 9.0,
        25..30 => 10.0,
        _ => 11.0,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PieSlice {
    pub group: String,
    pub color: Color32,
    /// Radians, clockwise from the positive x axis.
    pub start_angle: f32,
    pub end_angle: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeDisplay {
    pub label: String,
    pub age: TimeDelta,
    pub radius: f32,
    pub pie: Vec<PieSlice>,
    pub is_highlighted: bool,
}

impl NodeDisplay {
    pub fn compute(person: &Person, at: NaiveDate) -> Self {
        let age = temporal::age_at(&person.birth_date, person.death_date.as_ref(), at);
        Self {
            label: person.label(),
            age,
            radius: age_to_radius(age.years),
            pie: seminar_pie(person, at),
            is_highlighted: false,
        }
    }
}

/// One slice per seminar, sized by the time spent in it as of `at`.
///
/// Memberships of the same seminar are summed. With no seminar time at all the pie is
/// empty and the node is drawn with a flat fill.
fn seminar_pie(person: &Person, at: NaiveDate) -> Vec<PieSlice> {
    let mut durations: Vec<(&str, i64)> = Vec::new();
    for membership in person.seminar_memberships() {
        let days = temporal::elapsed(
            membership.date_ended.as_ref(),
            Some(&membership.date_started),
            at,
        )
        .days;
        match durations
            .iter_mut()
            .find(|(group, _)| *group == membership.group_name)
        {
            Some((_, total)) => *total += days,
            None => durations.push((membership.group_name.as_str(), days)),
        }
    }

    let total: i64 = durations.iter().map(|(_, days)| days).sum();
    if total <= 0 {
        return Vec::new();
    }

    let mut angle = 0.0;
    durations
        .into_iter()
        .filter(|(_, days)| *days > 0)
        .map(|(group, days)| {
            let sweep = TAU * days as f32 / total as f32;
            let slice = PieSlice {
                group: group.to_owned(),
                color: seminar_color(group),
                start_angle: angle,
                end_angle: angle + sweep,
            };
            angle += sweep;
            slice
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeDisplay {
    pub current: CurrentStatus,
    pub color: Color32,
    pub width: f32,
    pub dashed: bool,
}

impl EdgeDisplay {
    /// `None` while no status has started yet. An ongoing edge grows with the whole
    /// relationship's length, not just its current status.
    pub fn compute(relationship: &Relationship, at: NaiveDate) -> Option<Self> {
        let current = temporal::current_status_as_of(&relationship.statuses, at)?;
        let (width, dashed) = if current.is_ended {
            (ENDED_EDGE_WIDTH, true)
        } else {
            let together = temporal::relationship_duration(&relationship.statuses, at);
            (duration_to_line_width(together.days), false)
        };

        Some(Self {
            current,
            color: status_color(current.status),
            width,
            dashed,
        })
    }
}

/// How every node and edge looks as of one cursor date.
#[derive(Clone, Debug, Default)]
pub struct DisplayProjection {
    nodes: HashMap<PersonId, NodeDisplay>,
    edges: HashMap<RelationshipId, EdgeDisplay>,
}

impl DisplayProjection {
    pub fn compute(graph: &Graph, at: NaiveDate) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| (node.id(), NodeDisplay::compute(&node.person, at)))
            .collect();
        let edges = graph
            .edges()
            .iter()
            .filter_map(|edge| {
                EdgeDisplay::compute(&edge.relationship, at).map(|display| (edge.id(), display))
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn node(&self, id: PersonId) -> Option<&NodeDisplay> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: RelationshipId) -> Option<&EdgeDisplay> {
        self.edges.get(&id)
    }

    pub fn radius(&self, id: PersonId) -> f32 {
        self.nodes
            .get(&id)
            .map_or(age_to_radius(0), |node| node.radius)
    }

    /// Replaces the highlighted set.
    pub fn set_highlighted(&mut self, ids: &[PersonId]) {
        for (id, node) in &mut self.nodes {
            node.is_highlighted = ids.contains(id);
        }
    }

    pub fn clear_highlight(&mut self) {
        self.set_highlighted(&[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::people::{Gender, GroupCategory, Membership, PartialDate, RelationshipStatus};

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    fn seminar(name: &str, start: NaiveDate, end: Option<NaiveDate>) -> Membership {
        Membership {
            group_name: name.to_owned(),
            group_category: GroupCategory::Seminar,
            date_started: start.into(),
            date_ended: end.map(PartialDate::from),
        }
    }

    fn person(memberships: Vec<Membership>) -> Person {
        Person {
            id: PersonId(1),
            first_name: "Ema".to_owned(),
            last_name: "Tichá".to_owned(),
            maiden_name: None,
            nickname: None,
            gender: Gender::Female,
            birth_date: day(2000, 1, 1).into(),
            death_date: None,
            memberships,
        }
    }

    #[test]
    fn pie_splits_by_seminar_time() {
        let person = person(vec![
            seminar("KSP", day(2015, 1, 1), Some(day(2017, 1, 1))),
            seminar("KMS", day(2017, 1, 1), None),
        ]);
        let display = NodeDisplay::compute(&person, day(2020, 1, 1));

        assert_eq!(display.age.years, 20);
        assert_eq!(display.radius, 8.0);
        assert_eq!(display.pie.len(), 2);

        let (ksp, kms) = (&display.pie[0], &display.pie[1]);
        assert_eq!(ksp.color, seminar_color("KSP"));
        assert_eq!(kms.color, seminar_color("KMS"));
        let sweep = |slice: &PieSlice| slice.end_angle - slice.start_angle;
        let ratio = sweep(ksp) / sweep(kms);
        assert!((ratio - 731.0 / 1095.0).abs() < 1e-4, "ratio {ratio}");
        assert!((kms.end_angle - TAU).abs() < 1e-4);
    }

    #[test]
    fn no_seminar_time_means_flat_fill() {
        let not_yet = person(vec![seminar("FKS", day(2030, 1, 1), None)]);
        assert!(NodeDisplay::compute(&not_yet, day(2020, 1, 1)).pie.is_empty());

        let mut schooled = person(vec![seminar("FKS", day(2010, 1, 1), None)]);
        schooled.memberships[0].group_category = GroupCategory::HighSchool;
        assert!(NodeDisplay::compute(&schooled, day(2020, 1, 1)).pie.is_empty());
    }

    #[test]
    fn step_tables_are_monotonic() {
        let widths: Vec<f32> = [0, 29, 30, 89, 90, 364, 365, 1094, 1095, 1824, 1825, 9000]
            .into_iter()
            .map(duration_to_line_width)
            .collect();
        assert!(widths.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(widths.first(), Some(&1.0));
        assert_eq!(widths.last(), Some(&3.5));

        assert_eq!(age_to_radius(0), 5.0);
        assert_eq!(age_to_radius(17), 7.0);
        assert_eq!(age_to_radius(80), 11.0);
    }

    #[test]
    fn ended_status_is_dashed_and_thin() {
        let relationship = Relationship {
            id: RelationshipId(3),
            source: PersonId(1),
            target: PersonId(2),
            statuses: vec![RelationshipStatus {
                status: RelationshipStatusType::Dating,
                date_start: day(2010, 1, 1).into(),
                date_end: Some(day(2015, 1, 1).into()),
            }],
        };

        let ongoing = EdgeDisplay::compute(&relationship, day(2014, 1, 1)).expect("started");
        assert!(!ongoing.dashed);
        assert_eq!(ongoing.width, 3.0);
        assert_eq!(ongoing.color, Color32::WHITE);

        let ended = EdgeDisplay::compute(&relationship, day(2016, 1, 1)).expect("started");
        assert!(ended.dashed);
        assert_eq!(ended.width, ENDED_EDGE_WIDTH);

        assert!(EdgeDisplay::compute(&relationship, day(2009, 1, 1)).is_none());
    }

    #[test]
    fn engagement_after_long_dating_keeps_a_thick_edge() {
        let relationship = Relationship {
            id: RelationshipId(4),
            source: PersonId(1),
            target: PersonId(2),
            statuses: vec![
                RelationshipStatus {
                    status: RelationshipStatusType::Engaged,
                    date_start: day(2015, 1, 1).into(),
                    date_end: None,
                },
                RelationshipStatus {
                    status: RelationshipStatusType::Dating,
                    date_start: day(2010, 1, 1).into(),
                    date_end: Some(day(2015, 1, 1).into()),
                },
            ],
        };

        let display = EdgeDisplay::compute(&relationship, day(2015, 2, 1)).expect("started");
        assert_eq!(display.current.status, RelationshipStatusType::Engaged);
        assert_eq!(display.current.elapsed.days, 31);
        assert!(!display.dashed);
        assert_eq!(display.width, 3.5);
    }

    #[test]
    fn every_status_has_a_colour() {
        for status in RelationshipStatusType::ALL {
            assert_ne!(status_color(*status), Color32::TRANSPARENT);
        }
    }
}
