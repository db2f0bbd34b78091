use eframe::egui::{self, Color32, RichText, Ui};

use crate::graph::{seminar_color, status_color};
use crate::people::{GroupCategory, Membership, PartialDate, PersonId};
use crate::temporal::{age_at, current_status_as_of, elapsed, has_started};
use crate::util::format_span;

use super::super::ViewModel;

fn period(start: &PartialDate, end: Option<&PartialDate>) -> String {
    match end {
        Some(end) => format!("{start} to {end}"),
        None => format!("since {start}"),
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let mut pending = None;
        match self.selected.as_slice() {
            [] => {
                ui.label("Click a person in the graph.");
                ui.label("Click a second person to see how the two are related.");
            }
            [only] => pending = self.draw_person(ui, *only),
            [newest, previous, ..] => {
                let (newest, previous) = (*newest, *previous);
                self.draw_relationship(ui, previous, newest);
                for id in [newest, previous] {
                    ui.separator();
                    let header = self
                        .engine
                        .graph()
                        .node(id)
                        .map_or_else(|| id.to_string(), |node| node.person.label());
                    egui::CollapsingHeader::new(header)
                        .id_salt(("person_details", id))
                        .default_open(false)
                        .show(ui, |ui| {
                            if let Some(next) = self.draw_person(ui, id) {
                                pending = Some(next);
                            }
                        });
                }
            }
        }

        if let Some(selection) = pending {
            self.selected = selection;
        }
    }

    /// Returns a new selection when one of the listed relatives was clicked.
    fn draw_person(&self, ui: &mut Ui, id: PersonId) -> Option<Vec<PersonId>> {
        let graph = self.engine.graph();
        let Some(node) = graph.node(id) else {
            ui.label("Selected person is not in the dataset.");
            return None;
        };
        let person = &node.person;
        let at = self.engine.cursor();

        ui.label(RichText::new(person.full_name()).strong());
        if let Some(nickname) = person.nickname.as_deref().filter(|name| !name.trim().is_empty())
        {
            ui.label(format!("Nickname: {nickname}"));
        }
        if let Some(maiden) = person.maiden_name.as_deref().filter(|name| !name.trim().is_empty())
        {
            ui.label(format!("Maiden name: {maiden}"));
        }
        ui.label(format!("Gender: {}", person.gender.label()));
        ui.label(format!("Born: {}", person.birth_date));
        if let Some(death) = &person.death_date {
            ui.label(format!("Died: {death}"));
        }
        let age = age_at(&person.birth_date, person.death_date.as_ref(), at);
        ui.label(format!("Age: {}", format_span(&age)));
        if !self.engine.view().contains_node(id) {
            ui.small("Hidden by the current filters.");
        }

        let seminars: Vec<&Membership> = person.seminar_memberships().collect();
        let schools: Vec<&Membership> = person
            .memberships
            .iter()
            .filter(|membership| membership.group_category.is_school())
            .collect();
        let other: Vec<&Membership> = person
            .memberships
            .iter()
            .filter(|membership| membership.group_category == GroupCategory::Other)
            .collect();

        for (title, memberships) in [
            ("Seminars", seminars),
            ("Schools", schools),
            ("Other groups", other),
        ] {
            if memberships.is_empty() {
                continue;
            }
            ui.add_space(6.0);
            ui.label(RichText::new(title).strong());
            for membership in memberships {
                let color = if membership.group_category == GroupCategory::Seminar {
                    seminar_color(&membership.group_name)
                } else {
                    Color32::from_gray(210)
                };
                let mut text = RichText::new(format!(
                    "{}: {}",
                    membership.group_name,
                    period(&membership.date_started, membership.date_ended.as_ref())
                ))
                .color(color);
                if !has_started(&membership.date_started, at) {
                    text = text.weak();
                }
                ui.label(text);
            }
        }

        let mut pending = None;
        let relatives: Vec<_> = graph
            .edges()
            .iter()
            .filter_map(|edge| {
                let other = edge.relationship.other_end(id)?;
                Some((other, edge))
            })
            .collect();
        if !relatives.is_empty() {
            ui.add_space(6.0);
            ui.label(RichText::new("Relationships").strong());
            for (other, edge) in relatives {
                let name = graph
                    .node(other)
                    .map_or_else(|| other.to_string(), |node| node.person.label());
                let current = current_status_as_of(&edge.relationship.statuses, at);
                let (summary, color) = match &current {
                    Some(current) if current.is_ended => (
                        format!("former {}", current.status.label()),
                        Color32::from_gray(150),
                    ),
                    Some(current) => (
                        current.status.label().to_owned(),
                        status_color(current.status),
                    ),
                    None => ("not yet".to_owned(), Color32::from_gray(120)),
                };
                ui.horizontal(|ui| {
                    if ui.link(name).clicked() {
                        pending = Some(vec![other, id]);
                    }
                    ui.label(RichText::new(summary).color(color));
                });
            }
        }

        pending
    }

    fn draw_relationship(&self, ui: &mut Ui, a: PersonId, b: PersonId) {
        let graph = self.engine.graph();
        let name = |id: PersonId| {
            graph
                .node(id)
                .map_or_else(|| id.to_string(), |node| node.person.label())
        };
        ui.label(RichText::new(format!("{} & {}", name(a), name(b))).strong());

        let Some(relationship) = graph.relationship_between(a, b) else {
            ui.label("These two people have no recorded relationship.");
            return;
        };
        if relationship.statuses.is_empty() {
            ui.label("No statuses recorded.");
            return;
        }

        let at = self.engine.cursor();
        let current = current_status_as_of(&relationship.statuses, at);
        for (index, status) in relationship.statuses.iter().enumerate() {
            let span = elapsed(status.date_end.as_ref(), Some(&status.date_start), at);
            let mut text = RichText::new(format!(
                "{}: {} ({})",
                status.status.label(),
                period(&status.date_start, status.date_end.as_ref()),
                format_span(&span)
            ))
            .color(status_color(status.status));

            if current.as_ref().is_some_and(|current| current.index == index) {
                text = text.strong();
            } else if !has_started(&status.date_start, at) {
                text = text.weak();
            }
            ui.label(text);
        }
    }
}
