use std::ops::RangeInclusive;
use std::time::Instant;

use eframe::egui::{self, RichText, Ui};
use tracing::warn;

use crate::config::{PhysicsConfig, save_to_path};
use crate::filter::{Filter, FilterKey, StatusPhase};
use crate::util::format_date;

use super::super::ViewModel;

fn physics_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    ui.add(
        egui::Slider::new(value, range)
            .text(text)
            .clamping(egui::SliderClamping::Always),
    )
    .on_hover_text(hover)
    .changed()
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Controls");
        ui.add_space(6.0);

        self.draw_search(ui);
        ui.separator();
        self.draw_timeline(ui);
        ui.separator();
        self.draw_filters(ui);
        ui.separator();
        self.draw_physics(ui);
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Search").strong());
        let mut submitted = false;
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("name, nickname, maiden name"),
            );
            if response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter)) {
                submitted = true;
            }
            if ui.button("Find").clicked() {
                submitted = true;
            }
        });
        if submitted {
            self.run_search();
        }
        if let Some(feedback) = &self.search_feedback {
            ui.small(feedback.as_str());
        }
    }

    fn run_search(&mut self) {
        let query = self.search.trim();
        if query.is_empty() {
            self.search_feedback = None;
            return;
        }

        let hits = self.engine.search(query);
        self.search_feedback = Some(match hits.as_slice() {
            [] => "Nobody visible matches.".to_owned(),
            [only] => {
                self.engine.focus_on_node(*only);
                self.selected = vec![*only];
                "1 match".to_owned()
            }
            _ => format!("{} matches", hits.len()),
        });
        if !hits.is_empty() {
            self.engine.pulse_search_results(hits, Instant::now());
        }
    }

    fn draw_timeline(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Timeline").strong());
        ui.label(format!("Showing {}", format_date(self.engine.cursor())));

        let last = self.event_dates.len().saturating_sub(1);
        let mut index = self.time_index.min(last);
        ui.add(
            egui::Slider::new(&mut index, 0..=last)
                .show_value(false)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text("Snaps to the dates on which some relationship changed.");

        let mut jump_to_today = false;
        ui.horizontal(|ui| {
            if ui
                .add_enabled(index > 0, egui::Button::new("Previous"))
                .clicked()
            {
                index -= 1;
            }
            if ui
                .add_enabled(index < last, egui::Button::new("Next"))
                .clicked()
            {
                index += 1;
            }
            if ui.button("Today").clicked() {
                index = last;
                jump_to_today = true;
            }
        });

        if jump_to_today || index != self.time_index {
            self.set_time_index(index);
        }
    }

    fn draw_filters(&mut self, ui: &mut Ui) {
        let filters: Vec<Filter> = self.engine.filters().to_vec();
        let (statuses, rest): (Vec<&Filter>, Vec<&Filter>) =
            filters.iter().partition(|filter| filter.key.is_status());
        let (relationship, people): (Vec<&Filter>, Vec<&Filter>) = rest
            .into_iter()
            .partition(|filter| filter.key.is_relationship());

        ui.label(RichText::new("People").strong());
        for filter in people {
            self.draw_filter_toggle(ui, filter, filter.label.as_str());
        }

        ui.add_space(6.0);
        ui.label(RichText::new("Relationships").strong());
        for filter in relationship {
            self.draw_filter_toggle(ui, filter, filter.label.as_str());
        }

        egui::CollapsingHeader::new("By status")
            .default_open(false)
            .show(ui, |ui| {
                egui::Grid::new("status_filters")
                    .striped(true)
                    .show(ui, |ui| {
                        ui.label("");
                        ui.label("Current");
                        ui.label("Past");
                        ui.end_row();

                        for filter in &statuses {
                            let FilterKey::Status { status, phase } = filter.key else {
                                continue;
                            };
                            if phase == StatusPhase::Current {
                                ui.label(status.label());
                            }
                            self.draw_filter_toggle(ui, filter, "");
                            if phase == StatusPhase::Past {
                                ui.end_row();
                            }
                        }
                    });
            });
    }

    fn draw_filter_toggle(&mut self, ui: &mut Ui, filter: &Filter, text: &str) {
        let mut enabled = filter.enabled;
        let hover = match &filter.key {
            FilterKey::Isolated => "People without any visible relationship.",
            FilterKey::NonMember => "People who never attended a seminar.",
            FilterKey::Status { .. } => filter.label.as_str(),
            _ => "",
        };
        let response = ui.checkbox(&mut enabled, text);
        let response = if hover.is_empty() {
            response
        } else {
            response.on_hover_text(hover)
        };
        if response.changed()
            && let Err(error) = self.engine.set_filter(&filter.key, enabled)
        {
            warn!(%error, "filter toggle rejected");
        }
    }

    fn draw_physics(&mut self, ui: &mut Ui) {
        egui::CollapsingHeader::new("Physics tuning")
            .default_open(false)
            .show(ui, |ui| {
                let physics = &mut self.physics;
                let mut changed = false;
                changed |= physics_slider(
                    ui,
                    &mut physics.charge_strength,
                    -800.0..=-20.0,
                    "Repulsion",
                    "How strongly every person pushes the others away.",
                );
                changed |= physics_slider(
                    ui,
                    &mut physics.link_distance,
                    10.0..=150.0,
                    "Link distance",
                    "Resting length of a relationship edge.",
                );
                changed |= physics_slider(
                    ui,
                    &mut physics.link_strength,
                    0.0..=1.0,
                    "Link strength",
                    "How strongly related people pull toward the link distance.",
                );
                changed |= physics_slider(
                    ui,
                    &mut physics.collide_strength,
                    0.0..=1.0,
                    "Collision",
                    "How firmly overlapping circles are pushed apart.",
                );
                changed |= physics_slider(
                    ui,
                    &mut physics.position_strength,
                    0.0..=0.2,
                    "Gravity",
                    "Pull toward the middle of the canvas.",
                );
                changed |= physics_slider(
                    ui,
                    &mut physics.velocity_decay,
                    0.05..=0.9,
                    "Velocity decay",
                    "Fraction of speed lost every tick.",
                );
                changed |= physics_slider(
                    ui,
                    &mut physics.alpha_decay,
                    0.005..=0.1,
                    "Cooling",
                    "How quickly the layout comes to rest.",
                );

                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    if ui.button("Reset").clicked() {
                        self.physics = PhysicsConfig::default();
                        changed = true;
                    }
                    if ui.button("Save settings").clicked() {
                        self.save_settings();
                    }
                });

                if changed {
                    self.engine.set_physics(self.physics.clone());
                }
                if let Some(feedback) = &self.settings_feedback {
                    ui.small(feedback.as_str());
                }
            });
    }

    fn save_settings(&mut self) {
        let mut config = self.engine.config().clone();
        config.physics = self.physics.clone();
        self.settings_feedback = Some(match save_to_path(&config, &self.config_path) {
            Ok(()) => format!("Saved to {}", self.config_path.display()),
            Err(error) => {
                warn!(error = %format!("{error:#}"), "saving settings failed");
                format!("Saving failed: {error:#}")
            }
        });
    }
}
