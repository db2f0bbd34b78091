use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use eframe::egui::{self, Align, Context, Layout, Vec2, vec2};
use tracing::warn;

use crate::config::EngineConfig;
use crate::engine::GraphEngine;
use crate::graph::Graph;
use crate::people::PersonId;
use crate::simulation::SimulationState;
use crate::temporal::event_dates;
use crate::util::format_date;

use super::super::ViewModel;

impl ViewModel {
    /// Placeholder canvas until the central panel reports its real size.
    const INITIAL_CANVAS: Vec2 = vec2(960.0, 720.0);

    pub(in crate::app) fn new(
        graph: Graph,
        config: EngineConfig,
        config_path: PathBuf,
        initial_time: Option<NaiveDate>,
        hidden_filters: &[String],
    ) -> Self {
        let today = Local::now().date_naive();
        let event_dates = event_dates(
            graph
                .edges()
                .iter()
                .flat_map(|edge| edge.relationship.statuses.iter()),
            today,
        );
        let cursor = initial_time.unwrap_or(today);
        let time_index = snap_index(&event_dates, cursor);
        let physics = config.physics.clone();

        let mut engine = GraphEngine::new(graph, cursor, Self::INITIAL_CANVAS, config);
        for name in hidden_filters {
            if let Err(error) = engine.set_filter_by_name(name, false) {
                warn!(%error, "ignoring --hide");
            }
        }
        let frames = engine.subscribe();
        let frame = frames
            .try_recv()
            .unwrap_or_else(|_| Arc::new(engine.snapshot()));

        Self {
            engine,
            frames,
            frame,
            event_dates,
            time_index,
            search: String::new(),
            search_feedback: None,
            selected: Vec::new(),
            dragging: None,
            physics,
            config_path,
            settings_feedback: None,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("people-graph");
                    ui.separator();
                    ui.label(format!("as of {}", format_date(self.engine.cursor())));
                    ui.label(format!("people: {}", self.engine.graph().nodes().len()));
                    ui.label(format!(
                        "relationships: {}",
                        self.engine.graph().edges().len()
                    ));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload data"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.layout_status());
                        ui.label(format!(
                            "visible: {} people, {} relationships",
                            self.engine.view().nodes.len(),
                            self.engine.view().edges.len()
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_details(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading people and relationships...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    fn layout_status(&self) -> String {
        let simulation = self.engine.simulation();
        match simulation.state() {
            SimulationState::Idle => "layout settled".to_owned(),
            SimulationState::Settling => format!("settling (alpha {:.3})", simulation.alpha()),
            SimulationState::Dragging(_) => "dragging".to_owned(),
        }
    }

    /// Keeps the latest frame; older ones are skipped.
    pub(in crate::app) fn drain_frames(&mut self) {
        while let Ok(frame) = self.frames.try_recv() {
            if frame.revision >= self.frame.revision {
                self.frame = frame;
            }
        }
    }

    pub(in crate::app) fn set_time_index(&mut self, index: usize) {
        let Some(date) = self.event_dates.get(index).copied() else {
            return;
        };
        self.time_index = index;
        self.engine.set_time(date);
    }

    /// Clicking a person adds them to the front of the selection; a third click drops the
    /// oldest one, clicking a selected person deselects them and clicking empty space
    /// clears everything.
    pub(in crate::app) fn toggle_selection(&mut self, clicked: Option<PersonId>) {
        let Some(id) = clicked else {
            self.selected.clear();
            return;
        };
        if let Some(position) = self.selected.iter().position(|selected| *selected == id) {
            self.selected.remove(position);
            return;
        }
        self.selected.insert(0, id);
        self.selected.truncate(2);
    }

    pub(in crate::app) fn is_selected(&self, id: PersonId) -> bool {
        self.selected.contains(&id)
    }
}

/// Index of the last event date not after `cursor`, or the first one.
fn snap_index(dates: &[NaiveDate], cursor: NaiveDate) -> usize {
    dates.partition_point(|date| *date <= cursor).saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    #[test]
    fn cursor_snaps_to_the_preceding_event() {
        let dates = [day(2013, 2, 14), day(2016, 5, 20), day(2017, 8, 12)];
        assert_eq!(snap_index(&dates, day(2016, 5, 20)), 1);
        assert_eq!(snap_index(&dates, day(2016, 12, 1)), 1);
        assert_eq!(snap_index(&dates, day(2030, 1, 1)), 2);
        assert_eq!(snap_index(&dates, day(2000, 1, 1)), 0);
    }
}
