use eframe::egui::{self, Rect, Ui};

use crate::engine::GraphEngine;
use crate::people::PersonId;

use super::super::ViewModel;
use super::super::render_utils::canvas_pos;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.engine.zoom_at(canvas_pos(rect, pointer), zoom_factor);
    }

    /// Node drag, panning and click selection. Returns the person under the pointer.
    pub(in crate::app) fn handle_graph_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) -> Option<PersonId> {
        let node_at = |engine: &GraphEngine, pos| {
            engine.node_on_mouse_position(canvas_pos(rect, pos))
        };

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(pos) = response.interact_pointer_pos()
            && let Some(id) = node_at(&self.engine, pos)
            && self.engine.drag_start(id, canvas_pos(rect, pos))
        {
            self.dragging = Some(id);
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            match (self.dragging, response.interact_pointer_pos()) {
                (Some(id), Some(pos)) => {
                    // The person may have been filtered out mid-drag.
                    if !self.engine.drag(id, canvas_pos(rect, pos)) {
                        self.dragging = None;
                    }
                }
                (Some(_), None) => {}
                (None, _) => self.engine.pan_by(response.drag_delta()),
            }
        }

        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.engine.pan_by(response.drag_delta());
        }

        if response.drag_stopped()
            && let Some(id) = self.dragging.take()
        {
            self.engine.drag_end(id);
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let clicked = response
                .interact_pointer_pos()
                .and_then(|pos| node_at(&self.engine, pos));
            self.toggle_selection(clicked);
        }

        let hovered = response
            .hover_pos()
            .and_then(|pos| node_at(&self.engine, pos));
        if self.dragging.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::Grabbing);
        } else if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }
        hovered
    }
}
