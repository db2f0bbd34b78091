use std::collections::HashMap;
use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, Ui, vec2};

use crate::graph::DEFAULT_NODE_COLOR;
use crate::people::PersonId;
use crate::util::format_span;

use super::super::ViewModel;
use super::super::render_utils::{
    blend_color, canvas_pos, circle_visible, dim_color, draw_background, edge_visible,
    pie_slice_shapes, to_screen,
};

const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const HOVER_COLOR: Color32 = Color32::from_rgb(255, 164, 101);
const PULSE_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.engine.resize(rect.size());
        self.handle_graph_zoom(ui, rect, &response);
        let hovered = self.handle_graph_pointer(ui, rect, &response);
        let hovered_edge = match hovered {
            Some(_) => None,
            None => response
                .hover_pos()
                .and_then(|pos| self.engine.edge_on_mouse_position(canvas_pos(rect, pos))),
        };

        self.engine.tick();
        self.engine.poll_pulse(Instant::now());
        self.drain_frames();
        if self.engine.is_animating() {
            ui.ctx().request_repaint();
        }

        let frame = Arc::clone(&self.frame);
        let transform = frame.transform;
        draw_background(&painter, rect, transform);

        if frame.view.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Nobody matches the current filters.",
                FontId::proportional(14.0),
                Color32::from_gray(200),
            );
            return;
        }

        let screen: HashMap<PersonId, Pos2> = frame
            .view
            .nodes
            .iter()
            .zip(&frame.positions)
            .map(|(id, world)| (*id, to_screen(rect, transform, *world)))
            .collect();
        let selection_active = !self.selected.is_empty();
        let graph = self.engine.graph();

        for id in &frame.view.edges {
            let Some(edge) = graph.edge(*id) else {
                continue;
            };
            let (Some(&start), Some(&end)) = (screen.get(&edge.source()), screen.get(&edge.target()))
            else {
                continue;
            };
            let Some(display) = frame.projection.edge(*id) else {
                continue;
            };

            let width = (display.width * transform.k).max(0.5);
            if !edge_visible(rect, start, end, width) {
                continue;
            }

            let touches_selection =
                self.is_selected(edge.source()) || self.is_selected(edge.target());
            let color = if hovered_edge == Some(*id) {
                blend_color(display.color, Color32::WHITE, 0.35)
            } else if selection_active && !touches_selection {
                dim_color(display.color, 0.45)
            } else {
                display.color
            };
            let stroke = Stroke::new(width, color);

            if display.dashed {
                let dash = (6.0 * transform.k).max(2.0);
                painter.extend(Shape::dashed_line(&[start, end], stroke, dash, dash * 0.7));
            } else {
                painter.line_segment([start, end], stroke);
            }
        }

        let mut selection_animating = false;
        for id in &frame.view.nodes {
            let Some(&center) = screen.get(id) else {
                continue;
            };
            let Some(display) = frame.projection.node(*id) else {
                continue;
            };
            let radius = display.radius * transform.k;
            if !circle_visible(rect, center, radius + 12.0) {
                continue;
            }

            let is_selected = self.is_selected(*id);
            let is_hovered = hovered == Some(*id);

            match display.pie.as_slice() {
                [] => {
                    let fill = if is_hovered {
                        blend_color(DEFAULT_NODE_COLOR, HOVER_COLOR, 0.6)
                    } else {
                        DEFAULT_NODE_COLOR
                    };
                    painter.circle_filled(center, radius, fill);
                }
                [only] => {
                    painter.circle_filled(center, radius, only.color);
                }
                slices => {
                    for slice in slices {
                        painter.extend(pie_slice_shapes(
                            center,
                            radius,
                            slice.start_angle,
                            slice.end_angle,
                            slice.color,
                        ));
                    }
                }
            }

            if is_hovered && !display.pie.is_empty() {
                painter.circle_filled(center, radius, HOVER_COLOR.gamma_multiply(0.35));
            }

            let selection_mix = ui
                .ctx()
                .animate_bool(ui.make_persistent_id(("node-selection", *id)), is_selected);
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }
            if selection_mix > 0.0 {
                let halo_strength = (selection_mix * (1.0 - selection_mix) * 4.0).clamp(0.0, 1.0);
                let halo_alpha = (90.0 + (halo_strength * 120.0)) as u8;
                painter.circle_stroke(
                    center,
                    radius + 3.0 + ((1.0 - selection_mix) * 6.0),
                    Stroke::new(
                        1.5 + (halo_strength * 1.6),
                        Color32::from_rgba_unmultiplied(
                            SELECTED_COLOR.r(),
                            SELECTED_COLOR.g(),
                            SELECTED_COLOR.b(),
                            halo_alpha,
                        ),
                    ),
                );
            }

            if display.is_highlighted
                && let Some(phase) = frame.pulse_phase
            {
                let wave = (phase * TAU * 3.0).sin().abs();
                let alpha = (1.0 - phase).clamp(0.0, 1.0);
                painter.circle_stroke(
                    center,
                    radius + 4.0 + wave * 8.0,
                    Stroke::new(2.5, PULSE_COLOR.gamma_multiply(alpha)),
                );
            }

            painter.circle_stroke(
                center,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );

            let should_draw_label = is_selected
                || is_hovered
                || display.is_highlighted
                || transform.k > 0.6;
            if should_draw_label {
                let label_color = if selection_active && !is_selected {
                    Color32::from_gray(170)
                } else {
                    Color32::from_gray(238)
                };
                painter.text(
                    center + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    display.label.as_str(),
                    FontId::proportional(12.0),
                    label_color,
                );
            }
        }

        if selection_animating {
            ui.ctx().request_repaint();
        }

        let hover_text = if let Some(id) = hovered {
            frame.projection.node(id).map(|display| {
                let mut text = format!("{}  |  age {}", display.label, format_span(&display.age));
                if !display.pie.is_empty() {
                    let seminars: Vec<&str> =
                        display.pie.iter().map(|slice| slice.group.as_str()).collect();
                    text.push_str(&format!("  |  {}", seminars.join(", ")));
                }
                text
            })
        } else {
            hovered_edge.and_then(|id| {
                let edge = graph.edge(id)?;
                let display = frame.projection.edge(id)?;
                let name = |person| {
                    graph
                        .node(person)
                        .map_or_else(|| person.to_string(), |node| node.person.label())
                };
                Some(format!(
                    "{} & {}  |  {}{}  |  {}",
                    name(edge.source()),
                    name(edge.target()),
                    if display.current.is_ended { "former " } else { "" },
                    display.current.status.label(),
                    format_span(&display.current.elapsed)
                ))
            })
        };
        if let Some(text) = hover_text {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
