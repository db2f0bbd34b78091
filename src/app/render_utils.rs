use std::f32::consts::FRAC_PI_2;

use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2, vec2};

use crate::spatial::ViewTransform;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

/// Flat backdrop with a grid that follows the pan and zoom.
pub(super) fn draw_background(painter: &Painter, rect: Rect, transform: ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * transform.k.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + vec2(transform.x, transform.y);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

/// Pointer position relative to the canvas origin, the space the engine's transform maps into.
pub(super) fn canvas_pos(rect: Rect, screen: Pos2) -> Pos2 {
    (screen - rect.min).to_pos2()
}

pub(super) fn to_screen(rect: Rect, transform: ViewTransform, world: Vec2) -> Pos2 {
    rect.min + transform.apply(world).to_vec2()
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let top_left = rect.left_top();
    let top_right = rect.right_top();
    let bottom_left = rect.left_bottom();
    let bottom_right = rect.right_bottom();

    segments_intersect(start, end, top_left, top_right)
        || segments_intersect(start, end, top_right, bottom_right)
        || segments_intersect(start, end, bottom_right, bottom_left)
        || segments_intersect(start, end, bottom_left, top_left)
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

/// A filled circular sector, split into convex pieces of at most a quarter turn.
pub(super) fn pie_slice_shapes(
    center: Pos2,
    radius: f32,
    start_angle: f32,
    end_angle: f32,
    fill: Color32,
) -> Vec<Shape> {
    let sweep = end_angle - start_angle;
    if sweep <= 0.0 || radius <= 0.0 {
        return Vec::new();
    }

    let pieces = (sweep / FRAC_PI_2).ceil().max(1.0) as usize;
    let piece_sweep = sweep / pieces as f32;
    // Roughly one arc point per 3px of circumference, never fewer than 2 per piece.
    let arc_points = ((radius * piece_sweep / 3.0).ceil() as usize).max(2);

    (0..pieces)
        .map(|piece| {
            let from = start_angle + piece_sweep * piece as f32;
            let mut points = Vec::with_capacity(arc_points + 2);
            points.push(center);
            for step in 0..=arc_points {
                let angle = from + piece_sweep * step as f32 / arc_points as f32;
                points.push(center + vec2(angle.cos(), angle.sin()) * radius);
            }
            Shape::convex_polygon(points, fill, Stroke::NONE)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn full_pie_is_split_into_quarters() {
        let shapes = pie_slice_shapes(pos2(0.0, 0.0), 10.0, 0.0, TAU, Color32::RED);
        assert_eq!(shapes.len(), 4);
        assert!(pie_slice_shapes(pos2(0.0, 0.0), 10.0, 1.0, 1.0, Color32::RED).is_empty());
    }

    #[test]
    fn canvas_and_screen_space_agree() {
        let rect = Rect::from_min_size(pos2(300.0, 40.0), vec2(800.0, 600.0));
        let transform = ViewTransform {
            x: 20.0,
            y: 10.0,
            k: 2.0,
        };
        let screen = to_screen(rect, transform, vec2(5.0, 5.0));
        assert_eq!(screen, pos2(330.0, 60.0));
        assert_eq!(canvas_pos(rect, screen), pos2(30.0, 20.0));
    }

    #[test]
    fn edge_crossing_the_viewport_is_visible() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0));
        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 1.0));
        assert!(!edge_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, 150.0), 1.0));
    }
}
