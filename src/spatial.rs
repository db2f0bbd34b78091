//! Pan/zoom transform and pointer hit tests against the live layout.

use eframe::egui::{Pos2, Vec2, pos2, vec2};

use crate::people::{PersonId, RelationshipId};

/// Maps world coordinates to canvas coordinates: `screen = world * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub x: f32,
    pub y: f32,
    pub k: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            k: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn apply(&self, world: Vec2) -> Pos2 {
        pos2(world.x * self.k + self.x, world.y * self.k + self.y)
    }

    pub fn invert(&self, screen: Pos2) -> Vec2 {
        vec2((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
    }

    /// Scales by `factor` keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32, min_zoom: f32, max_zoom: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let world = self.invert(anchor);
        self.k = (self.k * factor).clamp(min_zoom, max_zoom);
        self.x = anchor.x - world.x * self.k;
        self.y = anchor.y - world.y * self.k;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Translates so `world` lands in the middle of a `canvas`-sized viewport.
    pub fn focus_on(&mut self, world: Vec2, canvas: Vec2) {
        self.x = canvas.x * 0.5 - world.x * self.k;
        self.y = canvas.y * 0.5 - world.y * self.k;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct NodeCandidate {
    pub id: PersonId,
    pub center: Vec2,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct EdgeCandidate {
    pub id: RelationshipId,
    pub start: Vec2,
    pub end: Vec2,
}

/// Distance from `point` to the closed segment `start..end`.
pub fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq == 0.0 {
        return (point - start).length();
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    (point - (start + segment * t)).length()
}

/// First node, in candidate order, whose circle strictly contains `world`.
pub fn node_at(
    candidates: impl IntoIterator<Item = NodeCandidate>,
    world: Vec2,
) -> Option<PersonId> {
    candidates
        .into_iter()
        .find(|candidate| {
            (world - candidate.center).length_sq() < candidate.radius * candidate.radius
        })
        .map(|candidate| candidate.id)
}

/// First edge, in candidate order, passing closer than `tolerance` to `world`.
pub fn edge_at(
    candidates: impl IntoIterator<Item = EdgeCandidate>,
    world: Vec2,
    tolerance: f32,
) -> Option<RelationshipId> {
    candidates
        .into_iter()
        .find(|candidate| {
            distance_to_segment(world, candidate.start, candidate.end) < tolerance
        })
        .map(|candidate| candidate.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, x: f32, y: f32, radius: f32) -> NodeCandidate {
        NodeCandidate {
            id: PersonId(id),
            center: vec2(x, y),
            radius,
        }
    }

    #[test]
    fn node_hit_is_an_exact_circle_test() {
        let candidates = [node(1, 100.0, 100.0, 10.0)];
        assert_eq!(node_at(candidates, vec2(105.0, 105.0)), Some(PersonId(1)));
        assert_eq!(node_at(candidates, vec2(112.0, 100.0)), None);
        assert_eq!(node_at(candidates, vec2(110.0, 100.0)), None, "boundary is outside");
    }

    #[test]
    fn overlapping_nodes_resolve_by_order() {
        let candidates = [node(1, 0.0, 0.0, 10.0), node(2, 2.0, 0.0, 10.0)];
        assert_eq!(node_at(candidates, vec2(2.0, 0.0)), Some(PersonId(1)));
    }

    #[test]
    fn edge_hit_uses_the_clamped_segment() {
        let candidates = [EdgeCandidate {
            id: RelationshipId(4),
            start: vec2(0.0, 0.0),
            end: vec2(100.0, 0.0),
        }];
        assert_eq!(edge_at(candidates, vec2(50.0, 2.0), 5.0), Some(RelationshipId(4)));
        assert_eq!(edge_at(candidates, vec2(50.0, 10.0), 5.0), None);
        assert_eq!(edge_at(candidates, vec2(103.0, 0.0), 5.0), Some(RelationshipId(4)));
        assert_eq!(edge_at(candidates, vec2(-20.0, 0.0), 5.0), None, "beyond the endpoint");
    }

    #[test]
    fn degenerate_segment_is_a_point() {
        assert_eq!(
            distance_to_segment(vec2(3.0, 4.0), Vec2::ZERO, Vec2::ZERO),
            5.0
        );
    }

    #[test]
    fn invert_undoes_apply() {
        let transform = ViewTransform {
            x: 40.0,
            y: -12.0,
            k: 2.5,
        };
        let world = vec2(13.0, 7.0);
        assert!((transform.invert(transform.apply(world)) - world).length() < 1e-4);
    }

    #[test]
    fn zoom_keeps_anchor_fixed_and_clamps() {
        let mut transform = ViewTransform::default();
        let anchor = pos2(200.0, 150.0);
        let before = transform.invert(anchor);

        transform.zoom_at(anchor, 2.0, 0.1, 8.0);
        assert_eq!(transform.k, 2.0);
        assert!((transform.invert(anchor) - before).length() < 1e-4);

        transform.zoom_at(anchor, 100.0, 0.1, 8.0);
        assert_eq!(transform.k, 8.0);
        transform.zoom_at(anchor, 0.0, 0.1, 8.0);
        assert_eq!(transform.k, 8.0);
    }

    #[test]
    fn focus_centres_the_world_point() {
        let mut transform = ViewTransform {
            x: 0.0,
            y: 0.0,
            k: 2.0,
        };
        transform.focus_on(vec2(10.0, 20.0), vec2(800.0, 600.0));
        assert_eq!(transform.apply(vec2(10.0, 20.0)), pos2(400.0, 300.0));
    }
}
