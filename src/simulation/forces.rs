use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) padding: f32,
    pub(super) max_distance_sq: f32,
}

/// Direction for two bodies sitting on top of each other, spread by index.
fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * TAU;
    vec2(angle.cos(), angle.sin())
}

/// Velocity change on a body at `point` from `mass` bodies at `source`.
///
/// Falls off with distance rather than its square; positive strength pushes apart.
fn charge_between(point: Vec2, source: Vec2, mass: f32, strength: f32, min_distance_sq: f32) -> Vec2 {
    let delta = point - source;
    let distance_sq = delta.length_sq();
    let direction = if distance_sq > 1e-8 {
        delta / distance_sq.sqrt()
    } else {
        vec2(1.0, 0.0)
    };
    direction * (strength * mass / distance_sq.max(min_distance_sq).sqrt())
}

pub(super) fn accumulate_charge_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    min_distance_sq: f32,
    theta: f32,
    velocity: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            *velocity += charge_between(
                point,
                positions[other_index],
                1.0,
                strength,
                min_distance_sq,
            );
        }
        return;
    }

    let distance = (point - node.center_of_mass).length().max(1e-4);
    let can_approximate = !node.bounds.contains(point)
        && (node.bounds.side_length() / distance) < theta
        && node.mass > 1.0;

    if can_approximate {
        *velocity += charge_between(
            point,
            node.center_of_mass,
            node.mass,
            strength,
            min_distance_sq,
        );
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_charge_for_node(
            child,
            index,
            positions,
            strength,
            min_distance_sq,
            theta,
            velocity,
        );
    }
}

fn separate(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    velocities: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    let min_distance = radii[from] + radii[to] + params.padding;
    if distance >= min_distance {
        return;
    }

    let direction = if distance > 1e-4 {
        delta / distance
    } else {
        fallback_direction(from, to)
    };
    let push = direction * ((min_distance - distance) * params.strength * 0.5);
    velocities[from] += push;
    velocities[to] -= push;
}

/// Pushes apart every pair of overlapping circles, pruning cell pairs that are too far
/// apart to contain one.
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    velocities: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (i, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[i + 1..] {
                    separate(from, to, positions, radii, params, velocities);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    separate(from, to, positions, radii, params, velocities);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, velocities);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, velocities,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, velocities);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, velocities);
        }
    }
}

#[derive(Clone, Copy)]
pub(super) struct LinkParams {
    pub(super) strength: f32,
    pub(super) distance: f32,
    pub(super) alpha: f32,
}

/// Springs toward `distance`, using positions extrapolated by the current velocity.
///
/// The correction is split by degree so well-connected bodies move less.
pub(super) fn accumulate_links(
    links: &[(usize, usize)],
    degree: &[usize],
    positions: &[Vec2],
    velocities: &[Vec2],
    params: LinkParams,
    deltas: &mut [Vec2],
) {
    for &(source, target) in links {
        let mut delta = (positions[target] + velocities[target] + deltas[target])
            - (positions[source] + velocities[source] + deltas[source]);
        if delta.length_sq() < 1e-8 {
            delta = fallback_direction(source, target) * 1e-3;
        }
        let length = delta.length();
        let correction = delta * ((length - params.distance) / length * params.alpha * params.strength);

        let (source_degree, target_degree) = (degree[source] as f32, degree[target] as f32);
        let bias = source_degree / (source_degree + target_degree).max(1.0);
        deltas[target] -= correction * bias;
        deltas[source] += correction * (1.0 - bias);
    }
}
