//! Force-directed layout for the visible people.
//!
//! An alpha term cools geometrically toward `alpha_target`; forces are scaled by it and the
//! simulation goes idle once it falls below `alpha_min`. Dragging raises the target so the
//! rest of the graph keeps relaxing around the pinned body.

mod forces;
mod quadtree;

use std::collections::HashMap;
use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::config::PhysicsConfig;
use crate::people::PersonId;
use crate::util::stable_pair;
use forces::{CollisionParams, LinkParams, accumulate_charge_for_node, accumulate_collision_pairs, accumulate_links};
use quadtree::QuadNode;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Fixed position while dragged.
    pub pin: Option<Vec2>,
}

impl Body {
    fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            pin: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Idle,
    Settling,
    Dragging(PersonId),
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    deltas: Vec<Vec2>,
    degree: Vec<usize>,
}

pub struct Simulation {
    config: PhysicsConfig,
    center: Vec2,
    alpha: f32,
    alpha_target: f32,
    state: SimulationState,
    ids: Vec<PersonId>,
    index_by_id: HashMap<PersonId, usize>,
    bodies: Vec<Body>,
    radii: Vec<f32>,
    links: Vec<(usize, usize)>,
    orphans: HashMap<PersonId, Body>,
    scratch: Scratch,
}

impl Simulation {
    pub fn new(config: PhysicsConfig, canvas: Vec2) -> Self {
        Self {
            alpha_target: config.alpha_target,
            config,
            center: canvas * 0.5,
            alpha: 1.0,
            state: SimulationState::Idle,
            ids: Vec::new(),
            index_by_id: HashMap::new(),
            bodies: Vec::new(),
            radii: Vec::new(),
            links: Vec::new(),
            orphans: HashMap::new(),
            scratch: Scratch::default(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PhysicsConfig) {
        if !matches!(self.state, SimulationState::Dragging(_)) {
            self.alpha_target = config.alpha_target;
        }
        self.config = config;
        self.reheat();
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != SimulationState::Idle
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Bodies in the order of the last `set_data`.
    pub fn ids(&self) -> &[PersonId] {
        &self.ids
    }

    pub fn body(&self, id: PersonId) -> Option<&Body> {
        self.index_by_id.get(&id).map(|index| &self.bodies[*index])
    }

    pub fn position(&self, id: PersonId) -> Option<Vec2> {
        self.body(id).map(|body| body.position)
    }

    /// Positions truncated to whole units, aligned with [`Simulation::ids`].
    pub fn display_positions(&self) -> Vec<Vec2> {
        self.bodies
            .iter()
            .map(|body| vec2(body.position.x.trunc(), body.position.y.trunc()))
            .collect()
    }

    /// Replaces the simulated set.
    ///
    /// Bodies leaving the set are cached and come back where they left off; new ones start
    /// next to an already placed neighbour when they have one. A drag on a body that is no
    /// longer present ends here.
    pub fn set_data(&mut self, ids: &[PersonId], links: &[(PersonId, PersonId)], radii: &[f32]) {
        let mut previous: HashMap<PersonId, Body> =
            self.ids.drain(..).zip(self.bodies.drain(..)).collect();

        self.index_by_id = ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();
        self.links = links
            .iter()
            .filter_map(|(source, target)| {
                Some((*self.index_by_id.get(source)?, *self.index_by_id.get(target)?))
            })
            .filter(|(source, target)| source != target)
            .collect();
        self.radii = (0..ids.len())
            .map(|index| radii.get(index).copied().unwrap_or(0.0))
            .collect();

        let mut bodies: Vec<Option<Body>> = ids
            .iter()
            .map(|id| previous.remove(id).or_else(|| self.orphans.remove(id)))
            .collect();
        let missing: Vec<usize> = (0..ids.len()).filter(|index| bodies[*index].is_none()).collect();
        for (order, index) in missing.into_iter().enumerate() {
            let anchor = self
                .links
                .iter()
                .filter_map(|&(source, target)| match (source == index, target == index) {
                    (true, _) => Some(target),
                    (_, true) => Some(source),
                    _ => None,
                })
                .find_map(|neighbour| bodies[neighbour].map(|body| body.position));
            bodies[index] = Some(Body::at(self.initial_position(ids[index], order, anchor)));
        }
        self.bodies = bodies.into_iter().flatten().collect();

        for (id, mut body) in previous {
            body.pin = None;
            body.velocity = Vec2::ZERO;
            self.orphans.insert(id, body);
        }
        self.ids = ids.to_vec();

        if let SimulationState::Dragging(dragged) = self.state
            && !self.index_by_id.contains_key(&dragged)
        {
            debug!(%dragged, "dragged person left the view, ending drag");
            self.alpha_target = self.config.alpha_target;
            self.state = SimulationState::Settling;
        }

        self.reheat();
        debug!(
            bodies = self.bodies.len(),
            links = self.links.len(),
            cached = self.orphans.len(),
            "simulation data replaced"
        );
    }

    fn initial_position(&self, id: PersonId, order: usize, anchor: Option<Vec2>) -> Vec2 {
        let (jitter_x, jitter_y) = stable_pair(&id);
        let jitter = vec2(jitter_x, jitter_y);
        match anchor {
            Some(anchor) => anchor + jitter * self.config.link_distance,
            None => {
                // Phyllotaxis spiral around the centre, nudged by the id hash.
                let radius = self.config.initial_spread * (0.5 + order as f32).sqrt();
                let angle = order as f32 * PI * (3.0 - 5.0_f32.sqrt());
                self.center + vec2(angle.cos(), angle.sin()) * radius + jitter
            }
        }
    }

    fn reheat(&mut self) {
        self.alpha = self.alpha.max(self.config.reheat_alpha);
        if self.state == SimulationState::Idle {
            debug!(alpha = self.alpha, "simulation reheated");
            self.state = SimulationState::Settling;
        }
    }

    /// Moves the centring target to the middle of the new canvas.
    pub fn resize(&mut self, canvas: Vec2) {
        let center = canvas * 0.5;
        if center != self.center {
            self.center = center;
            self.reheat();
        }
    }

    pub fn drag_start(&mut self, id: PersonId, world: Vec2) -> bool {
        let Some(&index) = self.index_by_id.get(&id) else {
            return false;
        };
        if let SimulationState::Dragging(previous) = self.state
            && let Some(&previous_index) = self.index_by_id.get(&previous)
        {
            self.bodies[previous_index].pin = None;
        }

        self.bodies[index].pin = Some(world);
        self.alpha_target = self.config.drag_alpha_target;
        self.reheat();
        self.state = SimulationState::Dragging(id);
        debug!(%id, "drag started");
        true
    }

    /// Moves the pin of the body being dragged.
    pub fn drag(&mut self, id: PersonId, world: Vec2) -> bool {
        if self.state != SimulationState::Dragging(id) {
            return false;
        }
        match self.index_by_id.get(&id) {
            Some(&index) => {
                self.bodies[index].pin = Some(world);
                true
            }
            None => false,
        }
    }

    pub fn drag_end(&mut self, id: PersonId) -> bool {
        if self.state != SimulationState::Dragging(id) {
            return false;
        }
        if let Some(&index) = self.index_by_id.get(&id) {
            self.bodies[index].pin = None;
        }
        self.alpha_target = self.config.alpha_target;
        self.state = SimulationState::Settling;
        debug!(%id, "drag ended");
        true
    }

    /// Advances one step. Returns false when idle and nothing moved.
    pub fn tick(&mut self) -> bool {
        if self.state == SimulationState::Idle {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.step();

        if self.alpha < self.config.alpha_min && self.state == SimulationState::Settling {
            debug!(alpha = self.alpha, "simulation settled");
            self.state = SimulationState::Idle;
        }
        true
    }

    fn step(&mut self) {
        let count = self.bodies.len();
        if count == 0 {
            return;
        }

        let config = &self.config;
        let alpha = self.alpha;
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        scratch
            .positions
            .extend(self.bodies.iter().map(|body| body.position));
        scratch
            .velocities
            .extend(self.bodies.iter().map(|body| body.velocity));
        scratch.deltas.clear();
        scratch.deltas.resize(count, Vec2::ZERO);
        scratch.degree.clear();
        scratch.degree.resize(count, 0);
        for &(source, target) in &self.links {
            scratch.degree[source] += 1;
            scratch.degree[target] += 1;
        }

        let positions = &scratch.positions;
        let deltas = &mut scratch.deltas;

        if let Some(tree) = QuadNode::build(positions) {
            let strength = -config.charge_strength * alpha;
            let min_distance_sq = config.charge_min_distance * config.charge_min_distance;
            for (index, delta) in deltas.iter_mut().enumerate() {
                accumulate_charge_for_node(
                    &tree,
                    index,
                    positions,
                    strength,
                    min_distance_sq,
                    config.theta,
                    delta,
                );
            }

            let max_radius = self.radii.iter().copied().fold(0.0_f32, f32::max);
            let max_distance = max_radius * 2.0 + config.collide_padding;
            if max_distance > 0.0 {
                accumulate_collision_pairs(
                    &tree,
                    &tree,
                    true,
                    positions,
                    &self.radii,
                    CollisionParams {
                        strength: config.collide_strength,
                        padding: config.collide_padding,
                        max_distance_sq: max_distance * max_distance,
                    },
                    deltas,
                );
            }
        }

        accumulate_links(
            &self.links,
            &scratch.degree,
            positions,
            &scratch.velocities,
            LinkParams {
                strength: config.link_strength,
                distance: config.link_distance,
                alpha,
            },
            deltas,
        );

        for (delta, position) in deltas.iter_mut().zip(positions) {
            *delta += (self.center - *position) * (config.position_strength * alpha);
        }

        let keep = 1.0 - config.velocity_decay;
        let max_speed_sq = config.max_speed * config.max_speed;
        for (body, delta) in self.bodies.iter_mut().zip(deltas.iter()) {
            if let Some(pin) = body.pin {
                body.position = pin;
                body.velocity = Vec2::ZERO;
                continue;
            }
            let mut velocity = (body.velocity + *delta) * keep;
            let speed_sq = velocity.length_sq();
            if speed_sq > max_speed_sq {
                velocity *= config.max_speed / speed_sq.sqrt();
            }
            body.velocity = velocity;
            body.position += velocity;
        }

        let free: Vec<&mut Body> = self
            .bodies
            .iter_mut()
            .filter(|body| body.pin.is_none())
            .collect();
        if !free.is_empty() {
            let mean = free
                .iter()
                .fold(Vec2::ZERO, |sum, body| sum + body.position)
                / free.len() as f32;
            let shift = (mean - self.center) * config.center_strength;
            for body in free {
                body.position -= shift;
            }
        }
    }
}
