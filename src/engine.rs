//! The engine façade the front end talks to.
//!
//! It owns the graph, the filter state, the display projection, the simulation and the view
//! transform, and publishes a [`Frame`] to every subscriber whenever something visible
//! changes. All calls happen on the UI thread between frames, so a filter or time change
//! always replaces the view completely before the next tick.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use chrono::NaiveDate;
use eframe::egui::{Pos2, Vec2};
use tracing::{debug, info};

use crate::config::{EngineConfig, PhysicsConfig};
use crate::error::FilterError;
use crate::filter::{Filter, FilterEngine, FilterKey, GraphView};
use crate::graph::{self, DisplayProjection, Graph};
use crate::people::{PersonId, RelationshipId};
use crate::pulse::{PulseStep, PulseTask};
use crate::simulation::Simulation;
use crate::spatial::{self, EdgeCandidate, NodeCandidate, ViewTransform};

/// Everything a renderer needs for one picture.
#[derive(Debug)]
pub struct Frame {
    pub revision: u64,
    pub view: Arc<GraphView>,
    pub projection: Arc<DisplayProjection>,
    /// Truncated world positions, aligned with `view.nodes`.
    pub positions: Vec<Vec2>,
    pub transform: ViewTransform,
    /// Progress of the running search pulse.
    pub pulse_phase: Option<f32>,
}

#[derive(Default)]
struct FrameBus {
    subscribers: Vec<Sender<Arc<Frame>>>,
}

impl FrameBus {
    fn publish(&mut self, frame: &Arc<Frame>) {
        self.subscribers
            .retain(|subscriber| subscriber.send(Arc::clone(frame)).is_ok());
    }
}

pub struct GraphEngine {
    graph: Graph,
    config: EngineConfig,
    filter: FilterEngine,
    projection: Arc<DisplayProjection>,
    view: Arc<GraphView>,
    simulation: Simulation,
    transform: ViewTransform,
    canvas: Vec2,
    bus: FrameBus,
    revision: u64,
    epoch: u64,
    pulse: Option<PulseTask>,
    pulse_phase: Option<f32>,
}

impl GraphEngine {
    pub fn new(graph: Graph, cursor: NaiveDate, canvas: Vec2, config: EngineConfig) -> Self {
        let filter = FilterEngine::new(&graph, cursor);
        let projection = Arc::new(DisplayProjection::compute(&graph, cursor));
        let simulation = Simulation::new(config.physics.clone(), canvas);

        let mut engine = Self {
            graph,
            config,
            filter,
            projection,
            view: Arc::new(GraphView::default()),
            simulation,
            transform: ViewTransform::default(),
            canvas,
            bus: FrameBus::default(),
            revision: 0,
            epoch: 0,
            pulse: None,
            pulse_phase: None,
        };
        engine.refilter();
        engine
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn view(&self) -> &GraphView {
        &self.view
    }

    pub fn projection(&self) -> &DisplayProjection {
        &self.projection
    }

    pub fn filters(&self) -> &[Filter] {
        self.filter.filters()
    }

    pub fn cursor(&self) -> NaiveDate {
        self.filter.cursor()
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// True while the layout is moving or a pulse is running.
    pub fn is_animating(&self) -> bool {
        self.simulation.is_active() || self.pulse.is_some()
    }

    /// Receives a snapshot of the current state right away, then one per update.
    pub fn subscribe(&mut self) -> Receiver<Arc<Frame>> {
        let (tx, rx) = mpsc::channel();
        // The receiver is still in hand, so this cannot fail.
        let _ = tx.send(Arc::new(self.snapshot()));
        self.bus.subscribers.push(tx);
        rx
    }

    /// The current state as a frame, without publishing it.
    pub fn snapshot(&self) -> Frame {
        Frame {
            revision: self.revision,
            view: Arc::clone(&self.view),
            projection: Arc::clone(&self.projection),
            positions: self.simulation.display_positions(),
            transform: self.transform,
            pulse_phase: self.pulse_phase,
        }
    }

    fn emit(&mut self) {
        self.revision += 1;
        let frame = Arc::new(self.snapshot());
        self.bus.publish(&frame);
    }

    /// Moves the temporal cursor, recomputing every derived field and the view.
    pub fn set_time(&mut self, cursor: NaiveDate) -> bool {
        if !self.filter.set_time(cursor) {
            return false;
        }
        info!(%cursor, "time cursor moved");
        self.projection = Arc::new(DisplayProjection::compute(&self.graph, cursor));
        self.refilter();
        true
    }

    pub fn set_filter(&mut self, key: &FilterKey, enabled: bool) -> Result<bool, FilterError> {
        let changed = self.filter.set_filter(key, enabled)?;
        if changed {
            info!(filter = %key.name(), enabled, "filter toggled");
            self.refilter();
        }
        Ok(changed)
    }

    pub fn set_filter_by_name(&mut self, name: &str, enabled: bool) -> Result<bool, FilterError> {
        let key = FilterKey::parse(name).ok_or_else(|| FilterError::UnknownFilter(name.to_owned()))?;
        self.set_filter(&key, enabled)
    }

    fn refilter(&mut self) {
        let view = self.filter.apply(&self.graph);
        let radii: Vec<f32> = view
            .nodes
            .iter()
            .map(|id| self.projection.radius(*id))
            .collect();
        let links: Vec<(PersonId, PersonId)> = view
            .edges
            .iter()
            .filter_map(|id| self.graph.edge(*id))
            .map(|edge| (edge.source(), edge.target()))
            .collect();

        self.simulation.set_data(&view.nodes, &links, &radii);
        self.view = Arc::new(view);
        // Any running pulse belongs to the old view.
        self.epoch += 1;

        info!(
            nodes = self.view.nodes.len(),
            edges = self.view.edges.len(),
            "view replaced"
        );
        self.emit();
    }

    /// Advances the simulation one step; false once it has settled.
    pub fn tick(&mut self) -> bool {
        if !self.simulation.tick() {
            return false;
        }
        self.emit();
        true
    }

    pub fn set_physics(&mut self, physics: PhysicsConfig) {
        self.config.physics = physics.clone();
        self.simulation.set_config(physics);
    }

    pub fn node_on_mouse_position(&self, screen: Pos2) -> Option<PersonId> {
        let world = self.transform.invert(screen);
        let candidates = self.view.nodes.iter().filter_map(|id| {
            Some(NodeCandidate {
                id: *id,
                center: self.simulation.position(*id)?,
                radius: self.projection.radius(*id),
            })
        });
        spatial::node_at(candidates, world)
    }

    pub fn edge_on_mouse_position(&self, screen: Pos2) -> Option<RelationshipId> {
        let world = self.transform.invert(screen);
        let candidates = self.view.edges.iter().filter_map(|id| {
            let edge = self.graph.edge(*id)?;
            Some(EdgeCandidate {
                id: *id,
                start: self.simulation.position(edge.source())?,
                end: self.simulation.position(edge.target())?,
            })
        });
        spatial::edge_at(candidates, world, self.config.edge_hit_tolerance)
    }

    /// Centres the view on a visible person.
    pub fn focus_on_node(&mut self, id: PersonId) -> bool {
        let Some(position) = self.simulation.position(id) else {
            return false;
        };
        self.transform.focus_on(position, self.canvas);
        debug!(%id, "focused");
        self.emit();
        true
    }

    pub fn drag_start(&mut self, id: PersonId, screen: Pos2) -> bool {
        let world = self.transform.invert(screen);
        self.simulation.drag_start(id, world)
    }

    pub fn drag(&mut self, id: PersonId, screen: Pos2) -> bool {
        let world = self.transform.invert(screen);
        self.simulation.drag(id, world)
    }

    pub fn drag_end(&mut self, id: PersonId) -> bool {
        self.simulation.drag_end(id)
    }

    pub fn zoom_at(&mut self, screen: Pos2, factor: f32) {
        let before = self.transform;
        self.transform
            .zoom_at(screen, factor, self.config.min_zoom, self.config.max_zoom);
        if self.transform != before {
            self.emit();
        }
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        self.transform.pan_by(delta);
        self.emit();
    }

    pub fn resize(&mut self, canvas: Vec2) {
        if canvas == self.canvas {
            return;
        }
        debug!(width = canvas.x, height = canvas.y, "canvas resized");
        self.canvas = canvas;
        self.simulation.resize(canvas);
        self.emit();
    }

    /// Visible people matching `query`, best first.
    pub fn search(&self, query: &str) -> Vec<PersonId> {
        graph::search(&self.graph, &self.view.nodes, query)
    }

    /// Highlights `targets` for the configured pulse duration, replacing any running pulse.
    pub fn pulse_search_results(&mut self, targets: Vec<PersonId>, now: Instant) {
        self.epoch += 1;
        Arc::make_mut(&mut self.projection).set_highlighted(&targets);
        debug!(targets = targets.len(), epoch = self.epoch, "pulse started");
        self.pulse = Some(PulseTask::new(self.epoch, now, self.config.pulse_duration()));
        self.pulse_phase = Some(0.0);
        self.emit();
    }

    /// Drives the pulse; returns whether it is still running.
    pub fn poll_pulse(&mut self, now: Instant) -> bool {
        let Some(pulse) = &self.pulse else {
            return false;
        };

        match pulse.poll(self.epoch, now) {
            PulseStep::Running { phase } => {
                self.pulse_phase = Some(phase);
                self.emit();
                true
            }
            step @ (PulseStep::Expired | PulseStep::Stale) => {
                debug!(?step, "pulse finished");
                self.pulse = None;
                self.pulse_phase = None;
                Arc::make_mut(&mut self.projection).clear_highlight();
                self.emit();
                false
            }
        }
    }
}
