use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use chrono::NaiveDate;
use eframe::egui::{self, Context};
use tracing::{error, info};

use crate::config::{EngineConfig, PhysicsConfig};
use crate::engine::{Frame, GraphEngine};
use crate::graph::Graph;
use crate::people::{DataSource, PersonId, load_dataset};

mod graph;
mod render_utils;
mod ui;

/// Settings the app was started with; kept so reloads use the same inputs.
pub struct LaunchOptions {
    pub source: DataSource,
    pub config: EngineConfig,
    pub config_path: PathBuf,
    pub initial_time: Option<NaiveDate>,
    /// Filter names switched off when a graph is ready.
    pub hidden_filters: Vec<String>,
}

pub struct PeopleGraphApp {
    options: LaunchOptions,
    state: AppState,
    reload_rx: Option<Receiver<Result<Graph, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Graph, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    engine: GraphEngine,
    frames: Receiver<Arc<Frame>>,
    frame: Arc<Frame>,
    event_dates: Vec<NaiveDate>,
    time_index: usize,
    search: String,
    search_feedback: Option<String>,
    /// Most recent click first; at most two.
    selected: Vec<PersonId>,
    dragging: Option<PersonId>,
    physics: PhysicsConfig,
    config_path: PathBuf,
    settings_feedback: Option<String>,
}

impl PeopleGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        let state = Self::start_load(options.source.clone());
        Self {
            options,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: DataSource) -> Receiver<Result<Graph, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_dataset(&source)
                .and_then(Graph::build)
                .map_err(|error| {
                    error!(%error, "failed to load people graph");
                    error.to_string()
                });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: DataSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, graph: Graph) -> AppState {
        info!(
            people = graph.nodes().len(),
            relationships = graph.edges().len(),
            "graph ready"
        );
        AppState::Ready(Box::new(ViewModel::new(
            graph,
            self.options.config.clone(),
            self.options.config_path.clone(),
            self.options.initial_time,
            &self.options.hidden_filters,
        )))
    }
}

impl eframe::App for PeopleGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(result);
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading people and relationships...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the people graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    self.state = Self::start_load(self.options.source.clone());
                    return;
                }
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    info!("reloading data");
                    self.reload_rx = Some(Self::spawn_load(self.options.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(graph) => self.ready(graph),
                Err(error) => AppState::Error(error),
            };
        }
    }
}
