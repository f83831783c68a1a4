use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Color32, Context, Pos2, Vec2};
use tracing::{error, info};

use crate::analysis::{AccountRecord, AnalysisBundle, InputPaths, RiskLevel, load_analysis};

mod annotations;
mod camera;
mod flow;
mod graph;
mod highlight;
mod interaction;
mod physics;
mod render_utils;
mod ui;

use annotations::{AnnotationIndex, FraudPattern};
use camera::Camera;
use flow::FlowClock;
use interaction::{InteractionState, NeighborDepth};

type LoadResult = Result<AnalysisBundle, String>;

/// Initial state handed over from the command line.
#[derive(Clone, Debug, Default)]
pub struct StartupOptions {
    pub paths: InputPaths,
    pub show_only_suspicious: bool,
    pub min_amount: f64,
    pub neighbor_depth: u8,
}

pub struct FraudGraphApp {
    options: StartupOptions,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    NoDataset,
    Error(String),
}

struct ViewModel {
    bundle: AnalysisBundle,
    annotations: AnnotationIndex,
    filters: Filters,
    interaction: InteractionState,
    camera: Camera,
    flow: FlowClock,
    physics: PhysicsConfig,
    search: String,
    live_physics: bool,
    show_quadtree_overlay: bool,
    show_legend: bool,
    graph_dirty: bool,
    render_graph_revision: u64,
    graph_cache: Option<RenderGraph>,
    pattern_cache: Option<PatternHighlight>,
    search_match_cache: Option<SearchMatchCache>,
    last_clicked: Option<Box<RenderNodeRecord>>,
    auto_fit: AutoFit,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
    visible_node_count: usize,
    visible_edge_count: usize,
}

/// Initial camera fit, run once the first layout had time to spread out.
#[derive(Clone, Copy, Debug, PartialEq)]
enum AutoFit {
    Pending,
    Scheduled(f64),
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Filters {
    show_low_weight: bool,
    show_only_suspicious: bool,
    min_amount: f64,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            show_low_weight: true,
            show_only_suspicious: false,
            min_amount: 0.0,
        }
    }
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<Vec<usize>>,
}

/// Node and edge indices of the active fraud pattern in the current render graph.
struct PatternHighlight {
    pattern: FraudPattern,
    graph_revision: u64,
    nodes: HashSet<usize>,
    links: HashSet<usize>,
}

struct RenderGraph {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    index_by_id: HashMap<String, usize>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    max_amount: f64,
    alpha: f32,
    physics_scratch: PhysicsScratch,
    view_scratch: ViewScratch,
}

#[derive(Default)]
struct PhysicsScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    charges: Vec<f32>,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    finite_mask: Vec<bool>,
    visible_mask: Vec<bool>,
    quadtree_positions: Vec<Vec2>,
    quadtree_cells: Vec<physics::QuadtreeCell>,
}

struct RenderNode {
    id: String,
    account: AccountRecord,
    world_pos: Vec2,
    velocity: Vec2,
    base_radius: f32,
    color: Color32,
    score: f64,
    risk_level: RiskLevel,
    is_suspicious: bool,
    is_in_ring: bool,
    ring_id: Option<String>,
    patterns: BTreeSet<String>,
}

struct RenderEdge {
    source: usize,
    target: usize,
    amount: f64,
    transaction_count: u32,
    width: f32,
    is_suspicious: bool,
    color: Color32,
}

/// Snapshot of a render node handed to the rest of the application on click.
#[derive(Clone, Debug, PartialEq)]
struct RenderNodeRecord {
    account: AccountRecord,
    size: f32,
    score: f64,
    risk_level: RiskLevel,
    is_suspicious: bool,
    is_in_ring: bool,
    ring_id: Option<String>,
    patterns: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq)]
enum GraphEvent {
    NodeClicked(Box<RenderNodeRecord>),
    BackgroundClicked,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PhysicsConfig {
    repulsion_scale: f32,
    link_distance: f32,
    spring_scale: f32,
    center_strength: f32,
    collision_scale: f32,
    velocity_damping: f32,
    alpha_decay: f32,
    alpha_min: f32,
    delta_seconds: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            repulsion_scale: 1.0,
            link_distance: 70.0,
            spring_scale: 1.0,
            center_strength: 0.012,
            collision_scale: 1.0,
            velocity_damping: 0.82,
            alpha_decay: 0.0228,
            alpha_min: 0.001,
            delta_seconds: 1.0 / 60.0,
        }
    }
}

impl FraudGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: StartupOptions) -> Self {
        let state = Self::start_load(options.paths.clone());
        Self {
            options,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(paths: InputPaths) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_analysis(&paths).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(paths: InputPaths) -> AppState {
        if paths.dataset.is_none() {
            info!("no dataset path given");
            return AppState::NoDataset;
        }

        AppState::Loading {
            rx: Self::spawn_load(paths),
        }
    }

    fn ready_state(&self, result: LoadResult) -> AppState {
        match result {
            Ok(bundle) if bundle.dataset.is_some() => {
                AppState::Ready(Box::new(ViewModel::new(bundle, &self.options)))
            }
            Ok(_) => AppState::NoDataset,
            Err(message) => {
                error!(%message, "failed to load analysis inputs");
                AppState::Error(message)
            }
        }
    }
}

fn centered_placeholder(ui: &mut egui::Ui, heading: &str, detail: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(120.0);
        ui.heading(heading);
        ui.add_space(8.0);
        ui.label(detail);
    });
}

impl eframe::App for FraudGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry_requested = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading transaction graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::NoDataset => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    centered_placeholder(
                        ui,
                        "No dataset loaded",
                        "Start ringlens with --dataset <graph.json> to investigate a transaction network.",
                    );
                });
            }
            AppState::Error(message) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load analysis inputs");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry_requested = true;
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    info!("reloading analysis inputs");
                    self.reload_rx = Some(Self::spawn_load(self.options.paths.clone()));
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

        if retry_requested {
            self.state = Self::start_load(self.options.paths.clone());
        } else if let Some(result) = transition {
            self.reload_rx = None;
            self.state = self.ready_state(result);
        }
    }
}

impl ViewModel {
    fn neighbor_depth_from(raw: u8) -> NeighborDepth {
        if raw >= 2 {
            NeighborDepth::Two
        } else {
            NeighborDepth::One
        }
    }
}
