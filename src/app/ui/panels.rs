use std::collections::VecDeque;

use eframe::egui::{self, Align, Context, Layout};

use crate::analysis::AnalysisBundle;

use super::super::annotations::AnnotationIndex;
use super::super::camera::Camera;
use super::super::flow::FlowClock;
use super::super::interaction::InteractionState;
use super::super::{AutoFit, Filters, PhysicsConfig, StartupOptions, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(bundle: AnalysisBundle, options: &StartupOptions) -> Self {
        let annotations = AnnotationIndex::build(bundle.fraud.as_ref(), bundle.risk.as_ref());
        let filters = Filters {
            show_only_suspicious: options.show_only_suspicious,
            min_amount: options.min_amount.max(0.0),
            ..Filters::default()
        };

        Self {
            bundle,
            annotations,
            filters,
            interaction: InteractionState::new(Self::neighbor_depth_from(options.neighbor_depth)),
            camera: Camera::default(),
            flow: FlowClock::default(),
            physics: PhysicsConfig::default(),
            search: String::new(),
            live_physics: true,
            show_quadtree_overlay: false,
            show_legend: true,
            graph_dirty: true,
            render_graph_revision: 0,
            graph_cache: None,
            pattern_cache: None,
            search_match_cache: None,
            last_clicked: None,
            auto_fit: AutoFit::Pending,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    fn dataset_summary(&self) -> Option<String> {
        let dataset = self.bundle.dataset.as_ref()?;
        Some(format!(
            "accounts: {}  transfers: {}  rings: {}  suspicious: {}",
            dataset.node_count(),
            dataset.edge_count(),
            self.annotations.ring_count(),
            self.annotations.suspicious_ids().count(),
        ))
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("ringlens");
                    ui.separator();
                    if let Some(summary) = self.dataset_summary() {
                        ui.label(summary);
                    }
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload inputs"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Fit view").clicked() {
                        self.auto_fit = AutoFit::Scheduled(f64::NEG_INFINITY);
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(visible_graph_text) = self.visible_graph_text() {
                            ui.label(visible_graph_text);
                        }
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| self.draw_controls(ui));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            let empty = self
                .bundle
                .dataset
                .as_ref()
                .is_none_or(|dataset| dataset.is_empty());
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading analysis inputs...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else if empty {
                super::super::centered_placeholder(
                    ui,
                    "No transaction data",
                    "The dataset contains no accounts.",
                );
            } else {
                self.draw_graph(ui);
            }
        });
    }
}
