use std::time::Duration;

use eframe::egui::{
    self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2, vec2,
};
use tracing::info;

use crate::analysis::RiskLevel;
use crate::util::{format_amount, short_id};

use super::super::flow::{FLOW_DASH, FLOW_GAP, FLOW_TICK};
use super::super::highlight::{DisplayMode, build_pattern_highlight};
use super::super::interaction::CameraRequest;
use super::super::physics::{is_cooled, quadtree_cells, step_physics};
use super::super::render_utils::{
    arrowhead, circle_points, curve_control, curve_points, draw_background, is_finite_pos,
    risk_color, with_opacity, world_to_screen,
};
use super::super::{AutoFit, GraphEvent, RenderGraph, RenderNodeRecord, ViewModel};
use super::interaction::{hovered_edge, hovered_index, visible_indices_into};
use super::style::{NodeFocus, edge_style, node_style};

const AUTO_FIT_DELAY_SECONDS: f64 = 1.2;

fn update_screen_space(rect: Rect, pan: Vec2, zoom: f32, cache: &mut RenderGraph) {
    let scratch = &mut cache.view_scratch;
    scratch.screen_positions.clear();
    scratch.screen_radii.clear();
    scratch.finite_mask.clear();
    let radius_scale = zoom.powf(0.5);
    for node in &cache.nodes {
        let position = world_to_screen(rect, pan, zoom, node.world_pos);
        let radius = (node.base_radius * radius_scale).clamp(2.5, 48.0);
        scratch.screen_positions.push(position);
        scratch.screen_radii.push(radius);
        scratch
            .finite_mask
            .push(is_finite_pos(position) && radius.is_finite());
    }
}

fn node_record(cache: &RenderGraph, index: usize) -> Option<RenderNodeRecord> {
    let node = cache.nodes.get(index)?;
    Some(RenderNodeRecord {
        account: node.account.clone(),
        size: node.base_radius,
        score: node.score,
        risk_level: node.risk_level,
        is_suspicious: node.is_suspicious,
        is_in_ring: node.is_in_ring,
        ring_id: node.ring_id.clone(),
        patterns: node.patterns.clone(),
    })
}

fn curve_segments(start: Pos2, end: Pos2) -> usize {
    ((start.distance(end) / 14.0) as usize).clamp(6, 32)
}

fn draw_quadtree_overlay(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32, cache: &mut RenderGraph) {
    quadtree_cells(
        &cache.nodes,
        &mut cache.view_scratch.quadtree_positions,
        &mut cache.view_scratch.quadtree_cells,
    );
    for cell in &cache.view_scratch.quadtree_cells {
        let min = cell.center - vec2(cell.half_extent, cell.half_extent);
        let max = cell.center + vec2(cell.half_extent, cell.half_extent);
        let screen = Rect::from_min_max(
            world_to_screen(rect, pan, zoom, min),
            world_to_screen(rect, pan, zoom, max),
        );

        let alpha = if cell.is_leaf { 110 } else { 55 };
        let line_width = (1.4_f32 - (cell.depth as f32 * 0.09)).clamp(0.45, 1.4);
        painter.rect_stroke(
            screen,
            0.0,
            Stroke::new(line_width, Color32::from_rgba_unmultiplied(106, 198, 255, alpha)),
            egui::StrokeKind::Middle,
        );
    }
}

fn draw_tooltip(painter: &Painter, rect: Rect, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let font = FontId::proportional(13.0);
    let line_height = 17.0;
    let width = lines
        .iter()
        .map(|line| line.chars().count() as f32 * 7.2)
        .fold(120.0, f32::max);
    let frame = Rect::from_min_size(
        rect.left_top() + vec2(10.0, 10.0),
        vec2(width + 16.0, lines.len() as f32 * line_height + 12.0),
    );
    painter.rect_filled(frame, 6.0, Color32::from_rgba_unmultiplied(20, 24, 33, 228));
    for (row, line) in lines.iter().enumerate() {
        painter.text(
            frame.left_top() + vec2(8.0, 6.0 + row as f32 * line_height),
            Align2::LEFT_TOP,
            line,
            font.clone(),
            Color32::from_gray(236),
        );
    }
}

fn draw_legend(painter: &Painter, rect: Rect) {
    let tiers = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];
    let row_height = 18.0;
    let frame = Rect::from_min_size(
        rect.left_bottom() + vec2(10.0, -(tiers.len() as f32 + 1.0) * row_height - 18.0),
        vec2(132.0, (tiers.len() as f32 + 1.0) * row_height + 8.0),
    );
    painter.rect_filled(frame, 6.0, Color32::from_rgba_unmultiplied(20, 24, 33, 210));
    painter.text(
        frame.left_top() + vec2(8.0, 4.0),
        Align2::LEFT_TOP,
        "Risk level",
        FontId::proportional(12.0),
        Color32::from_gray(200),
    );
    for (row, tier) in tiers.iter().enumerate() {
        let center = frame.left_top() + vec2(16.0, 4.0 + (row as f32 + 1.5) * row_height);
        painter.circle_filled(center, 5.0, risk_color(*tier));
        painter.text(
            center + vec2(12.0, 0.0),
            Align2::LEFT_CENTER,
            tier.label(),
            FontId::proportional(12.0),
            Color32::from_gray(225),
        );
    }
}

impl ViewModel {
    /// Keeps the cached pattern highlight in sync with the active pattern and graph revision.
    fn refresh_pattern_cache(&mut self) {
        let Some(pattern) = self.interaction.active_pattern() else {
            self.pattern_cache = None;
            return;
        };
        if self.pattern_cache.as_ref().is_some_and(|cached| {
            cached.pattern == pattern && cached.graph_revision == self.render_graph_revision
        }) {
            return;
        }

        let (Some(cache), Some(dataset)) = (self.graph_cache.as_ref(), self.bundle.dataset.as_ref())
        else {
            self.pattern_cache = None;
            return;
        };
        self.pattern_cache = Some(build_pattern_highlight(
            cache,
            &self.annotations,
            &dataset.edges,
            pattern,
            self.render_graph_revision,
        ));
    }

    fn handle_graph_event(&mut self, event: GraphEvent) {
        match event {
            GraphEvent::NodeClicked(record) => {
                info!(account = %record.account.id, score = record.score, "node clicked");
                self.last_clicked = Some(record);
            }
            GraphEvent::BackgroundClicked => {
                info!("background clicked");
            }
        }
    }

    pub(in crate::app) fn select_account(&mut self, id: &str) {
        let Some(cache) = self.graph_cache.as_ref() else {
            return;
        };
        let Some(&index) = cache.index_by_id.get(id) else {
            return;
        };
        if self.interaction.selected_index() == Some(index) {
            return;
        }

        if let CameraRequest::FocusNode(index) = self.interaction.click_node(cache, index) {
            self.camera.focus(cache.nodes[index].world_pos, true);
        }
        if let Some(record) = node_record(cache, index) {
            self.handle_graph_event(GraphEvent::NodeClicked(Box::new(record)));
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.graph_dirty {
            self.rebuild_render_graph();
        }
        self.refresh_pattern_cache();

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let now = ui.input(|input| input.time);
        let frame_delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);

        self.handle_graph_zoom(ui, rect, &response);
        self.camera.advance(frame_delta_seconds);

        draw_background(&painter, rect, self.camera.pan(), self.camera.zoom());

        let Some(cache) = self.graph_cache.as_mut() else {
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            return;
        };
        if cache.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No accounts match the current filters",
                FontId::proportional(15.0),
                Color32::from_gray(190),
            );
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            return;
        }

        let mut physics = self.physics;
        physics.delta_seconds = frame_delta_seconds;
        let physics_moving = self.live_physics && step_physics(cache, physics);

        match self.auto_fit {
            AutoFit::Pending => self.auto_fit = AutoFit::Scheduled(now + AUTO_FIT_DELAY_SECONDS),
            AutoFit::Scheduled(at) if now >= at => {
                self.camera
                    .fit(cache.nodes.iter().map(|node| node.world_pos), rect, true);
                self.auto_fit = AutoFit::Done;
            }
            AutoFit::Scheduled(at) => {
                ui.ctx()
                    .request_repaint_after(Duration::from_secs_f64((at - now).max(0.0)));
            }
            AutoFit::Done => {}
        }

        let pan = self.camera.pan();
        let zoom = self.camera.zoom();
        update_screen_space(rect, pan, zoom, cache);
        let scratch = &mut cache.view_scratch;
        self.visible_node_count = visible_indices_into(
            rect,
            &scratch.screen_positions,
            &scratch.screen_radii,
            &scratch.finite_mask,
            &mut scratch.visible_mask,
        );

        if self.show_quadtree_overlay {
            draw_quadtree_overlay(&painter, rect, pan, zoom, cache);
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| response.hovered() && rect.contains(*pointer));
        let hovered_node = pointer.and_then(|pointer| {
            hovered_index(
                pointer,
                &cache.view_scratch.screen_positions,
                &cache.view_scratch.screen_radii,
                &cache.view_scratch.visible_mask,
            )
        });
        let hovered_link = match (pointer, hovered_node) {
            (Some(pointer), None) => hovered_edge(
                pointer,
                cache,
                &cache.view_scratch.screen_positions,
                &cache.view_scratch.finite_mask,
            ),
            _ => None,
        };
        self.interaction.hover(cache, hovered_node);
        self.interaction.set_hover_link(hovered_link);
        if hovered_node.is_some() || hovered_link.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let press_on_node = ui
            .input(|input| input.pointer.press_origin())
            .and_then(|origin| {
                hovered_index(
                    origin,
                    &cache.view_scratch.screen_positions,
                    &cache.view_scratch.screen_radii,
                    &cache.view_scratch.visible_mask,
                )
            })
            .is_some();

        let mut events = Vec::new();
        if response.clicked_by(egui::PointerButton::Primary) {
            let request = match hovered_node {
                Some(index) => {
                    if let Some(record) = node_record(cache, index) {
                        events.push(GraphEvent::NodeClicked(Box::new(record)));
                    }
                    self.interaction.click_node(cache, index)
                }
                None => {
                    events.push(GraphEvent::BackgroundClicked);
                    self.interaction.click_background()
                }
            };
            match request {
                CameraRequest::FocusNode(index) => {
                    self.camera.focus(cache.nodes[index].world_pos, true);
                }
                CameraRequest::Fit => {
                    self.camera
                        .fit(cache.nodes.iter().map(|node| node.world_pos), rect, true);
                }
                CameraRequest::None => {}
            }
        }

        let pattern = self.pattern_cache.as_ref().filter(|cached| {
            Some(cached.pattern) == self.interaction.active_pattern()
                && cached.graph_revision == self.render_graph_revision
        });
        let mode = DisplayMode::resolve(pattern, self.interaction.highlight());
        if let Some(delay) = self.flow.advance(mode.animates(), frame_delta_seconds) {
            ui.ctx().request_repaint_after(delay.min(FLOW_TICK));
        }
        let flow_offset = self.flow.offset();
        let pulse = if self.flow.is_running() {
            ((now * 2.4).sin() * 0.5 + 0.5) as f32
        } else {
            0.0
        };

        let scratch = &cache.view_scratch;
        let hover_link = self.interaction.hover_link();
        let mut visible_edge_count = 0usize;
        for (edge_index, edge) in cache.edges.iter().enumerate() {
            if !scratch.finite_mask[edge.source] || !scratch.finite_mask[edge.target] {
                continue;
            }

            let start = scratch.screen_positions[edge.source];
            let end = scratch.screen_positions[edge.target];
            let control = curve_control(start, end);
            if !rect.intersects(Rect::from_points(&[start, control, end]).expand(4.0)) {
                continue;
            }

            let style = edge_style(
                edge,
                mode.edge_emphasis(edge_index),
                hover_link == Some(edge_index),
                zoom,
            );
            let points = curve_points(start, control, end, curve_segments(start, end));
            if style.flow_overlay {
                painter.add(Shape::line(points.clone(), Stroke::new(style.width, style.color)));
                painter.extend(Shape::dashed_line_with_offset(
                    &points,
                    Stroke::new((style.width * 0.55).max(1.0), with_opacity(Color32::WHITE, 0.85)),
                    &[FLOW_DASH],
                    &[FLOW_GAP],
                    flow_offset,
                ));
            } else {
                painter.add(Shape::line(points, Stroke::new(style.width, style.color)));
            }

            let arrow_size = (5.0 + style.width * 1.6).clamp(5.0, 14.0);
            if let Some(triangle) = arrowhead(start, control, end, arrow_size) {
                painter.add(Shape::convex_polygon(
                    triangle.to_vec(),
                    style.color,
                    Stroke::NONE,
                ));
            }
            visible_edge_count += 1;
        }
        self.visible_edge_count = visible_edge_count;

        let selected = self.interaction.selected_index();
        for (index, node) in cache.nodes.iter().enumerate() {
            if !scratch.visible_mask[index] {
                continue;
            }

            let focus = NodeFocus {
                selected: selected == Some(index),
                hovered: self.interaction.hover_node() == Some(index),
            };
            let style = node_style(node, mode.node_emphasis(index), focus, zoom, pulse);
            let position = scratch.screen_positions[index];
            let radius = scratch.screen_radii[index] * style.radius_scale;

            if let Some(glow) = style.glow {
                let glow_radius = radius + glow.radius_offset;
                let stroke = Stroke::new(glow.width, glow.color);
                if glow.dashed {
                    let segments = ((glow_radius * 0.9) as usize).clamp(16, 72);
                    painter.extend(Shape::dashed_line(
                        &circle_points(position, glow_radius, segments),
                        stroke,
                        5.0,
                        4.0,
                    ));
                } else {
                    painter.circle_stroke(position, glow_radius, stroke);
                }
            }

            painter.circle_filled(position, radius, style.fill);
            painter.circle_stroke(position, radius, style.stroke);

            if style.label {
                painter.text(
                    position - vec2(0.0, radius + 4.0),
                    Align2::CENTER_BOTTOM,
                    short_id(&node.id),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        let tooltip = if let Some(index) = hovered_node {
            let node = &cache.nodes[index];
            vec![
                node.id.clone(),
                format!("score {:.1}  |  {}", node.score, node.risk_level),
                format!(
                    "sent {}  |  received {}",
                    format_amount(node.account.total_amount_sent),
                    format_amount(node.account.total_amount_received)
                ),
                format!("{} transactions", node.account.total_transactions),
            ]
        } else if let Some(edge) = hovered_link.and_then(|index| cache.edges.get(index)) {
            let mut lines = vec![
                format!(
                    "{} -> {}",
                    short_id(&cache.nodes[edge.source].id),
                    short_id(&cache.nodes[edge.target].id)
                ),
                format!(
                    "amount {}  |  {} transactions",
                    format_amount(edge.amount),
                    edge.transaction_count
                ),
            ];
            if cache.max_amount > 0.0 {
                lines.push(format!(
                    "{:.0}% of the largest visible transfer",
                    edge.amount / cache.max_amount * 100.0
                ));
            }
            if edge.is_suspicious {
                lines.push("touches a suspicious account".to_owned());
            }
            lines
        } else {
            Vec::new()
        };
        draw_tooltip(&painter, rect, &tooltip);

        if self.show_legend {
            draw_legend(&painter, rect);
        }

        let needs_repaint = physics_moving
            || self.camera.is_animating()
            || response.dragged()
            || (self.live_physics && !is_cooled(cache, self.physics));
        if needs_repaint {
            ui.ctx().request_repaint();
        }

        self.handle_graph_pan(&response, press_on_node);
        for event in events {
            self.handle_graph_event(event);
        }
    }
}
