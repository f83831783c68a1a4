use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::render_utils::{circle_visible, curve_control, curve_points, distance_to_polyline};
use super::super::{RenderGraph, ViewModel};

const NODE_HIT_SLOP: f32 = 2.0;
const EDGE_HIT_DISTANCE: f32 = 5.0;
const EDGE_HIT_SEGMENTS: usize = 12;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.camera.zoom_at(rect, pointer, zoom_factor);
    }

    /// Secondary or middle drag pans anywhere; primary drag pans when it started off a node.
    pub(in crate::app) fn handle_graph_pan(
        &mut self,
        response: &egui::Response,
        pointer_on_node: bool,
    ) {
        let dragging_background =
            response.dragged_by(egui::PointerButton::Primary) && !pointer_on_node;
        if dragging_background
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.camera.pan_by(response.drag_delta());
        }
    }
}

pub(super) fn visible_indices_into(
    rect: Rect,
    screen_positions: &[Pos2],
    screen_radii: &[f32],
    finite_mask: &[bool],
    visible: &mut Vec<bool>,
) -> usize {
    visible.clear();
    visible.extend((0..screen_positions.len()).map(|index| {
        finite_mask[index] && circle_visible(rect, screen_positions[index], screen_radii[index])
    }));
    visible.iter().filter(|visible| **visible).count()
}

pub(super) fn hovered_index(
    pointer: Pos2,
    screen_positions: &[Pos2],
    screen_radii: &[f32],
    visible: &[bool],
) -> Option<usize> {
    (0..screen_positions.len())
        .filter(|&index| visible[index])
        .filter_map(|index| {
            let distance = screen_positions[index].distance(pointer);
            (distance <= screen_radii[index] + NODE_HIT_SLOP).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Closest edge whose drawn curve passes within a few pixels of the pointer.
pub(super) fn hovered_edge(
    pointer: Pos2,
    graph: &RenderGraph,
    screen_positions: &[Pos2],
    finite_mask: &[bool],
) -> Option<usize> {
    graph
        .edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| finite_mask[edge.source] && finite_mask[edge.target])
        .filter_map(|(index, edge)| {
            let start = screen_positions[edge.source];
            let end = screen_positions[edge.target];
            let control = curve_control(start, end);
            let bounds = Rect::from_points(&[start, control, end]).expand(EDGE_HIT_DISTANCE);
            if !bounds.contains(pointer) {
                return None;
            }
            let points = curve_points(start, control, end, EDGE_HIT_SEGMENTS);
            let distance = distance_to_polyline(pointer, &points);
            (distance <= EDGE_HIT_DISTANCE).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}
