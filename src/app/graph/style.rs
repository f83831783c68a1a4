use eframe::egui::{Color32, Stroke};

use super::super::highlight::Emphasis;
use super::super::render_utils::{blend_color, pattern_color, with_opacity};
use super::super::{RenderEdge, RenderNode};

/// Zoom level past which every visible node gets a label.
pub(super) const LABEL_ZOOM: f32 = 1.6;

const RING_GLOW: Color32 = Color32::from_rgb(229, 72, 77);
const SUSPICIOUS_GLOW: Color32 = Color32::from_rgb(255, 170, 120);
const FOCUS_EDGE: Color32 = Color32::from_rgb(255, 190, 92);
const NODE_OUTLINE: Color32 = Color32::from_rgb(12, 14, 20);

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Glow {
    pub(super) color: Color32,
    pub(super) radius_offset: f32,
    pub(super) width: f32,
    pub(super) dashed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct NodeStyle {
    pub(super) fill: Color32,
    pub(super) stroke: Stroke,
    pub(super) radius_scale: f32,
    pub(super) glow: Option<Glow>,
    pub(super) label: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct NodeFocus {
    pub(super) selected: bool,
    pub(super) hovered: bool,
}

/// `pulse` runs from 0 to 1 and only affects pattern members.
pub(super) fn node_style(
    node: &RenderNode,
    emphasis: Emphasis,
    focus: NodeFocus,
    zoom: f32,
    pulse: f32,
) -> NodeStyle {
    if emphasis == Emphasis::Dimmed {
        return NodeStyle {
            fill: with_opacity(node.color, 0.16),
            stroke: Stroke::new(0.8, with_opacity(NODE_OUTLINE, 0.3)),
            radius_scale: 1.0,
            glow: None,
            label: false,
        };
    }

    let (fill, mut stroke, glow) = match emphasis {
        Emphasis::Pattern(pattern) => {
            let color = pattern_color(pattern);
            (
                blend_color(node.color, color, 0.7),
                Stroke::new(2.0, color),
                Some(Glow {
                    color,
                    radius_offset: 5.0 + pulse.clamp(0.0, 1.0) * 4.0,
                    width: 2.0,
                    dashed: true,
                }),
            )
        }
        _ => {
            let glow = if node.is_in_ring {
                Some(Glow {
                    color: RING_GLOW,
                    radius_offset: 5.0,
                    width: 2.0,
                    dashed: true,
                })
            } else if node.is_suspicious {
                Some(Glow {
                    color: with_opacity(SUSPICIOUS_GLOW, 0.45),
                    radius_offset: 3.5,
                    width: 3.0,
                    dashed: false,
                })
            } else {
                None
            };
            let stroke = if emphasis == Emphasis::Focused {
                Stroke::new(1.6, Color32::from_gray(220))
            } else {
                Stroke::new(1.0, NODE_OUTLINE)
            };
            (node.color, stroke, glow)
        }
    };

    let radius_scale = if focus.selected {
        1.35
    } else if focus.hovered {
        1.2
    } else {
        1.0
    };
    if focus.selected || focus.hovered {
        stroke = Stroke::new(2.5, Color32::WHITE);
    }

    let label = focus.selected
        || focus.hovered
        || matches!(emphasis, Emphasis::Pattern(_))
        || zoom > LABEL_ZOOM;

    NodeStyle {
        fill,
        stroke,
        radius_scale,
        glow,
        label,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct EdgeStyle {
    pub(super) color: Color32,
    pub(super) width: f32,
    pub(super) flow_overlay: bool,
}

pub(super) fn edge_style(edge: &RenderEdge, emphasis: Emphasis, hovered: bool, zoom: f32) -> EdgeStyle {
    let zoom_scale = zoom.sqrt().clamp(0.5, 2.0);
    let mut style = match emphasis {
        Emphasis::Dimmed => EdgeStyle {
            color: with_opacity(edge.color, 0.12),
            width: edge.width * 0.6,
            flow_overlay: false,
        },
        Emphasis::Pattern(pattern) => EdgeStyle {
            color: pattern_color(pattern),
            width: edge.width.max(1.6) * 1.2,
            flow_overlay: true,
        },
        Emphasis::Focused => EdgeStyle {
            color: blend_color(edge.color, FOCUS_EDGE, 0.65),
            width: edge.width * 1.4 + 0.6,
            flow_overlay: true,
        },
        Emphasis::Normal => EdgeStyle {
            color: edge.color,
            width: edge.width,
            flow_overlay: false,
        },
    };

    if hovered && emphasis != Emphasis::Dimmed {
        style.color = blend_color(style.color, Color32::WHITE, 0.35);
        style.width += 1.0;
    }
    style.width *= zoom_scale;
    style
}
