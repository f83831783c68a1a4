use eframe::egui::{Pos2, Rect, Vec2, vec2};

use super::render_utils::{is_finite_vec, screen_to_world};

pub(super) const MIN_ZOOM: f32 = 0.05;
pub(super) const MAX_ZOOM: f32 = 8.0;
const FOCUS_ZOOM: f32 = 2.2;
const FIT_PADDING: f32 = 48.0;
const TRANSITION_SECONDS: f32 = 0.45;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Transition {
    from_pan: Vec2,
    from_zoom: f32,
    to_pan: Vec2,
    to_zoom: f32,
    elapsed: f32,
}

/// Pan and zoom of the canvas. A world point `w` lands on screen at
/// `viewport.center() + pan + w * zoom`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Camera {
    pan: Vec2,
    zoom: f32,
    transition: Option<Transition>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            transition: None,
        }
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    let inverse = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inverse * inverse * inverse
}

impl Camera {
    pub(super) fn pan(&self) -> Vec2 {
        self.pan
    }

    pub(super) fn zoom(&self) -> f32 {
        self.zoom
    }

    pub(super) fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    fn move_to(&mut self, pan: Vec2, zoom: f32, animate: bool) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if !is_finite_vec(pan) || !zoom.is_finite() {
            return;
        }
        if animate {
            self.transition = Some(Transition {
                from_pan: self.pan,
                from_zoom: self.zoom,
                to_pan: pan,
                to_zoom: zoom,
                elapsed: 0.0,
            });
        } else {
            self.transition = None;
            self.pan = pan;
            self.zoom = zoom;
        }
    }

    /// Wheel zoom that keeps the world point under `anchor` in place.
    pub(super) fn zoom_at(&mut self, viewport: Rect, anchor: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.transition = None;

        let world = screen_to_world(viewport, self.pan, self.zoom, anchor);
        let zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor - viewport.center() - world * zoom;
        self.zoom = zoom;
    }

    pub(super) fn pan_by(&mut self, delta: Vec2) {
        if !is_finite_vec(delta) {
            return;
        }
        self.transition = None;
        self.pan += delta;
    }

    /// Frames every finite position inside `viewport` with some padding. Returns `false`
    /// when there is nothing to fit.
    pub(super) fn fit(
        &mut self,
        positions: impl IntoIterator<Item = Vec2>,
        viewport: Rect,
        animate: bool,
    ) -> bool {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for position in positions.into_iter().filter(|position| is_finite_vec(*position)) {
            min = min.min(position);
            max = max.max(position);
        }
        if !(is_finite_vec(min) && is_finite_vec(max)) {
            return false;
        }

        let span = (max - min).max(vec2(1.0, 1.0));
        let available = (viewport.size() - Vec2::splat(FIT_PADDING * 2.0)).max(vec2(1.0, 1.0));
        let zoom = (available.x / span.x)
            .min(available.y / span.y)
            .clamp(MIN_ZOOM, MAX_ZOOM.min(FOCUS_ZOOM));
        let center = (min + max) * 0.5;
        self.move_to(-center * zoom, zoom, animate);
        true
    }

    /// Centers `world` and zooms in to at least the focus level.
    pub(super) fn focus(&mut self, world: Vec2, animate: bool) {
        let zoom = self.zoom.max(FOCUS_ZOOM);
        self.move_to(-world * zoom, zoom, animate);
    }

    /// Steps an in-flight transition. Returns `true` while more frames are needed.
    pub(super) fn advance(&mut self, delta_seconds: f32) -> bool {
        let Some(mut transition) = self.transition else {
            return false;
        };

        transition.elapsed += delta_seconds.max(0.0);
        let t = ease_out_cubic(transition.elapsed / TRANSITION_SECONDS);
        self.pan = transition.from_pan + (transition.to_pan - transition.from_pan) * t;
        self.zoom = transition.from_zoom + (transition.to_zoom - transition.from_zoom) * t;

        if transition.elapsed >= TRANSITION_SECONDS {
            self.pan = transition.to_pan;
            self.zoom = transition.to_zoom;
            self.transition = None;
            false
        } else {
            self.transition = Some(transition);
            true
        }
    }
}
