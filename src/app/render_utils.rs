use std::f32::consts::TAU;

use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, pos2, vec2};

use crate::analysis::RiskLevel;

use super::annotations::FraudPattern;

pub(super) const MIN_NODE_RADIUS: f32 = 4.0;
pub(super) const MAX_NODE_RADIUS: f32 = 22.0;
pub(super) const RING_NODE_FLOOR: f32 = 10.0;
pub(super) const SUSPICIOUS_NODE_FLOOR: f32 = 7.0;
pub(super) const MIN_EDGE_WIDTH: f32 = 0.6;
pub(super) const MAX_EDGE_WIDTH: f32 = 5.0;
pub(super) const CURVE_OFFSET_RATIO: f32 = 0.12;
pub(super) const ARROW_TANGENT_T: f32 = 0.85;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

pub(super) fn risk_color(level: RiskLevel) -> Color32 {
    match level {
        RiskLevel::Low => Color32::from_rgb(52, 178, 120),
        RiskLevel::Medium => Color32::from_rgb(238, 166, 43),
        RiskLevel::High => Color32::from_rgb(229, 72, 77),
        RiskLevel::Critical => Color32::from_rgb(178, 24, 70),
    }
}

pub(super) fn pattern_color(pattern: FraudPattern) -> Color32 {
    match pattern {
        FraudPattern::Cycle => Color32::from_rgb(255, 112, 67),
        FraudPattern::Smurfing => Color32::from_rgb(171, 110, 255),
        FraudPattern::ShellChain => Color32::from_rgb(38, 198, 218),
    }
}

pub(super) fn node_radius(degree: u32, is_in_ring: bool, is_suspicious: bool) -> f32 {
    let base = (MIN_NODE_RADIUS + (degree as f32).sqrt() * 2.2).min(MAX_NODE_RADIUS);
    if is_in_ring {
        base.max(RING_NODE_FLOOR)
    } else if is_suspicious {
        base.max(SUSPICIOUS_NODE_FLOOR)
    } else {
        base
    }
}

pub(super) fn edge_width(amount: f64, max_amount: f64) -> f32 {
    if max_amount <= 0.0 || !amount.is_finite() {
        return MIN_EDGE_WIDTH;
    }
    let t = (amount / max_amount).clamp(0.0, 1.0) as f32;
    MIN_EDGE_WIDTH + t * (MAX_EDGE_WIDTH - MIN_EDGE_WIDTH)
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(14, 17, 24));

    let step = (64.0 * zoom.clamp(0.6, 1.8)).max(24.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(52, 62, 78, 60));

    let mut x = origin.x.rem_euclid(step) + rect.left();
    while x < rect.right() {
        painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = origin.y.rem_euclid(step) + rect.top();
    while y < rect.bottom() {
        painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn is_finite_pos(position: Pos2) -> bool {
    position.x.is_finite() && position.y.is_finite()
}

pub(super) fn is_finite_vec(value: Vec2) -> bool {
    value.x.is_finite() && value.y.is_finite()
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

/// Control point of the quadratic curve drawn between two endpoints.
pub(super) fn curve_control(start: Pos2, end: Pos2) -> Pos2 {
    let delta = end - start;
    let normal = vec2(-delta.y, delta.x);
    start + delta * 0.5 + normal * CURVE_OFFSET_RATIO
}

pub(super) fn quadratic_point(p0: Pos2, p1: Pos2, p2: Pos2, t: f32) -> Pos2 {
    let u = 1.0 - t;
    pos2(
        u * u * p0.x + 2.0 * u * t * p1.x + t * t * p2.x,
        u * u * p0.y + 2.0 * u * t * p1.y + t * t * p2.y,
    )
}

pub(super) fn quadratic_tangent(p0: Pos2, p1: Pos2, p2: Pos2, t: f32) -> Vec2 {
    (p1 - p0) * (2.0 * (1.0 - t)) + (p2 - p1) * (2.0 * t)
}

pub(super) fn curve_points(p0: Pos2, p1: Pos2, p2: Pos2, segments: usize) -> Vec<Pos2> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|step| quadratic_point(p0, p1, p2, step as f32 / segments as f32))
        .collect()
}

/// Triangle with its tip on the curve at [`ARROW_TANGENT_T`], pointing along the tangent.
pub(super) fn arrowhead(p0: Pos2, p1: Pos2, p2: Pos2, size: f32) -> Option<[Pos2; 3]> {
    let tip = quadratic_point(p0, p1, p2, ARROW_TANGENT_T);
    let tangent = quadratic_tangent(p0, p1, p2, ARROW_TANGENT_T);
    let length = tangent.length();
    if length <= f32::EPSILON || !is_finite_vec(tangent) {
        return None;
    }

    let direction = tangent / length;
    let normal = vec2(-direction.y, direction.x);
    let base = tip - direction * size;
    Some([tip, base + normal * (size * 0.5), base - normal * (size * 0.5)])
}

pub(super) fn circle_points(center: Pos2, radius: f32, segments: usize) -> Vec<Pos2> {
    let segments = segments.max(3);
    (0..=segments)
        .map(|step| {
            let angle = step as f32 / segments as f32 * TAU;
            center + vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

pub(super) fn distance_to_polyline(point: Pos2, points: &[Pos2]) -> f32 {
    points
        .windows(2)
        .map(|segment| {
            let [a, b] = [segment[0], segment[1]];
            let ab = b - a;
            let length_sq = ab.length_sq();
            if length_sq <= f32::EPSILON {
                return point.distance(a);
            }
            let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
            point.distance(a + ab * t)
        })
        .fold(f32::INFINITY, f32::min)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn score_color(score: f64) -> Color32 {
        risk_color(RiskLevel::from_score(score))
    }

    #[test]
    fn score_colors_step_at_tier_boundaries() {
        let medium = risk_color(RiskLevel::Medium);
        let high = risk_color(RiskLevel::High);
        let low = risk_color(RiskLevel::Low);

        assert_eq!(score_color(69.9), medium);
        assert_eq!(score_color(70.0), high);
        assert_eq!(score_color(40.0), medium);
        assert_eq!(score_color(39.9), low);
        assert_ne!(medium, high);
    }

    #[test]
    fn edge_width_is_bounded_and_linear() {
        assert!((edge_width(0.0, 100.0) - MIN_EDGE_WIDTH).abs() < 1e-4);
        assert!((edge_width(100.0, 100.0) - MAX_EDGE_WIDTH).abs() < 1e-4);
        assert!((edge_width(500.0, 100.0) - MAX_EDGE_WIDTH).abs() < 1e-4);
        assert_eq!(edge_width(5.0, 0.0), MIN_EDGE_WIDTH);
        assert!(edge_width(20.0, 100.0) < edge_width(21.0, 100.0));
        let half = edge_width(50.0, 100.0);
        assert!((half - (MIN_EDGE_WIDTH + MAX_EDGE_WIDTH) * 0.5).abs() < 1e-4);
    }

    #[test]
    fn curve_control_sits_off_the_straight_line() {
        let start = pos2(0.0, 0.0);
        let end = pos2(100.0, 0.0);
        let control = curve_control(start, end);
        assert_eq!(control.x, 50.0);
        assert!((control.y - 12.0).abs() < 1e-4);
    }

    #[test]
    fn arrowhead_points_toward_target() {
        let start = pos2(0.0, 0.0);
        let end = pos2(100.0, 0.0);
        let control = curve_control(start, end);
        let [tip, left, right] = arrowhead(start, control, end, 8.0).expect("arrowhead");

        assert_eq!(tip, quadratic_point(start, control, end, ARROW_TANGENT_T));
        let base_mid = left + (right - left) * 0.5;
        let tangent = quadratic_tangent(start, control, end, ARROW_TANGENT_T);
        assert!((tip - base_mid).dot(tangent) > 0.0);
        assert!(arrowhead(start, start, start, 8.0).is_none());
    }

    #[test]
    fn curve_points_hit_both_endpoints() {
        let start = pos2(-5.0, 3.0);
        let end = pos2(40.0, 9.0);
        let points = curve_points(start, curve_control(start, end), end, 12);
        assert_eq!(points.len(), 13);
        assert_eq!(points[0], start);
        assert!(points[12].distance(end) < 1e-3);
    }

    #[test]
    fn polyline_distance_measures_closest_segment() {
        let points = [pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 10.0)];
        assert!((distance_to_polyline(pos2(5.0, 2.0), &points) - 2.0).abs() < 1e-4);
        assert!((distance_to_polyline(pos2(13.0, 5.0), &points) - 3.0).abs() < 1e-4);
    }

    #[test]
    fn finite_checks_reject_nan_and_infinity() {
        assert!(is_finite_pos(pos2(1.0, 2.0)));
        assert!(!is_finite_pos(pos2(f32::NAN, 2.0)));
        assert!(!is_finite_vec(vec2(0.0, f32::INFINITY)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn node_radius_is_monotonic_in_degree(
            degree in 0u32..10_000,
            extra in 0u32..500,
            in_ring in any::<bool>(),
            suspicious in any::<bool>(),
        ) {
            let smaller = node_radius(degree, in_ring, suspicious);
            let larger = node_radius(degree + extra, in_ring, suspicious);
            prop_assert!(larger >= smaller);
        }

        #[test]
        fn ring_members_are_never_smaller(degree in 0u32..10_000, suspicious in any::<bool>()) {
            let member = node_radius(degree, true, suspicious);
            let other = node_radius(degree, false, suspicious);
            prop_assert!(member >= other);
        }
    }
}
