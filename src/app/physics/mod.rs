mod forces;
mod quadtree;

use eframe::egui::{Vec2, vec2};

use super::render_utils::{MIN_NODE_RADIUS, is_finite_vec};
use super::{PhysicsConfig, RenderGraph, RenderNode};
use crate::util::stable_pair;
use forces::{CollisionParams, RepulsionParams, accumulate_collisions, accumulate_repulsion};
pub(in crate::app) use quadtree::QuadtreeCell;
use quadtree::{QuadNode, collect_quadtree_cells};

const BARNES_HUT_THETA: f32 = 0.72;
const REPULSION_SOFTENING: f32 = 620.0;
const REHEAT_ALPHA: f32 = 0.5;
const RESET_SPREAD: f32 = 40.0;

/// Deterministic jittered position around the origin for an account entering the layout.
pub(in crate::app) fn seed_position(id: &str, spread: f32) -> Vec2 {
    let (x, y) = stable_pair(id);
    vec2(x, y) * spread
}

/// Raises the temperature after the graph changed without discarding positions.
pub(in crate::app) fn reheat(cache: &mut RenderGraph) {
    cache.alpha = cache.alpha.max(REHEAT_ALPHA);
}

pub(in crate::app) fn is_cooled(cache: &RenderGraph, config: PhysicsConfig) -> bool {
    cache.alpha < config.alpha_min
}

fn node_charge(radius: f32) -> f32 {
    (radius / MIN_NODE_RADIUS).max(1.0).sqrt()
}

pub(in crate::app) fn quadtree_cells(
    nodes: &[RenderNode],
    positions: &mut Vec<Vec2>,
    cells: &mut Vec<QuadtreeCell>,
) {
    positions.clear();
    positions.extend(
        nodes
            .iter()
            .map(|node| node.world_pos)
            .filter(|position| is_finite_vec(*position)),
    );

    cells.clear();
    let Some(quadtree) = QuadNode::build(positions, &[]) else {
        return;
    };

    collect_quadtree_cells(&quadtree, 0, cells);
}

fn reset_non_finite(nodes: &mut [RenderNode]) -> usize {
    let mut reset = 0;
    for node in nodes {
        if !is_finite_vec(node.world_pos) || !is_finite_vec(node.velocity) {
            node.world_pos = seed_position(&node.id, RESET_SPREAD);
            node.velocity = Vec2::ZERO;
            reset += 1;
        }
    }
    reset
}

/// Advances the simulation by one tick. Returns `false` once the layout has cooled down.
pub(super) fn step_physics(cache: &mut RenderGraph, config: PhysicsConfig) -> bool {
    let reset = reset_non_finite(&mut cache.nodes);
    if reset > 0 {
        tracing::debug!(reset, "reset non-finite node positions");
    }

    let node_count = cache.nodes.len();
    if node_count == 0 || is_cooled(cache, config) {
        return false;
    }

    cache.alpha -= cache.alpha * config.alpha_decay.clamp(0.0, 1.0);
    let alpha = cache.alpha;

    let scratch = &mut cache.physics_scratch;
    scratch.forces.clear();
    scratch.forces.resize(node_count, Vec2::ZERO);
    scratch.positions.clear();
    scratch.radii.clear();
    scratch.charges.clear();
    let mut max_radius = 0.0_f32;
    for node in &cache.nodes {
        scratch.positions.push(node.world_pos);
        scratch.radii.push(node.base_radius);
        scratch.charges.push(node_charge(node.base_radius));
        max_radius = max_radius.max(node.base_radius);
    }

    let forces = &mut scratch.forces;
    let positions = &scratch.positions;
    let radii = &scratch.radii;
    let charges = &scratch.charges;

    let repulsion = RepulsionParams {
        strength: 78_000.0 * config.repulsion_scale.clamp(0.1, 4.0) * alpha,
        softening: REPULSION_SOFTENING,
        theta: BARNES_HUT_THETA,
    };
    let spring_strength = 0.05 * config.spring_scale.clamp(0.1, 3.0) * alpha;
    let spring_damping = 0.22;
    let center_pull = config.center_strength.clamp(0.0, 0.2) * alpha;
    let damping = config.velocity_damping.clamp(0.3, 0.99);
    let time_step_scale = (config.delta_seconds * 60.0).clamp(0.25, 3.0);
    let damping_factor = damping.powf(time_step_scale);

    if let Some(quadtree) = QuadNode::build(positions, charges) {
        for (index, force) in forces.iter_mut().enumerate() {
            accumulate_repulsion(&quadtree, index, positions, charges, repulsion, force);
        }

        let padding = 4.0;
        let max_collision_distance = max_radius * 2.0 + padding;
        if max_collision_distance > 0.0 {
            accumulate_collisions(
                &quadtree,
                &quadtree,
                true,
                positions,
                radii,
                CollisionParams {
                    strength: 0.9 * config.collision_scale.clamp(0.0, 3.0),
                    spacing: 1.0,
                    padding,
                    max_distance_sq: max_collision_distance * max_collision_distance,
                },
                forces,
            );
        }
    }

    let link_distance = config.link_distance.max(1.0);
    for edge in &cache.edges {
        let (from, to) = (edge.source, edge.target);
        if from >= node_count || to >= node_count || from == to {
            continue;
        }

        let delta = positions[from] - positions[to];
        let distance_sq = delta.length_sq();
        if distance_sq <= 0.0001 * 0.0001 {
            continue;
        }
        let distance = distance_sq.sqrt();
        let direction = delta / distance;

        let preferred = link_distance + radii[from] + radii[to];
        let spring = (distance - preferred) * spring_strength;
        let relative_velocity = cache.nodes[from].velocity - cache.nodes[to].velocity;
        let damping_force = relative_velocity.dot(direction) * spring_damping * alpha;
        let correction = direction * (spring + damping_force);

        forces[from] -= correction;
        forces[to] += correction;
    }

    for (force, position) in forces.iter_mut().zip(positions) {
        *force -= *position * center_pull;
    }

    let max_force = 255.0;
    let max_force_sq = max_force * max_force;
    let max_speed = 26.0;
    let max_speed_sq = max_speed * max_speed;
    let min_sleep_speed_sq = 0.02 * 0.02;
    let min_sleep_force_sq = 0.08 * 0.08;
    for (node, force_value) in cache.nodes.iter_mut().zip(forces.iter()) {
        let mut force = *force_value;
        let force_sq = force.length_sq();
        if !force_sq.is_finite() {
            continue;
        }
        if force_sq > max_force_sq {
            force *= max_force / force_sq.sqrt();
        }

        let mut velocity = (node.velocity + (force * (0.055 * time_step_scale))) * damping_factor;
        let speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= max_speed / speed_sq.sqrt();
        }

        if velocity.length_sq() < min_sleep_speed_sq && force_sq < min_sleep_force_sq {
            velocity = Vec2::ZERO;
        }

        node.velocity = velocity;
        node.world_pos += velocity * time_step_scale;
    }

    !is_cooled(cache, config)
}
