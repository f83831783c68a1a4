use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) spacing: f32,
    pub(super) padding: f32,
    pub(super) max_distance_sq: f32,
}

/// Unit vector used when two nodes sit on top of each other.
fn separation_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

pub(super) fn accumulate_repulsion(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    charges: &[f32],
    params: RepulsionParams,
    force: &mut Vec2,
) {
    if node.charge <= 0.0 {
        return;
    }

    let point = positions[index];
    let own_charge = charges[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            let delta = point - positions[other];
            let distance_sq = delta.length_sq();
            let direction = if distance_sq > 1e-8 {
                delta / distance_sq.sqrt()
            } else {
                separation_direction(index, other)
            };
            *force += direction
                * (params.strength * own_charge * charges[other] / (distance_sq + params.softening));
        }
        return;
    }

    let delta = point - node.center_of_charge;
    let distance_sq = delta.length_sq().max(1e-4);
    let distance = distance_sq.sqrt();
    let far_enough = !node.bounds.contains(point) && node.bounds.side_length() / distance < params.theta;

    if far_enough {
        *force += (delta / distance)
            * (params.strength * own_charge * node.charge / (distance_sq + params.softening));
        return;
    }

    for child in node.children() {
        accumulate_repulsion(child, index, positions, charges, params, force);
    }
}

fn collide_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    let min_distance = (radii[from] + radii[to]) * params.spacing + params.padding;
    if distance >= min_distance {
        return;
    }

    let direction = if distance > 1e-4 {
        delta / distance
    } else {
        separation_direction(from, to)
    };
    let push = direction * ((min_distance - distance) * params.strength);
    forces[from] += push;
    forces[to] -= push;
}

/// Dual-tree traversal that only visits cell pairs close enough to overlap.
pub(super) fn accumulate_collisions(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    if node_a.bounds.gap_sq(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    collide_pair(from, to, positions, radii, params, forces);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    collide_pair(from, to, positions, radii, params, forces);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (offset, child_a) in children.iter().enumerate() {
            accumulate_collisions(child_a, child_a, true, positions, radii, params, forces);
            for child_b in &children[offset + 1..] {
                accumulate_collisions(child_a, child_b, false, positions, radii, params, forces);
            }
        }
        return;
    }

    let split_a = !node_a.is_leaf()
        && (node_b.is_leaf() || node_a.bounds.half_extent >= node_b.bounds.half_extent);

    if split_a {
        for child in node_a.children() {
            accumulate_collisions(child, node_b, false, positions, radii, params, forces);
        }
    } else {
        for child in node_b.children() {
            accumulate_collisions(node_a, child, false, positions, radii, params, forces);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPULSION: RepulsionParams = RepulsionParams {
        strength: 1000.0,
        softening: 1.0,
        theta: 0.7,
    };

    #[test]
    fn repulsion_pushes_nodes_apart() {
        let positions = [vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let charges = [1.0, 1.0];
        let tree = QuadNode::build(&positions, &charges).expect("tree");

        let mut left = Vec2::ZERO;
        let mut right = Vec2::ZERO;
        accumulate_repulsion(&tree, 0, &positions, &charges, REPULSION, &mut left);
        accumulate_repulsion(&tree, 1, &positions, &charges, REPULSION, &mut right);

        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert!((left.x + right.x).abs() < 1e-3);
    }

    #[test]
    fn approximation_matches_exact_sum_for_distant_cluster() {
        let mut positions = vec![vec2(0.0, 0.0)];
        positions.extend((0..40).map(|index| vec2(5000.0 + (index % 7) as f32, (index / 7) as f32)));
        let charges = vec![1.0; positions.len()];
        let tree = QuadNode::build(&positions, &charges).expect("tree");

        let mut approximated = Vec2::ZERO;
        accumulate_repulsion(&tree, 0, &positions, &charges, REPULSION, &mut approximated);

        let exact = positions[1..].iter().fold(Vec2::ZERO, |sum, other| {
            let delta = positions[0] - *other;
            let distance_sq = delta.length_sq();
            sum + delta / distance_sq.sqrt() * (REPULSION.strength / (distance_sq + REPULSION.softening))
        });

        assert!((approximated - exact).length() <= exact.length() * 0.05);
    }

    #[test]
    fn collisions_only_push_overlapping_pairs() {
        let positions = [vec2(0.0, 0.0), vec2(5.0, 0.0), vec2(500.0, 0.0)];
        let radii = [5.0, 5.0, 5.0];
        let params = CollisionParams {
            strength: 1.0,
            spacing: 1.0,
            padding: 0.0,
            max_distance_sq: 100.0,
        };
        let tree = QuadNode::build(&positions, &[1.0; 3]).expect("tree");
        let mut forces = vec![Vec2::ZERO; 3];

        accumulate_collisions(&tree, &tree, true, &positions, &radii, params, &mut forces);

        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
        assert_eq!(forces[2], Vec2::ZERO);
    }
}
