use eframe::egui::{Vec2, vec2};

use super::super::render_utils::is_finite_vec;

const QUADTREE_LEAF_CAPACITY: usize = 8;
const QUADTREE_MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    /// `None` when `points` is empty or holds any non-finite coordinate.
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            if !is_finite_vec(*point) {
                return None;
            }
            min = min.min(*point);
            max = max.max(*point);
        }

        if !(is_finite_vec(min) && is_finite_vec(max)) {
            return None;
        }

        let span = (max - min).max(vec2(1.0, 1.0));
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span.x.max(span.y) * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign_x = if quadrant & 1 == 0 { -1.0 } else { 1.0 };
        let sign_y = if quadrant & 2 == 0 { -1.0 } else { 1.0 };
        Self {
            center: self.center + vec2(sign_x * quarter, sign_y * quarter),
            half_extent: quarter,
        }
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let dx = ((self.center.x - other.center.x).abs() - reach).max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - reach).max(0.0);
        dx * dx + dy * dy
    }
}

/// Barnes-Hut cell. `charge` is the summed repulsive weight of the contained nodes and
/// `center_of_charge` their weighted centroid.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_charge: Vec2,
    pub(super) charge: f32,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

pub(in crate::app) struct QuadtreeCell {
    pub center: Vec2,
    pub half_extent: f32,
    pub depth: usize,
    pub is_leaf: bool,
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2], charges: &[f32]) -> Option<Self> {
        let bounds = QuadBounds::enclosing(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::subdivide(bounds, indices, positions, charges, 0))
    }

    fn subdivide(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Vec2],
        charges: &[f32],
        depth: usize,
    ) -> Self {
        let mut charge = 0.0;
        let mut weighted = Vec2::ZERO;
        for &index in &indices {
            let weight = charges.get(index).copied().unwrap_or(1.0);
            charge += weight;
            weighted += positions[index] * weight;
        }
        let center_of_charge = if charge > 0.0 {
            weighted / charge
        } else {
            bounds.center
        };

        let mut node = Self {
            bounds,
            center_of_charge,
            charge,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= QUADTREE_MAX_DEPTH || node.indices.len() <= QUADTREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
        for &index in &node.indices {
            buckets[bounds.quadrant_of(positions[index])].push(index);
        }

        // Coincident points cannot be separated by further splitting.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                node.children[quadrant] = Some(Box::new(Self::subdivide(
                    bounds.quadrant(quadrant),
                    bucket,
                    positions,
                    charges,
                    depth + 1,
                )));
            }
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &QuadNode> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}

pub(super) fn collect_quadtree_cells(node: &QuadNode, depth: usize, cells: &mut Vec<QuadtreeCell>) {
    cells.push(QuadtreeCell {
        center: node.bounds.center,
        half_extent: node.bounds.half_extent,
        depth,
        is_leaf: node.is_leaf(),
    });

    for child in node.children() {
        collect_quadtree_cells(child, depth + 1, cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_indices(node: &QuadNode, out: &mut Vec<usize>) {
        if node.is_leaf() {
            out.extend(node.indices.iter().copied());
        }
        for child in node.children() {
            leaf_indices(child, out);
        }
    }

    #[test]
    fn every_point_lands_in_exactly_one_leaf() {
        let positions = (0..60)
            .map(|index| vec2((index % 8) as f32 * 13.0, (index / 8) as f32 * 7.0))
            .collect::<Vec<_>>();
        let charges = vec![1.0; positions.len()];
        let tree = QuadNode::build(&positions, &charges).expect("finite points build a tree");

        let mut indices = Vec::new();
        leaf_indices(&tree, &mut indices);
        indices.sort_unstable();
        assert_eq!(indices, (0..60).collect::<Vec<_>>());
        assert!((tree.charge - 60.0).abs() < 1e-3);
        for (index, position) in positions.iter().enumerate() {
            assert!(tree.bounds.contains(*position), "point {index} outside root");
        }
    }

    #[test]
    fn center_of_charge_is_weighted() {
        let positions = [vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadNode::build(&positions, &[1.0, 3.0]).expect("tree");
        assert!((tree.center_of_charge.x - 7.5).abs() < 1e-4);
    }

    #[test]
    fn non_finite_points_produce_no_tree() {
        let positions = [vec2(0.0, 0.0), vec2(f32::NAN, 1.0)];
        assert!(QuadNode::build(&positions, &[1.0, 1.0]).is_none());

        let positions = [vec2(f32::INFINITY, 0.0), vec2(3.0, 4.0)];
        assert!(QuadNode::build(&positions, &[1.0, 1.0]).is_none());
        assert!(QuadNode::build(&[], &[]).is_none());
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![vec2(5.0, 5.0); 40];
        let tree = QuadNode::build(&positions, &vec![1.0; 40]).expect("tree");
        assert!(tree.is_leaf());
        assert_eq!(tree.indices.len(), 40);
    }
}
