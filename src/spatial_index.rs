//! Static 3D k-d tree for closed-ball radius queries.
//!
//! ## Design notes
//!
//! * **Arena layout**: nodes live in one `Vec` and reference children by
//!   position, so the whole tree is freed as a single allocation.
//! * **Median splitting**: balanced construction via `select_nth_unstable_by`,
//!   cycling the split axis x → y → z with depth.
//! * **Snapshot**: the tree copies the coordinates it was built from and is
//!   never mutated afterwards. It is `Send + Sync` and answers concurrent
//!   queries without locks.
//!
//! ## Invariants
//!
//! * Every point in a node's left subtree has `coord[axis] <= split`, every
//!   point in its right subtree has `coord[axis] >= split`.
//! * Radius queries are inclusive (`distance <= radius`), so an indexed point
//!   always finds itself for any `radius >= 0`.

use tracing::debug;

use crate::common::Point;

const NONE: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct KdNode {
    /// Index of the point stored at this node.
    point: usize,
    axis: u8,
    left: usize,
    right: usize,
}

#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<Point>,
    nodes: Vec<KdNode>,
    root: usize,
}

impl KdTree {
    /// Builds a balanced tree over `points`. Expected O(N log N).
    ///
    /// Duplicate points, fully degenerate inputs and empty inputs are all
    /// valid. An empty tree answers every query with an empty set.
    pub fn build(points: &[Point]) -> Self {
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());
        let root = build_recursive(points, &mut indices, 0, &mut nodes);

        debug!(points = points.len(), nodes = nodes.len(), "built kd-tree");

        Self {
            points: points.to_vec(),
            nodes,
            root,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Coordinates of indexed point `index` as captured at build time.
    pub fn point(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Indices of every indexed point within `radius` of `center`, boundary
    /// included. A negative or NaN radius matches nothing.
    pub fn radius_query(&self, center: Point, radius: f64) -> Vec<usize> {
        let mut out = Vec::new();
        self.radius_query_into(center, radius, &mut out);
        out
    }

    /// Like [`KdTree::radius_query`], but clears and refills `out` so callers
    /// can reuse one buffer across queries.
    pub fn radius_query_into(&self, center: Point, radius: f64, out: &mut Vec<usize>) {
        out.clear();
        if self.root == NONE || radius.is_nan() || radius < 0.0 {
            return;
        }

        let radius_squared = radius * radius;
        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            let p = &self.points[node.point];

            if p.distance_squared(&center) <= radius_squared {
                out.push(node.point);
            }

            let axis = node.axis as usize;
            let diff = center.axis(axis) - p.axis(axis);
            let (near, far) = if diff <= 0.0 {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };

            // Far side first so the near side is popped next.
            if far != NONE && diff * diff <= radius_squared {
                stack.push(far);
            }
            if near != NONE {
                stack.push(near);
            }
        }
    }
}

fn build_recursive(
    points: &[Point],
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> usize {
    if indices.is_empty() {
        return NONE;
    }

    let axis = depth % 3;
    let mid = indices.len() / 2;

    indices.select_nth_unstable_by(mid, |&a, &b| {
        points[a].axis(axis).total_cmp(&points[b].axis(axis))
    });

    let id = nodes.len();
    nodes.push(KdNode {
        point: indices[mid],
        axis: axis as u8,
        left: NONE,
        right: NONE,
    });

    let (left_indices, right_with_mid) = indices.split_at_mut(mid);
    let right_indices = &mut right_with_mid[1..];

    let left = build_recursive(points, left_indices, depth + 1, nodes);
    let right = build_recursive(points, right_indices, depth + 1, nodes);
    nodes[id].left = left;
    nodes[id].right = right;

    id
}
