use orb_core::KeyPoint;

/// A static 2D k-d tree over keypoint positions.
///
/// Points are identified by their index in the slice the tree was built from,
/// so query results stay valid however the caller moves its own containers.
/// The tree is built once per distribution call and dropped with it.
#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<(f32, f32)>,
    root: Option<usize>,
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Index into the points array
    point_idx: usize,
    left: Option<usize>,
    right: Option<usize>,
    /// Split dimension (0 = x, 1 = y)
    split_dim: usize,
}

impl KdTree {
    /// Build a k-d tree from keypoint positions using median splits.
    pub fn build(keypoints: &[KeyPoint]) -> Self {
        let points: Vec<(f32, f32)> = keypoints.iter().map(|kp| (kp.x, kp.y)).collect();
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());

        let root = Self::build_recursive(&points, &mut indices, 0, &mut nodes);

        Self { nodes, points, root }
    }

    fn build_recursive(
        points: &[(f32, f32)],
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<KdNode>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }

        let split_dim = depth % 2;
        let median = indices.len() / 2;
        indices.select_nth_unstable_by(median, |&a, &b| {
            coord(points[a], split_dim)
                .total_cmp(&coord(points[b], split_dim))
                .then(a.cmp(&b))
        });
        let point_idx = indices[median];

        let node_idx = nodes.len();
        nodes.push(KdNode {
            point_idx,
            left: None,
            right: None,
            split_dim,
        });

        let (left_indices, right_part) = indices.split_at_mut(median);
        let right_indices = &mut right_part[1..];

        let left = Self::build_recursive(points, left_indices, depth + 1, nodes);
        let right = Self::build_recursive(points, right_indices, depth + 1, nodes);

        nodes[node_idx].left = left;
        nodes[node_idx].right = right;

        Some(node_idx)
    }

    /// Collect every point whose squared distance to `query` is strictly below `radius²`.
    ///
    /// `out` is cleared first; results are in tree order.
    pub fn radius_indices_into(&self, query: (f32, f32), radius: f32, out: &mut Vec<usize>) {
        out.clear();
        if let Some(root) = self.root {
            let radius_sq = radius * radius;
            self.radius_search_recursive(root, query, radius_sq, out);
        }
    }

    fn radius_search_recursive(&self, node_idx: usize, query: (f32, f32), radius_sq: f32, out: &mut Vec<usize>) {
        let node = &self.nodes[node_idx];
        let point = self.points[node.point_idx];

        if distance_squared(query, point) < radius_sq {
            out.push(node.point_idx);
        }

        let diff = coord(query, node.split_dim) - coord(point, node.split_dim);
        let diff_sq = diff * diff;

        // Left subtree holds coordinates <= the split value, right holds >=
        if let Some(left) = node.left {
            if diff <= 0.0 || diff_sq < radius_sq {
                self.radius_search_recursive(left, query, radius_sq, out);
            }
        }
        if let Some(right) = node.right {
            if diff >= 0.0 || diff_sq < radius_sq {
                self.radius_search_recursive(right, query, radius_sq, out);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[inline]
fn coord(p: (f32, f32), dim: usize) -> f32 {
    if dim == 0 { p.0 } else { p.1 }
}

#[inline]
fn distance_squared(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx * dx + dy * dy
}
