use orb_core::KeyPoint;

/// Static 2D range tree answering closed orthogonal box queries.
///
/// The primary structure is a balanced tree over the points in x order; every
/// node keeps the points of its subtree sorted by y so the second dimension is
/// resolved with two binary searches per canonical node.
#[derive(Debug)]
pub struct RangeTree {
    points: Vec<(f32, f32)>,
    /// Point indices sorted by (x, index)
    by_x: Vec<usize>,
    nodes: Vec<RangeNode>,
    root: Option<usize>,
}

#[derive(Debug)]
struct RangeNode {
    /// Covered slice `[lo, hi)` of `by_x`
    lo: usize,
    hi: usize,
    left: Option<usize>,
    right: Option<usize>,
    /// Point indices of the subtree sorted by (y, index)
    by_y: Vec<usize>,
}

impl RangeTree {
    pub fn build(keypoints: &[KeyPoint]) -> Self {
        let points: Vec<(f32, f32)> = keypoints.iter().map(|kp| (kp.x, kp.y)).collect();
        let mut by_x: Vec<usize> = (0..points.len()).collect();
        by_x.sort_by(|&a, &b| points[a].0.total_cmp(&points[b].0).then(a.cmp(&b)));

        let mut nodes = Vec::with_capacity(points.len().saturating_mul(2));
        let root = if points.is_empty() {
            None
        } else {
            Some(Self::build_recursive(&points, &by_x, 0, by_x.len(), &mut nodes))
        };

        Self { points, by_x, nodes, root }
    }

    fn build_recursive(
        points: &[(f32, f32)],
        by_x: &[usize],
        lo: usize,
        hi: usize,
        nodes: &mut Vec<RangeNode>,
    ) -> usize {
        let node_idx = nodes.len();
        nodes.push(RangeNode {
            lo,
            hi,
            left: None,
            right: None,
            by_y: Vec::new(),
        });

        let by_y = if hi - lo == 1 {
            vec![by_x[lo]]
        } else {
            let mid = lo + (hi - lo) / 2;
            let left = Self::build_recursive(points, by_x, lo, mid, nodes);
            let right = Self::build_recursive(points, by_x, mid, hi, nodes);
            nodes[node_idx].left = Some(left);
            nodes[node_idx].right = Some(right);
            merge_by_y(points, &nodes[left].by_y, &nodes[right].by_y)
        };
        nodes[node_idx].by_y = by_y;

        node_idx
    }

    /// Collect every point inside `[min_x, max_x] x [min_y, max_y]`.
    ///
    /// `out` is cleared first.
    pub fn query_into(&self, min_x: f32, max_x: f32, min_y: f32, max_y: f32, out: &mut Vec<usize>) {
        out.clear();
        let Some(root) = self.root else {
            return;
        };
        if min_x > max_x || min_y > max_y {
            return;
        }

        let lo = self.by_x.partition_point(|&i| self.points[i].0 < min_x);
        let hi = self.by_x.partition_point(|&i| self.points[i].0 <= max_x);
        if lo >= hi {
            return;
        }

        self.collect_canonical(root, lo, hi, min_y, max_y, out);
    }

    fn collect_canonical(&self, node_idx: usize, lo: usize, hi: usize, min_y: f32, max_y: f32, out: &mut Vec<usize>) {
        let node = &self.nodes[node_idx];
        if hi <= node.lo || node.hi <= lo {
            return;
        }

        if lo <= node.lo && node.hi <= hi {
            let start = node.by_y.partition_point(|&i| self.points[i].1 < min_y);
            let end = node.by_y.partition_point(|&i| self.points[i].1 <= max_y);
            if start < end {
                out.extend_from_slice(&node.by_y[start..end]);
            }
            return;
        }

        if let Some(left) = node.left {
            self.collect_canonical(left, lo, hi, min_y, max_y, out);
        }
        if let Some(right) = node.right {
            self.collect_canonical(right, lo, hi, min_y, max_y, out);
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn merge_by_y(points: &[(f32, f32)], left: &[usize], right: &[usize]) -> Vec<usize> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        let (a, b) = (left[i], right[j]);
        if points[a].1.total_cmp(&points[b].1).then(a.cmp(&b)).is_le() {
            merged.push(a);
            i += 1;
        } else {
            merged.push(b);
            j += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    merged
}
