use orb_core::{KeyPoint, Region};

/// Rectangle of the adaptive quadtree together with the candidates it owns.
///
/// Corners are in absolute region coordinates. A node holding exactly one
/// candidate is a leaf and is never divided again.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadNode {
    pub ul: (i32, i32),
    pub ur: (i32, i32),
    pub ll: (i32, i32),
    pub lr: (i32, i32),
    pub keypoints: Vec<KeyPoint>,
    pub leaf: bool,
}

impl QuadNode {
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32, keypoints: Vec<KeyPoint>) -> Self {
        let leaf = keypoints.len() == 1;
        Self {
            ul: (min_x, min_y),
            ur: (max_x, min_y),
            ll: (min_x, max_y),
            lr: (max_x, max_y),
            keypoints,
            leaf,
        }
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Split at the (rounded up) midpoint into upper-left, upper-right,
    /// lower-left and lower-right children.
    ///
    /// Candidates move into exactly one child; a coordinate equal to the midpoint
    /// goes right/down. Children may be empty.
    pub fn divide(self) -> [QuadNode; 4] {
        let mid_x = self.ul.0 + ((self.ur.0 - self.ul.0) as f32 / 2.0).ceil() as i32;
        let mid_y = self.ul.1 + ((self.ll.1 - self.ul.1) as f32 / 2.0).ceil() as i32;

        let mut buckets: [Vec<KeyPoint>; 4] = Default::default();
        for kp in self.keypoints {
            let col = if kp.x < mid_x as f32 { 0 } else { 1 };
            let row = if kp.y < mid_y as f32 { 0 } else { 2 };
            buckets[row + col].push(kp);
        }
        let [upper_left, upper_right, lower_left, lower_right] = buckets;

        let (x0, x1, y0, y1) = (self.ul.0, self.ur.0, self.ul.1, self.ll.1);
        [
            QuadNode::new(x0, mid_x, y0, mid_y, upper_left),
            QuadNode::new(mid_x, x1, y0, mid_y, upper_right),
            QuadNode::new(x0, mid_x, mid_y, y1, lower_left),
            QuadNode::new(mid_x, x1, mid_y, y1, lower_right),
        ]
    }

    /// Whether dividing can still separate candidates: at least two of them, not
    /// all at one position, in a rectangle wider or taller than one pixel
    pub fn can_divide(&self) -> bool {
        let Some(first) = self.keypoints.first() else {
            return false;
        };
        let wide = self.ur.0 - self.ul.0 > 1 || self.ll.1 - self.ul.1 > 1;
        !self.leaf && wide && self.keypoints.iter().any(|kp| kp.x != first.x || kp.y != first.y)
    }

    /// The sole candidate of a leaf, otherwise the highest response (first one on ties)
    pub fn representative(&self) -> Option<KeyPoint> {
        let mut best = self.keypoints.first()?;
        for kp in &self.keypoints[1..] {
            if kp.response > best.response {
                best = kp;
            }
        }
        Some(*best)
    }
}

/// Arena of quadtree nodes.
///
/// Divided nodes leave an empty slot behind so slot indices held in expansion
/// worklists stay valid while the tree grows.
#[derive(Debug, Default)]
pub struct QuadTree {
    slots: Vec<Option<QuadNode>>,
    live: usize,
}

impl QuadTree {
    /// Seed the tree with `round(width / height)` full-height strips (at least one).
    /// Empty strips are dropped.
    pub fn seed(keypoints: Vec<KeyPoint>, region: Region) -> Self {
        let mut tree = Self::default();
        if region.is_degenerate() {
            return tree;
        }

        let n_roots = ((region.width() as f32 / region.height() as f32).round() as usize).max(1);
        let strip_width = region.width() as f32 / n_roots as f32;

        let mut strips = vec![Vec::new(); n_roots];
        for kp in keypoints {
            let offset = ((kp.x - region.min_x as f32) / strip_width).floor();
            let idx = if offset > 0.0 { (offset as usize).min(n_roots - 1) } else { 0 };
            strips[idx].push(kp);
        }

        for (i, strip) in strips.into_iter().enumerate() {
            let x0 = region.min_x + (strip_width * i as f32) as i32;
            let x1 = region.min_x + (strip_width * (i + 1) as f32) as i32;
            tree.insert(QuadNode::new(x0, x1, region.min_y, region.max_y, strip));
        }
        tree
    }

    /// Grow the tree until it holds at least `n` nodes or no node can be divided.
    ///
    /// Full passes divide every dividable node. A pass that leaves the node count
    /// unchanged (all candidates of a node in one quadrant) does not stop the
    /// growth. Once a full pass would overshoot `n` the nodes created by the
    /// previous pass are divided largest first, stopping as soon as `n` is reached.
    pub fn expand(&mut self, n: usize) {
        let mut passes = 0;
        loop {
            let pending = self.dividable_slots();
            if pending.is_empty() {
                break;
            }
            let mut to_expand = Vec::new();
            for idx in pending {
                self.split(idx, &mut to_expand);
            }
            passes += 1;

            // Every node still dividable was created by this pass
            if self.len() >= n || to_expand.is_empty() {
                break;
            }

            if self.len() + to_expand.len() * 3 > n {
                self.expand_largest_first(n, to_expand);
                break;
            }
        }
        log::trace!("quadtree: {} nodes after {} full passes (target {})", self.len(), passes, n);
    }

    fn expand_largest_first(&mut self, n: usize, mut to_expand: Vec<usize>) {
        while !to_expand.is_empty() {
            let mut previous = std::mem::take(&mut to_expand);
            previous.sort_by_key(|&idx| std::cmp::Reverse(self.node_len(idx)));

            for idx in previous {
                self.split(idx, &mut to_expand);
                if self.len() >= n {
                    return;
                }
            }
        }
    }

    /// Replace the node in `idx` by its non-empty children; dividable children are
    /// queued on `to_expand`.
    fn split(&mut self, idx: usize, to_expand: &mut Vec<usize>) {
        let Some(node) = self.slots.get_mut(idx).and_then(Option::take) else {
            return;
        };
        self.live -= 1;
        for child in node.divide() {
            if let Some(child_idx) = self.insert(child) {
                if self.slots[child_idx].as_ref().is_some_and(QuadNode::can_divide) {
                    to_expand.push(child_idx);
                }
            }
        }
    }

    fn insert(&mut self, node: QuadNode) -> Option<usize> {
        if node.is_empty() {
            return None;
        }
        self.slots.push(Some(node));
        self.live += 1;
        Some(self.slots.len() - 1)
    }

    fn node_len(&self, idx: usize) -> usize {
        self.slots[idx].as_ref().map_or(0, QuadNode::len)
    }

    fn dividable_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.as_ref().is_some_and(QuadNode::can_divide))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn nodes(&self) -> impl Iterator<Item = &QuadNode> {
        self.slots.iter().flatten()
    }

    /// One candidate per live node, in node creation order
    pub fn into_representatives(self) -> Vec<KeyPoint> {
        self.nodes().filter_map(QuadNode::representative).collect()
    }
}

/// ORB-SLAM style quadtree distribution: one candidate per node of an adaptive
/// subdivision grown towards `n` nodes.
///
/// May return somewhat more than `n` candidates when the last pass overshoots, and
/// fewer when candidates cannot be separated any further.
pub fn distribute_quadtree(keypoints: Vec<KeyPoint>, region: Region, n: usize) -> Vec<KeyPoint> {
    if n == 0 || keypoints.is_empty() || region.is_degenerate() {
        return Vec::new();
    }

    let mut tree = QuadTree::seed(keypoints, region);
    tree.expand(n);
    tree.into_representatives()
}
