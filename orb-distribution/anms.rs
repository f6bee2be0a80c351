use orb_core::{KeyPoint, Region};

use crate::kdtree::KdTree;
use crate::range_tree::RangeTree;
use crate::search::{binary_search_width, SearchBracket};
use crate::types::SuppressionOutcome;

/// Adaptive NMS with a circular neighbourhood, backed by a k-d tree.
///
/// `keypoints` must be sorted by descending response. Every accepted candidate
/// suppresses all not yet visited candidates closer than the trial radius, so the
/// returned points are pairwise at least `outcome.width` apart.
pub fn anms_kdtree(keypoints: &[KeyPoint], region: Region, n: usize, tolerance: f32) -> SuppressionOutcome {
    if n == 0 {
        return SuppressionOutcome::empty();
    }
    if keypoints.len() <= n {
        return SuppressionOutcome::passthrough(keypoints.to_vec());
    }

    let tree = KdTree::build(keypoints);
    let bracket = SearchBracket::initial(region.width(), region.height(), n, keypoints.len());
    let mut selected = vec![true; keypoints.len()];
    let mut neighbours = Vec::new();

    binary_search_width(keypoints, bracket, n, tolerance, |radius, accepted| {
        accepted.clear();
        selected.fill(true);
        for (i, kp) in keypoints.iter().enumerate() {
            if !selected[i] {
                continue;
            }
            selected[i] = false;
            accepted.push(i);

            tree.radius_indices_into((kp.x, kp.y), radius as f32, &mut neighbours);
            for &j in &neighbours {
                selected[j] = false;
            }
        }
    })
}

/// Adaptive NMS with a square `[x ± w] x [y ± w]` neighbourhood, backed by a 2D range tree.
///
/// `keypoints` must be sorted by descending response.
pub fn anms_range_tree(keypoints: &[KeyPoint], region: Region, n: usize, tolerance: f32) -> SuppressionOutcome {
    if n == 0 {
        return SuppressionOutcome::empty();
    }
    if keypoints.len() <= n {
        return SuppressionOutcome::passthrough(keypoints.to_vec());
    }

    let tree = RangeTree::build(keypoints);
    let bracket = SearchBracket::initial(region.width(), region.height(), n, keypoints.len());
    let mut selected = vec![true; keypoints.len()];
    let mut neighbours = Vec::new();

    binary_search_width(keypoints, bracket, n, tolerance, |width, accepted| {
        accepted.clear();
        selected.fill(true);
        let w = width as f32;
        for (i, kp) in keypoints.iter().enumerate() {
            if !selected[i] {
                continue;
            }
            selected[i] = false;
            accepted.push(i);

            tree.query_into(kp.x - w, kp.x + w, kp.y - w, kp.y + w, &mut neighbours);
            for &j in &neighbours {
                selected[j] = false;
            }
        }
    })
}
