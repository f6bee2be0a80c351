use orb_core::{KeyPoint, Region};

use crate::search::{tolerance_band, CoverageGrid};
use crate::types::SuppressionOutcome;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunables of variable-footprint square covering
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VsscParams {
    /// Starting footprint width in pixels, decremented until enough candidates survive
    pub initial_width: i32,
    /// Response mapped to the widest footprint
    pub response_offset: f32,
    /// Response span over which the footprint shrinks to its base width
    pub response_range: f32,
}

impl Default for VsscParams {
    fn default() -> Self {
        // FAST scores span roughly [7, 255]
        Self {
            initial_width: 6,
            response_offset: 7.0,
            response_range: 248.0,
        }
    }
}

impl VsscParams {
    /// Half-extent in pixels of the block a candidate marks at outer width `w`:
    /// `w/2 + (w/2)·(1 - (response - offset) / range) + 1`, at least 1.
    pub fn footprint(&self, w: i32, response: f32) -> i64 {
        let half = (w / 2) as f32;
        let shrink = 1.0 - (response - self.response_offset) / self.response_range;
        ((half + half * shrink + 1.0) as i64).max(1)
    }
}

/// Soft square covering with a response-dependent footprint.
///
/// Weak candidates mark (and are checked against) a wider block than strong ones.
/// A candidate survives only if its response strictly exceeds every cell of its
/// block; the block is marked either way. The outer width shrinks by one pixel per
/// pass until more than `n - n·ε` candidates survive. Passes stop accepting at `n`.
///
/// `keypoints` must be sorted by descending response.
pub fn vssc(
    keypoints: &[KeyPoint],
    region: Region,
    n: usize,
    tolerance: f32,
    threshold: f32,
    params: &VsscParams,
) -> SuppressionOutcome {
    if n == 0 || region.is_degenerate() {
        return SuppressionOutcome::empty();
    }
    if keypoints.len() <= n {
        return SuppressionOutcome::passthrough(keypoints.to_vec());
    }

    let (k_min, k_max) = tolerance_band(n, tolerance);
    let enough = n as f32 - n as f32 * tolerance;
    let (cols, rows) = (region.width() as usize, region.height() as usize);
    let (origin_x, origin_y) = (region.min_x as f32, region.min_y as f32);

    let mut w = params.initial_width.max(1);
    let mut accepted = Vec::with_capacity(n);
    let mut iterations = 0;

    loop {
        let mut grid = CoverageGrid::new(cols + 1, rows + 1);
        accepted.clear();

        for (i, kp) in keypoints.iter().enumerate() {
            let col = (kp.x - origin_x).floor() as i64;
            let row = (kp.y - origin_y).floor() as i64;

            if grid.covered(col, row) <= kp.response + threshold {
                let reach = params.footprint(w, kp.response);
                if grid.raise_block(col, row, reach, kp.response) {
                    accepted.push(i);
                }
            }
            if accepted.len() >= n {
                break;
            }
        }
        iterations += 1;
        log::trace!("vssc: pass {} width={} kept={}", iterations, w, accepted.len());

        if accepted.len() as f32 > enough || w <= 1 {
            break;
        }
        w -= 1;
    }

    let count = accepted.len();
    let converged = count >= k_min && count <= k_max;
    if !converged {
        log::debug!("vssc stopped at width {} with {} of target {}", w, count, n);
    }

    SuppressionOutcome {
        keypoints: accepted.iter().map(|&i| keypoints[i]).collect(),
        width: Some(w),
        converged,
        iterations,
        final_bracket: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naive::sort_by_response;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sorted_cloud(seed: u64, count: usize, region: Region) -> Vec<KeyPoint> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut kps: Vec<KeyPoint> = (0..count)
            .map(|_| {
                KeyPoint::new(
                    rng.random_range(region.min_x as f32..region.max_x as f32),
                    rng.random_range(region.min_y as f32..region.max_y as f32),
                    rng.random_range(7.0f32..255.0),
                    0,
                )
            })
            .collect();
        sort_by_response(&mut kps);
        kps
    }

    #[test]
    fn test_footprint_shrinks_with_response() {
        let params = VsscParams::default();
        assert_eq!(params.footprint(6, 7.0), 7);
        assert_eq!(params.footprint(6, 255.0), 4);
        assert!(params.footprint(6, 60.0) > params.footprint(6, 200.0));
        // Responses above the modelled range never collapse the block
        assert_eq!(params.footprint(2, 5000.0), 1);
    }

    #[test]
    fn test_dense_cloud_is_capped_at_target() {
        let region = Region::from_size(640, 480);
        let kps = sorted_cloud(77, 3000, region);
        let outcome = vssc(&kps, region, 250, 0.1, 0.0, &VsscParams::default());
        assert_eq!(outcome.keypoints.len(), 250);
        assert!(outcome.converged);
        assert_eq!(outcome.width, Some(6));
        assert_eq!(outcome.keypoints[0], kps[0]);
    }

    #[test]
    fn test_width_shrinks_for_crowded_cluster() {
        // 60 points packed in a 16x16 patch: a wide footprint keeps only a few
        let region = Region::from_size(100, 100);
        let mut rng = StdRng::seed_from_u64(4);
        let mut kps: Vec<KeyPoint> = (0..60)
            .map(|_| {
                KeyPoint::new(
                    rng.random_range(40.0f32..56.0),
                    rng.random_range(40.0f32..56.0),
                    rng.random_range(7.0f32..255.0),
                    0,
                )
            })
            .collect();
        sort_by_response(&mut kps);

        let outcome = vssc(&kps, region, 20, 0.1, 0.0, &VsscParams::default());
        assert!(outcome.iterations > 1);
        assert!(outcome.width.unwrap() < 6);
        assert!(outcome.keypoints.len() <= 20);
    }

    #[test]
    fn test_coincident_points_terminate() {
        let region = Region::from_size(32, 32);
        let kps: Vec<KeyPoint> = (0..30).map(|i| KeyPoint::new(16.0, 16.0, 200.0 - i as f32, 0)).collect();
        let outcome = vssc(&kps, region, 10, 0.1, 0.0, &VsscParams::default());
        assert_eq!(outcome.keypoints.len(), 1);
        assert_eq!(outcome.width, Some(1));
        assert!(!outcome.converged);
    }

    #[test]
    fn test_offset_region() {
        let region = Region::new(200, 264, 100, 164);
        let kps = sorted_cloud(9, 400, region);
        let outcome = vssc(&kps, region, 30, 0.1, 0.0, &VsscParams::default());
        assert!(outcome.keypoints.len() <= 30);
        assert!(outcome.keypoints.iter().all(|kp| region.contains(kp.x, kp.y)));
    }
}
