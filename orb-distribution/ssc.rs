use orb_core::{KeyPoint, Region};

use crate::search::{binary_search_width, CoverageGrid, SearchBracket};
use crate::types::SuppressionOutcome;

/// Coordinate frame of a square-covering run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SscFrame {
    /// Candidates live in `region`; grid cells are measured from its minimum corner
    Bounded(Region),
    /// Candidates are already relative to the origin of a `cols x rows` area
    Flattened { cols: i32, rows: i32 },
}

impl SscFrame {
    fn extent(&self) -> (i32, i32) {
        match *self {
            SscFrame::Bounded(region) => (region.width(), region.height()),
            SscFrame::Flattened { cols, rows } => (cols, rows),
        }
    }

    fn origin(&self) -> (f32, f32) {
        match *self {
            SscFrame::Bounded(region) => (region.min_x as f32, region.min_y as f32),
            SscFrame::Flattened { .. } => (0.0, 0.0),
        }
    }
}

/// One suppression pass at a fixed `width`.
///
/// Cells are `width / 2` wide and an accepted candidate raises every cell within
/// `width` of its own to its response. A candidate is accepted while its cell's
/// high-water mark stays below `response + threshold`.
pub(crate) fn covering_trial(
    keypoints: &[KeyPoint],
    frame: SscFrame,
    width: i32,
    threshold: f32,
    accepted: &mut Vec<usize>,
) {
    accepted.clear();
    let (cols, rows) = frame.extent();
    let (origin_x, origin_y) = frame.origin();

    let cell = f64::from(width.max(1)) / 2.0;
    let cell_cols = (f64::from(cols.max(0)) / cell).floor() as usize;
    let cell_rows = (f64::from(rows.max(0)) / cell).floor() as usize;
    let reach = (f64::from(width.max(1)) / cell) as i64;
    let mut grid = CoverageGrid::new(cell_cols + 1, cell_rows + 1);

    for (i, kp) in keypoints.iter().enumerate() {
        let col = ((kp.x - origin_x) as f64 / cell).floor() as i64;
        let row = ((kp.y - origin_y) as f64 / cell).floor() as i64;

        if grid.covered(col, row) < kp.response + threshold {
            accepted.push(i);
            grid.raise_block(col, row, reach, kp.response);
        }
    }
}

fn covering_search(
    keypoints: &[KeyPoint],
    frame: SscFrame,
    n: usize,
    tolerance: f32,
    threshold: f32,
) -> SuppressionOutcome {
    if n == 0 {
        return SuppressionOutcome::empty();
    }
    if keypoints.len() <= n {
        return SuppressionOutcome::passthrough(keypoints.to_vec());
    }

    let (cols, rows) = frame.extent();
    let bracket = SearchBracket::initial(cols, rows, n, keypoints.len());
    binary_search_width(keypoints, bracket, n, tolerance, |width, accepted| {
        covering_trial(keypoints, frame, width, threshold, accepted)
    })
}

/// Suppression via square covering. `keypoints` must be sorted by descending response.
pub fn ssc(keypoints: &[KeyPoint], region: Region, n: usize, tolerance: f32) -> SuppressionOutcome {
    covering_search(keypoints, SscFrame::Bounded(region), n, tolerance, 0.0)
}

/// Square covering where a candidate within `threshold` of the strongest response
/// covering its cell still survives.
///
/// `keypoints` must be sorted by descending response.
pub fn soft_ssc(keypoints: &[KeyPoint], frame: SscFrame, n: usize, tolerance: f32, threshold: f32) -> SuppressionOutcome {
    covering_search(keypoints, frame, n, tolerance, threshold)
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
                    rng.random_range(10.0f32..250.0),
                    0,
                )
            })
            .collect();
        sort_by_response(&mut kps);
        kps
    }

    fn trial(kps: &[KeyPoint], frame: SscFrame, width: i32, threshold: f32) -> Vec<usize> {
        let mut out = Vec::new();
        covering_trial(kps, frame, width, threshold, &mut out);
        out
    }

    #[test]
    fn test_hard_covering_suppresses_neighbours() {
        let kps = vec![
            KeyPoint::new(20.0, 20.0, 100.0, 0),
            KeyPoint::new(22.0, 21.0, 99.5, 0),
            KeyPoint::new(60.0, 60.0, 50.0, 0),
        ];
        let frame = SscFrame::Bounded(Region::from_size(100, 100));
        assert_eq!(trial(&kps, frame, 8, 0.0), vec![0, 2]);
    }

    #[test]
    fn test_soft_threshold_keeps_near_ties() {
        let kps = vec![
            KeyPoint::new(20.0, 20.0, 100.0, 0),
            KeyPoint::new(22.0, 21.0, 99.5, 0),
            KeyPoint::new(23.0, 22.0, 80.0, 0),
        ];
        let frame = SscFrame::Bounded(Region::from_size(100, 100));
        assert_eq!(trial(&kps, frame, 8, 1.0), vec![0, 1]);
        assert_eq!(trial(&kps, frame, 8, 25.0), vec![0, 1, 2]);
    }

    #[test]
    fn test_flattened_frame_matches_bounded() {
        let region = Region::new(100, 420, 50, 290);
        let kps = sorted_cloud(4, 600, region);
        let shifted: Vec<KeyPoint> = kps
            .iter()
            .map(|kp| KeyPoint::new(kp.x - 100.0, kp.y - 50.0, kp.response, kp.level))
            .collect();

        let bounded = soft_ssc(&kps, SscFrame::Bounded(region), 80, 0.1, 2.0);
        let flattened = soft_ssc(&shifted, SscFrame::Flattened { cols: 320, rows: 240 }, 80, 0.1, 2.0);

        assert_eq!(bounded.keypoints.len(), flattened.keypoints.len());
        assert_eq!(bounded.width, flattened.width);
    }

    #[test]
    fn test_ssc_hits_tolerance_band() {
        let region = Region::from_size(640, 480);
        let kps = sorted_cloud(31, 2000, region);
        let outcome = ssc(&kps, region, 200, 0.1);
        let count = outcome.keypoints.len();
        assert!((180..=220).contains(&count), "count = {}", count);
        assert!(outcome.converged);
    }

    #[test]
    fn test_soft_ssc_hits_tolerance_band() {
        let region = Region::new(16, 656, 16, 496);
        let kps = sorted_cloud(31, 2000, region);
        let outcome = soft_ssc(&kps, SscFrame::Bounded(region), 200, 0.1, 3.0);
        let count = outcome.keypoints.len();
        assert!((160..=240).contains(&count), "count = {}", count);
        assert!(outcome.converged || outcome.search_exhausted());
    }

    #[test]
    fn test_soft_ssc_keeps_response_order() {
        let region = Region::from_size(320, 240);
        let kps = sorted_cloud(6, 900, region);
        let outcome = soft_ssc(&kps, SscFrame::Bounded(region), 120, 0.1, 5.0);
        assert!(outcome.keypoints.windows(2).all(|w| w[0].response >= w[1].response));
        assert_eq!(outcome.keypoints[0], kps[0]);
    }

    #[test]
    fn test_points_outside_frame_are_clamped() {
        let kps = vec![KeyPoint::new(-5.0, 300.0, 10.0, 0), KeyPoint::new(400.0, -2.0, 9.0, 0)];
        let frame = SscFrame::Bounded(Region::from_size(64, 64));
        assert_eq!(trial(&kps, frame, 4, 0.0), vec![0, 1]);
    }

    #[test]
    fn test_zero_target_and_passthrough() {
        let region = Region::from_size(64, 64);
        let kps = sorted_cloud(2, 12, region);
        assert!(ssc(&kps, region, 0, 0.1).keypoints.is_empty());
        assert_eq!(ssc(&kps, region, 12, 0.1).keypoints, kps);
    }
}
