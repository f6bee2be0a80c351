use orb_core::{KeyPoint, Region};

use crate::anms::{anms_kdtree, anms_range_tree};
use crate::config::DistributionConfig;
use crate::grid::{distribute_grid, DEFAULT_GRID_CELL_SIZE};
use crate::naive::{retain_best, sort_by_response};
use crate::quadtree::distribute_quadtree;
use crate::ranms::ranms;
use crate::ssc::{soft_ssc, ssc, SscFrame};
use crate::types::Strategy;
use crate::vssc::{vssc, VsscParams};

/// Reduce `keypoints` to a spatially balanced subset of about `n`.
///
/// Inputs of at most `n` keypoints come back unchanged and `n == 0` yields an
/// empty set, whatever the strategy. Otherwise a zero-area region yields an
/// empty set for every strategy but `KeepAll`. Strategies that scan in response
/// order get a stable descending sort first. Default grid cell size and VSSC tunables apply;
/// see [`distribute_with`] to override them.
pub fn distribute(
    keypoints: Vec<KeyPoint>,
    region: Region,
    n: usize,
    strategy: Strategy,
    tolerance: f32,
    soft_threshold: f32,
) -> Vec<KeyPoint> {
    dispatch(
        keypoints,
        region,
        n,
        strategy,
        tolerance,
        soft_threshold,
        DEFAULT_GRID_CELL_SIZE,
        &VsscParams::default(),
    )
}

/// [`distribute`] driven by every tunable of `config`
pub fn distribute_with(keypoints: Vec<KeyPoint>, region: Region, n: usize, config: &DistributionConfig) -> Vec<KeyPoint> {
    dispatch(
        keypoints,
        region,
        n,
        config.strategy,
        config.tolerance,
        config.soft_threshold,
        config.grid_cell_size,
        &config.vssc,
    )
}

#[allow(clippy::too_many_arguments)]
fn dispatch(
    mut keypoints: Vec<KeyPoint>,
    region: Region,
    n: usize,
    strategy: Strategy,
    tolerance: f32,
    soft_threshold: f32,
    cell_size: usize,
    vssc_params: &VsscParams,
) -> Vec<KeyPoint> {
    let input_count = keypoints.len();
    if input_count <= n {
        return keypoints;
    }
    if n == 0 {
        return Vec::new();
    }

    let degenerate = region.is_degenerate();
    if strategy.requires_sorted_input() && !degenerate {
        sort_by_response(&mut keypoints);
    }

    let result = match strategy {
        Strategy::KeepAll => keypoints,
        _ if degenerate => {
            log::debug!("degenerate region {:?}, dropping all {} keypoints", region, input_count);
            Vec::new()
        }
        Strategy::Naive => {
            retain_best(&mut keypoints, n);
            keypoints
        }
        Strategy::Grid => distribute_grid(keypoints, region, n, cell_size),
        Strategy::QuadtreeOrbSlam => distribute_quadtree(keypoints, region, n),
        Strategy::AnmsKdTree => anms_kdtree(&keypoints, region, n, tolerance).keypoints,
        Strategy::AnmsRangeTree => anms_range_tree(&keypoints, region, n, tolerance).keypoints,
        Strategy::Ssc => ssc(&keypoints, region, n, tolerance).keypoints,
        Strategy::SoftSsc => soft_ssc(&keypoints, SscFrame::Bounded(region), n, tolerance, soft_threshold).keypoints,
        Strategy::Ranms => ranms(keypoints, region, n, tolerance, soft_threshold, cell_size),
        Strategy::Vssc => vssc(&keypoints, region, n, tolerance, soft_threshold, vssc_params).keypoints,
    };

    log::debug!(
        "{}: {} -> {} keypoints (target {})",
        strategy,
        input_count,
        result.len(),
        n
    );
    result
}
