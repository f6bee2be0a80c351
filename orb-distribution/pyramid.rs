use orb_core::{PyramidConfig, Region};
use crate::types::ScaleLevel;

/// Border in pixels kept free of keypoints so the descriptor patch fits
pub const EDGE_THRESHOLD: i32 = 19;

/// Scale geometry and geometric feature budget of every pyramid level.
///
/// Level `i` is scaled by `scale_factor^i`. Its budget is
/// `n_features·(1 - 1/s) / (1 - (1/s)^levels)` shrunk by `1/s` per level and
/// rounded; the last level takes whatever remains of `n_features`.
pub fn generate_scale_levels(config: &PyramidConfig, width: usize, height: usize) -> Vec<ScaleLevel> {
    let n_levels = config.n_levels.max(1);
    let factor = 1.0 / config.scale_factor;
    let mut desired = config.n_features as f32 * (1.0 - factor) / (1.0 - factor.powi(n_levels as i32));

    let mut levels = Vec::with_capacity(n_levels);
    let mut scale = 1.0f32;
    let mut assigned = 0usize;

    for level in 0..n_levels {
        let n_features = if level + 1 == n_levels {
            config.n_features.saturating_sub(assigned)
        } else {
            let n = desired.round().max(0.0) as usize;
            assigned += n;
            desired *= factor;
            n
        };

        let sigma2 = scale * scale;
        levels.push(ScaleLevel {
            level,
            scale,
            inv_scale: 1.0 / scale,
            sigma2,
            inv_sigma2: 1.0 / sigma2,
            width: (width as f32 / scale).round() as usize,
            height: (height as f32 / scale).round() as usize,
            n_features,
        });
        scale *= config.scale_factor;
    }

    levels
}

impl ScaleLevel {
    /// Detection area of this level in level coordinates, `edge - 3` pixels in from each border
    pub fn detection_region(&self, edge_threshold: i32) -> Region {
        let min = edge_threshold - 3;
        Region::new(
            min,
            self.width as i32 - edge_threshold + 3,
            min,
            self.height as i32 - edge_threshold + 3,
        )
    }
}
