use orb_core::{KeyPoint, Region};
use crate::naive::retain_best;

/// Default edge length of a bucketing cell in pixels
pub const DEFAULT_GRID_CELL_SIZE: usize = 40;

/// Partition of a region into equally sized bucketing cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLayout {
    origin: (i32, i32),
    cols: usize,
    rows: usize,
    cell_width: i32,
    cell_height: i32,
}

impl CellLayout {
    /// Lay out cells of roughly `cell_size` pixels, clamped so at least one cell fits.
    /// Returns `None` for degenerate regions.
    pub fn new(region: Region, cell_size: usize) -> Option<Self> {
        if region.is_degenerate() {
            return None;
        }
        let width = region.width() as f32;
        let height = region.height() as f32;
        let cell = (cell_size.max(1) as f32).min(width.min(height)).max(1.0) as i32;

        let cols = ((width / cell as f32) as usize).max(1);
        let rows = ((height / cell as f32) as usize).max(1);
        let cell_width = (width / cols as f32).ceil() as i32;
        let cell_height = (height / rows as f32).ceil() as i32;

        Some(Self {
            origin: (region.min_x, region.min_y),
            cols,
            rows,
            cell_width,
            cell_height,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Cell containing `kp`; indices past the far edges fold into the last row/column.
    pub fn cell_of(&self, kp: &KeyPoint) -> usize {
        let col = axis_cell(kp.x - self.origin.0 as f32, self.cell_width, self.cols);
        let row = axis_cell(kp.y - self.origin.1 as f32, self.cell_height, self.rows);
        row * self.cols + col
    }

    /// Sub-rectangle covered by cell `idx`
    pub fn cell_region(&self, idx: usize) -> Region {
        let min_x = self.origin.0 + (idx % self.cols) as i32 * self.cell_width;
        let min_y = self.origin.1 + (idx / self.cols) as i32 * self.cell_height;
        Region::new(min_x, min_x + self.cell_width, min_y, min_y + self.cell_height)
    }

    /// Move every keypoint into its cell, keeping input order within cells.
    pub fn bucket(&self, keypoints: Vec<KeyPoint>) -> Vec<Vec<KeyPoint>> {
        let mut cells = vec![Vec::new(); self.cell_count()];
        for kp in keypoints {
            cells[self.cell_of(&kp)].push(kp);
        }
        cells
    }
}

fn axis_cell(offset: f32, cell_extent: i32, count: usize) -> usize {
    let idx = (offset / cell_extent as f32).floor();
    if idx.is_nan() || idx < 0.0 {
        0
    } else {
        (idx as usize).min(count - 1)
    }
}

/// Grid bucketing: every cell keeps its own top `n / cells` keypoints.
///
/// The per-cell quota uses integer division, so the total may fall short of `n`.
pub fn distribute_grid(keypoints: Vec<KeyPoint>, region: Region, n: usize, cell_size: usize) -> Vec<KeyPoint> {
    let Some(layout) = CellLayout::new(region, cell_size) else {
        return Vec::new();
    };

    let n_per_cell = n / layout.cell_count();
    log::trace!(
        "grid: {}x{} cells, {} keypoints per cell",
        layout.cols,
        layout.rows,
        n_per_cell
    );

    let mut result = Vec::with_capacity(n);
    for mut cell in layout.bucket(keypoints) {
        retain_best(&mut cell, n_per_cell);
        result.extend(cell);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_grid(region: Region, step: f32) -> Vec<KeyPoint> {
        let mut kps = Vec::new();
        let mut y = region.min_y as f32 + step / 2.0;
        let mut i = 0;
        while y < region.max_y as f32 {
            let mut x = region.min_x as f32 + step / 2.0;
            while x < region.max_x as f32 {
                kps.push(KeyPoint::new(x, y, (i * 37 % 101) as f32, 0));
                i += 1;
                x += step;
            }
            y += step;
        }
        kps
    }

    #[test]
    fn test_layout_clamps_cell_to_region() {
        let layout = CellLayout::new(Region::from_size(30, 200), 40).unwrap();
        assert_eq!(layout.dimensions(), (1, 6));
        assert!(CellLayout::new(Region::new(5, 5, 0, 10), 40).is_none());
    }

    #[test]
    fn test_far_edge_folds_into_last_cell() {
        let layout = CellLayout::new(Region::from_size(80, 80), 40).unwrap();
        assert_eq!(layout.cell_of(&KeyPoint::new(80.0, 80.0, 1.0, 0)), 3);
        assert_eq!(layout.cell_of(&KeyPoint::new(200.0, 10.0, 1.0, 0)), 1);
        assert_eq!(layout.cell_of(&KeyPoint::new(-3.0, -3.0, 1.0, 0)), 0);
    }

    #[test]
    fn test_offset_region_cells() {
        let layout = CellLayout::new(Region::new(16, 96, 16, 96), 40).unwrap();
        assert_eq!(layout.cell_of(&KeyPoint::new(17.0, 17.0, 1.0, 0)), 0);
        assert_eq!(layout.cell_of(&KeyPoint::new(60.0, 17.0, 1.0, 0)), 1);
        assert_eq!(layout.cell_region(3), Region::new(56, 96, 56, 96));
    }

    #[test]
    fn test_four_cells_respect_quota() {
        let region = Region::from_size(80, 80);
        let kps = uniform_grid(region, 4.0);
        assert_eq!(kps.len(), 400);

        let result = distribute_grid(kps, region, 40, 40);
        assert!(result.len() <= 40);

        let layout = CellLayout::new(region, 40).unwrap();
        let mut per_cell = [0usize; 4];
        for kp in &result {
            per_cell[layout.cell_of(kp)] += 1;
        }
        assert!(per_cell.iter().all(|&c| c <= 10), "cell over quota: {:?}", per_cell);
        assert_eq!(result.len(), 40);
    }

    #[test]
    fn test_quota_under_shoot_is_kept() {
        let region = Region::from_size(120, 80);
        let kps = uniform_grid(region, 4.0);
        // 3x2 cells, 20 / 6 = 3 per cell
        let result = distribute_grid(kps, region, 20, 40);
        assert_eq!(result.len(), 18);
    }

    #[test]
    fn test_each_cell_keeps_its_best() {
        let region = Region::from_size(80, 40);
        let kps = vec![
            KeyPoint::new(5.0, 5.0, 10.0, 0),
            KeyPoint::new(6.0, 6.0, 90.0, 0),
            KeyPoint::new(45.0, 5.0, 3.0, 0),
            KeyPoint::new(46.0, 6.0, 2.0, 0),
        ];
        let result = distribute_grid(kps, region, 2, 40);
        let responses: Vec<f32> = result.iter().map(|k| k.response).collect();
        assert_eq!(responses, vec![90.0, 3.0]);
    }
}
