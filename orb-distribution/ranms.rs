use orb_core::{KeyPoint, Region};

use crate::grid::CellLayout;
use crate::ssc::{soft_ssc, SscFrame};

/// Grid bucketing followed by soft-SSC inside every cell holding more than its
/// `n / cells` quota. Cells within quota pass through unchanged.
///
/// `keypoints` must be sorted by descending response; the order is kept inside
/// each cell and cells are emitted row-major.
pub fn ranms(
    keypoints: Vec<KeyPoint>,
    region: Region,
    n: usize,
    tolerance: f32,
    threshold: f32,
    cell_size: usize,
) -> Vec<KeyPoint> {
    let Some(layout) = CellLayout::new(region, cell_size) else {
        return Vec::new();
    };

    let n_per_cell = n / layout.cell_count();
    let mut result = Vec::with_capacity(n + n / 4);
    let mut crowded = 0;

    for (idx, cell) in layout.bucket(keypoints).into_iter().enumerate() {
        if cell.len() > n_per_cell {
            crowded += 1;
            let frame = SscFrame::Bounded(layout.cell_region(idx));
            result.extend(soft_ssc(&cell, frame, n_per_cell, tolerance, threshold).keypoints);
        } else {
            result.extend(cell);
        }
    }

    log::trace!(
        "ranms: {} of {} cells over their quota of {}",
        crowded,
        layout.cell_count(),
        n_per_cell
    );
    result
}
