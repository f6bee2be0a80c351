use orb_core::KeyPoint;
use crate::types::SuppressionOutcome;

/// Closed interval of suppression widths the binary search explores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBracket {
    pub low: i32,
    pub high: i32,
}

impl SearchBracket {
    /// Analytic starting bracket for a `cols x rows` region, `candidate_count`
    /// candidates and a target of `n`.
    ///
    /// The upper bound is the larger root of the quadratic relating region area,
    /// point count and `n`, truncated towards zero; the lower bound is
    /// `floor(sqrt(count / n))`, at least 1. For very dense inputs the lower bound
    /// can exceed the upper one. [`binary_search_width`] then runs a single trial
    /// at `low`.
    pub fn initial(cols: i32, rows: i32, n: usize, candidate_count: usize) -> Self {
        let low = ((candidate_count as f64 / n.max(1) as f64).sqrt().floor() as i32).max(1);

        // The quadratic degenerates for a single target point
        if n <= 1 {
            return Self { low, high: cols.max(rows) };
        }

        let (c, r, n) = (cols as f64, rows as f64, n as f64);
        let numerator = r + c + 2.0 * n;
        let discriminant = 4.0 * c + 4.0 * n + 4.0 * r * n + r * r + c * c - 2.0 * c * r + 4.0 * c * r * n;
        let root = discriminant.max(0.0).sqrt();
        let denominator = 2.0 * (n - 1.0);

        let sol1 = (numerator - root) / denominator;
        let sol2 = (numerator + root) / denominator;

        Self {
            low,
            high: sol1.max(sol2) as i32,
        }
    }

    pub fn midpoint(&self) -> i32 {
        self.low + (self.high - self.low) / 2
    }

    pub fn is_inverted(&self) -> bool {
        self.low > self.high
    }
}

/// Inclusive count band `[round(n - n·ε), round(n + n·ε)]`
pub fn tolerance_band(n: usize, tolerance: f32) -> (usize, usize) {
    let n = n as f32;
    let k_min = (n - n * tolerance).round().max(0.0) as usize;
    let k_max = (n + n * tolerance).round().max(0.0) as usize;
    (k_min, k_max)
}

/// Binary search over the suppression width.
///
/// `trial(width, out)` fills `out` with the indices (into `keypoints`) accepted at
/// that width, in acceptance order. The search stops on the first count inside the
/// tolerance band, or when a width repeats or the bracket inverts, in which case the
/// last evaluated trial is returned unconverged. The bracket the search ended
/// with is reported in [`SuppressionOutcome::final_bracket`].
pub fn binary_search_width<F>(
    keypoints: &[KeyPoint],
    bracket: SearchBracket,
    n: usize,
    tolerance: f32,
    mut trial: F,
) -> SuppressionOutcome
where
    F: FnMut(i32, &mut Vec<usize>),
{
    let (k_min, k_max) = tolerance_band(n, tolerance);
    let mut current = bracket;
    let mut prev_width: Option<i32> = None;
    let mut accepted = Vec::with_capacity(keypoints.len());
    let mut iterations = 0;

    loop {
        let width = current.midpoint();
        if prev_width == Some(width) || current.is_inverted() {
            break;
        }

        trial(width, &mut accepted);
        iterations += 1;
        let count = accepted.len();
        log::trace!(
            "width search: trial {} width={} kept={} bracket=[{}, {}]",
            iterations,
            width,
            count,
            current.low,
            current.high
        );

        if count >= k_min && count <= k_max {
            return collect(keypoints, &accepted, Some(width), current, true, iterations);
        }
        if count < k_min {
            current.high = width - 1;
        } else {
            current.low = width + 1;
        }
        prev_width = Some(width);
    }

    // An initially inverted bracket still gets one trial at its lower bound
    let width = match prev_width {
        Some(width) => width,
        None => {
            let width = bracket.low.max(1);
            trial(width, &mut accepted);
            iterations += 1;
            width
        }
    };

    let count = accepted.len();
    let converged = count >= k_min && count <= k_max;
    if !converged {
        log::debug!(
            "width search stopped without converging: kept {} of target {} (band [{}, {}]) at width {} after {} trials",
            count,
            n,
            k_min,
            k_max,
            width,
            iterations
        );
    }
    collect(keypoints, &accepted, Some(width), current, converged, iterations)
}

fn collect(
    keypoints: &[KeyPoint],
    accepted: &[usize],
    width: Option<i32>,
    bracket: SearchBracket,
    converged: bool,
    iterations: usize,
) -> SuppressionOutcome {
    SuppressionOutcome {
        keypoints: accepted.iter().map(|&i| keypoints[i]).collect(),
        width,
        converged,
        iterations,
        final_bracket: Some(bracket),
    }
}

/// Scratch grid of response high-water marks for one suppression trial.
///
/// Cells start at negative infinity and only ever rise. Lookups outside the grid
/// clamp to the nearest border cell.
#[derive(Debug, Clone)]
pub struct CoverageGrid {
    cells: Vec<f32>,
    cols: usize,
    rows: usize,
}

impl CoverageGrid {
    pub fn new(cols: usize, rows: usize) -> Self {
        let (cols, rows) = (cols.max(1), rows.max(1));
        Self {
            cells: vec![f32::NEG_INFINITY; cols * rows],
            cols,
            rows,
        }
    }

    #[inline]
    fn clamp(&self, col: i64, row: i64) -> (usize, usize) {
        (
            col.clamp(0, self.cols as i64 - 1) as usize,
            row.clamp(0, self.rows as i64 - 1) as usize,
        )
    }

    /// Recorded high-water mark of the cell at (`col`, `row`)
    pub fn covered(&self, col: i64, row: i64) -> f32 {
        let (col, row) = self.clamp(col, row);
        self.cells[row * self.cols + col]
    }

    /// Raise every cell within `radius` cells of (`col`, `row`) to at least `value`.
    ///
    /// Returns true when `value` was strictly above every cell of the block before marking.
    pub fn raise_block(&mut self, col: i64, row: i64, radius: i64, value: f32) -> bool {
        let (col_min, row_min) = self.clamp(col - radius, row - radius);
        let (col_max, row_max) = self.clamp(col + radius, row + radius);

        let mut dominated = true;
        for r in row_min..=row_max {
            let line = &mut self.cells[r * self.cols + col_min..=r * self.cols + col_max];
            for cell in line {
                if value > *cell {
                    *cell = value;
                } else {
                    dominated = false;
                }
            }
        }
        dominated
    }
}
