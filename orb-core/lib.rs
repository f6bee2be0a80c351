#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Key-point candidate ≙ FAST corner with subpixel position, cornerness and pyramid level
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyPoint {
    pub x: f32,        // Subpixel x coordinate
    pub y: f32,        // Subpixel y coordinate
    pub response: f32, // Cornerness score, higher is better
    pub level: i32,    // Pyramid level the point was detected on
}

impl KeyPoint {
    pub fn new(x: f32, y: f32, response: f32, level: i32) -> Self {
        Self { x, y, response, level }
    }
}

/// Axis-aligned integer rectangle `[min_x, max_x) x [min_y, max_y)` candidates live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Region {
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self { min_x, max_x, min_y, max_y }
    }

    /// Region anchored at the origin
    pub fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, width, 0, height)
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }

    /// Zero or negative extent on either axis
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn area(&self) -> i64 {
        if self.is_degenerate() {
            0
        } else {
            self.width() as i64 * self.height() as i64
        }
    }

    /// Half-open containment test
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x as f32 && x < self.max_x as f32 && y >= self.min_y as f32 && y < self.max_y as f32
    }
}

/// Image pyramid parameters used to derive per-level feature budgets
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PyramidConfig {
    pub n_features: usize,
    pub scale_factor: f32,
    pub n_levels: usize,
    pub n_threads: usize,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            n_features: 1000,
            scale_factor: 1.2,
            n_levels: 8,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Build a call-local Rayon thread pool with the specified number of threads
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads.max(1))
        .thread_name(|i| format!("orb-distribution-{}", i))
        .build()
}
