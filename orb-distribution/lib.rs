//! Spatial distribution of keypoint candidates.
//!
//! A detector returns far more corners than a SLAM front end can track, and
//! they cluster on textured patches. Every strategy here reduces one pyramid
//! level's candidates to roughly `N` keypoints while spreading them over the
//! detection region, from plain top-N and grid bucketing through the ORB-SLAM
//! quadtree to adaptive non-maximum suppression and its square covering
//! variants.
//!
//! ```
//! use orb_distribution::{distribute, KeyPoint, Region, Strategy};
//!
//! let region = Region::from_size(64, 64);
//! let candidates: Vec<KeyPoint> = (0..256)
//!     .map(|i| KeyPoint::new((i % 16) as f32 * 4.0, (i / 16) as f32 * 4.0, (i % 31) as f32, 0))
//!     .collect();
//!
//! let kept = distribute(candidates, region, 32, Strategy::Ssc, 0.1, 0.0);
//! assert!(!kept.is_empty() && kept.len() < 256);
//! ```

mod error;
mod types;
mod naive;
mod grid;
mod search;
mod kdtree;
mod range_tree;
mod quadtree;
mod anms;
mod ssc;
mod ranms;
mod vssc;
mod distribute;
mod config;
mod builder;
mod distributor;
mod pyramid;

#[cfg(test)]
mod properties;

pub use orb_core::{KeyPoint, PyramidConfig, Region};

pub use anms::{anms_kdtree, anms_range_tree};
pub use builder::DistributorBuilder;
pub use config::DistributionConfig;
pub use distribute::{distribute, distribute_with};
pub use distributor::Distributor;
pub use error::{DistributionError, DistributionResult};
pub use grid::{distribute_grid, CellLayout, DEFAULT_GRID_CELL_SIZE};
pub use kdtree::KdTree;
pub use naive::{retain_best, sort_by_response};
pub use pyramid::{generate_scale_levels, EDGE_THRESHOLD};
pub use quadtree::{distribute_quadtree, QuadNode, QuadTree};
pub use range_tree::RangeTree;
pub use ranms::ranms;
pub use search::{binary_search_width, tolerance_band, CoverageGrid, SearchBracket};
pub use ssc::{soft_ssc, ssc, SscFrame};
pub use types::{DistributionReport, LevelCandidates, ScaleLevel, Strategy, SuppressionOutcome};
pub use vssc::{vssc, VsscParams};
