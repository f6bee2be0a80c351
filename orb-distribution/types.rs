use std::str::FromStr;
use std::time::Duration;

use orb_core::{KeyPoint, Region};
use crate::error::{DistributionError, DistributionResult};
use crate::search::SearchBracket;

#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// Keypoint distribution strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Strategy {
    /// Identity, used as a diagnostic baseline
    KeepAll,
    /// Top-N by response, position ignored
    Naive,
    /// Fixed-size grid buckets, each keeping its own top share
    Grid,
    /// ORB-SLAM style adaptive quadtree
    QuadtreeOrbSlam,
    /// Adaptive NMS over a k-d tree (circular neighbourhood)
    AnmsKdTree,
    /// Adaptive NMS over a 2D range tree (square neighbourhood)
    AnmsRangeTree,
    /// Suppression via square covering
    Ssc,
    /// Square covering tolerating near-tied responses
    #[default]
    SoftSsc,
    /// Grid bucketing with soft-SSC inside crowded cells
    Ranms,
    /// Soft-SSC with a response-dependent footprint
    Vssc,
}

impl Strategy {
    pub const ALL: [Strategy; 10] = [
        Strategy::KeepAll,
        Strategy::Naive,
        Strategy::Grid,
        Strategy::QuadtreeOrbSlam,
        Strategy::AnmsKdTree,
        Strategy::AnmsRangeTree,
        Strategy::Ssc,
        Strategy::SoftSsc,
        Strategy::Ranms,
        Strategy::Vssc,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::KeepAll => "keep_all",
            Strategy::Naive => "naive",
            Strategy::Grid => "grid",
            Strategy::QuadtreeOrbSlam => "quadtree_orb_slam",
            Strategy::AnmsKdTree => "anms_kd_tree",
            Strategy::AnmsRangeTree => "anms_range_tree",
            Strategy::Ssc => "ssc",
            Strategy::SoftSsc => "soft_ssc",
            Strategy::Ranms => "ranms",
            Strategy::Vssc => "vssc",
        }
    }

    /// Whether candidates must be in descending response order before the strategy runs
    pub fn requires_sorted_input(&self) -> bool {
        matches!(
            self,
            Strategy::AnmsKdTree
                | Strategy::AnmsRangeTree
                | Strategy::Ssc
                | Strategy::SoftSsc
                | Strategy::Ranms
                | Strategy::Vssc
        )
    }

    /// Decode a numeric tag (declaration order). Unknown codes fall back to `SoftSsc`.
    pub fn from_code(code: u8) -> Strategy {
        match Strategy::ALL.get(code as usize) {
            Some(strategy) => *strategy,
            None => {
                log::warn!(
                    "unknown distribution strategy code {}, falling back to {}",
                    code,
                    Strategy::SoftSsc
                );
                Strategy::SoftSsc
            }
        }
    }

    /// Parse a strategy name. Unknown names fall back to `SoftSsc`.
    pub fn from_name_or_default(name: &str) -> Strategy {
        match name.parse() {
            Ok(strategy) => strategy,
            Err(_) => {
                log::warn!(
                    "unknown distribution strategy '{}', falling back to {}",
                    name,
                    Strategy::SoftSsc
                );
                Strategy::SoftSsc
            }
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = DistributionError;

    fn from_str(s: &str) -> DistributionResult<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let strategy = match normalized.as_str() {
            "keep_all" | "keepall" => Strategy::KeepAll,
            "naive" | "top_n" => Strategy::Naive,
            "grid" | "bucketing" => Strategy::Grid,
            "quadtree_orb_slam" | "quadtree_orbslam" | "quadtree_orbslamstyle" | "quadtree" => {
                Strategy::QuadtreeOrbSlam
            }
            "anms_kd_tree" | "anms_kdtree" | "kdtree" => Strategy::AnmsKdTree,
            "anms_range_tree" | "anms_rangetree" | "anms_rt" => Strategy::AnmsRangeTree,
            "ssc" => Strategy::Ssc,
            "soft_ssc" | "softssc" => Strategy::SoftSsc,
            "ranms" => Strategy::Ranms,
            "vssc" => Strategy::Vssc,
            _ => return Err(DistributionError::UnknownStrategy(s.to_string())),
        };
        Ok(strategy)
    }
}

/// Result of a suppression strategy that searches for a radius/width
#[derive(Debug, Clone)]
pub struct SuppressionOutcome {
    pub keypoints: Vec<KeyPoint>,
    /// Radius (k-d tree) or width of the last evaluated trial, `None` if no trial ran
    pub width: Option<i32>,
    /// Whether the returned count landed inside the tolerance band
    pub converged: bool,
    pub iterations: usize,
    /// Bracket the width search stopped with, `None` when no search ran
    pub final_bracket: Option<SearchBracket>,
}

impl SuppressionOutcome {
    /// Whether an unconverged search ran out of widths: the bracket inverted or
    /// its midpoint repeats the last trial
    pub fn search_exhausted(&self) -> bool {
        match (self.final_bracket, self.width) {
            (Some(bracket), Some(width)) => bracket.is_inverted() || bracket.midpoint() == width,
            _ => false,
        }
    }

    pub(crate) fn passthrough(keypoints: Vec<KeyPoint>) -> Self {
        Self {
            keypoints,
            width: None,
            converged: true,
            iterations: 0,
            final_bracket: None,
        }
    }

    pub(crate) fn empty() -> Self {
        Self::passthrough(Vec::new())
    }
}

/// Per-call statistics collected by `Distributor::distribute_with_report`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionReport {
    pub strategy: Strategy,
    pub input_count: usize,
    pub output_count: usize,
    pub target: usize,
    pub elapsed: Duration,
}

/// Scale information for pyramid levels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScaleLevel {
    pub level: usize,
    pub scale: f32,
    pub inv_scale: f32,
    pub sigma2: f32,
    pub inv_sigma2: f32,
    pub width: usize,
    pub height: usize,
    /// Feature budget handed to the distribution engine as `N`
    pub n_features: usize,
}

/// One pyramid level worth of raw candidates, ready for distribution
#[derive(Debug, Clone)]
pub struct LevelCandidates {
    pub level: i32,
    pub region: Region,
    pub target: usize,
    pub keypoints: Vec<KeyPoint>,
}
