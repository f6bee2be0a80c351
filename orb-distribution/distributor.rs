use std::time::Instant;

use orb_core::{KeyPoint, Region};
use rayon::prelude::*;

use crate::builder::DistributorBuilder;
use crate::config::DistributionConfig;
use crate::distribute::distribute_with;
use crate::error::{DistributionError, DistributionResult};
use crate::pyramid::{generate_scale_levels, EDGE_THRESHOLD};
use crate::types::{DistributionReport, LevelCandidates, ScaleLevel};

/// A distribution engine bound to one validated configuration.
///
/// Single calls run on the caller's thread. The per-level batch API runs one
/// independent call per level in parallel, on a private pool when the builder
/// asked for one.
#[derive(Debug)]
pub struct Distributor {
    config: DistributionConfig,
    pool: Option<rayon::ThreadPool>,
}

impl Distributor {
    /// Create a distributor running on the global rayon pool
    pub fn new(config: DistributionConfig) -> DistributionResult<Self> {
        config.validate()?;
        Ok(Self { config, pool: None })
    }

    pub fn builder() -> DistributorBuilder {
        DistributorBuilder::new()
    }

    pub(crate) fn from_parts(config: DistributionConfig, pool: Option<rayon::ThreadPool>) -> Self {
        Self { config, pool }
    }

    /// Reduce one level's candidates to about `n`
    pub fn distribute(&self, keypoints: Vec<KeyPoint>, region: Region, n: usize) -> Vec<KeyPoint> {
        distribute_with(keypoints, region, n, &self.config)
    }

    /// Like [`Distributor::distribute`], also reporting counts and elapsed time
    pub fn distribute_with_report(
        &self,
        keypoints: Vec<KeyPoint>,
        region: Region,
        n: usize,
    ) -> (Vec<KeyPoint>, DistributionReport) {
        let input_count = keypoints.len();
        let start = Instant::now();
        let result = self.distribute(keypoints, region, n);
        let report = DistributionReport {
            strategy: self.config.strategy,
            input_count,
            output_count: result.len(),
            target: n,
            elapsed: start.elapsed(),
        };
        (result, report)
    }

    /// Distribute every level independently, in parallel. Output order follows input order.
    pub fn distribute_levels(&self, levels: Vec<LevelCandidates>) -> Vec<Vec<KeyPoint>> {
        let run = || {
            levels
                .into_par_iter()
                .map(|level| {
                    log::trace!(
                        "level {}: {} candidates, target {}",
                        level.level,
                        level.keypoints.len(),
                        level.target
                    );
                    self.distribute(level.keypoints, level.region, level.target)
                })
                .collect::<Vec<_>>()
        };

        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    /// Distribute raw per-level candidates of a `width x height` image using the
    /// pyramid budget and detection borders of the configured pyramid.
    ///
    /// `candidates[i]` holds level `i` in level coordinates.
    pub fn distribute_pyramid(
        &self,
        candidates: Vec<Vec<KeyPoint>>,
        width: usize,
        height: usize,
    ) -> DistributionResult<Vec<Vec<KeyPoint>>> {
        let scale_levels = self.scale_levels(width, height);
        if candidates.len() != scale_levels.len() {
            return Err(DistributionError::LevelCountMismatch {
                expected: scale_levels.len(),
                actual: candidates.len(),
            });
        }

        let levels = scale_levels
            .iter()
            .zip(candidates)
            .map(|(scale_level, keypoints)| LevelCandidates {
                level: scale_level.level as i32,
                region: scale_level.detection_region(EDGE_THRESHOLD),
                target: scale_level.n_features,
                keypoints,
            })
            .collect();

        Ok(self.distribute_levels(levels))
    }

    /// Scale levels of the configured pyramid for a `width x height` image
    pub fn scale_levels(&self, width: usize, height: usize) -> Vec<ScaleLevel> {
        generate_scale_levels(&self.config.pyramid, width, height)
    }

    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    pub fn summary(&self) -> String {
        match &self.pool {
            Some(pool) => format!("{} on {} threads", self.config.summary(), pool.current_num_threads()),
            None => format!("{} on the global pool", self.config.summary()),
        }
    }
}
