use orb_core::{build_thread_pool, PyramidConfig};
use crate::config::DistributionConfig;
use crate::distributor::Distributor;
use crate::error::DistributionResult;
use crate::types::Strategy;
use crate::vssc::VsscParams;

/// Builder for creating a `Distributor`
#[derive(Debug, Clone)]
pub struct DistributorBuilder {
    strategy: Strategy,
    tolerance: f32,
    soft_threshold: f32,
    grid_cell_size: usize,
    vssc: VsscParams,
    pyramid: PyramidConfig,
    // Private rayon pool size for the batch API, global pool when unset
    threads: Option<usize>,
}

impl Default for DistributorBuilder {
    fn default() -> Self {
        Self::from_config(DistributionConfig::default())
    }
}

impl DistributorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the distribution strategy
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the relative tolerance ε around the target count
    pub fn tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the soft-SSC response margin
    pub fn soft_threshold(mut self, threshold: f32) -> Self {
        self.soft_threshold = threshold;
        self
    }

    /// Set the bucketing cell edge used by grid and RANMS
    pub fn grid_cell_size(mut self, cell_size: usize) -> Self {
        self.grid_cell_size = cell_size;
        self
    }

    /// Set the VSSC footprint tunables
    pub fn vssc(mut self, params: VsscParams) -> Self {
        self.vssc = params;
        self
    }

    /// Set the total feature budget spread over the pyramid
    pub fn features(mut self, n_features: usize) -> Self {
        self.pyramid.n_features = n_features;
        self
    }

    /// Set the pyramid scale factor between consecutive levels
    pub fn scale_factor(mut self, scale_factor: f32) -> Self {
        self.pyramid.scale_factor = scale_factor;
        self
    }

    /// Set the number of pyramid levels
    pub fn levels(mut self, n_levels: usize) -> Self {
        self.pyramid.n_levels = n_levels;
        self
    }

    /// Run the per-level batch API on a private pool of `n_threads` threads
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.threads = Some(n_threads);
        self.pyramid.n_threads = n_threads;
        self
    }

    /// Apply the ORB-SLAM quadtree preset
    pub fn preset_orbslam(self) -> Self {
        self.apply(DistributionConfig::orbslam_preset())
    }

    /// Apply the k-d tree ANMS preset
    pub fn preset_anms(self) -> Self {
        self.apply(DistributionConfig::anms_preset())
    }

    /// Apply the square covering preset
    pub fn preset_ssc(self) -> Self {
        self.apply(DistributionConfig::ssc_preset())
    }

    /// Apply the bucketed soft-SSC preset
    pub fn preset_realtime(self) -> Self {
        self.apply(DistributionConfig::realtime_preset())
    }

    // Presets replace the tuning but keep the pyramid and thread settings
    fn apply(mut self, preset: DistributionConfig) -> Self {
        self.strategy = preset.strategy;
        self.tolerance = preset.tolerance;
        self.soft_threshold = preset.soft_threshold;
        self.grid_cell_size = preset.grid_cell_size;
        self.vssc = preset.vssc;
        self
    }

    /// Validate the settings and build the distributor
    pub fn build(self) -> DistributionResult<Distributor> {
        let threads = self.threads;
        let config = self.to_config();
        config.validate()?;

        let pool = match threads {
            Some(n_threads) => Some(build_thread_pool(n_threads)?),
            None => None,
        };
        log::debug!("built distributor: {}", config.summary());
        Ok(Distributor::from_parts(config, pool))
    }

    /// Generate summary of current configuration
    pub fn summary(&self) -> String {
        format!(
            "DistributorBuilder: strategy={}, tolerance={:.2}, soft_threshold={:.1}, cell={}px, features={}, levels={}, scale={:.2}, threads={}",
            self.strategy, self.tolerance, self.soft_threshold, self.grid_cell_size,
            self.pyramid.n_features, self.pyramid.n_levels, self.pyramid.scale_factor,
            self.threads.map_or_else(|| "global".to_string(), |n| n.to_string())
        )
    }

    /// Create builder from existing configuration
    pub fn from_config(config: DistributionConfig) -> Self {
        Self {
            strategy: config.strategy,
            tolerance: config.tolerance,
            soft_threshold: config.soft_threshold,
            grid_cell_size: config.grid_cell_size,
            vssc: config.vssc,
            pyramid: config.pyramid,
            threads: None,
        }
    }

    /// Convert to DistributionConfig
    pub fn to_config(self) -> DistributionConfig {
        DistributionConfig {
            strategy: self.strategy,
            tolerance: self.tolerance,
            soft_threshold: self.soft_threshold,
            grid_cell_size: self.grid_cell_size,
            vssc: self.vssc,
            pyramid: self.pyramid,
            name: None,
            description: None,
            version: None,
        }
    }
}
