use orb_core::PyramidConfig;
use crate::builder::DistributorBuilder;
use crate::error::{DistributionError, DistributionResult};
use crate::grid::DEFAULT_GRID_CELL_SIZE;
use crate::types::Strategy;
use crate::vssc::VsscParams;

#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// Complete distribution configuration with all settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistributionConfig {
    pub strategy: Strategy,
    /// Relative deviation ε of the kept count from the target
    pub tolerance: f32,
    /// Response margin of the soft square-covering strategies
    pub soft_threshold: f32,
    /// Bucketing cell edge for grid and RANMS, in pixels
    pub grid_cell_size: usize,
    pub vssc: VsscParams,
    /// Pyramid layout the per-level targets are derived from
    pub pyramid: PyramidConfig,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub version: Option<String>,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            tolerance: 0.1,
            soft_threshold: 0.0,
            grid_cell_size: DEFAULT_GRID_CELL_SIZE,
            vssc: VsscParams::default(),
            pyramid: PyramidConfig::default(),
            name: None,
            description: None,
            version: None,
        }
    }
}

impl DistributionConfig {
    /// Create new configuration with default settings
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// ORB-SLAM quadtree distribution
    pub fn orbslam_preset() -> Self {
        Self {
            strategy: Strategy::QuadtreeOrbSlam,
            name: Some("ORB-SLAM".to_string()),
            description: Some("Adaptive quadtree, one keypoint per node".to_string()),
            version: Some("1.0".to_string()),
            ..Self::default()
        }
    }

    /// Radius-based adaptive NMS
    pub fn anms_preset() -> Self {
        Self {
            strategy: Strategy::AnmsKdTree,
            tolerance: 0.1,
            name: Some("ANMS".to_string()),
            description: Some("Adaptive non-maximum suppression over a k-d tree".to_string()),
            version: Some("1.0".to_string()),
            ..Self::default()
        }
    }

    /// Suppression via square covering
    pub fn ssc_preset() -> Self {
        Self {
            strategy: Strategy::Ssc,
            tolerance: 0.1,
            name: Some("SSC".to_string()),
            description: Some("Square covering suppression, no spatial index".to_string()),
            version: Some("1.0".to_string()),
            ..Self::default()
        }
    }

    /// Bucketed soft-SSC, skips the search in sparse cells
    pub fn realtime_preset() -> Self {
        Self {
            strategy: Strategy::Ranms,
            tolerance: 0.2,
            soft_threshold: 2.0,
            grid_cell_size: 60,
            name: Some("Realtime".to_string()),
            description: Some("Grid bucketing with soft-SSC in crowded cells".to_string()),
            version: Some("1.0".to_string()),
            ..Self::default()
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self.version = Some("1.0".to_string());
        self
    }

    /// Convert to DistributorBuilder for further customization
    pub fn to_builder(self) -> DistributorBuilder {
        DistributorBuilder::from_config(self)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "DistributionConfig: strategy={}, tolerance={:.2}, soft_threshold={:.1}, cell={}px, pyramid=[features:{}, levels:{}, scale:{:.2}]",
            self.strategy, self.tolerance, self.soft_threshold, self.grid_cell_size,
            self.pyramid.n_features, self.pyramid.n_levels, self.pyramid.scale_factor
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> DistributionResult<()> {
        if !self.tolerance.is_finite() || !(0.0..1.0).contains(&self.tolerance) {
            return Err(DistributionError::InvalidTolerance(self.tolerance));
        }
        if !self.soft_threshold.is_finite() {
            return Err(DistributionError::InvalidSoftThreshold(self.soft_threshold));
        }
        if self.grid_cell_size == 0 {
            return Err(DistributionError::InvalidCellSize(self.grid_cell_size));
        }
        if !self.vssc.response_range.is_finite() || self.vssc.response_range <= 0.0 {
            return Err(DistributionError::InvalidVsscRange(self.vssc.response_range));
        }
        if !self.pyramid.scale_factor.is_finite() || self.pyramid.scale_factor <= 1.0 {
            return Err(DistributionError::InvalidScaleFactor(self.pyramid.scale_factor));
        }
        if self.pyramid.n_levels == 0 {
            return Err(DistributionError::InvalidLevelCount(self.pyramid.n_levels));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for config in [
            DistributionConfig::default(),
            DistributionConfig::orbslam_preset(),
            DistributionConfig::anms_preset(),
            DistributionConfig::ssc_preset(),
            DistributionConfig::realtime_preset(),
        ] {
            assert!(config.validate().is_ok(), "{}", config.summary());
        }
        assert_eq!(DistributionConfig::orbslam_preset().strategy, Strategy::QuadtreeOrbSlam);
        assert_eq!(DistributionConfig::default().strategy, Strategy::SoftSsc);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = DistributionConfig::new(Strategy::Grid);
        config.tolerance = 1.0;
        assert_eq!(config.validate(), Err(DistributionError::InvalidTolerance(1.0)));

        config.tolerance = 0.1;
        config.soft_threshold = f32::NAN;
        assert!(matches!(config.validate(), Err(DistributionError::InvalidSoftThreshold(_))));

        config.soft_threshold = 0.0;
        config.grid_cell_size = 0;
        assert_eq!(config.validate(), Err(DistributionError::InvalidCellSize(0)));

        config.grid_cell_size = 40;
        config.vssc.response_range = 0.0;
        assert_eq!(config.validate(), Err(DistributionError::InvalidVsscRange(0.0)));

        config.vssc = VsscParams::default();
        config.pyramid.scale_factor = 1.0;
        assert_eq!(config.validate(), Err(DistributionError::InvalidScaleFactor(1.0)));

        config.pyramid.scale_factor = 1.2;
        config.pyramid.n_levels = 0;
        assert_eq!(config.validate(), Err(DistributionError::InvalidLevelCount(0)));
    }

    #[test]
    fn test_metadata_and_summary() {
        let config = DistributionConfig::ssc_preset().with_metadata("Indoor", "Tuned for corridors");
        assert_eq!(config.name.as_deref(), Some("Indoor"));
        assert_eq!(config.version.as_deref(), Some("1.0"));
        assert!(config.summary().contains("strategy=ssc"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_round_trip() {
        let config = DistributionConfig::realtime_preset();
        let json = config.to_json().unwrap();
        assert!(json.contains("\"ranms\""));
        assert_eq!(DistributionConfig::from_json(&json).unwrap(), config);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_toml_rejects_invalid_config() {
        let mut config = DistributionConfig::anms_preset();
        let toml = config.to_toml().unwrap();
        assert_eq!(DistributionConfig::from_toml(&toml).unwrap(), config);

        config.tolerance = 3.0;
        let invalid = config.to_toml().unwrap();
        assert!(DistributionConfig::from_toml(&invalid).is_err());
    }
}
