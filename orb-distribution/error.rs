#[derive(Debug, Clone, PartialEq)]
pub enum DistributionError {
    InvalidTolerance(f32),
    InvalidSoftThreshold(f32),
    InvalidCellSize(usize),
    InvalidVsscRange(f32),
    InvalidScaleFactor(f32),
    InvalidLevelCount(usize),
    UnknownStrategy(String),
    LevelCountMismatch { expected: usize, actual: usize },
    ThreadPool(String),
}

impl std::fmt::Display for DistributionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionError::InvalidTolerance(t) => {
                write!(f, "Invalid tolerance: {} (must be finite and in [0, 1))", t)
            }
            DistributionError::InvalidSoftThreshold(t) => {
                write!(f, "Invalid soft-SSC threshold: {} (must be finite)", t)
            }
            DistributionError::InvalidCellSize(s) => {
                write!(f, "Invalid grid cell size: {} (must be > 0)", s)
            }
            DistributionError::InvalidVsscRange(r) => {
                write!(f, "Invalid VSSC response range: {} (must be finite and > 0)", r)
            }
            DistributionError::InvalidScaleFactor(s) => {
                write!(f, "Invalid pyramid scale factor: {} (must be > 1)", s)
            }
            DistributionError::InvalidLevelCount(n) => {
                write!(f, "Invalid pyramid level count: {} (must be >= 1)", n)
            }
            DistributionError::UnknownStrategy(name) => {
                write!(f, "Unknown distribution strategy: '{}'", name)
            }
            DistributionError::LevelCountMismatch { expected, actual } => {
                write!(f, "Level count mismatch: expected {} levels, got {}", expected, actual)
            }
            DistributionError::ThreadPool(msg) => {
                write!(f, "Thread pool error: {}", msg)
            }
        }
    }
}

impl std::error::Error for DistributionError {}

impl From<rayon::ThreadPoolBuildError> for DistributionError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        DistributionError::ThreadPool(err.to_string())
    }
}

pub type DistributionResult<T> = Result<T, DistributionError>;
