//! Setup-time errors.
//!
//! Per-frame data problems (too few segments, degenerate geometry) are never
//! errors: they surface as `None` / [`Trajectory::Unknown`](crate::Trajectory).
//! Only invalid configuration is rejected, at construction.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("history length must be at least 1, got {0}")]
    HistoryLength(usize),

    #[error("reference distance must be a positive finite number, got {0}")]
    ReferenceDistance(f64),

    #[error("reference row must be finite, got {0}")]
    ReferenceRow(f64),

    #[error("clusterer needs at least one restart")]
    NoRestarts,

    #[error("clusterer needs at least one iteration")]
    NoIterations,

    #[error("clusterer tolerance must be finite and non-negative, got {0}")]
    Tolerance(f64),

    #[error("slope dead zone must be finite and non-negative, got {0}")]
    DeadZone(f64),

    #[error("trajectory ratios must satisfy 0 <= left ({left}) < right ({right})")]
    RatioBounds { left: f64, right: f64 },
}

/// Failure to load a [`PipelineConfig`](crate::PipelineConfig) from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read config {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config")]
    Invalid(#[from] ConfigError),
}
