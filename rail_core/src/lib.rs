//! `rail_core` — Track geometry & distance estimation engine.
//!
//! # Module layout
//! - [`types`]       — Segments, rail line models, sides, trajectory, detections
//! - [`line_model`]  — Segment → `x = intercept + slope·y` conversion, means, widths
//! - [`cluster`]     — 2-means rail clusterer with slope-sign side assignment
//! - [`history`]     — Bounded FIFO of per-frame rail models
//! - [`smoother`]    — Per-side sliding-window mean
//! - [`track_state`] — Per-session state owning the smoothed rails
//! - [`distance`]    — Similar-triangles distance estimate
//! - [`trajectory`]  — Slope-ratio curvature classification
//! - [`pipeline`]    — Per-frame orchestrator and session config
//! - [`metrics`]     — Distance / trajectory accuracy against ground truth
//! - [`error`]       — Configuration errors

pub mod cluster;
pub mod distance;
pub mod error;
pub mod history;
pub mod line_model;
pub mod metrics;
pub mod pipeline;
pub mod smoother;
pub mod track_state;
pub mod trajectory;
pub mod types;

pub use cluster::{ClusterOutput, ClustererConfig, RailClusterer, SideConflictPolicy};
pub use distance::estimate_distance;
pub use error::{ConfigError, LoadError};
pub use line_model::segment_to_model;
pub use pipeline::{FrameOutput, ObjectEstimate, Pipeline, PipelineConfig};
pub use track_state::TrackState;
pub use trajectory::{classify, TrajectoryThresholds};
pub use types::{FrameBatch, LineModel, ObjectDetection, RailSide, RawSegment, Trajectory};
