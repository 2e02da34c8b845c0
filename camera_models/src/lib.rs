//! `camera_models` — Pinhole ground-plane camera used to synthesise rail images.

pub mod camera;
pub mod projection;

pub use camera::CameraParams;
pub use projection::{PinholeCamera, ProjectionModel};
