//! `sim` — Synthetic rail scenes: track geometry, segment detector, replay.

pub mod replay;
pub mod scenarios;
pub mod segment_sim;
pub mod track;

pub use replay::{load_replay, save_replay, ReplayLog};
pub use scenarios::{Scenario, ScenarioKind};
pub use segment_sim::{DetectorParams, SegmentSimulator};
pub use track::{OffsetSpec, RailTrack, SimObject};
