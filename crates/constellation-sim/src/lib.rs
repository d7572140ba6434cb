//! Constellation Simulation
//!
//! Owns the satellite list, the ground event registry and the detection engine,
//! and advances them together one tick at a time:
//!
//! ```text
//! propagate -> generation++ -> age/remove events -> spawn -> detect -> visibility flags
//! ```
//!
//! Detection always reads positions of the generation produced in the same
//! tick. Everything runs on one thread; the context is the only owner of
//! mutable simulation state.

use collision_avoidance::CollisionError;
use fire_detection::DetectionError;
use fire_events::EventError;
use orbital_mechanics::OrbitalError;
use thiserror::Error;

pub mod config;
pub mod context;

pub use config::{EventSettings, ObscurantSettings, SimulationConfig};
pub use context::{EventSnapshot, IngestReport, RunReport, RunSummary, SatelliteSnapshot, SimulationContext, TickReport};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Orbital(#[from] OrbitalError),
    #[error(transparent)]
    Collision(#[from] CollisionError),
    #[error(transparent)]
    Events(#[from] EventError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
