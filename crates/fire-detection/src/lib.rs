//! Fire Detection Library
//!
//! Per-tick visibility test between every satellite and every burning ground
//! event. A satellite sees an event when it is within the detection radius and
//! the event lies inside its downward-pointing sensor cone. The engine only
//! reads satellites; on events it latches the detected flag.
//!
//! Obscurants (clouds) never block a geometrically visible event; they switch
//! the line of sight to the thermal-infrared sensor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod engine;
pub mod obscurant;

pub use engine::{DetectionEngine, Observation};
pub use fire_events::SensingMode;
pub use obscurant::{Obscurant, ObscurantField};

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Invalid detection config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DetectionError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DetectionGeometry {
    /// Straight-line range plus off-nadir half-angle test.
    #[default]
    NadirCone,
    /// Great-circle distance between the sub-satellite point and the event.
    GroundTrack,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    pub geometry: DetectionGeometry,
    /// Maximum satellite-to-event distance, scene units.
    pub detection_radius: f64,
    /// Maximum angle between the nadir and the line of sight.
    pub max_half_angle_deg: f64,
    /// An obscurant closer than this to an event forces thermal sensing.
    pub obscurant_radius: f64,
    /// Ground-track mode only: footprint radius on the Earth, km.
    pub max_ground_distance_km: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            geometry: DetectionGeometry::NadirCone,
            detection_radius: 4.0,
            max_half_angle_deg: 30.0,
            obscurant_radius: 0.8,
            max_ground_distance_km: 20.0,
        }
    }
}

impl DetectionConfig {
    /// Map dashboard: 20 km sub-satellite footprint.
    pub fn ground_track(max_ground_distance_km: f64) -> Self {
        Self {
            geometry: DetectionGeometry::GroundTrack,
            max_ground_distance_km,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let non_negative = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(DetectionError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, v
                )))
            }
        };
        non_negative("detection_radius", self.detection_radius)?;
        non_negative("obscurant_radius", self.obscurant_radius)?;
        non_negative("max_ground_distance_km", self.max_ground_distance_km)?;
        if !(0.0..=180.0).contains(&self.max_half_angle_deg) {
            return Err(DetectionError::InvalidConfig(format!(
                "max_half_angle_deg must be in [0, 180], got {}",
                self.max_half_angle_deg
            )));
        }
        Ok(())
    }
}

/// Transient sight line for the current tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LineOfSight {
    pub satellite_id: u32,
    pub event_id: u64,
    pub mode: SensingMode,
    pub range: f64,
    pub off_nadir_deg: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionOutcome {
    pub lines: Vec<LineOfSight>,
    /// Events detected for the first time this tick.
    pub newly_detected: Vec<u64>,
}

impl DetectionOutcome {
    pub fn is_satellite_visible(&self, satellite_id: u32) -> bool {
        self.lines.iter().any(|l| l.satellite_id == satellite_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DetectionConfig::default().validate().is_ok());
        assert!(DetectionConfig::ground_track(20.0).validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let cfg = DetectionConfig {
            detection_radius: -1.0,
            ..DetectionConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = DetectionConfig {
            max_half_angle_deg: 200.0,
            ..DetectionConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_config_fills_missing_fields() {
        let cfg: DetectionConfig = serde_json::from_str(r#"{"geometry": "GroundTrack"}"#).unwrap();
        assert_eq!(cfg.geometry, DetectionGeometry::GroundTrack);
        assert_eq!(cfg.max_ground_distance_km, 20.0);
    }
}
