//! Fire Events Library
//!
//! Transient ground events (fires) and their lifecycle:
//!
//! ```text
//! Spawned -> Active(undetected) -> Active(detected) -> Fading -> Removed
//! ```
//!
//! Events never move. Detection is latched: once a satellite has seen an event
//! it stays detected until removal. Fading and removal are driven by age only.

use orbital_mechanics::{OrbitalError, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub mod firms;
pub mod registry;
pub mod site;
pub mod spawn;

pub use firms::{Confidence, FireRecord};
pub use registry::{EventRegistry, Insertion};
pub use site::{AnyTerrain, ClassifierError, LandClassifier, LandMask, LatitudeBand, Site, SiteSelector};
pub use spawn::{EventSpawner, SpawnOutcome, SpawnPolicy};

#[derive(Error, Debug)]
pub enum EventError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Orbital(#[from] OrbitalError),
    #[error("Invalid lifetime: {0}")]
    InvalidLifetime(String),
    #[error("Invalid spawn policy: {0}")]
    InvalidPolicy(String),
    #[error("Registry capacity must be at least 1")]
    InvalidCapacity,
    #[error("Invalid land mask: {0}")]
    InvalidMask(String),
}

pub type Result<T> = std::result::Result<T, EventError>;

/// How a satellite observed an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SensingMode {
    /// Clear line of sight, visible-band sensor.
    Optical,
    /// An obscurant covers the event; cloud-penetrating thermal sensor used instead.
    ThermalInfrared,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventPhase {
    Spawned,
    Active { detected: bool },
    Fading { detected: bool },
    Removed,
}

/// First sighting of an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DetectionRecord {
    pub satellite_id: u32,
    pub mode: SensingMode,
    /// Simulation time of the sighting.
    pub at: f64,
}

/// Lifetime parameters in simulation time units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Lifetime {
    /// Time the event burns at full intensity. `f64::INFINITY` keeps it forever.
    pub max_life: f64,
    /// Time spent fading after `max_life` before removal.
    pub fade_window: f64,
}

impl Lifetime {
    pub fn new(max_life: f64, fade_window: f64) -> Result<Self> {
        if max_life.is_nan() || max_life <= 0.0 {
            return Err(EventError::InvalidLifetime(format!(
                "max_life must be positive, got {}",
                max_life
            )));
        }
        if !(fade_window.is_finite() && fade_window >= 0.0) {
            return Err(EventError::InvalidLifetime(format!(
                "fade_window must be a non-negative number, got {}",
                fade_window
            )));
        }
        Ok(Self {
            max_life,
            fade_window,
        })
    }

    /// Event that never fades (feed records).
    pub fn persistent() -> Self {
        Self {
            max_life: f64::INFINITY,
            fade_window: 0.0,
        }
    }
}

/// Metadata carried by events that came from the fire-record feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FireAttributes {
    pub brightness_k: Option<f64>,
    pub frp_mw: Option<f64>,
    pub confidence: Option<Confidence>,
    pub daynight: Option<String>,
    pub acq_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundEvent {
    id: u64,
    site: Site,
    created_at: f64,
    lifetime: Lifetime,
    age: f64,
    ticks: u64,
    first_detection: Option<DetectionRecord>,
    detected_by: BTreeSet<u32>,
    attributes: Option<FireAttributes>,
}

impl GroundEvent {
    pub fn new(id: u64, site: Site, created_at: f64, lifetime: Lifetime) -> Self {
        Self {
            id,
            site,
            created_at,
            lifetime,
            age: 0.0,
            ticks: 0,
            first_detection: None,
            detected_by: BTreeSet::new(),
            attributes: None,
        }
    }

    pub fn with_attributes(mut self, attributes: FireAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn position(&self) -> &Vec3 {
        &self.site.position
    }

    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn attributes(&self) -> Option<&FireAttributes> {
        self.attributes.as_ref()
    }

    pub fn first_detection(&self) -> Option<&DetectionRecord> {
        self.first_detection.as_ref()
    }

    pub fn detected_by(&self) -> &BTreeSet<u32> {
        &self.detected_by
    }

    pub fn is_detected(&self) -> bool {
        self.first_detection.is_some()
    }

    /// Past `max_life`: fading and no longer observed.
    pub fn is_expired(&self) -> bool {
        self.age > self.lifetime.max_life
    }

    /// Past `max_life + fade_window`.
    pub fn is_removable(&self) -> bool {
        self.age > self.lifetime.max_life + self.lifetime.fade_window
    }

    pub fn phase(&self) -> EventPhase {
        let detected = self.is_detected();
        if self.is_removable() {
            EventPhase::Removed
        } else if self.is_expired() {
            EventPhase::Fading { detected }
        } else if self.ticks == 0 {
            EventPhase::Spawned
        } else {
            EventPhase::Active { detected }
        }
    }

    /// 1.0 while burning, linear fall to 0.0 across the fade window.
    pub fn opacity(&self) -> f64 {
        match self.phase() {
            EventPhase::Spawned | EventPhase::Active { .. } => 1.0,
            EventPhase::Removed => 0.0,
            EventPhase::Fading { .. } => {
                if self.lifetime.fade_window <= 0.0 {
                    return 0.0;
                }
                let into_fade = self.age - self.lifetime.max_life;
                (1.0 - into_fade / self.lifetime.fade_window).clamp(0.0, 1.0)
            }
        }
    }

    pub fn advance(&mut self, dt: f64) {
        self.age += dt;
        self.ticks += 1;
    }

    /// Record a sighting. Returns `true` only for the first one.
    pub fn record_detection(&mut self, satellite_id: u32, mode: SensingMode, now: f64) -> bool {
        self.detected_by.insert(satellite_id);
        if self.first_detection.is_some() {
            return false;
        }
        self.first_detection = Some(DetectionRecord {
            satellite_id,
            mode,
            at: now,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(max_life: f64, fade: f64) -> GroundEvent {
        let site = Site::on_sphere(10.0, 20.0, 10.1).unwrap();
        GroundEvent::new(1, site, 0.0, Lifetime::new(max_life, fade).unwrap())
    }

    #[test]
    fn test_lifetime_validation() {
        assert!(Lifetime::new(0.0, 1.0).is_err());
        assert!(Lifetime::new(f64::NAN, 1.0).is_err());
        assert!(Lifetime::new(1.0, -1.0).is_err());
        assert!(Lifetime::new(f64::INFINITY, 0.0).is_ok());
    }

    #[test]
    fn test_phase_progression() {
        let mut e = event(10_000.0, 1_000.0);
        assert_eq!(e.phase(), EventPhase::Spawned);

        e.advance(1.0);
        assert_eq!(e.phase(), EventPhase::Active { detected: false });

        assert!(e.record_detection(4, SensingMode::Optical, 1.0));
        assert_eq!(e.phase(), EventPhase::Active { detected: true });

        e.advance(10_000.0);
        assert_eq!(e.phase(), EventPhase::Fading { detected: true });

        e.advance(999.0);
        assert_eq!(e.age(), 11_000.0);
        assert_eq!(e.phase(), EventPhase::Fading { detected: true });

        e.advance(0.5);
        assert_eq!(e.phase(), EventPhase::Removed);
    }

    #[test]
    fn test_detection_latch_keeps_first_sighting() {
        let mut e = event(100.0, 10.0);
        assert!(e.record_detection(3, SensingMode::ThermalInfrared, 5.0));
        assert!(!e.record_detection(9, SensingMode::Optical, 6.0));

        let first = e.first_detection().unwrap();
        assert_eq!(first.satellite_id, 3);
        assert_eq!(first.mode, SensingMode::ThermalInfrared);
        assert_eq!(e.detected_by().iter().copied().collect::<Vec<_>>(), vec![3, 9]);
    }

    #[test]
    fn test_opacity_fades_linearly() {
        let mut e = event(10.0, 4.0);
        e.advance(5.0);
        assert_eq!(e.opacity(), 1.0);
        e.advance(6.0);
        assert!((e.opacity() - 0.75).abs() < 1e-12);
        e.advance(4.0);
        assert_eq!(e.opacity(), 0.0);
    }

    #[test]
    fn test_persistent_event_never_expires() {
        let site = Site::on_sphere(0.0, 0.0, 1.0).unwrap();
        let mut e = GroundEvent::new(1, site, 0.0, Lifetime::persistent());
        e.advance(1e12);
        assert!(!e.is_expired());
        assert!(!e.is_removable());
    }
}
