//! Simulation configuration: presets and JSON files.

use crate::{Result, SimError};
use collision_avoidance::SeparationConfig;
use fire_detection::DetectionConfig;
use fire_events::{Lifetime, SpawnPolicy};
use orbital_mechanics::WalkerDelta;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// Maximum number of concurrent events; the oldest is evicted beyond it.
    pub capacity: usize,
    pub spawn: SpawnPolicy,
    /// Site draws per spawn before giving up for the tick.
    pub site_attempts: u32,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            capacity: 32,
            spawn: SpawnPolicy::default(),
            site_attempts: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObscurantSettings {
    pub count: u32,
    /// Height of the obscurant shell above the event surface.
    pub altitude: f64,
    /// Rotation about the polar axis, radians per time unit.
    pub drift_rate: f64,
}

impl Default for ObscurantSettings {
    fn default() -> Self {
        Self {
            count: 0,
            altitude: 0.2,
            drift_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub constellation: WalkerDelta,
    pub planet_radius: f64,
    /// Radius events sit on; slightly above the planet in the hero scene.
    pub surface_radius: f64,
    pub tick_dt: f64,
    pub detection: DetectionConfig,
    /// Minimum-separation guard; plain propagation when absent.
    pub separation: Option<SeparationConfig>,
    pub events: EventSettings,
    pub obscurants: ObscurantSettings,
    /// RNG seed; seeded runs are reproducible.
    pub seed: Option<u64>,
    /// Lifetime of events ingested from the fire feed; `None` keeps them forever.
    pub feed_event_life: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::hero()
    }
}

impl SimulationConfig {
    /// Landing-page animation: 24 satellites over a radius-10 planet at 60 fps.
    pub fn hero() -> Self {
        Self {
            constellation: WalkerDelta::hero(),
            planet_radius: 10.0,
            surface_radius: 10.1,
            tick_dt: 1.0 / 60.0,
            detection: DetectionConfig::default(),
            separation: None,
            events: EventSettings::default(),
            obscurants: ObscurantSettings {
                count: 8,
                altitude: 0.2,
                drift_rate: 0.05,
            },
            seed: None,
            feed_event_life: None,
        }
    }

    /// Map dashboard: 500 satellites in km and ms, feed-driven events, 20 km footprint.
    pub fn dashboard() -> Self {
        Self {
            constellation: WalkerDelta::dashboard(),
            planet_radius: 6371.0,
            surface_radius: 6371.0,
            tick_dt: 10_000.0,
            detection: DetectionConfig::ground_track(20.0),
            separation: None,
            events: EventSettings {
                capacity: 10_000,
                spawn: SpawnPolicy {
                    spawn_probability: 0.0,
                    ..SpawnPolicy::default()
                },
                site_attempts: 32,
            },
            obscurants: ObscurantSettings::default(),
            seed: None,
            feed_event_life: None,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn separation(mut self, separation: SeparationConfig) -> Self {
        self.separation = Some(separation);
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        info!("Loaded simulation config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.constellation.validate()?;

        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, v
                )))
            }
        };
        positive("tick_dt", self.tick_dt)?;
        positive("planet_radius", self.planet_radius)?;
        positive("surface_radius", self.surface_radius)?;

        let step = self.constellation.angular_speed * self.tick_dt;
        if !step.is_finite() {
            return Err(SimError::InvalidConfig(format!(
                "angular_speed {} over tick_dt {} overflows the per-tick step",
                self.constellation.angular_speed, self.tick_dt
            )));
        }

        if self.surface_radius < self.planet_radius {
            return Err(SimError::InvalidConfig(format!(
                "surface_radius {} is below planet_radius {}",
                self.surface_radius, self.planet_radius
            )));
        }
        if self.surface_radius >= self.constellation.orbit_radius {
            return Err(SimError::InvalidConfig(format!(
                "surface_radius {} must be below orbit_radius {}",
                self.surface_radius, self.constellation.orbit_radius
            )));
        }

        self.detection.validate()?;
        if let Some(separation) = &self.separation {
            separation.validate()?;
        }
        self.events.spawn.validate()?;
        if self.events.capacity == 0 {
            return Err(fire_events::EventError::InvalidCapacity.into());
        }
        if self.events.site_attempts == 0 {
            return Err(SimError::InvalidConfig("site_attempts must be at least 1".into()));
        }
        if !(self.obscurants.altitude.is_finite() && self.obscurants.drift_rate.is_finite()) {
            return Err(SimError::InvalidConfig("obscurant settings must be finite".into()));
        }
        if let Some(life) = self.feed_event_life {
            Lifetime::new(life, self.events.spawn.fade_window)?;
        }
        Ok(())
    }

    /// Lifetime given to events ingested from the fire feed.
    pub fn feed_lifetime(&self) -> Lifetime {
        match self.feed_event_life {
            Some(max_life) => Lifetime {
                max_life,
                fade_window: self.events.spawn.fade_window,
            },
            None => Lifetime::persistent(),
        }
    }
}
