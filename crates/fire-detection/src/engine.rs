//! Satellite/event visibility pass.

use crate::obscurant::Obscurant;
use crate::{DetectionConfig, DetectionGeometry, DetectionOutcome, LineOfSight, Result, SensingMode};
use fire_events::GroundEvent;
use orbital_mechanics::transforms::{cartesian_to_geodetic, haversine_km};
use orbital_mechanics::{GeodeticPosition, Satellite, Vec3};
use tracing::debug;

/// Geometry of one satellite/event pair that passed the visibility test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub range: f64,
    pub off_nadir_deg: f64,
}

pub struct DetectionEngine {
    config: DetectionConfig,
}

impl DetectionEngine {
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Angle between the satellite-to-event vector and the nadir, degrees.
    pub fn off_nadir_deg(satellite: &Vec3, event: &Vec3) -> f64 {
        let sight = event - satellite;
        let range = sight.norm();
        let altitude = satellite.norm();
        if range == 0.0 || altitude == 0.0 {
            return 0.0;
        }
        let nadir = -satellite / altitude;
        (sight.dot(&nadir) / range).clamp(-1.0, 1.0).acos().to_degrees()
    }

    /// Pure nadir-cone test.
    pub fn observe(&self, satellite: &Vec3, event: &Vec3) -> Option<Observation> {
        let range = (event - satellite).norm();
        if range > self.config.detection_radius {
            return None;
        }
        let off_nadir_deg = Self::off_nadir_deg(satellite, event);
        (off_nadir_deg <= self.config.max_half_angle_deg).then_some(Observation {
            range,
            off_nadir_deg,
        })
    }

    /// Ground-track footprint test on precomputed sub-satellite points.
    fn observe_ground_track(
        &self,
        satellite: &Vec3,
        sub_point: &GeodeticPosition,
        event: &GroundEvent,
    ) -> Option<Observation> {
        let site = event.site();
        let ground = haversine_km(sub_point.latitude, sub_point.longitude, site.latitude, site.longitude);
        (ground <= self.config.max_ground_distance_km).then(|| Observation {
            range: (event.position() - satellite).norm(),
            off_nadir_deg: Self::off_nadir_deg(satellite, event.position()),
        })
    }

    pub fn sensing_mode(&self, event: &Vec3, obscurants: &[Obscurant]) -> SensingMode {
        let covered = obscurants
            .iter()
            .any(|o| (o.position - event).norm() <= self.config.obscurant_radius);
        if covered {
            SensingMode::ThermalInfrared
        } else {
            SensingMode::Optical
        }
    }

    /// Test every (satellite, burning event) pair, latch detections and emit
    /// this tick's sight lines. Expired (fading) events are skipped.
    pub fn evaluate<'a, I>(
        &self,
        satellites: &[Satellite],
        events: I,
        obscurants: &[Obscurant],
        now: f64,
    ) -> DetectionOutcome
    where
        I: IntoIterator<Item = &'a mut GroundEvent>,
    {
        let positions: Vec<Vec3> = satellites.iter().map(Satellite::position).collect();
        let sub_points: Vec<GeodeticPosition> = match self.config.geometry {
            DetectionGeometry::GroundTrack => positions
                .iter()
                .map(|p| cartesian_to_geodetic(p, 0.0))
                .collect(),
            DetectionGeometry::NadirCone => Vec::new(),
        };

        let mut outcome = DetectionOutcome::default();

        for event in events {
            if event.is_expired() {
                continue;
            }
            let mode = self.sensing_mode(event.position(), obscurants);

            for (idx, sat) in satellites.iter().enumerate() {
                let seen = match self.config.geometry {
                    DetectionGeometry::NadirCone => self.observe(&positions[idx], event.position()),
                    DetectionGeometry::GroundTrack => {
                        self.observe_ground_track(&positions[idx], &sub_points[idx], event)
                    }
                };
                let Some(obs) = seen else { continue };

                if event.record_detection(sat.id, mode, now) {
                    debug!("Event {} first detected by {} ({:?})", event.id(), sat.label, mode);
                    outcome.newly_detected.push(event.id());
                }
                outcome.lines.push(LineOfSight {
                    satellite_id: sat.id,
                    event_id: event.id(),
                    mode,
                    range: obs.range,
                    off_nadir_deg: obs.off_nadir_deg,
                });
            }
        }

        outcome
    }
}
