//! Walker Delta constellation builder.
//!
//! ## Walker Delta Notation: T/P/F
//! - T = Total satellites
//! - P = Number of orbital planes
//! - F = Phasing factor
//!
//! Planes sit at RAAN = p * 360°/P, satellites within a plane at s * 360°/(T/P),
//! and each plane is shifted along-track by F * p * 360°/T.

use crate::{OrbitalError, Result, Satellite};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Two initial positions closer than this fraction of the orbit radius are coincident.
const COINCIDENCE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkerDelta {
    pub total_satellites: u32,
    pub planes: u32,
    pub phasing: u32,
    pub inclination_deg: f64,
    /// Distance from the planet centre, in scene units.
    pub orbit_radius: f64,
    /// Radians per time unit.
    pub angular_speed: f64,
}

impl Default for WalkerDelta {
    fn default() -> Self {
        Self::hero()
    }
}

impl WalkerDelta {
    /// Hero animation: a sparse 24/4/1 shell in scene units, seconds as time unit.
    pub fn hero() -> Self {
        WalkerDelta {
            total_satellites: 24,
            planes: 4,
            phasing: 1,
            inclination_deg: 53.0,
            orbit_radius: 13.0,
            angular_speed: 0.5,
        }
    }

    /// Map dashboard: 500/20/1 at 56°, 95 minute period, kilometres and milliseconds.
    pub fn dashboard() -> Self {
        let period_ms = 95.0 * 60.0 * 1000.0;
        WalkerDelta {
            total_satellites: 500,
            planes: 20,
            phasing: 1,
            inclination_deg: 56.0,
            orbit_radius: 6371.0 + 550.0,
            angular_speed: std::f64::consts::TAU / period_ms,
        }
    }

    pub fn satellites_per_plane(&self) -> u32 {
        self.total_satellites / self.planes
    }

    pub fn plane_spacing_deg(&self) -> f64 {
        360.0 / self.planes as f64
    }

    pub fn in_plane_spacing_deg(&self) -> f64 {
        360.0 / self.satellites_per_plane() as f64
    }

    pub fn raan_deg(&self, plane: u32) -> f64 {
        plane as f64 * self.plane_spacing_deg()
    }

    pub fn base_angle_deg(&self, slot: u32) -> f64 {
        slot as f64 * self.in_plane_spacing_deg()
    }

    pub fn phase_offset_deg(&self, plane: u32) -> f64 {
        self.phasing as f64 * plane as f64 * 360.0 / self.total_satellites as f64
    }

    /// Highest |latitude| any member reaches.
    pub fn coverage_latitude_deg(&self) -> f64 {
        let incl = self.inclination_deg.rem_euclid(180.0);
        if incl <= 90.0 {
            incl
        } else {
            180.0 - incl
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.planes == 0 || self.total_satellites == 0 {
            return Err(OrbitalError::Configuration(format!(
                "need at least one plane and one satellite, got {}/{}",
                self.total_satellites, self.planes
            )));
        }
        if self.total_satellites % self.planes != 0 {
            return Err(OrbitalError::Configuration(format!(
                "{} satellites cannot be split evenly across {} planes",
                self.total_satellites, self.planes
            )));
        }
        if !(self.orbit_radius.is_finite() && self.orbit_radius > 0.0) {
            return Err(OrbitalError::Configuration(format!(
                "orbit radius must be positive, got {}",
                self.orbit_radius
            )));
        }
        if !self.angular_speed.is_finite() || !self.inclination_deg.is_finite() {
            return Err(OrbitalError::Configuration(
                "angular speed and inclination must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate every satellite at its initial anomaly. Construction is pure.
    ///
    /// Coincident initial positions are reported with a warning; use
    /// [`WalkerDelta::build_distinct`] to reject them.
    pub fn build(&self) -> Result<Vec<Satellite>> {
        self.validate()?;

        let per_plane = self.satellites_per_plane();
        let inclination = self.inclination_deg.to_radians();
        let mut satellites = Vec::with_capacity(self.total_satellites as usize);

        for plane in 0..self.planes {
            let raan = self.raan_deg(plane).to_radians();
            let phase = self.phase_offset_deg(plane);

            for slot in 0..per_plane {
                let angle_deg = (self.base_angle_deg(slot) + phase).rem_euclid(360.0);
                satellites.push(Satellite::new(
                    plane * per_plane + slot,
                    plane,
                    slot,
                    self.orbit_radius,
                    self.angular_speed,
                    angle_deg.to_radians(),
                    inclination,
                    raan,
                ));
            }
        }

        let coincident = coincident_pairs(&satellites, self.orbit_radius);
        if !coincident.is_empty() {
            warn!(
                "Walker {}/{}/{}: {} coincident initial position pair(s)",
                self.total_satellites,
                self.planes,
                self.phasing,
                coincident.len()
            );
        }

        info!(
            "Built Walker {}/{}/{} at {:.1}° ({} per plane)",
            self.total_satellites, self.planes, self.phasing, self.inclination_deg, per_plane
        );

        Ok(satellites)
    }

    /// Like [`WalkerDelta::build`] but fails when two satellites start co-located.
    pub fn build_distinct(&self) -> Result<Vec<Satellite>> {
        let satellites = self.build()?;
        if let Some(&(a, b)) = coincident_pairs(&satellites, self.orbit_radius).first() {
            return Err(OrbitalError::Configuration(format!(
                "satellites {} and {} share an initial position",
                satellites[a].label, satellites[b].label
            )));
        }
        Ok(satellites)
    }
}

/// Index pairs of satellites whose positions coincide.
pub fn coincident_pairs(satellites: &[Satellite], radius: f64) -> Vec<(usize, usize)> {
    let tolerance = COINCIDENCE_TOLERANCE * radius.abs().max(1.0);
    let positions = crate::propagation::positions(satellites);
    let mut pairs = Vec::new();

    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            if (positions[i] - positions[j]).norm() < tolerance {
                pairs.push((i, j));
            }
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuzz_harness::prelude::*;
    use std::collections::BTreeSet;

    fn walker(total: u32, planes: u32, phasing: u32) -> WalkerDelta {
        WalkerDelta {
            total_satellites: total,
            planes,
            phasing,
            inclination_deg: 53.0,
            orbit_radius: 13.0,
            angular_speed: 0.5,
        }
    }

    fn deg(rad: f64) -> i64 {
        (rad.to_degrees() * 1e6).round() as i64
    }

    #[test]
    fn test_twenty_over_four_layout() {
        let sats = walker(20, 4, 0).build().unwrap();
        assert_eq!(sats.len(), 20);

        let raans: BTreeSet<i64> = sats.iter().map(|s| deg(s.raan)).collect();
        let expected: BTreeSet<i64> = [0, 90, 180, 270].iter().map(|d| d * 1_000_000).collect();
        assert_eq!(raans, expected);

        for plane in 0..4 {
            let mut angles: Vec<f64> = sats
                .iter()
                .filter(|s| s.plane == plane)
                .map(|s| s.angle.to_degrees())
                .collect();
            assert_eq!(angles.len(), 5);
            angles.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for pair in angles.windows(2) {
                assert!((pair[1] - pair[0] - 72.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_phase_offset_applied_per_plane() {
        let w = walker(20, 4, 1);
        assert!((w.phase_offset_deg(0) - 0.0).abs() < 1e-12);
        assert!((w.phase_offset_deg(3) - 54.0).abs() < 1e-12);

        let sats = w.build().unwrap();
        let first_of_plane_1 = sats.iter().find(|s| s.plane == 1 && s.slot == 0).unwrap();
        assert!((first_of_plane_1.angle.to_degrees() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_uneven_split_is_configuration_error() {
        let err = walker(20, 6, 1).build().unwrap_err();
        assert!(matches!(err, OrbitalError::Configuration(_)));
    }

    #[test]
    fn test_zero_planes_rejected() {
        assert!(walker(20, 0, 0).build().is_err());
        assert!(walker(0, 4, 0).build().is_err());
    }

    #[test]
    fn test_nodal_coincidence_detected() {
        // Plane 2 (RAAN 180°) carries a satellite at 180° which lands on plane 0's slot 0.
        let w = walker(20, 4, 1);
        assert!(w.build().is_ok());
        let err = w.build_distinct().unwrap_err();
        assert!(matches!(err, OrbitalError::Configuration(_)));
    }

    #[test]
    fn test_hero_preset_is_distinct() {
        let sats = WalkerDelta::hero().build_distinct().unwrap();
        assert_eq!(sats.len(), 24);
    }

    #[test]
    fn test_dashboard_preset_counts() {
        let w = WalkerDelta::dashboard();
        assert_eq!(w.satellites_per_plane(), 25);
        assert_eq!(w.build().unwrap().len(), 500);
    }

    #[test]
    fn test_coverage_latitude() {
        assert_eq!(walker(4, 1, 0).coverage_latitude_deg(), 53.0);
        let retro = WalkerDelta { inclination_deg: 97.5, ..walker(4, 1, 0) };
        assert!((retro.coverage_latitude_deg() - 82.5).abs() < 1e-12);
    }

    #[test]
    fn test_ids_are_dense_and_unique() {
        let sats = walker(12, 3, 1).build().unwrap();
        let ids: Vec<u32> = sats.iter().map(|s| s.id).collect();
        assert_eq!(ids, (0..12).collect::<Vec<_>>());
    }

    proptest! {
        #[test]
        fn prop_build_respects_divisibility((total, planes, phasing) in walker_pattern()) {
            let result = walker(total, planes, phasing).build();
            if total % planes == 0 {
                prop_assert_eq!(result.unwrap().len() as u32, total);
            } else {
                prop_assert!(result.is_err());
            }
        }
    }
}
