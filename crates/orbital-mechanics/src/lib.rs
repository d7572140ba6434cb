//! Orbital Mechanics Library
//!
//! Walker Delta constellation construction, circular-orbit kinematic propagation
//! and sphere coordinate transforms for the fire-watch constellation.
//!
//! Frame convention: the planet centre is the origin and +Y is the polar axis.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod propagation;
pub mod walker;

pub use walker::WalkerDelta;

/// Cartesian position or direction in scene units.
pub type Vec3 = Vector3<f64>;

#[derive(Error, Debug)]
pub enum OrbitalError {
    #[error("Invalid constellation configuration: {0}")]
    Configuration(String),
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// One member of the constellation.
///
/// The static elements (`radius`, `angular_speed`, `inclination`, `raan`) never
/// change after construction; `angle` is the only state the propagator mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Satellite {
    pub id: u32,
    pub label: String,
    pub plane: u32,
    pub slot: u32,
    /// Orbital radius from the planet centre.
    pub radius: f64,
    /// Radians per time unit.
    pub angular_speed: f64,
    /// Current anomaly in radians, always in `[0, 2π)`.
    pub angle: f64,
    /// Radians.
    pub inclination: f64,
    /// Radians.
    pub raan: f64,
    /// Set by the simulation when the satellite holds at least one line of sight this tick.
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Satellite {
    pub fn new(
        id: u32,
        plane: u32,
        slot: u32,
        radius: f64,
        angular_speed: f64,
        angle: f64,
        inclination: f64,
        raan: f64,
    ) -> Self {
        Self {
            id,
            label: format!("P{:02}-S{:02}", plane, slot),
            plane,
            slot,
            radius,
            angular_speed,
            angle: propagation::wrap_angle(angle),
            inclination,
            raan,
            visible: false,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position_at(self.angle)
    }

    /// Position the satellite would occupy at `angle`, keeping its other elements.
    pub fn position_at(&self, angle: f64) -> Vec3 {
        propagation::position(angle, self.inclination, self.raan, self.radius)
    }

    /// Anomaly after advancing `dt` time units, without committing it.
    pub fn candidate_angle(&self, dt: f64) -> f64 {
        propagation::wrap_angle(self.angle + self.angular_speed * dt)
    }

    pub fn advance(&mut self, dt: f64) {
        self.angle = self.candidate_angle(dt);
    }

    /// Unit vector from the satellite towards the planet centre.
    pub fn nadir(&self) -> Vec3 {
        -self.position().normalize()
    }

    /// Sub-satellite point; altitude is measured above `reference_radius`.
    pub fn ground_track(&self, reference_radius: f64) -> GeodeticPosition {
        transforms::cartesian_to_geodetic(&self.position(), reference_radius)
    }
}

pub mod transforms {
    use super::*;

    /// Mean Earth radius used for great-circle distances.
    pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.0;

    pub fn is_valid_latitude(lat: f64) -> bool {
        (-90.0..=90.0).contains(&lat) && lat.is_finite()
    }

    pub fn is_valid_longitude(lon: f64) -> bool {
        (-180.0..=180.0).contains(&lon) && lon.is_finite()
    }

    /// Point at (`lat_deg`, `lon_deg`) on a sphere of `radius` centred on the origin.
    pub fn geodetic_to_cartesian(lat_deg: f64, lon_deg: f64, radius: f64) -> Result<Vec3> {
        if !is_valid_latitude(lat_deg) || !is_valid_longitude(lon_deg) {
            return Err(OrbitalError::InvalidCoordinates(format!(
                "lat={}, lon={}",
                lat_deg, lon_deg
            )));
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(OrbitalError::InvalidCoordinates(format!("radius={}", radius)));
        }

        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();

        Ok(Vec3::new(
            radius * lat.cos() * lon.cos(),
            radius * lat.sin(),
            radius * lat.cos() * lon.sin(),
        ))
    }

    pub fn cartesian_to_geodetic(p: &Vec3, reference_radius: f64) -> GeodeticPosition {
        let r = p.norm();
        let horizontal = (p.x * p.x + p.z * p.z).sqrt();

        GeodeticPosition {
            latitude: p.y.atan2(horizontal).to_degrees(),
            longitude: p.z.atan2(p.x).to_degrees(),
            altitude: r - reference_radius,
        }
    }

    /// Great-circle distance between two lat/lon points (degrees) on a sphere of `radius`.
    pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64, radius: f64) -> f64 {
        let phi1 = lat1.to_radians();
        let phi2 = lat2.to_radians();
        let d_phi = (lat2 - lat1).to_radians();
        let d_lambda = (lon2 - lon1).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        2.0 * radius * a.sqrt().min(1.0).asin()
    }

    pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
        haversine(lat1, lon1, lat2, lon2, EARTH_MEAN_RADIUS_KM)
    }
}

#[cfg(test)]
mod tests {
    use super::transforms::*;
    use super::*;
    use fuzz_harness::prelude::*;

    #[test]
    fn test_geodetic_round_trip_axes() {
        let north = geodetic_to_cartesian(90.0, 0.0, 10.0).unwrap();
        assert!((north.y - 10.0).abs() < 1e-12);

        let p = geodetic_to_cartesian(0.0, 90.0, 10.0).unwrap();
        assert!(p.x.abs() < 1e-12);
        assert!((p.z - 10.0).abs() < 1e-12);

        let g = cartesian_to_geodetic(&geodetic_to_cartesian(-33.9, 151.2, 6371.0).unwrap(), 6371.0);
        assert!((g.latitude + 33.9).abs() < 1e-9);
        assert!((g.longitude - 151.2).abs() < 1e-9);
        assert!(g.altitude.abs() < 1e-6);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        assert!(geodetic_to_cartesian(91.0, 0.0, 1.0).is_err());
        assert!(geodetic_to_cartesian(0.0, -180.5, 1.0).is_err());
        assert!(geodetic_to_cartesian(f64::NAN, 0.0, 1.0).is_err());
        assert!(geodetic_to_cartesian(0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_haversine_quarter_meridian() {
        let d = haversine_km(0.0, 0.0, 90.0, 0.0);
        let expected = std::f64::consts::FRAC_PI_2 * EARTH_MEAN_RADIUS_KM;
        assert!((d - expected).abs() < 1e-6);
        assert_eq!(haversine_km(12.5, -40.0, 12.5, -40.0), 0.0);
    }

    #[test]
    fn test_satellite_label_and_nadir() {
        let sat = Satellite::new(7, 3, 12, 13.0, 0.5, 0.0, 0.0, 0.0);
        assert_eq!(sat.label, "P03-S12");
        let nadir = sat.nadir();
        assert!((nadir - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_ground_track_latitude_bounded_by_inclination() {
        let incl = 53f64.to_radians();
        let sat = Satellite::new(0, 0, 0, 13.0, 1.0, std::f64::consts::FRAC_PI_2, incl, 0.0);
        let g = sat.ground_track(10.0);
        assert!((g.latitude - 53.0).abs() < 1e-9);
        assert!((g.altitude - 3.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_geodetic_round_trip((lat, lon) in lat_lon(), radius in orbit_radius()) {
            let p = geodetic_to_cartesian(lat, lon, radius).unwrap();
            prop_assert!((p.norm() - radius).abs() < 1e-9 * radius);

            let g = cartesian_to_geodetic(&p, radius);
            prop_assert!((g.latitude - lat).abs() < 1e-9);
            prop_assert!(g.altitude.abs() < 1e-9 * radius);
            // Longitude is degenerate at the poles; compare positions on the unit sphere.
            prop_assert!(haversine(lat, lon, g.latitude, g.longitude, 1.0) < 1e-9);
        }
    }
}
