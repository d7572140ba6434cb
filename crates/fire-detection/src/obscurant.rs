//! Transient clouds that switch detections to thermal sensing.

use fire_events::LatitudeBand;
use orbital_mechanics::transforms::geodetic_to_cartesian;
use orbital_mechanics::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obscurant {
    pub id: u32,
    pub position: Vec3,
}

/// A set of obscurants sharing one shell radius.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObscurantField {
    obscurants: Vec<Obscurant>,
}

impl ObscurantField {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` obscurants uniformly in longitude inside `band`, at `radius`.
    pub fn scatter<R: Rng + ?Sized>(
        rng: &mut R,
        count: u32,
        radius: f64,
        band: &LatitudeBand,
    ) -> Self {
        let mut obscurants = Vec::with_capacity(count as usize);
        for id in 0..count {
            let lat = rng.gen_range(band.min_lat..=band.max_lat);
            let lon = rng.gen_range(-180.0..180.0);
            match geodetic_to_cartesian(lat, lon, radius) {
                Ok(position) => obscurants.push(Obscurant { id, position }),
                Err(e) => debug!("Obscurant {} not placed: {}", id, e),
            }
        }
        Self { obscurants }
    }

    pub fn push(&mut self, obscurant: Obscurant) {
        self.obscurants.push(obscurant);
    }

    pub fn as_slice(&self) -> &[Obscurant] {
        &self.obscurants
    }

    pub fn len(&self) -> usize {
        self.obscurants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obscurants.is_empty()
    }

    /// Rotate every obscurant about the polar (+Y) axis by `rate * dt` radians.
    pub fn drift(&mut self, dt: f64, rate: f64) {
        let theta = rate * dt;
        if theta == 0.0 {
            return;
        }
        let (sin, cos) = theta.sin_cos();
        for o in self.obscurants.iter_mut() {
            let p = o.position;
            o.position = Vec3::new(p.x * cos - p.z * sin, p.y, p.x * sin + p.z * cos);
        }
    }
}
