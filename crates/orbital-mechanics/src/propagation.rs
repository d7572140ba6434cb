//! Circular-orbit kinematic propagation.
//!
//! Not a Keplerian propagator: every orbit is a circle of fixed radius swept at
//! constant angular speed. Position is a pure function of the anomaly and the
//! plane orientation, so re-evaluating the same angle always gives the same point.

use crate::{Satellite, Vec3};
use std::f64::consts::TAU;

/// Fold `angle` into `[0, 2π)`.
///
/// `rem_euclid` can round up to exactly `2π` for tiny negative inputs, which is
/// folded back to zero.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Orbital-plane coordinates rotated by inclination, then by RAAN about the polar (Y) axis.
pub fn position(angle: f64, inclination: f64, raan: f64, radius: f64) -> Vec3 {
    let (sin_a, cos_a) = angle.sin_cos();
    let (sin_i, cos_i) = inclination.sin_cos();
    let (sin_o, cos_o) = raan.sin_cos();

    let x_orbit = radius * cos_a;
    let y_orbit = radius * sin_a * sin_i;
    let z_orbit = radius * sin_a * cos_i;

    Vec3::new(
        x_orbit * cos_o - z_orbit * sin_o,
        y_orbit,
        x_orbit * sin_o + z_orbit * cos_o,
    )
}

/// Unguarded propagator pass: every satellite advances by `angular_speed * dt`.
pub fn advance_all(satellites: &mut [Satellite], dt: f64) {
    for sat in satellites.iter_mut() {
        sat.advance(dt);
    }
}

/// Current positions in satellite order.
pub fn positions(satellites: &[Satellite]) -> Vec<Vec3> {
    satellites.iter().map(Satellite::position).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuzz_harness::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn sat(angle: f64, speed: f64) -> Satellite {
        Satellite::new(0, 0, 0, 13.0, speed, angle, 53f64.to_radians(), 1.0)
    }

    #[test]
    fn test_wrap_angle() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert!((wrap_angle(TAU + 0.25) - 0.25).abs() < 1e-12);
        assert!((wrap_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-12);
        let tiny = wrap_angle(-1e-18);
        assert!(tiny >= 0.0 && tiny < TAU);
    }

    #[test]
    fn test_position_on_sphere_of_radius() {
        for k in 0..16 {
            let angle = k as f64 * PI / 8.0;
            let p = position(angle, 0.7, 2.1, 13.0);
            assert!((p.norm() - 13.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_equatorial_orbit_stays_in_plane() {
        let p = position(FRAC_PI_2, 0.0, 0.0, 5.0);
        assert!(p.y.abs() < 1e-12);
        assert!((p.z - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_polar_orbit_reaches_pole() {
        let p = position(FRAC_PI_2, FRAC_PI_2, 0.0, 5.0);
        assert!((p.y - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_advance_all_moves_every_satellite() {
        let mut sats = vec![sat(0.0, 0.5), sat(1.0, 0.25)];
        advance_all(&mut sats, 2.0);
        assert!((sats[0].angle - 1.0).abs() < 1e-12);
        assert!((sats[1].angle - 1.5).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_angle_stays_wrapped(start in anomaly_rad(), speed in angular_speed(), dt in tick_dt(), ticks in 1usize..200) {
            let mut s = sat(start, speed);
            for _ in 0..ticks {
                s.advance(dt);
                prop_assert!(s.angle >= 0.0 && s.angle < TAU);
            }
        }

        #[test]
        fn prop_propagation_is_deterministic(start in anomaly_rad(), speed in angular_speed(), dt in tick_dt()) {
            let mut a = sat(start, speed);
            let mut b = sat(start, speed);
            a.advance(dt);
            b.advance(dt);
            prop_assert_eq!(a.angle, b.angle);
            prop_assert_eq!(a.position(), b.position());
        }

        #[test]
        fn prop_wrap_angle_folds_any_turn(angle in unwrapped_angle_rad()) {
            let w = wrap_angle(angle);
            prop_assert!((0.0..TAU).contains(&w));
            let turns = (angle - w) / TAU;
            prop_assert!((turns - turns.round()).abs() < 1e-9);
        }

        #[test]
        fn prop_position_lies_on_orbit_sphere(
            angle in anomaly_rad(),
            incl in inclination_deg(),
            raan in raan_rad(),
            radius in orbit_radius(),
        ) {
            let incl = incl.to_radians();
            let p = position(angle, incl, raan, radius);
            prop_assert!((p.norm() - radius).abs() < 1e-9 * radius);
            prop_assert!(p.y.abs() <= radius * incl.sin().abs() + 1e-9 * radius);
        }
    }
}
