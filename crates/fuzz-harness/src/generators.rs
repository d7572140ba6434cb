//! Domain generators for property-based testing.

use proptest::prelude::*;
use std::f64::consts::TAU;

// ============================================================================
// Angles
// ============================================================================

/// Anomaly in radians, `[0, 2π)`.
pub fn anomaly_rad() -> impl Strategy<Value = f64> {
    0.0..TAU
}

/// Any angle in radians including negative and multi-turn values.
pub fn unwrapped_angle_rad() -> impl Strategy<Value = f64> {
    -10.0 * TAU..10.0 * TAU
}

/// Inclination in degrees (0-180)
pub fn inclination_deg() -> impl Strategy<Value = f64> {
    0.0..=180.0
}

/// RAAN in radians
pub fn raan_rad() -> impl Strategy<Value = f64> {
    0.0..TAU
}

// ============================================================================
// Kinematics
// ============================================================================

/// Angular speed in radians per time unit, either direction.
pub fn angular_speed() -> impl Strategy<Value = f64> {
    -5.0..5.0
}

/// Positive tick length.
pub fn tick_dt() -> impl Strategy<Value = f64> {
    1e-3..100.0
}

/// Orbit radius in scene units.
pub fn orbit_radius() -> impl Strategy<Value = f64> {
    10.5..50.0
}

/// Walker T/P/F triple with P >= 1 and T small enough for pairwise checks.
pub fn walker_pattern() -> impl Strategy<Value = (u32, u32, u32)> {
    (1u32..=120, 1u32..=24).prop_flat_map(|(total, planes)| {
        (Just(total), Just(planes), 0u32..planes.max(1))
    })
}

/// Walker pattern whose total always divides evenly across planes.
pub fn even_walker_pattern() -> impl Strategy<Value = (u32, u32, u32)> {
    (1u32..=12, 1u32..=10).prop_flat_map(|(planes, per_plane)| {
        (Just(planes * per_plane), Just(planes), 0u32..planes)
    })
}

// ============================================================================
// Ground sites
// ============================================================================

/// Latitude (-90 to 90 deg)
pub fn latitude_deg() -> impl Strategy<Value = f64> {
    -90.0..=90.0
}

/// Longitude (-180 to 180 deg)
pub fn longitude_deg() -> impl Strategy<Value = f64> {
    -180.0..=180.0
}

/// Latitude/longitude pair
pub fn lat_lon() -> impl Strategy<Value = (f64, f64)> {
    (latitude_deg(), longitude_deg())
}

// ============================================================================
// Events
// ============================================================================

/// Event lifetime in time units.
pub fn event_life() -> impl Strategy<Value = f64> {
    1.0..20_000.0
}

/// Fade window in time units.
pub fn fade_window() -> impl Strategy<Value = f64> {
    0.0..2_000.0
}

/// Registry capacity.
pub fn capacity() -> impl Strategy<Value = usize> {
    1usize..64
}

/// Fire radiative power in MW.
pub fn frp_mw() -> impl Strategy<Value = f64> {
    0.0..500.0
}

/// RNG seed.
pub fn seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}
