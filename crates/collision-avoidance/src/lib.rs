//! Collision Avoidance Library
//!
//! Minimum-separation screening for the constellation propagator. Before a
//! satellite commits its next anomaly the candidate position is checked against
//! every other satellite; a conflict makes the satellite wait one tick.
//!
//! The wait is a stall, not a replanning manoeuvre. It is bounded: after
//! `max_consecutive_stalls` blocked ticks in a row the next advance is forced.

use orbital_mechanics::{Satellite, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CollisionError {
    #[error("Invalid separation config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CollisionError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Grade a miss distance against the minimum allowed separation.
    pub fn assess(miss_distance: f64, min_separation: f64) -> Self {
        if min_separation <= 0.0 {
            return RiskLevel::None;
        }
        match miss_distance / min_separation {
            r if r < 0.25 => RiskLevel::Critical,
            r if r < 0.50 => RiskLevel::High,
            r if r < 0.75 => RiskLevel::Medium,
            r if r < 1.00 => RiskLevel::Low,
            _ => RiskLevel::None,
        }
    }
}

/// A candidate move that would bring two satellites too close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConjunctionEvent {
    /// Satellite whose advance was tested.
    pub primary: u32,
    /// Satellite it would have approached.
    pub secondary: u32,
    pub miss_distance: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeparationConfig {
    /// Minimum distance between any two satellites, scene units.
    pub min_separation: f64,
    /// Consecutive blocked ticks tolerated before an advance is forced.
    pub max_consecutive_stalls: u32,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            min_separation: 0.25,
            max_consecutive_stalls: 3,
        }
    }
}

impl SeparationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_separation.is_finite() && self.min_separation >= 0.0) {
            return Err(CollisionError::InvalidConfig(format!(
                "min_separation must be a non-negative number, got {}",
                self.min_separation
            )));
        }
        Ok(())
    }
}

/// Outcome of one guarded propagation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeparationReport {
    /// Satellites that held their angle this tick.
    pub stalled: Vec<u32>,
    /// Satellites that advanced despite a conflict because their stall budget ran out.
    pub forced: Vec<u32>,
    pub conjunctions: Vec<ConjunctionEvent>,
}

impl SeparationReport {
    pub fn is_clear(&self) -> bool {
        self.stalled.is_empty() && self.forced.is_empty()
    }
}

/// Propagator pass with minimum-separation checks.
///
/// Stall counters are kept per satellite index, so the guard must always be
/// used with the same satellite list.
pub struct SeparationGuard {
    config: SeparationConfig,
    stall_counts: Vec<u32>,
}

impl SeparationGuard {
    pub fn new(config: SeparationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stall_counts: Vec::new(),
        })
    }

    pub fn config(&self) -> &SeparationConfig {
        &self.config
    }

    pub fn stall_count(&self, index: usize) -> u32 {
        self.stall_counts.get(index).copied().unwrap_or(0)
    }

    /// Advance every satellite by `dt`, in list order.
    ///
    /// Each candidate position is screened against the current positions of all
    /// other satellites, including those already moved this tick.
    pub fn advance(&mut self, satellites: &mut [Satellite], dt: f64) -> SeparationReport {
        if self.stall_counts.len() != satellites.len() {
            self.stall_counts.resize(satellites.len(), 0);
        }

        let mut positions: Vec<Vec3> = orbital_mechanics::propagation::positions(satellites);
        let mut report = SeparationReport::default();

        for idx in 0..satellites.len() {
            let candidate_angle = satellites[idx].candidate_angle(dt);
            let candidate = satellites[idx].position_at(candidate_angle);

            let conflicts = self.screen(satellites, &positions, idx, &candidate);

            if conflicts.is_empty() {
                self.stall_counts[idx] = 0;
            } else if self.stall_counts[idx] >= self.config.max_consecutive_stalls {
                warn!(
                    "{} forced to advance after {} stalled ticks",
                    satellites[idx].label, self.stall_counts[idx]
                );
                self.stall_counts[idx] = 0;
                report.forced.push(satellites[idx].id);
                report.conjunctions.extend(conflicts);
            } else {
                self.stall_counts[idx] += 1;
                debug!(
                    "{} holding position ({} consecutive)",
                    satellites[idx].label, self.stall_counts[idx]
                );
                report.stalled.push(satellites[idx].id);
                report.conjunctions.extend(conflicts);
                continue;
            }

            satellites[idx].angle = candidate_angle;
            positions[idx] = candidate;
        }

        report
    }

    fn screen(
        &self,
        satellites: &[Satellite],
        positions: &[Vec3],
        idx: usize,
        candidate: &Vec3,
    ) -> Vec<ConjunctionEvent> {
        let min = self.config.min_separation;
        positions
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != idx)
            .filter_map(|(other, pos)| {
                let miss = (candidate - pos).norm();
                (miss < min).then(|| ConjunctionEvent {
                    primary: satellites[idx].id,
                    secondary: satellites[other].id,
                    miss_distance: miss,
                    risk_level: RiskLevel::assess(miss, min),
                })
            })
            .collect()
    }
}
