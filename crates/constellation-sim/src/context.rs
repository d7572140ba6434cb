//! The tick loop.

use crate::{Result, SimulationConfig};
use chrono::{DateTime, Utc};
use collision_avoidance::{SeparationGuard, SeparationReport};
use fire_detection::{DetectionEngine, LineOfSight, ObscurantField};
use fire_events::{
    AnyTerrain, DetectionRecord, EventPhase, EventRegistry, EventSpawner, FireAttributes,
    FireRecord, LandClassifier, LatitudeBand, SiteSelector, SpawnOutcome,
};
use orbital_mechanics::{propagation, Satellite};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Everything that happened during one tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickReport {
    pub generation: u64,
    pub time: f64,
    /// Present only when the separation guard is enabled.
    pub separation: Option<SeparationReport>,
    pub removed: Vec<u64>,
    pub spawned: Option<u64>,
    /// A spawn was due but no site was accepted.
    pub spawn_skipped: bool,
    pub evicted: Option<u64>,
    pub lines: Vec<LineOfSight>,
    pub newly_detected: Vec<u64>,
    pub visible_satellites: usize,
    pub live_events: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub final_generation: u64,
    pub sim_time: f64,
    pub satellites: usize,
    pub events_spawned: u64,
    pub spawns_skipped: u64,
    pub events_evicted: u64,
    pub events_removed: u64,
    pub detections: u64,
    pub thermal_lines: u64,
    pub line_of_sight_total: u64,
    pub max_lines_per_tick: usize,
    pub stalls: u64,
    pub forced_advances: u64,
    pub conjunctions: u64,
    pub live_events: usize,
    pub live_detected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteSnapshot {
    pub id: u32,
    pub label: String,
    pub position: [f64; 3],
    pub latitude: f64,
    pub longitude: f64,
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub phase: EventPhase,
    pub opacity: f64,
    pub age: f64,
    pub first_detection: Option<DetectionRecord>,
    pub detected_by: Vec<u32>,
    pub attributes: Option<FireAttributes>,
}

/// Outcome of feeding fire records into the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub inserted: usize,
    /// Records whose coordinates could not be placed on the surface.
    pub skipped: usize,
    /// Events dropped to make room for feed records.
    pub evicted: Vec<u64>,
}

impl IngestReport {
    fn absorb(&mut self, other: &IngestReport) {
        self.inserted += other.inserted;
        self.skipped += other.skipped;
        self.evicted.extend_from_slice(&other.evicted);
    }
}

/// JSON document written by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub config: SimulationConfig,
    pub summary: RunSummary,
    /// Totals over every feed ingestion into this context.
    pub feed: IngestReport,
    pub satellites: Vec<SatelliteSnapshot>,
    pub events: Vec<EventSnapshot>,
}

pub struct SimulationContext {
    config: SimulationConfig,
    satellites: Vec<Satellite>,
    registry: EventRegistry,
    obscurants: ObscurantField,
    engine: DetectionEngine,
    guard: Option<SeparationGuard>,
    spawner: EventSpawner,
    classifier: Box<dyn LandClassifier>,
    rng: StdRng,
    generation: u64,
    time: f64,
    feed: IngestReport,
}

impl SimulationContext {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let satellites = config.constellation.build()?;
        let registry = EventRegistry::new(config.events.capacity)?;
        let engine = DetectionEngine::new(config.detection)?;
        let guard = config.separation.map(SeparationGuard::new).transpose()?;

        let band = LatitudeBand::from_coverage(config.constellation.coverage_latitude_deg());
        let selector = SiteSelector::new(band, config.surface_radius, config.events.site_attempts);
        let spawner = EventSpawner::new(config.events.spawn, selector)?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let obscurants = ObscurantField::scatter(
            &mut rng,
            config.obscurants.count,
            config.surface_radius + config.obscurants.altitude,
            &band,
        );

        info!(
            "Simulation ready: {} satellites, {} planes, inclination {:.1} deg, guard {}",
            satellites.len(),
            config.constellation.planes,
            config.constellation.inclination_deg,
            if guard.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            config,
            satellites,
            registry,
            obscurants,
            engine,
            guard,
            spawner,
            classifier: Box::new(AnyTerrain),
            rng,
            generation: 0,
            time: 0.0,
            feed: IngestReport::default(),
        })
    }

    /// Restrict spawn sites with a land/water classifier.
    pub fn with_classifier(mut self, classifier: Box<dyn LandClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn satellites(&self) -> &[Satellite] {
        &self.satellites
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn obscurants(&self) -> &ObscurantField {
        &self.obscurants
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Add feed records as events. Records that cannot be placed are skipped.
    pub fn ingest_records(&mut self, records: &[FireRecord]) -> IngestReport {
        let lifetime = self.config.feed_lifetime();
        let mut report = IngestReport::default();
        for record in records {
            match self
                .registry
                .insert_record(record, self.config.surface_radius, self.time, lifetime)
            {
                Ok(insertion) => {
                    report.inserted += 1;
                    if let Some(old) = insertion.evicted {
                        debug!("Feed record evicted event {}", old.id());
                        report.evicted.push(old.id());
                    }
                }
                Err(e) => {
                    report.skipped += 1;
                    warn!(
                        "Skipping fire record at ({}, {}): {}",
                        record.latitude, record.longitude, e
                    );
                }
            }
        }
        info!(
            "Ingested {} of {} fire records ({} evicted)",
            report.inserted,
            records.len(),
            report.evicted.len()
        );
        self.feed.absorb(&report);
        report
    }

    pub fn feed_report(&self) -> &IngestReport {
        &self.feed
    }

    pub fn tick(&mut self) -> TickReport {
        let dt = self.config.tick_dt;

        let separation = match self.guard.as_mut() {
            Some(guard) => Some(guard.advance(&mut self.satellites, dt)),
            None => {
                propagation::advance_all(&mut self.satellites, dt);
                None
            }
        };

        // Positions for this generation are final from here on.
        self.generation += 1;
        self.time += dt;

        let removed: Vec<u64> = self.registry.tick(dt).iter().map(|e| e.id()).collect();
        self.obscurants.drift(dt, self.config.obscurants.drift_rate);

        let spawn = self.spawner.maybe_spawn(
            &mut self.registry,
            &mut self.rng,
            &*self.classifier,
            self.time,
        );
        let (spawned, evicted) = match spawn {
            SpawnOutcome::Spawned { id, evicted } => (Some(id), evicted),
            SpawnOutcome::Skipped => {
                debug!("Generation {}: spawn due but no site accepted", self.generation);
                (None, None)
            }
            SpawnOutcome::Idle => (None, None),
        };

        let outcome = self.engine.evaluate(
            &self.satellites,
            self.registry.iter_mut(),
            self.obscurants.as_slice(),
            self.time,
        );

        let visible: BTreeSet<u32> = outcome.lines.iter().map(|l| l.satellite_id).collect();
        for sat in self.satellites.iter_mut() {
            sat.visible = visible.contains(&sat.id);
        }

        TickReport {
            generation: self.generation,
            time: self.time,
            separation,
            removed,
            spawned,
            spawn_skipped: spawn == SpawnOutcome::Skipped,
            evicted,
            lines: outcome.lines,
            newly_detected: outcome.newly_detected,
            visible_satellites: visible.len(),
            live_events: self.registry.len(),
        }
    }

    pub fn run(&mut self, ticks: u64) -> RunSummary {
        let mut summary = RunSummary {
            satellites: self.satellites.len(),
            ..RunSummary::default()
        };

        for _ in 0..ticks {
            let report = self.tick();

            summary.ticks += 1;
            summary.events_removed += report.removed.len() as u64;
            summary.events_spawned += report.spawned.is_some() as u64;
            summary.spawns_skipped += report.spawn_skipped as u64;
            summary.events_evicted += report.evicted.is_some() as u64;
            summary.detections += report.newly_detected.len() as u64;
            summary.line_of_sight_total += report.lines.len() as u64;
            summary.thermal_lines += report
                .lines
                .iter()
                .filter(|l| l.mode == fire_detection::SensingMode::ThermalInfrared)
                .count() as u64;
            summary.max_lines_per_tick = summary.max_lines_per_tick.max(report.lines.len());

            if let Some(sep) = &report.separation {
                summary.stalls += sep.stalled.len() as u64;
                summary.forced_advances += sep.forced.len() as u64;
                summary.conjunctions += sep.conjunctions.len() as u64;
            }
        }

        summary.final_generation = self.generation;
        summary.sim_time = self.time;
        summary.live_events = self.registry.len();
        summary.live_detected = self.registry.iter().filter(|e| e.is_detected()).count();

        info!(
            "Ran {} ticks: {} spawned, {} removed, {} detections, {} live ({} detected)",
            summary.ticks,
            summary.events_spawned,
            summary.events_removed,
            summary.detections,
            summary.live_events,
            summary.live_detected
        );
        summary
    }

    pub fn satellite_snapshots(&self) -> Vec<SatelliteSnapshot> {
        self.satellites
            .iter()
            .map(|sat| {
                let p = sat.position();
                let track = sat.ground_track(self.config.planet_radius);
                SatelliteSnapshot {
                    id: sat.id,
                    label: sat.label.clone(),
                    position: [p.x, p.y, p.z],
                    latitude: track.latitude,
                    longitude: track.longitude,
                    visible: sat.visible,
                }
            })
            .collect()
    }

    pub fn event_snapshots(&self) -> Vec<EventSnapshot> {
        self.registry
            .iter()
            .map(|e| EventSnapshot {
                id: e.id(),
                latitude: e.site().latitude,
                longitude: e.site().longitude,
                phase: e.phase(),
                opacity: e.opacity(),
                age: e.age(),
                first_detection: e.first_detection().copied(),
                detected_by: e.detected_by().iter().copied().collect(),
                attributes: e.attributes().cloned(),
            })
            .collect()
    }

    pub fn report(&self, summary: RunSummary) -> RunReport {
        RunReport {
            generated_at: Utc::now(),
            config: self.config.clone(),
            summary,
            feed: self.feed.clone(),
            satellites: self.satellite_snapshots(),
            events: self.event_snapshots(),
        }
    }
}
