//! Random event spawning.

use crate::site::{LandClassifier, SiteSelector};
use crate::{EventError, EventRegistry, Lifetime, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPolicy {
    /// Chance of a spawn attempt on each tick.
    pub spawn_probability: f64,
    /// Lifetimes are drawn uniformly from `[min_life, max_life]`.
    pub min_life: f64,
    pub max_life: f64,
    pub fade_window: f64,
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        Self {
            spawn_probability: 0.05,
            min_life: 2.0,
            max_life: 5.0,
            fade_window: 0.5,
        }
    }
}

impl SpawnPolicy {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(EventError::InvalidPolicy(format!(
                "spawn_probability must be in [0, 1], got {}",
                self.spawn_probability
            )));
        }
        if !(self.min_life.is_finite() && self.max_life.is_finite())
            || self.min_life <= 0.0
            || self.min_life > self.max_life
        {
            return Err(EventError::InvalidPolicy(format!(
                "need 0 < min_life <= max_life, got [{}, {}]",
                self.min_life, self.max_life
            )));
        }
        Lifetime::new(self.max_life, self.fade_window)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpawnOutcome {
    /// The probability roll said no.
    Idle,
    /// A spawn was due but no acceptable site was found.
    Skipped,
    Spawned { id: u64, evicted: Option<u64> },
}

#[derive(Debug, Clone)]
pub struct EventSpawner {
    policy: SpawnPolicy,
    selector: SiteSelector,
}

impl EventSpawner {
    pub fn new(policy: SpawnPolicy, selector: SiteSelector) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy, selector })
    }

    pub fn policy(&self) -> &SpawnPolicy {
        &self.policy
    }

    pub fn selector(&self) -> &SiteSelector {
        &self.selector
    }

    /// Roll for a spawn this tick and insert the event when a site is found.
    pub fn maybe_spawn<R: Rng + ?Sized>(
        &self,
        registry: &mut EventRegistry,
        rng: &mut R,
        classifier: &dyn LandClassifier,
        now: f64,
    ) -> SpawnOutcome {
        if !rng.gen_bool(self.policy.spawn_probability) {
            return SpawnOutcome::Idle;
        }
        self.spawn(registry, rng, classifier, now)
    }

    /// Spawn unconditionally (subject to site selection).
    pub fn spawn<R: Rng + ?Sized>(
        &self,
        registry: &mut EventRegistry,
        rng: &mut R,
        classifier: &dyn LandClassifier,
        now: f64,
    ) -> SpawnOutcome {
        let Some(site) = self.selector.select(rng, classifier) else {
            return SpawnOutcome::Skipped;
        };

        let max_life = rng.gen_range(self.policy.min_life..=self.policy.max_life);
        let lifetime = Lifetime {
            max_life,
            fade_window: self.policy.fade_window,
        };

        let insertion = registry.insert(site, now, lifetime);
        debug!(
            "Spawned event {} at ({:.2}, {:.2}), life {:.2}",
            insertion.id, site.latitude, site.longitude, max_life
        );

        SpawnOutcome::Spawned {
            id: insertion.id,
            evicted: insertion.evicted.map(|e| e.id()),
        }
    }
}
