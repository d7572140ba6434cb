//! Live event storage with a FIFO capacity bound.

use crate::firms::FireRecord;
use crate::{EventError, GroundEvent, Lifetime, Result, Site};
use std::collections::VecDeque;
use tracing::debug;

/// Result of inserting an event.
#[derive(Debug)]
pub struct Insertion {
    pub id: u64,
    /// Oldest event, dropped to make room.
    pub evicted: Option<GroundEvent>,
}

/// Owns every live ground event, oldest first.
#[derive(Debug)]
pub struct EventRegistry {
    events: VecDeque<GroundEvent>,
    capacity: usize,
    next_id: u64,
}

impl EventRegistry {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EventError::InvalidCapacity);
        }
        Ok(Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            next_id: 1,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&GroundEvent> {
        self.events.iter().find(|e| e.id() == id)
    }

    /// Events in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &GroundEvent> {
        self.events.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GroundEvent> {
        self.events.iter_mut()
    }

    /// Add an event, evicting the oldest one first when the registry is full.
    pub fn insert(&mut self, site: Site, now: f64, lifetime: Lifetime) -> Insertion {
        self.push(GroundEvent::new(self.next_id, site, now, lifetime))
    }

    /// Add an event built from a feed record on a sphere of `surface_radius`.
    pub fn insert_record(
        &mut self,
        record: &FireRecord,
        surface_radius: f64,
        now: f64,
        lifetime: Lifetime,
    ) -> Result<Insertion> {
        let site = Site::on_sphere(record.latitude, record.longitude, surface_radius)?;
        let event = GroundEvent::new(self.next_id, site, now, lifetime)
            .with_attributes(record.attributes());
        Ok(self.push(event))
    }

    fn push(&mut self, event: GroundEvent) -> Insertion {
        let evicted = if self.events.len() >= self.capacity {
            self.events.pop_front()
        } else {
            None
        };
        if let Some(old) = &evicted {
            debug!("Registry full ({}), evicted event {}", self.capacity, old.id());
        }

        let id = event.id();
        self.next_id += 1;
        self.events.push_back(event);

        Insertion { id, evicted }
    }

    /// Age every event by `dt` and drop those past their fade window.
    pub fn tick(&mut self, dt: f64) -> Vec<GroundEvent> {
        for event in self.events.iter_mut() {
            event.advance(dt);
        }

        // One rotation through the queue keeps survivors in creation order.
        let mut removed = Vec::new();
        for _ in 0..self.events.len() {
            let Some(event) = self.events.pop_front() else {
                break;
            };
            if event.is_removable() {
                removed.push(event);
            } else {
                self.events.push_back(event);
            }
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Confidence, EventPhase};
    use fuzz_harness::prelude::*;

    fn site() -> Site {
        Site::on_sphere(0.0, 0.0, 10.1).unwrap()
    }

    fn life(max: f64, fade: f64) -> Lifetime {
        Lifetime::new(max, fade).unwrap()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(EventRegistry::new(0), Err(EventError::InvalidCapacity)));
    }

    #[test]
    fn test_ids_increase() {
        let mut reg = EventRegistry::new(4).unwrap();
        let a = reg.insert(site(), 0.0, life(1.0, 0.0)).id;
        let b = reg.insert(site(), 0.0, life(1.0, 0.0)).id;
        assert!(b > a);
        assert_eq!(reg.len(), 2);
        assert!(reg.get(a).is_some());
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut reg = EventRegistry::new(3).unwrap();
        let ids: Vec<u64> = (0..3).map(|_| reg.insert(site(), 0.0, life(5.0, 1.0)).id).collect();

        let overflow = reg.insert(site(), 1.0, life(5.0, 1.0));
        assert_eq!(overflow.evicted.map(|e| e.id()), Some(ids[0]));
        assert_eq!(reg.len(), 3);

        let live: Vec<u64> = reg.iter().map(|e| e.id()).collect();
        assert_eq!(live, vec![ids[1], ids[2], overflow.id]);
    }

    #[test]
    fn test_removal_boundary() {
        let mut reg = EventRegistry::new(8).unwrap();
        let id = reg.insert(site(), 0.0, life(10_000.0, 1_000.0)).id;

        assert!(reg.tick(10_999.0).is_empty());
        assert!(reg.get(id).is_some());

        assert!(reg.tick(1.0).is_empty());
        assert_eq!(reg.get(id).unwrap().phase(), EventPhase::Fading { detected: false });

        let removed = reg.tick(0.001);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id(), id);
        assert!(reg.get(id).is_none());
    }

    #[test]
    fn test_insert_record_carries_attributes() {
        let mut reg = EventRegistry::new(4).unwrap();
        let mut record = FireRecord::new(-12.41, 131.02);
        record.bright_ti4 = Some(341.2);
        record.frp = Some(12.6);
        record.confidence = Some(Confidence::High);

        let id = reg.insert_record(&record, 10.1, 0.0, Lifetime::persistent()).unwrap().id;
        let event = reg.get(id).unwrap();
        let attrs = event.attributes().unwrap();
        assert_eq!(attrs.brightness_k, Some(341.2));
        assert_eq!(attrs.frp_mw, Some(12.6));
        assert_eq!(attrs.confidence, Some(Confidence::High));
        assert!((event.site().latitude + 12.41).abs() < 1e-12);
        assert!((event.position().norm() - 10.1).abs() < 1e-9);
    }

    #[test]
    fn test_insert_record_rejects_bad_coordinates() {
        let mut reg = EventRegistry::new(4).unwrap();
        let err = reg
            .insert_record(&FireRecord::new(95.0, 0.0), 10.1, 0.0, Lifetime::persistent())
            .unwrap_err();
        assert!(matches!(err, EventError::Orbital(_)));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_tick_preserves_creation_order() {
        let mut reg = EventRegistry::new(8).unwrap();
        let short = reg.insert(site(), 0.0, life(1.0, 0.0)).id;
        let a = reg.insert(site(), 0.0, life(100.0, 0.0)).id;
        let middle = reg.insert(site(), 0.0, life(1.5, 0.0)).id;
        let b = reg.insert(site(), 0.0, life(100.0, 0.0)).id;

        let removed: Vec<u64> = reg.tick(2.0).iter().map(|e| e.id()).collect();
        assert_eq!(removed, vec![short, middle]);
        assert_eq!(reg.iter().map(|e| e.id()).collect::<Vec<_>>(), vec![a, b]);
    }

    proptest! {
        #[test]
        fn prop_registry_never_exceeds_capacity(cap in capacity(), inserts in 0usize..200) {
            let mut reg = EventRegistry::new(cap).unwrap();
            let mut evictions = 0;
            for _ in 0..inserts {
                if reg.insert(site(), 0.0, life(1.0, 0.0)).evicted.is_some() {
                    evictions += 1;
                }
                prop_assert!(reg.len() <= cap);
            }
            prop_assert_eq!(evictions, inserts.saturating_sub(cap));
        }

        #[test]
        fn prop_exists_until_life_plus_fade(max in event_life(), fade in fade_window()) {
            let mut reg = EventRegistry::new(1).unwrap();
            let id = reg.insert(site(), 0.0, life(max, fade)).id;
            reg.tick(max + fade);
            prop_assert!(reg.get(id).is_some());
            reg.tick(1e-3 * (max + fade).max(1.0));
            prop_assert!(reg.get(id).is_none());
        }
    }
}
