//! Mixed-fleet vehicle spawning.
//!
//! Keeps the simulated population near a target count, drawing each new
//! vehicle's class from the configured AV penetration rate.

use crate::network::EdgeId;
use crate::query::{TrafficQuery, VehicleClass};
use crate::units;
use log::warn;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// At most this many vehicles are added per tick.
const MAX_SPAWNS_PER_TICK: usize = 5;

/// Attempts per spawn before giving up on finding a routable pair.
const MAX_SPAWN_ATTEMPTS: usize = 10;

/// Spawns vehicles to hold the population at a target count.
pub struct MixedTrafficSpawner<R: Rng> {
    /// The population to maintain.
    target: usize,
    /// Probability that a spawned vehicle is autonomous.
    penetration: f64,
    /// Mean depart speed in km/h.
    depart_speed: f64,
    /// Multiplicative jitter on the depart speed, clamped to 0.75..=1.25.
    depart_jitter: Normal<f64>,
    rng: R,
    next_id: usize,
}

impl<R: Rng> MixedTrafficSpawner<R> {
    /// Creates a spawner.
    ///
    /// # Panics
    /// Panics if `penetration` is not within `0.0..=1.0`.
    pub fn new(target: usize, penetration: f64, depart_speed_kmh: f64, rng: R) -> Self {
        assert!(
            (0.0..=1.0).contains(&penetration),
            "penetration rate must be between 0 and 1"
        );
        Self {
            target,
            penetration,
            depart_speed: depart_speed_kmh,
            depart_jitter: Normal::new(1.0, 0.1).expect("invalid standard deviation"),
            rng,
            next_id: 0,
        }
    }

    /// Tops up the population and returns the number of vehicles added.
    /// The caller decides when to stop calling this near run end.
    pub fn tick(&mut self, query: &mut dyn TrafficQuery) -> usize {
        let current = query.vehicle_ids().len();
        if current >= self.target {
            return 0;
        }
        let edges = query.edge_ids();
        if edges.len() < 2 {
            return 0;
        }

        let shortage = (self.target - current).min(MAX_SPAWNS_PER_TICK);
        let mut added = 0;
        for _ in 0..shortage {
            if self.spawn_one(query, &edges) {
                added += 1;
            }
        }
        added
    }

    fn spawn_one(&mut self, query: &mut dyn TrafficQuery, edges: &[EdgeId]) -> bool {
        let class = if self.rng.gen::<f64>() < self.penetration {
            VehicleClass::Autonomous
        } else {
            VehicleClass::Conventional
        };
        let id = format!("gen_{}", self.next_id);
        self.next_id += 1;

        let factor = self.depart_jitter.sample(&mut self.rng).clamp(0.75, 1.25);
        let depart = units::kmh_to_ms(self.depart_speed * factor);

        for _ in 0..MAX_SPAWN_ATTEMPTS {
            // Pick a distinct from/to pair.
            let from = self.rng.gen_range(0..edges.len());
            let to = (from + 1 + self.rng.gen_range(0..edges.len() - 1)) % edges.len();
            match query.spawn_vehicle(&id, class, &edges[from], &edges[to], depart) {
                Ok(()) => return true,
                // No route between the pair; try another one.
                Err(_) => continue,
            }
        }
        warn!("no routable edge pair found for {}", id);
        false
    }
}
