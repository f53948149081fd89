//! Intersection stop counting and CO2 accounting over the query boundary.

use crate::network::EdgeId;
use crate::query::{TrafficQuery, VehicleClass};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Speed below which a vehicle counts as standing still, in m/s.
const STOP_SPEED: f64 = 0.1;

/// Minimum standstill duration for a counted stop event, in s.
const MIN_STOP_DURATION: f64 = 2.0;

/// A completed stop event on a tracked edge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StopEvent {
    pub vehicle: String,
    pub class: VehicleClass,
    pub edge: EdgeId,
    /// Simulation time at which the standstill began, in s.
    pub started_at: f64,
}

/// A standstill currently in progress.
struct Standstill {
    edge: EdgeId,
    since: f64,
    counted: bool,
}

/// Counts stop events on a set of tracked approach edges.
///
/// A stop is a standstill of at least [MIN_STOP_DURATION] seconds; one
/// standstill produces at most one event, however long it lasts.
#[derive(Default)]
pub struct StopMonitor {
    tracked: HashSet<EdgeId>,
    standstills: HashMap<String, Standstill>,
    by_edge: HashMap<EdgeId, usize>,
    events: Vec<StopEvent>,
}

impl StopMonitor {
    pub fn new(tracked: impl IntoIterator<Item = EdgeId>) -> Self {
        Self {
            tracked: tracked.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Observes every vehicle once for the current tick.
    pub fn tick(&mut self, query: &dyn TrafficQuery) {
        let now = query.sim_time();
        let mut seen = HashSet::new();

        for vehicle in query.vehicle_ids() {
            let Ok(state) = query.vehicle_state(&vehicle) else {
                continue;
            };
            seen.insert(vehicle.clone());

            if !self.tracked.contains(&state.edge) || state.speed >= STOP_SPEED {
                self.standstills.remove(&vehicle);
                continue;
            }

            let standstill = self
                .standstills
                .entry(vehicle.clone())
                .or_insert(Standstill {
                    edge: state.edge.clone(),
                    since: now,
                    counted: false,
                });
            // A crawl onto the next edge restarts the standstill.
            if standstill.edge != state.edge {
                standstill.edge = state.edge.clone();
                standstill.since = now;
                standstill.counted = false;
            }
            if !standstill.counted && now - standstill.since >= MIN_STOP_DURATION {
                standstill.counted = true;
                *self.by_edge.entry(state.edge.clone()).or_default() += 1;
                debug!("stop counted: {} on {}", vehicle, state.edge);
                self.events.push(StopEvent {
                    vehicle: vehicle.clone(),
                    class: state.class,
                    edge: state.edge.clone(),
                    started_at: standstill.since,
                });
            }
        }

        // Vehicles that left the simulation mid-standstill.
        self.standstills.retain(|vehicle, _| seen.contains(vehicle));
    }

    /// All stop events counted so far.
    pub fn events(&self) -> &[StopEvent] {
        &self.events
    }

    /// The total number of counted stops.
    pub fn total_stops(&self) -> usize {
        self.events.len()
    }

    /// The number of counted stops on one edge.
    pub fn stops_on(&self, edge: &EdgeId) -> usize {
        self.by_edge.get(edge).copied().unwrap_or(0)
    }

    /// The number of counted stops per vehicle class.
    pub fn stops_by_class(&self, class: VehicleClass) -> usize {
        self.events.iter().filter(|e| e.class == class).count()
    }

    /// Clears all state, ready for a new run.
    pub fn reset(&mut self) {
        self.standstills.clear();
        self.by_edge.clear();
        self.events.clear();
    }
}

/// Accumulated CO2 and distance for one vehicle class.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ClassTotals {
    /// Accumulated CO2 in mg.
    pub co2_mg: f64,
    /// Accumulated distance in m.
    pub distance_m: f64,
}

impl ClassTotals {
    /// The emission intensity in mg per km, or 0 if no distance was covered.
    pub fn intensity_mg_per_km(&self) -> f64 {
        if self.distance_m > 0.0 {
            self.co2_mg / (self.distance_m / 1000.0)
        } else {
            0.0
        }
    }
}

/// Accumulates CO2 emissions and travelled distance per vehicle class.
#[derive(Default)]
pub struct Co2Monitor {
    autonomous: ClassTotals,
    conventional: ClassTotals,
}

impl Co2Monitor {
    pub fn new() -> Self {
        Default::default()
    }

    /// Accumulates one tick of `dt` seconds.
    pub fn tick(&mut self, query: &dyn TrafficQuery, dt: f64) {
        for vehicle in query.vehicle_ids() {
            let Ok(state) = query.vehicle_state(&vehicle) else {
                continue;
            };
            let Ok(rate) = query.vehicle_co2(&vehicle) else {
                continue;
            };
            let totals = match state.class {
                VehicleClass::Autonomous => &mut self.autonomous,
                VehicleClass::Conventional => &mut self.conventional,
            };
            totals.co2_mg += rate * dt;
            totals.distance_m += state.speed * dt;
        }
    }

    /// The totals for one vehicle class.
    pub fn totals(&self, class: VehicleClass) -> ClassTotals {
        match class {
            VehicleClass::Autonomous => self.autonomous,
            VehicleClass::Conventional => self.conventional,
        }
    }

    /// The total CO2 across both classes in mg.
    pub fn total_co2_mg(&self) -> f64 {
        self.autonomous.co2_mg + self.conventional.co2_mg
    }

    /// Clears all accumulated totals.
    pub fn reset(&mut self) {
        *self = Default::default();
    }
}
