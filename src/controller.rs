use crate::advisory::{advise_speed, AdvisoryDecision};
use crate::network::{ApproachMap, EdgeId};
use crate::query::{QueryResult, TrafficQuery, VehicleClass};
use crate::{units, LinkId};
use log::{debug, trace, warn};
use std::collections::HashSet;

/// The per-vehicle speed advisory loop.
///
/// Each tick, every autonomous vehicle entering a tracked approach link
/// for the first time receives one advisory speed, which is written to
/// the engine and recorded. Re-entry of the same (vehicle, link) pair
/// never recomputes.
pub struct GreenWaveController {
    /// The AV penetration rate P, between 0 and 1.
    penetration: f64,
    /// The edges on which advisories are issued.
    tracked: HashSet<EdgeId>,
    /// Lazily resolved approach links and signals.
    approaches: ApproachMap,
    /// The (vehicle, link) pairs already advised.
    processed: HashSet<(String, LinkId)>,
    /// The in-memory decision log, flushed by the caller at run end.
    decisions: Vec<AdvisoryDecision>,
}

impl GreenWaveController {
    /// Creates a controller for the given penetration rate and tracked edges.
    ///
    /// # Panics
    /// Panics if `penetration` is not within `0.0..=1.0`.
    pub fn new(penetration: f64, tracked: impl IntoIterator<Item = EdgeId>) -> Self {
        assert!(
            (0.0..=1.0).contains(&penetration),
            "penetration rate must be between 0 and 1"
        );
        Self {
            penetration,
            tracked: tracked.into_iter().collect(),
            approaches: ApproachMap::new(),
            processed: HashSet::new(),
            decisions: Vec::new(),
        }
    }

    /// The AV penetration rate.
    pub fn penetration(&self) -> f64 {
        self.penetration
    }

    /// The decisions recorded so far.
    pub fn decisions(&self) -> &[AdvisoryDecision] {
        &self.decisions
    }

    /// The number of advisories applied so far.
    pub fn advised_count(&self) -> usize {
        self.decisions.len()
    }

    /// Advises every eligible vehicle once and returns the number of
    /// advisories applied this tick. Vehicles whose state can no longer
    /// be queried are skipped until the next tick.
    pub fn tick(&mut self, query: &mut dyn TrafficQuery) -> usize {
        let mut applied = 0;
        for vehicle in query.vehicle_ids() {
            match self.advise_vehicle(&vehicle, query) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(err) => warn!("skipping vehicle {}: {}", vehicle, err),
            }
        }
        applied
    }

    /// Clears all caches and the decision log, ready for a new run.
    pub fn reset(&mut self) {
        self.approaches.clear();
        self.processed.clear();
        self.decisions.clear();
    }

    fn advise_vehicle(&mut self, vehicle: &str, query: &mut dyn TrafficQuery) -> QueryResult<bool> {
        let state = query.vehicle_state(vehicle)?;
        if state.class != VehicleClass::Autonomous || !self.tracked.contains(&state.edge) {
            return Ok(false);
        }

        let Some(link_id) = self.approaches.resolve(query, &state.edge)? else {
            trace!("edge {} has no signal ahead", state.edge);
            return Ok(false);
        };
        if self.processed.contains(&(vehicle.to_string(), link_id)) {
            return Ok(false);
        }

        let link = self.approaches.link(link_id).clone();
        let snapshot = query.timing_snapshot(self.approaches.signal_name(link.signal()))?;
        let to_green = snapshot.time_to_green(link.direction());
        let to_red = snapshot.time_to_red(link.direction());
        let green = snapshot.program.green_duration(link.direction());
        let advised = advise_speed(link.length(), self.penetration, to_green, to_red, green);

        // Only a successful write marks the pair processed, so a stale
        // vehicle is retried on the next tick.
        query.set_vehicle_speed(vehicle, units::kmh_to_ms(advised))?;
        self.processed.insert((vehicle.to_string(), link_id));

        let previous = units::ms_to_kmh(state.speed);
        debug!(
            "advised {} on {}: {:.1} -> {:.1} km/h (S: {:.1} s, R: {:.1} s, L: {:.1} m, G: {:.1} s)",
            vehicle,
            state.edge,
            previous,
            advised,
            to_green,
            to_red,
            link.length(),
            green
        );
        self.decisions.push(AdvisoryDecision {
            vehicle: vehicle.to_string(),
            edge: state.edge.as_str().to_string(),
            time_to_green: to_green,
            time_to_red: to_red,
            link_length: link.length(),
            green_duration: green,
            advised_kmh: advised,
            previous_kmh: previous,
            sim_time: query.sim_time(),
        });
        Ok(true)
    }
}
