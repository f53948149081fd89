use crate::network::EdgeId;
use crate::signal::TimingSnapshot;
use std::fmt;

/// The result of a query against the external simulation engine.
pub type QueryResult<T> = Result<T, QueryError>;

/// A failed query against the external simulation engine.
///
/// Entities may disappear between ticks, so every lookup is fallible and
/// the control loop skips the affected vehicle rather than aborting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// The vehicle is no longer in the simulation.
    UnknownVehicle(String),
    /// The signal is not known to the engine.
    UnknownSignal(String),
    /// The lane is not known to the engine.
    UnknownLane(String),
    /// Any other engine-side failure.
    Engine(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::UnknownVehicle(id) => write!(f, "unknown vehicle {:?}", id),
            QueryError::UnknownSignal(id) => write!(f, "unknown signal {:?}", id),
            QueryError::UnknownLane(id) => write!(f, "unknown lane {:?}", id),
            QueryError::Engine(msg) => write!(f, "engine failure: {}", msg),
        }
    }
}

impl std::error::Error for QueryError {}

/// The class of a simulated vehicle. Only autonomous vehicles receive
/// speed advisories; conventional vehicles are observed but never steered.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub enum VehicleClass {
    Autonomous,
    Conventional,
}

/// A freshly queried view of one vehicle.
#[derive(Clone, Debug)]
pub struct VehicleState {
    pub class: VehicleClass,
    /// The directed edge the vehicle is currently on.
    pub edge: EdgeId,
    /// The lane the vehicle is currently on.
    pub lane: String,
    /// The current speed in m/s.
    pub speed: f64,
}

/// The boundary with the external traffic simulation engine.
///
/// Implementations adapt a concrete remote-control API; tests use a
/// scripted in-memory engine. All reads reflect the engine's state at the
/// current tick and are never cached by the trait itself.
pub trait TrafficQuery {
    /// The current simulation time in s.
    fn sim_time(&self) -> f64;

    /// The ids of all vehicles currently in the simulation.
    fn vehicle_ids(&self) -> Vec<String>;

    /// The current state of a vehicle.
    fn vehicle_state(&self, vehicle: &str) -> QueryResult<VehicleState>;

    /// The vehicle's current CO2 emission rate in mg/s.
    fn vehicle_co2(&self, vehicle: &str) -> QueryResult<f64>;

    /// The length of a lane in m.
    fn lane_length(&self, lane: &str) -> QueryResult<f64>;

    /// The signal controlling the junction at the end of the given edge,
    /// or `None` if the edge does not lead to a signalized junction.
    fn next_signal(&self, edge: &EdgeId) -> QueryResult<Option<String>>;

    /// A point-in-time view of a signal's phase program and position in it.
    fn timing_snapshot(&self, signal: &str) -> QueryResult<TimingSnapshot>;

    /// The lanes controlled by a signal, in the engine's direction order.
    fn controlled_lanes(&self, signal: &str) -> QueryResult<Vec<String>>;

    /// All directed edges vehicles may depart from or arrive at.
    fn edge_ids(&self) -> Vec<EdgeId>;

    /// Sets a vehicle's target speed in m/s.
    fn set_vehicle_speed(&mut self, vehicle: &str, speed: f64) -> QueryResult<()>;

    /// Inserts a new vehicle routed from one edge to another, departing
    /// at the given speed in m/s.
    fn spawn_vehicle(
        &mut self,
        id: &str,
        class: VehicleClass,
        from: &EdgeId,
        to: &EdgeId,
        depart_speed: f64,
    ) -> QueryResult<()>;
}
