pub use advisory::{advise_speed, AdvisoryDecision, CYCLE_LENGTH, LEGAL_SPEED, MAX_ADVISED_SPEED};
pub use controller::GreenWaveController;
pub use network::{ApproachLink, ApproachMap, EdgeId};
pub use query::{QueryError, QueryResult, TrafficQuery, VehicleClass, VehicleState};
pub use signal::{Phase, SignalColor, SignalProgram, TimingSnapshot};
use slotmap::new_key_type;
pub use slotmap::{Key, KeyData};

mod advisory;
mod controller;
pub mod monitor;
mod network;
mod query;
pub mod report;
mod signal;
pub mod traffic;
pub mod units;
mod util;

new_key_type! {
    /// Unique ID of an [ApproachLink].
    pub struct LinkId;
    /// Unique ID of a signal known to the [ApproachMap].
    pub struct SignalId;
}
