use crate::query::{QueryResult, TrafficQuery};
use crate::{LinkId, SignalId};
use log::debug;
use slotmap::SlotMap;
use std::collections::HashMap;
use std::fmt;

/// Fallback direction index for forward edges when no controlled lane
/// matches; assumes a 4-way NSEW signal layout.
const FORWARD_FALLBACK: usize = 0;
/// Fallback direction index for reverse edges.
const REVERSE_FALLBACK: usize = 2;

/// A directed edge identifier in the engine's naming convention, where a
/// leading `-` denotes the reverse direction of a two-way road.
#[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the reverse direction of a two-way road.
    pub fn is_reverse(&self) -> bool {
        self.0.starts_with('-')
    }

    /// The id of the edge's first lane, used to measure the link length.
    pub fn first_lane(&self) -> String {
        format!("{}_0", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The directed edge of a lane id of the form `<edge>_<index>`.
pub(crate) fn lane_parent(lane: &str) -> EdgeId {
    match lane.rfind('_') {
        Some(idx) => EdgeId::new(&lane[..idx]),
        None => EdgeId::new(lane),
    }
}

/// A directed road segment leading to a signalized junction.
///
/// Immutable once resolved; resolved lazily on the first vehicle
/// encounter and cached in the [ApproachMap] for the lifetime of the run.
#[derive(Clone, Debug)]
pub struct ApproachLink {
    edge: EdgeId,
    /// The link length in m.
    length: f64,
    /// The signal at the end of the link.
    signal: SignalId,
    /// The index of this approach in the signal's per-direction state vector.
    direction: usize,
}

impl ApproachLink {
    pub fn edge(&self) -> &EdgeId {
        &self.edge
    }

    /// The link length in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn signal(&self) -> SignalId {
        self.signal
    }

    /// The direction index into the signal's phase-state vector.
    pub fn direction(&self) -> usize {
        self.direction
    }
}

/// The registry of resolved approach links and interned signal ids.
///
/// Owned by the control loop with an explicit lifetime per simulation
/// run, rather than living in process-global caches.
#[derive(Default)]
pub struct ApproachMap {
    links: SlotMap<LinkId, ApproachLink>,
    by_edge: HashMap<EdgeId, LinkId>,
    signals: SlotMap<SignalId, String>,
    by_signal_name: HashMap<String, SignalId>,
}

impl ApproachMap {
    pub fn new() -> Self {
        Default::default()
    }

    /// Gets a resolved approach link.
    pub fn link(&self, id: LinkId) -> &ApproachLink {
        &self.links[id]
    }

    /// The engine-side name of an interned signal.
    pub fn signal_name(&self, id: SignalId) -> &str {
        &self.signals[id]
    }

    /// The number of resolved approach links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Resolves the approach link for an edge, querying the engine only on
    /// the first encounter. Returns `None` when the edge does not lead to
    /// a signalized junction.
    pub fn resolve(
        &mut self,
        query: &dyn TrafficQuery,
        edge: &EdgeId,
    ) -> QueryResult<Option<LinkId>> {
        if let Some(id) = self.by_edge.get(edge) {
            return Ok(Some(*id));
        }
        let Some(signal_name) = query.next_signal(edge)? else {
            return Ok(None);
        };
        let length = query.lane_length(&edge.first_lane())?;
        let direction = resolve_direction(query, &signal_name, edge);
        let signal = self.intern_signal(signal_name);
        let link = ApproachLink {
            edge: edge.clone(),
            length,
            signal,
            direction,
        };
        debug!(
            "resolved approach {}: length {:.1} m, signal {:?}, direction {}",
            edge,
            length,
            self.signals[signal],
            direction
        );
        let id = self.links.insert(link);
        self.by_edge.insert(edge.clone(), id);
        Ok(Some(id))
    }

    fn intern_signal(&mut self, name: String) -> SignalId {
        if let Some(id) = self.by_signal_name.get(&name) {
            return *id;
        }
        let id = self.signals.insert(name.clone());
        self.by_signal_name.insert(name, id);
        id
    }

    /// Drops every resolved link and interned signal, ready for a new run.
    pub fn clear(&mut self) {
        self.links.clear();
        self.by_edge.clear();
        self.signals.clear();
        self.by_signal_name.clear();
    }
}

/// Resolves which position in the signal's per-direction state vector
/// corresponds to traffic arriving from this edge: the first controlled
/// lane whose parent edge runs in the same direction sign, taken modulo 4.
/// Falls back to a fixed NSEW layout assumption when nothing matches.
fn resolve_direction(query: &dyn TrafficQuery, signal: &str, edge: &EdgeId) -> usize {
    let fallback = if edge.is_reverse() {
        REVERSE_FALLBACK
    } else {
        FORWARD_FALLBACK
    };
    let Ok(lanes) = query.controlled_lanes(signal) else {
        return fallback;
    };
    lanes
        .iter()
        .position(|lane| lane_parent(lane).is_reverse() == edge.is_reverse())
        .map(|idx| idx % 4)
        .unwrap_or(fallback)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn edge_direction_sign() {
        assert!(!EdgeId::new("174032654#1").is_reverse());
        assert!(EdgeId::new("-174032654#1").is_reverse());
    }

    #[test]
    fn lane_parent_strips_index() {
        assert_eq!(lane_parent("-67792293#0_1"), EdgeId::new("-67792293#0"));
        assert_eq!(lane_parent("nolane"), EdgeId::new("nolane"));
    }
}
