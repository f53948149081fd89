use crate::util::rotated_range;
use smallvec::SmallVec;

/// The indicated color of one controlled direction of a signal.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SignalColor {
    Green,
    Yellow,
    Red,
}

/// A single phase of a signal program.
#[derive(Clone, Debug)]
pub struct Phase {
    /// The duration of the phase in s.
    pub duration: f64,
    /// The indicated color per controlled direction index.
    pub colors: SmallVec<[SignalColor; 8]>,
}

/// An ordered, cyclic sequence of phases owned by the simulation engine.
///
/// Phase durations sum to the signal's cycle length. This crate only ever
/// reads programs; it never mutates them.
#[derive(Clone, Debug, Default)]
pub struct SignalProgram {
    pub phases: Vec<Phase>,
}

/// A point-in-time view of one signal, computed fresh per query because the
/// authoritative state lives in the external engine.
#[derive(Clone, Debug)]
pub struct TimingSnapshot {
    /// Index of the currently active phase.
    pub phase: usize,
    /// Time remaining until the current phase ends, in s.
    pub time_to_switch: f64,
    /// The signal's full phase program.
    pub program: SignalProgram,
}

impl Phase {
    /// Creates a phase from an engine state string, one character per
    /// controlled direction: `G`/`g` is green, `y`/`Y` is yellow,
    /// anything else is red.
    pub fn from_state(duration: f64, state: &str) -> Self {
        let colors = state
            .chars()
            .map(|c| match c {
                'G' | 'g' => SignalColor::Green,
                'y' | 'Y' => SignalColor::Yellow,
                _ => SignalColor::Red,
            })
            .collect();
        Self { duration, colors }
    }

    /// The color indicated to the given direction, or `None` if the
    /// direction index is outside the phase's state vector.
    pub fn color(&self, direction: usize) -> Option<SignalColor> {
        self.colors.get(direction).copied()
    }

    fn shows(&self, direction: usize, color: SignalColor) -> bool {
        self.color(direction) == Some(color)
    }
}

impl SignalProgram {
    /// The total duration of one cycle in s.
    pub fn cycle_length(&self) -> f64 {
        self.phases.iter().map(|p| p.duration).sum()
    }

    /// The duration of the first phase that is green for the given
    /// direction, or 0.0 if the program has none.
    pub fn green_duration(&self, direction: usize) -> f64 {
        self.phases
            .iter()
            .find(|p| p.shows(direction, SignalColor::Green))
            .map(|p| p.duration)
            .unwrap_or(0.0)
    }
}

impl TimingSnapshot {
    /// Time in s until the next onset of green for the given direction.
    ///
    /// Walks forward through the phase list from the current phase,
    /// wrapping the cycle, and stops at the first future green phase.
    /// A direction that is currently green gets the time until its *next*
    /// recurrence, not 0. Returns 0.0 only when no future green exists
    /// within one cycle, which callers must treat as "timing unknown".
    pub fn time_to_green(&self, direction: usize) -> f64 {
        let phases = &self.program.phases;
        if self.phase >= phases.len() {
            return 0.0;
        }
        let mut elapsed = self.time_to_switch;
        for idx in rotated_range(phases.len(), wrap_next(self.phase, phases.len())) {
            let phase = &phases[idx];
            if phase.shows(direction, SignalColor::Green) {
                return elapsed;
            }
            elapsed += phase.duration;
        }
        0.0
    }

    /// Time in s until the given direction is next arriving into red.
    ///
    /// This is a time budget rather than a plain color transition:
    /// - currently green: remaining green plus any immediately following
    ///   yellow for this direction;
    /// - currently yellow: the remaining phase time;
    /// - currently red: the time until the upcoming green phase *ends*,
    ///   again including its trailing yellow.
    ///
    /// Returns 0.0 when the snapshot is degenerate (empty program, stale
    /// phase index, direction not in the state vector, or no green phase
    /// to span while red), which callers must treat as "timing unknown".
    pub fn time_to_red(&self, direction: usize) -> f64 {
        let phases = &self.program.phases;
        let Some(current) = phases.get(self.phase) else {
            return 0.0;
        };
        match current.color(direction) {
            Some(SignalColor::Yellow) => self.time_to_switch,
            Some(SignalColor::Green) => {
                let next = &phases[wrap_next(self.phase, phases.len())];
                self.time_to_switch + yellow_duration(next, direction)
            }
            Some(SignalColor::Red) => {
                let mut elapsed = self.time_to_switch;
                for idx in rotated_range(phases.len(), wrap_next(self.phase, phases.len())) {
                    let phase = &phases[idx];
                    if phase.shows(direction, SignalColor::Green) {
                        elapsed += phase.duration;
                        let next = &phases[wrap_next(idx, phases.len())];
                        return elapsed + yellow_duration(next, direction);
                    }
                    elapsed += phase.duration;
                }
                0.0
            }
            None => 0.0,
        }
    }
}

/// The next phase index, wrapping the cycle.
fn wrap_next(idx: usize, count: usize) -> usize {
    if idx + 1 >= count {
        0
    } else {
        idx + 1
    }
}

fn yellow_duration(phase: &Phase, direction: usize) -> f64 {
    if phase.shows(direction, SignalColor::Yellow) {
        phase.duration
    } else {
        0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    /// A two-direction program: direction 0 is green in phase 0,
    /// direction 1 in phase 2, with yellow clearance phases between.
    fn two_way_program() -> SignalProgram {
        SignalProgram {
            phases: vec![
                Phase::from_state(40.0, "Gr"),
                Phase::from_state(5.0, "yr"),
                Phase::from_state(40.0, "rG"),
                Phase::from_state(5.0, "ry"),
            ],
        }
    }

    #[test]
    fn green_onset_while_red() {
        // Direction 1, currently in phase 0 with 12 s remaining:
        // 12 s of green-for-0 plus the 5 s yellow phase.
        let snapshot = TimingSnapshot {
            phase: 0,
            time_to_switch: 12.0,
            program: two_way_program(),
        };
        assert_approx_eq!(snapshot.time_to_green(1), 17.0, 1e-9);
    }

    #[test]
    fn green_onset_while_green_is_next_recurrence() {
        // Direction 0 is currently green; the next green onset is a full
        // cycle away, not 0 and not the remaining phase time.
        let snapshot = TimingSnapshot {
            phase: 0,
            time_to_switch: 10.0,
            program: two_way_program(),
        };
        assert_approx_eq!(snapshot.time_to_green(0), 10.0 + 5.0 + 40.0 + 5.0, 1e-9);
    }

    #[test]
    fn red_onset_while_green_includes_yellow() {
        let snapshot = TimingSnapshot {
            phase: 0,
            time_to_switch: 10.0,
            program: two_way_program(),
        };
        assert_approx_eq!(snapshot.time_to_red(0), 15.0, 1e-9);
    }

    #[test]
    fn red_onset_while_yellow_is_remaining_time() {
        let snapshot = TimingSnapshot {
            phase: 1,
            time_to_switch: 2.0,
            program: two_way_program(),
        };
        assert_approx_eq!(snapshot.time_to_red(0), 2.0, 1e-9);
    }

    #[test]
    fn red_onset_while_red_spans_upcoming_green() {
        // Direction 1, currently in phase 0 with 12 s remaining: red
        // resumes after the yellow phase, the full green phase, and its
        // trailing yellow.
        let snapshot = TimingSnapshot {
            phase: 0,
            time_to_switch: 12.0,
            program: two_way_program(),
        };
        assert_approx_eq!(snapshot.time_to_red(1), 12.0 + 5.0 + 40.0 + 5.0, 1e-9);
    }

    #[test]
    fn green_duration_of_direction() {
        let program = two_way_program();
        assert_approx_eq!(program.green_duration(0), 40.0, 1e-9);
        assert_approx_eq!(program.green_duration(1), 40.0, 1e-9);
    }

    #[test]
    fn missing_green_yields_sentinel() {
        let program = SignalProgram {
            phases: vec![Phase::from_state(30.0, "rr"), Phase::from_state(30.0, "ry")],
        };
        let snapshot = TimingSnapshot {
            phase: 0,
            time_to_switch: 10.0,
            program: program.clone(),
        };
        assert_eq!(snapshot.time_to_green(0), 0.0);
        assert_eq!(snapshot.time_to_red(0), 0.0);
        assert_eq!(program.green_duration(0), 0.0);
    }

    #[test]
    fn empty_program_yields_sentinel() {
        let snapshot = TimingSnapshot {
            phase: 0,
            time_to_switch: 10.0,
            program: SignalProgram::default(),
        };
        assert_eq!(snapshot.time_to_green(0), 0.0);
        assert_eq!(snapshot.time_to_red(0), 0.0);
    }

    #[test]
    fn stale_phase_index_yields_sentinel() {
        let snapshot = TimingSnapshot {
            phase: 9,
            time_to_switch: 10.0,
            program: two_way_program(),
        };
        assert_eq!(snapshot.time_to_green(0), 0.0);
        assert_eq!(snapshot.time_to_red(0), 0.0);
    }

    #[test]
    fn cycle_length_sums_phases() {
        assert_approx_eq!(two_way_program().cycle_length(), 90.0, 1e-9);
    }
}
