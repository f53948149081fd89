//! Run-end flushing and summarizing of the advisory decision log.

use crate::advisory::AdvisoryDecision;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::io;

/// Aggregate figures over one run's advisory decisions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// The number of advisories applied.
    pub decisions: usize,
    /// The mean advised speed in km/h.
    pub mean_advised_kmh: f64,
    /// The lowest advised speed in km/h.
    pub min_advised_kmh: f64,
    /// The highest advised speed in km/h.
    pub max_advised_kmh: f64,
}

/// Summarizes a decision log, or `None` if it is empty.
pub fn summarize(decisions: &[AdvisoryDecision]) -> Option<RunSummary> {
    let (min, max) = decisions
        .iter()
        .map(|d| d.advised_kmh)
        .minmax()
        .into_option()?;
    let mean = decisions.iter().map(|d| d.advised_kmh).sum::<f64>() / decisions.len() as f64;
    Some(RunSummary {
        decisions: decisions.len(),
        mean_advised_kmh: mean,
        min_advised_kmh: min,
        max_advised_kmh: max,
    })
}

/// Writes a decision log as JSON lines.
pub fn write_decisions<W: io::Write>(mut writer: W, decisions: &[AdvisoryDecision]) -> io::Result<()> {
    for decision in decisions {
        serde_json::to_writer(&mut writer, decision)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Writes the run summary as a single JSON object, if any decisions exist.
pub fn write_summary<W: io::Write>(mut writer: W, decisions: &[AdvisoryDecision]) -> io::Result<()> {
    if let Some(summary) = summarize(decisions) {
        serde_json::to_writer_pretty(&mut writer, &summary)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn decision(advised: f64) -> AdvisoryDecision {
        AdvisoryDecision {
            vehicle: "gen_0".into(),
            edge: "174032654#1".into(),
            time_to_green: 10.0,
            time_to_red: 30.0,
            link_length: 100.0,
            green_duration: 20.0,
            advised_kmh: advised,
            previous_kmh: 50.0,
            sim_time: 1.0,
        }
    }

    #[test]
    fn summary_of_known_log() {
        let log = [decision(36.0), decision(60.0), decision(48.0)];
        let summary = summarize(&log).unwrap();
        assert_eq!(summary.decisions, 3);
        assert_approx_eq!(summary.mean_advised_kmh, 48.0, 1e-9);
        assert_approx_eq!(summary.min_advised_kmh, 36.0, 1e-9);
        assert_approx_eq!(summary.max_advised_kmh, 60.0, 1e-9);
    }

    #[test]
    fn empty_log_has_no_summary() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn decisions_flush_as_json_lines() {
        let mut out = Vec::new();
        write_decisions(&mut out, &[decision(36.0), decision(60.0)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        let parsed: AdvisoryDecision = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.vehicle, "gen_0");
        assert_approx_eq!(parsed.advised_kmh, 36.0, 1e-9);
    }
}
