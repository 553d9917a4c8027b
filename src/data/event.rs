use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Flight events
// ---------------------------------------------------------------------------

/// Kinds of discrete flight events an engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Launch,
    Ignition,
    Liftoff,
    LaunchRodClearance,
    Burnout,
    EjectionCharge,
    Apogee,
    RecoveryDeviceDeployment,
    GroundHit,
    SimulationEnd,
}

impl EventKind {
    /// Display label, stable regardless of the variant identifier.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Launch => "Launch",
            EventKind::Ignition => "Motor Ignition",
            EventKind::Liftoff => "Lift-off",
            EventKind::LaunchRodClearance => "Launch Rod Clearance",
            EventKind::Burnout => "Motor Burnout",
            EventKind::EjectionCharge => "Ejection Charge",
            EventKind::Apogee => "Apogee",
            EventKind::RecoveryDeviceDeployment => "Recovery Device Deployment",
            EventKind::GroundHit => "Ground Hit",
            EventKind::SimulationEnd => "Simulation End",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Occurrence selection policy
// ---------------------------------------------------------------------------

/// How to pick one occurrence time out of an event's occurrence list.
///
/// `Earliest`/`Latest` select by time value; `First`/`Last`/`Nth` select by
/// list position as produced by the engine. The occurrence list is not
/// guaranteed sorted, so the two families can disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPolicy {
    Earliest,
    Latest,
    First,
    Last,
    Nth(usize),
}

// ---------------------------------------------------------------------------
// Event occurrence store
// ---------------------------------------------------------------------------

/// Mapping from event kind to its occurrence times for one run.
///
/// An event may fire zero, one, or multiple times (two recovery deployments
/// for drogue + main). Times are kept in the order the engine produced them.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    occurrences: BTreeMap<EventKind, Vec<f64>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: EventKind, time: f64) {
        self.occurrences.entry(kind).or_default().push(time);
    }

    /// Occurrence times for an event; empty slice if it never fired.
    pub fn times(&self, kind: EventKind) -> &[f64] {
        self.occurrences.get(&kind).map_or(&[], Vec::as_slice)
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.times(kind).len()
    }

    /// Select one occurrence time per `policy`. `None` means "not found" —
    /// callers fall back to a default interval boundary and record that.
    pub fn select(&self, kind: EventKind, policy: EventPolicy) -> Option<f64> {
        let times = self.times(kind);
        match policy {
            EventPolicy::Earliest => times.iter().copied().reduce(f64::min),
            EventPolicy::Latest => times.iter().copied().reduce(f64::max),
            EventPolicy::First => times.first().copied(),
            EventPolicy::Last => times.last().copied(),
            EventPolicy::Nth(n) => times.get(n).copied(),
        }
    }

    /// All recorded events with their occurrence lists, in `EventKind` order.
    pub fn iter(&self) -> impl Iterator<Item = (EventKind, &[f64])> {
        self.occurrences.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(kind: EventKind, times: &[f64]) -> EventLog {
        let mut log = EventLog::new();
        for &t in times {
            log.record(kind, t);
        }
        log
    }

    #[test]
    fn earliest_and_latest_select_by_value_not_position() {
        let log = log_with(EventKind::Apogee, &[3.1, 2.0, 5.4]);
        assert_eq!(log.select(EventKind::Apogee, EventPolicy::Earliest), Some(2.0));
        assert_eq!(log.select(EventKind::Apogee, EventPolicy::Latest), Some(5.4));
    }

    #[test]
    fn first_and_last_select_by_position() {
        let log = log_with(EventKind::RecoveryDeviceDeployment, &[9.2, 4.0]);
        assert_eq!(
            log.select(EventKind::RecoveryDeviceDeployment, EventPolicy::First),
            Some(9.2)
        );
        assert_eq!(
            log.select(EventKind::RecoveryDeviceDeployment, EventPolicy::Last),
            Some(4.0)
        );
    }

    #[test]
    fn missing_event_is_not_found_not_a_panic() {
        let log = EventLog::new();
        assert_eq!(log.select(EventKind::Liftoff, EventPolicy::Earliest), None);
        assert!(log.times(EventKind::Liftoff).is_empty());
    }

    #[test]
    fn nth_out_of_range_is_none() {
        let log = log_with(EventKind::Burnout, &[4.2]);
        assert_eq!(log.select(EventKind::Burnout, EventPolicy::Nth(0)), Some(4.2));
        assert_eq!(log.select(EventKind::Burnout, EventPolicy::Nth(1)), None);
    }
}
