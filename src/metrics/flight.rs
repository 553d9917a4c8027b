use crate::data::{EventKind, EventLog, EventPolicy, FlightData, FlightQuantity};

use super::reduce::{self, Extrema, Reduction};
use super::segment;

// ---------------------------------------------------------------------------
// Metric outcome
// ---------------------------------------------------------------------------

/// Outcome of one derived metric.
///
/// Every metric is independently optional: a missing event or series degrades
/// that metric to a recorded condition and the rest of the catalogue still
/// computes. Inverted interval bounds are reported, not clamped.
#[derive(Debug, Clone, PartialEq)]
pub enum Metric<T> {
    Available(T),
    /// The defining event never fired.
    EventMissing(EventKind),
    /// The event fired, but fewer times than the metric needs.
    TooFewOccurrences {
        event: EventKind,
        required: usize,
        found: usize,
    },
    /// The sample series the metric reduces over was not recorded.
    SeriesMissing(FlightQuantity),
    /// The derived interval selected no samples.
    NoSamples,
    /// Interval bounds arrived inverted (e.g. main deployed before drogue).
    InvalidSequence { first: f64, last: f64 },
}

impl<T> Metric<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            Metric::Available(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Available(_))
    }
}

// ---------------------------------------------------------------------------
// Key-metric catalogue
// ---------------------------------------------------------------------------

/// Average engine thrust while on the rail or launch tower.
#[derive(Debug, Clone, PartialEq)]
pub struct OnRailThrust {
    pub liftoff_time: f64,
    pub mean_n: f64,
    pub total_n: f64,
    pub samples: usize,
}

/// Velocity at the instant the vehicle clears the launch rod.
#[derive(Debug, Clone, PartialEq)]
pub struct RailExit {
    pub time: f64,
    pub velocity_ms: f64,
}

/// Average velocity from apogee down to recovery-device deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct DescentVelocity {
    pub apogee_time: f64,
    pub recovery_time: f64,
    /// True when no deployment fired and the run end stood in for it.
    pub recovery_fallback: bool,
    pub mean_ms: f64,
    pub samples: usize,
}

/// Average velocity between drogue and main deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct InterDeployment {
    pub drogue_time: f64,
    pub main_time: f64,
    pub mean_ms: f64,
    pub samples: usize,
}

/// Velocity at ground hit.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundHitVelocity {
    pub time: f64,
    pub velocity_ms: f64,
}

/// The fixed catalogue of event-anchored flight metrics.
#[derive(Debug, Clone)]
pub struct KeyMetrics {
    pub on_rail_thrust: Metric<OnRailThrust>,
    pub rail_exit: Metric<RailExit>,
    pub descent: Metric<DescentVelocity>,
    pub inter_deployment: Metric<InterDeployment>,
    pub ground_hit: Metric<GroundHitVelocity>,
}

impl KeyMetrics {
    /// Compute the whole catalogue. Degraded entries never abort the rest.
    pub fn compute(data: &FlightData, events: &EventLog) -> KeyMetrics {
        KeyMetrics {
            on_rail_thrust: on_rail_thrust(data, events),
            rail_exit: rail_exit(data, events),
            descent: descent_velocity(data, events),
            inter_deployment: inter_deployment(data, events),
            ground_hit: ground_hit(data, events),
        }
    }
}

// ---------------------------------------------------------------------------
// Individual metrics
// ---------------------------------------------------------------------------

fn on_rail_thrust(data: &FlightData, events: &EventLog) -> Metric<OnRailThrust> {
    let Some(liftoff_time) = events.select(EventKind::Liftoff, EventPolicy::Earliest) else {
        return Metric::EventMissing(EventKind::Liftoff);
    };
    let Some(thrust) = data.get(FlightQuantity::ThrustForce) else {
        return Metric::SeriesMissing(FlightQuantity::ThrustForce);
    };

    let mask = segment::until_mask(data.time(), liftoff_time);
    let Some(mean_n) = reduce::reduce(thrust, &mask, Reduction::Mean) else {
        return Metric::NoSamples;
    };
    let total_n = reduce::reduce(thrust, &mask, Reduction::Sum).unwrap_or(0.0);
    let samples = segment::mask_count(&mask);

    Metric::Available(OnRailThrust {
        liftoff_time,
        mean_n,
        total_n,
        samples,
    })
}

fn rail_exit(data: &FlightData, events: &EventLog) -> Metric<RailExit> {
    let Some(time) = events.select(EventKind::LaunchRodClearance, EventPolicy::Earliest) else {
        return Metric::EventMissing(EventKind::LaunchRodClearance);
    };
    let Some(velocity) = data.get(FlightQuantity::VelocityTotal) else {
        return Metric::SeriesMissing(FlightQuantity::VelocityTotal);
    };
    let Some(velocity_ms) = reduce::nearest_sample(data.time(), velocity, time) else {
        return Metric::NoSamples;
    };
    Metric::Available(RailExit { time, velocity_ms })
}

fn descent_velocity(data: &FlightData, events: &EventLog) -> Metric<DescentVelocity> {
    let Some(apogee_time) = events.select(EventKind::Apogee, EventPolicy::Latest) else {
        return Metric::EventMissing(EventKind::Apogee);
    };
    let Some(velocity) = data.get(FlightQuantity::VelocityTotal) else {
        return Metric::SeriesMissing(FlightQuantity::VelocityTotal);
    };

    // Earliest deployment ends the free-fall segment; without one the run end
    // stands in, and the fallback is surfaced in the report.
    let (recovery_time, recovery_fallback) = match events
        .select(EventKind::RecoveryDeviceDeployment, EventPolicy::Earliest)
    {
        Some(t) => (t, false),
        None => match data.time().last() {
            Some(&end) => (end, true),
            None => return Metric::NoSamples,
        },
    };

    let mask = segment::interval_mask(data.time(), apogee_time, recovery_time);
    let Some(mean_ms) = reduce::reduce(velocity, &mask, Reduction::Mean) else {
        return Metric::NoSamples;
    };

    Metric::Available(DescentVelocity {
        apogee_time,
        recovery_time,
        recovery_fallback,
        mean_ms,
        samples: segment::mask_count(&mask),
    })
}

fn inter_deployment(data: &FlightData, events: &EventLog) -> Metric<InterDeployment> {
    let found = events.count(EventKind::RecoveryDeviceDeployment);
    if found == 0 {
        return Metric::EventMissing(EventKind::RecoveryDeviceDeployment);
    }
    if found < 2 {
        return Metric::TooFewOccurrences {
            event: EventKind::RecoveryDeviceDeployment,
            required: 2,
            found,
        };
    }

    // First and last occurrence as produced by the engine; the drogue must
    // precede the main by value or the pair is an invalid sequence.
    let drogue_time = events
        .select(EventKind::RecoveryDeviceDeployment, EventPolicy::First)
        .unwrap_or(f64::NAN);
    let main_time = events
        .select(EventKind::RecoveryDeviceDeployment, EventPolicy::Last)
        .unwrap_or(f64::NAN);
    if !(drogue_time < main_time) {
        return Metric::InvalidSequence {
            first: drogue_time,
            last: main_time,
        };
    }

    let Some(velocity) = data.get(FlightQuantity::VelocityTotal) else {
        return Metric::SeriesMissing(FlightQuantity::VelocityTotal);
    };
    let mask = segment::interval_mask(data.time(), drogue_time, main_time);
    let Some(mean_ms) = reduce::reduce(velocity, &mask, Reduction::Mean) else {
        return Metric::NoSamples;
    };

    Metric::Available(InterDeployment {
        drogue_time,
        main_time,
        mean_ms,
        samples: segment::mask_count(&mask),
    })
}

fn ground_hit(data: &FlightData, events: &EventLog) -> Metric<GroundHitVelocity> {
    let Some(time) = events.select(EventKind::GroundHit, EventPolicy::Earliest) else {
        return Metric::EventMissing(EventKind::GroundHit);
    };
    let Some(velocity) = data.get(FlightQuantity::VelocityTotal) else {
        return Metric::SeriesMissing(FlightQuantity::VelocityTotal);
    };
    let Some(velocity_ms) = reduce::nearest_sample(data.time(), velocity, time) else {
        return Metric::NoSamples;
    };
    Metric::Available(GroundHitVelocity { time, velocity_ms })
}

// ---------------------------------------------------------------------------
// Supplementary summaries
// ---------------------------------------------------------------------------

/// Stability margin / Mach summary for the stability report section.
#[derive(Debug, Clone)]
pub struct StabilitySummary {
    /// Mean stability margin, calibers. Non-finite samples (pad, low speed)
    /// are skipped.
    pub average_margin: Option<f64>,
    pub margin: Option<Extrema>,
    pub mach: Option<Extrema>,
}

impl StabilitySummary {
    pub fn compute(data: &FlightData) -> StabilitySummary {
        let margin_series = data.get(FlightQuantity::StabilityMargin);
        let mach_series = data.get(FlightQuantity::MachNumber);

        StabilitySummary {
            average_margin: margin_series
                .and_then(|s| reduce::reduce_all(s, Reduction::Mean)),
            margin: margin_series.and_then(|s| reduce::extrema_with_time(s, data.time())),
            mach: mach_series.and_then(|s| reduce::extrema_with_time(s, data.time())),
        }
    }
}

/// Extrema for each requested quantity, in request order. `None` entries are
/// series that were absent or held no finite sample.
pub fn series_extrema(
    data: &FlightData,
    quantities: &[FlightQuantity],
) -> Vec<(FlightQuantity, Option<Extrema>)> {
    quantities
        .iter()
        .map(|&q| {
            let extrema = data
                .get(q)
                .and_then(|s| reduce::extrema_with_time(s, data.time()));
            (q, extrema)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// 0..=10 s at 1 Hz; velocity ramps 0,10,..,100; thrust 500 N for the
    /// first three samples then 0.
    fn sample_data() -> FlightData {
        let time: Vec<f64> = (0..=10).map(|i| i as f64).collect();
        let n = time.len();
        let mut data = FlightData::new(time);
        data.insert(
            FlightQuantity::VelocityTotal,
            (0..n).map(|i| 10.0 * i as f64).collect(),
        )
        .unwrap();
        data.insert(
            FlightQuantity::ThrustForce,
            (0..n).map(|i| if i <= 2 { 500.0 } else { 0.0 }).collect(),
        )
        .unwrap();
        data
    }

    fn nominal_events() -> EventLog {
        let mut ev = EventLog::new();
        ev.record(EventKind::Liftoff, 2.0);
        ev.record(EventKind::LaunchRodClearance, 2.9);
        ev.record(EventKind::Apogee, 5.0);
        ev.record(EventKind::RecoveryDeviceDeployment, 6.0);
        ev.record(EventKind::RecoveryDeviceDeployment, 8.0);
        ev.record(EventKind::GroundHit, 10.0);
        ev
    }

    #[test]
    fn on_rail_thrust_means_over_run_start_to_liftoff() {
        let m = KeyMetrics::compute(&sample_data(), &nominal_events());
        let t = m.on_rail_thrust.available().expect("metric available");
        assert_eq!(t.liftoff_time, 2.0);
        assert_eq!(t.samples, 3, "t=0,1,2 inclusive");
        assert!((t.mean_n - 500.0).abs() < 1e-12);
        assert!((t.total_n - 1500.0).abs() < 1e-12);
    }

    #[test]
    fn rail_exit_takes_nearest_velocity_sample() {
        let m = KeyMetrics::compute(&sample_data(), &nominal_events());
        let r = m.rail_exit.available().expect("metric available");
        // 2.9 s rounds to the t=3 sample
        assert_eq!(r.velocity_ms, 30.0);
    }

    #[test]
    fn descent_uses_latest_apogee_and_earliest_recovery() {
        let mut ev = nominal_events();
        ev.record(EventKind::Apogee, 4.0); // duplicate, earlier — Latest must win
        let m = KeyMetrics::compute(&sample_data(), &ev);
        let d = m.descent.available().expect("metric available");
        assert_eq!(d.apogee_time, 5.0);
        assert_eq!(d.recovery_time, 6.0);
        assert!(!d.recovery_fallback);
        // samples at t=5,6 → velocities 50,60
        assert!((d.mean_ms - 55.0).abs() < 1e-12);
    }

    #[test]
    fn descent_falls_back_to_run_end_without_deployment() {
        let mut ev = EventLog::new();
        ev.record(EventKind::Apogee, 8.0);
        let m = KeyMetrics::compute(&sample_data(), &ev);
        let d = m.descent.available().expect("metric available");
        assert!(d.recovery_fallback);
        assert_eq!(d.recovery_time, 10.0);
        // t=8,9,10 → 80,90,100
        assert!((d.mean_ms - 90.0).abs() < 1e-12);
    }

    #[test]
    fn inter_deployment_valid_when_first_precedes_last() {
        let mut ev = EventLog::new();
        for t in [4.0, 4.0, 9.2] {
            ev.record(EventKind::RecoveryDeviceDeployment, t);
        }
        let m = inter_deployment(&sample_data(), &ev);
        let d = m.available().expect("first 4.0 < last 9.2 is valid");
        assert_eq!(d.drogue_time, 4.0);
        assert_eq!(d.main_time, 9.2);
    }

    #[test]
    fn inter_deployment_inverted_order_is_invalid_sequence() {
        let mut ev = EventLog::new();
        ev.record(EventKind::RecoveryDeviceDeployment, 9.2);
        ev.record(EventKind::RecoveryDeviceDeployment, 4.0);
        match inter_deployment(&sample_data(), &ev) {
            Metric::InvalidSequence { first, last } => {
                assert_eq!(first, 9.2);
                assert_eq!(last, 4.0);
            }
            other => panic!("expected InvalidSequence, got {:?}", other),
        }
    }

    #[test]
    fn inter_deployment_needs_two_occurrences() {
        let mut ev = EventLog::new();
        ev.record(EventKind::RecoveryDeviceDeployment, 6.0);
        assert_eq!(
            inter_deployment(&sample_data(), &ev),
            Metric::TooFewOccurrences {
                event: EventKind::RecoveryDeviceDeployment,
                required: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn missing_events_degrade_each_metric_independently() {
        let m = KeyMetrics::compute(&sample_data(), &EventLog::new());
        assert_eq!(m.on_rail_thrust, Metric::EventMissing(EventKind::Liftoff));
        assert_eq!(
            m.rail_exit,
            Metric::EventMissing(EventKind::LaunchRodClearance)
        );
        assert_eq!(m.descent, Metric::EventMissing(EventKind::Apogee));
        assert_eq!(
            m.ground_hit,
            Metric::EventMissing(EventKind::GroundHit)
        );
    }

    #[test]
    fn missing_series_degrades_without_aborting() {
        let data = FlightData::new((0..=10).map(|i| i as f64).collect());
        let m = KeyMetrics::compute(&data, &nominal_events());
        assert_eq!(
            m.on_rail_thrust,
            Metric::SeriesMissing(FlightQuantity::ThrustForce)
        );
        assert_eq!(
            m.rail_exit,
            Metric::SeriesMissing(FlightQuantity::VelocityTotal)
        );
    }

    #[test]
    fn stability_summary_skips_non_finite() {
        let mut data = FlightData::new(vec![0.0, 1.0, 2.0, 3.0]);
        data.insert(
            FlightQuantity::StabilityMargin,
            vec![f64::NAN, 1.0, 2.0, 3.0],
        )
        .unwrap();
        let s = StabilitySummary::compute(&data);
        assert!((s.average_margin.unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(s.margin.unwrap().max.value, 3.0);
        assert!(s.mach.is_none());
    }
}
