use tracing::{error, info, warn};

use crate::data::FlightQuantity;
use crate::engine::design::{ComponentKind, Rocket};
use crate::engine::Simulator;
use crate::error::AnalysisError;
use crate::metrics::reduce::{reduce_all, Reduction};

// ---------------------------------------------------------------------------
// Mass-sensitivity sweep
// ---------------------------------------------------------------------------

/// Quantities the sweep extracts from each run.
const SWEEP_QUANTITIES: [FlightQuantity; 5] = [
    FlightQuantity::Altitude,
    FlightQuantity::VelocityTotal,
    FlightQuantity::AccelerationTotal,
    FlightQuantity::MachNumber,
    FlightQuantity::StabilityMargin,
];

/// Sweep parameters: mass variation percentages applied to every component.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub variations_pct: Vec<f64>,
}

impl Default for SweepConfig {
    /// -5 %, -4 %, ..., 0 %, ..., +5 %.
    fn default() -> Self {
        Self {
            variations_pct: (-5..=5).map(f64::from).collect(),
        }
    }
}

/// Performance metrics of one sweep run. A `None` field means the series was
/// missing or empty for that run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepMetrics {
    pub apogee_m: Option<f64>,
    pub max_velocity_ms: Option<f64>,
    pub max_acceleration_ms2: Option<f64>,
    pub max_mach: Option<f64>,
    pub min_stability_cal: Option<f64>,
}

impl SweepMetrics {
    fn extract(data: &crate::data::FlightData) -> SweepMetrics {
        let max_of = |q| data.get(q).and_then(|s| reduce_all(s, Reduction::Max));
        let min_of = |q| data.get(q).and_then(|s| reduce_all(s, Reduction::Min));
        SweepMetrics {
            apogee_m: max_of(FlightQuantity::Altitude),
            max_velocity_ms: max_of(FlightQuantity::VelocityTotal),
            max_acceleration_ms2: max_of(FlightQuantity::AccelerationTotal),
            max_mach: max_of(FlightQuantity::MachNumber),
            min_stability_cal: min_of(FlightQuantity::StabilityMargin),
        }
    }
}

/// One (component, mass variation) result row. `metrics` is `None` when the
/// simulation itself failed for this point.
#[derive(Debug, Clone)]
pub struct SweepRow {
    pub component: String,
    pub kind: ComponentKind,
    pub variation_pct: f64,
    pub metrics: Option<SweepMetrics>,
}

impl SweepRow {
    pub fn apogee_m(&self) -> Option<f64> {
        self.metrics.as_ref().and_then(|m| m.apogee_m)
    }
}

/// Sweep every component through every mass variation, one simulation per
/// (component, variation) pair.
///
/// The override discipline is strict: enable + set before the run, disable
/// immediately after it — on the failure path too, since a forgotten override
/// corrupts every later run against the same design. A failed run records its
/// row with undefined metrics and the sweep moves on.
pub fn run_mass_sweep(
    engine: &mut dyn Simulator,
    rocket: &mut Rocket,
    config: &SweepConfig,
) -> Vec<SweepRow> {
    let mut rows = Vec::with_capacity(rocket.components.len() * config.variations_pct.len());

    for ci in 0..rocket.components.len() {
        let name = rocket.components[ci].name.clone();
        let kind = rocket.components[ci].kind;
        let nominal = rocket.components[ci].nominal_mass();

        for &pct in &config.variations_pct {
            let new_mass = nominal * (1.0 + pct / 100.0);
            {
                let c = &mut rocket.components[ci];
                c.set_override_enabled(true);
                c.set_override_mass(new_mass);
            }
            info!(
                component = %name,
                "mass set to {:.3} kg ({:+.0}%)",
                new_mass,
                pct
            );

            let outcome = engine.run(rocket);
            rocket.components[ci].set_override_enabled(false);

            let metrics = match outcome {
                Ok(()) => match engine.timeseries(&SWEEP_QUANTITIES) {
                    Ok(data) => Some(SweepMetrics::extract(&data)),
                    Err(e) => {
                        warn!(component = %name, "data extraction failed: {e}");
                        Some(SweepMetrics::default())
                    }
                },
                Err(e) => {
                    error!(
                        component = %name,
                        "simulation failed at {:+.0}%: {e}",
                        pct
                    );
                    None
                }
            };

            rows.push(SweepRow {
                component: name.clone(),
                kind,
                variation_pct: pct,
                metrics,
            });
        }
    }

    // Belt-and-braces: the per-iteration resets already ran, but a design
    // that leaves the sweep with any override still enabled is corrupt.
    rocket.reset_all_overrides();
    rows
}

// ---------------------------------------------------------------------------
// Sensitivity coefficients
// ---------------------------------------------------------------------------

/// Apogee sensitivity of one component, meters per percent mass change.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensitivity {
    pub component: String,
    pub slope_m_per_pct: f64,
}

/// Slope of the degree-1 least-squares fit through (x, y).
///
/// `None` with fewer than two points or zero spread in x.
pub fn linear_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        cov += (xi - x_mean) * (yi - y_mean);
        var += (xi - x_mean) * (xi - x_mean);
    }
    (var > 0.0).then(|| cov / var)
}

/// Per-component apogee sensitivity over the sweep rows, first-seen component
/// order. Components with fewer than two defined apogee points are skipped
/// with a warning.
pub fn apogee_sensitivity(rows: &[SweepRow]) -> Vec<Sensitivity> {
    let mut order: Vec<&str> = Vec::new();
    for row in rows {
        if !order.contains(&row.component.as_str()) {
            order.push(&row.component);
        }
    }

    let mut out = Vec::new();
    for name in order {
        let (x, y): (Vec<f64>, Vec<f64>) = rows
            .iter()
            .filter(|r| r.component == name)
            .filter_map(|r| r.apogee_m().map(|a| (r.variation_pct, a)))
            .unzip();
        match linear_slope(&x, &y) {
            Some(slope) => {
                info!(component = name, "apogee sensitivity {:.4} m/%", slope);
                out.push(Sensitivity {
                    component: name.to_string(),
                    slope_m_per_pct: slope,
                });
            }
            None => warn!(
                component = name,
                "insufficient data to calculate sensitivity"
            ),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Single-component what-if sweep
// ---------------------------------------------------------------------------

/// One point of a what-if sweep over a single component's mass.
#[derive(Debug, Clone)]
pub struct WhatIfPoint {
    pub mass_kg: f64,
    pub apogee_m: Option<f64>,
    pub max_velocity_ms: Option<f64>,
}

/// Sweep one named component through explicit mass multipliers (the wide
/// payload what-if study). Same override discipline as the full sweep.
pub fn component_mass_what_if(
    engine: &mut dyn Simulator,
    rocket: &mut Rocket,
    component: &str,
    multipliers: &[f64],
) -> Result<Vec<WhatIfPoint>, AnalysisError> {
    let ci = rocket
        .components
        .iter()
        .position(|c| c.name == component)
        .ok_or_else(|| AnalysisError::UnknownComponent(component.to_string()))?;
    let nominal = rocket.components[ci].nominal_mass();

    let mut points = Vec::with_capacity(multipliers.len());
    for &multiplier in multipliers {
        let mass = nominal * multiplier;
        info!(
            component,
            "mass set to {:.3} kg ({:+.0}%)",
            mass,
            (multiplier - 1.0) * 100.0
        );
        {
            let c = &mut rocket.components[ci];
            c.set_override_enabled(true);
            c.set_override_mass(mass);
        }
        let outcome = engine.run(rocket);
        rocket.components[ci].set_override_enabled(false);

        let (apogee_m, max_velocity_ms) = match outcome {
            Ok(()) => {
                match engine
                    .timeseries(&[FlightQuantity::Altitude, FlightQuantity::VelocityTotal])
                {
                    Ok(data) => {
                        let m = SweepMetrics::extract(&data);
                        (m.apogee_m, m.max_velocity_ms)
                    }
                    Err(e) => {
                        warn!(component, "data extraction failed: {e}");
                        (None, None)
                    }
                }
            }
            Err(e) => {
                error!(component, "simulation failed: {e}");
                (None, None)
            }
        };
        points.push(WhatIfPoint {
            mass_kg: mass,
            apogee_m,
            max_velocity_ms,
        });
    }

    Ok(points)
}

/// `n` evenly spaced values from `lo` to `hi` inclusive.
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EventLog, FlightData};
    use crate::engine::design::presets;
    use crate::engine::EngineError;

    /// Engine double: apogee is an exact linear function of loaded mass, and
    /// every `run` call observes the design's override state.
    struct ScriptedEngine {
        calls: usize,
        fail_on_call: Option<usize>,
        overridden_per_call: Vec<usize>,
        last_mass: f64,
    }

    impl ScriptedEngine {
        fn new(fail_on_call: Option<usize>) -> Self {
            Self {
                calls: 0,
                fail_on_call,
                overridden_per_call: Vec::new(),
                last_mass: 0.0,
            }
        }

        fn apogee_for(mass: f64) -> f64 {
            2000.0 - 50.0 * mass
        }
    }

    impl Simulator for ScriptedEngine {
        fn run(&mut self, rocket: &Rocket) -> Result<(), EngineError> {
            self.calls += 1;
            self.overridden_per_call.push(
                rocket
                    .components
                    .iter()
                    .filter(|c| c.mass_overridden())
                    .count(),
            );
            if self.fail_on_call == Some(self.calls) {
                return Err(EngineError::InvalidConfiguration("scripted failure".into()));
            }
            self.last_mass = rocket.total_mass();
            Ok(())
        }

        fn timeseries(&self, quantities: &[FlightQuantity]) -> Result<FlightData, EngineError> {
            let mut data = FlightData::new(vec![0.0, 1.0, 2.0]);
            for &q in quantities {
                if q == FlightQuantity::Time {
                    continue;
                }
                let peak = if q == FlightQuantity::Altitude {
                    Self::apogee_for(self.last_mass)
                } else {
                    1.0
                };
                data.insert(q, vec![0.0, peak, 0.0]).unwrap();
            }
            Ok(data)
        }

        fn events(&self) -> Result<EventLog, EngineError> {
            Ok(EventLog::new())
        }
    }

    #[test]
    fn slope_of_collinear_points_is_exact() {
        assert_eq!(
            linear_slope(&[-1.0, 0.0, 1.0], &[100.0, 105.0, 110.0]),
            Some(5.0)
        );
    }

    #[test]
    fn slope_needs_two_points_and_spread() {
        assert_eq!(linear_slope(&[1.0], &[2.0]), None);
        assert_eq!(linear_slope(&[], &[]), None);
        assert_eq!(linear_slope(&[2.0, 2.0], &[1.0, 5.0]), None);
    }

    #[test]
    fn sweep_produces_one_row_per_component_and_variation() {
        let mut rocket = presets::hyperion();
        let mut engine = ScriptedEngine::new(None);
        let config = SweepConfig::default();
        let rows = run_mass_sweep(&mut engine, &mut rocket, &config);
        assert_eq!(
            rows.len(),
            rocket.components.len() * config.variations_pct.len()
        );
        assert!(rows.iter().all(|r| r.metrics.is_some()));
    }

    #[test]
    fn exactly_one_override_active_during_every_run() {
        let mut rocket = presets::hyperion();
        let mut engine = ScriptedEngine::new(None);
        run_mass_sweep(&mut engine, &mut rocket, &SweepConfig::default());
        assert!(
            engine.overridden_per_call.iter().all(|&n| n == 1),
            "each run must see exactly the component under study overridden"
        );
    }

    #[test]
    fn failed_run_is_recorded_and_sweep_continues_with_reset_override() {
        let mut rocket = presets::hyperion();
        // Fail the 7th simulation (arbitrary mid-sweep point).
        let mut engine = ScriptedEngine::new(Some(7));
        let config = SweepConfig::default();
        let rows = run_mass_sweep(&mut engine, &mut rocket, &config);

        assert_eq!(
            rows.len(),
            rocket.components.len() * config.variations_pct.len(),
            "failure must not truncate the sweep"
        );
        let failed: Vec<_> = rows.iter().filter(|r| r.metrics.is_none()).collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].apogee_m().is_none());

        // The run after the failure still sees exactly one override — the
        // failed iteration's override came off on the failure path.
        assert!(engine.overridden_per_call.iter().all(|&n| n == 1));
        assert!(
            rocket.components.iter().all(|c| !c.mass_overridden()),
            "no override may survive the sweep"
        );
    }

    #[test]
    fn sensitivity_matches_the_scripted_linear_model() {
        let mut rocket = presets::hyperion();
        let mut engine = ScriptedEngine::new(None);
        let rows = run_mass_sweep(&mut engine, &mut rocket, &SweepConfig::default());
        let sens = apogee_sensitivity(&rows);
        assert_eq!(sens.len(), rocket.components.len());

        // apogee = 2000 - 50 * total_mass, so d(apogee)/d(pct) for a
        // component of nominal mass m is -50 * m / 100.
        for s in &sens {
            let m = rocket.component(&s.component).unwrap().nominal_mass();
            let expected = -50.0 * m / 100.0;
            assert!(
                (s.slope_m_per_pct - expected).abs() < 1e-9,
                "{}: slope {} vs expected {}",
                s.component,
                s.slope_m_per_pct,
                expected
            );
        }
    }

    #[test]
    fn sensitivity_skips_components_without_enough_valid_points() {
        let rows = vec![
            SweepRow {
                component: "Payload".into(),
                kind: crate::engine::design::ComponentKind::Payload,
                variation_pct: -1.0,
                metrics: None,
            },
            SweepRow {
                component: "Payload".into(),
                kind: crate::engine::design::ComponentKind::Payload,
                variation_pct: 1.0,
                metrics: Some(SweepMetrics {
                    apogee_m: Some(1500.0),
                    ..SweepMetrics::default()
                }),
            },
        ];
        assert!(apogee_sensitivity(&rows).is_empty());
    }

    #[test]
    fn what_if_sweep_reports_unknown_component() {
        let mut rocket = presets::hyperion();
        let mut engine = ScriptedEngine::new(None);
        let err = component_mass_what_if(&mut engine, &mut rocket, "Ballast", &[1.0]);
        assert!(matches!(err, Err(AnalysisError::UnknownComponent(_))));
    }

    #[test]
    fn what_if_sweep_collects_apogee_per_multiplier() {
        let mut rocket = presets::hyperion();
        let mut engine = ScriptedEngine::new(None);
        let multipliers = linspace(0.5, 1.5, 11);
        let points =
            component_mass_what_if(&mut engine, &mut rocket, "Payload", &multipliers).unwrap();
        assert_eq!(points.len(), 11);
        assert!(points.iter().all(|p| p.apogee_m.is_some()));
        // Heavier payload, lower apogee under the linear model.
        assert!(points.first().unwrap().apogee_m > points.last().unwrap().apogee_m);
        assert!(rocket.components.iter().all(|c| !c.mass_overridden()));
    }

    #[test]
    fn linspace_endpoints_and_count() {
        let v = linspace(0.5, 1.5, 11);
        assert_eq!(v.len(), 11);
        assert!((v[0] - 0.5).abs() < 1e-12);
        assert!((v[10] - 1.5).abs() < 1e-12);
        assert!((v[5] - 1.0).abs() < 1e-12);
    }
}
