use std::fs::{self, File};
use std::io::Write as _;
use std::path::Path;

use plotters::style::RGBColor;
use plotters::style::{BLACK, BLUE, CYAN, GREEN, MAGENTA, RED};
use tracing::{error, info, warn};

use rocket_analysis::engine::design::presets;
use rocket_analysis::metrics::flight::Metric;
use rocket_analysis::metrics::segment;
use rocket_analysis::metrics::units::{convert_series, METER_TO_FOOT, NEWTON_TO_POUND_FORCE};
use rocket_analysis::report::{plot, text};
use rocket_analysis::{
    AnalysisError, BallisticEngine, EventKind, EventLog, FlightData, FlightQuantity, KeyMetrics,
    SimConfig, Simulator, StabilitySummary,
};

// ---------------------------------------------------------------------------
// Single-run flight report
// ---------------------------------------------------------------------------
// Runs one simulation of the preset design, computes the key-metric
// catalogue, and writes the text report plus per-quantity diagnostic plots.

/// Series the report cannot do without. Stability margin is optional extra.
const REQUIRED_QUANTITIES: [FlightQuantity; 11] = [
    FlightQuantity::Time,
    FlightQuantity::Altitude,
    FlightQuantity::VelocityTotal,
    FlightQuantity::AccelerationTotal,
    FlightQuantity::ThrustForce,
    FlightQuantity::DragForce,
    FlightQuantity::Mass,
    FlightQuantity::MachNumber,
    FlightQuantity::AngleOfAttack,
    FlightQuantity::CgLocation,
    FlightQuantity::CpLocation,
];

struct PlotSpec {
    quantity: FlightQuantity,
    factor: f64,
    y_label: &'static str,
    filename: &'static str,
    color: RGBColor,
}

/// Per-quantity chart catalogue: thrust in lbf and velocity in ft/s for the
/// range-safety crowd, everything else SI.
const PLOT_SPECS: [PlotSpec; 9] = [
    PlotSpec {
        quantity: FlightQuantity::Altitude,
        factor: 1.0,
        y_label: "Altitude (m)",
        filename: "altitude_vs_time.png",
        color: BLUE,
    },
    PlotSpec {
        quantity: FlightQuantity::VelocityTotal,
        factor: METER_TO_FOOT,
        y_label: "Velocity (ft/s)",
        filename: "velocity_vs_time.png",
        color: RED,
    },
    PlotSpec {
        quantity: FlightQuantity::AccelerationTotal,
        factor: 1.0,
        y_label: "Acceleration (m/s^2)",
        filename: "acceleration_vs_time.png",
        color: GREEN,
    },
    PlotSpec {
        quantity: FlightQuantity::ThrustForce,
        factor: NEWTON_TO_POUND_FORCE,
        y_label: "Thrust (lbf)",
        filename: "thrust_vs_time.png",
        color: MAGENTA,
    },
    PlotSpec {
        quantity: FlightQuantity::DragForce,
        factor: 1.0,
        y_label: "Drag Force (N)",
        filename: "drag_force_vs_time.png",
        color: CYAN,
    },
    PlotSpec {
        quantity: FlightQuantity::Mass,
        factor: 1.0,
        y_label: "Mass (kg)",
        filename: "mass_vs_time.png",
        color: BLACK,
    },
    PlotSpec {
        quantity: FlightQuantity::MachNumber,
        factor: 1.0,
        y_label: "Mach Number",
        filename: "mach_number_vs_time.png",
        color: BLUE,
    },
    PlotSpec {
        quantity: FlightQuantity::AngleOfAttack,
        factor: 1.0,
        y_label: "Angle of Attack (deg)",
        filename: "angle_of_attack_vs_time.png",
        color: RED,
    },
    PlotSpec {
        quantity: FlightQuantity::StabilityMargin,
        factor: 1.0,
        y_label: "Stability Margin (calibers)",
        filename: "stability_margin_vs_time.png",
        color: BLUE,
    },
];

fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    let out_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "outputs".to_string());
    if let Err(e) = run(Path::new(&out_dir)) {
        error!("flight analysis failed: {e}");
        std::process::exit(1);
    }
}

fn run(out_dir: &Path) -> Result<(), AnalysisError> {
    let plots_dir = out_dir.join("plots");
    fs::create_dir_all(&plots_dir)?;
    info!("plots directory set to {}", plots_dir.display());

    let rocket = presets::hyperion();
    let mut engine = BallisticEngine::new(SimConfig::default());

    info!("running flight simulation for '{}'", rocket.name);
    engine.run(&rocket)?;
    info!("simulation run successful");

    let data = engine.timeseries(&FlightQuantity::ALL)?;
    let events = engine.events()?;

    let report_path = out_dir.join("flight_report.txt");
    let mut report = File::create(&report_path)?;
    writeln!(report, "Flight analysis for '{}'.", rocket.name)?;
    writeln!(report)?;
    writeln!(report, "Simulation run successful.")?;
    writeln!(report)?;

    text::write_event_log(&mut report, &events)?;

    let missing = data.missing(&REQUIRED_QUANTITIES);
    text::write_data_validation(&mut report, &missing)?;
    if !missing.is_empty() {
        warn!("required flight data series missing; report is incomplete");
        return Ok(());
    }

    let metrics = KeyMetrics::compute(&data, &events);
    text::write_key_metrics(&mut report, &metrics)?;

    let plotted: Vec<FlightQuantity> = PLOT_SPECS.iter().map(|s| s.quantity).collect();
    text::write_extrema_catalogue(&mut report, &data, &plotted)?;
    text::write_stability(&mut report, &StabilitySummary::compute(&data))?;
    text::write_component_list(&mut report, &rocket)?;

    render_plots(&mut report, &plots_dir, &data, &events, &metrics)?;

    info!("report written to {}", report_path.display());
    Ok(())
}

fn render_plots(
    report: &mut File,
    plots_dir: &Path,
    data: &FlightData,
    events: &EventLog,
    metrics: &KeyMetrics,
) -> Result<(), AnalysisError> {
    let time = data.time();

    for spec in &PLOT_SPECS {
        let Some(series) = data.get(spec.quantity) else {
            continue;
        };
        let values = convert_series(series, spec.factor);
        let path = plots_dir.join(spec.filename);
        match plot::line_chart(
            &path,
            &format!("{} vs Time", spec.quantity),
            "Time (s)",
            spec.y_label,
            time,
            &values,
            spec.color,
            Some(events),
        ) {
            Ok(()) => {
                info!("saved plot: {}", path.display());
                writeln!(report, "Saved plot: {}", path.display())?;
            }
            Err(e) => {
                warn!("failed to plot {}: {e}", spec.quantity);
                writeln!(report, "Error during {} plot: {}", spec.quantity, e)?;
            }
        }
    }

    render_descent_plot(report, plots_dir, data, events, metrics)?;
    render_stability_scatter(report, plots_dir, data)?;
    Ok(())
}

/// Velocity over the apogee-to-recovery segment, with just those two events
/// marked.
fn render_descent_plot(
    report: &mut File,
    plots_dir: &Path,
    data: &FlightData,
    events: &EventLog,
    metrics: &KeyMetrics,
) -> Result<(), AnalysisError> {
    let Metric::Available(descent) = &metrics.descent else {
        writeln!(report, "Descent velocity plot skipped: segment unavailable.")?;
        return Ok(());
    };
    let Some(velocity) = data.get(FlightQuantity::VelocityTotal) else {
        return Ok(());
    };

    let time = data.time();
    let mask = segment::interval_mask(time, descent.apogee_time, descent.recovery_time);
    let seg_time: Vec<f64> = time
        .iter()
        .zip(&mask)
        .filter(|(_, &m)| m)
        .map(|(t, _)| *t)
        .collect();
    let seg_vel: Vec<f64> = velocity
        .iter()
        .zip(&mask)
        .filter(|(_, &m)| m)
        .map(|(v, _)| v * METER_TO_FOOT)
        .collect();

    let mut segment_events = EventLog::new();
    for (kind, times) in events.iter() {
        if matches!(
            kind,
            EventKind::Apogee | EventKind::RecoveryDeviceDeployment
        ) {
            for &t in times {
                if t >= descent.apogee_time && t <= descent.recovery_time {
                    segment_events.record(kind, t);
                }
            }
        }
    }

    let path = plots_dir.join("descent_velocity.png");
    match plot::line_chart(
        &path,
        "Descent Velocity from Apogee to Recovery Deployment",
        "Time (s)",
        "Velocity (ft/s)",
        &seg_time,
        &seg_vel,
        CYAN,
        Some(&segment_events),
    ) {
        Ok(()) => {
            info!("saved plot: {}", path.display());
            writeln!(report, "Saved plot: {}", path.display())?;
        }
        Err(e) => {
            warn!("failed to plot descent velocity: {e}");
            writeln!(report, "Error during descent velocity plot: {}", e)?;
        }
    }
    Ok(())
}

fn render_stability_scatter(
    report: &mut File,
    plots_dir: &Path,
    data: &FlightData,
) -> Result<(), AnalysisError> {
    let (Some(mach), Some(margin)) = (
        data.get(FlightQuantity::MachNumber),
        data.get(FlightQuantity::StabilityMargin),
    ) else {
        return Ok(());
    };
    let path = plots_dir.join("stability_margin_vs_mach_number.png");
    match plot::scatter_colored(
        &path,
        "Stability Margin vs Mach Number Colored by Time",
        "Mach Number",
        "Stability Margin (calibers)",
        mach,
        margin,
        data.time(),
    ) {
        Ok(()) => {
            info!("saved plot: {}", path.display());
            writeln!(report, "Saved plot: {}", path.display())?;
        }
        Err(e) => {
            warn!("failed to plot stability scatter: {e}");
            writeln!(report, "Error during stability scatter plot: {}", e)?;
        }
    }
    Ok(())
}
