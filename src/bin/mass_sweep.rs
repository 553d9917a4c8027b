use std::fs::{self, File};
use std::path::Path;

use plotters::style::{BLUE, RED};
use tracing::{error, info};

use rocket_analysis::engine::design::presets;
use rocket_analysis::report::{plot, text};
use rocket_analysis::sensitivity::{
    apogee_sensitivity, component_mass_what_if, linspace, run_mass_sweep, SweepConfig,
};
use rocket_analysis::{AnalysisError, BallisticEngine, SimConfig};

// ---------------------------------------------------------------------------
// Mass-budget sensitivity analysis
// ---------------------------------------------------------------------------
// Sweeps every component through -5 %..+5 % mass variations, fits apogee
// sensitivity per component, then runs the wide payload what-if study.

const WHAT_IF_COMPONENT: &str = "Payload";

fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    let out_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "outputs".to_string());
    if let Err(e) = run(Path::new(&out_dir)) {
        error!("mass sweep failed: {e}");
        std::process::exit(1);
    }
}

fn run(out_dir: &Path) -> Result<(), AnalysisError> {
    fs::create_dir_all(out_dir)?;
    info!("starting mass budget sensitivity analysis");

    let mut rocket = presets::hyperion();
    let mut engine = BallisticEngine::new(SimConfig::default());
    let config = SweepConfig::default();

    let rows = run_mass_sweep(&mut engine, &mut rocket, &config);
    info!(rows = rows.len(), "sweep complete");

    let csv_path = out_dir.join("mass_sweep_results.csv");
    text::write_sweep_csv(&mut File::create(&csv_path)?, &rows)?;
    info!("sweep results saved to {}", csv_path.display());

    let sensitivities = apogee_sensitivity(&rows);
    if sensitivities.is_empty() {
        error!("no valid data to fit sensitivities; skipping summary outputs");
        return Ok(());
    }

    let summary_path = out_dir.join("mass_sensitivity_summary.txt");
    text::write_sensitivity(&mut File::create(&summary_path)?, &sensitivities)?;
    info!("sensitivity summary saved to {}", summary_path.display());

    // Ascending slope order puts the most apogee-hungry component on top of
    // the horizontal bar chart.
    let mut bars: Vec<(String, f64)> = sensitivities
        .iter()
        .map(|s| (s.component.clone(), s.slope_m_per_pct))
        .collect();
    bars.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let chart_path = out_dir.join("apogee_sensitivity_bar_chart.png");
    plot::horizontal_bar_chart(
        &chart_path,
        "Apogee Sensitivity to Mass Variation by Component",
        "Sensitivity (m per % mass change)",
        &bars,
    )?;
    info!("saved plot: {}", chart_path.display());

    what_if_study(out_dir, &mut engine, &mut rocket)?;
    info!("mass budget sensitivity analysis completed successfully");
    Ok(())
}

/// Wide payload sweep: 50 %..150 % of nominal mass, apogee and max velocity
/// per point, rendered as two stacked panels.
fn what_if_study(
    out_dir: &Path,
    engine: &mut BallisticEngine,
    rocket: &mut rocket_analysis::Rocket,
) -> Result<(), AnalysisError> {
    let multipliers = linspace(0.5, 1.5, 11);
    let points = component_mass_what_if(engine, rocket, WHAT_IF_COMPONENT, &multipliers)?;

    let apogee_points: Vec<(f64, f64)> = points
        .iter()
        .filter_map(|p| p.apogee_m.map(|a| (p.mass_kg, a)))
        .collect();
    let velocity_points: Vec<(f64, f64)> = points
        .iter()
        .filter_map(|p| p.max_velocity_ms.map(|v| (p.mass_kg, v)))
        .collect();

    let path = out_dir.join("payload_mass_effects.png");
    plot::two_panel_chart(
        &path,
        &plot::PanelSpec {
            title: "Effect of Payload Mass on Apogee Altitude",
            x_label: "Payload Mass (kg)",
            y_label: "Apogee Altitude (m)",
            points: &apogee_points,
            color: BLUE,
        },
        &plot::PanelSpec {
            title: "Effect of Payload Mass on Maximum Velocity",
            x_label: "Payload Mass (kg)",
            y_label: "Maximum Velocity (m/s)",
            points: &velocity_points,
            color: RED,
        },
    )?;
    info!("saved plot: {}", path.display());
    Ok(())
}
