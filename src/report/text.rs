use std::io::{self, Write};

use crate::compression::CompressionRun;
use crate::data::{EventLog, FlightData, FlightQuantity};
use crate::engine::design::Rocket;
use crate::metrics::flight::{KeyMetrics, Metric, StabilitySummary};
use crate::metrics::reduce::Extrema;
use crate::metrics::units::{METER_TO_FOOT, NEWTON_TO_POUND_FORCE};
use crate::sensitivity::{Sensitivity, SweepRow};

// ---------------------------------------------------------------------------
// Plain-text report writers
// ---------------------------------------------------------------------------
// One section per writer, all over `W: Write` so tests run against buffers.
// Degraded metrics keep their sentinel lines; a reader must be able to tell
// "not found" from "zero".

/// Dump of every flight event with its occurrence times.
pub fn write_event_log<W: Write>(w: &mut W, events: &EventLog) -> io::Result<()> {
    if events.is_empty() {
        writeln!(w, "No flight events were found in the simulation.")?;
        writeln!(w)?;
        return Ok(());
    }
    writeln!(w, "All Flight Events:")?;
    for (kind, times) in events.iter() {
        let rendered: Vec<String> = times.iter().map(|t| format!("{:.2}", t)).collect();
        writeln!(w, "  {}: [{}]", kind, rendered.join(", "))?;
    }
    writeln!(w)
}

/// Required-series check result.
pub fn write_data_validation<W: Write>(
    w: &mut W,
    missing: &[FlightQuantity],
) -> io::Result<()> {
    if missing.is_empty() {
        writeln!(w, "All required flight data series are present.")?;
    } else {
        let names: Vec<&str> = missing.iter().map(|q| q.label()).collect();
        writeln!(w, "Some flight data series are missing: {}", names.join(", "))?;
    }
    writeln!(w)
}

// ---------------------------------------------------------------------------
// Key-metric sections
// ---------------------------------------------------------------------------

pub fn write_key_metrics<W: Write>(w: &mut W, metrics: &KeyMetrics) -> io::Result<()> {
    write_on_rail_thrust(w, metrics)?;
    write_rail_exit(w, metrics)?;
    write_descent(w, metrics)?;
    write_inter_deployment(w, metrics)?;
    write_ground_hit(w, metrics)
}

fn write_on_rail_thrust<W: Write>(w: &mut W, metrics: &KeyMetrics) -> io::Result<()> {
    writeln!(
        w,
        "1. Estimated Average Engine Thrust while on the Rail or Launch Tower:"
    )?;
    match &metrics.on_rail_thrust {
        Metric::Available(t) => {
            writeln!(w, "   Liftoff Time: {:.2} s", t.liftoff_time)?;
            writeln!(
                w,
                "   - Average Thrust: {:.2} N ({:.2} lbf)",
                t.mean_n,
                t.mean_n * NEWTON_TO_POUND_FORCE
            )?;
            writeln!(w, "   - Calculation Details:")?;
            writeln!(
                w,
                "     - Total Thrust during on-rail phase: {:.2} N",
                t.total_n
            )?;
            writeln!(
                w,
                "     - Duration of on-rail phase: {:.2} s",
                t.liftoff_time
            )?;
            writeln!(w, "     - Number of thrust data points: {}", t.samples)?;
        }
        Metric::NoSamples => {
            writeln!(w, "   - No thrust data available during on-rail phase.")?;
        }
        degraded => write_degraded_line(w, degraded)?,
    }
    writeln!(w)
}

fn write_rail_exit<W: Write>(w: &mut W, metrics: &KeyMetrics) -> io::Result<()> {
    writeln!(w, "2. Rail Exit Velocity [ft/s]:")?;
    match &metrics.rail_exit {
        Metric::Available(r) => {
            writeln!(w, "   Rail Exit Time: {:.2} s", r.time)?;
            writeln!(
                w,
                "   - Rail Exit Velocity: {:.2} ft/s",
                r.velocity_ms * METER_TO_FOOT
            )?;
        }
        Metric::NoSamples => {
            writeln!(w, "   - Could not find velocity data for rail exit.")?;
        }
        degraded => write_degraded_line(w, degraded)?,
    }
    writeln!(w)
}

fn write_descent<W: Write>(w: &mut W, metrics: &KeyMetrics) -> io::Result<()> {
    writeln!(w, "3. Descent from Apogee Velocity [ft/s]:")?;
    match &metrics.descent {
        Metric::Available(d) => {
            writeln!(w, "   Apogee Time: {:.2} s", d.apogee_time)?;
            if d.recovery_fallback {
                writeln!(
                    w,
                    "   Recovery device deployment event not found. Using end of simulation time."
                )?;
            } else {
                writeln!(
                    w,
                    "   Recovery Device Deployment Time: {:.2} s",
                    d.recovery_time
                )?;
            }
            writeln!(
                w,
                "   - Average Descent Velocity: {:.2} ft/s",
                d.mean_ms * METER_TO_FOOT
            )?;
            writeln!(w, "   - Calculation Details:")?;
            writeln!(
                w,
                "     - Duration of descent phase: {:.2} s",
                d.recovery_time - d.apogee_time
            )?;
            writeln!(w, "     - Number of velocity data points: {}", d.samples)?;
        }
        Metric::NoSamples => {
            writeln!(
                w,
                "   - No descent velocity data available between apogee and recovery."
            )?;
        }
        degraded => write_degraded_line(w, degraded)?,
    }
    writeln!(w)
}

fn write_inter_deployment<W: Write>(w: &mut W, metrics: &KeyMetrics) -> io::Result<()> {
    writeln!(
        w,
        "4. Average Velocity Between Drogue and Main Deployment [ft/s]:"
    )?;
    match &metrics.inter_deployment {
        Metric::Available(d) => {
            writeln!(w, "   Drogue Deployment Time: {:.2} s", d.drogue_time)?;
            writeln!(w, "   Main Deployment Time: {:.2} s", d.main_time)?;
            writeln!(
                w,
                "   - Average Velocity Between Deployments: {:.2} ft/s",
                d.mean_ms * METER_TO_FOOT
            )?;
            writeln!(w, "   - Calculation Details:")?;
            writeln!(w, "     - Duration: {:.2} s", d.main_time - d.drogue_time)?;
            writeln!(w, "     - Data Points: {}", d.samples)?;
        }
        Metric::InvalidSequence { .. } => {
            writeln!(w, "   - Main deployed before drogue. Invalid sequence.")?;
        }
        Metric::TooFewOccurrences { .. } => {
            writeln!(
                w,
                "   - Not enough recovery deployment events to determine drogue and main."
            )?;
        }
        degraded => write_degraded_line(w, degraded)?,
    }
    writeln!(w)
}

fn write_ground_hit<W: Write>(w: &mut W, metrics: &KeyMetrics) -> io::Result<()> {
    writeln!(w, "5. Ground Hit Velocity [ft/s]:")?;
    match &metrics.ground_hit {
        Metric::Available(g) => {
            writeln!(
                w,
                "   - Ground Hit Velocity: {:.2} ft/s",
                g.velocity_ms * METER_TO_FOOT
            )?;
            writeln!(w, "   - Calculation Details:")?;
            writeln!(w, "     - Ground Hit Time: {:.2} s", g.time)?;
            writeln!(
                w,
                "     - Velocity at Ground Hit: {:.2} m/s",
                g.velocity_ms
            )?;
        }
        Metric::NoSamples => {
            writeln!(w, "   - Could not find valid velocity data for ground hit.")?;
        }
        degraded => write_degraded_line(w, degraded)?,
    }
    writeln!(w)
}

fn write_degraded_line<W: Write, T>(w: &mut W, metric: &Metric<T>) -> io::Result<()> {
    match metric {
        Metric::EventMissing(kind) => {
            writeln!(w, "   - {} event not found in simulation.", kind)
        }
        Metric::SeriesMissing(quantity) => {
            writeln!(w, "   - {} data not available.", quantity)
        }
        Metric::TooFewOccurrences { event, required, found } => writeln!(
            w,
            "   - Only {} of {} required {} events found.",
            found, required, event
        ),
        Metric::InvalidSequence { first, last } => writeln!(
            w,
            "   - Invalid sequence: interval ends at {:.2} s before it starts at {:.2} s.",
            last, first
        ),
        Metric::NoSamples => writeln!(w, "   - No data available."),
        Metric::Available(_) => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Extrema and stability sections
// ---------------------------------------------------------------------------

pub fn write_extrema<W: Write>(w: &mut W, title: &str, extrema: &Extrema) -> io::Result<()> {
    writeln!(w, "{}:", title)?;
    writeln!(
        w,
        "  Max Value: {:.2} at Time: {:.2} s",
        extrema.max.value, extrema.max.time
    )?;
    writeln!(
        w,
        "  Min Value: {:.2} at Time: {:.2} s",
        extrema.min.value, extrema.min.time
    )?;
    writeln!(w)
}

/// Extrema for each requested quantity.
pub fn write_extrema_catalogue<W: Write>(
    w: &mut W,
    data: &FlightData,
    quantities: &[FlightQuantity],
) -> io::Result<()> {
    writeln!(w, "Extrema Information:")?;
    writeln!(w)?;
    for (quantity, extrema) in crate::metrics::flight::series_extrema(data, quantities) {
        match extrema {
            Some(e) => write_extrema(w, quantity.label(), &e)?,
            None => {
                writeln!(w, "{}:", quantity)?;
                writeln!(w, "  Not available.")?;
                writeln!(w)?;
            }
        }
    }
    Ok(())
}

pub fn write_stability<W: Write>(w: &mut W, summary: &StabilitySummary) -> io::Result<()> {
    match summary.average_margin {
        Some(avg) => writeln!(w, "Average Stability Margin: {:.2} calibers.", avg)?,
        None => writeln!(w, "Average Stability Margin: not available.")?,
    }
    writeln!(w)?;
    if let Some(margin) = &summary.margin {
        write_extrema(w, "Stability Margin", margin)?;
    }
    if let Some(mach) = &summary.mach {
        write_extrema(w, "Mach Number", mach)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Component listing
// ---------------------------------------------------------------------------

fn write_attribute<W: Write>(
    w: &mut W,
    name: &str,
    value: Option<f64>,
    unit: &str,
) -> io::Result<()> {
    match value {
        Some(v) => writeln!(w, "  {}: {} {}", name, v, unit),
        None => writeln!(w, "  {}: Not Available", name),
    }
}

/// Every component with its attributes, `Not Available` where a capability
/// is absent.
pub fn write_component_list<W: Write>(w: &mut W, rocket: &Rocket) -> io::Result<()> {
    writeln!(w, "List of all components with their attributes:")?;
    writeln!(w)?;
    for (idx, component) in rocket.components.iter().enumerate() {
        writeln!(w, "Component {}:", idx + 1)?;
        writeln!(w, "  Name: {}", component.name)?;
        writeln!(w, "  Type: {}", component.kind)?;
        writeln!(w, "  Mass: {} kg", component.mass())?;
        write_attribute(w, "Length", component.length(), "m")?;
        write_attribute(w, "Diameter", component.diameter(), "m")?;
        write_attribute(w, "Reference Area", component.reference_area(), "m^2")?;
        writeln!(w)?;
        writeln!(w, "{}", "-".repeat(50))?;
        writeln!(w)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sweep outputs
// ---------------------------------------------------------------------------

fn csv_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "NaN".into(),
    }
}

/// Sweep rows as CSV, one row per (component, variation). Undefined metrics
/// render as NaN so downstream tooling can drop them.
pub fn write_sweep_csv<W: Write>(w: &mut W, rows: &[SweepRow]) -> io::Result<()> {
    writeln!(
        w,
        "Component Name,Component Type,Mass Variation (%),Apogee (m),\
         Max Velocity (m/s),Max Acceleration (m/s^2),Max Mach Number,\
         Stability Margin (calibers)"
    )?;
    for row in rows {
        let m = row.metrics.clone().unwrap_or_default();
        writeln!(
            w,
            "{},{},{:.0},{},{},{},{},{}",
            row.component,
            row.kind,
            row.variation_pct,
            csv_cell(m.apogee_m),
            csv_cell(m.max_velocity_ms),
            csv_cell(m.max_acceleration_ms2),
            csv_cell(m.max_mach),
            csv_cell(m.min_stability_cal),
        )?;
    }
    Ok(())
}

/// Sensitivity table, most sensitive first (largest slope magnitude on top).
pub fn write_sensitivity<W: Write>(w: &mut W, sensitivities: &[Sensitivity]) -> io::Result<()> {
    writeln!(w, "Apogee Sensitivity to Mass Variation by Component:")?;
    let mut sorted: Vec<&Sensitivity> = sensitivities.iter().collect();
    sorted.sort_by(|a, b| {
        b.slope_m_per_pct
            .abs()
            .partial_cmp(&a.slope_m_per_pct.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for s in sorted {
        writeln!(
            w,
            "  {:<24} {:>10.4} m per % mass change",
            s.component, s.slope_m_per_pct
        )?;
    }
    writeln!(w)
}

// ---------------------------------------------------------------------------
// Compression-test metrics
// ---------------------------------------------------------------------------

pub fn write_compression_metrics<W: Write>(
    w: &mut W,
    file_id: &str,
    run_index: usize,
    run: &CompressionRun,
) -> io::Result<()> {
    writeln!(w, "{} - Run {} Metrics:", file_id, run_index)?;
    match run.peak_load() {
        Some(peak) => {
            writeln!(w, "  Max Load (DC1) = {:.3} N", peak.load_n)?;
            writeln!(
                w,
                "  Axial Displacement at Max Load = {:.3} mm",
                peak.displacement_mm
            )?;
        }
        None => writeln!(w, "No data available.")?,
    }
    writeln!(w)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
