use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use plotters::style::BLUE;
use tracing::{error, info, warn};

use rocket_analysis::compression::parse_log;
use rocket_analysis::report::{plot, text};
use rocket_analysis::AnalysisError;

// ---------------------------------------------------------------------------
// Compression-test report
// ---------------------------------------------------------------------------
// Parses rig logs into runs, appends peak-load metrics to one combined file,
// and renders a load-displacement curve per run.

fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: compression-report <log-file> [<log-file>...] [--out <dir>]");
        std::process::exit(2);
    }

    let (inputs, out_dir) = split_args(&args);
    if let Err(e) = run(&inputs, &out_dir) {
        error!("compression analysis failed: {e}");
        std::process::exit(1);
    }
}

fn split_args(args: &[String]) -> (Vec<PathBuf>, PathBuf) {
    let mut inputs = Vec::new();
    let mut out_dir = PathBuf::from("outputs");
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--out" {
            if let Some(dir) = iter.next() {
                out_dir = PathBuf::from(dir);
            }
        } else {
            inputs.push(PathBuf::from(arg));
        }
    }
    (inputs, out_dir)
}

fn run(inputs: &[PathBuf], out_dir: &Path) -> Result<(), AnalysisError> {
    fs::create_dir_all(out_dir)?;
    let metrics_path = out_dir.join("combined_metrics.txt");
    let mut metrics_file = File::create(&metrics_path)?;

    for input in inputs {
        if !input.is_file() {
            return Err(AnalysisError::MissingInput(input.clone()));
        }
        let runs = parse_log(BufReader::new(File::open(input)?))?;
        info!(
            file = %input.display(),
            runs = runs.len(),
            "log parsed"
        );
        if runs.is_empty() {
            warn!(file = %input.display(), "no runs detected, skipping");
            continue;
        }

        let file_id = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".to_string());

        for (idx, run) in runs.iter().enumerate() {
            let run_no = idx + 1;
            text::write_compression_metrics(&mut metrics_file, &file_id, run_no, run)?;

            let curve = run.curve();
            let xs: Vec<f64> = curve.iter().map(|p| p.0).collect();
            let ys: Vec<f64> = curve.iter().map(|p| p.1).collect();
            let plot_path = out_dir.join(format!("{}_run_{}_plot.png", file_id, run_no));
            match plot::line_chart(
                &plot_path,
                &format!("{} - Run {} - Load vs. Axial Displacement", file_id, run_no),
                "Axial Displacement (mm)",
                "Load (N)",
                &xs,
                &ys,
                BLUE,
                None,
            ) {
                Ok(()) => info!("saved plot: {}", plot_path.display()),
                Err(e) => warn!("failed to plot run {}: {e}", run_no),
            }
        }
    }

    info!("metrics written to {}", metrics_path.display());
    Ok(())
}
