use std::io::{self, BufRead};

use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Compression-test log parser
// ---------------------------------------------------------------------------
// Rig exports are whitespace/quote-delimited text with one header line per
// run, a units row under it, then fixed seven-column data lines. Export
// encoding is messy: stray U+FFFD replacement characters and embedded quotes
// show up mid-token and have to be normalized away before splitting.

/// One sampled point of a compression run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionPoint {
    pub index: i64,
    pub time_s: f64,
    pub axial_mm: f64,
    /// Load cell DC1, newtons (negative in compression).
    pub load_dc1_n: f64,
    /// Load cell DC2, pounds.
    pub load_dc2_lb: f64,
    pub dc3: String,
    pub dc4: String,
}

/// One run: the rows between two header lines (or header and EOF).
#[derive(Debug, Clone, Default)]
pub struct CompressionRun {
    pub points: Vec<CompressionPoint>,
}

/// Peak load of a run and where it occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakLoad {
    pub load_n: f64,
    pub displacement_mm: f64,
}

impl CompressionRun {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Max |DC1| load and the |axial| displacement at which it occurs.
    /// Ties break toward the earliest point.
    pub fn peak_load(&self) -> Option<PeakLoad> {
        let mut peak: Option<PeakLoad> = None;
        for p in &self.points {
            let load = p.load_dc1_n.abs();
            match &peak {
                Some(best) if load <= best.load_n => {}
                _ => {
                    peak = Some(PeakLoad {
                        load_n: load,
                        displacement_mm: p.axial_mm.abs(),
                    });
                }
            }
        }
        peak
    }

    /// (|displacement|, |load|) pairs for the load-displacement curve.
    pub fn curve(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.axial_mm.abs(), p.load_dc1_n.abs()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

const HEADER_KEYWORDS: [&str; 7] = ["point", "time", "axial pos.", "dc1", "dc2", "dc3", "dc4"];

/// Strip quotes and blank out encoding artifacts before tokenizing.
fn normalize(line: &str) -> String {
    line.replace('"', "").replace('\u{FFFD}', " ")
}

/// Loose header match: every keyword appears somewhere, case-insensitively.
fn is_header(normalized: &str) -> bool {
    let lower = normalized.to_lowercase();
    HEADER_KEYWORDS.iter().all(|k| lower.contains(k))
}

fn parse_point(parts: &[&str]) -> Option<CompressionPoint> {
    Some(CompressionPoint {
        index: parts[0].parse().ok()?,
        time_s: parts[1].parse().ok()?,
        axial_mm: parts[2].parse().ok()?,
        load_dc1_n: parts[3].parse().ok()?,
        load_dc2_lb: parts[4].parse().ok()?,
        dc3: parts[5].to_string(),
        dc4: parts[6].to_string(),
    })
}

/// Scan a rig log into its runs.
///
/// Malformed lines are skipped with a diagnostic; only I/O failures are
/// errors. Text before the first header is ignored.
pub fn parse_log<R: BufRead>(reader: R) -> io::Result<Vec<CompressionRun>> {
    let mut runs = Vec::new();
    let mut points: Vec<CompressionPoint> = Vec::new();
    let mut in_run = false;
    let mut expect_units = false;

    for (i, line) in reader.lines().enumerate() {
        let line_number = i + 1;
        let line = line?;
        let normalized = normalize(line.trim());

        if is_header(&normalized) {
            debug!(line_number, "header detected");
            if in_run && !points.is_empty() {
                debug!(rows = points.len(), "run completed");
                runs.push(CompressionRun {
                    points: std::mem::take(&mut points),
                });
            }
            in_run = true;
            expect_units = true;
            continue;
        }
        if !in_run {
            continue;
        }
        if expect_units {
            // Units row directly under the header carries no data
            expect_units = false;
            continue;
        }
        if normalized.trim().is_empty() {
            continue;
        }

        let parts: Vec<&str> = normalized.split_whitespace().collect();
        if parts.len() < 7 {
            warn!(line_number, line = %line, "incomplete data line skipped");
            continue;
        }
        match parse_point(&parts) {
            Some(p) => points.push(p),
            None => warn!(line_number, line = %line, "unparseable data line skipped"),
        }
    }

    if in_run && !points.is_empty() {
        debug!(rows = points.len(), "final run completed");
        runs.push(CompressionRun { points });
    }

    Ok(runs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
