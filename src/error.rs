use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineError;

/// Crate-level error taxonomy.
///
/// Only missing inputs and single-run engine failures are fatal to an
/// invocation; everything else degrades to recorded conditions inside the
/// report (see the `Metric` outcome type).
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("unknown component '{0}'")]
    UnknownComponent(String),

    #[error("simulation failed: {0}")]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("plot rendering failed: {0}")]
    Plot(String),
}
