pub mod compression;
pub mod data;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod report;
pub mod sensitivity;

pub use data::{EventKind, EventLog, EventPolicy, FlightData, FlightQuantity};
pub use engine::{BallisticEngine, EngineError, Rocket, SimConfig, Simulator};
pub use error::AnalysisError;
pub use metrics::{KeyMetrics, Metric, StabilitySummary};
