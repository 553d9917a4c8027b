pub mod atmosphere;
pub mod ballistic;
pub mod design;

pub use ballistic::{BallisticEngine, SimConfig};
pub use design::{Component, ComponentKind, Motor, Recovery, Rocket};

use thiserror::Error;

use crate::data::{EventLog, FlightData, FlightQuantity};

// ---------------------------------------------------------------------------
// Simulation engine boundary
// ---------------------------------------------------------------------------

/// Errors raised at the simulation engine boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("no flight has been simulated yet")]
    NoFlight,
    #[error("quantity '{0}' was not recorded by the engine")]
    MissingQuantity(FlightQuantity),
}

/// The contract every flight simulation engine satisfies.
///
/// `run` executes synchronously and blocks until the flight completes; it
/// fails on an invalid design. `timeseries` and `events` read the results of
/// the most recent run. Component mass overrides are applied on the design
/// object itself ([`Component::set_override_enabled`] /
/// [`Component::set_override_mass`]) before calling `run`.
pub trait Simulator {
    /// Execute one flight of `rocket`, replacing any previous results.
    fn run(&mut self, rocket: &Rocket) -> Result<(), EngineError>;

    /// Sample series for the requested quantities from the last run, on the
    /// run's shared time axis.
    fn timeseries(&self, quantities: &[FlightQuantity]) -> Result<FlightData, EngineError>;

    /// Discrete events from the last run.
    fn events(&self) -> Result<EventLog, EngineError>;
}
