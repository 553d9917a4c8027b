pub mod flight;
pub mod reduce;
pub mod segment;
pub mod units;

pub use flight::{
    DescentVelocity, GroundHitVelocity, InterDeployment, KeyMetrics, Metric, OnRailThrust,
    RailExit, StabilitySummary,
};
pub use reduce::{extrema_with_time, nearest_sample, reduce, Extrema, Extremum, Reduction};
pub use segment::interval_mask;
pub use units::{convert_series, unit_convert, METER_TO_FOOT, NEWTON_TO_POUND_FORCE};
