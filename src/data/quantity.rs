use std::fmt;

// ---------------------------------------------------------------------------
// Sampled physical quantities
// ---------------------------------------------------------------------------

/// The closed set of physical quantities a flight recording can carry.
///
/// Every series for one run shares the same time axis; see
/// [`FlightData`](crate::data::FlightData).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightQuantity {
    Time,
    Altitude,
    VelocityTotal,
    AccelerationTotal,
    ThrustForce,
    DragForce,
    Mass,
    MachNumber,
    AngleOfAttack,
    CgLocation,
    CpLocation,
    StabilityMargin,
}

impl FlightQuantity {
    /// All quantities, in report/plot order.
    pub const ALL: [FlightQuantity; 12] = [
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
        FlightQuantity::StabilityMargin,
    ];

    /// Display label, stable across releases (report files depend on it).
    pub fn label(&self) -> &'static str {
        match self {
            FlightQuantity::Time => "Time",
            FlightQuantity::Altitude => "Altitude",
            FlightQuantity::VelocityTotal => "Total Velocity",
            FlightQuantity::AccelerationTotal => "Total Acceleration",
            FlightQuantity::ThrustForce => "Thrust Force",
            FlightQuantity::DragForce => "Drag Force",
            FlightQuantity::Mass => "Mass",
            FlightQuantity::MachNumber => "Mach Number",
            FlightQuantity::AngleOfAttack => "Angle of Attack",
            FlightQuantity::CgLocation => "CG Location",
            FlightQuantity::CpLocation => "CP Location",
            FlightQuantity::StabilityMargin => "Stability Margin",
        }
    }

    /// SI unit string as sampled by the engine.
    pub fn unit(&self) -> &'static str {
        match self {
            FlightQuantity::Time => "s",
            FlightQuantity::Altitude => "m",
            FlightQuantity::VelocityTotal => "m/s",
            FlightQuantity::AccelerationTotal => "m/s^2",
            FlightQuantity::ThrustForce => "N",
            FlightQuantity::DragForce => "N",
            FlightQuantity::Mass => "kg",
            FlightQuantity::MachNumber => "",
            FlightQuantity::AngleOfAttack => "deg",
            FlightQuantity::CgLocation => "m",
            FlightQuantity::CpLocation => "m",
            FlightQuantity::StabilityMargin => "cal",
        }
    }
}

impl fmt::Display for FlightQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_unique() {
        for (i, a) in FlightQuantity::ALL.iter().enumerate() {
            for b in &FlightQuantity::ALL[i + 1..] {
                assert_ne!(a.label(), b.label());
            }
        }
    }
}
