// ---------------------------------------------------------------------------
// Unit conversions
// ---------------------------------------------------------------------------
// Centralized so the report and plot layers cannot drift apart on factors.

/// Newtons to pound-force.
pub const NEWTON_TO_POUND_FORCE: f64 = 0.224809;

/// Meters (or m/s) to feet (or ft/s).
pub const METER_TO_FOOT: f64 = 3.28084;

/// Pure scalar conversion.
pub fn unit_convert(value: f64, factor: f64) -> f64 {
    value * factor
}

/// Convert a whole series.
pub fn convert_series(values: &[f64], factor: f64) -> Vec<f64> {
    values.iter().map(|v| v * factor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_round_trips() {
        for &x in &[0.0, 1.0, -3.5, 1234.5678, 1e-9, 1e9] {
            let there = unit_convert(x, NEWTON_TO_POUND_FORCE);
            let back = unit_convert(there, 1.0 / NEWTON_TO_POUND_FORCE);
            assert!(
                (back - x).abs() <= 1e-9 * x.abs().max(1.0),
                "round trip drifted: {} -> {}",
                x,
                back
            );
        }
    }

    #[test]
    fn series_conversion_matches_scalar() {
        let series = [1.0, 2.0, 3.0];
        let converted = convert_series(&series, METER_TO_FOOT);
        for (a, b) in series.iter().zip(&converted) {
            assert!((unit_convert(*a, METER_TO_FOOT) - b).abs() < 1e-12);
        }
    }
}
