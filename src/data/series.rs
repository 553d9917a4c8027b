use std::collections::HashMap;

use super::quantity::FlightQuantity;

// ---------------------------------------------------------------------------
// Time-series store
// ---------------------------------------------------------------------------

/// In-memory store for one simulation run: a shared time axis plus one
/// equal-length sample series per recorded quantity.
///
/// Invariant: every series has exactly `time().len()` samples, so index i of
/// any series corresponds to `time()[i]`.
#[derive(Debug, Clone, Default)]
pub struct FlightData {
    time: Vec<f64>,
    series: HashMap<FlightQuantity, Vec<f64>>,
}

impl FlightData {
    pub fn new(time: Vec<f64>) -> Self {
        Self {
            time,
            series: HashMap::new(),
        }
    }

    /// Shared time axis, seconds. Monotonically non-decreasing as produced by
    /// the engine.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Number of samples per series.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Insert a series. Rejects length mismatches against the time axis.
    pub fn insert(&mut self, quantity: FlightQuantity, values: Vec<f64>) -> Result<(), usize> {
        if values.len() != self.time.len() {
            return Err(values.len());
        }
        self.series.insert(quantity, values);
        Ok(())
    }

    /// Sample series for a quantity, if recorded. `Time` always resolves to
    /// the shared axis.
    pub fn get(&self, quantity: FlightQuantity) -> Option<&[f64]> {
        match quantity {
            FlightQuantity::Time => Some(&self.time),
            q => self.series.get(&q).map(Vec::as_slice),
        }
    }

    pub fn contains(&self, quantity: FlightQuantity) -> bool {
        self.get(quantity).is_some()
    }

    /// Quantities from `required` that are absent from this store.
    pub fn missing(&self, required: &[FlightQuantity]) -> Vec<FlightQuantity> {
        required
            .iter()
            .copied()
            .filter(|q| !self.contains(*q))
            .collect()
    }

    /// Recorded quantities (excluding the implicit time axis), unordered.
    pub fn quantities(&self) -> impl Iterator<Item = FlightQuantity> + '_ {
        self.series.keys().copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rejects_length_mismatch() {
        let mut data = FlightData::new(vec![0.0, 0.1, 0.2]);
        assert_eq!(
            data.insert(FlightQuantity::Altitude, vec![1.0, 2.0]),
            Err(2)
        );
        assert!(data
            .insert(FlightQuantity::Altitude, vec![1.0, 2.0, 3.0])
            .is_ok());
    }

    #[test]
    fn time_is_always_present() {
        let data = FlightData::new(vec![0.0, 1.0]);
        assert_eq!(data.get(FlightQuantity::Time), Some(&[0.0, 1.0][..]));
        assert!(data.missing(&[FlightQuantity::Time]).is_empty());
    }

    #[test]
    fn missing_reports_absent_quantities() {
        let mut data = FlightData::new(vec![0.0, 1.0]);
        data.insert(FlightQuantity::Altitude, vec![0.0, 10.0])
            .unwrap();
        let missing = data.missing(&[
            FlightQuantity::Altitude,
            FlightQuantity::VelocityTotal,
            FlightQuantity::ThrustForce,
        ]);
        assert_eq!(
            missing,
            vec![FlightQuantity::VelocityTotal, FlightQuantity::ThrustForce]
        );
    }
}
