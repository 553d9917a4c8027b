// ---------------------------------------------------------------------------
// Standard atmosphere (ISA), sea level to 47 km
// ---------------------------------------------------------------------------
// Sounding-rocket altitudes stay well inside the stratosphere; layers above
// 47 km collapse to an exponential tail.

const G0: f64 = 9.80665; // standard gravity, m/s^2
const R_AIR: f64 = 287.052_87; // specific gas constant for dry air, J/(kg·K)
const GAMMA: f64 = 1.4; // ratio of specific heats

const T0: f64 = 288.15; // sea-level temperature, K
const P0: f64 = 101_325.0; // sea-level pressure, Pa

/// Atmospheric properties at a geometric altitude.
#[derive(Debug, Clone, Copy)]
pub struct Atmosphere {
    pub density: f64,     // kg/m^3
    pub temperature: f64, // K
    pub sound_speed: f64, // m/s
}

/// ISA model. Negative altitudes clamp to sea level.
pub fn at(altitude_m: f64) -> Atmosphere {
    let h = altitude_m.max(0.0);

    let (temperature, pressure) = if h < 11_000.0 {
        // Troposphere: lapse -6.5 K/km
        gradient_layer(h, 0.0, T0, -0.0065, P0)
    } else if h < 20_000.0 {
        // Tropopause: isothermal 216.65 K
        isothermal_layer(h, 11_000.0, 216.65, 22_632.1)
    } else if h < 32_000.0 {
        // Stratosphere I: lapse +1.0 K/km
        gradient_layer(h, 20_000.0, 216.65, 0.001, 5_474.89)
    } else if h < 47_000.0 {
        // Stratosphere II: lapse +2.8 K/km
        gradient_layer(h, 32_000.0, 228.65, 0.0028, 868.019)
    } else {
        // Thin exponential tail; good enough above any rocket this crate sees
        let t = 270.65;
        let p = 110.906 * ((-G0 / (R_AIR * t)) * (h - 47_000.0)).exp();
        (t, p)
    };

    Atmosphere {
        density: pressure / (R_AIR * temperature),
        temperature,
        sound_speed: (GAMMA * R_AIR * temperature).sqrt(),
    }
}

/// Gradient layer: T = T_base + lapse * (h - h_base)
fn gradient_layer(h: f64, h_base: f64, t_base: f64, lapse: f64, p_base: f64) -> (f64, f64) {
    let t = t_base + lapse * (h - h_base);
    let p = p_base * (t / t_base).powf(-G0 / (lapse * R_AIR));
    (t, p)
}

/// Isothermal layer: constant T, exponentially decaying pressure
fn isothermal_layer(h: f64, h_base: f64, t: f64, p_base: f64) -> (f64, f64) {
    let p = p_base * ((-G0 / (R_AIR * t)) * (h - h_base)).exp();
    (t, p)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sea_level_standard_values() {
        let a = at(0.0);
        assert!((a.temperature - 288.15).abs() < 0.01);
        assert!((a.density - 1.225).abs() < 0.001);
        assert!((a.sound_speed - 340.29).abs() < 0.1);
    }

    #[test]
    fn density_decreases_with_altitude() {
        let rho = [at(0.0), at(5_000.0), at(15_000.0), at(40_000.0)];
        for pair in rho.windows(2) {
            assert!(pair[0].density > pair[1].density);
        }
        assert!(rho[3].density > 0.0);
    }

    #[test]
    fn negative_altitude_clamps_to_sea_level() {
        let a = at(-300.0);
        assert!((a.temperature - 288.15).abs() < 0.01);
    }
}
