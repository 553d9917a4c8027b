use std::f64::consts::PI;
use std::fmt;

// ---------------------------------------------------------------------------
// Rocket design model
// ---------------------------------------------------------------------------
// Stands in for the opaque design files the external engine loads: the
// analysis layer only ever touches component names, masses, and the mass
// override contract.

/// Kinds of rocket components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    NoseCone,
    BodyTube,
    Fins,
    LaunchLug,
    Bulkhead,
    Parachute,
    Payload,
    MassComponent,
    Motor,
}

impl ComponentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ComponentKind::NoseCone => "NoseCone",
            ComponentKind::BodyTube => "BodyTube",
            ComponentKind::Fins => "FinSet",
            ComponentKind::LaunchLug => "LaunchLug",
            ComponentKind::Bulkhead => "Bulkhead",
            ComponentKind::Parachute => "Parachute",
            ComponentKind::Payload => "Payload",
            ComponentKind::MassComponent => "MassComponent",
            ComponentKind::Motor => "Motor",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// One component of the rocket: a name, a kind, a station, a nominal mass,
/// and optional geometric attributes.
///
/// Geometric attributes are capability queries: `None` means the component
/// kind has no such attribute, not a missing value.
///
/// The mass override is a two-call contract mirroring the engine boundary:
/// `set_override_enabled(true)` + `set_override_mass(kg)` replace the nominal
/// mass for subsequent runs; `set_override_enabled(false)` returns the
/// component to nominal. Leaving an override enabled corrupts later runs that
/// reuse the design, so sweeps must always reset it.
#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub kind: ComponentKind,
    /// Station of the component's own CG, m from the nose tip.
    pub position: f64,
    nominal_mass: f64,
    length: Option<f64>,
    diameter: Option<f64>,
    reference_area: Option<f64>,
    override_enabled: bool,
    override_mass: f64,
}

impl Component {
    pub fn new(name: impl Into<String>, kind: ComponentKind, position: f64, mass: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            position,
            nominal_mass: mass,
            length: None,
            diameter: None,
            reference_area: None,
            override_enabled: false,
            override_mass: 0.0,
        }
    }

    pub fn with_length(mut self, m: f64) -> Self {
        self.length = Some(m);
        self
    }

    pub fn with_diameter(mut self, m: f64) -> Self {
        self.diameter = Some(m);
        self
    }

    pub fn with_reference_area(mut self, m2: f64) -> Self {
        self.reference_area = Some(m2);
        self
    }

    /// Mass as designed, kg.
    pub fn nominal_mass(&self) -> f64 {
        self.nominal_mass
    }

    /// Effective mass: the override while enabled, nominal otherwise.
    pub fn mass(&self) -> f64 {
        if self.override_enabled {
            self.override_mass
        } else {
            self.nominal_mass
        }
    }

    pub fn mass_overridden(&self) -> bool {
        self.override_enabled
    }

    pub fn set_override_enabled(&mut self, enabled: bool) {
        self.override_enabled = enabled;
    }

    pub fn set_override_mass(&mut self, kg: f64) {
        self.override_mass = kg;
    }

    /// Axial length, m, when the component has one.
    pub fn length(&self) -> Option<f64> {
        self.length
    }

    /// Outer diameter, m, when the component has one.
    pub fn diameter(&self) -> Option<f64> {
        self.diameter
    }

    /// Aerodynamic reference area, m^2, when the component has one.
    pub fn reference_area(&self) -> Option<f64> {
        self.reference_area
    }
}

// ---------------------------------------------------------------------------
// Motor and recovery configuration
// ---------------------------------------------------------------------------

/// Motor parameters: constant average thrust over the burn.
#[derive(Debug, Clone)]
pub struct Motor {
    pub designation: String,
    pub thrust: f64,          // N, average
    pub burn_time: f64,       // s
    pub propellant_mass: f64, // kg, part of the motor component's nominal mass
}

impl Motor {
    /// Propellant mass flow rate during the burn, kg/s.
    pub fn mass_flow(&self) -> f64 {
        if self.burn_time > 0.0 {
            self.propellant_mass / self.burn_time
        } else {
            0.0
        }
    }

    /// Total impulse, N·s.
    pub fn total_impulse(&self) -> f64 {
        self.thrust * self.burn_time
    }
}

/// Recovery system: drogue at apogee, main at a set altitude on descent.
/// Areas are Cd·A drag products, m^2.
#[derive(Debug, Clone)]
pub struct Recovery {
    pub drogue_cd_area: f64,
    pub main_cd_area: f64,
    /// Main deployment altitude on descent, m AGL.
    pub main_altitude: f64,
}

// ---------------------------------------------------------------------------
// Rocket
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Rocket {
    pub name: String,
    pub diameter: f64,     // body diameter (one caliber), m
    pub cd: f64,           // body drag coefficient
    pub rail_length: f64,  // m
    pub launch_angle: f64, // rad from vertical
    /// Center of pressure, m from nose tip (fixed by geometry).
    pub cp_location: f64,
    pub motor: Motor,
    pub recovery: Recovery,
    pub components: Vec<Component>,
}

impl Rocket {
    /// Body cross-section reference area, m^2.
    pub fn reference_area(&self) -> f64 {
        PI / 4.0 * self.diameter * self.diameter
    }

    /// Effective loaded mass: sum of effective component masses.
    pub fn total_mass(&self) -> f64 {
        self.components.iter().map(Component::mass).sum()
    }

    pub fn nominal_mass(&self) -> f64 {
        self.components.iter().map(Component::nominal_mass).sum()
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn component_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.name == name)
    }

    /// Station of the motor component, m from nose tip. Falls back to the
    /// aft-most component when the design carries no motor component.
    pub fn motor_position(&self) -> f64 {
        self.components
            .iter()
            .find(|c| c.kind == ComponentKind::Motor)
            .map(|c| c.position)
            .or_else(|| {
                self.components
                    .iter()
                    .map(|c| c.position)
                    .reduce(f64::max)
            })
            .unwrap_or(0.0)
    }

    /// Center of gravity, m from nose tip, with `propellant_burned` kg
    /// already expelled at the motor station.
    pub fn cg_location(&self, propellant_burned: f64) -> f64 {
        let total: f64 = self.total_mass() - propellant_burned;
        if total <= 0.0 {
            return 0.0;
        }
        let moment: f64 = self
            .components
            .iter()
            .map(|c| c.mass() * c.position)
            .sum::<f64>()
            - propellant_burned * self.motor_position();
        moment / total
    }

    /// Disable every component's mass override.
    pub fn reset_all_overrides(&mut self) {
        for c in &mut self.components {
            c.set_override_enabled(false);
        }
    }
}

// ---------------------------------------------------------------------------
// Preset designs
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    /// Two-deployment high-power sounding rocket, the default analysis
    /// subject.
    pub fn hyperion() -> Rocket {
        Rocket {
            name: "Hyperion II".into(),
            diameter: 0.132,
            cd: 0.45,
            rail_length: 5.2,
            launch_angle: 0.03,
            cp_location: 1.90,
            motor: Motor {
                designation: "M1200".into(),
                thrust: 1200.0,
                burn_time: 5.0,
                propellant_mass: 3.0,
            },
            recovery: Recovery {
                drogue_cd_area: 0.40,
                main_cd_area: 6.9,
                main_altitude: 200.0,
            },
            components: vec![
                Component::new("Nose Cone", ComponentKind::NoseCone, 0.30, 1.2)
                    .with_length(0.60)
                    .with_diameter(0.132),
                Component::new("Payload", ComponentKind::Payload, 0.75, 4.0).with_length(0.40),
                Component::new("Avionics Bay", ComponentKind::MassComponent, 1.05, 1.5)
                    .with_length(0.20),
                Component::new("Main Parachute", ComponentKind::Parachute, 1.25, 1.1),
                Component::new("Drogue Parachute", ComponentKind::Parachute, 1.55, 0.4),
                Component::new("Body Tube", ComponentKind::BodyTube, 1.50, 3.2)
                    .with_length(1.80)
                    .with_diameter(0.132),
                Component::new("Rail Button Pair", ComponentKind::LaunchLug, 1.80, 0.05),
                Component::new("Fin Set", ComponentKind::Fins, 2.45, 1.6)
                    .with_reference_area(0.054),
                Component::new("Motor", ComponentKind::Motor, 2.30, 5.5)
                    .with_length(0.75)
                    .with_diameter(0.098),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_replaces_mass_only_while_enabled() {
        let mut c = Component::new("Payload", ComponentKind::Payload, 0.75, 4.0);
        assert_eq!(c.mass(), 4.0);

        c.set_override_enabled(true);
        c.set_override_mass(5.5);
        assert_eq!(c.mass(), 5.5);
        assert_eq!(c.nominal_mass(), 4.0);

        c.set_override_enabled(false);
        assert_eq!(c.mass(), 4.0, "disabling returns the component to nominal");
    }

    #[test]
    fn total_mass_tracks_overrides() {
        let mut rocket = presets::hyperion();
        let nominal = rocket.total_mass();

        let payload = rocket.component_mut("Payload").unwrap();
        payload.set_override_enabled(true);
        payload.set_override_mass(payload.nominal_mass() + 1.0);
        assert!((rocket.total_mass() - nominal - 1.0).abs() < 1e-12);

        rocket.reset_all_overrides();
        assert!((rocket.total_mass() - nominal).abs() < 1e-12);
    }

    #[test]
    fn cg_moves_forward_as_propellant_burns() {
        let rocket = presets::hyperion();
        let cg_full = rocket.cg_location(0.0);
        let cg_empty = rocket.cg_location(rocket.motor.propellant_mass);
        assert!(
            cg_empty < cg_full,
            "burning aft propellant must move CG forward: {} -> {}",
            cg_full,
            cg_empty
        );
        assert!(cg_full < rocket.cp_location, "preset must be stable");
    }

    #[test]
    fn capability_queries_are_typed_optionals() {
        let rocket = presets::hyperion();
        let lug = rocket.component("Rail Button Pair").unwrap();
        assert!(lug.length().is_none());
        assert!(lug.diameter().is_none());
        let nose = rocket.component("Nose Cone").unwrap();
        assert_eq!(nose.length(), Some(0.60));
    }
}
