use nalgebra::Vector3;
use tracing::debug;

use crate::data::{EventKind, EventLog, FlightData, FlightQuantity};

use super::atmosphere;
use super::design::Rocket;
use super::{EngineError, Simulator};

pub const G0: f64 = 9.80665; // standard gravity, m/s^2
const EARTH_RADIUS: f64 = 6_371_000.0; // mean Earth radius, m

// ---------------------------------------------------------------------------
// Simulation configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub dt: f64,       // integration timestep, s
    pub max_time: f64, // hard stop, s
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,        // 100 Hz
            max_time: 600.0, // 10 min ceiling
        }
    }
}

// ---------------------------------------------------------------------------
// Point-mass flight state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct State {
    time: f64,
    pos: Vector3<f64>, // m, ENU, origin at the pad
    vel: Vector3<f64>, // m/s
    mass: f64,         // kg
}

impl State {
    fn apply(&self, d: &Deriv, dt: f64) -> State {
        State {
            time: self.time + dt,
            pos: self.pos + d.dpos * dt,
            vel: self.vel + d.dvel * dt,
            mass: (self.mass + d.dmass * dt).max(0.0),
        }
    }
}

struct Deriv {
    dpos: Vector3<f64>,
    dvel: Vector3<f64>,
    dmass: f64,
}

/// Which recovery devices are out, for the drag model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DescentStage {
    None,
    Drogue,
    Main,
}

// ---------------------------------------------------------------------------
// Equations of motion
// ---------------------------------------------------------------------------

/// Forces: inverse-square gravity, constant motor thrust along the velocity
/// (gravity turn; launch axis while slow), quadratic drag with the drag area
/// of the current descent stage.
fn derivatives(state: &State, rocket: &Rocket, stage: DescentStage, dry_mass: f64) -> Deriv {
    let alt = state.pos.z.max(0.0);
    let burning = state.time < rocket.motor.burn_time && state.mass > dry_mass;

    let g = G0 * (EARTH_RADIUS / (EARTH_RADIUS + alt)).powi(2);
    let a_gravity = Vector3::new(0.0, 0.0, -g);

    let a_thrust = if burning {
        let speed = state.vel.norm();
        let direction = if speed > 1.0 {
            state.vel.normalize()
        } else {
            launch_axis(rocket)
        };
        direction * (rocket.motor.thrust / state.mass)
    } else {
        Vector3::zeros()
    };

    let a_drag = {
        let speed = state.vel.norm();
        if speed > 1e-6 {
            let atm = atmosphere::at(alt);
            let q = 0.5 * atm.density * speed * speed;
            let f_drag = q * drag_area(rocket, stage);
            -state.vel.normalize() * (f_drag / state.mass)
        } else {
            Vector3::zeros()
        }
    };

    Deriv {
        dpos: state.vel,
        dvel: a_gravity + a_thrust + a_drag,
        dmass: if burning { -rocket.motor.mass_flow() } else { 0.0 },
    }
}

fn launch_axis(rocket: &Rocket) -> Vector3<f64> {
    let a = rocket.launch_angle;
    Vector3::new(a.sin(), 0.0, a.cos())
}

/// Cd·A of the vehicle plus whatever canopy is out.
fn drag_area(rocket: &Rocket, stage: DescentStage) -> f64 {
    let body = rocket.cd * rocket.reference_area();
    match stage {
        DescentStage::None => body,
        DescentStage::Drogue => body + rocket.recovery.drogue_cd_area,
        DescentStage::Main => body + rocket.recovery.drogue_cd_area + rocket.recovery.main_cd_area,
    }
}

/// Classical RK4 step.
fn rk4_step(state: &State, rocket: &Rocket, stage: DescentStage, dry_mass: f64, dt: f64) -> State {
    let k1 = derivatives(state, rocket, stage, dry_mass);
    let k2 = derivatives(&state.apply(&k1, dt * 0.5), rocket, stage, dry_mass);
    let k3 = derivatives(&state.apply(&k2, dt * 0.5), rocket, stage, dry_mass);
    let k4 = derivatives(&state.apply(&k3, dt), rocket, stage, dry_mass);

    State {
        time: state.time + dt,
        pos: state.pos + (k1.dpos + 2.0 * k2.dpos + 2.0 * k3.dpos + k4.dpos) * (dt / 6.0),
        vel: state.vel + (k1.dvel + 2.0 * k2.dvel + 2.0 * k3.dvel + k4.dvel) * (dt / 6.0),
        mass: (state.mass + (k1.dmass + 2.0 * k2.dmass + 2.0 * k3.dmass + k4.dmass) * (dt / 6.0))
            .max(0.0),
    }
}

// ---------------------------------------------------------------------------
// Per-step sample recorder
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorder {
    time: Vec<f64>,
    altitude: Vec<f64>,
    velocity: Vec<f64>,
    acceleration: Vec<f64>,
    thrust: Vec<f64>,
    drag: Vec<f64>,
    mass: Vec<f64>,
    mach: Vec<f64>,
    aoa: Vec<f64>,
    cg: Vec<f64>,
    cp: Vec<f64>,
    stability: Vec<f64>,
}

impl Recorder {
    fn with_capacity(cap: usize) -> Self {
        let mut r = Recorder::default();
        for v in [
            &mut r.time,
            &mut r.altitude,
            &mut r.velocity,
            &mut r.acceleration,
            &mut r.thrust,
            &mut r.drag,
            &mut r.mass,
            &mut r.mach,
            &mut r.aoa,
            &mut r.cg,
            &mut r.cp,
            &mut r.stability,
        ] {
            v.reserve(cap);
        }
        r
    }

    fn push(&mut self, state: &State, rocket: &Rocket, stage: DescentStage, dry_mass: f64) {
        let alt = state.pos.z.max(0.0);
        let speed = state.vel.norm();
        let atm = atmosphere::at(alt);
        let burning = state.time < rocket.motor.burn_time && state.mass > dry_mass;

        let d = derivatives(state, rocket, stage, dry_mass);
        let drag_n = {
            let q = 0.5 * atm.density * speed * speed;
            q * drag_area(rocket, stage)
        };

        // Point-mass proxy for angle of attack: the body axis tracks the
        // velocity vector in free flight and hangs vertical under canopy.
        let aoa_deg = if speed < 1.0 {
            0.0
        } else if stage == DescentStage::None {
            0.0
        } else {
            let down = Vector3::new(0.0, 0.0, -1.0);
            let cos = (state.vel.dot(&down) / speed).clamp(-1.0, 1.0);
            cos.acos().to_degrees()
        };

        let burned = rocket.motor.mass_flow() * state.time.min(rocket.motor.burn_time);
        let cg = rocket.cg_location(burned);
        let stability = if speed < 1.0 {
            f64::NAN // CP is undefined without airflow
        } else {
            (rocket.cp_location - cg) / rocket.diameter
        };

        self.time.push(state.time);
        self.altitude.push(state.pos.z);
        self.velocity.push(speed);
        self.acceleration.push(d.dvel.norm());
        self.thrust.push(if burning { rocket.motor.thrust } else { 0.0 });
        self.drag.push(drag_n);
        self.mass.push(state.mass);
        self.mach.push(speed / atm.sound_speed);
        self.aoa.push(aoa_deg);
        self.cg.push(cg);
        self.cp.push(rocket.cp_location);
        self.stability.push(stability);
    }

    fn into_flight_data(self) -> FlightData {
        let mut data = FlightData::new(self.time);
        let series = [
            (FlightQuantity::Altitude, self.altitude),
            (FlightQuantity::VelocityTotal, self.velocity),
            (FlightQuantity::AccelerationTotal, self.acceleration),
            (FlightQuantity::ThrustForce, self.thrust),
            (FlightQuantity::DragForce, self.drag),
            (FlightQuantity::Mass, self.mass),
            (FlightQuantity::MachNumber, self.mach),
            (FlightQuantity::AngleOfAttack, self.aoa),
            (FlightQuantity::CgLocation, self.cg),
            (FlightQuantity::CpLocation, self.cp),
            (FlightQuantity::StabilityMargin, self.stability),
        ];
        for (q, values) in series {
            data.insert(q, values)
                .expect("recorded series match the time axis by construction");
        }
        data
    }
}

// ---------------------------------------------------------------------------
// Bundled reference engine
// ---------------------------------------------------------------------------

struct Recording {
    data: FlightData,
    events: EventLog,
}

/// Point-mass flight simulator implementing the [`Simulator`] boundary.
///
/// Models a single-motor flight with drogue deployment at apogee and main
/// deployment at a set altitude, recording the full quantity catalogue and
/// the standard event sequence.
pub struct BallisticEngine {
    config: SimConfig,
    last: Option<Recording>,
}

impl BallisticEngine {
    pub fn new(config: SimConfig) -> Self {
        Self { config, last: None }
    }

    fn validate(&self, rocket: &Rocket) -> Result<(), EngineError> {
        if self.config.dt <= 0.0 || self.config.max_time <= 0.0 {
            return Err(EngineError::InvalidConfiguration(
                "timestep and max_time must be positive".into(),
            ));
        }
        if rocket.components.is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "design has no components".into(),
            ));
        }
        if rocket.motor.thrust <= 0.0 || rocket.motor.burn_time <= 0.0 {
            return Err(EngineError::InvalidConfiguration(
                "motor must produce thrust over a positive burn time".into(),
            ));
        }
        let total = rocket.total_mass();
        if total <= 0.0 || rocket.motor.propellant_mass >= total {
            return Err(EngineError::InvalidConfiguration(format!(
                "loaded mass {:.3} kg is inconsistent with propellant {:.3} kg",
                total, rocket.motor.propellant_mass
            )));
        }
        Ok(())
    }
}

impl Default for BallisticEngine {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Simulator for BallisticEngine {
    fn run(&mut self, rocket: &Rocket) -> Result<(), EngineError> {
        self.validate(rocket)?;

        let total_mass = rocket.total_mass();
        let dry_mass = total_mass - rocket.motor.propellant_mass;

        let mut state = State {
            time: 0.0,
            pos: Vector3::zeros(),
            vel: Vector3::zeros(),
            mass: total_mass,
        };

        let cap = ((self.config.max_time / self.config.dt) as usize + 1).min(200_000);
        let mut rec = Recorder::with_capacity(cap);
        let mut events = EventLog::new();
        events.record(EventKind::Launch, 0.0);
        events.record(EventKind::Ignition, 0.0);

        let mut stage = DescentStage::None;
        let mut liftoff = false;
        let mut rod_cleared = false;
        let mut burnout = false;
        let mut ended = false;

        rec.push(&state, rocket, stage, dry_mass);

        while state.time < self.config.max_time {
            let prev = state.clone();
            state = rk4_step(&prev, rocket, stage, dry_mass, self.config.dt);

            if !liftoff && state.pos.z > 1e-3 {
                liftoff = true;
                events.record(EventKind::Liftoff, state.time);
            }
            if liftoff && !rod_cleared && state.pos.norm() >= rocket.rail_length {
                rod_cleared = true;
                events.record(EventKind::LaunchRodClearance, state.time);
            }
            if !burnout && state.time >= rocket.motor.burn_time {
                burnout = true;
                events.record(EventKind::Burnout, state.time);
            }
            // Apogee: vertical velocity sign change well above the pad.
            // The ejection charge fires there and pushes out the drogue.
            if stage == DescentStage::None
                && prev.vel.z > 0.0
                && state.vel.z <= 0.0
                && state.pos.z > 10.0
            {
                events.record(EventKind::Apogee, state.time);
                events.record(EventKind::EjectionCharge, state.time);
                events.record(EventKind::RecoveryDeviceDeployment, state.time);
                stage = DescentStage::Drogue;
            }
            if stage == DescentStage::Drogue
                && state.vel.z < 0.0
                && state.pos.z <= rocket.recovery.main_altitude
            {
                events.record(EventKind::RecoveryDeviceDeployment, state.time);
                stage = DescentStage::Main;
            }
            if liftoff && state.pos.z <= 0.0 {
                state.pos.z = 0.0;
                rec.push(&state, rocket, stage, dry_mass);
                events.record(EventKind::GroundHit, state.time);
                events.record(EventKind::SimulationEnd, state.time);
                ended = true;
                break;
            }

            rec.push(&state, rocket, stage, dry_mass);
        }

        if !ended {
            events.record(EventKind::SimulationEnd, state.time);
        }

        debug!(
            steps = rec.time.len(),
            flight_time = state.time,
            "flight simulated"
        );
        self.last = Some(Recording {
            data: rec.into_flight_data(),
            events,
        });
        Ok(())
    }

    fn timeseries(&self, quantities: &[FlightQuantity]) -> Result<FlightData, EngineError> {
        let rec = self.last.as_ref().ok_or(EngineError::NoFlight)?;
        let mut out = FlightData::new(rec.data.time().to_vec());
        for &q in quantities {
            if q == FlightQuantity::Time {
                continue; // implicit shared axis
            }
            let series = rec.data.get(q).ok_or(EngineError::MissingQuantity(q))?;
            out.insert(q, series.to_vec())
                .expect("recorded series share one axis");
        }
        Ok(out)
    }

    fn events(&self) -> Result<EventLog, EngineError> {
        let rec = self.last.as_ref().ok_or(EngineError::NoFlight)?;
        Ok(rec.events.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EventPolicy;
    use crate::engine::design::presets;

    fn flown_engine() -> BallisticEngine {
        let mut engine = BallisticEngine::default();
        engine.run(&presets::hyperion()).expect("nominal flight");
        engine
    }

    #[test]
    fn results_unavailable_before_first_run() {
        let engine = BallisticEngine::default();
        assert_eq!(
            engine.timeseries(&FlightQuantity::ALL).unwrap_err(),
            EngineError::NoFlight
        );
        assert_eq!(engine.events().unwrap_err(), EngineError::NoFlight);
    }

    #[test]
    fn nominal_flight_produces_full_event_sequence() {
        let engine = flown_engine();
        let events = engine.events().unwrap();
        for kind in [
            EventKind::Launch,
            EventKind::Ignition,
            EventKind::Liftoff,
            EventKind::LaunchRodClearance,
            EventKind::Burnout,
            EventKind::Apogee,
            EventKind::EjectionCharge,
            EventKind::GroundHit,
            EventKind::SimulationEnd,
        ] {
            assert_eq!(events.count(kind), 1, "expected exactly one {}", kind);
        }
        assert_eq!(
            events.count(EventKind::RecoveryDeviceDeployment),
            2,
            "drogue and main"
        );
    }

    #[test]
    fn event_order_is_physical() {
        let engine = flown_engine();
        let events = engine.events().unwrap();
        let t = |k| events.select(k, EventPolicy::Earliest).unwrap();
        assert!(t(EventKind::Liftoff) < t(EventKind::LaunchRodClearance));
        assert!(t(EventKind::LaunchRodClearance) < t(EventKind::Burnout));
        assert!(t(EventKind::Burnout) < t(EventKind::Apogee));
        assert!(t(EventKind::Apogee) < t(EventKind::GroundHit));
        let deployments = events.times(EventKind::RecoveryDeviceDeployment);
        assert!(deployments[0] < deployments[1], "drogue before main");
    }

    #[test]
    fn series_share_the_time_axis() {
        let engine = flown_engine();
        let data = engine.timeseries(&FlightQuantity::ALL).unwrap();
        let n = data.len();
        assert!(n > 100, "a real flight has many samples");
        for q in FlightQuantity::ALL {
            assert_eq!(data.get(q).unwrap().len(), n, "{} length", q);
        }
        for pair in data.time().windows(2) {
            assert!(pair[1] >= pair[0], "time axis must be monotonic");
        }
    }

    #[test]
    fn apogee_altitude_is_physical() {
        let engine = flown_engine();
        let data = engine.timeseries(&[FlightQuantity::Altitude]).unwrap();
        let apogee = data
            .get(FlightQuantity::Altitude)
            .unwrap()
            .iter()
            .fold(0.0_f64, |a, &b| a.max(b));
        assert!(apogee > 500.0, "apogee {:.0} m too low", apogee);
        assert!(apogee < 20_000.0, "apogee {:.0} m absurd", apogee);
    }

    #[test]
    fn main_descent_is_slower_than_drogue_descent() {
        let engine = flown_engine();
        let data = engine
            .timeseries(&[FlightQuantity::Altitude, FlightQuantity::VelocityTotal])
            .unwrap();
        let events = engine.events().unwrap();
        let deployments = events.times(EventKind::RecoveryDeviceDeployment);
        let (drogue_t, main_t) = (deployments[0], deployments[1]);
        let time = data.time();
        let vel = data.get(FlightQuantity::VelocityTotal).unwrap();

        let mid_drogue =
            crate::metrics::nearest_sample(time, vel, (drogue_t + main_t) / 2.0).unwrap();
        let end = *time.last().unwrap();
        let late_main = crate::metrics::nearest_sample(time, vel, (main_t + end) / 2.0).unwrap();
        assert!(
            late_main < mid_drogue,
            "main canopy must slow the descent: {:.1} -> {:.1} m/s",
            mid_drogue,
            late_main
        );
    }

    #[test]
    fn heavier_payload_lowers_apogee() {
        let mut engine = BallisticEngine::default();
        let mut rocket = presets::hyperion();

        engine.run(&rocket).unwrap();
        let nominal = max_altitude(&engine);

        let payload = rocket.component_mut("Payload").unwrap();
        payload.set_override_enabled(true);
        payload.set_override_mass(payload.nominal_mass() * 1.5);
        engine.run(&rocket).unwrap();
        let heavy = max_altitude(&engine);

        assert!(
            heavy < nominal,
            "+50% payload must cost altitude: {:.0} -> {:.0} m",
            nominal,
            heavy
        );
    }

    fn max_altitude(engine: &BallisticEngine) -> f64 {
        engine
            .timeseries(&[FlightQuantity::Altitude])
            .unwrap()
            .get(FlightQuantity::Altitude)
            .unwrap()
            .iter()
            .fold(0.0_f64, |a, &b| a.max(b))
    }

    #[test]
    fn invalid_design_is_rejected() {
        let mut engine = BallisticEngine::default();
        let mut rocket = presets::hyperion();
        rocket.motor.thrust = 0.0;
        assert!(matches!(
            engine.run(&rocket),
            Err(EngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn timeseries_returns_only_requested_quantities() {
        let engine = flown_engine();
        let data = engine.timeseries(&[FlightQuantity::Altitude]).unwrap();
        assert!(data.get(FlightQuantity::Altitude).is_some());
        assert!(data.get(FlightQuantity::DragForce).is_none());
    }
}
