// ==============================================================================
// vehicle.rs — ONE SIMULATED CAR
// ------------------------------------------------------------------------------
// Owns all mutable state of a vehicle; the spec is shared (Arc) and the
// terrain is borrowed per step.
//
// step(input, terrain, dt):
//   1) clamp dt, sanitize input
//   2) steering
//   3) aero
//   4) per wheel: suspension → tire
//   5) hull corners
//   6) integrate
//   7) gear requests (manual / automatic)
//   8) drivetrain: shift timer, rpm, wheel spin
//   9) derived outputs
// ==============================================================================

use std::sync::Arc;

use crate::aero::aero_force;
use crate::body_collision::evaluate_hull;
use crate::controls::{update_steering, VehicleInput};
use crate::drivetrain::{self, gear_display};
use crate::integrator::{integrate, ForceAccumulator, IntegrationReport};
use crate::math::{Quat, Vec3};
use crate::spec::VehicleSpec;
use crate::state::{BodyCollisionPoint, GearboxState, RigidBodyState, WheelId, WheelState};
use crate::suspension::evaluate_suspension;
use crate::telemetry::{corner_telemetry, v3, wheel_telemetry, EulerDegrees, VehicleTelemetry};
use crate::terrain::TerrainQuery;
use crate::tire::solve::{build_patch, solve_tire};
use crate::tire::SolveContext;

/// Largest step the simulation will take; longer frames are truncated.
pub const MAX_DT: f32 = 0.05;

#[derive(Debug, Clone)]
pub struct Vehicle {
    spec: Arc<VehicleSpec>,
    body: RigidBodyState,
    wheels: [WheelState; 4],
    corners: [BodyCollisionPoint; 8],
    gearbox: GearboxState,
    steer_angle: f32,           // rad, front wheels
    speed: f32,                 // m/s along forward
    grounded_wheels: usize,
    last_report: IntegrationReport,
}

impl Vehicle {
    /// Build a vehicle with its centre of mass at `position`, upright and at
    /// rest, in first gear. An invalid spec is repaired (see
    /// [`VehicleSpec::sanitized`]).
    pub fn new(spec: Arc<VehicleSpec>, position: Vec3) -> Self {
        let spec = match spec.validate() {
            Ok(()) => spec,
            Err(e) => {
                log::warn!("vehicle spec `{}` rejected: {e}", spec.name);
                Arc::new(spec.sanitized())
            }
        };

        let wheels = WheelId::ALL.map(|id| WheelState::new(id, spec.wheel_offset(id)));
        let corners = spec.hull_corners().map(BodyCollisionPoint::new);
        let gearbox = GearboxState::new(spec.first_gear_index(), spec.engine.idle_rpm);

        log::debug!(
            "spawned `{}` at ({:.2}, {:.2}, {:.2})",
            spec.name, position.x, position.y, position.z
        );

        Self {
            spec,
            body: RigidBodyState::at_rest(position),
            wheels,
            corners,
            gearbox,
            steer_angle: 0.0,
            speed: 0.0,
            grounded_wheels: 0,
            last_report: IntegrationReport::default(),
        }
    }

    /// Spawn on the terrain at (x, z): terrain height plus the suspension
    /// rest length.
    pub fn spawn_on(spec: Arc<VehicleSpec>, terrain: &dyn TerrainQuery, x: f32, z: f32) -> Self {
        let y = terrain.height_at(x, z) + spec.suspension.rest_length;
        Self::new(spec, Vec3::new(x, y, z))
    }

    /// Put the car back upright and at rest at `position`, keeping the gear.
    pub fn reset(&mut self, position: Vec3, orientation: Quat) {
        self.body = RigidBodyState { orientation, ..RigidBodyState::at_rest(position) };
        for w in self.wheels.iter_mut() {
            w.wheel_rpm = 0.0;
            w.reset_contact();
        }
        self.speed = 0.0;
    }

    pub fn step(&mut self, input: &VehicleInput, terrain: &dyn TerrainQuery, dt: f32) {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_DT) } else { 0.0 };
        if dt <= 0.0 {
            return;
        }
        let input = input.sanitized();
        let spec = Arc::clone(&self.spec);

        // 2) steering
        let forward_speed = self.body.velocity.dot(&self.body.forward());
        self.steer_angle = update_steering(self.steer_angle, input.steering, forward_speed, &spec.steering, dt);

        // 3) aero
        let mut acc = ForceAccumulator::default();
        acc.add(aero_force(&spec.aero, self.body.velocity, self.body.up()), Vec3::zeros());

        // 4) wheels
        self.gearbox.wheel_torque = drivetrain::wheel_torque(&spec, &self.gearbox, input.throttle, &self.wheels);
        let ctx = SolveContext {
            dt,
            mass: spec.mass,
            throttle: input.throttle,
            brake: input.brake,
            handbrake: input.handbrake,
            wheel_torque: self.gearbox.wheel_torque,
            in_reverse: self.gearbox.is_reverse(&spec),
        };

        self.grounded_wheels = 0;
        for wheel in self.wheels.iter_mut() {
            wheel.steer_angle = if wheel.id.is_steered() { self.steer_angle } else { 0.0 };

            let Some(contact) = evaluate_suspension(&spec, &self.body, wheel, terrain) else {
                continue;
            };
            self.grounded_wheels += 1;
            acc.add(contact.force, contact.torque);

            let patch = build_patch(&spec, &self.body, wheel, &contact, wheel.steer_angle);
            let tire = solve_tire(&spec, &ctx, &self.body, &patch, wheel);
            acc.add(tire.force, tire.torque);
        }

        // 5) hull
        let hull = evaluate_hull(&spec, &self.body, &mut self.corners, terrain);
        acc.add(hull.force, hull.torque);

        // 6) integrate
        self.last_report = integrate(&spec, &mut self.body, &acc, self.grounded_wheels, terrain, dt);

        // 7) gear requests
        self.speed = self.body.velocity.dot(&self.body.forward());
        let from_wheels = drivetrain::wheel_engine_rpm(&spec, &self.gearbox, &self.wheels).unwrap_or(0.0);
        self.gearbox.apply_requests(&spec, &input, self.speed, from_wheels);

        // 8) drivetrain
        drivetrain::update_drivetrain(&spec, &mut self.gearbox, &mut self.wheels, input.throttle, self.speed, dt);
    }

    // ============================================
    // ----- outputs ------------------------------
    // ============================================

    pub fn spec(&self) -> &Arc<VehicleSpec> { &self.spec }
    pub fn body(&self) -> &RigidBodyState { &self.body }
    pub fn position(&self) -> Vec3 { self.body.position }
    pub fn velocity(&self) -> Vec3 { self.body.velocity }
    pub fn orientation(&self) -> Quat { self.body.orientation }
    /// Body frame.
    pub fn angular_velocity(&self) -> Vec3 { self.body.angular_velocity }

    /// Signed speed along the chassis forward axis (m/s).
    pub fn speed(&self) -> f32 { self.speed }
    pub fn speed_kmh(&self) -> f32 { self.speed.abs() * 3.6 }

    pub fn rpm(&self) -> f32 { self.gearbox.rpm }
    pub fn gear_index(&self) -> usize { self.gearbox.gear_index }
    pub fn gear_display(&self) -> String { gear_display(&self.spec, self.gearbox.gear_index) }
    pub fn is_shifting(&self) -> bool { self.gearbox.is_shifting }
    pub fn gearbox(&self) -> &GearboxState { &self.gearbox }

    pub fn steer_angle(&self) -> f32 { self.steer_angle }
    pub fn wheels(&self) -> &[WheelState; 4] { &self.wheels }
    pub fn wheel(&self, id: WheelId) -> &WheelState { &self.wheels[id.index()] }
    pub fn corners(&self) -> &[BodyCollisionPoint; 8] { &self.corners }
    pub fn grounded_wheels(&self) -> usize { self.grounded_wheels }
    pub fn last_integration(&self) -> IntegrationReport { self.last_report }

    pub fn telemetry(&self) -> VehicleTelemetry {
        let q = self.body.orientation.coords;
        VehicleTelemetry {
            name: self.spec.name.clone(),
            position: v3(&self.body.position),
            velocity: v3(&self.body.velocity),
            rotation: [q.x, q.y, q.z, q.w],
            angular_velocity: v3(&self.body.angular_velocity),
            euler: EulerDegrees::from_body(&self.body),
            speed: self.speed,
            speed_kmh: self.speed_kmh(),
            rpm: self.gearbox.rpm,
            gear_index: self.gearbox.gear_index,
            gear: self.gear_display(),
            is_shifting: self.gearbox.is_shifting,
            steer_angle: self.steer_angle,
            grounded_wheels: self.grounded_wheels,
            wheels: self.wheels.iter().map(wheel_telemetry).collect(),
            corners: self.corners.iter().map(corner_telemetry).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::FlatTerrain;

    #[test]
    fn invalid_spec_is_sanitized_on_construction() {
        let mut spec = VehicleSpec::default();
        spec.mass = f32::NAN;
        let v = Vehicle::new(Arc::new(spec), Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(v.spec().mass, VehicleSpec::default().mass);
    }

    #[test]
    fn zero_and_bad_dt_do_nothing() {
        let terrain = FlatTerrain::default();
        let mut v = Vehicle::spawn_on(Arc::new(VehicleSpec::default()), &terrain, 0.0, 0.0);
        let before = *v.body();
        v.step(&VehicleInput::throttle(1.0), &terrain, 0.0);
        v.step(&VehicleInput::throttle(1.0), &terrain, f32::NAN);
        v.step(&VehicleInput::throttle(1.0), &terrain, -1.0);
        assert_eq!(*v.body(), before);
    }

    #[test]
    fn starts_in_first_gear() {
        let v = Vehicle::new(Arc::new(VehicleSpec::default()), Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(v.gear_display(), "1");
        assert_eq!(v.rpm(), v.spec().engine.idle_rpm);
    }

    #[test]
    fn telemetry_serializes_gear_string() {
        let terrain = FlatTerrain::default();
        let mut v = Vehicle::spawn_on(Arc::new(VehicleSpec::default()), &terrain, 0.0, 0.0);
        v.step(&VehicleInput::default(), &terrain, 1.0 / 60.0);
        let json = v.telemetry().to_json().expect("serializable");
        assert!(json.contains(r#""gear":"1""#));
        assert!(json.contains(r#""id":"RR""#));
    }
}
