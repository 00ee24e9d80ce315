// ==============================================================================
// solve.rs — PER-WHEEL TIRE SOLVE (FORCE DOMAIN)
// ------------------------------------------------------------------------------
// build_patch(): suspension contact + wheel basis + contact velocity
// solve_tire():  lateral + longitudinal → one world force
//
// Application point: the contact patch raised toward the centre of mass so
// only `rollFactor` of the full vertical lever remains. Tire forces still yaw
// the car but roll it far less than a ground-level push would.
// ==============================================================================

use crate::math::{point_velocity, Vec3, RAD_PER_SEC_TO_RPM};
use crate::spec::VehicleSpec;
use crate::state::{RigidBodyState, WheelState};
use crate::suspension::SuspensionContact;
use crate::tire::kinematics::{slip_components, wheel_basis};
use crate::tire::lateral::solve_lateral;
use crate::tire::longitudinal::solve_longitudinal;
use crate::tire::{ContactPatch, SolveContext};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TireForces {
    pub force: Vec3,        // world
    pub torque: Vec3,       // body frame
    pub longitudinal: f32,  // N
    pub lateral: f32,       // N
}

pub fn build_patch(
    spec: &VehicleSpec,
    body: &RigidBodyState,
    wheel: &WheelState,
    contact: &SuspensionContact,
    steer_angle: f32,
) -> ContactPatch {
    let (forward, right) = wheel_basis(body, steer_angle, wheel.id.is_steered());
    let lever = contact.contact_point - body.position;
    let v = point_velocity(body.velocity, body.angular_velocity_world(), lever);
    let (v_fwd, v_lat) = slip_components(v, forward, right);

    ContactPatch {
        wheel: wheel.id,
        contact_point: contact.contact_point,
        forward,
        right,
        v_fwd,
        v_lat,
        normal_load: contact.normal_load,
        grip: spec.tires.grip_coefficient * contact.surface.friction * contact.grip_factor,
    }
}

/// Solve one grounded wheel and record its diagnostics on `wheel`.
pub fn solve_tire(
    spec: &VehicleSpec,
    ctx: &SolveContext,
    body: &RigidBodyState,
    patch: &ContactPatch,
    wheel: &mut WheelState,
) -> TireForces {
    let lat = solve_lateral(&spec.tires, ctx, patch);
    let long = solve_longitudinal(spec, ctx, patch);

    let force = patch.forward * long.force + patch.right * lat.force;

    let up = body.up();
    let lever = patch.contact_point - body.position;
    let drop = lever.dot(&up);
    let apply = lever - up * (drop * (1.0 - spec.tires.roll_factor));
    let torque = body.orientation.inverse() * apply.cross(&force);

    let rolling_speed = wheel.wheel_rpm / RAD_PER_SEC_TO_RPM * spec.wheel_radius;
    wheel.slip_angle = lat.slip_angle;
    wheel.slip_ratio = (rolling_speed - patch.v_fwd) / patch.v_fwd.abs().max(1.0);
    wheel.tire_force = force;
    wheel.forward_speed = patch.v_fwd;
    wheel.drive_force = long.drive;

    TireForces { force, torque, longitudinal: long.force, lateral: lat.force }
}
