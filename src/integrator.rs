// ==============================================================================
// integrator.rs — FORCE ACCUMULATION + SEMI-IMPLICIT EULER
// ------------------------------------------------------------------------------
// Linear (world):   v += (ΣF/m + g)·dt, horizontal decay, x += v·dt
// Angular (body):   ω += τ/I·dt per axis (diagonal box inertia,
//                   roll & pitch boosted), damping, q ← q·exp(ω·dt)
//
// Unstable = up.y < 0.5, or fewer than two wheels down while tilted
// (up.y < 0.9). Only then is angular damping raised and |ω| clamped.
//
// Safety nets:
// - fallen more than tunnelDepth below the terrain → snap above it
// - any non-finite state → restore the last finite pose, at rest
// ==============================================================================

use crate::math::{clamp_norm, Quat, Vec3};
use crate::spec::VehicleSpec;
use crate::state::RigidBodyState;
use crate::terrain::TerrainQuery;

const UNSTABLE_UP_Y: f32 = 0.5;
const TILTED_UP_Y: f32 = 0.9;

/// Per-tick sum of everything acting on the chassis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForceAccumulator {
    pub force: Vec3,    // world, without gravity
    pub torque: Vec3,   // body frame
}

impl ForceAccumulator {
    #[inline]
    pub fn add(&mut self, force: Vec3, torque_body: Vec3) {
        self.force += force;
        self.torque += torque_body;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrationReport {
    pub unstable: bool,
    pub tunnel_snap: bool,
    pub reset_non_finite: bool,
}

/// Diagonal inertia in the body frame (x = pitch, y = yaw, z = roll).
pub fn body_inertia(spec: &VehicleSpec) -> Vec3 {
    let m = spec.mass / 12.0;
    let (w, h, l) = (spec.body.width, spec.body.height, spec.body.length);
    let boost = spec.stability.inertia_boost;
    Vec3::new(
        m * (h * h + l * l) * boost,
        m * (w * w + l * l),
        m * (w * w + h * h) * boost,
    )
}

#[inline]
pub fn is_unstable(up_y: f32, grounded_wheels: usize) -> bool {
    up_y < UNSTABLE_UP_Y || (grounded_wheels < 2 && up_y < TILTED_UP_Y)
}

pub fn integrate(
    spec: &VehicleSpec,
    body: &mut RigidBodyState,
    acc: &ForceAccumulator,
    grounded_wheels: usize,
    terrain: &dyn TerrainQuery,
    dt: f32,
) -> IntegrationReport {
    let mut report = IntegrationReport::default();
    let last_good = *body;
    let stab = &spec.stability;

    // --- linear ---
    let gravity = Vec3::new(0.0, -spec.gravity, 0.0);
    body.velocity += (acc.force / spec.mass + gravity) * dt;
    let decay = (-stab.horizontal_decay * dt).exp();
    body.velocity.x *= decay;
    body.velocity.z *= decay;
    body.position += body.velocity * dt;

    // --- angular ---
    let inertia = body_inertia(spec);
    body.angular_velocity += acc.torque.component_div(&inertia) * dt;

    report.unstable = is_unstable(body.up().y, grounded_wheels);
    let damping = if report.unstable { stab.unstable_angular_damping } else { stab.angular_damping };
    body.angular_velocity *= (-damping * dt).exp();
    if report.unstable {
        body.angular_velocity = clamp_norm(body.angular_velocity, stab.unstable_max_angular_speed);
    }

    let spin = Quat::from_scaled_axis(body.angular_velocity * dt);
    body.orientation = Quat::new_normalize((body.orientation * spin).into_inner());

    // --- safety ---
    let ground = terrain.height_at(body.position.x, body.position.z);
    if body.position.y < ground - stab.tunnel_depth {
        log::warn!(
            "chassis fell through terrain at ({:.1}, {:.1}, {:.1}); snapping above ground",
            body.position.x, body.position.y, body.position.z
        );
        body.position.y = ground + spec.body.cg_height;
        body.velocity.y = 0.0;
        report.tunnel_snap = true;
    }

    if !body.is_finite() {
        log::warn!("non-finite vehicle state; restoring last finite pose");
        *body = if last_good.is_finite() {
            RigidBodyState { velocity: Vec3::zeros(), angular_velocity: Vec3::zeros(), ..last_good }
        } else {
            RigidBodyState::at_rest(Vec3::new(0.0, spec.body.cg_height, 0.0))
        };
        report.reset_non_finite = true;
    }

    report
}
