// ==============================================================================
// lateral.rs — SLIP-ANGLE CORNERING FORCE
// ------------------------------------------------------------------------------
//   α      = atan2(v_lat, |v_fwd| + ε)
//   F_lat  = −N · grip · clamp(α / α_peak, −1, 1) · lateralScale
//   rear:   × (1 − handbrake · handbrakeGripLoss)
//
// Coulomb-style cap: never more than what cancels this corner's lateral
// momentum in a single tick (m/4 · |v_lat| / dt). Keeps a parked car from
// chattering sideways.
// ==============================================================================

use crate::spec::TireSpec;
use crate::tire::kinematics::slip_angle;
use crate::tire::{ContactPatch, SolveContext};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LateralResult {
    pub force: f32,         // N along wheel right
    pub slip_angle: f32,    // rad
}

pub fn solve_lateral(tires: &TireSpec, ctx: &SolveContext, patch: &ContactPatch) -> LateralResult {
    let alpha = slip_angle(patch.v_fwd, patch.v_lat, tires.slip_epsilon);
    let demand = (alpha / tires.slip_angle_peak).clamp(-1.0, 1.0);

    let mut force = -patch.normal_load * patch.grip * demand * tires.lateral_scale;
    if patch.wheel.is_rear() {
        force *= 1.0 - ctx.handbrake * tires.handbrake_grip_loss;
    }

    let cap = ctx.stopping_force(patch.v_lat);
    LateralResult { force: force.clamp(-cap, cap), slip_angle: alpha }
}
