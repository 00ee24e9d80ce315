// ==============================================================================
// longitudinal.rs — DRIVE / BRAKE / HANDBRAKE / ROLLING RESISTANCE
// ==============================================================================
// Per wheel, along the wheel heading:
// 1) Drive (driven wheels only): wheelTorque / R, clamped to
//    driveGripLimit · grip · N. The sign already carries reverse.
// 2) Brake: brake · brakeStrength · grip · N opposing v_fwd. In reverse gear
//    at a crawl the brake pedal creeps the car backward instead.
// 3) Handbrake (rear): handbrake · handbrakeStrength · grip · N opposing v_fwd.
// 4) Rolling resistance: Crr · N, linear inside ±0.5 m/s.
//
// Brake + handbrake together never exceed the force that stops the corner in
// one tick, so braking can't push the car backward.
// ------------------------------------------------------------------------------
// Cardinal rule: braking opposes motion, not wheel heading.
// ==============================================================================

use crate::spec::{TireSpec, VehicleSpec};
use crate::tire::{ContactPatch, SolveContext};

/// Below this forward speed (m/s) the reverse-gear brake creep engages.
const CREEP_ENGAGE_SPEED: f32 = 0.5;
/// Creep fades to nothing at this backward speed (m/s); faster than that the
/// pedal brakes normally again.
const CREEP_TOP_SPEED: f32 = 3.0;
/// Rolling resistance reaches full strength at this speed (m/s).
const ROLLING_DEADBAND: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LongitudinalResult {
    pub force: f32,         // N along wheel forward
    pub drive: f32,         // N, drive share before brakes and rolling
}

fn drive_force(spec: &VehicleSpec, ctx: &SolveContext, patch: &ContactPatch) -> f32 {
    if !patch.wheel.is_driven() || ctx.wheel_torque == 0.0 {
        return 0.0;
    }
    let limit = spec.tires.drive_grip_limit * patch.grip * patch.normal_load;
    (ctx.wheel_torque / spec.wheel_radius).clamp(-limit, limit)
}

fn reverse_creep(tires: &TireSpec, ctx: &SolveContext, patch: &ContactPatch) -> Option<f32> {
    if !ctx.in_reverse || ctx.brake <= 0.0 {
        return None;
    }
    if patch.v_fwd >= CREEP_ENGAGE_SPEED || patch.v_fwd <= -CREEP_TOP_SPEED {
        return None;
    }
    let fade = 1.0 - (-patch.v_fwd / CREEP_TOP_SPEED).clamp(0.0, 1.0);
    Some(-ctx.brake * tires.reverse_creep * patch.grip * patch.normal_load * fade)
}

fn brake_force(tires: &TireSpec, ctx: &SolveContext, patch: &ContactPatch) -> f32 {
    let available = patch.grip * patch.normal_load;

    let mut demand = ctx.brake * tires.brake_strength * available;
    if patch.wheel.is_rear() {
        demand += ctx.handbrake * tires.handbrake_strength * available;
    }
    if demand <= 0.0 {
        return 0.0;
    }

    let capped = demand.min(ctx.stopping_force(patch.v_fwd));
    -patch.v_fwd.signum() * capped
}

fn rolling_resistance(tires: &TireSpec, patch: &ContactPatch) -> f32 {
    let ramp = (patch.v_fwd / ROLLING_DEADBAND).clamp(-1.0, 1.0);
    -tires.rolling_resistance * patch.normal_load * ramp
}

pub fn solve_longitudinal(spec: &VehicleSpec, ctx: &SolveContext, patch: &ContactPatch) -> LongitudinalResult {
    let tires = &spec.tires;
    let drive = drive_force(spec, ctx, patch);

    let stopping = match reverse_creep(tires, ctx, patch) {
        Some(creep) => {
            // brake pedal acts as reverse throttle; handbrake still holds the rear
            let mut held = *ctx;
            held.brake = 0.0;
            creep + brake_force(tires, &held, patch)
        }
        None => brake_force(tires, ctx, patch),
    };

    LongitudinalResult {
        force: drive + stopping + rolling_resistance(tires, patch),
        drive,
    }
}
