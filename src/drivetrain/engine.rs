// ==============================================================================
// engine.rs — TORQUE CURVE, RPM RESPONSE, REV LIMITER
// ------------------------------------------------------------------------------
// Normalized rpm x = (rpm − idle) / (redline − idle), 0..1
//   t(x) = 1 − k·(x − peak)²,  k chosen so t(0) = idleFraction
//   torque = maxTorque · clamp(t, 0.1, 1)
//
// Target rpm (in gear):
//   base   = max(wheelRpm · |ratio| · finalDrive, idle)
//   launch = throttle · (1 − |speed| / launchSpeed)      pulls toward redline
// Target rpm (neutral): idle + throttle · (redline − idle)
// rpm follows the target exponentially and is clamped to [idle, redline].
// ==============================================================================

use crate::math::exp_lerp;
use crate::spec::EngineSpec;

const MIN_CURVE: f32 = 0.1;

#[inline]
fn normalized(engine: &EngineSpec, rpm: f32) -> f32 {
    ((rpm - engine.idle_rpm) / (engine.redline_rpm - engine.idle_rpm)).clamp(0.0, 1.0)
}

/// Fraction of `max_torque` available at `rpm`.
pub fn torque_fraction(engine: &EngineSpec, rpm: f32) -> f32 {
    let curve = &engine.torque_curve;
    let peak = curve.peak_fraction;
    let k = if peak > 1e-3 {
        (1.0 - curve.idle_fraction) / (peak * peak)
    } else {
        1.0 - curve.idle_fraction
    };
    let x = normalized(engine, rpm);
    (1.0 - k * (x - peak) * (x - peak)).clamp(MIN_CURVE, 1.0)
}

/// Crankshaft torque (N·m) at full throttle.
#[inline]
pub fn engine_torque(engine: &EngineSpec, rpm: f32) -> f32 {
    engine.max_torque * torque_fraction(engine, rpm)
}

/// 1 below the limiter band, fading to 0 at redline.
#[inline]
pub fn limiter_factor(engine: &EngineSpec, rpm: f32) -> f32 {
    ((engine.redline_rpm - rpm) / (engine.limiter_band * engine.redline_rpm)).clamp(0.0, 1.0)
}

pub fn target_rpm(engine: &EngineSpec, wheel_engine_rpm: Option<f32>, throttle: f32, speed: f32) -> f32 {
    let span = engine.redline_rpm - engine.idle_rpm;
    match wheel_engine_rpm {
        None => engine.idle_rpm + throttle * span,
        Some(from_wheels) => {
            let base = from_wheels.max(engine.idle_rpm);
            let launch = if engine.launch_speed > 0.0 {
                throttle * (1.0 - (speed.abs() / engine.launch_speed).clamp(0.0, 1.0))
            } else {
                0.0
            };
            base + (engine.redline_rpm - base).max(0.0) * launch
        }
    }
}

/// Advance engine rpm one tick. `wheel_engine_rpm` is `None` in neutral.
pub fn update_rpm(
    engine: &EngineSpec,
    rpm: f32,
    wheel_engine_rpm: Option<f32>,
    throttle: f32,
    speed: f32,
    dt: f32,
) -> f32 {
    let target = target_rpm(engine, wheel_engine_rpm, throttle, speed);
    let next = exp_lerp(rpm, target, engine.rpm_response, dt);
    if next.is_finite() {
        next.clamp(engine.idle_rpm, engine.redline_rpm)
    } else {
        engine.idle_rpm
    }
}
