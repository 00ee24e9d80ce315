// ==============================================================================
// drivetrain — ENGINE → GEARBOX → REAR WHEELS
// ------------------------------------------------------------------------------
// Two entry points per tick:
//   wheel_torque()       before the tire pass: torque each driven wheel gets
//   update_drivetrain()  after integration: shift timer, engine rpm, wheel rpm
//
// Wheel spin model (per wheel):
//   driven, grounded:  α = (T_wheel − F_drive·R) / I, then synced toward the
//                      ground-speed rpm
//   driven, airborne:  α = T_wheel / I with free-spin decay, capped at the
//                      rpm the engine could reach in this gear
//   undriven:          ground-speed rpm when grounded, decay otherwise
// ==============================================================================

pub mod engine;
pub mod gearbox;

use crate::math::{exp_lerp, RAD_PER_SEC_TO_RPM};
use crate::spec::VehicleSpec;
use crate::state::{GearboxState, WheelState};

pub use gearbox::gear_display;

/// Fraction of vehicle mass used for one wheel+tire assembly's inertia.
const WHEEL_MASS_FRACTION: f32 = 0.015;
/// rate (1/s) at which a grounded wheel's spin is pulled toward road speed
const GROUND_SYNC_RATE: f32 = 20.0;
/// rate (1/s) at which an unloaded wheel spins down
const FREE_SPIN_DECAY: f32 = 0.8;

/// Rotational inertia of one wheel: solid disc, I = ½ m R².
#[inline]
pub fn wheel_inertia(spec: &VehicleSpec) -> f32 {
    let m = spec.mass * WHEEL_MASS_FRACTION;
    0.5 * m * spec.wheel_radius * spec.wheel_radius
}

/// Combined ratio of the engaged gear and the final drive (signed).
#[inline]
pub fn overall_ratio(spec: &VehicleSpec, gearbox: &GearboxState) -> f32 {
    gearbox.ratio(spec) * spec.transmission.final_drive
}

/// Engine rpm implied by the driven wheels' spin, or `None` in neutral.
pub fn wheel_engine_rpm(spec: &VehicleSpec, gearbox: &GearboxState, wheels: &[WheelState; 4]) -> Option<f32> {
    let ratio = overall_ratio(spec, gearbox);
    if ratio == 0.0 {
        return None;
    }
    let (sum, count) = wheels
        .iter()
        .filter(|w| w.id.is_driven())
        .fold((0.0, 0), |(s, n), w| (s + w.wheel_rpm.abs(), n + 1));
    let avg = if count > 0 { sum / count as f32 } else { 0.0 };
    Some(avg * ratio.abs())
}

/// Torque (N·m) delivered to each driven wheel this tick. Zero while
/// shifting, in neutral or without throttle; negative in reverse.
pub fn wheel_torque(spec: &VehicleSpec, gearbox: &GearboxState, throttle: f32, wheels: &[WheelState; 4]) -> f32 {
    if gearbox.is_shifting || throttle <= 0.0 {
        return 0.0;
    }
    let ratio = overall_ratio(spec, gearbox);
    let Some(from_wheels) = wheel_engine_rpm(spec, gearbox, wheels) else {
        return 0.0;
    };
    let driven = wheels.iter().filter(|w| w.id.is_driven()).count().max(1) as f32;

    let crank = engine::engine_torque(&spec.engine, gearbox.rpm) * throttle;
    let limiter = engine::limiter_factor(&spec.engine, from_wheels);
    crank * ratio / driven * limiter
}

fn spin_driven(spec: &VehicleSpec, wheel: &mut WheelState, torque: f32, cap_rpm: Option<f32>, dt: f32) {
    let inertia = wheel_inertia(spec);
    let omega = wheel.wheel_rpm / RAD_PER_SEC_TO_RPM;

    let next = if wheel.grounded {
        let reaction = wheel.drive_force * spec.wheel_radius;
        let spun = omega + (torque - reaction) / inertia * dt;
        let road = wheel.forward_speed / spec.wheel_radius;
        exp_lerp(spun, road, GROUND_SYNC_RATE, dt)
    } else {
        let spun = omega + torque / inertia * dt;
        spun * (-FREE_SPIN_DECAY * dt).exp()
    };

    let mut rpm = next * RAD_PER_SEC_TO_RPM;
    if let Some(cap) = cap_rpm {
        rpm = rpm.clamp(-cap, cap);
    }
    wheel.wheel_rpm = if rpm.is_finite() { rpm } else { 0.0 };
}

fn spin_free(spec: &VehicleSpec, wheel: &mut WheelState, dt: f32) {
    wheel.wheel_rpm = if wheel.grounded {
        wheel.forward_speed / spec.wheel_radius * RAD_PER_SEC_TO_RPM
    } else {
        wheel.wheel_rpm * (-FREE_SPIN_DECAY * dt).exp()
    };
}

/// Advance shift timer, engine rpm and per-wheel spin by `dt`.
pub fn update_drivetrain(
    spec: &VehicleSpec,
    gearbox: &mut GearboxState,
    wheels: &mut [WheelState; 4],
    throttle: f32,
    speed: f32,
    dt: f32,
) {
    gearbox.tick_shift(dt);

    let from_wheels = wheel_engine_rpm(spec, gearbox, wheels);
    gearbox.rpm = engine::update_rpm(&spec.engine, gearbox.rpm, from_wheels, throttle, speed, dt);

    let ratio = overall_ratio(spec, gearbox).abs();
    let cap_rpm = (ratio > 0.0).then(|| spec.engine.redline_rpm / ratio);
    let torque = gearbox.wheel_torque;

    for wheel in wheels.iter_mut() {
        if wheel.id.is_driven() {
            spin_driven(spec, wheel, torque, cap_rpm, dt);
        } else {
            spin_free(spec, wheel, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WheelId;

    fn wheels(spec: &VehicleSpec) -> [WheelState; 4] {
        WheelId::ALL.map(|id| WheelState::new(id, spec.wheel_offset(id)))
    }

    #[test]
    fn no_torque_while_shifting() {
        let spec = VehicleSpec::default();
        let w = wheels(&spec);
        let mut g = GearboxState::new(spec.first_gear_index(), 3000.0);
        assert!(wheel_torque(&spec, &g, 1.0, &w) > 0.0);
        g.shift_up(&spec);
        assert_eq!(wheel_torque(&spec, &g, 1.0, &w), 0.0);
    }

    #[test]
    fn reverse_torque_is_negative_and_neutral_is_zero() {
        let spec = VehicleSpec::default();
        let w = wheels(&spec);
        let g = GearboxState::new(0, 3000.0);
        assert!(wheel_torque(&spec, &g, 1.0, &w) < 0.0);
        let g = GearboxState::new(spec.neutral_index(), 3000.0);
        assert_eq!(wheel_torque(&spec, &g, 1.0, &w), 0.0);
    }

    #[test]
    fn first_gear_torque_matches_curve() {
        let spec = VehicleSpec::default();
        let w = wheels(&spec);
        let g = GearboxState::new(spec.first_gear_index(), 4000.0);
        let expect = engine::engine_torque(&spec.engine, 4000.0)
            * spec.transmission.gear_ratios[2]
            * spec.transmission.final_drive
            / 2.0;
        assert!((wheel_torque(&spec, &g, 1.0, &w) - expect).abs() < 1e-2);
    }

    #[test]
    fn airborne_driven_wheel_is_capped_by_redline() {
        let spec = VehicleSpec::default();
        let mut w = wheels(&spec);
        let mut g = GearboxState::new(spec.first_gear_index(), 3000.0);
        for _ in 0..600 {
            g.wheel_torque = wheel_torque(&spec, &g, 1.0, &w);
            update_drivetrain(&spec, &mut g, &mut w, 1.0, 0.0, 1.0 / 60.0);
        }
        let cap = spec.engine.redline_rpm / overall_ratio(&spec, &g);
        for wheel in w.iter().filter(|w| w.id.is_driven()) {
            assert!(wheel.wheel_rpm > 0.0 && wheel.wheel_rpm <= cap + 1e-3);
        }
        assert!(g.rpm >= spec.engine.idle_rpm && g.rpm <= spec.engine.redline_rpm);
    }

    #[test]
    fn grounded_free_wheel_tracks_road_speed() {
        let spec = VehicleSpec::default();
        let mut w = wheels(&spec);
        w[0].grounded = true;
        w[0].forward_speed = 10.0;
        let mut g = GearboxState::new(spec.first_gear_index(), 900.0);
        update_drivetrain(&spec, &mut g, &mut w, 0.0, 10.0, 1.0 / 60.0);
        let expect = 10.0 / spec.wheel_radius * RAD_PER_SEC_TO_RPM;
        assert!((w[0].wheel_rpm - expect).abs() < 1e-2);
    }
}
