// ==============================================================================
// controls.rs — DRIVER INPUT + STEERING ANGLE
// ------------------------------------------------------------------------------
// VehicleInput arrives from the host once per tick. Analog axes are clamped and
// NaN is treated as "released"; shift flags are edge-triggered (one request per
// tick in which they are set).
//
// Steering: speed-sensitive with rate limiting
//   scale  = 1 - highSpeedReduction · clamp(|v| / reductionSpeed, 0, 1)
//   target = steering · maxAngle · scale
//   angle += clamp(target - angle, ±speed·dt)
// Positive steering turns right.
// ==============================================================================

use serde::{Deserialize, Serialize};

use crate::spec::SteeringSpec;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleInput {
    pub throttle: f32,      // 0..1
    pub brake: f32,         // 0..1
    pub handbrake: f32,     // 0..1
    pub steering: f32,      // -1 (left) .. 1 (right)
    pub shift_up: bool,
    pub shift_down: bool,
}

#[inline]
fn axis(v: f32, lo: f32, hi: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(lo, hi) }
}

impl VehicleInput {
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            throttle: axis(self.throttle, 0.0, 1.0),
            brake: axis(self.brake, 0.0, 1.0),
            handbrake: axis(self.handbrake, 0.0, 1.0),
            steering: axis(self.steering, -1.0, 1.0),
            shift_up: self.shift_up,
            shift_down: self.shift_down,
        }
    }

    pub fn throttle(throttle: f32) -> Self {
        Self { throttle, ..Self::default() }
    }

    pub fn brake(brake: f32) -> Self {
        Self { brake, ..Self::default() }
    }
}

/// Advance the front-wheel steering angle by one tick.
pub fn update_steering(current: f32, steering: f32, speed: f32, spec: &SteeringSpec, dt: f32) -> f32 {
    let fade = (speed.abs() / spec.reduction_speed).clamp(0.0, 1.0);
    let scale = 1.0 - spec.high_speed_reduction * fade;
    let target = steering * spec.max_angle * scale;

    let max_step = spec.speed * dt;
    let next = current + (target - current).clamp(-max_step, max_step);
    next.clamp(-spec.max_angle, spec.max_angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_and_zeroes_nan() {
        let raw = VehicleInput {
            throttle: 3.0,
            brake: f32::NAN,
            handbrake: -1.0,
            steering: -7.5,
            shift_up: true,
            shift_down: false,
        };
        let s = raw.sanitized();
        assert_eq!(s.throttle, 1.0);
        assert_eq!(s.brake, 0.0);
        assert_eq!(s.handbrake, 0.0);
        assert_eq!(s.steering, -1.0);
        assert!(s.shift_up);
    }

    #[test]
    fn steering_is_rate_limited() {
        let spec = SteeringSpec::default();
        let dt = 1.0 / 60.0;
        let a = update_steering(0.0, 1.0, 0.0, &spec, dt);
        assert!((a - spec.speed * dt).abs() < 1e-6);

        let mut angle = 0.0;
        for _ in 0..120 {
            angle = update_steering(angle, 1.0, 0.0, &spec, dt);
        }
        assert!((angle - spec.max_angle).abs() < 1e-5);
    }

    #[test]
    fn steering_lock_shrinks_with_speed() {
        let spec = SteeringSpec::default();
        let mut slow = 0.0;
        let mut fast = 0.0;
        for _ in 0..240 {
            slow = update_steering(slow, -1.0, 2.0, &spec, 1.0 / 60.0);
            fast = update_steering(fast, -1.0, 40.0, &spec, 1.0 / 60.0);
        }
        assert!(slow < 0.0 && fast < 0.0);
        assert!(fast.abs() < slow.abs());
        let floor = spec.max_angle * (1.0 - spec.high_speed_reduction);
        assert!((fast.abs() - floor).abs() < 1e-5);
    }
}
