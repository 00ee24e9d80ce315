// ==============================================================================
// kinematics.rs — WHEEL BASIS + SLIP DECOMPOSITION (WORLD SPACE)
// ------------------------------------------------------------------------------
// wheel_basis(...):
// - Projects chassis forward/right onto the horizontal plane
// - Rotates steered wheels about world up:
//     f' = f·cos a + r·sin a
//     r' = r·cos a − f·sin a
//
// slip_components(v, forward, right) -> (v_fwd, v_lat)
// slip_angle(v_fwd, v_lat, ε)         = atan2(v_lat, |v_fwd| + ε)
// ==============================================================================

use crate::math::{horizontal, safe_normalize, Vec3, LOCAL_FORWARD, LOCAL_RIGHT, WORLD_UP};
use crate::state::RigidBodyState;

/// (forward, right) of a wheel on the horizontal plane.
pub fn wheel_basis(body: &RigidBodyState, steer_angle: f32, steered: bool) -> (Vec3, Vec3) {
    let mut forward = safe_normalize(horizontal(body.forward()), Vec3::zeros());
    if forward == Vec3::zeros() {
        // nose straight up/down: derive heading from the up axis instead
        forward = safe_normalize(horizontal(-body.up()), LOCAL_FORWARD);
    }
    let right = safe_normalize(forward.cross(&WORLD_UP), LOCAL_RIGHT);

    if !steered || steer_angle == 0.0 {
        return (forward, right);
    }
    let (sin, cos) = steer_angle.sin_cos();
    (forward * cos + right * sin, right * cos - forward * sin)
}

#[inline]
pub fn slip_components(point_vel: Vec3, forward: Vec3, right: Vec3) -> (f32, f32) {
    let v = horizontal(point_vel);
    (v.dot(&forward), v.dot(&right))
}

#[inline]
pub fn slip_angle(v_fwd: f32, v_lat: f32, epsilon: f32) -> f32 {
    v_lat.atan2(v_fwd.abs() + epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;

    #[test]
    fn basis_is_horizontal_when_pitched() {
        let mut body = RigidBodyState::at_rest(Vec3::zeros());
        body.orientation = Quat::from_axis_angle(&Vec3::x_axis(), 0.4);
        let (f, r) = wheel_basis(&body, 0.0, false);
        assert!(f.y.abs() < 1e-6 && r.y.abs() < 1e-6);
        assert!((f.norm() - 1.0).abs() < 1e-6);
        assert!(f.dot(&r).abs() < 1e-6);
    }

    #[test]
    fn positive_steer_turns_toward_right() {
        let body = RigidBodyState::at_rest(Vec3::zeros());
        let (f0, r0) = wheel_basis(&body, 0.0, true);
        let (f, _) = wheel_basis(&body, 0.3, true);
        assert!(f.dot(&r0) > 0.0);
        assert!((f.dot(&f0) - 0.3f32.cos()).abs() < 1e-6);
    }

    #[test]
    fn vertical_nose_falls_back_to_up_axis() {
        let mut body = RigidBodyState::at_rest(Vec3::zeros());
        body.orientation = Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::FRAC_PI_2);
        let (f, r) = wheel_basis(&body, 0.0, false);
        assert!((f.norm() - 1.0).abs() < 1e-5);
        assert!((r.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn slip_angle_is_bounded_at_standstill() {
        assert_eq!(slip_angle(0.0, 0.0, 0.5), 0.0);
        let a = slip_angle(0.0, 1.0, 0.5);
        assert!(a > 0.0 && a < std::f32::consts::FRAC_PI_2);
    }
}
