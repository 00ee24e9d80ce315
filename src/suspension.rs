// ==============================================================================
// suspension.rs — LOCAL-UP RAYCAST SUSPENSION
// ------------------------------------------------------------------------------
// One evaluation per wheel per tick. The cast always follows the chassis' local
// up axis (never world Y), so a rolled car loads its struts along the body.
//
//   origin   = wheel + up · restLength
//   length   = restLength + travel + wheelRadius
//   compression = length - hitDistance        ratio = compression / travel
//
//   spring   = compression · k
//   damper   = suspVel · c              (× reboundRatio while extending)
//   bumpStop = kb · (compression - travel) + cb · max(suspVel, 0)
//   F        = clamp(spring + damper + bumpStop, 0, maxForce) · up
//
// Torque is taken at the shock mount and handed back in the body frame.
// When the body is close to inverted the torque (and tire grip) fade out.
//
// This file does NOT integrate anything. It only measures the contact and
// returns the force pair for the integrator to accumulate.
// ==============================================================================

use crate::math::{point_velocity, safe_normalize, Vec3, WORLD_UP};
use crate::spec::VehicleSpec;
use crate::state::{RigidBodyState, WheelState};
use crate::terrain::{Surface, TerrainQuery};

/// Cast/plane intersections below this (ray · normal) are treated as misses.
const MIN_RAY_NORMAL_DOT: f32 = 0.1;
/// Slope correction of the ground velocity is skipped below this normal.y.
const MIN_SLOPE_NORMAL_Y: f32 = 0.2;
const PLANE_REFINEMENTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuspensionContact {
    pub force: Vec3,            // world, along local up
    pub torque: Vec3,           // body frame
    pub normal_load: f32,       // N pressing the tire into the ground
    pub contact_point: Vec3,    // world
    pub ground_normal: Vec3,
    pub surface: Surface,
    pub grip_factor: f32,       // 0..1, fades with tilt
}

/// 1 when upright enough, 0 when lying on the side or worse.
#[inline]
pub fn tilt_factor(up_y: f32) -> f32 {
    ((up_y - 0.3) / 0.4).clamp(0.0, 1.0)
}

/// Spring + damper + bump stop along the strut, clamped push-only.
pub fn strut_force(spec: &VehicleSpec, compression: f32, susp_vel: f32) -> f32 {
    let s = &spec.suspension;

    let spring = compression * s.spring_strength;
    let mut damper = susp_vel * s.damper_strength;
    if susp_vel < 0.0 {
        damper *= s.rebound_ratio;
    }

    let over = compression - s.travel;
    let bump = if over > 0.0 {
        over * s.bump_stop_stiffness + susp_vel.max(0.0) * s.bump_stop_damping
    } else {
        0.0
    };

    let total = spring + damper + bump;
    if total > s.max_force {
        log::trace!("strut force {total:.0} N clamped to {:.0} N", s.max_force);
    }
    total.clamp(0.0, s.max_force)
}

/// Distance along `-up` from `origin` to the terrain, by intersecting the ray
/// with the local tangent plane and re-sampling under the hit.
fn cast_down(terrain: &dyn TerrainQuery, origin: Vec3, up: Vec3) -> Option<(f32, Vec3)> {
    let mut sample_x = origin.x;
    let mut sample_z = origin.z;
    let mut hit = None;

    for _ in 0..=PLANE_REFINEMENTS {
        let ground = Vec3::new(sample_x, terrain.height_at(sample_x, sample_z), sample_z);
        let n = safe_normalize(terrain.normal_at(sample_x, sample_z), WORLD_UP);
        let facing = up.dot(&n);
        if facing <= MIN_RAY_NORMAL_DOT {
            return None;
        }
        let t = (origin - ground).dot(&n) / facing;
        let p = origin - up * t;
        sample_x = p.x;
        sample_z = p.z;
        hit = Some((t, n));
    }
    hit
}

/// Evaluate one wheel. On a miss the wheel is reset to ungrounded defaults and
/// `None` is returned.
pub fn evaluate_suspension(
    spec: &VehicleSpec,
    body: &RigidBodyState,
    wheel: &mut WheelState,
    terrain: &dyn TerrainQuery,
) -> Option<SuspensionContact> {
    let s = &spec.suspension;
    let up = body.up();
    if up.y <= 0.0 {
        wheel.reset_contact();
        return None;
    }

    let r = body.to_world_offset(&wheel.offset);
    let wheel_pos = body.position + r;
    let origin = wheel_pos + up * s.rest_length;
    let ray_length = s.rest_length + s.travel + spec.wheel_radius;

    let Some((distance, normal)) = cast_down(terrain, origin, up) else {
        wheel.reset_contact();
        return None;
    };
    if distance > ray_length {
        wheel.reset_contact();
        return None;
    }

    let max_compression = s.travel * 1.5;
    let compression = (ray_length - distance).clamp(0.0, max_compression);
    let contact_point = origin - up * distance;

    // positive = compressing
    let chassis_vel = point_velocity(body.velocity, body.angular_velocity_world(), r);
    let ground_dhdt = if normal.y >= MIN_SLOPE_NORMAL_Y {
        -(normal.x * chassis_vel.x + normal.z * chassis_vel.z) / normal.y
    } else {
        0.0
    };
    let ground_vel = Vec3::new(chassis_vel.x, ground_dhdt, chassis_vel.z);
    let susp_vel = (ground_vel - chassis_vel).dot(&up);

    let magnitude = strut_force(spec, compression, susp_vel);
    let force = up * magnitude;

    let tilt = tilt_factor(up.y);
    // the mount lies on the strut axis, so its height only matters once the
    // force leaves that axis
    let mount = r + up * (s.rest_length * s.shock_mount_fraction);
    let torque_world = mount.cross(&force) * tilt;
    let torque = body.orientation.inverse() * torque_world;

    let normal_load = magnitude * up.dot(&normal).max(0.0);
    let surface = terrain.surface_at(contact_point.x, contact_point.z);

    wheel.grounded = true;
    wheel.compression_ratio = compression / s.travel;
    wheel.suspension_velocity = susp_vel;
    wheel.normal_load = normal_load;
    wheel.suspension_force = force;
    wheel.contact_point = contact_point;
    wheel.ground_normal = normal;

    Some(SuspensionContact {
        force,
        torque,
        normal_load,
        contact_point,
        ground_normal: normal,
        surface,
        grip_factor: tilt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;
    use crate::state::WheelId;
    use crate::terrain::{FlatTerrain, SlopeTerrain};

    fn wheel(spec: &VehicleSpec, id: WheelId) -> WheelState {
        WheelState::new(id, spec.wheel_offset(id))
    }

    #[test]
    fn resting_height_sits_at_half_travel() {
        let spec = VehicleSpec::default();
        let body = RigidBodyState::at_rest(Vec3::new(0.0, spec.body.cg_height, 0.0));
        let mut w = wheel(&spec, WheelId::FL);

        let c = evaluate_suspension(&spec, &body, &mut w, &FlatTerrain::default()).expect("grounded");
        assert!(w.grounded);
        assert!((w.compression_ratio - 0.5).abs() < 1e-4, "{}", w.compression_ratio);
        let expect = 0.5 * spec.suspension.travel * spec.suspension.spring_strength;
        assert!((c.force.y - expect).abs() < 1.0);
        assert!(c.contact_point.y.abs() < 1e-4);
    }

    #[test]
    fn cast_misses_when_lifted() {
        let spec = VehicleSpec::default();
        let body = RigidBodyState::at_rest(Vec3::new(0.0, 3.0, 0.0));
        let mut w = wheel(&spec, WheelId::RR);
        w.grounded = true;
        w.wheel_rpm = 100.0;

        assert!(evaluate_suspension(&spec, &body, &mut w, &FlatTerrain::default()).is_none());
        assert!(!w.grounded);
        assert_eq!(w.compression_ratio, 0.0);
        assert_eq!(w.wheel_rpm, 100.0);
    }

    #[test]
    fn compression_ratio_caps_at_one_and_a_half() {
        let spec = VehicleSpec::default();
        let body = RigidBodyState::at_rest(Vec3::new(0.0, 0.05, 0.0));
        let mut w = wheel(&spec, WheelId::FR);

        let c = evaluate_suspension(&spec, &body, &mut w, &FlatTerrain::default()).expect("grounded");
        assert!((w.compression_ratio - 1.5).abs() < 1e-5);
        assert!(c.force.y <= spec.suspension.max_force + 1e-3);
    }

    #[test]
    fn rebound_is_softer_than_bump() {
        let spec = VehicleSpec::default();
        let c = 0.1;
        let bump = strut_force(&spec, c, 0.5) - strut_force(&spec, c, 0.0);
        let rebound = strut_force(&spec, c, 0.0) - strut_force(&spec, c, -0.5);
        assert!(rebound < bump);
        assert!((rebound / bump - spec.suspension.rebound_ratio).abs() < 1e-4);
    }

    #[test]
    fn strut_never_pulls() {
        let spec = VehicleSpec::default();
        assert_eq!(strut_force(&spec, 0.01, -20.0), 0.0);
    }

    #[test]
    fn bump_stop_stiffens_past_full_travel() {
        let spec = VehicleSpec::default();
        let s = &spec.suspension;
        let past = 0.05;

        let below = strut_force(&spec, s.travel - past, 0.0) - strut_force(&spec, s.travel - 2.0 * past, 0.0);
        let above = strut_force(&spec, s.travel + past, 0.0) - strut_force(&spec, s.travel, 0.0);
        assert!((below - past * s.spring_strength).abs() < 1e-1, "{below}");
        assert!((above - past * (s.spring_strength + s.bump_stop_stiffness)).abs() < 1e-1, "{above}");
    }

    #[test]
    fn bump_stop_damping_only_while_compressing() {
        let spec = VehicleSpec::default();
        let s = &spec.suspension;
        let c = s.travel + 0.05;
        let at_rest = strut_force(&spec, c, 0.0);

        let extending = strut_force(&spec, c, -0.5) - at_rest;
        assert!((extending + 0.5 * s.damper_strength * s.rebound_ratio).abs() < 1e-1, "{extending}");

        let compressing = strut_force(&spec, c, 0.5) - at_rest;
        assert!((compressing - 0.5 * (s.damper_strength + s.bump_stop_damping)).abs() < 1e-1, "{compressing}");
    }

    #[test]
    fn strut_force_clamps_at_max_force() {
        let mut spec = VehicleSpec::default();
        spec.suspension.max_force = 20_000.0;
        let max = spec.suspension.max_force;

        assert_eq!(strut_force(&spec, spec.suspension.travel * 1.5, 5.0), max);

        let body = RigidBodyState::at_rest(Vec3::new(0.0, 0.05, 0.0));
        let mut w = wheel(&spec, WheelId::RL);
        let c = evaluate_suspension(&spec, &body, &mut w, &FlatTerrain::default()).expect("grounded");
        assert!((c.force.norm() - max).abs() < 1e-2, "{:?}", c.force);
        assert!((w.suspension_force.norm() - max).abs() < 1e-2);
    }

    #[test]
    fn near_vertical_ground_skips_slope_velocity() {
        let spec = VehicleSpec::default();
        // normal.y = 1/sqrt(37), steep enough to skip the slope term but
        // still facing the cast
        let wall = SlopeTerrain::new(0.0, 6.0, 0.0);
        assert!(wall.normal_at(0.0, 0.0).y < MIN_SLOPE_NORMAL_Y);

        let offset = spec.wheel_offset(WheelId::FL);
        let ground = wall.height_at(offset.x, offset.z);
        let mut body = RigidBodyState::at_rest(Vec3::new(0.0, ground + spec.body.cg_height, 0.0));
        body.velocity = Vec3::new(5.0, 0.0, 0.0);

        let mut w = wheel(&spec, WheelId::FL);
        let c = evaluate_suspension(&spec, &body, &mut w, &wall).expect("grounded");
        assert_eq!(w.suspension_velocity, 0.0);
        assert!((w.compression_ratio - 0.5).abs() < 1e-3, "{}", w.compression_ratio);
        assert!(c.force.iter().all(|v| v.is_finite()));
        assert!(c.torque.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn torque_does_not_depend_on_mount_height() {
        let mut low = VehicleSpec::default();
        low.suspension.shock_mount_fraction = 0.0;
        let mut high = low.clone();
        high.suspension.shock_mount_fraction = 1.0;

        let mut body = RigidBodyState::at_rest(Vec3::new(0.0, low.body.cg_height, 0.0));
        body.orientation = Quat::from_axis_angle(&Vec3::z_axis(), 0.15);

        let mut a = wheel(&low, WheelId::RL);
        let mut b = wheel(&high, WheelId::RL);
        let ta = evaluate_suspension(&low, &body, &mut a, &FlatTerrain::default()).expect("grounded").torque;
        let tb = evaluate_suspension(&high, &body, &mut b, &FlatTerrain::default()).expect("grounded").torque;
        assert!((ta - tb).norm() < 1e-2 * ta.norm().max(1.0), "{ta:?} vs {tb:?}");
    }

    #[test]
    fn force_follows_local_up_when_rolled() {
        let spec = VehicleSpec::default();
        let mut body = RigidBodyState::at_rest(Vec3::new(0.0, spec.body.cg_height, 0.0));
        body.orientation = Quat::from_axis_angle(&Vec3::z_axis(), 0.2);
        let mut w = wheel(&spec, WheelId::RL);

        if let Some(c) = evaluate_suspension(&spec, &body, &mut w, &FlatTerrain::default()) {
            let along = c.force.normalize().dot(&body.up());
            assert!((along - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn sliding_along_a_slope_does_not_compress() {
        let spec = VehicleSpec::default();
        let slope = SlopeTerrain::incline_z(0.15);
        let n = slope.normal_at(0.0, 0.0);

        let mut body = RigidBodyState::at_rest(Vec3::zeros());
        body.orientation = Quat::rotation_between(&WORLD_UP, &n).unwrap_or_else(Quat::identity);
        body.position = body.up() * spec.body.cg_height;
        // velocity tangent to the slope
        body.velocity = body.forward() * 12.0;

        let mut w = wheel(&spec, WheelId::FL);
        evaluate_suspension(&spec, &body, &mut w, &slope).expect("grounded");
        assert!(w.suspension_velocity.abs() < 1e-3, "{}", w.suspension_velocity);
    }

    #[test]
    fn tilt_factor_fades_near_side() {
        assert_eq!(tilt_factor(1.0), 1.0);
        assert_eq!(tilt_factor(0.2), 0.0);
        assert!(tilt_factor(0.5) > 0.0 && tilt_factor(0.5) < 1.0);
    }
}
