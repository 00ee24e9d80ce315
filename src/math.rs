// ==============================================================================
// math.rs — SHARED VECTOR HELPERS + CHASSIS AXIS CONVENTIONS
// ------------------------------------------------------------------------------
// Chassis basis (right-handed, Y up):
//   forward = -Z, right = +X, up = +Y
//
// Every module that needs a body axis goes through `forward_axis` /
// `right_axis` / `up_axis` so the convention lives in exactly one place.
// ==============================================================================

use nalgebra::{UnitQuaternion, Vector3};

pub type Vec3 = Vector3<f32>;
pub type Quat = UnitQuaternion<f32>;

pub const LOCAL_FORWARD: Vec3 = Vec3::new(0.0, 0.0, -1.0);
pub const LOCAL_RIGHT: Vec3 = Vec3::new(1.0, 0.0, 0.0);
pub const LOCAL_UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
pub const WORLD_UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

#[inline] pub fn forward_axis(rot: &Quat) -> Vec3 { rot * LOCAL_FORWARD }
#[inline] pub fn right_axis(rot: &Quat) -> Vec3 { rot * LOCAL_RIGHT }
#[inline] pub fn up_axis(rot: &Quat) -> Vec3 { rot * LOCAL_UP }

/// Normalize, or return `fallback` when the vector is (nearly) zero length.
#[inline]
pub fn safe_normalize(v: Vec3, fallback: Vec3) -> Vec3 {
    let n = v.norm();
    if n > 1e-6 && n.is_finite() { v / n } else { fallback }
}

/// Drop the vertical component.
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// World-space velocity of a point rigidly attached to the body:
/// v(p) = v_com + ω × r
#[inline]
pub fn point_velocity(linvel: Vec3, angvel_world: Vec3, r: Vec3) -> Vec3 {
    linvel + angvel_world.cross(&r)
}

/// Frame-rate independent exponential approach: `current` moves toward
/// `target` with time constant `1 / rate`.
#[inline]
pub fn exp_lerp(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    current + (target - current) * (1.0 - (-rate * dt).exp())
}

#[inline]
pub fn is_finite_vec(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Clamp the magnitude of `v` to `max`.
#[inline]
pub fn clamp_norm(v: Vec3, max: f32) -> Vec3 {
    let n = v.norm();
    if n > max && n > 0.0 { v * (max / n) } else { v }
}

pub const RAD_PER_SEC_TO_RPM: f32 = 60.0 / std::f32::consts::TAU;
