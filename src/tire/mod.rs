// Arcade tire model: lateral slip-angle force, longitudinal drive / brake /
// handbrake / rolling resistance, combined into one world-space force per wheel.

pub mod kinematics;
pub mod lateral;
pub mod longitudinal;
pub mod solve;

use crate::math::Vec3;
use crate::state::WheelId;

pub use solve::{solve_tire, TireForces};

/// Everything the tire needs to know about one grounded wheel this tick.
#[derive(Debug, Clone, Copy)]
pub struct ContactPatch {
    pub wheel: WheelId,
    pub contact_point: Vec3,    // world
    pub forward: Vec3,          // wheel heading, horizontal
    pub right: Vec3,            // horizontal
    pub v_fwd: f32,             // m/s along forward
    pub v_lat: f32,             // m/s along right
    pub normal_load: f32,       // N
    pub grip: f32,              // μ · surface friction · tilt fade
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolveContext {
    pub dt: f32,                // s
    pub mass: f32,              // kg (whole vehicle)
    pub throttle: f32,          // 0..1
    pub brake: f32,             // 0..1
    pub handbrake: f32,         // 0..1
    pub wheel_torque: f32,      // N·m per driven wheel, signed (negative in reverse)
    pub in_reverse: bool,
}

impl SolveContext {
    /// Mass carried by one corner; used to cap forces at what one tick can
    /// cancel.
    #[inline]
    pub fn corner_mass(&self) -> f32 {
        self.mass * 0.25
    }

    /// Largest force that brings `speed` to zero within one tick.
    #[inline]
    pub fn stopping_force(&self, speed: f32) -> f32 {
        if self.dt > 0.0 { self.corner_mass() * speed.abs() / self.dt } else { 0.0 }
    }
}
