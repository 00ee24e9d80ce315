// ==============================================================================
// state.rs — MUTABLE PER-VEHICLE STATE
// ------------------------------------------------------------------------------
// Everything here is owned by exactly one Vehicle:
//   RigidBodyState      pose + velocities of the chassis
//   [WheelState; 4]     FL, FR, RL, RR (index order)
//   [BodyCollisionPoint; 8]
//   GearboxState
//
// Orientation is a unit quaternion. Angular velocity is stored in the BODY
// frame; convert with `angular_velocity_world()` when you need world space.
// ==============================================================================

use std::fmt;

use serde::Serialize;

use crate::math::{forward_axis, right_axis, up_axis, is_finite_vec, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBodyState {
    pub position: Vec3,         // world, centre of mass
    pub velocity: Vec3,         // world, m/s
    pub orientation: Quat,
    pub angular_velocity: Vec3, // body frame, rad/s
}

impl RigidBodyState {
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::zeros(),
            orientation: Quat::identity(),
            angular_velocity: Vec3::zeros(),
        }
    }

    #[inline] pub fn forward(&self) -> Vec3 { forward_axis(&self.orientation) }
    #[inline] pub fn right(&self) -> Vec3 { right_axis(&self.orientation) }
    #[inline] pub fn up(&self) -> Vec3 { up_axis(&self.orientation) }

    #[inline]
    pub fn angular_velocity_world(&self) -> Vec3 {
        self.orientation * self.angular_velocity
    }

    /// Chassis-space offset → world-space lever arm from the centre of mass.
    #[inline]
    pub fn to_world_offset(&self, local: &Vec3) -> Vec3 {
        self.orientation * local
    }

    pub fn is_finite(&self) -> bool {
        is_finite_vec(&self.position)
            && is_finite_vec(&self.velocity)
            && is_finite_vec(&self.angular_velocity)
            && self.orientation.coords.iter().all(|c| c.is_finite())
    }
}

// ============================================
// Wheel identification
// ============================================

/// Wheel slot. The discriminant is the array index; front/rear and left/right
/// follow from it arithmetically.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum WheelId { FL = 0, FR = 1, RL = 2, RR = 3 }

impl WheelId {
    pub const ALL: [WheelId; 4] = [WheelId::FL, WheelId::FR, WheelId::RL, WheelId::RR];

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    #[inline] pub fn index(self) -> usize { self as usize }
    #[inline] pub fn is_front(self) -> bool { self.index() < 2 }
    #[inline] pub fn is_rear(self) -> bool { !self.is_front() }
    #[inline] pub fn is_left(self) -> bool { self.index() % 2 == 0 }
    #[inline] pub fn is_right(self) -> bool { !self.is_left() }

    /// Rear-wheel drive.
    #[inline] pub fn is_driven(self) -> bool { self.is_rear() }
    #[inline] pub fn is_steered(self) -> bool { self.is_front() }

    pub fn as_str(self) -> &'static str {
        match self {
            WheelId::FL => "FL",
            WheelId::FR => "FR",
            WheelId::RL => "RL",
            WheelId::RR => "RR",
        }
    }
}

impl fmt::Display for WheelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Wheels
// ============================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelState {
    pub id: WheelId,
    pub offset: Vec3,               // chassis space
    pub compression_ratio: f32,     // 0 (extended) .. 1.5 (deep in bump stop)
    pub suspension_velocity: f32,   // m/s, + = compressing
    pub grounded: bool,
    pub slip_angle: f32,            // rad
    pub slip_ratio: f32,            // informative only
    pub wheel_rpm: f32,             // survives contact loss

    // --- per-tick diagnostics ---
    pub normal_load: f32,           // N
    pub suspension_force: Vec3,     // world
    pub tire_force: Vec3,           // world
    pub contact_point: Vec3,        // world
    pub ground_normal: Vec3,
    pub forward_speed: f32,         // m/s along the wheel heading
    pub drive_force: f32,           // N, longitudinal drive before clamping to grip
    pub steer_angle: f32,           // rad
}

impl WheelState {
    pub fn new(id: WheelId, offset: Vec3) -> Self {
        Self {
            id,
            offset,
            compression_ratio: 0.0,
            suspension_velocity: 0.0,
            grounded: false,
            slip_angle: 0.0,
            slip_ratio: 0.0,
            wheel_rpm: 0.0,
            normal_load: 0.0,
            suspension_force: Vec3::zeros(),
            tire_force: Vec3::zeros(),
            contact_point: Vec3::zeros(),
            ground_normal: Vec3::y(),
            forward_speed: 0.0,
            drive_force: 0.0,
            steer_angle: 0.0,
        }
    }

    /// Back to ungrounded defaults. Identity, mount and rotational state stay.
    pub fn reset_contact(&mut self) {
        *self = Self {
            wheel_rpm: self.wheel_rpm,
            steer_angle: self.steer_angle,
            ..Self::new(self.id, self.offset)
        };
    }
}

// ============================================
// Hull
// ============================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyCollisionPoint {
    pub offset: Vec3,       // chassis space
    pub colliding: bool,
    pub penetration: f32,   // m, ≥ 0
    pub force: Vec3,        // world, last tick
}

impl BodyCollisionPoint {
    pub fn new(offset: Vec3) -> Self {
        Self { offset, colliding: false, penetration: 0.0, force: Vec3::zeros() }
    }
}

// ============================================
// Gearbox
// ============================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearboxState {
    pub gear_index: usize,  // into TransmissionSpec::gear_ratios
    pub is_shifting: bool,
    pub shift_timer: f32,   // s remaining
    pub rpm: f32,
    pub wheel_torque: f32,  // N·m per driven wheel delivered this tick
}

impl GearboxState {
    pub fn new(gear_index: usize, idle_rpm: f32) -> Self {
        Self { gear_index, is_shifting: false, shift_timer: 0.0, rpm: idle_rpm, wheel_torque: 0.0 }
    }
}
