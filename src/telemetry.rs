// ==============================================================================
// telemetry.rs — SERIALIZABLE SNAPSHOT (SIM -> HOST)
// ------------------------------------------------------------------------------
// Plain-array, serde-friendly copy of everything a HUD, replay recorder or
// debug overlay wants from a Vehicle:
// - VehicleTelemetry: pose, speeds, engine/gear, steering
// - WheelTelemetry:   per-wheel suspension + tire numbers
// - CornerTelemetry:  per-hull-corner contact
//
// Euler angles exist ONLY here; the simulation itself is quaternion-only.
// This file is purely presentation and must not feed back into physics.
// ==============================================================================

use serde::Serialize;

use crate::math::Vec3;
use crate::state::{BodyCollisionPoint, RigidBodyState, WheelState};

#[inline] pub(crate) fn v3(v: &Vec3) -> [f32; 3] { [v.x, v.y, v.z] }

/// Presentation angles in degrees, derived from the body axes:
/// yaw = heading around world up (0 = facing −Z, positive = turned left),
/// pitch = nose up, roll = right side down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EulerDegrees {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl EulerDegrees {
    pub fn from_body(body: &RigidBodyState) -> Self {
        let f = body.forward();
        let r = body.right();
        let u = body.up();
        Self {
            yaw: (-f.x).atan2(-f.z).to_degrees(),
            pitch: f.y.clamp(-1.0, 1.0).asin().to_degrees(),
            roll: (-r.y).atan2(u.y).to_degrees(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WheelTelemetry {
    pub id: &'static str,            // "FL", "FR", "RL", "RR"
    pub grounded: bool,
    pub compression: f32,            // ratio 0..1.5
    pub suspension_velocity: f32,
    pub normal_load: f32,
    pub slip_angle: f32,
    pub slip_ratio: f32,
    pub wheel_rpm: f32,
    pub steer_angle: f32,
    pub contact_point: [f32; 3],
    pub suspension_force: [f32; 3],
    pub tire_force: [f32; 3],
    pub driven: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CornerTelemetry {
    pub offset: [f32; 3],
    pub colliding: bool,
    pub penetration: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleTelemetry {
    pub name: String,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub rotation: [f32; 4],          // quaternion (x, y, z, w)
    pub angular_velocity: [f32; 3],  // body frame
    pub euler: EulerDegrees,

    pub speed: f32,                  // m/s, signed along forward
    pub speed_kmh: f32,
    pub rpm: f32,
    pub gear_index: usize,
    pub gear: String,                // "R", "N", "1".."n"
    pub is_shifting: bool,
    pub steer_angle: f32,
    pub grounded_wheels: usize,

    pub wheels: Vec<WheelTelemetry>,
    pub corners: Vec<CornerTelemetry>,
}

impl VehicleTelemetry {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub(crate) fn wheel_telemetry(w: &WheelState) -> WheelTelemetry {
    WheelTelemetry {
        id: w.id.as_str(),
        grounded: w.grounded,
        compression: w.compression_ratio,
        suspension_velocity: w.suspension_velocity,
        normal_load: w.normal_load,
        slip_angle: w.slip_angle,
        slip_ratio: w.slip_ratio,
        wheel_rpm: w.wheel_rpm,
        steer_angle: w.steer_angle,
        contact_point: v3(&w.contact_point),
        suspension_force: v3(&w.suspension_force),
        tire_force: v3(&w.tire_force),
        driven: w.id.is_driven(),
    }
}

pub(crate) fn corner_telemetry(c: &BodyCollisionPoint) -> CornerTelemetry {
    CornerTelemetry {
        offset: v3(&c.offset),
        colliding: c.colliding,
        penetration: c.penetration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;

    #[test]
    fn euler_reads_body_axes() {
        let mut body = RigidBodyState::at_rest(Vec3::zeros());
        let e = EulerDegrees::from_body(&body);
        assert!(e.yaw.abs() < 1e-4 && e.pitch.abs() < 1e-4 && e.roll.abs() < 1e-4);

        // turn left 90°: forward -Z → -X
        body.orientation = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        let e = EulerDegrees::from_body(&body);
        assert!((e.yaw - 90.0).abs() < 1e-3, "{e:?}");

        // nose up 10°
        body.orientation = Quat::from_axis_angle(&Vec3::x_axis(), 10f32.to_radians());
        let e = EulerDegrees::from_body(&body);
        assert!((e.pitch - 10.0).abs() < 1e-3, "{e:?}");
    }
}
