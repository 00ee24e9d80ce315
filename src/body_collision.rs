// ==============================================================================
// body_collision.rs — RIGID HULL vs TERRAIN (8 CORNERS)
// ------------------------------------------------------------------------------
// Independent of the suspension: catches roofs, bellies and noses that reach
// the ground when wheels can't.
//
// Per corner below the surface:
//   dir = normalize(lerp(worldUp, groundNormal, normalBlend))
//   F   = clamp(k·depth + c·approachSpeed, 0, maxForce) · dir
//   τ   = (horizontal lever) × F, faded when the body is steeply tilted
// ==============================================================================

use crate::math::{horizontal, point_velocity, safe_normalize, Vec3, WORLD_UP};
use crate::spec::VehicleSpec;
use crate::state::{BodyCollisionPoint, RigidBodyState};
use crate::suspension::tilt_factor;
use crate::terrain::TerrainQuery;

/// Torque never fades below this share, so a car on its roof still rocks.
const MIN_TORQUE_SHARE: f32 = 0.25;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HullContact {
    pub force: Vec3,    // world
    pub torque: Vec3,   // body frame
    pub touching: usize,
}

pub fn evaluate_hull(
    spec: &VehicleSpec,
    body: &RigidBodyState,
    corners: &mut [BodyCollisionPoint; 8],
    terrain: &dyn TerrainQuery,
) -> HullContact {
    let hull = &spec.hull;
    let omega = body.angular_velocity_world();
    let share = MIN_TORQUE_SHARE + (1.0 - MIN_TORQUE_SHARE) * tilt_factor(body.up().y);

    let mut out = HullContact::default();
    let mut torque_world = Vec3::zeros();

    for corner in corners.iter_mut() {
        let r = body.to_world_offset(&corner.offset);
        let p = body.position + r;
        let depth = terrain.height_at(p.x, p.z) - p.y;

        if !(depth > 0.0) {
            corner.colliding = false;
            corner.penetration = 0.0;
            corner.force = Vec3::zeros();
            continue;
        }

        let n = terrain.normal_at(p.x, p.z);
        let dir = safe_normalize(WORLD_UP.lerp(&n, hull.normal_blend), WORLD_UP);
        let approach = -point_velocity(body.velocity, omega, r).dot(&dir);

        let magnitude = (hull.stiffness * depth + hull.damping * approach).clamp(0.0, hull.max_force);
        let force = dir * magnitude;

        corner.colliding = true;
        corner.penetration = depth;
        corner.force = force;

        out.force += force;
        out.touching += 1;
        torque_world += horizontal(r).cross(&force) * share;
    }

    out.torque = body.orientation.inverse() * torque_world;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;
    use crate::terrain::FlatTerrain;

    fn corners(spec: &VehicleSpec) -> [BodyCollisionPoint; 8] {
        spec.hull_corners().map(BodyCollisionPoint::new)
    }

    #[test]
    fn upright_car_at_ride_height_does_not_touch() {
        let spec = VehicleSpec::default();
        let body = RigidBodyState::at_rest(Vec3::new(0.0, spec.body.cg_height, 0.0));
        let mut c = corners(&spec);
        let out = evaluate_hull(&spec, &body, &mut c, &FlatTerrain::default());
        assert_eq!(out.touching, 0);
        assert!(c.iter().all(|p| !p.colliding));
    }

    #[test]
    fn sunk_belly_pushes_up_only() {
        let spec = VehicleSpec::default();
        let mut body = RigidBodyState::at_rest(Vec3::new(0.0, 0.1, 0.0));
        body.velocity = Vec3::new(0.0, 5.0, 0.0); // leaving the ground fast
        let mut c = corners(&spec);
        let out = evaluate_hull(&spec, &body, &mut c, &FlatTerrain::default());
        assert_eq!(out.touching, 4);
        assert!(out.force.y >= 0.0);
        assert!(c.iter().all(|p| p.force.y >= 0.0));
    }

    #[test]
    fn roof_contact_when_inverted() {
        let spec = VehicleSpec::default();
        let mut body = RigidBodyState::at_rest(Vec3::new(0.0, 0.7, 0.0));
        body.orientation = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::PI);
        let mut c = corners(&spec);
        let out = evaluate_hull(&spec, &body, &mut c, &FlatTerrain::default());
        assert_eq!(out.touching, 4);
        assert!(out.force.y > 0.0);
        for p in c.iter().filter(|p| p.colliding) {
            assert!(p.offset.y > 0.0, "roof corners touch");
        }
        assert!(out.force.norm() <= 4.0 * spec.hull.max_force + 1e-3);
    }
}
