// Aerodynamic drag and downforce, applied at the centre of mass.
//
//   drag      = −½ ρ Cd A |v| v
//   downforce = k |v|² along −up

use crate::math::Vec3;
use crate::spec::AeroSpec;

pub fn aero_force(aero: &AeroSpec, velocity: Vec3, up: Vec3) -> Vec3 {
    let speed = velocity.norm();
    let drag = velocity * (-0.5 * aero.air_density * aero.drag_coefficient * aero.frontal_area * speed);
    let downforce = up * (-aero.downforce * speed * speed);
    drag + downforce
}
