// ==============================================================================
// description.rs — REAL-WORLD CAR DESCRIPTION → VehicleSpec
// ------------------------------------------------------------------------------
// A CarDescription is what a car datasheet gives you (mm, kg, rpm, N·m, tire
// designation). `VehicleSpec::from_description` turns it into simulation units.
//
// Length scale s = sim units per metre:
//   lengths, velocities, gravity, forces  × s
//   torques, areas                        × s²
//   air density                           / s³
//   spring / damper rates                 unchanged (N/m → sN/(sm))
// ==============================================================================

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::spec::vehicle_spec::*;

/// How many simulation units make one metre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimUnits {
    pub units_per_meter: f32,
}

impl SimUnits {
    pub const METERS: Self = Self { units_per_meter: 1.0 };
}

impl Default for SimUnits {
    fn default() -> Self { Self::METERS }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarDescription {
    pub name: String,
    pub curb_weight_kg: f32,

    // --- Dimensions ---
    pub length_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
    pub wheelbase_mm: f32,
    pub track_mm: f32,
    pub cg_height_mm: Option<f32>,  // defaults to 38% of height
    pub tire_size: String,          // "225/40R18"

    // --- Suspension ---
    pub suspension_travel_mm: f32,
    pub static_sag_mm: f32,         // compression under curb weight
    pub damping_ratio: f32,         // ζ, 0.3 (soft) .. 1.0 (critical)

    // --- Engine ---
    pub idle_rpm: f32,
    pub redline_rpm: f32,
    pub peak_torque_nm: f32,
    pub peak_torque_rpm: f32,

    // --- Transmission ---
    pub forward_ratios: Vec<f32>,
    pub reverse_ratio: f32,         // magnitude; stored negative
    pub final_drive: f32,
    pub shift_time_s: f32,
    pub automatic: bool,

    // --- Body ---
    pub drag_coefficient: f32,
    pub frontal_area_m2: f32,
    pub max_steer_deg: f32,
}

impl Default for CarDescription {
    fn default() -> Self {
        Self {
            name: "gt86".to_string(),
            curb_weight_kg: 1350.0,
            length_mm: 4240.0,
            width_mm: 1775.0,
            height_mm: 1285.0,
            wheelbase_mm: 2570.0,
            track_mm: 1520.0,
            cg_height_mm: Some(460.0),
            tire_size: "215/45R17".to_string(),
            suspension_travel_mm: 200.0,
            static_sag_mm: 95.0,
            damping_ratio: 0.45,
            idle_rpm: 900.0,
            redline_rpm: 7400.0,
            peak_torque_nm: 205.0,
            peak_torque_rpm: 6400.0,
            forward_ratios: vec![3.63, 2.19, 1.54, 1.21, 1.0, 0.77],
            reverse_ratio: 3.44,
            final_drive: 4.1,
            shift_time_s: 0.25,
            automatic: false,
            drag_coefficient: 0.29,
            frontal_area_m2: 2.0,
            max_steer_deg: 34.0,
        }
    }
}

/// Parse a tire designation such as `225/40R18` (also `P225/40 R18`,
/// `245/35ZR19`) into the overall wheel radius in metres.
pub fn tire_radius_m(designation: &str) -> Result<f32, SpecError> {
    let bad = || SpecError::TireSize(designation.to_string());

    let s = designation.trim().trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let (width, rest) = s.split_once('/').ok_or_else(bad)?;
    let width_mm: f32 = width.trim().parse().map_err(|_| bad())?;

    let split = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(bad)?;
    let (aspect, rest) = rest.split_at(split);
    let aspect: f32 = aspect.parse().map_err(|_| bad())?;

    let rim = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-');
    if rim.len() == rest.len() {
        // no construction letter between aspect and rim
        return Err(bad());
    }
    let rim_in: f32 = rim.trim().parse().map_err(|_| bad())?;

    if !(width_mm > 0.0 && aspect > 0.0 && rim_in > 0.0) {
        return Err(bad());
    }
    let sidewall_mm = width_mm * aspect / 100.0;
    let radius_mm = rim_in * 25.4 * 0.5 + sidewall_mm;
    Ok(radius_mm / 1000.0)
}

/// Damper rate for a target damping ratio: c = 2ζ√(k·m).
#[inline]
fn damper_for(spring: f32, corner_mass: f32, zeta: f32) -> f32 {
    2.0 * zeta * (spring * corner_mass).sqrt()
}

impl VehicleSpec {
    /// Build a simulation spec from real-world data. The result is validated;
    /// inconsistent data (e.g. sag beyond travel) is reported, not repaired.
    pub fn from_description(desc: &CarDescription, units: SimUnits) -> Result<Self, SpecError> {
        let s = units.units_per_meter;
        if !(s.is_finite() && s > 0.0) {
            return Err(SpecError::invalid("units_per_meter", format!("must be > 0 (got {s})")));
        }
        let mm = |v: f32| v / 1000.0 * s;
        let defaults = VehicleSpec::default();

        let mass = desc.curb_weight_kg;
        let corner_mass = mass * 0.25;
        let gravity = 9.81 * s;

        let wheel_radius = tire_radius_m(&desc.tire_size)? * s;
        let cg_height = mm(desc.cg_height_mm.unwrap_or(desc.height_mm * 0.38));

        // Sag sets the spring so curb weight compresses the strut by exactly
        // `static_sag_mm`; ζ then sets the damper.
        let travel = mm(desc.suspension_travel_mm);
        let sag = mm(desc.static_sag_mm);
        if !(sag > 0.0 && sag < travel) {
            return Err(SpecError::invalid(
                "static_sag_mm",
                format!("must be within (0, suspension_travel_mm) (got {})", desc.static_sag_mm),
            ));
        }
        let spring = corner_mass * gravity / sag;
        let damper = damper_for(spring, corner_mass, desc.damping_ratio);

        let span = desc.redline_rpm - desc.idle_rpm;
        let peak_fraction = if span > 0.0 {
            ((desc.peak_torque_rpm - desc.idle_rpm) / span).clamp(0.0, 1.0)
        } else {
            defaults.engine.torque_curve.peak_fraction
        };

        let mut gear_ratios = Vec::with_capacity(desc.forward_ratios.len() + 2);
        gear_ratios.push(-desc.reverse_ratio.abs());
        gear_ratios.push(0.0);
        gear_ratios.extend_from_slice(&desc.forward_ratios);

        let spec = VehicleSpec {
            name: desc.name.clone(),
            mass,
            gravity,
            wheel_radius,
            body: BodySpec {
                width: mm(desc.width_mm),
                height: mm(desc.height_mm),
                length: mm(desc.length_mm),
                wheel_base: mm(desc.wheelbase_mm),
                track_width: mm(desc.track_mm),
                cg_height,
            },
            suspension: SuspensionSpec {
                rest_length: cg_height,
                travel,
                spring_strength: spring,
                damper_strength: damper,
                bump_stop_stiffness: spring * 10.0,
                bump_stop_damping: damper * 2.0,
                max_force: defaults.suspension.max_force * s,
                ..defaults.suspension.clone()
            },
            engine: EngineSpec {
                idle_rpm: desc.idle_rpm,
                redline_rpm: desc.redline_rpm,
                max_torque: desc.peak_torque_nm * s * s,
                torque_curve: TorqueCurve {
                    peak_fraction,
                    ..defaults.engine.torque_curve.clone()
                },
                launch_speed: defaults.engine.launch_speed * s,
                ..defaults.engine.clone()
            },
            transmission: TransmissionSpec {
                gear_ratios,
                final_drive: desc.final_drive,
                shift_time: desc.shift_time_s,
                mode: if desc.automatic { TransmissionMode::Automatic } else { TransmissionMode::Manual },
                ..defaults.transmission.clone()
            },
            tires: TireSpec {
                slip_epsilon: defaults.tires.slip_epsilon * s,
                ..defaults.tires.clone()
            },
            aero: AeroSpec {
                drag_coefficient: desc.drag_coefficient,
                frontal_area: desc.frontal_area_m2 * s * s,
                air_density: defaults.aero.air_density / (s * s * s),
                downforce: defaults.aero.downforce / s,
            },
            steering: SteeringSpec {
                max_angle: desc.max_steer_deg.to_radians(),
                reduction_speed: defaults.steering.reduction_speed * s,
                ..defaults.steering.clone()
            },
            hull: HullSpec {
                max_force: defaults.hull.max_force * s,
                ..defaults.hull.clone()
            },
            stability: StabilitySpec {
                tunnel_depth: defaults.stability.tunnel_depth * s,
                ..defaults.stability.clone()
            },
        };

        spec.validate()?;
        log::debug!(
            "derived `{}`: k = {:.0}, c = {:.0}, wheel radius = {:.3}",
            spec.name, spring, damper, wheel_radius
        );
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() <= tol * b.abs().max(1.0)
    }

    #[test]
    fn parses_common_tire_designations() {
        // 18" rim → 228.6 mm, sidewall 225·0.40 = 90 mm
        let r = tire_radius_m("225/40R18").expect("valid");
        assert!(close(r, 0.3186, 1e-4), "{r}");

        let r = tire_radius_m("P205/55 R16").expect("valid");
        assert!(close(r, 0.3160, 1e-3), "{r}");

        assert!(tire_radius_m("245/35ZR19").is_ok());
    }

    #[test]
    fn rejects_malformed_tire_designations() {
        for bad in ["", "225-40-18", "225/40", "225/R18", "abc/40R18", "225/4018", "0/40R18"] {
            match tire_radius_m(bad) {
                Err(SpecError::TireSize(s)) => assert_eq!(s, bad),
                other => panic!("{bad:?} → {other:?}"),
            }
        }
    }

    #[test]
    fn default_description_yields_valid_spec() {
        let spec = VehicleSpec::from_description(&CarDescription::default(), SimUnits::METERS)
            .expect("default description is consistent");

        assert_eq!(spec.transmission.gear_ratios[0], -3.44);
        assert_eq!(spec.transmission.gear_ratios[1], 0.0);
        assert_eq!(spec.transmission.gear_ratios.len(), 8);

        // curb weight compresses each strut by the stated sag
        let sag = spec.static_wheel_load() / spec.suspension.spring_strength;
        assert!(close(sag, 0.095, 1e-4), "{sag}");
    }

    #[test]
    fn length_scale_applies_per_dimension() {
        let desc = CarDescription::default();
        let m = VehicleSpec::from_description(&desc, SimUnits::METERS).expect("metres");
        let cm = VehicleSpec::from_description(&desc, SimUnits { units_per_meter: 100.0 })
            .expect("centimetres");

        assert!(close(cm.body.length, m.body.length * 100.0, 1e-5));
        assert!(close(cm.wheel_radius, m.wheel_radius * 100.0, 1e-5));
        assert!(close(cm.gravity, m.gravity * 100.0, 1e-5));
        assert!(close(cm.engine.max_torque, m.engine.max_torque * 1.0e4, 1e-5));
        assert!(close(cm.suspension.spring_strength, m.suspension.spring_strength, 1e-4));
        assert_eq!(cm.mass, m.mass);
    }

    #[test]
    fn sag_beyond_travel_is_reported() {
        let desc = CarDescription { static_sag_mm: 250.0, ..CarDescription::default() };
        let err = VehicleSpec::from_description(&desc, SimUnits::METERS).expect_err("sag > travel");
        assert!(err.to_string().contains("static_sag_mm"));
    }
}
