// ==============================================================================
// vehicle_spec.rs — STATIC VEHICLE CONFIGURATION (SIMULATION UNITS)
// ------------------------------------------------------------------------------
// A VehicleSpec is immutable once a Vehicle is built and may be shared between
// any number of vehicles of the same model (wrap it in an Arc).
//
// Every struct is `#[serde(default)]`: a partial JSON/TOML record fills the
// gaps from the legacy default car (GT86-like mid-size RWD coupé).
//
// validate()  -> first problem as SpecError::Invalid
// sanitized() -> never fails; invalid groups fall back to their defaults
// ==============================================================================

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::math::Vec3;
use crate::state::WheelId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSpec {
    pub name: String,
    pub mass: f32,              // kg
    pub gravity: f32,           // m/s² (world -Y)
    pub wheel_radius: f32,      // m

    pub body: BodySpec,
    pub suspension: SuspensionSpec,
    pub engine: EngineSpec,
    pub transmission: TransmissionSpec,
    pub tires: TireSpec,
    pub aero: AeroSpec,
    pub steering: SteeringSpec,
    pub hull: HullSpec,
    pub stability: StabilitySpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySpec {
    pub width: f32,             // m
    pub height: f32,            // m (ground to roof)
    pub length: f32,            // m
    pub wheel_base: f32,        // m (front axle to rear axle)
    pub track_width: f32,       // m (left to right)
    pub cg_height: f32,         // m (ground to centre of mass at rest)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspensionSpec {
    pub rest_length: f32,           // m, cast headroom above the wheel
    pub travel: f32,                // m, full extension → full compression
    pub spring_strength: f32,       // N/m
    pub damper_strength: f32,       // N·s/m
    pub rebound_ratio: f32,         // 0..1 damper multiplier while extending
    pub bump_stop_stiffness: f32,   // N/m past full travel
    pub bump_stop_damping: f32,     // N·s/m past full travel
    /// Mount height as a fraction of rest_length up the strut. The strut force
    /// is axial, so this does not change the torque; it places the mount point.
    pub shock_mount_fraction: f32,
    pub max_force: f32,             // N
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorqueCurve {
    pub peak_fraction: f32,     // normalized rpm (0 = idle, 1 = redline) of peak torque
    pub idle_fraction: f32,     // torque at idle relative to peak
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSpec {
    pub idle_rpm: f32,
    pub redline_rpm: f32,
    pub max_torque: f32,        // N·m
    pub torque_curve: TorqueCurve,
    pub rpm_response: f32,      // 1/s, exponential smoothing rate
    pub launch_speed: f32,      // m/s below which throttle pulls rpm toward redline
    pub limiter_band: f32,      // fraction of redline over which drive fades out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransmissionMode {
    #[default]
    Manual,
    Automatic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmissionSpec {
    /// `[reverse (<0), neutral (0), first, second, ...]`
    pub gear_ratios: Vec<f32>,
    pub final_drive: f32,
    pub shift_time: f32,        // s
    pub mode: TransmissionMode,
    pub upshift_fraction: f32,  // of redline
    pub downshift_fraction: f32,// of idle
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TireSpec {
    pub grip_coefficient: f32,
    pub slip_angle_peak: f32,       // rad
    pub rolling_resistance: f32,
    pub lateral_scale: f32,         // < 1
    pub slip_epsilon: f32,          // m/s added to |v_fwd| in the slip angle
    pub drive_grip_limit: f32,      // multiple of available grip
    pub brake_strength: f32,        // multiple of available grip
    pub handbrake_strength: f32,    // multiple of available grip
    pub handbrake_grip_loss: f32,   // lateral grip lost at full handbrake
    pub reverse_creep: f32,         // fraction of grip pushed backward by the brake in R
    pub roll_factor: f32,           // 0..1 how much of the contact height is used as lever
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AeroSpec {
    pub drag_coefficient: f32,
    pub frontal_area: f32,      // m²
    pub air_density: f32,       // kg/m³
    pub downforce: f32,         // N per (m/s)²
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringSpec {
    pub max_angle: f32,             // rad
    pub speed: f32,                 // rad/s rate limit
    pub high_speed_reduction: f32,  // 0..1 max angle lost at `reduction_speed`
    pub reduction_speed: f32,       // m/s
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HullSpec {
    pub stiffness: f32,         // N/m
    pub damping: f32,           // N·s/m
    pub max_force: f32,         // N per corner
    pub normal_blend: f32,      // 0 = world up, 1 = ground normal
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilitySpec {
    pub horizontal_decay: f32,          // 1/s
    pub inertia_boost: f32,             // roll/pitch multiplier over the box formula
    pub angular_damping: f32,           // 1/s
    pub unstable_angular_damping: f32,  // 1/s
    pub unstable_max_angular_speed: f32,// rad/s
    pub tunnel_depth: f32,              // m below terrain before the safety snap
}

// ============================================
// ----- legacy defaults ----------------------
// ============================================

impl Default for VehicleSpec {
    fn default() -> Self {
        Self {
            name: "gt86".to_string(),
            mass: 1350.0,
            gravity: 9.81,
            wheel_radius: 0.33,
            body: BodySpec::default(),
            suspension: SuspensionSpec::default(),
            engine: EngineSpec::default(),
            transmission: TransmissionSpec::default(),
            tires: TireSpec::default(),
            aero: AeroSpec::default(),
            steering: SteeringSpec::default(),
            hull: HullSpec::default(),
            stability: StabilitySpec::default(),
        }
    }
}

impl Default for BodySpec {
    fn default() -> Self {
        Self {
            width: 1.8,
            height: 1.3,
            length: 4.2,
            wheel_base: 2.5,
            track_width: 1.5,
            cg_height: 0.5,
        }
    }
}

impl Default for SuspensionSpec {
    fn default() -> Self {
        Self {
            rest_length: 0.5,
            travel: 0.2,
            spring_strength: 35_000.0,
            damper_strength: 4_000.0,
            rebound_ratio: 0.5,
            bump_stop_stiffness: 350_000.0,
            bump_stop_damping: 8_000.0,
            shock_mount_fraction: 0.5,
            max_force: 200_000.0,
        }
    }
}

impl Default for TorqueCurve {
    fn default() -> Self {
        Self { peak_fraction: 0.55, idle_fraction: 0.6 }
    }
}

impl Default for EngineSpec {
    fn default() -> Self {
        Self {
            idle_rpm: 900.0,
            redline_rpm: 7400.0,
            max_torque: 205.0,
            torque_curve: TorqueCurve::default(),
            rpm_response: 10.0,
            launch_speed: 5.0,
            limiter_band: 0.05,
        }
    }
}

impl Default for TransmissionSpec {
    fn default() -> Self {
        Self {
            gear_ratios: vec![-3.44, 0.0, 3.63, 2.19, 1.54, 1.21, 1.0, 0.77],
            final_drive: 4.1,
            shift_time: 0.25,
            mode: TransmissionMode::Manual,
            upshift_fraction: 0.9,
            downshift_fraction: 1.5,
        }
    }
}

impl Default for TireSpec {
    fn default() -> Self {
        Self {
            grip_coefficient: 1.0,
            slip_angle_peak: 0.15,
            rolling_resistance: 0.015,
            lateral_scale: 0.9,
            slip_epsilon: 0.5,
            drive_grip_limit: 1.5,
            brake_strength: 1.0,
            handbrake_strength: 1.2,
            handbrake_grip_loss: 0.6,
            reverse_creep: 0.25,
            roll_factor: 0.3,
        }
    }
}

impl Default for AeroSpec {
    fn default() -> Self {
        Self {
            drag_coefficient: 0.29,
            frontal_area: 2.0,
            air_density: 1.225,
            downforce: 0.3,
        }
    }
}

impl Default for SteeringSpec {
    fn default() -> Self {
        Self {
            max_angle: 0.6,
            speed: 2.5,
            high_speed_reduction: 0.65,
            reduction_speed: 30.0,
        }
    }
}

impl Default for HullSpec {
    fn default() -> Self {
        Self {
            stiffness: 400_000.0,
            damping: 15_000.0,
            max_force: 150_000.0,
            normal_blend: 0.5,
        }
    }
}

impl Default for StabilitySpec {
    fn default() -> Self {
        Self {
            horizontal_decay: 0.05,
            inertia_boost: 2.0,
            angular_damping: 0.5,
            unstable_angular_damping: 4.0,
            unstable_max_angular_speed: 6.0,
            tunnel_depth: 1.0,
        }
    }
}

// ============================================
// ----- loading ------------------------------
// ============================================

impl VehicleSpec {
    pub fn from_json_str(text: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SpecError> {
        toml::from_str(text).map_err(|e| SpecError::Toml(Box::new(e)))
    }

    /// Load from a `.json` or `.toml` file (anything else is read as TOML).
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let spec = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&raw)?,
            _ => Self::from_toml_str(&raw)?,
        };
        log::debug!("loaded vehicle spec `{}` from {}", spec.name, path.display());
        Ok(spec)
    }
}

// ============================================
// ----- validation ---------------------------
// ============================================

fn positive(field: &'static str, v: f32) -> Result<(), SpecError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(SpecError::invalid(field, format!("must be > 0 (got {v})")))
    }
}

fn non_negative(field: &'static str, v: f32) -> Result<(), SpecError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(SpecError::invalid(field, format!("must be >= 0 (got {v})")))
    }
}

fn unit_range(field: &'static str, v: f32) -> Result<(), SpecError> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(SpecError::invalid(field, format!("must be within 0..=1 (got {v})")))
    }
}

impl BodySpec {
    fn check(&self) -> Result<(), SpecError> {
        positive("body.width", self.width)?;
        positive("body.height", self.height)?;
        positive("body.length", self.length)?;
        positive("body.wheel_base", self.wheel_base)?;
        positive("body.track_width", self.track_width)?;
        positive("body.cg_height", self.cg_height)?;
        if self.cg_height >= self.height {
            return Err(SpecError::invalid("body.cg_height", "must be below the roof"));
        }
        Ok(())
    }
}

impl SuspensionSpec {
    fn check(&self) -> Result<(), SpecError> {
        non_negative("suspension.rest_length", self.rest_length)?;
        positive("suspension.travel", self.travel)?;
        positive("suspension.spring_strength", self.spring_strength)?;
        non_negative("suspension.damper_strength", self.damper_strength)?;
        unit_range("suspension.rebound_ratio", self.rebound_ratio)?;
        non_negative("suspension.bump_stop_stiffness", self.bump_stop_stiffness)?;
        non_negative("suspension.bump_stop_damping", self.bump_stop_damping)?;
        unit_range("suspension.shock_mount_fraction", self.shock_mount_fraction)?;
        positive("suspension.max_force", self.max_force)
    }
}

impl EngineSpec {
    fn check(&self) -> Result<(), SpecError> {
        positive("engine.idle_rpm", self.idle_rpm)?;
        positive("engine.max_torque", self.max_torque)?;
        positive("engine.rpm_response", self.rpm_response)?;
        non_negative("engine.launch_speed", self.launch_speed)?;
        unit_range("engine.torque_curve.peak_fraction", self.torque_curve.peak_fraction)?;
        unit_range("engine.torque_curve.idle_fraction", self.torque_curve.idle_fraction)?;
        if !(self.limiter_band > 0.0 && self.limiter_band < 1.0) {
            return Err(SpecError::invalid("engine.limiter_band", "must be within 0..1"));
        }
        if !(self.redline_rpm > self.idle_rpm) {
            return Err(SpecError::invalid(
                "engine.redline_rpm",
                format!("must exceed idle_rpm ({} <= {})", self.redline_rpm, self.idle_rpm),
            ));
        }
        Ok(())
    }
}

impl TransmissionSpec {
    fn check(&self) -> Result<(), SpecError> {
        let ratios = &self.gear_ratios;
        if ratios.len() < 3 {
            return Err(SpecError::invalid(
                "transmission.gear_ratios",
                "needs reverse, neutral and at least one forward gear",
            ));
        }
        if !(ratios[0] < 0.0) {
            return Err(SpecError::invalid("transmission.gear_ratios", "index 0 must be reverse (< 0)"));
        }
        if ratios[1] != 0.0 {
            return Err(SpecError::invalid("transmission.gear_ratios", "index 1 must be neutral (0)"));
        }
        if let Some((i, r)) = ratios.iter().enumerate().skip(2).find(|(_, r)| !(r.is_finite() && **r > 0.0)) {
            return Err(SpecError::invalid(
                "transmission.gear_ratios",
                format!("forward gear at index {i} must be > 0 (got {r})"),
            ));
        }
        positive("transmission.final_drive", self.final_drive)?;
        non_negative("transmission.shift_time", self.shift_time)?;
        unit_range("transmission.upshift_fraction", self.upshift_fraction)?;
        if !(self.downshift_fraction >= 1.0) {
            return Err(SpecError::invalid("transmission.downshift_fraction", "must be >= 1"));
        }
        Ok(())
    }
}

impl TireSpec {
    fn check(&self) -> Result<(), SpecError> {
        positive("tires.grip_coefficient", self.grip_coefficient)?;
        positive("tires.slip_angle_peak", self.slip_angle_peak)?;
        non_negative("tires.rolling_resistance", self.rolling_resistance)?;
        unit_range("tires.lateral_scale", self.lateral_scale)?;
        positive("tires.slip_epsilon", self.slip_epsilon)?;
        positive("tires.drive_grip_limit", self.drive_grip_limit)?;
        non_negative("tires.brake_strength", self.brake_strength)?;
        non_negative("tires.handbrake_strength", self.handbrake_strength)?;
        unit_range("tires.handbrake_grip_loss", self.handbrake_grip_loss)?;
        unit_range("tires.reverse_creep", self.reverse_creep)?;
        unit_range("tires.roll_factor", self.roll_factor)
    }
}

impl AeroSpec {
    fn check(&self) -> Result<(), SpecError> {
        non_negative("aero.drag_coefficient", self.drag_coefficient)?;
        non_negative("aero.frontal_area", self.frontal_area)?;
        non_negative("aero.air_density", self.air_density)?;
        non_negative("aero.downforce", self.downforce)
    }
}

impl SteeringSpec {
    fn check(&self) -> Result<(), SpecError> {
        non_negative("steering.max_angle", self.max_angle)?;
        positive("steering.speed", self.speed)?;
        unit_range("steering.high_speed_reduction", self.high_speed_reduction)?;
        positive("steering.reduction_speed", self.reduction_speed)
    }
}

impl HullSpec {
    fn check(&self) -> Result<(), SpecError> {
        positive("hull.stiffness", self.stiffness)?;
        non_negative("hull.damping", self.damping)?;
        positive("hull.max_force", self.max_force)?;
        unit_range("hull.normal_blend", self.normal_blend)
    }
}

impl StabilitySpec {
    fn check(&self) -> Result<(), SpecError> {
        non_negative("stability.horizontal_decay", self.horizontal_decay)?;
        positive("stability.inertia_boost", self.inertia_boost)?;
        non_negative("stability.angular_damping", self.angular_damping)?;
        non_negative("stability.unstable_angular_damping", self.unstable_angular_damping)?;
        positive("stability.unstable_max_angular_speed", self.unstable_max_angular_speed)?;
        positive("stability.tunnel_depth", self.tunnel_depth)
    }
}

/// Replace `group` with its default when `check` rejects it.
fn repair<T: Default>(group: &mut T, check: impl Fn(&T) -> Result<(), SpecError>) {
    if let Err(e) = check(group) {
        log::warn!("{e}; falling back to the default group");
        *group = T::default();
    }
}

fn repair_scalar(field: &'static str, value: &mut f32, fallback: f32) {
    if let Err(e) = positive(field, *value) {
        log::warn!("{e}; using {fallback}");
        *value = fallback;
    }
}

impl VehicleSpec {
    /// Report the first invalid field.
    pub fn validate(&self) -> Result<(), SpecError> {
        positive("mass", self.mass)?;
        positive("gravity", self.gravity)?;
        positive("wheel_radius", self.wheel_radius)?;
        self.body.check()?;
        self.suspension.check()?;
        self.engine.check()?;
        self.transmission.check()?;
        self.tires.check()?;
        self.aero.check()?;
        self.steering.check()?;
        self.hull.check()?;
        self.stability.check()
    }

    /// Copy of this spec where every invalid value is replaced by the legacy
    /// default for its group. Never fails.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut out = self.clone();

        repair_scalar("mass", &mut out.mass, defaults.mass);
        repair_scalar("gravity", &mut out.gravity, defaults.gravity);
        repair_scalar("wheel_radius", &mut out.wheel_radius, defaults.wheel_radius);

        repair(&mut out.body, BodySpec::check);
        repair(&mut out.suspension, SuspensionSpec::check);
        repair(&mut out.engine, EngineSpec::check);
        repair(&mut out.transmission, TransmissionSpec::check);
        repair(&mut out.tires, TireSpec::check);
        repair(&mut out.aero, AeroSpec::check);
        repair(&mut out.steering, SteeringSpec::check);
        repair(&mut out.hull, HullSpec::check);
        repair(&mut out.stability, StabilitySpec::check);
        out
    }
}

// ============================================
// ----- derived geometry ---------------------
// ============================================

impl VehicleSpec {
    /// Wheel mount in chassis space. Height is chosen so that with the centre
    /// of mass at `cg_height` above flat ground the strut sits at half travel.
    pub fn wheel_offset(&self, id: WheelId) -> Vec3 {
        let half_track = self.body.track_width * 0.5;
        let half_base = self.body.wheel_base * 0.5;
        let y = self.suspension.travel * 0.5 + self.wheel_radius - self.body.cg_height;
        let x = if id.is_left() { -half_track } else { half_track };
        let z = if id.is_front() { -half_base } else { half_base };
        Vec3::new(x, y, z)
    }

    /// The 8 hull corners in chassis space: belly at wheel-radius clearance,
    /// roof at `body.height`.
    pub fn hull_corners(&self) -> [Vec3; 8] {
        let hw = self.body.width * 0.5;
        let hl = self.body.length * 0.5;
        let bottom = self.wheel_radius - self.body.cg_height;
        let top = self.body.height - self.body.cg_height;
        let mut out = [Vec3::zeros(); 8];
        for (i, corner) in out.iter_mut().enumerate() {
            let x = if i & 1 == 0 { -hw } else { hw };
            let z = if i & 2 == 0 { -hl } else { hl };
            let y = if i & 4 == 0 { bottom } else { top };
            *corner = Vec3::new(x, y, z);
        }
        out
    }

    pub fn neutral_index(&self) -> usize {
        self.transmission
            .gear_ratios
            .iter()
            .position(|r| *r == 0.0)
            .unwrap_or(1)
    }

    pub fn first_gear_index(&self) -> usize {
        self.neutral_index() + 1
    }

    pub fn top_gear_index(&self) -> usize {
        self.transmission.gear_ratios.len().saturating_sub(1)
    }

    /// Static per-wheel load on flat ground.
    pub fn static_wheel_load(&self) -> f32 {
        self.mass * self.gravity * 0.25
    }
}
