// ==============================================================================
// gearbox.rs — GEAR STATE MACHINE
// ------------------------------------------------------------------------------
//   Driving --request--> Shifting --timer hits 0--> Driving
//
// The new gear index is committed the moment a request is accepted; the
// timer only gates torque. Requests are ignored while shifting and never leave
// the ratio table.
//
// Automatic mode (on top of manual requests):
//   near standstill: throttle in N/R → 1st, brake w/o throttle in N/1st → R
//   moving:          upshift above upshiftFraction · redline,
//                    downshift below downshiftFraction · idle
// ==============================================================================

use crate::controls::VehicleInput;
use crate::spec::{TransmissionMode, VehicleSpec};
use crate::state::GearboxState;

/// Below this |speed| (m/s) automatic mode may pass through N/R.
const STANDSTILL_SPEED: f32 = 1.0;
const PEDAL_THRESHOLD: f32 = 0.1;

/// "R", "N", "1".."n".
pub fn gear_display(spec: &VehicleSpec, gear_index: usize) -> String {
    let neutral = spec.neutral_index();
    match gear_index {
        i if i < neutral => "R".to_string(),
        i if i == neutral => "N".to_string(),
        i => (i - neutral).to_string(),
    }
}

impl GearboxState {
    #[inline]
    pub fn ratio(&self, spec: &VehicleSpec) -> f32 {
        spec.transmission.gear_ratios.get(self.gear_index).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn is_neutral(&self, spec: &VehicleSpec) -> bool {
        self.ratio(spec) == 0.0
    }

    #[inline]
    pub fn is_reverse(&self, spec: &VehicleSpec) -> bool {
        self.ratio(spec) < 0.0
    }

    /// Try to engage `target`. Returns whether the request was accepted.
    pub fn request_gear(&mut self, spec: &VehicleSpec, target: usize) -> bool {
        if self.is_shifting || target == self.gear_index || target > spec.top_gear_index() {
            return false;
        }
        log::debug!(
            "shift {} -> {}",
            gear_display(spec, self.gear_index),
            gear_display(spec, target)
        );
        self.gear_index = target;
        self.shift_timer = spec.transmission.shift_time;
        self.is_shifting = self.shift_timer > 0.0;
        self.wheel_torque = 0.0;
        true
    }

    pub fn shift_up(&mut self, spec: &VehicleSpec) -> bool {
        self.request_gear(spec, self.gear_index + 1)
    }

    pub fn shift_down(&mut self, spec: &VehicleSpec) -> bool {
        match self.gear_index.checked_sub(1) {
            Some(target) => self.request_gear(spec, target),
            None => false,
        }
    }

    /// Edge-triggered manual requests, then automatic logic when enabled.
    pub fn apply_requests(
        &mut self,
        spec: &VehicleSpec,
        input: &VehicleInput,
        speed: f32,
        wheel_engine_rpm: f32,
    ) {
        if input.shift_up {
            self.shift_up(spec);
        } else if input.shift_down {
            self.shift_down(spec);
        }
        if spec.transmission.mode == TransmissionMode::Automatic {
            self.automatic(spec, input, speed, wheel_engine_rpm);
        }
    }

    fn automatic(&mut self, spec: &VehicleSpec, input: &VehicleInput, speed: f32, wheel_engine_rpm: f32) {
        if self.is_shifting {
            return;
        }
        let t = &spec.transmission;
        let e = &spec.engine;
        let neutral = spec.neutral_index();
        let first = spec.first_gear_index();

        if speed.abs() < STANDSTILL_SPEED {
            let throttle = input.throttle > PEDAL_THRESHOLD;
            let braking = input.brake > PEDAL_THRESHOLD && input.throttle <= PEDAL_THRESHOLD;
            if throttle && self.gear_index <= neutral {
                self.request_gear(spec, first);
                return;
            }
            if braking && (self.gear_index == neutral || self.gear_index == first) {
                self.request_gear(spec, 0);
                return;
            }
        }

        if self.gear_index < first {
            return;
        }
        if wheel_engine_rpm > t.upshift_fraction * e.redline_rpm && self.gear_index < spec.top_gear_index() {
            self.shift_up(spec);
        } else if wheel_engine_rpm < t.downshift_fraction * e.idle_rpm && self.gear_index > first {
            self.shift_down(spec);
        }
    }

    /// Count down an in-progress shift.
    pub fn tick_shift(&mut self, dt: f32) {
        if !self.is_shifting {
            return;
        }
        self.shift_timer -= dt;
        if self.shift_timer <= 0.0 {
            self.shift_timer = 0.0;
            self.is_shifting = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn first_gear(spec: &VehicleSpec) -> GearboxState {
        GearboxState::new(spec.first_gear_index(), spec.engine.idle_rpm)
    }

    fn finish_shift(g: &mut GearboxState) {
        for _ in 0..100 {
            g.tick_shift(1.0 / 60.0);
        }
    }

    #[test]
    fn display_names() {
        let spec = VehicleSpec::default();
        let names: Vec<_> = (0..spec.transmission.gear_ratios.len())
            .map(|i| gear_display(&spec, i))
            .collect();
        assert_eq!(names, ["R", "N", "1", "2", "3", "4", "5", "6"]);
    }

    #[test]
    fn shift_up_is_ignored_while_shifting() {
        let spec = VehicleSpec::default();
        let mut g = first_gear(&spec);
        assert!(g.shift_up(&spec));
        assert!(g.is_shifting);
        assert_eq!(g.gear_index, 3);
        assert!(!g.shift_up(&spec));
        assert_eq!(g.gear_index, 3);
    }

    #[test]
    fn shift_bounds_hold() {
        let spec = VehicleSpec::default();
        let mut g = GearboxState::new(0, spec.engine.idle_rpm);
        assert!(!g.shift_down(&spec));

        let mut g = GearboxState::new(spec.top_gear_index(), spec.engine.idle_rpm);
        assert!(!g.shift_up(&spec));
        assert_eq!(g.gear_index, spec.top_gear_index());
    }

    #[test]
    fn timer_releases_shift() {
        let spec = VehicleSpec::default();
        let mut g = first_gear(&spec);
        g.shift_up(&spec);
        let ticks = (spec.transmission.shift_time * 60.0).ceil() as usize;
        for _ in 0..ticks - 1 {
            g.tick_shift(1.0 / 60.0);
            assert!(g.is_shifting);
        }
        finish_shift(&mut g);
        assert!(!g.is_shifting);
        assert_eq!(g.shift_timer, 0.0);
    }

    #[test]
    fn automatic_pulls_away_and_reverses_at_standstill() {
        let mut spec = VehicleSpec::default();
        spec.transmission.mode = TransmissionMode::Automatic;

        let mut g = GearboxState::new(spec.neutral_index(), spec.engine.idle_rpm);
        g.apply_requests(&spec, &VehicleInput::throttle(1.0), 0.0, 0.0);
        assert_eq!(gear_display(&spec, g.gear_index), "1");

        finish_shift(&mut g);
        g.apply_requests(&spec, &VehicleInput::brake(1.0), 0.2, 0.0);
        assert_eq!(gear_display(&spec, g.gear_index), "R");

        finish_shift(&mut g);
        g.apply_requests(&spec, &VehicleInput::throttle(0.5), -0.3, 0.0);
        assert_eq!(gear_display(&spec, g.gear_index), "1");
    }

    #[test]
    fn automatic_shifts_on_rpm_thresholds() {
        let mut spec = VehicleSpec::default();
        spec.transmission.mode = TransmissionMode::Automatic;
        let mut g = first_gear(&spec);

        g.apply_requests(&spec, &VehicleInput::throttle(1.0), 15.0, 0.95 * spec.engine.redline_rpm);
        assert_eq!(g.gear_index, spec.first_gear_index() + 1);

        finish_shift(&mut g);
        g.apply_requests(&spec, &VehicleInput::default(), 4.0, spec.engine.idle_rpm);
        assert_eq!(g.gear_index, spec.first_gear_index());

        // never below first while rolling
        finish_shift(&mut g);
        g.apply_requests(&spec, &VehicleInput::default(), 4.0, spec.engine.idle_rpm);
        assert_eq!(g.gear_index, spec.first_gear_index());
    }

    #[test]
    fn manual_mode_ignores_automatic_rules() {
        let spec = VehicleSpec::default();
        let mut g = first_gear(&spec);
        g.apply_requests(&spec, &VehicleInput::throttle(1.0), 15.0, spec.engine.redline_rpm);
        assert_eq!(g.gear_index, spec.first_gear_index());
        assert!(!g.is_shifting);
    }
}
