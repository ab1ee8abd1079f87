//! Cascaded position/velocity torque controller.
//!
//! Runs once per 100 ms tick.  The tick turns the shared step count into a
//! speed estimate, picks one of three regimes depending on which setpoints
//! are active, and produces a torque duty in [0, 1] plus the commutation
//! lead carrying its sign.

use libm::fabsf;

use crate::commutation::Lead;

/// Proportional gain on position error (rotations).
pub const KP_ROTATION: f32 = 30.0;
/// Derivative gain on position error.
pub const KD_ROTATION: f32 = 20.0;
/// Proportional gain on speed error.
pub const KP_SPEED: f32 = 0.08;
/// Constant feed term of the speed law.  The bench firmware this drive
/// replaces declared 0.001 for this constant but shipped 0.62; the motor
/// was tuned against the shipped value, so that is what is kept.
pub const KI_SPEED: f32 = 0.62;

/// Controller ticks per second.
pub const TICK_HZ: f32 = 10.0;
/// Velocity report cadence, in ticks.
pub const REPORT_EVERY: u32 = 10;

/// Hall steps per mechanical revolution.
const STEPS_PER_REV: f32 = 6.0;

/// Shared setpoints sampled once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Setpoints {
    /// Target speed in revolutions per second; 0 disables the speed loop.
    pub velocity: f32,
    /// Target rotation count; 0 disables the position loop.
    pub rotations: f32,
}

/// One tick's worth of controller output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickOutput {
    /// PWM duty magnitude in [0.0, 1.0].
    pub duty: f32,
    /// Commutation lead carrying the sign of the demanded torque.
    pub lead: Lead,
    /// Speed estimate for this tick, revolutions per second.
    pub velocity: f32,
    /// Set every `REPORT_EVERY` ticks; the caller posts a velocity report.
    pub report_velocity: bool,
    /// Set when the rotation target changed; the caller must zero the
    /// shared step counter before the next tick.
    pub reset_counter: bool,
}

/// State retained across ticks.
pub struct MotionController {
    prev_revs: f32,
    prev_position_error: f32,
    rotation_baseline: f32,
    tick: u32,
}

impl MotionController {
    pub const fn new() -> Self {
        Self {
            prev_revs: 0.0,
            prev_position_error: 0.0,
            rotation_baseline: 0.0,
            tick: 0,
        }
    }

    /// Run one control tick over the latest step count and setpoints.
    pub fn update(&mut self, steps: i32, setpoints: Setpoints) -> TickOutput {
        let mut revs = steps as f32 / STEPS_PER_REV;
        let velocity = (revs - self.prev_revs) * TICK_HZ;

        self.tick += 1;
        let report_velocity = self.tick >= REPORT_EVERY;
        if report_velocity {
            self.tick = 0;
        }

        // A new rotation target restarts position tracking from the moment
        // the command was issued.  The speed estimate above is taken before
        // the restart; zeroing prev_revs keeps the next estimate clean.
        let reset_counter = setpoints.rotations != self.rotation_baseline;
        if reset_counter {
            self.rotation_baseline = setpoints.rotations;
            revs = 0.0;
        }
        self.prev_revs = revs;

        let position_error = setpoints.rotations - revs;
        let speed_error = setpoints.velocity - fabsf(velocity);
        let error_derivative = position_error - self.prev_position_error;
        self.prev_position_error = position_error;
        let sign = if velocity < 0.0 { -1.0 } else { 1.0 };

        let torque = if setpoints.velocity == 0.0 {
            if setpoints.rotations == 0.0 {
                // No targets: drive flat out.
                1.0
            } else {
                KP_ROTATION * position_error + KD_ROTATION * error_derivative
            }
        } else if setpoints.rotations == 0.0 {
            (KP_SPEED * speed_error + KI_SPEED) * sign
        } else {
            let speed_torque = (KP_SPEED * speed_error + KI_SPEED) * sign;
            let position_torque =
                KP_ROTATION * position_error + KD_ROTATION * error_derivative;
            // Both loops active.  Rotating forward the weaker demand wins;
            // rotating backward the stronger one does.
            if sign > 0.0 {
                if speed_torque > position_torque {
                    position_torque
                } else {
                    speed_torque
                }
            } else if speed_torque > position_torque {
                speed_torque
            } else {
                position_torque
            }
        };

        let lead = if torque < 0.0 {
            Lead::Reverse
        } else {
            Lead::Forward
        };
        let duty = fabsf(torque).min(1.0);

        TickOutput {
            duty,
            lead,
            velocity,
            report_velocity,
            reset_counter,
        }
    }
}

impl Default for MotionController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            fabsf(actual - expected) < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn no_targets_means_full_torque() {
        let mut ctl = MotionController::new();
        let out = ctl.update(0, Setpoints::default());
        assert_close(out.duty, 1.0);
        assert_eq!(out.lead, Lead::Forward);
        assert!(!out.reset_counter);
    }

    #[test]
    fn rotation_regime_is_pd_on_position_error() {
        let mut ctl = MotionController::new();
        let sp = Setpoints {
            velocity: 0.0,
            rotations: 0.01,
        };
        // First tick: error 0.01, derivative 0.01.
        let out = ctl.update(0, sp);
        assert!(out.reset_counter);
        assert_close(out.duty, 30.0 * 0.01 + 20.0 * 0.01);
        assert_eq!(out.lead, Lead::Forward);
        // Second tick: same error, derivative 0.
        let out = ctl.update(0, sp);
        assert!(!out.reset_counter);
        assert_close(out.duty, 30.0 * 0.01);
    }

    #[test]
    fn speed_regime_uses_the_shipped_constant_and_signs_by_velocity() {
        let sp = Setpoints {
            velocity: 5.0,
            rotations: 0.0,
        };

        // 3 steps in one tick = 0.5 rev = 5 rev/s: zero speed error.
        let mut ctl = MotionController::new();
        let out = ctl.update(3, sp);
        assert_close(out.velocity, 5.0);
        assert_close(out.duty, KI_SPEED);
        assert_eq!(out.lead, Lead::Forward);

        // Same speed backwards: same magnitude, reverse lead.
        let mut ctl = MotionController::new();
        let out = ctl.update(-3, sp);
        assert_close(out.velocity, -5.0);
        assert_close(out.duty, KI_SPEED);
        assert_eq!(out.lead, Lead::Reverse);
    }

    #[test]
    fn combined_regime_takes_the_weaker_demand_going_forward() {
        let mut ctl = MotionController::new();
        let sp = Setpoints {
            velocity: 5.0,
            rotations: 0.01,
        };
        // Speed torque 0.08 * 5 + 0.62 = 1.02, position torque 0.5.
        let out = ctl.update(0, sp);
        assert_close(out.duty, 0.5);
        assert_eq!(out.lead, Lead::Forward);
    }

    #[test]
    fn combined_regime_takes_the_stronger_demand_going_backward() {
        let mut ctl = MotionController::new();
        let sp = Setpoints {
            velocity: 5.0,
            rotations: 0.01,
        };
        ctl.update(0, sp);
        // Overshoot past the target at +10 rev/s.
        let out = ctl.update(6, sp);
        assert_eq!(out.lead, Lead::Reverse);
        assert_close(out.duty, 1.0);
        // Now coming back at -5 rev/s: speed torque -0.62 beats the
        // position torque of -4.7.
        let out = ctl.update(3, sp);
        assert_close(out.velocity, -5.0);
        assert_close(out.duty, KI_SPEED);
        assert_eq!(out.lead, Lead::Reverse);
    }

    #[test]
    fn duty_is_always_clamped_to_unit_range() {
        let mut ctl = MotionController::new();
        let sp = Setpoints {
            velocity: 0.0,
            rotations: 100.0,
        };
        for steps in [0, 60, 600, -600, 6000] {
            let out = ctl.update(steps, sp);
            assert!((0.0..=1.0).contains(&out.duty));
        }
    }

    #[test]
    fn converges_toward_a_rotation_target() {
        let mut ctl = MotionController::new();
        let sp = Setpoints {
            velocity: 0.0,
            rotations: 10.0,
        };
        ctl.update(0, sp);
        // Counter was reset; rotor now advances 2 revolutions per tick.
        for steps in [12, 24, 36, 48] {
            let out = ctl.update(steps, sp);
            assert_close(out.duty, 1.0);
            assert_eq!(out.lead, Lead::Forward);
        }
        // On target with 2 rev/s of residual speed: the derivative term
        // demands braking torque.
        let out = ctl.update(60, sp);
        assert_eq!(out.lead, Lead::Reverse);
    }

    #[test]
    fn velocity_report_every_tenth_tick() {
        let mut ctl = MotionController::new();
        for round in 0..3 {
            for tick in 1..=REPORT_EVERY {
                let out = ctl.update(0, Setpoints::default());
                assert_eq!(
                    out.report_velocity,
                    tick == REPORT_EVERY,
                    "round {round} tick {tick}"
                );
            }
        }
    }

    #[test]
    fn target_change_resets_tracking_without_a_velocity_spike() {
        let mut ctl = MotionController::new();
        let sp = Setpoints {
            velocity: 0.0,
            rotations: 5.0,
        };
        let out = ctl.update(600, sp);
        assert!(out.reset_counter);
        // The caller zeroed the counter; no phantom speed next tick.
        let out = ctl.update(0, sp);
        assert!(!out.reset_counter);
        assert_close(out.velocity, 0.0);
    }
}
