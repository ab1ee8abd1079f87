//! PWM power output.
//!
//! One timer channel gates the drive power: its duty cycle is the torque
//! magnitude written by the control loop, and its period doubles as the
//! tone generator for the melody player.  A single `DutyOutput` owns both
//! registers; callers share it behind one mutex so the two writers can
//! never race.

use embassy_stm32::Peri;
use embassy_stm32::gpio::OutputType;
use embassy_stm32::peripherals::{PA5, TIM2};
use embassy_stm32::time::hz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};

/// PWM frequency while no tone is playing (2 ms period).
pub const DEFAULT_FREQ_HZ: u32 = 500;

/// Audible range accepted from the tone player.
const TONE_MIN_HZ: f32 = 20.0;
const TONE_MAX_HZ: f32 = 20_000.0;

pub struct DutyOutput<'d> {
    pwm: SimplePwm<'d, TIM2>,
    torque: f32,
}

impl<'d> DutyOutput<'d> {
    pub fn new(tim: impl Into<Peri<'d, TIM2>>, pin: impl Into<Peri<'d, PA5>>) -> Self {
        let ch1 = PwmPin::new(pin.into(), OutputType::PushPull);
        let mut pwm = SimplePwm::new(
            tim.into(),
            Some(ch1),
            None,
            None,
            None,
            hz(DEFAULT_FREQ_HZ),
            CountingMode::EdgeAlignedUp,
        );
        pwm.ch1().enable();

        defmt::info!(
            "duty output ready: {}Hz, max duty {}",
            DEFAULT_FREQ_HZ,
            pwm.max_duty_cycle()
        );

        Self { pwm, torque: 0.0 }
    }

    /// Write a torque magnitude in [0.0, 1.0] to the duty register.
    pub fn set_torque(&mut self, torque: f32) {
        let torque = torque.clamp(0.0, 1.0);
        self.torque = torque;
        let max = self.pwm.max_duty_cycle() as f32;
        self.pwm.ch1().set_duty_cycle((torque * max) as u16);
    }

    /// Retune the PWM period for a tone.  The torque duty fraction is
    /// reapplied against the new period.
    pub fn set_period_for(&mut self, freq: f32) {
        let freq = freq.clamp(TONE_MIN_HZ, TONE_MAX_HZ) as u32;
        self.pwm.set_frequency(hz(freq));
        self.set_torque(self.torque);
    }

    /// Back to the default drive period after playback.
    pub fn restore_default_period(&mut self) {
        self.pwm.set_frequency(hz(DEFAULT_FREQ_HZ));
        self.set_torque(self.torque);
    }
}
