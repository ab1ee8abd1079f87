//! Six-line gate drive output.

use embassy_stm32::gpio::Output;
use halldrive_control::commutation::{LINE_COUNT, PhasePattern};

/// The six gate-drive lines, one low-side and one high-side per phase, in
/// `PhasePattern` bit order: A low, A high, B low, B high, C low, C high.
///
/// Low-side drivers are active-high at the pin; high-side drivers are
/// active-low.  `apply` hides the polarity.
pub struct PhaseOutputs<'d> {
    lines: [Output<'d>; LINE_COUNT],
}

impl<'d> PhaseOutputs<'d> {
    pub fn new(lines: [Output<'d>; LINE_COUNT]) -> Self {
        Self { lines }
    }

    /// Break-before-make pattern application: every line the new pattern
    /// leaves off is released first, then the active lines are asserted.
    /// No intermediate state can conduct through both transistors of a
    /// phase.
    pub fn apply(&mut self, pattern: PhasePattern) {
        for (index, line) in self.lines.iter_mut().enumerate() {
            if !pattern.is_set(index) {
                Self::write(line, index, false);
            }
        }
        for (index, line) in self.lines.iter_mut().enumerate() {
            if pattern.is_set(index) {
                Self::write(line, index, true);
            }
        }
    }

    fn write(line: &mut Output<'d>, index: usize, active: bool) {
        // Odd indices are the active-low high-side lines.
        let active_low = index % 2 == 1;
        if active != active_low {
            line.set_high();
        } else {
            line.set_low();
        }
    }
}
