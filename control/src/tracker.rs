//! Ordinal tracking of hall sector transitions.

use crate::rotor::Sector;

/// Result of observing one sensor edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    /// Step-counter increment: +1 when the sector ordinal grew, -1 when it
    /// shrank, 0 when unchanged.
    pub delta: i8,
    /// Whether the commutation output must be re-driven.
    pub changed: bool,
}

/// Classifies each decoded sector against the previous one.
///
/// Direction comes from ordinal adjacency alone: a wrap from sector 5 to
/// sector 0 counts as a single backward step.  This is a known
/// approximation carried over from the drive this replaces; revolutions
/// are derived downstream as steps / 6.
pub struct PositionTracker {
    last: Sector,
}

impl PositionTracker {
    /// Seed with the sector observed at homing so the first edge after
    /// start-up is counted relative to the rest position.
    pub const fn new(origin: Sector) -> Self {
        Self { last: origin }
    }

    pub fn observe(&mut self, state: Sector) -> Step {
        let delta = if state.index() > self.last.index() {
            1
        } else if state.index() < self.last.index() {
            -1
        } else {
            0
        };
        let changed = state != self.last;
        self.last = state;
        Step { delta, changed }
    }
}
