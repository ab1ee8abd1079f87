//! Sector to phase-output mapping.
//!
//! Each drive state energises two of the three phases, one through its
//! high-side transistor and one through its low-side transistor; the third
//! phase floats.  The pattern application discipline is break-before-make:
//! lines are released before new ones are asserted so both transistors of
//! a phase can never conduct at once.

use crate::rotor::Sector;

/// Rotation direction expressed as a commutation phase lead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lead {
    Forward,
    Reverse,
}

impl Lead {
    /// Angular advance in sectors applied to the commutation lookup.
    pub const fn offset(self) -> i8 {
        match self {
            Lead::Forward => 2,
            Lead::Reverse => -2,
        }
    }
}

/// Packed six-line gate drive pattern.
///
/// Bit layout: `0x01` A low, `0x02` A high, `0x04` B low, `0x08` B high,
/// `0x10` C low, `0x20` C high.  A set bit means the line conducts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhasePattern(u8);

/// Number of gate lines in a pattern.
pub const LINE_COUNT: usize = 6;

impl PhasePattern {
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether gate line `line` (0..6, in bit-layout order) conducts.
    pub const fn is_set(self, line: usize) -> bool {
        self.0 >> line & 1 != 0
    }

    /// High-side and low-side state for phase 0..3.
    pub const fn phase(self, phase: usize) -> (bool, bool) {
        (self.is_set(phase * 2 + 1), self.is_set(phase * 2))
    }
}

/// Sector to gate pattern.  Sector 0 drives phase A high and phase C low,
/// then the pattern rotates one phase per sector.
const DRIVE_TABLE: [PhasePattern; 6] = [
    PhasePattern(0x12), // A high, C low
    PhasePattern(0x18), // B high, C low
    PhasePattern(0x09), // B high, A low
    PhasePattern(0x21), // C high, A low
    PhasePattern(0x24), // C high, B low
    PhasePattern(0x06), // A high, B low
];

/// Raw table entry for a sector, with no offsets applied.  Used by the
/// homing routine to park the rotor at the reference state.
pub const fn pattern_for(sector: Sector) -> PhasePattern {
    DRIVE_TABLE[sector.index() as usize]
}

/// Commutation lookup for a decoded rotor state.
///
/// `origin` is the sector recorded at homing and `lead` the signed phase
/// advance (`Lead::offset`); the difference is wrapped into 0..6 before
/// the table lookup.
pub fn drive_pattern(state: Sector, origin: Sector, lead: i8) -> PhasePattern {
    let sector = (state.index() as i8 - origin.index() as i8 + lead).rem_euclid(6);
    DRIVE_TABLE[sector as usize]
}
