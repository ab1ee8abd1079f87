//! Hall-sensor rotor state decoding.

/// One of the six 60-degree electrical sectors reported by the hall
/// sensors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sector(u8);

impl Sector {
    /// Number of sectors per electrical cycle.
    pub const COUNT: u8 = 6;

    /// The reference drive state used for homing.
    pub const ZERO: Sector = Sector(0);

    pub const fn new(index: u8) -> Option<Sector> {
        if index < Self::COUNT {
            Some(Sector(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> u8 {
        self.0
    }
}

/// Hall triple to sector map, indexed by `h1 | h2 << 1 | h3 << 2`.
///
/// 0b000 and 0b111 cannot be produced by a working sensor set and have no
/// sector; callers must not drive the motor from them, so the previously
/// applied pattern stays latched.
const SECTOR_MAP: [Option<Sector>; 8] = [
    None,
    Some(Sector(5)),
    Some(Sector(3)),
    Some(Sector(4)),
    Some(Sector(1)),
    Some(Sector(0)),
    Some(Sector(2)),
    None,
];

/// Decode the three hall lines into a commutation sector.
pub const fn decode(h1: bool, h2: bool, h3: bool) -> Option<Sector> {
    SECTOR_MAP[(h1 as usize) | (h2 as usize) << 1 | (h3 as usize) << 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_bits(bits: u8) -> Option<Sector> {
        decode(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0)
    }

    #[test]
    fn every_valid_triple_decodes_to_a_sector() {
        for bits in 1..7 {
            let sector = decode_bits(bits).unwrap();
            assert!(sector.index() < Sector::COUNT);
        }
    }

    #[test]
    fn unreachable_triples_have_no_sector() {
        assert_eq!(decode_bits(0b000), None);
        assert_eq!(decode_bits(0b111), None);
    }

    #[test]
    fn valid_triples_cover_all_six_sectors() {
        let mut seen = [false; 6];
        for bits in 1..7 {
            seen[decode_bits(bits).unwrap().index() as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn sector_constructor_rejects_out_of_range() {
        assert!(Sector::new(5).is_some());
        assert!(Sector::new(6).is_none());
    }
}
