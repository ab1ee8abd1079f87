//! Serial command parsing.
//!
//! One command per line.  The first byte is the command tag, the rest of
//! the line is a fixed-format argument.  Unknown tags and malformed
//! arguments both yield `None`; the dispatcher treats that as a silent
//! no-op and keeps the previous parameter value.

use heapless::String;

/// Longest melody string accepted by the `T` command.
pub const MELODY_MAX: usize = 48;

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// `K<hex64>` - key material for the nonce search.
    SetKey(u64),
    /// `M<float>` - direct duty override.
    SetDuty(f32),
    /// `H` - report the current hash rate.
    ReportHashRate,
    /// `S` - status ping.
    ReportStatus,
    /// `V<float>` - target velocity in revolutions per second.
    SetVelocity(f32),
    /// `R<float>` - target rotation count.
    SetRotations(f32),
    /// `T<string>` - melody to play.
    SetMelody(String<MELODY_MAX>),
}

/// Parse one assembled command line.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() || !line.is_ascii() {
        return None;
    }
    let rest = line[1..].trim();
    match line.as_bytes()[0] {
        b'K' => u64::from_str_radix(rest, 16).ok().map(Command::SetKey),
        b'M' => rest.parse().ok().map(Command::SetDuty),
        b'H' => Some(Command::ReportHashRate),
        b'S' => Some(Command::ReportStatus),
        b'V' => rest.parse().ok().map(Command::SetVelocity),
        b'R' => rest.parse().ok().map(Command::SetRotations),
        b'T' => {
            if rest.is_empty() {
                return None;
            }
            let mut melody = String::new();
            melody.push_str(rest).ok()?;
            Some(Command::SetMelody(melody))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_tag() {
        assert_eq!(parse("KDEADBEEF"), Some(Command::SetKey(0xDEAD_BEEF)));
        assert_eq!(parse("M0.5"), Some(Command::SetDuty(0.5)));
        assert_eq!(parse("H"), Some(Command::ReportHashRate));
        assert_eq!(parse("S"), Some(Command::ReportStatus));
        assert_eq!(parse("V5.0"), Some(Command::SetVelocity(5.0)));
        assert_eq!(parse("R-3"), Some(Command::SetRotations(-3.0)));
        let Some(Command::SetMelody(m)) = parse("TA4C#2") else {
            panic!("melody did not parse");
        };
        assert_eq!(m.as_str(), "A4C#2");
    }

    #[test]
    fn parsing_is_repeatable() {
        assert_eq!(parse("V5.0"), parse("V5.0"));
    }

    #[test]
    fn key_accepts_up_to_64_bits() {
        assert_eq!(
            parse("KFFFFFFFFFFFFFFFF"),
            Some(Command::SetKey(u64::MAX))
        );
        // 17 hex digits overflow and are rejected.
        assert_eq!(parse("K10000000000000000"), None);
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        assert_eq!(parse("M"), None);
        assert_eq!(parse("Mfast"), None);
        assert_eq!(parse("K"), None);
        assert_eq!(parse("KXYZ"), None);
        assert_eq!(parse("V"), None);
        assert_eq!(parse("T"), None);
    }

    #[test]
    fn unknown_tags_and_noise_are_ignored() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("X1.0"), None);
        assert_eq!(parse("\u{fffd}"), None);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(parse("  V2.5  "), Some(Command::SetVelocity(2.5)));
        assert_eq!(parse("M 0.25"), Some(Command::SetDuty(0.25)));
    }
}
