//! Status reporting events and their line formats.

use core::fmt::Write;

use heapless::String;

use crate::command::MELODY_MAX;

/// Longest formatted report line.
pub const LINE_MAX: usize = 96;

/// One unit of asynchronous status information.
///
/// Events carry their payload at the moment they are posted, are queued
/// through the status mailbox, consumed exactly once by the reporter and
/// then discarded.
#[derive(Clone, Debug, PartialEq)]
pub enum StatusEvent {
    NonceFound(u32),
    KeyUpdated(u64),
    DutyUpdated(f32),
    HashRate(f32),
    Velocity(f32),
    MaxVelocity(f32),
    RotationTarget(f32),
    MelodyUpdated(String<MELODY_MAX>),
}

impl StatusEvent {
    /// Render the fixed single-line report for this event.
    pub fn format_line(&self) -> String<LINE_MAX> {
        let mut line = String::new();
        // LINE_MAX leaves ample headroom; an overflow only truncates.
        let _ = match self {
            StatusEvent::NonceFound(nonce) => write!(line, "nonce: {nonce}\r\n"),
            StatusEvent::KeyUpdated(key) => write!(line, "new key: {key}\r\n"),
            StatusEvent::DutyUpdated(duty) => write!(line, "duty cycle: {duty}\r\n"),
            StatusEvent::HashRate(rate) => write!(line, "hash rate: {rate}\r\n"),
            StatusEvent::Velocity(v) => write!(line, "velocity: {v}\r\n"),
            StatusEvent::MaxVelocity(v) => write!(line, "max velocity: {v}\r\n"),
            StatusEvent::RotationTarget(r) => {
                write!(line, "rotations target: {r}\r\n")
            }
            StatusEvent::MelodyUpdated(m) => write!(line, "melody: {m}\r\n"),
        };
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_fixed_format_per_kind() {
        assert_eq!(
            StatusEvent::NonceFound(42).format_line().as_str(),
            "nonce: 42\r\n"
        );
        assert_eq!(
            StatusEvent::KeyUpdated(7).format_line().as_str(),
            "new key: 7\r\n"
        );
        assert_eq!(
            StatusEvent::DutyUpdated(0.25).format_line().as_str(),
            "duty cycle: 0.25\r\n"
        );
        assert_eq!(
            StatusEvent::Velocity(5.0).format_line().as_str(),
            "velocity: 5\r\n"
        );
        assert_eq!(
            StatusEvent::MaxVelocity(5.0).format_line().as_str(),
            "max velocity: 5\r\n"
        );
        assert_eq!(
            StatusEvent::RotationTarget(-3.5).format_line().as_str(),
            "rotations target: -3.5\r\n"
        );
    }

    #[test]
    fn melody_line_carries_the_string() {
        let mut melody: String<MELODY_MAX> = String::new();
        melody.push_str("A4G#2").unwrap();
        assert_eq!(
            StatusEvent::MelodyUpdated(melody).format_line().as_str(),
            "melody: A4G#2\r\n"
        );
    }

    #[test]
    fn lines_always_fit() {
        let mut melody: String<MELODY_MAX> = String::new();
        for _ in 0..MELODY_MAX {
            melody.push('G').unwrap();
        }
        let line = StatusEvent::MelodyUpdated(melody).format_line();
        assert!(line.ends_with("\r\n"));
    }
}
