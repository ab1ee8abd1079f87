//! Melody parsing for the auxiliary tone player.
//!
//! A melody string is a sequence of notes: a letter `A`-`G`, an optional
//! accidental (`^` flat, `#` sharp) and a single digit giving the duration
//! in beats.  The player renders each note by retuning the motor PWM
//! period.

use heapless::Vec;

/// Maximum notes kept from one melody string.
pub const NOTE_MAX: usize = 8;

/// Frequency used for anything outside the note table.
const DEFAULT_FREQ: f32 = 500.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Note {
    /// Tone frequency in hertz.
    pub freq: f32,
    /// Duration in beats.
    pub beats: u8,
}

/// Frequency for a note letter with an accidental (`' '` for natural).
pub fn note_frequency(note: char, accidental: char) -> f32 {
    match (note, accidental) {
        ('A', '^') => 415.30,
        ('A', ' ') => 440.00,
        ('A', '#') => 466.16,
        ('B', '^') => 466.16,
        ('B', ' ') => 493.88,
        ('C', ' ') => 523.25,
        ('C', '#') => 554.37,
        ('D', '^') => 554.37,
        ('D', ' ') => 587.33,
        ('D', '#') => 622.25,
        ('E', '^') => 622.25,
        ('E', ' ') => 659.25,
        ('F', ' ') => 698.46,
        ('F', '#') => 739.99,
        ('G', '^') => 739.99,
        ('G', ' ') => 783.99,
        ('G', '#') => 830.61,
        _ => DEFAULT_FREQ,
    }
}

/// Scan a melody string into notes.
///
/// Characters that do not start a note are skipped; a note without a
/// duration digit plays for one beat.
pub fn parse_melody(melody: &str) -> Vec<Note, NOTE_MAX> {
    let mut notes = Vec::new();
    let mut chars = melody.chars().peekable();
    while let Some(c) = chars.next() {
        if !('A'..='G').contains(&c) {
            continue;
        }
        let mut accidental = ' ';
        if let Some(&next) = chars.peek() {
            if next == '^' || next == '#' {
                accidental = next;
                chars.next();
            }
        }
        let beats = match chars.peek().copied().and_then(|d| d.to_digit(10)) {
            Some(d) => {
                chars.next();
                d as u8
            }
            None => 1,
        };
        if notes
            .push(Note {
                freq: note_frequency(c, accidental),
                beats,
            })
            .is_err()
        {
            break;
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accidentals_map_per_note() {
        assert_eq!(note_frequency('A', ' '), 440.00);
        assert_eq!(note_frequency('A', '^'), 415.30);
        assert_eq!(note_frequency('A', '#'), 466.16);
        assert_eq!(note_frequency('G', '#'), 830.61);
        // Pairs without a table entry fall back to the default tone.
        assert_eq!(note_frequency('B', '#'), 500.0);
        assert_eq!(note_frequency('X', ' '), 500.0);
    }

    #[test]
    fn scans_notes_with_durations() {
        let notes = parse_melody("A4C#2G^1");
        assert_eq!(
            notes.as_slice(),
            &[
                Note { freq: 440.00, beats: 4 },
                Note { freq: 554.37, beats: 2 },
                Note { freq: 739.99, beats: 1 },
            ]
        );
    }

    #[test]
    fn missing_duration_defaults_to_one_beat() {
        let notes = parse_melody("AB");
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.beats == 1));
    }

    #[test]
    fn junk_is_skipped() {
        let notes = parse_melody("x!A2 9 #B1");
        assert_eq!(
            notes.as_slice(),
            &[
                Note { freq: 440.00, beats: 2 },
                Note { freq: 493.88, beats: 1 },
            ]
        );
    }

    #[test]
    fn melody_is_capped_at_eight_notes() {
        let notes = parse_melody("A1B1C1D1E1F1G1A1B1C1");
        assert_eq!(notes.len(), NOTE_MAX);
    }
}
