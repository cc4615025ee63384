use std::fmt;

use serde::{Deserialize, Serialize};

/// The 12 pitch classes, spelled with sharps only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteName {
    C,
    #[serde(rename = "C#")]
    Cs,
    D,
    #[serde(rename = "D#")]
    Ds,
    E,
    F,
    #[serde(rename = "F#")]
    Fs,
    G,
    #[serde(rename = "G#")]
    Gs,
    A,
    #[serde(rename = "A#")]
    As,
    B,
}

impl NoteName {
    /// Chromatic order, index == pitch class.
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::Cs,
        NoteName::D,
        NoteName::Ds,
        NoteName::E,
        NoteName::F,
        NoteName::Fs,
        NoteName::G,
        NoteName::Gs,
        NoteName::A,
        NoteName::As,
        NoteName::B,
    ];

    pub fn pitch_class(self) -> u8 {
        self as u8
    }

    pub fn from_pitch_class(pc: u8) -> Self {
        NoteName::ALL[(pc % 12) as usize]
    }

    // Sharps only; flats are not part of the accepted spelling.
    pub fn parse(s: &str) -> Option<Self> {
        let name = match s {
            "C" => NoteName::C,
            "C#" => NoteName::Cs,
            "D" => NoteName::D,
            "D#" => NoteName::Ds,
            "E" => NoteName::E,
            "F" => NoteName::F,
            "F#" => NoteName::Fs,
            "G" => NoteName::G,
            "G#" => NoteName::Gs,
            "A" => NoteName::A,
            "A#" => NoteName::As,
            "B" => NoteName::B,
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NoteName::C => "C",
            NoteName::Cs => "C#",
            NoteName::D => "D",
            NoteName::Ds => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::Fs => "F#",
            NoteName::G => "G",
            NoteName::Gs => "G#",
            NoteName::A => "A",
            NoteName::As => "A#",
            NoteName::B => "B",
        };
        write!(f, "{}", s)
    }
}

/// A concrete pitch: note name plus octave number ("E4" style).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PitchedNote {
    pub name: NoteName,
    pub octave: i8,
}

impl PitchedNote {
    pub fn new(name: NoteName, octave: i8) -> Self {
        Self { name, octave }
    }

    /// Equal temperament, A4 = 440 Hz.
    pub fn frequency(self) -> f32 {
        let midi = (self.octave as i32 + 1) * 12 + self.name.pitch_class() as i32;
        440.0 * 2f32.powf((midi - 69) as f32 / 12.0)
    }
}

impl fmt::Display for PitchedNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chromatic_table_round_trips() {
        for (i, n) in NoteName::ALL.iter().enumerate() {
            assert_eq!(n.pitch_class() as usize, i);
            assert_eq!(NoteName::from_pitch_class(i as u8), *n);
            assert_eq!(NoteName::parse(&n.to_string()), Some(*n));
        }
    }

    #[test]
    fn parse_rejects_flats_and_garbage() {
        assert_eq!(NoteName::parse("Db"), None);
        assert_eq!(NoteName::parse("H"), None);
        assert_eq!(NoteName::parse(""), None);
    }

    #[test]
    fn reference_frequencies() {
        let a4 = PitchedNote::new(NoteName::A, 4).frequency();
        assert!((a4 - 440.0).abs() < 0.01);
        let c4 = PitchedNote::new(NoteName::C, 4).frequency();
        assert!((c4 - 261.63).abs() < 0.05);
        // octave doubles
        let a5 = PitchedNote::new(NoteName::A, 5).frequency();
        assert!((a5 - 880.0).abs() < 0.01);
    }

    #[test]
    fn pitched_note_display() {
        assert_eq!(PitchedNote::new(NoteName::Fs, 3).to_string(), "F#3");
    }
}
