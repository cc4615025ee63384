use std::fmt;

use serde::{Deserialize, Serialize};

/// The 8 supported modal patterns. Each is 8 semitone offsets from the
/// root, first 0 and last 12 (the octave repeat).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    HarmonicMinor,
}

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::Ionian,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Aeolian,
        Mode::Locrian,
        Mode::HarmonicMinor,
    ];

    /// Primary offset table.
    pub fn offsets(self) -> [u8; 8] {
        match self {
            Mode::Ionian => [0, 2, 4, 5, 7, 9, 11, 12],
            Mode::Dorian => [0, 2, 3, 5, 7, 9, 10, 12],
            Mode::Phrygian => [0, 1, 3, 5, 7, 8, 10, 12],
            Mode::Lydian => [0, 2, 4, 6, 7, 9, 11, 12],
            Mode::Mixolydian => [0, 2, 4, 5, 7, 9, 10, 12],
            Mode::Aeolian => [0, 2, 3, 5, 7, 8, 10, 12],
            Mode::Locrian => [0, 1, 3, 5, 6, 8, 10, 12],
            Mode::HarmonicMinor => [0, 2, 3, 5, 7, 8, 11, 12],
        }
    }

    /// Whole/half-step pattern between adjacent scale tones.
    pub fn steps(self) -> [u8; 7] {
        match self {
            Mode::Ionian => [2, 2, 1, 2, 2, 2, 1],
            Mode::Dorian => [2, 1, 2, 2, 2, 1, 2],
            Mode::Phrygian => [1, 2, 2, 2, 1, 2, 2],
            Mode::Lydian => [2, 2, 2, 1, 2, 2, 1],
            Mode::Mixolydian => [2, 2, 1, 2, 2, 1, 2],
            Mode::Aeolian => [2, 1, 2, 2, 1, 2, 2],
            Mode::Locrian => [1, 2, 2, 1, 2, 2, 2],
            Mode::HarmonicMinor => [2, 1, 2, 2, 1, 3, 1],
        }
    }

    /// Fallback path: rebuild the offsets by accumulating the step
    /// pattern. Must agree with `offsets()` for every mode.
    pub fn offsets_from_steps(self) -> [u8; 8] {
        let steps = self.steps();
        let mut out = [0u8; 8];
        for i in 0..7 {
            out[i + 1] = out[i] + steps[i];
        }
        out
    }

    pub fn parse(s: &str) -> Option<Self> {
        let mode = match s {
            "ionian" => Mode::Ionian,
            "dorian" => Mode::Dorian,
            "phrygian" => Mode::Phrygian,
            "lydian" => Mode::Lydian,
            "mixolydian" => Mode::Mixolydian,
            "aeolian" => Mode::Aeolian,
            "locrian" => Mode::Locrian,
            "harmonic-minor" => Mode::HarmonicMinor,
            _ => return None,
        };
        Some(mode)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Ionian => "ionian",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Aeolian => "aeolian",
            Mode::Locrian => "locrian",
            Mode::HarmonicMinor => "harmonic-minor",
        };
        write!(f, "{}", s)
    }
}
