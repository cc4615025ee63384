use std::fmt;

use serde::{Deserialize, Serialize};

use super::note::{NoteName, PitchedNote};

/// How many scale tones get stacked on a degree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordDensity {
    Single,
    Triad,
    Seventh,
    Extended,
}

impl ChordDensity {
    pub const ALL: [ChordDensity; 4] = [
        ChordDensity::Single,
        ChordDensity::Triad,
        ChordDensity::Seventh,
        ChordDensity::Extended,
    ];

    pub fn tone_count(self) -> usize {
        match self {
            ChordDensity::Single => 1,
            ChordDensity::Triad => 3,
            ChordDensity::Seventh => 4,
            ChordDensity::Extended => 5,
        }
    }

    // Every-other-tone stacking within the 7-note cycle. The extended
    // 9th is handled separately since it always sits an octave up.
    fn stack(self) -> &'static [usize] {
        match self {
            ChordDensity::Single => &[0],
            ChordDensity::Triad => &[0, 2, 4],
            ChordDensity::Seventh => &[0, 2, 4, 6],
            ChordDensity::Extended => &[0, 2, 4, 6],
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let d = match s {
            "single" => ChordDensity::Single,
            "triad" => ChordDensity::Triad,
            "seventh" => ChordDensity::Seventh,
            "extended" => ChordDensity::Extended,
            _ => return None,
        };
        Some(d)
    }
}

impl fmt::Display for ChordDensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChordDensity::Single => "single",
            ChordDensity::Triad => "triad",
            ChordDensity::Seventh => "seventh",
            ChordDensity::Extended => "extended",
        };
        write!(f, "{}", s)
    }
}

/// Diatonic chord tones for a scale degree. Degrees outside 0..=7 yield
/// an empty set ("no sound"), never an error.
///
/// Each tone wraps independently: the octave bumps by one exactly when
/// the unwrapped sum `degree + interval` reaches past the 7-note cycle.
pub fn build_chord_notes(
    scale: &[NoteName; 8],
    degree: u8,
    density: ChordDensity,
    octave: i8,
) -> Vec<PitchedNote> {
    if degree > 7 {
        return Vec::new();
    }
    let cycle = &scale[..7];
    let mut notes = Vec::with_capacity(density.tone_count());
    for &interval in density.stack() {
        let sum = degree as usize + interval;
        let oct = if sum >= 7 { octave + 1 } else { octave };
        notes.push(PitchedNote::new(cycle[sum % 7], oct));
    }
    if density == ChordDensity::Extended {
        // The 9th always lies beyond the first octave.
        let sum = degree as usize + 1;
        notes.push(PitchedNote::new(cycle[sum % 7], octave + 1));
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::mode::Mode;
    use crate::theory::scale::resolve_scale;

    fn c_major() -> [NoteName; 8] {
        resolve_scale(NoteName::C, Mode::Ionian)
    }

    fn names(notes: &[PitchedNote]) -> Vec<String> {
        notes.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn tone_counts_and_root_match_single() {
        let scale = c_major();
        for degree in 0..=7u8 {
            let single = build_chord_notes(&scale, degree, ChordDensity::Single, 4);
            assert_eq!(single.len(), 1);
            for density in ChordDensity::ALL {
                let chord = build_chord_notes(&scale, degree, density, 4);
                assert_eq!(chord.len(), density.tone_count(), "degree {degree} {density}");
                assert_eq!(chord[0], single[0], "degree {degree} {density}");
            }
        }
    }

    #[test]
    fn out_of_range_degree_is_silent() {
        let scale = c_major();
        for density in ChordDensity::ALL {
            assert!(build_chord_notes(&scale, 8, density, 4).is_empty());
            assert!(build_chord_notes(&scale, 200, density, 4).is_empty());
        }
    }

    // Full triad wrap table in C major at octave 4. The wrap test is the
    // unwrapped sum per tone, not a running cumulative.
    #[test]
    fn triad_wrap_table() {
        let scale = c_major();
        let expected: [&[&str]; 8] = [
            &["C4", "E4", "G4"],
            &["D4", "F4", "A4"],
            &["E4", "G4", "B4"],
            &["F4", "A4", "C5"],
            &["G4", "B4", "D5"],
            &["A4", "C5", "E5"],
            &["B4", "D5", "F5"],
            &["C5", "E5", "G5"],
        ];
        for (degree, want) in expected.iter().enumerate() {
            let got = names(&build_chord_notes(&scale, degree as u8, ChordDensity::Triad, 4));
            assert_eq!(&got, want, "degree {degree}");
        }
    }

    #[test]
    fn seventh_wrap_table() {
        let scale = c_major();
        let expected: [&[&str]; 8] = [
            &["C4", "E4", "G4", "B4"],
            &["D4", "F4", "A4", "C5"],
            &["E4", "G4", "B4", "D5"],
            &["F4", "A4", "C5", "E5"],
            &["G4", "B4", "D5", "F5"],
            &["A4", "C5", "E5", "G5"],
            &["B4", "D5", "F5", "A5"],
            &["C5", "E5", "G5", "B5"],
        ];
        for (degree, want) in expected.iter().enumerate() {
            let got = names(&build_chord_notes(&scale, degree as u8, ChordDensity::Seventh, 4));
            assert_eq!(&got, want, "degree {degree}");
        }
    }

    #[test]
    fn extended_ninth_is_always_an_octave_up() {
        let scale = c_major();
        let expected: [&str; 8] = ["D5", "E5", "F5", "G5", "A5", "B5", "C5", "D5"];
        for (degree, want) in expected.iter().enumerate() {
            let chord = build_chord_notes(&scale, degree as u8, ChordDensity::Extended, 4);
            assert_eq!(chord.len(), 5);
            assert_eq!(chord[4].to_string(), *want, "degree {degree}");
        }
    }

    #[test]
    fn density_names_round_trip() {
        for d in ChordDensity::ALL {
            assert_eq!(ChordDensity::parse(&d.to_string()), Some(d));
        }
        assert_eq!(ChordDensity::parse("power-chord"), None);
    }
}
