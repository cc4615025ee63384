use thiserror::Error;

use super::mode::Mode;
use super::note::NoteName;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TheoryError {
    #[error("invalid key \"{value}\" (valid: {valid})")]
    InvalidKey { value: String, valid: String },
    #[error("invalid mode \"{value}\" (valid: {valid})")]
    InvalidMode { value: String, valid: String },
}

pub fn parse_key(s: &str) -> Result<NoteName, TheoryError> {
    NoteName::parse(s).ok_or_else(|| TheoryError::InvalidKey {
        value: s.to_string(),
        valid: valid_list(NoteName::ALL.iter()),
    })
}

pub fn parse_mode(s: &str) -> Result<Mode, TheoryError> {
    Mode::parse(s).ok_or_else(|| TheoryError::InvalidMode {
        value: s.to_string(),
        valid: valid_list(Mode::ALL.iter()),
    })
}

fn valid_list<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(" ")
}

/// 8 note names from root to octave inclusive. Recomputed on every call;
/// nothing here is cached, so key/mode changes show up immediately.
pub fn resolve_scale(key: NoteName, mode: Mode) -> [NoteName; 8] {
    let offsets = usable_offsets(mode);
    let root = key.pitch_class();
    std::array::from_fn(|i| NoteName::from_pitch_class(root + offsets[i]))
}

// Primary path is the static table; if the table entry ever fails the
// shape check, fall through to the step-pattern derivation. Checked by
// value, never by unwinding.
fn usable_offsets(mode: Mode) -> [u8; 8] {
    let table = mode.offsets();
    if offsets_valid(&table) {
        table
    } else {
        mode.offsets_from_steps()
    }
}

fn offsets_valid(o: &[u8; 8]) -> bool {
    o[0] == 0 && o[7] == 12 && o.windows(2).all(|w| w[0] <= w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_ionian() {
        let scale = resolve_scale(NoteName::C, Mode::Ionian);
        let names: Vec<String> = scale.iter().map(|n| n.to_string()).collect();
        assert_eq!(names, ["C", "D", "E", "F", "G", "A", "B", "C"]);
    }

    #[test]
    fn a_harmonic_minor() {
        let scale = resolve_scale(NoteName::A, Mode::HarmonicMinor);
        let names: Vec<String> = scale.iter().map(|n| n.to_string()).collect();
        assert_eq!(names, ["A", "B", "C", "D", "E", "F", "G#", "A"]);
    }

    #[test]
    fn deterministic_with_octave_repeat() {
        for key in NoteName::ALL {
            for mode in Mode::ALL {
                let a = resolve_scale(key, mode);
                let b = resolve_scale(key, mode);
                assert_eq!(a, b);
                assert_eq!(a[0], key);
                assert_eq!(a[7], a[0]);
            }
        }
    }

    #[test]
    fn parse_errors_carry_value_and_valid_set() {
        let err = parse_key("X").unwrap_err();
        match err {
            TheoryError::InvalidKey { value, valid } => {
                assert_eq!(value, "X");
                assert!(valid.contains("C#"));
                assert!(valid.contains("B"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = parse_mode("blues").unwrap_err();
        match err {
            TheoryError::InvalidMode { value, valid } => {
                assert_eq!(value, "blues");
                assert!(valid.contains("harmonic-minor"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrap_past_b_stays_in_chromatic_set() {
        let scale = resolve_scale(NoteName::B, Mode::Ionian);
        let names: Vec<String> = scale.iter().map(|n| n.to_string()).collect();
        assert_eq!(names, ["B", "C#", "D#", "E", "F#", "G#", "A#", "B"]);
    }
}
