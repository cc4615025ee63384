// Flat startup configuration. Everything the player can tweak live is
// seeded from here and written back on quit.

use serde::{Deserialize, Serialize};

use crate::theory::chord::ChordDensity;
use crate::theory::mode::Mode;
use crate::theory::note::NoteName;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tempo_bpm: f32,
    pub key: NoteName,
    pub mode: Mode,
    pub chord_density: ChordDensity,
    pub octave: i8,
    /// Base melody-channel level; gain compensation dips below this for
    /// chords and ramps back.
    pub volume_db: f32,
    /// Display colors per theme, by name ("magenta", "yellow", ...).
    pub dark_color: String,
    pub light_color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tempo_bpm: 120.0,
            key: NoteName::C,
            mode: Mode::Ionian,
            chord_density: ChordDensity::Triad,
            octave: 4,
            volume_db: -6.0,
            dark_color: String::from("magenta"),
            light_color: String::from("yellow"),
        }
    }
}
