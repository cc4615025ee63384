// Shared types between the middle layer, the TUI, and main. The goal is
// for only the middle layer to hold sequencer/theme state; the TUI just
// renders the display state object on every frame and resolves keys into
// semantic input events.

use serde::{Deserialize, Serialize};

/// Global minimum interval between accepted triggers. Guards against a
/// runaway clock re-triggering the engine, not a musical constraint.
pub const MIN_RETRIGGER_MS: f64 = 50.0;

/// Polyphonic gain compensation: dB shaved off per doubling of the
/// simultaneous note count, and the clamp range for the adjusted level.
pub const GAIN_COMP_DB_PER_DOUBLING: f32 = 3.0;
pub const GAIN_FLOOR_DB: f32 = -30.0;
pub const GAIN_CEILING_DB: f32 = 0.0;

/// How long the compensated level holds before ramping back, so the dip
/// doesn't bleed into unrelated later triggers.
pub const GAIN_COMP_HOLD_SECS: f32 = 0.3;

pub const MIN_TEMPO_BPM: f32 = 20.0;
pub const MAX_TEMPO_BPM: f32 = 300.0;

/// Current timbre + display color mode. Switched only by the percussion
/// digits: '0' lands on Dark, '1' on Light.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PercussionKind {
    Kick,
    Hihat,
}

/// Semantic input events, resolved by the TUI from raw key presses.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PlayPress,
    Restart,
    Quit,
    CycleKey(i8),
    CycleMode(i8),
    CycleDensity(i8),
    AdjustTempo(f32),
    AdjustVolume(f32),
    AdjustOctave(i8),
}

/// Everything the TUI needs to draw one frame.
#[derive(Clone, Debug)]
pub struct DisplayState {
    pub recent_digits: String,
    pub current_digit: Option<char>,
    pub digit_index: usize,
    pub theme: Theme,
    pub playing: bool,
    pub audio_ready: bool,
    pub tempo_bpm: f32,
    pub key: String,
    pub mode: String,
    pub chord_density: String,
    pub octave: i8,
    pub volume_db: f32,
    pub scale: Vec<String>,
    pub status: String,
    pub dark_color: String,
    pub light_color: String,
}

/// Typed diagnostics emitted to registered observers. Visibility only;
/// nothing reads these back for control flow.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    ThemeChanged(Theme),
    TriggerDropped { at_ms: f64 },
    TriggerFailed { reason: String },
}
