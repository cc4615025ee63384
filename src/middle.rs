// The middle layer: all sequencer, theme, and configuration state lives
// here. Each digit drawn from the stream becomes either a percussion hit
// that flips the theme or a diatonic chord on the melody voice matching
// the current theme. The TUI renders `display_state()`; the audio thread
// only ever sees the `AudioCommand`s this layer emits.

use thiserror::Error;

use crate::audio_api::{AudioCommand, Envelope, OscKind, TriggerParams, VoiceConfig, VoiceId};
use crate::digits::PiDigits;
use crate::pipeline::config::Config;
use crate::shared::{
    DisplayState, EngineEvent, InputEvent, PercussionKind, Theme, GAIN_CEILING_DB,
    GAIN_COMP_DB_PER_DOUBLING, GAIN_COMP_HOLD_SECS, GAIN_FLOOR_DB, MAX_TEMPO_BPM, MIN_RETRIGGER_MS,
    MIN_TEMPO_BPM,
};
use crate::theory::chord::{build_chord_notes, ChordDensity};
use crate::theory::mode::Mode;
use crate::theory::note::{NoteName, PitchedNote};
use crate::theory::scale::{parse_key, parse_mode, resolve_scale, TheoryError};

const KICK_NOTE: PitchedNote = PitchedNote {
    name: NoteName::E,
    octave: 1,
};
const KICK_DURATION: f32 = 0.18;
const HIHAT_NOTE: PitchedNote = PitchedNote {
    name: NoteName::A,
    octave: 5,
};
const HIHAT_DURATION: f32 = 0.05;
const MELODY_DURATION: f32 = 0.4;

const PERCUSSION_DB: f32 = -4.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid chord density \"{value}\" (valid: single triad seventh extended)")]
    InvalidChordDensity { value: String },
}

/// The theme cell. Constructed outside and handed to the coordinator;
/// the only writer is percussion dispatch in `on_digit`.
#[derive(Debug, Default)]
pub struct ThemeState {
    current: Theme,
}

impl ThemeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Theme {
        self.current
    }

    fn set(&mut self, theme: Theme) {
        self.current = theme;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DigitAction {
    Percussion(PercussionKind, Theme),
    Note(u8),
    Skip,
}

// Total over all chars: 0/1 are percussion + theme, 2-9 map onto scale
// degrees 0-7, anything else (the decimal point included) is skipped.
fn map_digit(c: char) -> DigitAction {
    match c {
        '0' => DigitAction::Percussion(PercussionKind::Kick, Theme::Dark),
        '1' => DigitAction::Percussion(PercussionKind::Hihat, Theme::Light),
        '2'..='9' => DigitAction::Note(c as u8 - b'2'),
        _ => DigitAction::Skip,
    }
}

// Opaque timbre settings forwarded to the engine as-is. Dark leans on a
// soft triangle, light on a brighter square.
fn melody_config(theme: Theme) -> VoiceConfig {
    match theme {
        Theme::Dark => VoiceConfig {
            osc: OscKind::Triangle,
            envelope: Envelope {
                attack: 0.01,
                decay: 0.15,
                sustain: 0.5,
                release: 0.25,
            },
            pitch_drop: 1.0,
        },
        Theme::Light => VoiceConfig {
            osc: OscKind::Square,
            envelope: Envelope {
                attack: 0.005,
                decay: 0.1,
                sustain: 0.45,
                release: 0.2,
            },
            pitch_drop: 1.0,
        },
    }
}

/// Adjusted melody-channel level for `n` simultaneous notes. 3 dB off
/// per doubling, clamped, untouched for a single note.
pub fn compensated_volume_db(base_db: f32, n: usize) -> f32 {
    if n <= 1 {
        return base_db;
    }
    let reduction = (n as f32).log2() * GAIN_COMP_DB_PER_DOUBLING;
    (base_db - reduction).clamp(GAIN_FLOOR_DB, GAIN_CEILING_DB)
}

type Observer = Box<dyn FnMut(&EngineEvent)>;

pub struct Middle {
    pub cfg: Config,
    theme: ThemeState,
    digits: PiDigits,
    playing: bool,
    audio_ready: bool,
    clock_ms: f64,
    accum_ms: f64,
    last_trigger_ms: Option<f64>,
    current_digit: Option<char>,
    status: String,
    observers: Vec<Observer>,
}

impl Middle {
    pub fn with_config(cfg: Config, theme: ThemeState) -> Self {
        Self {
            cfg,
            theme,
            digits: PiDigits::new(),
            playing: false,
            audio_ready: false,
            clock_ms: 0.0,
            accum_ms: 0.0,
            last_trigger_ms: None,
            current_digit: None,
            status: String::from("press space to play"),
            observers: Vec::new(),
        }
    }

    // ── observers ─────────────────────────────────────────────────

    pub fn observe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    fn emit(&mut self, event: EngineEvent) {
        for obs in self.observers.iter_mut() {
            obs(&event);
        }
    }

    // ── configuration ─────────────────────────────────────────────

    pub fn set_key(&mut self, name: &str) -> Result<(), TheoryError> {
        self.cfg.key = parse_key(name)?;
        Ok(())
    }

    pub fn set_mode(&mut self, name: &str) -> Result<(), TheoryError> {
        self.cfg.mode = parse_mode(name)?;
        Ok(())
    }

    pub fn set_chord_density(&mut self, name: &str) -> Result<(), ConfigError> {
        self.cfg.chord_density =
            ChordDensity::parse(name).ok_or_else(|| ConfigError::InvalidChordDensity {
                value: name.to_string(),
            })?;
        Ok(())
    }

    pub fn set_audio_ready(&mut self, ready: bool) {
        self.audio_ready = ready;
    }

    /// Commands to bring a freshly started engine in line with the
    /// configured levels and timbres.
    pub fn startup_commands(&self) -> Vec<AudioCommand> {
        vec![
            AudioCommand::SetVolume {
                voice: VoiceId::Kick,
                db: PERCUSSION_DB,
            },
            AudioCommand::SetVolume {
                voice: VoiceId::Hihat,
                db: PERCUSSION_DB,
            },
            AudioCommand::SetVolume {
                voice: VoiceId::DarkMelody,
                db: self.cfg.volume_db,
            },
            AudioCommand::SetVolume {
                voice: VoiceId::LightMelody,
                db: self.cfg.volume_db,
            },
            AudioCommand::Configure {
                voice: VoiceId::DarkMelody,
                config: melody_config(Theme::Dark),
            },
            AudioCommand::Configure {
                voice: VoiceId::LightMelody,
                config: melody_config(Theme::Light),
            },
        ]
    }

    // ── observers for the UI ──────────────────────────────────────

    pub fn theme(&self) -> Theme {
        self.theme.get()
    }

    pub fn current_scale(&self) -> [NoteName; 8] {
        resolve_scale(self.cfg.key, self.cfg.mode)
    }

    pub fn display_state(&self) -> DisplayState {
        DisplayState {
            recent_digits: self.digits.recent(48).to_string(),
            current_digit: self.current_digit,
            digit_index: self.digits.position(),
            theme: self.theme.get(),
            playing: self.playing,
            audio_ready: self.audio_ready,
            tempo_bpm: self.cfg.tempo_bpm,
            key: self.cfg.key.to_string(),
            mode: self.cfg.mode.to_string(),
            chord_density: self.cfg.chord_density.to_string(),
            octave: self.cfg.octave,
            volume_db: self.cfg.volume_db,
            scale: self.current_scale().iter().map(|n| n.to_string()).collect(),
            status: self.status.clone(),
            dark_color: self.cfg.dark_color.clone(),
            light_color: self.cfg.light_color.clone(),
        }
    }

    // ── input ─────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<AudioCommand> {
        match event {
            InputEvent::PlayPress => {
                self.playing = !self.playing;
                self.accum_ms = 0.0;
                self.status = if self.playing {
                    String::from("playing")
                } else {
                    String::from("paused")
                };
            }
            InputEvent::Restart => {
                self.digits.restart();
                self.accum_ms = 0.0;
                self.current_digit = None;
                self.status = String::from("rewound to 3.14...");
            }
            InputEvent::CycleKey(dir) => {
                let idx = self.cfg.key.pitch_class() as i32 + dir as i32;
                self.cfg.key = NoteName::from_pitch_class(idx.rem_euclid(12) as u8);
                self.status = format!("key {}", self.cfg.key);
            }
            InputEvent::CycleMode(dir) => {
                let idx = Mode::ALL.iter().position(|m| *m == self.cfg.mode).unwrap_or(0);
                let next = (idx as i32 + dir as i32).rem_euclid(Mode::ALL.len() as i32);
                self.cfg.mode = Mode::ALL[next as usize];
                self.status = format!("mode {}", self.cfg.mode);
            }
            InputEvent::CycleDensity(dir) => {
                let idx = ChordDensity::ALL
                    .iter()
                    .position(|d| *d == self.cfg.chord_density)
                    .unwrap_or(0);
                let next = (idx as i32 + dir as i32).rem_euclid(ChordDensity::ALL.len() as i32);
                self.cfg.chord_density = ChordDensity::ALL[next as usize];
                self.status = format!("density {}", self.cfg.chord_density);
            }
            InputEvent::AdjustTempo(delta) => {
                self.cfg.tempo_bpm = (self.cfg.tempo_bpm + delta).clamp(MIN_TEMPO_BPM, MAX_TEMPO_BPM);
                self.status = format!("{} bpm", self.cfg.tempo_bpm);
            }
            InputEvent::AdjustVolume(delta) => {
                self.cfg.volume_db = (self.cfg.volume_db + delta).clamp(GAIN_FLOOR_DB, GAIN_CEILING_DB);
                self.status = format!("{:+.1} dB", self.cfg.volume_db);
                return vec![
                    AudioCommand::SetVolume {
                        voice: VoiceId::DarkMelody,
                        db: self.cfg.volume_db,
                    },
                    AudioCommand::SetVolume {
                        voice: VoiceId::LightMelody,
                        db: self.cfg.volume_db,
                    },
                ];
            }
            InputEvent::AdjustOctave(dir) => {
                self.cfg.octave = (self.cfg.octave + dir).clamp(1, 7);
                self.status = format!("octave {}", self.cfg.octave);
            }
            InputEvent::Quit => {}
        }
        Vec::new()
    }

    // ── the driving clock ─────────────────────────────────────────

    /// Called once per UI frame. Advances the digit clock; one digit is
    /// drawn every `60000 / tempo` milliseconds while playing.
    pub fn tick(&mut self, elapsed_secs: f64) -> Vec<AudioCommand> {
        self.clock_ms += elapsed_secs * 1000.0;
        if !self.playing {
            return Vec::new();
        }
        self.accum_ms += elapsed_secs * 1000.0;
        let period_ms = 60_000.0 / self.cfg.tempo_bpm as f64;
        let mut cmds = Vec::new();
        while self.accum_ms >= period_ms {
            self.accum_ms -= period_ms;
            let c = self.digits.next_char();
            self.current_digit = Some(c);
            cmds.extend(self.on_digit(c, self.clock_ms));
        }
        cmds
    }

    /// The single per-digit entry point: theme update, throttle, chord
    /// resolution, gain compensation, dispatch.
    pub fn on_digit(&mut self, c: char, at_ms: f64) -> Vec<AudioCommand> {
        match map_digit(c) {
            DigitAction::Skip => {
                tracing::trace!(digit = ?c, "skipping non-digit");
                Vec::new()
            }
            DigitAction::Percussion(kind, theme) => {
                // theme flips even when the audible hit is dropped; the
                // state machine follows the digit stream, not the audio
                if self.theme.get() != theme {
                    self.theme.set(theme);
                    tracing::debug!(?theme, "theme changed");
                    self.emit(EngineEvent::ThemeChanged(theme));
                }
                if !self.audio_ready {
                    return Vec::new();
                }
                if self.throttled(at_ms) {
                    return Vec::new();
                }
                self.last_trigger_ms = Some(at_ms);
                let (voice, note, duration) = match kind {
                    PercussionKind::Kick => (VoiceId::Kick, KICK_NOTE, KICK_DURATION),
                    PercussionKind::Hihat => (VoiceId::Hihat, HIHAT_NOTE, HIHAT_DURATION),
                };
                vec![AudioCommand::Trigger(TriggerParams {
                    voice,
                    notes: vec![note],
                    duration,
                })]
            }
            DigitAction::Note(degree) => {
                if !self.audio_ready {
                    return Vec::new();
                }
                if self.throttled(at_ms) {
                    return Vec::new();
                }
                let scale = self.current_scale();
                let notes = build_chord_notes(&scale, degree, self.cfg.chord_density, self.cfg.octave);
                if notes.is_empty() {
                    tracing::debug!(degree, "degree out of range, no sound");
                    return Vec::new();
                }
                self.last_trigger_ms = Some(at_ms);
                let voice = VoiceId::melody_for(self.theme.get());
                let n = notes.len();
                let mut cmds = Vec::with_capacity(3);
                if n > 1 {
                    cmds.push(AudioCommand::RampVolume {
                        voice,
                        target_db: compensated_volume_db(self.cfg.volume_db, n),
                        over: 0.005,
                        delay: 0.0,
                    });
                }
                cmds.push(AudioCommand::Trigger(TriggerParams {
                    voice,
                    notes,
                    duration: MELODY_DURATION,
                }));
                if n > 1 {
                    cmds.push(AudioCommand::RampVolume {
                        voice,
                        target_db: self.cfg.volume_db,
                        over: 0.05,
                        delay: GAIN_COMP_HOLD_SECS,
                    });
                }
                cmds
            }
        }
    }

    /// Called by main when the audio handle refuses a command. A bad
    /// trigger never halts the digit stream.
    pub fn note_trigger_failed(&mut self, reason: &str) {
        tracing::warn!(reason, "audio trigger failed");
        self.emit(EngineEvent::TriggerFailed {
            reason: reason.to_string(),
        });
    }

    fn throttled(&mut self, at_ms: f64) -> bool {
        if let Some(last) = self.last_trigger_ms {
            if at_ms - last < MIN_RETRIGGER_MS {
                tracing::debug!(at_ms, last, "trigger dropped by throttle");
                self.emit(EngineEvent::TriggerDropped { at_ms });
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ready_middle() -> Middle {
        let mut m = Middle::with_config(Config::default(), ThemeState::new());
        m.set_audio_ready(true);
        m
    }

    fn triggers(cmds: &[AudioCommand]) -> Vec<&TriggerParams> {
        cmds.iter()
            .filter_map(|c| match c {
                AudioCommand::Trigger(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    fn note_names(t: &TriggerParams) -> Vec<String> {
        t.notes.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn theme_state_machine() {
        let mut m = ready_middle();
        assert_eq!(m.theme(), Theme::Dark);
        m.on_digit('1', 0.0);
        assert_eq!(m.theme(), Theme::Light);
        for (i, c) in ('2'..='9').enumerate() {
            m.on_digit(c, 100.0 * (i as f64 + 1.0));
            assert_eq!(m.theme(), Theme::Light);
        }
        m.on_digit('0', 2000.0);
        assert_eq!(m.theme(), Theme::Dark);
    }

    #[test]
    fn digit_mapping_totality() {
        for c in '0'..='9' {
            assert_ne!(map_digit(c), DigitAction::Skip);
        }
        assert_eq!(map_digit('.'), DigitAction::Skip);
        assert_eq!(map_digit('x'), DigitAction::Skip);
        assert_eq!(map_digit(' '), DigitAction::Skip);
        assert_eq!(map_digit('2'), DigitAction::Note(0));
        assert_eq!(map_digit('9'), DigitAction::Note(7));
    }

    #[test]
    fn decimal_point_is_a_no_op() {
        let mut m = ready_middle();
        let before = m.theme();
        let cmds = m.on_digit('.', 0.0);
        assert!(cmds.is_empty());
        assert_eq!(m.theme(), before);
    }

    #[test]
    fn throttle_drops_fast_retriggers() {
        let mut m = ready_middle();
        let first = m.on_digit('2', 0.0);
        assert_eq!(triggers(&first).len(), 1);
        let second = m.on_digit('3', 30.0); // < 50ms later
        assert!(second.is_empty());
        let third = m.on_digit('3', 55.0); // >= 50ms after the accepted one
        assert_eq!(triggers(&third).len(), 1);
    }

    #[test]
    fn throttle_emits_dropped_event() {
        let mut m = ready_middle();
        let seen: Rc<RefCell<Vec<EngineEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        m.observe(Box::new(move |ev| sink.borrow_mut().push(ev.clone())));
        m.on_digit('2', 0.0);
        m.on_digit('2', 10.0);
        let events = seen.borrow();
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::TriggerDropped { .. })));
    }

    #[test]
    fn not_ready_is_a_silent_no_op() {
        let mut m = Middle::with_config(Config::default(), ThemeState::new());
        assert!(m.on_digit('5', 0.0).is_empty());
        assert!(m.on_digit('0', 100.0).is_empty());
        // theme still follows the stream while muted
        m.on_digit('1', 200.0);
        assert_eq!(m.theme(), Theme::Light);
    }

    #[test]
    fn gain_compensation_monotone_and_bounded() {
        let base = -6.0;
        let mut prev = compensated_volume_db(base, 1);
        assert_eq!(prev, base);
        for n in [2usize, 4, 8] {
            let v = compensated_volume_db(base, n);
            assert!(v <= prev, "n={n}");
            assert!(v >= GAIN_FLOOR_DB);
            prev = v;
        }
        assert_eq!(compensated_volume_db(-29.5, 64), GAIN_FLOOR_DB);
    }

    #[test]
    fn chord_trigger_wraps_in_gain_ramps() {
        let mut m = ready_middle(); // default density is triad
        let cmds = m.on_digit('4', 0.0);
        assert_eq!(cmds.len(), 3);
        assert!(matches!(cmds[0], AudioCommand::RampVolume { delay, .. } if delay == 0.0));
        assert!(matches!(cmds[1], AudioCommand::Trigger(_)));
        assert!(
            matches!(cmds[2], AudioCommand::RampVolume { delay, target_db, .. }
                if delay == GAIN_COMP_HOLD_SECS && target_db == m.cfg.volume_db)
        );
    }

    #[test]
    fn single_note_skips_compensation() {
        let mut m = ready_middle();
        m.set_chord_density("single").unwrap();
        let cmds = m.on_digit('2', 0.0);
        assert_eq!(cmds.len(), 1);
        assert!(matches!(cmds[0], AudioCommand::Trigger(_)));
    }

    // C ionian triad, digit '4' = degree 2 -> E4 G4 B4
    #[test]
    fn digit_four_in_c_ionian_triad() {
        let mut m = ready_middle();
        let cmds = m.on_digit('4', 0.0);
        let ts = triggers(&cmds);
        assert_eq!(ts.len(), 1);
        assert_eq!(ts[0].voice, VoiceId::DarkMelody);
        assert_eq!(note_names(ts[0]), ["E4", "G4", "B4"]);
    }

    // '0' then '2' at single density -> kick under Dark, then C4
    #[test]
    fn kick_then_root_single() {
        let mut m = ready_middle();
        m.set_chord_density("single").unwrap();
        let first = m.on_digit('0', 0.0);
        assert_eq!(m.theme(), Theme::Dark);
        assert_eq!(triggers(&first)[0].voice, VoiceId::Kick);
        let second = m.on_digit('2', 100.0);
        let ts = triggers(&second);
        assert_eq!(ts[0].voice, VoiceId::DarkMelody);
        assert_eq!(note_names(ts[0]), ["C4"]);
    }

    #[test]
    fn light_theme_routes_to_light_melody() {
        let mut m = ready_middle();
        m.on_digit('1', 0.0);
        let cmds = m.on_digit('5', 100.0);
        assert_eq!(triggers(&cmds)[0].voice, VoiceId::LightMelody);
    }

    #[test]
    fn note_resolution_is_idempotent() {
        let mut m = ready_middle();
        let a = m.on_digit('7', 0.0);
        let b = m.on_digit('7', 1000.0);
        assert_eq!(
            note_names(triggers(&a)[0]),
            note_names(triggers(&b)[0])
        );
    }

    #[test]
    fn config_mutators_reject_and_keep_prior_value() {
        let mut m = ready_middle();
        m.set_key("G#").unwrap();
        assert!(m.set_key("H").is_err());
        assert_eq!(m.cfg.key, NoteName::Gs);

        m.set_mode("lydian").unwrap();
        assert!(m.set_mode("ionien").is_err());
        assert_eq!(m.cfg.mode, Mode::Lydian);

        m.set_chord_density("seventh").unwrap();
        let err = m.set_chord_density("nope").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidChordDensity {
                value: String::from("nope")
            }
        );
        assert_eq!(m.cfg.chord_density, ChordDensity::Seventh);
    }

    #[test]
    fn theme_change_emits_event_once() {
        let mut m = ready_middle();
        let seen: Rc<RefCell<Vec<EngineEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        m.observe(Box::new(move |ev| sink.borrow_mut().push(ev.clone())));
        m.on_digit('0', 0.0); // already dark, no event
        m.on_digit('1', 100.0);
        let events = seen.borrow();
        let changes: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, EngineEvent::ThemeChanged(_)))
            .collect();
        assert_eq!(changes.len(), 1);
        assert_eq!(*changes[0], EngineEvent::ThemeChanged(Theme::Light));
    }

    #[test]
    fn tick_draws_digits_at_tempo() {
        let mut m = ready_middle();
        m.cfg.tempo_bpm = 120.0; // 500ms per digit
        m.handle_input(InputEvent::PlayPress);
        assert!(m.tick(0.25).is_empty()); // not yet
        let cmds = m.tick(0.25); // first digit: '3'
        assert_eq!(triggers(&cmds).len(), 1); // degree 1 in C major
        let cmds = m.tick(0.5); // second char: '.'
        assert!(cmds.is_empty());
    }

    #[test]
    fn pause_resumes_at_same_digit() {
        let mut m = ready_middle();
        m.cfg.tempo_bpm = 120.0;
        m.handle_input(InputEvent::PlayPress);
        m.tick(0.5); // '3'
        m.tick(0.5); // '.'
        let idx = m.display_state().digit_index;
        m.handle_input(InputEvent::PlayPress); // pause
        m.tick(5.0);
        assert_eq!(m.display_state().digit_index, idx);
        m.handle_input(InputEvent::PlayPress); // resume
        let cmds = m.tick(0.5); // '1' -> hihat + theme light
        assert_eq!(m.display_state().digit_index, idx + 1);
        assert_eq!(m.theme(), Theme::Light);
        assert_eq!(triggers(&cmds)[0].voice, VoiceId::Hihat);
    }

    #[test]
    fn cycling_config_stays_in_domain() {
        let mut m = ready_middle();
        for _ in 0..25 {
            m.handle_input(InputEvent::CycleKey(1));
            m.handle_input(InputEvent::CycleMode(-1));
            m.handle_input(InputEvent::CycleDensity(1));
        }
        assert!(NoteName::ALL.contains(&m.cfg.key));
        assert!(Mode::ALL.contains(&m.cfg.mode));
        assert!(ChordDensity::ALL.contains(&m.cfg.chord_density));
    }
}
