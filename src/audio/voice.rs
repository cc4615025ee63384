use crate::audio_api::VoiceId;

use std::f32::consts::{PI, TAU};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OscKind {
    Sine,
    Triangle,
    Square,
    Noise,
}

#[derive(Clone, Copy, Debug)]
pub struct Envelope {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

/// Per-channel timbre settings. Forwarded from configuration verbatim;
/// the coordinator never reads these back.
#[derive(Clone, Copy, Debug)]
pub struct VoiceConfig {
    pub osc: OscKind,
    pub envelope: Envelope,
    /// Per-sample multiplier on the phase increment. Below 1.0 the pitch
    /// falls over the note, which is what makes the kick thump.
    pub pitch_drop: f32,
}

/// One sounding note. Everything is Copy so the engine can hold a plain
/// fixed array and never allocate in the callback.
#[derive(Clone, Copy, Debug)]
pub struct SynthVoice {
    pub channel: VoiceId,
    pub active: bool,
    osc: OscKind,
    env: Envelope,
    phase: f32,
    phase_inc: f32,
    pitch_drop: f32,
    duration: f32,
    t: f32,
    dt: f32,
    noise_state: u32,
}

impl SynthVoice {
    pub fn silent() -> Self {
        Self {
            channel: VoiceId::Kick,
            active: false,
            osc: OscKind::Sine,
            env: Envelope::default(),
            phase: 0.0,
            phase_inc: 0.0,
            pitch_drop: 1.0,
            duration: 0.0,
            t: 0.0,
            dt: 0.0,
            noise_state: 0x9e3779b9,
        }
    }

    pub fn new(
        channel: VoiceId,
        freq: f32,
        duration: f32,
        config: &VoiceConfig,
        sample_rate: f32,
    ) -> Self {
        Self {
            channel,
            active: true,
            osc: config.osc,
            env: config.envelope,
            phase: 0.0,
            phase_inc: TAU * freq / sample_rate,
            pitch_drop: config.pitch_drop,
            duration,
            t: 0.0,
            dt: 1.0 / sample_rate,
            noise_state: 0x9e3779b9,
        }
    }

    pub fn sample(&mut self) -> f32 {
        if !self.active {
            return 0.0;
        }

        let raw = match self.osc {
            OscKind::Sine => self.phase.sin(),
            OscKind::Square => {
                if self.phase < PI {
                    1.0
                } else {
                    -1.0
                }
            }
            OscKind::Triangle => {
                let x = self.phase / TAU;
                4.0 * (x - (x + 0.5).floor()).abs() - 1.0
            }
            OscKind::Noise => {
                // xorshift32
                let mut s = self.noise_state;
                s ^= s << 13;
                s ^= s >> 17;
                s ^= s << 5;
                self.noise_state = s;
                (s as f32 / u32::MAX as f32) * 2.0 - 1.0
            }
        };

        let gain = self.envelope_gain();

        self.phase += self.phase_inc;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        self.phase_inc *= self.pitch_drop;
        self.t += self.dt;
        if self.t >= self.duration + self.env.release {
            self.active = false;
        }

        raw * gain * 0.25
    }

    // Attack/decay to sustain, hold until the note duration, then a
    // linear release tail.
    fn envelope_gain(&self) -> f32 {
        let e = &self.env;
        let t = self.t;
        if t < e.attack {
            return t / e.attack.max(1e-6);
        }
        let after_attack = t - e.attack;
        if after_attack < e.decay {
            return 1.0 - (1.0 - e.sustain) * (after_attack / e.decay);
        }
        if t < self.duration {
            return e.sustain;
        }
        let into_release = t - self.duration;
        if into_release < e.release {
            e.sustain * (1.0 - into_release / e.release)
        } else {
            0.0
        }
    }
}
