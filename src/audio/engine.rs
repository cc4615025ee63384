use crate::audio_api::{AudioCommand, TriggerParams, VoiceId};

use super::frame::StereoFrame;
use super::voice::{Envelope, OscKind, SynthVoice, VoiceConfig};

const MAX_VOICES: usize = 24; // hard cap so we won't malloc in the audio callback
const MAX_SCHEDULED_RAMPS: usize = 4;
const MIN_CHANNEL_DB: f32 = -60.0;
const MAX_CHANNEL_DB: f32 = 0.0;

fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// A scheduled linear dB ramp on a channel. `from_db` is captured when
/// the ramp actually starts so a delayed ramp picks up wherever the
/// level is at that moment.
#[derive(Clone, Copy, Debug)]
struct Ramp {
    start_at: u64,
    end_at: u64,
    from_db: f32,
    target_db: f32,
    started: bool,
}

#[derive(Clone, Copy, Debug)]
struct Channel {
    current_db: f32,
    ramps: [Option<Ramp>; MAX_SCHEDULED_RAMPS],
}

impl Channel {
    fn new(db: f32) -> Self {
        Self {
            current_db: db,
            ramps: [None; MAX_SCHEDULED_RAMPS],
        }
    }

    fn schedule(&mut self, ramp: Ramp) {
        // take a free slot, or evict the oldest
        if let Some(slot) = self.ramps.iter_mut().find(|r| r.is_none()) {
            *slot = Some(ramp);
        } else {
            self.ramps[0] = Some(ramp);
        }
    }

    fn advance(&mut self, clock: u64) -> f32 {
        for slot in self.ramps.iter_mut() {
            let Some(ramp) = slot.as_mut() else { continue };
            if clock < ramp.start_at {
                continue;
            }
            if !ramp.started {
                ramp.from_db = self.current_db;
                ramp.started = true;
            }
            if clock >= ramp.end_at {
                self.current_db = ramp.target_db;
                *slot = None;
                continue;
            }
            let span = (ramp.end_at - ramp.start_at) as f32;
            let frac = (clock - ramp.start_at) as f32 / span;
            self.current_db = ramp.from_db + (ramp.target_db - ramp.from_db) * frac;
        }
        db_to_linear(self.current_db)
    }
}

pub struct Engine {
    sample_rate: f32,
    clock: u64,
    voices: [SynthVoice; MAX_VOICES], // fixed pool
    channels: [Channel; VoiceId::COUNT],
    configs: [VoiceConfig; VoiceId::COUNT],
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            clock: 0,
            voices: [SynthVoice::silent(); MAX_VOICES],
            channels: [Channel::new(-6.0); VoiceId::COUNT],
            configs: default_configs(),
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Trigger(t) => self.trigger(t),
            AudioCommand::SetVolume { voice, db } => {
                let ch = &mut self.channels[voice.index()];
                ch.current_db = db.clamp(MIN_CHANNEL_DB, MAX_CHANNEL_DB);
                ch.ramps = [None; MAX_SCHEDULED_RAMPS];
            }
            AudioCommand::RampVolume {
                voice,
                target_db,
                over,
                delay,
            } => {
                let start_at = self.clock + (delay.max(0.0) * self.sample_rate) as u64;
                let span = ((over.max(0.0) * self.sample_rate) as u64).max(1);
                self.channels[voice.index()].schedule(Ramp {
                    start_at,
                    end_at: start_at + span,
                    from_db: 0.0,
                    target_db: target_db.clamp(MIN_CHANNEL_DB, MAX_CHANNEL_DB),
                    started: false,
                });
            }
            AudioCommand::Configure { voice, config } => {
                self.configs[voice.index()] = config;
            }
        }
    }

    fn trigger(&mut self, t: TriggerParams) {
        let config = self.configs[t.voice.index()];
        for note in &t.notes {
            // what slot do we write to?
            let slot = self
                .voices
                .iter()
                .position(|v| !v.active)
                .unwrap_or(0);
            self.voices[slot] =
                SynthVoice::new(t.voice, note.frequency(), t.duration, &config, self.sample_rate);
        }
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            let mut gains = [0f32; VoiceId::COUNT];
            for (i, ch) in self.channels.iter_mut().enumerate() {
                gains[i] = ch.advance(self.clock);
            }

            let mut sums = [0f32; VoiceId::COUNT];
            for v in self.voices.iter_mut() {
                if v.active {
                    sums[v.channel.index()] += v.sample();
                }
            }

            let mut mix = 0f32;
            for i in 0..VoiceId::COUNT {
                mix += sums[i] * gains[i];
            }
            *frame = StereoFrame::splat(mix.clamp(-1.0, 1.0));
            self.clock += 1;
        }
    }
}

fn default_configs() -> [VoiceConfig; VoiceId::COUNT] {
    [
        // kick: sine with a fast pitch fall
        VoiceConfig {
            osc: OscKind::Sine,
            envelope: Envelope {
                attack: 0.002,
                decay: 0.12,
                sustain: 0.0,
                release: 0.05,
            },
            pitch_drop: 0.9995,
        },
        // hihat: short noise burst
        VoiceConfig {
            osc: OscKind::Noise,
            envelope: Envelope {
                attack: 0.001,
                decay: 0.03,
                sustain: 0.0,
                release: 0.02,
            },
            pitch_drop: 1.0,
        },
        // melody channels: plain sine until configured
        VoiceConfig {
            osc: OscKind::Sine,
            envelope: Envelope::default(),
            pitch_drop: 1.0,
        },
        VoiceConfig {
            osc: OscKind::Sine,
            envelope: Envelope::default(),
            pitch_drop: 1.0,
        },
    ]
}
