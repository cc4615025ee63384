pub use crate::audio::{Envelope, OscKind, VoiceConfig};

use crate::shared::Theme;
use crate::theory::note::PitchedNote;

/// The four engine voices. Percussion voices are fixed; the melody pair
/// is selected by the active theme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceId {
    Kick,
    Hihat,
    DarkMelody,
    LightMelody,
}

impl VoiceId {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        match self {
            VoiceId::Kick => 0,
            VoiceId::Hihat => 1,
            VoiceId::DarkMelody => 2,
            VoiceId::LightMelody => 3,
        }
    }

    pub fn melody_for(theme: Theme) -> Self {
        match theme {
            Theme::Dark => VoiceId::DarkMelody,
            Theme::Light => VoiceId::LightMelody,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TriggerParams {
    pub voice: VoiceId,
    pub notes: Vec<PitchedNote>,
    pub duration: f32, // seconds before release
}

/// Commands crossing the channel into the audio callback. Fire and
/// forget; the engine never reports back.
#[derive(Clone, Debug)]
pub enum AudioCommand {
    Trigger(TriggerParams),
    SetVolume {
        voice: VoiceId,
        db: f32,
    },
    /// Linear dB ramp of a voice channel, optionally delayed. `over` and
    /// `delay` are seconds relative to when the engine sees the command.
    RampVolume {
        voice: VoiceId,
        target_db: f32,
        over: f32,
        delay: f32,
    },
    Configure {
        voice: VoiceId,
        config: VoiceConfig,
    },
}
