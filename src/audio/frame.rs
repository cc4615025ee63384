// The smallest unit of audio; one stereo frame
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    /// Same mono sample on both sides; the synth voices are mono.
    pub fn splat(s: f32) -> Self {
        Self { left: s, right: s }
    }
}
