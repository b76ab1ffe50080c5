pub use crate::audio::VoiceId;
use crate::shared::{Rgba, Vec3};

/// Everything a voice needs, exchanged by value. The audio thread reads the
/// synthesis fields; color and position ride along for whoever draws the voice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceParams {
    pub frequency: f32,
    pub amplitude: f32,
    pub pan: f32,          // -1 left .. 1 right
    pub timbre: f32,       // scale already applied to cutoff_hz and bandwidth_hz
    pub cutoff_hz: f32,
    pub bandwidth_hz: f32,
    pub color: Rgba,
    pub position: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AudioCommand {
    // Parameters are committed on the frame thread before the voice starts;
    // the engine never reaches back for anything.
    TriggerOn { voice: VoiceId, params: VoiceParams },
    Update { voice: VoiceId, params: VoiceParams },
    TriggerOff { voice: VoiceId },
    AllOff,
}
