use super::frame::StereoFrame;
use super::voice::Voice;
use crate::audio_api::AudioCommand;

const MAX_VOICES: usize = 32; // hard cap so we wont malloc in audio callback
const MASTER_GAIN: f32 = 0.8;

pub struct Engine {
    sample_rate: f32,
    voices: [Voice; MAX_VOICES], // fixed pool of voices
    triggered: u64,
}

impl Engine {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            voices: [Voice::idle(); MAX_VOICES],
            triggered: 0,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::TriggerOn { voice, params } => {
                // what slot do we write to? a free one, else the oldest
                let slot = self
                    .voices
                    .iter()
                    .position(Voice::is_free)
                    .or_else(|| {
                        self.voices
                            .iter()
                            .enumerate()
                            .min_by_key(|(_, v)| v.age)
                            .map(|(i, _)| i)
                    })
                    .unwrap_or(0);
                self.triggered += 1;
                self.voices[slot].trigger(voice, self.triggered, &params, self.sample_rate);
            }
            AudioCommand::Update { voice, params } => {
                if let Some(v) = self.voices.iter_mut().find(|v| v.id == Some(voice)) {
                    v.set_params(&params, self.sample_rate);
                }
            }
            AudioCommand::TriggerOff { voice } => {
                if let Some(v) = self.voices.iter_mut().find(|v| v.id == Some(voice)) {
                    v.release();
                }
            }
            AudioCommand::AllOff => self.voices.iter_mut().for_each(Voice::release),
        }
    }

    pub fn next_frame(&mut self) -> StereoFrame {
        let mut out = StereoFrame::zero();
        for v in &mut self.voices {
            out += v.next_frame(self.sample_rate);
        }
        out.scaled(MASTER_GAIN).soft_clip()
    }

    // interleaved device buffer; channels past the second get silence
    pub fn render_block(&mut self, data: &mut [f32], channels: usize) {
        for chunk in data.chunks_exact_mut(channels.max(1)) {
            let frame = self.next_frame();
            chunk.fill(0.0);
            chunk[0] = frame.left;
            if let Some(right) = chunk.get_mut(1) {
                *right = frame.right;
            }
        }
    }
}

#[cfg(test)]
impl Engine {
    fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_free()).count()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::audio::voice_id::VoiceId;
    use crate::audio_api::VoiceParams;
    use crate::shared::{Rgba, Vec3};

    fn params() -> VoiceParams {
        VoiceParams {
            frequency: 220.0,
            amplitude: 0.5,
            pan: 0.5,
            timbre: 1.0,
            cutoff_hz: 2500.0,
            bandwidth_hz: 2500.0,
            color: Rgba::default(),
            position: Vec3::default(),
        }
    }

    #[test]
    fn trigger_renders_and_release_frees() {
        let mut engine = Engine::new(8000.0);
        engine.handle_cmd(AudioCommand::TriggerOn { voice: VoiceId(7), params: params() });
        assert_eq!(engine.active_voices(), 1);

        let mut block = vec![0.0f32; 2 * 512];
        engine.render_block(&mut block, 2);
        assert!(block.iter().any(|s| *s != 0.0));
        assert!(block.iter().all(|s| s.abs() <= 1.0));

        engine.handle_cmd(AudioCommand::TriggerOff { voice: VoiceId(7) });
        let mut tail = vec![0.0f32; 8000];
        engine.render_block(&mut tail, 1);
        assert_eq!(engine.active_voices(), 0);
    }

    #[test]
    fn pool_steals_oldest_when_full() {
        let mut engine = Engine::new(8000.0);
        for i in 0..(MAX_VOICES as u64 + 1) {
            engine.handle_cmd(AudioCommand::TriggerOn { voice: VoiceId(i), params: params() });
        }
        assert_eq!(engine.active_voices(), MAX_VOICES);
        assert!(engine.voices.iter().all(|v| v.id != Some(VoiceId(0))));
        assert!(engine.voices.iter().any(|v| v.id == Some(VoiceId(MAX_VOICES as u64))));
    }

    #[test]
    fn unknown_voice_is_ignored() {
        let mut engine = Engine::new(8000.0);
        engine.handle_cmd(AudioCommand::Update { voice: VoiceId(99), params: params() });
        engine.handle_cmd(AudioCommand::TriggerOff { voice: VoiceId(99) });
        assert_eq!(engine.active_voices(), 0);
    }

    #[test]
    fn extra_channels_are_silent() {
        let mut engine = Engine::new(8000.0);
        engine.handle_cmd(AudioCommand::TriggerOn { voice: VoiceId(1), params: params() });
        let mut block = vec![1.0f32; 4 * 64];
        engine.render_block(&mut block, 4);
        assert!(block.chunks_exact(4).all(|c| c[2] == 0.0 && c[3] == 0.0));
    }
}
