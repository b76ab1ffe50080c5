//! Frame-thread side of the synthesizer.
//!
//! The middle layer talks to a [`SynthEngine`]: it starts, updates and releases
//! voices, hands finished takes over for safe keeping, and asks for takes to be
//! played back. [`Synth`] turns all of that into [`AudioCommand`]s queued for the
//! audio thread, keeps the take store, and sequences take playback from
//! [`SynthEngine::tick`].

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::audio::next_voice_id;
use crate::audio_api::{AudioCommand, VoiceId, VoiceParams};
use crate::pipeline::persistence;
use crate::pipeline::take::{Take, TakeId};
use crate::pipeline::voice_binding::VoiceBinding;
use crate::shared::Vec3;

mod sequencer;

use sequencer::{SeqEventKind, Sequence};

pub trait SynthEngine {
    fn trigger_on(&mut self, params: VoiceParams) -> VoiceId;
    fn set_params(&mut self, voice: VoiceId, params: VoiceParams);
    fn trigger_off(&mut self, voice: VoiceId);

    /// Triggered voices from now on belong to `take`.
    fn begin_capture(&mut self, take: &TakeId);
    /// Persist a finished take and make it available by name.
    fn finish_capture(&mut self, take: &Take) -> anyhow::Result<()>;

    fn take(&self, id: &TakeId) -> Option<&Take>;
    fn take_ids(&self) -> Vec<TakeId>;
    fn take_duration(&self, id: &TakeId) -> Option<f64> {
        self.take(id).map(|t| t.recorded_duration)
    }

    /// Start (or restart from the top) audio playback of a stored take.
    fn play_take(&mut self, id: &TakeId, now: f64) -> bool;
    fn stop_take(&mut self, id: &TakeId);
    fn playback_finished(&self, id: &TakeId, now: f64) -> bool;

    /// Fire whatever sequenced notes have come due.
    fn tick(&mut self, now: f64);
}

struct Playback {
    sequence: Sequence,
    sounding: Vec<(usize, VoiceId)>, // entry index -> voice
}

pub struct Synth {
    binding: VoiceBinding,
    takes_dir: PathBuf,
    takes: BTreeMap<TakeId, Take>,
    capturing: Option<TakeId>,
    playing: HashMap<TakeId, Playback>,
    outbox: Vec<AudioCommand>,
}

impl Synth {
    /// Picks up every take already saved in `takes_dir`.
    pub fn new(binding: VoiceBinding, takes_dir: PathBuf) -> Self {
        let takes: BTreeMap<TakeId, Take> = persistence::load_takes(&takes_dir)
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();
        if !takes.is_empty() {
            log::info!("loaded {} take(s) from {}", takes.len(), takes_dir.display());
        }
        Self {
            binding,
            takes_dir,
            takes,
            capturing: None,
            playing: HashMap::new(),
            outbox: Vec::new(),
        }
    }

    /// Commands queued since the last call, oldest first.
    pub fn drain_commands(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.outbox)
    }

    /// Highest "sound<N>" already on disk, so new takes don't overwrite it.
    pub fn highest_take_number(&self) -> Option<u32> {
        self.takes.keys().filter_map(TakeId::number).max()
    }

    fn release_sounding(&mut self, playback: &mut Playback) {
        for (_, voice) in playback.sounding.drain(..) {
            self.outbox.push(AudioCommand::TriggerOff { voice });
        }
    }
}

impl SynthEngine for Synth {
    fn trigger_on(&mut self, params: VoiceParams) -> VoiceId {
        let voice = next_voice_id();
        self.outbox.push(AudioCommand::TriggerOn { voice, params });
        voice
    }

    fn set_params(&mut self, voice: VoiceId, params: VoiceParams) {
        self.outbox.push(AudioCommand::Update { voice, params });
    }

    fn trigger_off(&mut self, voice: VoiceId) {
        self.outbox.push(AudioCommand::TriggerOff { voice });
    }

    fn begin_capture(&mut self, take: &TakeId) {
        log::info!("capturing into {}", take);
        self.capturing = Some(take.clone());
    }

    fn finish_capture(&mut self, take: &Take) -> anyhow::Result<()> {
        if self.capturing.as_ref() != Some(&take.id) {
            log::warn!("finishing {} which was not being captured", take.id);
        }
        self.capturing = None;
        self.takes.insert(take.id.clone(), take.clone());
        let path = persistence::save_take(&self.takes_dir, take)?;
        log::info!(
            "saved {} ({} strokes, {:.2}s) to {}",
            take.id,
            take.entries.len(),
            take.recorded_duration,
            path.display()
        );
        Ok(())
    }

    fn take(&self, id: &TakeId) -> Option<&Take> {
        self.takes.get(id)
    }

    fn take_ids(&self) -> Vec<TakeId> {
        let mut ids: Vec<TakeId> = self.takes.keys().cloned().collect();
        ids.sort_by_key(|id| id.number());
        ids
    }

    fn play_take(&mut self, id: &TakeId, now: f64) -> bool {
        let Some(take) = self.takes.get(id) else {
            return false;
        };
        let sequence = Sequence::from_take(take, now);
        let fresh = Playback {
            sequence,
            sounding: Vec::new(),
        };
        if let Some(mut old) = self.playing.insert(id.clone(), fresh) {
            self.release_sounding(&mut old);
        }
        true
    }

    fn stop_take(&mut self, id: &TakeId) {
        if let Some(mut playback) = self.playing.remove(id) {
            self.release_sounding(&mut playback);
        }
    }

    fn playback_finished(&self, id: &TakeId, now: f64) -> bool {
        self.playing
            .get(id)
            .is_none_or(|playback| playback.sequence.is_finished(now))
    }

    fn tick(&mut self, now: f64) {
        let binding = self.binding;
        for (id, playback) in self.playing.iter_mut() {
            let Some(take) = self.takes.get(id) else {
                continue;
            };
            let outbox = &mut self.outbox;
            let sounding = &mut playback.sounding;
            playback.sequence.advance(now, |event| {
                let entry = &take.entries[event.entry];
                match event.kind {
                    SeqEventKind::On => {
                        let position = entry
                            .stroke
                            .samples
                            .first()
                            .map(|s| s.position)
                            .unwrap_or(Vec3::default());
                        let params = binding.params_for(&entry.trigger, position);
                        let voice = next_voice_id();
                        outbox.push(AudioCommand::TriggerOn { voice, params });
                        sounding.push((event.entry, voice));
                    }
                    SeqEventKind::Update { sample } => {
                        let Some(s) = entry.stroke.samples.get(sample) else {
                            return;
                        };
                        if let Some((_, voice)) = sounding.iter().find(|(e, _)| *e == event.entry) {
                            let params = binding.params_at(&entry.trigger, s);
                            outbox.push(AudioCommand::Update { voice: *voice, params });
                        }
                    }
                    SeqEventKind::Off => {
                        if let Some(i) = sounding.iter().position(|(e, _)| *e == event.entry) {
                            let (_, voice) = sounding.swap_remove(i);
                            outbox.push(AudioCommand::TriggerOff { voice });
                        }
                    }
                }
            });
        }
    }
}
