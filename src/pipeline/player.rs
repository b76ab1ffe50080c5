//! Loop playback timing.
//!
//! Audio for a take is sequenced by the synth; this module decides which of a
//! take's stroke samples should be on screen right now, so the dot trail grows
//! in step with the notes. Each frame the whole due set is recomputed from the
//! clock: a sample is due once its offset has elapsed within the current loop
//! iteration of its voice, and stays due until the take restarts.

use crate::error::BrushError;
use crate::pipeline::take::TakeId;
use crate::shared::Dot;
use crate::synth::SynthEngine;

#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackCursor {
    pub take: TakeId,
    pub entry: usize,
    pub loop_iteration: u32,
    pub cycle_start: f64, // when this voice's current iteration began
}

#[derive(Clone, Debug)]
struct ActiveTake {
    id: TakeId,
    loop_iteration: u32,
    started_at: f64,
}

#[derive(Debug, Default)]
pub struct LoopPlayer {
    active: Vec<ActiveTake>,
}

impl LoopPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, take: &TakeId, now: f64, synth: &mut impl SynthEngine) -> Result<(), BrushError> {
        if !synth.play_take(take, now) {
            return Err(BrushError::MissingReference {
                take: take.clone(),
                entry: 0,
            });
        }
        self.active.retain(|a| &a.id != take);
        self.active.push(ActiveTake {
            id: take.clone(),
            loop_iteration: 0,
            started_at: now,
        });
        log::info!("playing {}", take);
        Ok(())
    }

    /// Restart or retire takes whose playback has run out.
    pub fn advance(&mut self, now: f64, loop_enabled: bool, synth: &mut impl SynthEngine) {
        self.active.retain_mut(|active| {
            if !synth.playback_finished(&active.id, now) {
                return true;
            }
            let duration = synth.take_duration(&active.id).unwrap_or(0.0);
            if loop_enabled && duration > 0.0 && synth.play_take(&active.id, now) {
                active.loop_iteration += 1;
                active.started_at = now;
                log::debug!("{} loop {}", active.id, active.loop_iteration);
                true
            } else {
                synth.stop_take(&active.id);
                log::info!("{} finished", active.id);
                false
            }
        });
    }

    /// Stop one take; the others keep playing.
    pub fn stop(&mut self, take: &TakeId, synth: &mut impl SynthEngine) {
        self.active.retain(|a| &a.id != take);
        synth.stop_take(take);
    }

    pub fn stop_all(&mut self, synth: &mut impl SynthEngine) {
        let ids: Vec<TakeId> = self.playing().cloned().collect();
        for id in &ids {
            self.stop(id, synth);
        }
    }

    pub fn is_playing(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn playing(&self) -> impl Iterator<Item = &TakeId> {
        self.active.iter().map(|a| &a.id)
    }

    pub fn cursors(&self, synth: &impl SynthEngine) -> Vec<PlaybackCursor> {
        let mut cursors = Vec::new();
        for active in &self.active {
            let Some(take) = synth.take(&active.id) else {
                continue;
            };
            for (entry, e) in take.entries.iter().enumerate() {
                cursors.push(PlaybackCursor {
                    take: active.id.clone(),
                    entry,
                    loop_iteration: active.loop_iteration,
                    cycle_start: active.started_at + e.onset,
                });
            }
        }
        cursors
    }

    /// Every sample due at `now`. Calling this twice with the same `now` gives
    /// the same answer.
    pub fn due_samples(&self, now: f64, synth: &impl SynthEngine) -> Vec<Dot> {
        let mut dots = Vec::new();
        for cursor in self.cursors(synth) {
            let Some(entry) = synth.take(&cursor.take).and_then(|t| t.entries.get(cursor.entry))
            else {
                let e = BrushError::MissingReference {
                    take: cursor.take.clone(),
                    entry: cursor.entry,
                };
                log::debug!("skipping trail: {}", e);
                continue;
            };
            let elapsed = now - cursor.cycle_start;
            let color = entry.stroke.color;
            dots.extend(
                entry
                    .stroke
                    .samples
                    .iter()
                    .take_while(|s| s.time_offset <= elapsed) // offsets never decrease
                    .map(|s| Dot {
                        position: s.position,
                        color,
                    }),
            );
        }
        dots
    }
}
