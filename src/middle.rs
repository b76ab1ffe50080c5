// The middle layer owns every buffer and flag; input comes in as InputEvents,
// sound goes out through the synth, and the TUI gets a DisplayState per frame.

use crate::audio_api::{VoiceId, VoiceParams};
use crate::clock::Clock;
use crate::pipeline::player::LoopPlayer;
use crate::pipeline::project::ProjectState;
use crate::pipeline::recorder::LoopRecorder;
use crate::pipeline::stroke_buffer::{StrokeBuffer, StrokeHandle, Voicing};
use crate::pipeline::take::{TakeId, VoiceTriggerRecord};
use crate::pipeline::voice_binding::{compute_note, compute_pan, timbre_or_neutral, VoiceBinding};
use crate::shared::{
    ALPHA_STEP, Camera, DisplayState, Dot, InputEvent, NUM_COLORS, PointerEvent, PointerKind,
    PointerPos,
};
use crate::synth::SynthEngine;

#[derive(Clone, Copy, Debug)]
struct LiveStroke {
    handle: StrokeHandle,
    voice: VoiceId,
    params: VoiceParams,
}

pub struct Middle<C: Clock, S: SynthEngine> {
    clock: C,
    synth: S,
    binding: VoiceBinding,
    buffer: StrokeBuffer,
    recorder: LoopRecorder,
    player: LoopPlayer,
    settings: ProjectState,
    camera: Camera,
    live: Option<LiveStroke>,
    panning_from: Option<PointerPos>,
    armed: Option<TakeId>, // next loop toggle while idle plays this
    preview_note: Option<i32>,
    status: String,
}

impl<C: Clock, S: SynthEngine> Middle<C, S> {
    pub fn new(clock: C, synth: S, binding: VoiceBinding, settings: ProjectState) -> Self {
        Self {
            clock,
            synth,
            binding,
            buffer: StrokeBuffer::new(),
            recorder: LoopRecorder::new(settings.next_take),
            player: LoopPlayer::new(),
            settings,
            camera: Camera::default(),
            live: None,
            panning_from: None,
            armed: None,
            preview_note: None,
            status: String::from("draw with the mouse, space to record"),
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Pointer(p) => self.handle_pointer(p),
            InputEvent::LoopToggle => self.loop_toggle(),
            InputEvent::StopPlayback => {
                self.player.stop_all(&mut self.synth);
                self.status = String::from("playback stopped");
            }
            InputEvent::Undo => self.undo(),
            InputEvent::Clear => {
                if self.buffer.is_empty() {
                    self.status = String::from("nothing to clear");
                    return;
                }
                self.buffer.clear();
                self.recorder.forget_from(0);
                self.release_live();
                self.status = String::from("cleared");
            }
            InputEvent::ToggleMoveWithMouse => {
                self.settings.move_with_mouse = !self.settings.move_with_mouse;
                self.panning_from = None;
            }
            InputEvent::ToggleLoopMode => {
                self.settings.loop_enabled = !self.settings.loop_enabled;
            }
            InputEvent::SelectColor(i) => {
                if (i as usize) < NUM_COLORS {
                    self.settings.color_index = i;
                }
            }
            InputEvent::AdjustAlpha(delta) => self.adjust_alpha(delta),
            InputEvent::Quit => {}
        }
    }

    /// Per-frame housekeeping: restart finished loops, then fire sequenced notes,
    /// so a restarted loop sounds its first note in the same frame it is drawn.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.player
            .advance(now, self.settings.loop_enabled, &mut self.synth);
        self.synth.tick(now);
    }

    pub fn display_state(&self) -> DisplayState {
        let now = self.clock.now();
        let mut dots: Vec<Dot> = self
            .buffer
            .strokes()
            .iter()
            .flat_map(|stroke| {
                stroke.samples.iter().map(move |s| Dot {
                    position: s.position,
                    color: stroke.color,
                })
            })
            .collect();
        dots.extend(self.player.due_samples(now, &self.synth));

        DisplayState {
            dots,
            camera: self.camera,
            recording: self.recorder.is_recording(),
            recording_take: self.recorder.current().map(|id| id.to_string()),
            playing: self.player.is_playing(),
            playing_takes: self.player.playing().map(|id| id.to_string()).collect(),
            armed_take: self.armed.as_ref().map(|id| id.to_string()),
            loop_enabled: self.settings.loop_enabled,
            move_with_mouse: self.settings.move_with_mouse,
            color_index: self.settings.color_index,
            alpha: self.settings.alpha,
            preview_note: self.preview_note,
            takes: self.synth.take_ids().iter().map(|id| id.to_string()).collect(),
            status_text: self.status.clone(),
        }
    }

    pub fn project_state(&self) -> ProjectState {
        ProjectState {
            next_take: self.recorder.next_take_number(),
            ..self.settings.clone()
        }
    }

    pub fn synth_mut(&mut self) -> &mut S {
        &mut self.synth
    }

    /// Finish whatever is in flight so nothing is lost or left sounding on quit.
    pub fn shutdown(&mut self) {
        if self.recorder.is_recording() {
            let now = self.clock.now();
            if let Err(e) = self.recorder.stop_recording(now, &self.buffer, &mut self.synth) {
                log::warn!("could not finish take on quit: {}", e);
            }
        }
        self.player.stop_all(&mut self.synth);
        self.release_live();
    }

    fn handle_pointer(&mut self, p: PointerEvent) {
        if self.settings.move_with_mouse && self.live.is_none() {
            self.pan_view(p);
            return;
        }
        let now = self.clock.now();
        match p.kind {
            PointerKind::Down => {
                let color = self.settings.color();
                let position = self.camera.unproject(p.pos, p.surface);
                let (note, params) = self.binding.bind(p.pos, p.surface, color, position);

                self.release_live(); // a lost pointer up
                let handle = self.buffer.begin_stroke(color, now);
                let voicing = Voicing {
                    pan: params.pan,
                    timbre: params.timbre,
                };
                if let Err(e) = self.buffer.append_sample(handle, position, voicing, now) {
                    log::warn!("first sample of stroke {}: {}", handle.0, e);
                }
                let voice = self.synth.trigger_on(params);
                self.recorder.capture(VoiceTriggerRecord {
                    stroke_index: handle.0,
                    start_time: now,
                    note,
                    timbre: params.timbre,
                    pan: params.pan,
                    color,
                });
                log::debug!("stroke {} note {} ({:.1} Hz)", handle.0, note, params.frequency);
                self.live = Some(LiveStroke { handle, voice, params });
                self.preview_note = Some(note);
            }
            PointerKind::Drag => {
                let Some(live) = self.live.as_mut() else {
                    return;
                };
                let position = self.camera.unproject(p.pos, p.surface);
                let voicing = Voicing {
                    pan: compute_pan(p.pos.x, p.surface.width),
                    timbre: live.params.timbre,
                };
                if let Err(e) = self.buffer.append_sample(live.handle, position, voicing, now) {
                    log::warn!("dropping sample: {}", e);
                    return;
                }
                live.params.position = position;
                live.params.pan = voicing.pan;
                self.synth.set_params(live.voice, live.params);
            }
            PointerKind::Up => {
                if let Some(live) = self.live.take() {
                    if let Err(e) = self.buffer.end_stroke(live.handle, now) {
                        log::debug!("pointer up: {}", e);
                    }
                    self.synth.trigger_off(live.voice);
                }
            }
            PointerKind::Move => {
                if self.live.is_none() {
                    self.preview_note = Some(compute_note(p.pos.y, p.surface.height));
                }
            }
        }
    }

    fn pan_view(&mut self, p: PointerEvent) {
        match p.kind {
            PointerKind::Down => self.panning_from = Some(p.pos),
            PointerKind::Drag => {
                if let Some(from) = self.panning_from {
                    self.camera.drag_by(p.pos.x - from.x, p.pos.y - from.y);
                    self.panning_from = Some(p.pos);
                }
            }
            PointerKind::Up => self.panning_from = None,
            PointerKind::Move => {}
        }
    }

    fn loop_toggle(&mut self) {
        let now = self.clock.now();
        if self.recorder.is_recording() {
            match self.recorder.stop_recording(now, &self.buffer, &mut self.synth) {
                Ok(take) if take.is_empty() => {
                    self.status = format!("{} has no strokes, space to play it anyway", take.id);
                    self.armed = Some(take.id);
                }
                Ok(take) => {
                    self.status = format!(
                        "{}: {} stroke(s), {:.1}s, space to play",
                        take.id,
                        take.entries.len(),
                        take.recorded_duration
                    );
                    self.armed = Some(take.id);
                }
                Err(e) => log::warn!("loop toggle: {}", e),
            }
        } else if let Some(id) = self.armed.take() {
            match self.player.start(&id, now, &mut self.synth) {
                Ok(()) => self.status = format!("playing {}", id),
                Err(e) => {
                    log::warn!("loop toggle: {}", e);
                    self.status = format!("{} is gone", id);
                }
            }
        } else {
            match self.recorder.start_recording(now, &mut self.synth) {
                Ok(id) => self.status = format!("recording {}", id),
                Err(e) => log::warn!("loop toggle: {}", e),
            }
        }
    }

    fn undo(&mut self) {
        match self.buffer.undo() {
            Ok(boundary) => {
                self.recorder.forget_from(boundary);
                log::debug!("undo back to {} stroke(s)", self.buffer.len());
                if self.live.is_some_and(|live| live.handle.0 >= boundary) {
                    self.release_live();
                }
                self.status = String::from("undone");
            }
            Err(e) => {
                log::debug!("undo: {}", e);
                self.status = e.to_string();
            }
        }
    }

    fn adjust_alpha(&mut self, delta: f32) {
        let alpha = ((self.settings.alpha + delta) / ALPHA_STEP).round() * ALPHA_STEP;
        self.settings.alpha = alpha.clamp(0.0, 1.0);
        let Some(live) = self.live.as_mut() else {
            return;
        };
        match live.params.with_timbre(timbre_or_neutral(self.settings.alpha)) {
            Ok(params) => {
                live.params = VoiceParams {
                    color: params.color.with_alpha(self.settings.alpha),
                    ..params
                };
                self.synth.set_params(live.voice, live.params);
                // a sample in place, so the take replays the change at this moment
                let voicing = Voicing {
                    pan: live.params.pan,
                    timbre: live.params.timbre,
                };
                let now = self.clock.now();
                if let Err(e) = self.buffer.append_sample(live.handle, live.params.position, voicing, now) {
                    log::debug!("retimbre sample: {}", e);
                }
            }
            Err(e) => log::warn!("retimbre: {}", e),
        }
    }

    fn release_live(&mut self) {
        if let Some(live) = self.live.take() {
            if self.buffer.open_stroke() == Some(live.handle) {
                let now = self.clock.now();
                if let Err(e) = self.buffer.end_stroke(live.handle, now) {
                    log::debug!("release: {}", e);
                }
            }
            self.synth.trigger_off(live.voice);
        }
    }
}
