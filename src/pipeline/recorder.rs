// Loop pedal recording: Idle -> Recording -> Idle. Playback belongs to the player.

use crate::error::{BrushError, BrushResult};
use crate::pipeline::stroke_buffer::StrokeBuffer;
use crate::pipeline::take::{Take, TakeEntry, TakeId, VoiceTriggerRecord};
use crate::synth::SynthEngine;

/// First take number that can't clash with a take already on disk.
pub fn resume_numbering(saved_next: u32, highest_on_disk: Option<u32>) -> u32 {
    match highest_on_disk {
        Some(highest) => saved_next.max(highest.saturating_add(1)),
        None => saved_next,
    }
}

#[derive(Clone, Debug)]
enum RecorderState {
    Idle,
    Recording {
        id: TakeId,
        started_at: f64,
        captured: Vec<VoiceTriggerRecord>,
    },
}

#[derive(Debug)]
pub struct LoopRecorder {
    state: RecorderState,
    next_take: u32,
}

impl LoopRecorder {
    pub fn new(next_take: u32) -> Self {
        Self {
            state: RecorderState::Idle,
            next_take,
        }
    }

    pub fn start_recording(&mut self, now: f64, synth: &mut impl SynthEngine) -> BrushResult<TakeId> {
        if self.is_recording() {
            return Err(BrushError::AlreadyRecording);
        }
        let id = TakeId::numbered(self.next_take);
        self.next_take = self.next_take.saturating_add(1);
        synth.begin_capture(&id);
        self.state = RecorderState::Recording {
            id: id.clone(),
            started_at: now,
            captured: Vec::new(),
        };
        Ok(id)
    }

    /// Remember a trigger that happened while recording; ignored when idle.
    pub fn capture(&mut self, record: VoiceTriggerRecord) {
        if let RecorderState::Recording { captured, .. } = &mut self.state {
            captured.push(record);
        }
    }

    /// Strokes at or past `boundary` were undone or cleared; they won't be in the take.
    pub fn forget_from(&mut self, boundary: usize) {
        if let RecorderState::Recording { captured, .. } = &mut self.state {
            captured.retain(|r| r.stroke_index < boundary);
        }
    }

    pub fn stop_recording(
        &mut self,
        now: f64,
        buffer: &StrokeBuffer,
        synth: &mut impl SynthEngine,
    ) -> BrushResult<Take> {
        let RecorderState::Recording {
            id,
            started_at,
            captured,
        } = std::mem::replace(&mut self.state, RecorderState::Idle)
        else {
            return Err(BrushError::NotRecording);
        };
        let recorded_duration = (now - started_at).max(0.0);

        let mut entries = Vec::with_capacity(captured.len());
        for trigger in captured {
            let Some(stroke) = buffer.get(trigger.stroke_index) else {
                log::warn!("{}: stroke {} is gone, leaving it out", id, trigger.stroke_index);
                continue;
            };
            let onset = (trigger.start_time - started_at).clamp(0.0, recorded_duration);
            let held = stroke
                .held_for
                .unwrap_or_else(|| (now - trigger.start_time).max(0.0)); // still held at stop
            entries.push(TakeEntry {
                onset,
                held_for: held.min(recorded_duration - onset),
                stroke: stroke.clone(),
                trigger,
            });
        }

        let take = Take {
            id,
            recorded_duration,
            entries,
        };
        if let Err(e) = synth.finish_capture(&take) {
            // the take still plays this session, it just won't be there next time
            log::warn!("could not persist {}: {:#}", take.id, e);
        }
        Ok(take)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    pub fn current(&self) -> Option<&TakeId> {
        match &self.state {
            RecorderState::Recording { id, .. } => Some(id),
            RecorderState::Idle => None,
        }
    }

    pub fn next_take_number(&self) -> u32 {
        self.next_take
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipeline::stroke_buffer::Voicing;
    use crate::pipeline::voice_binding::VoiceBinding;
    use crate::shared::{Rgba, Vec3};
    use crate::synth::Synth;

    fn record(stroke_index: usize, start_time: f64) -> VoiceTriggerRecord {
        VoiceTriggerRecord {
            stroke_index,
            start_time,
            note: 64,
            timbre: 1.0,
            pan: 0.0,
            color: Rgba::default(),
        }
    }

    fn setup() -> (tempfile::TempDir, Synth) {
        let dir = tempfile::tempdir().unwrap();
        let synth = Synth::new(VoiceBinding::default(), dir.path().to_path_buf());
        (dir, synth)
    }

    #[test]
    fn double_start_keeps_one_id() {
        let (_dir, mut synth) = setup();
        let mut rec = LoopRecorder::new(1);
        assert_eq!(rec.start_recording(0.0, &mut synth), Ok(TakeId::numbered(1)));
        assert_eq!(rec.start_recording(0.5, &mut synth), Err(BrushError::AlreadyRecording));
        assert_eq!(rec.next_take_number(), 2);
        assert_eq!(rec.current(), Some(&TakeId::numbered(1)));
    }

    #[test]
    fn stop_while_idle() {
        let (_dir, mut synth) = setup();
        let mut rec = LoopRecorder::new(1);
        let buffer = StrokeBuffer::new();
        assert_eq!(
            rec.stop_recording(1.0, &buffer, &mut synth),
            Err(BrushError::NotRecording)
        );
    }

    #[test]
    fn empty_take_is_valid() {
        let (_dir, mut synth) = setup();
        let mut rec = LoopRecorder::new(4);
        rec.start_recording(2.0, &mut synth).unwrap();
        let take = rec.stop_recording(3.5, &StrokeBuffer::new(), &mut synth).unwrap();
        assert_eq!(take.id, TakeId::numbered(4));
        assert_eq!(take.recorded_duration, 1.5);
        assert!(take.is_empty());
        assert_eq!(synth.take_duration(&take.id), Some(1.5));
        assert!(!rec.is_recording());
    }

    #[test]
    fn snapshot_is_relative_to_take_start() {
        let (_dir, mut synth) = setup();
        let mut rec = LoopRecorder::new(1);
        let mut buffer = StrokeBuffer::new();

        let before = buffer.begin_stroke(Rgba::default(), 0.0); // drawn before recording
        buffer.end_stroke(before, 0.5).unwrap();
        rec.capture(record(0, 0.0));

        rec.start_recording(10.0, &mut synth).unwrap();
        let h = buffer.begin_stroke(Rgba::default(), 10.25);
        buffer.append_sample(h, Vec3::default(), Voicing::default(), 10.25).unwrap();
        buffer.append_sample(h, Vec3::new(1.0, 0.0, 0.0), Voicing::default(), 10.5).unwrap();
        buffer.end_stroke(h, 10.75).unwrap();
        rec.capture(record(1, 10.25));

        let held = buffer.begin_stroke(Rgba::default(), 11.0); // still down at stop
        buffer.append_sample(held, Vec3::default(), Voicing::default(), 11.0).unwrap();
        rec.capture(record(2, 11.0));

        let take = rec.stop_recording(11.5, &buffer, &mut synth).unwrap();
        assert_eq!(take.recorded_duration, 1.5);
        assert_eq!(take.entries.len(), 2);
        assert_eq!(take.entries[0].onset, 0.25);
        assert_eq!(take.entries[0].held_for, 0.5);
        assert_eq!(take.entries[0].stroke.samples.len(), 2);
        assert_eq!(take.entries[1].onset, 1.0);
        assert_eq!(take.entries[1].held_for, 0.5);
    }

    #[test]
    fn undone_strokes_are_left_out() {
        let (_dir, mut synth) = setup();
        let mut rec = LoopRecorder::new(1);
        let mut buffer = StrokeBuffer::new();
        rec.start_recording(0.0, &mut synth).unwrap();
        for i in 0..3 {
            let t = i as f64 * 0.1;
            let h = buffer.begin_stroke(Rgba::default(), t);
            buffer.end_stroke(h, t + 0.05).unwrap();
            rec.capture(record(i, t));
        }
        let boundary = buffer.undo().unwrap();
        rec.forget_from(boundary);
        let h = buffer.begin_stroke(Rgba::default(), 0.4); // reuses index 2
        buffer.end_stroke(h, 0.45).unwrap();
        rec.capture(record(2, 0.4));

        let take = rec.stop_recording(1.0, &buffer, &mut synth).unwrap();
        let onsets: Vec<f64> = take.entries.iter().map(|e| e.onset).collect();
        assert_eq!(onsets, vec![0.0, 0.1, 0.4]);
    }

    #[test]
    fn numbering_resumes_past_disk() {
        assert_eq!(resume_numbering(1, None), 1);
        assert_eq!(resume_numbering(1, Some(4)), 5);
        assert_eq!(resume_numbering(9, Some(4)), 9);
        assert_eq!(resume_numbering(1, Some(u32::MAX)), u32::MAX);
    }
}
