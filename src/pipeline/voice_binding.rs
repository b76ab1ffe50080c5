//! Pure mapping from where and how a stroke is drawn to the parameters of the
//! voice it triggers.
//!
//! Pitch follows the vertical position: the top of the canvas is the highest
//! note, the bottom the lowest, covering the 88 keys of a piano (21..=108).
//! The horizontal position sets the pan. The stroke's alpha channel is its
//! timbre, a multiplier on the voice's filter center frequency and bandwidth.

use crate::audio_api::VoiceParams;
use crate::error::{BrushError, BrushResult};
use crate::pipeline::stroke_buffer::StrokeSample;
use crate::pipeline::take::VoiceTriggerRecord;
use crate::shared::{PointerPos, Rgba, Surface, Vec3};

pub const NOTE_LOW: i32 = 21;
pub const NOTE_HIGH: i32 = 108;
pub const A4_NOTE: i32 = 69;
pub const A4_FREQ_HZ: f64 = 440.0;
pub const NEUTRAL_TIMBRE: f32 = 1.0;

pub fn compute_note(y: f32, screen_height: f32) -> i32 {
    let v = if screen_height > 0.0 && screen_height.is_finite() && y.is_finite() {
        ((screen_height - y) / screen_height).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let span = (NOTE_HIGH - NOTE_LOW + 1) as f32;
    (NOTE_LOW + (v * span).floor() as i32).min(NOTE_HIGH)
}

pub fn compute_pan(x: f32, screen_width: f32) -> f32 {
    if !(screen_width > 0.0 && screen_width.is_finite() && x.is_finite()) {
        return 0.0;
    }
    ((x / screen_width) * 2.0 - 1.0).clamp(-1.0, 1.0)
}

pub fn compute_frequency(note: i32, reference_pitch: f64) -> f64 {
    reference_pitch * 2.0_f64.powf((note - A4_NOTE) as f64 / 12.0)
}

pub fn compute_timbre(alpha: f32) -> BrushResult<f32> {
    if alpha == 0.0 || !alpha.is_finite() {
        return Err(BrushError::DivisionByZero);
    }
    Ok(alpha)
}

pub fn timbre_or_neutral(alpha: f32) -> f32 {
    compute_timbre(alpha).unwrap_or_else(|e| {
        log::warn!("alpha {}: {}, using neutral timbre", alpha, e);
        NEUTRAL_TIMBRE
    })
}

pub fn apply_timbre(value: f32, timbre: f32) -> f32 {
    value * timbre
}

pub fn restore_timbre(value: f32, timbre: f32) -> BrushResult<f32> {
    if timbre == 0.0 {
        return Err(BrushError::DivisionByZero);
    }
    Ok(value / timbre)
}

impl VoiceParams {
    /// Swap the timbre scaling without compounding the previous one.
    pub fn with_timbre(self, timbre: f32) -> BrushResult<Self> {
        let cutoff = restore_timbre(self.cutoff_hz, self.timbre)?;
        let bandwidth = restore_timbre(self.bandwidth_hz, self.timbre)?;
        Ok(Self {
            timbre,
            cutoff_hz: apply_timbre(cutoff, timbre),
            bandwidth_hz: apply_timbre(bandwidth, timbre),
            ..self
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceBinding {
    pub reference_pitch: f64,
    pub amplitude: f32,
    pub base_cutoff_hz: f32,
    pub base_bandwidth_hz: f32,
}

impl Default for VoiceBinding {
    fn default() -> Self {
        Self {
            reference_pitch: A4_FREQ_HZ,
            amplitude: 0.3,
            base_cutoff_hz: 2500.0,
            base_bandwidth_hz: 2500.0,
        }
    }
}

impl VoiceBinding {
    pub fn bind(
        &self,
        pointer: PointerPos,
        surface: Surface,
        color: Rgba,
        position: Vec3,
    ) -> (i32, VoiceParams) {
        let note = compute_note(pointer.y, surface.height);
        let pan = compute_pan(pointer.x, surface.width);
        let timbre = timbre_or_neutral(color.a);
        (note, self.params(note, pan, timbre, color, position))
    }

    /// Rebuild the parameters a recorded trigger sounded with.
    pub fn params_for(&self, record: &VoiceTriggerRecord, position: Vec3) -> VoiceParams {
        self.params(record.note, record.pan, record.timbre, record.color, position)
    }

    /// Parameters of a recorded voice as it was at one of its stroke's samples.
    pub fn params_at(&self, record: &VoiceTriggerRecord, sample: &StrokeSample) -> VoiceParams {
        self.params(
            record.note,
            sample.voicing.pan,
            sample.voicing.timbre,
            record.color,
            sample.position,
        )
    }

    fn params(&self, note: i32, pan: f32, timbre: f32, color: Rgba, position: Vec3) -> VoiceParams {
        VoiceParams {
            frequency: compute_frequency(note, self.reference_pitch) as f32,
            amplitude: self.amplitude,
            pan,
            timbre,
            cutoff_hz: apply_timbre(self.base_cutoff_hz, timbre),
            bandwidth_hz: apply_timbre(self.base_bandwidth_hz, timbre),
            color,
            position,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reference_pitch_and_octave() {
        assert_eq!(compute_frequency(69, 440.0), 440.0);
        assert_eq!(compute_frequency(81, 440.0), 880.0);
        assert_eq!(compute_frequency(57, 440.0), 220.0);
        assert_eq!(compute_frequency(69, 432.0), 432.0);
    }

    #[test]
    fn note_covers_range_edge_to_edge() {
        assert_eq!(compute_note(0.0, 40.0), NOTE_HIGH);
        assert_eq!(compute_note(40.0, 40.0), NOTE_LOW);
        assert_eq!(compute_note(-5.0, 40.0), NOTE_HIGH);
        assert_eq!(compute_note(100.0, 40.0), NOTE_LOW);
        assert_eq!(compute_note(20.0, 0.0), NOTE_LOW);
        assert_eq!(compute_note(f32::NAN, 40.0), NOTE_LOW);
        let mid = compute_note(20.0, 40.0);
        assert!(mid > NOTE_LOW && mid < NOTE_HIGH);
    }

    #[test]
    fn note_rises_towards_the_top() {
        let notes: Vec<i32> = (0..=30).rev().map(|y| compute_note(y as f32, 30.0)).collect();
        assert!(notes.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn pan_spans_width() {
        assert_eq!(compute_pan(0.0, 80.0), -1.0);
        assert_eq!(compute_pan(40.0, 80.0), 0.0);
        assert_eq!(compute_pan(80.0, 80.0), 1.0);
        assert_eq!(compute_pan(10.0, 0.0), 0.0);
    }

    #[test]
    fn timbre_round_trip() {
        for t in [0.1_f32, 0.35, 1.0, 2.5] {
            for v in [10.0_f32, 440.0, 2500.0] {
                let back = restore_timbre(apply_timbre(v, t), t).unwrap();
                assert!((back - v).abs() <= v * 1e-6, "{} {} {}", v, t, back);
            }
        }
    }

    #[test]
    fn zero_alpha_is_rejected() {
        assert_eq!(compute_timbre(0.0), Err(BrushError::DivisionByZero));
        assert_eq!(restore_timbre(100.0, 0.0), Err(BrushError::DivisionByZero));
        assert_eq!(timbre_or_neutral(0.0), NEUTRAL_TIMBRE);
        assert_eq!(timbre_or_neutral(0.4), 0.4);
    }

    #[test]
    fn retimbre_does_not_drift() {
        let binding = VoiceBinding::default();
        let pointer = PointerPos { x: 10.0, y: 5.0 };
        let surface = Surface { width: 40.0, height: 20.0 };
        let (_, params) = binding.bind(pointer, surface, Rgba::new(1.0, 1.0, 1.0, 0.5), Vec3::default());
        assert_eq!(params.cutoff_hz, 1250.0);
        let mut p = params;
        for t in [0.2, 0.9, 0.3, 0.7, 0.5] {
            p = p.with_timbre(t).unwrap();
        }
        assert!((p.cutoff_hz - params.cutoff_hz).abs() < 1e-2);
        assert!((p.bandwidth_hz - params.bandwidth_hz).abs() < 1e-2);
    }

    #[test]
    fn bind_matches_playback_params() {
        let binding = VoiceBinding::default();
        let color = Rgba::new(0.2, 0.4, 0.6, 0.8);
        let position = Vec3::new(1.0, 2.0, 0.0);
        let (note, live) = binding.bind(
            PointerPos { x: 30.0, y: 3.0 },
            Surface { width: 40.0, height: 20.0 },
            color,
            position,
        );
        let record = VoiceTriggerRecord {
            stroke_index: 0,
            start_time: 0.0,
            note,
            timbre: live.timbre,
            pan: live.pan,
            color,
        };
        assert_eq!(binding.params_for(&record, position), live);
    }
}
