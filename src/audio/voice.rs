use super::frame::StereoFrame;
use super::voice_id::VoiceId;
use crate::audio_api::VoiceParams;

use std::f32::consts::{PI, TAU};

const ATTACK_S: f32 = 0.02;
const SUSTAIN: f32 = 0.7;
const RELEASE_S: f32 = 0.5;
const HARMONICS: usize = 4;
const HARMONIC_NORM: f32 = 1.0 / 2.083_333; // 1/(1 + 1/2 + 1/3 + 1/4)

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Idle,
    Attack,
    Sustain,
    Release,
}

// A few harmonics through a resonant band-pass, shaped by a linear envelope.
#[derive(Clone, Copy, Debug)]
pub struct Voice {
    pub id: Option<VoiceId>,
    pub age: u64, // trigger order, oldest gets stolen first
    stage: Stage,
    level: f32,
    phase: f32, // 0..1
    phase_inc: f32,
    amp: f32,
    pan: f32,
    // state-variable filter
    f: f32,
    damp: f32,
    low: f32,
    band: f32,
}

impl Voice {
    pub const fn idle() -> Self {
        Self {
            id: None,
            age: 0,
            stage: Stage::Idle,
            level: 0.0,
            phase: 0.0,
            phase_inc: 0.0,
            amp: 0.0,
            pan: 0.0,
            f: 0.0,
            damp: 1.0,
            low: 0.0,
            band: 0.0,
        }
    }

    pub fn trigger(&mut self, id: VoiceId, age: u64, params: &VoiceParams, sample_rate: f32) {
        *self = Self::idle();
        self.id = Some(id);
        self.age = age;
        self.stage = Stage::Attack;
        self.set_params(params, sample_rate);
    }

    // keeps phase and envelope running, so a held stroke can change without clicks
    pub fn set_params(&mut self, params: &VoiceParams, sample_rate: f32) {
        self.phase_inc = params.frequency.max(0.0) / sample_rate;
        self.amp = params.amplitude.clamp(0.0, 1.0);
        self.pan = params.pan;
        // f <= 1 and damp <= 1 keep f^2 + 2*f*damp under 4, the stable region
        let cutoff = params.cutoff_hz.clamp(20.0, sample_rate / 6.0);
        self.f = 2.0 * (PI * cutoff / sample_rate).sin();
        self.damp = (params.bandwidth_hz / cutoff).clamp(0.05, 1.0);
    }

    pub fn release(&mut self) {
        if self.stage != Stage::Idle {
            self.stage = Stage::Release;
        }
    }

    pub fn is_free(&self) -> bool {
        self.stage == Stage::Idle
    }

    pub fn next_frame(&mut self, sample_rate: f32) -> StereoFrame {
        match self.stage {
            Stage::Idle => return StereoFrame::zero(),
            Stage::Attack => {
                self.level += SUSTAIN / (ATTACK_S * sample_rate);
                if self.level >= SUSTAIN {
                    self.level = SUSTAIN;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => {}
            Stage::Release => {
                self.level -= SUSTAIN / (RELEASE_S * sample_rate);
                if self.level <= 0.0 {
                    *self = Self::idle();
                    return StereoFrame::zero();
                }
            }
        }

        // harmonics that would fold over nyquist are skipped
        let mut osc = 0.0;
        for k in 1..=HARMONICS {
            if self.phase_inc * k as f32 >= 0.5 {
                break;
            }
            osc += (TAU * self.phase * k as f32).sin() / k as f32;
        }
        osc *= HARMONIC_NORM;
        self.phase += self.phase_inc;
        self.phase -= self.phase.floor();

        self.low += self.f * self.band;
        let high = osc - self.low - self.damp * self.band;
        self.band += self.f * high;
        let filtered = 0.5 * osc + 0.5 * self.band * self.damp;

        StereoFrame::panned(filtered * self.amp * self.level, self.pan)
    }
}
