// Live strokes drawn on the canvas, with undo boundaries.

use serde::{Deserialize, Serialize};

use crate::error::{BrushError, BrushResult};
use crate::pipeline::voice_binding::NEUTRAL_TIMBRE;
use crate::shared::{Rgba, Vec3};

/// How the stroke's voice sounded when a sample was taken. Pitch is fixed per
/// stroke; pan follows the pointer and timbre follows alpha changes while held.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Voicing {
    pub pan: f32,
    pub timbre: f32,
}

impl Default for Voicing {
    fn default() -> Self {
        Self {
            pan: 0.0,
            timbre: NEUTRAL_TIMBRE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokeSample {
    pub position: Vec3,
    #[serde(default)]
    pub voicing: Voicing,
    pub time_offset: f64, // seconds since the stroke's first sample
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Rgba,
    pub samples: Vec<StrokeSample>,
    pub held_for: Option<f64>, // set once, on pointer up
}

impl Stroke {
    fn new(color: Rgba) -> Self {
        Self {
            color,
            samples: Vec::new(),
            held_for: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StrokeHandle(pub usize);

#[derive(Clone, Copy, Debug)]
struct OpenStroke {
    index: usize,
    started_at: f64,
}

#[derive(Debug, Default)]
pub struct StrokeBuffer {
    strokes: Vec<Stroke>,
    boundaries: Vec<usize>, // stroke count at each pointer down, strictly increasing
    open: Option<OpenStroke>,
}

impl StrokeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_stroke(&mut self, color: Rgba, now: f64) -> StrokeHandle {
        if let Some(open) = self.open.take() {
            // pointer up never arrived; close what we have
            log::debug!("closing stroke {} left open by a lost pointer up", open.index);
            self.strokes[open.index].held_for = Some((now - open.started_at).max(0.0));
        }
        let index = self.strokes.len();
        self.boundaries.push(index);
        self.strokes.push(Stroke::new(color));
        self.open = Some(OpenStroke { index, started_at: now });
        StrokeHandle(index)
    }

    pub fn append_sample(
        &mut self,
        handle: StrokeHandle,
        position: Vec3,
        voicing: Voicing,
        now: f64,
    ) -> BrushResult<StrokeSample> {
        let open = self.open_matching(handle)?;
        let offset = now - open.started_at;
        let stroke = &mut self.strokes[open.index];
        let previous = stroke.samples.last().map(|s| s.time_offset).unwrap_or(0.0);
        if offset < previous || offset < 0.0 {
            return Err(BrushError::OutOfOrderSample { previous, offset });
        }
        let sample = StrokeSample {
            position,
            voicing,
            time_offset: offset,
        };
        stroke.samples.push(sample);
        Ok(sample)
    }

    pub fn end_stroke(&mut self, handle: StrokeHandle, now: f64) -> BrushResult<()> {
        let open = self.open_matching(handle)?;
        self.strokes[open.index].held_for = Some((now - open.started_at).max(0.0));
        self.open = None;
        Ok(())
    }

    /// Remove the most recent stroke. Returns the boundary that was popped, ie.
    /// the index of the first stroke removed.
    pub fn undo(&mut self) -> BrushResult<usize> {
        let boundary = self.boundaries.pop().ok_or(BrushError::EmptyHistory)?;
        self.strokes.truncate(boundary);
        if self.open.is_some_and(|open| open.index >= boundary) {
            self.open = None;
        }
        Ok(boundary)
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.boundaries.clear();
        self.open = None;
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn get(&self, index: usize) -> Option<&Stroke> {
        self.strokes.get(index)
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn open_stroke(&self) -> Option<StrokeHandle> {
        self.open.map(|open| StrokeHandle(open.index))
    }

    fn open_matching(&self, handle: StrokeHandle) -> BrushResult<OpenStroke> {
        match self.open {
            Some(open) if open.index == handle.0 => Ok(open),
            _ => Err(BrushError::StaleStroke),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn p(x: f32) -> Vec3 {
        Vec3::new(x, 0.0, 0.0)
    }

    #[test]
    fn offsets_are_non_decreasing() {
        let mut buf = StrokeBuffer::new();
        let h = buf.begin_stroke(Rgba::default(), 2.0);
        for t in [2.0, 2.0, 2.1, 2.35, 2.35, 3.0] {
            buf.append_sample(h, p(t as f32), Voicing::default(), t).unwrap();
        }
        let offsets: Vec<f64> = buf.strokes()[0].samples.iter().map(|s| s.time_offset).collect();
        assert_eq!(offsets[0], 0.0);
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn rewound_clock_is_rejected() {
        let mut buf = StrokeBuffer::new();
        let h = buf.begin_stroke(Rgba::default(), 5.0);
        buf.append_sample(h, p(0.0), Voicing::default(), 5.5).unwrap();
        let err = buf.append_sample(h, p(1.0), Voicing::default(), 5.2).unwrap_err();
        assert!(matches!(err, BrushError::OutOfOrderSample { .. }));
        assert_eq!(buf.strokes()[0].samples.len(), 1);
    }

    #[test]
    fn undo_restores_previous_state() {
        let mut buf = StrokeBuffer::new();
        let first = buf.begin_stroke(Rgba::default(), 0.0);
        buf.append_sample(first, p(0.0), Voicing::default(), 0.0).unwrap();
        buf.end_stroke(first, 0.3).unwrap();
        let before = buf.strokes().to_vec();

        let h = buf.begin_stroke(Rgba::default(), 1.0);
        for i in 0..5 {
            buf.append_sample(h, p(i as f32), Voicing::default(), 1.0 + i as f64 * 0.1).unwrap();
        }
        buf.end_stroke(h, 1.6).unwrap();

        assert_eq!(buf.len(), 2);
        assert_eq!(buf.undo(), Ok(1));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.strokes(), before.as_slice());
        assert_eq!(buf.undo(), Ok(0));
        assert!(buf.strokes().is_empty());
        assert_eq!(buf.undo(), Err(BrushError::EmptyHistory));
        assert!(buf.strokes().is_empty());
    }

    #[test]
    fn undo_of_held_stroke_closes_it() {
        let mut buf = StrokeBuffer::new();
        let h = buf.begin_stroke(Rgba::default(), 0.0);
        buf.append_sample(h, p(0.0), Voicing::default(), 0.0).unwrap();
        buf.undo().unwrap();
        assert_eq!(buf.open_stroke(), None);
        assert_eq!(buf.append_sample(h, p(1.0), Voicing::default(), 0.1), Err(BrushError::StaleStroke));
    }

    #[test]
    fn stale_handle_is_rejected() {
        let mut buf = StrokeBuffer::new();
        let old = buf.begin_stroke(Rgba::default(), 0.0);
        buf.end_stroke(old, 0.5).unwrap();
        assert_eq!(buf.append_sample(old, p(0.0), Voicing::default(), 0.6), Err(BrushError::StaleStroke));
        assert_eq!(buf.end_stroke(old, 0.7), Err(BrushError::StaleStroke));
        assert_eq!(buf.strokes()[0].held_for, Some(0.5));
    }

    #[test]
    fn begin_closes_a_stroke_left_open() {
        let mut buf = StrokeBuffer::new();
        let a = buf.begin_stroke(Rgba::default(), 0.0);
        let b = buf.begin_stroke(Rgba::default(), 0.25);
        assert_ne!(a, b);
        assert_eq!(buf.strokes()[0].held_for, Some(0.25));
        assert_eq!(buf.open_stroke(), Some(b));
    }

    #[test]
    fn clear_drops_history() {
        let mut buf = StrokeBuffer::new();
        buf.begin_stroke(Rgba::default(), 0.0);
        buf.begin_stroke(Rgba::default(), 1.0);
        assert!(!buf.is_empty());
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.open_stroke(), None);
        assert_eq!(buf.undo(), Err(BrushError::EmptyHistory));
    }
}
