// A recorded loop. Built once when recording stops, never changed afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BrushError, BrushResult};
use crate::pipeline::stroke_buffer::Stroke;
use crate::shared::Rgba;

const TAKE_PREFIX: &str = "sound";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TakeId(pub String);

impl TakeId {
    pub fn numbered(n: u32) -> Self {
        Self(format!("{}{}", TAKE_PREFIX, n))
    }

    /// N for ids of the form "sound<N>", used to resume numbering after a restart.
    pub fn number(&self) -> Option<u32> {
        self.0.strip_prefix(TAKE_PREFIX)?.parse().ok()
    }
}

impl fmt::Display for TakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Made on pointer down; what the synth was told to sound for one stroke.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoiceTriggerRecord {
    pub stroke_index: usize,
    pub start_time: f64, // absolute clock time of pointer down
    pub note: i32,
    pub timbre: f32,
    pub pan: f32,
    pub color: Rgba,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TakeEntry {
    pub onset: f64,    // seconds after the take started
    pub held_for: f64, // note length, never past the end of the take
    pub stroke: Stroke,
    pub trigger: VoiceTriggerRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Take {
    pub id: TakeId,
    pub recorded_duration: f64,
    pub entries: Vec<TakeEntry>,
}

impl Take {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sample offsets never go backwards within a stroke; the trail query relies on it.
    pub fn check_order(&self) -> BrushResult<()> {
        for entry in &self.entries {
            let mut previous = 0.0;
            for s in &entry.stroke.samples {
                if s.time_offset < previous {
                    return Err(BrushError::OutOfOrderSample {
                        previous,
                        offset: s.time_offset,
                    });
                }
                previous = s.time_offset;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn numbered_ids() {
        let id = TakeId::numbered(7);
        assert_eq!(id.to_string(), "sound7");
        assert_eq!(id.number(), Some(7));
        assert_eq!(TakeId("loop3".into()).number(), None);
    }

    fn take_with_offsets(offsets: &[f64]) -> Take {
        use crate::pipeline::stroke_buffer::{StrokeSample, Voicing};
        use crate::shared::Vec3;
        let color = Rgba::new(1.0, 1.0, 1.0, 1.0);
        let samples = offsets
            .iter()
            .map(|&time_offset| StrokeSample {
                position: Vec3::new(0.0, 0.0, 0.0),
                voicing: Voicing::default(),
                time_offset,
            })
            .collect();
        Take {
            id: TakeId::numbered(1),
            recorded_duration: 2.0,
            entries: vec![TakeEntry {
                onset: 0.0,
                held_for: 1.0,
                stroke: Stroke { color, samples, held_for: Some(1.0) },
                trigger: VoiceTriggerRecord {
                    stroke_index: 0,
                    start_time: 0.0,
                    note: 60,
                    timbre: 1.0,
                    pan: 0.0,
                    color,
                },
            }],
        }
    }

    #[test]
    fn sample_order_is_checked() {
        assert!(take_with_offsets(&[0.0, 0.2, 0.2, 0.9]).check_order().is_ok());
        let err = take_with_offsets(&[0.0, 0.4, 0.3]).check_order().unwrap_err();
        assert!(matches!(err, BrushError::OutOfOrderSample { previous, offset } if previous == 0.4 && offset == 0.3));
        assert!(take_with_offsets(&[-0.1]).check_order().is_err());
    }
}
