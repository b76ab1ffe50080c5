// Note on/off schedule for one playing take, relative to when playback began.

use crate::pipeline::take::Take;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqEventKind {
    On,
    Update { sample: usize }, // voice moves to this sample's position and voicing
    Off,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeqEvent {
    pub at: f64,
    pub entry: usize,
    pub kind: SeqEventKind,
}

#[derive(Clone, Debug)]
pub struct Sequence {
    events: Vec<SeqEvent>,
    next: usize,
    started_at: f64,
    duration: f64,
}

impl Sequence {
    pub fn from_take(take: &Take, started_at: f64) -> Self {
        let mut events = Vec::with_capacity(take.entries.len() * 2);
        for (entry, e) in take.entries.iter().enumerate() {
            events.push(SeqEvent { at: e.onset, entry, kind: SeqEventKind::On });
            // the first sample is what the note starts with
            for (sample, s) in e.stroke.samples.iter().enumerate().skip(1) {
                if s.time_offset > e.held_for {
                    break;
                }
                events.push(SeqEvent {
                    at: e.onset + s.time_offset,
                    entry,
                    kind: SeqEventKind::Update { sample },
                });
            }
            events.push(SeqEvent {
                at: e.onset + e.held_for,
                entry,
                kind: SeqEventKind::Off,
            });
        }
        // stable, so an entry's On, Updates and Off keep their order on equal times
        events.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            events,
            next: 0,
            started_at,
            duration: take.recorded_duration,
        }
    }

    /// Hand every event that has come due by `now` to `emit`, in time order.
    pub fn advance(&mut self, now: f64, mut emit: impl FnMut(SeqEvent)) {
        let elapsed = now - self.started_at;
        while let Some(event) = self.events.get(self.next) {
            if event.at > elapsed {
                break;
            }
            emit(*event);
            self.next += 1;
        }
    }

    pub fn is_finished(&self, now: f64) -> bool {
        now - self.started_at >= self.duration
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipeline::stroke_buffer::Stroke;
    use crate::pipeline::take::{TakeEntry, TakeId, VoiceTriggerRecord};
    use crate::shared::Rgba;

    fn entry(onset: f64, held_for: f64) -> TakeEntry {
        TakeEntry {
            onset,
            held_for,
            stroke: Stroke {
                color: Rgba::default(),
                samples: vec![],
                held_for: Some(held_for),
            },
            trigger: VoiceTriggerRecord {
                stroke_index: 0,
                start_time: onset,
                note: 60,
                timbre: 1.0,
                pan: 0.0,
                color: Rgba::default(),
            },
        }
    }

    fn take(entries: Vec<TakeEntry>, duration: f64) -> Take {
        Take {
            id: TakeId::numbered(1),
            recorded_duration: duration,
            entries,
        }
    }

    fn collect(seq: &mut Sequence, now: f64) -> Vec<(usize, SeqEventKind)> {
        let mut out = vec![];
        seq.advance(now, |e| out.push((e.entry, e.kind)));
        out
    }

    #[test]
    fn events_fire_once_in_order() {
        let t = take(vec![entry(0.5, 0.25), entry(0.0, 1.0)], 2.0);
        let mut seq = Sequence::from_take(&t, 10.0);
        assert_eq!(collect(&mut seq, 10.0), vec![(1, SeqEventKind::On)]);
        assert_eq!(collect(&mut seq, 10.0), vec![]);
        assert_eq!(
            collect(&mut seq, 10.8),
            vec![(0, SeqEventKind::On), (0, SeqEventKind::Off)]
        );
        assert_eq!(collect(&mut seq, 12.0), vec![(1, SeqEventKind::Off)]);
    }

    #[test]
    fn zero_length_note_still_turns_on_first() {
        let t = take(vec![entry(0.1, 0.0)], 1.0);
        let mut seq = Sequence::from_take(&t, 0.0);
        assert_eq!(
            collect(&mut seq, 0.2),
            vec![(0, SeqEventKind::On), (0, SeqEventKind::Off)]
        );
    }

    #[test]
    fn updates_follow_the_samples_while_held() {
        use crate::pipeline::stroke_buffer::{StrokeSample, Voicing};
        let mut e = entry(1.0, 0.5);
        e.stroke.samples = [0.0, 0.25, 0.5, 0.75]
            .iter()
            .map(|&time_offset| StrokeSample {
                position: Default::default(),
                voicing: Voicing::default(),
                time_offset,
            })
            .collect();
        let mut seq = Sequence::from_take(&take(vec![e], 2.0), 0.0);
        assert_eq!(collect(&mut seq, 1.0), vec![(0, SeqEventKind::On)]);
        assert_eq!(collect(&mut seq, 1.3), vec![(0, SeqEventKind::Update { sample: 1 })]);
        // the sample past the note's end never sounds
        assert_eq!(
            collect(&mut seq, 2.0),
            vec![(0, SeqEventKind::Update { sample: 2 }), (0, SeqEventKind::Off)]
        );
    }

    #[test]
    fn finished_at_recorded_duration() {
        let seq = Sequence::from_take(&take(vec![], 0.5), 10.0);
        assert!(!seq.is_finished(10.25));
        assert!(seq.is_finished(10.5));
    }
}
