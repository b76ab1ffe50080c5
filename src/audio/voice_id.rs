use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u64);

// atomic so live strokes and take playback never hand out the same id
pub fn next_voice_id() -> VoiceId {
    VoiceId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}
