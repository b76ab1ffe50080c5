use std::fmt;

use crate::pipeline::take::TakeId;

/// Recoverable failures of the gesture core. None of these are fatal; the
/// middle layer logs them and carries on.
#[derive(Clone, Debug, PartialEq)]
pub enum BrushError {
    /// Undo requested with no stroke boundary left
    EmptyHistory,
    /// Loop toggle asked to start a take while one is already being recorded
    AlreadyRecording,
    /// Loop toggle asked to stop a take while idle
    NotRecording,
    /// Timbre of zero would be used as a divisor
    DivisionByZero,
    /// A playback cursor names a take or entry that no longer exists
    MissingReference { take: TakeId, entry: usize },
    /// Append/end on a stroke that is not the open one
    StaleStroke,
    /// Sample would go backwards in time within its stroke
    OutOfOrderSample { previous: f64, offset: f64 },
}

impl fmt::Display for BrushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrushError::EmptyHistory => write!(f, "nothing to undo"),
            BrushError::AlreadyRecording => write!(f, "already recording a take"),
            BrushError::NotRecording => write!(f, "not recording"),
            BrushError::DivisionByZero => write!(f, "timbre of zero cannot be restored"),
            BrushError::MissingReference { take, entry } => {
                write!(f, "take {} has no entry {}", take, entry)
            }
            BrushError::StaleStroke => write!(f, "stroke is not open"),
            BrushError::OutOfOrderSample { previous, offset } => write!(
                f,
                "sample offset {:.4}s is earlier than previous {:.4}s",
                offset, previous
            ),
        }
    }
}

impl std::error::Error for BrushError {}

pub type BrushResult<T> = Result<T, BrushError>;
