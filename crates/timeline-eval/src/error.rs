//! Error types for timeline validation.

use thiserror::Error;

use crate::types::TrackKind;

/// A structural problem found in a timeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineEvalError {
    #[error("{kind} segments {first} and {second} overlap")]
    Overlap {
        kind: TrackKind,
        first: usize,
        second: usize,
    },

    #[error("{kind} segment {index} starts before its predecessor")]
    Unsorted { kind: TrackKind, index: usize },

    #[error("{kind} segment {index} has end <= start ({start} .. {end})")]
    InvertedSegment {
        kind: TrackKind,
        index: usize,
        start: f64,
        end: f64,
    },

    #[error("clip {index} has non-positive timescale {timescale}")]
    InvalidTimescale { index: usize, timescale: f64 },

    #[error("timeline has no clip segments")]
    EmptyTimeline,

    #[error("{kind} segment {index} extends past the timeline end ({end} > {total})")]
    OutOfRange {
        kind: TrackKind,
        index: usize,
        end: f64,
        total: f64,
    },
}
