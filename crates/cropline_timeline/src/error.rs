// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for timeline edit operations.

use crate::key_frame::FrameNumber;
use crate::segment::SegmentId;
use thiserror::Error;

/// Rejection reasons for edit operations
///
/// Every edit validates its preconditions before mutating anything, so a
/// returned error guarantees the timeline and the change log are unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// Segment ID not present in the timeline
    #[error("Unknown segment {0:?}")]
    UnknownSegment(SegmentId),

    /// Track number out of range
    #[error("Unknown track {0}")]
    UnknownTrack(usize),

    /// Target range would overlap another segment on the track
    #[error("Segment range would overlap an existing segment on track {0}")]
    SegmentOverlap(usize),

    /// Frame range falls outside the timeline bounds or is degenerate
    #[error("Frame range out of bounds")]
    OutOfBounds,

    /// Split point must fall strictly inside the segment's range
    #[error("Split frame {0} is not strictly inside the segment")]
    InvalidSplitPoint(FrameNumber),

    /// Merge requires two immediately adjacent segments on the same track
    #[error("Segments are not adjacent on the same track")]
    NotAdjacent,

    /// The keyframe at a segment's start frame can never be removed
    #[error("The first keyframe of a segment cannot be removed")]
    FirstKeyFrameProtected,

    /// A keyframe already exists at the cursor frame
    #[error("A keyframe already exists at frame {0}")]
    KeyFrameExists(FrameNumber),

    /// No keyframe at the given frame
    #[error("No keyframe at frame {0}")]
    UnknownKeyFrame(FrameNumber),

    /// Keyframe payloads in a segment must share one shape kind
    #[error("Shape kind does not match the segment's keyframes")]
    ShapeKindMismatch,
}
