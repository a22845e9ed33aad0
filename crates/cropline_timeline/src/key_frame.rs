// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions for the timeline.

use cropline_shapes::ShapeData;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Zero-based frame number
pub type FrameNumber = u32;

/// Unique identifier for a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyFrameId(pub Uuid);

impl KeyFrameId {
    /// Create a new random keyframe ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyFrameId {
    fn default() -> Self {
        Self::new()
    }
}

/// A shape sample at a specific frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFrame {
    /// Unique keyframe ID
    pub id: KeyFrameId,
    /// Frame this sample applies to
    pub frame_number: FrameNumber,
    /// Shape payload at this frame
    pub shape: ShapeData,
}

impl KeyFrame {
    /// Create a new keyframe
    pub fn new(frame_number: FrameNumber, shape: ShapeData) -> Self {
        Self {
            id: KeyFrameId::new(),
            frame_number,
            shape,
        }
    }

    /// Deep-copy this keyframe under a fresh ID, relabelled to `frame_number`
    pub fn duplicate_at(&self, frame_number: FrameNumber) -> Self {
        Self::new(frame_number, self.shape.clone())
    }
}

/// Binary search a sorted keyframe slice for `frame`
///
/// `Ok(i)` is an exact match at index `i`; `Err(i)` is the insertion point,
/// the index of the first keyframe with a frame number greater than `frame`.
pub fn lower_bound(key_frames: &[KeyFrame], frame: FrameNumber) -> Result<usize, usize> {
    key_frames.binary_search_by_key(&frame, |kf| kf.frame_number)
}
