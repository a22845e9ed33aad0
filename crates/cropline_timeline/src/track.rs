// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tracks: ordered, non-overlapping rows of segments.
//!
//! A track stores segment IDs only; the segments themselves live in the
//! timeline's arena, so every query takes the arena as a parameter. IDs are
//! kept sorted by start frame and ranges never overlap.

use crate::key_frame::FrameNumber;
use crate::segment::{Segment, SegmentId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One row of the timeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    segments: Vec<SegmentId>,
}

impl Track {
    /// Create an empty track
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the segment IDs in start-frame order
    pub fn segments(&self) -> &[SegmentId] {
        &self.segments
    }

    /// Check if the track holds no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Insert `id` at its sorted position
    ///
    /// The segment must already be present in `arena`.
    pub fn insert(&mut self, id: SegmentId, arena: &IndexMap<SegmentId, Segment>) {
        let start = arena.get(&id).map_or(0, Segment::start_frame);
        let at = self
            .segments
            .partition_point(|other| arena.get(other).map_or(0, Segment::start_frame) < start);
        self.segments.insert(at, id);
    }

    /// Remove `id` from the track
    pub fn remove(&mut self, id: SegmentId) -> bool {
        match self.segments.iter().position(|&other| other == id) {
            Some(at) => {
                self.segments.remove(at);
                true
            }
            None => false,
        }
    }

    /// Re-sort after a segment's start frame changed
    pub fn resort(&mut self, arena: &IndexMap<SegmentId, Segment>) {
        self.segments
            .sort_by_key(|id| arena.get(id).map_or(0, Segment::start_frame));
    }

    /// Find the segment whose range contains `frame`, if any
    pub fn segment_at(
        &self,
        frame: FrameNumber,
        arena: &IndexMap<SegmentId, Segment>,
    ) -> Option<SegmentId> {
        self.segments
            .iter()
            .copied()
            .find(|id| arena.get(id).is_some_and(|seg| seg.contains(frame)))
    }

    /// Check whether `[start, end]` would collide with any segment on this
    /// track other than `exclude`
    pub fn overlaps(
        &self,
        start: FrameNumber,
        end: FrameNumber,
        exclude: Option<SegmentId>,
        arena: &IndexMap<SegmentId, Segment>,
    ) -> bool {
        self.segments
            .iter()
            .filter(|&&id| Some(id) != exclude)
            .filter_map(|id| arena.get(id))
            .any(|seg| start <= seg.end_frame() && end >= seg.start_frame())
    }

    /// The segment immediately after `id` in start-frame order
    pub fn next_segment(&self, id: SegmentId) -> Option<SegmentId> {
        let at = self.segments.iter().position(|&other| other == id)?;
        self.segments.get(at + 1).copied()
    }

    /// The segment immediately before `id` in start-frame order
    pub fn previous_segment(&self, id: SegmentId) -> Option<SegmentId> {
        let at = self.segments.iter().position(|&other| other == id)?;
        at.checked_sub(1).and_then(|at| self.segments.get(at)).copied()
    }
}
