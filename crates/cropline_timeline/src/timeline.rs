// SPDX-License-Identifier: MIT OR Apache-2.0
//! The timeline: tracks, the segment arena, the cursor and active state.
//!
//! Segments are owned by one arena and addressed by ID everywhere else, so
//! checking whether an edit target still exists is a plain map lookup.
//! Active state is recomputed explicitly, on cursor moves and after edits
//! that touch a segment under the cursor; nothing subscribes to anything.

use crate::key_frame::{FrameNumber, KeyFrameId};
use crate::segment::{Segment, SegmentId, ShapeSample};
use crate::track::Track;
use cropline_shapes::ShapeData;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a track shows at the cursor frame
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveState {
    /// The segment containing the cursor
    pub segment: SegmentId,
    /// The keyframe exactly on the cursor, if any
    pub key_frame: Option<KeyFrameId>,
    /// The displayed shape; derived by interpolation when `key_frame` is
    /// `None` and then not editable in place
    pub shape: ShapeData,
}

impl ActiveState {
    /// Whether the displayed shape can be edited in place
    pub fn is_editable(&self) -> bool {
        self.key_frame.is_some()
    }
}

/// The full editing model: tracks of segments over a fixed frame count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub(crate) segments: IndexMap<SegmentId, Segment>,
    pub(crate) tracks: Vec<Track>,
    frame_count: FrameNumber,
    cursor_frame: FrameNumber,
    #[serde(skip)]
    active: BTreeMap<usize, ActiveState>,
}

impl Timeline {
    /// Create an empty timeline spanning `frame_count` frames
    pub fn new(frame_count: FrameNumber) -> Self {
        Self {
            segments: IndexMap::new(),
            tracks: Vec::new(),
            frame_count,
            cursor_frame: 0,
            active: BTreeMap::new(),
        }
    }

    /// Create a timeline with `track_count` empty tracks
    pub fn with_tracks(frame_count: FrameNumber, track_count: usize) -> Self {
        let mut timeline = Self::new(frame_count);
        timeline.tracks = vec![Track::new(); track_count];
        timeline
    }

    /// Total number of frames; valid cursor positions are `0..frame_count`
    pub fn frame_count(&self) -> FrameNumber {
        self.frame_count
    }

    /// Current cursor position
    pub fn cursor_frame(&self) -> FrameNumber {
        self.cursor_frame
    }

    /// Get the tracks in row order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Number of tracks
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Look up a segment by ID
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id)
    }

    /// Iterate over all segments
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// Number of segments across all tracks
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Move the cursor to `frame` (clamped to the timeline) and recompute
    /// active state on every track
    pub fn seek(&mut self, frame: FrameNumber) {
        self.cursor_frame = frame.min(self.frame_count.saturating_sub(1));
        self.refresh_active_states();
    }

    /// What `track_number` shows at the cursor, if a segment covers it
    pub fn active_state(&self, track_number: usize) -> Option<&ActiveState> {
        self.active.get(&track_number)
    }

    /// Recompute the active state of every track at the cursor
    pub(crate) fn refresh_active_states(&mut self) {
        self.active.clear();
        for track_number in 0..self.tracks.len() {
            self.refresh_track_active_state(track_number);
        }
    }

    /// Recompute the active state of one track at the cursor
    pub(crate) fn refresh_track_active_state(&mut self, track_number: usize) {
        self.active.remove(&track_number);
        let Some(track) = self.tracks.get(track_number) else {
            return;
        };
        let Some(id) = track.segment_at(self.cursor_frame, &self.segments) else {
            return;
        };
        let Some(segment) = self.segments.get(&id) else {
            return;
        };
        let Some(sample) = segment.sample_at(self.cursor_frame) else {
            return;
        };
        let state = match sample {
            ShapeSample::KeyFrame(kf) => ActiveState {
                segment: id,
                key_frame: Some(kf.id),
                shape: kf.shape.clone(),
            },
            ShapeSample::Interpolated(shape) => ActiveState {
                segment: id,
                key_frame: None,
                shape,
            },
        };
        self.active.insert(track_number, state);
    }

    /// Refresh active state on `track_number` if the cursor falls inside
    /// `[start, end]`
    pub(crate) fn refresh_if_cursor_in(
        &mut self,
        track_number: usize,
        start: FrameNumber,
        end: FrameNumber,
    ) {
        if self.cursor_frame >= start && self.cursor_frame <= end {
            self.refresh_track_active_state(track_number);
        }
    }

    /// The nearest keyframe frame strictly before the cursor on
    /// `track_number`, looking across all of its segments
    pub fn previous_key_frame_in_track(&self, track_number: usize) -> Option<FrameNumber> {
        self.key_frame_frames(track_number)
            .filter(|&frame| frame < self.cursor_frame)
            .max()
    }

    /// The nearest keyframe frame strictly after the cursor on
    /// `track_number`, looking across all of its segments
    pub fn next_key_frame_in_track(&self, track_number: usize) -> Option<FrameNumber> {
        self.key_frame_frames(track_number)
            .filter(|&frame| frame > self.cursor_frame)
            .min()
    }

    fn key_frame_frames(&self, track_number: usize) -> impl Iterator<Item = FrameNumber> + '_ {
        self.tracks
            .get(track_number)
            .into_iter()
            .flat_map(|track| track.segments().iter())
            .filter_map(|id| self.segments.get(id))
            .flat_map(|seg| seg.key_frames().iter().map(|kf| kf.frame_number))
    }
}
