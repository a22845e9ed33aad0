// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural edit operations on the timeline.
//!
//! Every operation validates its preconditions up front and rejects with an
//! [`EditError`] before touching anything, so a returned error means the
//! timeline and the recorder are exactly as they were. Mutations land inside
//! one `begin_batch`/`end_batch` bracket per operation, and active state is
//! refreshed for any track whose segments changed under the cursor.

use crate::change::{Delta, EditRecorder};
use crate::error::EditError;
use crate::key_frame::{lower_bound, FrameNumber, KeyFrameId};
use crate::segment::{Segment, SegmentId, ShapeSample};
use crate::timeline::Timeline;
use crate::track::Track;
use cropline_shapes::ShapeData;
use tracing::debug;

impl Timeline {
    /// Append an empty track below the existing ones, returning its number
    pub fn add_track(&mut self, rec: &mut dyn EditRecorder) -> usize {
        let track_number = self.tracks.len();
        rec.begin_batch("add track");
        self.tracks.push(Track::new());
        rec.record(Delta::TrackInserted { track_number });
        rec.end_batch();
        debug!(track_number, "track added");
        track_number
    }

    /// Remove a track with all its segments; higher tracks shift down by one
    pub fn remove_track(
        &mut self,
        track_number: usize,
        rec: &mut dyn EditRecorder,
    ) -> Result<(), EditError> {
        if track_number >= self.tracks.len() {
            return Err(EditError::UnknownTrack(track_number));
        }

        rec.begin_batch("remove track");
        for id in self.tracks[track_number].segments().to_vec() {
            if let Some(segment) = self.segments.shift_remove(&id) {
                rec.record(Delta::SegmentRemoved {
                    segment: Box::new(segment),
                });
            }
        }
        self.tracks.remove(track_number);
        rec.record(Delta::TrackRemoved { track_number });

        // Renumber the tracks that shifted down
        for shifted in track_number..self.tracks.len() {
            for id in self.tracks[shifted].segments().to_vec() {
                if let Some(segment) = self.segments.get_mut(&id) {
                    let start = segment.start_frame();
                    segment.move_to(shifted, start, rec);
                }
            }
        }
        rec.end_batch();

        debug!(track_number, "track removed");
        self.refresh_active_states();
        Ok(())
    }

    /// Create a segment on `track_number` spanning `duration` frames from
    /// `start_frame`, seeded with one keyframe carrying `shape`
    pub fn add_segment(
        &mut self,
        track_number: usize,
        start_frame: FrameNumber,
        duration: FrameNumber,
        name: impl Into<String>,
        shape: ShapeData,
        rec: &mut dyn EditRecorder,
    ) -> Result<SegmentId, EditError> {
        let end_frame = self.check_new_range(track_number, start_frame, duration, None)?;

        let segment = Segment::new(track_number, start_frame, end_frame, name, shape);
        let id = segment.id();
        rec.begin_batch("add segment");
        rec.record(Delta::SegmentInserted {
            segment: Box::new(segment.clone()),
        });
        self.segments.insert(id, segment);
        self.tracks[track_number].insert(id, &self.segments);
        rec.end_batch();

        debug!(?id, track_number, start_frame, end_frame, "segment added");
        self.refresh_if_cursor_in(track_number, start_frame, end_frame);
        Ok(id)
    }

    /// Deep-copy a segment onto `track_number` at `start_frame`
    pub fn copy_segment(
        &mut self,
        source: SegmentId,
        track_number: usize,
        start_frame: FrameNumber,
        rec: &mut dyn EditRecorder,
    ) -> Result<SegmentId, EditError> {
        let segment = self
            .segments
            .get(&source)
            .ok_or(EditError::UnknownSegment(source))?;
        let duration = segment.end_frame() - segment.start_frame() + 1;
        let end_frame = self.check_new_range(track_number, start_frame, duration, None)?;

        let copy = self
            .segments
            .get(&source)
            .ok_or(EditError::UnknownSegment(source))?
            .duplicate_to(track_number, start_frame);
        let id = copy.id();
        rec.begin_batch("copy segment");
        rec.record(Delta::SegmentInserted {
            segment: Box::new(copy.clone()),
        });
        self.segments.insert(id, copy);
        self.tracks[track_number].insert(id, &self.segments);
        rec.end_batch();

        debug!(?source, ?id, track_number, start_frame, "segment copied");
        self.refresh_if_cursor_in(track_number, start_frame, end_frame);
        Ok(id)
    }

    /// Remove a segment from the timeline
    pub fn remove_segment(
        &mut self,
        id: SegmentId,
        rec: &mut dyn EditRecorder,
    ) -> Result<(), EditError> {
        let segment = self
            .segments
            .shift_remove(&id)
            .ok_or(EditError::UnknownSegment(id))?;
        let (track_number, start, end) =
            (segment.track_number(), segment.start_frame(), segment.end_frame());

        if let Some(track) = self.tracks.get_mut(track_number) {
            track.remove(id);
        }
        rec.begin_batch("remove segment");
        rec.record(Delta::SegmentRemoved {
            segment: Box::new(segment),
        });
        rec.end_batch();

        debug!(?id, track_number, "segment removed");
        self.refresh_if_cursor_in(track_number, start, end);
        Ok(())
    }

    /// Relocate a segment to `track_number` at `start_frame`, keeping its
    /// duration; a move to its current position is accepted and records
    /// nothing
    pub fn move_segment(
        &mut self,
        id: SegmentId,
        track_number: usize,
        start_frame: FrameNumber,
        rec: &mut dyn EditRecorder,
    ) -> Result<(), EditError> {
        let segment = self.segments.get(&id).ok_or(EditError::UnknownSegment(id))?;
        let (old_track, old_start, old_end) =
            (segment.track_number(), segment.start_frame(), segment.end_frame());
        if track_number == old_track && start_frame == old_start {
            return Ok(());
        }
        let duration = old_end - old_start + 1;
        let end_frame = self.check_new_range(track_number, start_frame, duration, Some(id))?;

        rec.begin_batch("move segment");
        self.tracks[old_track].remove(id);
        if let Some(segment) = self.segments.get_mut(&id) {
            segment.move_to(track_number, start_frame, rec);
        }
        self.tracks[track_number].insert(id, &self.segments);
        rec.end_batch();

        debug!(?id, track_number, start_frame, "segment moved");
        self.refresh_if_cursor_in(old_track, old_start, old_end);
        self.refresh_if_cursor_in(track_number, start_frame, end_frame);
        Ok(())
    }

    /// Move a segment's start frame, keeping its end fixed
    pub fn move_start_frame(
        &mut self,
        id: SegmentId,
        start_frame: FrameNumber,
        rec: &mut dyn EditRecorder,
    ) -> Result<(), EditError> {
        let segment = self.segments.get(&id).ok_or(EditError::UnknownSegment(id))?;
        let (track_number, old_start, end) =
            (segment.track_number(), segment.start_frame(), segment.end_frame());
        if start_frame >= end {
            return Err(EditError::OutOfBounds);
        }
        if self.tracks[track_number].overlaps(start_frame, end, Some(id), &self.segments) {
            return Err(EditError::SegmentOverlap(track_number));
        }
        segment.can_blend_at(start_frame)?;

        rec.begin_batch("resize segment");
        let result = match self.segments.get_mut(&id) {
            Some(segment) => segment.move_start_frame(start_frame, rec),
            None => Err(EditError::UnknownSegment(id)),
        };
        rec.end_batch();
        result?;

        self.tracks[track_number].resort(&self.segments);
        debug!(?id, start_frame, "segment start moved");
        self.refresh_if_cursor_in(track_number, old_start.min(start_frame), end);
        Ok(())
    }

    /// Move a segment's end frame, keeping its start fixed
    pub fn move_end_frame(
        &mut self,
        id: SegmentId,
        end_frame: FrameNumber,
        rec: &mut dyn EditRecorder,
    ) -> Result<(), EditError> {
        let segment = self.segments.get(&id).ok_or(EditError::UnknownSegment(id))?;
        let (track_number, start, old_end) =
            (segment.track_number(), segment.start_frame(), segment.end_frame());
        if end_frame <= start || end_frame >= self.frame_count() {
            return Err(EditError::OutOfBounds);
        }
        if self.tracks[track_number].overlaps(start, end_frame, Some(id), &self.segments) {
            return Err(EditError::SegmentOverlap(track_number));
        }

        rec.begin_batch("resize segment");
        if let Some(segment) = self.segments.get_mut(&id) {
            segment.move_end_frame(end_frame, rec);
        }
        rec.end_batch();

        debug!(?id, end_frame, "segment end moved");
        self.refresh_if_cursor_in(track_number, start, old_end.max(end_frame));
        Ok(())
    }

    /// Split a segment in two at `frame`
    ///
    /// The original keeps `[start, frame - 1]`; the returned segment covers
    /// `[frame, old_end]` on the same track under the same name.
    pub fn split_segment(
        &mut self,
        id: SegmentId,
        frame: FrameNumber,
        rec: &mut dyn EditRecorder,
    ) -> Result<SegmentId, EditError> {
        let segment = self.segments.get(&id).ok_or(EditError::UnknownSegment(id))?;
        let (track_number, start, old_end) =
            (segment.track_number(), segment.start_frame(), segment.end_frame());
        if frame <= start || frame >= old_end {
            return Err(EditError::InvalidSplitPoint(frame));
        }
        segment.can_blend_at(frame)?;

        rec.begin_batch("split segment");
        let result = match self.segments.get_mut(&id) {
            Some(segment) => segment.split_at(frame, rec),
            None => Err(EditError::UnknownSegment(id)),
        };
        let right = match result {
            Ok(right) => right,
            Err(err) => {
                rec.end_batch();
                return Err(err);
            }
        };
        let right_id = right.id();
        rec.record(Delta::SegmentInserted {
            segment: Box::new(right.clone()),
        });
        self.segments.insert(right_id, right);
        self.tracks[track_number].insert(right_id, &self.segments);
        rec.end_batch();

        debug!(?id, ?right_id, frame, "segment split");
        self.refresh_if_cursor_in(track_number, start, old_end);
        Ok(right_id)
    }

    /// Merge a segment with the one immediately following it on its track
    ///
    /// Requires the next segment to start on the very next frame.
    pub fn merge_with_next(
        &mut self,
        id: SegmentId,
        rec: &mut dyn EditRecorder,
    ) -> Result<(), EditError> {
        let left = self.segments.get(&id).ok_or(EditError::UnknownSegment(id))?;
        let (track_number, start) = (left.track_number(), left.start_frame());
        let right_id = self.tracks[track_number]
            .next_segment(id)
            .ok_or(EditError::NotAdjacent)?;
        let right = self
            .segments
            .get(&right_id)
            .ok_or(EditError::UnknownSegment(right_id))?;
        if left.end_frame() + 1 != right.start_frame() {
            return Err(EditError::NotAdjacent);
        }
        if left.shape_kind() != right.shape_kind() {
            return Err(EditError::ShapeKindMismatch);
        }
        let end = right.end_frame();

        rec.begin_batch("merge segments");
        self.tracks[track_number].remove(right_id);
        if let Some(right) = self.segments.shift_remove(&right_id) {
            rec.record(Delta::SegmentRemoved {
                segment: Box::new(right.clone()),
            });
            if let Some(left) = self.segments.get_mut(&id) {
                left.merge_from(right, rec);
            }
        }
        rec.end_batch();

        debug!(?id, ?right_id, "segments merged");
        self.refresh_if_cursor_in(track_number, start, end);
        Ok(())
    }

    /// Merge a segment with the one immediately preceding it on its track
    pub fn merge_with_previous(
        &mut self,
        id: SegmentId,
        rec: &mut dyn EditRecorder,
    ) -> Result<(), EditError> {
        let segment = self.segments.get(&id).ok_or(EditError::UnknownSegment(id))?;
        let left_id = self.tracks[segment.track_number()]
            .previous_segment(id)
            .ok_or(EditError::NotAdjacent)?;
        self.merge_with_next(left_id, rec)
    }

    /// Capture the shape currently displayed at the cursor as a new keyframe
    ///
    /// Rejected when a keyframe already sits on the cursor frame or the
    /// cursor is outside the segment's range.
    pub fn add_key_frame(
        &mut self,
        id: SegmentId,
        rec: &mut dyn EditRecorder,
    ) -> Result<KeyFrameId, EditError> {
        let cursor = self.cursor_frame();
        let segment = self.segments.get(&id).ok_or(EditError::UnknownSegment(id))?;
        let track_number = segment.track_number();
        let shape = match segment.sample_at(cursor) {
            None => return Err(EditError::OutOfBounds),
            Some(ShapeSample::KeyFrame(_)) => return Err(EditError::KeyFrameExists(cursor)),
            Some(ShapeSample::Interpolated(shape)) => shape,
        };

        rec.begin_batch("add keyframe");
        let result = match self.segments.get_mut(&id) {
            Some(segment) => segment.add_key_frame(cursor, shape, rec),
            None => Err(EditError::UnknownSegment(id)),
        };
        rec.end_batch();
        let key_frame = result?;

        debug!(?id, frame = cursor, "keyframe added");
        self.refresh_track_active_state(track_number);
        Ok(key_frame)
    }

    /// Remove the keyframe at `frame` from a segment
    ///
    /// The keyframe on the segment's start frame is never removable.
    pub fn remove_key_frame(
        &mut self,
        id: SegmentId,
        frame: FrameNumber,
        rec: &mut dyn EditRecorder,
    ) -> Result<(), EditError> {
        let segment = self.segments.get(&id).ok_or(EditError::UnknownSegment(id))?;
        let (track_number, start, end) =
            (segment.track_number(), segment.start_frame(), segment.end_frame());
        match lower_bound(segment.key_frames(), frame) {
            Ok(0) => return Err(EditError::FirstKeyFrameProtected),
            Ok(_) => {}
            Err(_) => return Err(EditError::UnknownKeyFrame(frame)),
        }

        rec.begin_batch("remove keyframe");
        let result = match self.segments.get_mut(&id) {
            Some(segment) => segment.remove_key_frame(frame, rec),
            None => Err(EditError::UnknownSegment(id)),
        };
        rec.end_batch();
        result?;

        debug!(?id, frame, "keyframe removed");
        self.refresh_if_cursor_in(track_number, start, end);
        Ok(())
    }

    /// Overwrite the shape payload of a keyframe
    pub fn set_key_frame_shape(
        &mut self,
        id: SegmentId,
        frame: FrameNumber,
        shape: ShapeData,
        rec: &mut dyn EditRecorder,
    ) -> Result<(), EditError> {
        let segment = self.segments.get(&id).ok_or(EditError::UnknownSegment(id))?;
        let (track_number, start, end) =
            (segment.track_number(), segment.start_frame(), segment.end_frame());
        if segment.shape_kind().is_some_and(|kind| kind != shape.kind()) {
            return Err(EditError::ShapeKindMismatch);
        }
        if lower_bound(segment.key_frames(), frame).is_err() {
            return Err(EditError::UnknownKeyFrame(frame));
        }

        rec.begin_batch("edit keyframe");
        let result = match self.segments.get_mut(&id) {
            Some(segment) => segment.set_key_frame_shape(frame, shape, rec),
            None => Err(EditError::UnknownSegment(id)),
        };
        rec.end_batch();
        result?;

        self.refresh_if_cursor_in(track_number, start, end);
        Ok(())
    }

    /// Rename a segment
    pub fn rename_segment(
        &mut self,
        id: SegmentId,
        name: impl Into<String>,
        rec: &mut dyn EditRecorder,
    ) -> Result<(), EditError> {
        let segment = self
            .segments
            .get_mut(&id)
            .ok_or(EditError::UnknownSegment(id))?;
        rec.begin_batch("rename segment");
        segment.rename(name, rec);
        rec.end_batch();
        Ok(())
    }

    /// Validate a prospective segment range and return its end frame
    fn check_new_range(
        &self,
        track_number: usize,
        start_frame: FrameNumber,
        duration: FrameNumber,
        exclude: Option<SegmentId>,
    ) -> Result<FrameNumber, EditError> {
        let track = self
            .tracks
            .get(track_number)
            .ok_or(EditError::UnknownTrack(track_number))?;
        if duration == 0 {
            return Err(EditError::OutOfBounds);
        }
        let end_frame = start_frame
            .checked_add(duration - 1)
            .ok_or(EditError::OutOfBounds)?;
        if end_frame >= self.frame_count() {
            return Err(EditError::OutOfBounds);
        }
        if track.overlaps(start_frame, end_frame, exclude, &self.segments) {
            return Err(EditError::SegmentOverlap(track_number));
        }
        Ok(end_frame)
    }
}
