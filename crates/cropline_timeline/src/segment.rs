// SPDX-License-Identifier: MIT OR Apache-2.0
//! Segments: contiguous frame ranges animated by a sorted keyframe list.
//!
//! A segment always holds at least one keyframe and its first keyframe always
//! sits on `start_frame`. The last keyframe may sit before `end_frame`; the
//! sampled value holds steady from there to the end of the range. All
//! structural mutations go through methods that keep those rules intact and
//! report what changed to an [`EditRecorder`].

use crate::change::{ChangeTarget, Delta, EditRecorder, FieldValue};
use crate::error::EditError;
use crate::key_frame::{lower_bound, FrameNumber, KeyFrame, KeyFrameId};
use cropline_shapes::{ShapeData, ShapeKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub Uuid);

impl SegmentId {
    /// Create a new random segment ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

/// The value a segment yields at a frame
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeSample<'a> {
    /// The frame lands exactly on a keyframe
    KeyFrame(&'a KeyFrame),
    /// The frame falls between keyframes; the shape is derived, not editable
    Interpolated(ShapeData),
}

impl ShapeSample<'_> {
    /// The shape at the sampled frame, whichever way it was produced
    pub fn shape(&self) -> &ShapeData {
        match self {
            Self::KeyFrame(kf) => &kf.shape,
            Self::Interpolated(shape) => shape,
        }
    }
}

/// A named, keyframed region on one track of the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    id: SegmentId,
    name: String,
    track_number: usize,
    start_frame: FrameNumber,
    end_frame: FrameNumber,
    key_frames: Vec<KeyFrame>,
}

impl Segment {
    /// Create a segment spanning `[start_frame, end_frame]`, seeded with one
    /// keyframe at `start_frame`
    pub fn new(
        track_number: usize,
        start_frame: FrameNumber,
        end_frame: FrameNumber,
        name: impl Into<String>,
        shape: ShapeData,
    ) -> Self {
        Self {
            id: SegmentId::new(),
            name: name.into(),
            track_number,
            start_frame,
            end_frame,
            key_frames: vec![KeyFrame::new(start_frame, shape)],
        }
    }

    /// Deep-copy this segment to `track_number` at `start_frame`, keeping its
    /// duration and relabelling every keyframe by the same offset
    pub fn duplicate_to(&self, track_number: usize, start_frame: FrameNumber) -> Self {
        let duration = self.end_frame - self.start_frame;
        let key_frames = self
            .key_frames
            .iter()
            .map(|kf| kf.duplicate_at(start_frame + (kf.frame_number - self.start_frame)))
            .collect();
        Self {
            id: SegmentId::new(),
            name: self.name.clone(),
            track_number,
            start_frame,
            end_frame: start_frame + duration,
            key_frames,
        }
    }

    /// Get the segment ID
    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Get the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the track this segment lives on
    pub fn track_number(&self) -> usize {
        self.track_number
    }

    /// Get the first frame of the range (inclusive)
    pub fn start_frame(&self) -> FrameNumber {
        self.start_frame
    }

    /// Get the last frame of the range (inclusive)
    pub fn end_frame(&self) -> FrameNumber {
        self.end_frame
    }

    /// Get the keyframes, sorted by frame number
    pub fn key_frames(&self) -> &[KeyFrame] {
        &self.key_frames
    }

    /// Check whether `frame` falls inside the segment's range
    pub fn contains(&self, frame: FrameNumber) -> bool {
        frame >= self.start_frame && frame <= self.end_frame
    }

    /// The shape family shared by this segment's keyframes
    pub fn shape_kind(&self) -> Option<ShapeKind> {
        self.key_frames.first().map(|kf| kf.shape.kind())
    }

    /// Sample the segment's value at `frame`
    ///
    /// Returns `None` outside the segment's range. Between keyframes the two
    /// surrounding samples are blended by the frame's position in their span;
    /// past the last keyframe the value clamps to it.
    pub fn sample_at(&self, frame: FrameNumber) -> Option<ShapeSample<'_>> {
        if !self.contains(frame) {
            return None;
        }
        let idx = match lower_bound(&self.key_frames, frame) {
            Ok(idx) => return Some(ShapeSample::KeyFrame(&self.key_frames[idx])),
            Err(idx) => idx,
        };

        let before = if idx > 0 {
            &self.key_frames[idx - 1]
        } else {
            &self.key_frames[idx]
        };
        let after = if idx < self.key_frames.len() {
            &self.key_frames[idx]
        } else {
            before
        };

        let span = after.frame_number - before.frame_number;
        let t = if span == 0 {
            0.0
        } else {
            f64::from(frame - before.frame_number) / f64::from(span)
        };
        let shape = before
            .shape
            .interpolate(&after.shape, t)
            .unwrap_or_else(|| before.shape.clone());
        Some(ShapeSample::Interpolated(shape))
    }

    /// Relocate the segment to `track_number` starting at `start_frame`
    ///
    /// Duration is preserved and every keyframe shifts by the same offset.
    /// When shifting forward the last keyframe moves first, when shifting
    /// backward the first moves first, so no intermediate state ever holds
    /// two keyframes on one frame.
    pub fn move_to(
        &mut self,
        track_number: usize,
        start_frame: FrameNumber,
        rec: &mut dyn EditRecorder,
    ) {
        if track_number != self.track_number {
            rec.record(Delta::Field {
                target: ChangeTarget::Segment(self.id),
                field: "track_number",
                old: FieldValue::Track(self.track_number),
                new: FieldValue::Track(track_number),
            });
            self.track_number = track_number;
        }

        if start_frame > self.start_frame {
            let offset = start_frame - self.start_frame;
            for kf in self.key_frames.iter_mut().rev() {
                Self::shift_key_frame(self.id, kf, kf.frame_number + offset, rec);
            }
            self.set_start_frame(self.start_frame + offset, rec);
            self.set_end_frame(self.end_frame + offset, rec);
        } else if start_frame < self.start_frame {
            let offset = self.start_frame - start_frame;
            for kf in self.key_frames.iter_mut() {
                Self::shift_key_frame(self.id, kf, kf.frame_number - offset, rec);
            }
            self.set_start_frame(self.start_frame - offset, rec);
            self.set_end_frame(self.end_frame - offset, rec);
        }
    }

    /// Move the start of the range to `start_frame`, keeping the end fixed
    ///
    /// Expanding keeps the old first keyframe's value at the new start: a
    /// lone keyframe is relabelled, otherwise a copy of the first keyframe is
    /// inserted at the new start. Contracting drops keyframes that fall
    /// before the new start; if none lands exactly on it, the value the
    /// segment showed there is captured as a new first keyframe (or, when
    /// every keyframe falls before the new start, the last one is relabelled
    /// onto it).
    ///
    /// The caller validates `start_frame < end_frame` and track overlap.
    pub fn move_start_frame(
        &mut self,
        start_frame: FrameNumber,
        rec: &mut dyn EditRecorder,
    ) -> Result<(), EditError> {
        if start_frame == self.start_frame {
            return Ok(());
        }

        if start_frame < self.start_frame {
            if self.key_frames.len() == 1 {
                let kf = &mut self.key_frames[0];
                Self::shift_key_frame(self.id, kf, start_frame, rec);
            } else {
                let copy = self.key_frames[0].duplicate_at(start_frame);
                rec.record(Delta::KeyFrameInserted {
                    segment: self.id,
                    index: 0,
                    key_frame: copy.clone(),
                });
                self.key_frames.insert(0, copy);
            }
            self.set_start_frame(start_frame, rec);
            return Ok(());
        }

        // Contracting. Resolve the replacement first so a failed blend
        // leaves the segment untouched.
        match lower_bound(&self.key_frames, start_frame) {
            Ok(idx) => {
                self.set_start_frame(start_frame, rec);
                self.remove_key_frames_front(idx, rec);
            }
            Err(idx) if idx < self.key_frames.len() => {
                let before = &self.key_frames[idx - 1];
                let after = &self.key_frames[idx];
                let span = after.frame_number - before.frame_number;
                let t = if span == 0 {
                    0.0
                } else {
                    f64::from(start_frame - before.frame_number) / f64::from(span)
                };
                let shape = before
                    .shape
                    .interpolate(&after.shape, t)
                    .ok_or(EditError::ShapeKindMismatch)?;

                self.set_start_frame(start_frame, rec);
                self.remove_key_frames_front(idx, rec);
                let synthesized = KeyFrame::new(start_frame, shape);
                rec.record(Delta::KeyFrameInserted {
                    segment: self.id,
                    index: 0,
                    key_frame: synthesized.clone(),
                });
                self.key_frames.insert(0, synthesized);
            }
            Err(_) => {
                // Every keyframe precedes the new start: keep the last one
                self.set_start_frame(start_frame, rec);
                self.remove_key_frames_front(self.key_frames.len().saturating_sub(1), rec);
                if let Some(kf) = self.key_frames.first_mut() {
                    Self::shift_key_frame(self.id, kf, start_frame, rec);
                }
            }
        }
        Ok(())
    }

    /// Move the end of the range to `end_frame`, keeping the start fixed
    ///
    /// Expanding never touches keyframes (the last value clamps across the
    /// widened range). Contracting drops keyframes strictly past the new end,
    /// keeping one that lands exactly on it. The first keyframe survives
    /// every contraction.
    ///
    /// The caller validates `end_frame > start_frame` and track overlap.
    pub fn move_end_frame(&mut self, end_frame: FrameNumber, rec: &mut dyn EditRecorder) {
        if end_frame == self.end_frame {
            return;
        }

        if end_frame < self.end_frame {
            let cut = match lower_bound(&self.key_frames, end_frame) {
                Ok(idx) => idx + 1,
                Err(idx) => idx,
            };
            self.remove_key_frames_from(cut, rec);
        }
        self.set_end_frame(end_frame, rec);
    }

    /// Split the segment at `frame`, truncating it to `[start, frame - 1]`
    /// and returning a new segment covering `[frame, old_end]`
    ///
    /// The new segment keeps the track and name. Its first keyframe is the
    /// keyframe already on `frame` if there is one, a blend of the two
    /// surrounding keyframes if `frame` falls between keyframes, or a copy of
    /// the last keyframe when none lies at or past `frame`.
    ///
    /// The caller validates `start < frame < end` and records the insertion
    /// of the returned segment.
    pub fn split_at(
        &mut self,
        frame: FrameNumber,
        rec: &mut dyn EditRecorder,
    ) -> Result<Segment, EditError> {
        let old_end = self.end_frame;
        let key_frames = match lower_bound(&self.key_frames, frame) {
            Ok(idx) => self.remove_key_frames_from(idx, rec),
            Err(idx) if idx < self.key_frames.len() => {
                let before = &self.key_frames[idx - 1];
                let after = &self.key_frames[idx];
                let span = after.frame_number - before.frame_number;
                let t = if span == 0 {
                    0.0
                } else {
                    f64::from(frame - before.frame_number) / f64::from(span)
                };
                let shape = before
                    .shape
                    .interpolate(&after.shape, t)
                    .ok_or(EditError::ShapeKindMismatch)?;

                let mut moved = self.remove_key_frames_from(idx, rec);
                moved.insert(0, KeyFrame::new(frame, shape));
                moved
            }
            Err(_) => match self.key_frames.last() {
                Some(last) => vec![last.duplicate_at(frame)],
                None => Vec::new(),
            },
        };

        self.set_end_frame(frame - 1, rec);
        Ok(Segment {
            id: SegmentId::new(),
            name: self.name.clone(),
            track_number: self.track_number,
            start_frame: frame,
            end_frame: old_end,
            key_frames,
        })
    }

    /// Absorb an adjacent segment to the right
    ///
    /// Appends `right`'s keyframes and extends the range to its end. The
    /// caller validates adjacency (`self.end + 1 == right.start`) and the
    /// shared track, and records the removal of `right` from the timeline.
    pub fn merge_from(&mut self, right: Segment, rec: &mut dyn EditRecorder) {
        self.set_end_frame(right.end_frame, rec);
        for kf in right.key_frames {
            rec.record(Delta::KeyFrameInserted {
                segment: self.id,
                index: self.key_frames.len(),
                key_frame: kf.clone(),
            });
            self.key_frames.push(kf);
        }
    }

    /// Insert a keyframe at `frame` carrying `shape`
    pub fn add_key_frame(
        &mut self,
        frame: FrameNumber,
        shape: ShapeData,
        rec: &mut dyn EditRecorder,
    ) -> Result<KeyFrameId, EditError> {
        if !self.contains(frame) {
            return Err(EditError::OutOfBounds);
        }
        if self
            .shape_kind()
            .is_some_and(|kind| kind != shape.kind())
        {
            return Err(EditError::ShapeKindMismatch);
        }
        let idx = match lower_bound(&self.key_frames, frame) {
            Ok(_) => return Err(EditError::KeyFrameExists(frame)),
            Err(idx) => idx,
        };
        let kf = KeyFrame::new(frame, shape);
        let id = kf.id;
        rec.record(Delta::KeyFrameInserted {
            segment: self.id,
            index: idx,
            key_frame: kf.clone(),
        });
        self.key_frames.insert(idx, kf);
        Ok(id)
    }

    /// Remove the keyframe at `frame`
    ///
    /// The keyframe on the start frame is never removable.
    pub fn remove_key_frame(
        &mut self,
        frame: FrameNumber,
        rec: &mut dyn EditRecorder,
    ) -> Result<KeyFrame, EditError> {
        match lower_bound(&self.key_frames, frame) {
            Ok(0) => Err(EditError::FirstKeyFrameProtected),
            Ok(idx) => {
                let kf = self.key_frames.remove(idx);
                rec.record(Delta::KeyFrameRemoved {
                    segment: self.id,
                    index: idx,
                    key_frame: kf.clone(),
                });
                Ok(kf)
            }
            Err(_) => Err(EditError::UnknownKeyFrame(frame)),
        }
    }

    /// Overwrite the shape payload of the keyframe at `frame`
    pub fn set_key_frame_shape(
        &mut self,
        frame: FrameNumber,
        shape: ShapeData,
        rec: &mut dyn EditRecorder,
    ) -> Result<(), EditError> {
        if self
            .shape_kind()
            .is_some_and(|kind| kind != shape.kind())
        {
            return Err(EditError::ShapeKindMismatch);
        }
        let idx = lower_bound(&self.key_frames, frame)
            .map_err(|_| EditError::UnknownKeyFrame(frame))?;
        let kf = &mut self.key_frames[idx];
        if kf.shape != shape {
            rec.record(Delta::Field {
                target: ChangeTarget::KeyFrame(self.id, kf.id),
                field: "shape",
                old: FieldValue::Shape(kf.shape.clone()),
                new: FieldValue::Shape(shape.clone()),
            });
            kf.shape = shape;
        }
        Ok(())
    }

    /// Rename the segment
    pub fn rename(&mut self, name: impl Into<String>, rec: &mut dyn EditRecorder) {
        let name = name.into();
        if name != self.name {
            rec.record(Delta::Field {
                target: ChangeTarget::Segment(self.id),
                field: "name",
                old: FieldValue::Text(self.name.clone()),
                new: FieldValue::Text(name.clone()),
            });
            self.name = name;
        }
    }

    /// Check that the keyframes surrounding `frame` can be blended, so an
    /// edit that would synthesize a keyframe there can be rejected before it
    /// mutates anything
    pub(crate) fn can_blend_at(&self, frame: FrameNumber) -> Result<(), EditError> {
        if let Err(idx) = lower_bound(&self.key_frames, frame) {
            if idx > 0 && idx < self.key_frames.len() {
                let before = &self.key_frames[idx - 1];
                let after = &self.key_frames[idx];
                if before.shape.interpolate(&after.shape, 0.0).is_none() {
                    return Err(EditError::ShapeKindMismatch);
                }
            }
        }
        Ok(())
    }

    fn set_start_frame(&mut self, start_frame: FrameNumber, rec: &mut dyn EditRecorder) {
        if start_frame != self.start_frame {
            rec.record(Delta::Field {
                target: ChangeTarget::Segment(self.id),
                field: "start_frame",
                old: FieldValue::Frame(self.start_frame),
                new: FieldValue::Frame(start_frame),
            });
            self.start_frame = start_frame;
        }
    }

    fn set_end_frame(&mut self, end_frame: FrameNumber, rec: &mut dyn EditRecorder) {
        if end_frame != self.end_frame {
            rec.record(Delta::Field {
                target: ChangeTarget::Segment(self.id),
                field: "end_frame",
                old: FieldValue::Frame(self.end_frame),
                new: FieldValue::Frame(end_frame),
            });
            self.end_frame = end_frame;
        }
    }

    fn shift_key_frame(
        segment: SegmentId,
        kf: &mut KeyFrame,
        frame: FrameNumber,
        rec: &mut dyn EditRecorder,
    ) {
        rec.record(Delta::Field {
            target: ChangeTarget::KeyFrame(segment, kf.id),
            field: "frame_number",
            old: FieldValue::Frame(kf.frame_number),
            new: FieldValue::Frame(frame),
        });
        kf.frame_number = frame;
    }

    /// Remove the first `count` keyframes, recording each removal
    fn remove_key_frames_front(&mut self, count: usize, rec: &mut dyn EditRecorder) {
        for _ in 0..count {
            let kf = self.key_frames.remove(0);
            rec.record(Delta::KeyFrameRemoved {
                segment: self.id,
                index: 0,
                key_frame: kf,
            });
        }
    }

    /// Remove and return the keyframes from index `from` to the end,
    /// recording each removal
    fn remove_key_frames_from(
        &mut self,
        from: usize,
        rec: &mut dyn EditRecorder,
    ) -> Vec<KeyFrame> {
        let removed = self.key_frames.split_off(from);
        for (offset, kf) in removed.iter().enumerate() {
            rec.record(Delta::KeyFrameRemoved {
                segment: self.id,
                index: from + offset,
                key_frame: kf.clone(),
            });
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::NullRecorder;

    fn crop(left: f64) -> ShapeData {
        ShapeData::Crop {
            left,
            top: 0.0,
            width: 100.0,
            height: 100.0,
            angle: 0.0,
        }
    }

    fn crop_left(sample: &ShapeSample<'_>) -> f64 {
        match sample.shape() {
            ShapeData::Crop { left, .. } => *left,
            other => panic!("expected crop, got {other:?}"),
        }
    }

    /// A segment over [0, 100] with keyframes at 0, 20 and 60
    fn three_key_frames() -> Segment {
        let mut seg = Segment::new(0, 0, 100, "crop", crop(0.0));
        let rec = &mut NullRecorder;
        seg.add_key_frame(20, crop(20.0), rec).unwrap();
        seg.add_key_frame(60, crop(60.0), rec).unwrap();
        seg
    }

    fn frames(seg: &Segment) -> Vec<FrameNumber> {
        seg.key_frames().iter().map(|kf| kf.frame_number).collect()
    }

    #[test]
    fn new_segment_seeds_key_frame_at_start() {
        let seg = Segment::new(2, 10, 50, "mask", crop(5.0));
        assert_eq!(seg.track_number(), 2);
        assert_eq!(frames(&seg), vec![10]);
        assert_eq!(seg.shape_kind(), Some(ShapeKind::Crop));
    }

    #[test]
    fn sample_on_key_frame_is_exact() {
        let seg = three_key_frames();
        match seg.sample_at(20).unwrap() {
            ShapeSample::KeyFrame(kf) => assert_eq!(kf.frame_number, 20),
            ShapeSample::Interpolated(_) => panic!("expected exact keyframe"),
        }
    }

    #[test]
    fn sample_between_key_frames_interpolates() {
        let seg = three_key_frames();
        let sample = seg.sample_at(40).unwrap();
        assert!(matches!(sample, ShapeSample::Interpolated(_)));
        assert_eq!(crop_left(&sample), 40.0);
    }

    #[test]
    fn sample_past_last_key_frame_clamps() {
        let seg = three_key_frames();
        let sample = seg.sample_at(90).unwrap();
        assert_eq!(crop_left(&sample), 60.0);
    }

    #[test]
    fn sample_outside_range_is_none() {
        let seg = three_key_frames();
        assert!(seg.sample_at(101).is_none());
    }

    #[test]
    fn move_right_shifts_all_key_frames() {
        let mut seg = three_key_frames();
        seg.move_to(1, 30, &mut NullRecorder);
        assert_eq!(seg.track_number(), 1);
        assert_eq!((seg.start_frame(), seg.end_frame()), (30, 130));
        assert_eq!(frames(&seg), vec![30, 50, 90]);
    }

    #[test]
    fn move_left_shifts_all_key_frames() {
        let mut seg = three_key_frames();
        seg.move_to(0, 30, &mut NullRecorder);
        seg.move_to(0, 5, &mut NullRecorder);
        assert_eq!((seg.start_frame(), seg.end_frame()), (5, 105));
        assert_eq!(frames(&seg), vec![5, 25, 65]);
    }

    #[test]
    fn expand_start_copies_first_key_frame() {
        let mut seg = three_key_frames();
        seg.move_to(0, 10, &mut NullRecorder);
        seg.move_start_frame(4, &mut NullRecorder).unwrap();
        assert_eq!(seg.start_frame(), 4);
        assert_eq!(frames(&seg), vec![4, 10, 30, 70]);
        // Copy takes the first keyframe's value
        assert_eq!(seg.key_frames()[0].shape, seg.key_frames()[1].shape);
    }

    #[test]
    fn expand_start_with_single_key_frame_relabels_it() {
        let mut seg = Segment::new(0, 10, 50, "mask", crop(5.0));
        seg.move_start_frame(2, &mut NullRecorder).unwrap();
        assert_eq!(seg.start_frame(), 2);
        assert_eq!(frames(&seg), vec![2]);
    }

    #[test]
    fn contract_start_onto_key_frame_prunes_earlier_ones() {
        let mut seg = three_key_frames();
        seg.move_start_frame(60, &mut NullRecorder).unwrap();
        assert_eq!(seg.start_frame(), 60);
        assert_eq!(frames(&seg), vec![60]);
    }

    #[test]
    fn contract_start_between_key_frames_synthesizes_blend() {
        let mut seg = three_key_frames();
        seg.move_start_frame(40, &mut NullRecorder).unwrap();
        assert_eq!(seg.start_frame(), 40);
        assert_eq!(frames(&seg), vec![40, 60]);
        // Halfway between the keyframes at 20 and 60
        assert_eq!(seg.key_frames()[0].shape, crop(40.0));
    }

    #[test]
    fn contract_start_past_all_key_frames_relabels_last() {
        let mut seg = three_key_frames();
        let last_shape = seg.key_frames()[2].shape.clone();
        seg.move_start_frame(80, &mut NullRecorder).unwrap();
        assert_eq!(seg.start_frame(), 80);
        assert_eq!(frames(&seg), vec![80]);
        assert_eq!(seg.key_frames()[0].shape, last_shape);
    }

    #[test]
    fn expand_end_leaves_key_frames_alone() {
        let mut seg = three_key_frames();
        seg.move_end_frame(150, &mut NullRecorder);
        assert_eq!(seg.end_frame(), 150);
        assert_eq!(frames(&seg), vec![0, 20, 60]);
    }

    #[test]
    fn contract_end_prunes_key_frames_past_it() {
        let mut seg = three_key_frames();
        seg.move_end_frame(30, &mut NullRecorder);
        assert_eq!(seg.end_frame(), 30);
        assert_eq!(frames(&seg), vec![0, 20]);
    }

    #[test]
    fn contract_end_keeps_key_frame_landing_on_it() {
        let mut seg = three_key_frames();
        seg.move_end_frame(60, &mut NullRecorder);
        assert_eq!(frames(&seg), vec![0, 20, 60]);
    }

    #[test]
    fn contract_end_never_removes_first_key_frame() {
        let mut seg = Segment::new(0, 10, 50, "mask", crop(5.0));
        seg.move_end_frame(11, &mut NullRecorder);
        assert_eq!(frames(&seg), vec![10]);
    }

    #[test]
    fn split_on_key_frame_moves_it_to_the_new_segment() {
        let mut seg = three_key_frames();
        let right = seg.split_at(60, &mut NullRecorder).unwrap();
        assert_eq!((seg.start_frame(), seg.end_frame()), (0, 59));
        assert_eq!(frames(&seg), vec![0, 20]);
        assert_eq!((right.start_frame(), right.end_frame()), (60, 100));
        assert_eq!(frames(&right), vec![60]);
        assert_eq!(right.name(), seg.name());
        assert_eq!(right.track_number(), seg.track_number());
    }

    #[test]
    fn split_between_key_frames_synthesizes_blend() {
        let mut seg = three_key_frames();
        let right = seg.split_at(40, &mut NullRecorder).unwrap();
        assert_eq!(frames(&seg), vec![0, 20]);
        assert_eq!(frames(&right), vec![40, 60]);
        assert_eq!(right.key_frames()[0].shape, crop(40.0));
    }

    #[test]
    fn split_past_all_key_frames_copies_the_last() {
        let mut seg = three_key_frames();
        let right = seg.split_at(80, &mut NullRecorder).unwrap();
        assert_eq!(frames(&seg), vec![0, 20, 60]);
        assert_eq!(frames(&right), vec![80]);
        assert_eq!(right.key_frames()[0].shape, crop(60.0));
    }

    #[test]
    fn merge_appends_key_frames_and_extends_range() {
        let mut seg = three_key_frames();
        let right = seg.split_at(40, &mut NullRecorder).unwrap();
        seg.merge_from(right, &mut NullRecorder);
        assert_eq!((seg.start_frame(), seg.end_frame()), (0, 100));
        // The keyframe synthesized by the split survives the merge
        assert_eq!(frames(&seg), vec![0, 20, 40, 60]);
    }

    #[test]
    fn add_key_frame_rejects_duplicates_and_out_of_range() {
        let mut seg = three_key_frames();
        let rec = &mut NullRecorder;
        assert_eq!(
            seg.add_key_frame(20, crop(1.0), rec),
            Err(EditError::KeyFrameExists(20))
        );
        assert_eq!(
            seg.add_key_frame(101, crop(1.0), rec),
            Err(EditError::OutOfBounds)
        );
    }

    #[test]
    fn add_key_frame_rejects_foreign_shape_kind() {
        let mut seg = three_key_frames();
        let rect = ShapeData::Rectangle {
            left: 0.0,
            top: 0.0,
            width: 1.0,
            height: 1.0,
        };
        assert_eq!(
            seg.add_key_frame(30, rect, &mut NullRecorder),
            Err(EditError::ShapeKindMismatch)
        );
    }

    #[test]
    fn remove_key_frame_protects_the_first() {
        let mut seg = three_key_frames();
        let rec = &mut NullRecorder;
        assert_eq!(
            seg.remove_key_frame(0, rec),
            Err(EditError::FirstKeyFrameProtected)
        );
        assert_eq!(
            seg.remove_key_frame(30, rec),
            Err(EditError::UnknownKeyFrame(30))
        );
        let removed = seg.remove_key_frame(20, rec).unwrap();
        assert_eq!(removed.frame_number, 20);
        assert_eq!(frames(&seg), vec![0, 60]);
    }

    #[test]
    fn duplicate_to_offsets_every_key_frame_under_fresh_ids() {
        let seg = three_key_frames();
        let copy = seg.duplicate_to(1, 200);
        assert_eq!((copy.start_frame(), copy.end_frame()), (200, 300));
        assert_eq!(frames(&copy), vec![200, 220, 260]);
        assert_ne!(copy.id(), seg.id());
        assert_ne!(copy.key_frames()[0].id, seg.key_frames()[0].id);
    }

    #[test]
    fn edits_record_into_a_batch() {
        use crate::change::ChangeLog;

        let mut seg = three_key_frames();
        let mut log = ChangeLog::new();
        log.begin_batch("move segment");
        seg.move_to(0, 10, &mut log);
        log.end_batch();

        let batch = log.undo().unwrap();
        // One delta per keyframe plus the two range fields
        assert_eq!(batch.deltas.len(), 5);
    }
}
