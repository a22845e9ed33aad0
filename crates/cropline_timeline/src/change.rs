// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change recording for the external undo collaborator.
//!
//! The edit engine only ever emits deltas; it never replays them. Callers
//! that want undo/redo keep a [`ChangeLog`] and apply the batches it hands
//! back themselves.

use crate::key_frame::{FrameNumber, KeyFrame, KeyFrameId};
use crate::segment::{Segment, SegmentId};
use cropline_shapes::ShapeData;
use std::collections::VecDeque;

/// Maximum undo history depth
const MAX_HISTORY: usize = 100;

/// What a field-level delta applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTarget {
    /// A segment field
    Segment(SegmentId),
    /// A keyframe field, addressed through its owning segment
    KeyFrame(SegmentId, KeyFrameId),
}

/// Old/new value carried by a field-level delta
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Frame number value
    Frame(FrameNumber),
    /// Track number value
    Track(usize),
    /// Text value
    Text(String),
    /// Shape payload value
    Shape(ShapeData),
}

/// One reversible unit of change
///
/// Structural variants carry the full removed/inserted data so an external
/// undo system can restore it without reaching back into the timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    /// A single field changed value
    Field {
        /// What the field belongs to
        target: ChangeTarget,
        /// Field name
        field: &'static str,
        /// Value before the change
        old: FieldValue,
        /// Value after the change
        new: FieldValue,
    },
    /// A keyframe was inserted into a segment
    KeyFrameInserted {
        /// Owning segment
        segment: SegmentId,
        /// Index it was inserted at
        index: usize,
        /// The inserted keyframe
        key_frame: KeyFrame,
    },
    /// A keyframe was removed from a segment
    KeyFrameRemoved {
        /// Owning segment
        segment: SegmentId,
        /// Index it was removed from
        index: usize,
        /// The removed keyframe
        key_frame: KeyFrame,
    },
    /// A segment was inserted into the timeline
    SegmentInserted {
        /// The inserted segment
        segment: Box<Segment>,
    },
    /// A segment was removed from the timeline
    SegmentRemoved {
        /// The removed segment
        segment: Box<Segment>,
    },
    /// A track was appended to the timeline
    TrackInserted {
        /// Its track number
        track_number: usize,
    },
    /// A track was removed; higher tracks shifted down by one
    TrackRemoved {
        /// The removed track number
        track_number: usize,
    },
}

/// Sink for deltas emitted by the edit engine
///
/// Every structural edit brackets its deltas in one `begin_batch`/`end_batch`
/// pair so that a recorder never observes a partially-applied edit as
/// multiple user-visible actions. Brackets may nest; only the outermost pair
/// delimits the batch.
pub trait EditRecorder {
    /// Open a batch covering one user-visible action
    fn begin_batch(&mut self, description: &str);
    /// Close the current batch
    fn end_batch(&mut self);
    /// Record one delta into the current batch
    fn record(&mut self, delta: Delta);
}

/// A recorded batch of deltas for one user-visible action
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeBatch {
    /// Human-readable description
    pub description: String,
    /// Deltas in application order
    pub deltas: Vec<Delta>,
}

impl ChangeBatch {
    fn new(description: String) -> Self {
        Self {
            description,
            deltas: Vec::new(),
        }
    }
}

/// Bounded undo/redo change log
///
/// The default [`EditRecorder`]: collects batches, keeps bounded undo/redo
/// stacks and hands batches back out for the caller to replay.
#[derive(Debug)]
pub struct ChangeLog {
    undo_stack: VecDeque<ChangeBatch>,
    redo_stack: VecDeque<ChangeBatch>,
    open: Option<ChangeBatch>,
    batch_depth: usize,
    max_depth: usize,
}

impl ChangeLog {
    /// Create a new change log
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with a custom maximum history depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            open: None,
            batch_depth: 0,
            max_depth,
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pop the most recent batch for the caller to revert
    ///
    /// The batch moves to the redo stack; the caller applies the inverse of
    /// its deltas in reverse order.
    pub fn undo(&mut self) -> Option<ChangeBatch> {
        let batch = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(batch.clone());
        Some(batch)
    }

    /// Pop the most recently undone batch for the caller to re-apply
    pub fn redo(&mut self) -> Option<ChangeBatch> {
        let batch = self.redo_stack.pop_back()?;
        self.undo_stack.push_back(batch.clone());
        Some(batch)
    }

    /// Description of the next batch `undo` would return
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|b| b.description.as_str())
    }

    /// Description of the next batch `redo` would return
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|b| b.description.as_str())
    }

    /// Number of batches on the undo stack
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Clear all recorded history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn commit(&mut self, batch: ChangeBatch) {
        if batch.deltas.is_empty() {
            return;
        }

        // New edits invalidate anything previously undone
        self.redo_stack.clear();
        self.undo_stack.push_back(batch);

        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EditRecorder for ChangeLog {
    fn begin_batch(&mut self, description: &str) {
        if self.batch_depth == 0 {
            self.open = Some(ChangeBatch::new(description.to_owned()));
        }
        self.batch_depth += 1;
    }

    fn end_batch(&mut self) {
        debug_assert!(self.batch_depth > 0, "end_batch without begin_batch");
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0 {
            if let Some(batch) = self.open.take() {
                self.commit(batch);
            }
        }
    }

    fn record(&mut self, delta: Delta) {
        if let Some(batch) = self.open.as_mut() {
            batch.deltas.push(delta);
        }
    }
}

/// Recorder that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl EditRecorder for NullRecorder {
    fn begin_batch(&mut self, _description: &str) {}
    fn end_batch(&mut self) {}
    fn record(&mut self, _delta: Delta) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_delta(old: FrameNumber, new: FrameNumber) -> Delta {
        Delta::Field {
            target: ChangeTarget::Segment(SegmentId::new()),
            field: "start_frame",
            old: FieldValue::Frame(old),
            new: FieldValue::Frame(new),
        }
    }

    #[test]
    fn batch_collects_deltas_into_one_unit() {
        let mut log = ChangeLog::new();
        log.begin_batch("segment moved");
        log.record(frame_delta(0, 5));
        log.record(frame_delta(9, 14));
        log.end_batch();

        assert_eq!(log.undo_depth(), 1);
        let batch = log.undo().unwrap();
        assert_eq!(batch.description, "segment moved");
        assert_eq!(batch.deltas.len(), 2);
        assert!(log.can_redo());
    }

    #[test]
    fn nested_brackets_commit_once() {
        let mut log = ChangeLog::new();
        log.begin_batch("outer");
        log.record(frame_delta(0, 1));
        log.begin_batch("inner");
        log.record(frame_delta(1, 2));
        log.end_batch();
        log.record(frame_delta(2, 3));
        log.end_batch();

        assert_eq!(log.undo_depth(), 1);
        assert_eq!(log.undo().unwrap().deltas.len(), 3);
    }

    #[test]
    fn empty_batch_is_not_committed() {
        let mut log = ChangeLog::new();
        log.begin_batch("nothing happened");
        log.end_batch();
        assert!(!log.can_undo());
    }

    #[test]
    fn new_commit_clears_redo() {
        let mut log = ChangeLog::new();
        log.begin_batch("first");
        log.record(frame_delta(0, 1));
        log.end_batch();
        log.undo().unwrap();
        assert!(log.can_redo());

        log.begin_batch("second");
        log.record(frame_delta(1, 2));
        log.end_batch();
        assert!(!log.can_redo());
        assert_eq!(log.undo_description(), Some("second"));
    }

    #[test]
    fn history_depth_is_bounded() {
        let mut log = ChangeLog::with_max_depth(2);
        for i in 0..5 {
            log.begin_batch(&format!("edit {i}"));
            log.record(frame_delta(i, i + 1));
            log.end_batch();
        }
        assert_eq!(log.undo_depth(), 2);
        assert_eq!(log.undo_description(), Some("edit 4"));
    }
}
