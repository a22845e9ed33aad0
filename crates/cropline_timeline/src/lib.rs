// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline core for Cropline.
//!
//! The model is a [`Timeline`] of tracks, each an ordered row of
//! non-overlapping [`Segment`]s animated by sorted keyframes. A cursor frame
//! resolves per-track [`ActiveState`]; structural edits validate first,
//! mutate second and report reversible [`Delta`]s to an [`EditRecorder`]
//! such as the bundled [`ChangeLog`].

pub mod change;
pub mod edit;
pub mod error;
pub mod key_frame;
pub mod segment;
pub mod timeline;
pub mod track;

pub use change::{
    ChangeBatch, ChangeLog, ChangeTarget, Delta, EditRecorder, FieldValue, NullRecorder,
};
pub use error::EditError;
pub use key_frame::{FrameNumber, KeyFrame, KeyFrameId};
pub use segment::{Segment, SegmentId, ShapeSample};
pub use timeline::{ActiveState, Timeline};
pub use track::Track;
