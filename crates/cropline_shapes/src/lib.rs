// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shape payloads for Cropline's crop and mask segments.
//!
//! Each keyframe on the timeline carries one of these payloads. The timeline
//! core treats them as opaque values with three capabilities:
//! - linear interpolation between two payloads of the same kind
//! - deep copy (plain [`Clone`] - every payload owns its data)
//! - equality comparison
//!
//! The per-kind arithmetic lives here so the timeline crate never matches on
//! shape variants itself.

pub mod geometry;
pub mod shape;

pub use geometry::PointD;
pub use shape::{ShapeData, ShapeKind};
