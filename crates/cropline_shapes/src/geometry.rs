// SPDX-License-Identifier: MIT OR Apache-2.0
//! Geometry primitives shared by the shape payloads.

use serde::{Deserialize, Serialize};

/// A 2D point in pixel coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointD {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl PointD {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation between two points
    pub fn lerp(a: PointD, b: PointD, t: f64) -> PointD {
        PointD {
            x: lerp(a.x, b.x, t),
            y: lerp(a.y, b.y, t),
        }
    }
}

/// Linear interpolation between two scalars
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
