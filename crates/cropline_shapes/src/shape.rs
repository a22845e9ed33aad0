// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shape payload variants and their interpolation contract.

use crate::geometry::{lerp, PointD};
use serde::{Deserialize, Serialize};

/// The family a shape payload belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Rotatable crop region
    Crop,
    /// Axis-aligned rectangle mask
    Rectangle,
    /// Ellipse mask
    Ellipse,
    /// Polygon mask
    Polygon,
}

impl ShapeKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Crop => "Crop",
            Self::Rectangle => "Rectangle",
            Self::Ellipse => "Ellipse",
            Self::Polygon => "Polygon",
        }
    }
}

/// Data payload carried by a keyframe
///
/// All variants own their data, so `Clone` is a deep copy and `PartialEq`
/// compares the full payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeData {
    /// Rotatable crop region
    Crop {
        /// Left pixel coordinate of the pre-rotation area
        left: f64,
        /// Top pixel coordinate of the pre-rotation area
        top: f64,
        /// Width in pixels
        width: f64,
        /// Height in pixels
        height: f64,
        /// Rotation angle in degrees
        angle: f64,
    },
    /// Axis-aligned rectangle mask
    Rectangle {
        /// Left pixel coordinate
        left: f64,
        /// Top pixel coordinate
        top: f64,
        /// Width in pixels
        width: f64,
        /// Height in pixels
        height: f64,
    },
    /// Ellipse mask
    Ellipse {
        /// Center point
        center: PointD,
        /// Horizontal radius
        radius_x: f64,
        /// Vertical radius
        radius_y: f64,
    },
    /// Polygon mask
    Polygon {
        /// Vertices in drawing order
        points: Vec<PointD>,
    },
}

impl ShapeData {
    /// Get the shape family of this payload
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Crop { .. } => ShapeKind::Crop,
            Self::Rectangle { .. } => ShapeKind::Rectangle,
            Self::Ellipse { .. } => ShapeKind::Ellipse,
            Self::Polygon { .. } => ShapeKind::Polygon,
        }
    }

    /// Interpolate between two payloads of the same kind
    ///
    /// `t` is the weight of `other`, normally in `[0, 1]`. Returns `None` for
    /// mismatched kinds, or for polygons whose vertex counts differ.
    pub fn interpolate(&self, other: &ShapeData, t: f64) -> Option<ShapeData> {
        match (self, other) {
            (
                ShapeData::Crop {
                    left: l_a,
                    top: t_a,
                    width: w_a,
                    height: h_a,
                    angle: an_a,
                },
                ShapeData::Crop {
                    left: l_b,
                    top: t_b,
                    width: w_b,
                    height: h_b,
                    angle: an_b,
                },
            ) => Some(ShapeData::Crop {
                left: lerp(*l_a, *l_b, t),
                top: lerp(*t_a, *t_b, t),
                width: lerp(*w_a, *w_b, t),
                height: lerp(*h_a, *h_b, t),
                angle: lerp(*an_a, *an_b, t),
            }),
            (
                ShapeData::Rectangle {
                    left: l_a,
                    top: t_a,
                    width: w_a,
                    height: h_a,
                },
                ShapeData::Rectangle {
                    left: l_b,
                    top: t_b,
                    width: w_b,
                    height: h_b,
                },
            ) => Some(ShapeData::Rectangle {
                left: lerp(*l_a, *l_b, t),
                top: lerp(*t_a, *t_b, t),
                width: lerp(*w_a, *w_b, t),
                height: lerp(*h_a, *h_b, t),
            }),
            (
                ShapeData::Ellipse {
                    center: c_a,
                    radius_x: rx_a,
                    radius_y: ry_a,
                },
                ShapeData::Ellipse {
                    center: c_b,
                    radius_x: rx_b,
                    radius_y: ry_b,
                },
            ) => Some(ShapeData::Ellipse {
                center: PointD::lerp(*c_a, *c_b, t),
                radius_x: lerp(*rx_a, *rx_b, t),
                radius_y: lerp(*ry_a, *ry_b, t),
            }),
            (ShapeData::Polygon { points: p_a }, ShapeData::Polygon { points: p_b }) => {
                if p_a.len() != p_b.len() {
                    return None;
                }
                let points = p_a
                    .iter()
                    .zip(p_b.iter())
                    .map(|(&a, &b)| PointD::lerp(a, b, t))
                    .collect();
                Some(ShapeData::Polygon { points })
            }
            _ => None, // Mismatched kinds
        }
    }
}
