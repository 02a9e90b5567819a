//! Finger bend angles.

use std::{error::Error, fmt};

use nalgebra::Vector3;

use crate::landmark::{Finger, Landmarks, Position};

/// Error returned by [`compute_bend_angle`] when two consecutive landmarks coincide.
///
/// This typically happens on detection artifacts. No reliable angle exists for the finger in
/// that case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegenerateGeometry {
    _priv: (),
}

impl fmt::Display for DegenerateGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("bone segment has zero length")
    }
}

impl Error for DegenerateGeometry {}

/// Computes the bend angle at `p1` of the joint chain `p0 -> p1 -> p2`, in radians.
///
/// This is the angle between the bone vectors `p1 - p0` and `p2 - p1`: a straight chain yields
/// 0.0, a right-angled bend yields π/2, and a chain that folds back onto itself yields π.
///
/// Returns an error instead of NaN if either bone vector has zero length.
///
/// The result can differ from an `acos`-based computation by a few ULPs, so an angle lying right
/// at a classification threshold may land on the other side of it.
pub fn compute_bend_angle(
    p0: Position,
    p1: Position,
    p2: Position,
) -> Result<f32, DegenerateGeometry> {
    let [p0, p1, p2] = [p0, p1, p2].map(Vector3::from);
    let v1 = p1 - p0;
    let v2 = p2 - p1;

    if v1.norm_squared() == 0.0 || v2.norm_squared() == 0.0 {
        return Err(DegenerateGeometry { _priv: () });
    }

    // Same angle as `acos(v1·v2 / (|v1| |v2|))`, but without losing precision for almost-parallel
    // vectors, and always within [0, π].
    let angle = v1.cross(&v2).norm().atan2(v1.dot(&v2));
    if angle.is_finite() {
        Ok(angle)
    } else {
        // Overflow to infinity in the dot/cross products.
        Err(DegenerateGeometry { _priv: () })
    }
}

/// Computes the bend angle of `finger` from the first 3 of its 4 landmarks.
pub fn finger_angle(landmarks: &Landmarks, finger: Finger) -> Result<f32, DegenerateGeometry> {
    let [p0, p1, p2, _tip] = landmarks.finger(finger);
    compute_bend_angle(p0, p1, p2)
}

/// Computes the bend angle of every finger, indexed by [`Finger::index`].
pub fn finger_angles(landmarks: &Landmarks) -> [Result<f32, DegenerateGeometry>; 5] {
    Finger::ALL.map(|finger| finger_angle(landmarks, finger))
}
