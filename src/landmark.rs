//! Hand landmarks and their anatomical layout.

use std::{fmt, ops::Index, ops::Range};

use crate::resolution::Resolution;

/// 3D landmark position: X and Y in pixels of the source image, Z in the estimator's depth unit.
pub type Position = [f32; 3];

/// Number of landmarks in a [`Landmarks`] set.
pub const NUM_LANDMARKS: usize = 21;

/// The 21 landmarks of a single detected hand.
///
/// The number of landmarks is part of the type, so any [`Landmarks`] value can be indexed with
/// every [`LandmarkIdx`] and split into all five [`Finger`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmarks {
    positions: [Position; NUM_LANDMARKS],
}

/// All landmarks start at the origin.
impl Default for Landmarks {
    fn default() -> Self {
        Self {
            positions: [[0.0; 3]; NUM_LANDMARKS],
        }
    }
}

impl Landmarks {
    pub fn new(positions: [Position; NUM_LANDMARKS]) -> Self {
        Self { positions }
    }

    /// Creates a landmark set from a slice of positions in pixel space.
    ///
    /// Returns [`None`] if `positions` does not contain exactly [`NUM_LANDMARKS`] entries.
    pub fn from_slice(positions: &[Position]) -> Option<Self> {
        let positions: [Position; NUM_LANDMARKS] = positions.try_into().ok()?;
        Some(Self { positions })
    }

    /// Converts normalized estimator output into a pixel-space landmark set.
    ///
    /// X and Y of each position are in range 0.0 to 1.0 relative to the frame and get scaled by
    /// `resolution`. Z is passed through unchanged.
    ///
    /// Returns [`None`] if `normalized` does not yield exactly [`NUM_LANDMARKS`] positions.
    pub fn from_normalized<I>(normalized: I, resolution: Resolution) -> Option<Self>
    where
        I: IntoIterator<Item = Position>,
    {
        let (w, h) = (resolution.width() as f32, resolution.height() as f32);
        let scaled = normalized
            .into_iter()
            .map(|[x, y, z]| [x * w, y * h, z])
            .collect::<Vec<_>>();
        Self::from_slice(&scaled)
    }

    #[inline]
    pub fn positions(&self) -> &[Position; NUM_LANDMARKS] {
        &self.positions
    }

    #[inline]
    pub fn positions_mut(&mut self) -> &mut [Position; NUM_LANDMARKS] {
        &mut self.positions
    }

    /// Returns the 4 landmarks belonging to `finger`, ordered from the palm towards the tip.
    pub fn finger(&self, finger: Finger) -> [Position; 4] {
        let range = finger.landmark_range();
        let mut out = [[0.0; 3]; 4];
        out.copy_from_slice(&self.positions[range]);
        out
    }
}

impl Index<LandmarkIdx> for Landmarks {
    type Output = Position;

    fn index(&self, index: LandmarkIdx) -> &Position {
        &self.positions[index as usize]
    }
}

impl Index<usize> for Landmarks {
    type Output = Position;

    fn index(&self, index: usize) -> &Position {
        &self.positions[index]
    }
}

/// Names for the hand pose landmarks.
///
/// # Terminology
///
/// - **CMC**: [Carpometacarpal joint], the lowest joint of the thumb, located near the wrist.
/// - **MCP**: [Metacarpophalangeal joint], the lower joint forming the knuckles near the palm of
///   the hand.
/// - **PIP**: Proximal Interphalangeal joint, the joint between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: This landmark is just placed on the tip of the finger, above the DIP.
///
/// [Carpometacarpal joint]: https://en.wikipedia.org/wiki/Carpometacarpal_joint
/// [Metacarpophalangeal joint]: https://en.wikipedia.org/wiki/Metacarpophalangeal_joint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// The five fingers of a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// All fingers, in landmark order.
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Returns the lowercase name of the finger (`"thumb"`, `"index"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }

    /// Returns the position of this finger in [`Finger::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the range of landmark indices that belong to this finger.
    ///
    /// Each finger owns 4 consecutive landmarks, starting at index 1 for the thumb (index 0 is the
    /// wrist).
    pub fn landmark_range(self) -> Range<usize> {
        let start = 1 + 4 * self.index();
        start..start + 4
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pairs of landmarks connected by a bone, for drawing the hand skeleton.
pub const CONNECTIVITY: &[(LandmarkIdx, LandmarkIdx)] = {
    use LandmarkIdx::*;
    &[
        // Surround the palm:
        (Wrist, ThumbCmc),
        (ThumbCmc, IndexFingerMcp),
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, PinkyMcp),
        (PinkyMcp, Wrist),
        // Thumb:
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index:
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle:
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring:
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky:
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finger_ranges() {
        assert_eq!(Finger::Thumb.landmark_range(), 1..5);
        assert_eq!(Finger::Index.landmark_range(), 5..9);
        assert_eq!(Finger::Middle.landmark_range(), 9..13);
        assert_eq!(Finger::Ring.landmark_range(), 13..17);
        assert_eq!(Finger::Pinky.landmark_range(), 17..21);

        assert_eq!(
            Finger::Ring.landmark_range().start,
            LandmarkIdx::RingFingerMcp as usize
        );
        assert_eq!(
            Finger::Pinky.landmark_range().end - 1,
            LandmarkIdx::PinkyTip as usize
        );
    }

    #[test]
    fn finger_slice() {
        let mut positions = [[0.0; 3]; NUM_LANDMARKS];
        for (i, pos) in positions.iter_mut().enumerate() {
            *pos = [i as f32, 0.0, 0.0];
        }
        let lms = Landmarks::new(positions);
        let index = lms.finger(Finger::Index);
        assert_eq!(index.map(|p| p[0]), [5.0, 6.0, 7.0, 8.0]);
        assert_eq!(lms[LandmarkIdx::IndexFingerTip], [8.0, 0.0, 0.0]);
    }

    #[test]
    fn wrong_landmark_count() {
        assert!(Landmarks::from_slice(&[[0.0; 3]; 20]).is_none());
        assert!(Landmarks::from_slice(&[[0.0; 3]; 22]).is_none());
        assert!(Landmarks::from_slice(&[[0.0; 3]; 21]).is_some());
    }

    #[test]
    fn normalized_to_pixels() {
        let lms = Landmarks::from_normalized(
            std::iter::repeat([0.5, 0.25, -0.1]).take(NUM_LANDMARKS),
            Resolution::new(176, 144),
        )
        .unwrap();
        assert_eq!(lms[LandmarkIdx::Wrist], [88.0, 36.0, -0.1]);
    }

    #[test]
    fn connectivity_covers_all_landmarks() {
        let mut seen = [false; NUM_LANDMARKS];
        for (a, b) in CONNECTIVITY {
            seen[*a as usize] = true;
            seen[*b as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
