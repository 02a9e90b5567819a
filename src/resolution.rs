//! Image resolutions.

use std::fmt;

/// Resolution (`width x height`) of a camera frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    /// QCIF resolution: `176x144`
    ///
    /// Small enough for the pose estimator to keep up with a 30 FPS camera on the hand's
    /// single-board computer.
    pub const QCIF: Self = Self {
        width: 176,
        height: 144,
    };

    /// Creates a new [`Resolution`] of `width x height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the width of this [`Resolution`].
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of this [`Resolution`].
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn num_pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns whether either dimension is 0.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_pixels() == 0
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::QCIF
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
