//! Camera frames borrowed from the video pipeline.

use anyhow::ensure;

use crate::resolution::Resolution;

/// A frame of RGB24 pixel data owned by the video pipeline.
///
/// The classification loop holds on to a frame for the duration of one cycle. The frame's buffer
/// must stay valid until the value is dropped; implementations return or unmap the buffer in their
/// [`Drop`] impl. Every path through the loop drops the frame before the next one is requested.
pub trait Frame: Send {
    /// Returns the size of the frame in pixels.
    fn resolution(&self) -> Resolution;

    /// Returns the frame's pixel data, 3 bytes per pixel, row by row.
    fn pixels(&self) -> &[u8];
}

/// A [`Frame`] backed by an owned pixel buffer.
#[derive(Clone)]
pub struct RgbFrame {
    resolution: Resolution,
    data: Vec<u8>,
}

impl RgbFrame {
    /// Wraps `data` as an RGB24 frame of size `resolution`.
    ///
    /// Fails if `data` is not exactly `width * height * 3` bytes long.
    pub fn new(resolution: Resolution, data: Vec<u8>) -> anyhow::Result<Self> {
        let expected = resolution.num_pixels() * 3;
        ensure!(
            data.len() as u64 == expected,
            "frame buffer for {resolution} has {} bytes, expected {expected}",
            data.len(),
        );
        Ok(Self { resolution, data })
    }

    /// Creates an all-black frame.
    pub fn black(resolution: Resolution) -> Self {
        Self {
            resolution,
            data: vec![0; resolution.num_pixels() as usize * 3],
        }
    }
}

impl Frame for RgbFrame {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn pixels(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_size() {
        let res = Resolution::new(4, 2);
        assert!(RgbFrame::new(res, vec![0; 24]).is_ok());
        assert!(RgbFrame::new(res, vec![0; 23]).is_err());
        assert_eq!(RgbFrame::black(res).pixels().len(), 24);
    }
}
