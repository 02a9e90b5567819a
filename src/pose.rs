//! Interface to the hand pose estimator.

use crate::{frame::Frame, landmark::Landmarks};

/// Estimates the landmarks of a single hand in a frame.
///
/// The estimator itself (typically a neural network) lives outside this crate. Implementations
/// convert its output into pixel-space [`Landmarks`], for example with
/// [`Landmarks::from_normalized`].
///
/// Closures of type `FnMut(&F) -> anyhow::Result<Option<Landmarks>>` implement this trait.
pub trait PoseEstimator<F: Frame> {
    /// Runs the estimator on `frame`.
    ///
    /// Returns `Ok(None)` if no hand was detected. Errors are reserved for failures of the
    /// estimator itself. The classification loop treats both the same way and skips the frame.
    fn estimate(&mut self, frame: &F) -> anyhow::Result<Option<Landmarks>>;
}

impl<F, E> PoseEstimator<F> for E
where
    F: Frame,
    E: FnMut(&F) -> anyhow::Result<Option<Landmarks>>,
{
    fn estimate(&mut self, frame: &F) -> anyhow::Result<Option<Landmarks>> {
        self(frame)
    }
}
