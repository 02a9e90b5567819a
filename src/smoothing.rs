//! Temporal smoothing of landmark sets.

use crate::{
    filter::{
        ema::{Ema, EmaState},
        Filter,
    },
    landmark::{Landmarks, Position, NUM_LANDMARKS},
};

/// Accumulates landmark sets over a window of frames.
///
/// Every coordinate is smoothed by averaging it with the previously accumulated value
/// ([`Ema::HALVING`]). The first set after a reset is taken as-is. This is *not* the arithmetic mean
/// over the window: with sets `A`, `B`, `C` the result is `((A + B) / 2 + C) / 2`, giving later
/// frames more weight.
///
/// Once the window is full, [`SmoothingBuffer::push`] returns the accumulated set and the buffer
/// starts over, so decisions based on the smoothed landmarks are made once every `window` frames.
pub struct SmoothingBuffer {
    window: usize,
    count: usize,
    filter: Ema,
    states: [[EmaState; 3]; NUM_LANDMARKS],
    mean: Landmarks,
}

impl SmoothingBuffer {
    /// Creates a smoothing buffer that completes after `window` landmark sets.
    ///
    /// # Panics
    ///
    /// This method panics if `window` is 0.
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "smoothing window must not be empty");
        Self {
            window,
            count: 0,
            filter: Ema::HALVING,
            states: Default::default(),
            mean: Landmarks::default(),
        }
    }

    /// Returns the number of landmark sets accumulated since the last reset.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Averages `landmarks` into the accumulated set without checking the window.
    pub fn update(&mut self, landmarks: &Landmarks) -> &Landmarks {
        let positions = self.mean.positions_mut().iter_mut();
        for ((pos, state), new) in positions.zip(&mut self.states).zip(landmarks.positions()) {
            *pos = <Ema as Filter<Position>>::filter(&self.filter, state, *new);
        }
        self.count += 1;
        &self.mean
    }

    /// Adds `landmarks` to the buffer.
    ///
    /// If this completes the window, the accumulated set is returned and the buffer is reset.
    /// Otherwise, returns [`None`].
    pub fn push(&mut self, landmarks: &Landmarks) -> Option<Landmarks> {
        self.update(landmarks);
        if self.count < self.window {
            return None;
        }

        let mean = self.mean.clone();
        self.reset();
        Some(mean)
    }

    /// Discards all accumulated landmark sets.
    pub fn reset(&mut self) {
        self.count = 0;
        self.states = Default::default();
        self.mean = Landmarks::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(value: f32) -> Landmarks {
        Landmarks::new([[value, value * 2.0, -value]; NUM_LANDMARKS])
    }

    fn random(rng: &mut fastrand::Rng) -> Landmarks {
        let mut lms = Landmarks::default();
        for pos in lms.positions_mut() {
            *pos = [(); 3].map(|_| rng.f32() * 100.0);
        }
        lms
    }

    #[test]
    fn first_update_is_identity() {
        let mut rng = fastrand::Rng::with_seed(1);
        let a = random(&mut rng);
        let mut buf = SmoothingBuffer::new(5);
        assert!(buf.is_empty());
        assert_eq!(buf.update(&a), &a);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn second_update_is_pairwise_mean() {
        let mut rng = fastrand::Rng::with_seed(2);
        let a = random(&mut rng);
        let b = random(&mut rng);
        let mut buf = SmoothingBuffer::new(5);
        buf.update(&a);
        let mean = buf.update(&b).clone();
        for i in 0..NUM_LANDMARKS {
            for c in 0..3 {
                assert_eq!(mean[i][c], (a[i][c] + b[i][c]) / 2.0);
            }
        }
    }

    #[test]
    fn recursive_halving() {
        let mut buf = SmoothingBuffer::new(10);
        buf.update(&filled(0.0));
        buf.update(&filled(4.0));
        // (0 + 4) / 2 = 2, then (2 + 8) / 2 = 5. A true mean would be 4.
        let mean = buf.update(&filled(8.0));
        assert_eq!(mean, &filled(5.0));
        // (5 + 1) / 2 = 3. A true mean would be 3.25.
        let mean = buf.update(&filled(1.0));
        assert_eq!(mean, &filled(3.0));
    }

    #[test]
    fn completes_after_window() {
        let mut buf = SmoothingBuffer::new(3);
        assert_eq!(buf.push(&filled(2.0)), None);
        assert_eq!(buf.push(&filled(4.0)), None);
        assert_eq!(buf.push(&filled(6.0)), Some(filled(4.5)));
        assert!(buf.is_empty());

        // The next window starts from scratch.
        assert_eq!(buf.push(&filled(10.0)), None);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.push(&filled(10.0)), None);
        assert_eq!(buf.push(&filled(10.0)), Some(filled(10.0)));
    }

    #[test]
    fn window_of_one() {
        let mut buf = SmoothingBuffer::new(1);
        assert_eq!(buf.push(&filled(3.0)), Some(filled(3.0)));
        assert_eq!(buf.push(&filled(7.0)), Some(filled(7.0)));
    }

    #[test]
    fn reset() {
        let mut buf = SmoothingBuffer::new(4);
        buf.push(&filled(3.0));
        buf.push(&filled(5.0));
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.push(&filled(1.0)), None);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.push(&filled(1.0)), None);
        assert_eq!(buf.push(&filled(1.0)), None);
        assert_eq!(buf.push(&filled(1.0)), Some(filled(1.0)));
    }
}
