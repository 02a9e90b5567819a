//! Exponential Moving Average.

use super::Filter;

/// An Exponential Moving Average (EMA) filter.
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    alpha: f32,
}

impl Ema {
    /// Averages each new value with the previous output, `(old + new) / 2`.
    ///
    /// Every value's weight is halved with each following value.
    pub const HALVING: Self = Self { alpha: 0.5 };

    /// Creates a new Exponential Moving Average filter.
    ///
    /// The `alpha` parameter must be between 0.0 and 1.0 and defines how quickly the weight of
    /// older values should decay. Values closer to 1.0 favor recent values over older values, while
    /// values closer to 0.0 favor more recent values less strongly.
    ///
    /// # Panics
    ///
    /// This method will panic if `alpha` is not in between 0.0 and 1.0.
    pub fn new(alpha: f32) -> Self {
        assert!((0.0..=1.0).contains(&alpha));
        Self { alpha }
    }
}

/// Filter state for [`Ema`] filters.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmaState {
    last: Option<f32>,
}

impl Filter<f32> for Ema {
    type State = EmaState;

    fn filter(&self, state: &mut Self::State, value: f32) -> f32 {
        let avg = match state.last {
            // The first value after a reset passes through unchanged.
            None => value,
            Some(last) => self.alpha * value + (1.0 - self.alpha) * last,
        };
        state.last = Some(avg);
        avg
    }
}

/// Filters each coordinate of a 3D position independently.
impl Filter<[f32; 3]> for Ema {
    type State = [EmaState; 3];

    fn filter(&self, state: &mut Self::State, value: [f32; 3]) -> [f32; 3] {
        let [x, y, z] = value;
        [
            <Self as Filter<f32>>::filter(self, &mut state[0], x),
            <Self as Filter<f32>>::filter(self, &mut state[1], y),
            <Self as Filter<f32>>::filter(self, &mut state[2], z),
        ]
    }
}
