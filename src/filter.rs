//! Data filtering and smoothing.

pub mod ema;

/// Parameters of a filter for values of type `V`.
///
/// The filter parameters are kept apart from the filter's history (its [`Filter::State`]), so that
/// one set of parameters can be shared by many independently filtered values, like the coordinates
/// of a landmark set.
pub trait Filter<V> {
    /// Per-value history of the filter.
    ///
    /// The [`Default`] value is the state of a filter that has not seen any value yet. Resetting a
    /// filter means replacing its state with the default.
    type State: Default;

    /// Adds a new value to the filter `state`, returning the filtered value.
    fn filter(&self, state: &mut Self::State, value: V) -> V;
}
