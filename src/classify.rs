//! Finger state classification.
//!
//! Each finger's bend angle is mapped to a discrete [`FingerState`] by a threshold [`Policy`]. Two
//! policies exist:
//!
//! - [`Policy::Single`] splits the angle range into [`FingerState::Extension`] and
//!   [`FingerState::Flexion`] at one threshold.
//! - [`Policy::Hysteresis`] adds a dead zone between two thresholds that maps to
//!   [`FingerState::Mid`], which keeps the actuators from toggling rapidly when a finger is held
//!   near the decision boundary.
//!
//! The thumb bends differently from the other fingers and gets its own policy in [`Thresholds`].

use std::{
    fmt,
    ops::{Index, IndexMut},
};

use crate::{
    geometry::{self, DegenerateGeometry},
    landmark::{Finger, Landmarks},
};

/// Discrete position of a finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FingerState {
    /// The finger is stretched out.
    #[default]
    Extension,
    /// The finger is partially bent. Only produced by [`Policy::Hysteresis`].
    Mid,
    /// The finger is curled.
    Flexion,
}

impl FingerState {
    pub fn name(self) -> &'static str {
        match self {
            FingerState::Extension => "extension",
            FingerState::Mid => "mid",
            FingerState::Flexion => "flexion",
        }
    }
}

impl fmt::Display for FingerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rule mapping a bend angle (in radians) to a [`FingerState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Policy {
    /// `Flexion` above `threshold`, `Extension` otherwise (including exactly at `threshold`).
    Single { threshold: f32 },
    /// `Flexion` above `max`, `Extension` below `min`, `Mid` in between (bounds inclusive).
    Hysteresis { min: f32, max: f32 },
}

impl Policy {
    pub fn classify(&self, angle: f32) -> FingerState {
        match *self {
            Policy::Single { threshold } => {
                if angle > threshold {
                    FingerState::Flexion
                } else {
                    FingerState::Extension
                }
            }
            Policy::Hysteresis { min, max } => {
                if angle > max {
                    FingerState::Flexion
                } else if angle < min {
                    FingerState::Extension
                } else {
                    FingerState::Mid
                }
            }
        }
    }
}

/// Per-finger classification policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    fingers: Policy,
    thumb: Policy,
}

impl Thresholds {
    /// Creates single-threshold policies for the thumb and the other four fingers.
    pub fn single(threshold: f32, thumb_threshold: f32) -> Self {
        Self {
            fingers: Policy::Single { threshold },
            thumb: Policy::Single {
                threshold: thumb_threshold,
            },
        }
    }

    /// Creates two-threshold policies for the thumb and the other four fingers.
    ///
    /// # Panics
    ///
    /// This method panics if a `min` bound is larger than its `max` bound.
    pub fn hysteresis(min: f32, max: f32, thumb_min: f32, thumb_max: f32) -> Self {
        assert!(min <= max, "hysteresis bounds out of order: {min} > {max}");
        assert!(
            thumb_min <= thumb_max,
            "thumb hysteresis bounds out of order: {thumb_min} > {thumb_max}"
        );
        Self {
            fingers: Policy::Hysteresis { min, max },
            thumb: Policy::Hysteresis {
                min: thumb_min,
                max: thumb_max,
            },
        }
    }

    /// Returns the policy used for `finger`.
    pub fn policy(&self, finger: Finger) -> Policy {
        match finger {
            Finger::Thumb => self.thumb,
            _ => self.fingers,
        }
    }
}

/// The state of all five fingers.
///
/// Fingers that have never been classified are in [`FingerState::Extension`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StateMap {
    states: [FingerState; 5],
}

impl StateMap {
    /// Returns a map with every finger in `state`.
    pub fn uniform(state: FingerState) -> Self {
        Self { states: [state; 5] }
    }

    #[inline]
    pub fn get(&self, finger: Finger) -> FingerState {
        self.states[finger.index()]
    }

    #[inline]
    pub fn set(&mut self, finger: Finger, state: FingerState) {
        self.states[finger.index()] = state;
    }

    /// Returns an iterator over all fingers and their state, thumb first.
    pub fn iter(&self) -> impl Iterator<Item = (Finger, FingerState)> + '_ {
        Finger::ALL.into_iter().map(|finger| (finger, self.get(finger)))
    }
}

impl Index<Finger> for StateMap {
    type Output = FingerState;

    fn index(&self, finger: Finger) -> &FingerState {
        &self.states[finger.index()]
    }
}

impl IndexMut<Finger> for StateMap {
    fn index_mut(&mut self, finger: Finger) -> &mut FingerState {
        &mut self.states[finger.index()]
    }
}

/// Formats as `{thumb: extension, index: flexion, ...}`.
impl fmt::Display for StateMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (finger, state)) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{finger}: {state}")?;
        }
        f.write_str("}")
    }
}

/// Classifies hand poses into a [`StateMap`].
///
/// A finger whose angle cannot be computed keeps the state it had in the previous cycle, so that a
/// single bad detection does not move the actuator.
#[derive(Debug, Clone)]
pub struct Classifier {
    thresholds: Thresholds,
    prev: StateMap,
}

impl Classifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            prev: StateMap::default(),
        }
    }

    /// Classifies a set of per-finger angles, indexed by [`Finger::index`].
    pub fn classify_angles(&mut self, angles: &[Result<f32, DegenerateGeometry>; 5]) -> StateMap {
        let mut states = self.prev;
        for finger in Finger::ALL {
            match angles[finger.index()] {
                Ok(angle) => {
                    let state = self.thresholds.policy(finger).classify(angle);
                    log::trace!("{finger}: {angle:.3} rad -> {state}");
                    states[finger] = state;
                }
                Err(e) => {
                    log::warn!("{finger}: {e}, keeping {}", states[finger]);
                }
            }
        }
        self.prev = states;
        states
    }

    /// Computes the bend angle of every finger in `landmarks` and classifies them.
    pub fn classify(&mut self, landmarks: &Landmarks) -> StateMap {
        self.classify_angles(&geometry::finger_angles(landmarks))
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::compute_bend_angle;

    use super::*;

    fn degenerate() -> Result<f32, DegenerateGeometry> {
        compute_bend_angle([0.0; 3], [0.0; 3], [1.0, 0.0, 0.0])
    }

    #[test]
    fn single_threshold_boundary() {
        let policy = Policy::Single { threshold: 0.1 };
        assert_eq!(policy.classify(0.1), FingerState::Extension);
        assert_eq!(policy.classify(0.0999), FingerState::Extension);
        assert_eq!(policy.classify(0.1001), FingerState::Flexion);
        assert_eq!(policy.classify(3.0), FingerState::Flexion);
    }

    #[test]
    fn hysteresis() {
        let policy = Policy::Hysteresis {
            min: 0.05,
            max: 0.1,
        };
        assert_eq!(policy.classify(0.07), FingerState::Mid);
        assert_eq!(policy.classify(0.04), FingerState::Extension);
        assert_eq!(policy.classify(0.11), FingerState::Flexion);
        assert_eq!(policy.classify(0.05), FingerState::Mid);
        assert_eq!(policy.classify(0.1), FingerState::Mid);
    }

    #[test]
    fn thumb_policy_is_separate() {
        let t = Thresholds::single(0.1, 0.3);
        assert_eq!(t.policy(Finger::Thumb), Policy::Single { threshold: 0.3 });
        for finger in &Finger::ALL[1..] {
            assert_eq!(t.policy(*finger), Policy::Single { threshold: 0.1 });
        }

        let mut classifier = Classifier::new(t);
        let states = classifier.classify_angles(&[Ok(0.2); 5]);
        assert_eq!(states[Finger::Thumb], FingerState::Extension);
        assert_eq!(states[Finger::Pinky], FingerState::Flexion);
    }

    #[test]
    #[should_panic]
    fn hysteresis_bounds_order() {
        Thresholds::hysteresis(0.2, 0.1, 0.0, 1.0);
    }

    #[test]
    fn degenerate_keeps_previous_state() {
        let mut classifier = Classifier::new(Thresholds::single(0.1, 0.1));
        let states = classifier.classify_angles(&[Ok(0.5); 5]);
        assert_eq!(states, StateMap::uniform(FingerState::Flexion));

        let states = classifier.classify_angles(&[
            Ok(0.0),
            degenerate(),
            Ok(0.0),
            degenerate(),
            Ok(0.0),
        ]);
        assert_eq!(states[Finger::Thumb], FingerState::Extension);
        assert_eq!(states[Finger::Index], FingerState::Flexion);
        assert_eq!(states[Finger::Middle], FingerState::Extension);
        assert_eq!(states[Finger::Ring], FingerState::Flexion);
        assert_eq!(states[Finger::Pinky], FingerState::Extension);

        // A fully degenerate cycle repeats the last result.
        assert_eq!(classifier.classify_angles(&[(); 5].map(|_| degenerate())), states);
    }

    #[test]
    fn degenerate_on_first_cycle_is_extension() {
        let mut classifier = Classifier::new(Thresholds::hysteresis(0.05, 0.1, 0.05, 0.1));
        let states = classifier.classify(&Landmarks::default());
        assert_eq!(states, StateMap::uniform(FingerState::Extension));
    }

    #[test]
    fn display() {
        let mut map = StateMap::default();
        map.set(Finger::Index, FingerState::Flexion);
        map[Finger::Ring] = FingerState::Mid;
        assert_eq!(
            map.to_string(),
            "{thumb: extension, index: flexion, middle: extension, ring: mid, pinky: extension}"
        );
    }
}
