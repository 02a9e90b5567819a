//! Driving the hand's actuators.

use std::{thread, time::Duration};

use anyhow::Context;

use crate::{
    classify::{FingerState, StateMap},
    landmark::Finger,
    timer::Timer,
};

/// Moves the fingers of the prosthetic hand.
///
/// [`Actuator::init`] is called once before the first [`Actuator::move_fingers`] call, and
/// [`Actuator::cleanup`] once after the last one.
pub trait Actuator {
    /// Brings the actuators into their initial position.
    fn init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Moves every finger into the position given by `states`.
    fn move_fingers(&mut self, states: &StateMap) -> anyhow::Result<()>;

    /// Returns the actuators to a safe resting position and releases them.
    fn cleanup(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn init(&mut self) -> anyhow::Result<()> {
        (**self).init()
    }

    fn move_fingers(&mut self, states: &StateMap) -> anyhow::Result<()> {
        (**self).move_fingers(states)
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        (**self).cleanup()
    }
}

/// Forwards classification results to an [`Actuator`].
///
/// The dispatcher owns the actuator's lifecycle: it is initialized by [`Dispatcher::new`] and
/// cleaned up by [`Dispatcher::finish`], or on drop if `finish` was never called.
pub struct Dispatcher<A: Actuator> {
    actuator: A,
    sent: u64,
    failed: u64,
    finished: bool,
    t_move: Timer,
}

impl<A: Actuator> Dispatcher<A> {
    /// Initializes `actuator` and wraps it in a [`Dispatcher`].
    pub fn new(mut actuator: A) -> anyhow::Result<Self> {
        actuator.init().context("failed to initialize actuator")?;
        log::info!("actuator initialized");
        Ok(Self {
            actuator,
            sent: 0,
            failed: 0,
            finished: false,
            t_move: Timer::new("move"),
        })
    }

    /// Sends `states` to the actuator.
    ///
    /// This is attempted exactly once. A failure is returned to the caller, who is expected to
    /// carry on with the next frame rather than retry: by the time a retry could happen, a newer
    /// frame is already waiting.
    pub fn dispatch(&mut self, states: &StateMap) -> anyhow::Result<()> {
        let result = self.t_move.time(|| self.actuator.move_fingers(states));
        match result {
            Ok(()) => self.sent += 1,
            Err(_) => self.failed += 1,
        }
        result
    }

    /// Returns the number of successfully dispatched state maps.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Returns the number of state maps the actuator failed to apply.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_move].into_iter()
    }

    /// Cleans up the actuator.
    ///
    /// Only the first call has an effect.
    pub fn finish(&mut self) -> anyhow::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.actuator
            .cleanup()
            .context("failed to clean up actuator")?;
        log::info!(
            "actuator released after {} commands ({} failed)",
            self.sent,
            self.failed
        );
        Ok(())
    }
}

impl<A: Actuator> Drop for Dispatcher<A> {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            log::error!("{e:#}");
        }
    }
}

/// An [`Actuator`] that only logs the finger states it receives.
#[derive(Debug, Default)]
pub struct LogActuator {
    last: Option<StateMap>,
}

impl LogActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recently received states.
    pub fn last(&self) -> Option<&StateMap> {
        self.last.as_ref()
    }
}

impl Actuator for LogActuator {
    fn move_fingers(&mut self, states: &StateMap) -> anyhow::Result<()> {
        if self.last.as_ref() != Some(states) {
            log::info!("{states}");
        }
        self.last = Some(*states);
        Ok(())
    }
}

/// A PWM output driving one servo.
///
/// Duty cycles are given in percent.
pub trait PwmChannel: Send {
    /// Starts emitting a PWM signal at `frequency` Hz with the given duty cycle.
    fn start(&mut self, frequency: f32, duty_cycle: f32) -> anyhow::Result<()>;

    /// Changes the duty cycle of a started channel.
    fn set_duty_cycle(&mut self, duty_cycle: f32) -> anyhow::Result<()>;

    /// Stops the PWM signal.
    fn stop(&mut self) -> anyhow::Result<()>;
}

/// PWM frequency of the hand's servos, in Hz (a period of 20 ms).
pub const SERVO_PWM_FREQUENCY: f32 = 50.0;

/// Servo duty cycles (in percent) of a fully extended and fully flexed finger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DutyCycles {
    pub extension: f32,
    pub flexion: f32,
}

impl DutyCycles {
    /// Duty cycles of the thumb servo. The thumb servo is mounted mirrored.
    pub const THUMB: Self = Self {
        extension: 5.0,
        flexion: 1.0,
    };

    /// Duty cycles of the index, middle, ring and pinky servos.
    pub const FINGER: Self = Self {
        extension: 2.0,
        flexion: 12.0,
    };

    /// Returns the duty cycle for `state`. [`FingerState::Mid`] is halfway between the extremes.
    pub fn for_state(&self, state: FingerState) -> f32 {
        match state {
            FingerState::Extension => self.extension,
            FingerState::Mid => (self.extension + self.flexion) / 2.0,
            FingerState::Flexion => self.flexion,
        }
    }
}

/// Five servos, one per finger, driven by [`PwmChannel`]s.
pub struct ServoHand<P: PwmChannel> {
    /// Indexed by [`Finger::index`].
    channels: [P; 5],
    thumb: DutyCycles,
    fingers: DutyCycles,
    settle_time: Duration,
}

impl<P: PwmChannel> ServoHand<P> {
    /// Time the servos are given to reach their resting position after init and during cleanup.
    pub const DEFAULT_SETTLE_TIME: Duration = Duration::from_millis(300);

    /// Creates a servo hand from one PWM channel per finger, in [`Finger::ALL`] order.
    pub fn new(channels: [P; 5]) -> Self {
        Self {
            channels,
            thumb: DutyCycles::THUMB,
            fingers: DutyCycles::FINGER,
            settle_time: Self::DEFAULT_SETTLE_TIME,
        }
    }

    /// Sets how long to wait for the servos to reach their resting position.
    pub fn with_settle_time(self, settle_time: Duration) -> Self {
        Self {
            settle_time,
            ..self
        }
    }

    fn duty_cycles(&self, finger: Finger) -> DutyCycles {
        match finger {
            Finger::Thumb => self.thumb,
            _ => self.fingers,
        }
    }

    fn settle(&self) {
        if !self.settle_time.is_zero() {
            thread::sleep(self.settle_time);
        }
    }
}

impl<P: PwmChannel> Actuator for ServoHand<P> {
    fn init(&mut self) -> anyhow::Result<()> {
        for finger in Finger::ALL {
            let duty = self.duty_cycles(finger).extension;
            self.channels[finger.index()]
                .start(SERVO_PWM_FREQUENCY, duty)
                .with_context(|| format!("failed to start {finger} servo"))?;
        }
        self.settle();
        Ok(())
    }

    fn move_fingers(&mut self, states: &StateMap) -> anyhow::Result<()> {
        // A broken servo must not keep the remaining fingers from moving.
        let mut result = Ok(());
        for (finger, state) in states.iter() {
            let duty = self.duty_cycles(finger).for_state(state);
            let res = self.channels[finger.index()]
                .set_duty_cycle(duty)
                .with_context(|| format!("failed to move {finger} servo to {state}"));
            result = result.and(res);
        }
        result
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        // Try every channel even if one fails, so no servo is left powered.
        let mut result = Ok(());
        for finger in Finger::ALL {
            let duty = self.duty_cycles(finger).extension;
            let res = self.channels[finger.index()]
                .set_duty_cycle(duty)
                .with_context(|| format!("failed to extend {finger} servo"));
            result = result.and(res);
        }
        self.settle();
        for finger in Finger::ALL {
            let res = self.channels[finger.index()]
                .stop()
                .with_context(|| format!("failed to stop {finger} servo"));
            result = result.and(res);
        }
        result
    }
}
