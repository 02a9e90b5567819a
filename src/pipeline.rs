//! The classification loop.
//!
//! [`ClassificationLoop`] owns every piece of per-hand state (smoothing buffer, classifier,
//! actuator) and runs one classification cycle per frame taken from a [`FrameSlot`]. It is meant to
//! run on its own thread, see [`ClassificationLoop::spawn`].

use std::{
    fmt, io,
    marker::PhantomData,
    panic::resume_unwind,
    sync::Arc,
    thread::{self, JoinHandle},
};

use crate::{
    actuator::{Actuator, Dispatcher},
    classify::{Classifier, StateMap},
    config::Config,
    frame::Frame,
    overlay::OverlaySink,
    pose::PoseEstimator,
    resolution::Resolution,
    smoothing::SmoothingBuffer,
    sync::FrameSlot,
    timer::{FpsCounter, Timer},
};

/// Outcome of a single classification cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// The fingers were classified and the result was sent to the actuator.
    Dispatched(StateMap),
    /// The landmarks were added to the smoothing buffer, which is not full yet.
    Accumulating,
    /// No hand was detected, or the pose estimator failed. Nothing was classified.
    NoHand,
    /// The fingers were classified, but the actuator failed to apply the result.
    ActuationFailed(StateMap),
}

/// Runs pose estimation, smoothing, classification and actuation on incoming frames.
pub struct ClassificationLoop<F, P, A>
where
    F: Frame,
    P: PoseEstimator<F>,
    A: Actuator,
{
    resolution: Resolution,
    warned_resolution: bool,
    estimator: P,
    smoothing: Option<SmoothingBuffer>,
    classifier: Classifier,
    dispatcher: Dispatcher<A>,
    overlay: Option<Box<dyn OverlaySink + Send>>,
    t_estimate: Timer,
    t_classify: Timer,
    fps: FpsCounter,
    _frame: PhantomData<fn(F)>,
}

impl<F, P, A> ClassificationLoop<F, P, A>
where
    F: Frame,
    P: PoseEstimator<F>,
    A: Actuator,
{
    /// Creates a classification loop and initializes `actuator`.
    ///
    /// Fails if `config` is invalid or the actuator could not be initialized.
    pub fn new(config: &Config, estimator: P, actuator: A) -> anyhow::Result<Self> {
        let thresholds = config.thresholds()?;
        let dispatcher = Dispatcher::new(actuator)?;
        Ok(Self {
            resolution: config.resolution(),
            warned_resolution: false,
            estimator,
            smoothing: config.smoothing_window().map(SmoothingBuffer::new),
            classifier: Classifier::new(thresholds),
            dispatcher,
            overlay: None,
            t_estimate: Timer::new("estimate"),
            t_classify: Timer::new("classify"),
            fps: FpsCounter::new("classification"),
            _frame: PhantomData,
        })
    }

    /// Passes the detected landmarks of every frame to `sink`, before smoothing.
    pub fn with_overlay<S: OverlaySink + Send + 'static>(mut self, sink: S) -> Self {
        self.overlay = Some(Box::new(sink));
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher<A> {
        &self.dispatcher
    }

    /// Runs a single classification cycle on `frame`.
    ///
    /// The frame is released as soon as the pose estimator is done with it, on every path.
    pub fn process(&mut self, frame: F) -> Cycle {
        if frame.resolution() != self.resolution && !self.warned_resolution {
            log::warn!(
                "received {} frame, configured source size is {}",
                frame.resolution(),
                self.resolution
            );
            self.warned_resolution = true;
        }

        let estimate = self.t_estimate.time(|| self.estimator.estimate(&frame));
        drop(frame);

        let landmarks = match estimate {
            Ok(Some(landmarks)) => landmarks,
            Ok(None) => {
                log::trace!("no hand detected");
                return Cycle::NoHand;
            }
            Err(e) => {
                log::warn!("pose estimation failed: {e:#}");
                return Cycle::NoHand;
            }
        };

        if let Some(overlay) = &mut self.overlay {
            overlay.update(&landmarks);
        }

        let landmarks = match &mut self.smoothing {
            None => landmarks,
            Some(buffer) => match buffer.push(&landmarks) {
                Some(mean) => mean,
                None => {
                    log::trace!("{} landmark sets accumulated", buffer.len());
                    return Cycle::Accumulating;
                }
            },
        };

        let states = self.t_classify.time(|| self.classifier.classify(&landmarks));
        log::trace!("{states}");

        match self.dispatcher.dispatch(&states) {
            Ok(()) => Cycle::Dispatched(states),
            Err(e) => {
                log::warn!("failed to move fingers to {states}: {e:#}");
                Cycle::ActuationFailed(states)
            }
        }
    }

    /// Processes frames from `slot` until it is shut down, then cleans up the actuator.
    pub fn run(&mut self, slot: &FrameSlot<F>) -> anyhow::Result<()> {
        log::info!("classification loop started");
        while let Ok(frame) = slot.take_or_wait() {
            self.process(frame);

            let dropped = DroppedFrames(slot.dropped_frames());
            let timers = [&self.t_estimate, &self.t_classify]
                .into_iter()
                .chain(self.dispatcher.timers())
                .map(|t| t as &dyn fmt::Display);
            self.fps
                .tick_with(timers.chain([&dropped as &dyn fmt::Display]));
        }
        log::info!(
            "classification loop stopped, {} commands sent ({} failed), {} frames dropped",
            self.dispatcher.sent(),
            self.dispatcher.failed(),
            slot.dropped_frames()
        );
        self.dispatcher.finish()
    }
}

impl<F, P, A> ClassificationLoop<F, P, A>
where
    F: Frame + 'static,
    P: PoseEstimator<F> + Send + 'static,
    A: Actuator + Send + 'static,
{
    /// Moves the loop to a new thread that processes frames submitted to `slot`.
    pub fn spawn(mut self, slot: Arc<FrameSlot<F>>) -> io::Result<PipelineHandle<F>> {
        let thread_slot = slot.clone();
        let handle = thread::Builder::new()
            .name("classification".into())
            .spawn(move || self.run(&thread_slot))?;
        Ok(PipelineHandle {
            slot,
            handle: Some(handle),
        })
    }
}

struct DroppedFrames(u64);

impl fmt::Display for DroppedFrames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dropped: {}", self.0)
    }
}

/// Handle to a [`ClassificationLoop`] running on its own thread.
///
/// Dropping the handle shuts the loop down and waits for it to exit. If the loop thread has
/// panicked, the panic is propagated to the thread dropping the handle (or calling
/// [`PipelineHandle::shutdown`]).
pub struct PipelineHandle<F> {
    slot: Arc<FrameSlot<F>>,
    handle: Option<JoinHandle<anyhow::Result<()>>>,
}

impl<F> PipelineHandle<F> {
    /// Hands a new frame to the loop, replacing any frame it has not picked up yet.
    ///
    /// Returns `false` if the loop has been shut down; `frame` is dropped in that case.
    pub fn submit(&self, frame: F) -> bool {
        self.slot.submit(frame)
    }

    /// Stops the loop, waits for it to exit and returns the result of the actuator cleanup.
    pub fn shutdown(mut self) -> anyhow::Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        self.slot.shutdown();
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(payload) => {
                    if thread::panicking() {
                        Ok(())
                    } else {
                        resume_unwind(payload)
                    }
                }
            },
            None => Ok(()),
        }
    }
}

impl<F> Drop for PipelineHandle<F> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("{e:#}");
        }
    }
}
