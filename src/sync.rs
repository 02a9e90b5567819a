//! Frame hand-off between the video pipeline and the classification loop.
//!
//! Video arrives faster than a frame can be classified. Instead of queueing frames, which would
//! make latency grow without bound, the [`FrameSlot`] holds at most one frame: every submitted frame
//! replaces the one before it, and the consumer always gets the most recent one.

use std::{
    error::Error,
    fmt,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
};

/// Error returned by [`FrameSlot`] methods after [`FrameSlot::shutdown`] has been called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped {
    _priv: (),
}

impl fmt::Display for Stopped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("frame intake has been shut down")
    }
}

impl Error for Stopped {}

/// A single-frame, latest-wins slot shared between one producer and one consumer thread.
pub struct FrameSlot<F> {
    state: Mutex<State<F>>,
    cond: Condvar,
}

struct State<F> {
    frame: Option<F>,
    running: bool,
    /// Number of frames that were replaced before the consumer took them.
    dropped: u64,
}

impl<F> Default for FrameSlot<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> FrameSlot<F> {
    /// Creates an empty, running slot.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                frame: None,
                running: true,
                dropped: 0,
            }),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<F>> {
        // The state is valid after every individual write, so a panic while holding the lock
        // can't leave it inconsistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `frame` in the slot and wakes up the consumer.
    ///
    /// Any frame that is still in the slot is dropped (and thereby released). This never blocks
    /// for longer than it takes to acquire the internal lock.
    ///
    /// Returns `false` if the slot has been shut down. `frame` is dropped in that case.
    pub fn submit(&self, frame: F) -> bool {
        let mut state = self.lock();
        if !state.running {
            drop(state);
            drop(frame);
            return false;
        }

        let replaced = state.frame.replace(frame);
        if replaced.is_some() {
            state.dropped += 1;
        }
        drop(state);
        self.cond.notify_all();

        if replaced.is_some() {
            log::trace!("dropping unconsumed frame");
        }
        drop(replaced);
        true
    }

    /// Blocks until a frame is available and takes it out of the slot.
    ///
    /// Returns [`Stopped`] as soon as the slot is shut down, even if a frame is pending.
    pub fn take_or_wait(&self) -> Result<F, Stopped> {
        let state = self.lock();
        let mut state = self
            .cond
            .wait_while(state, |s| s.running && s.frame.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        match state.frame.take() {
            Some(frame) if state.running => Ok(frame),
            _ => Err(Stopped { _priv: () }),
        }
    }

    /// Stops the slot, waking up all threads blocked in [`FrameSlot::take_or_wait`].
    ///
    /// A pending frame is released. All later calls to [`FrameSlot::take_or_wait`] return [`Stopped`], and
    /// [`FrameSlot::submit`] rejects new frames. Calling this more than once has no further effect.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        let was_running = std::mem::replace(&mut state.running, false);
        let pending = state.frame.take();
        drop(state);
        self.cond.notify_all();

        if was_running {
            log::debug!("frame intake shut down");
        }
        drop(pending);
    }

    /// Returns the number of frames that were replaced by a newer frame before being taken.
    pub fn dropped_frames(&self) -> u64 {
        self.lock().dropped
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            mpsc, Arc,
        },
        thread,
        time::{Duration, Instant},
    };

    use super::*;

    const BOUND: Duration = Duration::from_secs(5);

    /// Counts how many of its instances have been dropped.
    struct Tracked(u32, Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.1.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn latest_wins() {
        let slot = FrameSlot::new();
        assert!(slot.submit(1));
        assert!(slot.submit(2));
        assert_eq!(slot.take_or_wait(), Ok(2));
        assert_eq!(slot.dropped_frames(), 1);

        // Taking empties the slot, so the next frame isn't counted as dropped.
        assert!(slot.submit(3));
        assert_eq!(slot.take_or_wait(), Ok(3));
        assert_eq!(slot.dropped_frames(), 1);
    }

    #[test]
    fn replaced_frames_are_released() {
        let released = Arc::new(AtomicUsize::new(0));
        let slot = FrameSlot::new();
        slot.submit(Tracked(1, released.clone()));
        slot.submit(Tracked(2, released.clone()));
        slot.submit(Tracked(3, released.clone()));
        assert_eq!(released.load(Ordering::SeqCst), 2);

        let frame = slot.take_or_wait().unwrap();
        assert_eq!(frame.0, 3);
        drop(frame);
        assert_eq!(released.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn wakes_on_submit() {
        let slot = Arc::new(FrameSlot::new());
        let (tx, rx) = mpsc::channel();
        let consumer = thread::spawn({
            let slot = slot.clone();
            move || tx.send(slot.take_or_wait()).unwrap()
        });

        thread::sleep(Duration::from_millis(20));
        slot.submit(7);
        assert_eq!(rx.recv_timeout(BOUND).unwrap(), Ok(7));
        consumer.join().unwrap();
    }

    #[test]
    fn shutdown_wakes_waiter() {
        let slot = Arc::new(FrameSlot::<u32>::new());
        let (tx, rx) = mpsc::channel();
        let consumer = thread::spawn({
            let slot = slot.clone();
            move || tx.send(slot.take_or_wait()).unwrap()
        });

        thread::sleep(Duration::from_millis(20));
        slot.shutdown();
        assert_eq!(
            rx.recv_timeout(BOUND).unwrap(),
            Err(Stopped { _priv: () })
        );
        consumer.join().unwrap();

        // Every later call returns immediately.
        let start = Instant::now();
        for _ in 0..10 {
            assert!(slot.take_or_wait().is_err());
        }
        assert!(start.elapsed() < BOUND);
    }

    #[test]
    fn shutdown_is_idempotent_and_releases_pending() {
        let released = Arc::new(AtomicUsize::new(0));
        let slot = FrameSlot::new();
        slot.submit(Tracked(1, released.clone()));
        slot.shutdown();
        assert_eq!(released.load(Ordering::SeqCst), 1);
        slot.shutdown();

        assert!(!slot.submit(Tracked(2, released.clone())));
        assert_eq!(released.load(Ordering::SeqCst), 2);
        assert!(slot.take_or_wait().is_err());
    }

    #[test]
    fn concurrent_producer_sees_no_deadlock() {
        let slot = Arc::new(FrameSlot::new());
        let producer = thread::spawn({
            let slot = slot.clone();
            move || {
                for i in 0..10_000u32 {
                    if !slot.submit(i) {
                        break;
                    }
                }
            }
        });

        let mut last = None;
        while last != Some(9_999) {
            let frame = slot.take_or_wait().unwrap();
            if let Some(prev) = last {
                assert!(frame > prev, "frames must arrive in submission order");
            }
            last = Some(frame);
        }
        producer.join().unwrap();
        slot.shutdown();
    }
}
