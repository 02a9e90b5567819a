//! Prosthetic hand control from a camera feed.
//!
//! Frames arrive from an external video pipeline and are handed to a single classification loop
//! through a latest-wins [`FrameSlot`]. Each cycle runs an external pose estimator on the frame,
//! computes one bend angle per finger from the 21 hand landmarks, optionally smooths the landmarks
//! over several frames, classifies every finger as extended, flexed (or in between), and forwards
//! the result to the hand's actuators.
//!
//! # Coordinates
//!
//! Landmark X and Y coordinates are in pixels of the source image (X right, Y *down*). Z is the
//! depth value reported by the pose estimator, in its own normalized unit.
//!
//! # Environment Variables
//!
//! [`Config::from_env`] reads `PROSTHAND_*` overrides for every configuration field, see the
//! [`config`] module. Logging is configured through `RUST_LOG`, see [`init_logger!`].
//!
//! [`FrameSlot`]: sync::FrameSlot
//! [`Config::from_env`]: config::Config::from_env

use log::LevelFilter;

pub mod actuator;
pub mod classify;
pub mod config;
pub mod filter;
pub mod frame;
pub mod geometry;
pub mod landmark;
pub mod overlay;
pub mod pipeline;
pub mod pose;
pub mod resolution;
pub mod smoothing;
pub mod sync;
pub mod timer;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_CRATE_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// If `cfg!(debug_assertions)` is enabled, the calling crate and `prosthand` will log at *trace*
/// level. Otherwise, they will log at *debug* level. `RUST_LOG` is applied on top of that.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
