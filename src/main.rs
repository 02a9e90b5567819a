//! Replays recorded hand landmarks through the classification loop.
//!
//! The recording is a text file with one landmark set per line: 63 comma-separated numbers (X, Y
//! and Z of all 21 landmarks) in normalized image coordinates, as produced by the pose estimator.
//! An empty line is a frame in which no hand was detected. Lines starting with `#` are ignored.
//!
//! Usage: prosthand recording.csv --fps 15 --smoothing-window 3

use std::{fs, path::PathBuf, sync::Arc, thread, time::Duration};

use anyhow::{bail, Context};
use clap::Parser;
use prosthand::{
    actuator::LogActuator,
    config::Config,
    frame::{Frame, RgbFrame},
    landmark::{Landmarks, NUM_LANDMARKS},
    overlay,
    pipeline::ClassificationLoop,
    resolution::Resolution,
    sync::FrameSlot,
};

#[derive(Parser, Debug)]
#[command(name = "prosthand")]
#[command(about = "Replay recorded hand landmarks through the finger classifier")]
struct Args {
    /// Recording with one landmark set per line
    recording: PathBuf,

    /// Frames per second to submit
    #[arg(long, default_value = "30")]
    fps: f32,

    /// Width of the source frames in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Height of the source frames in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Bend angle (radians) at or below which a finger is extended
    #[arg(long)]
    extension_threshold: Option<f32>,

    /// Bend angle (radians) above which a finger is flexed; enables the Mid state
    #[arg(long)]
    flexion_threshold: Option<f32>,

    /// Extension threshold for the thumb
    #[arg(long)]
    thumb_extension_threshold: Option<f32>,

    /// Flexion threshold for the thumb
    #[arg(long)]
    thumb_flexion_threshold: Option<f32>,

    /// Number of frames to smooth landmarks over (0 or 1 disables smoothing)
    #[arg(long)]
    smoothing_window: Option<usize>,

    /// Log the SVG overlay of every detected hand
    #[arg(long)]
    overlay: bool,
}

impl Args {
    fn apply(&self, mut config: Config) -> Config {
        let res = config.resolution();
        config = config.source_resolution(Resolution::new(
            self.width.unwrap_or(res.width()),
            self.height.unwrap_or(res.height()),
        ));
        if let Some(t) = self.extension_threshold {
            config = config.extension_threshold(t);
        }
        if let Some(t) = self.flexion_threshold {
            config = config.flexion_threshold(t);
        }
        if let Some(t) = self.thumb_extension_threshold {
            config = config.thumb_extension_threshold(t);
        }
        if let Some(t) = self.thumb_flexion_threshold {
            config = config.thumb_flexion_threshold(t);
        }
        if let Some(n) = self.smoothing_window {
            config = config.smoothing_window_size(n);
        }
        config
    }
}

/// A black frame carrying the landmarks recorded for it.
struct RecordedFrame {
    image: RgbFrame,
    landmarks: Option<Landmarks>,
}

impl Frame for RecordedFrame {
    fn resolution(&self) -> Resolution {
        self.image.resolution()
    }

    fn pixels(&self) -> &[u8] {
        self.image.pixels()
    }
}

fn parse_recording(text: &str, resolution: Resolution) -> anyhow::Result<Vec<Option<Landmarks>>> {
    let mut sets = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if line.is_empty() {
            sets.push(None);
            continue;
        }

        let coords = line
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("line {}: invalid number", i + 1))?;
        if coords.len() != NUM_LANDMARKS * 3 {
            bail!(
                "line {}: expected {} values, got {}",
                i + 1,
                NUM_LANDMARKS * 3,
                coords.len()
            );
        }
        let positions = coords.chunks_exact(3).map(|c| [c[0], c[1], c[2]]);
        sets.push(Landmarks::from_normalized(positions, resolution));
    }
    Ok(sets)
}

/// Returns the time between two submitted frames at `fps` frames per second.
fn frame_interval(fps: f32) -> anyhow::Result<Duration> {
    if fps.is_nan() || fps <= 0.0 {
        bail!("--fps must be positive, got {fps}");
    }
    match Duration::try_from_secs_f32(1.0 / fps) {
        Ok(interval) => Ok(interval),
        Err(e) => bail!("--fps {fps} is out of range: {e}"),
    }
}

fn main() -> anyhow::Result<()> {
    prosthand::init_logger!();

    let args = Args::parse();
    let config = args.apply(Config::from_env()?);
    config.validate()?;
    let resolution = config.resolution();
    let interval = frame_interval(args.fps)?;

    let text = fs::read_to_string(&args.recording)
        .with_context(|| format!("failed to read '{}'", args.recording.display()))?;
    let recording = parse_recording(&text, resolution)?;
    log::info!(
        "replaying {} frames from '{}' at {} FPS",
        recording.len(),
        args.recording.display(),
        args.fps
    );

    let estimator =
        |frame: &RecordedFrame| -> anyhow::Result<Option<Landmarks>> { Ok(frame.landmarks.clone()) };
    let mut cl = ClassificationLoop::new(&config, estimator, LogActuator::new())?;
    if args.overlay {
        cl = cl.with_overlay(move |lms: &Landmarks| {
            log::debug!("{}", overlay::to_svg(lms, resolution));
        });
    }

    let slot = Arc::new(FrameSlot::new());
    let handle = cl.spawn(slot)?;

    let black = RgbFrame::black(resolution);
    for landmarks in recording {
        let frame = RecordedFrame {
            image: black.clone(),
            landmarks,
        };
        if !handle.submit(frame) {
            break;
        }
        thread::sleep(interval);
    }

    handle.shutdown()
}
