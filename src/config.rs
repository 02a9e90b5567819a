//! Run-time configuration.
//!
//! All angles are bend angles in radians, see [`geometry::compute_bend_angle`].
//!
//! # Environment Variables
//!
//! [`Config::from_env`] applies the following overrides on top of the defaults:
//!
//! * `PROSTHAND_SOURCE_WIDTH`, `PROSTHAND_SOURCE_HEIGHT`: size of the camera frames in pixels.
//! * `PROSTHAND_EXTENSION_THRESHOLD`: angle below which a finger counts as extended.
//! * `PROSTHAND_FLEXION_THRESHOLD`: angle above which a finger counts as flexed. Setting this
//!   enables the two-threshold policy with a [`FingerState::Mid`] dead zone.
//! * `PROSTHAND_THUMB_EXTENSION_THRESHOLD`, `PROSTHAND_THUMB_FLEXION_THRESHOLD`: thumb-specific
//!   overrides of the two thresholds above.
//! * `PROSTHAND_SMOOTHING_WINDOW_SIZE`: number of frames to smooth landmarks over. 0 or 1 disables
//!   smoothing.
//!
//! [`geometry::compute_bend_angle`]: crate::geometry::compute_bend_angle
//! [`FingerState::Mid`]: crate::classify::FingerState::Mid

use std::{env, str::FromStr};

use anyhow::{bail, ensure, Context};

use crate::{classify::Thresholds, resolution::Resolution};

/// Configuration of the classification loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    source_resolution: Resolution,
    extension_threshold: f32,
    flexion_threshold: Option<f32>,
    thumb_extension_threshold: Option<f32>,
    thumb_flexion_threshold: Option<f32>,
    smoothing_window_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_resolution: Resolution::QCIF,
            extension_threshold: Self::DEFAULT_THRESHOLD,
            flexion_threshold: None,
            thumb_extension_threshold: None,
            thumb_flexion_threshold: None,
            smoothing_window_size: 0,
        }
    }
}

impl Config {
    /// Default single threshold between extension and flexion.
    pub const DEFAULT_THRESHOLD: f32 = 0.1;

    /// Prefix of all environment variables read by [`Config::from_env`].
    pub const ENV_PREFIX: &'static str = "PROSTHAND_";

    /// Creates the default configuration, overridden by `PROSTHAND_*` environment variables.
    ///
    /// The result is not validated yet; [`Config::thresholds`] does that.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::default().with_overrides(|name| env::var(name).ok())
    }

    /// Applies overrides from `lookup`, which maps variable names (like
    /// `PROSTHAND_SOURCE_WIDTH`) to their value.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let get = |name: &str| -> Option<(String, String)> {
            let var = format!("{}{name}", Self::ENV_PREFIX);
            lookup(&var).map(|value| (var, value))
        };

        if let Some(v) = get("SOURCE_WIDTH") {
            let width = parse(v)?;
            self.source_resolution = Resolution::new(width, self.source_resolution.height());
        }
        if let Some(v) = get("SOURCE_HEIGHT") {
            let height = parse(v)?;
            self.source_resolution = Resolution::new(self.source_resolution.width(), height);
        }
        if let Some(v) = get("EXTENSION_THRESHOLD") {
            self.extension_threshold = parse(v)?;
        }
        if let Some(v) = get("FLEXION_THRESHOLD") {
            self.flexion_threshold = Some(parse(v)?);
        }
        if let Some(v) = get("THUMB_EXTENSION_THRESHOLD") {
            self.thumb_extension_threshold = Some(parse(v)?);
        }
        if let Some(v) = get("THUMB_FLEXION_THRESHOLD") {
            self.thumb_flexion_threshold = Some(parse(v)?);
        }
        if let Some(v) = get("SMOOTHING_WINDOW_SIZE") {
            self.smoothing_window_size = parse(v)?;
        }
        Ok(self)
    }

    /// Sets the size of the camera frames.
    pub fn source_resolution(mut self, resolution: Resolution) -> Self {
        self.source_resolution = resolution;
        self
    }

    /// Sets the angle at or below which a finger is considered extended.
    ///
    /// Without a flexion threshold, this is the single threshold between extension and flexion.
    pub fn extension_threshold(mut self, threshold: f32) -> Self {
        self.extension_threshold = threshold;
        self
    }

    /// Sets the angle above which a finger is considered flexed, enabling the two-threshold policy.
    ///
    /// Fingers with an angle between the extension and flexion thresholds are classified as
    /// [`FingerState::Mid`][crate::classify::FingerState::Mid].
    pub fn flexion_threshold(mut self, threshold: impl Into<Option<f32>>) -> Self {
        self.flexion_threshold = threshold.into();
        self
    }

    /// Overrides the extension threshold for the thumb.
    pub fn thumb_extension_threshold(mut self, threshold: impl Into<Option<f32>>) -> Self {
        self.thumb_extension_threshold = threshold.into();
        self
    }

    /// Overrides the flexion threshold for the thumb. Requires a flexion threshold to be set.
    pub fn thumb_flexion_threshold(mut self, threshold: impl Into<Option<f32>>) -> Self {
        self.thumb_flexion_threshold = threshold.into();
        self
    }

    /// Sets the number of frames to smooth landmarks over before classifying them.
    ///
    /// 0 and 1 disable smoothing: every frame is classified on its own.
    pub fn smoothing_window_size(mut self, frames: usize) -> Self {
        self.smoothing_window_size = frames;
        self
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.source_resolution
    }

    /// Returns the smoothing window, or [`None`] if smoothing is disabled.
    pub fn smoothing_window(&self) -> Option<usize> {
        match self.smoothing_window_size {
            0 | 1 => None,
            n => Some(n),
        }
    }

    /// Checks the configuration for consistency.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.source_resolution.is_empty(),
            "source resolution {} is empty",
            self.source_resolution,
        );

        let thresholds = [
            ("extension", Some(self.extension_threshold)),
            ("flexion", self.flexion_threshold),
            ("thumb extension", self.thumb_extension_threshold),
            ("thumb flexion", self.thumb_flexion_threshold),
        ];
        for (name, value) in thresholds {
            if let Some(value) = value {
                ensure!(
                    value.is_finite() && value >= 0.0,
                    "{name} threshold must be a non-negative angle, got {value}"
                );
            }
        }

        match self.flexion_threshold {
            None => {
                if self.thumb_flexion_threshold.is_some() {
                    bail!("thumb flexion threshold requires a flexion threshold");
                }
            }
            Some(flexion) => {
                ensure!(
                    self.extension_threshold <= flexion,
                    "extension threshold {} is above flexion threshold {flexion}",
                    self.extension_threshold,
                );
                let (thumb_min, thumb_max) = self.thumb_bounds(flexion);
                ensure!(
                    thumb_min <= thumb_max,
                    "thumb extension threshold {thumb_min} is above thumb flexion threshold {thumb_max}",
                );
            }
        }
        Ok(())
    }

    fn thumb_bounds(&self, flexion: f32) -> (f32, f32) {
        (
            self.thumb_extension_threshold
                .unwrap_or(self.extension_threshold),
            self.thumb_flexion_threshold.unwrap_or(flexion),
        )
    }

    /// Validates the configuration and builds the classification [`Thresholds`].
    pub fn thresholds(&self) -> anyhow::Result<Thresholds> {
        self.validate()?;
        let thumb_extension = self
            .thumb_extension_threshold
            .unwrap_or(self.extension_threshold);
        Ok(match self.flexion_threshold {
            None => Thresholds::single(self.extension_threshold, thumb_extension),
            Some(flexion) => {
                let (thumb_min, thumb_max) = self.thumb_bounds(flexion);
                Thresholds::hysteresis(self.extension_threshold, flexion, thumb_min, thumb_max)
            }
        })
    }
}

fn parse<T>((var, value): (String, String)) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {var}: '{value}'"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::classify::Policy;
    use crate::landmark::Finger;

    use super::*;

    fn overrides(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::default().with_overrides(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.resolution(), Resolution::new(176, 144));
        assert_eq!(config.smoothing_window(), None);
        let t = config.thresholds().unwrap();
        assert_eq!(t, Thresholds::single(0.1, 0.1));
    }

    #[test]
    fn env_overrides() {
        let config = overrides(&[
            ("PROSTHAND_SOURCE_WIDTH", "640"),
            ("PROSTHAND_SOURCE_HEIGHT", " 480 "),
            ("PROSTHAND_EXTENSION_THRESHOLD", "0.05"),
            ("PROSTHAND_FLEXION_THRESHOLD", "0.1"),
            ("PROSTHAND_THUMB_FLEXION_THRESHOLD", "0.3"),
            ("PROSTHAND_SMOOTHING_WINDOW_SIZE", "4"),
            ("UNRELATED", "x"),
        ])
        .unwrap();
        assert_eq!(config.resolution(), Resolution::new(640, 480));
        assert_eq!(config.smoothing_window(), Some(4));

        let t = config.thresholds().unwrap();
        assert_eq!(
            t.policy(Finger::Index),
            Policy::Hysteresis {
                min: 0.05,
                max: 0.1
            }
        );
        assert_eq!(
            t.policy(Finger::Thumb),
            Policy::Hysteresis {
                min: 0.05,
                max: 0.3
            }
        );
    }

    #[test]
    fn invalid_env_value() {
        let err = overrides(&[("PROSTHAND_SMOOTHING_WINDOW_SIZE", "many")]).unwrap_err();
        assert!(err.to_string().contains("PROSTHAND_SMOOTHING_WINDOW_SIZE"));
    }

    #[test]
    fn thumb_threshold_single_policy() {
        let t = Config::default()
            .extension_threshold(0.2)
            .thumb_extension_threshold(0.4)
            .thresholds()
            .unwrap();
        assert_eq!(t, Thresholds::single(0.2, 0.4));
    }

    #[test]
    fn smoothing_disabled_for_small_windows() {
        assert_eq!(Config::default().smoothing_window_size(1).smoothing_window(), None);
        assert_eq!(Config::default().smoothing_window_size(2).smoothing_window(), Some(2));
    }

    #[test]
    fn validation() {
        assert!(Config::default()
            .source_resolution(Resolution::new(0, 10))
            .validate()
            .is_err());
        assert!(Config::default().extension_threshold(-0.1).validate().is_err());
        assert!(Config::default()
            .extension_threshold(f32::NAN)
            .validate()
            .is_err());
        assert!(Config::default()
            .extension_threshold(0.2)
            .flexion_threshold(0.1)
            .validate()
            .is_err());
        assert!(Config::default()
            .thumb_flexion_threshold(0.3)
            .validate()
            .is_err());
        assert!(Config::default()
            .flexion_threshold(0.2)
            .thumb_extension_threshold(0.5)
            .validate()
            .is_err());
        assert!(Config::default()
            .flexion_threshold(0.2)
            .thumb_extension_threshold(0.15)
            .validate()
            .is_ok());
    }
}
