//! Run configuration
//!
//! Every tunable of a framing run lives in [`FramerConfig`]. Values are
//! layered, later sources winning:
//!
//! 1. Built-in defaults ([`FramerConfig::default`])
//! 2. An optional JSON config file
//! 3. Environment variables
//! 4. Command-line flags (applied by the binary)
//!
//! The result is checked once by [`FramerConfig::validate`] before a run.
//!
//! # Environment Variables
//!
//! | Environment Variable | Field |
//! |---------------------|-------|
//! | `VIEWER_FRAMER_TITLE` | `window_title` |
//! | `VIEWER_FRAMER_VIEWER_PATH` | `viewer_path` |
//! | `VIEWER_FRAMER_PASSWORD` | `password` |
//! | `VIEWER_FRAMER_LAUNCH_SETTLE_MS` | `timing.launch_settle_ms` |
//! | `VIEWER_FRAMER_LOGIN_SETTLE_MS` | `timing.login_settle_ms` |
//! | `VIEWER_FRAMER_KEY_DELAY_MS` | `timing.key_delay_ms` |
//! | `VIEWER_FRAMER_CLICK_SETTLE_MS` | `timing.click_settle_ms` |
//! | `VIEWER_FRAMER_POLL_INTERVAL_MS` | `timing.poll_interval_ms` |
//!
//! Timing values that do not parse as milliseconds are ignored with a
//! warning.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{FramerError, FramerResult},
    model::{KeyCode, Point, Rectangle, Rgb},
};

pub const ENV_TITLE: &str = "VIEWER_FRAMER_TITLE";
pub const ENV_VIEWER_PATH: &str = "VIEWER_FRAMER_VIEWER_PATH";
pub const ENV_PASSWORD: &str = "VIEWER_FRAMER_PASSWORD";

/// Default absolute position of the framed viewer
pub const DEFAULT_FINAL_POSITION: Point = Point { x: 1864, y: 276 };

const REDACTED: &str = "********";

/// Complete configuration for one framing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FramerConfig {
    /// Exact title of the viewer window once connected
    pub window_title:   String,
    /// Viewer executable, started with no arguments
    pub viewer_path:    PathBuf,
    /// Typed at the viewer's password prompt; may be empty
    pub password:       String,
    /// Where the viewer is parked while the remote screen is analyzed
    pub origin:         Point,
    /// Where the framed viewer ends up
    pub final_position: Point,
    pub detection:      DetectionConfig,
    pub chrome:         ChromeMargins,
    pub loading:        LoadingConfig,
    pub timing:         TimingConfig,
    #[serde(default = "ScrollConfig::horizontal")]
    pub horizontal:     ScrollConfig,
    #[serde(default = "ScrollConfig::vertical")]
    pub vertical:       ScrollConfig,
    /// Directory for binarized debug captures; none written when unset
    pub debug_dir:      Option<PathBuf>,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            window_title:   String::new(),
            viewer_path:    PathBuf::new(),
            password:       String::new(),
            origin:         Point::new(0, 0),
            final_position: DEFAULT_FINAL_POSITION,
            detection:      DetectionConfig::default(),
            chrome:         ChromeMargins::default(),
            loading:        LoadingConfig::default(),
            timing:         TimingConfig::default(),
            horizontal:     ScrollConfig::horizontal(),
            vertical:       ScrollConfig::vertical(),
            debug_dir:      None,
        }
    }
}

/// Rectangle detection parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionConfig {
    pub min_width:  i32,
    pub min_height: i32,
    /// Luma at or below this is black
    pub threshold:  u8,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_width:  100,
            min_height: 100,
            threshold:  128,
        }
    }
}

/// Window decoration added around the detected rectangle when cropping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChromeMargins {
    pub width:  i32,
    pub height: i32,
}

impl Default for ChromeMargins {
    fn default() -> Self {
        Self {
            width:  8,
            height: 70,
        }
    }
}

/// Load-completion probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadingConfig {
    /// Color painted by the viewer until the remote framebuffer arrives
    pub color:       Rgb,
    /// Probe offset from the capture's bottom-right corner
    pub probe_inset: Point,
    pub max_polls:   u32,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            color:       Rgb::LOADING_GRAY,
            probe_inset: Point::new(30, 30),
            max_polls:   600,
        }
    }
}

/// Delays between steps, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub launch_settle_ms: u64,
    pub login_settle_ms:  u64,
    pub key_delay_ms:     u64,
    pub click_settle_ms:  u64,
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            launch_settle_ms: 1000,
            login_settle_ms:  1000,
            key_delay_ms:     100,
            click_settle_ms:  100,
            poll_interval_ms: 100,
        }
    }
}

impl TimingConfig {
    pub fn launch_settle(&self) -> Duration {
        Duration::from_millis(self.launch_settle_ms)
    }

    pub fn login_settle(&self) -> Duration {
        Duration::from_millis(self.login_settle_ms)
    }

    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// One coordinate measured from a window edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Pixels right of the left edge, or below the top edge
    FromStart(i32),
    /// Pixels left of the right edge, or above the bottom edge
    FromEnd(i32),
}

impl Anchor {
    fn resolve(self, start: i32, end: i32) -> i32 {
        match self {
            Anchor::FromStart(offset) => start + offset,
            Anchor::FromEnd(offset) => end - offset,
        }
    }
}

/// Screen point of a viewer control, relative to the viewer window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlPoint {
    pub x: Anchor,
    pub y: Anchor,
}

impl ControlPoint {
    pub const fn new(x: Anchor, y: Anchor) -> Self {
        Self { x, y }
    }

    /// Absolute screen position of the control for a window at `window`
    pub fn resolve(&self, window: Rectangle) -> Point {
        Point::new(
            self.x.resolve(window.left, window.right),
            self.y.resolve(window.top, window.bottom),
        )
    }
}

/// Parameters of one scroll-centering pass
///
/// A section given in the config file must list every field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrollConfig {
    /// Pixels scrolled per click, used to size the click budget
    pub step:           f64,
    /// Clicks added to the estimate before the margin
    pub bias:           u32,
    /// Extra clicks allowed past the estimate
    pub margin:         u32,
    /// Border positions at or below this are never tested
    pub floor:          i32,
    /// Clicks on the reverse control after the forward run
    pub reverse_clicks: u32,
    /// Control clicked to push the border out of view
    pub forward:        ControlPoint,
    /// Control clicked to bring it back
    pub reverse:        ControlPoint,
}

impl ScrollConfig {
    /// Defaults for the horizontal pass: the right scroll arrow, then one
    /// click on the left arrow
    pub fn horizontal() -> Self {
        Self {
            step:           3.0,
            bias:           0,
            margin:         20,
            floor:          0,
            reverse_clicks: 1,
            forward:        ControlPoint::new(Anchor::FromEnd(30), Anchor::FromEnd(12)),
            reverse:        ControlPoint::new(Anchor::FromStart(12), Anchor::FromEnd(12)),
        }
    }

    /// Defaults for the vertical pass: the down scroll arrow, then two clicks
    /// on the up arrow
    pub fn vertical() -> Self {
        Self {
            step:           3.3,
            bias:           1,
            margin:         20,
            floor:          26,
            reverse_clicks: 2,
            forward:        ControlPoint::new(Anchor::FromEnd(12), Anchor::FromEnd(30)),
            reverse:        ControlPoint::new(Anchor::FromEnd(12), Anchor::FromStart(55)),
        }
    }
}

impl FramerConfig {
    /// Builds the configuration from defaults, an optional file and the
    /// process environment
    pub fn load(path: Option<&Path>) -> FramerResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Reads a JSON config file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> FramerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded config file {}", path.display());
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> FramerResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Overlays values from an environment lookup
    pub fn apply_env_with<F>(&mut self, env_provider: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(title) = env_provider(ENV_TITLE) {
            self.window_title = title;
        }
        if let Some(path) = env_provider(ENV_VIEWER_PATH) {
            self.viewer_path = PathBuf::from(path);
        }
        if let Some(password) = env_provider(ENV_PASSWORD) {
            self.password = password;
        }

        let timing = &mut self.timing;
        for (var, slot) in [
            ("VIEWER_FRAMER_LAUNCH_SETTLE_MS", &mut timing.launch_settle_ms),
            ("VIEWER_FRAMER_LOGIN_SETTLE_MS", &mut timing.login_settle_ms),
            ("VIEWER_FRAMER_KEY_DELAY_MS", &mut timing.key_delay_ms),
            ("VIEWER_FRAMER_CLICK_SETTLE_MS", &mut timing.click_settle_ms),
            ("VIEWER_FRAMER_POLL_INTERVAL_MS", &mut timing.poll_interval_ms),
        ] {
            if let Some(raw) = env_provider(var) {
                match raw.trim().parse() {
                    Ok(ms) => *slot = ms,
                    Err(_) => tracing::warn!("Ignoring {}={:?}: not a millisecond count", var, raw),
                }
            }
        }
    }

    /// Checks the configuration before a run
    ///
    /// # Errors
    ///
    /// - [`FramerError::MissingConfig`] for an empty title or viewer path
    /// - [`FramerError::InvalidConfig`] for a password with characters that
    ///   have no plain key, non-positive minimum sizes, a non-positive scroll
    ///   step, or a zero poll cap
    pub fn validate(&self) -> FramerResult<()> {
        if self.window_title.is_empty() {
            return Err(FramerError::MissingConfig {
                field: "window_title".to_string(),
            });
        }
        if self.viewer_path.as_os_str().is_empty() {
            return Err(FramerError::MissingConfig {
                field: "viewer_path".to_string(),
            });
        }

        if let Some(c) = self.password.chars().find(|&c| KeyCode::for_char(c).is_none()) {
            return Err(invalid(
                "password",
                format!("character {c:?} cannot be typed as a plain key"),
            ));
        }

        if self.detection.min_width < 1 || self.detection.min_height < 1 {
            return Err(invalid(
                "detection",
                format!(
                    "minimum size {}x{} must be at least 1x1",
                    self.detection.min_width, self.detection.min_height
                ),
            ));
        }

        for (name, scroll) in [("horizontal", &self.horizontal), ("vertical", &self.vertical)] {
            if !(scroll.step.is_finite() && scroll.step > 0.0) {
                return Err(invalid(name, format!("step {} must be positive", scroll.step)));
            }
        }

        if self.loading.max_polls == 0 {
            return Err(invalid("loading.max_polls", "must be at least 1"));
        }

        Ok(())
    }

    /// Copy safe to print, with the password masked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.password.is_empty() {
            copy.password = REDACTED.to_string();
        }
        copy
    }
}

fn invalid(parameter: &str, reason: impl Into<String>) -> FramerError {
    FramerError::InvalidConfig {
        parameter: parameter.to_string(),
        reason:    reason.into(),
    }
}
