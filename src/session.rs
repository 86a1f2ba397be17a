//! One framing run from launch to final placement
//!
//! [`Session::run`] performs the whole sequence against a [`Desktop`]:
//!
//! 1. Stop early if a window with the configured title already exists
//! 2. Launch the viewer and wait for it to settle
//! 3. Log in: Enter, the password, Enter
//! 4. Find the viewer window and park it at the configured origin
//! 5. Poll until the viewer stops painting its loading color
//! 6. Binarize the last poll frame and find the target rectangle
//! 7. Crop the window to the rectangle plus chrome margins
//! 8. Center horizontally, then vertically
//! 9. Move the window to its final position
//!
//! Every failure aborts the run with a [`FramerError`].

use std::path::Path;

use serde::Serialize;

use crate::{
    capture::{BinaryImage, Desktop, ImageBuffer, type_text},
    centering::{Axis, PassReport, ScrollPass},
    config::FramerConfig,
    detect::find_first_rectangle,
    error::{FramerError, FramerResult},
    model::{KeyCode, Rectangle, WindowHandle},
    util::poll::{PollOutcome, PollPolicy, is_still_loading, poll_until},
};

/// Geometry of a successfully framed viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FramedWindow {
    pub handle:     WindowHandle,
    /// Rectangle found in the loaded capture, in window coordinates
    pub target:     Rectangle,
    /// Final window rectangle on screen
    pub window:     Rectangle,
    pub horizontal: PassReport,
    pub vertical:   PassReport,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// A viewer window was already open; nothing was touched
    AlreadyRunning { handle: WindowHandle },
    /// The viewer was launched and framed
    Framed(FramedWindow),
}

/// A framing run bound to a desktop and a validated configuration
#[derive(Debug)]
pub struct Session<'a> {
    desktop: &'a Desktop,
    config:  &'a FramerConfig,
}

impl<'a> Session<'a> {
    pub fn new(desktop: &'a Desktop, config: &'a FramerConfig) -> Self {
        Self { desktop, config }
    }

    #[tracing::instrument(skip(self), fields(title = %self.config.window_title, backend = %self.desktop.backend))]
    pub async fn run(&self) -> FramerResult<RunOutcome> {
        let config = self.config;
        let windows = &self.desktop.windows;

        if let Some(handle) = windows.find_window(&config.window_title).await? {
            tracing::info!(%handle, "Viewer already open");
            return Ok(RunOutcome::AlreadyRunning { handle });
        }

        windows.launch(&config.viewer_path).await?;
        tokio::time::sleep(config.timing.launch_settle()).await;

        self.log_in().await?;

        let handle = windows
            .find_window(&config.window_title)
            .await?
            .ok_or_else(|| FramerError::WindowNotFound {
                title: config.window_title.clone(),
            })?;

        let initial = windows.window_rect(handle).await?;
        tracing::info!(%handle, rect = %initial, "Found viewer window");

        let parked = initial.moved_to(config.origin.x, config.origin.y);
        windows.set_window_rect(handle, parked).await?;

        let loaded = self.wait_for_load(parked).await?;
        let binary = loaded.binarize(config.detection.threshold);
        let target = self.locate_target(&binary)?;

        let cropped = Rectangle::from_origin_size(
            parked.left,
            parked.top,
            target.width() + config.chrome.width,
            target.height() + config.chrome.height,
        );
        windows.set_window_rect(handle, cropped).await?;
        tracing::info!(rect = %cropped, "Cropped viewer to target");

        let horizontal = self.center(Axis::Horizontal, target, cropped).await?;
        let vertical = self.center(Axis::Vertical, target, cropped).await?;

        let placed = cropped.moved_to(config.final_position.x, config.final_position.y);
        windows.set_window_rect(handle, placed).await?;
        tracing::info!(rect = %placed, "Viewer framed");

        Ok(RunOutcome::Framed(FramedWindow {
            handle,
            target,
            window: placed,
            horizontal,
            vertical,
        }))
    }

    async fn log_in(&self) -> FramerResult<()> {
        let input = self.desktop.input.as_ref();
        let timing = &self.config.timing;

        input.key_press(KeyCode::Enter).await?;
        tokio::time::sleep(timing.login_settle()).await;

        type_text(input, &self.config.password, timing.key_delay()).await?;
        input.key_press(KeyCode::Enter).await?;
        tokio::time::sleep(timing.login_settle()).await;

        tracing::debug!("Login keys sent");
        Ok(())
    }

    /// Captures `window` until the loading color is gone and returns that
    /// capture
    async fn wait_for_load(&self, window: Rectangle) -> FramerResult<ImageBuffer> {
        let loading = &self.config.loading;
        let policy = PollPolicy::new(self.config.timing.poll_interval(), loading.max_polls);
        let screen = &self.desktop.screen;

        let outcome = poll_until(
            policy,
            move || screen.capture_region(window),
            |frame| !is_still_loading(frame, loading.probe_inset, loading.color),
        )
        .await?;

        match outcome {
            PollOutcome::Ready { value, attempts } => {
                tracing::info!(polls = attempts, "Remote screen loaded");
                Ok(value)
            }
            PollOutcome::Exhausted { attempts, .. } => {
                tracing::error!(polls = attempts, "Remote screen never finished loading");
                Err(FramerError::LoadTimeout { polls: attempts })
            }
        }
    }

    fn locate_target(&self, binary: &BinaryImage) -> FramerResult<Rectangle> {
        let detection = &self.config.detection;
        let found = find_first_rectangle(binary, detection.min_width, detection.min_height);

        if let Some(dir) = &self.config.debug_dir {
            dump_detection(dir, binary, found);
        }

        let target = found.ok_or(FramerError::RectangleNotFound {
            min_width:    detection.min_width,
            min_height:   detection.min_height,
            image_width:  binary.width().max(0) as u32,
            image_height: binary.height().max(0) as u32,
        })?;
        tracing::info!(rect = %target, "Target rectangle");
        Ok(target)
    }

    async fn center(
        &self,
        axis: Axis,
        target: Rectangle,
        window: Rectangle,
    ) -> FramerResult<PassReport> {
        let scroll = match axis {
            Axis::Horizontal => &self.config.horizontal,
            Axis::Vertical => &self.config.vertical,
        };

        ScrollPass::plan(axis, scroll, &self.config.detection, target, window)
            .run(
                self.desktop,
                window,
                self.config.detection.threshold,
                self.config.timing.click_settle(),
            )
            .await
    }
}

/// Writes the binarized load frame, outlining the detected rectangle in a
/// second copy. Failures are logged and otherwise ignored.
fn dump_detection(dir: &Path, binary: &BinaryImage, found: Option<Rectangle>) {
    let mut written = vec![(dir.join("load-frame.png"), binary.clone())];
    if let Some(rect) = found {
        let mut outlined = BinaryImage::new_white(binary.width() as u32, binary.height() as u32);
        outlined.draw_outline(rect);
        written.push((dir.join("detected.png"), outlined));
    }

    for (path, image) in written {
        match image.save_png(&path) {
            Ok(()) => tracing::debug!("Wrote {}", path.display()),
            Err(e) => tracing::warn!("Could not write {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::Arc};

    use super::*;
    use crate::{
        capture::{MockDesktop, desktop_from_mock},
        model::Rgb,
    };

    const TITLE: &str = "lab - Viewer";

    fn config() -> FramerConfig {
        FramerConfig {
            window_title: TITLE.to_string(),
            viewer_path: PathBuf::from("/opt/viewer"),
            password: "ab1".to_string(),
            ..FramerConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_running_touches_nothing() {
        let mock = Arc::new(MockDesktop::new().with_window(TITLE, Rectangle::new(5, 5, 805, 605)));
        let desktop = desktop_from_mock(mock.clone());
        let config = config();

        let outcome = Session::new(&desktop, &config).run().await.unwrap();

        assert!(matches!(outcome, RunOutcome::AlreadyRunning { .. }));
        assert!(mock.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_timeout() {
        let mock = Arc::new(
            MockDesktop::new()
                .with_window_on_launch(TITLE, Rectangle::new(0, 0, 400, 300))
                .with_frames([ImageBuffer::solid(400, 300, Rgb::LOADING_GRAY)]),
        );
        let desktop = desktop_from_mock(mock.clone());
        let mut config = config();
        config.loading.max_polls = 7;

        let err = Session::new(&desktop, &config).run().await.unwrap_err();

        assert!(matches!(err, FramerError::LoadTimeout { polls: 7 }));
        assert_eq!(mock.captures(), 7);
    }

    #[test]
    fn test_dump_detection_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut binary = BinaryImage::new_white(200, 200);
        let rect = Rectangle::new(20, 20, 150, 160);
        binary.draw_outline(rect);

        dump_detection(dir.path(), &binary, Some(rect));

        assert!(dir.path().join("load-frame.png").exists());
        assert!(dir.path().join("detected.png").exists());
    }

    #[test]
    fn test_dump_detection_missing_dir_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        dump_detection(&missing, &BinaryImage::new_white(10, 10), None);
        assert!(!missing.exists());
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = RunOutcome::AlreadyRunning {
            handle: WindowHandle::new(0x2a).unwrap(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "already_running");
        assert_eq!(json["handle"], 42);
    }
}
