//! Scripted in-memory desktop for testing
//!
//! `MockDesktop` implements [`WindowManager`], [`InputInjector`] and
//! [`ScreenCapturer`] without touching a real display. Windows are declared
//! up front (or declared to appear once the viewer is launched), captures are
//! served from a queue of scripted frames, and every call is recorded as a
//! [`DesktopEvent`] so tests can assert on the exact input sequence.
//!
//! # Frames
//!
//! Each `capture_region` call pops the next scripted frame. When the queue
//! runs dry the last frame is served again, so a run that polls more often
//! than expected sees a stable screen instead of an error. Frames are
//! returned as scripted whatever region is requested.
//!
//! # Examples
//!
//! ```
//! use viewer_framer::{
//!     capture::{ImageBuffer, MockDesktop, WindowManager},
//!     model::{Rectangle, Rgb},
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let desktop = MockDesktop::new()
//!         .with_window("Viewer", Rectangle::new(0, 0, 800, 600))
//!         .with_frames([ImageBuffer::solid(800, 600, Rgb::WHITE)]);
//!
//!     let handle = desktop.find_window("Viewer").await.unwrap();
//!     assert!(handle.is_some());
//!     assert!(desktop.find_window("viewer").await.unwrap().is_none());
//! }
//! ```

use std::{
    collections::VecDeque,
    num::NonZeroU64,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ImageBuffer, InputInjector, ScreenCapturer, WindowManager};
use crate::{
    error::{FramerError, FramerResult},
    model::{KeyCode, Rectangle, WindowHandle},
};

/// One recorded call against the mock desktop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesktopEvent {
    Launched(PathBuf),
    KeyPress(KeyCode),
    CursorMoved { x: i32, y: i32 },
    Click,
    WindowMoved { handle: WindowHandle, rect: Rectangle },
    Captured(Rectangle),
}

#[derive(Debug, Clone)]
struct MockWindow {
    handle: WindowHandle,
    title:  String,
    rect:   Rectangle,
}

#[derive(Debug, Default)]
struct MockState {
    windows:     Vec<MockWindow>,
    on_launch:   Vec<MockWindow>,
    frames:      VecDeque<ImageBuffer>,
    last_frame:  Option<ImageBuffer>,
    events:      Vec<DesktopEvent>,
    next_handle: u64,
}

impl MockState {
    fn allocate(&mut self, title: &str, rect: Rectangle) -> MockWindow {
        self.next_handle += 1;
        let raw = NonZeroU64::MIN.saturating_add(0x1000 + self.next_handle);
        MockWindow {
            handle: WindowHandle::from_nonzero(raw),
            title: title.to_string(),
            rect,
        }
    }
}

/// Scripted desktop implementing every capability trait
///
/// # Thread Safety
///
/// State lives behind a `parking_lot::Mutex`, so the mock can be shared as
/// `Arc<MockDesktop>` across all three trait objects of a
/// [`Desktop`](super::Desktop).
#[derive(Debug, Default)]
pub struct MockDesktop {
    state:        Mutex<MockState>,
    launch_error: Option<String>,
}

impl MockDesktop {
    /// Creates an empty desktop with no windows and no frames
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a window that exists from the start
    pub fn with_window(self, title: &str, rect: Rectangle) -> Self {
        {
            let mut state = self.state.lock();
            let window = state.allocate(title, rect);
            state.windows.push(window);
        }
        self
    }

    /// Adds a window that only appears once `launch` is called
    pub fn with_window_on_launch(self, title: &str, rect: Rectangle) -> Self {
        {
            let mut state = self.state.lock();
            let window = state.allocate(title, rect);
            state.on_launch.push(window);
        }
        self
    }

    /// Appends frames to the capture queue
    pub fn with_frames(self, frames: impl IntoIterator<Item = ImageBuffer>) -> Self {
        self.state.lock().frames.extend(frames);
        self
    }

    /// Makes `launch` fail with the given reason
    pub fn with_launch_error(mut self, reason: &str) -> Self {
        self.launch_error = Some(reason.to_string());
        self
    }

    /// Every recorded call, in order
    pub fn events(&self) -> Vec<DesktopEvent> {
        self.state.lock().events.clone()
    }

    /// Number of left clicks
    pub fn clicks(&self) -> usize {
        self.count(|e| matches!(e, DesktopEvent::Click))
    }

    /// Number of captures served
    pub fn captures(&self) -> usize {
        self.count(|e| matches!(e, DesktopEvent::Captured(_)))
    }

    /// Keys pressed, in order
    pub fn key_presses(&self) -> Vec<KeyCode> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|e| match e {
                DesktopEvent::KeyPress(key) => Some(*key),
                _ => None,
            })
            .collect()
    }

    /// Rectangles passed to `set_window_rect`, in order
    pub fn window_moves(&self) -> Vec<Rectangle> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|e| match e {
                DesktopEvent::WindowMoved { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// Cursor positions, in order
    pub fn cursor_moves(&self) -> Vec<(i32, i32)> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|e| match e {
                DesktopEvent::CursorMoved { x, y } => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&DesktopEvent) -> bool) -> usize {
        self.state.lock().events.iter().filter(|e| pred(e)).count()
    }

    fn record(&self, event: DesktopEvent) {
        self.state.lock().events.push(event);
    }
}

#[async_trait]
impl WindowManager for MockDesktop {
    async fn find_window(&self, title: &str) -> FramerResult<Option<WindowHandle>> {
        Ok(self
            .state
            .lock()
            .windows
            .iter()
            .find(|w| w.title == title)
            .map(|w| w.handle))
    }

    async fn launch(&self, path: &Path) -> FramerResult<()> {
        self.record(DesktopEvent::Launched(path.to_path_buf()));

        if let Some(reason) = &self.launch_error {
            return Err(FramerError::LaunchFailed {
                path:   path.display().to_string(),
                reason: reason.clone(),
            });
        }

        let mut state = self.state.lock();
        let appearing = std::mem::take(&mut state.on_launch);
        state.windows.extend(appearing);
        Ok(())
    }

    async fn window_rect(&self, handle: WindowHandle) -> FramerResult<Rectangle> {
        self.state
            .lock()
            .windows
            .iter()
            .find(|w| w.handle == handle)
            .map(|w| w.rect)
            .ok_or_else(|| FramerError::window_op("geometry", format!("no window {handle}")))
    }

    async fn set_window_rect(&self, handle: WindowHandle, rect: Rectangle) -> FramerResult<()> {
        let mut state = self.state.lock();
        let window = state
            .windows
            .iter_mut()
            .find(|w| w.handle == handle)
            .ok_or_else(|| FramerError::window_op("move", format!("no window {handle}")))?;
        window.rect = rect;
        state.events.push(DesktopEvent::WindowMoved { handle, rect });
        Ok(())
    }
}

#[async_trait]
impl InputInjector for MockDesktop {
    async fn key_press(&self, key: KeyCode) -> FramerResult<()> {
        self.record(DesktopEvent::KeyPress(key));
        Ok(())
    }

    async fn set_cursor_position(&self, x: i32, y: i32) -> FramerResult<()> {
        self.record(DesktopEvent::CursorMoved { x, y });
        Ok(())
    }

    async fn click(&self) -> FramerResult<()> {
        self.record(DesktopEvent::Click);
        Ok(())
    }
}

#[async_trait]
impl ScreenCapturer for MockDesktop {
    async fn capture_region(&self, region: Rectangle) -> FramerResult<ImageBuffer> {
        let mut state = self.state.lock();
        state.events.push(DesktopEvent::Captured(region));

        if let Some(frame) = state.frames.pop_front() {
            state.last_frame = Some(frame.clone());
            return Ok(frame);
        }

        state
            .last_frame
            .clone()
            .ok_or_else(|| FramerError::CaptureFailed("no frames scripted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rgb;

    #[tokio::test]
    async fn test_find_window_exact_match() {
        let desktop = MockDesktop::new().with_window("VNC: remote", Rectangle::new(0, 0, 10, 10));

        assert!(desktop.find_window("VNC: remote").await.unwrap().is_some());
        assert!(desktop.find_window("VNC").await.unwrap().is_none());
        assert!(desktop.find_window("vnc: remote").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_window_appears_on_launch() {
        let desktop =
            MockDesktop::new().with_window_on_launch("Viewer", Rectangle::new(0, 0, 10, 10));

        assert!(desktop.find_window("Viewer").await.unwrap().is_none());
        desktop.launch(Path::new("/opt/viewer")).await.unwrap();
        assert!(desktop.find_window("Viewer").await.unwrap().is_some());
        assert_eq!(
            desktop.events()[0],
            DesktopEvent::Launched(PathBuf::from("/opt/viewer"))
        );
    }

    #[tokio::test]
    async fn test_launch_error() {
        let desktop = MockDesktop::new().with_launch_error("not executable");

        let err = desktop.launch(Path::new("/bin/false")).await.unwrap_err();
        assert!(matches!(err, FramerError::LaunchFailed { .. }));
    }

    #[tokio::test]
    async fn test_set_window_rect_updates_geometry() {
        let desktop = MockDesktop::new().with_window("Viewer", Rectangle::new(50, 50, 850, 650));
        let handle = desktop.find_window("Viewer").await.unwrap().unwrap();

        desktop
            .set_window_rect(handle, Rectangle::new(0, 0, 800, 600))
            .await
            .unwrap();

        assert_eq!(desktop.window_rect(handle).await.unwrap(), Rectangle::new(0, 0, 800, 600));
        assert_eq!(desktop.window_moves(), vec![Rectangle::new(0, 0, 800, 600)]);
    }

    #[tokio::test]
    async fn test_unknown_handle_is_an_error() {
        let desktop = MockDesktop::new();
        let handle = WindowHandle::new(99).unwrap();

        assert!(desktop.window_rect(handle).await.is_err());
    }

    #[tokio::test]
    async fn test_frames_repeat_last() {
        let desktop = MockDesktop::new().with_frames([
            ImageBuffer::solid(4, 4, Rgb::LOADING_GRAY),
            ImageBuffer::solid(4, 4, Rgb::WHITE),
        ]);
        let region = Rectangle::new(0, 0, 4, 4);

        let first = desktop.capture_region(region).await.unwrap();
        let second = desktop.capture_region(region).await.unwrap();
        let third = desktop.capture_region(region).await.unwrap();

        assert_eq!(first.pixel_rgb(0, 0), Some(Rgb::LOADING_GRAY));
        assert_eq!(second.pixel_rgb(0, 0), Some(Rgb::WHITE));
        assert_eq!(third.pixel_rgb(0, 0), Some(Rgb::WHITE));
        assert_eq!(desktop.captures(), 3);
    }

    #[tokio::test]
    async fn test_capture_without_frames_fails() {
        let desktop = MockDesktop::new();

        let err = desktop
            .capture_region(Rectangle::new(0, 0, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, FramerError::CaptureFailed(_)));
    }

    #[tokio::test]
    async fn test_input_is_recorded() {
        let desktop = MockDesktop::new();

        desktop.set_cursor_position(10, 20).await.unwrap();
        desktop.click().await.unwrap();
        desktop.key_press(KeyCode::Enter).await.unwrap();

        assert_eq!(desktop.cursor_moves(), vec![(10, 20)]);
        assert_eq!(desktop.clicks(), 1);
        assert_eq!(desktop.key_presses(), vec![KeyCode::Enter]);
    }
}
