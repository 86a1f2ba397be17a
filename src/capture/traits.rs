//! Capability traits for the desktop the viewer runs on
//!
//! The framing algorithms only ever talk to the desktop through these three
//! traits, so they run unchanged against a live display or the scripted
//! [`MockDesktop`](super::MockDesktop).
//!
//! - [`WindowManager`]: launch the viewer, find its window, move and resize it
//! - [`InputInjector`]: synthesize key presses, cursor moves and clicks
//! - [`ScreenCapturer`]: grab the pixels of a screen rectangle

use std::{path::Path, time::Duration};

use async_trait::async_trait;

use super::ImageBuffer;
use crate::{
    error::{FramerError, FramerResult},
    model::{KeyCode, Rectangle, WindowHandle},
};

/// Capability: process launch and top-level window geometry.
///
/// # Platform Support
///
/// - **Windows**: `FindWindowW`, `GetWindowRect`, `SetWindowPos`
/// - **X11**: EWMH `_NET_CLIENT_LIST` lookup, `ConfigureWindow`
/// - **Wayland**: Not supported (clients cannot place other clients' windows)
#[async_trait]
pub trait WindowManager: Send + Sync {
    /// Finds a top-level window whose title equals `title` exactly.
    ///
    /// Returns `Ok(None)` when no window matches; errors are reserved for a
    /// window system that cannot be queried.
    async fn find_window(&self, title: &str) -> FramerResult<Option<WindowHandle>>;

    /// Starts the executable at `path` with no arguments and returns
    /// without waiting for it.
    async fn launch(&self, path: &Path) -> FramerResult<()>;

    /// Returns the window's outer rectangle in screen coordinates.
    async fn window_rect(&self, handle: WindowHandle) -> FramerResult<Rectangle>;

    /// Moves the window so its outer rectangle becomes `rect` and raises it.
    async fn set_window_rect(&self, handle: WindowHandle, rect: Rectangle) -> FramerResult<()>;
}

/// Capability: synthesized keyboard and mouse input.
#[async_trait]
pub trait InputInjector: Send + Sync {
    /// Presses and releases one key.
    async fn key_press(&self, key: KeyCode) -> FramerResult<()>;

    /// Moves the cursor to an absolute screen position.
    async fn set_cursor_position(&self, x: i32, y: i32) -> FramerResult<()>;

    /// Presses and releases the left button at the current cursor position.
    async fn click(&self) -> FramerResult<()>;
}

/// Capability: screen capture.
#[async_trait]
pub trait ScreenCapturer: Send + Sync {
    /// Captures the pixels inside `region` (screen coordinates).
    ///
    /// The returned image's `(0, 0)` is the region's top-left corner.
    async fn capture_region(&self, region: Rectangle) -> FramerResult<ImageBuffer>;
}

/// Types `text` one key at a time, pausing `delay` after each key.
///
/// Letters are uppercased first and sent as their physical key without
/// shift, so letter case never reaches the remote side.
pub async fn type_text(
    input: &dyn InputInjector,
    text: &str,
    delay: Duration,
) -> FramerResult<()> {
    for c in text.to_uppercase().chars() {
        let key = KeyCode::for_char(c).ok_or_else(|| FramerError::InvalidConfig {
            parameter: "password".to_string(),
            reason:    format!("no key for character {c:?}"),
        })?;
        input.key_press(key).await?;
        tokio::time::sleep(delay).await;
    }
    Ok(())
}
