//! Desktop capabilities and their implementations
//!
//! This module provides everything the framing algorithms need from the
//! desktop they run on:
//!
//! - `ImageBuffer`: a captured RGB frame, convertible to grayscale
//! - `BinaryImage`: a thresholded black/white raster for border detection
//! - `WindowManager`, `InputInjector`, `ScreenCapturer`: capability traits
//! - `Desktop`: one object per capability, built for the current platform
//! - `MockDesktop`: a scripted desktop for headless tests

use std::path::Path;

use crate::{
    error::{FramerError, FramerResult},
    model::BackendType,
    util::detect::detect_backend,
};

pub mod binary_image;
pub mod composite;
pub mod image_buffer;
pub mod input;
pub mod mock;
pub mod screen;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod x11_backend;

#[cfg(target_os = "windows")]
pub mod windows_backend;

pub use binary_image::BinaryImage;
#[cfg(target_os = "windows")]
pub use composite::desktop_from_windows;
#[cfg(target_os = "linux")]
pub use composite::desktop_from_x11;
pub use composite::{Desktop, desktop_from_mock};
pub use image_buffer::ImageBuffer;
pub use input::EnigoInjector;
pub use mock::{DesktopEvent, MockDesktop};
pub use screen::XcapCapturer;
pub use traits::{InputInjector, ScreenCapturer, WindowManager, type_text};
#[cfg(target_os = "windows")]
pub use windows_backend::WindowsBackend;
#[cfg(target_os = "linux")]
pub use x11_backend::X11Backend;

/// Builds the desktop for the display this process runs on
///
/// # Errors
///
/// [`FramerError::BackendNotAvailable`] on Wayland, macOS, or when no display
/// is detected. Wayland clients cannot position other clients' windows.
pub fn create_default_desktop() -> FramerResult<Desktop> {
    let backend = detect_backend();
    tracing::debug!(%backend, "Detected display backend");

    match backend {
        #[cfg(target_os = "linux")]
        BackendType::X11 => Ok(desktop_from_x11(std::sync::Arc::new(X11Backend::new()?))),
        #[cfg(target_os = "windows")]
        BackendType::Windows => Ok(desktop_from_windows(std::sync::Arc::new(
            WindowsBackend::new()?,
        ))),
        other => Err(FramerError::BackendNotAvailable { backend: other }),
    }
}

/// Starts `path` with no arguments and does not wait for it
///
/// The child keeps running after this process exits.
pub(crate) fn spawn_detached(path: &Path) -> FramerResult<()> {
    let child = tokio::process::Command::new(path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| {
            tracing::error!("Failed to launch {}: {}", path.display(), e);
            FramerError::LaunchFailed {
                path:   path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

    tracing::info!(pid = child.id(), "Launched {}", path.display());
    Ok(())
}
