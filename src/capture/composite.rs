//! Composite desktop holding one object per capability
//!
//! The session needs all three capabilities at once. Backends usually
//! provide them from different libraries (Win32 or X11 for windows, enigo
//! for input, xcap for pixels), so [`Desktop`] bundles independent trait
//! objects under one name.
//!
//! # Example
//!
//! ```rust,ignore
//! use viewer_framer::capture::create_default_desktop;
//!
//! let desktop = create_default_desktop()?;
//! let handle = desktop.windows.find_window("TightVNC Viewer").await?;
//! ```

use std::sync::Arc;

use super::{InputInjector, ScreenCapturer, WindowManager};
use crate::model::BackendType;

/// Desktop facade with one trait object per capability.
pub struct Desktop {
    /// Process launch and window geometry.
    pub windows: Arc<dyn WindowManager>,

    /// Key presses, cursor moves and clicks.
    pub input: Arc<dyn InputInjector>,

    /// Pixel capture of screen rectangles.
    pub screen: Arc<dyn ScreenCapturer>,

    /// Backend used for window management, for diagnostics.
    pub backend: BackendType,
}

impl Desktop {
    /// Creates a new Desktop from its capabilities.
    pub fn new(
        windows: Arc<dyn WindowManager>,
        input: Arc<dyn InputInjector>,
        screen: Arc<dyn ScreenCapturer>,
        backend: BackendType,
    ) -> Self {
        Self {
            windows,
            input,
            screen,
            backend,
        }
    }
}

impl std::fmt::Debug for Desktop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Desktop")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a Desktop where every capability is served by the mock.
pub fn desktop_from_mock(mock: Arc<super::MockDesktop>) -> Desktop {
    Desktop::new(
        mock.clone() as Arc<dyn WindowManager>,
        mock.clone() as Arc<dyn InputInjector>,
        mock as Arc<dyn ScreenCapturer>,
        BackendType::Mock,
    )
}

/// Creates a Desktop for Windows: Win32 windows, enigo input, xcap pixels.
#[cfg(target_os = "windows")]
pub fn desktop_from_windows(backend: Arc<super::WindowsBackend>) -> Desktop {
    Desktop::new(
        backend as Arc<dyn WindowManager>,
        Arc::new(super::EnigoInjector::new()),
        Arc::new(super::XcapCapturer::new()),
        BackendType::Windows,
    )
}

/// Creates a Desktop for X11: x11rb windows, enigo input, xcap pixels.
#[cfg(target_os = "linux")]
pub fn desktop_from_x11(backend: Arc<super::X11Backend>) -> Desktop {
    Desktop::new(
        backend as Arc<dyn WindowManager>,
        Arc::new(super::EnigoInjector::new()),
        Arc::new(super::XcapCapturer::new()),
        BackendType::X11,
    )
}
