//! Win32 window management
//!
//! Titles are matched by `FindWindowW`, which compares the whole title
//! exactly. Geometry comes from `GetWindowRect` and is applied with
//! `SetWindowPos`, both in screen coordinates including the window frame.
//!
//! Handles cross task boundaries as integers; an `HWND` is only rebuilt
//! inside the blocking call that uses it.

use std::{ffi::OsStr, os::windows::ffi::OsStrExt, path::Path};

use async_trait::async_trait;
use windows_sys::Win32::{
    Foundation::{HWND, RECT},
    UI::WindowsAndMessaging::{FindWindowW, GetWindowRect, SetWindowPos},
};

use super::WindowManager;
use crate::{
    error::{FramerError, FramerResult},
    model::{Rectangle, WindowHandle},
};

/// Win32 window manager
///
/// Stateless; every call goes straight to user32.
#[derive(Debug, Default)]
pub struct WindowsBackend {
    _private: (),
}

/// Null-terminated UTF-16 copy of `text`
fn to_wide(text: &str) -> Vec<u16> {
    OsStr::new(text).encode_wide().chain(Some(0)).collect()
}

fn hwnd(handle: WindowHandle) -> HWND {
    handle.raw() as usize as HWND
}

impl WindowsBackend {
    pub fn new() -> FramerResult<Self> {
        Ok(Self { _private: () })
    }

    fn find_window_sync(title: &str) -> Option<WindowHandle> {
        let wide = to_wide(title);
        // SAFETY: `wide` is null-terminated and outlives the call; a null
        // class name matches any class.
        let found = unsafe { FindWindowW(std::ptr::null(), wide.as_ptr()) };
        WindowHandle::new(found as usize as u64)
    }

    fn window_rect_sync(handle: WindowHandle) -> FramerResult<Rectangle> {
        let mut rect = RECT {
            left:   0,
            top:    0,
            right:  0,
            bottom: 0,
        };
        // SAFETY: `rect` is a valid out pointer for the duration of the call.
        let ok = unsafe { GetWindowRect(hwnd(handle), &mut rect) };
        if ok == 0 {
            return Err(FramerError::window_op(
                "geometry",
                std::io::Error::last_os_error(),
            ));
        }
        Ok(Rectangle::new(rect.left, rect.top, rect.right, rect.bottom))
    }

    fn set_window_rect_sync(handle: WindowHandle, rect: Rectangle) -> FramerResult<()> {
        // SAFETY: plain value arguments; a null insert-after handle is HWND_TOP.
        let ok = unsafe {
            SetWindowPos(
                hwnd(handle),
                std::ptr::null_mut(),
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                0,
            )
        };
        if ok == 0 {
            return Err(FramerError::window_op(
                "move",
                std::io::Error::last_os_error(),
            ));
        }
        Ok(())
    }
}

async fn blocking<T, F>(operation: &'static str, f: F) -> FramerResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> FramerResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FramerError::window_op(operation, format!("task panicked: {e}")))?
}

#[async_trait]
impl WindowManager for WindowsBackend {
    #[tracing::instrument(skip(self), fields(backend = "windows"))]
    async fn find_window(&self, title: &str) -> FramerResult<Option<WindowHandle>> {
        let title = title.to_string();
        let found = blocking("lookup", move || Ok(Self::find_window_sync(&title))).await?;
        tracing::debug!(found = found.is_some(), "FindWindowW");
        Ok(found)
    }

    #[tracing::instrument(skip(self), fields(backend = "windows"))]
    async fn launch(&self, path: &Path) -> FramerResult<()> {
        super::spawn_detached(path)
    }

    async fn window_rect(&self, handle: WindowHandle) -> FramerResult<Rectangle> {
        blocking("geometry", move || Self::window_rect_sync(handle)).await
    }

    #[tracing::instrument(skip(self), fields(backend = "windows"))]
    async fn set_window_rect(&self, handle: WindowHandle, rect: Rectangle) -> FramerResult<()> {
        blocking("move", move || Self::set_window_rect_sync(handle, rect)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wide_is_null_terminated() {
        assert_eq!(to_wide("VNC"), vec![b'V' as u16, b'N' as u16, b'C' as u16, 0]);
        assert_eq!(to_wide(""), vec![0]);
    }

    #[test]
    fn test_windows_backend_new() {
        assert!(WindowsBackend::new().is_ok());
    }

    #[tokio::test]
    async fn test_find_window_missing_title() {
        let backend = WindowsBackend::new().unwrap();
        let found = backend
            .find_window("no window is ever called this")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_window_rect_invalid_handle() {
        let backend = WindowsBackend::new().unwrap();
        let handle = WindowHandle::new(0xdead_beef).unwrap();
        assert!(matches!(
            backend.window_rect(handle).await,
            Err(FramerError::WindowOperation { .. })
        ));
    }
}
