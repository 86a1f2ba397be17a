//! Data models and type definitions for viewer-framer
//!
//! This module defines the value types passed between the platform
//! capabilities and the framing algorithms:
//! - Backend identification
//! - Screen rectangles and points
//! - Window handles, key codes and pixel colors

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

/// Represents the windowing backend in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// No backend detected
    None,
    /// Wayland display server (Linux)
    Wayland,
    /// X11 display server (Linux)
    X11,
    /// Win32 windowing
    Windows,
    /// macOS
    #[serde(rename = "macos")]
    MacOS,
    /// Scripted in-memory desktop
    Mock,
}

impl BackendType {
    /// Returns the backend type as a lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::None => "none",
            BackendType::Wayland => "wayland",
            BackendType::X11 => "x11",
            BackendType::Windows => "windows",
            BackendType::MacOS => "macos",
            BackendType::Mock => "mock",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Axis-aligned rectangle given by its four bounds
///
/// Width and height are derived from the bounds on every call, so they can
/// never disagree with them after [`Rectangle::set_bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub left:   i32,
    pub top:    i32,
    pub right:  i32,
    pub bottom: i32,
}

impl Rectangle {
    /// Creates a rectangle from `(left, top, right, bottom)`
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates a rectangle from an origin and a size
    pub fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Returns `(left, top, right, bottom)`
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        (self.left, self.top, self.right, self.bottom)
    }

    /// Reassigns all four bounds
    pub fn set_bounds(&mut self, left: i32, top: i32, right: i32, bottom: i32) {
        *self = Self::new(left, top, right, bottom);
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Same size, moved so the top-left corner sits at `(x, y)`
    pub fn moved_to(&self, x: i32, y: i32) -> Self {
        Self::from_origin_size(x, y, self.width(), self.height())
    }
}

impl From<(i32, i32, i32, i32)> for Rectangle {
    fn from((left, top, right, bottom): (i32, i32, i32, i32)) -> Self {
        Self::new(left, top, right, bottom)
    }
}

impl std::fmt::Display for Rectangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {}, {})",
            self.left,
            self.top,
            self.right,
            self.bottom,
            self.width(),
            self.height()
        )
    }
}

/// Absolute screen position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Gray shown by the viewer while the remote framebuffer is loading
    pub const LOADING_GRAY: Rgb = Rgb(204, 204, 204);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
}

/// Opaque reference to an on-screen window
///
/// Zero is never a valid handle; lookups return `Option<WindowHandle>`
/// instead of a zero sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(NonZeroU64);

impl WindowHandle {
    /// Wraps a raw platform handle, rejecting zero
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn from_nonzero(raw: NonZeroU64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

/// Physical key to press
///
/// `Char` holds an uppercase ASCII letter or a digit and names the key that
/// produces that character, not the character itself: no shift is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCode {
    Enter,
    Char(char),
}

impl KeyCode {
    /// Maps a character to its key, ignoring case
    ///
    /// Returns `None` for anything but ASCII letters and digits.
    pub fn for_char(c: char) -> Option<Self> {
        c.is_ascii_alphanumeric()
            .then(|| KeyCode::Char(c.to_ascii_uppercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_bounds_round_trip() {
        let rect = Rectangle::from((20, 20, 150, 160));

        assert_eq!(rect.bounds(), (20, 20, 150, 160));
        assert_eq!(rect.width(), 130);
        assert_eq!(rect.height(), 140);
    }

    #[test]
    fn test_rectangle_set_bounds_recomputes_size() {
        let mut rect = Rectangle::new(100, 50, 900, 650);
        assert_eq!((rect.width(), rect.height()), (800, 600));

        rect.set_bounds(0, 0, 138, 210);
        assert_eq!(rect.bounds(), (0, 0, 138, 210));
        assert_eq!((rect.width(), rect.height()), (138, 210));
    }

    #[test]
    fn test_rectangle_moved_to_keeps_size() {
        let rect = Rectangle::new(300, 200, 1100, 800).moved_to(0, 0);

        assert_eq!(rect.bounds(), (0, 0, 800, 600));
    }

    #[test]
    fn test_rectangle_display() {
        let rect = Rectangle::new(1, 2, 11, 22);
        assert_eq!(rect.to_string(), "(1, 2, 11, 22, 10, 20)");
    }

    #[test]
    fn test_rectangle_serialization() {
        let json = serde_json::to_value(Rectangle::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json["left"], 1);
        assert_eq!(json["bottom"], 4);
    }

    #[test]
    fn test_window_handle_rejects_zero() {
        assert!(WindowHandle::new(0).is_none());

        let handle = WindowHandle::new(0x2a).unwrap();
        assert_eq!(handle.raw(), 42);
        assert_eq!(handle.to_string(), "0x2a");
    }

    #[test]
    fn test_key_code_for_char() {
        assert_eq!(KeyCode::for_char('a'), Some(KeyCode::Char('A')));
        assert_eq!(KeyCode::for_char('Z'), Some(KeyCode::Char('Z')));
        assert_eq!(KeyCode::for_char('7'), Some(KeyCode::Char('7')));
        assert_eq!(KeyCode::for_char('!'), None);
        assert_eq!(KeyCode::for_char('é'), None);
    }

    #[test]
    fn test_backend_type_display() {
        assert_eq!(BackendType::X11.to_string(), "x11");
        assert_eq!(BackendType::MacOS.to_string(), "macos");
        assert_eq!(serde_json::to_string(&BackendType::Mock).unwrap(), r#""mock""#);
    }
}
