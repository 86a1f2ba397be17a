//! X11 window management over x11rb
//!
//! Finds the viewer through the EWMH `_NET_CLIENT_LIST` on the root window and
//! reads titles from `_NET_WM_NAME` (UTF-8) with a `WM_NAME` (Latin-1)
//! fallback. Geometry is reported for the outer frame: the client window's
//! root position minus `_NET_FRAME_EXTENTS`, so the rectangle matches what a
//! screen capture of the window shows.
//!
//! All protocol traffic is blocking and runs on tokio's blocking pool. A
//! single connection is opened lazily and dropped after any protocol error so
//! the next call reconnects.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;
use x11rb::{
    connection::Connection as _,
    protocol::xproto::{AtomEnum, ConfigureWindowAux, ConnectionExt as _, StackMode, Window},
    rust_connection::RustConnection,
};

use super::WindowManager;
use crate::{
    error::{FramerError, FramerResult},
    model::{BackendType, Rectangle, WindowHandle},
};

/// Upper bound on property payloads, in 32-bit units (32KB)
const MAX_PROPERTY_LENGTH: u32 = 8192;

/// Atoms used for window lookup and frame geometry
#[derive(Debug, Clone, Copy)]
struct X11Atoms {
    net_client_list:   u32,
    net_wm_name:       u32,
    net_frame_extents: u32,
    utf8_string:       u32,
}

/// Open connection with the screen it was opened for
struct Session {
    conn:       RustConnection,
    screen_idx: usize,
    atoms:      X11Atoms,
}

/// Frame decoration widths around a client window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FrameExtents {
    left:   i32,
    right:  i32,
    top:    i32,
    bottom: i32,
}

impl FrameExtents {
    /// Outer frame rectangle for a client area at `(x, y)` of `width` x `height`
    fn outer(&self, x: i32, y: i32, width: i32, height: i32) -> Rectangle {
        Rectangle::new(
            x - self.left,
            y - self.top,
            x + width + self.right,
            y + height + self.bottom,
        )
    }

    /// Client area size for an outer frame rectangle
    fn client_size(&self, outer: Rectangle) -> (u32, u32) {
        let width = outer.width() - self.left - self.right;
        let height = outer.height() - self.top - self.bottom;
        (width.max(1) as u32, height.max(1) as u32)
    }
}

/// X11 window manager
///
/// Cheap to share behind an `Arc`; the connection is guarded by a mutex and
/// each operation holds it for its whole round trip.
pub struct X11Backend {
    session: Arc<Mutex<Option<Session>>>,
}

impl std::fmt::Debug for X11Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X11Backend")
            .field("connected", &self.session.lock().is_some())
            .finish()
    }
}

impl X11Backend {
    /// Creates a backend for the display named by `$DISPLAY`
    ///
    /// No connection is made until the first operation.
    ///
    /// # Errors
    ///
    /// [`FramerError::BackendNotAvailable`] when `$DISPLAY` is unset.
    pub fn new() -> FramerResult<Self> {
        if std::env::var_os("DISPLAY").is_none() {
            return Err(FramerError::BackendNotAvailable {
                backend: BackendType::X11,
            });
        }

        Ok(Self {
            session: Arc::new(Mutex::new(None)),
        })
    }

    fn connect() -> FramerResult<Session> {
        tracing::debug!("Creating new X11 connection");
        let (conn, screen_idx) = x11rb::connect(None).map_err(|e| {
            tracing::error!("Failed to connect to X11: {}", e);
            FramerError::BackendNotAvailable {
                backend: BackendType::X11,
            }
        })?;
        let atoms = Self::intern_atoms(&conn)?;
        tracing::debug!("X11 connection established (screen {})", screen_idx);
        Ok(Session {
            conn,
            screen_idx,
            atoms,
        })
    }

    fn intern_atoms(conn: &RustConnection) -> FramerResult<X11Atoms> {
        let intern = |name: &[u8]| -> FramerResult<u32> {
            let atom = conn
                .intern_atom(false, name)
                .map_err(|e| FramerError::window_op("intern", e))?
                .reply()
                .map_err(|e| FramerError::window_op("intern", e))?
                .atom;
            Ok(atom)
        };

        Ok(X11Atoms {
            net_client_list:   intern(b"_NET_CLIENT_LIST")?,
            net_wm_name:       intern(b"_NET_WM_NAME")?,
            net_frame_extents: intern(b"_NET_FRAME_EXTENTS")?,
            utf8_string:       intern(b"UTF8_STRING")?,
        })
    }

    /// Runs `op` against the shared connection on the blocking pool
    async fn with_session<T, F>(&self, operation: &'static str, op: F) -> FramerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Session) -> FramerResult<T> + Send + 'static,
    {
        let shared = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || {
            let mut guard = shared.lock();
            if guard.is_none() {
                *guard = Some(Self::connect()?);
            }
            let session = guard
                .as_ref()
                .ok_or_else(|| FramerError::window_op(operation, "no connection"))?;

            let result = op(session);
            if result.is_err() {
                tracing::warn!("X11 {} failed, dropping connection", operation);
                *guard = None;
            }
            result
        })
        .await
        .map_err(|e| FramerError::window_op(operation, format!("task panicked: {e}")))?
    }

    fn client_list(session: &Session) -> FramerResult<Vec<Window>> {
        let root = session.conn.setup().roots[session.screen_idx].root;
        let reply = session
            .conn
            .get_property(
                false,
                root,
                session.atoms.net_client_list,
                AtomEnum::WINDOW,
                0,
                MAX_PROPERTY_LENGTH,
            )
            .map_err(|e| FramerError::window_op("lookup", e))?
            .reply()
            .map_err(|e| FramerError::window_op("lookup", e))?;

        let windows: Vec<Window> = reply
            .value32()
            .map(|values| values.collect())
            .unwrap_or_default();
        tracing::debug!("Found {} windows in _NET_CLIENT_LIST", windows.len());
        Ok(windows)
    }

    /// Reads a window title, preferring `_NET_WM_NAME` over `WM_NAME`
    fn window_title(session: &Session, window: Window) -> FramerResult<String> {
        let utf8 = session
            .conn
            .get_property(
                false,
                window,
                session.atoms.net_wm_name,
                session.atoms.utf8_string,
                0,
                MAX_PROPERTY_LENGTH,
            )
            .map_err(|e| FramerError::window_op("lookup", e))?
            .reply()
            .map_err(|e| FramerError::window_op("lookup", e))?;
        if !utf8.value.is_empty() {
            return Ok(String::from_utf8_lossy(&utf8.value).into_owned());
        }

        let latin1 = session
            .conn
            .get_property(
                false,
                window,
                AtomEnum::WM_NAME,
                AtomEnum::STRING,
                0,
                MAX_PROPERTY_LENGTH,
            )
            .map_err(|e| FramerError::window_op("lookup", e))?
            .reply()
            .map_err(|e| FramerError::window_op("lookup", e))?;
        Ok(latin1.value.iter().map(|&b| b as char).collect())
    }

    fn frame_extents(session: &Session, window: Window) -> FramerResult<FrameExtents> {
        let reply = session
            .conn
            .get_property(
                false,
                window,
                session.atoms.net_frame_extents,
                AtomEnum::CARDINAL,
                0,
                4,
            )
            .map_err(|e| FramerError::window_op("geometry", e))?
            .reply()
            .map_err(|e| FramerError::window_op("geometry", e))?;

        let values: Vec<u32> = reply
            .value32()
            .map(|values| values.collect())
            .unwrap_or_default();
        Ok(match values.as_slice() {
            [left, right, top, bottom] => FrameExtents {
                left:   *left as i32,
                right:  *right as i32,
                top:    *top as i32,
                bottom: *bottom as i32,
            },
            _ => FrameExtents::default(),
        })
    }

    fn outer_rect(session: &Session, window: Window) -> FramerResult<Rectangle> {
        let root = session.conn.setup().roots[session.screen_idx].root;
        let geometry = session
            .conn
            .get_geometry(window)
            .map_err(|e| FramerError::window_op("geometry", e))?
            .reply()
            .map_err(|e| FramerError::window_op("geometry", e))?;
        let origin = session
            .conn
            .translate_coordinates(window, root, 0, 0)
            .map_err(|e| FramerError::window_op("geometry", e))?
            .reply()
            .map_err(|e| FramerError::window_op("geometry", e))?;

        let extents = Self::frame_extents(session, window)?;
        Ok(extents.outer(
            i32::from(origin.dst_x),
            i32::from(origin.dst_y),
            i32::from(geometry.width),
            i32::from(geometry.height),
        ))
    }
}

fn x11_window(handle: WindowHandle) -> FramerResult<Window> {
    Window::try_from(handle.raw())
        .map_err(|_| FramerError::window_op("lookup", format!("{handle} is not an X11 window id")))
}

#[async_trait]
impl WindowManager for X11Backend {
    #[tracing::instrument(skip(self), fields(backend = "x11"))]
    async fn find_window(&self, title: &str) -> FramerResult<Option<WindowHandle>> {
        let wanted = title.to_string();
        self.with_session("lookup", move |session| {
            for window in Self::client_list(session)? {
                // Windows can vanish between listing and querying
                let Ok(name) = Self::window_title(session, window) else {
                    continue;
                };
                if name == wanted {
                    tracing::debug!("Matched window {:#x}", window);
                    return Ok(WindowHandle::new(u64::from(window)));
                }
            }
            Ok(None)
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(backend = "x11"))]
    async fn launch(&self, path: &Path) -> FramerResult<()> {
        super::spawn_detached(path)
    }

    async fn window_rect(&self, handle: WindowHandle) -> FramerResult<Rectangle> {
        let window = x11_window(handle)?;
        self.with_session("geometry", move |session| Self::outer_rect(session, window))
            .await
    }

    #[tracing::instrument(skip(self), fields(backend = "x11"))]
    async fn set_window_rect(&self, handle: WindowHandle, rect: Rectangle) -> FramerResult<()> {
        let window = x11_window(handle)?;
        self.with_session("move", move |session| {
            let extents = Self::frame_extents(session, window)?;
            let (width, height) = extents.client_size(rect);
            let aux = ConfigureWindowAux::new()
                .x(rect.left)
                .y(rect.top)
                .width(width)
                .height(height)
                .stack_mode(StackMode::ABOVE);

            session
                .conn
                .configure_window(window, &aux)
                .map_err(|e| FramerError::window_op("move", e))?;
            session
                .conn
                .flush()
                .map_err(|e| FramerError::window_op("move", e))?;
            Ok(())
        })
        .await
    }
}
