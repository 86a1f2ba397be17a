//! viewer-framer: frames a region of a remote-desktop viewer
//!
//! This library launches a remote-desktop viewer, logs in, finds a
//! black-bordered rectangle on the remote screen, and crops, scrolls and
//! places the viewer window so only that rectangle shows.
//!
//! Desktop access goes through the capability traits in [`capture`]; the
//! detection and centering logic in [`detect`] and [`centering`] works on
//! plain images and runs unchanged against [`capture::MockDesktop`].

pub mod capture;
pub mod centering;
pub mod config;
pub mod detect;
pub mod error;
pub mod model;
pub mod session;
pub mod util;
