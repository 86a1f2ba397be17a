//! Error types for viewer framing runs
//!
//! Every failure aborts the run. Each variant carries enough context for a
//! diagnostic line, and [`FramerError::remediation_hint`] suggests what to
//! check before trying again.

use crate::model::BackendType;

/// Result type alias for framing operations
pub type FramerResult<T> = Result<T, FramerError>;

/// Error type for everything that can stop a framing run
#[derive(Debug, thiserror::Error)]
pub enum FramerError {
    /// A required setting was left empty
    #[error("Required setting '{field}' is not set")]
    MissingConfig {
        /// Name of the missing setting
        field: String,
    },

    /// A setting has a value the run cannot use
    #[error("Invalid setting '{parameter}': {reason}")]
    InvalidConfig {
        /// Name of the invalid setting
        parameter: String,
        /// Reason why it's invalid
        reason:    String,
    },

    /// The config file could not be parsed
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// No window with the exact title exists
    #[error("Viewer window '{title}' not found")]
    WindowNotFound {
        /// Exact title that was searched for
        title: String,
    },

    /// The viewer executable could not be started
    #[error("Failed to launch '{path}': {reason}")]
    LaunchFailed {
        /// Executable path
        path:   String,
        /// Reason for the failure
        reason: String,
    },

    /// The viewer kept showing its loading color past the poll cap
    #[error("Viewer still loading after {polls} polls")]
    LoadTimeout {
        /// Number of polls performed
        polls: u32,
    },

    /// No bordered rectangle met the minimum size
    #[error(
        "No rectangle of at least {min_width}x{min_height} found in {image_width}x{image_height} \
         capture"
    )]
    RectangleNotFound {
        /// Minimum accepted width
        min_width:    i32,
        /// Minimum accepted height
        min_height:   i32,
        /// Width of the scanned capture
        image_width:  u32,
        /// Height of the scanned capture
        image_height: u32,
    },

    /// Synthesizing a key press or mouse event failed
    #[error("Input synthesis failed: {0}")]
    InputFailed(String),

    /// Grabbing pixels from the screen failed
    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    /// A window query or move failed
    #[error("Window {operation} failed: {reason}")]
    WindowOperation {
        /// The operation that failed (e.g., "lookup", "geometry", "move")
        operation: String,
        /// Reason for the failure
        reason:    String,
    },

    /// No usable platform backend on this system
    #[error("Backend {backend} is not available on this platform")]
    BackendNotAvailable {
        /// Backend type that's unavailable
        backend: BackendType,
    },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding or decoding error
    #[error("Image processing error: {0}")]
    Image(String),
}

impl FramerError {
    /// Shorthand for [`FramerError::WindowOperation`]
    pub fn window_op(operation: &str, reason: impl ToString) -> Self {
        FramerError::WindowOperation {
            operation: operation.to_string(),
            reason:    reason.to_string(),
        }
    }

    /// Returns a short suggestion for resolving the error
    pub fn remediation_hint(&self) -> &str {
        match self {
            FramerError::MissingConfig { field } => match field.as_str() {
                "window_title" => {
                    "Set the viewer window title with --title, VIEWER_FRAMER_TITLE, or \
                     \"window_title\" in the config file."
                }
                "viewer_path" => {
                    "Set the viewer executable with --viewer, VIEWER_FRAMER_VIEWER_PATH, or \
                     \"viewer_path\" in the config file."
                }
                _ => "Provide the missing setting on the command line or in the config file.",
            },
            FramerError::InvalidConfig { parameter, .. } => match parameter.as_str() {
                "password" => {
                    "Passwords are typed key by key without modifiers. Only ASCII letters and \
                     digits are supported, and letter case is not preserved."
                }
                _ => "Check the value against the documented defaults with --print-config.",
            },
            FramerError::ConfigParse(_) => {
                "The config file must be a JSON object using the field names shown by \
                 --print-config. Unknown fields are rejected."
            }
            FramerError::WindowNotFound { .. } => {
                "The title must match exactly, including case. Check that the viewer accepted \
                 the password and that the viewer is set to 8-bit color."
            }
            FramerError::LaunchFailed { .. } => {
                "Check that the viewer path exists and is executable by the current user."
            }
            FramerError::LoadTimeout { .. } => {
                "The remote screen never finished drawing. Check the connection, or raise \
                 --load-max-polls for slow links."
            }
            FramerError::RectangleNotFound { .. } => {
                "The target region needs an unbroken one-pixel black border on a light \
                 background. Make sure nothing overlaps it, or lower the minimum size."
            }
            FramerError::InputFailed(_) => {
                "Input synthesis was refused. On Linux an X11 session is required; on macOS grant \
                 accessibility permission."
            }
            FramerError::CaptureFailed(_) => {
                "Screen capture was refused. Grant screen recording permission and keep the \
                 viewer on the primary monitor."
            }
            FramerError::WindowOperation { operation, .. } => match operation.as_str() {
                "move" => "The window manager rejected the move. Check the window is not maximized.",
                _ => "The window system did not answer. Check the display connection.",
            },
            FramerError::BackendNotAvailable { backend } => match backend {
                BackendType::Wayland => {
                    "Wayland does not allow moving other clients' windows. Run the viewer under \
                     an X11 session (DISPLAY set, WAYLAND_DISPLAY unset)."
                }
                BackendType::X11 => {
                    "X11 backend not available. Ensure you're running in an X11 session with \
                     DISPLAY environment variable set."
                }
                BackendType::Windows => "Windows backend only available on Windows OS.",
                BackendType::MacOS => "Window positioning is not supported on macOS.",
                BackendType::Mock => "The mock desktop is for tests only.",
                BackendType::None => "No windowing backend available on this platform.",
            },
            FramerError::Io(_) => {
                "An I/O error occurred. Check file permissions, disk space, and system resources."
            }
            FramerError::Image(_) => "Image processing failed. Check the output path is writable.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_message_and_hint() {
        let error = FramerError::MissingConfig {
            field: "window_title".to_string(),
        };

        assert!(error.to_string().contains("window_title"));
        assert!(error.remediation_hint().contains("--title"));
    }

    #[test]
    fn test_missing_viewer_path_hint() {
        let error = FramerError::MissingConfig {
            field: "viewer_path".to_string(),
        };

        assert!(error.remediation_hint().contains("VIEWER_FRAMER_VIEWER_PATH"));
    }

    #[test]
    fn test_invalid_password_hint() {
        let error = FramerError::InvalidConfig {
            parameter: "password".to_string(),
            reason:    "contains '!'".to_string(),
        };

        let msg = error.to_string();
        assert!(msg.contains("password"));
        assert!(msg.contains("'!'"));
        assert!(error.remediation_hint().contains("letters and digits"));
    }

    #[test]
    fn test_rectangle_not_found_message() {
        let error = FramerError::RectangleNotFound {
            min_width:    100,
            min_height:   100,
            image_width:  640,
            image_height: 480,
        };

        let msg = error.to_string();
        assert!(msg.contains("100x100"));
        assert!(msg.contains("640x480"));
        assert!(error.remediation_hint().contains("border"));
    }

    #[test]
    fn test_window_not_found_message() {
        let error = FramerError::WindowNotFound {
            title: "TightVNC Viewer".to_string(),
        };

        assert!(error.to_string().contains("'TightVNC Viewer'"));
        assert!(error.remediation_hint().contains("exactly"));
    }

    #[test]
    fn test_load_timeout_message() {
        let error = FramerError::LoadTimeout { polls: 600 };

        assert!(error.to_string().contains("600 polls"));
        assert!(error.remediation_hint().contains("--load-max-polls"));
    }

    #[test]
    fn test_window_op_helper() {
        let error = FramerError::window_op("move", "BadWindow");

        assert_eq!(error.to_string(), "Window move failed: BadWindow");
        assert!(error.remediation_hint().contains("maximized"));
    }

    #[test]
    fn test_backend_not_available_wayland() {
        let error = FramerError::BackendNotAvailable {
            backend: BackendType::Wayland,
        };

        assert!(error.to_string().contains("wayland"));
        assert!(error.remediation_hint().contains("X11"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: FramerError = io_error.into();

        assert!(error.to_string().contains("I/O error"));
        assert!(error.remediation_hint().contains("permissions"));
    }

    #[test]
    fn test_config_parse_conversion() {
        let parse_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: FramerError = parse_error.into();

        assert!(error.to_string().contains("config file"));
    }
}
