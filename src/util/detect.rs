//! Display backend detection
//!
//! Decides at runtime which windowing system the viewer will appear on.

use std::env;

use crate::model::BackendType;

/// Detects the current display backend
///
/// ## Linux
/// - `$WAYLAND_DISPLAY` set and non-empty: `BackendType::Wayland`
/// - otherwise `$DISPLAY` set and non-empty: `BackendType::X11`
/// - otherwise `BackendType::None`
///
/// ## Windows
/// Always `BackendType::Windows`.
///
/// ## macOS
/// Always `BackendType::MacOS`.
///
/// # Examples
///
/// ```
/// use viewer_framer::util::detect::detect_backend;
///
/// println!("Display backend: {}", detect_backend());
/// ```
pub fn detect_backend() -> BackendType {
    detect_backend_with_env(|key| env::var(key).ok())
}

/// Backend detection with an injectable environment lookup
fn detect_backend_with_env<F>(_env_provider: F) -> BackendType
where
    F: Fn(&str) -> Option<String>,
{
    #[cfg(target_os = "linux")]
    {
        detect_linux_backend(&_env_provider)
    }

    #[cfg(target_os = "windows")]
    {
        BackendType::Windows
    }

    #[cfg(target_os = "macos")]
    {
        BackendType::MacOS
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        BackendType::None
    }
}

#[cfg(target_os = "linux")]
fn detect_linux_backend<F>(env_provider: &F) -> BackendType
where
    F: Fn(&str) -> Option<String>,
{
    let is_set = |key: &str| env_provider(key).is_some_and(|value| !value.is_empty());

    if is_set("WAYLAND_DISPLAY") {
        BackendType::Wayland
    } else if is_set("DISPLAY") {
        BackendType::X11
    } else {
        BackendType::None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn mock_env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_detect_x11() {
        let backend = detect_backend_with_env(mock_env(&[("DISPLAY", ":0")]));
        assert_eq!(backend, BackendType::X11);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_wayland_takes_precedence_over_x11() {
        let backend = detect_backend_with_env(mock_env(&[
            ("WAYLAND_DISPLAY", "wayland-0"),
            ("DISPLAY", ":0"),
        ]));
        assert_eq!(backend, BackendType::Wayland);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_empty_env_vars_treated_as_none() {
        let backend =
            detect_backend_with_env(mock_env(&[("WAYLAND_DISPLAY", ""), ("DISPLAY", "")]));
        assert_eq!(backend, BackendType::None);
    }

    #[test]
    #[cfg(target_os = "windows")]
    fn test_detect_windows() {
        assert_eq!(detect_backend_with_env(mock_env(&[])), BackendType::Windows);
    }
}
