//! Keyboard and mouse synthesis through enigo
//!
//! Each call opens a fresh enigo connection inside `spawn_blocking`, performs
//! one action and drops it. Calls are seconds apart, so there is nothing to
//! gain from keeping a connection alive, and the injector stays trivially
//! `Send + Sync`.

use async_trait::async_trait;
use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use super::InputInjector;
use crate::{
    error::{FramerError, FramerResult},
    model::KeyCode,
};

/// Input injector backed by enigo
#[derive(Debug, Default)]
pub struct EnigoInjector {
    _private: (),
}

impl EnigoInjector {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Runs one enigo action on the blocking pool
    async fn run<F>(operation: &'static str, action: F) -> FramerResult<()>
    where
        F: FnOnce(&mut Enigo) -> Result<(), enigo::InputError> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let mut enigo = Enigo::new(&Settings::default()).map_err(|e| {
                tracing::error!("Failed to open input connection: {}", e);
                FramerError::InputFailed(format!("connect: {e}"))
            })?;
            action(&mut enigo).map_err(|e| FramerError::InputFailed(format!("{operation}: {e}")))
        })
        .await
        .map_err(|e| FramerError::InputFailed(format!("{operation} task panicked: {e}")))?
    }
}

/// Maps a key code to the enigo key that produces it
///
/// Letters go out lowercase so no shift is held, matching a bare key press.
fn enigo_key(key: KeyCode) -> Key {
    match key {
        KeyCode::Enter => Key::Return,
        KeyCode::Char(c) => Key::Unicode(c.to_ascii_lowercase()),
    }
}

#[async_trait]
impl InputInjector for EnigoInjector {
    async fn key_press(&self, key: KeyCode) -> FramerResult<()> {
        let k = enigo_key(key);
        Self::run("key", move |enigo| enigo.key(k, Direction::Click)).await
    }

    async fn set_cursor_position(&self, x: i32, y: i32) -> FramerResult<()> {
        tracing::trace!(x, y, "moving cursor");
        Self::run("move", move |enigo| enigo.move_mouse(x, y, Coordinate::Abs)).await
    }

    async fn click(&self) -> FramerResult<()> {
        Self::run("click", |enigo| enigo.button(Button::Left, Direction::Click)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_maps_to_return() {
        assert_eq!(enigo_key(KeyCode::Enter), Key::Return);
    }

    #[test]
    fn test_letters_sent_without_shift() {
        assert_eq!(enigo_key(KeyCode::Char('Q')), Key::Unicode('q'));
        assert_eq!(enigo_key(KeyCode::Char('5')), Key::Unicode('5'));
    }

    #[tokio::test]
    #[ignore = "Requires a live display session"]
    async fn test_cursor_move_live() {
        EnigoInjector::new().set_cursor_position(10, 10).await.unwrap();
    }
}
