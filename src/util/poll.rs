//! Bounded polling
//!
//! The viewer gives no completion events, so readiness is observed by
//! repeatedly sampling the screen. [`poll_until`] keeps the sampling and the
//! stop condition apart: the probe fetches a value, the predicate judges it,
//! and the [`PollPolicy`] caps how long that goes on.

use std::{future::Future, time::Duration};

use crate::{
    capture::ImageBuffer,
    error::FramerResult,
    model::{Point, Rgb},
};

/// How often to poll and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause before every probe, including the first
    pub interval:     Duration,
    /// Maximum number of probes; zero is treated as one
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// Result of a bounded poll
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// The predicate accepted `value` on probe number `attempts`
    Ready { value: T, attempts: u32 },
    /// Every probe was rejected; `last` is the final probe's value
    Exhausted { last: T, attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. } | PollOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready { .. })
    }
}

/// Sleeps, probes, and repeats until `done` accepts a value or the attempt cap
/// is reached
///
/// Probe errors abort the poll immediately.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use viewer_framer::util::poll::{PollOutcome, PollPolicy, poll_until};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let policy = PollPolicy::new(Duration::from_millis(1), 10);
///     let mut n = 0;
///     let outcome = poll_until(
///         policy,
///         || {
///             n += 1;
///             let v = n;
///             async move { Ok(v) }
///         },
///         |v| *v == 3,
///     )
///     .await
///     .unwrap();
///     assert_eq!(outcome, PollOutcome::Ready { value: 3, attempts: 3 });
/// }
/// ```
pub async fn poll_until<T, F, Fut, P>(
    policy: PollPolicy,
    mut probe: F,
    mut done: P,
) -> FramerResult<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FramerResult<T>>,
    P: FnMut(&T) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        tokio::time::sleep(policy.interval).await;
        let value = probe().await?;
        attempts += 1;

        if done(&value) {
            return Ok(PollOutcome::Ready { value, attempts });
        }
        if attempts >= max_attempts {
            return Ok(PollOutcome::Exhausted {
                last: value,
                attempts,
            });
        }
    }
}

/// True while the viewer still paints its placeholder color
///
/// The probe sits `inset` pixels in from the capture's bottom-right corner.
/// A capture too small to contain the probe is not considered loading.
pub fn is_still_loading(image: &ImageBuffer, inset: Point, loading_color: Rgb) -> bool {
    let x = image.width() as i32 - inset.x;
    let y = image.height() as i32 - inset.y;
    image.pixel_rgb(x, y) == Some(loading_color)
}
