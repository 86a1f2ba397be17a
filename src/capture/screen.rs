//! Screen capture through xcap
//!
//! xcap has no region capture, so the monitor under the region's top-left
//! corner is captured whole and cropped. A region that spills past that
//! monitor is clipped to it; the returned image is then smaller than the
//! region.

use std::time::Instant;

use async_trait::async_trait;
use image::{RgbaImage, imageops};
use xcap::Monitor;

use super::{ImageBuffer, ScreenCapturer};
use crate::{
    error::{FramerError, FramerResult},
    model::Rectangle,
};

/// Screen capturer backed by xcap
#[derive(Debug, Default)]
pub struct XcapCapturer {
    _private: (),
}

impl XcapCapturer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn capture_region_sync(region: Rectangle) -> FramerResult<RgbaImage> {
        let monitor = Monitor::from_point(region.left, region.top).map_err(|e| {
            tracing::error!("No monitor at ({}, {}): {}", region.left, region.top, e);
            FramerError::CaptureFailed(e.to_string())
        })?;
        let origin_x = monitor
            .x()
            .map_err(|e| FramerError::CaptureFailed(e.to_string()))?;
        let origin_y = monitor
            .y()
            .map_err(|e| FramerError::CaptureFailed(e.to_string()))?;

        let full = monitor.capture_image().map_err(|e| {
            tracing::error!("xcap monitor capture failed: {}", e);
            FramerError::CaptureFailed(e.to_string())
        })?;

        let (x, y, width, height) = crop_window(region, origin_x, origin_y);
        Ok(imageops::crop_imm(&full, x, y, width, height).to_image())
    }
}

/// Converts a screen region to a crop `(x, y, width, height)` on a monitor
/// image whose top-left pixel sits at `(origin_x, origin_y)`
///
/// The part of the region above or left of the monitor is cut off, so the
/// crop never extends past the region's right or bottom edge.
fn crop_window(region: Rectangle, origin_x: i32, origin_y: i32) -> (u32, u32, u32, u32) {
    let dx = region.left - origin_x;
    let dy = region.top - origin_y;
    let width = (region.width() + dx.min(0)).max(0) as u32;
    let height = (region.height() + dy.min(0)).max(0) as u32;
    (dx.max(0) as u32, dy.max(0) as u32, width, height)
}

#[async_trait]
impl ScreenCapturer for XcapCapturer {
    #[tracing::instrument(skip(self), fields(backend = "xcap"))]
    async fn capture_region(&self, region: Rectangle) -> FramerResult<ImageBuffer> {
        let start = Instant::now();

        let image = tokio::task::spawn_blocking(move || Self::capture_region_sync(region))
            .await
            .map_err(|e| {
                tracing::error!("Capture task panicked: {}", e);
                FramerError::CaptureFailed(e.to_string())
            })??;

        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            width = image.width(),
            height = image.height(),
            "capture_region completed"
        );
        Ok(ImageBuffer::from_rgba(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_window_primary_monitor() {
        let crop = crop_window(Rectangle::new(0, 0, 800, 600), 0, 0);
        assert_eq!(crop, (0, 0, 800, 600));
    }

    #[test]
    fn test_crop_window_offset_monitor() {
        let crop = crop_window(Rectangle::new(1964, 376, 2102, 586), 1920, 0);
        assert_eq!(crop, (44, 376, 138, 210));
    }

    #[test]
    fn test_crop_window_clamps_negative() {
        let crop = crop_window(Rectangle::new(-10, -5, 90, 95), 0, 0);
        assert_eq!(crop, (0, 0, 90, 95));
    }

    #[test]
    fn test_crop_window_fully_off_monitor_is_empty() {
        let crop = crop_window(Rectangle::new(1700, 100, 1800, 200), 1920, 0);
        assert_eq!(crop, (0, 100, 0, 100));
    }

    #[tokio::test]
    #[ignore = "Requires a live display session"]
    async fn test_capture_region_live() {
        let image = XcapCapturer::new()
            .capture_region(Rectangle::new(0, 0, 64, 48))
            .await
            .unwrap();
        assert_eq!(image.dimensions(), (64, 48));
    }
}
