//! Scroll centering
//!
//! After the viewer is cropped to the detected rectangle, the remote screen
//! is still scrolled to its origin, so the rectangle's left and top borders
//! sit somewhere inside the viewport. Each axis is centered by clicking the
//! viewer's scroll arrow until the border leaves the view, then nudging back
//! with the opposite arrow so the border is visible again.
//!
//! [`BorderTracker`] is the per-frame test: it follows the border as it
//! slides toward the viewport edge. [`ScrollPass`] owns one axis' click
//! budget, controls and tracker, and drives the click/capture loop.

use std::{ops::Range, time::Duration};

use serde::Serialize;

use crate::{
    capture::{BinaryImage, Desktop},
    config::{DetectionConfig, ScrollConfig},
    error::FramerResult,
    model::{Point, Rectangle},
};

/// Scroll direction of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Follows the left border as the view scrolls right
    Horizontal,
    /// Follows the top border as the view scrolls down
    Vertical,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Horizontal => write!(f, "horizontal"),
            Axis::Vertical => write!(f, "vertical"),
        }
    }
}

/// Follows one border line across successive frames
///
/// The border is a column (horizontal pass) or row (vertical pass) whose
/// cross-section `band` is entirely black. Scrolling only ever moves it
/// toward lower positions, so each rescan resumes at the cursor and walks
/// down until the line is found or the cursor reaches `floor`. Positions at
/// or below the floor are never tested.
///
/// The cursor moves past every tested position, hit or miss: after a hit at
/// `p` the next rescan starts at `p - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorderTracker {
    axis:   Axis,
    cursor: i32,
    floor:  i32,
    band:   Range<i32>,
}

impl BorderTracker {
    pub fn new(axis: Axis, start: i32, floor: i32, band: Range<i32>) -> Self {
        Self {
            axis,
            cursor: start,
            floor,
            band,
        }
    }

    /// Tracker for the leading border of `target` along `axis`
    ///
    /// The band spans the minimum rectangle size from the perpendicular
    /// border, so it stays inside the rectangle's own edge.
    pub fn for_rectangle(
        axis: Axis,
        target: Rectangle,
        detection: &DetectionConfig,
        floor: i32,
    ) -> Self {
        match axis {
            Axis::Horizontal => Self::new(
                axis,
                target.left,
                floor,
                target.top..target.top + detection.min_height,
            ),
            Axis::Vertical => Self::new(
                axis,
                target.top,
                floor,
                target.left..target.left + detection.min_width,
            ),
        }
    }

    /// Position that the next rescan tests first
    pub fn cursor(&self) -> i32 {
        self.cursor
    }

    fn line_is_black(&self, image: &BinaryImage, position: i32) -> bool {
        let mut band = self.band.clone();
        match self.axis {
            Axis::Horizontal => band.all(|y| image.is_black(position, y)),
            Axis::Vertical => band.all(|x| image.is_black(x, position)),
        }
    }

    /// Looks for the border in a fresh frame
    ///
    /// Returns `false` once no position above the floor holds the line.
    pub fn rescan(&mut self, image: &BinaryImage) -> bool {
        let mut found = false;
        while !found && self.cursor > self.floor {
            found = self.line_is_black(image, self.cursor);
            self.cursor -= 1;
        }
        found
    }
}

/// Click budget for a pass: `floor(offset / step) + bias + margin`
///
/// `offset` is the border's starting position. Negative offsets count as 0.
pub fn estimate_budget(offset: i32, step: f64, bias: u32, margin: u32) -> u32 {
    let estimate = (f64::from(offset.max(0)) / step).floor();
    // Saturating float-to-int conversion
    (estimate as u32).saturating_add(bias).saturating_add(margin)
}

/// Summary of one completed pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub axis:           Axis,
    pub budget:         u32,
    /// Clicks on the forward control
    pub forward_clicks: u32,
    /// False when the budget ran out with the border still in view
    pub border_lost:    bool,
    /// Tracker cursor when the forward run stopped
    pub final_cursor:   i32,
    /// Clicks on the reverse control
    pub reverse_clicks: u32,
}

/// One axis of scroll centering, ready to run
#[derive(Debug, Clone)]
pub struct ScrollPass {
    axis:           Axis,
    budget:         u32,
    forward:        Point,
    reverse:        Point,
    reverse_clicks: u32,
    tracker:        BorderTracker,
}

impl ScrollPass {
    /// Plans a pass for `target` with the viewer window at `window`
    pub fn plan(
        axis: Axis,
        scroll: &ScrollConfig,
        detection: &DetectionConfig,
        target: Rectangle,
        window: Rectangle,
    ) -> Self {
        let offset = match axis {
            Axis::Horizontal => target.left,
            Axis::Vertical => target.top,
        };

        Self {
            axis,
            budget: estimate_budget(offset, scroll.step, scroll.bias, scroll.margin),
            forward: scroll.forward.resolve(window),
            reverse: scroll.reverse.resolve(window),
            reverse_clicks: scroll.reverse_clicks,
            tracker: BorderTracker::for_rectangle(axis, target, detection, scroll.floor),
        }
    }

    /// Replaces the estimated click budget
    pub fn with_budget(mut self, budget: u32) -> Self {
        self.budget = budget;
        self
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Clicks forward until the border leaves the view or the budget runs
    /// out, then clicks the reverse control
    ///
    /// Every forward click is followed by `settle`, a capture of `viewport`
    /// and a rescan. Running out of budget is logged, not returned as an
    /// error.
    #[tracing::instrument(skip(self, desktop), fields(axis = %self.axis, budget = self.budget))]
    pub async fn run(
        mut self,
        desktop: &Desktop,
        viewport: Rectangle,
        threshold: u8,
        settle: Duration,
    ) -> FramerResult<PassReport> {
        desktop
            .input
            .set_cursor_position(self.forward.x, self.forward.y)
            .await?;

        let mut forward_clicks = 0;
        let mut border_in_view = true;
        while border_in_view && forward_clicks < self.budget {
            desktop.input.click().await?;
            tokio::time::sleep(settle).await;

            let frame = desktop.screen.capture_region(viewport).await?;
            border_in_view = self.tracker.rescan(&frame.binarize(threshold));
            forward_clicks += 1;

            tracing::debug!(
                click = forward_clicks,
                cursor = self.tracker.cursor(),
                border_in_view,
                "forward click"
            );
        }

        if border_in_view {
            tracing::warn!(
                "Border still in view after {} clicks; centering may be off",
                forward_clicks
            );
        }

        desktop
            .input
            .set_cursor_position(self.reverse.x, self.reverse.y)
            .await?;
        tokio::time::sleep(settle).await;
        for _ in 0..self.reverse_clicks {
            desktop.input.click().await?;
            tokio::time::sleep(settle).await;
        }

        let report = PassReport {
            axis: self.axis,
            budget: self.budget,
            forward_clicks,
            border_lost: !border_in_view,
            final_cursor: self.tracker.cursor(),
            reverse_clicks: self.reverse_clicks,
        };
        tracing::info!(
            forward_clicks = report.forward_clicks,
            border_lost = report.border_lost,
            "{} pass complete",
            self.axis
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::capture::{DesktopEvent, ImageBuffer, MockDesktop, desktop_from_mock};

    fn column_at(x: i32) -> BinaryImage {
        let mut image = BinaryImage::new_white(300, 300);
        for y in 0..300 {
            image.set_black(x, y);
        }
        image
    }

    fn row_at(y: i32) -> BinaryImage {
        let mut image = BinaryImage::new_white(300, 300);
        for x in 0..300 {
            image.set_black(x, y);
        }
        image
    }

    #[test]
    fn test_estimate_budget_formulas() {
        assert_eq!(estimate_budget(20, 3.0, 0, 20), 26);
        assert_eq!(estimate_budget(100, 3.0, 0, 20), 53);
        assert_eq!(estimate_budget(20, 3.3, 1, 20), 27);
        assert_eq!(estimate_budget(100, 3.3, 1, 20), 51);
        assert_eq!(estimate_budget(0, 3.3, 1, 20), 21);
        assert_eq!(estimate_budget(-40, 3.0, 0, 20), 20);
    }

    #[test]
    fn test_tracker_follows_moving_column() {
        let mut tracker = BorderTracker::new(Axis::Horizontal, 50, 0, 10..110);

        assert!(tracker.rescan(&column_at(50)));
        assert_eq!(tracker.cursor(), 49);

        assert!(tracker.rescan(&column_at(47)));
        assert_eq!(tracker.cursor(), 46);
    }

    #[test]
    fn test_tracker_loses_border_at_floor() {
        let mut tracker = BorderTracker::new(Axis::Horizontal, 50, 0, 10..110);

        assert!(!tracker.rescan(&BinaryImage::new_white(300, 300)));
        assert_eq!(tracker.cursor(), 0);

        // Already at the floor: nothing left to test
        assert!(!tracker.rescan(&column_at(0)));
    }

    #[test]
    fn test_tracker_requires_full_band() {
        let mut image = column_at(50);
        image.set_white(50, 60);

        let mut tracker = BorderTracker::new(Axis::Horizontal, 50, 0, 10..110);
        assert!(!tracker.rescan(&image));
    }

    #[test]
    fn test_tracker_band_outside_image_is_white() {
        let mut tracker = BorderTracker::new(Axis::Horizontal, 50, 0, 250..350);
        assert!(!tracker.rescan(&column_at(50)));
    }

    #[test]
    fn test_vertical_floor_is_exclusive() {
        let mut tracker = BorderTracker::new(Axis::Vertical, 30, 26, 10..110);
        assert!(!tracker.rescan(&row_at(26)));
        assert_eq!(tracker.cursor(), 26);

        let mut tracker = BorderTracker::new(Axis::Vertical, 30, 26, 10..110);
        assert!(tracker.rescan(&row_at(27)));
    }

    #[test]
    fn test_tracker_for_rectangle_bands() {
        let target = Rectangle::new(20, 40, 150, 160);
        let detection = DetectionConfig::default();

        let h = BorderTracker::for_rectangle(Axis::Horizontal, target, &detection, 0);
        assert_eq!(h, BorderTracker::new(Axis::Horizontal, 20, 0, 40..140));

        let v = BorderTracker::for_rectangle(Axis::Vertical, target, &detection, 26);
        assert_eq!(v, BorderTracker::new(Axis::Vertical, 40, 26, 20..120));
    }

    #[test]
    fn test_plan_resolves_controls() {
        let target = Rectangle::new(20, 40, 150, 160);
        let window = Rectangle::new(0, 0, 138, 190);
        let detection = DetectionConfig::default();

        let pass = ScrollPass::plan(
            Axis::Vertical,
            &ScrollConfig::vertical(),
            &detection,
            target,
            window,
        );
        assert_eq!(pass.budget(), 33);
        assert_eq!(pass.forward, Point::new(126, 160));
        assert_eq!(pass.reverse, Point::new(126, 55));
        assert_eq!(pass.reverse_clicks, 2);
        assert_eq!(pass.with_budget(3).budget(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhausted_with_border_always_visible() {
        let mock = Arc::new(
            MockDesktop::new().with_frames([ImageBuffer::from(&BinaryImage::new_black(300, 300))]),
        );
        let desktop = desktop_from_mock(mock.clone());
        let viewport = Rectangle::new(0, 0, 300, 300);

        let pass = ScrollPass::plan(
            Axis::Horizontal,
            &ScrollConfig::horizontal(),
            &DetectionConfig::default(),
            Rectangle::new(100, 20, 250, 160),
            viewport,
        )
        .with_budget(5);

        let report = pass
            .run(&desktop, viewport, 128, Duration::from_millis(100))
            .await
            .unwrap();

        assert_eq!(report.forward_clicks, 5);
        assert!(!report.border_lost);
        assert_eq!(report.final_cursor, 95);
        assert_eq!(mock.captures(), 5);
        assert_eq!(mock.clicks(), 6);
        assert_eq!(mock.cursor_moves(), vec![(270, 288), (12, 288)]);

        let events = mock.events();
        assert_eq!(events.last(), Some(&DesktopEvent::Click));
        assert_eq!(events[events.len() - 2], DesktopEvent::CursorMoved { x: 12, y: 288 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_stops_when_border_leaves_view() {
        let frames = [48, 45, 42]
            .into_iter()
            .map(|x| ImageBuffer::from(&column_at(x)))
            .chain(std::iter::once(ImageBuffer::from(&BinaryImage::new_white(
                300, 300,
            ))));
        let mock = Arc::new(MockDesktop::new().with_frames(frames));
        let desktop = desktop_from_mock(mock.clone());
        let viewport = Rectangle::new(0, 0, 300, 300);

        let report = ScrollPass::plan(
            Axis::Horizontal,
            &ScrollConfig::horizontal(),
            &DetectionConfig::default(),
            Rectangle::new(50, 20, 250, 160),
            viewport,
        )
        .run(&desktop, viewport, 128, Duration::from_millis(100))
        .await
        .unwrap();

        assert_eq!(report.budget, 36);
        assert_eq!(report.forward_clicks, 4);
        assert!(report.border_lost);
        assert_eq!(report.final_cursor, 0);
        assert_eq!(mock.clicks(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vertical_pass_nudges_back_twice() {
        let mock = Arc::new(
            MockDesktop::new().with_frames([ImageBuffer::from(&BinaryImage::new_white(300, 300))]),
        );
        let desktop = desktop_from_mock(mock.clone());
        let viewport = Rectangle::new(0, 0, 300, 300);
        let start = tokio::time::Instant::now();

        let report = ScrollPass::plan(
            Axis::Vertical,
            &ScrollConfig::vertical(),
            &DetectionConfig::default(),
            Rectangle::new(20, 60, 250, 260),
            viewport,
        )
        .run(&desktop, viewport, 128, Duration::from_millis(100))
        .await
        .unwrap();

        assert_eq!(report.forward_clicks, 1);
        assert!(report.border_lost);
        assert_eq!(report.final_cursor, 26);
        assert_eq!(mock.clicks(), 3);
        assert_eq!(mock.cursor_moves(), vec![(288, 270), (288, 55)]);
        // One settle per forward click, one before the nudges, one after each nudge
        assert_eq!(start.elapsed(), Duration::from_millis(400));
    }
}
