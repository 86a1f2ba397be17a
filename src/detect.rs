//! Black-bordered rectangle detection
//!
//! Works on a [`BinaryImage`]. A rectangle is four unbroken one-pixel black
//! lines. Its top-left corner must be a black pixel with white directly
//! above and to the left, and black directly right and below. The top edge
//! runs right from the corner and the left edge runs down from it, each until
//! the first white pixel. The bottom and right edges are then verified along
//! their full length.
//!
//! Only the outline matters: the interior may hold anything, and a thicker
//! border is detected at its outermost line.

use crate::{capture::BinaryImage, model::Rectangle};

/// Tries to read a rectangle whose top-left corner is `(col, row)`
///
/// Returns `None` when `(col, row)` is on the image edge or outside it, when
/// the corner signature does not match, when either walked edge runs to the
/// image edge without ending, when the rectangle is narrower than `min_width`
/// or shorter than `min_height`, or when the bottom or right edge has a gap.
///
/// Width and height are `right - left` and `bottom - top`.
///
/// # Examples
///
/// ```
/// use viewer_framer::{capture::BinaryImage, detect::find_rectangle_at, model::Rectangle};
///
/// let mut image = BinaryImage::new_white(200, 200);
/// image.draw_outline(Rectangle::new(20, 20, 150, 160));
///
/// let found = find_rectangle_at(&image, 20, 20, 100, 100).unwrap();
/// assert_eq!((found.width(), found.height()), (130, 140));
/// assert!(find_rectangle_at(&image, 21, 20, 100, 100).is_none());
/// ```
pub fn find_rectangle_at(
    image: &BinaryImage,
    col: i32,
    row: i32,
    min_width: i32,
    min_height: i32,
) -> Option<Rectangle> {
    let (width, height) = (image.width(), image.height());
    if col < 1 || row < 1 || col >= width - 1 || row >= height - 1 {
        return None;
    }

    let is_corner = image.is_black(col, row)
        && !image.is_black(col - 1, row)
        && !image.is_black(col, row - 1)
        && image.is_black(col + 1, row)
        && image.is_black(col, row + 1);
    if !is_corner {
        return None;
    }

    let right = (col + 1..width).find(|&x| !image.is_black(x, row))? - 1;
    if right - col < min_width {
        return None;
    }

    let bottom = (row + 1..height).find(|&y| !image.is_black(col, y))? - 1;
    if bottom - row < min_height {
        return None;
    }

    let bottom_closed = (col + 1..=right).all(|x| image.is_black(x, bottom));
    let right_closed = (row + 1..=bottom).all(|y| image.is_black(right, y));
    if !(bottom_closed && right_closed) {
        return None;
    }

    Some(Rectangle::new(col, row, right, bottom))
}

/// Scans the image for the first rectangle in raster order
///
/// Rows `1..height-1` are scanned top to bottom and, within a row, columns
/// `1..width-1` left to right. The first corner that yields a valid
/// rectangle wins, so when several qualify the topmost (then leftmost)
/// corner is returned.
#[tracing::instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn find_first_rectangle(
    image: &BinaryImage,
    min_width: i32,
    min_height: i32,
) -> Option<Rectangle> {
    let found = (1..image.height() - 1).find_map(|row| {
        (1..image.width() - 1)
            .find_map(|col| find_rectangle_at(image, col, row, min_width, min_height))
    });

    match &found {
        Some(rect) => tracing::debug!(%rect, "Rectangle found"),
        None => tracing::debug!("No rectangle found"),
    }
    found
}
