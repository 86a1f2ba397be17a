//! Strict black-and-white raster
//!
//! Every pixel of a [`BinaryImage`] is either black (0) or white (255).
//! Reads outside the raster report white, so border walks and band scans
//! can step off the edge without special cases.

use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};

use crate::{
    error::{FramerError, FramerResult},
    model::Rectangle,
};

const BLACK: u8 = 0;
const WHITE: u8 = 255;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryImage {
    pixels: GrayImage,
}

impl BinaryImage {
    /// Thresholds a grayscale image; values `<= cutoff` become black
    pub fn from_grayscale(gray: &GrayImage, cutoff: u8) -> Self {
        let mut pixels = gray.clone();
        for Luma([value]) in pixels.pixels_mut() {
            *value = if *value <= cutoff { BLACK } else { WHITE };
        }
        Self { pixels }
    }

    /// All-white image
    pub fn new_white(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::from_pixel(width, height, Luma([WHITE])),
        }
    }

    /// All-black image
    pub fn new_black(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::from_pixel(width, height, Luma([BLACK])),
        }
    }

    pub fn width(&self) -> i32 {
        self.pixels.width() as i32
    }

    pub fn height(&self) -> i32 {
        self.pixels.height() as i32
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width() && y < self.height()
    }

    /// True only for in-bounds black pixels
    pub fn is_black(&self, x: i32, y: i32) -> bool {
        self.contains(x, y) && self.pixels.get_pixel(x as u32, y as u32).0[0] == BLACK
    }

    pub fn set_black(&mut self, x: i32, y: i32) {
        self.set(x, y, BLACK);
    }

    pub fn set_white(&mut self, x: i32, y: i32) {
        self.set(x, y, WHITE);
    }

    fn set(&mut self, x: i32, y: i32, value: u8) {
        if self.contains(x, y) {
            self.pixels.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }

    /// Draws a one-pixel black outline on all four bounds of `rect`
    pub fn draw_outline(&mut self, rect: Rectangle) {
        for x in rect.left..=rect.right {
            self.set_black(x, rect.top);
            self.set_black(x, rect.bottom);
        }
        for y in rect.top..=rect.bottom {
            self.set_black(rect.left, y);
            self.set_black(rect.right, y);
        }
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }

    /// Writes the raster as a PNG file
    pub fn save_png(&self, path: &Path) -> FramerResult<()> {
        self.pixels
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| FramerError::Image(e.to_string()))
    }
}
