//! Image buffer wrapper for captured screen regions
//!
//! This module provides an `ImageBuffer` wrapper around `image::DynamicImage`
//! with the pixel reads and conversions the framing workflow needs: probing a
//! single pixel color, converting to grayscale, and binarizing.
//!
//! # Examples
//!
//! ```
//! use viewer_framer::{capture::ImageBuffer, model::Rgb};
//!
//! let img = ImageBuffer::solid(640, 480, Rgb::LOADING_GRAY);
//! assert_eq!(img.pixel_rgb(610, 450), Some(Rgb::LOADING_GRAY));
//!
//! let bw = img.binarize(128);
//! assert!(!bw.is_black(10, 10));
//! ```

use image::{DynamicImage, GenericImageView, GrayImage, RgbaImage};

use super::BinaryImage;
use crate::model::Rgb;

/// Wrapper around `image::DynamicImage` holding one capture
///
/// Coordinates are relative to the captured region's top-left corner.
#[derive(Clone, Debug)]
pub struct ImageBuffer {
    inner: DynamicImage,
}

impl ImageBuffer {
    /// Creates a new ImageBuffer from a DynamicImage
    pub fn new(image: DynamicImage) -> Self {
        Self { inner: image }
    }

    /// Creates an ImageBuffer from raw RGBA capture output
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self::new(DynamicImage::ImageRgba8(image))
    }

    /// Creates a single-color image
    ///
    /// # Examples
    ///
    /// ```
    /// use viewer_framer::{capture::ImageBuffer, model::Rgb};
    ///
    /// let img = ImageBuffer::solid(100, 50, Rgb::WHITE);
    /// assert_eq!(img.dimensions(), (100, 50));
    /// ```
    pub fn solid(width: u32, height: u32, color: Rgb) -> Self {
        let Rgb(r, g, b) = color;
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([r, g, b]));
        Self::new(DynamicImage::ImageRgb8(img))
    }

    /// Returns the dimensions of the image as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    /// Returns the image width in pixels
    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    /// Returns the image height in pixels
    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    /// Reads the color at `(x, y)`, or `None` outside the image
    pub fn pixel_rgb(&self, x: i32, y: i32) -> Option<Rgb> {
        let (width, height) = self.dimensions();
        if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
            return None;
        }

        let [r, g, b, _] = self.inner.get_pixel(x as u32, y as u32).0;
        Some(Rgb(r, g, b))
    }

    /// Converts the image to 8-bit luma with ITU-R 601-2 weights
    ///
    /// Not `DynamicImage::to_luma8`, which weights by Rec. 709.
    pub fn to_grayscale(&self) -> GrayImage {
        let rgb = self.inner.to_rgb8();
        let mut gray = GrayImage::new(rgb.width(), rgb.height());
        for (src, dst) in rgb.pixels().zip(gray.pixels_mut()) {
            let [r, g, b] = src.0;
            dst.0 = [luma_601(r, g, b)];
        }
        gray
    }

    /// Converts to grayscale, then thresholds to strict black and white
    ///
    /// Luma values at or below `cutoff` become black.
    pub fn binarize(&self, cutoff: u8) -> BinaryImage {
        BinaryImage::from_grayscale(&self.to_grayscale(), cutoff)
    }
}

/// 16-bit fixed-point 0.299 R + 0.587 G + 0.114 B, rounded to nearest
fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    let weighted = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000;
    (weighted >> 16) as u8
}

impl From<&BinaryImage> for ImageBuffer {
    fn from(binary: &BinaryImage) -> Self {
        Self::new(DynamicImage::ImageLuma8(binary.as_gray().clone()).into_rgb8().into())
    }
}
