//! Shared test utilities for integration tests
//!
//! Frames are synthesized as the viewer would show them: a white remote
//! screen with black rectangle outlines, or the solid loading gray.

#![allow(dead_code)]

use std::path::PathBuf;

use viewer_framer::{
    capture::{BinaryImage, ImageBuffer},
    config::FramerConfig,
    model::{Rectangle, Rgb},
};

pub const VIEWER_TITLE: &str = "lab-console - Remote Viewer";

/// Configuration with the required fields filled in and default tunables
pub fn test_config() -> FramerConfig {
    FramerConfig {
        window_title: VIEWER_TITLE.to_string(),
        viewer_path: PathBuf::from("/opt/remote-viewer/bin/viewer"),
        password: "ab1".to_string(),
        ..FramerConfig::default()
    }
}

/// White `width` x `height` frame with each rectangle outlined in black
pub fn outlined_frame(width: u32, height: u32, rects: &[Rectangle]) -> ImageBuffer {
    let mut image = BinaryImage::new_white(width, height);
    for rect in rects {
        image.draw_outline(*rect);
    }
    ImageBuffer::from(&image)
}

pub fn blank_frame(width: u32, height: u32) -> ImageBuffer {
    ImageBuffer::solid(width, height, Rgb::WHITE)
}

pub fn loading_frame(width: u32, height: u32) -> ImageBuffer {
    ImageBuffer::solid(width, height, Rgb::LOADING_GRAY)
}
