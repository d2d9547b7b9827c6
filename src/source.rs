//! Frame sources for demos and tests.
//!
//! `FrameSource` yields `Frame`s from either:
//! - `stub://<name>`: a synthetic street scene (moving plate, green street sign,
//!   block number plaque) generated in memory
//! - a local PNG file, repeated as a still stream
//!
//! Sources never fetch remote URLs and never write frames anywhere.

use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};

use crate::frame::{ChannelOrder, Frame};

/// Configuration for a frame source.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// `stub://...` or a local image path.
    pub path: String,
    pub width: u32,
    pub height: u32,
    /// Byte order of produced frames.
    pub order: ChannelOrder,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: "stub://street".to_string(),
            width: 640,
            height: 480,
            order: ChannelOrder::Bgr,
        }
    }
}

pub struct FrameSource {
    backend: SourceBackend,
    frames_produced: u64,
}

enum SourceBackend {
    Synthetic(SyntheticSource),
    Still { frame: Frame, path: String },
}

impl FrameSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        if !is_local_path(&config.path) {
            return Err(anyhow!(
                "frame sources only support stub:// or local paths, got {}",
                config.path
            ));
        }
        let backend = if config.path.starts_with("stub://") {
            SourceBackend::Synthetic(SyntheticSource::new(
                config.width,
                config.height,
                config.order,
            )?)
        } else {
            let image = image::open(&config.path)
                .with_context(|| format!("failed to read image {}", config.path))?
                .to_rgb8();
            let image = match config.order {
                ChannelOrder::Rgb => image,
                ChannelOrder::Bgr => swap_channels(image),
            };
            let frame = Frame::from_image(image, config.order)?;
            log::info!(
                "FrameSource: {} ({}x{} still)",
                config.path,
                frame.width(),
                frame.height()
            );
            SourceBackend::Still {
                frame,
                path: config.path,
            }
        };
        Ok(Self {
            backend,
            frames_produced: 0,
        })
    }

    pub fn next_frame(&mut self) -> Result<Frame> {
        self.frames_produced += 1;
        match &mut self.backend {
            SourceBackend::Synthetic(source) => source.next_frame(),
            SourceBackend::Still { frame, .. } => Ok(frame.clone()),
        }
    }

    pub fn frames_produced(&self) -> u64 {
        self.frames_produced
    }

    pub fn describe(&self) -> String {
        match &self.backend {
            SourceBackend::Synthetic(source) => {
                format!("synthetic {}x{}", source.width, source.height)
            }
            SourceBackend::Still { path, .. } => format!("still {}", path),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic street scene (stub://)
// ----------------------------------------------------------------------------

const PLATE_COLOR: [u8; 3] = [235, 235, 225];
const INK_COLOR: [u8; 3] = [25, 25, 30];
const SIGN_GREEN: [u8; 3] = [20, 150, 40];
const SIGN_TEXT: [u8; 3] = [245, 245, 245];

/// In-memory scene: gray gradient, a plate drifting along the bottom, a green
/// street sign panel, and a plaque with a dark three-digit block number.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    order: ChannelOrder,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, order: ChannelOrder) -> Result<Self> {
        if width < 64 || height < 64 {
            return Err(anyhow!(
                "synthetic scene needs at least 64x64 pixels, got {}x{}",
                width,
                height
            ));
        }
        Ok(Self {
            width,
            height,
            order,
            frame_count: 0,
        })
    }

    pub fn next_frame(&mut self) -> Result<Frame> {
        self.frame_count += 1;
        let mut image = self.background();
        self.draw_plate(&mut image);
        self.draw_sign(&mut image);
        self.draw_block_number(&mut image);
        let image = match self.order {
            ChannelOrder::Rgb => image,
            ChannelOrder::Bgr => swap_channels(image),
        };
        Ok(Frame::from_image(image, self.order)?)
    }

    fn background(&self) -> RgbImage {
        let height = self.height;
        RgbImage::from_fn(self.width, height, |_, y| {
            let level = (60 + y * 120 / height) as u8;
            Rgb([level, level, level])
        })
    }

    fn draw_plate(&self, image: &mut RgbImage) {
        let (w, h) = (self.width, self.height);
        let travel = (w / 2).max(1) as u64;
        let x = w / 8 + (self.frame_count * 4 % travel) as u32;
        let y = h * 4 / 5;
        fill_rect(image, x, y, 110, 28, PLATE_COLOR);
        for i in 0..6 {
            fill_rect(image, x + 8 + i * 16, y + 6, 8, 16, INK_COLOR);
        }
    }

    fn draw_sign(&self, image: &mut RgbImage) {
        let (x, y) = (self.width * 11 / 20, self.height / 10);
        fill_rect(image, x, y, 160, 48, SIGN_GREEN);
        fill_rect(image, x + 16, y + 20, 128, 6, SIGN_TEXT);
    }

    fn draw_block_number(&self, image: &mut RgbImage) {
        let (x, y) = (self.width / 10, self.height / 8);
        fill_rect(image, x, y, 72, 40, PLATE_COLOR);
        for i in 0..3 {
            fill_rect(image, x + 10 + i * 20, y + 8, 12, 24, INK_COLOR);
        }
    }
}

fn fill_rect(image: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
    let x_end = x.saturating_add(w).min(image.width());
    let y_end = y.saturating_add(h).min(image.height());
    for yy in y..y_end {
        for xx in x..x_end {
            image.put_pixel(xx, yy, Rgb(color));
        }
    }
}

fn swap_channels(mut image: RgbImage) -> RgbImage {
    for pixel in image.pixels_mut() {
        pixel.0.swap(0, 2);
    }
    image
}

fn is_local_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::SignSegmenter;

    #[test]
    fn rejects_remote_and_empty_paths() {
        for path in ["", "rtsp://camera", "https://example.com/frame.png"] {
            let config = SourceConfig {
                path: path.to_string(),
                ..SourceConfig::default()
            };
            assert!(FrameSource::new(config).is_err(), "{path}");
        }
    }

    #[test]
    fn synthetic_frames_have_requested_shape_and_move() {
        let mut source = FrameSource::new(SourceConfig::default()).unwrap();
        let first = source.next_frame().unwrap();
        let second = source.next_frame().unwrap();
        assert_eq!((first.width(), first.height()), (640, 480));
        assert_eq!(first.channel_order(), ChannelOrder::Bgr);
        assert_ne!(first.as_bytes(), second.as_bytes());
        assert_eq!(source.frames_produced(), 2);
    }

    #[test]
    fn synthetic_sign_is_detectable() {
        for order in [ChannelOrder::Rgb, ChannelOrder::Bgr] {
            let mut source = SyntheticSource::new(640, 480, order).unwrap();
            let frame = source.next_frame().unwrap();
            let signs = SignSegmenter::default().detect_signs(&frame).unwrap();
            assert_eq!(signs.len(), 1, "{order:?}");
            assert_eq!(signs[0].width(), 160);
        }
    }

    #[test]
    fn still_source_repeats_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        RgbImage::from_pixel(32, 16, Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();
        let mut source = FrameSource::new(SourceConfig {
            path: path.display().to_string(),
            order: ChannelOrder::Bgr,
            ..SourceConfig::default()
        })
        .unwrap();
        let frame = source.next_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (32, 16));
        assert_eq!(frame.pixel(0, 0), [30, 20, 10]);
        assert_eq!(frame.rgb_at(0, 0), [10, 20, 30]);
        assert_eq!(source.next_frame().unwrap(), frame);
    }
}
