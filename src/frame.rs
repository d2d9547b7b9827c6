//! Frame container for the redaction pipeline.
//!
//! - `Frame`: owned, mutable 3-channel 8-bit pixel grid, origin top-left, row-major.
//! - `ChannelOrder`: whether the bytes are RGB or BGR. Redaction never reorders
//!   channels; detectors that care about color ask for an RGB view.
//!
//! A `Frame` cannot be zero-area. Constructing one from a malformed buffer is the
//! one error the pipeline reports to its caller instead of absorbing.

use image::RgbImage;
use thiserror::Error;

use crate::region::FrameBounds;

/// Bytes per pixel. Only 3-channel 8-bit frames are supported.
pub const CHANNELS: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame has zero area ({width}x{height})")]
    ZeroArea { width: u32, height: u32 },
    #[error("frame buffer length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("frame dimensions overflow")]
    DimensionOverflow,
}

/// Channel order of the frame bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// A mutable video frame. Passed by `&mut` into the pipeline and mutated in place.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    // Bytes are stored in `order`; the `Rgb` pixel type is only a container here.
    pixels: RgbImage,
    order: ChannelOrder,
}

impl Frame {
    /// Wrap a raw interleaved buffer. Fails on zero area or length mismatch.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        order: ChannelOrder,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroArea { width, height });
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(CHANNELS))
            .ok_or(FrameError::DimensionOverflow)?;
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        let pixels = RgbImage::from_raw(width, height, data).ok_or(FrameError::LengthMismatch {
            expected,
            actual: 0,
        })?;
        Ok(Self { pixels, order })
    }

    /// Wrap an existing image buffer whose bytes are in `order`.
    pub fn from_image(pixels: RgbImage, order: ChannelOrder) -> Result<Self, FrameError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(FrameError::ZeroArea {
                width: pixels.width(),
                height: pixels.height(),
            });
        }
        Ok(Self { pixels, order })
    }

    /// Uniformly filled frame, mostly useful in tests and demos.
    pub fn filled(
        width: u32,
        height: u32,
        value: [u8; 3],
        order: ChannelOrder,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroArea { width, height });
        }
        Ok(Self {
            pixels: RgbImage::from_pixel(width, height, image::Rgb(value)),
            order,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn bounds(&self) -> FrameBounds {
        FrameBounds::new(self.width(), self.height())
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    /// Pixel bytes in the frame's own channel order.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels.get_pixel(x, y).0
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, value: [u8; 3]) {
        self.pixels.put_pixel(x, y, image::Rgb(value));
    }

    /// Raw bytes in the frame's own channel order.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels.into_raw()
    }

    pub(crate) fn image(&self) -> &RgbImage {
        &self.pixels
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.pixels
    }

    /// Copy of the frame with channels in RGB order.
    pub fn to_rgb(&self) -> RgbImage {
        match self.order {
            ChannelOrder::Rgb => self.pixels.clone(),
            ChannelOrder::Bgr => {
                let mut rgb = self.pixels.clone();
                for pixel in rgb.pixels_mut() {
                    pixel.0.swap(0, 2);
                }
                rgb
            }
        }
    }

    /// RGB value of a pixel regardless of storage order.
    pub fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let [a, b, c] = self.pixel(x, y);
        match self.order {
            ChannelOrder::Rgb => [a, b, c],
            ChannelOrder::Bgr => [c, b, a],
        }
    }
}
