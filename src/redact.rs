//! In-place redaction transforms.
//!
//! A region is cut out of the frame, blurred on its own (edges clamp to the
//! sub-image, so nothing outside the region is read or written), and pasted back.
//! Blur is applied per channel, so channel order is irrelevant here.

use image::{GrayImage, RgbImage};
use imageproc::filter::{box_filter, gaussian_blur_f32};

use crate::detect::preprocess::sigma_for_kernel;
use crate::frame::Frame;
use crate::region::Region;

/// Kernel for license plates (strong Gaussian).
pub const PLATE_KERNEL: u32 = 51;
/// Kernel for block identifiers (box blur).
pub const IDENTIFIER_KERNEL: u32 = 51;
/// Kernel for street signs (box blur).
pub const SIGN_KERNEL: u32 = 21;

/// Blur transform with a fixed odd kernel size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlurKind {
    Gaussian { kernel: u32 },
    Box { kernel: u32 },
}

impl BlurKind {
    fn apply(&self, image: &RgbImage) -> RgbImage {
        match *self {
            BlurKind::Gaussian { kernel } => {
                gaussian_blur_f32(image, sigma_for_kernel(kernel).max(0.1))
            }
            BlurKind::Box { kernel } => box_blur_rgb(image, kernel / 2),
        }
    }
}

/// Blur one region of the frame in place. Regions are clipped to the frame; a
/// region that falls entirely outside is a no-op and returns `false`.
pub fn redact_region(frame: &mut Frame, region: &Region, blur: BlurKind) -> bool {
    let Some(region) = region.clip_to(frame.bounds()) else {
        return false;
    };
    let sub = image::imageops::crop_imm(
        frame.image(),
        region.x1,
        region.y1,
        region.width(),
        region.height(),
    )
    .to_image();
    let blurred = blur.apply(&sub);
    image::imageops::replace(
        frame.image_mut(),
        &blurred,
        region.x1 as i64,
        region.y1 as i64,
    );
    true
}

/// Blur every region in order. Returns how many were actually applied.
pub fn redact_regions(frame: &mut Frame, regions: &[Region], blur: BlurKind) -> usize {
    regions
        .iter()
        .filter(|region| redact_region(frame, region, blur))
        .count()
}

fn box_blur_rgb(image: &RgbImage, radius: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut out = RgbImage::new(width, height);
    for channel in 0..3 {
        let plane = GrayImage::from_fn(width, height, |x, y| {
            image::Luma([image.get_pixel(x, y)[channel]])
        });
        let filtered = box_filter(&plane, radius, radius);
        for (x, y, value) in filtered.enumerate_pixels() {
            out.get_pixel_mut(x, y)[channel] = value[0];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ChannelOrder;

    fn checkerboard(width: u32, height: u32) -> Frame {
        let mut frame = Frame::filled(width, height, [255, 255, 255], ChannelOrder::Bgr).unwrap();
        for y in 0..height {
            for x in 0..width {
                if (x / 2 + y / 2) % 2 == 0 {
                    frame.put_pixel(x, y, [0, 0, 0]);
                }
            }
        }
        frame
    }

    #[test]
    fn blurs_inside_region_only() {
        let original = checkerboard(40, 30);
        for blur in [
            BlurKind::Gaussian { kernel: PLATE_KERNEL },
            BlurKind::Box { kernel: SIGN_KERNEL },
        ] {
            let mut frame = original.clone();
            let region = Region {
                x1: 10,
                y1: 5,
                x2: 30,
                y2: 25,
            };
            assert!(redact_region(&mut frame, &region, blur));
            let mut changed_inside = 0;
            for y in 0..30 {
                for x in 0..40 {
                    if region.contains(x, y) {
                        if frame.pixel(x, y) != original.pixel(x, y) {
                            changed_inside += 1;
                        }
                    } else {
                        assert_eq!(frame.pixel(x, y), original.pixel(x, y), "({}, {})", x, y);
                    }
                }
            }
            assert!(changed_inside > 0, "{:?} changed nothing", blur);
        }
    }

    #[test]
    fn uniform_region_is_unchanged_and_dimensions_preserved() {
        let mut frame = Frame::filled(20, 10, [200, 10, 30], ChannelOrder::Rgb).unwrap();
        let region = Region {
            x1: 0,
            y1: 0,
            x2: 20,
            y2: 10,
        };
        redact_region(&mut frame, &region, BlurKind::Box { kernel: IDENTIFIER_KERNEL });
        assert_eq!((frame.width(), frame.height()), (20, 10));
        assert_eq!(frame.pixel(7, 3), [200, 10, 30]);
    }

    #[test]
    fn regions_outside_frame_are_skipped() {
        let mut frame = checkerboard(10, 10);
        let outside = Region {
            x1: 12,
            y1: 0,
            x2: 20,
            y2: 5,
        };
        let partial = Region {
            x1: 5,
            y1: 5,
            x2: 50,
            y2: 50,
        };
        let applied = redact_regions(
            &mut frame,
            &[outside, partial],
            BlurKind::Box { kernel: 5 },
        );
        assert_eq!(applied, 1);
    }
}
