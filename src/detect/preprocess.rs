//! OCR preprocessing: grayscale, contrast-limited adaptive histogram equalization
//! (CLAHE), then Gaussian adaptive thresholding to a binary image.

use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::gaussian_blur_f32;

use super::error::DetectionError;

pub const CLAHE_CLIP_LIMIT: f32 = 2.0;
pub const CLAHE_TILES: u32 = 8;
pub const THRESHOLD_BLOCK_SIZE: u32 = 11;
pub const THRESHOLD_OFFSET: i32 = 2;

const HIST_BINS: usize = 256;

/// Full OCR preprocessing chain.
pub fn preprocess_for_ocr(rgb: &RgbImage) -> Result<GrayImage, DetectionError> {
    let gray = image::imageops::grayscale(rgb);
    let equalized = clahe(&gray, CLAHE_CLIP_LIMIT, CLAHE_TILES)?;
    Ok(adaptive_threshold_gaussian(
        &equalized,
        THRESHOLD_BLOCK_SIZE,
        THRESHOLD_OFFSET,
    ))
}

/// Gaussian sigma OpenCV derives for a kernel size when none is given.
pub fn sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Contrast-limited adaptive histogram equalization over a `tiles` x `tiles` grid.
pub fn clahe(gray: &GrayImage, clip_limit: f32, tiles: u32) -> Result<GrayImage, DetectionError> {
    let (width, height) = gray.dimensions();
    if tiles == 0 || width < tiles || height < tiles {
        return Err(DetectionError::FrameTooSmall {
            width,
            height,
            stage: "CLAHE tile grid",
        });
    }

    let tile_w = width.div_ceil(tiles);
    let tile_h = height.div_ceil(tiles);
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(gray, (x0, y0, x1, y1), clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];
    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let value = gray.get_pixel(x, y)[0] as usize;

        let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let tx1 = fx.floor().max(0.0) as u32;
        let ty1 = fy.floor().max(0.0) as u32;
        let tx2 = (tx1 + 1).min(tiles_x - 1);
        let ty2 = (ty1 + 1).min(tiles_y - 1);
        let tx1 = tx1.min(tiles_x - 1);
        let ty1 = ty1.min(tiles_y - 1);
        let wx = (fx - tx1 as f32).clamp(0.0, 1.0);
        let wy = (fy - ty1 as f32).clamp(0.0, 1.0);

        let top =
            lut_at(tx1, ty1)[value] as f32 * (1.0 - wx) + lut_at(tx2, ty1)[value] as f32 * wx;
        let bottom =
            lut_at(tx1, ty2)[value] as f32 * (1.0 - wx) + lut_at(tx2, ty2)[value] as f32 * wx;
        let blended = top * (1.0 - wy) + bottom * wy;
        *pixel = Luma([blended.round().clamp(0.0, 255.0) as u8]);
    }
    Ok(out)
}

/// Clipped-histogram equalization lookup table for one tile.
fn tile_lut(
    gray: &GrayImage,
    (x0, y0, x1, y1): (u32, u32, u32, u32),
    clip_limit: f32,
) -> [u8; HIST_BINS] {
    let mut hist = [0u32; HIST_BINS];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[gray.get_pixel(x, y)[0] as usize] += 1;
        }
    }
    let area = (x1 - x0) * (y1 - y0);

    let limit = ((clip_limit * area as f32 / HIST_BINS as f32) as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let batch = excess / HIST_BINS as u32;
    let residual = (excess % HIST_BINS as u32) as usize;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (HIST_BINS / residual).max(1);
        for bin in hist.iter_mut().step_by(step).take(residual) {
            *bin += 1;
        }
    }

    let scale = 255.0 / area.max(1) as f32;
    let mut lut = [0u8; HIST_BINS];
    let mut cdf = 0u32;
    for (value, count) in hist.iter().enumerate() {
        cdf += count;
        lut[value] = (cdf as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Binary threshold against a Gaussian-weighted local mean minus `offset`.
pub fn adaptive_threshold_gaussian(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let local_mean = gaussian_blur_f32(gray, sigma_for_kernel(block_size));
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let src = gray.get_pixel(x, y)[0] as i32;
        let threshold = local_mean.get_pixel(x, y)[0] as i32 - offset;
        *pixel = Luma([if src > threshold { 255 } else { 0 }]);
    }
    out
}
