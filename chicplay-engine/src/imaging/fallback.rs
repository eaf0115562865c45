//! Colour-distance background removal used when no model is available.
//!
//! The background colour is estimated from the four image corners, pixels
//! close to it become transparent, pixels slightly further away fade in
//! linearly, and the partially transparent fringe is finally box-blurred so
//! the cut-out does not halo.
use image::RgbaImage;

use crate::numbers::{channel_from_f32, u32_to_f32};

/// Side of the square sampled in each corner.
pub const CORNER_SAMPLE: u32 = 5;
/// Radius of the alpha box blur (5x5 window).
pub const EDGE_BLUR_RADIUS: u32 = 2;
/// Pixels brighter than this are treated as studio white.
pub const BRIGHT_THRESHOLD: f32 = 240.0;
const BRIGHT_TOLERANCE_FACTOR: f32 = 1.5;
const FEATHER_FACTOR: f32 = 2.0;

/// Average RGB of 5x5 blocks taken from each corner.
#[must_use]
pub fn estimate_background(image: &RgbaImage) -> [f32; 3] {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return [255.0; 3];
    }
    let block_w = CORNER_SAMPLE.min(width);
    let block_h = CORNER_SAMPLE.min(height);
    let origins = [
        (0, 0),
        (width - block_w, 0),
        (0, height - block_h),
        (width - block_w, height - block_h),
    ];

    let mut sum = [0.0_f32; 3];
    let mut count = 0.0_f32;
    for (ox, oy) in origins {
        for y in oy..oy + block_h {
            for x in ox..ox + block_w {
                let px = image.get_pixel(x, y).0;
                for (acc, channel) in sum.iter_mut().zip(px) {
                    *acc += f32::from(channel);
                }
                count += 1.0;
            }
        }
    }
    sum.map(|total| total / count)
}

#[must_use]
pub fn color_distance(rgb: [u8; 3], background: [f32; 3]) -> f32 {
    rgb.iter()
        .zip(background)
        .map(|(&channel, bg)| {
            let d = f32::from(channel) - bg;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Alpha a pixel receives given its distance from the background, or `None`
/// when it is far enough away to keep its own alpha.
#[must_use]
pub fn alpha_for(rgb: [u8; 3], distance: f32, tolerance: f32) -> Option<u8> {
    let brightness = rgb.iter().map(|&c| f32::from(c)).sum::<f32>() / 3.0;
    if distance < tolerance {
        return Some(0);
    }
    if brightness > BRIGHT_THRESHOLD && distance < tolerance * BRIGHT_TOLERANCE_FACTOR {
        return Some(0);
    }
    if distance < tolerance * FEATHER_FACTOR {
        let t = (distance - tolerance) / tolerance;
        return Some(channel_from_f32(t * 255.0));
    }
    None
}

/// Make the estimated background transparent in place.
pub fn strip_background(image: &mut RgbaImage, tolerance: u8) {
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let tolerance = f32::from(tolerance.max(1));
    let background = estimate_background(image);
    for px in image.pixels_mut() {
        let rgb = [px[0], px[1], px[2]];
        let distance = color_distance(rgb, background);
        if let Some(alpha) = alpha_for(rgb, distance, tolerance) {
            px[3] = px[3].min(alpha);
        }
    }
    feather_edges(image);
}

/// Box-blur alpha over a 5x5 window, only where alpha is strictly between
/// 0 and 255. Reads from a snapshot so blurred values do not cascade.
pub fn feather_edges(image: &mut RgbaImage) {
    blur_alpha_where(image, EDGE_BLUR_RADIUS, |alpha| alpha > 0 && alpha < 255);
}

/// Average alpha over a `(2r+1)^2` window (clipped at the borders) for every
/// pixel whose current alpha satisfies `select`.
pub fn blur_alpha_where(image: &mut RgbaImage, radius: u32, select: impl Fn(u8) -> bool) {
    let (width, height) = image.dimensions();
    let alpha: Vec<u8> = image.pixels().map(|px| px[3]).collect();
    let at = |x: u32, y: u32| alpha[(y as usize) * (width as usize) + x as usize];

    for y in 0..height {
        for x in 0..width {
            if !select(at(x, y)) {
                continue;
            }
            let x0 = x.saturating_sub(radius);
            let y0 = y.saturating_sub(radius);
            let x1 = (x + radius).min(width - 1);
            let y1 = (y + radius).min(height - 1);
            let mut sum = 0_u32;
            let mut count = 0_u32;
            for wy in y0..=y1 {
                for wx in x0..=x1 {
                    sum += u32::from(at(wx, wy));
                    count += 1;
                }
            }
            let mean = u32_to_f32(sum) / u32_to_f32(count);
            image.get_pixel_mut(x, y)[3] = channel_from_f32(mean);
        }
    }
}
