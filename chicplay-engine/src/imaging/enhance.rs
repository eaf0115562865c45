//! Post-processing that makes a cut-out garment sit more naturally on the
//! body: transparent padding, softened edges, a faint fabric grain and a
//! top-lit gradient. Colour changes only touch pixels that are not fully
//! transparent, so the cut-out keeps its shape.
use image::{RgbaImage, imageops};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::fallback::blur_alpha_where;
use crate::numbers::{channel_to_unit, u32_to_f32, unit_to_channel};

pub const DEFAULT_NOISE_SEED: u64 = 0x00C0_FFEE;
const SMOOTH_RADIUS: u32 = 1;
const SMOOTH_MIN_ALPHA: u8 = 10;
const SMOOTH_MAX_ALPHA: u8 = 245;

#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceSettings {
    pub padding: u32,
    pub smooth_edges: bool,
    pub fabric_texture: bool,
    pub texture_opacity: f32,
    pub lighting: bool,
    pub light_opacity: f32,
    pub shade_opacity: f32,
    pub noise_seed: u64,
}

impl Default for EnhanceSettings {
    fn default() -> Self {
        Self {
            padding: 40,
            smooth_edges: true,
            fabric_texture: true,
            texture_opacity: 0.03,
            lighting: true,
            light_opacity: 0.12,
            shade_opacity: 0.15,
            noise_seed: DEFAULT_NOISE_SEED,
        }
    }
}

/// Run the full enhancement stage and return the padded result.
#[must_use]
pub fn enhance(image: &RgbaImage, settings: &EnhanceSettings) -> RgbaImage {
    let mut out = pad(image, settings.padding);
    if settings.smooth_edges {
        smooth_edges(&mut out);
    }
    if settings.fabric_texture && settings.texture_opacity > 0.0 {
        apply_fabric_texture(&mut out, settings.texture_opacity, settings.noise_seed);
    }
    if settings.lighting {
        apply_lighting(&mut out, settings.light_opacity, settings.shade_opacity);
    }
    out
}

/// Surround the image with `padding` transparent pixels on every side.
#[must_use]
pub fn pad(image: &RgbaImage, padding: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut out = RgbaImage::new(width + 2 * padding, height + 2 * padding);
    imageops::replace(&mut out, image, i64::from(padding), i64::from(padding));
    out
}

/// 3x3 alpha average over the soft fringe.
pub fn smooth_edges(image: &mut RgbaImage) {
    blur_alpha_where(image, SMOOTH_RADIUS, |alpha| {
        alpha > SMOOTH_MIN_ALPHA && alpha < SMOOTH_MAX_ALPHA
    });
}

/// Canvas `overlay` blend of one channel, both values in `0.0..=1.0`.
#[must_use]
pub fn overlay(base: f32, blend: f32) -> f32 {
    if base < 0.5 {
        2.0 * base * blend
    } else {
        1.0 - 2.0 * (1.0 - base) * (1.0 - blend)
    }
}

fn overlay_pixel(px: &mut image::Rgba<u8>, blend: f32, opacity: f32) {
    for channel in px.0.iter_mut().take(3) {
        let base = channel_to_unit(*channel);
        let mixed = base + (overlay(base, blend) - base) * opacity;
        *channel = unit_to_channel(mixed);
    }
}

/// Per-pixel grey noise blended in overlay mode at `opacity`.
pub fn apply_fabric_texture(image: &mut RgbaImage, opacity: f32, seed: u64) {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    for px in image.pixels_mut() {
        let noise: f32 = rng.r#gen();
        if px[3] == 0 {
            continue;
        }
        overlay_pixel(px, noise, opacity);
    }
}

/// Blend value and opacity of the lighting gradient at row `y`: white
/// fading out towards the middle, then black fading in towards the bottom.
#[must_use]
pub fn lighting_at(y: u32, height: u32, light_opacity: f32, shade_opacity: f32) -> (f32, f32) {
    let t = if height > 1 {
        u32_to_f32(y) / u32_to_f32(height - 1)
    } else {
        0.0
    };
    if t < 0.5 {
        (1.0, light_opacity * (1.0 - 2.0 * t))
    } else {
        (0.0, shade_opacity * (2.0 * t - 1.0))
    }
}

/// Vertical lighting gradient blended in overlay mode.
pub fn apply_lighting(image: &mut RgbaImage, light_opacity: f32, shade_opacity: f32) {
    let height = image.height();
    for (_, y, px) in image.enumerate_pixels_mut() {
        if px[3] == 0 {
            continue;
        }
        let (blend, opacity) = lighting_at(y, height, light_opacity, shade_opacity);
        if opacity > 0.0 {
            overlay_pixel(px, blend, opacity);
        }
    }
}
