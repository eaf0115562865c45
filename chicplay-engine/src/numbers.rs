//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f32 and clamp it into a colour channel, returning 0 for NaN values.
#[must_use]
pub fn channel_from_f32(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.clamp(0.0, 255.0).round();
    cast::<f32, u8>(clamped).unwrap_or(0)
}

/// Normalise a colour channel to `0.0..=1.0`.
#[must_use]
pub fn channel_to_unit(value: u8) -> f32 {
    f32::from(value) / 255.0
}

/// Convert a unit-range value back to a colour channel.
#[must_use]
pub fn unit_to_channel(value: f32) -> u8 {
    channel_from_f32(value * 255.0)
}

/// Convert u32 to f32 while allowing precision loss in a single location.
#[must_use]
pub fn u32_to_f32(value: u32) -> f32 {
    cast::<u32, f32>(value).unwrap_or(0.0)
}
