//! RGB, HSV and hex conversions.
//!
//! Channels live in `[0, 255]` and hue in degrees `[0, 360)`. Saturation and
//! value are also scaled to `[0, 255]` rather than `palette`'s `[0, 1]`, so
//! every function rescales on the way in and out. Out-of-range input is
//! clamped; centroids coming out of k-means are allowed to be slightly off.

use palette::{FromColor, Hsv, Srgb};

const CHANNEL_MAX: f32 = 255.0;

/// A color in this crate's HSV convention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HsvColor {
    /// Degrees in `[0, 360)`.
    pub hue: f32,
    /// `[0, 255]`.
    pub saturation: f32,
    /// `[0, 255]`.
    pub value: f32,
}

impl HsvColor {
    pub fn new(hue: f32, saturation: f32, value: f32) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    pub fn to_rgb(&self) -> [u8; 3] {
        hsv_to_rgb(self.hue, self.saturation, self.value)
    }

    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_rgb();
        rgb_to_hex(r as f32, g as f32, b as f32)
    }
}

#[inline]
fn clamp_channel(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, CHANNEL_MAX)
    }
}

#[inline]
fn to_u8(x: f32) -> u8 {
    clamp_channel(x).round() as u8
}

pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> HsvColor {
    let rgb: Srgb = Srgb::new(
        clamp_channel(r) / CHANNEL_MAX,
        clamp_channel(g) / CHANNEL_MAX,
        clamp_channel(b) / CHANNEL_MAX,
    );
    let hsv: Hsv = Hsv::from_color(rgb);

    // into_positive_degrees can land on 360.0 after rounding
    let hue = hsv.hue.into_positive_degrees();
    let hue = if hue >= 360.0 { 0.0 } else { hue };

    HsvColor {
        hue,
        saturation: hsv.saturation * CHANNEL_MAX,
        value: hsv.value * CHANNEL_MAX,
    }
}

pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let hue = if h.is_finite() { h.rem_euclid(360.0) } else { 0.0 };
    let hsv: Hsv = Hsv::new(
        hue,
        clamp_channel(s) / CHANNEL_MAX,
        clamp_channel(v) / CHANNEL_MAX,
    );
    let rgb: Srgb = Srgb::from_color(hsv);

    [
        to_u8(rgb.red * CHANNEL_MAX),
        to_u8(rgb.green * CHANNEL_MAX),
        to_u8(rgb.blue * CHANNEL_MAX),
    ]
}

/// Six lowercase hex digits, no leading `#`.
pub fn rgb_to_hex(r: f32, g: f32, b: f32) -> String {
    format!("{:02x}{:02x}{:02x}", to_u8(r), to_u8(g), to_u8(b))
}
