//! Threshold stage: HSV in-range mask.
//!
//! Uses the 8-bit HSV convention: hue is halved into `0..=179`,
//! saturation and value span `0..=255`. Output pixels are opaque white
//! where all three channels fall inside their ranges and opaque black
//! elsewhere. Fully transparent input pixels (for example blanked by a
//! crop) are always black, with or without inversion.

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::settings::{DefaultValue, Param, Validator};
use crate::types::RgbaImage;

/// Lowest accepted hue.
pub const HUE_MIN: &str = "HUE_MIN";
/// Highest accepted hue.
pub const HUE_MAX: &str = "HUE_MAX";
/// Lowest accepted saturation.
pub const SAT_MIN: &str = "SAT_MIN";
/// Highest accepted saturation.
pub const SAT_MAX: &str = "SAT_MAX";
/// Lowest accepted value.
pub const VAL_MIN: &str = "VAL_MIN";
/// Highest accepted value.
pub const VAL_MAX: &str = "VAL_MAX";
/// Swap the in-range and out-of-range colours.
pub const INVERT: &str = "INVERT";

/// Largest hue in the 8-bit convention.
pub const HUE_LIMIT: u8 = 179;

const MASK_ON: Rgba<u8> = Rgba([255, 255, 255, 255]);
const MASK_OFF: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Parameter table, in file order.
pub const PARAMS: &[Param] = &[
    Param {
        key: HUE_MIN,
        default: DefaultValue::Literal("0"),
    },
    Param {
        key: HUE_MAX,
        default: DefaultValue::Literal("179"),
    },
    Param {
        key: SAT_MIN,
        default: DefaultValue::Literal("0"),
    },
    Param {
        key: SAT_MAX,
        default: DefaultValue::Literal("255"),
    },
    Param {
        key: VAL_MIN,
        default: DefaultValue::Literal("0"),
    },
    Param {
        key: VAL_MAX,
        default: DefaultValue::Literal("255"),
    },
    Param {
        key: INVERT,
        default: DefaultValue::Literal("false"),
    },
];

/// Validated HSV window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSettings {
    /// Lowest accepted hue, `0..=179`.
    pub hue_min: u8,
    /// Highest accepted hue, `0..=179`.
    pub hue_max: u8,
    /// Lowest accepted saturation.
    pub sat_min: u8,
    /// Highest accepted saturation.
    pub sat_max: u8,
    /// Lowest accepted value.
    pub val_min: u8,
    /// Highest accepted value.
    pub val_max: u8,
    /// Emit white for out-of-range pixels instead.
    pub invert: bool,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            hue_min: 0,
            hue_max: HUE_LIMIT,
            sat_min: 0,
            sat_max: u8::MAX,
            val_min: 0,
            val_max: u8::MAX,
            invert: false,
        }
    }
}

impl ThresholdSettings {
    /// Returns `true` if the HSV triple lies inside the window.
    #[must_use]
    pub const fn accepts(&self, [h, s, v]: [u8; 3]) -> bool {
        h >= self.hue_min
            && h <= self.hue_max
            && s >= self.sat_min
            && s <= self.sat_max
            && v >= self.val_min
            && v <= self.val_max
    }
}

/// Coerce the threshold keys into the 8-bit HSV domain.
pub fn validate(v: &mut Validator<'_>) -> ThresholdSettings {
    let hue_min = v.range_u8(HUE_MIN, 0, HUE_LIMIT, 0);
    let hue_max = v.range_u8(HUE_MAX, 0, HUE_LIMIT, HUE_LIMIT);
    let sat_min = v.range_u8(SAT_MIN, 0, u8::MAX, 0);
    let sat_max = v.range_u8(SAT_MAX, 0, u8::MAX, u8::MAX);
    let val_min = v.range_u8(VAL_MIN, 0, u8::MAX, 0);
    let val_max = v.range_u8(VAL_MAX, 0, u8::MAX, u8::MAX);
    let invert = v.flag(INVERT, false);
    ThresholdSettings {
        hue_min: v.at_most(HUE_MIN, hue_min, hue_max),
        hue_max,
        sat_min: v.at_most(SAT_MIN, sat_min, sat_max),
        sat_max,
        val_min: v.at_most(VAL_MIN, val_min, val_max),
        val_max,
        invert,
    }
}

/// Convert an RGB triple to 8-bit HSV (hue halved into `0..=179`).
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = f32::from(max - min);

    let s = if max == 0 {
        0
    } else {
        (255.0 * delta / f32::from(max)).round() as u8
    };
    if max == min {
        return [0, s, max];
    }

    let [rf, gf, bf] = [r, g, b].map(f32::from);
    let mut degrees = if max == r {
        60.0 * (gf - bf) / delta
    } else if max == g {
        60.0f32.mul_add((bf - rf) / delta, 120.0)
    } else {
        60.0f32.mul_add((rf - gf) / delta, 240.0)
    };
    if degrees < 0.0 {
        degrees += 360.0;
    }
    let h = (degrees / 2.0).round() as u8;
    [if h > HUE_LIMIT { 0 } else { h }, s, max]
}

/// Build the in-range mask of `image`.
#[must_use]
pub fn apply(image: &RgbaImage, settings: &ThresholdSettings) -> RgbaImage {
    let mut out = RgbaImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        let Rgba([r, g, b, a]) = *src;
        let on = a != 0 && (settings.accepts(rgb_to_hsv([r, g, b])) != settings.invert);
        *dst = if on { MASK_ON } else { MASK_OFF };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsMap;

    #[test]
    fn primary_colours_convert() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
    }

    #[test]
    fn magenta_wraps_below_limit() {
        let [h, _, _] = rgb_to_hsv([255, 0, 255]);
        assert_eq!(h, 150);
        let [h, _, _] = rgb_to_hsv([255, 0, 1]);
        assert!(h <= HUE_LIMIT);
    }

    #[test]
    fn mask_selects_hue_window() {
        let mut image = RgbaImage::new(3, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        image.put_pixel(2, 0, Rgba([0, 0, 255, 255]));
        let greens = ThresholdSettings {
            hue_min: 50,
            hue_max: 70,
            ..ThresholdSettings::default()
        };
        let mask = apply(&image, &greens);
        assert_eq!(*mask.get_pixel(0, 0), MASK_OFF);
        assert_eq!(*mask.get_pixel(1, 0), MASK_ON);
        assert_eq!(*mask.get_pixel(2, 0), MASK_OFF);

        let inverted = apply(
            &image,
            &ThresholdSettings {
                invert: true,
                ..greens
            },
        );
        assert_eq!(*inverted.get_pixel(0, 0), MASK_ON);
        assert_eq!(*inverted.get_pixel(1, 0), MASK_OFF);
    }

    #[test]
    fn transparent_pixels_stay_off() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let everything = ThresholdSettings::default();
        assert!(apply(&image, &everything).pixels().all(|p| *p == MASK_OFF));
        let inverted = ThresholdSettings {
            invert: true,
            ..everything
        };
        assert!(apply(&image, &inverted).pixels().all(|p| *p == MASK_OFF));
    }

    #[test]
    fn validate_falls_back_hue_and_orders_pairs() {
        let mut map: SettingsMap = [
            (HUE_MIN, "100"),
            (HUE_MAX, "200"),
            (SAT_MIN, "90"),
            (SAT_MAX, "40"),
            (INVERT, "yes"),
        ]
        .into_iter()
        .collect();
        let mut v = Validator::new(&mut map);
        let settings = validate(&mut v);
        assert_eq!(settings.hue_max, HUE_LIMIT);
        assert_eq!(settings.hue_min, 100);
        assert_eq!(settings.sat_min, 40);
        assert!(!settings.invert);
        assert_eq!(map.get(SAT_MIN), Some("40"));
        assert_eq!(map.get(VAL_MAX), Some("255"));
    }
}
