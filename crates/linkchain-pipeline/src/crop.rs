//! Crop stage: blank every pixel outside a rectangle.
//!
//! The image keeps its size. Pixels outside `[left, right) x [top, bottom)`
//! become transparent black, so downstream stages see the same coordinate
//! space as the original input.

use serde::{Deserialize, Serialize};

use crate::artifact::BLANK;
use crate::settings::{DefaultValue, Param, Validator};
use crate::types::{Dimensions, RgbaImage};

/// Left edge of the kept rectangle (inclusive).
pub const CROP_LEFT: &str = "CROP_LEFT";
/// Right edge of the kept rectangle (exclusive).
pub const CROP_RIGHT: &str = "CROP_RIGHT";
/// Top edge of the kept rectangle (inclusive).
pub const CROP_TOP: &str = "CROP_TOP";
/// Bottom edge of the kept rectangle (exclusive).
pub const CROP_BOTTOM: &str = "CROP_BOTTOM";

/// Parameter table, in file order.
pub const PARAMS: &[Param] = &[
    Param {
        key: CROP_LEFT,
        default: DefaultValue::Literal("0"),
    },
    Param {
        key: CROP_RIGHT,
        default: DefaultValue::Width,
    },
    Param {
        key: CROP_TOP,
        default: DefaultValue::Literal("0"),
    },
    Param {
        key: CROP_BOTTOM,
        default: DefaultValue::Height,
    },
];

/// Validated crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSettings {
    /// Left edge, inclusive.
    pub left: u32,
    /// Right edge, exclusive.
    pub right: u32,
    /// Top edge, inclusive.
    pub top: u32,
    /// Bottom edge, exclusive.
    pub bottom: u32,
}

impl CropSettings {
    /// A rectangle covering the whole image.
    #[must_use]
    pub const fn full(dimensions: Dimensions) -> Self {
        Self {
            left: 0,
            right: dimensions.width,
            top: 0,
            bottom: dimensions.height,
        }
    }

    /// Returns `true` if pixel `(x, y)` survives the crop.
    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// Coerce the crop keys into the input's bounds.
pub fn validate(v: &mut Validator<'_>, dimensions: Dimensions) -> CropSettings {
    let Dimensions { width, height } = dimensions;
    let left = v.range_u32(CROP_LEFT, 0, width, 0);
    let right = v.range_u32(CROP_RIGHT, 0, width, width);
    let top = v.range_u32(CROP_TOP, 0, height, 0);
    let bottom = v.range_u32(CROP_BOTTOM, 0, height, height);
    CropSettings {
        left: v.at_most(CROP_LEFT, left, right),
        right,
        top: v.at_most(CROP_TOP, top, bottom),
        bottom,
    }
}

/// Blank every pixel outside the crop rectangle.
#[must_use]
pub fn apply(image: &RgbaImage, settings: &CropSettings) -> RgbaImage {
    let mut out = image.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if !settings.contains(x, y) {
            *pixel = BLANK;
        }
    }
    out
}
