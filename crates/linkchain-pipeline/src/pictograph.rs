//! Pictograph classifier: decides a class from the shape of a point list.
//!
//! | points | rule                     | class |
//! |--------|--------------------------|-------|
//! | 7      |                          | 1     |
//! | 11     | mean x < median x        | 2     |
//! | 11     | otherwise                | 3     |
//! | other  |                          | 0     |

use crate::artifact::{blank_image, draw_points};
use crate::geometry;
use crate::types::{Classification, Point, PointSet, RgbaImage};

/// Class index for a point list.
#[must_use]
pub fn class_index(points: &[Point]) -> u32 {
    match points.len() {
        7 => 1,
        11 => match (geometry::mean_x(points), geometry::median_x(points)) {
            (Some(mean), Some(median)) if mean < median => 2,
            _ => 3,
        },
        _ => 0,
    }
}

/// Classify `points`, annotating `image` (or a blank canvas) with a cross
/// at each point.
#[must_use]
pub fn classify(points: &PointSet, image: Option<&RgbaImage>) -> Classification {
    let mut annotated = image.map_or_else(|| blank_image(points.dimensions), Clone::clone);
    draw_points(&mut annotated, &points.points);
    Classification {
        index: class_index(&points.points),
        image: annotated,
    }
}
