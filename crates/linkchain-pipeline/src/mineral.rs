//! Mineral classifier: grades grain roundness from a circle fit.
//!
//! All contour points are pooled and fitted with a least-squares circle.
//! Roundness is the spread of the point-to-centre distances divided by
//! the radius.

use imageproc::drawing::draw_hollow_circle_mut;

use crate::artifact::{ANNOTATION_COLOR, blank_image, draw_closed_path};
use crate::geometry::{self, Circle};
use crate::types::{Classification, ContourSet, Point, RgbaImage};

/// Below this roundness a grain is round (class 1).
pub const ROUND_LIMIT: f64 = 0.05;
/// Below this roundness a grain is sub-rounded (class 2); above, angular (3).
pub const SUBROUNDED_LIMIT: f64 = 0.15;

/// Class index for a pooled point list; `0` when no circle fits.
#[must_use]
pub fn class_index(points: &[Point]) -> u32 {
    geometry::fit_circle(points).map_or(0, |circle| grade(geometry::roundness(points, circle)))
}

fn grade(roundness: f64) -> u32 {
    if roundness < ROUND_LIMIT {
        1
    } else if roundness < SUBROUNDED_LIMIT {
        2
    } else {
        3
    }
}

/// Classify the contours, annotating `image` (or a blank canvas) with the
/// contours and the fitted circle.
#[must_use]
pub fn classify(contours: &ContourSet, image: Option<&RgbaImage>) -> Classification {
    let points: Vec<Point> = contours
        .contours
        .iter()
        .flat_map(|c| c.points.iter().copied())
        .collect();

    let mut annotated = image.map_or_else(|| blank_image(contours.dimensions), Clone::clone);
    for contour in &contours.contours {
        draw_closed_path(&mut annotated, &contour.points);
    }

    let circle = geometry::fit_circle(&points);
    if let Some(circle) = circle {
        draw_circle(&mut annotated, circle);
    }
    let index = circle.map_or(0, |c| grade(geometry::roundness(&points, c)));
    tracing::debug!(points = points.len(), index, "classified mineral grain");

    Classification {
        index,
        image: annotated,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn draw_circle(image: &mut RgbaImage, circle: Circle) {
    let radius = circle.radius.round();
    if !radius.is_finite() || radius < 1.0 || radius > f64::from(i32::MAX) {
        return;
    }
    draw_hollow_circle_mut(
        image,
        (
            circle.center.x.round() as i32,
            circle.center.y.round() as i32,
        ),
        radius as i32,
        ANNOTATION_COLOR,
    );
}
