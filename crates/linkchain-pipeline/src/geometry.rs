//! Point statistics and circle fitting used by the classifier stages.

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// A fitted circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Circle centre.
    pub center: Point,
    /// Circle radius in pixels.
    pub radius: f64,
}

/// Arithmetic mean of the points, or `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

/// Mean of the x coordinates.
#[must_use]
pub fn mean_x(points: &[Point]) -> Option<f64> {
    centroid(points).map(|c| c.x)
}

/// Median of the x coordinates (average of the two middle values for an
/// even count).
#[must_use]
pub fn median_x(points: &[Point]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }
    let mut xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    xs.sort_by(f64::total_cmp);
    let mid = xs.len() / 2;
    if xs.len() % 2 == 1 {
        Some(xs[mid])
    } else {
        Some(f64::midpoint(xs[mid - 1], xs[mid]))
    }
}

/// Algebraic least-squares circle fit (Kasa).
///
/// Coordinates are centred on the centroid before solving the 2x2 normal
/// equations. Returns `None` for fewer than three points or collinear
/// input.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::similar_names)]
pub fn fit_circle(points: &[Point]) -> Option<Circle> {
    if points.len() < 3 {
        return None;
    }
    let mean = centroid(points)?;
    let n = points.len() as f64;

    let (mut suu, mut suv, mut svv) = (0.0, 0.0, 0.0);
    let (mut suuu, mut svvv, mut suvv, mut svuu) = (0.0, 0.0, 0.0, 0.0);
    for p in points {
        let u = p.x - mean.x;
        let v = p.y - mean.y;
        suu += u * u;
        suv += u * v;
        svv += v * v;
        suuu += u * u * u;
        svvv += v * v * v;
        suvv += u * v * v;
        svuu += v * u * u;
    }

    let det = suu.mul_add(svv, -(suv * suv));
    if det.abs() < 1e-9 {
        return None;
    }
    let b1 = (suuu + suvv) / 2.0;
    let b2 = (svvv + svuu) / 2.0;
    let uc = b1.mul_add(svv, -(b2 * suv)) / det;
    let vc = suu.mul_add(b2, -(suv * b1)) / det;
    let radius = (uc.mul_add(uc, vc * vc) + (suu + svv) / n).sqrt();

    Some(Circle {
        center: Point::new(mean.x + uc, mean.y + vc),
        radius,
    })
}

/// Spread of the point-to-centre distances relative to the radius.
///
/// `0.0` for points lying exactly on the circle. Uses the population
/// standard deviation.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn roundness(points: &[Point], circle: Circle) -> f64 {
    if points.is_empty() || circle.radius <= 0.0 {
        return f64::INFINITY;
    }
    let n = points.len() as f64;
    let distances: Vec<f64> = points.iter().map(|p| p.distance(circle.center)).collect();
    let mean = distances.iter().sum::<f64>() / n;
    let variance = distances
        .iter()
        .map(|d| (d - mean) * (d - mean))
        .sum::<f64>()
        / n;
    variance.sqrt() / circle.radius
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn circle_points(cx: f64, cy: f64, r: f64, count: usize) -> Vec<Point> {
        (0..count)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = std::f64::consts::TAU * i as f64 / count as f64;
                Point::new(r.mul_add(t.cos(), cx), r.mul_add(t.sin(), cy))
            })
            .collect()
    }

    #[test]
    fn centroid_of_empty_is_none() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn centroid_is_mean() {
        let c = centroid(&[Point::new(0.0, 0.0), Point::new(4.0, 2.0)]).unwrap();
        assert_eq!(c, Point::new(2.0, 1.0));
    }

    #[test]
    fn median_odd_and_even() {
        let odd = [
            Point::new(5.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(3.0, 0.0),
        ];
        assert!((median_x(&odd).unwrap() - 3.0).abs() < f64::EPSILON);
        let even = [
            Point::new(4.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
        ];
        assert!((median_x(&even).unwrap() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn fits_exact_circle() {
        let points = circle_points(30.0, -12.0, 7.5, 24);
        let circle = fit_circle(&points).unwrap();
        assert!((circle.center.x - 30.0).abs() < 1e-6);
        assert!((circle.center.y + 12.0).abs() < 1e-6);
        assert!((circle.radius - 7.5).abs() < 1e-6);
        assert!(roundness(&points, circle) < 1e-6);
    }

    #[test]
    fn collinear_points_do_not_fit() {
        let points: Vec<_> = (0..5).map(|i| Point::new(f64::from(i), 0.0)).collect();
        assert!(fit_circle(&points).is_none());
    }

    #[test]
    fn too_few_points_do_not_fit() {
        assert!(fit_circle(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).is_none());
    }

    #[test]
    fn square_outline_is_not_round() {
        let points = [
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
            Point::new(-1.0, 1.0),
            Point::new(-1.0, 0.0),
            Point::new(-1.0, -1.0),
            Point::new(0.0, -1.0),
            Point::new(1.0, -1.0),
        ];
        let circle = fit_circle(&points).unwrap();
        assert!(circle.center.distance(Point::new(0.0, 0.0)) < 1e-9);
        let r = roundness(&points, circle);
        assert!(r > 0.15 && r < 0.2, "roundness {r}");
    }
}
