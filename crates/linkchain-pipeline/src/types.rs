//! Shared artifact types passed between stages.

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates and generated code can
/// name raster artifacts without depending on `image` directly.
pub use image::RgbaImage;

/// Re-export `GrayImage` for single-channel intermediates.
pub use image::GrayImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Size of the blank artifact substituted for a missing input.
    pub const PLACEHOLDER: Self = Self {
        width: 640,
        height: 480,
    };

    /// Dimensions of an image.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// A point list associated with an image size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    /// Size of the image the points refer to.
    pub dimensions: Dimensions,
    /// The points, in file order.
    pub points: Vec<Point>,
}

impl PointSet {
    /// An empty point list for an image of the given size.
    #[must_use]
    pub const fn empty(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            points: Vec::new(),
        }
    }
}

/// One traced border.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    /// Border points in tracing order.
    pub points: Vec<Point>,
    /// Index of the enclosing contour, when the hierarchy is kept.
    pub parent: Option<usize>,
    /// `true` for the inner border of a hole.
    pub hole: bool,
}

impl Contour {
    /// An outer, parentless contour.
    #[must_use]
    pub const fn outer(points: Vec<Point>) -> Self {
        Self {
            points,
            parent: None,
            hole: false,
        }
    }
}

/// A contour list associated with an image size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourSet {
    /// Size of the image the contours were traced from.
    pub dimensions: Dimensions,
    /// Traced contours.
    pub contours: Vec<Contour>,
}

impl ContourSet {
    /// An empty contour list for an image of the given size.
    #[must_use]
    pub const fn empty(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            contours: Vec::new(),
        }
    }

    /// Total number of points across all contours.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.contours.iter().map(|c| c.points.len()).sum()
    }
}

/// Result of a classifier stage.
#[derive(Debug, Clone)]
pub struct Classification {
    /// Class index; `0` means "unclassified".
    pub index: u32,
    /// Input image annotated with the features the decision used.
    pub image: RgbaImage,
}

/// The shape of an artifact, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Raster image.
    Image,
    /// Point list.
    Points,
    /// Contour list.
    Contours,
    /// Classification index plus annotated image.
    Classification,
}

impl ArtifactKind {
    /// Type name used in generated source.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Image => "RgbaImage",
            Self::Points => "PointSet",
            Self::Contours => "ContourSet",
            Self::Classification => "Classification",
        }
    }
}

/// Any value a stage consumes or produces.
#[derive(Debug, Clone)]
pub enum Artifact {
    /// Raster image.
    Image(RgbaImage),
    /// Point list.
    Points(PointSet),
    /// Contour list.
    Contours(ContourSet),
    /// Classifier result.
    Classification(Classification),
}

impl Artifact {
    /// The artifact's shape.
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        match self {
            Self::Image(_) => ArtifactKind::Image,
            Self::Points(_) => ArtifactKind::Points,
            Self::Contours(_) => ArtifactKind::Contours,
            Self::Classification(_) => ArtifactKind::Classification,
        }
    }

    /// Size of the image this artifact belongs to.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        match self {
            Self::Image(image) => Dimensions::of(image),
            Self::Points(set) => set.dimensions,
            Self::Contours(set) => set.dimensions,
            Self::Classification(c) => Dimensions::of(&c.image),
        }
    }

    /// Serializable one-line description for reports.
    #[must_use]
    pub fn summary(&self) -> ArtifactSummary {
        let (items, class) = match self {
            Self::Image(_) => (None, None),
            Self::Points(set) => (Some(set.points.len()), None),
            Self::Contours(set) => (Some(set.contours.len()), None),
            Self::Classification(c) => (None, Some(c.index)),
        };
        ArtifactSummary {
            kind: self.kind(),
            dimensions: self.dimensions(),
            items,
            class,
        }
    }
}

/// Report-friendly description of an [`Artifact`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    /// Artifact shape.
    pub kind: ArtifactKind,
    /// Associated image size.
    pub dimensions: Dimensions,
    /// Number of points or contours, for vector artifacts.
    pub items: Option<usize>,
    /// Class index, for classifications.
    pub class: Option<u32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dimensions_of_image() {
        let img = RgbaImage::new(7, 3);
        assert_eq!(
            Dimensions::of(&img),
            Dimensions {
                width: 7,
                height: 3
            }
        );
    }

    #[test]
    fn contour_set_point_count() {
        let set = ContourSet {
            dimensions: Dimensions::PLACEHOLDER,
            contours: vec![
                Contour::outer(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]),
                Contour::outer(vec![Point::new(5.0, 5.0)]),
            ],
        };
        assert_eq!(set.point_count(), 3);
    }

    #[test]
    fn artifact_summary_reports_counts() {
        let points = Artifact::Points(PointSet {
            dimensions: Dimensions {
                width: 10,
                height: 20,
            },
            points: vec![Point::new(1.0, 1.0); 4],
        });
        let summary = points.summary();
        assert_eq!(summary.kind, ArtifactKind::Points);
        assert_eq!(summary.items, Some(4));
        assert_eq!(summary.class, None);
        assert_eq!(summary.dimensions.height, 20);

        let class = Artifact::Classification(Classification {
            index: 2,
            image: RgbaImage::new(3, 3),
        });
        assert_eq!(class.summary().class, Some(2));
        assert_eq!(class.dimensions(), Dimensions { width: 3, height: 3 });
    }

    #[test]
    fn summary_serializes_kind_in_snake_case() {
        let summary = Artifact::Contours(ContourSet::empty(Dimensions::PLACEHOLDER)).summary();
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"kind\":\"contours\""), "{json}");
    }
}
