//! Contours stage: border following on the gray-scale input.
//!
//! Non-zero gray pixels are foreground. Borders are traced with
//! `imageproc::contours::find_contours` (Suzuki-Abe), then filtered by
//! [`RetrievalMode`] and thinned by [`ApproxMethod`].

use imageproc::contours::BorderType;
use serde::{Deserialize, Serialize};

use crate::settings::{Choice, DefaultValue, Param, Validator};
use crate::types::{Contour, ContourSet, Dimensions, Point, RgbaImage};

/// Retrieval mode key.
pub const MODE: &str = "MODE";
/// Approximation method key.
pub const METHOD: &str = "METHOD";

/// Parameter table, in file order.
pub const PARAMS: &[Param] = &[
    Param {
        key: MODE,
        default: DefaultValue::Literal("EXTERNAL"),
    },
    Param {
        key: METHOD,
        default: DefaultValue::Literal("SIMPLE"),
    },
];

/// Which borders to keep, and how much hierarchy to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetrievalMode {
    /// Outermost borders only.
    #[default]
    External,
    /// Every border, no hierarchy.
    List,
    /// Two levels: outer borders as roots, holes attached to their outer border.
    Ccomp,
    /// Every border with the full nesting hierarchy.
    Tree,
}

impl Choice for RetrievalMode {
    const ALL: &'static [Self] = &[Self::External, Self::List, Self::Ccomp, Self::Tree];
    const DEFAULT: Self = Self::External;

    fn label(self) -> &'static str {
        match self {
            Self::External => "EXTERNAL",
            Self::List => "LIST",
            Self::Ccomp => "CCOMP",
            Self::Tree => "TREE",
        }
    }
}

/// How many border points to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApproxMethod {
    /// Every traced border pixel.
    None,
    /// Drop points that continue a straight run.
    #[default]
    Simple,
}

impl Choice for ApproxMethod {
    const ALL: &'static [Self] = &[Self::None, Self::Simple];
    const DEFAULT: Self = Self::Simple;

    fn label(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Simple => "SIMPLE",
        }
    }
}

/// Validated contour extraction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContourSettings {
    /// Retrieval mode.
    pub mode: RetrievalMode,
    /// Approximation method.
    pub method: ApproxMethod,
}

/// Coerce the contour keys to known labels.
pub fn validate(v: &mut Validator<'_>) -> ContourSettings {
    ContourSettings {
        mode: v.choice(MODE),
        method: v.choice(METHOD),
    }
}

/// Trace the borders of `image`.
#[must_use]
pub fn apply(image: &RgbaImage, settings: &ContourSettings) -> ContourSet {
    let gray = image::imageops::grayscale(image);
    let traced = imageproc::contours::find_contours::<u32>(&gray);

    let contours = traced
        .into_iter()
        .filter(|c| match settings.mode {
            RetrievalMode::External => c.border_type == BorderType::Outer && c.parent.is_none(),
            RetrievalMode::List | RetrievalMode::Ccomp | RetrievalMode::Tree => true,
        })
        .map(|c| {
            let hole = c.border_type == BorderType::Hole;
            let parent = match settings.mode {
                RetrievalMode::External | RetrievalMode::List => None,
                // Outer borders nested in a hole start a new component.
                RetrievalMode::Ccomp if !hole => None,
                RetrievalMode::Ccomp | RetrievalMode::Tree => c.parent,
            };
            let points: Vec<Point> = c
                .points
                .iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            let points = match settings.method {
                ApproxMethod::None => points,
                ApproxMethod::Simple => drop_collinear(&points),
            };
            Contour {
                points,
                parent,
                hole,
            }
        })
        .collect();

    ContourSet {
        dimensions: Dimensions::of(image),
        contours,
    }
}

/// Remove every point lying on a straight run between its neighbours.
///
/// The contour is treated as closed. Turnarounds (a neighbour revisited)
/// are kept.
#[must_use]
pub fn drop_collinear(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            let (ax, ay) = (cur.x - prev.x, cur.y - prev.y);
            let (bx, by) = (next.x - cur.x, next.y - cur.y);
            let cross = ax.mul_add(by, -(ay * bx));
            let dot = ax.mul_add(bx, ay * by);
            cross.abs() > f64::EPSILON || dot <= 0.0
        })
        .map(|i| points[i])
        .collect()
}
