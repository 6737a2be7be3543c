//! Artifact conversions, placeholders and text interchange formats.
//!
//! # Conversions
//!
//! Every stage declares the shape it wants for each input. The
//! [`ToImage`], [`ToPoints`] and [`ToContours`] traits turn whatever the
//! previous stage produced into that shape. Generated source calls the
//! same traits, so exported code converts exactly like a live chain.
//!
//! # Interchange files
//!
//! - `.pts`: `<width>x<height>`, a point count `N`, then `N` lines of
//!   `<x> <y>`.
//! - `.ctr`: the same header line, then one `N` + points block per
//!   contour. A single-contour `.ctr` file is byte-identical to a `.pts`
//!   file.
//! - `.mat`: `<cols>\t<rows>`, then one line per pixel iterating columns
//!   outer and rows inner, holding tab-separated channel values.
//!
//! Readers never return partial data: any malformed header or missing
//! point line fails the whole file.

use std::fmt::Write;
use std::path::Path;

use image::Rgba;
use imageproc::drawing::{draw_cross_mut, draw_line_segment_mut};

use crate::geometry;
use crate::types::{
    Artifact, ArtifactKind, Classification, Contour, ContourSet, Dimensions, Point, PointSet,
    RgbaImage,
};

/// Colour used to draw points and contours on annotated images.
pub const ANNOTATION_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Fully transparent black, used for blanked pixels.
pub const BLANK: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Errors that can occur while reading or writing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Reading or writing the file failed.
    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The raster codec rejected the data.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// A text interchange file is malformed.
    #[error("malformed artifact at line {line}: {reason}")]
    Parse {
        /// One-based line number of the offending line.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
}

impl ArtifactError {
    fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }
}

/// On-disk encoding of an artifact, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// Any raster format the `image` crate handles.
    Raster,
    /// `.mat` pixel matrix.
    Matrix,
    /// `.pts` point list.
    Points,
    /// `.ctr` contour list.
    Contours,
}

impl ArtifactFormat {
    /// Pick the format for `path`; unknown extensions are treated as raster.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("mat") => Self::Matrix,
            Some("pts") => Self::Points,
            Some("ctr") => Self::Contours,
            _ => Self::Raster,
        }
    }

    /// The artifact shape this format stores.
    #[must_use]
    pub const fn kind(self) -> ArtifactKind {
        match self {
            Self::Raster | Self::Matrix => ArtifactKind::Image,
            Self::Points => ArtifactKind::Points,
            Self::Contours => ArtifactKind::Contours,
        }
    }
}

/// Convert an artifact into a raster image.
pub trait ToImage {
    /// The artifact as an image.
    fn to_image(&self) -> RgbaImage;
}

/// Convert an artifact into a point list.
pub trait ToPoints {
    /// The artifact as points.
    fn to_points(&self) -> PointSet;
}

/// Convert an artifact into a contour list.
pub trait ToContours {
    /// The artifact as contours.
    fn to_contours(&self) -> ContourSet;
}

impl ToImage for RgbaImage {
    fn to_image(&self) -> RgbaImage {
        self.clone()
    }
}

impl ToImage for PointSet {
    fn to_image(&self) -> RgbaImage {
        let mut image = blank_image(self.dimensions);
        draw_points(&mut image, &self.points);
        image
    }
}

impl ToImage for ContourSet {
    fn to_image(&self) -> RgbaImage {
        let mut image = blank_image(self.dimensions);
        for contour in &self.contours {
            draw_closed_path(&mut image, &contour.points);
        }
        image
    }
}

impl ToImage for Classification {
    fn to_image(&self) -> RgbaImage {
        self.image.clone()
    }
}

impl ToPoints for RgbaImage {
    fn to_points(&self) -> PointSet {
        PointSet::empty(Dimensions::of(self))
    }
}

impl ToPoints for PointSet {
    fn to_points(&self) -> PointSet {
        self.clone()
    }
}

/// One point per contour: its centroid. Empty contours are skipped.
impl ToPoints for ContourSet {
    fn to_points(&self) -> PointSet {
        PointSet {
            dimensions: self.dimensions,
            points: self
                .contours
                .iter()
                .filter_map(|c| geometry::centroid(&c.points))
                .collect(),
        }
    }
}

impl ToPoints for Classification {
    fn to_points(&self) -> PointSet {
        PointSet::empty(Dimensions::of(&self.image))
    }
}

impl ToContours for RgbaImage {
    fn to_contours(&self) -> ContourSet {
        ContourSet::empty(Dimensions::of(self))
    }
}

/// A single outer contour holding every point.
impl ToContours for PointSet {
    fn to_contours(&self) -> ContourSet {
        ContourSet {
            dimensions: self.dimensions,
            contours: vec![Contour::outer(self.points.clone())],
        }
    }
}

impl ToContours for ContourSet {
    fn to_contours(&self) -> ContourSet {
        self.clone()
    }
}

impl ToContours for Classification {
    fn to_contours(&self) -> ContourSet {
        ContourSet::empty(Dimensions::of(&self.image))
    }
}

impl ToImage for Artifact {
    fn to_image(&self) -> RgbaImage {
        match self {
            Self::Image(a) => a.to_image(),
            Self::Points(a) => a.to_image(),
            Self::Contours(a) => a.to_image(),
            Self::Classification(a) => a.to_image(),
        }
    }
}

impl ToPoints for Artifact {
    fn to_points(&self) -> PointSet {
        match self {
            Self::Image(a) => a.to_points(),
            Self::Points(a) => a.to_points(),
            Self::Contours(a) => a.to_points(),
            Self::Classification(a) => a.to_points(),
        }
    }
}

impl ToContours for Artifact {
    fn to_contours(&self) -> ContourSet {
        match self {
            Self::Image(a) => a.to_contours(),
            Self::Points(a) => a.to_contours(),
            Self::Contours(a) => a.to_contours(),
            Self::Classification(a) => a.to_contours(),
        }
    }
}

/// A fully transparent image of the given size.
#[must_use]
pub fn blank_image(dimensions: Dimensions) -> RgbaImage {
    RgbaImage::from_pixel(dimensions.width, dimensions.height, BLANK)
}

/// Blank placeholder image substituted for a missing raster input.
#[must_use]
pub fn placeholder_image() -> RgbaImage {
    blank_image(Dimensions::PLACEHOLDER)
}

/// Empty placeholder substituted for a missing point input.
#[must_use]
pub const fn placeholder_points() -> PointSet {
    PointSet::empty(Dimensions::PLACEHOLDER)
}

/// Empty placeholder substituted for a missing contour input.
#[must_use]
pub const fn placeholder_contours() -> ContourSet {
    ContourSet::empty(Dimensions::PLACEHOLDER)
}

/// Placeholder artifact of the given shape.
#[must_use]
pub fn placeholder(kind: ArtifactKind) -> Artifact {
    match kind {
        ArtifactKind::Image => Artifact::Image(placeholder_image()),
        ArtifactKind::Points => Artifact::Points(placeholder_points()),
        ArtifactKind::Contours => Artifact::Contours(placeholder_contours()),
        ArtifactKind::Classification => Artifact::Classification(Classification {
            index: 0,
            image: placeholder_image(),
        }),
    }
}

/// Convert an artifact to the given shape.
#[must_use]
pub fn convert(artifact: &Artifact, kind: ArtifactKind) -> Artifact {
    match kind {
        ArtifactKind::Image => Artifact::Image(artifact.to_image()),
        ArtifactKind::Points => Artifact::Points(artifact.to_points()),
        ArtifactKind::Contours => Artifact::Contours(artifact.to_contours()),
        ArtifactKind::Classification => artifact.clone(),
    }
}

/// Draw a cross at each point.
#[allow(clippy::cast_possible_truncation)]
pub fn draw_points(image: &mut RgbaImage, points: &[Point]) {
    for p in points {
        draw_cross_mut(image, ANNOTATION_COLOR, p.x.round() as i32, p.y.round() as i32);
    }
}

/// Draw a closed polygon through the points.
#[allow(clippy::cast_possible_truncation)]
pub fn draw_closed_path(image: &mut RgbaImage, points: &[Point]) {
    let Some(first) = points.first() else {
        return;
    };
    for pair in points.windows(2) {
        draw_line_segment_mut(
            image,
            (pair[0].x as f32, pair[0].y as f32),
            (pair[1].x as f32, pair[1].y as f32),
            ANNOTATION_COLOR,
        );
    }
    if let Some(last) = points.last() {
        draw_line_segment_mut(
            image,
            (last.x as f32, last.y as f32),
            (first.x as f32, first.y as f32),
            ANNOTATION_COLOR,
        );
    }
}

// ───────────────────────── Point / contour files ──────────────────────

/// Serialize a point list as a `.pts` file.
#[must_use]
pub fn format_points(set: &PointSet) -> String {
    let mut out = String::new();
    write_header(&mut out, set.dimensions);
    write_block(&mut out, &set.points);
    out
}

/// Serialize a contour list as a `.ctr` file.
#[must_use]
pub fn format_contours(set: &ContourSet) -> String {
    let mut out = String::new();
    write_header(&mut out, set.dimensions);
    for contour in &set.contours {
        write_block(&mut out, &contour.points);
    }
    out
}

fn write_header(out: &mut String, dimensions: Dimensions) {
    let _ = writeln!(out, "{}x{}", dimensions.width, dimensions.height);
}

fn write_block(out: &mut String, points: &[Point]) {
    let _ = writeln!(out, "{}", points.len());
    for p in points {
        let _ = writeln!(out, "{} {}", p.x, p.y);
    }
}

/// Parse a `.pts` file. Lines after the declared points are ignored.
///
/// # Errors
///
/// Returns [`ArtifactError::Parse`] if the header is not `<int>x<int>`,
/// the count is not an integer, or fewer than the declared number of
/// point lines parse.
pub fn parse_points(text: &str) -> Result<PointSet, ArtifactError> {
    let mut lines = numbered_lines(text);
    let dimensions = parse_header(&mut lines)?;
    let points = parse_block(&mut lines)?.ok_or_else(|| ArtifactError::parse(2, "missing point count"))?;
    Ok(PointSet { dimensions, points })
}

/// Parse a `.ctr` file.
///
/// # Errors
///
/// Returns [`ArtifactError::Parse`] if the header or any block is
/// malformed.
pub fn parse_contours(text: &str) -> Result<ContourSet, ArtifactError> {
    let mut lines = numbered_lines(text);
    let dimensions = parse_header(&mut lines)?;
    let mut contours = Vec::new();
    while let Some(points) = parse_block(&mut lines)? {
        contours.push(Contour::outer(points));
    }
    Ok(ContourSet {
        dimensions,
        contours,
    })
}

type Lines<'a> = std::iter::Peekable<Box<dyn Iterator<Item = (usize, &'a str)> + 'a>>;

fn numbered_lines(text: &str) -> Lines<'_> {
    let iter: Box<dyn Iterator<Item = (usize, &str)>> = Box::new(
        text.lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty()),
    );
    iter.peekable()
}

fn parse_header(lines: &mut Lines<'_>) -> Result<Dimensions, ArtifactError> {
    let (line, text) = lines
        .next()
        .ok_or_else(|| ArtifactError::parse(1, "empty file"))?;
    let parsed = text
        .split_once('x')
        .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)));
    let (width, height) =
        parsed.ok_or_else(|| ArtifactError::parse(line, format!("expected <width>x<height>, got {text:?}")))?;
    let dimensions = Dimensions { width, height };
    check_canvas(dimensions, line)?;
    Ok(dimensions)
}

/// Reject sizes whose RGBA canvas exceeds the `image` crate's default
/// allocation limit.
fn check_canvas(dimensions: Dimensions, line: usize) -> Result<usize, ArtifactError> {
    let max_alloc = image::Limits::default().max_alloc;
    usize::try_from(dimensions.width)
        .ok()
        .zip(usize::try_from(dimensions.height).ok())
        .and_then(|(w, h)| w.checked_mul(h)?.checked_mul(4))
        .filter(|bytes| max_alloc.is_none_or(|max| u64::try_from(*bytes).is_ok_and(|b| b <= max)))
        .map(|bytes| bytes / 4)
        .ok_or_else(|| {
            ArtifactError::parse(
                line,
                format!("{}x{} exceeds the image size limit", dimensions.width, dimensions.height),
            )
        })
}

/// Parse one `N` + points block; `Ok(None)` at end of input.
fn parse_block(lines: &mut Lines<'_>) -> Result<Option<Vec<Point>>, ArtifactError> {
    let Some((line, text)) = lines.next() else {
        return Ok(None);
    };
    let count: usize = text
        .parse()
        .map_err(|_| ArtifactError::parse(line, format!("expected point count, got {text:?}")))?;

    let mut points = Vec::with_capacity(count.min(lines.size_hint().1.unwrap_or(0)));
    for _ in 0..count {
        let (line, text) = lines
            .next()
            .ok_or_else(|| ArtifactError::parse(line, format!("declared {count} points, found {}", points.len())))?;
        points.push(parse_point(text).ok_or_else(|| {
            ArtifactError::parse(line, format!("expected \"<x> <y>\", got {text:?}"))
        })?);
    }
    Ok(Some(points))
}

fn parse_point(text: &str) -> Option<Point> {
    let mut fields = text.split_whitespace();
    let x = fields.next()?.parse().ok()?;
    let y = fields.next()?.parse().ok()?;
    fields.next().is_none().then_some(Point::new(x, y))
}

// ───────────────────────── Matrix files ───────────────────────────────

/// Serialize an image as a `.mat` file (RGBA channels).
#[must_use]
pub fn format_matrix(image: &RgbaImage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\t{}", image.width(), image.height());
    for x in 0..image.width() {
        for y in 0..image.height() {
            let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
            let _ = writeln!(out, "{r}\t{g}\t{b}\t{a}");
        }
    }
    out
}

/// Parse a `.mat` file holding 1 (gray), 3 (RGB) or 4 (RGBA) channels
/// per pixel line.
///
/// # Errors
///
/// Returns [`ArtifactError::Parse`] for a malformed header, a channel
/// value outside `[0, 255]`, an unsupported channel count, or too few
/// pixel lines.
pub fn parse_matrix(text: &str) -> Result<RgbaImage, ArtifactError> {
    let mut lines = numbered_lines(text);
    let (line, header) = lines
        .next()
        .ok_or_else(|| ArtifactError::parse(1, "empty file"))?;
    let mut fields = header.split('\t').map(str::trim);
    let cols: u32 = parse_field(fields.next(), line, "column count")?;
    let rows: u32 = parse_field(fields.next(), line, "row count")?;

    let pixels = check_canvas(Dimensions { width: cols, height: rows }, line)?;
    let available = text.lines().skip(line).filter(|l| !l.trim().is_empty()).count();
    if available < pixels {
        return Err(ArtifactError::parse(
            line,
            format!("expected {pixels} pixel lines, found {available}"),
        ));
    }

    let mut image = RgbaImage::new(cols, rows);
    for x in 0..cols {
        for y in 0..rows {
            let (line, text) = lines
                .next()
                .ok_or_else(|| ArtifactError::parse(line, format!("expected {pixels} pixel lines")))?;
            let channels = text
                .split('\t')
                .map(|v| v.trim().parse::<u8>())
                .collect::<Result<Vec<u8>, _>>()
                .map_err(|_| ArtifactError::parse(line, format!("invalid channel values {text:?}")))?;
            let pixel = match channels.as_slice() {
                [v] => Rgba([*v, *v, *v, 255]),
                [r, g, b] => Rgba([*r, *g, *b, 255]),
                [r, g, b, a] => Rgba([*r, *g, *b, *a]),
                _ => {
                    return Err(ArtifactError::parse(
                        line,
                        format!("expected 1, 3 or 4 channels, got {}", channels.len()),
                    ));
                }
            };
            image.put_pixel(x, y, pixel);
        }
    }
    Ok(image)
}

fn parse_field<T: std::str::FromStr>(
    field: Option<&str>,
    line: usize,
    what: &str,
) -> Result<T, ArtifactError> {
    field
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| ArtifactError::parse(line, format!("missing or invalid {what}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn format_is_chosen_by_extension() {
        assert_eq!(ArtifactFormat::from_path(Path::new("a.PNG")), ArtifactFormat::Raster);
        assert_eq!(ArtifactFormat::from_path(Path::new("a.mat")), ArtifactFormat::Matrix);
        assert_eq!(ArtifactFormat::from_path(Path::new("a.pts")), ArtifactFormat::Points);
        assert_eq!(ArtifactFormat::from_path(Path::new("dir/a.ctr")), ArtifactFormat::Contours);
        assert_eq!(ArtifactFormat::from_path(Path::new("noext")), ArtifactFormat::Raster);
        assert_eq!(ArtifactFormat::Contours.kind(), ArtifactKind::Contours);
    }

    #[test]
    fn points_file_layout() {
        let set = PointSet {
            dimensions: dims(640, 480),
            points: vec![Point::new(1.5, 2.0), Point::new(-3.0, 4.25)],
        };
        assert_eq!(format_points(&set), "640x480\n2\n1.5 2\n-3 4.25\n");
        assert_eq!(parse_points(&format_points(&set)).unwrap(), set);
    }

    #[test]
    fn points_bad_header_fails() {
        let err = parse_points("640 by 480\n1\n0 0\n").unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { line: 1, .. }), "{err}");
        assert!(parse_points("640x\n0\n").is_err());
        assert!(parse_points("").is_err());
    }

    #[test]
    fn points_short_file_fails_without_partial_data() {
        let result = parse_points("10x10\n3\n1 1\n2 2\n");
        assert!(matches!(result, Err(ArtifactError::Parse { .. })));
    }

    #[test]
    fn points_unparseable_line_fails() {
        assert!(parse_points("10x10\n2\n1 1\nfoo bar\n").is_err());
        assert!(parse_points("10x10\n1\n1 1 1\n").is_err());
        assert!(parse_points("10x10\nmany\n").is_err());
    }

    #[test]
    fn oversized_point_count_fails_cleanly() {
        let text = "10x10\n1000000000000000000\n1 1\n";
        assert!(matches!(parse_points(text), Err(ArtifactError::Parse { .. })));
        assert!(matches!(parse_contours(text), Err(ArtifactError::Parse { .. })));
    }

    #[test]
    fn oversized_header_fails_cleanly() {
        let err = parse_points("4294967295x4294967295\n0\n").unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { line: 1, .. }), "{err}");
        assert!(parse_contours("4294967295x4294967295\n").is_err());
    }

    #[test]
    fn points_missing_count_fails() {
        assert!(parse_points("10x10\n").is_err());
    }

    #[test]
    fn contours_file_has_one_block_per_contour() {
        let set = ContourSet {
            dimensions: dims(8, 8),
            contours: vec![
                Contour::outer(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]),
                Contour::outer(vec![Point::new(5.0, 5.0)]),
            ],
        };
        let text = format_contours(&set);
        assert_eq!(text, "8x8\n2\n0 0\n1 0\n1\n5 5\n");
        assert_eq!(parse_contours(&text).unwrap(), set);
    }

    #[test]
    fn empty_contour_set_keeps_dimensions() {
        let set = ContourSet::empty(dims(3, 4));
        let parsed = parse_contours(&format_contours(&set)).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn truncated_contour_block_fails() {
        assert!(parse_contours("8x8\n2\n0 0\n1 0\n3\n5 5\n").is_err());
    }

    #[test]
    fn single_contour_file_reads_as_points() {
        let text = "4x4\n2\n1 1\n2 2\n";
        let points = parse_points(text).unwrap();
        let contours = parse_contours(text).unwrap();
        assert_eq!(contours.contours[0].points, points.points);
    }

    #[test]
    fn matrix_iterates_columns_then_rows() {
        let mut image = RgbaImage::new(2, 3);
        image.put_pixel(1, 0, Rgba([9, 8, 7, 255]));
        let text = format_matrix(&image);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "2\t3");
        assert_eq!(lines.len(), 1 + 6);
        // Column 0 occupies lines 1..=3, so pixel (1, 0) is line 4.
        assert_eq!(lines[4], "9\t8\t7\t255");
        assert_eq!(parse_matrix(&text).unwrap(), image);
    }

    #[test]
    fn matrix_accepts_gray_and_rgb_channels() {
        let image = parse_matrix("1\t2\n100\n1\t2\t3\n").unwrap();
        assert_eq!(*image.get_pixel(0, 0), Rgba([100, 100, 100, 255]));
        assert_eq!(*image.get_pixel(0, 1), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn matrix_rejects_out_of_range_and_short_input() {
        assert!(parse_matrix("1\t1\n256\n").is_err());
        assert!(parse_matrix("1\t2\n0\n").is_err());
        assert!(parse_matrix("1\t1\n1\t2\n").is_err());
        assert!(parse_matrix("x\t1\n").is_err());
    }

    #[test]
    fn matrix_with_oversized_header_fails_cleanly() {
        let err = parse_matrix("4294967295\t4294967295\n0\n").unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { line: 1, .. }), "{err}");
        let err = parse_matrix("1000\t1000\n0\n").unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { line: 1, .. }), "{err}");
    }

    #[test]
    fn contours_convert_to_centroids() {
        let set = ContourSet {
            dimensions: dims(10, 10),
            contours: vec![
                Contour::outer(vec![Point::new(0.0, 0.0), Point::new(2.0, 2.0)]),
                Contour::outer(vec![]),
                Contour::outer(vec![Point::new(5.0, 5.0)]),
            ],
        };
        let points = set.to_points();
        assert_eq!(points.points, vec![Point::new(1.0, 1.0), Point::new(5.0, 5.0)]);
        assert_eq!(points.dimensions, dims(10, 10));
    }

    #[test]
    fn points_convert_to_single_contour() {
        let set = PointSet {
            dimensions: dims(4, 4),
            points: vec![Point::new(1.0, 1.0), Point::new(2.0, 1.0)],
        };
        let contours = set.to_contours();
        assert_eq!(contours.contours.len(), 1);
        assert_eq!(contours.contours[0].points, set.points);
    }

    #[test]
    fn images_convert_to_empty_vectors() {
        let image = RgbaImage::new(12, 7);
        assert!(image.to_points().points.is_empty());
        assert_eq!(image.to_contours().dimensions, dims(12, 7));
    }

    #[test]
    fn points_render_on_blank_canvas() {
        let set = PointSet {
            dimensions: dims(9, 9),
            points: vec![Point::new(4.0, 4.0)],
        };
        let image = set.to_image();
        assert_eq!(image.dimensions(), (9, 9));
        assert_eq!(*image.get_pixel(4, 4), ANNOTATION_COLOR);
        assert_eq!(*image.get_pixel(0, 0), BLANK);
    }

    #[test]
    fn points_draw_as_crosses() {
        let mut image = blank_image(dims(9, 9));
        draw_points(&mut image, &[Point::new(4.2, 3.8), Point::new(0.0, 0.0)]);
        for (x, y) in [(4, 4), (3, 4), (5, 4), (4, 3), (4, 5), (0, 0), (1, 0), (0, 1)] {
            assert_eq!(*image.get_pixel(x, y), ANNOTATION_COLOR, "({x}, {y})");
        }
        assert_eq!(*image.get_pixel(3, 3), BLANK);
    }

    #[test]
    fn placeholders_have_default_size() {
        for kind in [
            ArtifactKind::Image,
            ArtifactKind::Points,
            ArtifactKind::Contours,
            ArtifactKind::Classification,
        ] {
            let artifact = placeholder(kind);
            assert_eq!(artifact.kind(), kind);
            assert_eq!(artifact.dimensions(), Dimensions::PLACEHOLDER);
        }
    }
}
