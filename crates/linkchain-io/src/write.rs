//! Writing artifacts and settings text to disk.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use linkchain_pipeline::artifact::{self, ArtifactFormat};
use linkchain_pipeline::{Artifact, ToContours, ToImage, ToPoints};

/// Errors that can occur while writing a file.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The file or its parent directory could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The raster encoder rejected the image or the extension.
    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: image::ImageError,
    },
}

impl SaveError {
    /// Path that could not be written.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Write { path, .. } | Self::Encode { path, .. } => path,
        }
    }
}

fn create_parent(path: &Path) -> Result<(), SaveError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|source| SaveError::Write {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Write `text` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`SaveError::Write`] if the directory or file cannot be written.
pub fn write_text(path: &Path, text: &str) -> Result<(), SaveError> {
    create_parent(path)?;
    std::fs::write(path, text).map_err(|source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write an artifact in the format its extension selects.
///
/// Artifacts are converted to the shape the format stores: a
/// classification written to `.png` stores its annotated image, contours
/// written to `.pts` store their points, and so on. JPEG has no alpha
/// channel, so images are flattened to RGB for it.
///
/// # Errors
///
/// Returns [`SaveError`] if the file cannot be written or encoded.
pub fn write_artifact(path: &Path, artifact: &Artifact) -> Result<(), SaveError> {
    match ArtifactFormat::from_path(path) {
        ArtifactFormat::Raster => {
            create_parent(path)?;
            let image = artifact.to_image();
            let encoded = match ImageFormat::from_path(path) {
                Ok(ImageFormat::Jpeg) => DynamicImage::ImageRgba8(image).to_rgb8().save(path),
                _ => image.save(path),
            };
            encoded.map_err(|source| SaveError::Encode {
                path: path.to_path_buf(),
                source,
            })?;
        }
        ArtifactFormat::Matrix => write_text(path, &artifact::format_matrix(&artifact.to_image()))?,
        ArtifactFormat::Points => write_text(path, &artifact::format_points(&artifact.to_points()))?,
        ArtifactFormat::Contours => {
            write_text(path, &artifact::format_contours(&artifact.to_contours()))?;
        }
    }
    tracing::debug!(path = %path.display(), kind = ?artifact.kind(), "wrote artifact");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;
    use linkchain_pipeline::{ArtifactSource, Dimensions, Point, PointSet, RgbaImage};
    use tempfile::TempDir;

    use super::*;
    use crate::source::FsSource;

    fn image() -> Artifact {
        let mut image = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        image.put_pixel(1, 2, Rgba([1, 2, 3, 4]));
        Artifact::Image(image)
    }

    #[test]
    fn png_and_matrix_keep_pixels() {
        let dir = TempDir::new().unwrap();
        for name in ["out.png", "out.mat"] {
            let path = dir.path().join(name);
            write_artifact(&path, &image()).unwrap();
            let Artifact::Image(loaded) = FsSource.load(&path).unwrap() else {
                unreachable!()
            };
            assert_eq!(loaded.get_pixel(1, 2).0, [1, 2, 3, 4], "{name}");
            assert_eq!(loaded.get_pixel(0, 0).0, [10, 20, 30, 255], "{name}");
        }
    }

    #[test]
    fn jpeg_is_written_without_alpha() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jpg");
        write_artifact(&path, &image()).unwrap();
        assert_eq!(FsSource.load(&path).unwrap().dimensions(), Dimensions { width: 4, height: 3 });
    }

    #[test]
    fn points_are_written_as_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out.pts");
        let points = Artifact::Points(PointSet {
            dimensions: Dimensions { width: 8, height: 8 },
            points: vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
        });
        write_artifact(&path, &points).unwrap();
        let Artifact::Points(loaded) = FsSource.load(&path).unwrap() else {
            unreachable!()
        };
        assert_eq!(loaded.points, vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
    }

    #[test]
    fn unknown_extension_fails_to_encode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.nope");
        let err = write_artifact(&path, &image()).unwrap_err();
        assert!(matches!(err, SaveError::Encode { .. }));
        assert_eq!(err.path(), path.as_path());
    }
}
