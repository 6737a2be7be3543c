//! Disk-backed [`ArtifactSource`].

use std::io::ErrorKind;
use std::path::Path;

use linkchain_pipeline::artifact::{self, ArtifactError, ArtifactFormat};
use linkchain_pipeline::{Artifact, ArtifactSource};

/// Loads artifacts and settings files from the local filesystem.
///
/// The format is picked from the extension: `.mat`, `.pts` and `.ctr`
/// are the text interchange formats, everything else is decoded by the
/// `image` crate and converted to RGBA.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl ArtifactSource for FsSource {
    fn load(&self, path: &Path) -> Result<Artifact, ArtifactError> {
        let artifact = match ArtifactFormat::from_path(path) {
            ArtifactFormat::Raster => Artifact::Image(image::open(path)?.to_rgba8()),
            ArtifactFormat::Matrix => {
                Artifact::Image(artifact::parse_matrix(&std::fs::read_to_string(path)?)?)
            }
            ArtifactFormat::Points => {
                Artifact::Points(artifact::parse_points(&std::fs::read_to_string(path)?)?)
            }
            ArtifactFormat::Contours => {
                Artifact::Contours(artifact::parse_contours(&std::fs::read_to_string(path)?)?)
            }
        };
        tracing::debug!(path = %path.display(), kind = ?artifact.kind(), "loaded artifact");
        Ok(artifact)
    }

    fn read_settings(&self, path: &Path) -> std::io::Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}
