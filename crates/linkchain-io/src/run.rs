//! Resolve a chain against the filesystem and write every result.

use linkchain_pipeline::{Chain, JoinChain, Resolution};

use crate::source::FsSource;
use crate::write::{SaveError, write_artifact, write_text};

/// Write each resolved stage's output artifact and settings file.
///
/// Stages without an output path or settings path skip that file.
///
/// # Errors
///
/// Returns the first [`SaveError`]; files written before it stay on disk.
pub fn write_resolution(resolution: &Resolution) -> Result<(), SaveError> {
    for stage in &resolution.stages {
        if let Some(path) = stage.output_path() {
            write_artifact(path, stage.output())?;
        }
        if let Some(path) = stage.link_file() {
            write_text(path, &stage.to_settings_text())?;
        }
        tracing::info!(
            kind = %stage.kind(),
            output = ?stage.output_path(),
            class = ?stage.class_index(),
            "stage written"
        );
    }
    Ok(())
}

/// Resolve `chain` from disk and write the results.
///
/// A partial resolution still writes the stages before the failure; the
/// failure is reported in the returned [`Resolution`].
///
/// # Errors
///
/// Returns [`SaveError`] if an output or settings file cannot be written.
pub fn run_chain(chain: &Chain) -> Result<Resolution, SaveError> {
    let resolution = chain.resolve(&FsSource);
    write_resolution(&resolution)?;
    Ok(resolution)
}

/// Resolve `join` from disk and write the results.
///
/// # Errors
///
/// Returns [`SaveError`] if an output or settings file cannot be written.
pub fn run_join(join: &JoinChain) -> Result<Resolution, SaveError> {
    let resolution = join.resolve(&FsSource);
    write_resolution(&resolution)?;
    Ok(resolution)
}
