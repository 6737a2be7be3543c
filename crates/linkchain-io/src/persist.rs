//! Saving and loading stage, chain and join files.
//!
//! A failed save never changes the in-memory value: the new file path is
//! only adopted once the write succeeded.

use std::path::{Path, PathBuf};

use linkchain_export::ChainEmission;
use linkchain_pipeline::{
    ArtifactSource, Chain, JoinChain, SettingsMap, Stage, StageConfig, StageError,
};

use crate::write::{SaveError, write_text};

/// Errors that can occur while loading a file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Source path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The stage settings name no usable kind.
    #[error(transparent)]
    Stage(#[from] StageError),
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Instantiate a stage from an optional settings file overlaid with
/// `overrides`.
///
/// A stage opened from a file without a `LINK_FILE` entry remembers that
/// file as its settings path.
///
/// # Errors
///
/// Returns [`LoadError::Read`] if `path` cannot be read and
/// [`LoadError::Stage`] if the merged settings have no usable `TYPE`.
pub fn open_stage(
    path: Option<&Path>,
    overrides: &SettingsMap,
    source: &dyn ArtifactSource,
) -> Result<Stage, LoadError> {
    let mut config = match path {
        Some(path) => StageConfig::parse(&read(path)?),
        None => StageConfig::default(),
    };
    config.overlay(overrides);

    let mut stage = Stage::instantiate(config, source)?;
    if let Some(path) = path
        && stage.link_file().is_none()
    {
        stage.set_link_file(Some(path.to_path_buf()));
    }
    tracing::info!(
        kind = %stage.kind(),
        corrections = stage.corrections().len(),
        "opened stage"
    );
    Ok(stage)
}

/// Write the stage settings file to `path` and make it the stage's
/// `LINK_FILE`.
///
/// # Errors
///
/// Returns [`SaveError`] if the file cannot be written; the stage keeps
/// its previous settings path.
pub fn save_stage(stage: &mut Stage, path: &Path) -> Result<(), SaveError> {
    let previous = stage.set_link_file(Some(path.to_path_buf()));
    match write_text(path, &stage.to_settings_text()) {
        Ok(()) => {
            tracing::info!(path = %path.display(), kind = %stage.kind(), "saved stage settings");
            Ok(())
        }
        Err(err) => {
            stage.set_link_file(previous);
            tracing::warn!(%err, "stage settings not saved");
            Err(err)
        }
    }
}

/// Load a chain file. Stages are not instantiated.
///
/// # Errors
///
/// Returns [`LoadError::Read`] if the file cannot be read.
pub fn load_chain(path: &Path) -> Result<Chain, LoadError> {
    let chain = Chain::parse(&read(path)?, path);
    tracing::info!(path = %path.display(), stages = chain.len(), "loaded chain");
    Ok(chain)
}

/// Write the chain file to `path` and make it the chain's file.
///
/// # Errors
///
/// Returns [`SaveError`] if the file cannot be written; the chain is left
/// unchanged.
pub fn save_chain(chain: &mut Chain, path: &Path) -> Result<(), SaveError> {
    let mut saved = chain.clone();
    saved.set_file(path);
    write_text(path, &saved.to_settings_text())
        .inspect_err(|err| tracing::warn!(%err, "chain not saved"))?;
    tracing::info!(path = %path.display(), stages = saved.len(), "saved chain");
    *chain = saved;
    Ok(())
}

/// Load a join file. Stages are not instantiated and keys are not checked.
///
/// # Errors
///
/// Returns [`LoadError::Read`] if the file cannot be read.
pub fn load_join(path: &Path) -> Result<JoinChain, LoadError> {
    let join = JoinChain::parse(&read(path)?, path);
    tracing::info!(
        path = %path.display(),
        sources = join.sources().len(),
        stages = join.chain().len(),
        "loaded join chain"
    );
    Ok(join)
}

/// Write the join file to `path` and make it the join chain's file.
///
/// # Errors
///
/// Returns [`SaveError`] if the file cannot be written; the join chain is
/// left unchanged.
pub fn save_join(join: &mut JoinChain, path: &Path) -> Result<(), SaveError> {
    let mut saved = join.clone();
    saved.set_file(path);
    write_text(path, &saved.to_settings_text())
        .inspect_err(|err| tracing::warn!(%err, "join chain not saved"))?;
    tracing::info!(path = %path.display(), sources = saved.sources().len(), "saved join chain");
    *join = saved;
    Ok(())
}

/// Write generated source to `path`.
///
/// # Errors
///
/// Returns [`SaveError`] if the file cannot be written.
pub fn save_emission(emission: &ChainEmission, path: &Path) -> Result<(), SaveError> {
    write_text(path, &emission.render())?;
    tracing::info!(path = %path.display(), methods = emission.methods.len(), "exported source");
    Ok(())
}
