//! A configured stage: settings, inputs, and the published output.
//!
//! Construction never fails on bad data. Unknown keys are dropped,
//! missing or corrupt inputs become placeholders, and out-of-domain
//! values are corrected. The only hard error is a missing or unknown
//! `TYPE`.
//!
//! Input artifacts are loaded through [`ArtifactSource`] so the core stays
//! free of filesystem access; `linkchain-io` provides the disk-backed
//! implementation and [`MemorySource`] serves tests and chains.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::artifact::{self, ArtifactError};
use crate::emit::{MethodTemplate, StageEmission};
use crate::format::{Document, Style};
use crate::keys;
use crate::kind::{self, Inputs, StageKind, StageSettings};
use crate::settings::{Correction, SettingsMap};
use crate::types::{Artifact, ArtifactKind};

/// Errors that prevent a stage from being built or edited.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    /// The settings carry no `TYPE`.
    #[error("settings have no TYPE entry")]
    MissingKind,

    /// `TYPE` names no known stage kind.
    #[error(transparent)]
    UnknownKind(#[from] kind::UnknownKind),

    /// An edit targeted a key the stage does not have.
    #[error("{kind} stages have no parameter {key:?}")]
    UnknownParameter {
        /// Stage kind.
        kind: StageKind,
        /// Rejected key.
        key: String,
    },
}

/// Loads input artifacts and settings text by path.
pub trait ArtifactSource {
    /// Load the artifact stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] if the artifact is missing or malformed.
    fn load(&self, path: &Path) -> Result<Artifact, ArtifactError>;

    /// Read a settings file, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be read.
    fn read_settings(&self, path: &Path) -> std::io::Result<Option<String>>;
}

/// In-memory [`ArtifactSource`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    artifacts: HashMap<PathBuf, Artifact>,
    settings: HashMap<PathBuf, String>,
}

impl MemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact under `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, artifact: Artifact) {
        self.artifacts.insert(path.into(), artifact);
    }

    /// Register settings text under `path`.
    pub fn insert_settings(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.settings.insert(path.into(), text.into());
    }
}

impl ArtifactSource for MemorySource {
    fn load(&self, path: &Path) -> Result<Artifact, ArtifactError> {
        self.artifacts.get(path).cloned().ok_or_else(|| {
            ArtifactError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no artifact at {}", path.display()),
            ))
        })
    }

    fn read_settings(&self, path: &Path) -> std::io::Result<Option<String>> {
        Ok(self.settings.get(path).cloned())
    }
}

/// Where a stage's inputs come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StageInput {
    /// No input declared.
    #[default]
    Unset,
    /// One path, fed to the kind's primary key.
    Single(PathBuf),
    /// One path per input key.
    Keyed(IndexMap<String, PathBuf>),
}

impl StageInput {
    /// Read `IMAGE_IN` or the `<JOIN_INPUT>` blocks of a stage file.
    ///
    /// Keyed blocks win over `IMAGE_IN` when both are present.
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        let mut keyed = IndexMap::new();
        for block in doc.blocks(keys::JOIN_INPUT) {
            match (block.value(keys::JOIN_KEY), block.value(keys::JOIN_FILE)) {
                (Some(key), Some(file)) if !key.is_empty() && !file.is_empty() => {
                    keyed.insert(key.to_owned(), PathBuf::from(file));
                }
                _ => tracing::warn!("skipping incomplete {} block", keys::JOIN_INPUT),
            }
        }
        if !keyed.is_empty() {
            return Self::Keyed(keyed);
        }
        match doc.value(keys::IMAGE_IN) {
            Some(path) if !path.is_empty() => Self::Single(PathBuf::from(path)),
            _ => Self::Unset,
        }
    }

    fn write(&self, doc: &mut Document) {
        match self {
            Self::Unset => doc.push_value(keys::IMAGE_IN, ""),
            Self::Single(path) => doc.push_value(keys::IMAGE_IN, path.display().to_string()),
            Self::Keyed(inputs) => {
                for (key, path) in inputs {
                    let mut block = Document::new();
                    block.push_value(keys::JOIN_FILE, path.display().to_string());
                    block.push_value(keys::JOIN_KEY, key);
                    doc.push_block(keys::JOIN_INPUT, block);
                }
            }
        }
    }
}

/// Everything needed to instantiate a stage: its flat settings plus
/// its declared inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageConfig {
    /// Flat settings (`TYPE`, `IMAGE_OUT`, `LINK_FILE`, parameters).
    pub map: SettingsMap,
    /// Declared inputs.
    pub input: StageInput,
}

impl StageConfig {
    /// Parse a stage settings file.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let doc = Document::parse(text);
        let mut map = SettingsMap::from_document(&doc);
        map.remove(keys::IMAGE_IN);
        Self {
            map,
            input: StageInput::from_document(&doc),
        }
    }

    /// Overlay `top` onto this config. An `IMAGE_IN` entry in `top`
    /// replaces the declared input.
    pub fn overlay(&mut self, top: &SettingsMap) {
        for (key, value) in top.iter() {
            if key == keys::IMAGE_IN {
                self.input = if value.is_empty() {
                    StageInput::Unset
                } else {
                    StageInput::Single(PathBuf::from(value))
                };
            } else {
                self.map.set(key, value);
            }
        }
    }
}

/// Command-line style `KEY=VALUE` arguments.
pub struct StageArgs;

impl StageArgs {
    /// Collect `KEY=VALUE` tokens into a map. Later tokens win; tokens
    /// without `=` or with an empty key are skipped with a warning.
    pub fn parse<I, S>(args: I) -> SettingsMap
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = SettingsMap::new();
        for arg in args {
            let arg = arg.as_ref();
            match arg.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    map.set(key.trim(), value);
                }
                _ => tracing::warn!(argument = arg, "ignoring argument without KEY=VALUE"),
            }
        }
        map
    }
}

/// A live stage.
#[derive(Debug, Clone)]
pub struct Stage {
    kind: StageKind,
    map: SettingsMap,
    settings: StageSettings,
    corrections: Vec<Correction>,
    input: StageInput,
    inputs: Inputs,
    output: Artifact,
    output_path: Option<PathBuf>,
    link_file: Option<PathBuf>,
}

impl Stage {
    /// Build a stage from settings and declared inputs.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::MissingKind`] or [`StageError::UnknownKind`]
    /// if `TYPE` is absent or unrecognised.
    pub fn instantiate(
        config: StageConfig,
        source: &dyn ArtifactSource,
    ) -> Result<Self, StageError> {
        let StageConfig { mut map, mut input } = config;
        let kind: StageKind = map.get(keys::TYPE).ok_or(StageError::MissingKind)?.parse()?;

        if let Some(path) = map.remove(keys::IMAGE_IN)
            && input == StageInput::Unset
            && !path.is_empty()
        {
            input = StageInput::Single(PathBuf::from(path));
        }
        let output_path = non_empty_path(map.get(keys::IMAGE_OUT));
        let link_file = non_empty_path(map.get(keys::LINK_FILE));
        map.retain(|key| {
            let known = kind.is_param(key);
            if !known && !kind.is_known_key(key) {
                tracing::debug!(%kind, key, "dropping unknown setting");
            }
            known
        });

        let inputs = load_inputs(kind, &input, source);
        let dimensions = inputs.dimensions(kind.primary_key());
        kind::apply_defaults(kind, &mut map, dimensions);
        let validated = kind::validate(kind, &mut map, dimensions);
        let output = validated.settings.recompute(&inputs);

        Ok(Self {
            kind,
            map,
            settings: validated.settings,
            corrections: validated.corrections,
            input,
            inputs,
            output,
            output_path,
            link_file,
        })
    }

    /// Re-validate and recompute, then publish the new output.
    ///
    /// Corrections made by this pass replace those of the previous one.
    pub fn on_parameter_change(&mut self) -> &Artifact {
        let dimensions = self.inputs.dimensions(self.kind.primary_key());
        let validated = kind::validate(self.kind, &mut self.map, dimensions);
        let output = validated.settings.recompute(&self.inputs);
        self.settings = validated.settings;
        self.corrections = validated.corrections;
        self.output = output;
        &self.output
    }

    /// Edit one parameter and recompute.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::UnknownParameter`] if `key` is not one of
    /// the kind's parameters.
    pub fn set(&mut self, key: &str, value: &str) -> Result<&Artifact, StageError> {
        if !self.kind.is_param(key) {
            return Err(StageError::UnknownParameter {
                kind: self.kind,
                key: key.to_owned(),
            });
        }
        self.map.set(key, value);
        Ok(self.on_parameter_change())
    }

    /// Stage kind.
    #[must_use]
    pub const fn kind(&self) -> StageKind {
        self.kind
    }

    /// Validated parameter map.
    #[must_use]
    pub const fn settings_map(&self) -> &SettingsMap {
        &self.map
    }

    /// Typed settings.
    #[must_use]
    pub const fn settings(&self) -> &StageSettings {
        &self.settings
    }

    /// Corrections made by the last validation pass.
    #[must_use]
    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    /// Declared inputs.
    #[must_use]
    pub const fn input(&self) -> &StageInput {
        &self.input
    }

    /// Loaded input artifacts.
    #[must_use]
    pub const fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    /// Published output.
    #[must_use]
    pub const fn output(&self) -> &Artifact {
        &self.output
    }

    /// Declared output path (`IMAGE_OUT`).
    #[must_use]
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Set the output path.
    pub fn set_output_path(&mut self, path: impl Into<PathBuf>) {
        self.output_path = Some(path.into());
    }

    /// Path of the stage's own settings file (`LINK_FILE`).
    #[must_use]
    pub fn link_file(&self) -> Option<&Path> {
        self.link_file.as_deref()
    }

    /// Replace the settings file path, returning the previous one.
    pub fn set_link_file(&mut self, path: Option<PathBuf>) -> Option<PathBuf> {
        std::mem::replace(&mut self.link_file, path)
    }

    /// Class index of a classifier stage's output.
    #[must_use]
    pub const fn class_index(&self) -> Option<u32> {
        match &self.output {
            Artifact::Classification(c) => Some(c.index),
            Artifact::Image(_) | Artifact::Points(_) | Artifact::Contours(_) => None,
        }
    }

    /// Serialize the stage settings file.
    #[must_use]
    pub fn to_settings_text(&self) -> String {
        let mut doc = Document::new();
        doc.push_value(keys::TYPE, self.kind.id());
        self.input.write(&mut doc);
        doc.push_value(keys::IMAGE_OUT, display_path(self.output_path.as_deref()));
        doc.push_value(keys::LINK_FILE, display_path(self.link_file.as_deref()));
        for param in self.kind.params() {
            doc.push_value(param.key, self.map.get(param.key).unwrap_or_default());
        }
        if let Some(index) = self.class_index() {
            doc.push_value(keys::CLASS, index.to_string());
        }
        doc.to_text(Style::Plain)
    }

    /// Input shapes as fed, in input order.
    #[must_use]
    pub fn input_kinds(&self) -> Vec<(&str, ArtifactKind)> {
        self.inputs.iter().map(|(key, a)| (key, a.kind())).collect()
    }

    /// Generate a Rust function reproducing this stage with its current
    /// settings.
    #[must_use]
    pub fn emit(&self, suffix: &str) -> StageEmission {
        MethodTemplate::new(&self.settings, &self.input_kinds(), suffix).render()
    }
}

fn non_empty_path(value: Option<&str>) -> Option<PathBuf> {
    value.filter(|v| !v.trim().is_empty()).map(PathBuf::from)
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

/// Load every declared input, substituting placeholders on failure.
fn load_inputs(kind: StageKind, input: &StageInput, source: &dyn ArtifactSource) -> Inputs {
    let mut inputs = Inputs::new();
    match input {
        StageInput::Unset => {
            let key = kind.primary_key();
            tracing::warn!(%kind, "stage has no input; using placeholder");
            inputs.insert(key, artifact::placeholder(StageKind::input_kind(key)));
        }
        StageInput::Single(path) => {
            let key = kind.primary_key();
            inputs.insert(key, load_or_placeholder(source, path, key));
        }
        StageInput::Keyed(paths) => {
            for (key, path) in paths {
                if kind.accepts_key(key) {
                    inputs.insert(key.as_str(), load_or_placeholder(source, path, key));
                } else {
                    tracing::warn!(%kind, key = key.as_str(), "ignoring input with unsupported key");
                }
            }
        }
    }
    inputs
}

fn load_or_placeholder(source: &dyn ArtifactSource, path: &Path, key: &str) -> Artifact {
    source.load(path).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), error = %err, "input unavailable; using placeholder");
        artifact::placeholder(StageKind::input_kind(key))
    })
}
