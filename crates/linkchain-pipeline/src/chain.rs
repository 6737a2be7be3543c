//! Ordered stage chains and the chain file.
//!
//! A [`Chain`] stores flat [`StageDescriptor`]s, never live stages.
//! [`Chain::resolve`] instantiates them in order. Stage 0 reads the chain
//! reference; every later stage is handed its predecessor's output in
//! memory, declared under the predecessor's output path.

use std::path::{Path, PathBuf};

use crate::format::{Document, Style};
use crate::keys;
use crate::kind::{StageKind, UnknownKind};
use crate::stage::{ArtifactSource, Stage, StageConfig, StageError, StageInput};
use crate::types::Artifact;

/// Settings file extension used for default descriptor settings paths.
pub const SETTINGS_EXTENSION: &str = "link";

/// One stage of a chain, as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDescriptor {
    /// Display name, also the default settings file stem.
    pub name: String,
    /// Stage-kind identifier.
    pub link: String,
    /// Output artifact path.
    pub output: PathBuf,
    /// Explicit settings file path.
    pub settings: Option<PathBuf>,
}

impl StageDescriptor {
    /// Describe a stage of `kind` writing to `output`.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: StageKind, output: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            link: kind.id().to_owned(),
            output: output.into(),
            settings: None,
        }
    }

    /// The stage kind named by [`link`](Self::link).
    ///
    /// # Errors
    ///
    /// Returns [`UnknownKind`] if the identifier is not recognised.
    pub fn kind(&self) -> Result<StageKind, UnknownKind> {
        self.link.parse()
    }

    /// Settings path: the explicit one, or `<chain dir>/<name>.link`.
    #[must_use]
    pub fn settings_path(&self, chain_dir: Option<&Path>) -> PathBuf {
        self.settings.clone().unwrap_or_else(|| {
            let file = format!("{}.{SETTINGS_EXTENSION}", self.name);
            chain_dir.map_or_else(|| PathBuf::from(&file), |dir| dir.join(&file))
        })
    }
}

/// Rejections from chain and join-chain edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The descriptor names no known stage kind.
    #[error(transparent)]
    UnknownKind(#[from] UnknownKind),

    /// The descriptor has no output path.
    #[error("stage {name:?} has no output path")]
    EmptyOutput {
        /// Descriptor name.
        name: String,
    },

    /// The output path is already used by the reference or another stage.
    #[error("output path {} is already used in this chain", path.display())]
    DuplicateOutput {
        /// Offending path.
        path: PathBuf,
    },

    /// A join key the first stage does not accept.
    #[error("{kind} stages do not accept join key {key:?}")]
    UnknownJoinKey {
        /// First stage kind.
        kind: StageKind,
        /// Rejected key.
        key: String,
    },

    /// A join source with this path is already recorded.
    #[error("join source {} is already recorded", path.display())]
    DuplicateSource {
        /// Offending path.
        path: PathBuf,
    },

    /// A source index past the end of the source list.
    #[error("no join source at index {index} (have {len})")]
    NoSuchSource {
        /// Requested index.
        index: usize,
        /// Number of sources.
        len: usize,
    },
}

/// Why a descriptor could not be turned into a stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionCause {
    /// Stage construction failed.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// The first stage has no reference input.
    #[error("chain has no reference input")]
    MissingReference,

    /// The join chain has no selected source.
    #[error("no join source is selected")]
    NoSelection,

    /// The descriptor has no output path.
    #[error("stage has no output path")]
    EmptyOutput,
}

/// Failure at one chain position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stage {index} ({name}) failed to resolve: {cause}")]
pub struct ResolutionError {
    /// Zero-based chain position.
    pub index: usize,
    /// Descriptor name.
    pub name: String,
    /// What went wrong.
    pub cause: ResolutionCause,
}

/// Outcome of resolving a chain: every stage up to the first failure.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Stages resolved before any failure, in chain order.
    pub stages: Vec<Stage>,
    /// The first failure, if any.
    pub failure: Option<ResolutionError>,
}

impl Resolution {
    /// Returns `true` if every descriptor resolved.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Output of the last resolved stage.
    #[must_use]
    pub fn last_output(&self) -> Option<&Artifact> {
        self.stages.last().map(Stage::output)
    }
}

/// An ordered sequence of stage descriptors fed by one reference input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    reference: Option<PathBuf>,
    descriptors: Vec<StageDescriptor>,
    file: Option<PathBuf>,
}

impl Chain {
    /// Create an empty chain.
    #[must_use]
    pub fn new(reference: Option<PathBuf>) -> Self {
        Self {
            reference,
            descriptors: Vec::new(),
            file: None,
        }
    }

    /// External input of the first stage.
    #[must_use]
    pub fn reference(&self) -> Option<&Path> {
        self.reference.as_deref()
    }

    /// Replace the reference input.
    pub fn set_reference(&mut self, reference: Option<PathBuf>) {
        self.reference = reference;
    }

    /// Descriptors in chain order.
    #[must_use]
    pub fn descriptors(&self) -> &[StageDescriptor] {
        &self.descriptors
    }

    /// Number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if the chain has no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Path the chain was loaded from or will be saved to.
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Set the chain file path.
    pub fn set_file(&mut self, file: impl Into<PathBuf>) {
        self.file = Some(file.into());
    }

    /// Directory holding the chain file.
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.file
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    /// Kind of the first descriptor, if it names a known kind.
    #[must_use]
    pub fn first_kind(&self) -> Option<StageKind> {
        self.descriptors.first().and_then(|d| d.kind().ok())
    }

    /// Append a descriptor.
    ///
    /// # Errors
    ///
    /// Rejects an unknown kind, an empty output path, or an output path
    /// equal to the reference or to another descriptor's output.
    pub fn append(&mut self, descriptor: StageDescriptor) -> Result<(), ChainError> {
        descriptor.kind()?;
        if descriptor.output.as_os_str().is_empty() {
            return Err(ChainError::EmptyOutput {
                name: descriptor.name,
            });
        }
        let taken = self.reference.as_deref() == Some(descriptor.output.as_path())
            || self.descriptors.iter().any(|d| d.output == descriptor.output);
        if taken {
            return Err(ChainError::DuplicateOutput {
                path: descriptor.output,
            });
        }
        tracing::debug!(name = descriptor.name.as_str(), link = descriptor.link.as_str(), "appended stage");
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Remove and return the last descriptor.
    pub fn pop(&mut self) -> Option<StageDescriptor> {
        self.descriptors.pop()
    }

    /// Instantiate every stage in order.
    pub fn resolve(&self, source: &dyn ArtifactSource) -> Resolution {
        let first = self
            .reference
            .clone()
            .map_or(StageInput::Unset, StageInput::Single);
        self.resolve_from(first, source)
    }

    /// Resolve with an explicit input for the first stage.
    ///
    /// [`StageInput::Unset`] fails the first stage with
    /// [`ResolutionCause::MissingReference`].
    pub fn resolve_from(&self, first: StageInput, source: &dyn ArtifactSource) -> Resolution {
        let mut stages: Vec<Stage> = Vec::with_capacity(self.descriptors.len());
        let mut first = Some(first);

        for (index, descriptor) in self.descriptors.iter().enumerate() {
            let fail = |cause: ResolutionCause| ResolutionError {
                index,
                name: descriptor.name.clone(),
                cause,
            };

            let result = match stages.last() {
                None => match first.take() {
                    Some(StageInput::Unset) | None => Err(fail(ResolutionCause::MissingReference)),
                    Some(input) => self
                        .resolve_stage(descriptor, input, source)
                        .map_err(fail),
                },
                Some(previous) => {
                    let fed = FedSource::new(source, previous);
                    let input = fed.path.clone().map_or(StageInput::Unset, StageInput::Single);
                    self.resolve_stage(descriptor, input, &fed).map_err(fail)
                }
            };

            match result {
                Ok(stage) => stages.push(stage),
                Err(failure) => {
                    tracing::warn!(%failure, "chain resolution stopped");
                    return Resolution {
                        stages,
                        failure: Some(failure),
                    };
                }
            }
        }

        Resolution {
            stages,
            failure: None,
        }
    }

    fn resolve_stage(
        &self,
        descriptor: &StageDescriptor,
        input: StageInput,
        source: &dyn ArtifactSource,
    ) -> Result<Stage, ResolutionCause> {
        let kind = descriptor.kind().map_err(StageError::from)?;
        if descriptor.output.as_os_str().is_empty() {
            return Err(ResolutionCause::EmptyOutput);
        }

        let settings_path = descriptor.settings_path(self.dir());
        let mut config = match source.read_settings(&settings_path) {
            Ok(Some(text)) => StageConfig::parse(&text),
            Ok(None) => StageConfig::default(),
            Err(err) => {
                tracing::warn!(path = %settings_path.display(), error = %err, "could not read stage settings; using defaults");
                StageConfig::default()
            }
        };
        if let Some(stored) = config.map.get(keys::TYPE)
            && StageKind::from_id(stored) != Some(kind)
        {
            tracing::warn!(stored, link = kind.id(), "settings file kind differs from chain; using chain");
        }
        config.map.set(keys::TYPE, kind.id());
        config
            .map
            .set(keys::IMAGE_OUT, descriptor.output.display().to_string());
        config
            .map
            .set(keys::LINK_FILE, settings_path.display().to_string());
        config.input = input;

        Ok(Stage::instantiate(config, source)?)
    }

    /// Append the `<LINK_GUI>` blocks and `<CHAIN_FILE>` tag.
    pub(crate) fn write_links(&self, doc: &mut Document) {
        for descriptor in &self.descriptors {
            let mut block = Document::new();
            block.push_value(keys::NAME, &descriptor.name);
            block.push_value(keys::LINK, &descriptor.link);
            block.push_value(keys::OUT, descriptor.output.display().to_string());
            block.push_value(
                keys::SETTINGS,
                descriptor.settings_path(self.dir()).display().to_string(),
            );
            doc.push_block(keys::LINK_GUI, block);
        }
        doc.push_value(
            keys::CHAIN_FILE,
            self.file
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        );
    }

    /// Serialize the chain file.
    #[must_use]
    pub fn to_settings_text(&self) -> String {
        let mut doc = Document::new();
        doc.push_value(
            keys::CHAIN_REFERENCE,
            self.reference
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        );
        self.write_links(&mut doc);
        doc.to_text(Style::Tagged)
    }

    /// Parse a chain file loaded from `path`. Stages are not instantiated.
    #[must_use]
    pub fn parse(text: &str, path: &Path) -> Self {
        let doc = Document::parse(text);
        let mut chain = Self::from_links(&doc, path);
        chain.reference = doc
            .value(keys::CHAIN_REFERENCE)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        chain
    }

    /// Read `<LINK_GUI>` blocks and `<CHAIN_FILE>` from a parsed document.
    pub(crate) fn from_links(doc: &Document, path: &Path) -> Self {
        if let Some(stored) = doc.value(keys::CHAIN_FILE)
            && !stored.is_empty()
            && Path::new(stored) != path
        {
            tracing::warn!(stored, loaded = %path.display(), "chain file was moved");
        }

        let descriptors = doc
            .blocks(keys::LINK_GUI)
            .enumerate()
            .map(|(index, block)| {
                let link = block.value(keys::LINK).unwrap_or_default().to_owned();
                let name = block
                    .value(keys::NAME)
                    .filter(|n| !n.is_empty())
                    .map_or_else(|| default_name(&link, index), str::to_owned);
                StageDescriptor {
                    name,
                    link,
                    output: PathBuf::from(block.value(keys::OUT).unwrap_or_default()),
                    settings: block
                        .value(keys::SETTINGS)
                        .filter(|s| !s.is_empty())
                        .map(PathBuf::from),
                }
            })
            .collect();

        Self {
            reference: None,
            descriptors,
            file: Some(path.to_path_buf()),
        }
    }
}

fn default_name(link: &str, index: usize) -> String {
    format!("{}_{index}", link.to_ascii_lowercase())
}

/// Serves the previous stage's output from memory, delegating everything
/// else.
struct FedSource<'a> {
    inner: &'a dyn ArtifactSource,
    path: Option<PathBuf>,
    artifact: Artifact,
}

impl<'a> FedSource<'a> {
    fn new(inner: &'a dyn ArtifactSource, previous: &Stage) -> Self {
        Self {
            inner,
            path: previous.output_path().map(Path::to_path_buf),
            artifact: previous.output().clone(),
        }
    }
}

impl ArtifactSource for FedSource<'_> {
    fn load(&self, path: &Path) -> Result<Artifact, crate::artifact::ArtifactError> {
        if self.path.as_deref() == Some(path) {
            Ok(self.artifact.clone())
        } else {
            self.inner.load(path)
        }
    }

    fn read_settings(&self, path: &Path) -> std::io::Result<Option<String>> {
        self.inner.read_settings(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::crop::CROP_LEFT;
    use crate::stage::MemorySource;
    use crate::types::{ArtifactKind, Dimensions, RgbaImage};

    fn source() -> MemorySource {
        let mut source = MemorySource::new();
        let mut image = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        for y in 4..12 {
            for x in 4..12 {
                image.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        source.insert("in.png", Artifact::Image(image));
        source
    }

    fn three_stage_chain() -> Chain {
        let mut chain = Chain::new(Some(PathBuf::from("in.png")));
        chain.set_file("work/demo.chain");
        chain
            .append(StageDescriptor::new("crop", StageKind::Crop, "crop.png"))
            .unwrap();
        chain
            .append(StageDescriptor::new("contours", StageKind::Contours, "c.ctr"))
            .unwrap();
        chain
            .append(StageDescriptor::new("mineral", StageKind::Mineral, "m.png"))
            .unwrap();
        chain
    }

    #[test]
    fn append_rejects_bad_descriptors() {
        let mut chain = Chain::new(Some(PathBuf::from("in.png")));
        let unknown = StageDescriptor {
            link: "BLUR".to_owned(),
            ..StageDescriptor::new("x", StageKind::Crop, "x.png")
        };
        assert!(matches!(chain.append(unknown), Err(ChainError::UnknownKind(_))));
        assert!(matches!(
            chain.append(StageDescriptor::new("x", StageKind::Crop, "")),
            Err(ChainError::EmptyOutput { .. })
        ));
        assert!(matches!(
            chain.append(StageDescriptor::new("x", StageKind::Crop, "in.png")),
            Err(ChainError::DuplicateOutput { .. })
        ));
        chain
            .append(StageDescriptor::new("a", StageKind::Crop, "a.png"))
            .unwrap();
        assert!(matches!(
            chain.append(StageDescriptor::new("b", StageKind::Threshold, "a.png")),
            Err(ChainError::DuplicateOutput { .. })
        ));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn default_settings_path_is_beside_chain_file() {
        let chain = three_stage_chain();
        let path = chain.descriptors()[0].settings_path(chain.dir());
        assert_eq!(path, PathBuf::from("work/crop.link"));
        let bare = StageDescriptor::new("t", StageKind::Threshold, "t.png");
        assert_eq!(bare.settings_path(None), PathBuf::from("t.link"));
    }

    #[test]
    fn resolve_feeds_outputs_forward() {
        let resolution = three_stage_chain().resolve(&source());
        assert!(resolution.is_complete(), "{:?}", resolution.failure);
        assert_eq!(resolution.stages.len(), 3);

        let contours = &resolution.stages[1];
        assert_eq!(contours.input(), &StageInput::Single(PathBuf::from("crop.png")));
        assert_eq!(contours.output().kind(), ArtifactKind::Contours);
        assert_eq!(contours.output().dimensions(), Dimensions { width: 16, height: 16 });

        let mineral = &resolution.stages[2];
        assert_eq!(mineral.inputs().get(keys::CONTOURS).unwrap().kind(), ArtifactKind::Contours);
        assert!(mineral.class_index().is_some());
        assert_eq!(
            mineral.link_file(),
            Some(Path::new("work/mineral.link"))
        );
    }

    #[test]
    fn resolve_applies_stored_settings() {
        let mut source = source();
        source.insert_settings("work/crop.link", "TYPE\tCROP\nCROP_LEFT\t8\n");
        let resolution = three_stage_chain().resolve(&source);
        assert_eq!(resolution.stages[0].settings_map().get(CROP_LEFT), Some("8"));
    }

    #[test]
    fn missing_reference_fails_first_stage() {
        let mut chain = three_stage_chain();
        chain.set_reference(None);
        let resolution = chain.resolve(&source());
        assert!(resolution.stages.is_empty());
        let failure = resolution.failure.unwrap();
        assert_eq!(failure.index, 0);
        assert_eq!(failure.cause, ResolutionCause::MissingReference);
    }

    #[test]
    fn unknown_kind_keeps_earlier_stages() {
        let text = "<CHAIN_REFERENCE>\tin.png\t</CHAIN_REFERENCE>\n\
                    <LINK_GUI>\n<NAME>\tcrop\t</NAME>\n<LINK>\tCROP\t</LINK>\n<OUT>\ta.png\t</OUT>\n</LINK_GUI>\n\
                    <LINK_GUI>\n<NAME>\tblur\t</NAME>\n<LINK>\tBLUR\t</LINK>\n<OUT>\tb.png\t</OUT>\n</LINK_GUI>\n\
                    <LINK_GUI>\n<NAME>\tthr\t</NAME>\n<LINK>\tTHRESHOLD\t</LINK>\n<OUT>\tc.png\t</OUT>\n</LINK_GUI>\n";
        let chain = Chain::parse(text, Path::new("x.chain"));
        assert_eq!(chain.len(), 3);
        let resolution = chain.resolve(&source());
        assert_eq!(resolution.stages.len(), 1);
        let failure = resolution.failure.unwrap();
        assert_eq!(failure.index, 1);
        assert!(matches!(
            failure.cause,
            ResolutionCause::Stage(StageError::UnknownKind(_))
        ));
    }

    #[test]
    fn empty_chain_resolves_to_nothing() {
        let resolution = Chain::new(None).resolve(&source());
        assert!(resolution.stages.is_empty());
        assert!(resolution.is_complete());
        assert!(resolution.last_output().is_none());
    }

    #[test]
    fn chain_file_round_trips() {
        let chain = three_stage_chain();
        let text = chain.to_settings_text();
        assert!(text.starts_with("<CHAIN_REFERENCE>\tin.png\t</CHAIN_REFERENCE>\n<LINK_GUI>\n<NAME>\tcrop\t</NAME>\n"));
        assert!(text.ends_with("<CHAIN_FILE>\twork/demo.chain\t</CHAIN_FILE>\n"));

        let loaded = Chain::parse(&text, Path::new("work/demo.chain"));
        assert_eq!(loaded.reference(), chain.reference());
        assert_eq!(loaded.len(), 3);
        for (a, b) in loaded.descriptors().iter().zip(chain.descriptors()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.link, b.link);
            assert_eq!(a.output, b.output);
            assert_eq!(a.settings_path(loaded.dir()), b.settings_path(chain.dir()));
        }
        assert_eq!(loaded.to_settings_text(), text);
    }

    #[test]
    fn moved_chain_file_takes_loaded_path() {
        let text = three_stage_chain().to_settings_text();
        let loaded = Chain::parse(&text, Path::new("moved/demo.chain"));
        assert_eq!(loaded.file(), Some(Path::new("moved/demo.chain")));
        assert_eq!(loaded.len(), 3);
        assert!(
            loaded
                .to_settings_text()
                .ends_with("<CHAIN_FILE>\tmoved/demo.chain\t</CHAIN_FILE>\n")
        );
    }

    #[test]
    fn missing_optional_tags_get_defaults() {
        let text = "<LINK_GUI>\n<LINK>\tCROP\t</LINK>\n<OUT>\ta.png\t</OUT>\n</LINK_GUI>\n";
        let chain = Chain::parse(text, Path::new("dir/p.chain"));
        assert_eq!(chain.reference(), None);
        let descriptor = &chain.descriptors()[0];
        assert_eq!(descriptor.name, "crop_0");
        assert_eq!(descriptor.settings_path(chain.dir()), PathBuf::from("dir/crop_0.link"));
    }
}
