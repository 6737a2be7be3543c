//! Join chains: a chain whose first stage takes several keyed sources.
//!
//! Sources are `(path, key)` pairs produced independently, each with a
//! selection flag. Keys must be accepted by the first stage's kind. With
//! no stage yet, sources are recorded anyway and checked when the first
//! stage is appended.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::chain::{Chain, ChainError, Resolution, ResolutionCause, ResolutionError, StageDescriptor};
use crate::format::{Document, Style};
use crate::keys;
use crate::stage::{ArtifactSource, StageInput};

/// One independently produced input of a join chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSource {
    /// Artifact path.
    pub path: PathBuf,
    /// Input key it feeds.
    pub key: String,
    /// Whether it takes part in the next run.
    pub selected: bool,
}

/// Result of [`JoinChain::add_source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceAdded {
    /// Recorded and checked against the first stage.
    Added,
    /// Recorded without a check; the chain has no stage yet.
    FirstStageMissing,
}

/// A chain fed by a set of keyed sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinChain {
    chain: Chain,
    sources: Vec<JoinSource>,
}

impl JoinChain {
    /// Create an empty join chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying chain.
    #[must_use]
    pub const fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Set the join file path.
    pub fn set_file(&mut self, file: impl Into<PathBuf>) {
        self.chain.set_file(file);
    }

    /// All sources in insertion order.
    #[must_use]
    pub fn sources(&self) -> &[JoinSource] {
        &self.sources
    }

    /// Selected sources in insertion order.
    pub fn selected_sources(&self) -> impl Iterator<Item = &JoinSource> {
        self.sources.iter().filter(|s| s.selected)
    }

    /// Record a new, selected source.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::DuplicateSource`] if a source with the same
    /// path is already recorded (selection is stored per path), and
    /// [`ChainError::UnknownJoinKey`] if the first stage exists and does
    /// not accept `key`.
    pub fn add_source(
        &mut self,
        path: impl Into<PathBuf>,
        key: impl Into<String>,
    ) -> Result<SourceAdded, ChainError> {
        let path = path.into();
        let key = key.into();
        if self.sources.iter().any(|s| s.path == path) {
            return Err(ChainError::DuplicateSource { path });
        }
        let outcome = match self.chain.first_kind() {
            Some(kind) if !kind.accepts_key(&key) => {
                return Err(ChainError::UnknownJoinKey { kind, key });
            }
            Some(_) => SourceAdded::Added,
            None => {
                tracing::warn!(key = key.as_str(), "join chain has no first stage; key not checked");
                SourceAdded::FirstStageMissing
            }
        };
        self.sources.push(JoinSource {
            path,
            key,
            selected: true,
        });
        Ok(outcome)
    }

    /// Remove the source at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::NoSuchSource`] if `index` is out of range.
    pub fn remove_source(&mut self, index: usize) -> Result<JoinSource, ChainError> {
        self.check_index(index)?;
        Ok(self.sources.remove(index))
    }

    /// Mark the source at `index` selected or not.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::NoSuchSource`] if `index` is out of range.
    pub fn select(&mut self, index: usize, selected: bool) -> Result<(), ChainError> {
        self.check_index(index)?;
        self.sources[index].selected = selected;
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), ChainError> {
        if index < self.sources.len() {
            Ok(())
        } else {
            Err(ChainError::NoSuchSource {
                index,
                len: self.sources.len(),
            })
        }
    }

    /// Append a descriptor.
    ///
    /// The first descriptor must accept the key of every recorded source.
    ///
    /// # Errors
    ///
    /// Everything [`Chain::append`] rejects, plus
    /// [`ChainError::UnknownJoinKey`] for a first stage that does not
    /// accept a recorded key and [`ChainError::DuplicateOutput`] for an
    /// output path equal to a source path.
    pub fn append(&mut self, descriptor: StageDescriptor) -> Result<(), ChainError> {
        let kind = descriptor.kind()?;
        if self.chain.is_empty()
            && let Some(source) = self.sources.iter().find(|s| !kind.accepts_key(&s.key))
        {
            return Err(ChainError::UnknownJoinKey {
                kind,
                key: source.key.clone(),
            });
        }
        if self.sources.iter().any(|s| s.path == descriptor.output) {
            return Err(ChainError::DuplicateOutput {
                path: descriptor.output,
            });
        }
        self.chain.append(descriptor)
    }

    /// Remove and return the last descriptor.
    pub fn pop(&mut self) -> Option<StageDescriptor> {
        self.chain.pop()
    }

    /// Keyed input of the first stage: selected sources, last path per key.
    #[must_use]
    pub fn selected_input(&self) -> IndexMap<String, PathBuf> {
        let mut input = IndexMap::new();
        for source in self.selected_sources() {
            if let Some(previous) = input.insert(source.key.clone(), source.path.clone()) {
                tracing::warn!(
                    key = source.key.as_str(),
                    replaced = %previous.display(),
                    kept = %source.path.display(),
                    "several selected sources share a key; keeping the last"
                );
            }
        }
        input
    }

    /// Instantiate every stage; the first receives the selected sources.
    pub fn resolve(&self, source: &dyn ArtifactSource) -> Resolution {
        let input = self.selected_input();
        if input.is_empty()
            && let Some(first) = self.chain.descriptors().first()
        {
            return Resolution {
                stages: Vec::new(),
                failure: Some(ResolutionError {
                    index: 0,
                    name: first.name.clone(),
                    cause: ResolutionCause::NoSelection,
                }),
            };
        }
        self.chain.resolve_from(StageInput::Keyed(input), source)
    }

    /// Serialize the join file.
    #[must_use]
    pub fn to_settings_text(&self) -> String {
        let mut doc = Document::new();
        for source in &self.sources {
            let mut block = Document::new();
            block.push_value(keys::JOIN_FILE, source.path.display().to_string());
            block.push_value(keys::JOIN_KEY, &source.key);
            doc.push_block(keys::JOIN_INPUT, block);
        }
        for source in self.selected_sources() {
            doc.push_value(keys::JOIN_SELECTED, source.path.display().to_string());
        }
        self.chain.write_links(&mut doc);
        doc.to_text(Style::Tagged)
    }

    /// Parse a join file loaded from `path`. Keys are not checked.
    #[must_use]
    pub fn parse(text: &str, path: &Path) -> Self {
        let doc = Document::parse(text);
        let selected: Vec<&str> = doc.values(keys::JOIN_SELECTED).collect();
        let sources = doc
            .blocks(keys::JOIN_INPUT)
            .filter_map(|block| {
                let file = block.value(keys::JOIN_FILE).filter(|f| !f.is_empty());
                let key = block.value(keys::JOIN_KEY).filter(|k| !k.is_empty());
                match (file, key) {
                    (Some(file), Some(key)) => Some(JoinSource {
                        path: PathBuf::from(file),
                        key: key.to_owned(),
                        selected: selected.contains(&file),
                    }),
                    _ => {
                        tracing::warn!("skipping incomplete {} block", keys::JOIN_INPUT);
                        None
                    }
                }
            })
            .collect();
        Self {
            chain: Chain::from_links(&doc, path),
            sources,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kind::StageKind;
    use crate::stage::MemorySource;
    use crate::types::{Artifact, ArtifactKind, Dimensions, Point, PointSet, RgbaImage};

    fn pictograph_chain() -> JoinChain {
        let mut join = JoinChain::new();
        join.set_file("p.join");
        join.append(StageDescriptor::new("pictograph", StageKind::Pictograph, "class.png"))
            .unwrap();
        join
    }

    fn source() -> MemorySource {
        let mut source = MemorySource::new();
        source.insert(
            "a.pts",
            Artifact::Points(PointSet {
                dimensions: Dimensions { width: 20, height: 20 },
                points: vec![Point::new(5.0, 5.0); 7],
            }),
        );
        source.insert(
            "b.pts",
            Artifact::Points(PointSet {
                dimensions: Dimensions { width: 20, height: 20 },
                points: vec![Point::new(5.0, 5.0); 3],
            }),
        );
        source.insert("bg.png", Artifact::Image(RgbaImage::new(20, 20)));
        source
    }

    #[test]
    fn keys_are_checked_against_first_stage() {
        let mut join = pictograph_chain();
        assert_eq!(join.add_source("a.pts", "POINTS").unwrap(), SourceAdded::Added);
        assert_eq!(join.add_source("bg.png", "IMAGE").unwrap(), SourceAdded::Added);
        assert_eq!(
            join.add_source("c.ctr", "CONTOURS"),
            Err(ChainError::UnknownJoinKey {
                kind: StageKind::Pictograph,
                key: "CONTOURS".to_owned()
            })
        );
        assert_eq!(join.sources().len(), 2);
    }

    #[test]
    fn same_path_cannot_be_added_twice() {
        let mut join = pictograph_chain();
        join.add_source("a.pts", "POINTS").unwrap();
        assert_eq!(
            join.add_source("a.pts", "IMAGE"),
            Err(ChainError::DuplicateSource {
                path: PathBuf::from("a.pts")
            })
        );
        assert_eq!(join.sources().len(), 1);
    }

    #[test]
    fn sources_without_stage_are_recorded_then_checked() {
        let mut join = JoinChain::new();
        assert_eq!(
            join.add_source("c.ctr", "CONTOURS").unwrap(),
            SourceAdded::FirstStageMissing
        );
        assert!(matches!(
            join.append(StageDescriptor::new("p", StageKind::Pictograph, "p.png")),
            Err(ChainError::UnknownJoinKey { .. })
        ));
        join.append(StageDescriptor::new("m", StageKind::Mineral, "m.png"))
            .unwrap();
        assert_eq!(join.chain().len(), 1);
    }

    #[test]
    fn new_sources_start_selected() {
        let mut join = pictograph_chain();
        join.add_source("a.pts", "POINTS").unwrap();
        join.add_source("b.pts", "POINTS").unwrap();
        join.select(0, false).unwrap();
        let selected: Vec<_> = join.selected_sources().map(|s| s.path.clone()).collect();
        assert_eq!(selected, vec![PathBuf::from("b.pts")]);
        assert!(join.select(5, true).is_err());
        assert_eq!(join.remove_source(0).unwrap().path, PathBuf::from("a.pts"));
        assert!(join.remove_source(3).is_err());
    }

    #[test]
    fn repeated_key_keeps_last_selected() {
        let mut join = pictograph_chain();
        join.add_source("a.pts", "POINTS").unwrap();
        join.add_source("bg.png", "IMAGE").unwrap();
        join.add_source("b.pts", "POINTS").unwrap();
        let input = join.selected_input();
        assert_eq!(input.len(), 2);
        assert_eq!(input["POINTS"], PathBuf::from("b.pts"));

        let resolution = join.resolve(&source());
        assert!(resolution.is_complete());
        // b.pts holds three points: unclassified.
        assert_eq!(resolution.stages[0].class_index(), Some(0));
    }

    #[test]
    fn resolve_feeds_keyed_sources() {
        let mut join = pictograph_chain();
        join.add_source("a.pts", "POINTS").unwrap();
        join.add_source("bg.png", "IMAGE").unwrap();
        join.append(StageDescriptor::new("contours", StageKind::Contours, "c.ctr"))
            .unwrap();

        let resolution = join.resolve(&source());
        assert!(resolution.is_complete(), "{:?}", resolution.failure);
        let first = &resolution.stages[0];
        assert_eq!(first.class_index(), Some(1));
        assert_eq!(
            first.input_kinds(),
            vec![("POINTS", ArtifactKind::Points), ("IMAGE", ArtifactKind::Image)]
        );
        assert_eq!(resolution.stages[1].output().kind(), ArtifactKind::Contours);
    }

    #[test]
    fn no_selection_fails_resolution() {
        let mut join = pictograph_chain();
        join.add_source("a.pts", "POINTS").unwrap();
        join.select(0, false).unwrap();
        let resolution = join.resolve(&source());
        assert!(resolution.stages.is_empty());
        assert_eq!(resolution.failure.unwrap().cause, ResolutionCause::NoSelection);
    }

    #[test]
    fn output_may_not_overwrite_a_source() {
        let mut join = JoinChain::new();
        join.add_source("a.pts", "POINTS").unwrap();
        assert!(matches!(
            join.append(StageDescriptor::new("p", StageKind::Pictograph, "a.pts")),
            Err(ChainError::DuplicateOutput { .. })
        ));
    }

    #[test]
    fn join_file_round_trips() {
        let mut join = pictograph_chain();
        join.add_source("a.pts", "POINTS").unwrap();
        join.add_source("bg.png", "IMAGE").unwrap();
        join.select(1, false).unwrap();

        let text = join.to_settings_text();
        assert!(text.starts_with(
            "<JOIN_INPUT>\n<JOIN_FILE>\ta.pts\t</JOIN_FILE>\n<JOIN_KEY>\tPOINTS\t</JOIN_KEY>\n</JOIN_INPUT>\n"
        ));
        assert!(text.contains("<JOIN_SELECTED>\ta.pts\t</JOIN_SELECTED>\n"));
        assert!(!text.contains("<JOIN_SELECTED>\tbg.png"));

        let loaded = JoinChain::parse(&text, Path::new("p.join"));
        assert_eq!(loaded.sources(), join.sources());
        assert_eq!(loaded.chain().len(), 1);
        assert_eq!(loaded.to_settings_text(), text);
    }
}
