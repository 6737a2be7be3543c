//! Human and JSON reports of stages and chain runs.

use std::fmt::Write;
use std::path::Path;

use linkchain_pipeline::{
    ArtifactKind, ArtifactSummary, Chain, JoinChain, Resolution, Stage, StageDescriptor,
};
use serde::Serialize;

/// A value the validator rewrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionReport {
    pub key: String,
    pub found: Option<String>,
    pub applied: String,
}

/// One resolved stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub index: usize,
    pub name: String,
    pub kind: &'static str,
    pub output: Option<String>,
    pub settings: Option<String>,
    pub summary: ArtifactSummary,
    pub corrections: Vec<CorrectionReport>,
}

impl StageReport {
    pub fn new(index: usize, name: impl Into<String>, stage: &Stage) -> Self {
        Self {
            index,
            name: name.into(),
            kind: stage.kind().id(),
            output: stage.output_path().map(display),
            settings: stage.link_file().map(display),
            summary: stage.output().summary(),
            corrections: stage
                .corrections()
                .iter()
                .map(|c| CorrectionReport {
                    key: c.key.clone(),
                    found: c.found.clone(),
                    applied: c.applied.clone(),
                })
                .collect(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let summary = &self.summary;
        let _ = write!(
            out,
            "[{}] {} ({}) -> {}: {} {}x{}",
            self.index,
            self.name,
            self.kind,
            self.output.as_deref().unwrap_or("-"),
            kind_label(summary.kind),
            summary.dimensions.width,
            summary.dimensions.height,
        );
        if let Some(items) = summary.items {
            let _ = write!(out, ", {items} items");
        }
        if let Some(class) = summary.class {
            let _ = write!(out, ", class {class}");
        }
        out.push('\n');
        for c in &self.corrections {
            let _ = writeln!(
                out,
                "    corrected {}: {} -> {}",
                c.key,
                c.found.as_deref().unwrap_or("<missing>"),
                c.applied
            );
        }
        out
    }
}

/// Every resolved stage of a run plus the failure that stopped it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
    pub failure: Option<String>,
}

impl RunReport {
    /// Pair resolved stages with the descriptors that named them.
    pub fn new(descriptors: &[StageDescriptor], resolution: &Resolution) -> Self {
        let stages = resolution
            .stages
            .iter()
            .zip(descriptors)
            .enumerate()
            .map(|(index, (stage, descriptor))| {
                StageReport::new(index, descriptor.name.as_str(), stage)
            })
            .collect();
        Self {
            stages,
            failure: resolution.failure.as_ref().map(ToString::to_string),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for stage in &self.stages {
            out.push_str(&stage.render());
        }
        if let Some(failure) = &self.failure {
            let _ = writeln!(out, "stopped: {failure}");
        }
        out
    }
}

/// A chain or join file as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainView {
    pub file: Option<String>,
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceView>,
    pub stages: Vec<DescriptorView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceView {
    pub path: String,
    pub key: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorView {
    pub name: String,
    pub link: String,
    pub output: String,
    pub settings: String,
}

impl ChainView {
    pub fn chain(chain: &Chain) -> Self {
        Self {
            file: chain.file().map(display),
            reference: chain.reference().map(display),
            sources: Vec::new(),
            stages: chain
                .descriptors()
                .iter()
                .map(|d| DescriptorView {
                    name: d.name.clone(),
                    link: d.link.clone(),
                    output: display(&d.output),
                    settings: display(&d.settings_path(chain.dir())),
                })
                .collect(),
        }
    }

    pub fn join(join: &JoinChain) -> Self {
        Self {
            sources: join
                .sources()
                .iter()
                .map(|s| SourceView {
                    path: display(&s.path),
                    key: s.key.clone(),
                    selected: s.selected,
                })
                .collect(),
            ..Self::chain(join.chain())
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(reference) = &self.reference {
            let _ = writeln!(out, "reference: {reference}");
        }
        for (index, source) in self.sources.iter().enumerate() {
            let mark = if source.selected { '*' } else { ' ' };
            let _ = writeln!(out, "source {index}{mark} {} ({})", source.path, source.key);
        }
        for (index, stage) in self.stages.iter().enumerate() {
            let _ = writeln!(
                out,
                "[{index}] {} ({}) -> {}  settings {}",
                stage.name, stage.link, stage.output, stage.settings
            );
        }
        if self.stages.is_empty() {
            out.push_str("no stages\n");
        }
        out
    }
}

const fn kind_label(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Image => "image",
        ArtifactKind::Points => "points",
        ArtifactKind::Contours => "contours",
        ArtifactKind::Classification => "classification",
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
