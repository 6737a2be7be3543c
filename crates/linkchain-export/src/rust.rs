//! Chain-level source emission.
//!
//! Each stage formats its own function through [`Stage::emit`]; this module
//! only decides the names and merges the pieces. A stage whose kind
//! already appeared earlier in the chain gets its chain position as a
//! suffix (`crop`, `threshold`, `crop_2`), so every function name in the
//! file is distinct.
//!
//! Emission reads validated settings and input shapes only. It never
//! touches pixel data, so emitting an unchanged chain twice yields
//! byte-identical text.

use std::collections::BTreeSet;

use linkchain_pipeline::{Resolution, Stage, StageKind};

/// Generated source for a whole chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainEmission {
    /// Deduplicated `use` lines, sorted.
    pub imports: BTreeSet<String>,
    /// One function definition per stage, in chain order.
    pub methods: Vec<String>,
}

impl ChainEmission {
    /// Returns `true` if no stage was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Render the file: imports, a blank line, then the functions
    /// separated by blank lines.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for import in &self.imports {
            out.push_str(import);
            out.push('\n');
        }
        for method in &self.methods {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(method);
        }
        out
    }
}

/// Emit every stage in order.
#[must_use]
pub fn emit_chain(stages: &[Stage]) -> ChainEmission {
    let mut seen: Vec<StageKind> = Vec::with_capacity(stages.len());
    let mut emission = ChainEmission::default();

    for (position, stage) in stages.iter().enumerate() {
        let kind = stage.kind();
        let suffix = if seen.contains(&kind) {
            position.to_string()
        } else {
            seen.push(kind);
            String::new()
        };
        let stage_emission = stage.emit(&suffix);
        emission.imports.extend(stage_emission.imports);
        emission.methods.push(stage_emission.body);
    }

    emission
}

/// Emit the stages a resolution produced.
///
/// A partial resolution emits the stages before the failure; the failure
/// itself is logged.
#[must_use]
pub fn emit_resolution(resolution: &Resolution) -> ChainEmission {
    if let Some(failure) = &resolution.failure {
        tracing::warn!(%failure, "emitting a partially resolved chain");
    }
    emit_chain(&resolution.stages)
}
