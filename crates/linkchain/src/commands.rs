//! Subcommand handlers.

use std::path::Path;

use linkchain_export::{emit_chain, emit_resolution};
use linkchain_io::{
    FsSource, LoadError, SaveError, load_chain, load_join, open_stage, run_chain, run_join,
    save_chain, save_emission, save_join, save_stage, write_artifact,
};
use linkchain_pipeline::{
    Chain, ChainError, JoinChain, Resolution, SettingsMap, SourceAdded, StageArgs,
    StageDescriptor,
};
use serde::Serialize;
use serde_json::Value;

use crate::report::{ChainView, RunReport, StageReport};
use crate::{AppendArgs, ChainCmd, JoinCmd, StageCmd};

/// Failures reported to the user.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("--settings-json value for {key:?} must be a string, number, boolean or null")]
    JsonValue { key: String },

    #[error("the stage has no IMAGE_OUT to write to")]
    NoOutputPath,
}

/// How a command that ran to completion went.
pub enum Outcome {
    Done,
    /// A chain stopped before its last stage.
    Incomplete,
}

pub fn stage(cmd: &StageCmd, json: bool) -> Result<Outcome, CliError> {
    let mut overrides = match &cmd.settings_json {
        Some(text) => json_settings(text)?,
        None => SettingsMap::new(),
    };
    overrides.overlay(&StageArgs::parse(&cmd.args));

    let mut stage = open_stage(cmd.settings.as_deref(), &overrides, &FsSource)?;
    if let Some(path) = &cmd.save {
        save_stage(&mut stage, path)?;
    }
    if cmd.write {
        let path = stage.output_path().ok_or(CliError::NoOutputPath)?;
        write_artifact(path, stage.output())?;
    }
    if let Some(path) = &cmd.emit {
        save_emission(&emit_chain(std::slice::from_ref(&stage)), path)?;
    }

    print(&StageReport::new(0, stage.kind().module(), &stage), json, StageReport::render)?;
    Ok(Outcome::Done)
}

pub fn chain(cmd: ChainCmd, json: bool) -> Result<Outcome, CliError> {
    match cmd {
        ChainCmd::New { file, reference } => {
            save_chain(&mut Chain::new(reference), &file)?;
        }
        ChainCmd::Reference { file, path } => {
            let mut chain = load_chain(&file)?;
            chain.set_reference(Some(path));
            save_chain(&mut chain, &file)?;
        }
        ChainCmd::Append { file, stage } => {
            let mut chain = load_chain(&file)?;
            chain.append(descriptor(stage, chain.len()))?;
            save_chain(&mut chain, &file)?;
        }
        ChainCmd::Pop { file } => {
            let mut chain = load_chain(&file)?;
            if chain.pop().is_none() {
                tracing::warn!(file = %file.display(), "chain has no stages");
            }
            save_chain(&mut chain, &file)?;
        }
        ChainCmd::Show { file } => {
            let chain = load_chain(&file)?;
            print(&ChainView::chain(&chain), json, ChainView::render)?;
        }
        ChainCmd::Run { file } => {
            let chain = load_chain(&file)?;
            let resolution = run_chain(&chain)?;
            return finish(chain.descriptors(), &resolution, json);
        }
        ChainCmd::Export { file, out } => {
            let chain = load_chain(&file)?;
            return export(&chain.resolve(&FsSource), out.as_deref());
        }
    }
    Ok(Outcome::Done)
}

pub fn join(cmd: JoinCmd, json: bool) -> Result<Outcome, CliError> {
    match cmd {
        JoinCmd::New { file } => {
            save_join(&mut JoinChain::new(), &file)?;
        }
        JoinCmd::Add { file, path, key } => {
            let mut join = load_join(&file)?;
            if join.add_source(path, key)? == SourceAdded::FirstStageMissing {
                eprintln!("note: the join chain has no stage yet; the key is checked on append");
            }
            save_join(&mut join, &file)?;
        }
        JoinCmd::Remove { file, index } => {
            let mut join = load_join(&file)?;
            join.remove_source(index)?;
            save_join(&mut join, &file)?;
        }
        JoinCmd::Select { file, index, off } => {
            let mut join = load_join(&file)?;
            join.select(index, !off)?;
            save_join(&mut join, &file)?;
        }
        JoinCmd::Append { file, stage } => {
            let mut join = load_join(&file)?;
            join.append(descriptor(stage, join.chain().len()))?;
            save_join(&mut join, &file)?;
        }
        JoinCmd::Pop { file } => {
            let mut join = load_join(&file)?;
            if join.pop().is_none() {
                tracing::warn!(file = %file.display(), "join chain has no stages");
            }
            save_join(&mut join, &file)?;
        }
        JoinCmd::Show { file } => {
            let join = load_join(&file)?;
            print(&ChainView::join(&join), json, ChainView::render)?;
        }
        JoinCmd::Run { file } => {
            let join = load_join(&file)?;
            let resolution = run_join(&join)?;
            return finish(join.chain().descriptors(), &resolution, json);
        }
        JoinCmd::Export { file, out } => {
            let join = load_join(&file)?;
            return export(&join.resolve(&FsSource), out.as_deref());
        }
    }
    Ok(Outcome::Done)
}

fn descriptor(args: AppendArgs, position: usize) -> StageDescriptor {
    let name = args
        .name
        .unwrap_or_else(|| format!("{}_{position}", args.kind.module()));
    StageDescriptor {
        settings: args.settings,
        ..StageDescriptor::new(name, args.kind, args.out)
    }
}

fn finish(
    descriptors: &[StageDescriptor],
    resolution: &Resolution,
    json: bool,
) -> Result<Outcome, CliError> {
    print(&RunReport::new(descriptors, resolution), json, RunReport::render)?;
    Ok(outcome(resolution))
}

fn export(resolution: &Resolution, out: Option<&Path>) -> Result<Outcome, CliError> {
    let emission = emit_resolution(resolution);
    match out {
        Some(path) => save_emission(&emission, path)?,
        None => print!("{}", emission.render()),
    }
    if let Some(failure) = &resolution.failure {
        eprintln!("error: {failure}");
    }
    Ok(outcome(resolution))
}

const fn outcome(resolution: &Resolution) -> Outcome {
    if resolution.is_complete() {
        Outcome::Done
    } else {
        Outcome::Incomplete
    }
}

fn print<T: Serialize>(
    report: &T,
    json: bool,
    text: impl FnOnce(&T) -> String,
) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", text(report));
    }
    Ok(())
}

/// Flatten a JSON object of scalars into settings.
fn json_settings(text: &str) -> Result<SettingsMap, CliError> {
    let object: serde_json::Map<String, Value> = serde_json::from_str(text)?;
    object
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => return Err(CliError::JsonValue { key }),
            };
            Ok((key, value))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn json_settings_accepts_scalars() {
        let map = json_settings(r#"{"TYPE": "CROP", "CROP_LEFT": 4, "INVERT": true, "X": null}"#)
            .unwrap();
        assert_eq!(map.get("TYPE"), Some("CROP"));
        assert_eq!(map.get("CROP_LEFT"), Some("4"));
        assert_eq!(map.get("INVERT"), Some("true"));
        assert_eq!(map.get("X"), Some(""));
    }

    #[test]
    fn json_settings_rejects_nested_values() {
        assert!(matches!(
            json_settings(r#"{"CROP_LEFT": [1]}"#),
            Err(CliError::JsonValue { .. })
        ));
        assert!(matches!(json_settings("[1, 2]"), Err(CliError::Json(_))));
    }
}
