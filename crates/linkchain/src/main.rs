//! linkchain: build, run and export image-transform stage chains.
//!
//! ```text
//! linkchain stage TYPE=CROP IMAGE_IN=in.png CROP_LEFT=10 --save crop.link
//! linkchain chain new demo.chain --reference in.png
//! linkchain chain append demo.chain --kind CROP --out crop.png
//! linkchain chain run demo.chain --json
//! linkchain chain export demo.chain --out demo.rs
//! ```
//!
//! Stage settings, chain files and join files are plain text and can be
//! edited between runs; every run re-reads them.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod commands;
mod logging;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use linkchain_pipeline::StageKind;

/// Build, run and export chains of configurable image-transform stages.
#[derive(Parser)]
#[command(name = "linkchain", version)]
struct Cli {
    /// Raise log verbosity (repeatable). `RUST_LOG` overrides it.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print reports as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Instantiate one stage from a settings file and `KEY=VALUE` arguments.
    Stage(StageCmd),

    /// Create, edit, run and export a chain file.
    #[command(subcommand)]
    Chain(ChainCmd),

    /// Create, edit, run and export a join file.
    #[command(subcommand)]
    Join(JoinCmd),
}

#[derive(Args)]
struct StageCmd {
    /// Stage settings file to start from.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Settings as a flat JSON object, applied after `--settings`.
    #[arg(long)]
    settings_json: Option<String>,

    /// Save the validated settings to this file.
    #[arg(long)]
    save: Option<PathBuf>,

    /// Write the output artifact to `IMAGE_OUT`.
    #[arg(long)]
    write: bool,

    /// Write generated Rust source for the stage to this file.
    #[arg(long)]
    emit: Option<PathBuf>,

    /// `KEY=VALUE` settings, applied last.
    args: Vec<String>,
}

/// Stage descriptor arguments shared by `chain append` and `join append`.
#[derive(Args)]
struct AppendArgs {
    /// Stage kind identifier (`CROP`, `THRESHOLD`, `CONTOURS`,
    /// `PICTOGRAPH`, `MINERAL`).
    #[arg(long, value_parser = parse_kind)]
    kind: StageKind,

    /// Output artifact path.
    #[arg(long)]
    out: PathBuf,

    /// Stage name; defaults to the kind in lower case plus its position.
    #[arg(long)]
    name: Option<String>,

    /// Explicit stage settings path; defaults to `<chain dir>/<name>.link`.
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ChainCmd {
    /// Create an empty chain file.
    New {
        file: PathBuf,
        /// Input of the first stage.
        #[arg(long)]
        reference: Option<PathBuf>,
    },
    /// Replace the reference input.
    Reference { file: PathBuf, path: PathBuf },
    /// Append a stage.
    Append {
        file: PathBuf,
        #[command(flatten)]
        stage: AppendArgs,
    },
    /// Remove the last stage.
    Pop { file: PathBuf },
    /// Print the chain file's stages.
    Show { file: PathBuf },
    /// Resolve every stage and write outputs and settings files.
    Run { file: PathBuf },
    /// Resolve and write generated Rust source.
    Export {
        file: PathBuf,
        /// Destination; prints to stdout when absent.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum JoinCmd {
    /// Create an empty join file.
    New { file: PathBuf },
    /// Record a keyed source.
    Add {
        file: PathBuf,
        path: PathBuf,
        /// Input key of the first stage (`IMAGE`, `POINTS`, `CONTOURS`).
        key: String,
    },
    /// Remove the source at a position.
    Remove { file: PathBuf, index: usize },
    /// Select or deselect the source at a position.
    Select {
        file: PathBuf,
        index: usize,
        /// Deselect instead.
        #[arg(long)]
        off: bool,
    },
    /// Append a stage.
    Append {
        file: PathBuf,
        #[command(flatten)]
        stage: AppendArgs,
    },
    /// Remove the last stage.
    Pop { file: PathBuf },
    /// Print sources and stages.
    Show { file: PathBuf },
    /// Resolve from the selected sources and write outputs.
    Run { file: PathBuf },
    /// Resolve and write generated Rust source.
    Export {
        file: PathBuf,
        /// Destination; prints to stdout when absent.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_kind(value: &str) -> Result<StageKind, String> {
    StageKind::from_id(&value.to_ascii_uppercase()).ok_or_else(|| {
        let known: Vec<&str> = StageKind::ALL.iter().map(|k| k.id()).collect();
        format!("unknown stage kind {value:?} (expected one of {})", known.join(", "))
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Command::Stage(cmd) => commands::stage(&cmd, cli.json),
        Command::Chain(cmd) => commands::chain(cmd, cli.json),
        Command::Join(cmd) => commands::join(cmd, cli.json),
    };

    match result {
        Ok(commands::Outcome::Done) => ExitCode::SUCCESS,
        Ok(commands::Outcome::Incomplete) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
