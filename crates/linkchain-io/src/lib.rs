//! linkchain-io: Filesystem adapter.
//!
//! Loads input artifacts by extension, writes outputs, saves and loads
//! stage, chain and join files, and runs chains end to end.

pub mod persist;
pub mod run;
pub mod source;
pub mod write;

pub use persist::{
    LoadError, load_chain, load_join, open_stage, save_chain, save_emission, save_join, save_stage,
};
pub use run::{run_chain, run_join, write_resolution};
pub use source::FsSource;
pub use write::{SaveError, write_artifact, write_text};
