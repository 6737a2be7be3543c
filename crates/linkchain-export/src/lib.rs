//! linkchain-export: Rust source export for resolved chains (sans-IO)
//!
//! Turns the stages of a resolved chain into one Rust file: the union of
//! every stage's `use` lines followed by one function per stage.

pub mod rust;

pub use rust::{ChainEmission, emit_chain, emit_resolution};
