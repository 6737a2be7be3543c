//! linkchain-pipeline: configurable image-transform stages composed into
//! chains (sans-IO).
//!
//! A [`Stage`] owns a string-keyed settings map, validates it into a typed
//! record, and recomputes its output artifact from its inputs on every
//! edit. A [`Chain`] is an ordered list of stage descriptors that feed
//! each other; a [`JoinChain`] heads a chain with several keyed sources.
//! Every stage can emit a Rust function reproducing itself with its
//! current settings baked in.
//!
//! This crate has **no filesystem dependencies**. Inputs are loaded
//! through the [`ArtifactSource`] trait and settings are read and written
//! as text; `linkchain-io` supplies the disk-backed side.
//!
//! # Stage kinds
//!
//! | Kind         | Output         | Parameters                        |
//! |--------------|----------------|-----------------------------------|
//! | `CROP`       | image          | `CROP_LEFT/RIGHT/TOP/BOTTOM`      |
//! | `THRESHOLD`  | mask image     | `HUE/SAT/VAL_MIN/MAX`, `INVERT`   |
//! | `CONTOURS`   | contours       | `MODE`, `METHOD`                  |
//! | `PICTOGRAPH` | classification | none                              |
//! | `MINERAL`    | classification | none                              |

pub mod artifact;
pub mod chain;
pub mod contours;
pub mod crop;
pub mod emit;
pub mod format;
pub mod geometry;
pub mod join;
pub mod keys;
pub mod kind;
pub mod mineral;
pub mod pictograph;
pub mod settings;
pub mod stage;
pub mod threshold;
pub mod types;

pub use artifact::{ArtifactError, ArtifactFormat, ToContours, ToImage, ToPoints};
pub use chain::{Chain, ChainError, Resolution, ResolutionCause, ResolutionError, StageDescriptor};
pub use emit::StageEmission;
pub use join::{JoinChain, JoinSource, SourceAdded};
pub use kind::{Inputs, StageKind, StageSettings, UnknownKind, Validated, apply_defaults, validate};
pub use settings::{Correction, SettingsMap, Validator};
pub use stage::{ArtifactSource, MemorySource, Stage, StageArgs, StageConfig, StageError, StageInput};
pub use types::{
    Artifact, ArtifactKind, ArtifactSummary, Classification, Contour, ContourSet, Dimensions,
    Point, PointSet, RgbaImage,
};
