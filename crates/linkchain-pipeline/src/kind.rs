//! The closed set of stage kinds and their per-kind dispatch.
//!
//! Each [`StageKind`] carries a fixed parameter table, the input keys it
//! accepts, and the shape of what it produces. [`validate`] turns a
//! settings map into a typed [`StageSettings`], and
//! [`StageSettings::recompute`] runs the transform.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::artifact::{self, ToContours, ToImage, ToPoints};
use crate::contours::{self, ContourSettings};
use crate::crop::{self, CropSettings};
use crate::keys;
use crate::settings::{self, Correction, Param, SettingsMap, Validator};
use crate::threshold::{self, ThresholdSettings};
use crate::types::{Artifact, ArtifactKind, Dimensions};
use crate::{mineral, pictograph};

/// Identifies one of the supported stage kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Blank pixels outside a rectangle.
    Crop,
    /// HSV in-range mask.
    Threshold,
    /// Border following.
    Contours,
    /// Point-count classifier.
    Pictograph,
    /// Circle-fit roundness classifier.
    Mineral,
}

/// A `TYPE` value that names no stage kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage kind {0:?}")]
pub struct UnknownKind(pub String);

impl StageKind {
    /// Every kind, in menu order.
    pub const ALL: [Self; 5] = [
        Self::Crop,
        Self::Threshold,
        Self::Contours,
        Self::Pictograph,
        Self::Mineral,
    ];

    /// Identifier stored under `TYPE` and `<LINK>`.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Crop => "CROP",
            Self::Threshold => "THRESHOLD",
            Self::Contours => "CONTOURS",
            Self::Pictograph => "PICTOGRAPH",
            Self::Mineral => "MINERAL",
        }
    }

    /// Look up a kind by identifier (surrounding whitespace ignored).
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Library module implementing the kind; also the generated method name.
    #[must_use]
    pub const fn module(self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::Threshold => "threshold",
            Self::Contours => "contours",
            Self::Pictograph => "pictograph",
            Self::Mineral => "mineral",
        }
    }

    /// Parameter table in file order.
    #[must_use]
    pub const fn params(self) -> &'static [Param] {
        match self {
            Self::Crop => crop::PARAMS,
            Self::Threshold => threshold::PARAMS,
            Self::Contours => contours::PARAMS,
            Self::Pictograph | Self::Mineral => &[],
        }
    }

    /// Input key fed by a single `IMAGE_IN` path.
    #[must_use]
    pub const fn primary_key(self) -> &'static str {
        match self {
            Self::Crop | Self::Threshold | Self::Contours => keys::IMAGE,
            Self::Pictograph => keys::POINTS,
            Self::Mineral => keys::CONTOURS,
        }
    }

    /// Keys accepted when the stage heads a join chain.
    #[must_use]
    pub const fn join_keys(self) -> &'static [&'static str] {
        match self {
            Self::Crop | Self::Threshold | Self::Contours => &[keys::IMAGE],
            Self::Pictograph => &[keys::POINTS, keys::IMAGE],
            Self::Mineral => &[keys::CONTOURS, keys::IMAGE],
        }
    }

    /// Returns `true` if `key` is one of [`join_keys`](Self::join_keys).
    #[must_use]
    pub fn accepts_key(self, key: &str) -> bool {
        self.join_keys().contains(&key)
    }

    /// Shape of the stage's output.
    #[must_use]
    pub const fn output_kind(self) -> ArtifactKind {
        match self {
            Self::Crop | Self::Threshold => ArtifactKind::Image,
            Self::Contours => ArtifactKind::Contours,
            Self::Pictograph | Self::Mineral => ArtifactKind::Classification,
        }
    }

    /// Shape expected for an input key.
    #[must_use]
    pub fn input_kind(key: &str) -> ArtifactKind {
        match key {
            keys::POINTS => ArtifactKind::Points,
            keys::CONTOURS => ArtifactKind::Contours,
            _ => ArtifactKind::Image,
        }
    }

    /// Keys written after the parameters that are never read back.
    #[must_use]
    pub const fn computed_keys(self) -> &'static [&'static str] {
        match self {
            Self::Pictograph | Self::Mineral => &[keys::CLASS],
            Self::Crop | Self::Threshold | Self::Contours => &[],
        }
    }

    /// Returns `true` if `key` is one of this kind's parameters.
    #[must_use]
    pub fn is_param(self, key: &str) -> bool {
        self.params().iter().any(|p| p.key == key)
    }

    /// Returns `true` if `key` may appear in this kind's settings file.
    #[must_use]
    pub fn is_known_key(self, key: &str) -> bool {
        matches!(
            key,
            keys::TYPE | keys::IMAGE_IN | keys::IMAGE_OUT | keys::LINK_FILE
        ) || self.is_param(key)
            || self.computed_keys().contains(&key)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StageKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| UnknownKind(s.to_owned()))
    }
}

/// Artifacts feeding one stage, keyed by input key.
#[derive(Debug, Clone, Default)]
pub struct Inputs(IndexMap<String, Artifact>);

impl Inputs {
    /// No inputs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A single artifact under `key`.
    #[must_use]
    pub fn single(key: impl Into<String>, artifact: Artifact) -> Self {
        let mut inputs = Self::new();
        inputs.insert(key, artifact);
        inputs
    }

    /// Store an artifact, replacing any previous one under `key`.
    pub fn insert(&mut self, key: impl Into<String>, artifact: Artifact) {
        self.0.insert(key.into(), artifact);
    }

    /// The artifact under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Artifact> {
        self.0.get(key)
    }

    /// Keys and artifacts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Artifact)> {
        self.0.iter().map(|(k, a)| (k.as_str(), a))
    }

    /// Number of inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no inputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Size of the artifact under `key`, or the placeholder size.
    #[must_use]
    pub fn dimensions(&self, key: &str) -> Dimensions {
        self.get(key)
            .map_or(Dimensions::PLACEHOLDER, Artifact::dimensions)
    }
}

/// Typed, validated settings of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSettings {
    /// Crop rectangle.
    Crop(CropSettings),
    /// HSV window.
    Threshold(ThresholdSettings),
    /// Contour extraction options.
    Contours(ContourSettings),
    /// Pictograph classifier (no parameters).
    Pictograph,
    /// Mineral classifier (no parameters).
    Mineral,
}

impl StageSettings {
    /// The kind these settings belong to.
    #[must_use]
    pub const fn kind(&self) -> StageKind {
        match self {
            Self::Crop(_) => StageKind::Crop,
            Self::Threshold(_) => StageKind::Threshold,
            Self::Contours(_) => StageKind::Contours,
            Self::Pictograph => StageKind::Pictograph,
            Self::Mineral => StageKind::Mineral,
        }
    }

    /// Compute the stage output. Missing inputs become placeholders.
    #[must_use]
    pub fn recompute(&self, inputs: &Inputs) -> Artifact {
        let image = || {
            inputs
                .get(keys::IMAGE)
                .map_or_else(artifact::placeholder_image, ToImage::to_image)
        };
        match self {
            Self::Crop(s) => Artifact::Image(crop::apply(&image(), s)),
            Self::Threshold(s) => Artifact::Image(threshold::apply(&image(), s)),
            Self::Contours(s) => Artifact::Contours(contours::apply(&image(), s)),
            Self::Pictograph => {
                let points = inputs
                    .get(keys::POINTS)
                    .map_or_else(artifact::placeholder_points, ToPoints::to_points);
                let backdrop = inputs.get(keys::IMAGE).map(ToImage::to_image);
                Artifact::Classification(pictograph::classify(&points, backdrop.as_ref()))
            }
            Self::Mineral => {
                let contours = inputs
                    .get(keys::CONTOURS)
                    .map_or_else(artifact::placeholder_contours, ToContours::to_contours);
                let backdrop = inputs.get(keys::IMAGE).map(ToImage::to_image);
                Artifact::Classification(mineral::classify(&contours, backdrop.as_ref()))
            }
        }
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    /// Typed settings.
    pub settings: StageSettings,
    /// Every value rewritten in the map.
    pub corrections: Vec<Correction>,
}

/// Insert the kind's defaults for every missing parameter.
///
/// Returns the number of keys inserted.
pub fn apply_defaults(kind: StageKind, map: &mut SettingsMap, dimensions: Dimensions) -> usize {
    settings::apply_param_defaults(kind.params(), map, dimensions)
}

/// Run the kind's validation rules over `map`, rewriting it in place.
pub fn validate(kind: StageKind, map: &mut SettingsMap, dimensions: Dimensions) -> Validated {
    let mut v = Validator::new(map);
    let settings = match kind {
        StageKind::Crop => StageSettings::Crop(crop::validate(&mut v, dimensions)),
        StageKind::Threshold => StageSettings::Threshold(threshold::validate(&mut v)),
        StageKind::Contours => StageSettings::Contours(contours::validate(&mut v)),
        StageKind::Pictograph => StageSettings::Pictograph,
        StageKind::Mineral => StageSettings::Mineral,
    };
    Validated {
        settings,
        corrections: v.finish(),
    }
}
