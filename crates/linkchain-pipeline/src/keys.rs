//! Tag and key names used in settings, chain and join files.

/// Stage-kind identifier.
pub const TYPE: &str = "TYPE";
/// Single input artifact path.
pub const IMAGE_IN: &str = "IMAGE_IN";
/// Output artifact path.
pub const IMAGE_OUT: &str = "IMAGE_OUT";
/// Path of the stage's own settings file.
pub const LINK_FILE: &str = "LINK_FILE";
/// Computed classification index written by classifier stages.
pub const CLASS: &str = "CLASS";

/// Block holding one keyed input (stage files) or join source (join files).
pub const JOIN_INPUT: &str = "JOIN_INPUT";
/// Path entry inside a [`JOIN_INPUT`] block.
pub const JOIN_FILE: &str = "JOIN_FILE";
/// Key entry inside a [`JOIN_INPUT`] block.
pub const JOIN_KEY: &str = "JOIN_KEY";
/// Join source path marked active for the current run.
pub const JOIN_SELECTED: &str = "JOIN_SELECTED";

/// External input of a plain chain.
pub const CHAIN_REFERENCE: &str = "CHAIN_REFERENCE";
/// Block describing one stage of a chain.
pub const LINK_GUI: &str = "LINK_GUI";
/// Descriptor name.
pub const NAME: &str = "NAME";
/// Descriptor stage-kind identifier.
pub const LINK: &str = "LINK";
/// Descriptor output artifact path.
pub const OUT: &str = "OUT";
/// Descriptor settings file path (optional).
pub const SETTINGS: &str = "SETTINGS";
/// The chain file's own path.
pub const CHAIN_FILE: &str = "CHAIN_FILE";

/// Input key for raster images.
pub const IMAGE: &str = "IMAGE";
/// Input key for point lists.
pub const POINTS: &str = "POINTS";
/// Input key for contour lists.
pub const CONTOURS: &str = "CONTOURS";
