use linkchain_pipeline::artifact::ToImage;
use linkchain_pipeline::artifact::ToPoints;
use linkchain_pipeline::contours::ApproxMethod;
use linkchain_pipeline::contours::ContourSettings;
use linkchain_pipeline::contours::RetrievalMode;
use linkchain_pipeline::contours;
use linkchain_pipeline::crop::CropSettings;
use linkchain_pipeline::crop;
use linkchain_pipeline::mineral;
use linkchain_pipeline::pictograph;
use linkchain_pipeline::threshold::ThresholdSettings;
use linkchain_pipeline::threshold;
use linkchain_pipeline::types::Classification;
use linkchain_pipeline::types::ContourSet;
use linkchain_pipeline::types::RgbaImage;

pub fn crop(input: &RgbaImage) -> RgbaImage {
    let settings = CropSettings {
        left: 0,
        right: 12,
        top: 0,
        bottom: 8,
    };
    crop::apply(input, &settings)
}

pub fn threshold(input: &RgbaImage) -> RgbaImage {
    let settings = ThresholdSettings {
        hue_min: 0,
        hue_max: 179,
        sat_min: 0,
        sat_max: 255,
        val_min: 0,
        val_max: 255,
        invert: false,
    };
    threshold::apply(input, &settings)
}

pub fn contours(input: &RgbaImage) -> ContourSet {
    let settings = ContourSettings {
        mode: RetrievalMode::External,
        method: ApproxMethod::Simple,
    };
    contours::apply(input, &settings)
}

pub fn mineral(input: &ContourSet) -> Classification {
    mineral::classify(input, None)
}

pub fn crop_4(input: &Classification) -> RgbaImage {
    let settings = CropSettings {
        left: 0,
        right: 12,
        top: 0,
        bottom: 8,
    };
    crop::apply(&input.to_image(), &settings)
}

pub fn contours_5(input: &RgbaImage) -> ContourSet {
    let settings = ContourSettings {
        mode: RetrievalMode::External,
        method: ApproxMethod::Simple,
    };
    contours::apply(input, &settings)
}

pub fn pictograph(input: &ContourSet) -> Classification {
    pictograph::classify(&input.to_points(), None)
}
