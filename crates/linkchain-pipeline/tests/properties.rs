//! Property tests for settings validation and the stage transforms.

#![allow(clippy::unwrap_used)]

use image::Rgba;
use linkchain_pipeline::contours::{self, RetrievalMode};
use linkchain_pipeline::crop::{self, CROP_LEFT, CROP_RIGHT, CropSettings};
use linkchain_pipeline::settings::Choice;
use linkchain_pipeline::threshold::{HUE_MAX, HUE_MIN};
use linkchain_pipeline::{
    Artifact, Dimensions, MemorySource, Point, RgbaImage, SettingsMap, Stage, StageConfig,
    StageKind, apply_defaults, pictograph, validate,
};
use proptest::prelude::*;

fn any_kind() -> impl Strategy<Value = StageKind> {
    prop::sample::select(StageKind::ALL.to_vec())
}

fn any_value() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i64>().prop_map(|v| v.to_string()),
        (-10i64..700).prop_map(|v| v.to_string()),
        "[A-Za-z ]{0,8}",
        Just("true".to_owned()),
        Just("SIMPLE".to_owned()),
        Just("TREE".to_owned()),
    ]
}

fn any_dimensions() -> impl Strategy<Value = Dimensions> {
    (1u32..800, 1u32..600).prop_map(|(width, height)| Dimensions { width, height })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn defaults_then_validate_is_idempotent(
        kind in any_kind(),
        dims in any_dimensions(),
        values in prop::collection::vec(any_value(), 8),
    ) {
        let mut map = SettingsMap::new();
        for (param, value) in kind.params().iter().zip(values) {
            map.set(param.key, value);
        }
        apply_defaults(kind, &mut map, dims);
        let first = validate(kind, &mut map, dims);
        let snapshot = map.clone();

        prop_assert_eq!(apply_defaults(kind, &mut map, dims), 0);
        let second = validate(kind, &mut map, dims);
        prop_assert!(second.corrections.is_empty());
        prop_assert_eq!(first.settings, second.settings);
        prop_assert_eq!(map, snapshot);
    }

    #[test]
    fn crop_bounds_fall_back_inside_image(
        dims in any_dimensions(),
        left in any::<i64>(),
        right in any::<i64>(),
    ) {
        let mut map: SettingsMap = [(CROP_LEFT, left.to_string()), (CROP_RIGHT, right.to_string())]
            .into_iter()
            .collect();
        apply_defaults(StageKind::Crop, &mut map, dims);
        let validated = validate(StageKind::Crop, &mut map, dims);
        let linkchain_pipeline::StageSettings::Crop(settings) = validated.settings else {
            unreachable!()
        };
        prop_assert!(settings.right <= dims.width);
        prop_assert!(settings.left <= settings.right);
        let expected_right = if (0..=i64::from(dims.width)).contains(&right) {
            u32::try_from(right).unwrap()
        } else {
            dims.width
        };
        let expected_text = expected_right.to_string();
        prop_assert_eq!(settings.right, expected_right);
        prop_assert_eq!(map.get(CROP_RIGHT), Some(expected_text.as_str()));
    }

    #[test]
    fn hue_bounds_stay_in_eight_bit_range(low in any::<i64>(), high in any::<i64>()) {
        let dims = Dimensions::PLACEHOLDER;
        let mut map: SettingsMap = [(HUE_MIN, low.to_string()), (HUE_MAX, high.to_string())]
            .into_iter()
            .collect();
        apply_defaults(StageKind::Threshold, &mut map, dims);
        let linkchain_pipeline::StageSettings::Threshold(settings) =
            validate(StageKind::Threshold, &mut map, dims).settings
        else {
            unreachable!()
        };
        prop_assert!(settings.hue_max <= 179);
        prop_assert!(settings.hue_min <= settings.hue_max);
    }

    #[test]
    fn unknown_mode_falls_back_to_default(label in "[A-Z]{1,10}") {
        let mut map: SettingsMap = [(contours::MODE, label.clone())].into_iter().collect();
        let dims = Dimensions::PLACEHOLDER;
        apply_defaults(StageKind::Contours, &mut map, dims);
        let linkchain_pipeline::StageSettings::Contours(settings) =
            validate(StageKind::Contours, &mut map, dims).settings
        else {
            unreachable!()
        };
        match RetrievalMode::from_label(&label) {
            Some(mode) => prop_assert_eq!(settings.mode, mode),
            None => {
                prop_assert_eq!(settings.mode, RetrievalMode::External);
                prop_assert_eq!(settings.mode.index(), 0);
                prop_assert_eq!(map.get(contours::MODE), Some("EXTERNAL"));
            }
        }
    }

    #[test]
    fn crop_blanks_columns_left_of_bound(width in 1u32..64, height in 1u32..16, left in 0u32..64) {
        let image = RgbaImage::from_pixel(width, height, Rgba([1, 2, 3, 255]));
        let left = left.min(width);
        let settings = CropSettings { left, ..CropSettings::full(Dimensions { width, height }) };
        let out = crop::apply(&image, &settings);
        prop_assert_eq!(out.dimensions(), (width, height));
        for (x, _, pixel) in out.enumerate_pixels() {
            prop_assert_eq!(pixel.0[3] == 0, x < left);
        }
    }

    #[test]
    fn pictograph_ignores_other_counts(count in 0usize..40, x in -50.0f64..50.0) {
        prop_assume!(count != 7 && count != 11);
        let points = vec![Point::new(x, 1.0); count];
        prop_assert_eq!(pictograph::class_index(&points), 0);
    }

    #[test]
    fn stage_settings_round_trip(kind in any_kind(), values in prop::collection::vec(any_value(), 8)) {
        let mut source = MemorySource::new();
        source.insert("in.png", Artifact::Image(RgbaImage::new(30, 20)));
        let mut text = format!("TYPE\t{}\nIMAGE_IN\tin.png\nIMAGE_OUT\tout.png\n", kind.id());
        for (param, value) in kind.params().iter().zip(values) {
            text.push_str(&format!("{}\t{}\n", param.key, value));
        }

        let first = Stage::instantiate(StageConfig::parse(&text), &source).unwrap();
        let saved = first.to_settings_text();
        let second = Stage::instantiate(StageConfig::parse(&saved), &source).unwrap();
        prop_assert_eq!(second.settings(), first.settings());
        prop_assert!(second.corrections().is_empty());
        prop_assert_eq!(second.to_settings_text(), saved);
    }
}
