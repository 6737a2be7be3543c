use linkchain_pipeline::pictograph;
use linkchain_pipeline::types::Classification;
use linkchain_pipeline::types::PointSet;
use linkchain_pipeline::types::RgbaImage;

pub fn pictograph(points: &PointSet, image: &RgbaImage) -> Classification {
    pictograph::classify(points, Some(image))
}
