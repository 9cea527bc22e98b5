pub mod builders;
pub mod circle;
pub mod feature;

pub use builders::{horizon_features, object_features, projection_features, ring_features};
pub use circle::{generate_circle, DEFAULT_SEGMENTS};
pub use feature::{
    AttributeValue, Extent, FeatureBatch, FeatureKind, FeatureLayer, GeometryFeature, GeometryType,
};
