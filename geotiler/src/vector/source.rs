//! Vector feature sources.

use std::collections::VecDeque;

use geo::Geometry;

use super::feature::FeatureSchema;
use super::record::Attributes;
use crate::error::TileResult;

/// A source feature to be split across tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFeature {
    pub shape_id: i64,
    pub geometry: Geometry<f64>,
    pub attributes: Attributes,
}

impl SourceFeature {
    pub fn new(shape_id: i64, geometry: impl Into<Geometry<f64>>, attributes: Attributes) -> Self {
        Self {
            shape_id,
            geometry: geometry.into(),
            attributes,
        }
    }
}

/// Streams features from a vector dataset.
///
/// Bindings to shapefile readers or other vector libraries implement this;
/// the splitter only iterates.
pub trait VectorFeatureSource {
    /// Attribute fields of the dataset.
    fn schema(&self) -> FeatureSchema;

    /// The next feature, or `None` when exhausted.
    fn next_feature(&mut self) -> TileResult<Option<SourceFeature>>;
}

/// Features held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeatureSource {
    schema: FeatureSchema,
    features: VecDeque<SourceFeature>,
}

impl MemoryFeatureSource {
    pub fn new(schema: FeatureSchema, features: Vec<SourceFeature>) -> Self {
        Self {
            schema,
            features: features.into(),
        }
    }

    pub fn push(&mut self, feature: SourceFeature) {
        self.features.push_back(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl VectorFeatureSource for MemoryFeatureSource {
    fn schema(&self) -> FeatureSchema {
        self.schema.clone()
    }

    fn next_feature(&mut self) -> TileResult<Option<SourceFeature>> {
        Ok(self.features.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::point;

    #[test]
    fn test_memory_source_drains_in_order() {
        let mut source = MemoryFeatureSource::new(
            FeatureSchema::new(["name"]),
            vec![
                SourceFeature::new(1, point!(x: 0.0, y: 0.0), Attributes::new()),
                SourceFeature::new(2, point!(x: 1.0, y: 1.0), Attributes::new()),
            ],
        );
        assert_eq!(source.len(), 2);
        assert_eq!(source.schema().fields(), &["name".to_string()]);

        assert_eq!(source.next_feature().unwrap().unwrap().shape_id, 1);
        assert_eq!(source.next_feature().unwrap().unwrap().shape_id, 2);
        assert!(source.next_feature().unwrap().is_none());
        assert!(source.is_empty());
    }
}
