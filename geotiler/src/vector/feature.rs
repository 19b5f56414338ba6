//! Features emitted for a tile.

use geo::Geometry;
use serde::{Deserialize, Serialize};

use super::record::Attributes;

/// Attribute fields carried into output features.
///
/// An empty schema keeps every attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    fields: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// A schema keeping every attribute.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The attributes named by this schema that `attributes` holds.
    pub fn project(&self, attributes: &Attributes) -> Attributes {
        if self.fields.is_empty() {
            return attributes.clone();
        }
        self.fields
            .iter()
            .filter_map(|field| {
                attributes
                    .get(field)
                    .map(|value| (field.clone(), value.clone()))
            })
            .collect()
    }
}

/// A clipped geometry with its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Source shape id, or `-1` for tile corner fills.
    pub shape_id: i64,
    pub geometry: Geometry<f64>,
    pub attributes: Attributes,
}
