//! Boundary dataset: serde model and read-only name lookup
//!
//! The bundled dataset is a GeoJSON-shaped feature collection where every
//! feature carries a country name and a `Polygon` or `MultiPolygon`
//! geometry, coordinates in `[longitude, latitude]` order, degrees. This
//! module parses that subset and exposes it as a case-insensitive lookup;
//! it never mutates the data after construction.

use crate::math::Ring;
use crate::Result;
use geo::Coord;
use serde::Deserialize;
use std::collections::HashMap;

/// A feature collection as bundled with the application.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// One named boundary feature.
///
/// Datasets disagree on where the name lives: some put it at the feature
/// top level, others under `properties.name`. Both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    properties: Option<FeatureProperties>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FeatureProperties {
    #[serde(default)]
    name: Option<String>,
}

impl Feature {
    /// The feature's name, from the top level or from `properties`.
    pub fn name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.properties.as_ref().and_then(|p| p.name.as_deref()))
    }
}

/// Boundary geometry, restricted to the two types this engine consumes.
///
/// A polygon's first ring is its exterior boundary; holes are parsed but
/// never rendered.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

impl Geometry {
    /// The exterior ring of every polygon in this geometry.
    pub fn exterior_rings(&self) -> Vec<Ring> {
        match self {
            Geometry::Polygon { coordinates } => {
                coordinates.first().map(|ring| to_ring(ring)).into_iter().collect()
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .filter_map(|polygon| polygon.first().map(|ring| to_ring(ring)))
                .collect(),
        }
    }
}

fn to_ring(positions: &[[f64; 2]]) -> Ring {
    positions
        .iter()
        .map(|&[lon, lat]| Coord { x: lon, y: lat })
        .collect()
}

/// Read-only lookup of named boundary features.
#[derive(Debug, Clone)]
pub struct BoundaryStore {
    features: HashMap<String, Feature>,
}

impl BoundaryStore {
    /// Parse a GeoJSON-shaped dataset.
    ///
    /// This is the only place a malformed dataset surfaces as an error; it
    /// is a construction-time failure, not a per-lookup one.
    pub fn from_geojson(text: &str) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_str(text)?;
        Ok(Self::from_collection(collection))
    }

    /// Build a store from an already-parsed collection.
    ///
    /// Unnamed features cannot be looked up and are skipped with a warning.
    pub fn from_collection(collection: FeatureCollection) -> Self {
        let mut features = HashMap::with_capacity(collection.features.len());
        for feature in collection.features {
            match feature.name() {
                Some(name) => {
                    features.insert(name.to_lowercase(), feature);
                }
                None => {
                    tracing::warn!("skipping unnamed feature in boundary dataset");
                }
            }
        }
        Self { features }
    }

    /// Look up a feature by country name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.get(&name.to_lowercase())
    }

    /// Number of named features in the store.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the store holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
