use std::collections::BTreeMap;

use scene::{BuildingProperties, FeatureCollection, HeightSource, RoadProperties};
use serde::{Deserialize, Serialize};

/// Summary written next to the feature files by the data pipeline.
/// Display-only: nothing in layer composition reads it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetMetadata {
    pub city: String,
    /// ISO-8601 timestamp, kept verbatim.
    pub generated_at: Option<String>,
    pub bounds: Option<Bounds>,
    pub center: Option<Center>,
    pub stats: DatasetStats,
    pub data_sources: BTreeMap<String, String>,
    pub files: DatasetFiles,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    pub fn center(&self) -> Center {
        Center {
            lon: (self.west + self.east) / 2.0,
            lat: (self.south + self.north) / 2.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetStats {
    pub buildings_count: usize,
    pub roads_count: usize,
    pub avg_building_height: Option<f64>,
    pub max_building_height: Option<f64>,
    pub height_sources: BTreeMap<String, usize>,
    pub pct_known_height: Option<f64>,
}

/// File names relative to the dataset directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetFiles {
    pub buildings: String,
    pub roads: String,
    pub pois: String,
}

impl Default for DatasetFiles {
    fn default() -> Self {
        Self {
            buildings: "buildings.geojson".to_string(),
            roads: "roads.geojson".to_string(),
            pois: "pois.geojson".to_string(),
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

impl DatasetStats {
    /// Recomputes the pipeline's summary from loaded collections.
    pub fn from_collections(
        buildings: &FeatureCollection<BuildingProperties>,
        roads: &FeatureCollection<RoadProperties>,
    ) -> Self {
        let mut height_sources: BTreeMap<String, usize> = BTreeMap::new();
        let (mut sum, mut n, mut max) = (0.0, 0usize, None::<f64>);
        for b in buildings.iter() {
            *height_sources
                .entry(b.properties.height_source.as_str().to_string())
                .or_default() += 1;
            if let Some(h) = b.properties.valid_height() {
                sum += h;
                n += 1;
                max = Some(max.map_or(h, |m| m.max(h)));
            }
        }

        let total = buildings.len();
        let defaulted = height_sources
            .get(HeightSource::Default.as_str())
            .copied()
            .unwrap_or(0);
        let pct_known_height = (total > 0)
            .then(|| round1((1.0 - defaulted as f64 / total as f64) * 100.0));

        Self {
            buildings_count: total,
            roads_count: roads.len(),
            avg_building_height: (n > 0).then(|| round1(sum / n as f64)),
            max_building_height: max.map(round1),
            height_sources,
            pct_known_height,
        }
    }
}
