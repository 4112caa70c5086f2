use std::fs;
use std::path::{Path, PathBuf};

use scene::{BuildingProperties, FeatureCollection, PoiProperties, RoadProperties};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::geojson::{GeoJsonError, ParseMode, parse_feature_collection};
use crate::metadata::{DatasetFiles, DatasetMetadata, DatasetStats};

pub const METADATA_FILE_NAME: &str = "metadata.json";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    GeoJson {
        path: PathBuf,
        source: GeoJsonError,
    },
    #[error("invalid metadata {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Per-file count of features dropped during a lenient load.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SkippedCounts {
    pub buildings: usize,
    pub roads: usize,
    pub pois: usize,
}

impl SkippedCounts {
    pub fn total(&self) -> usize {
        self.buildings + self.roads + self.pois
    }
}

/// The pipeline's output directory, parsed.
///
/// Buildings and roads are required. POIs and `metadata.json` are optional;
/// their absence is not an error.
#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
    pub buildings: FeatureCollection<BuildingProperties>,
    pub roads: FeatureCollection<RoadProperties>,
    pub pois: Option<FeatureCollection<PoiProperties>>,
    pub metadata: Option<DatasetMetadata>,
    pub skipped: SkippedCounts,
    fingerprint: String,
}

impl Dataset {
    pub fn load(root: impl AsRef<Path>) -> Result<Self, DatasetError> {
        Self::load_with_mode(root, ParseMode::Lenient)
    }

    pub fn load_with_mode(root: impl AsRef<Path>, mode: ParseMode) -> Result<Self, DatasetError> {
        let root = root.as_ref().to_path_buf();
        let mut hasher = blake3::Hasher::new();

        let metadata = load_metadata(&root, &mut hasher)?;
        let files = metadata
            .as_ref()
            .map(|m| m.files.clone())
            .unwrap_or_default();

        let (buildings, skipped_buildings) =
            load_collection::<BuildingProperties>(&root.join(&files.buildings), mode, &mut hasher)?;
        let (roads, skipped_roads) =
            load_collection::<RoadProperties>(&root.join(&files.roads), mode, &mut hasher)?;

        let pois_path = root.join(&files.pois);
        let (pois, skipped_pois) = if pois_path.is_file() {
            let (pois, skipped) =
                load_collection::<PoiProperties>(&pois_path, mode, &mut hasher)?;
            (Some(pois), skipped)
        } else {
            debug!(path = %pois_path.display(), "no POI file, POI layer disabled");
            (None, 0)
        };

        let skipped = SkippedCounts {
            buildings: skipped_buildings,
            roads: skipped_roads,
            pois: skipped_pois,
        };
        let fingerprint = hasher.finalize().to_hex().to_string();
        let short = fingerprint.get(..12).unwrap_or(&fingerprint);

        info!(
            root = %root.display(),
            buildings = buildings.len(),
            roads = roads.len(),
            pois = pois.as_ref().map_or(0, FeatureCollection::len),
            skipped = skipped.total(),
            fingerprint = short,
            "loaded dataset"
        );

        Ok(Self {
            root,
            buildings,
            roads,
            pois,
            metadata,
            skipped,
            fingerprint,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// blake3 over metadata and feature files in load order, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Stats recomputed from the loaded features.
    pub fn stats(&self) -> DatasetStats {
        DatasetStats::from_collections(&self.buildings, &self.roads)
    }

    pub fn city(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .map(|m| m.city.as_str())
            .filter(|c| !c.is_empty())
    }

    pub fn files(&self) -> DatasetFiles {
        self.metadata
            .as_ref()
            .map(|m| m.files.clone())
            .unwrap_or_default()
    }
}

fn read(path: &Path, hasher: &mut blake3::Hasher) -> Result<String, DatasetError> {
    let payload = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    hasher.update(payload.as_bytes());
    Ok(payload)
}

fn load_metadata(
    root: &Path,
    hasher: &mut blake3::Hasher,
) -> Result<Option<DatasetMetadata>, DatasetError> {
    let path = root.join(METADATA_FILE_NAME);
    if !path.is_file() {
        debug!(path = %path.display(), "no metadata file");
        return Ok(None);
    }
    let payload = read(&path, hasher)?;
    let metadata = serde_json::from_str(&payload)
        .map_err(|source| DatasetError::Metadata { path, source })?;
    Ok(Some(metadata))
}

fn load_collection<P: DeserializeOwned>(
    path: &Path,
    mode: ParseMode,
    hasher: &mut blake3::Hasher,
) -> Result<(FeatureCollection<P>, usize), DatasetError> {
    let payload = read(path, hasher)?;
    let parsed =
        parse_feature_collection::<P>(&payload, mode).map_err(|source| DatasetError::GeoJson {
            path: path.to_path_buf(),
            source,
        })?;
    for skip in &parsed.skipped {
        warn!(
            path = %path.display(),
            index = skip.index,
            reason = %skip.reason,
            "skipped feature"
        );
    }
    Ok((parsed.features, parsed.skipped.len()))
}
