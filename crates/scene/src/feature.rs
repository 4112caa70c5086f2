use std::fmt;
use std::sync::Arc;

use foundation::math::LngLat;
use serde::{Deserialize, Serialize};

/// Feature geometry in WGS84 degrees. Immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(LngLat),
    MultiPoint(Vec<LngLat>),
    LineString(Vec<LngLat>),
    MultiLineString(Vec<Vec<LngLat>>),
    Polygon(Vec<Vec<LngLat>>),
    MultiPolygon(Vec<Vec<Vec<LngLat>>>),
}

impl Geometry {
    /// Representative position: the point itself, the arc-length midpoint of
    /// a line, or the vertex centroid of an outer ring.
    pub fn anchor(&self) -> Option<LngLat> {
        match self {
            Geometry::Point(p) => Some(*p),
            Geometry::MultiPoint(ps) => ps.first().copied(),
            Geometry::LineString(vs) => line_midpoint(vs),
            Geometry::MultiLineString(ls) => ls.first().and_then(|l| line_midpoint(l)),
            Geometry::Polygon(rings) => ring_centroid(rings.first()?),
            Geometry::MultiPolygon(polys) => ring_centroid(polys.first()?.first()?),
        }
    }
}

fn line_midpoint(vertices: &[LngLat]) -> Option<LngLat> {
    if vertices.len() < 2 {
        return vertices.first().copied();
    }

    let total: f64 = vertices.windows(2).map(|w| planar_len(w[0], w[1])).sum();
    if !total.is_finite() || total <= 0.0 {
        return vertices.first().copied();
    }

    let target = total * 0.5;
    let mut acc = 0.0;
    for w in vertices.windows(2) {
        let len = planar_len(w[0], w[1]);
        if len > 0.0 && acc + len >= target {
            let t = (target - acc) / len;
            return Some(LngLat::new(
                w[0].lon_deg + (w[1].lon_deg - w[0].lon_deg) * t,
                w[0].lat_deg + (w[1].lat_deg - w[0].lat_deg) * t,
            ));
        }
        acc += len;
    }
    vertices.last().copied()
}

fn planar_len(a: LngLat, b: LngLat) -> f64 {
    let dx = b.lon_deg - a.lon_deg;
    let dy = b.lat_deg - a.lat_deg;
    (dx * dx + dy * dy).sqrt()
}

fn ring_centroid(ring: &[LngLat]) -> Option<LngLat> {
    // Skip the closing vertex so it is not counted twice.
    let open = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    };
    let (mut sx, mut sy, mut n) = (0.0, 0.0, 0.0_f64);
    for p in open.iter().filter(|p| p.is_finite()) {
        sx += p.lon_deg;
        sy += p.lat_deg;
        n += 1.0;
    }
    if n <= 0.0 {
        return None;
    }
    Some(LngLat::new(sx / n, sy / n))
}

/// A typed geometry plus its property bag.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature<P> {
    pub id: Option<String>,
    pub geometry: Geometry,
    pub properties: P,
}

impl<P> Feature<P> {
    pub fn new(geometry: Geometry, properties: P) -> Self {
        Self {
            id: None,
            geometry,
            properties,
        }
    }
}

/// Identity of a collection's backing storage. Used as a cache key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DataId(pub usize);

/// Ordered, shared, read-only sequence of features.
///
/// Clones share storage (and identity). Filtering builds a new sequence over
/// the same `Arc<Feature>`s.
pub struct FeatureCollection<P> {
    features: Arc<[Arc<Feature<P>>]>,
}

impl<P> FeatureCollection<P> {
    pub fn new(features: Vec<Feature<P>>) -> Self {
        features.into_iter().map(Arc::new).collect()
    }

    pub fn from_shared(features: Vec<Arc<Feature<P>>>) -> Self {
        Self {
            features: features.into(),
        }
    }

    pub fn empty() -> Self {
        Self::from_shared(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Feature<P>>> {
        self.features.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Feature<P>>> {
        self.features.iter()
    }

    pub fn as_slice(&self) -> &[Arc<Feature<P>>] {
        &self.features
    }

    /// True when both handles share the same backing storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.features, &other.features)
    }

    pub fn data_id(&self) -> DataId {
        DataId(Arc::as_ptr(&self.features) as *const () as usize)
    }
}

impl<P> Clone for FeatureCollection<P> {
    fn clone(&self) -> Self {
        Self {
            features: Arc::clone(&self.features),
        }
    }
}

impl<P> fmt::Debug for FeatureCollection<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureCollection")
            .field("len", &self.features.len())
            .field("data_id", &self.data_id())
            .finish()
    }
}

impl<P> FromIterator<Arc<Feature<P>>> for FeatureCollection<P> {
    fn from_iter<I: IntoIterator<Item = Arc<Feature<P>>>>(iter: I) -> Self {
        Self::from_shared(iter.into_iter().collect())
    }
}

/// Where a building's height came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightSource {
    Osm,
    Overture,
    Levels,
    #[default]
    #[serde(other)]
    Default,
}

impl HeightSource {
    pub fn as_str(self) -> &'static str {
        match self {
            HeightSource::Osm => "osm",
            HeightSource::Overture => "overture",
            HeightSource::Levels => "levels",
            HeightSource::Default => "default",
        }
    }

    /// Human-readable provenance shown next to a selected building.
    pub fn description(self) -> &'static str {
        match self {
            HeightSource::Osm => "OSM height",
            HeightSource::Overture => "Overture height",
            HeightSource::Levels => "From floor count",
            HeightSource::Default => "Default estimate",
        }
    }
}

impl fmt::Display for HeightSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildingProperties {
    /// Final height in metres. `None` when the source row had no usable value.
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub height_source: HeightSource,
    #[serde(default)]
    pub building_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl BuildingProperties {
    /// Height if present, finite and non-negative.
    pub fn valid_height(&self) -> Option<f64> {
        self.height.filter(|h| h.is_finite() && *h >= 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadProperties {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_category")]
    pub road_class: String,
    /// Render width in metres.
    #[serde(default, alias = "line_width")]
    pub width: f64,
}

impl Default for RoadProperties {
    fn default() -> Self {
        Self {
            name: None,
            road_class: default_category(),
            width: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiProperties {
    /// Display name, empty when unknown.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// Raw OSM tag value, e.g. `restaurant`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub amenity_tag: String,
}

impl Default for PoiProperties {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: default_category(),
            amenity_tag: String::new(),
        }
    }
}

fn default_category() -> String {
    "other".to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

pub type BuildingFeature = Feature<BuildingProperties>;
pub type RoadFeature = Feature<RoadProperties>;
pub type PoiFeature = Feature<PoiProperties>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn building(h: Option<f64>) -> Feature<BuildingProperties> {
        Feature::new(
            Geometry::Point(LngLat::new(0.0, 0.0)),
            BuildingProperties {
                height: h,
                ..Default::default()
            },
        )
    }

    #[test]
    fn clones_share_identity() {
        let a = FeatureCollection::new(vec![building(Some(1.0))]);
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.data_id(), b.data_id());

        let c = FeatureCollection::new(vec![building(Some(1.0))]);
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn valid_height_rejects_nan_and_negative() {
        assert_eq!(building(Some(f64::NAN)).properties.valid_height(), None);
        assert_eq!(building(Some(-3.0)).properties.valid_height(), None);
        assert_eq!(building(Some(f64::INFINITY)).properties.valid_height(), None);
        assert_eq!(building(Some(0.0)).properties.valid_height(), Some(0.0));
        assert_eq!(building(None).properties.valid_height(), None);
        assert_eq!(building(Some(12.5)).properties.valid_height(), Some(12.5));
    }

    #[test]
    fn polygon_anchor_ignores_closing_vertex() {
        let ring = vec![
            LngLat::new(0.0, 0.0),
            LngLat::new(2.0, 0.0),
            LngLat::new(2.0, 2.0),
            LngLat::new(0.0, 2.0),
            LngLat::new(0.0, 0.0),
        ];
        let anchor = Geometry::Polygon(vec![ring]).anchor().expect("anchor");
        assert_eq!(anchor, LngLat::new(1.0, 1.0));
    }

    #[test]
    fn line_anchor_is_arc_midpoint() {
        let line = vec![
            LngLat::new(0.0, 0.0),
            LngLat::new(1.0, 0.0),
            LngLat::new(1.0, 3.0),
        ];
        let anchor = Geometry::LineString(line).anchor().expect("anchor");
        assert_eq!(anchor, LngLat::new(1.0, 1.0));
    }

    #[test]
    fn properties_deserialize_with_fallbacks() {
        let b: BuildingProperties = serde_json::from_value(serde_json::json!({
            "height": null,
            "height_source": "lidar",
        }))
        .expect("building");
        assert_eq!(b.height, None);
        assert_eq!(b.height_source, HeightSource::Default);

        let r: RoadProperties = serde_json::from_value(serde_json::json!({
            "road_class": "major",
            "line_width": 3,
        }))
        .expect("road");
        assert_eq!(r.width, 3.0);

        let p: PoiProperties = serde_json::from_value(serde_json::json!({
            "name": null,
            "amenity_tag": "cafe",
        }))
        .expect("poi");
        assert_eq!(p.name, "");
        assert_eq!(p.category, "other");
    }
}
