use foundation::math::LngLat;
use scene::{Feature, FeatureCollection, Geometry};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected GeoJSON FeatureCollection")]
    NotAFeatureCollection,
    #[error("invalid feature at index {index}: {reason}")]
    InvalidFeature { index: usize, reason: String },
}

/// How per-feature problems are handled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// First bad feature fails the whole collection.
    Strict,
    /// Bad features are skipped and reported.
    #[default]
    Lenient,
}

/// A feature that was dropped during a lenient parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFeature {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct Parsed<P> {
    pub features: FeatureCollection<P>,
    pub skipped: Vec<SkippedFeature>,
}

pub fn parse_feature_collection<P: DeserializeOwned>(
    payload: &str,
    mode: ParseMode,
) -> Result<Parsed<P>, GeoJsonError> {
    let value: Value = serde_json::from_str(payload)?;
    feature_collection_from_value(value, mode)
}

pub fn feature_collection_from_value<P: DeserializeOwned>(
    value: Value,
    mode: ParseMode,
) -> Result<Parsed<P>, GeoJsonError> {
    let Value::Object(mut root) = value else {
        return Err(GeoJsonError::NotAFeatureCollection);
    };
    if root.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(GeoJsonError::NotAFeatureCollection);
    }
    let Some(Value::Array(raw)) = root.remove("features") else {
        return Err(GeoJsonError::NotAFeatureCollection);
    };

    let mut features = Vec::with_capacity(raw.len());
    let mut skipped = Vec::new();
    for (index, feat) in raw.into_iter().enumerate() {
        match parse_feature(feat) {
            Ok(f) => features.push(f),
            Err(reason) => match mode {
                ParseMode::Strict => return Err(GeoJsonError::InvalidFeature { index, reason }),
                ParseMode::Lenient => skipped.push(SkippedFeature { index, reason }),
            },
        }
    }

    Ok(Parsed {
        features: FeatureCollection::new(features),
        skipped,
    })
}

fn parse_feature<P: DeserializeOwned>(value: Value) -> Result<Feature<P>, String> {
    let Value::Object(mut obj) = value else {
        return Err("feature must be an object".to_string());
    };
    match obj.get("type").and_then(Value::as_str) {
        Some("Feature") => {}
        Some(other) => return Err(format!("unexpected feature type: {other}")),
        None => return Err("feature missing type".to_string()),
    }

    let id = match obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let geometry = match obj.get("geometry") {
        None | Some(Value::Null) => return Err("feature missing geometry".to_string()),
        Some(g) => parse_geometry(g)?,
    };

    let properties = match obj.remove("properties") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(v) => v,
    };
    let properties =
        serde_json::from_value(properties).map_err(|e| format!("bad properties: {e}"))?;

    Ok(Feature {
        id,
        geometry,
        properties,
    })
}

fn parse_geometry(value: &Value) -> Result<Geometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry missing type".to_string())?;
    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Point" => Ok(Geometry::Point(parse_point(coords)?)),
        "MultiPoint" => Ok(Geometry::MultiPoint(parse_points(coords)?)),
        "LineString" => Ok(Geometry::LineString(parse_points(coords)?)),
        "MultiLineString" => Ok(Geometry::MultiLineString(parse_nested(coords, parse_points)?)),
        "Polygon" => Ok(Geometry::Polygon(parse_nested(coords, parse_points)?)),
        "MultiPolygon" => Ok(Geometry::MultiPolygon(parse_nested(coords, |p| {
            parse_nested(p, parse_points)
        })?)),
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_point(coords: &Value) -> Result<LngLat, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok(LngLat::new(lon, lat))
}

fn parse_points(coords: &Value) -> Result<Vec<LngLat>, String> {
    parse_nested(coords, parse_point)
}

fn parse_nested<T>(
    coords: &Value,
    item: impl Fn(&Value) -> Result<T, String>,
) -> Result<Vec<T>, String> {
    coords
        .as_array()
        .ok_or("coordinates must be an array".to_string())?
        .iter()
        .map(item)
        .collect()
}

/// Emits a GeoJSON FeatureCollection. Property order follows `P`'s
/// serialization.
pub fn to_geojson_value<P: Serialize>(
    collection: &FeatureCollection<P>,
) -> Result<Value, serde_json::Error> {
    let mut features = Vec::with_capacity(collection.len());
    for feat in collection.iter() {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::from("Feature"));
        if let Some(id) = &feat.id {
            obj.insert("id".to_string(), Value::from(id.as_str()));
        }
        obj.insert("properties".to_string(), serde_json::to_value(&feat.properties)?);
        obj.insert("geometry".to_string(), geometry_to_value(&feat.geometry));
        features.push(Value::Object(obj));
    }

    let mut root = Map::new();
    root.insert("type".to_string(), Value::from("FeatureCollection"));
    root.insert("features".to_string(), Value::Array(features));
    Ok(Value::Object(root))
}

fn geometry_to_value(geom: &Geometry) -> Value {
    let (ty, coords) = match geom {
        Geometry::Point(p) => ("Point", point_coords(p)),
        Geometry::MultiPoint(ps) => ("MultiPoint", points_coords(ps)),
        Geometry::LineString(ps) => ("LineString", points_coords(ps)),
        Geometry::MultiLineString(ls) => (
            "MultiLineString",
            Value::Array(ls.iter().map(|l| points_coords(l)).collect()),
        ),
        Geometry::Polygon(rings) => (
            "Polygon",
            Value::Array(rings.iter().map(|r| points_coords(r)).collect()),
        ),
        Geometry::MultiPolygon(polys) => (
            "MultiPolygon",
            Value::Array(
                polys
                    .iter()
                    .map(|rings| Value::Array(rings.iter().map(|r| points_coords(r)).collect()))
                    .collect(),
            ),
        ),
    };
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::from(ty));
    obj.insert("coordinates".to_string(), coords);
    Value::Object(obj)
}

fn point_coords(p: &LngLat) -> Value {
    Value::Array(vec![Value::from(p.lon_deg), Value::from(p.lat_deg)])
}

fn points_coords(ps: &[LngLat]) -> Value {
    Value::Array(ps.iter().map(point_coords).collect())
}
