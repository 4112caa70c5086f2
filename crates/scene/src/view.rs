use foundation::math::{LngLat, MAX_LATITUDE_DEG};
use serde::{Deserialize, Serialize};

/// Steepest camera tilt the scene supports, in degrees.
pub const MAX_PITCH_DEG: f64 = 85.0;

/// Camera viewport over the basemap.
///
/// Invariants (after [`ViewState::clamped`]):
/// - `min_zoom <= zoom <= max_zoom`
/// - `0 <= pitch <= MAX_PITCH_DEG`
/// - `bearing` in `(-180, 180]`
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

/// Bolzano, Italy: Alpine valley overview facing north.
pub const INITIAL_VIEW_STATE: ViewState = ViewState {
    longitude: 11.3548,
    latitude: 46.47,
    zoom: 11.5,
    pitch: 65.0,
    bearing: 0.0,
    min_zoom: 8.0,
    max_zoom: 20.0,
};

impl Default for ViewState {
    fn default() -> Self {
        INITIAL_VIEW_STATE
    }
}

impl ViewState {
    pub fn center(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }

    pub fn is_finite(&self) -> bool {
        [
            self.longitude,
            self.latitude,
            self.zoom,
            self.pitch,
            self.bearing,
            self.min_zoom,
            self.max_zoom,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Returns a copy with every invariant enforced.
    pub fn clamped(self) -> Self {
        let (min_zoom, max_zoom) = if self.min_zoom <= self.max_zoom {
            (self.min_zoom, self.max_zoom)
        } else {
            (self.max_zoom, self.min_zoom)
        };
        Self {
            longitude: wrap_longitude(self.longitude),
            latitude: self.latitude.clamp(-MAX_LATITUDE_DEG, MAX_LATITUDE_DEG),
            zoom: self.zoom.clamp(min_zoom, max_zoom),
            pitch: self.pitch.clamp(0.0, MAX_PITCH_DEG),
            bearing: normalize_bearing(self.bearing),
            min_zoom,
            max_zoom,
        }
    }

    pub fn apply(self, patch: ViewStatePatch) -> Self {
        Self {
            longitude: patch.longitude.unwrap_or(self.longitude),
            latitude: patch.latitude.unwrap_or(self.latitude),
            zoom: patch.zoom.unwrap_or(self.zoom),
            pitch: patch.pitch.unwrap_or(self.pitch),
            bearing: patch.bearing.unwrap_or(self.bearing),
            min_zoom: patch.min_zoom.unwrap_or(self.min_zoom),
            max_zoom: patch.max_zoom.unwrap_or(self.max_zoom),
        }
    }
}

/// Partial view update; unset fields keep their current value.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewStatePatch {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub zoom: Option<f64>,
    pub pitch: Option<f64>,
    pub bearing: Option<f64>,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
}

/// Map any bearing to `(-180, 180]`.
pub fn normalize_bearing(deg: f64) -> f64 {
    let b = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if b == -180.0 { 180.0 } else { b }
}

fn wrap_longitude(deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&deg) {
        deg
    } else {
        (deg + 180.0).rem_euclid(360.0) - 180.0
    }
}
