/// Mean Earth radius (meters), IUGG.
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_008.8;

/// Longitude/latitude pair in degrees.
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl LngLat {
    pub const fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    pub fn is_finite(&self) -> bool {
        self.lon_deg.is_finite() && self.lat_deg.is_finite()
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(value: LngLat) -> Self {
        [value.lon_deg, value.lat_deg]
    }
}

/// Great-circle distance on the mean sphere (haversine).
pub fn great_circle_distance_m(a: LngLat, b: LngLat) -> f64 {
    let lat1 = a.lat_deg.to_radians();
    let lat2 = b.lat_deg.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon_deg - a.lon_deg).to_radians();

    let h = (dlat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon * 0.5).sin().powi(2);
    2.0 * EARTH_MEAN_RADIUS_M * h.sqrt().clamp(0.0, 1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::{EARTH_MEAN_RADIUS_M, LngLat, great_circle_distance_m};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn zero_for_identical_points() {
        let p = LngLat::new(11.3548, 46.47);
        assert_close(great_circle_distance_m(p, p), 0.0, 1e-9);
    }

    #[test]
    fn quarter_meridian() {
        let d = great_circle_distance_m(LngLat::new(0.0, 0.0), LngLat::new(0.0, 90.0));
        assert_close(d, EARTH_MEAN_RADIUS_M * std::f64::consts::FRAC_PI_2, 1e-6);
    }

    #[test]
    fn bolzano_cathedral_to_station_is_short() {
        let cathedral = LngLat::new(11.3525, 46.4988);
        let station = LngLat::new(11.3572, 46.4929);
        let d = great_circle_distance_m(cathedral, station);
        assert!(d > 600.0 && d < 900.0, "got {d}");
    }
}
