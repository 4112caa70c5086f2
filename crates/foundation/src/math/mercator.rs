//! Web-Mercator world coordinates.
//!
//! World space is the 512-pixel square at zoom 0, x growing east and y growing
//! north. One zoom level doubles the pixel scale.

use super::geodesy::LngLat;

/// Side length of the zoom-0 world, in pixels.
pub const TILE_SIZE: f64 = 512.0;

/// Latitude beyond which Web-Mercator diverges.
pub const MAX_LATITUDE_DEG: f64 = 85.051_129;

pub fn zoom_to_scale(zoom: f64) -> f64 {
    zoom.exp2()
}

pub fn scale_to_zoom(scale: f64) -> f64 {
    scale.log2()
}

/// Project to zoom-0 world pixels. Latitude is clamped to the Mercator limit.
pub fn lng_lat_to_world(p: LngLat) -> [f64; 2] {
    let lambda = p.lon_deg.to_radians();
    let lat = p.lat_deg.clamp(-MAX_LATITUDE_DEG, MAX_LATITUDE_DEG);
    let phi = lat.to_radians();
    let x = TILE_SIZE * (lambda + std::f64::consts::PI) / std::f64::consts::TAU;
    let y = TILE_SIZE
        * (std::f64::consts::PI + (std::f64::consts::FRAC_PI_4 + phi * 0.5).tan().ln())
        / std::f64::consts::TAU;
    [x, y]
}

pub fn world_to_lng_lat(xy: [f64; 2]) -> LngLat {
    let lambda = xy[0] / TILE_SIZE * std::f64::consts::TAU - std::f64::consts::PI;
    let phi = 2.0
        * ((xy[1] / TILE_SIZE * std::f64::consts::TAU - std::f64::consts::PI).exp()).atan()
        - std::f64::consts::FRAC_PI_2;
    LngLat::new(lambda.to_degrees(), phi.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_world_center() {
        let xy = lng_lat_to_world(LngLat::new(0.0, 0.0));
        assert_close(xy[0], 256.0, 1e-9);
        assert_close(xy[1], 256.0, 1e-9);
    }

    #[test]
    fn round_trip() {
        let p = LngLat::new(11.3548, 46.47);
        let back = world_to_lng_lat(lng_lat_to_world(p));
        assert_close(back.lon_deg, p.lon_deg, 1e-9);
        assert_close(back.lat_deg, p.lat_deg, 1e-9);
    }

    #[test]
    fn north_is_up() {
        let south = lng_lat_to_world(LngLat::new(0.0, -10.0));
        let north = lng_lat_to_world(LngLat::new(0.0, 10.0));
        assert!(north[1] > south[1]);
    }

    #[test]
    fn zoom_scale_inverse() {
        assert_close(scale_to_zoom(zoom_to_scale(3.5)), 3.5, 1e-12);
        assert_close(zoom_to_scale(1.0), 2.0, 1e-12);
    }
}
