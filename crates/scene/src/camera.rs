//! Camera controller: free user control or an animated fly-to.
//!
//! The fly-to follows the van Wijk & Nuijten "smooth and efficient zooming
//! and panning" path in Web-Mercator pixel space: the camera zooms out while
//! it pans and back in as it arrives, and the path length in screen widths
//! drives the duration. Pitch is interpolated linearly and bearing along the
//! shorter arc.
//!
//! The controller never owns the view. Every animated frame is written into
//! [`MapStore`] through its setter, and a user view change simply replaces
//! whatever transition is in flight.

use foundation::math::{
    LngLat, great_circle_distance_m, lng_lat_to_world, scale_to_zoom, world_to_lng_lat,
    zoom_to_scale,
};
use foundation::time::Time;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::MapStore;
use crate::view::{ViewState, normalize_bearing};

/// Below this path offset (in start-zoom pixels) the transition degenerates
/// to a pure zoom.
const PAN_EPSILON_PX: f64 = 0.01;

/// Viewport assumed until the host reports one.
pub const DEFAULT_VIEWPORT_PX: [f64; 2] = [1280.0, 720.0];

/// Fly-to target framing and timing.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyToConfig {
    pub zoom: f64,
    /// Degrees.
    pub pitch: f64,
    /// Degrees.
    pub bearing: f64,
    /// Screen widths per second along the optimal path.
    pub speed: f64,
    /// Zoom-out tendency of the path (rho); sqrt(2) is the empirical optimum.
    pub curve: f64,
    /// Upper bound on the transition length in seconds.
    pub max_duration_s: Option<f64>,
}

impl Default for FlyToConfig {
    fn default() -> Self {
        Self {
            zoom: 16.5,
            pitch: 60.0,
            bearing: 0.0,
            speed: 1.5,
            curve: 1.414,
            max_duration_s: None,
        }
    }
}

/// Who drives the camera right now.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CameraMode {
    Free,
    FlyTo,
}

/// One in-flight transition. Immutable once started.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyTo {
    start: ViewState,
    target: ViewState,
    started_at: Time,
    duration_s: f64,
    path: FlightPath,
}

#[derive(Debug, Clone, PartialEq)]
enum FlightPath {
    /// Start and target centres coincide: zoom/pitch/bearing lerp only.
    Zoom,
    Arc {
        rho: f64,
        /// Total path length in start-viewport widths.
        length: f64,
        w0: f64,
        u1: f64,
        r0: f64,
        start_world: [f64; 2],
        delta_world: [f64; 2],
    },
}

impl FlyTo {
    pub fn new(
        start: ViewState,
        target: ViewState,
        started_at: Time,
        viewport_px: [f64; 2],
        config: &FlyToConfig,
    ) -> Self {
        let rho = config.curve;
        let w0 = viewport_px[0].max(viewport_px[1]).max(1.0);
        let w1 = w0 / zoom_to_scale(target.zoom - start.zoom);

        let start_world = lng_lat_to_world(start.center());
        let end_world = lng_lat_to_world(target.center());
        let delta_world = [end_world[0] - start_world[0], end_world[1] - start_world[1]];
        let u1 = delta_world[0].hypot(delta_world[1]) * zoom_to_scale(start.zoom);

        let (path, length) = if u1 < PAN_EPSILON_PX {
            (FlightPath::Zoom, (w1 / w0).ln().abs() / rho)
        } else {
            let rho2 = rho * rho;
            let b0 = (w1 * w1 - w0 * w0 + rho2 * rho2 * u1 * u1) / (2.0 * w0 * rho2 * u1);
            let b1 = (w1 * w1 - w0 * w0 - rho2 * rho2 * u1 * u1) / (2.0 * w1 * rho2 * u1);
            let r0 = ((b0 * b0 + 1.0).sqrt() - b0).ln();
            let r1 = ((b1 * b1 + 1.0).sqrt() - b1).ln();
            let length = (r1 - r0) / rho;
            (
                FlightPath::Arc {
                    rho,
                    length,
                    w0,
                    u1,
                    r0,
                    start_world,
                    delta_world,
                },
                length,
            )
        };

        let mut duration_s = if config.speed > 0.0 && length.is_finite() {
            (length / config.speed).max(0.0)
        } else {
            0.0
        };
        if let Some(max) = config.max_duration_s {
            duration_s = duration_s.min(max.max(0.0));
        }

        Self {
            start,
            target,
            started_at,
            duration_s,
            path,
        }
    }

    pub fn start(&self) -> ViewState {
        self.start
    }

    pub fn target(&self) -> ViewState {
        self.target
    }

    pub fn started_at(&self) -> Time {
        self.started_at
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    /// Ground distance between start and target centres.
    pub fn great_circle_m(&self) -> f64 {
        great_circle_distance_m(self.start.center(), self.target.center())
    }

    /// Normalized progress in `[0, 1]` at `now`.
    pub fn progress(&self, now: Time) -> f64 {
        if self.duration_s <= 0.0 {
            return 1.0;
        }
        (now.since(self.started_at) / self.duration_s).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, now: Time) -> bool {
        self.progress(now) >= 1.0
    }

    /// Camera at normalized progress `t`; `t >= 1` is exactly the target.
    pub fn view_at(&self, t: f64) -> ViewState {
        if t >= 1.0 || t.is_nan() {
            return self.target;
        }
        let t = t.max(0.0);
        let start = self.start;
        let target = self.target;

        let (center, zoom) = match &self.path {
            FlightPath::Zoom => (
                lerp_lng_lat(start.center(), target.center(), t),
                lerp(start.zoom, target.zoom, t),
            ),
            FlightPath::Arc {
                rho,
                length,
                w0,
                u1,
                r0,
                start_world,
                delta_world,
            } => {
                let s = t * length;
                let w = r0.cosh() / (r0 + rho * s).cosh();
                let u = w0 * ((r0.cosh() * (r0 + rho * s).tanh() - r0.sinh()) / (rho * rho)) / u1;
                let world = [
                    start_world[0] + delta_world[0] * u,
                    start_world[1] + delta_world[1] * u,
                ];
                (world_to_lng_lat(world), start.zoom + scale_to_zoom(1.0 / w))
            }
        };

        let bearing_delta = (target.bearing - start.bearing + 540.0).rem_euclid(360.0) - 180.0;
        ViewState {
            longitude: center.lon_deg,
            latitude: center.lat_deg,
            zoom,
            pitch: lerp(start.pitch, target.pitch, t),
            bearing: normalize_bearing(start.bearing + bearing_delta * t),
            min_zoom: start.min_zoom,
            max_zoom: start.max_zoom,
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_lng_lat(a: LngLat, b: LngLat, t: f64) -> LngLat {
    LngLat::new(lerp(a.lon_deg, b.lon_deg, t), lerp(a.lat_deg, b.lat_deg, t))
}

/// Owns the active transition, if any. The view itself lives in the store.
#[derive(Debug, Clone)]
pub struct CameraController {
    config: FlyToConfig,
    viewport_px: [f64; 2],
    active: Option<FlyTo>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(FlyToConfig::default())
    }
}

impl CameraController {
    pub fn new(config: FlyToConfig) -> Self {
        Self {
            config,
            viewport_px: DEFAULT_VIEWPORT_PX,
            active: None,
        }
    }

    pub fn config(&self) -> &FlyToConfig {
        &self.config
    }

    /// Set viewport dimensions in pixels. Non-positive sizes are ignored.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.viewport_px = [width, height];
        }
    }

    pub fn viewport_px(&self) -> [f64; 2] {
        self.viewport_px
    }

    pub fn mode(&self) -> CameraMode {
        if self.active.is_some() {
            CameraMode::FlyTo
        } else {
            CameraMode::Free
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&FlyTo> {
        self.active.as_ref()
    }

    /// User drag/zoom: applied immediately, and any fly-to is abandoned.
    pub fn on_view_state_change(&mut self, store: &mut MapStore, view_state: ViewState) -> bool {
        if self.active.take().is_some() {
            debug!("fly-to interrupted by user input");
        }
        store.set_view_state(view_state)
    }

    /// Starts a transition from the current view to `target` framed by the
    /// configured zoom/pitch/bearing. Replaces any transition in flight.
    /// Returns `false` for a non-finite target.
    pub fn fly_to(&mut self, store: &MapStore, target: LngLat, now: Time) -> bool {
        if !target.is_finite() {
            debug!(?target, "fly-to ignored: non-finite target");
            return false;
        }
        let start = store.view_state();
        let end = ViewState {
            longitude: target.lon_deg,
            latitude: target.lat_deg,
            zoom: self.config.zoom,
            pitch: self.config.pitch,
            bearing: self.config.bearing,
            ..start
        }
        .clamped();

        let flight = FlyTo::new(start, end, now, self.viewport_px, &self.config);
        debug!(
            lon = end.longitude,
            lat = end.latitude,
            zoom = end.zoom,
            duration_s = flight.duration_s(),
            distance_m = flight.great_circle_m(),
            replaced = self.active.is_some(),
            "fly-to started"
        );
        self.active = Some(flight);
        true
    }

    /// Advances the active transition to `now` and writes the camera into
    /// the store. Returns `true` while a transition was driving the camera.
    pub fn tick(&mut self, store: &mut MapStore, now: Time) -> bool {
        let Some(flight) = &self.active else {
            return false;
        };
        let t = flight.progress(now);
        let view = flight.view_at(t);
        if t >= 1.0 {
            debug!(lon = view.longitude, lat = view.latitude, "fly-to settled");
            self.active = None;
        }
        store.set_view_state(view);
        true
    }

    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{INITIAL_VIEW_STATE, ViewStatePatch};
    use pretty_assertions::assert_eq;

    const CATHEDRAL: LngLat = LngLat::new(11.3525, 46.4988);

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn lands_exactly_on_target() {
        let mut store = MapStore::new();
        let mut camera = CameraController::default();
        assert!(camera.fly_to(&store, CATHEDRAL, Time::ZERO));
        let duration = camera.active().map(FlyTo::duration_s).unwrap_or_default();
        assert!(duration > 0.0);

        assert!(camera.tick(&mut store, Time(duration * 0.5)));
        assert!(camera.is_transitioning());
        assert!(camera.tick(&mut store, Time(duration + 0.01)));
        assert!(!camera.is_transitioning());

        let vs = store.view_state();
        assert_eq!(vs.center(), CATHEDRAL);
        assert_eq!(vs.zoom, 16.5);
        assert_eq!(vs.pitch, 60.0);
        assert_eq!(vs.bearing, 0.0);
        assert!(!camera.tick(&mut store, Time(duration + 1.0)));
    }

    #[test]
    fn path_starts_at_start_view() {
        let flight = FlyTo::new(
            INITIAL_VIEW_STATE,
            ViewState {
                longitude: CATHEDRAL.lon_deg,
                latitude: CATHEDRAL.lat_deg,
                zoom: 16.5,
                pitch: 60.0,
                ..INITIAL_VIEW_STATE
            },
            Time::ZERO,
            DEFAULT_VIEWPORT_PX,
            &FlyToConfig::default(),
        );
        let v = flight.view_at(0.0);
        assert!(approx(v.longitude, INITIAL_VIEW_STATE.longitude, 1e-9));
        assert!(approx(v.latitude, INITIAL_VIEW_STATE.latitude, 1e-9));
        assert!(approx(v.zoom, INITIAL_VIEW_STATE.zoom, 1e-9));
        assert_eq!(v.pitch, INITIAL_VIEW_STATE.pitch);
    }

    #[test]
    fn longer_hops_take_longer() {
        let store = MapStore::new();
        let mut camera = CameraController::default();
        camera.fly_to(&store, CATHEDRAL, Time::ZERO);
        let near = camera.active().map(FlyTo::duration_s).unwrap_or_default();
        camera.fly_to(&store, LngLat::new(12.5, 47.3), Time::ZERO);
        let far = camera.active().map(FlyTo::duration_s).unwrap_or_default();
        assert!(far > near, "far {far} <= near {near}");
    }

    #[test]
    fn max_duration_caps_transition() {
        let store = MapStore::new();
        let mut camera = CameraController::new(FlyToConfig {
            max_duration_s: Some(0.5),
            ..FlyToConfig::default()
        });
        camera.fly_to(&store, LngLat::new(13.4, 52.5), Time::ZERO);
        assert_eq!(camera.active().map(FlyTo::duration_s), Some(0.5));
    }

    #[test]
    fn last_fly_to_wins() {
        let mut store = MapStore::new();
        let mut camera = CameraController::default();
        camera.fly_to(&store, LngLat::new(11.30, 46.50), Time::ZERO);
        camera.tick(&mut store, Time(0.2));
        let second = LngLat::new(11.36, 46.49);
        camera.fly_to(&store, second, Time(0.2));

        let flight = camera.active().cloned().expect("second flight");
        assert_eq!(flight.target().center(), second);
        assert_eq!(flight.start(), store.view_state());

        camera.tick(&mut store, Time(0.2 + flight.duration_s() + 0.01));
        assert_eq!(store.view_state().center(), second);
    }

    #[test]
    fn zoom_only_transition_keeps_center() {
        let start = INITIAL_VIEW_STATE;
        let target = ViewState {
            zoom: 15.0,
            ..start
        };
        let flight = FlyTo::new(start, target, Time::ZERO, DEFAULT_VIEWPORT_PX, &FlyToConfig::default());
        assert!(flight.duration_s() > 0.0);
        let mid = flight.view_at(0.5);
        assert_eq!(mid.center(), start.center());
        assert!(mid.zoom > start.zoom && mid.zoom < target.zoom);
    }

    #[test]
    fn bearing_takes_short_arc() {
        let start = ViewState {
            bearing: 170.0,
            ..INITIAL_VIEW_STATE
        };
        let target = ViewState {
            bearing: -170.0,
            ..INITIAL_VIEW_STATE
        };
        let flight = FlyTo::new(start, target, Time::ZERO, DEFAULT_VIEWPORT_PX, &FlyToConfig::default());
        let mid = flight.view_at(0.5);
        assert!(approx(mid.bearing.abs(), 180.0, 1e-9), "bearing {}", mid.bearing);
    }

    #[test]
    fn user_input_interrupts_flight() {
        let mut store = MapStore::new();
        let mut camera = CameraController::default();
        camera.fly_to(&store, CATHEDRAL, Time::ZERO);
        let dragged = store.view_state().apply(ViewStatePatch {
            longitude: Some(11.2),
            ..Default::default()
        });
        assert!(camera.on_view_state_change(&mut store, dragged));
        assert_eq!(camera.mode(), CameraMode::Free);
        assert!(!camera.tick(&mut store, Time(1.0)));
        assert_eq!(store.view_state().longitude, 11.2);
    }

    #[test]
    fn non_finite_target_is_ignored() {
        let store = MapStore::new();
        let mut camera = CameraController::default();
        assert!(!camera.fly_to(&store, LngLat::new(f64::NAN, 46.0), Time::ZERO));
        assert!(!camera.is_transitioning());
    }

    #[test]
    fn config_defaults_from_partial_json() {
        let cfg: FlyToConfig = serde_json::from_str(r#"{ "speed": 2.0 }"#).expect("parse");
        assert_eq!(cfg.speed, 2.0);
        assert_eq!(cfg.zoom, 16.5);
        assert_eq!(cfg.max_duration_s, None);
    }
}
