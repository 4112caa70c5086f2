use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use formats::Dataset;
use foundation::math::LngLat;
use layers::{LayerComposer, LayerDescriptor, LayerSources, bolzano_landmarks};
use runtime::{Frame, FrameStats, FrameTimeWindow};
use scene::{
    CameraController, ClickOutcome, MapStore, RawPick, SliceMask, Tooltip, ViewState,
    handle_click, resolve_hover, tooltip_for,
};
use tracing::debug;

use crate::config::ViewerConfig;

/// Builds layer inputs from a loaded dataset. Landmarks are the curated
/// Bolzano list, not part of the dataset files.
pub fn layer_sources(dataset: &Dataset, landmarks: bool) -> LayerSources {
    LayerSources {
        buildings: Some(dataset.buildings.clone()),
        roads: Some(dataset.roads.clone()),
        pois: dataset.pois.clone(),
        landmarks: landmarks.then(|| Arc::from(bolzano_landmarks())),
    }
}

/// One interactive map: store, camera, layer stack and the perf window,
/// driven frame by frame by the host event loop.
pub struct Session {
    store: MapStore,
    camera: CameraController,
    composer: LayerComposer,
    sources: LayerSources,
    layers_dirty: Rc<Cell<bool>>,
    perf: FrameTimeWindow,
    frame: Frame,
}

impl Session {
    pub fn new(config: &ViewerConfig, sources: LayerSources) -> Self {
        let mut store = MapStore::with_initial_view(config.initial_view);
        let layers_dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&layers_dirty);
        store.subscribe(SliceMask::LAYERS, move |_, _| flag.set(true));

        let mut camera = CameraController::new(config.fly_to);
        camera.set_viewport_size(config.viewport_px[0], config.viewport_px[1]);

        let mut composer = LayerComposer::new(config.symbology.clone());
        composer.compose_from_store(&store, &sources);

        Self {
            store,
            camera,
            composer,
            sources,
            layers_dirty,
            perf: FrameTimeWindow::default(),
            frame: Frame::default(),
        }
    }

    pub fn from_dataset(config: &ViewerConfig, dataset: &Dataset) -> Self {
        Self::new(config, layer_sources(dataset, config.landmarks))
    }

    pub fn store(&self) -> &MapStore {
        &self.store
    }

    /// UI controls write here; layer-affecting writes recompose on the next
    /// [`Session::advance`].
    pub fn store_mut(&mut self) -> &mut MapStore {
        &mut self.store
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn composer(&self) -> &LayerComposer {
        &self.composer
    }

    pub fn sources(&self) -> &LayerSources {
        &self.sources
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn layers(&self) -> &[Arc<LayerDescriptor>] {
        self.composer.layers()
    }

    /// Applies a reloaded config's style tables and rebuilds the stack
    /// straight away. View and fly-to settings only apply at construction.
    pub fn reload_symbology(&mut self, config: &ViewerConfig) -> &[Arc<LayerDescriptor>] {
        debug!(frame = self.frame.index, "symbology reloaded");
        self.composer.set_symbology(config.symbology.clone());
        self.layers_dirty.set(false);
        self.composer.compose_from_store(&self.store, &self.sources)
    }

    /// `None` while the overlay is off or before the first sampled frame.
    pub fn perf_stats(&self) -> Option<FrameStats> {
        if !self.store.show_perf_overlay() {
            return None;
        }
        self.perf.stats()
    }

    /// Runs one frame of `dt_s` seconds: samples frame time, steps the
    /// camera and rebuilds the layer stack if a layer input changed.
    pub fn advance(&mut self, dt_s: f64) -> &[Arc<LayerDescriptor>] {
        self.frame = self.frame.advance(dt_s);
        self.store.begin_frame(self.frame);

        if self.store.show_perf_overlay() {
            self.perf.record(self.frame.dt_s * 1000.0);
        } else if !self.perf.is_empty() {
            self.perf.clear();
        }

        self.camera.tick(&mut self.store, self.frame.time);

        if self.layers_dirty.replace(false) {
            debug!(frame = self.frame.index, "recomposing layers");
            self.composer.compose_from_store(&self.store, &self.sources);
        }
        self.composer.layers()
    }

    /// User pan/zoom/rotate from the basemap; interrupts any fly-to.
    pub fn user_view_change(&mut self, view_state: ViewState) -> bool {
        self.camera.on_view_state_change(&mut self.store, view_state)
    }

    /// Starts a transition to `target` at the current frame time.
    pub fn fly_to(&mut self, target: LngLat) -> bool {
        self.camera.fly_to(&self.store, target, self.frame.time)
    }

    pub fn click(&mut self, raw: &RawPick) -> ClickOutcome {
        let info = self.composer.resolve_pick(raw);
        handle_click(&mut self.store, &mut self.camera, &info, self.frame.time)
    }

    /// Updates the hover slice and returns the card to show, if any.
    pub fn hover(&mut self, raw: &RawPick) -> Option<Tooltip> {
        let info = self.composer.resolve_pick(raw);
        let tooltip = tooltip_for(&info);
        resolve_hover(&mut self.store, info);
        tooltip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layers::LayerStyle;
    use pretty_assertions::assert_eq;
    use scene::{ColourMode, HeightRange, LayerId, LayerToggle};
    use std::path::Path;

    fn fixture_session() -> Session {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../formats/testdata");
        let dataset = Dataset::load(dir).expect("load fixture dataset");
        Session::from_dataset(&ViewerConfig::default(), &dataset)
    }

    fn ids(layers: &[Arc<LayerDescriptor>]) -> Vec<LayerId> {
        layers.iter().map(|d| d.id).collect()
    }

    fn building_pick(index: usize) -> RawPick {
        RawPick {
            x: 400.0,
            y: 300.0,
            coordinate: Some(LngLat::new(11.3525, 46.4988)),
            layer_id: Some(LayerId::BuildingsSolid.as_str().to_string()),
            index: Some(index),
        }
    }

    #[test]
    fn starts_with_default_stack() {
        let session = fixture_session();
        assert_eq!(
            ids(session.layers()),
            vec![
                LayerId::BuildingsSolid,
                LayerId::Roads,
                LayerId::Pois,
                LayerId::Landmarks
            ]
        );
    }

    #[test]
    fn store_writes_recompose_on_next_frame() {
        let mut session = fixture_session();
        session.store_mut().set_toggle(LayerToggle::Wireframe, true);
        session.store_mut().set_toggle(LayerToggle::Roads, false);
        assert_eq!(session.layers().len(), 4);

        let layers = session.advance(1.0 / 60.0);
        assert_eq!(
            ids(layers),
            vec![
                LayerId::BuildingsSolid,
                LayerId::BuildingsWireframe,
                LayerId::Pois,
                LayerId::Landmarks
            ]
        );
    }

    #[test]
    fn height_filter_reaches_descriptor() {
        let mut session = fixture_session();
        session
            .store_mut()
            .set_height_range(HeightRange::new(10.0, 30.0));
        session.store_mut().set_colour_mode(ColourMode::Type);
        session.advance(1.0 / 60.0);

        let solid = session
            .composer()
            .layer(LayerId::BuildingsSolid)
            .expect("solid layer");
        assert_eq!(solid.len(), 2);
        assert!(matches!(solid.style, LayerStyle::Extrusion(_)));
    }

    #[test]
    fn reloaded_symbology_rebuilds_stack() {
        let mut session = fixture_session();
        let before = session.layers().to_vec();
        let rebuilt = session.composer().stats().rebuilt;

        let config = ViewerConfig::from_json_str(
            r#"{ "symbology": { "height_scale": [[0, [0, 0, 0, 255]], [50, [255, 255, 255, 255]]] } }"#,
        )
        .expect("config");
        let after = session.reload_symbology(&config).to_vec();

        assert_eq!(ids(&after), ids(&before));
        for (a, b) in before.iter().zip(&after) {
            assert!(!Arc::ptr_eq(a, b), "{} was reused", a.id);
        }
        assert_eq!(
            session.composer().stats().rebuilt,
            rebuilt + after.len() as u64
        );
        assert_eq!(session.composer().symbology().height_scale.stops().len(), 2);
    }

    #[test]
    fn building_click_flies_and_settles() {
        let mut session = fixture_session();
        let outcome = session.click(&building_pick(0));
        assert!(matches!(outcome, ClickOutcome::SelectedBuilding { fly_to: Some(_) }));
        assert!(session.camera().is_transitioning());
        assert!(session.store().selection().building().is_some());

        session.advance(60.0);
        assert!(!session.camera().is_transitioning());
        let view = session.store().view_state();
        assert_eq!(view.zoom, 16.5);
        assert_eq!(view.pitch, 60.0);
        assert_eq!(view.longitude, 11.3525);
        assert_eq!(view.latitude, 46.4988);
    }

    #[test]
    fn user_input_interrupts_flight() {
        let mut session = fixture_session();
        session.click(&building_pick(1));
        session.advance(0.1);
        assert!(session.camera().is_transitioning());

        let mut manual = session.store().view_state();
        manual.bearing = 30.0;
        session.user_view_change(manual);
        assert!(!session.camera().is_transitioning());

        session.advance(60.0);
        assert_eq!(session.store().view_state().bearing, 30.0);
    }

    #[test]
    fn empty_click_clears_without_flight() {
        let mut session = fixture_session();
        session.click(&building_pick(0));
        session.advance(60.0);

        let outcome = session.click(&RawPick {
            x: 10.0,
            y: 10.0,
            ..Default::default()
        });
        assert_eq!(outcome, ClickOutcome::Cleared);
        assert!(session.store().selection().is_none());
        assert!(!session.camera().is_transitioning());
    }

    #[test]
    fn hover_yields_tooltip_and_tracks_store() {
        let mut session = fixture_session();
        let tooltip = session.hover(&RawPick {
            x: 100.0,
            y: 50.0,
            coordinate: None,
            layer_id: Some(LayerId::Pois.as_str().to_string()),
            index: Some(0),
        });
        let tooltip = tooltip.expect("poi tooltip");
        assert_eq!(tooltip.title.as_deref(), Some("Hopfen & Co."));
        assert!(session.store().hover().is_some());

        assert_eq!(session.hover(&RawPick::default()), None);
        assert!(session.store().hover().is_none());
    }

    #[test]
    fn perf_window_samples_only_while_shown() {
        let mut session = fixture_session();
        session.advance(0.02);
        assert_eq!(session.perf_stats(), None);

        session.store_mut().set_perf_overlay(true);
        session.advance(0.02);
        session.advance(0.02);
        let stats = session.perf_stats().expect("stats");
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.fps, 50);
        assert_eq!(stats.frame_ms, 20.0);

        session.store_mut().set_perf_overlay(false);
        session.advance(0.02);
        session.store_mut().set_perf_overlay(true);
        assert_eq!(session.perf_stats(), None);
    }
}
