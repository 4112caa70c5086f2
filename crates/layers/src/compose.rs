//! Layer stack assembly.
//!
//! The composer turns the store's toggles, colour mode and height range plus
//! the loaded collections into an ordered list of descriptors. Each layer's
//! descriptor is rebuilt only when its [`LayerKey`] changes; otherwise the
//! previous `Arc` is handed out again, so the rendering engine can skip
//! re-uploading attributes by pointer comparison.

use std::collections::HashMap;
use std::sync::Arc;

use scene::{
    ColourMode, HeightRange, LayerId, LayerToggle, LayerToggles, MapStore, PickInfo,
    PickedObject, RawPick,
};
use tracing::{debug, trace};

use crate::buildings::{BuildingsSolidLayer, BuildingsWireframeLayer};
use crate::labels::LandmarksLayer;
use crate::layer::{Layer, LayerData, LayerDescriptor, LayerInputs, LayerKey, LayerSources};
use crate::pois::PoisLayer;
use crate::roads::RoadsLayer;
use crate::symbology::Symbology;

struct CachedLayer {
    key: LayerKey,
    descriptor: Arc<LayerDescriptor>,
    /// Keeps the keyed source alive so its address cannot be reused while
    /// the key is cached.
    _source: LayerSources,
}

/// Rebuild/reuse counters since construction.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ComposeStats {
    pub rebuilt: u64,
    pub reused: u64,
}

pub struct LayerComposer {
    symbology: Symbology,
    landmarks_layer: LandmarksLayer,
    cache: HashMap<LayerId, CachedLayer>,
    stack: Vec<Arc<LayerDescriptor>>,
    stats: ComposeStats,
}

impl std::fmt::Debug for LayerComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerComposer")
            .field("stack", &self.stack.iter().map(|d| d.id).collect::<Vec<_>>())
            .field("cached", &self.cache.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Default for LayerComposer {
    fn default() -> Self {
        Self::new(Symbology::default())
    }
}

fn toggle_for(id: LayerId) -> LayerToggle {
    match id {
        LayerId::BuildingsSolid => LayerToggle::Buildings,
        LayerId::BuildingsWireframe => LayerToggle::Wireframe,
        LayerId::Roads => LayerToggle::Roads,
        LayerId::Pois => LayerToggle::Pois,
        LayerId::Landmarks => LayerToggle::Landmarks,
    }
}

impl LayerComposer {
    pub fn new(symbology: Symbology) -> Self {
        Self {
            symbology,
            landmarks_layer: LandmarksLayer::default(),
            cache: HashMap::new(),
            stack: Vec::new(),
            stats: ComposeStats::default(),
        }
    }

    pub fn symbology(&self) -> &Symbology {
        &self.symbology
    }

    /// Replaces the style tables. Every cached descriptor and the current
    /// stack are dropped, so the next compose rebuilds each layer.
    pub fn set_symbology(&mut self, symbology: Symbology) {
        self.symbology = symbology;
        self.cache.clear();
        self.stack.clear();
    }

    pub fn stats(&self) -> ComposeStats {
        self.stats
    }

    /// Result of the last [`LayerComposer::compose`], in paint order.
    pub fn layers(&self) -> &[Arc<LayerDescriptor>] {
        &self.stack
    }

    pub fn layer(&self, id: LayerId) -> Option<&Arc<LayerDescriptor>> {
        self.stack.iter().find(|d| d.id == id)
    }

    /// Builds the stack from the store's current toggles, colour mode and
    /// height range.
    pub fn compose_from_store(
        &mut self,
        store: &MapStore,
        sources: &LayerSources,
    ) -> &[Arc<LayerDescriptor>] {
        self.compose(
            store.toggles(),
            store.colour_mode(),
            store.height_range(),
            sources,
        )
    }

    /// Ordered stack: solid buildings, wireframe, roads, POIs, landmarks.
    /// Layers that are toggled off or lack data are omitted.
    pub fn compose(
        &mut self,
        toggles: LayerToggles,
        colour_mode: ColourMode,
        height_range: HeightRange,
        sources: &LayerSources,
    ) -> &[Arc<LayerDescriptor>] {
        let inputs = LayerInputs::new(sources, colour_mode, height_range);
        let mut stack = Vec::with_capacity(LayerId::ALL.len());

        for id in LayerId::ALL {
            if !toggles.get(toggle_for(id)) {
                continue;
            }
            if let Some(descriptor) = self.layer_descriptor(id, &inputs, sources) {
                stack.push(descriptor);
            }
        }

        self.stack = stack;
        &self.stack
    }

    fn layer_descriptor(
        &mut self,
        id: LayerId,
        inputs: &LayerInputs<'_>,
        sources: &LayerSources,
    ) -> Option<Arc<LayerDescriptor>> {
        let layer: &dyn Layer = match id {
            LayerId::BuildingsSolid => &BuildingsSolidLayer,
            LayerId::BuildingsWireframe => &BuildingsWireframeLayer,
            LayerId::Roads => &RoadsLayer,
            LayerId::Pois => &PoisLayer,
            LayerId::Landmarks => &self.landmarks_layer,
        };

        let Some(key) = layer.key(inputs) else {
            self.cache.remove(&id);
            return None;
        };

        if let Some(cached) = self.cache.get(&id)
            && cached.key == key
        {
            self.stats.reused += 1;
            trace!(layer = %id, "layer reused");
            return Some(Arc::clone(&cached.descriptor));
        }

        let descriptor = Arc::new(layer.build(inputs, &self.symbology)?);
        self.stats.rebuilt += 1;
        debug!(layer = %id, features = descriptor.len(), "layer rebuilt");
        self.cache.insert(
            id,
            CachedLayer {
                key,
                descriptor: Arc::clone(&descriptor),
                _source: sources.clone(),
            },
        );
        Some(descriptor)
    }

    /// Maps an engine pick onto the feature it refers to in the current
    /// stack. Unknown ids, non-pickable layers and out-of-range indices
    /// resolve to "nothing picked".
    pub fn resolve_pick(&self, raw: &RawPick) -> PickInfo {
        let object = raw
            .layer_id
            .as_deref()
            .and_then(|id| id.parse::<LayerId>().ok())
            .and_then(|id| self.layer(id))
            .filter(|d| d.pickable)
            .zip(raw.index)
            .and_then(|(d, index)| picked_object(&d.data, index));

        if object.is_none() && raw.layer_id.is_some() {
            trace!(layer = ?raw.layer_id, index = ?raw.index, "pick did not resolve");
        }

        PickInfo {
            x: raw.x,
            y: raw.y,
            coordinate: raw.coordinate,
            object,
        }
    }
}

fn picked_object(data: &LayerData, index: usize) -> Option<PickedObject> {
    match data {
        LayerData::Buildings(c) => c.get(index).cloned().map(PickedObject::Building),
        LayerData::Roads(c) => c.get(index).cloned().map(PickedObject::Road),
        LayerData::Pois(c) => c.get(index).cloned().map(PickedObject::Poi),
        LayerData::Landmarks(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::bolzano_landmarks;
    use crate::symbology::ColorScale;
    use foundation::color::Rgba;
    use foundation::math::LngLat;
    use pretty_assertions::assert_eq;
    use scene::{
        BuildingProperties, Feature, FeatureCollection, Geometry, PoiProperties, RoadProperties,
        Slice, SliceMask,
    };
    use std::cell::Cell;
    use std::rc::Rc;

    fn sources() -> LayerSources {
        let square = || {
            Geometry::Polygon(vec![vec![
                LngLat::new(11.350, 46.490),
                LngLat::new(11.351, 46.490),
                LngLat::new(11.351, 46.491),
                LngLat::new(11.350, 46.490),
            ]])
        };
        let buildings = FeatureCollection::new(vec![
            Feature::new(
                square(),
                BuildingProperties {
                    height: Some(12.0),
                    ..Default::default()
                },
            ),
            Feature::new(
                square(),
                BuildingProperties {
                    height: Some(80.0),
                    ..Default::default()
                },
            ),
        ]);
        let roads = FeatureCollection::new(vec![Feature::new(
            Geometry::LineString(vec![LngLat::new(11.35, 46.49), LngLat::new(11.36, 46.5)]),
            RoadProperties::default(),
        )]);
        let pois = FeatureCollection::new(vec![Feature::new(
            Geometry::Point(LngLat::new(11.3526, 46.4994)),
            PoiProperties::default(),
        )]);
        LayerSources {
            buildings: Some(buildings),
            roads: Some(roads),
            pois: Some(pois),
            landmarks: Some(Arc::from(bolzano_landmarks())),
        }
    }

    fn ids(layers: &[Arc<LayerDescriptor>]) -> Vec<LayerId> {
        layers.iter().map(|d| d.id).collect()
    }

    #[test]
    fn buildings_only_yields_one_descriptor() {
        let mut composer = LayerComposer::default();
        let toggles = LayerToggles {
            buildings: true,
            ..LayerToggles::none()
        };
        let layers = composer.compose(toggles, ColourMode::Height, HeightRange::FULL, &sources());
        assert_eq!(ids(layers), vec![LayerId::BuildingsSolid]);
    }

    #[test]
    fn everything_on_in_paint_order() {
        let mut composer = LayerComposer::default();
        let toggles = LayerToggles {
            wireframe: true,
            ..LayerToggles::default()
        };
        let layers = composer.compose(toggles, ColourMode::Height, HeightRange::FULL, &sources());
        assert_eq!(ids(layers), LayerId::ALL.to_vec());
    }

    #[test]
    fn each_toggle_controls_exactly_its_layer() {
        let sources = sources();
        let all_on = LayerToggles {
            wireframe: true,
            ..LayerToggles::default()
        };
        for toggle in LayerToggle::ALL {
            let mut composer = LayerComposer::default();
            let with = ids(composer.compose(all_on, ColourMode::Height, HeightRange::FULL, &sources));
            let without = ids(composer.compose(
                all_on.with(toggle, false),
                ColourMode::Height,
                HeightRange::FULL,
                &sources,
            ));
            let missing: Vec<LayerId> = with.into_iter().filter(|id| !without.contains(id)).collect();
            assert_eq!(missing.len(), 1, "toggle {toggle}");
            assert_eq!(toggle_for(missing[0]), toggle);
        }
    }

    #[test]
    fn missing_data_is_skipped() {
        let mut composer = LayerComposer::default();
        let partial = LayerSources {
            roads: sources().roads,
            ..Default::default()
        };
        let layers = composer.compose(
            LayerToggles::default(),
            ColourMode::Height,
            HeightRange::FULL,
            &partial,
        );
        assert_eq!(ids(layers), vec![LayerId::Roads]);
    }

    #[test]
    fn unchanged_keys_reuse_descriptors() {
        let sources = sources();
        let mut composer = LayerComposer::default();
        let toggles = LayerToggles::default();
        let first: Vec<_> = composer
            .compose(toggles, ColourMode::Height, HeightRange::FULL, &sources)
            .to_vec();
        let second: Vec<_> = composer
            .compose(toggles, ColourMode::Type, HeightRange::FULL, &sources)
            .to_vec();

        // Only the solid layer depends on the colour mode.
        assert!(!Arc::ptr_eq(&first[0], &second[0]));
        for (a, b) in first.iter().zip(&second).skip(1) {
            assert!(Arc::ptr_eq(a, b), "{} was rebuilt", a.id);
        }
        assert_eq!(
            composer.stats(),
            ComposeStats {
                rebuilt: 5,
                reused: 3
            }
        );
    }

    #[test]
    fn new_symbology_rebuilds_every_layer() {
        let sources = sources();
        let mut composer = LayerComposer::default();
        let toggles = LayerToggles {
            wireframe: true,
            ..LayerToggles::default()
        };
        let before = composer
            .compose(toggles, ColourMode::Height, HeightRange::FULL, &sources)
            .to_vec();
        let stats = composer.stats();

        let grey = Rgba::new(128, 128, 128, 255);
        composer.set_symbology(Symbology {
            height_scale: ColorScale::new(vec![(0.0, grey), (50.0, grey)]).expect("valid scale"),
            ..Symbology::default()
        });
        assert!(composer.layers().is_empty());
        assert!(composer.layer(LayerId::Roads).is_none());

        let after = composer
            .compose(toggles, ColourMode::Height, HeightRange::FULL, &sources)
            .to_vec();
        assert_eq!(ids(&after), ids(&before));
        for (a, b) in before.iter().zip(&after) {
            assert!(!Arc::ptr_eq(a, b), "{} was reused", a.id);
        }
        assert_eq!(
            composer.stats(),
            ComposeStats {
                rebuilt: stats.rebuilt + after.len() as u64,
                reused: stats.reused
            }
        );
    }

    #[test]
    fn height_range_invalidates_building_layers_only() {
        let sources = sources();
        let mut composer = LayerComposer::default();
        let toggles = LayerToggles {
            wireframe: true,
            ..LayerToggles::default()
        };
        let first = composer
            .compose(toggles, ColourMode::Height, HeightRange::FULL, &sources)
            .to_vec();
        let second = composer
            .compose(toggles, ColourMode::Height, HeightRange::new(0.0, 50.0), &sources)
            .to_vec();
        assert_eq!(second[0].len(), 1);
        assert_eq!(second[1].len(), 1);
        assert!(!Arc::ptr_eq(&first[0], &second[0]));
        assert!(!Arc::ptr_eq(&first[1], &second[1]));
        assert!(Arc::ptr_eq(&first[2], &second[2]));
    }

    #[test]
    fn resolves_picks_against_current_stack() {
        let sources = sources();
        let mut composer = LayerComposer::default();
        composer.compose(
            LayerToggles::default(),
            ColourMode::Height,
            HeightRange::new(50.0, 100.0),
            &sources,
        );

        let raw = RawPick {
            x: 10.0,
            y: 20.0,
            coordinate: Some(LngLat::new(11.35, 46.49)),
            layer_id: Some("buildings-solid".into()),
            index: Some(0),
        };
        let info = composer.resolve_pick(&raw);
        // Index 0 of the filtered data is the 80 m building.
        let Some(PickedObject::Building(b)) = &info.object else {
            panic!("expected building, got {:?}", info.object);
        };
        assert_eq!(b.properties.height, Some(80.0));

        let poi = composer.resolve_pick(&RawPick {
            layer_id: Some("pois".into()),
            index: Some(0),
            ..RawPick::default()
        });
        assert!(matches!(poi.object, Some(PickedObject::Poi(_))));

        for (layer, index) in [("roads-path", 0), ("landmarks", 0), ("pois", 7), ("terrain", 0)] {
            let miss = composer.resolve_pick(&RawPick {
                layer_id: Some(layer.into()),
                index: Some(index),
                ..RawPick::default()
            });
            assert_eq!(miss.object, None, "{layer}#{index}");
        }
    }

    #[test]
    fn store_subscription_drives_recompose() {
        let sources = sources();
        let mut store = MapStore::new();
        let mut composer = LayerComposer::default();
        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        store.subscribe(SliceMask::LAYERS, move |_, _| flag.set(true));

        composer.compose_from_store(&store, &sources);
        dirty.set(false);

        store.set_hover(None);
        assert!(!dirty.get());

        store.toggle(LayerToggle::Roads);
        assert!(dirty.get());
        let layers = composer.compose_from_store(&store, &sources);
        assert!(!ids(layers).contains(&LayerId::Roads));
        assert_eq!(store.revision(Slice::Toggles), 1);
    }
}
