use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use foundation::math::LngLat;
use foundation::time::Time;
use tracing::debug;

use crate::camera::CameraController;
use crate::feature::{BuildingProperties, Feature, PoiProperties, RoadProperties};
use crate::store::MapStore;

/// Stable identifiers shared with the rendering engine.
///
/// Declaration order is paint order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerId {
    BuildingsSolid,
    BuildingsWireframe,
    Roads,
    Pois,
    Landmarks,
}

impl LayerId {
    pub const ALL: [LayerId; 5] = [
        LayerId::BuildingsSolid,
        LayerId::BuildingsWireframe,
        LayerId::Roads,
        LayerId::Pois,
        LayerId::Landmarks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerId::BuildingsSolid => "buildings-solid",
            LayerId::BuildingsWireframe => "buildings-wireframe",
            LayerId::Roads => "roads-path",
            LayerId::Pois => "pois",
            LayerId::Landmarks => "landmarks",
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLayerId(pub String);

impl fmt::Display for UnknownLayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown layer id: {}", self.0)
    }
}

impl std::error::Error for UnknownLayerId {}

impl FromStr for LayerId {
    type Err = UnknownLayerId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownLayerId(s.to_string()))
    }
}

/// A picked feature, tagged by the layer family it came from.
#[derive(Debug, Clone)]
pub enum PickedObject {
    Building(Arc<Feature<BuildingProperties>>),
    Road(Arc<Feature<RoadProperties>>),
    Poi(Arc<Feature<PoiProperties>>),
}

impl PickedObject {
    /// Pickable layer this kind of object is rendered by.
    pub fn layer_id(&self) -> LayerId {
        match self {
            PickedObject::Building(_) => LayerId::BuildingsSolid,
            PickedObject::Road(_) => LayerId::Roads,
            PickedObject::Poi(_) => LayerId::Pois,
        }
    }
}

impl PartialEq for PickedObject {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PickedObject::Building(a), PickedObject::Building(b)) => Arc::ptr_eq(a, b),
            (PickedObject::Road(a), PickedObject::Road(b)) => Arc::ptr_eq(a, b),
            (PickedObject::Poi(a), PickedObject::Poi(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Pick event as reported by the rendering engine: screen position, the
/// ground coordinate under the pointer, and (when something was hit) the
/// layer id plus the index into that layer's data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawPick {
    pub x: f64,
    pub y: f64,
    pub coordinate: Option<LngLat>,
    pub layer_id: Option<String>,
    pub index: Option<usize>,
}

/// Resolved pick result.
#[derive(Debug, Clone, PartialEq)]
pub struct PickInfo {
    pub x: f64,
    pub y: f64,
    pub coordinate: Option<LngLat>,
    pub object: Option<PickedObject>,
}

impl PickInfo {
    /// Pointer over empty space.
    pub fn empty(x: f64, y: f64, coordinate: Option<LngLat>) -> Self {
        Self {
            x,
            y,
            coordinate,
            object: None,
        }
    }

    pub fn hit(x: f64, y: f64, coordinate: Option<LngLat>, object: PickedObject) -> Self {
        Self {
            x,
            y,
            coordinate,
            object: Some(object),
        }
    }
}

/// What a click did to the selection.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Empty space: both selections cleared.
    Cleared,
    SelectedPoi,
    /// Building selected; `fly_to` is the requested camera target.
    SelectedBuilding { fly_to: Option<LngLat> },
    /// Hit on a kind that carries no selection (roads).
    Ignored,
}

impl ClickOutcome {
    pub fn fly_to(&self) -> Option<LngLat> {
        match self {
            ClickOutcome::SelectedBuilding { fly_to } => *fly_to,
            _ => None,
        }
    }
}

/// Applies a click to the selection slice. Does not move the camera; see
/// [`handle_click`].
pub fn resolve_click(store: &mut MapStore, info: &PickInfo) -> ClickOutcome {
    let Some(object) = &info.object else {
        store.clear_selection();
        return ClickOutcome::Cleared;
    };

    match object {
        PickedObject::Poi(poi) => {
            store.select_poi(Arc::clone(poi));
            ClickOutcome::SelectedPoi
        }
        PickedObject::Building(building) => {
            store.select_building(Arc::clone(building));
            ClickOutcome::SelectedBuilding {
                fly_to: info.coordinate.filter(LngLat::is_finite),
            }
        }
        PickedObject::Road(_) => {
            debug!("click on road feature ignored");
            ClickOutcome::Ignored
        }
    }
}

/// Pointer-move: any hit replaces the hover slice, a miss clears it.
pub fn resolve_hover(store: &mut MapStore, info: PickInfo) {
    if info.object.is_some() {
        store.set_hover(Some(info));
    } else {
        store.set_hover(None);
    }
}

/// Click entry point: updates the selection and starts a fly-to for
/// building hits.
pub fn handle_click(
    store: &mut MapStore,
    camera: &mut CameraController,
    info: &PickInfo,
    now: Time,
) -> ClickOutcome {
    let outcome = resolve_click(store, info);
    if let Some(target) = outcome.fly_to() {
        camera.fly_to(store, target, now);
    }
    outcome
}
