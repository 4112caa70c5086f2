use std::sync::Arc;

use crate::feature::{BuildingProperties, Feature, PoiProperties};

/// Clicked feature driving the detail panels.
///
/// A building and a POI can never be selected at the same time.
#[derive(Debug, Clone, Default)]
pub enum Selection {
    #[default]
    None,
    Building(Arc<Feature<BuildingProperties>>),
    Poi(Arc<Feature<PoiProperties>>),
}

impl Selection {
    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }

    pub fn building(&self) -> Option<&Arc<Feature<BuildingProperties>>> {
        match self {
            Selection::Building(b) => Some(b),
            _ => None,
        }
    }

    pub fn poi(&self) -> Option<&Arc<Feature<PoiProperties>>> {
        match self {
            Selection::Poi(p) => Some(p),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Selection::None => "none",
            Selection::Building(_) => "building",
            Selection::Poi(_) => "poi",
        }
    }
}

/// Selections compare by feature identity, not by value.
impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Selection::None, Selection::None) => true,
            (Selection::Building(a), Selection::Building(b)) => Arc::ptr_eq(a, b),
            (Selection::Poi(a), Selection::Poi(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
