//! Attribute-to-style mapping: colour ramps, category palettes and road widths.
//!
//! Everything here is pure and total. Unknown categories resolve to a
//! fallback, never an error; only constructing a malformed colour scale fails.

use std::collections::HashMap;

use foundation::color::Rgba;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Height ramp in metres, low (teal) to high (crimson).
pub const HEIGHT_COLOR_SCALE: [(f64, Rgba); 8] = [
    (0.0, Rgba::new(65, 182, 196, 220)),
    (10.0, Rgba::new(127, 205, 187, 220)),
    (20.0, Rgba::new(199, 233, 180, 220)),
    (40.0, Rgba::new(255, 255, 204, 220)),
    (60.0, Rgba::new(254, 178, 76, 220)),
    (100.0, Rgba::new(253, 141, 60, 220)),
    (150.0, Rgba::new(240, 59, 32, 220)),
    (300.0, Rgba::new(189, 0, 38, 220)),
];

pub const BUILDING_TYPE_DEFAULT_COLOR: Rgba = Rgba::new(150, 160, 170, 220);

/// Semantic building groups: legend label, colour and the OSM `building=*`
/// values that belong to it.
pub const BUILDING_TYPE_GROUPS: [(&str, Rgba, &[&str]); 7] = [
    (
        "Residential",
        Rgba::new(255, 160, 64, 220),
        &[
            "apartments",
            "residential",
            "house",
            "detached",
            "semidetached_house",
            "dormitory",
            "villa",
        ],
    ),
    (
        "Commercial",
        Rgba::new(255, 107, 30, 220),
        &["commercial", "retail", "supermarket", "hotel", "bank", "kiosk"],
    ),
    ("Office", Rgba::new(65, 120, 220, 220), &["office"]),
    (
        "Industrial",
        Rgba::new(120, 120, 130, 220),
        &["industrial", "warehouse", "shed", "garage", "garages", "service"],
    ),
    (
        "Public/Civic",
        Rgba::new(32, 178, 170, 220),
        &[
            "school",
            "university",
            "hospital",
            "civic",
            "public",
            "government",
            "fire_station",
            "sports_centre",
            "kindergarten",
            "train_station",
            "transportation",
            "parking",
            "grandstand",
            "bleachers",
        ],
    ),
    (
        "Religious",
        Rgba::new(255, 200, 0, 220),
        &["church", "chapel", "cathedral", "convent"],
    ),
    (
        "Agricultural",
        Rgba::new(100, 180, 80, 220),
        &["farm", "farm_auxiliary", "greenhouse", "glasshouse"],
    ),
];

/// Legend rows for type colouring, ending with the fallback.
pub const BUILDING_TYPE_CATEGORIES: [(&str, Rgba); 8] = [
    ("Residential", BUILDING_TYPE_GROUPS[0].1),
    ("Commercial", BUILDING_TYPE_GROUPS[1].1),
    ("Office", BUILDING_TYPE_GROUPS[2].1),
    ("Industrial", BUILDING_TYPE_GROUPS[3].1),
    ("Public/Civic", BUILDING_TYPE_GROUPS[4].1),
    ("Religious", BUILDING_TYPE_GROUPS[5].1),
    ("Agricultural", BUILDING_TYPE_GROUPS[6].1),
    ("Other", BUILDING_TYPE_DEFAULT_COLOR),
];

/// Fallback road class; its width applies to every unknown class.
pub const ROAD_FALLBACK_CLASS: &str = "other";

/// Road widths in metres, by OSM highway class and by the pipeline's
/// simplified classes.
pub const ROAD_WIDTH_SCALE: [(&str, f64); 11] = [
    ("motorway", 6.0),
    ("trunk", 5.0),
    ("primary", 4.0),
    ("secondary", 3.0),
    ("tertiary", 2.0),
    ("residential", 1.5),
    ("service", 1.0),
    ("major", 3.0),
    ("minor", 2.0),
    ("path", 1.0),
    (ROAD_FALLBACK_CLASS, 0.8),
];

pub const ROAD_DEFAULT_COLOR: Rgba = Rgba::new(150, 150, 150, 120);

pub const ROAD_CLASS_COLORS: [(&str, Rgba); 4] = [
    ("major", Rgba::new(230, 100, 100, 220)),
    ("minor", Rgba::new(230, 150, 80, 200)),
    ("other", Rgba::new(180, 210, 100, 180)),
    ("path", Rgba::new(140, 180, 140, 160)),
];

pub const POI_DEFAULT_COLOR: Rgba = Rgba::new(140, 140, 140, 230);

pub const POI_CATEGORY_COLORS: [(&str, Rgba); 8] = [
    ("food", Rgba::new(230, 85, 13, 230)),
    ("healthcare", Rgba::new(215, 25, 28, 230)),
    ("education", Rgba::new(44, 123, 182, 230)),
    ("finance", Rgba::new(35, 139, 69, 230)),
    ("accommodation", Rgba::new(117, 107, 177, 230)),
    ("culture", Rgba::new(221, 52, 151, 230)),
    ("shopping", Rgba::new(254, 196, 79, 230)),
    ("other", POI_DEFAULT_COLOR),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorScaleError {
    #[error("colour scale needs at least 2 breakpoints, got {len}")]
    TooFewStops { len: usize },
    #[error("breakpoint {index} is not a finite number")]
    NonFinite { index: usize },
    #[error("breakpoint {index} does not increase over the previous one")]
    NotIncreasing { index: usize },
}

/// Piecewise-linear colour ramp over strictly increasing breakpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, Rgba)>", into = "Vec<(f64, Rgba)>")]
pub struct ColorScale {
    stops: Vec<(f64, Rgba)>,
}

impl ColorScale {
    pub fn new(stops: Vec<(f64, Rgba)>) -> Result<Self, ColorScaleError> {
        if stops.len() < 2 {
            return Err(ColorScaleError::TooFewStops { len: stops.len() });
        }
        for (index, (value, _)) in stops.iter().enumerate() {
            if !value.is_finite() {
                return Err(ColorScaleError::NonFinite { index });
            }
            if index > 0 && *value <= stops[index - 1].0 {
                return Err(ColorScaleError::NotIncreasing { index });
            }
        }
        Ok(Self { stops })
    }

    pub fn height() -> Self {
        Self {
            stops: HEIGHT_COLOR_SCALE.to_vec(),
        }
    }

    pub fn stops(&self) -> &[(f64, Rgba)] {
        &self.stops
    }

    /// Colour at `value`. Values at or below the first breakpoint (and NaN)
    /// take the first colour; at or above the last, the last colour.
    pub fn sample(&self, value: f64) -> Rgba {
        // Construction guarantees at least two stops.
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return BUILDING_TYPE_DEFAULT_COLOR,
        };
        if value.is_nan() || value <= first.0 {
            return first.1;
        }
        if value >= last.0 {
            return last.1;
        }
        // First breakpoint strictly above `value`; always in 1..len here.
        let upper = self.stops.partition_point(|(h, _)| *h <= value);
        let (h0, c0) = self.stops[upper - 1];
        let (h1, c1) = self.stops[upper];
        c0.lerp(c1, (value - h0) / (h1 - h0))
    }
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::height()
    }
}

impl TryFrom<Vec<(f64, Rgba)>> for ColorScale {
    type Error = ColorScaleError;

    fn try_from(value: Vec<(f64, Rgba)>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ColorScale> for Vec<(f64, Rgba)> {
    fn from(value: ColorScale) -> Self {
        value.stops
    }
}

/// Exact-match category palette with a fallback colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryColorMap {
    pub colors: HashMap<String, Rgba>,
    pub default: Rgba,
}

impl CategoryColorMap {
    pub fn new(default: Rgba) -> Self {
        Self {
            colors: HashMap::new(),
            default,
        }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, Rgba)>, default: Rgba) -> Self {
        Self {
            colors: pairs.into_iter().map(|(k, c)| (k.to_string(), c)).collect(),
            default,
        }
    }

    pub fn building_types() -> Self {
        Self::from_pairs(
            BUILDING_TYPE_GROUPS
                .iter()
                .flat_map(|(_, color, tags)| tags.iter().map(move |tag| (*tag, *color))),
            BUILDING_TYPE_DEFAULT_COLOR,
        )
    }

    pub fn road_classes() -> Self {
        Self::from_pairs(ROAD_CLASS_COLORS, ROAD_DEFAULT_COLOR)
    }

    pub fn poi_categories() -> Self {
        Self::from_pairs(POI_CATEGORY_COLORS, POI_DEFAULT_COLOR)
    }

    pub fn get(&self, key: Option<&str>) -> Rgba {
        key.and_then(|k| self.colors.get(k))
            .copied()
            .unwrap_or(self.default)
    }
}

/// Road class to width in metres with a named fallback entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadWidthTable {
    pub widths: HashMap<String, f64>,
    #[serde(default = "default_fallback_class")]
    pub fallback_class: String,
}

fn default_fallback_class() -> String {
    ROAD_FALLBACK_CLASS.to_string()
}

/// Width used if a custom table lacks its own fallback entry.
const LAST_RESORT_WIDTH_M: f64 = 0.8;

impl RoadWidthTable {
    pub fn get(&self, class: &str) -> f64 {
        self.widths
            .get(class)
            .or_else(|| self.widths.get(&self.fallback_class))
            .copied()
            .filter(|w| w.is_finite() && *w >= 0.0)
            .unwrap_or(LAST_RESORT_WIDTH_M)
    }
}

impl Default for RoadWidthTable {
    fn default() -> Self {
        Self {
            widths: ROAD_WIDTH_SCALE
                .iter()
                .map(|(k, w)| (k.to_string(), *w))
                .collect(),
            fallback_class: default_fallback_class(),
        }
    }
}

/// The full style configuration consumed by the layer builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Symbology {
    pub height_scale: ColorScale,
    pub building_types: CategoryColorMap,
    pub road_widths: RoadWidthTable,
    pub road_colors: CategoryColorMap,
    pub poi_colors: CategoryColorMap,
}

impl Default for Symbology {
    fn default() -> Self {
        Self {
            height_scale: ColorScale::height(),
            building_types: CategoryColorMap::building_types(),
            road_widths: RoadWidthTable::default(),
            road_colors: CategoryColorMap::road_classes(),
            poi_colors: CategoryColorMap::poi_categories(),
        }
    }
}

pub fn height_to_color(height: f64, scale: &ColorScale) -> Rgba {
    scale.sample(height)
}

pub fn type_to_color(building_type: Option<&str>, map: &CategoryColorMap) -> Rgba {
    map.get(building_type)
}

pub fn road_class_to_width(road_class: &str, table: &RoadWidthTable) -> f64 {
    table.get(road_class)
}

pub fn road_class_to_color(road_class: &str, map: &CategoryColorMap) -> Rgba {
    map.get(Some(road_class))
}

pub fn poi_category_color(category: &str, map: &CategoryColorMap) -> Rgba {
    map.get(Some(category))
}
