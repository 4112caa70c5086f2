use std::sync::Arc;

use foundation::color::Rgba;
use foundation::math::LngLat;
use scene::{
    BuildingProperties, ColourMode, DataId, FeatureCollection, HeightRange, PoiProperties,
    RoadProperties,
};

use crate::labels::Landmark;
use crate::symbology::Symbology;

pub use scene::LayerId;

/// A renderable layer family.
pub trait Layer {
    fn id(&self) -> LayerId;

    /// Cache key for the descriptor this layer would build, or `None` when
    /// there is nothing to draw.
    fn key(&self, inputs: &LayerInputs<'_>) -> Option<LayerKey>;

    fn build(&self, inputs: &LayerInputs<'_>, symbology: &Symbology) -> Option<LayerDescriptor>;
}

/// Everything a layer declares it depends on. Equal keys mean an equal
/// descriptor, so the previous one can be reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerKey {
    pub data: DataId,
    pub colour_mode: Option<ColourMode>,
    pub height_range: Option<(u64, u64)>,
}

impl LayerKey {
    pub fn data(data: DataId) -> Self {
        Self {
            data,
            colour_mode: None,
            height_range: None,
        }
    }

    pub fn with_colour_mode(mut self, mode: ColourMode) -> Self {
        self.colour_mode = Some(mode);
        self
    }

    pub fn with_height_range(mut self, range: HeightRange) -> Self {
        self.height_range = Some(range.key());
        self
    }
}

/// Shared, immutable inputs. Collections are `None` until loaded.
#[derive(Debug, Clone, Default)]
pub struct LayerSources {
    pub buildings: Option<FeatureCollection<BuildingProperties>>,
    pub roads: Option<FeatureCollection<RoadProperties>>,
    pub pois: Option<FeatureCollection<PoiProperties>>,
    pub landmarks: Option<Arc<[Landmark]>>,
}

/// One composition pass: sources plus the current store values.
#[derive(Debug, Clone)]
pub struct LayerInputs<'a> {
    pub colour_mode: ColourMode,
    pub height_range: HeightRange,
    pub buildings: Option<&'a FeatureCollection<BuildingProperties>>,
    pub roads: Option<&'a FeatureCollection<RoadProperties>>,
    pub pois: Option<&'a FeatureCollection<PoiProperties>>,
    pub landmarks: Option<&'a Arc<[Landmark]>>,
}

impl<'a> LayerInputs<'a> {
    pub fn new(sources: &'a LayerSources, colour_mode: ColourMode, height_range: HeightRange) -> Self {
        Self {
            colour_mode,
            height_range,
            buildings: sources.buildings.as_ref(),
            roads: sources.roads.as_ref(),
            pois: sources.pois.as_ref(),
            landmarks: sources.landmarks.as_ref(),
        }
    }
}

pub fn landmarks_data_id(landmarks: &Arc<[Landmark]>) -> DataId {
    DataId(Arc::as_ptr(landmarks) as *const () as usize)
}

/// Geometry source of a descriptor; index `i` of every per-feature style
/// vector refers to item `i` here.
#[derive(Debug, Clone)]
pub enum LayerData {
    Buildings(FeatureCollection<BuildingProperties>),
    Roads(FeatureCollection<RoadProperties>),
    Pois(FeatureCollection<PoiProperties>),
    Landmarks(Arc<[Landmark]>),
}

impl LayerData {
    pub fn len(&self) -> usize {
        match self {
            LayerData::Buildings(c) => c.len(),
            LayerData::Roads(c) => c.len(),
            LayerData::Pois(c) => c.len(),
            LayerData::Landmarks(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lighting response of extruded surfaces.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub ambient: f32,
    pub diffuse: f32,
    pub shininess: f32,
    pub specular_color: [u8; 3],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: 0.3,
            diffuse: 0.8,
            shininess: 32.0,
            specular_color: [200, 200, 200],
        }
    }
}

/// Extruded polygons (footprint raised to `elevations[i]` metres).
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionStyle {
    pub filled: bool,
    pub wireframe: bool,
    pub elevations: Vec<f64>,
    /// Empty when `filled` is false.
    pub fill_colors: Vec<Rgba>,
    pub line_color: Rgba,
    pub line_width_min_px: f32,
    pub material: Option<Material>,
}

/// Stroked line strings, widths in metres.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStyle {
    pub widths_m: Vec<f64>,
    pub colors: Vec<Rgba>,
    pub width_min_px: f32,
    pub rounded: bool,
}

/// Circle markers with a fixed ground radius.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterStyle {
    pub positions: Vec<LngLat>,
    pub radius_m: f32,
    pub radius_min_px: f32,
    pub radius_max_px: f32,
    pub fill_colors: Vec<Rgba>,
    pub line_color: Rgba,
    pub line_width_min_px: f32,
}

/// Billboarded text on a background pill.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub positions: Vec<LngLat>,
    pub texts: Vec<String>,
    pub size: f32,
    pub size_min_px: f32,
    pub size_max_px: f32,
    pub color: Rgba,
    pub background_color: Rgba,
    /// Left, top, right, bottom.
    pub background_padding: [f32; 4],
    pub pixel_offset: [f32; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerStyle {
    Extrusion(ExtrusionStyle),
    Path(PathStyle),
    Scatter(ScatterStyle),
    Text(TextStyle),
}

/// Declarative description of one layer for the rendering engine.
#[derive(Debug, Clone)]
pub struct LayerDescriptor {
    pub id: LayerId,
    pub data: LayerData,
    pub pickable: bool,
    /// Hover tint applied by the engine; `None` disables auto-highlight.
    pub highlight_color: Option<Rgba>,
    pub style: LayerStyle,
}

impl LayerDescriptor {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
