use foundation::color::Rgba;
use foundation::math::LngLat;
use scene::LayerId;
use serde::{Deserialize, Serialize};

use crate::layer::{
    Layer, LayerData, LayerDescriptor, LayerInputs, LayerKey, LayerStyle, TextStyle,
    landmarks_data_id,
};
use crate::symbology::Symbology;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandmarkKind {
    Culture,
    Transport,
    Nature,
    Market,
}

impl LandmarkKind {
    /// Plain-text prefix; glyph atlases in the engine have no emoji.
    pub fn tag(self) -> &'static str {
        match self {
            LandmarkKind::Culture => "[*]",
            LandmarkKind::Transport => "[T]",
            LandmarkKind::Nature => "[~]",
            LandmarkKind::Market => "[M]",
        }
    }
}

/// Curated point of orientation shown as a text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// May contain `\n` for a two-line label.
    pub name: String,
    pub position: LngLat,
    pub kind: LandmarkKind,
}

impl Landmark {
    pub fn new(name: impl Into<String>, lon: f64, lat: f64, kind: LandmarkKind) -> Self {
        Self {
            name: name.into(),
            position: LngLat::new(lon, lat),
            kind,
        }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.kind.tag(), self.name)
    }
}

/// Central Bolzano.
pub fn bolzano_landmarks() -> Vec<Landmark> {
    use LandmarkKind::*;
    vec![
        Landmark::new("Bolzano Cathedral", 11.3525, 46.4988, Culture),
        Landmark::new("Piazza Walther", 11.3531, 46.4979, Culture),
        Landmark::new("Piazza Erbe", 11.3526, 46.4994, Market),
        Landmark::new("South Tyrol Museum\nof Archaeology", 11.3532, 46.4992, Culture),
        Landmark::new("Museion", 11.3464, 46.4968, Culture),
        Landmark::new("Bolzano Station", 11.3572, 46.4929, Transport),
        Landmark::new("Castel Roncolo", 11.3316, 46.5161, Culture),
        Landmark::new("Talvera Promenade", 11.3465, 46.5015, Nature),
        Landmark::new("Gries", 11.3378, 46.4963, Culture),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub size: f32,
    pub size_min_px: f32,
    pub size_max_px: f32,
    pub color: Rgba,
    pub background_color: Rgba,
    pub background_padding: [f32; 4],
    pub pixel_offset: [f32; 2],
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            size: 13.0,
            size_min_px: 10.0,
            size_max_px: 16.0,
            color: Rgba::new(20, 20, 20, 240),
            background_color: Rgba::new(255, 255, 255, 210),
            background_padding: [5.0, 3.0, 5.0, 3.0],
            pixel_offset: [0.0, -24.0],
        }
    }
}

/// Decorative landmark labels; never pickable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarksLayer {
    pub style: LabelStyle,
}

impl Layer for LandmarksLayer {
    fn id(&self) -> LayerId {
        LayerId::Landmarks
    }

    fn key(&self, inputs: &LayerInputs<'_>) -> Option<LayerKey> {
        inputs
            .landmarks
            .map(|landmarks| LayerKey::data(landmarks_data_id(landmarks)))
    }

    fn build(&self, inputs: &LayerInputs<'_>, _symbology: &Symbology) -> Option<LayerDescriptor> {
        let landmarks = inputs.landmarks?;
        let style = &self.style;
        Some(LayerDescriptor {
            id: self.id(),
            data: LayerData::Landmarks(landmarks.clone()),
            pickable: false,
            highlight_color: None,
            style: LayerStyle::Text(TextStyle {
                positions: landmarks.iter().map(|l| l.position).collect(),
                texts: landmarks.iter().map(Landmark::label).collect(),
                size: style.size,
                size_min_px: style.size_min_px,
                size_max_px: style.size_max_px,
                color: style.color,
                background_color: style.background_color,
                background_padding: style.background_padding,
                pixel_offset: style.pixel_offset,
            }),
        })
    }
}
