use foundation::color::Rgba;
use foundation::math::LngLat;
use scene::LayerId;

use crate::layer::{
    Layer, LayerData, LayerDescriptor, LayerInputs, LayerKey, LayerStyle, ScatterStyle,
};
use crate::symbology::{Symbology, poi_category_color};

pub const POI_RADIUS_M: f32 = 10.0;
pub const POI_OUTLINE_COLOR: Rgba = Rgba::new(255, 255, 255, 180);

/// Amenity markers coloured by category. Pickable.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PoisLayer;

impl Layer for PoisLayer {
    fn id(&self) -> LayerId {
        LayerId::Pois
    }

    fn key(&self, inputs: &LayerInputs<'_>) -> Option<LayerKey> {
        inputs
            .pois
            .filter(|pois| !pois.is_empty())
            .map(|pois| LayerKey::data(pois.data_id()))
    }

    fn build(&self, inputs: &LayerInputs<'_>, symbology: &Symbology) -> Option<LayerDescriptor> {
        let pois = inputs.pois.filter(|pois| !pois.is_empty())?;
        // Markers need a single position; features without one stay in
        // `data` (indices must line up) but are placed at the origin.
        let positions = pois
            .iter()
            .map(|f| f.geometry.anchor().unwrap_or(LngLat::new(0.0, 0.0)))
            .collect();
        let fill_colors = pois
            .iter()
            .map(|f| poi_category_color(&f.properties.category, &symbology.poi_colors))
            .collect();

        Some(LayerDescriptor {
            id: self.id(),
            data: LayerData::Pois(pois.clone()),
            pickable: true,
            highlight_color: None,
            style: LayerStyle::Scatter(ScatterStyle {
                positions,
                radius_m: POI_RADIUS_M,
                radius_min_px: 4.0,
                radius_max_px: 18.0,
                fill_colors,
                line_color: POI_OUTLINE_COLOR,
                line_width_min_px: 1.0,
            }),
        })
    }
}
