use scene::LayerId;

use crate::layer::{Layer, LayerData, LayerDescriptor, LayerInputs, LayerKey, LayerStyle, PathStyle};
use crate::symbology::{Symbology, road_class_to_color, road_class_to_width};

/// Road network as stroked paths. Not pickable: the network is large and
/// the class already reads from colour and width.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RoadsLayer;

impl Layer for RoadsLayer {
    fn id(&self) -> LayerId {
        LayerId::Roads
    }

    fn key(&self, inputs: &LayerInputs<'_>) -> Option<LayerKey> {
        inputs.roads.map(|roads| LayerKey::data(roads.data_id()))
    }

    fn build(&self, inputs: &LayerInputs<'_>, symbology: &Symbology) -> Option<LayerDescriptor> {
        let roads = inputs.roads?;
        let widths_m = roads
            .iter()
            .map(|f| road_class_to_width(&f.properties.road_class, &symbology.road_widths))
            .collect();
        let colors = roads
            .iter()
            .map(|f| road_class_to_color(&f.properties.road_class, &symbology.road_colors))
            .collect();

        Some(LayerDescriptor {
            id: self.id(),
            data: LayerData::Roads(roads.clone()),
            pickable: false,
            highlight_color: None,
            style: LayerStyle::Path(PathStyle {
                widths_m,
                colors,
                width_min_px: 1.0,
                rounded: true,
            }),
        })
    }
}
