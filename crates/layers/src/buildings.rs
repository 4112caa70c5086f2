use foundation::color::Rgba;
use scene::{BuildingProperties, ColourMode, Feature, LayerId};

use crate::filter::filter_by_height;
use crate::layer::{
    ExtrusionStyle, Layer, LayerData, LayerDescriptor, LayerInputs, LayerKey, LayerStyle,
    Material,
};
use crate::symbology::{Symbology, height_to_color, type_to_color};

pub const BUILDING_HIGHLIGHT_COLOR: Rgba = Rgba::new(255, 255, 0, 120);
pub const BUILDING_LINE_COLOR: Rgba = Rgba::new(80, 80, 80, 100);
pub const WIREFRAME_LINE_COLOR: Rgba = Rgba::new(60, 60, 60, 180);

/// Extruded, filled footprints coloured by height or by type. Pickable.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BuildingsSolidLayer;

/// Extruded outlines only; ignores the colour mode.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BuildingsWireframeLayer;

/// Fill colour of one building under `mode`.
pub fn building_fill_color(
    building: &BuildingProperties,
    mode: ColourMode,
    symbology: &Symbology,
) -> Rgba {
    match mode {
        ColourMode::Height => height_to_color(
            building.valid_height().unwrap_or(f64::NAN),
            &symbology.height_scale,
        ),
        ColourMode::Type => type_to_color(building.building_type.as_deref(), &symbology.building_types),
    }
}

fn elevation(f: &Feature<BuildingProperties>) -> f64 {
    f.properties.valid_height().unwrap_or(0.0)
}

impl Layer for BuildingsSolidLayer {
    fn id(&self) -> LayerId {
        LayerId::BuildingsSolid
    }

    fn key(&self, inputs: &LayerInputs<'_>) -> Option<LayerKey> {
        let buildings = inputs.buildings?;
        Some(
            LayerKey::data(buildings.data_id())
                .with_colour_mode(inputs.colour_mode)
                .with_height_range(inputs.height_range),
        )
    }

    fn build(&self, inputs: &LayerInputs<'_>, symbology: &Symbology) -> Option<LayerDescriptor> {
        let filtered = filter_by_height(inputs.buildings?, inputs.height_range);
        let elevations = filtered.iter().map(|f| elevation(f)).collect();
        let fill_colors = filtered
            .iter()
            .map(|f| building_fill_color(&f.properties, inputs.colour_mode, symbology))
            .collect();

        Some(LayerDescriptor {
            id: self.id(),
            data: LayerData::Buildings(filtered),
            pickable: true,
            highlight_color: Some(BUILDING_HIGHLIGHT_COLOR),
            style: LayerStyle::Extrusion(ExtrusionStyle {
                filled: true,
                wireframe: false,
                elevations,
                fill_colors,
                line_color: BUILDING_LINE_COLOR,
                line_width_min_px: 0.0,
                material: Some(Material::default()),
            }),
        })
    }
}

impl Layer for BuildingsWireframeLayer {
    fn id(&self) -> LayerId {
        LayerId::BuildingsWireframe
    }

    fn key(&self, inputs: &LayerInputs<'_>) -> Option<LayerKey> {
        let buildings = inputs.buildings?;
        Some(LayerKey::data(buildings.data_id()).with_height_range(inputs.height_range))
    }

    fn build(&self, inputs: &LayerInputs<'_>, _symbology: &Symbology) -> Option<LayerDescriptor> {
        let filtered = filter_by_height(inputs.buildings?, inputs.height_range);
        let elevations = filtered.iter().map(|f| elevation(f)).collect();

        Some(LayerDescriptor {
            id: self.id(),
            data: LayerData::Buildings(filtered),
            pickable: false,
            highlight_color: None,
            style: LayerStyle::Extrusion(ExtrusionStyle {
                filled: false,
                wireframe: true,
                elevations,
                fill_colors: Vec::new(),
                line_color: WIREFRAME_LINE_COLOR,
                line_width_min_px: 1.0,
                material: None,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerSources;
    use foundation::math::LngLat;
    use pretty_assertions::assert_eq;
    use scene::{FeatureCollection, Geometry, HeightRange};

    fn sources() -> LayerSources {
        let building = |height: Option<f64>, kind: &str| {
            Feature::new(
                Geometry::Polygon(vec![vec![
                    LngLat::new(11.350, 46.490),
                    LngLat::new(11.351, 46.490),
                    LngLat::new(11.351, 46.491),
                    LngLat::new(11.350, 46.490),
                ]]),
                BuildingProperties {
                    height,
                    building_type: Some(kind.to_string()),
                    ..Default::default()
                },
            )
        };
        LayerSources {
            buildings: Some(FeatureCollection::new(vec![
                building(Some(5.0), "house"),
                building(Some(120.0), "church"),
                building(None, "shed"),
            ])),
            ..Default::default()
        }
    }

    fn extrusion(d: &LayerDescriptor) -> &ExtrusionStyle {
        match &d.style {
            LayerStyle::Extrusion(s) => s,
            other => panic!("unexpected style {other:?}"),
        }
    }

    #[test]
    fn solid_colours_follow_mode() {
        let sources = sources();
        let symbology = Symbology::default();

        let by_height = LayerInputs::new(&sources, ColourMode::Height, HeightRange::FULL);
        let d = BuildingsSolidLayer.build(&by_height, &symbology).expect("descriptor");
        assert!(d.pickable);
        assert_eq!(d.highlight_color, Some(BUILDING_HIGHLIGHT_COLOR));
        let style = extrusion(&d);
        assert_eq!(style.fill_colors[0], Rgba::new(96, 193, 191, 220));
        assert_eq!(style.elevations, vec![5.0, 120.0, 0.0]);
        // Missing height sits at the bottom of the ramp.
        assert_eq!(style.fill_colors[2], symbology.height_scale.stops()[0].1);

        let by_type = LayerInputs::new(&sources, ColourMode::Type, HeightRange::FULL);
        let d = BuildingsSolidLayer.build(&by_type, &symbology).expect("descriptor");
        let style = extrusion(&d);
        assert_eq!(style.fill_colors[1], Rgba::new(255, 200, 0, 220));
        assert_eq!(style.fill_colors[2], Rgba::new(120, 120, 130, 220));
    }

    #[test]
    fn both_building_layers_share_the_filter() {
        let sources = sources();
        let inputs = LayerInputs::new(&sources, ColourMode::Height, HeightRange::new(0.0, 50.0));
        let symbology = Symbology::default();
        let solid = BuildingsSolidLayer.build(&inputs, &symbology).expect("solid");
        let wire = BuildingsWireframeLayer.build(&inputs, &symbology).expect("wire");
        assert_eq!(solid.len(), 1);
        assert_eq!(wire.len(), 1);
        assert!(!wire.pickable);
        assert!(extrusion(&wire).fill_colors.is_empty());
        assert_eq!(extrusion(&wire).line_color, WIREFRAME_LINE_COLOR);
    }

    #[test]
    fn wireframe_key_ignores_colour_mode() {
        let sources = sources();
        let a = LayerInputs::new(&sources, ColourMode::Height, HeightRange::FULL);
        let b = LayerInputs::new(&sources, ColourMode::Type, HeightRange::FULL);
        assert_eq!(BuildingsWireframeLayer.key(&a), BuildingsWireframeLayer.key(&b));
        assert_ne!(BuildingsSolidLayer.key(&a), BuildingsSolidLayer.key(&b));
    }

    #[test]
    fn no_data_no_descriptor() {
        let empty = LayerSources::default();
        let inputs = LayerInputs::new(&empty, ColourMode::Height, HeightRange::FULL);
        assert!(BuildingsSolidLayer.build(&inputs, &Symbology::default()).is_none());
        assert!(BuildingsSolidLayer.key(&inputs).is_none());
    }
}
