use crate::feature::{BuildingProperties, PoiProperties, RoadProperties};
use crate::picking::{PickInfo, PickedObject};

/// Tooltip anchor offset from the pointer, in pixels.
pub const TOOLTIP_OFFSET_PX: f64 = 12.0;

/// Hover card content, positioned in screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub x: f64,
    pub y: f64,
    /// Bold first line, if the feature has one.
    pub title: Option<String>,
    pub rows: Vec<String>,
}

/// Builds the hover card for a pick; `None` when nothing was hit.
///
/// Each feature kind has its own property schema, so content branches on
/// the object variant.
pub fn tooltip_for(info: &PickInfo) -> Option<Tooltip> {
    let object = info.object.as_ref()?;
    let (title, rows) = match object {
        PickedObject::Building(f) => building_rows(&f.properties),
        PickedObject::Road(f) => road_rows(&f.properties),
        PickedObject::Poi(f) => poi_rows(&f.properties),
    };
    Some(Tooltip {
        x: info.x + TOOLTIP_OFFSET_PX,
        y: info.y + TOOLTIP_OFFSET_PX,
        title,
        rows,
    })
}

fn building_rows(p: &BuildingProperties) -> (Option<String>, Vec<String>) {
    let mut rows = Vec::with_capacity(3);
    if let Some(h) = p.valid_height() {
        rows.push(format!("Height: {h:.1} m"));
    }
    rows.push(format!("Source: {}", p.height_source.description()));
    if let Some(t) = p.building_type.as_deref().filter(|t| !t.is_empty()) {
        rows.push(format!("Type: {t}"));
    }
    (non_empty(p.name.as_deref()), rows)
}

fn road_rows(p: &RoadProperties) -> (Option<String>, Vec<String>) {
    let mut rows = vec![format!("Class: {}", p.road_class)];
    if p.width.is_finite() {
        rows.push(format!("Width: {:.1} m", p.width));
    }
    (non_empty(p.name.as_deref()), rows)
}

fn poi_rows(p: &PoiProperties) -> (Option<String>, Vec<String>) {
    let title = non_empty(Some(p.name.as_str())).unwrap_or_else(|| "(unnamed)".to_string());
    let mut rows = vec![capitalize(&p.category)];
    if !p.amenity_tag.is_empty() {
        rows.push(p.amenity_tag.replace('_', " "));
    }
    (Some(title), rows)
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Feature, Geometry, HeightSource};
    use foundation::math::LngLat;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn at<P>(props: P) -> Arc<Feature<P>> {
        Arc::new(Feature::new(Geometry::Point(LngLat::new(11.35, 46.49)), props))
    }

    #[test]
    fn building_card() {
        let info = PickInfo::hit(
            100.0,
            50.0,
            None,
            PickedObject::Building(at(BuildingProperties {
                height: Some(23.456),
                height_source: HeightSource::Overture,
                building_type: Some("apartments".into()),
                name: Some("Casa Rossa".into()),
            })),
        );
        let tip = tooltip_for(&info).expect("tooltip");
        assert_eq!((tip.x, tip.y), (112.0, 62.0));
        assert_eq!(tip.title.as_deref(), Some("Casa Rossa"));
        assert_eq!(
            tip.rows,
            vec!["Height: 23.5 m", "Source: Overture height", "Type: apartments"]
        );
    }

    #[test]
    fn road_card_uses_road_schema() {
        let info = PickInfo::hit(
            0.0,
            0.0,
            None,
            PickedObject::Road(at(RoadProperties {
                name: None,
                road_class: "primary".into(),
                width: 4.0,
            })),
        );
        let tip = tooltip_for(&info).expect("tooltip");
        assert_eq!(tip.title, None);
        assert_eq!(tip.rows, vec!["Class: primary", "Width: 4.0 m"]);
    }

    #[test]
    fn poi_card_falls_back_to_unnamed() {
        let info = PickInfo::hit(
            0.0,
            0.0,
            None,
            PickedObject::Poi(at(PoiProperties {
                name: String::new(),
                category: "food".into(),
                amenity_tag: "fast_food".into(),
            })),
        );
        let tip = tooltip_for(&info).expect("tooltip");
        assert_eq!(tip.title.as_deref(), Some("(unnamed)"));
        assert_eq!(tip.rows, vec!["Food", "fast food"]);
    }

    #[test]
    fn nothing_hit_means_no_card() {
        assert_eq!(tooltip_for(&PickInfo::empty(1.0, 1.0, None)), None);
    }
}
