use scene::{BuildingProperties, FeatureCollection, HeightRange};

/// Keeps buildings whose height lies in `range` (inclusive).
///
/// The "no filter" range returns `buildings` itself, same storage and same
/// [`scene::DataId`], so downstream caches keyed on identity stay warm.
/// Otherwise the result is a new collection sharing the surviving features;
/// buildings without a finite height are dropped.
pub fn filter_by_height(
    buildings: &FeatureCollection<BuildingProperties>,
    range: HeightRange,
) -> FeatureCollection<BuildingProperties> {
    if range.is_full() {
        return buildings.clone();
    }
    buildings
        .iter()
        .filter(|f| {
            f.properties
                .valid_height()
                .is_some_and(|h| range.contains(h))
        })
        .cloned()
        .collect()
}
