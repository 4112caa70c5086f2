pub mod dataset;
pub mod geojson;
pub mod metadata;

pub use dataset::*;
pub use geojson::*;
pub use metadata::*;
