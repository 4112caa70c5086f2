pub mod buildings;
pub mod compose;
pub mod filter;
pub mod labels;
pub mod layer;
pub mod pois;
pub mod roads;
pub mod symbology;

pub use compose::{ComposeStats, LayerComposer};
pub use filter::filter_by_height;
pub use labels::{Landmark, LandmarkKind, bolzano_landmarks};
pub use layer::*;
pub use symbology::*;
