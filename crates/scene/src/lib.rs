pub mod camera;
pub mod feature;
pub mod picking;
pub mod selection;
pub mod store;
pub mod tooltip;
pub mod view;
pub mod visibility;

pub use camera::{CameraController, CameraMode, DEFAULT_VIEWPORT_PX, FlyTo, FlyToConfig};
pub use feature::*;
pub use picking::*;
pub use selection::Selection;
pub use store::{MapState, MapStore, Slice, SliceMask, SubscriptionId};
pub use tooltip::{TOOLTIP_OFFSET_PX, Tooltip, tooltip_for};
pub use view::*;
pub use visibility::*;
