pub mod config;
pub mod session;

pub use config::{ConfigError, ViewerConfig};
pub use session::{Session, layer_sources};
