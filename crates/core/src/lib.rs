pub mod config;
pub mod entity;
pub mod error;
pub mod intent;
pub mod record;

pub use config::Config;
pub use entity::*;
pub use error::*;
pub use intent::IntentKind;
pub use record::*;
