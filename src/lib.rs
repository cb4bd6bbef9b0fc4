//! Paint deadlines onto a desktop wallpaper.
//!
//! Events are sorted into urgency tiers ([`model::categorize`]), the tiers are
//! laid out as columns over a background image ([`layout::compute_columns`])
//! and drawn onto a copy of it ([`render::render`]).

pub mod config;
pub mod error;
pub mod font;
pub mod layout;
pub mod logging;
pub mod model;
pub mod render;
pub mod store;
pub mod wallpaper;

pub use config::{RenderConfig, Rgb};
pub use error::{ConfigError, RenderError, ResourceError, StoreError, ValidationError};
pub use model::{categorize, Event, Tier, Tiers};
pub use render::render;
pub use store::EventStore;
pub use wallpaper::Wallpaper;
