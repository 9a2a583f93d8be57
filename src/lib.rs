// Framework Desktop RGB fan driver - shared library
// Color codec, animation engine, controller facade and preset config

pub mod animation;
pub mod color;
pub mod config;
pub mod controller;
pub mod preset;
pub mod preview;

pub use animation::{AnimationEngine, AnimationError, LED_COUNT};
pub use config::{AppConfig, ConfigError, ConfigStore};
pub use controller::{ApplyError, ApplyResult, RgbController};
pub use preset::{AnimationKind, Preset};
pub use preview::TerminalPreview;
