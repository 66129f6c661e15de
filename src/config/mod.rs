//! Configuration: settings structs, TOML persistence and platform paths.

mod paths;
mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, AudioConfig, ServiceConfig, TranslationConfig};
