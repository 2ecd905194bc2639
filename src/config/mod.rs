//! Configuration module for map-prompt
//!
//! Settings are layered: built-in defaults, an optional TOML file,
//! `MAP_PROMPT_*` environment variables, then command-line flags applied by
//! `main`. Validation runs once after all layers are in.

pub mod settings;

pub use settings::{ConfigError, MapConfig, parse_coordinate};
