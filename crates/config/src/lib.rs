//! Configuration loading, env substitution, overrides, and validation.
//!
//! Config files: `mjwrap.toml`, `mjwrap.yaml`, or `mjwrap.json`
//! Searched in `./` then `~/.config/mjwrap/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{CallbackConfig, DiscordConfig, RelayConfig, RequestsConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
