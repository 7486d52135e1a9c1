//! # todo-settings
//!
//! Configuration for the task tracker, loaded from three layers (in priority
//! order):
//! 1. **Compiled defaults**: [`TodoSettings::default()`]
//! 2. **User file**: `~/.todo/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `TODO_*` overrides (highest priority)
//!
//! Settings are loaded once by the front-end and passed down explicitly.
//! There is no process-wide settings singleton.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_settings, load_settings_from_path,
    settings_dir, settings_path,
};
pub use types::*;
