//! Configuration file parsing for Operator Shell
//!
//! Supports:
//! - `opsh.toml` - Application identity, window size, backend commands
//! - `$OPSH_CONFIG` - Explicit path overriding the lookup

pub mod settings;
pub mod types;

pub use settings::{find_config_file, load_config, load_config_from, CONFIG_ENV_VAR, CONFIG_FILENAME};
pub use types::*;
