//! Configuration loading for the gateway.
//!
//! Config files: `upwire.toml`, `upwire.yaml`, or `upwire.json`,
//! searched in `./` then `~/.config/upwire/` (or a pinned directory via
//! [`set_config_dir`]), with `${ENV_VAR}` substitution in string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{clear_config_dir, discover_and_load, load_config, set_config_dir},
    schema::{ConversationsConfig, ForwardingConfig, ServerConfig, UpwireConfig},
};
