/// TOML configuration and resolved runtime settings.
pub mod toml_config;
