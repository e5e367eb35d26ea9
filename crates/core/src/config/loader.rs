//! Layered config loading: a TOML file, then `AUDIOGRAB_*` environment
//! variables on top.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides; nested keys are joined with `__`.
const ENV_PREFIX: &str = "AUDIOGRAB_";

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Loads the config file at `path`, overridden by the environment.
///
/// `AUDIOGRAB_JOBS__MAX_AGE_SECS=120` sets `jobs.max_age_secs`. Sections
/// missing from both layers take their defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__")),
    )
}

/// Parses a TOML document without consulting the environment.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    extract(Figment::from(Toml::string(toml_str)))
}
