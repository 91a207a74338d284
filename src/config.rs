use crate::constants::{CONFIG_ENV_PREFIX, CONFIG_FILE_NAME, DEFAULT_POOL_CAPACITY};
use serde::Deserialize;
use std::fmt;

/// The deployment environment, which decides how much error detail leaks into
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Develop,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Develop => f.write_str("develop"),
            Environment::Production => f.write_str("production"),
        }
    }
}

/// Runtime knobs of a [`Router`](crate::Router).
///
/// Install one with [`RouterBuilder::config`](crate::RouterBuilder::config), or
/// load it from the environment with [`RouterConfig::from_env`].
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Idle objects each pool keeps for reuse. `0` disables reuse.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
    /// Percent-decode request paths before matching.
    #[serde(default = "default_decode_path")]
    pub decode_path: bool,
    #[serde(default)]
    pub env: Environment,
}

impl TryFrom<config::Config> for RouterConfig {
    type Error = config::ConfigError;

    fn try_from(config: config::Config) -> Result<Self, Self::Error> {
        config.try_deserialize()
    }
}

impl RouterConfig {
    /// Loads the configuration from an optional `routerify` file (any format
    /// the `config` crate understands) overridden by `ROUTERIFY_*` variables,
    /// e.g. `ROUTERIFY_ENV=production`.
    pub fn from_env() -> crate::Result<RouterConfig> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE_NAME).required(false))
            .add_source(config::Environment::with_prefix(CONFIG_ENV_PREFIX));

        let config: RouterConfig = builder.build()?.try_into()?;
        tracing::debug!(?config, "loaded router config");
        Ok(config)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            decode_path: true,
            env: Environment::Develop,
        }
    }
}

fn default_pool_capacity() -> usize {
    DEFAULT_POOL_CAPACITY
}

fn default_decode_path() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert_eq!(config.pool_capacity, 1024);
        assert!(config.decode_path);
        assert_eq!(config.env, Environment::Develop);
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("ROUTERIFY_ENV", "production");
        env::set_var("ROUTERIFY_POOL_CAPACITY", "16");

        let config = RouterConfig::from_env().unwrap();
        assert_eq!(config.env, Environment::Production);
        assert_eq!(config.pool_capacity, 16);
        assert!(config.decode_path);

        env::remove_var("ROUTERIFY_ENV");
        env::remove_var("ROUTERIFY_POOL_CAPACITY");
    }

    #[test]
    fn environment_display() {
        assert_eq!(Environment::Production.to_string(), "production");
    }
}
