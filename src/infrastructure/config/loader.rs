use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;

use crate::domain::errors::ConfigError;

use super::CoreConfig;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `.swarmcore/config.yaml` (project config)
    /// 3. `.swarmcore/local.yaml` (project-local override, optional)
    /// 4. Environment variables (`SWARMCORE_` prefix)
    pub fn load() -> Result<CoreConfig> {
        let config: CoreConfig = Figment::new()
            .merge(Serialized::defaults(CoreConfig::default()))
            .merge(Yaml::file(".swarmcore/config.yaml"))
            .merge(Yaml::file(".swarmcore/local.yaml"))
            .merge(Env::prefixed("SWARMCORE_").split("__"))
            .extract()
            .map_err(|e| ConfigError::ExtractFailed(e.to_string()))
            .context("failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Loads configuration from a single file, skipping the project/env layers.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<CoreConfig> {
        let config: CoreConfig = Figment::new()
            .merge(Serialized::defaults(CoreConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .map_err(|e| ConfigError::ExtractFailed(e.to_string()))
            .with_context(|| format!("failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validates configuration after loading.
    pub fn validate(config: &CoreConfig) -> Result<(), ConfigError> {
        if config.max_agents == 0 || config.max_agents > 50 {
            return Err(ConfigError::InvalidMaxAgents(config.max_agents));
        }

        if !VALID_LOG_LEVELS.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        if config.learning.history_trim_to >= config.learning.history_cap {
            return Err(ConfigError::InvalidHistoryBounds {
                trim_to: config.learning.history_trim_to,
                cap: config.learning.history_cap,
            });
        }

        for (field, value) in [
            ("learning.min_confidence", config.learning.min_confidence),
            ("learning.learned_action_threshold", config.learning.learned_action_threshold),
            ("learning.prune_min_confidence", config.learning.prune_min_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidConfidence { field: field.to_string(), value });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CoreConfig::default();
        assert_eq!(config.max_agents, 10);
        assert_eq!(config.scheduler.tick_interval_ms, 5000);
        ConfigLoader::validate(&config).expect("default config should be valid");
    }

    #[test]
    fn rejects_zero_max_agents() {
        let config = CoreConfig { max_agents: 0, ..CoreConfig::default() };
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidMaxAgents(0))));
    }

    #[test]
    fn rejects_too_many_max_agents() {
        let config = CoreConfig { max_agents: 51, ..CoreConfig::default() };
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidMaxAgents(51))));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = CoreConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogLevel(_))));
    }

    #[test]
    fn rejects_inverted_history_bounds() {
        let mut config = CoreConfig::default();
        config.learning.history_trim_to = 500;
        config.learning.history_cap = 500;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidHistoryBounds { .. })));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut config = CoreConfig::default();
        config.learning.min_confidence = 1.5;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidConfidence { .. })));
    }

    #[test]
    fn yaml_override_takes_precedence_over_defaults() {
        let yaml = "max_agents: 20\nlogging:\n  level: debug\n  format: json\n";
        let config: CoreConfig = serde_yaml::from_str(yaml).expect("yaml should parse");
        assert_eq!(config.max_agents, 20);
        assert_eq!(config.logging.level, "debug");
        ConfigLoader::validate(&config).expect("parsed config should be valid");
    }
}
