//! Configuration management infrastructure.
//!
//! Hierarchical configuration using figment: YAML file loading, environment
//! variable overrides, validation, type-safe config structs (§3.3).

pub mod loader;

use serde::{Deserialize, Serialize};

pub use loader::ConfigLoader;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Pretty
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
    #[serde(default = "default_claim_expiry_secs")]
    pub claim_expiry_secs: u64,
    #[serde(default = "default_claim_cleanup_interval_secs")]
    pub claim_cleanup_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            idle_poll_ms: default_idle_poll_ms(),
            claim_expiry_secs: default_claim_expiry_secs(),
            claim_cleanup_interval_secs: default_claim_cleanup_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: LogFormat::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearningConfig {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_min_success_count")]
    pub min_success_count: u32,
    #[serde(default = "default_learned_action_threshold")]
    pub learned_action_threshold: f64,
    #[serde(default = "default_prune_min_confidence")]
    pub prune_min_confidence: f64,
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
    #[serde(default = "default_history_trim_to")]
    pub history_trim_to: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            min_success_count: default_min_success_count(),
            learned_action_threshold: default_learned_action_threshold(),
            prune_min_confidence: default_prune_min_confidence(),
            history_cap: default_history_cap(),
            history_trim_to: default_history_trim_to(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecoveryConfig {
    #[serde(default = "default_retry_backoff_base_secs")]
    pub retry_backoff_base_secs: u64,
    #[serde(default = "default_retry_backoff_cap_secs")]
    pub retry_backoff_cap_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            retry_backoff_base_secs: default_retry_backoff_base_secs(),
            retry_backoff_cap_secs: default_retry_backoff_cap_secs(),
        }
    }
}

/// Top-level, validated configuration for one orchestration core process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoreConfig {
    #[serde(default = "default_max_agents")]
    pub max_agents: usize,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub learning: LearningConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_agents: default_max_agents(),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
            learning: LearningConfig::default(),
            recovery: RecoveryConfig::default(),
        }
    }
}

fn default_max_agents() -> usize {
    10
}
fn default_tick_interval_ms() -> u64 {
    5000
}
fn default_idle_poll_ms() -> u64 {
    100
}
fn default_claim_expiry_secs() -> u64 {
    300
}
fn default_claim_cleanup_interval_secs() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_min_confidence() -> f64 {
    0.3
}
fn default_min_success_count() -> u32 {
    2
}
fn default_learned_action_threshold() -> f64 {
    0.6
}
fn default_prune_min_confidence() -> f64 {
    0.2
}
fn default_history_cap() -> usize {
    500
}
fn default_history_trim_to() -> usize {
    250
}
fn default_retry_backoff_base_secs() -> u64 {
    2
}
fn default_retry_backoff_cap_secs() -> u64 {
    10
}
