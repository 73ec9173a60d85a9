use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::JudgeSettings;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Submissions judged in parallel. Default: 4.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Queued submissions before `submit` waits for space. Default: 1024.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_workers() -> usize {
    4
}
fn default_queue_capacity() -> usize {
    1024
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PlatformConfig {
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub judge: JudgeSettings,
}

impl PlatformConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("JUDGE_CONFIG").unwrap_or_else(|_| "config/config".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("dispatcher.workers", 4_i64)?
            .set_default("dispatcher.queue_capacity", 1024_i64)?
            // Load from config/config.toml
            .add_source(File::with_name(config_path).required(false))
            // Override from environment (e.g., JUDGE__DISPATCHER__WORKERS)
            .add_source(Environment::with_prefix("JUDGE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
