use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::JudgeSettings;

/// Worker-specific configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    /// Identifier used in logs. Default: "worker-1".
    #[serde(default = "default_worker_id")]
    pub id: String,
    /// Scratch directory for compiled programs. Default: "/tmp/judge".
    #[serde(default = "default_work_dir")]
    pub work_dir: String,
    /// Compiled programs kept by the local adapter. Default: 64.
    #[serde(default = "default_artifact_cache_size")]
    pub artifact_cache_size: usize,
}

fn default_worker_id() -> String {
    "worker-1".into()
}
fn default_work_dir() -> String {
    std::env::temp_dir().join("judge").display().to_string()
}
fn default_artifact_cache_size() -> usize {
    64
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: default_worker_id(),
            work_dir: default_work_dir(),
            artifact_cache_size: default_artifact_cache_size(),
        }
    }
}

/// Worker application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkerAppConfig {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub judge: JudgeSettings,
}

impl WorkerAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("JUDGE_CONFIG").unwrap_or_else(|_| "config/config".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("worker.id", "worker-1")?
            .set_default("worker.work_dir", default_work_dir())?
            .set_default("worker.artifact_cache_size", 64_i64)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("JUDGE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
