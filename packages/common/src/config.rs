use serde::Deserialize;

/// Judging pipeline settings shared by the worker and the platform.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct JudgeSettings {
    /// Added to a test case's time limit to bound one adapter call. Default: 1000.
    #[serde(default = "default_wall_clock_overhead_ms")]
    pub wall_clock_overhead_ms: u64,
    /// Retries after an adapter reports the environment unavailable. Default: 3.
    #[serde(default = "default_adapter_max_retries")]
    pub adapter_max_retries: u8,
    /// Base delay for exponential backoff. Default: 200.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Upper bound for a single backoff delay. Default: 5000.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// stdout/stderr kept per test case, in bytes. Default: 4096.
    #[serde(default = "default_output_excerpt_bytes")]
    pub output_excerpt_bytes: usize,
}

fn default_wall_clock_overhead_ms() -> u64 {
    1000
}
fn default_adapter_max_retries() -> u8 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    200
}
fn default_retry_max_delay_ms() -> u64 {
    5000
}
fn default_output_excerpt_bytes() -> usize {
    4096
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            wall_clock_overhead_ms: default_wall_clock_overhead_ms(),
            adapter_max_retries: default_adapter_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            output_excerpt_bytes: default_output_excerpt_bytes(),
        }
    }
}
