use anyhow::{Context, Result};
use serde::Deserialize;
/// Configuration module for the linkpulse link checking service
///
/// This module manages the global configuration settings for the
/// application: store location, worker pool sizing, probe timeouts and the
/// completion waiter's poll interval.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::time::Duration;

fn parse_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

/// Store settings, `[store]` section.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "StoreConfig::default_data_dir")]
    pub data_dir: PathBuf,
}

impl StoreConfig {
    fn default_data_dir() -> PathBuf {
        PathBuf::from("data")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
        }
    }
}

/// Worker pool settings, `[worker]` section.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    #[serde(default = "WorkerConfig::default_num_instance")]
    pub num_instance: usize,

    /// Capacity of the bounded task queue. Submissions block once the queue
    /// is full, which is the admission-control point of the service.
    #[serde(default = "WorkerConfig::default_queue_capacity")]
    pub queue_capacity: usize,
}

impl WorkerConfig {
    fn default_num_instance() -> usize {
        5
    }

    fn default_queue_capacity() -> usize {
        100
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            num_instance: Self::default_num_instance(),
            queue_capacity: Self::default_queue_capacity(),
        }
    }
}

/// Probe settings, `[probe]` section.
#[derive(Debug, Deserialize, Clone)]
pub struct ProbeConfig {
    #[serde(
        default = "ProbeConfig::default_connect_timeout",
        deserialize_with = "parse_duration"
    )]
    pub connect_timeout: Duration,

    /// Deadline for the whole request, independent of but no shorter than
    /// what the connect timeout alone allows.
    #[serde(
        default = "ProbeConfig::default_request_timeout",
        deserialize_with = "parse_duration"
    )]
    pub request_timeout: Duration,
}

impl ProbeConfig {
    fn default_connect_timeout() -> Duration {
        Duration::from_secs(5)
    }

    fn default_request_timeout() -> Duration {
        Duration::from_secs(7)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Self::default_connect_timeout(),
            request_timeout: Self::default_request_timeout(),
        }
    }
}

/// Completion waiter settings, `[waiter]` section.
#[derive(Debug, Deserialize, Clone)]
pub struct WaiterConfig {
    #[serde(
        default = "WaiterConfig::default_poll_interval",
        deserialize_with = "parse_duration"
    )]
    pub poll_interval: Duration,
}

impl WaiterConfig {
    fn default_poll_interval() -> Duration {
        Duration::from_millis(50)
    }
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Self::default_poll_interval(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub waiter: WaiterConfig,
}

static INSTANCE: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str::<Config>(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        tracing::debug!("config: {:?}", config);
        Ok(config)
    }

    /// Installs the configuration loaded from `path` as the global instance.
    pub fn init(path: &Path) -> Result<()> {
        let config = Self::from_toml_file(path)?;
        INSTANCE
            .set(config)
            .map_err(|_| anyhow::anyhow!("configuration already initialized"))
    }
}

/// Returns the global configuration, falling back to defaults when no
/// config file was installed.
pub fn instance() -> &'static Config {
    INSTANCE.get_or_init(Config::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_service_constants() {
        let config = Config::default();
        assert_eq!(config.store.data_dir, PathBuf::from("data"));
        assert_eq!(config.worker.num_instance, 5);
        assert_eq!(config.worker.queue_capacity, 100);
        assert_eq!(config.probe.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.probe.request_timeout, Duration::from_secs(7));
        assert_eq!(config.waiter.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn parses_partial_toml_with_humantime_durations() {
        let config: Config = toml::from_str(
            r#"
            [worker]
            num_instance = 3

            [probe]
            request_timeout = "2s"

            [waiter]
            poll_interval = "10ms"
            "#,
        )
        .unwrap();

        assert_eq!(config.worker.num_instance, 3);
        // unspecified fields keep their defaults
        assert_eq!(config.worker.queue_capacity, 100);
        assert_eq!(config.probe.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.probe.request_timeout, Duration::from_secs(2));
        assert_eq!(config.waiter.poll_interval, Duration::from_millis(10));
    }

    #[test]
    fn rejects_malformed_durations() {
        let result = toml::from_str::<Config>(
            r#"
            [probe]
            request_timeout = "soon"
            "#,
        );
        assert!(result.is_err());
    }
}
