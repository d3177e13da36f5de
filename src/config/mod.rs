//! Configuration module for the CDN origin.

use crate::error::{CdnError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Main configuration for a CDN origin process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdnConfig {
    /// HTTP relay configuration.
    pub http: HttpConfig,
    /// SeaweedFS cluster configuration.
    pub seaweed: SeaweedConfig,
    /// Observability configuration.
    pub observability: ObservabilityConfig,
}

impl CdnConfig {
    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CdnError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| CdnError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.seaweed.master_url.is_empty() {
            return Err(CdnError::InvalidConfig {
                field: "seaweed.master_url".to_string(),
                reason: "SeaweedFS master URL is required".to_string(),
            });
        }

        if self.seaweed.lookup_timeout.is_zero() {
            return Err(CdnError::InvalidConfig {
                field: "seaweed.lookup_timeout".to_string(),
                reason: "Lookup timeout must be non-zero".to_string(),
            });
        }

        if self.seaweed.fetch_timeout.is_zero() {
            return Err(CdnError::InvalidConfig {
                field: "seaweed.fetch_timeout".to_string(),
                reason: "Fetch timeout must be non-zero".to_string(),
            });
        }

        Ok(())
    }

    /// Create a minimal development configuration.
    pub fn development() -> Self {
        Self {
            http: HttpConfig {
                listen_addr: "127.0.0.1:49544".parse().expect("valid socket address"),
            },
            seaweed: SeaweedConfig {
                master_url: "http://127.0.0.1:9333".to_string(),
                ..SeaweedConfig::default()
            },
            observability: ObservabilityConfig::default(),
        }
    }
}

/// HTTP relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Address the relay listens on.
    pub listen_addr: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:49544".parse().expect("valid socket address"),
        }
    }
}

/// SeaweedFS cluster configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeaweedConfig {
    /// Base URL of the cluster master, e.g. `http://10.0.0.1:9333`.
    pub master_url: String,
    /// Timeout for volume lookup requests against the master.
    #[serde(with = "humantime_serde")]
    pub lookup_timeout: Duration,
    /// Timeout for file fetches against volume servers.
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
    /// Optional TTL for cached volume locations. Absent means entries live
    /// until replaced, which assumes volume placement is stable.
    #[serde(default, with = "humantime_serde_opt")]
    pub location_cache_ttl: Option<Duration>,
}

impl Default for SeaweedConfig {
    fn default() -> Self {
        Self {
            master_url: String::new(),
            lookup_timeout: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(30),
            location_cache_ttl: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable Prometheus metrics.
    pub metrics_enabled: bool,
    /// Metrics bind address.
    pub metrics_addr: SocketAddr,
    /// Log level.
    pub log_level: String,
    /// Enable JSON logging.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_addr: "0.0.0.0:9090".parse().expect("valid socket address"),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Serde helper for Duration using humantime format.
pub mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}ms", duration.as_millis()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| e.to_string())
        } else if let Some(s_val) = s.strip_suffix('s') {
            s_val
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| e.to_string())
        } else if let Some(m) = s.strip_suffix('m') {
            m.parse::<u64>()
                .map(|v| Duration::from_secs(v * 60))
                .map_err(|e| e.to_string())
        } else {
            s.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| e.to_string())
        }
    }
}

/// Serde helper for optional Durations using humantime format.
pub mod humantime_serde_opt {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_str(&format!("{}ms", d.as_millis())),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            Some(s) => super::humantime_serde::parse_duration(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_fails_validation() {
        // master_url is required, there is no sensible default
        let config = CdnConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_development_config() {
        let config = CdnConfig::development();
        assert!(config.validate().is_ok());
        assert_eq!(config.seaweed.lookup_timeout, Duration::from_secs(5));
        assert!(config.seaweed.location_cache_ttl.is_none());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "http": {{ "listen_addr": "127.0.0.1:8000" }},
                "seaweed": {{
                    "master_url": "http://seaweed-master:9333",
                    "lookup_timeout": "2s",
                    "fetch_timeout": "10s",
                    "location_cache_ttl": "5m"
                }},
                "observability": {{
                    "metrics_enabled": true,
                    "metrics_addr": "127.0.0.1:9090",
                    "log_level": "debug",
                    "json_logs": false
                }}
            }}"#
        )
        .unwrap();

        let config = CdnConfig::from_file(file.path()).unwrap();
        assert_eq!(config.seaweed.master_url, "http://seaweed-master:9333");
        assert_eq!(config.seaweed.lookup_timeout, Duration::from_secs(2));
        assert_eq!(
            config.seaweed.location_cache_ttl,
            Some(Duration::from_secs(300))
        );
        assert!(config.observability.metrics_enabled);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = CdnConfig::development();
        config.seaweed.lookup_timeout = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(CdnError::InvalidConfig { .. })
        ));
    }
}
