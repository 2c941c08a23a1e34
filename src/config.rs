//! Configuration management

use std::{path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Default HelloSMS send endpoint
pub const DEFAULT_API_URL: &str = "https://api.hellosms.se/api/v1/sms/send";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Downstream provider configuration
    pub provider: ProviderConfig,
    /// Retry configuration for provider calls
    pub retry: RetryConfig,
    /// Recipient/message validation
    pub validation: ValidationConfig,
    /// Shared send budget
    pub rate_limit: RateLimitConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Graceful shutdown timeout
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// HelloSMS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API username
    pub username: String,
    /// API password
    pub password: String,
    /// Sender name shown to recipients
    pub sender: String,
    /// Send endpoint
    pub api_url: String,
    /// Per-attempt request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Subject used when the caller does not supply one
    pub default_subject: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            sender: "TrafikInfo".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            default_subject: "Meddelande".to_string(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .field("default_subject", &self.default_subject)
            .finish()
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first one
    pub max_retries: u32,
    /// Provider statuses treated as transient
    pub retry_status_codes: Vec<u16>,
    /// Initial backoff duration
    #[serde(with = "humantime_serde")]
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
    /// Backoff multiplier
    pub multiplier: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_status_codes: vec![408, 500, 502, 503, 504],
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum message length in characters
    pub max_message_length: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_message_length: 160,
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per window, across all callers
    pub limit: usize,
    /// Sliding window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            window: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Load configuration from defaults, file, and environment
    ///
    /// Later sources win: YAML file, then `SMS_GATEWAY_` variables
    /// (`__` separates sections, e.g. `SMS_GATEWAY_PROVIDER__USERNAME`), then
    /// the flat `HELLOSMS_*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed("SMS_GATEWAY_").split("__"));
        figment = merge_text_vars(figment, |key| {
            format!("SMS_GATEWAY_{}", key.to_ascii_uppercase().replace('.', "__"))
        });
        figment = figment.merge(hellosms_env());
        figment = merge_text_vars(figment, |key| {
            let field = key.rsplit('.').next().unwrap_or(key);
            format!("HELLOSMS_{}", field.to_ascii_uppercase())
        });

        figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject configurations the gateway cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.provider.username.is_empty() || self.provider.password.is_empty() {
            return Err(Error::Config(
                "provider.username and provider.password are required".to_string(),
            ));
        }
        Url::parse(&self.provider.api_url)
            .map_err(|e| Error::Config(format!("Invalid provider.api_url: {e}")))?;
        if self.rate_limit.limit == 0 {
            return Err(Error::Config("rate_limit.limit must be > 0".to_string()));
        }
        if self.rate_limit.window.is_zero() {
            return Err(Error::Config("rate_limit.window must be > 0".to_string()));
        }
        if self.validation.max_message_length == 0 {
            return Err(Error::Config(
                "validation.max_message_length must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Keys that stay text even when the variable looks like a number
const TEXT_KEYS: &[&str] = &[
    "provider.username",
    "provider.password",
    "provider.sender",
    "provider.default_subject",
];

/// Re-merge [`TEXT_KEYS`] from the raw environment.
///
/// `Env` parses values, so `HELLOSMS_PASSWORD=012345` would arrive as an
/// integer and lose its leading zero.
fn merge_text_vars(mut figment: Figment, var_name: impl Fn(&str) -> String) -> Figment {
    for key in TEXT_KEYS {
        if let Ok(value) = std::env::var(var_name(key)) {
            figment = figment.merge(Serialized::default(key, value));
        }
    }
    figment
}

/// Flat `HELLOSMS_*` variables mapped onto nested keys
fn hellosms_env() -> Env {
    Env::prefixed("HELLOSMS_").filter_map(|key| {
        let mapped = match key.as_str().to_ascii_lowercase().as_str() {
            "username" => "provider.username",
            "password" => "provider.password",
            "sender" => "provider.sender",
            "default_subject" => "provider.default_subject",
            "api_url" => "provider.api_url",
            "timeout" => "provider.timeout",
            "max_retries" => "retry.max_retries",
            "max_length" => "validation.max_message_length",
            "rate_limit" => "rate_limit.limit",
            _ => return None,
        };
        Some(mapped.into())
    })
}

/// Serde module for human-readable durations
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    /// Serialize Duration to a human-readable string (e.g., "30s", "250ms")
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the serializer fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    /// Deserialize "30s", "5m", "100ms", or bare seconds
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the value cannot be parsed as a duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = match Raw::deserialize(deserializer)? {
            Raw::Secs(secs) => return Ok(Duration::from_secs(secs)),
            Raw::Text(s) => s,
        };
        let s = s.trim();

        // "ms" must be checked before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(serde::de::Error::custom)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(serde::de::Error::custom)
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_provider_contract() {
        let config = Config::default();
        assert_eq!(config.provider.api_url, DEFAULT_API_URL);
        assert_eq!(config.provider.timeout, Duration::from_secs(10));
        assert_eq!(config.provider.default_subject, "Meddelande");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.retry_status_codes, vec![408, 500, 502, 503, 504]);
        assert_eq!(config.validation.max_message_length, 160);
        assert_eq!(config.rate_limit.limit, 100);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
    }

    #[test]
    fn default_config_lacks_credentials() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("username"));
    }

    #[test]
    fn validate_rejects_bad_url_and_zero_limit() {
        let mut config = Config::default();
        config.provider.username = "user".into();
        config.provider.password = "secret".into();
        assert!(config.validate().is_ok());

        config.provider.api_url = "not a url".into();
        assert!(config.validate().is_err());

        config.provider.api_url = DEFAULT_API_URL.into();
        config.rate_limit.limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let mut provider = ProviderConfig::default();
        provider.password = "hunter2".into();
        let rendered = format!("{provider:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        Jail::expect_with(|_| {
            let err = Config::load(Some(Path::new("/nonexistent/sms-gateway.yaml"))).unwrap_err();
            assert!(matches!(err, Error::Config(_)));
            Ok(())
        });
    }

    #[test]
    fn load_reads_yaml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "gateway.yaml",
                r#"
server:
  port: 8081
provider:
  username: "acme"
  password: "s3cret"
  timeout: "3s"
retry:
  initial_backoff: "50ms"
rate_limit:
  limit: 5
  window: "1m"
"#,
            )?;

            let config = Config::load(Some(&jail.directory().join("gateway.yaml"))).unwrap();
            assert_eq!(config.server.port, 8081);
            assert_eq!(config.provider.username, "acme");
            assert_eq!(config.provider.timeout, Duration::from_secs(3));
            assert_eq!(config.retry.initial_backoff, Duration::from_millis(50));
            assert_eq!(config.rate_limit.limit, 5);
            assert_eq!(config.rate_limit.window, Duration::from_secs(60));
            // untouched sections keep their defaults
            assert_eq!(config.provider.sender, "TrafikInfo");
            Ok(())
        });
    }

    #[test]
    fn hellosms_vars_map_onto_sections() {
        Jail::expect_with(|jail| {
            jail.set_env("HELLOSMS_USERNAME", "u1");
            jail.set_env("HELLOSMS_PASSWORD", "p1");
            jail.set_env("HELLOSMS_TIMEOUT", "4");
            jail.set_env("HELLOSMS_MAX_RETRIES", "1");
            jail.set_env("HELLOSMS_MAX_LENGTH", "70");
            jail.set_env("HELLOSMS_RATE_LIMIT", "7");

            let config = Config::load(None).unwrap();
            assert_eq!(config.provider.username, "u1");
            assert_eq!(config.provider.password, "p1");
            assert_eq!(config.provider.timeout, Duration::from_secs(4));
            assert_eq!(config.retry.max_retries, 1);
            assert_eq!(config.validation.max_message_length, 70);
            assert_eq!(config.rate_limit.limit, 7);
            Ok(())
        });
    }

    #[test]
    fn numeric_credentials_and_sender_stay_text() {
        Jail::expect_with(|jail| {
            jail.set_env("HELLOSMS_USERNAME", "1001");
            jail.set_env("HELLOSMS_PASSWORD", "012345");
            jail.set_env("HELLOSMS_SENDER", "46701234567");

            let config = Config::load(None).unwrap();
            assert_eq!(config.provider.username, "1001");
            assert_eq!(config.provider.password, "012345");
            assert_eq!(config.provider.sender, "46701234567");
            assert!(config.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn hellosms_vars_win_over_prefixed_vars() {
        Jail::expect_with(|jail| {
            jail.set_env("SMS_GATEWAY_PROVIDER__PASSWORD", "123456");
            jail.set_env("SMS_GATEWAY_PROVIDER__SENDER", "46700000000");
            jail.set_env("SMS_GATEWAY_RETRY__RETRY_STATUS_CODES", "[503]");
            jail.set_env("HELLOSMS_SENDER", "TrafikInfo2");

            let config = Config::load(None).unwrap();
            assert_eq!(config.provider.password, "123456");
            assert_eq!(config.provider.sender, "TrafikInfo2");
            assert_eq!(config.retry.retry_status_codes, vec![503]);
            Ok(())
        });
    }

    #[test]
    fn durations_accept_bare_seconds() {
        let yaml = r"
provider:
  timeout: 7
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.timeout, Duration::from_secs(7));
    }

    #[test]
    fn duration_serialization_round_trips_millis() {
        let config = RetryConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("200ms"));
        let back: RetryConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.initial_backoff, Duration::from_millis(200));
    }
}
