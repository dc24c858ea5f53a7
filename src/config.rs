use crate::error::{config_error, env_error, AppResult, Error};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Default path of the optional configuration file
pub const CONFIG_FILE: &str = "config/availability.toml";

/// Default request timeout for remote calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the scheduling API
    pub api_base_url: String,
    /// Bearer token for the scheduling API
    pub auth_token: Option<String>,
    /// IANA timezone used for local display times
    pub timezone: String,
    /// Locale for rendered output
    pub locale: String,
    /// Timeout for each remote call
    pub request_timeout_secs: u64,
}

/// Values that may be supplied by the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    api_base_url: Option<String>,
    auth_token: Option<String>,
    timezone: Option<String>,
    locale: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load configuration, merging the given file under the environment
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let file = match fs::read_to_string(path) {
            Ok(content) => toml::from_str::<FileConfig>(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => FileConfig::default(),
            Err(e) => return Err(e.into()),
        };

        let api_base_url = env::var("NOURA_API_URL")
            .ok()
            .or(file.api_base_url)
            .ok_or_else(|| env_error("NOURA_API_URL"))?;

        let auth_token = env::var("NOURA_AUTH_TOKEN")
            .ok()
            .or(file.auth_token)
            .filter(|t| !t.trim().is_empty());

        let timezone = env::var("TIMEZONE")
            .ok()
            .or(file.timezone)
            .unwrap_or_else(|| String::from("UTC"));

        let locale = env::var("APP_LOCALE")
            .ok()
            .or(file.locale)
            .unwrap_or_else(|| String::from("en"));

        let request_timeout_secs = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => file.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let config = Config {
            api_base_url,
            auth_token,
            timezone,
            locale,
            request_timeout_secs,
        };

        // Fail early on an unknown zone
        config.time_zone()?;

        Ok(config)
    }

    /// Parse the configured timezone
    pub fn time_zone(&self) -> AppResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone '{}'", self.timezone)))
    }

    /// Get the auth token or fail with `AuthenticationRequired`
    pub fn require_token(&self) -> AppResult<&str> {
        self.auth_token
            .as_deref()
            .ok_or(Error::AuthenticationRequired)
    }
}

/// Parse a `REQUEST_TIMEOUT_SECS` value
fn parse_timeout(raw: &str) -> AppResult<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        config_error(&format!(
            "Invalid REQUEST_TIMEOUT_SECS '{}': expected whole seconds",
            raw
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(timezone: &str, token: Option<&str>) -> Config {
        Config {
            api_base_url: "https://api.example.test".to_string(),
            auth_token: token.map(str::to_string),
            timezone: timezone.to_string(),
            locale: "en".to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    #[test]
    fn test_time_zone_parsing() {
        assert_eq!(config("Europe/Helsinki", None).time_zone().unwrap(), chrono_tz::Europe::Helsinki);
        assert!(matches!(
            config("Mars/Olympus", None).time_zone(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_require_token() {
        assert_eq!(config("UTC", Some("abc")).require_token().unwrap(), "abc");
        assert!(matches!(
            config("UTC", None).require_token(),
            Err(Error::AuthenticationRequired)
        ));
    }

    #[test]
    fn test_file_config_parses_partial_toml() {
        let file: FileConfig = toml::from_str("timezone = \"Europe/Helsinki\"\n").unwrap();
        assert_eq!(file.timezone.as_deref(), Some("Europe/Helsinki"));
        assert!(file.api_base_url.is_none());
        assert!(file.request_timeout_secs.is_none());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("45").unwrap(), 45);
        match parse_timeout("soon") {
            Err(Error::Config(message)) => {
                assert!(message.contains("REQUEST_TIMEOUT_SECS 'soon'"));
            }
            other => panic!("expected a config error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_config_file_is_an_error() {
        // A directory exists but cannot be read as a file
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
        assert!(matches!(Config::load_from(&dir), Err(Error::Io(_))));
    }
}
