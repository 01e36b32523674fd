//! # Market Data Configuration
//!
//! Settings are read in increasing order of precedence from:
//!
//! 1. `marketdata.json`
//! 2. `marketdata.{mode}.json`
//! 3. `marketdata.{mode}.{os}.json`
//! 4. `MARKETDATA_*` environment variables
//!
//! All files are optional and live in one config directory. Keys are matched
//! case-insensitively. A value that does not parse is an error; it never
//! falls back to the default silently.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{ext::*, *};
use thiserror::Error;

use crate::markets::coingecko::MarketDataConfig;

const CONFIG_FILE_STEM: &str = "marketdata";

type ConfigResult<T> = Result<T, MarketConfigError>;

/// Environment variables read by [`load_market_config`], with the option key each one sets.
pub const ENV_OVERRIDES: [(&str, &str); 8] = [
    ("MARKETDATA_BASE_URL", "baseurl"),
    ("MARKETDATA_QUOTE_CURRENCY", "quotecurrency"),
    ("MARKETDATA_TIMEOUT_SECS", "timeoutsecs"),
    ("MARKETDATA_CONNECT_TIMEOUT_SECS", "connecttimeoutsecs"),
    ("MARKETDATA_MAX_RETRIES", "maxretries"),
    ("MARKETDATA_RETRY_MIN_BACKOFF_MS", "retryminbackoffms"),
    ("MARKETDATA_RETRY_MAX_BACKOFF_MS", "retrymaxbackoffms"),
    ("MARKETDATA_USER_AGENT", "useragent"),
];

/// Why the settings could not be loaded.
#[derive(Debug, Error)]
pub enum MarketConfigError {
    /// A settings file exists but could not be read or parsed.
    #[error("failed to read configuration files: {0}")]
    Build(String),

    /// A setting has a value of the wrong shape.
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    InvalidValue {
        /// Setting name.
        key: String,
        /// Raw value as found.
        value: String,
        /// What was expected.
        reason: String,
    },
}

/// The layered files for one directory and running mode. Absent files are empty strings.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ConfigFiles {
    /// `marketdata.json`
    pub global_file: String,
    /// `marketdata.{mode}.json`
    pub mode_file: String,
    /// `marketdata.{mode}.{os}.json`, with `os` from [`std::env::consts::OS`].
    pub platform_file: String,
}

impl ConfigFiles {
    /// Finds which of the layered files exist in `config_dir`.
    /// Without a running mode only the global file is considered.
    pub fn locate(config_dir: &Path, running_mode: Option<&str>) -> Self {
        let existing = |path: PathBuf| -> String {
            if path.is_file() {
                path.to_string_lossy().to_string()
            } else {
                String::new()
            }
        };

        let global_file = existing(config_dir.join(format!("{}.json", CONFIG_FILE_STEM)));
        let (mode_file, platform_file) = match running_mode {
            Some(mode) => (
                existing(config_dir.join(format!("{}.{}.json", CONFIG_FILE_STEM, mode))),
                existing(config_dir.join(format!(
                    "{}.{}.{}.json",
                    CONFIG_FILE_STEM,
                    mode,
                    env::consts::OS
                ))),
            ),
            None => (String::new(), String::new()),
        };

        Self {
            global_file,
            mode_file,
            platform_file,
        }
    }

    /// Flattens the files into lowercase key / value pairs, later files winning.
    pub fn read_options(&self) -> ConfigResult<BTreeMap<String, String>> {
        let config_data: Box<dyn ConfigurationRoot> = DefaultConfigurationBuilder::new()
            .add_json_file(&self.global_file.is().optional())
            .add_json_file(&self.mode_file.is().optional())
            .add_json_file(&self.platform_file.is().optional())
            .build()
            .map_err(|e| MarketConfigError::Build(format!("{:?}", e)))?;

        let mut options: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in config_data.iter(None) {
            options.insert(key.to_string().to_lowercase(), value.to_string());
        }
        Ok(options)
    }
}

/// Loads the client settings for `running_mode` from `config_dir` and the process environment.
pub fn load_market_config(
    config_dir: &Path,
    running_mode: Option<&str>,
) -> ConfigResult<MarketDataConfig> {
    let options = ConfigFiles::locate(config_dir, running_mode).read_options()?;
    let config = apply_options(MarketDataConfig::default(), &options)?;
    apply_env_overrides(config, |name| env::var(name).ok())
}

/// Applies `MARKETDATA_*` variables found through `lookup` on top of `config`.
pub fn apply_env_overrides<F>(config: MarketDataConfig, lookup: F) -> ConfigResult<MarketDataConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut options = BTreeMap::new();
    for (var, key) in ENV_OVERRIDES {
        if let Some(value) = lookup(var) {
            options.insert(key.to_string(), value);
        }
    }
    apply_options(config, &options)
}

/// Applies recognised lowercase option keys on top of `config`. Unknown keys are ignored.
pub fn apply_options(
    mut config: MarketDataConfig,
    options: &BTreeMap<String, String>,
) -> ConfigResult<MarketDataConfig> {
    if let Some(v) = options.get("baseurl") {
        config.base_url = v.trim().to_string();
    }
    if let Some(v) = options.get("quotecurrency") {
        config.quote_currency = v.trim().to_string();
    }
    if let Some(v) = options.get("timeoutsecs") {
        config.http.timeout = Duration::from_secs(parse_number("timeoutsecs", v)?);
    }
    if let Some(v) = options.get("connecttimeoutsecs") {
        config.http.connect_timeout = Duration::from_secs(parse_number("connecttimeoutsecs", v)?);
    }
    if let Some(v) = options.get("maxretries") {
        config.http.max_retries = parse_number("maxretries", v)?;
    }
    if let Some(v) = options.get("retryminbackoffms") {
        config.http.retry_min_backoff = Duration::from_millis(parse_number("retryminbackoffms", v)?);
    }
    if let Some(v) = options.get("retrymaxbackoffms") {
        config.http.retry_max_backoff = Duration::from_millis(parse_number("retrymaxbackoffms", v)?);
    }
    if let Some(v) = options.get("useragent") {
        config.http.user_agent = v.trim().to_string();
    }
    Ok(config)
}

fn parse_number<T>(key: &str, value: &str) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| MarketConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_apply_options_overrides_defaults() {
        let config = apply_options(
            MarketDataConfig::default(),
            &options(&[
                ("baseurl", "http://localhost:8080/api/v3"),
                ("quotecurrency", "eur"),
                ("timeoutsecs", "5"),
                ("maxretries", "2"),
                ("retryminbackoffms", "100"),
                ("unrelated", "ignored"),
            ]),
        )
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/api/v3");
        assert_eq!(config.quote_currency, "eur");
        assert_eq!(config.http.timeout, Duration::from_secs(5));
        assert_eq!(config.http.max_retries, 2);
        assert_eq!(config.http.retry_min_backoff, Duration::from_millis(100));
        assert_eq!(config.http.connect_timeout, MarketDataConfig::default().http.connect_timeout);
    }

    #[test]
    fn test_bad_number_is_an_error() {
        let err = apply_options(MarketDataConfig::default(), &options(&[("maxretries", "three")])).unwrap_err();
        match err {
            MarketConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "maxretries");
                assert_eq!(value, "three");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides_use_lookup() {
        let config = apply_env_overrides(MarketDataConfig::default(), |name| match name {
            "MARKETDATA_QUOTE_CURRENCY" => Some("gbp".to_string()),
            "MARKETDATA_TIMEOUT_SECS" => Some("12".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.quote_currency, "gbp");
        assert_eq!(config.http.timeout, Duration::from_secs(12));
        assert_eq!(config.base_url, MarketDataConfig::default().base_url);
    }

    #[test]
    fn test_locate_only_reports_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("marketdata.json"), "{}").unwrap();

        let files = ConfigFiles::locate(dir.path(), Some("staging"));
        assert!(files.global_file.ends_with("marketdata.json"));
        assert_eq!(files.mode_file, "");
        assert_eq!(files.platform_file, "");

        let files = ConfigFiles::locate(dir.path(), None);
        assert_eq!(files.mode_file, "");
    }

    #[test]
    fn test_mode_file_wins_over_global_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("marketdata.json"),
            r#"{ "BaseUrl": "http://global.invalid/api/v3", "QuoteCurrency": "usd", "MaxRetries": "1" }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("marketdata.test.json"),
            r#"{ "QuoteCurrency": "eur" }"#,
        )
        .unwrap();

        let options = ConfigFiles::locate(dir.path(), Some("test")).read_options().unwrap();
        let config = apply_options(MarketDataConfig::default(), &options).unwrap();
        assert_eq!(config.base_url, "http://global.invalid/api/v3");
        assert_eq!(config.quote_currency, "eur");
        assert_eq!(config.http.max_retries, 1);
    }

    #[test]
    fn test_platform_file_wins_over_mode_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("marketdata.json"),
            r#"{ "QuoteCurrency": "usd", "TimeoutSecs": "30" }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("marketdata.prod.json"),
            r#"{ "QuoteCurrency": "eur", "MaxRetries": "2" }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(format!("marketdata.prod.{}.json", env::consts::OS)),
            r#"{ "QuoteCurrency": "chf" }"#,
        )
        .unwrap();

        let files = ConfigFiles::locate(dir.path(), Some("prod"));
        assert!(files.platform_file.ends_with(&format!("marketdata.prod.{}.json", env::consts::OS)));

        let options = files.read_options().unwrap();
        let config = apply_options(MarketDataConfig::default(), &options).unwrap();
        assert_eq!(config.quote_currency, "chf");
        assert_eq!(config.http.max_retries, 2);
        assert_eq!(config.http.timeout, Duration::from_secs(30));
    }
}
