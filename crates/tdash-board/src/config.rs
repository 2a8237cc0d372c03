use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const CACHE_FILE_NAME: &str = "cache.sqlite";
pub const LOG_FILE_NAME: &str = "tdash.log";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub backend_url: String,
    pub state_dir: PathBuf,
    pub http_timeout: Duration,
    /// Drop agent/metrics responses older than one already applied.
    pub discard_stale: bool,
    pub log_stdout: bool,
    pub log_file: bool,
}

impl Config {
    pub fn cache_path(&self) -> PathBuf {
        self.state_dir.join(CACHE_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join(LOG_FILE_NAME)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be an http(s) url, got {value:?}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("{name} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { name: &'static str, value: String },
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(|name| std::env::var(name).ok())
}

/// Resolve the configuration through `lookup`, which returns the raw value of
/// an environment variable.
pub fn load_config_from<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = |name: &str| {
        lookup(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    Ok(Config {
        backend_url: resolve_backend_url(env("TDASH_BACKEND_URL"))?,
        state_dir: resolve_state_dir(
            env("TDASH_STATE_DIR"),
            env("XDG_STATE_HOME"),
            env("HOME"),
        ),
        http_timeout: resolve_http_timeout(env("TDASH_HTTP_TIMEOUT_SECS"))?,
        discard_stale: resolve_flag(env("TDASH_DISCARD_STALE")),
        log_stdout: resolve_flag(env("TDASH_LOG_STDOUT")),
        log_file: resolve_flag(env("TDASH_LOG_FILE")),
    })
}

pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn resolve_flag(value: Option<String>) -> bool {
    value
        .and_then(|value| parse_bool_flag(&value))
        .unwrap_or(false)
}

pub fn normalize_backend_url(value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidUrl {
            name: "TDASH_BACKEND_URL",
            value: value.to_string(),
        })
    }
}

fn resolve_backend_url(value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(value) => normalize_backend_url(&value),
        None => Ok(DEFAULT_BACKEND_URL.to_string()),
    }
}

fn resolve_http_timeout(value: Option<String>) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    };
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout {
            name: "TDASH_HTTP_TIMEOUT_SECS",
            value,
        }),
    }
}

fn resolve_state_dir(
    explicit: Option<String>,
    xdg_state_home: Option<String>,
    home: Option<String>,
) -> PathBuf {
    if let Some(value) = explicit {
        return PathBuf::from(value);
    }
    if let Some(value) = xdg_state_home {
        return PathBuf::from(value).join("tdash");
    }
    if let Some(value) = home {
        return PathBuf::from(value)
            .join(".local")
            .join("state")
            .join("tdash");
    }
    PathBuf::from(".tdash/state")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_config_from(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_with(&[]).expect("config");
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.state_dir, PathBuf::from(".tdash/state"));
        assert!(!config.discard_stale);
        assert!(!config.log_stdout);
    }

    #[test]
    fn state_dir_prefers_explicit_then_xdg_then_home() {
        let config = config_with(&[
            ("XDG_STATE_HOME", "/xdg"),
            ("HOME", "/home/u"),
        ])
        .expect("config");
        assert_eq!(config.state_dir, PathBuf::from("/xdg/tdash"));

        let config = config_with(&[("XDG_STATE_HOME", "  "), ("HOME", "/home/u")]).expect("config");
        assert_eq!(
            config.state_dir,
            PathBuf::from("/home/u/.local/state/tdash")
        );

        let config = config_with(&[("TDASH_STATE_DIR", "/srv/tdash"), ("HOME", "/home/u")])
            .expect("config");
        assert_eq!(config.cache_path(), PathBuf::from("/srv/tdash/cache.sqlite"));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert_eq!(
            config_with(&[("TDASH_BACKEND_URL", "localhost:5000")]),
            Err(ConfigError::InvalidUrl {
                name: "TDASH_BACKEND_URL",
                value: "localhost:5000".to_string(),
            })
        );
        assert!(matches!(
            config_with(&[("TDASH_HTTP_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidTimeout { .. })
        ));
    }

    #[test]
    fn flags_and_url_are_normalized() {
        let config = config_with(&[
            ("TDASH_BACKEND_URL", " https://tickets.example.com/ "),
            ("TDASH_DISCARD_STALE", "on"),
            ("TDASH_LOG_FILE", "YES"),
            ("TDASH_HTTP_TIMEOUT_SECS", "5"),
        ])
        .expect("config");
        assert_eq!(config.backend_url, "https://tickets.example.com");
        assert!(config.discard_stale);
        assert!(config.log_file);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn parse_bool_flag_accepts_common_values() {
        assert_eq!(parse_bool_flag("1"), Some(true));
        assert_eq!(parse_bool_flag("on"), Some(true));
        assert_eq!(parse_bool_flag("0"), Some(false));
        assert_eq!(parse_bool_flag("off"), Some(false));
        assert_eq!(parse_bool_flag("maybe"), None);
    }
}
