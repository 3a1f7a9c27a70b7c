//! Environment-driven settings for the instance manager.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use wp_core::error::{Result, WpError};
use wp_ports::DEFAULT_RANGE_START;

use crate::stack::{MysqlVersion, PhpVersion, WebServer};

pub const DEFAULT_IMAGE_VENDOR: &str = "wpdind";

/// Bounded MySQL readiness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub workspace_dir: PathBuf,
    /// Raw version codes; resolved when an instance is created.
    pub default_mysql: String,
    pub default_php: String,
    pub default_webserver: String,
    pub db_name: String,
    pub db_user: String,
    pub port_range_start: u16,
    pub host_ip: String,
    pub image_vendor: String,
    pub templates_dir: Option<PathBuf>,
    pub readiness: ReadinessPolicy,
}

impl ManagerSettings {
    /// Defaults rooted at `workspace_dir`, ignoring the environment.
    pub fn new(workspace_dir: impl Into<PathBuf>) -> Self {
        Self {
            workspace_dir: workspace_dir.into(),
            default_mysql: MysqlVersion::LATEST.to_string(),
            default_php: PhpVersion::LATEST.to_string(),
            default_webserver: WebServer::Nginx.to_string(),
            db_name: "wordpress".to_string(),
            db_user: "wordpress".to_string(),
            port_range_start: DEFAULT_RANGE_START,
            host_ip: "localhost".to_string(),
            image_vendor: DEFAULT_IMAGE_VENDOR.to_string(),
            templates_dir: None,
            readiness: ReadinessPolicy::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let workspace_dir = match env::var_os("WP_WORKSPACE_DIR") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => env::current_dir()?,
        };
        let mut settings = Self::new(workspace_dir);

        if let Some(v) = non_empty("WP_DEFAULT_MYSQL") {
            settings.default_mysql = v;
        }
        if let Some(v) = non_empty("WP_DEFAULT_PHP") {
            settings.default_php = v;
        }
        if let Some(v) = non_empty("WP_DEFAULT_WEBSERVER") {
            settings.default_webserver = v;
        }
        if let Some(v) = non_empty("WP_DB_NAME") {
            settings.db_name = v;
        }
        if let Some(v) = non_empty("WP_DB_USER") {
            settings.db_user = v;
        }
        if let Some(v) = non_empty("WP_HOST_IP") {
            settings.host_ip = v;
        }
        if let Some(v) = non_empty("WP_IMAGE_VENDOR") {
            settings.image_vendor = v;
        }
        settings.templates_dir = non_empty("WP_TEMPLATES_DIR").map(PathBuf::from);

        settings.port_range_start = parsed("WP_PORT_RANGE_START", settings.port_range_start)?;
        settings.readiness.attempts =
            parsed("WP_MYSQL_WAIT_ATTEMPTS", settings.readiness.attempts)?;
        let interval_secs = parsed("WP_MYSQL_WAIT_INTERVAL", settings.readiness.interval.as_secs())?;
        settings.readiness.interval = Duration::from_secs(interval_secs);

        if settings.readiness.attempts == 0 {
            warn!("WP_MYSQL_WAIT_ATTEMPTS=0, MySQL readiness will not be awaited");
        }

        Ok(settings)
    }

    pub fn with_workspace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_dir = dir.into();
        self
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| WpError::Config(format!("{}='{}' is invalid: {}", key, raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "WP_WORKSPACE_DIR",
        "WP_DEFAULT_MYSQL",
        "WP_DEFAULT_PHP",
        "WP_DEFAULT_WEBSERVER",
        "WP_DB_NAME",
        "WP_PORT_RANGE_START",
        "WP_MYSQL_WAIT_ATTEMPTS",
        "WP_MYSQL_WAIT_INTERVAL",
        "WP_TEMPLATES_DIR",
    ];

    fn clear() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        env::set_var("WP_WORKSPACE_DIR", "/tmp/ws");
        let settings = ManagerSettings::from_env().unwrap();
        assert_eq!(settings.workspace_dir, PathBuf::from("/tmp/ws"));
        assert_eq!(settings.default_mysql, "8.0");
        assert_eq!(settings.default_php, "8.3");
        assert_eq!(settings.port_range_start, 8001);
        assert_eq!(settings.readiness, ReadinessPolicy::default());
        assert!(settings.templates_dir.is_none());
        clear();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear();
        env::set_var("WP_DEFAULT_PHP", "74");
        env::set_var("WP_DB_NAME", "site");
        env::set_var("WP_PORT_RANGE_START", "9500");
        env::set_var("WP_MYSQL_WAIT_INTERVAL", "0");
        let settings = ManagerSettings::from_env().unwrap();
        assert_eq!(settings.default_php, "74");
        assert_eq!(settings.db_name, "site");
        assert_eq!(settings.port_range_start, 9500);
        assert_eq!(settings.readiness.interval, Duration::ZERO);
        clear();
    }

    #[test]
    #[serial]
    fn test_invalid_number_is_config_error() {
        clear();
        env::set_var("WP_PORT_RANGE_START", "eighty");
        let err = ManagerSettings::from_env().unwrap_err();
        assert!(matches!(err, WpError::Config(_)));
        clear();
    }
}
