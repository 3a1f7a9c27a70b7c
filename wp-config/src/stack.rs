//! Stack selection: web server, PHP and MySQL versions, and the pinned image
//! version table.
//!
//! Version codes are accepted either compact (`83`) or dotted (`8.3`). An
//! unknown code falls back to the newest supported version; the fallback is
//! reported through [`Resolved::substituted_from`] and logged, never silent.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;
use wp_core::error::{Result, WpError};

/// Outcome of resolving a user-supplied version code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    /// The original input when it was unknown and a default was substituted.
    pub substituted_from: Option<String>,
}

impl<T> Resolved<T> {
    fn exact(value: T) -> Self {
        Self {
            value,
            substituted_from: None,
        }
    }
}

fn normalize_code(input: &str) -> String {
    input.trim().replace('.', "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebServer {
    Nginx,
    Apache,
}

impl WebServer {
    pub const ALL: [WebServer; 2] = [WebServer::Nginx, WebServer::Apache];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebServer::Nginx => "nginx",
            WebServer::Apache => "apache",
        }
    }
}

impl fmt::Display for WebServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebServer {
    type Err = WpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nginx" => Ok(WebServer::Nginx),
            "apache" | "apache2" | "httpd" => Ok(WebServer::Apache),
            other => Err(WpError::Validation(format!(
                "Unknown web server '{}': expected nginx or apache",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PhpVersion {
    #[serde(rename = "7.4")]
    Php74,
    #[serde(rename = "8.0")]
    Php80,
    #[serde(rename = "8.1")]
    Php81,
    #[serde(rename = "8.2")]
    Php82,
    #[serde(rename = "8.3")]
    Php83,
}

impl PhpVersion {
    pub const ALL: [PhpVersion; 5] = [
        PhpVersion::Php74,
        PhpVersion::Php80,
        PhpVersion::Php81,
        PhpVersion::Php82,
        PhpVersion::Php83,
    ];
    pub const LATEST: PhpVersion = PhpVersion::Php83;

    pub fn as_str(&self) -> &'static str {
        match self {
            PhpVersion::Php74 => "7.4",
            PhpVersion::Php80 => "8.0",
            PhpVersion::Php81 => "8.1",
            PhpVersion::Php82 => "8.2",
            PhpVersion::Php83 => "8.3",
        }
    }

    pub fn resolve(input: &str) -> Resolved<PhpVersion> {
        let code = normalize_code(input);
        match Self::ALL.iter().find(|v| normalize_code(v.as_str()) == code) {
            Some(version) => Resolved::exact(*version),
            None => {
                warn!(
                    "Unknown PHP version '{}', substituting {}",
                    input,
                    Self::LATEST
                );
                Resolved {
                    value: Self::LATEST,
                    substituted_from: Some(input.to_string()),
                }
            }
        }
    }
}

impl fmt::Display for PhpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MysqlVersion {
    #[serde(rename = "5.6")]
    Mysql56,
    #[serde(rename = "5.7")]
    Mysql57,
    #[serde(rename = "8.0")]
    Mysql80,
}

impl MysqlVersion {
    pub const ALL: [MysqlVersion; 3] = [
        MysqlVersion::Mysql56,
        MysqlVersion::Mysql57,
        MysqlVersion::Mysql80,
    ];
    pub const LATEST: MysqlVersion = MysqlVersion::Mysql80;

    pub fn as_str(&self) -> &'static str {
        match self {
            MysqlVersion::Mysql56 => "5.6",
            MysqlVersion::Mysql57 => "5.7",
            MysqlVersion::Mysql80 => "8.0",
        }
    }

    pub fn resolve(input: &str) -> Resolved<MysqlVersion> {
        let code = normalize_code(input);
        match Self::ALL.iter().find(|v| normalize_code(v.as_str()) == code) {
            Some(version) => Resolved::exact(*version),
            None => {
                warn!(
                    "Unknown MySQL version '{}', substituting {}",
                    input,
                    Self::LATEST
                );
                Resolved {
                    value: Self::LATEST,
                    substituted_from: Some(input.to_string()),
                }
            }
        }
    }
}

impl fmt::Display for MysqlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The stack of one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackSpec {
    pub webserver: WebServer,
    pub php_version: PhpVersion,
    pub mysql_version: MysqlVersion,
}

impl Default for StackSpec {
    fn default() -> Self {
        Self {
            webserver: WebServer::Nginx,
            php_version: PhpVersion::LATEST,
            mysql_version: MysqlVersion::LATEST,
        }
    }
}

/// A workspace-wide platform service attached to the shared network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedService {
    pub image: String,
    pub container_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_port: Option<u16>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub environment: IndexMap<String, String>,
}

/// The `stack` section of the workspace document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackCatalog {
    pub dind_image: String,
    pub php_versions: Vec<String>,
    pub mysql_versions: Vec<String>,
    pub webservers: Vec<String>,
    #[serde(default)]
    pub services: IndexMap<String, SharedService>,
}

fn shared_service(image: &str, container_port: u16, host_port: Option<u16>) -> SharedService {
    SharedService {
        image: image.to_string(),
        container_port,
        host_port,
        environment: IndexMap::new(),
    }
}

impl Default for StackCatalog {
    fn default() -> Self {
        let mut services = IndexMap::new();

        let mut phpmyadmin = shared_service("phpmyadmin/phpmyadmin:5.2.1", 80, Some(9080));
        phpmyadmin
            .environment
            .insert("PMA_ARBITRARY".to_string(), "1".to_string());
        services.insert("phpmyadmin".to_string(), phpmyadmin);
        services.insert(
            "mailpit".to_string(),
            shared_service("axllent/mailpit:v1.21", 8025, Some(9025)),
        );
        services.insert(
            "redis".to_string(),
            shared_service("redis:7.4-alpine", 6379, None),
        );

        let mut commander =
            shared_service("rediscommander/redis-commander:latest", 8081, Some(9081));
        commander
            .environment
            .insert("REDIS_HOSTS".to_string(), "local:wp-shared-redis:6379".to_string());
        services.insert("redis-commander".to_string(), commander);

        Self {
            dind_image: "docker:27.3.1-dind".to_string(),
            php_versions: PhpVersion::ALL.iter().map(|v| v.to_string()).collect(),
            mysql_versions: MysqlVersion::ALL.iter().map(|v| v.to_string()).collect(),
            webservers: WebServer::ALL.iter().map(|w| w.to_string()).collect(),
            services,
        }
    }
}

/// Pinned semantic versions for every image component.
///
/// Keys are `php-<x.y>`, `mysql-<x.y>`, `nginx`, `apache`, `wpcli`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageVersions(pub BTreeMap<String, String>);

const BUILTIN_IMAGE_VERSIONS: &[(&str, &str)] = &[
    ("php-7.4", "7.4.33"),
    ("php-8.0", "8.0.30"),
    ("php-8.1", "8.1.31"),
    ("php-8.2", "8.2.26"),
    ("php-8.3", "8.3.14"),
    ("mysql-5.6", "5.6.51"),
    ("mysql-5.7", "5.7.44"),
    ("mysql-8.0", "8.0.40"),
    ("nginx", "1.27.3"),
    ("apache", "2.4.62"),
    ("wpcli", "2.11.0"),
];

impl Default for ImageVersions {
    fn default() -> Self {
        Self(
            BUILTIN_IMAGE_VERSIONS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl ImageVersions {
    /// Pinned version for a component key, falling back to the built-in table
    /// when the workspace document predates the key.
    pub fn get(&self, key: &str) -> Result<String> {
        if let Some(version) = self.0.get(key) {
            return Ok(version.clone());
        }
        BUILTIN_IMAGE_VERSIONS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
            .ok_or_else(|| WpError::Config(format!("No pinned image version for '{}'", key)))
    }

    pub fn php(&self, version: PhpVersion) -> Result<String> {
        self.get(&format!("php-{}", version))
    }

    pub fn mysql(&self, version: MysqlVersion) -> Result<String> {
        self.get(&format!("mysql-{}", version))
    }

    pub fn webserver(&self, webserver: WebServer) -> Result<String> {
        self.get(webserver.as_str())
    }
}

/// Image reference following `<vendor>/<product>:<component>-<semver>`.
pub fn image_ref(vendor: &str, component: &str, semver: &str) -> String {
    format!("{}/wordpress:{}-{}", vendor, component, semver)
}
