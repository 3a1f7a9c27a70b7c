//! Per-instance metadata file (`instance.env`).
//!
//! Flat `KEY=VALUE` lines holding the instance's identity and its database
//! credentials. Secrets are stored in plaintext; the file is created with
//! mode 0600.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use wp_core::error::{Result, WpError};
use wp_ports::{NetworkSpec, Subnet};

use crate::stack::{MysqlVersion, PhpVersion, StackSpec, WebServer};

pub const METADATA_FILE: &str = "instance.env";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceMetadata {
    pub name: String,
    pub stack: StackSpec,
    pub network: NetworkSpec,
    pub port: u16,
    pub created: DateTime<Utc>,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_root_password: String,
}

fn required<'a>(fields: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    fields
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| WpError::Config(format!("Instance metadata is missing {}", key)))
}

fn parse_field<T: FromStr>(fields: &HashMap<String, String>, key: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = required(fields, key)?;
    raw.parse()
        .map_err(|e| WpError::Config(format!("Invalid {} '{}' in instance metadata: {}", key, raw, e)))
}

impl InstanceMetadata {
    pub fn render(&self) -> String {
        let lines = [
            ("NAME", self.name.clone()),
            ("MYSQL_VERSION", self.stack.mysql_version.to_string()),
            ("PHP_VERSION", self.stack.php_version.to_string()),
            ("WEBSERVER", self.stack.webserver.to_string()),
            ("NETWORK", self.network.name.clone()),
            ("SUBNET", self.network.subnet.to_string()),
            ("PORT", self.port.to_string()),
            ("CREATED", self.created.to_rfc3339()),
            ("DB_NAME", self.db_name.clone()),
            ("DB_USER", self.db_user.clone()),
            ("DB_PASSWORD", self.db_password.clone()),
            ("DB_ROOT_PASSWORD", self.db_root_password.clone()),
        ];
        let mut out = String::new();
        for (key, value) in lines {
            out.push_str(key);
            out.push('=');
            out.push_str(&value);
            out.push('\n');
        }
        out
    }

    pub fn parse(content: &str) -> Result<Self> {
        let fields: HashMap<String, String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();

        // Versions were validated on write; a hand-edited unknown value still
        // resolves the same way the command line does.
        let stack = StackSpec {
            webserver: parse_field::<WebServer>(&fields, "WEBSERVER")?,
            php_version: PhpVersion::resolve(required(&fields, "PHP_VERSION")?).value,
            mysql_version: MysqlVersion::resolve(required(&fields, "MYSQL_VERSION")?).value,
        };

        Ok(Self {
            name: required(&fields, "NAME")?.to_string(),
            stack,
            network: NetworkSpec {
                name: required(&fields, "NETWORK")?.to_string(),
                subnet: parse_field::<Subnet>(&fields, "SUBNET")?,
            },
            port: parse_field(&fields, "PORT")?,
            created: parse_field(&fields, "CREATED")?,
            db_name: required(&fields, "DB_NAME")?.to_string(),
            db_user: required(&fields, "DB_USER")?.to_string(),
            db_password: required(&fields, "DB_PASSWORD")?.to_string(),
            db_root_password: required(&fields, "DB_ROOT_PASSWORD")?.to_string(),
        })
    }

    /// Holds the database passwords: created owner-only, and an existing
    /// file is narrowed to owner-only before the new content lands in it.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(self.render().as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WpError::NotFound(format!("Instance metadata not found at {:?}", path))
            } else {
                e.into()
            }
        })?;
        Self::parse(&content)
    }
}
