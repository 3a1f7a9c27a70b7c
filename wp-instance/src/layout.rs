//! On-disk layout of an instance directory.
//!
//! ```text
//! <instance>/
//!   instance.env          metadata and credentials (0600)
//!   docker-compose.yml
//!   data/wordpress/       WordPress files (a symlink for shared-reference clones)
//!   data/mysql/
//!   config/php/php.ini    config/php/user.ini
//!   config/mysql/my.cnf   config/mysql/user.cnf
//!   config/nginx/default.conf or config/apache/httpd.conf
//!   logs/{mysql,php,nginx|apache}/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use wp_config::{InstanceMetadata, WebServer, METADATA_FILE};
use wp_core::error::{Result, WpError};
use wp_provider::COMPOSE_FILE;

pub const INSTANCES_DIR: &str = "instances";
pub const SITE_DIR: &str = "site";
pub const SHARED_DIR: &str = "shared";

const EMBEDDED_PHP_INI: &str = include_str!("templates/php.ini");
const EMBEDDED_MY_CNF: &str = include_str!("templates/my.cnf");
const EMBEDDED_NGINX: &str = include_str!("templates/nginx.conf");
const EMBEDDED_APACHE: &str = include_str!("templates/apache.conf");

/// Where service configuration templates come from.
///
/// A template directory mirrors the instance `config/` tree:
/// `php/php.ini`, `mysql/my.cnf`, `nginx/default.conf`, `apache/httpd.conf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Embedded,
    Directory(PathBuf),
}

impl TemplateSource {
    pub fn from_dir(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => TemplateSource::Directory(dir.to_path_buf()),
            None => TemplateSource::Embedded,
        }
    }

    fn read(&self, relative: &str, embedded: &'static str) -> Result<String> {
        match self {
            TemplateSource::Embedded => Ok(embedded.to_string()),
            TemplateSource::Directory(dir) => {
                let path = dir.join(relative);
                fs::read_to_string(&path).map_err(|e| {
                    WpError::Config(format!("Cannot read template {:?}: {}", path, e))
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceLayout {
    root: PathBuf,
}

impl InstanceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<workspace>/instances/<name>`
    pub fn for_instance(workspace: &Path, name: &str) -> Self {
        Self::new(workspace.join(INSTANCES_DIR).join(name))
    }

    /// `<workspace>/site`, home of the workspace-mode site.
    pub fn for_site(workspace: &Path) -> Self {
        Self::new(workspace.join(SITE_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        fs::symlink_metadata(&self.root).is_ok()
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    pub fn compose_path(&self) -> PathBuf {
        self.root.join(COMPOSE_FILE)
    }

    pub fn wordpress_dir(&self) -> PathBuf {
        self.root.join("data").join("wordpress")
    }

    pub fn mysql_dir(&self) -> PathBuf {
        self.root.join("data").join("mysql")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn read_metadata(&self) -> Result<InstanceMetadata> {
        InstanceMetadata::read(&self.metadata_path())
    }

    /// Create directories and seed configuration for `metadata`.
    ///
    /// Service configs are copied from `templates`; the user override files
    /// are created empty and never overwritten.
    pub fn prepare(&self, metadata: &InstanceMetadata, templates: &TemplateSource) -> Result<()> {
        let webserver = metadata.stack.webserver;
        let web_dir = webserver.as_str();

        for dir in [
            self.wordpress_dir(),
            self.mysql_dir(),
            self.config_dir().join("php"),
            self.config_dir().join("mysql"),
            self.config_dir().join(web_dir),
            self.logs_dir().join("mysql"),
            self.logs_dir().join("php"),
            self.logs_dir().join(web_dir),
        ] {
            fs::create_dir_all(&dir)?;
        }

        let config = self.config_dir();
        fs::write(
            config.join("php").join("php.ini"),
            templates.read("php/php.ini", EMBEDDED_PHP_INI)?,
        )?;
        fs::write(
            config.join("mysql").join("my.cnf"),
            templates.read("mysql/my.cnf", EMBEDDED_MY_CNF)?,
        )?;
        match webserver {
            WebServer::Nginx => fs::write(
                config.join("nginx").join("default.conf"),
                templates.read("nginx/default.conf", EMBEDDED_NGINX)?,
            )?,
            WebServer::Apache => fs::write(
                config.join("apache").join("httpd.conf"),
                templates.read("apache/httpd.conf", EMBEDDED_APACHE)?,
            )?,
        }

        touch_if_missing(&config.join("php").join("user.ini"))?;
        touch_if_missing(&config.join("mysql").join("user.cnf"))?;

        metadata.write(&self.metadata_path())?;
        debug!("Prepared instance layout at {:?}", self.root);
        Ok(())
    }
}

fn touch_if_missing(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::write(path, "")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;
    use wp_config::StackSpec;
    use wp_ports::NetworkSpec;

    fn metadata(webserver: WebServer) -> InstanceMetadata {
        InstanceMetadata {
            name: "alpha".into(),
            stack: StackSpec {
                webserver,
                ..StackSpec::default()
            },
            network: NetworkSpec::for_ordinal(1).unwrap(),
            port: 8001,
            created: Utc::now(),
            db_name: "wordpress".into(),
            db_user: "wordpress".into(),
            db_password: "a".into(),
            db_root_password: "b".into(),
        }
    }

    #[test]
    fn test_prepare_nginx_layout() {
        let ws = tempdir().unwrap();
        let layout = InstanceLayout::for_instance(ws.path(), "alpha");
        layout.prepare(&metadata(WebServer::Nginx), &TemplateSource::Embedded).unwrap();

        assert!(layout.wordpress_dir().is_dir());
        assert!(layout.mysql_dir().is_dir());
        assert!(layout.config_dir().join("nginx/default.conf").is_file());
        assert!(!layout.config_dir().join("apache").exists());
        assert_eq!(fs::read_to_string(layout.config_dir().join("php/user.ini")).unwrap(), "");
        assert_eq!(layout.read_metadata().unwrap().port, 8001);
    }

    #[test]
    fn test_user_overrides_survive_prepare() {
        let ws = tempdir().unwrap();
        let layout = InstanceLayout::for_instance(ws.path(), "alpha");
        layout.prepare(&metadata(WebServer::Apache), &TemplateSource::Embedded).unwrap();
        let user_cnf = layout.config_dir().join("mysql/user.cnf");
        fs::write(&user_cnf, "[mysqld]\nmax_connections = 20\n").unwrap();

        layout.prepare(&metadata(WebServer::Apache), &TemplateSource::Embedded).unwrap();
        assert!(fs::read_to_string(&user_cnf).unwrap().contains("max_connections"));
        assert!(layout.config_dir().join("apache/httpd.conf").is_file());
    }

    #[test]
    fn test_templates_from_directory() {
        let templates = tempdir().unwrap();
        for (path, body) in [
            ("php/php.ini", "memory_limit = 1G\n"),
            ("mysql/my.cnf", "[mysqld]\n"),
            ("nginx/default.conf", "server {}\n"),
        ] {
            let full = templates.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, body).unwrap();
        }

        let ws = tempdir().unwrap();
        let layout = InstanceLayout::for_instance(ws.path(), "alpha");
        let source = TemplateSource::from_dir(Some(templates.path()));
        layout.prepare(&metadata(WebServer::Nginx), &source).unwrap();
        assert_eq!(
            fs::read_to_string(layout.config_dir().join("php/php.ini")).unwrap(),
            "memory_limit = 1G\n"
        );

        let missing = InstanceLayout::for_instance(ws.path(), "beta");
        assert!(missing
            .prepare(&metadata(WebServer::Apache), &source)
            .is_err());
    }
}
