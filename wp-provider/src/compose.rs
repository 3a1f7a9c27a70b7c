//! Compose descriptor rendering.
//!
//! Each instance gets a three-service project (mysql, php, web) attached to
//! its private network and the shared network; only `web` publishes a host
//! port. The shared platform services live in a separate project.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::Serialize;
use tera::{Context as TeraContext, Tera};
use wp_config::stack::image_ref;
use wp_config::{ImageVersions, InstanceMetadata, StackCatalog, WebServer};
use wp_core::error::{Result, WpError};
use wp_ports::network::SHARED_NETWORK;

use crate::ComposeStack;

pub const SERVICE_MYSQL: &str = "mysql";
pub const SERVICE_PHP: &str = "php";
pub const SERVICE_WEB: &str = "web";

pub const COMPOSE_FILE: &str = "docker-compose.yml";

/// Restart policy of sites the engine brings back after a daemon restart.
const RESTART_AUTOSTART: &str = "unless-stopped";
/// Sites that only run after an explicit `start`. Quoted: bare `no` is a YAML boolean.
const RESTART_MANUAL: &str = "\"no\"";
pub const SHARED_PROJECT: &str = "wp-shared";

const INSTANCE_TEMPLATE: &str = "instance-compose.yml";
const SHARED_TEMPLATE: &str = "shared-compose.yml";

static COMPOSE_TERA: OnceCell<Tera> = OnceCell::new();

fn compose_tera() -> Result<&'static Tera> {
    COMPOSE_TERA.get_or_try_init(|| {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (INSTANCE_TEMPLATE, include_str!("templates/instance-compose.yml")),
            (SHARED_TEMPLATE, include_str!("templates/shared-compose.yml")),
        ])
        .map_err(|e| WpError::Internal(format!("Invalid compose template: {}", e)))?;
        Ok(tera)
    })
}

fn render(template: &str, context: &TeraContext) -> Result<String> {
    compose_tera()?
        .render(template, context)
        .map_err(|e| WpError::Internal(format!("Failed to render {}: {:?}", template, e)))
}

fn path_str(path: &Path) -> Result<String> {
    path.to_str()
        .map(String::from)
        .ok_or_else(|| WpError::Internal(format!("Path is not valid UTF-8: {:?}", path)))
}

/// Compose project name for an instance.
pub fn project_name(instance: &str) -> String {
    format!("wp-{}", instance.to_ascii_lowercase())
}

#[derive(Debug, Clone, Serialize)]
pub struct StackImages {
    pub mysql: String,
    pub php: String,
    pub web: String,
}

impl StackImages {
    pub fn resolve(metadata: &InstanceMetadata, versions: &ImageVersions, vendor: &str) -> Result<Self> {
        let stack = &metadata.stack;
        Ok(Self {
            mysql: image_ref(vendor, "mysql", &versions.mysql(stack.mysql_version)?),
            php: image_ref(vendor, "php", &versions.php(stack.php_version)?),
            web: image_ref(
                vendor,
                stack.webserver.as_str(),
                &versions.webserver(stack.webserver)?,
            ),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DbSettings {
    pub name: String,
    pub user: String,
    pub password: String,
    pub root_password: String,
}

/// Everything the instance compose template needs.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceTopology {
    pub name: String,
    pub project: String,
    pub instance_dir: String,
    pub wordpress_dir: String,
    pub webserver: WebServer,
    pub port: u16,
    pub site_url: String,
    pub network: String,
    pub shared_network: String,
    pub images: StackImages,
    pub db: DbSettings,
    pub restart: String,
}

impl InstanceTopology {
    pub fn new(
        metadata: &InstanceMetadata,
        instance_dir: &Path,
        images: StackImages,
        host_ip: &str,
    ) -> Result<Self> {
        Ok(Self {
            name: metadata.name.clone(),
            project: project_name(&metadata.name),
            instance_dir: path_str(instance_dir)?,
            wordpress_dir: path_str(&instance_dir.join("data").join("wordpress"))?,
            webserver: metadata.stack.webserver,
            port: metadata.port,
            site_url: format!("http://{}:{}", host_ip, metadata.port),
            network: metadata.network.name.clone(),
            shared_network: SHARED_NETWORK.to_string(),
            images,
            db: DbSettings {
                name: metadata.db_name.clone(),
                user: metadata.db_user.clone(),
                password: metadata.db_password.clone(),
                root_password: metadata.db_root_password.clone(),
            },
            restart: RESTART_MANUAL.to_string(),
        })
    }

    /// Let the engine restart the site with the host (workspace-mode site).
    pub fn autostart(mut self, enabled: bool) -> Self {
        self.restart = if enabled { RESTART_AUTOSTART } else { RESTART_MANUAL }.to_string();
        self
    }

    pub fn compose_path(&self) -> PathBuf {
        Path::new(&self.instance_dir).join(COMPOSE_FILE)
    }
}

/// Compose stack handle for an instance directory.
pub fn instance_stack(name: &str, instance_dir: &Path) -> ComposeStack {
    ComposeStack::new(project_name(name), instance_dir.join(COMPOSE_FILE))
        .with_service(SERVICE_MYSQL)
        .with_service(SERVICE_PHP)
        .with_service(SERVICE_WEB)
}

pub fn render_instance_compose(topology: &InstanceTopology) -> Result<String> {
    let context = TeraContext::from_serialize(topology)
        .map_err(|e| WpError::Internal(format!("Invalid compose context: {}", e)))?;
    render(INSTANCE_TEMPLATE, &context)
}

#[derive(Debug, Clone, Serialize)]
struct SharedServiceView {
    key: String,
    container: String,
    image: String,
    container_port: u16,
    host_port: Option<u16>,
    environment: Vec<(String, String)>,
}

/// The shared platform services project.
#[derive(Debug, Clone, Serialize)]
pub struct SharedTopology {
    project: String,
    shared_network: String,
    services: Vec<SharedServiceView>,
}

impl SharedTopology {
    pub fn from_catalog(catalog: &StackCatalog) -> Self {
        let services = catalog
            .services
            .iter()
            .map(|(key, service)| SharedServiceView {
                key: key.clone(),
                container: format!("{}-{}", SHARED_PROJECT, key),
                image: service.image.clone(),
                container_port: service.container_port,
                host_port: service.host_port,
                environment: service
                    .environment
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            })
            .collect();
        Self {
            project: SHARED_PROJECT.to_string(),
            shared_network: SHARED_NETWORK.to_string(),
            services,
        }
    }

    pub fn stack(&self, dir: &Path) -> ComposeStack {
        self.services.iter().fold(
            ComposeStack::new(&self.project, dir.join(COMPOSE_FILE)),
            |stack, service| stack.with_service(&service.key),
        )
    }
}

pub fn render_shared_compose(topology: &SharedTopology) -> Result<String> {
    let context = TeraContext::from_serialize(topology)
        .map_err(|e| WpError::Internal(format!("Invalid compose context: {}", e)))?;
    render(SHARED_TEMPLATE, &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wp_config::{MysqlVersion, PhpVersion, StackSpec};
    use wp_ports::NetworkSpec;

    fn metadata(webserver: WebServer) -> InstanceMetadata {
        InstanceMetadata {
            name: "Alpha".into(),
            stack: StackSpec {
                webserver,
                php_version: PhpVersion::Php82,
                mysql_version: MysqlVersion::Mysql80,
            },
            network: NetworkSpec::for_ordinal(3).unwrap(),
            port: 8003,
            created: chrono::Utc::now(),
            db_name: "wordpress".into(),
            db_user: "wordpress".into(),
            db_password: "userpw".into(),
            db_root_password: "rootpw".into(),
        }
    }

    fn topology_for(webserver: WebServer) -> InstanceTopology {
        let meta = metadata(webserver);
        let images = StackImages::resolve(&meta, &ImageVersions::default(), "wpdind").unwrap();
        InstanceTopology::new(&meta, Path::new("/ws/instances/Alpha"), images, "localhost")
            .unwrap()
    }

    fn render_for(webserver: WebServer) -> String {
        render_instance_compose(&topology_for(webserver)).unwrap()
    }

    #[test]
    fn test_sites_do_not_restart_with_the_engine_by_default() {
        let yaml = render_for(WebServer::Nginx);
        assert_eq!(yaml.matches("restart: \"no\"").count(), 3);
        assert!(!yaml.contains("unless-stopped"));
    }

    #[test]
    fn test_autostart_site_restarts_with_the_engine() {
        let yaml = render_instance_compose(&topology_for(WebServer::Apache).autostart(true)).unwrap();
        assert_eq!(yaml.matches("restart: unless-stopped").count(), 3);
        assert!(!yaml.contains("restart: \"no\""));
    }

    #[test]
    fn test_instance_compose_wiring() {
        let yaml = render_for(WebServer::Nginx);
        assert!(yaml.contains("name: wp-alpha"));
        assert!(yaml.contains("container_name: wp-alpha-mysql"));
        assert!(yaml.contains("image: wpdind/wordpress:mysql-8.0.40"));
        assert!(yaml.contains("image: wpdind/wordpress:php-8.2.26"));
        assert!(yaml.contains("image: wpdind/wordpress:nginx-1.27.3"));
        assert!(yaml.contains("name: wp-network-3"));
        assert!(yaml.contains("name: wp-shared"));
        assert!(yaml.contains("/etc/nginx/conf.d/default.conf"));
        assert!(!yaml.contains("httpd.conf"));
        assert!(yaml.contains("MYSQL_ROOT_PASSWORD: \"rootpw\""));
    }

    #[test]
    fn test_only_web_publishes_a_port() {
        let yaml = render_for(WebServer::Nginx);
        assert_eq!(yaml.matches("ports:").count(), 1);
        assert!(yaml.contains("- \"8003:80\""));
        let web_section = yaml.split("  web:").nth(1).unwrap();
        assert!(web_section.contains("ports:"));
    }

    #[test]
    fn test_apache_variant() {
        let yaml = render_for(WebServer::Apache);
        assert!(yaml.contains("image: wpdind/wordpress:apache-2.4.62"));
        assert!(yaml.contains("/usr/local/apache2/conf/httpd.conf"));
        assert!(!yaml.contains("default.conf"));
    }

    #[test]
    fn test_instance_stack_containers() {
        let stack = instance_stack("Alpha", Path::new("/ws/instances/Alpha"));
        assert_eq!(stack.project, "wp-alpha");
        assert_eq!(stack.container(SERVICE_WEB), Some("wp-alpha-web"));
        assert_eq!(stack.containers().count(), 3);
    }

    #[test]
    fn test_shared_compose() {
        let topology = SharedTopology::from_catalog(&StackCatalog::default());
        let yaml = render_shared_compose(&topology).unwrap();
        assert!(yaml.contains("container_name: wp-shared-phpmyadmin"));
        assert!(yaml.contains("- \"9080:80\""));
        assert!(yaml.contains("PMA_ARBITRARY: \"1\""));
        assert!(yaml.contains("container_name: wp-shared-redis\n"));
        let stack = topology.stack(Path::new("/ws/shared"));
        assert_eq!(stack.container("mailpit"), Some("wp-shared-mailpit"));
    }
}
