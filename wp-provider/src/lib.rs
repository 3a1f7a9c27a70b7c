//! Container engine abstraction.
//!
//! Everything the instance manager asks of Docker goes through
//! [`ContainerEngine`]: network bookkeeping, compose bring-up and teardown,
//! container state queries and `exec`. All calls block until the engine
//! returns.

use std::collections::BTreeSet;
use std::path::PathBuf;

use wp_core::error::Result;
use wp_ports::{NetworkInfo, NetworkSpec};

pub mod compose;
pub mod docker;

// When the `test-helpers` feature is enabled, include the in-memory engine.
#[cfg(feature = "test-helpers")]
pub mod mock;

pub use compose::{
    instance_stack, project_name, render_instance_compose, render_shared_compose,
    InstanceTopology, SharedTopology, StackImages, COMPOSE_FILE, SERVICE_MYSQL, SERVICE_PHP,
    SERVICE_WEB,
};
pub use docker::DockerEngine;

/// One service of a compose project and the container it runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRef {
    pub service: String,
    pub container: String,
}

/// A compose project on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeStack {
    pub project: String,
    pub file: PathBuf,
    pub services: Vec<ServiceRef>,
}

impl ComposeStack {
    pub fn new(project: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            file: file.into(),
            services: Vec::new(),
        }
    }

    /// Register a service whose container is named `<project>-<service>`.
    pub fn with_service(mut self, service: &str) -> Self {
        let container = format!("{}-{}", self.project, service);
        self.services.push(ServiceRef {
            service: service.to_string(),
            container,
        });
        self
    }

    pub fn container(&self, service: &str) -> Option<&str> {
        self.services
            .iter()
            .find(|s| s.service == service)
            .map(|s| s.container.as_str())
    }

    pub fn containers(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|s| s.container.as_str())
    }
}

/// Operations the instance manager needs from a container engine.
pub trait ContainerEngine {
    fn name(&self) -> &'static str;

    fn list_networks(&self) -> Result<Vec<NetworkInfo>>;
    fn create_network(&self, spec: &NetworkSpec) -> Result<()>;
    fn remove_network(&self, name: &str) -> Result<()>;

    /// Create the stack's containers without starting them.
    fn compose_create(&self, stack: &ComposeStack) -> Result<()>;
    /// Bring up `services` of the stack, or every service when empty.
    fn compose_up(&self, stack: &ComposeStack, services: &[&str]) -> Result<()>;
    fn compose_stop(&self, stack: &ComposeStack) -> Result<()>;
    fn compose_down(&self, stack: &ComposeStack, remove_volumes: bool) -> Result<()>;
    fn compose_logs(&self, stack: &ComposeStack, service: Option<&str>, follow: bool)
        -> Result<()>;

    /// Names of containers that are currently running.
    fn running_containers(&self) -> Result<BTreeSet<String>>;
    /// Host port bound to `container_port/tcp` of `container`, if any.
    fn published_port(&self, container: &str, container_port: u16) -> Result<Option<u16>>;

    fn exec_capture(&self, container: &str, command: &[String]) -> Result<String>;
    /// Like `exec_capture`, but stdout is returned unmodified.
    fn exec_capture_bytes(&self, container: &str, command: &[String]) -> Result<Vec<u8>>;
    fn exec_with_input(&self, container: &str, command: &[String], input: &[u8]) -> Result<()>;
}
