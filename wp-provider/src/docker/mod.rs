// Docker implementation of the container engine.

pub mod command;

pub use command::{ComposeCommand, DockerCommand};

use std::collections::BTreeSet;

use tracing::{debug, warn};
use wp_core::command_stream::{is_tool_installed, stream_command, stream_command_visible};
use wp_core::error::{Result, WpError};
use wp_ports::{NetworkInfo, NetworkSpec, Subnet};

use crate::{ComposeStack, ContainerEngine};

#[derive(Debug, Clone, Default)]
pub struct DockerEngine;

impl DockerEngine {
    pub fn new() -> Result<Self> {
        if !is_tool_installed("docker") {
            return Err(WpError::Engine(
                "docker was not found in PATH. Is this running inside the DinD host?".into(),
            ));
        }
        Ok(Self)
    }

    fn compose(&self, stack: &ComposeStack, subcommand: &str, extra: &[&str]) -> Result<()> {
        let args = ComposeCommand::build_args(&stack.project, &stack.file, subcommand, extra)?;
        stream_command("docker", &args)
    }
}

/// Parse lines of `<name> <subnet> <subnet>...`.
fn parse_network_inspect(output: &str) -> Vec<NetworkInfo> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?.to_string();
            // IPv6 and malformed entries are not ours to allocate from.
            let subnets = fields.filter_map(|f| f.parse::<Subnet>().ok()).collect();
            Some(NetworkInfo { name, subnets })
        })
        .collect()
}

/// Parse `docker port` output such as `0.0.0.0:8001` or `[::]:8001`.
fn parse_port_output(output: &str) -> Option<u16> {
    output
        .lines()
        .filter_map(|line| line.trim().rsplit_once(':'))
        .find_map(|(_, port)| port.trim().parse().ok())
}

impl ContainerEngine for DockerEngine {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn list_networks(&self) -> Result<Vec<NetworkInfo>> {
        let names = DockerCommand::new()
            .args(["network", "ls", "--format", "{{.Name}}"])
            .execute_with_output()?;
        let names: Vec<&str> = names.lines().map(str::trim).filter(|n| !n.is_empty()).collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let inspected = DockerCommand::new()
            .args([
                "network",
                "inspect",
                "--format",
                "{{.Name}} {{range .IPAM.Config}}{{.Subnet}} {{end}}",
            ])
            .args(names.iter().copied())
            .execute_with_output()?;
        Ok(parse_network_inspect(&inspected))
    }

    fn create_network(&self, spec: &NetworkSpec) -> Result<()> {
        debug!("Creating network {} ({})", spec.name, spec.subnet);
        DockerCommand::new()
            .args(["network", "create", "--driver", "bridge"])
            .arg("--subnet")
            .arg(spec.subnet.to_string())
            .arg("--gateway")
            .arg(spec.subnet.gateway().to_string())
            .arg(spec.name.clone())
            .execute()
    }

    fn remove_network(&self, name: &str) -> Result<()> {
        DockerCommand::new()
            .args(["network", "rm", name])
            .execute()
    }

    fn compose_create(&self, stack: &ComposeStack) -> Result<()> {
        self.compose(stack, "create", &[])
    }

    fn compose_up(&self, stack: &ComposeStack, services: &[&str]) -> Result<()> {
        let mut extra = vec!["-d"];
        extra.extend_from_slice(services);
        self.compose(stack, "up", &extra)
    }

    fn compose_stop(&self, stack: &ComposeStack) -> Result<()> {
        self.compose(stack, "stop", &[])
    }

    fn compose_down(&self, stack: &ComposeStack, remove_volumes: bool) -> Result<()> {
        let extra: &[&str] = if remove_volumes {
            &["--volumes", "--remove-orphans"]
        } else {
            &["--remove-orphans"]
        };
        self.compose(stack, "down", extra)
    }

    fn compose_logs(
        &self,
        stack: &ComposeStack,
        service: Option<&str>,
        follow: bool,
    ) -> Result<()> {
        let mut extra = vec!["--tail", "200"];
        if follow {
            extra.push("-f");
        }
        if let Some(service) = service {
            extra.push(service);
        }
        let args = ComposeCommand::build_args(&stack.project, &stack.file, "logs", &extra)?;
        stream_command_visible("docker", &args)
    }

    fn running_containers(&self) -> Result<BTreeSet<String>> {
        let output = DockerCommand::new()
            .args(["ps", "--format", "{{.Names}}"])
            .execute_with_output()?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .collect())
    }

    fn published_port(&self, container: &str, container_port: u16) -> Result<Option<u16>> {
        let output = DockerCommand::new()
            .args(["port", container])
            .arg(format!("{}/tcp", container_port))
            .execute_with_output();
        match output {
            Ok(text) => Ok(parse_port_output(&text)),
            Err(e) => {
                warn!("Could not read published port of {}: {}", container, e);
                Ok(None)
            }
        }
    }

    fn exec_capture(&self, container: &str, command: &[String]) -> Result<String> {
        DockerCommand::new()
            .args(["exec", container])
            .args(command.iter().cloned())
            .execute_with_output()
    }

    fn exec_capture_bytes(&self, container: &str, command: &[String]) -> Result<Vec<u8>> {
        DockerCommand::new()
            .args(["exec", container])
            .args(command.iter().cloned())
            .execute_with_bytes()
    }

    fn exec_with_input(&self, container: &str, command: &[String], input: &[u8]) -> Result<()> {
        DockerCommand::new()
            .args(["exec", "-i", container])
            .args(command.iter().cloned())
            .execute_with_input(input)
    }
}
