//! In-memory container engine for tests.
//!
//! Tracks networks, running containers and a per-container SQL payload so
//! that lifecycle and clone behaviour can be asserted without Docker.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::sync::{Mutex, MutexGuard};

use wp_core::error::{Result, WpError};
use wp_ports::{NetworkInfo, NetworkSpec, Subnet};

use crate::{ComposeStack, ContainerEngine};

#[derive(Debug, Default)]
struct MockState {
    networks: Vec<NetworkInfo>,
    running: BTreeSet<String>,
    published: BTreeMap<String, u16>,
    databases: BTreeMap<String, Vec<u8>>,
    failing: HashSet<String>,
    calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MockEngine {
    state: Mutex<MockState>,
}

/// Program an exec runs, looking through `sh -c 'exec <program> ...'`.
fn exec_program(command: &[String]) -> &str {
    match command {
        [shell, flag, script, ..] if shell == "sh" && flag == "-c" => {
            let mut words = script.split_whitespace();
            match words.next() {
                Some("exec") => words.next().unwrap_or(""),
                Some(first) => first,
                None => "",
            }
        }
        [program, ..] => program.as_str(),
        [] => "",
    }
}

/// Host port from a compose line such as `- "8001:80"`.
fn published_web_port(compose: &str) -> Option<u16> {
    compose.lines().find_map(|line| {
        let entry = line.trim().strip_prefix("- \"")?.strip_suffix(":80\"")?;
        entry.parse().ok()
    })
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, operation: &str, detail: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("{} {}", operation, detail).trim_end().to_string());
        if state.failing.contains(operation) {
            return Err(WpError::Engine(format!("simulated {} failure", operation)));
        }
        Ok(())
    }

    /// Make every subsequent call of `operation` fail.
    pub fn fail_on(&self, operation: &str) {
        self.state().failing.insert(operation.to_string());
    }

    pub fn clear_failures(&self) {
        self.state().failing.clear();
    }

    /// Simulate a network that some other tool created.
    pub fn add_network(&self, name: &str, subnet: Subnet) {
        self.state().networks.push(NetworkInfo {
            name: name.to_string(),
            subnets: vec![subnet],
        });
    }

    pub fn has_network(&self, name: &str) -> bool {
        self.state().networks.iter().any(|n| n.name == name)
    }

    pub fn is_running(&self, container: &str) -> bool {
        self.state().running.contains(container)
    }

    /// Simulate the engine losing every container, as after a host restart.
    pub fn stop_everything(&self) {
        self.state().running.clear();
    }

    pub fn set_database(&self, container: &str, sql: &str) {
        self.set_database_bytes(container, sql.as_bytes());
    }

    pub fn set_database_bytes(&self, container: &str, dump: &[u8]) {
        self.state()
            .databases
            .insert(container.to_string(), dump.to_vec());
    }

    pub fn database(&self, container: &str) -> Option<String> {
        self.database_bytes(container)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn database_bytes(&self, container: &str) -> Option<Vec<u8>> {
        self.state().databases.get(container).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn require_running(&self, container: &str) -> Result<()> {
        if self.is_running(container) {
            Ok(())
        } else {
            Err(WpError::Engine(format!(
                "Error response from daemon: container {} is not running",
                container
            )))
        }
    }
}

impl ContainerEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn list_networks(&self) -> Result<Vec<NetworkInfo>> {
        self.record("list_networks", "")?;
        Ok(self.state().networks.clone())
    }

    fn create_network(&self, spec: &NetworkSpec) -> Result<()> {
        self.record("create_network", &spec.name)?;
        let mut state = self.state();
        if state.networks.iter().any(|n| n.name == spec.name) {
            return Err(WpError::Engine(format!(
                "network with name {} already exists",
                spec.name
            )));
        }
        state.networks.push(NetworkInfo {
            name: spec.name.clone(),
            subnets: vec![spec.subnet],
        });
        Ok(())
    }

    fn remove_network(&self, name: &str) -> Result<()> {
        self.record("remove_network", name)?;
        let mut state = self.state();
        let before = state.networks.len();
        state.networks.retain(|n| n.name != name);
        if state.networks.len() == before {
            return Err(WpError::Engine(format!("network {} not found", name)));
        }
        Ok(())
    }

    fn compose_create(&self, stack: &ComposeStack) -> Result<()> {
        self.record("compose_create", &stack.project)
    }

    fn compose_up(&self, stack: &ComposeStack, services: &[&str]) -> Result<()> {
        self.record("compose_up", &format!("{} {}", stack.project, services.join(" ")))?;
        let web_port = fs::read_to_string(&stack.file)
            .ok()
            .and_then(|content| published_web_port(&content));

        let mut state = self.state();
        for service in &stack.services {
            if services.is_empty() || services.contains(&service.service.as_str()) {
                state.running.insert(service.container.clone());
                if let Some(port) = web_port.filter(|_| service.service == "web") {
                    state.published.insert(service.container.clone(), port);
                }
            }
        }
        Ok(())
    }

    fn compose_stop(&self, stack: &ComposeStack) -> Result<()> {
        self.record("compose_stop", &stack.project)?;
        let mut state = self.state();
        for container in stack.containers() {
            state.running.remove(container);
        }
        Ok(())
    }

    fn compose_down(&self, stack: &ComposeStack, remove_volumes: bool) -> Result<()> {
        self.record("compose_down", &stack.project)?;
        let mut state = self.state();
        for container in stack.containers() {
            state.running.remove(container);
            state.published.remove(container);
            if remove_volumes {
                state.databases.remove(container);
            }
        }
        Ok(())
    }

    fn compose_logs(
        &self,
        stack: &ComposeStack,
        service: Option<&str>,
        _follow: bool,
    ) -> Result<()> {
        self.record(
            "compose_logs",
            &format!("{} {}", stack.project, service.unwrap_or("")),
        )
    }

    fn running_containers(&self) -> Result<BTreeSet<String>> {
        self.record("running_containers", "")?;
        Ok(self.state().running.clone())
    }

    fn published_port(&self, container: &str, _container_port: u16) -> Result<Option<u16>> {
        self.record("published_port", container)?;
        let state = self.state();
        if !state.running.contains(container) {
            return Ok(None);
        }
        Ok(state.published.get(container).copied())
    }

    fn exec_capture(&self, container: &str, command: &[String]) -> Result<String> {
        self.exec_capture_bytes(container, command)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    fn exec_capture_bytes(&self, container: &str, command: &[String]) -> Result<Vec<u8>> {
        let program = exec_program(command);
        self.record("exec", &format!("{} {}", container, program))?;
        self.require_running(container)?;
        match program {
            "mysqladmin" => Ok(b"mysqld is alive\n".to_vec()),
            "mysqldump" => Ok(self.database_bytes(container).unwrap_or_default()),
            _ => Ok(Vec::new()),
        }
    }

    fn exec_with_input(&self, container: &str, command: &[String], input: &[u8]) -> Result<()> {
        let program = exec_program(command);
        self.record("exec_input", &format!("{} {}", container, program))?;
        self.require_running(container)?;
        if program == "mysql" {
            let mut state = self.state();
            let entry = state.databases.entry(container.to_string()).or_default();
            entry.extend_from_slice(input);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_network_is_rejected() {
        let engine = MockEngine::new();
        let spec = NetworkSpec::for_ordinal(1).unwrap();
        engine.create_network(&spec).unwrap();
        assert!(engine.create_network(&spec).is_err());
    }

    #[test]
    fn test_injected_failure() {
        let engine = MockEngine::new();
        engine.fail_on("list_networks");
        assert!(engine.list_networks().is_err());
        engine.clear_failures();
        assert!(engine.list_networks().is_ok());
    }

    #[test]
    fn test_exec_program_sees_through_shell_wrapper() {
        let wrapped = vec![
            "sh".to_string(),
            "-c".to_string(),
            "exec mysqldump -uroot -p\"$MYSQL_ROOT_PASSWORD\" 'wordpress'".to_string(),
        ];
        assert_eq!(exec_program(&wrapped), "mysqldump");
        assert_eq!(exec_program(&["mysql".to_string()]), "mysql");
        assert_eq!(exec_program(&[]), "");
    }

    #[test]
    fn test_published_port_parse() {
        assert_eq!(published_web_port("    ports:\n      - \"8005:80\"\n"), Some(8005));
        assert_eq!(published_web_port("nothing"), None);
    }
}
