//! The workspace document model.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use wp_core::error::{Result, WpError};
use wp_ports::NetworkSpec;

use crate::stack::{ImageVersions, StackCatalog, StackSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkspaceType {
    /// One implicit site named after the workspace.
    Workspace,
    #[default]
    MultiInstance,
}

impl fmt::Display for WorkspaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceType::Workspace => f.write_str("workspace"),
            WorkspaceType::MultiInstance => f.write_str("multi-instance"),
        }
    }
}

impl FromStr for WorkspaceType {
    type Err = WpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "workspace" | "single" => Ok(WorkspaceType::Workspace),
            "multi-instance" | "multi" => Ok(WorkspaceType::MultiInstance),
            other => Err(WpError::Validation(format!(
                "Unknown workspace type '{}': expected workspace or multi-instance",
                other
            ))),
        }
    }
}

/// Last-known status of an instance.
///
/// `creating`, `cloning` and `removing` are written before the first side
/// effect of the matching operation and cleared when it completes, so an
/// interrupted invocation stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Creating,
    Created,
    Running,
    Stopped,
    Cloning,
    Removing,
}

impl InstanceStatus {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InstanceStatus::Creating | InstanceStatus::Cloning | InstanceStatus::Removing
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Creating => "creating",
            InstanceStatus::Created => "created",
            InstanceStatus::Running => "running",
            InstanceStatus::Stopped => "stopped",
            InstanceStatus::Cloning => "cloning",
            InstanceStatus::Removing => "removing",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    pub port: u16,
    pub network: NetworkSpec,
    pub stack: StackSpec,
    pub created_at: DateTime<Utc>,
    pub status: InstanceStatus,
    /// Source instance whose WordPress tree this instance references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_from: Option<String>,
}

fn default_image_versions() -> ImageVersions {
    ImageVersions::default()
}

/// The persisted workspace document (`wp-workspace.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default)]
    pub workspace_name: String,
    #[serde(default)]
    pub workspace_type: WorkspaceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_stack: Option<StackSpec>,
    #[serde(default)]
    pub instances: IndexMap<String, InstanceRecord>,
    #[serde(default)]
    pub stack: Option<StackCatalog>,
    #[serde(default = "default_image_versions")]
    pub image_versions: ImageVersions,
    /// Highest network ordinal ever handed out.
    #[serde(default)]
    pub network_counter: u32,
    /// Incremented on every save; compared against the on-disk value.
    #[serde(default)]
    pub revision: u64,
    /// Keys written by other tools are preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            workspace_name: String::new(),
            workspace_type: WorkspaceType::default(),
            workspace_stack: None,
            instances: IndexMap::new(),
            stack: None,
            image_versions: ImageVersions::default(),
            network_counter: 0,
            revision: 0,
            extra: serde_json::Map::new(),
        }
    }
}

impl Workspace {
    pub fn new(name: &str, workspace_type: WorkspaceType, stack: Option<StackSpec>) -> Self {
        Self {
            workspace_name: name.to_string(),
            workspace_type,
            workspace_stack: match workspace_type {
                WorkspaceType::Workspace => Some(stack.unwrap_or_default()),
                WorkspaceType::MultiInstance => None,
            },
            stack: Some(StackCatalog::default()),
            ..Self::default()
        }
    }

    /// Whether `init` has run for this document.
    pub fn is_initialized(&self) -> bool {
        !self.workspace_name.is_empty()
    }

    pub fn is_workspace_mode(&self) -> bool {
        self.workspace_type == WorkspaceType::Workspace
    }

    pub fn catalog(&self) -> StackCatalog {
        self.stack.clone().unwrap_or_default()
    }

    pub fn assigned_ports(&self) -> BTreeSet<u16> {
        self.instances.values().map(|r| r.port).collect()
    }

    pub fn instance(&self, name: &str) -> Option<&InstanceRecord> {
        self.instances.get(name)
    }

    pub fn instance_mut(&mut self, name: &str) -> Option<&mut InstanceRecord> {
        self.instances.get_mut(name)
    }

    /// Existing instance whose name equals `name` ignoring case.
    pub fn name_taken(&self, name: &str) -> Option<&str> {
        self.instances
            .keys()
            .find(|existing| existing.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Instances that reference `source`'s WordPress tree.
    pub fn dependents_of(&self, source: &str) -> Vec<String> {
        self.instances
            .iter()
            .filter(|(_, r)| r.shared_from.as_deref() == Some(source))
            .map(|(n, _)| n.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(port: u16, ordinal: u32) -> InstanceRecord {
        InstanceRecord {
            port,
            network: NetworkSpec::for_ordinal(ordinal).unwrap(),
            stack: StackSpec::default(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            status: InstanceStatus::Created,
            shared_from: None,
        }
    }

    #[test]
    fn test_default_workspace_is_empty() {
        let ws = Workspace::default();
        assert!(!ws.is_initialized());
        assert!(ws.instances.is_empty());
        assert!(ws.stack.is_none());
    }

    #[test]
    fn test_json_field_names() {
        let mut ws = Workspace::new("blog", WorkspaceType::MultiInstance, None);
        ws.instances.insert("alpha".into(), record(8001, 1));
        let json = serde_json::to_value(&ws).unwrap();

        assert_eq!(json["workspaceName"], "blog");
        assert_eq!(json["workspaceType"], "multi-instance");
        assert!(json.get("workspaceStack").is_none());
        assert_eq!(json["instances"]["alpha"]["port"], 8001);
        assert_eq!(json["instances"]["alpha"]["status"], "created");
        assert_eq!(json["instances"]["alpha"]["stack"]["webserver"], "nginx");
        assert_eq!(json["instances"]["alpha"]["network"]["subnet"], "172.20.1.0/24");
        assert!(json["stack"]["services"]["phpmyadmin"].is_object());
        assert_eq!(json["imageVersions"]["php-8.3"], "8.3.14");
    }

    #[test]
    fn test_unknown_keys_survive() {
        let raw = r#"{"workspaceName":"blog","workspaceType":"workspace","instances":{},"stack":null,"customKey":{"a":1}}"#;
        let ws: Workspace = serde_json::from_str(raw).unwrap();
        assert!(ws.is_workspace_mode());
        let back = serde_json::to_value(&ws).unwrap();
        assert_eq!(back["customKey"]["a"], 1);
    }

    #[test]
    fn test_name_taken_ignores_case() {
        let mut ws = Workspace::default();
        ws.instances.insert("Alpha".into(), record(8001, 1));
        assert_eq!(ws.name_taken("alpha"), Some("Alpha"));
        assert_eq!(ws.name_taken("beta"), None);
    }

    #[test]
    fn test_dependents_of() {
        let mut ws = Workspace::default();
        ws.instances.insert("alpha".into(), record(8001, 1));
        let mut beta = record(8002, 2);
        beta.shared_from = Some("alpha".into());
        ws.instances.insert("beta".into(), beta);
        assert_eq!(ws.dependents_of("alpha"), vec!["beta".to_string()]);
        assert!(ws.dependents_of("beta").is_empty());
    }

    #[test]
    fn test_transient_statuses() {
        assert!(InstanceStatus::Creating.is_transient());
        assert!(InstanceStatus::Cloning.is_transient());
        assert!(InstanceStatus::Removing.is_transient());
        assert!(!InstanceStatus::Running.is_transient());
    }
}
